use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use attendant::{
    DiagnosticsCapture, FallbackLibrary, Orchestrator, SessionConfig, VerifyMode,
};

mod browser;
mod recorder;
mod transcribe;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Joins a meeting on your behalf, muted, and brings back a transcript"
)]
struct Args {
    /// Account email used to sign in
    #[arg(long, env = "ATTENDANT_EMAIL")]
    email: String,

    /// Account password
    #[arg(long, env = "ATTENDANT_PASSWORD", hide_env_values = true)]
    password: String,

    /// Meeting link to join
    #[arg(long, env = "ATTENDANT_MEETING_URL")]
    meeting_url: String,

    /// Run the browser without a visible window
    #[arg(long, env = "ATTENDANT_HEADLESS", default_value_t = false)]
    headless: bool,

    /// Seconds of audio to capture after joining
    #[arg(long, env = "ATTENDANT_DURATION", default_value_t = 60)]
    duration: u64,

    /// Default per-locator wait budget, in seconds
    #[arg(long, default_value_t = 20)]
    stage_timeout: u64,

    /// Where failure screenshots and page dumps go
    #[arg(long, default_value = "artifacts")]
    artifacts_dir: PathBuf,

    /// Captured audio path
    #[arg(long, default_value = "tmp/capture.wav")]
    output: PathBuf,

    /// TOML file overriding the built-in locator fallback sets
    #[arg(long)]
    selectors: Option<PathBuf>,

    /// Post-join verification: off, advisory, or required
    #[arg(long, default_value = "advisory")]
    verify: String,

    /// OpenAI-compatible transcription endpoint
    #[arg(long, env = "ATTENDANT_TRANSCRIBE_ENDPOINT")]
    transcribe_endpoint: Option<String>,

    /// API key for the transcription endpoint
    #[arg(long, env = "ATTENDANT_TRANSCRIBE_API_KEY", hide_env_values = true)]
    transcribe_api_key: Option<String>,

    /// Model name passed to the transcription endpoint
    #[arg(long, default_value = "whisper-1")]
    transcribe_model: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_verify(value: &str) -> Result<VerifyMode> {
    match value {
        "off" => Ok(VerifyMode::Off),
        "advisory" => Ok(VerifyMode::Advisory),
        "required" => Ok(VerifyMode::Required),
        other => bail!("unknown verify mode '{other}' (expected off, advisory, or required)"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let verify = parse_verify(&args.verify)?;
    let fallbacks = match &args.selectors {
        Some(path) => {
            info!("using fallback library override from {path:?}");
            FallbackLibrary::load(path)?
        }
        None => FallbackLibrary::default(),
    };

    let config = SessionConfig::new(args.email, args.password, args.meeting_url)?
        .with_headless(args.headless)
        .with_stage_timeout(Duration::from_secs(args.stage_timeout))
        .with_recording_duration(Duration::from_secs(args.duration));

    let orchestrator = Orchestrator::new(config)
        .with_fallbacks(fallbacks)
        .with_diagnostics(DiagnosticsCapture::new(&args.artifacts_dir))
        .with_verify_mode(verify)
        .with_capture_path(&args.output);

    let launcher = browser::CdpLauncher::new();
    let capture = recorder::CpalRecorder::default();
    let transcriber =
        transcribe::HttpTranscriber::new(args.transcribe_endpoint, args.transcribe_api_key)
            .with_model(args.transcribe_model);

    // A stage failure propagates out of main and exits non-zero; the
    // orchestrator has already torn the session down by then.
    let report = orchestrator.run(&launcher, &capture, &transcriber).await?;

    info!(
        "run complete (microphone muted: {}, camera muted: {}, join confirmed: {:?})",
        report.join.microphone_muted, report.join.camera_muted, report.join.joined_confirmed
    );
    info!("audio saved to {:?}", report.capture_path);
    println!("{}", report.transcript);
    Ok(())
}
