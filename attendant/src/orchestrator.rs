use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::CredentialAuthenticator;
use crate::config::SessionConfig;
use crate::diagnostics::DiagnosticsCapture;
use crate::errors::AutomationError;
use crate::joiner::{JoinSummary, MeetingJoiner, VerifyMode};
use crate::resolver::ElementResolver;
use crate::selector::FallbackLibrary;
use crate::session::{LaunchOptions, Session, SessionLauncher};

/// Captures meeting audio once the join stage has succeeded.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    async fn capture_to(&self, path: &Path, duration: Duration) -> Result<(), AutomationError>;
}

/// Turns a captured recording into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, path: &Path) -> Result<String, AutomationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Launch,
    Authenticate,
    Join,
    Record,
    Transcribe,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Launch => "launch",
            Stage::Authenticate => "authenticate",
            Stage::Join => "join",
            Stage::Record => "record",
            Stage::Transcribe => "transcribe",
        };
        write!(f, "{name}")
    }
}

/// A stage failure tagged with the stage that produced it.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: AutomationError,
}

impl StageError {
    fn new(stage: Stage) -> impl FnOnce(AutomationError) -> Self {
        move |source| Self { stage, source }
    }
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunReport {
    pub join: JoinSummary,
    pub capture_path: PathBuf,
    pub transcript: String,
}

/// Sequences the full run: launch, authenticate, join, record, transcribe.
///
/// Owns the session for exactly the duration of one run and releases it on
/// every exit path; a failed stage aborts everything after it but never the
/// teardown.
pub struct Orchestrator {
    config: SessionConfig,
    fallbacks: FallbackLibrary,
    diagnostics: DiagnosticsCapture,
    verify_mode: VerifyMode,
    capture_path: PathBuf,
}

impl Orchestrator {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            fallbacks: FallbackLibrary::default(),
            diagnostics: DiagnosticsCapture::new("artifacts"),
            verify_mode: VerifyMode::default(),
            capture_path: PathBuf::from("tmp/capture.wav"),
        }
    }

    pub fn with_fallbacks(mut self, fallbacks: FallbackLibrary) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsCapture) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_verify_mode(mut self, mode: VerifyMode) -> Self {
        self.verify_mode = mode;
        self
    }

    pub fn with_capture_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.capture_path = path.into();
        self
    }

    pub async fn run(
        &self,
        launcher: &dyn SessionLauncher,
        recorder: &dyn AudioCapture,
        transcriber: &dyn Transcriber,
    ) -> Result<RunReport, StageError> {
        let options = LaunchOptions {
            headless: self.config.headless,
            ..LaunchOptions::default()
        };
        let session = launcher
            .launch(&options)
            .await
            .map_err(StageError::new(Stage::Launch))?;
        info!("session launched (headless: {})", options.headless);

        let outcome = self.run_stages(&session, recorder, transcriber).await;

        // Teardown happens on every path; a close problem must not replace
        // the stage outcome.
        if let Err(e) = session.close().await {
            warn!("session teardown failed: {e}");
        } else {
            info!("session released");
        }

        outcome
    }

    async fn run_stages(
        &self,
        session: &Session,
        recorder: &dyn AudioCapture,
        transcriber: &dyn Transcriber,
    ) -> Result<RunReport, StageError> {
        let authenticator =
            CredentialAuthenticator::new(&self.config, &self.fallbacks, &self.diagnostics);
        authenticator
            .sign_in(session)
            .await
            .map_err(StageError::new(Stage::Authenticate))?;

        let resolver = ElementResolver::new().with_candidate_timeout(self.config.stage_timeout);
        let joiner = MeetingJoiner::new(&self.fallbacks, &self.diagnostics)
            .with_resolver(resolver)
            .with_verify_mode(self.verify_mode);
        let join = joiner
            .join(session, &self.config.meeting_url)
            .await
            .map_err(StageError::new(Stage::Join))?;

        info!(
            "joined meeting, capturing audio for {:?}",
            self.config.recording_duration
        );
        recorder
            .capture_to(&self.capture_path, self.config.recording_duration)
            .await
            .map_err(StageError::new(Stage::Record))?;

        let transcript = transcriber
            .transcribe(&self.capture_path)
            .await
            .map_err(StageError::new(Stage::Transcribe))?;
        info!("transcription complete ({} chars)", transcript.len());

        Ok(RunReport {
            join,
            capture_path: self.capture_path.clone(),
            transcript,
        })
    }
}
