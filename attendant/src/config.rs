use std::fmt;
use std::time::Duration;

use crate::errors::AutomationError;

/// Sign-in surface used when none is configured.
pub const DEFAULT_LOGIN_URL: &str = "https://accounts.google.com/ServiceLogin";

const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_RECORDING_DURATION: Duration = Duration::from_secs(60);

/// Immutable per-run configuration.
#[derive(Clone)]
pub struct SessionConfig {
    pub email: String,
    pub password: String,
    pub meeting_url: String,
    pub login_url: String,
    pub headless: bool,
    /// Default per-candidate wait budget for locator resolution within a
    /// stage; candidates carrying their own budget keep it.
    pub stage_timeout: Duration,
    pub recording_duration: Duration,
}

impl SessionConfig {
    /// Fails when any required credential or the meeting address is empty.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        meeting_url: impl Into<String>,
    ) -> Result<Self, AutomationError> {
        let email = email.into();
        let password = password.into();
        let meeting_url = meeting_url.into();

        for (field, value) in [
            ("email", &email),
            ("password", &password),
            ("meeting url", &meeting_url),
        ] {
            if value.trim().is_empty() {
                return Err(AutomationError::InvalidConfig(format!(
                    "{field} must not be empty"
                )));
            }
        }

        Ok(Self {
            email,
            password,
            meeting_url,
            login_url: DEFAULT_LOGIN_URL.to_string(),
            headless: false,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            recording_duration: DEFAULT_RECORDING_DURATION,
        })
    }

    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn with_recording_duration(mut self, duration: Duration) -> Self {
        self.recording_duration = duration;
        self
    }
}

// The secret stays out of logs and error chains.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("meeting_url", &self.meeting_url)
            .field("login_url", &self.login_url)
            .field("headless", &self.headless)
            .field("stage_timeout", &self.stage_timeout)
            .field("recording_duration", &self.recording_duration)
            .finish()
    }
}
