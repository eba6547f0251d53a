use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthState;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("no candidate in fallback set '{set}' became usable after {elapsed:?} (tried {tried:?})")]
    LocatorNotFound {
        set: String,
        tried: Vec<String>,
        elapsed: Duration,
    },

    #[error("authentication timed out at state '{state}'")]
    AuthenticationTimeout {
        state: AuthState,
        #[source]
        source: Box<AutomationError>,
    },

    #[error("failed to join meeting: {0}")]
    JoinFailure(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("browser session error: {0}")]
    Session(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("audio capture failed: {0}")]
    Recording(String),

    #[error("transcription failed: {0}")]
    Transcription(String),
}
