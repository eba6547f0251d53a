use std::fmt;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::diagnostics::DiagnosticsCapture;
use crate::errors::AutomationError;
use crate::resolver::ElementResolver;
use crate::selector::{FallbackLibrary, FallbackSet};
use crate::session::Session;
use crate::timing::{
    CONTROL_TOGGLE_SETTLE, PERMISSION_SURFACE_SETTLE, POST_JOIN_SETTLE, PRE_JOIN_SETTLE,
};

/// How post-join verification findings are treated.
///
/// Indicator markup is the least stable part of the UI, so `Advisory` treats
/// an absent indicator as unknown rather than as failure. `Required` turns an
/// unconfirmed join into a fatal error for callers that would rather abort
/// than sit in a lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    Off,
    #[default]
    Advisory,
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDevice {
    Microphone,
    Camera,
}

impl MediaDevice {
    fn toggle_set<'a>(&self, fallbacks: &'a FallbackLibrary) -> &'a FallbackSet {
        match self {
            MediaDevice::Microphone => &fallbacks.microphone_toggle,
            MediaDevice::Camera => &fallbacks.camera_toggle,
        }
    }
}

impl fmt::Display for MediaDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaDevice::Microphone => write!(f, "microphone"),
            MediaDevice::Camera => write!(f, "camera"),
        }
    }
}

/// What the joiner actually managed to do.
///
/// Device-mute failures and inconclusive verification land here instead of
/// failing the run; `None` means unknown, not "off".
#[derive(Debug, Clone, Default)]
pub struct JoinSummary {
    pub microphone_muted: bool,
    pub camera_muted: bool,
    /// `Some(true)` when an in-meeting indicator was found; `None` when
    /// verification was off or inconclusive.
    pub joined_confirmed: Option<bool>,
    /// `Some(true)` when both device-muted markers were found.
    pub mute_confirmed: Option<bool>,
}

/// Drives navigation to the meeting, device muting, and the join itself.
pub struct MeetingJoiner<'a> {
    fallbacks: &'a FallbackLibrary,
    diagnostics: &'a DiagnosticsCapture,
    resolver: ElementResolver,
    verify_mode: VerifyMode,
}

impl<'a> MeetingJoiner<'a> {
    pub fn new(fallbacks: &'a FallbackLibrary, diagnostics: &'a DiagnosticsCapture) -> Self {
        Self {
            fallbacks,
            diagnostics,
            resolver: ElementResolver::new(),
            verify_mode: VerifyMode::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: ElementResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_verify_mode(mut self, mode: VerifyMode) -> Self {
        self.verify_mode = mode;
        self
    }

    pub async fn join(
        &self,
        session: &Session,
        meeting_url: &str,
    ) -> Result<JoinSummary, AutomationError> {
        info!("navigating to meeting: {meeting_url}");
        session.open_url(meeting_url).await?;
        sleep(PERMISSION_SURFACE_SETTLE).await;

        let mut summary = JoinSummary {
            microphone_muted: self.mute_device(session, MediaDevice::Microphone).await,
            camera_muted: self.mute_device(session, MediaDevice::Camera).await,
            ..JoinSummary::default()
        };

        let join_control = match self
            .resolver
            .resolve(session, &self.fallbacks.join_control)
            .await
        {
            Ok(control) => control,
            Err(cause) => {
                warn!("no join control resolved: {cause}");
                self.diagnostics.capture(session, "join_failure").await;
                return Err(AutomationError::JoinFailure(cause.to_string()));
            }
        };

        info!("join control found, activating");
        sleep(PRE_JOIN_SETTLE).await;
        join_control.click().await?;
        sleep(POST_JOIN_SETTLE).await;

        if self.verify_mode != VerifyMode::Off {
            let joined = self.marker_present(session, &self.fallbacks.joined_markers).await;
            summary.joined_confirmed = joined.then_some(true);
            if joined {
                info!("in-meeting indicator confirmed");
            } else if self.verify_mode == VerifyMode::Required {
                self.diagnostics.capture(session, "join_unconfirmed").await;
                return Err(AutomationError::JoinFailure(
                    "no in-meeting indicator appeared".to_string(),
                ));
            } else {
                info!("join state unconfirmed, continuing");
            }

            let muted = self
                .marker_present(session, &self.fallbacks.microphone_muted_marker)
                .await
                && self
                    .marker_present(session, &self.fallbacks.camera_muted_marker)
                    .await;
            summary.mute_confirmed = muted.then_some(true);
        }

        Ok(summary)
    }

    /// Mute one device. Never fatal: being unable to confirm a mute control
    /// must not keep the caller out of the meeting.
    async fn mute_device(&self, session: &Session, device: MediaDevice) -> bool {
        match self
            .resolver
            .resolve(session, device.toggle_set(self.fallbacks))
            .await
        {
            Ok(control) => match control.click().await {
                Ok(()) => {
                    info!("{device} muted");
                    sleep(CONTROL_TOGGLE_SETTLE).await;
                    true
                }
                Err(e) => {
                    warn!("could not activate {device} control: {e}");
                    false
                }
            },
            Err(e) => {
                warn!("could not find {device} control, continuing unmuted: {e}");
                false
            }
        }
    }

    /// Single presence sweep over a marker set, no waiting.
    async fn marker_present(&self, session: &Session, set: &FallbackSet) -> bool {
        for candidate in &set.candidates {
            match session.query(&candidate.selector).await {
                Ok(Some(_)) => {
                    debug!(set = %set.name, selector = %candidate.selector, "marker present");
                    return true;
                }
                Ok(None) => {}
                Err(e) => debug!(set = %set.name, selector = %candidate.selector, "marker query failed: {e}"),
            }
        }
        false
    }
}
