//! Automated meeting attendance through a remote browser control channel.
//!
//! This crate drives a third-party, frequently-changing conference UI:
//! sign in, navigate to the meeting, mute the local devices, join, then hand
//! off to audio capture and transcription. Element identifiers on such UIs
//! are unstable, so every lookup goes through ordered fallback sets of
//! locator candidates resolved under bounded time budgets, with diagnostic
//! artifacts captured when a stage fails.
//!
//! The control channel itself is a capability, not a dependency: stages see
//! the [`BrowserControl`] trait and nothing else. Backends, audio capture,
//! and transcription plug in at the seams defined here.

pub mod auth;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod joiner;
pub mod orchestrator;
pub mod resolver;
pub mod selector;
pub mod session;
#[cfg(test)]
mod tests;
pub mod timing;

pub use auth::{AuthState, CredentialAuthenticator};
pub use config::SessionConfig;
pub use diagnostics::DiagnosticsCapture;
pub use errors::AutomationError;
pub use joiner::{JoinSummary, MediaDevice, MeetingJoiner, VerifyMode};
pub use orchestrator::{AudioCapture, Orchestrator, RunReport, Stage, StageError, Transcriber};
pub use resolver::ElementResolver;
pub use selector::{FallbackLibrary, FallbackSet, LocatorCandidate, Selector};
pub use session::{
    BrowserControl, Element, LaunchOptions, PageElement, Session, SessionLauncher,
};
