use std::fmt;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::diagnostics::DiagnosticsCapture;
use crate::errors::AutomationError;
use crate::resolver::ElementResolver;
use crate::selector::FallbackLibrary;
use crate::session::Session;
use crate::timing::{PRE_SUBMIT_SETTLE, SECRET_PROMPT_SETTLE};

/// Sign-in progress. Carried inside `AuthenticationTimeout` so the caller can
/// tell how far the flow got before the UI stopped cooperating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Start,
    IdentitySubmitted,
    SecretPromptVisible,
    SecretSubmitted,
    Authenticated,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthState::Start => "start",
            AuthState::IdentitySubmitted => "identity-submitted",
            AuthState::SecretPromptVisible => "secret-prompt-visible",
            AuthState::SecretSubmitted => "secret-submitted",
            AuthState::Authenticated => "authenticated",
        };
        write!(f, "{name}")
    }
}

/// Drives the sign-in flow: identity, advance, secret, advance, landing.
///
/// Single pass, fail-fast. Retry policy, if any, belongs to the caller:
/// re-running a half-completed login against a stateful form is worse than
/// reporting exactly where it stalled.
pub struct CredentialAuthenticator<'a> {
    config: &'a SessionConfig,
    fallbacks: &'a FallbackLibrary,
    diagnostics: &'a DiagnosticsCapture,
    resolver: ElementResolver,
}

impl<'a> CredentialAuthenticator<'a> {
    pub fn new(
        config: &'a SessionConfig,
        fallbacks: &'a FallbackLibrary,
        diagnostics: &'a DiagnosticsCapture,
    ) -> Self {
        let resolver = ElementResolver::new().with_candidate_timeout(config.stage_timeout);
        Self {
            config,
            fallbacks,
            diagnostics,
            resolver,
        }
    }

    pub async fn sign_in(&self, session: &Session) -> Result<(), AutomationError> {
        info!("signing in at {}", self.config.login_url);
        session.open_url(&self.config.login_url).await?;

        if let Err(cause) = self.submit_identity(session).await {
            return self
                .stall(session, AuthState::Start, "login_identity", cause)
                .await;
        }
        info!("identity submitted");

        if let Err(cause) = self.await_secret_prompt(session).await {
            return self
                .stall(session, AuthState::IdentitySubmitted, "login_secret", cause)
                .await;
        }
        debug!("secret prompt visible");

        if let Err(cause) = self.submit_secret(session).await {
            return self
                .stall(
                    session,
                    AuthState::SecretPromptVisible,
                    "login_secret",
                    cause,
                )
                .await;
        }
        info!("secret submitted");

        if let Err(cause) = self.await_landing(session).await {
            return self
                .stall(session, AuthState::SecretSubmitted, "login_landing", cause)
                .await;
        }
        info!("signed in");
        Ok(())
    }

    async fn submit_identity(&self, session: &Session) -> Result<(), AutomationError> {
        let field = self
            .resolver
            .resolve(session, &self.fallbacks.identity_field)
            .await?;
        field.fill(&self.config.email).await?;
        let next = self
            .resolver
            .resolve(session, &self.fallbacks.identity_next)
            .await?;
        next.click().await
    }

    /// Two-phase wait: the secret field renders before it accepts input, so
    /// presence comes first and a settle delay bridges to interactability.
    async fn await_secret_prompt(&self, session: &Session) -> Result<(), AutomationError> {
        self.resolver
            .resolve_present(session, &self.fallbacks.secret_field)
            .await?;
        sleep(SECRET_PROMPT_SETTLE).await;
        Ok(())
    }

    async fn submit_secret(&self, session: &Session) -> Result<(), AutomationError> {
        let field = self
            .resolver
            .resolve(session, &self.fallbacks.secret_field)
            .await?;
        field.fill(&self.config.password).await?;
        sleep(PRE_SUBMIT_SETTLE).await;
        let next = self
            .resolver
            .resolve(session, &self.fallbacks.secret_next)
            .await?;
        next.click().await
    }

    async fn await_landing(&self, session: &Session) -> Result<(), AutomationError> {
        self.resolver
            .resolve_present(session, &self.fallbacks.signed_in_marker)
            .await?;
        Ok(())
    }

    async fn stall(
        &self,
        session: &Session,
        state: AuthState,
        label: &str,
        cause: AutomationError,
    ) -> Result<(), AutomationError> {
        warn!("sign-in stalled at '{state}': {cause}");
        self.diagnostics.capture(session, label).await;
        Err(AutomationError::AuthenticationTimeout {
            state,
            source: Box::new(cause),
        })
    }
}
