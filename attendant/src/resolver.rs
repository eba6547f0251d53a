use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, instrument};

use crate::errors::AutomationError;
use crate::selector::{FallbackSet, Selector};
use crate::session::{Element, Session};
use crate::timing::POLL_INTERVAL;

// Default budget for candidates that do not carry their own wait.
const DEFAULT_CANDIDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Readiness level a poll waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Present,
    Interactable,
}

/// Resolves an element from an ordered fallback set.
///
/// Candidates are tried strictly in order; each gets a bounded polling wait
/// (its own budget, or this resolver's default). The first candidate that
/// becomes usable wins and later candidates are never evaluated. Worst-case
/// latency is the sum of every candidate budget in the set; size fallback
/// sets accordingly.
#[derive(Debug, Clone)]
pub struct ElementResolver {
    poll_interval: Duration,
    candidate_timeout: Duration,
}

impl Default for ElementResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementResolver {
    pub fn new() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            candidate_timeout: DEFAULT_CANDIDATE_TIMEOUT,
        }
    }

    /// Default per-candidate budget for candidates without their own.
    pub fn with_candidate_timeout(mut self, timeout: Duration) -> Self {
        self.candidate_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Resolve the first candidate that is present **and** interactable.
    #[instrument(level = "debug", skip(self, session, set), fields(set = %set.name))]
    pub async fn resolve(
        &self,
        session: &Session,
        set: &FallbackSet,
    ) -> Result<Element, AutomationError> {
        self.resolve_when(session, set, Readiness::Interactable)
            .await
    }

    /// Resolve on presence alone. Backs two-phase waits where a caller wants
    /// to see a surface render before asking for interactability.
    #[instrument(level = "debug", skip(self, session, set), fields(set = %set.name))]
    pub async fn resolve_present(
        &self,
        session: &Session,
        set: &FallbackSet,
    ) -> Result<Element, AutomationError> {
        self.resolve_when(session, set, Readiness::Present).await
    }

    async fn resolve_when(
        &self,
        session: &Session,
        set: &FallbackSet,
        readiness: Readiness,
    ) -> Result<Element, AutomationError> {
        let started = Instant::now();
        for candidate in &set.candidates {
            let budget = candidate.wait().unwrap_or(self.candidate_timeout);
            debug!(selector = %candidate.selector, ?budget, "trying candidate");
            if let Some(element) = self
                .poll(session, &candidate.selector, budget, readiness)
                .await
            {
                debug!(selector = %candidate.selector, "candidate resolved");
                return Ok(element);
            }
        }
        Err(AutomationError::LocatorNotFound {
            set: set.name.clone(),
            tried: set
                .candidates
                .iter()
                .map(|c| c.selector.to_string())
                .collect(),
            elapsed: started.elapsed(),
        })
    }

    /// Bounded polling wait for one candidate. Channel-level query errors are
    /// absorbed as non-matches: a dead session surfaces as exhaustion, which
    /// is what the caller acts on either way.
    async fn poll(
        &self,
        session: &Session,
        selector: &Selector,
        budget: Duration,
        readiness: Readiness,
    ) -> Option<Element> {
        let started = Instant::now();
        loop {
            match session.query(selector).await {
                Ok(Some(element)) => match readiness {
                    Readiness::Present => return Some(element),
                    Readiness::Interactable => match element.is_interactable().await {
                        Ok(true) => return Some(element),
                        Ok(false) => {}
                        Err(e) => debug!(%selector, "interactability probe failed: {e}"),
                    },
                },
                Ok(None) => {}
                Err(e) => debug!(%selector, "query failed: {e}"),
            }
            if started.elapsed() >= budget {
                return None;
            }
            sleep(self.poll_interval).await;
        }
    }
}
