use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::AutomationError;
use crate::selector::Selector;

/// One element handle surfaced by the control channel.
///
/// Implementations wrap whatever the backing channel uses to keep hold of a
/// DOM node (a remote object id, a node reference, a scripted stub in tests).
#[async_trait]
pub trait PageElement: Send + Sync {
    /// Whether the element currently accepts interaction. Presence alone is
    /// not enough: pages routinely render controls before wiring them up.
    async fn is_interactable(&self) -> Result<bool, AutomationError>;

    async fn click(&self) -> Result<(), AutomationError>;

    async fn clear(&self) -> Result<(), AutomationError>;

    async fn type_text(&self, text: &str) -> Result<(), AutomationError>;
}

/// An element resolved from the page.
pub struct Element {
    inner: Box<dyn PageElement>,
}

impl Element {
    pub fn new(inner: Box<dyn PageElement>) -> Self {
        Self { inner }
    }

    pub async fn is_interactable(&self) -> Result<bool, AutomationError> {
        self.inner.is_interactable().await
    }

    pub async fn click(&self) -> Result<(), AutomationError> {
        self.inner.click().await
    }

    pub async fn clear(&self) -> Result<(), AutomationError> {
        self.inner.clear().await
    }

    pub async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        self.inner.type_text(text).await
    }

    /// Clear the element, then type into it.
    pub async fn fill(&self, text: &str) -> Result<(), AutomationError> {
        self.inner.clear().await?;
        self.inner.type_text(text).await
    }
}

/// The capability surface the automation depends on.
///
/// The common trait every control-channel backend must implement. The stages
/// never talk to an automation library directly; they see this trait and
/// nothing else.
#[async_trait]
pub trait BrowserControl: Send + Sync {
    /// Navigate the session to a URL.
    async fn open_url(&self, url: &str) -> Result<(), AutomationError>;

    /// Single presence query, no waiting. `None` means nothing matches right
    /// now; polling on top of this is the resolver's job.
    async fn query(&self, selector: &Selector) -> Result<Option<Element>, AutomationError>;

    /// Capture a screenshot of the current page to `path`.
    async fn screenshot(&self, path: &Path) -> Result<(), AutomationError>;

    /// Dump the current rendered markup.
    async fn page_source(&self) -> Result<String, AutomationError>;

    /// Release the underlying channel.
    async fn close(&self) -> Result<(), AutomationError>;
}

/// Exclusive owner of one control channel for the duration of a run.
///
/// Stages borrow the session; they never own or outlive it. `close` releases
/// the channel exactly once, no matter how many times it is called.
pub struct Session {
    control: Box<dyn BrowserControl>,
    released: AtomicBool,
}

impl Session {
    pub fn new(control: Box<dyn BrowserControl>) -> Self {
        Self {
            control,
            released: AtomicBool::new(false),
        }
    }

    pub async fn open_url(&self, url: &str) -> Result<(), AutomationError> {
        self.control.open_url(url).await
    }

    pub async fn query(&self, selector: &Selector) -> Result<Option<Element>, AutomationError> {
        self.control.query(selector).await
    }

    pub async fn screenshot(&self, path: &Path) -> Result<(), AutomationError> {
        self.control.screenshot(path).await
    }

    pub async fn page_source(&self) -> Result<String, AutomationError> {
        self.control.page_source().await
    }

    pub async fn close(&self) -> Result<(), AutomationError> {
        if self.released.swap(true, Ordering::SeqCst) {
            debug!("session already released");
            return Ok(());
        }
        self.control.close().await
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Options for acquiring a session.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Strip the fingerprintable automation flags from the browser.
    pub disable_automation_flags: bool,
    /// Grant microphone/camera prompts up front so the meeting surface can
    /// render its device controls.
    pub grant_media_permissions: bool,
    pub deny_geolocation: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: false,
            disable_automation_flags: true,
            grant_media_permissions: true,
            deny_geolocation: true,
        }
    }
}

impl LaunchOptions {
    pub fn headless(value: bool) -> Self {
        Self {
            headless: value,
            ..Self::default()
        }
    }
}

/// Acquires control channels. One launch per run; teardown belongs to the
/// orchestrator, not the launcher.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Session, AutomationError>;
}
