//! Chromium control channel over CDP.
//!
//! Implements the core capability traits with `chromiumoxide`. The rest of
//! the system never sees this module's types; it talks to the traits.

use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use attendant::{
    AutomationError, BrowserControl, Element, LaunchOptions, PageElement, Selector, Session,
    SessionLauncher,
};

// Element-scoped probes executed with the element bound as `this`.
const INTERACTABLE_PROBE: &str = r#"function() {
    if (this.disabled) return false;
    const style = window.getComputedStyle(this);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = this.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}"#;

const CLEAR_VALUE: &str = r#"function() {
    if ('value' in this) {
        this.value = '';
        this.dispatchEvent(new Event('input', { bubbles: true }));
    }
}"#;

fn cdp_err(context: &str, e: impl std::fmt::Display) -> AutomationError {
    AutomationError::Session(format!("{context}: {e}"))
}

pub struct CdpLauncher;

impl CdpLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CdpLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionLauncher for CdpLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Session, AutomationError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--start-maximized");
        if options.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        if options.disable_automation_flags {
            builder = builder.arg("--disable-blink-features=AutomationControlled");
        }
        if options.grant_media_permissions {
            // Auto-accepts the mic/camera prompt so the pre-join surface can
            // render its device controls.
            builder = builder.arg("--use-fake-ui-for-media-stream");
        }
        if options.deny_geolocation {
            builder = builder.arg("--deny-permission-prompts");
        }
        let config = builder
            .build()
            .map_err(|e| cdp_err("could not build browser config", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| cdp_err("could not launch browser", e))?;

        // The handler must be pumped for the lifetime of the browser.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("cdp handler event error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| cdp_err("could not open page", e))?;

        info!("browser session started (headless: {})", options.headless);
        Ok(Session::new(Box::new(CdpSession {
            browser: Mutex::new(Some(browser)),
            handler_task: Mutex::new(Some(handler_task)),
            page,
        })))
    }
}

struct CdpSession {
    browser: Mutex<Option<Browser>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    page: Page,
}

#[async_trait]
impl BrowserControl for CdpSession {
    async fn open_url(&self, url: &str) -> Result<(), AutomationError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| cdp_err("navigation failed", e))?;
        debug!("navigated to {url}");
        Ok(())
    }

    async fn query(&self, selector: &Selector) -> Result<Option<Element>, AutomationError> {
        let css = selector.as_css().ok_or_else(|| {
            AutomationError::Unsupported(format!(
                "the CDP backend cannot evaluate non-CSS selector {selector}"
            ))
        })?;
        // querySelector misses surface as errors from the CDP layer; both a
        // miss and a dead channel read as "nothing matches right now", which
        // is what bounded polling on top of this expects.
        match self.page.find_element(css.as_str()).await {
            Ok(element) => Ok(Some(Element::new(Box::new(CdpElement { inner: element })))),
            Err(e) => {
                debug!("no match for '{css}': {e}");
                Ok(None)
            }
        }
    }

    async fn screenshot(&self, path: &Path) -> Result<(), AutomationError> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let data = self
            .page
            .screenshot(params)
            .await
            .map_err(|e| cdp_err("screenshot failed", e))?;
        tokio::fs::write(path, data)
            .await
            .map_err(|e| cdp_err("could not write screenshot", e))?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String, AutomationError> {
        self.page
            .content()
            .await
            .map_err(|e| cdp_err("could not read page content", e))
    }

    async fn close(&self) -> Result<(), AutomationError> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!("browser close reported: {e}");
            }
        }
        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        info!("browser session closed");
        Ok(())
    }
}

struct CdpElement {
    inner: chromiumoxide::element::Element,
}

#[async_trait]
impl PageElement for CdpElement {
    async fn is_interactable(&self) -> Result<bool, AutomationError> {
        let returns = self
            .inner
            .call_js_fn(INTERACTABLE_PROBE, false)
            .await
            .map_err(|e| cdp_err("interactability probe failed", e))?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn click(&self) -> Result<(), AutomationError> {
        self.inner
            .scroll_into_view()
            .await
            .map_err(|e| cdp_err("scroll into view failed", e))?;
        self.inner
            .click()
            .await
            .map_err(|e| cdp_err("click failed", e))?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AutomationError> {
        self.inner
            .call_js_fn(CLEAR_VALUE, false)
            .await
            .map_err(|e| cdp_err("clear failed", e))?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        self.inner
            .click()
            .await
            .map_err(|e| cdp_err("focus click failed", e))?;
        self.inner
            .type_str(text)
            .await
            .map_err(|e| cdp_err("typing failed", e))?;
        Ok(())
    }
}
