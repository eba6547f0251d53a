//! A scripted control channel for exercising the stages without a browser.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::AutomationError;
use crate::orchestrator::{AudioCapture, Transcriber};
use crate::selector::Selector;
use crate::session::{
    BrowserControl, Element, LaunchOptions, PageElement, Session, SessionLauncher,
};

pub const MOCK_TRANSCRIPT: &str = "everyone agreed to ship on friday";

/// Scripted behavior for one selector. Unscripted selectors never match.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementScript {
    /// Queries to absorb before the element reports present.
    pub present_after: usize,
    /// Further queries to absorb after presence before it reports
    /// interactable.
    pub interactable_after: usize,
    /// Queries that fail at the channel level before any of the above.
    pub error_first: usize,
}

impl ElementScript {
    /// Present and interactable from the first query.
    pub fn ready() -> Self {
        Self::default()
    }

    pub fn present_after(queries: usize) -> Self {
        Self {
            present_after: queries,
            ..Self::default()
        }
    }

    pub fn never_interactable() -> Self {
        Self {
            interactable_after: usize::MAX,
            ..Self::default()
        }
    }

    pub fn erroring_then_ready(errors: usize) -> Self {
        Self {
            error_first: errors,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    script: Option<ElementScript>,
    queries: usize,
}

#[derive(Default)]
struct Inner {
    scripts: Mutex<HashMap<String, ScriptState>>,
    opened: Mutex<Vec<String>>,
    clicks: Mutex<Vec<String>>,
    typed: Mutex<Vec<(String, String)>>,
    screenshots: Mutex<Vec<PathBuf>>,
    page_dumps: AtomicUsize,
    close_count: AtomicUsize,
    fail_screenshot: AtomicBool,
    fail_page_source: AtomicBool,
    fail_close: AtomicBool,
}

#[derive(Clone, Default)]
pub struct MockBrowser {
    inner: Arc<Inner>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, selector: &str, script: ElementScript) {
        let key = Selector::from(selector).to_string();
        self.inner
            .scripts
            .lock()
            .unwrap()
            .insert(key, ScriptState {
                script: Some(script),
                queries: 0,
            });
    }

    pub fn set_fail_screenshot(&self, fail: bool) {
        self.inner.fail_screenshot.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_page_source(&self, fail: bool) {
        self.inner.fail_page_source.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.inner.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn queries_for(&self, selector: &str) -> usize {
        let key = Selector::from(selector).to_string();
        self.inner
            .scripts
            .lock()
            .unwrap()
            .get(&key)
            .map(|s| s.queries)
            .unwrap_or(0)
    }

    pub fn opened(&self) -> Vec<String> {
        self.inner.opened.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.inner.clicks.lock().unwrap().clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.inner.typed.lock().unwrap().clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.inner.screenshots.lock().unwrap().clone()
    }

    pub fn screenshot_count(&self) -> usize {
        self.inner.screenshots.lock().unwrap().len()
    }

    pub fn close_count(&self) -> usize {
        self.inner.close_count.load(Ordering::SeqCst)
    }
}

struct MockElement {
    key: String,
    interactable: bool,
    inner: Arc<Inner>,
}

#[async_trait]
impl PageElement for MockElement {
    async fn is_interactable(&self) -> Result<bool, AutomationError> {
        Ok(self.interactable)
    }

    async fn click(&self) -> Result<(), AutomationError> {
        self.inner.clicks.lock().unwrap().push(self.key.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AutomationError> {
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        self.inner
            .typed
            .lock()
            .unwrap()
            .push((self.key.clone(), text.to_string()));
        Ok(())
    }
}

#[async_trait]
impl BrowserControl for MockBrowser {
    async fn open_url(&self, url: &str) -> Result<(), AutomationError> {
        self.inner.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn query(&self, selector: &Selector) -> Result<Option<Element>, AutomationError> {
        let key = selector.to_string();
        let mut scripts = self.inner.scripts.lock().unwrap();
        let state = scripts.entry(key.clone()).or_default();
        state.queries += 1;
        let Some(script) = state.script else {
            return Ok(None);
        };
        if state.queries <= script.error_first {
            return Err(AutomationError::Session("channel hiccup".to_string()));
        }
        let effective = state.queries - script.error_first;
        if effective <= script.present_after {
            return Ok(None);
        }
        let interactable =
            effective > script.present_after.saturating_add(script.interactable_after);
        Ok(Some(Element::new(Box::new(MockElement {
            key,
            interactable,
            inner: self.inner.clone(),
        }))))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), AutomationError> {
        if self.inner.fail_screenshot.load(Ordering::SeqCst) {
            return Err(AutomationError::Session("render target gone".to_string()));
        }
        std::fs::write(path, b"\x89PNG")
            .map_err(|e| AutomationError::Session(e.to_string()))?;
        self.inner
            .screenshots
            .lock()
            .unwrap()
            .push(path.to_path_buf());
        Ok(())
    }

    async fn page_source(&self) -> Result<String, AutomationError> {
        if self.inner.fail_page_source.load(Ordering::SeqCst) {
            return Err(AutomationError::Session("page context lost".to_string()));
        }
        self.inner.page_dumps.fetch_add(1, Ordering::SeqCst);
        Ok("<html><body data-mock></body></html>".to_string())
    }

    async fn close(&self) -> Result<(), AutomationError> {
        self.inner.close_count.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_close.load(Ordering::SeqCst) {
            return Err(AutomationError::Session("channel already gone".to_string()));
        }
        Ok(())
    }
}

/// Hands out the wrapped browser once; launching twice is a test bug.
pub struct MockLauncher {
    browser: Mutex<Option<MockBrowser>>,
    fail: bool,
}

impl MockLauncher {
    pub fn new(browser: MockBrowser) -> Self {
        Self {
            browser: Mutex::new(Some(browser)),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            browser: Mutex::new(None),
            fail: true,
        }
    }
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    async fn launch(&self, _options: &LaunchOptions) -> Result<Session, AutomationError> {
        if self.fail {
            return Err(AutomationError::Session("launch refused".to_string()));
        }
        let browser = self
            .browser
            .lock()
            .unwrap()
            .take()
            .expect("mock launcher can only launch once");
        Ok(Session::new(Box::new(browser)))
    }
}

#[derive(Default)]
pub struct MockRecorder {
    pub fail: bool,
    pub captures: AtomicUsize,
}

impl MockRecorder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioCapture for MockRecorder {
    async fn capture_to(&self, _path: &Path, _duration: Duration) -> Result<(), AutomationError> {
        if self.fail {
            return Err(AutomationError::Recording("device unavailable".to_string()));
        }
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockTranscriber {
    pub fail: bool,
}

impl MockTranscriber {
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _path: &Path) -> Result<String, AutomationError> {
        if self.fail {
            return Err(AutomationError::Transcription("endpoint refused".to_string()));
        }
        Ok(MOCK_TRANSCRIPT.to_string())
    }
}
