use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::session::Session;

/// Best-effort failure artifacts: a screenshot and a page-source dump,
/// named by stage label and capture time.
///
/// Nothing in here ever propagates. A diagnostics problem must not mask or
/// replace the failure that triggered the capture, so every internal error
/// is logged and swallowed, including errors from a channel that is already
/// dead.
#[derive(Debug, Clone)]
pub struct DiagnosticsCapture {
    dir: PathBuf,
}

impl DiagnosticsCapture {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn capture(&self, session: &Session, label: &str) {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!("could not create artifact directory {:?}: {e}", self.dir);
            return;
        }

        let shot = self.dir.join(format!("screenshot_{label}_{stamp}.png"));
        match session.screenshot(&shot).await {
            Ok(()) => info!("screenshot saved: {:?}", shot),
            Err(e) => warn!("screenshot capture failed for '{label}': {e}"),
        }

        let page = self.dir.join(format!("page_{label}_{stamp}.html"));
        match session.page_source().await {
            Ok(source) => {
                if let Err(e) = tokio::fs::write(&page, source).await {
                    warn!("could not write page dump {:?}: {e}", page);
                } else {
                    info!("page dump saved: {:?}", page);
                }
            }
            Err(e) => warn!("page source dump failed for '{label}': {e}"),
        }
    }
}
