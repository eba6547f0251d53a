use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::AutomationError;

/// Represents ways to locate an element on the page.
///
/// Everything except `XPath` can be rendered as a CSS selector, which is what
/// most control-channel backends speak natively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Selector {
    /// Raw CSS selector
    Css(String),
    /// Element id attribute
    Id(String),
    /// Element name attribute
    Name(String),
    /// XPath query
    XPath(String),
}

impl Selector {
    /// Render as a CSS selector string, when the strategy is CSS-expressible.
    pub fn as_css(&self) -> Option<String> {
        match self {
            Selector::Css(css) => Some(css.clone()),
            Selector::Id(id) => Some(format!("#{id}")),
            Selector::Name(name) => Some(format!("[name='{name}']")),
            Selector::XPath(_) => None,
        }
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        let s = s.trim();
        match s {
            _ if s.starts_with("css:") => Selector::Css(s[4..].to_string()),
            _ if s.starts_with("id:") => Selector::Id(s[3..].to_string()),
            _ if s.starts_with("name:") => Selector::Name(s[5..].to_string()),
            _ if s.starts_with("xpath:") => Selector::XPath(s[6..].to_string()),
            _ if s.starts_with("//") || s.starts_with("(//") => Selector::XPath(s.to_string()),
            // A bare `#ident` is an id shorthand; anything more structured is CSS.
            _ if s.starts_with('#')
                && s[1..]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
            {
                Selector::Id(s[1..].to_string())
            }
            _ => Selector::Css(s.to_string()),
        }
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::from(s.as_str())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(css) => write!(f, "css:{css}"),
            Selector::Id(id) => write!(f, "id:{id}"),
            Selector::Name(name) => write!(f, "name:{name}"),
            Selector::XPath(xpath) => write!(f, "xpath:{xpath}"),
        }
    }
}

/// One way of finding one element, plus how long to wait for it.
///
/// In TOML a candidate is either a bare selector string or a table with an
/// explicit `wait_ms` budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "CandidateRepr")]
pub struct LocatorCandidate {
    pub selector: Selector,
    pub wait_ms: Option<u64>,
}

impl LocatorCandidate {
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
            wait_ms: None,
        }
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait_ms = Some(wait.as_millis() as u64);
        self
    }

    /// Per-candidate wait budget, when the candidate carries its own.
    pub fn wait(&self) -> Option<Duration> {
        self.wait_ms.map(Duration::from_millis)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateRepr {
    Bare(String),
    Full {
        selector: String,
        #[serde(default)]
        wait_ms: Option<u64>,
    },
}

impl From<CandidateRepr> for LocatorCandidate {
    fn from(repr: CandidateRepr) -> Self {
        match repr {
            CandidateRepr::Bare(s) => LocatorCandidate::new(s.as_str()),
            CandidateRepr::Full { selector, wait_ms } => LocatorCandidate {
                selector: Selector::from(selector.as_str()),
                wait_ms,
            },
        }
    }
}

/// An ordered list of locator candidates covering the UI variants of one
/// logical control. Order encodes priority: most stable selector first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FallbackSet {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub candidates: Vec<LocatorCandidate>,
}

impl FallbackSet {
    pub fn new(name: impl Into<String>, candidates: Vec<LocatorCandidate>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// The full catalog of fallback sets the stages consume.
///
/// This is configuration data, not code: adapting to a UI change means
/// editing the built-in catalog below or shipping a TOML override, never
/// touching the orchestration logic. Missing sections in an override file
/// keep their built-in values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackLibrary {
    pub identity_field: FallbackSet,
    pub identity_next: FallbackSet,
    pub secret_field: FallbackSet,
    pub secret_next: FallbackSet,
    pub signed_in_marker: FallbackSet,
    pub microphone_toggle: FallbackSet,
    pub camera_toggle: FallbackSet,
    pub join_control: FallbackSet,
    pub joined_markers: FallbackSet,
    pub microphone_muted_marker: FallbackSet,
    pub camera_muted_marker: FallbackSet,
}

impl FallbackLibrary {
    /// Load a library from a TOML file, falling back to the built-in catalog
    /// for any section the file does not mention.
    pub fn load(path: &Path) -> Result<Self, AutomationError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AutomationError::InvalidConfig(format!("could not read fallback library {path:?}: {e}"))
        })?;
        let mut library: FallbackLibrary = toml::from_str(&text).map_err(|e| {
            AutomationError::InvalidConfig(format!("could not parse fallback library {path:?}: {e}"))
        })?;
        library.fill_names();
        Ok(library)
    }

    /// Sets deserialized from TOML carry no name; give them their field name
    /// so locator failures stay attributable.
    fn fill_names(&mut self) {
        for (name, set) in [
            ("identity_field", &mut self.identity_field),
            ("identity_next", &mut self.identity_next),
            ("secret_field", &mut self.secret_field),
            ("secret_next", &mut self.secret_next),
            ("signed_in_marker", &mut self.signed_in_marker),
            ("microphone_toggle", &mut self.microphone_toggle),
            ("camera_toggle", &mut self.camera_toggle),
            ("join_control", &mut self.join_control),
            ("joined_markers", &mut self.joined_markers),
            ("microphone_muted_marker", &mut self.microphone_muted_marker),
            ("camera_muted_marker", &mut self.camera_muted_marker),
        ] {
            if set.name.is_empty() {
                set.name = name.to_string();
            }
        }
    }
}

impl Default for FallbackLibrary {
    fn default() -> Self {
        let device_wait = Duration::from_secs(5);
        let join_wait = Duration::from_secs(10);
        Self {
            identity_field: FallbackSet::new(
                "identity_field",
                vec![
                    LocatorCandidate::new("id:identifierId"),
                    LocatorCandidate::new("name:identifier"),
                ],
            ),
            identity_next: FallbackSet::new(
                "identity_next",
                vec![LocatorCandidate::new("id:identifierNext")],
            ),
            secret_field: FallbackSet::new(
                "secret_field",
                vec![
                    LocatorCandidate::new("name:Passwd"),
                    LocatorCandidate::new("css:input[type='password']"),
                ],
            ),
            secret_next: FallbackSet::new(
                "secret_next",
                vec![LocatorCandidate::new("id:passwordNext")],
            ),
            signed_in_marker: FallbackSet::new(
                "signed_in_marker",
                vec![LocatorCandidate::new("id:gb")],
            ),
            microphone_toggle: FallbackSet::new(
                "microphone_toggle",
                vec![
                    LocatorCandidate::new(
                        "css:div[role='button'][aria-label*='Turn off microphone']",
                    )
                    .with_wait(device_wait),
                    LocatorCandidate::new("css:div[aria-label*='microphone'][role='button']")
                        .with_wait(device_wait),
                    LocatorCandidate::new("css:div[data-is-muted='false'][aria-label*='microphone']")
                        .with_wait(device_wait),
                    LocatorCandidate::new("css:button[aria-label*='Turn off microphone']")
                        .with_wait(device_wait),
                    LocatorCandidate::new("css:div[jscontroller='t2mBxb']").with_wait(device_wait),
                ],
            ),
            camera_toggle: FallbackSet::new(
                "camera_toggle",
                vec![
                    LocatorCandidate::new("css:div[role='button'][aria-label*='Turn off camera']")
                        .with_wait(device_wait),
                    LocatorCandidate::new("css:div[aria-label*='camera'][role='button']")
                        .with_wait(device_wait),
                    LocatorCandidate::new("css:div[data-is-muted='false'][aria-label*='camera']")
                        .with_wait(device_wait),
                    LocatorCandidate::new("css:button[aria-label*='Turn off camera']")
                        .with_wait(device_wait),
                    LocatorCandidate::new("css:div[jscontroller='bwqwSd']").with_wait(device_wait),
                ],
            ),
            join_control: FallbackSet::new(
                "join_control",
                vec![
                    LocatorCandidate::new("css:button[jsname='Qx7uuf']").with_wait(join_wait),
                    LocatorCandidate::new("css:button[aria-label*='Join now']").with_wait(join_wait),
                    LocatorCandidate::new("css:button[aria-label*='Ask to join']")
                        .with_wait(join_wait),
                ],
            ),
            joined_markers: FallbackSet::new(
                "joined_markers",
                vec![
                    LocatorCandidate::new("css:div[data-self-name]"),
                    LocatorCandidate::new("css:div[aria-label*='Meeting details']"),
                    LocatorCandidate::new("css:div[aria-label*='participants']"),
                ],
            ),
            microphone_muted_marker: FallbackSet::new(
                "microphone_muted_marker",
                vec![LocatorCandidate::new(
                    "css:div[data-is-muted='true'][data-tooltip-id='microphone']",
                )],
            ),
            camera_muted_marker: FallbackSet::new(
                "camera_muted_marker",
                vec![LocatorCandidate::new(
                    "css:div[data-is-muted='true'][data-tooltip-id='camera']",
                )],
            ),
        }
    }
}
