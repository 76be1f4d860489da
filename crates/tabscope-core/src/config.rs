use std::path::PathBuf;
use std::time::Duration;

/// How the target tab is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabTarget {
    /// Position in the ordered tab collection.
    Index(usize),
    /// Case-insensitive substring matched against tab URLs, then titles.
    Keyword(String),
}

/// Selectors sampled when the caller does not supply any. Targets the
/// interactive and structural elements most page debugging starts from.
pub const DEFAULT_SELECTORS: &[&str] = &[
    "button",
    "a",
    "input",
    "h1, h2, h3",
    ".sidebar, [class*=\"sidebar\"]",
    ".header, [class*=\"header\"]",
    ".card, [class*=\"card\"]",
    ".btn, [class*=\"btn\"]",
];

pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Immutable run configuration, resolved once at startup and passed to
/// every component. No ambient state is read after this point.
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    pub host: String,
    pub port: u16,
    pub target: TabTarget,
    pub selectors: Vec<String>,
    pub capture_network: bool,
    pub capture_console: bool,
    pub capture_performance: bool,
    /// How long to let network activity settle after the reload.
    pub network_wait: Duration,
    pub max_depth: usize,
    pub output_dir: PathBuf,
}

impl ScopeConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The caller's selector list, or the default set when empty.
    pub fn effective_selectors(&self) -> Vec<String> {
        if self.selectors.is_empty() {
            DEFAULT_SELECTORS.iter().map(|s| s.to_string()).collect()
        } else {
            self.selectors.clone()
        }
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9222,
            target: TabTarget::Index(0),
            selectors: Vec::new(),
            capture_network: true,
            capture_console: true,
            capture_performance: true,
            network_wait: Duration::from_secs(5),
            max_depth: DEFAULT_MAX_DEPTH,
            output_dir: PathBuf::from("debug-output"),
        }
    }
}
