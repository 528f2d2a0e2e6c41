//! Generator configuration
//!
//! All locations and limits are carried in an explicit [`GeneratorConfig`]
//! value. Defaults match the documentation site layout; environment variables
//! and CLI flags override them in that order.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

/// Public PlantUML server, SVG endpoint
pub const DEFAULT_PLANTUML_SERVER: &str = "https://www.plantuml.com/plantuml/svg/";

/// Request timeout for a single diagram fetch
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_CONTENT_DIR: &str = "frontend/src/content";
pub const DEFAULT_DIAGRAM_OUTPUT_DIR: &str = "frontend/public/images/diagrams/generated";
pub const DEFAULT_NETLIST_OUTPUT_DIR: &str = "frontend/public/images/circuits/netlist";

/// Which netlistsvg skin to render with
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SkinChoice {
    /// The digital skin netlistsvg ships as its default
    Default,
    /// The analog skin bundled with netlistsvg, located next to the binary
    #[default]
    Analog,
    /// An explicit skin SVG
    Custom(PathBuf),
}

impl FromStr for SkinChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("Empty skin name".to_string()),
            "default" => Ok(SkinChoice::Default),
            "analog" => Ok(SkinChoice::Analog),
            path => Ok(SkinChoice::Custom(PathBuf::from(path))),
        }
    }
}

/// Configuration for a generator run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Root searched recursively for markdown documents
    pub content_dir: PathBuf,
    /// Destination of rendered PlantUML diagrams
    pub diagram_output_dir: PathBuf,
    /// Destination of netlist JSON and SVG files
    pub netlist_output_dir: PathBuf,
    /// Base URL the encoded token is appended to
    pub server_url: String,
    /// Timeout for one HTTP request
    pub timeout: Duration,
    /// Explicit netlistsvg binary; `None` searches PATH
    pub netlistsvg: Option<PathBuf>,
    pub skin: SkinChoice,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            diagram_output_dir: PathBuf::from(DEFAULT_DIAGRAM_OUTPUT_DIR),
            netlist_output_dir: PathBuf::from(DEFAULT_NETLIST_OUTPUT_DIR),
            server_url: DEFAULT_PLANTUML_SERVER.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            netlistsvg: None,
            skin: SkinChoice::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `DIAGEN_*` environment variables
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup (the environment, in practice)
    ///
    /// Unparseable values are logged and ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("DIAGEN_CONTENT_DIR") {
            self.content_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DIAGEN_OUTPUT_DIR") {
            self.diagram_output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DIAGEN_NETLIST_OUTPUT_DIR") {
            self.netlist_output_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("DIAGEN_PLANTUML_SERVER") {
            self.server_url = url;
        }
        if let Some(secs) = lookup("DIAGEN_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) => self.timeout = Duration::from_secs(secs),
                Err(_) => warn!(value = %secs, "Ignoring invalid DIAGEN_TIMEOUT_SECS"),
            }
        }
        if let Some(bin) = lookup("DIAGEN_NETLISTSVG") {
            self.netlistsvg = Some(PathBuf::from(bin));
        }
        debug!(config = ?self, "Configuration resolved");
        self
    }

    pub fn with_content_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.content_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_diagram_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.diagram_output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_netlist_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.netlist_output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_netlistsvg(mut self, binary: impl AsRef<Path>) -> Self {
        self.netlistsvg = Some(binary.as_ref().to_path_buf());
        self
    }

    pub fn with_skin(mut self, skin: SkinChoice) -> Self {
        self.skin = skin;
        self
    }
}
