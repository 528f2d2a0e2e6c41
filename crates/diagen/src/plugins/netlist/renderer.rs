//! netlistsvg process runner
//!
//! Runs `netlistsvg <netlist.json> -o <out.svg> [--skin <skin.svg>]` and
//! treats exit status 0 as success.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, span, warn, Level};

use crate::core::{GenerateError, GeneratorConfig, Result, SkinChoice};

pub const NETLISTSVG: &str = "netlistsvg";

/// Turns a netlist JSON file into an SVG file
pub trait NetlistBackend {
    fn render(&self, json_path: &Path, svg_path: &Path) -> Result<()>;
}

/// Resolve an external tool: the explicit override if given, else a PATH search
pub fn locate_tool(name: &str, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(GenerateError::ToolNotFound {
                tool: path.display().to_string(),
            })
        };
    }

    env::var_os("PATH")
        .and_then(|paths| find_in_path(name, &paths))
        .ok_or_else(|| GenerateError::ToolNotFound {
            tool: name.to_string(),
        })
}

/// Search a PATH-style list for an executable named `name`
pub fn find_in_path(name: &str, paths: &OsStr) -> Option<PathBuf> {
    env::split_paths(paths)
        .flat_map(|dir| candidate_names(name).map(move |file| dir.join(file)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(windows)]
fn candidate_names(name: &str) -> impl Iterator<Item = String> + '_ {
    // npm installs a .cmd shim next to the POSIX script
    [".cmd", ".exe", ""]
        .into_iter()
        .map(move |ext| format!("{}{}", name, ext))
}

#[cfg(not(windows))]
fn candidate_names(name: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(name.to_string())
}

/// Find the analog skin shipped inside the netlistsvg package
///
/// Covers the npm global layouts: a symlinked `bin/netlistsvg.js` inside the
/// package, `<prefix>/node_modules` next to Windows shims, and
/// `<prefix>/lib/node_modules` on Unix.
pub fn locate_analog_skin(binary: &Path) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(real) = fs::canonicalize(binary) {
        if let Some(package) = real.parent().and_then(Path::parent) {
            candidates.push(package.join("lib").join("analog.svg"));
        }
    }
    if let Some(bin_dir) = binary.parent() {
        let package_lib = Path::new("netlistsvg").join("lib").join("analog.svg");
        candidates.push(bin_dir.join("node_modules").join(&package_lib));
        if let Some(prefix) = bin_dir.parent() {
            candidates.push(prefix.join("lib").join("node_modules").join(&package_lib));
        }
    }

    candidates.into_iter().find(|path| path.is_file())
}

/// Runs the netlistsvg command line
#[derive(Debug, Clone, PartialEq)]
pub struct NetlistRenderer {
    binary: PathBuf,
    skin: Option<PathBuf>,
}

impl NetlistRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            skin: None,
        }
    }

    pub fn with_skin(mut self, skin: impl Into<PathBuf>) -> Self {
        self.skin = Some(skin.into());
        self
    }

    /// Locate the binary and skin described by the configuration
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let binary = locate_tool(NETLISTSVG, config.netlistsvg.as_deref())?;
        info!(binary = %binary.display(), "Using netlistsvg");

        let skin = match &config.skin {
            SkinChoice::Default => None,
            SkinChoice::Custom(path) => Some(path.clone()),
            SkinChoice::Analog => {
                let found = locate_analog_skin(&binary);
                if found.is_none() {
                    warn!("Analog skin not found next to netlistsvg, using its default skin");
                }
                found
            }
        };
        if let Some(skin) = &skin {
            info!(skin = %skin.display(), "Using skin");
        }

        Ok(Self { binary, skin })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn skin(&self) -> Option<&Path> {
        self.skin.as_deref()
    }

    fn command(&self, json_path: &Path, svg_path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(json_path).arg("-o").arg(svg_path);
        if let Some(skin) = &self.skin {
            cmd.arg("--skin").arg(skin);
        }
        cmd
    }
}

impl NetlistBackend for NetlistRenderer {
    fn render(&self, json_path: &Path, svg_path: &Path) -> Result<()> {
        let run_span = span!(Level::DEBUG, "netlistsvg", json = %json_path.display());
        let _enter = run_span.enter();

        let output = self.command(json_path, svg_path).output()?;
        if output.status.success() {
            debug!(svg = %svg_path.display(), "netlistsvg succeeded");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(GenerateError::process_error(
                self.binary.display().to_string(),
                output.status.code(),
                stderr,
            ))
        }
    }
}
