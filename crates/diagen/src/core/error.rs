//! Core error types for diagram generation
//!
//! Every failure a single diagram can hit maps to one of these variants. The
//! batch driver turns them into report entries instead of aborting the run.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

/// Core error types for diagram generation
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Fetch error: {url} returned HTTP {status}")]
    Fetch { url: String, status: u16 },

    #[error("Transport error: {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Process error: {program} exited with {}: {stderr}", exit_label(.code))]
    Process {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Tool not found: {tool} (searched PATH)")]
    ToolNotFound { tool: String },

    #[error("Netlist error: {message}")]
    Netlist { message: String },

    #[error("Unknown circuit: {name}")]
    UnknownCircuit { name: String },

    #[error("Missing directory: {}", .path.display())]
    MissingDirectory { path: PathBuf },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "signal".to_string(),
    }
}

impl GenerateError {
    /// Create a new encode error
    pub fn encode_error(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode_error(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a new fetch error for a non-success HTTP status
    pub fn fetch_error(url: impl Into<String>, status: u16) -> Self {
        Self::Fetch {
            url: url.into(),
            status,
        }
    }

    /// Create a new transport error (connection, DNS, timeout)
    pub fn transport_error(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new process error from a failed external command
    pub fn process_error(
        program: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Process {
            program: program.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Create a new netlist error
    pub fn netlist_error(message: impl Into<String>) -> Self {
        Self::Netlist {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for GenerateError {
    fn from(err: serde_json::Error) -> Self {
        Self::netlist_error(err.to_string())
    }
}
