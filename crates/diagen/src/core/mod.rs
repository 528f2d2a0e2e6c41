//! Core pieces shared by every diagram source
//!
//! Errors, configuration, logging and batch accounting live here; the
//! diagram-specific work lives in [`crate::plugins`].

pub mod config;
mod error;
pub mod logging;
mod report;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use report::*;
