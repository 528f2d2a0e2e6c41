//! Circuit netlist plugin
//!
//! Netlists are written as JSON and converted to schematic SVGs by the
//! external `netlistsvg` tool.

mod catalog;
mod database;
mod renderer;

pub use catalog::*;
pub use database::*;
pub use renderer::*;
