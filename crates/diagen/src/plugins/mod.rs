//! Diagram sources
//!
//! Each plugin knows how to turn one kind of diagram description into SVG;
//! the orchestrator drives them over a batch.

pub mod netlist;
pub mod orchestrator;
pub mod plantuml;

pub use orchestrator::*;
