//! Diagen - generate SVG diagrams for documentation
//!
//! Two diagram sources are supported:
//!
//! - PlantUML blocks embedded in markdown, rendered by a PlantUML server
//! - Circuit netlists, rendered by the `netlistsvg` command
//!
//! # Quick Start
//!
//! ```rust
//! use diagen::{encode_plantuml, extract_plantuml};
//!
//! let doc = "# Flow\n\n```plantuml\nA --> B\n```\n";
//! let diagrams = extract_plantuml(doc);
//! assert_eq!(diagrams, vec!["@startuml\nA --> B\n@enduml".to_string()]);
//!
//! let token = encode_plantuml(&diagrams[0]).unwrap();
//! assert!(!token.is_empty());
//! ```
//!
//! # Batch Usage
//!
//! ```rust,no_run
//! use diagen::prelude::*;
//!
//! let config = GeneratorConfig::from_env();
//! let generator = Generator::new(config.clone());
//!
//! let renderer = PlantUmlRenderer::from_config(&config);
//! let report = generator.generate_plantuml(&renderer)?;
//! println!("{}", report.summary());
//! # Ok::<(), diagen::GenerateError>(())
//! ```

pub mod core;
pub mod plugins;

pub use crate::core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{BatchReport, GenerateError, GeneratorConfig, SkinChoice};
    pub use crate::plugins::netlist::{
        builtin_circuits, find_circuit, Circuit, Netlist, NetlistBackend, NetlistBuilder,
        NetlistRenderer,
    };
    pub use crate::plugins::orchestrator::{Generator, PlantUmlJob};
    pub use crate::plugins::plantuml::{Fetcher, HttpFetcher, PlantUmlRenderer};
}

/// Encode a PlantUML source into the server's URL token
///
/// # Example
/// ```rust
/// let token = diagen::encode_plantuml("@startuml\nA -> B\n@enduml").unwrap();
/// assert!(token
///     .chars()
///     .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
/// ```
pub fn encode_plantuml(source: &str) -> Result<String> {
    plugins::plantuml::encode(source)
}

/// Decode a server URL token back into the PlantUML source
pub fn decode_plantuml(token: &str) -> Result<String> {
    plugins::plantuml::decode(token)
}

/// Extract every PlantUML diagram in a markdown document, wrapped with
/// `@startuml`/`@enduml`
pub fn extract_plantuml(document: &str) -> Vec<String> {
    plugins::plantuml::extract_units(document)
        .map(|unit| unit.source)
        .collect()
}
