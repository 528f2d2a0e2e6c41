//! Command-line interface for the diagen utility
//!
//! Batch commands (`plantuml`, `netlist`) exit successfully even when some
//! diagrams fail; the summary line reports how many were generated.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use diagen::core::logging::init_logging;
use diagen::plugins::netlist::{builtin_circuits, find_circuit, load_circuit_files, Circuit};
use diagen::plugins::plantuml::extract_units;
use diagen::prelude::*;
use diagen::{decode_plantuml, encode_plantuml};

/// Diagen - generate SVG diagrams for documentation
#[derive(Parser)]
#[command(name = "diagen")]
#[command(about = "Generate SVG diagrams from PlantUML blocks and circuit netlists")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render every PlantUML block found in the markdown content tree
    Plantuml {
        /// Directory searched recursively for *.md files
        #[arg(long)]
        content_dir: Option<PathBuf>,

        /// Directory the SVG files are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// PlantUML server base URL (the encoded diagram is appended)
        #[arg(long)]
        server: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Write circuit netlists as JSON and convert them with netlistsvg
    Netlist {
        /// Directory the JSON and SVG files are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Path to the netlistsvg executable (default: search PATH)
        #[arg(long)]
        netlistsvg: Option<PathBuf>,

        /// Skin: `default`, `analog`, or a path to a skin SVG
        #[arg(long)]
        skin: Option<SkinChoice>,

        /// Built-in circuit to render (repeatable; default: all, unless --input is given)
        #[arg(long = "circuit")]
        circuits: Vec<String>,

        /// Additional netlist JSON file to render (repeatable)
        #[arg(short, long = "input")]
        inputs: Vec<PathBuf>,
    },

    /// Print the server URL token for a PlantUML source
    Encode {
        /// Input file containing PlantUML (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the PlantUML source behind a server URL token
    Decode {
        /// Input file containing the token (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the PlantUML diagrams found in a markdown document
    Extract {
        /// Markdown file to scan (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// List the built-in circuits
    Circuits {
        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Main CLI application
pub struct DiagenApp {
    config: GeneratorConfig,
}

impl DiagenApp {
    /// Create an application configured from `DIAGEN_*` environment variables
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::from_env())
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over the flag defaults
        let log_level_str = std::env::var("DIAGEN_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| cli.log_level.as_str().to_string());
        let log_format_str = std::env::var("DIAGEN_LOG_FORMAT")
            .ok()
            .unwrap_or_else(|| cli.log_format.as_str().to_string());

        if let Err(e) = init_logging(Some(&log_level_str), Some(&log_format_str)) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("diagen v{}", env!("CARGO_PKG_VERSION"));
        }
        debug!(command = ?cli.command, "Dispatching command");

        match cli.command {
            Commands::Plantuml {
                content_dir,
                output_dir,
                server,
                timeout,
            } => self.plantuml_command(content_dir, output_dir, server, timeout, cli.verbose),
            Commands::Netlist {
                output_dir,
                netlistsvg,
                skin,
                circuits,
                inputs,
            } => self.netlist_command(output_dir, netlistsvg, skin, circuits, inputs, cli.verbose),
            Commands::Encode { input } => self.encode_command(input),
            Commands::Decode { input } => self.decode_command(input),
            Commands::Extract { input } => self.extract_command(input, cli.verbose),
            Commands::Circuits { json } => self.circuits_command(json),
        }
    }

    /// Flags override the environment-derived configuration
    fn plantuml_config(
        &self,
        content_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        server: Option<String>,
        timeout: Option<u64>,
    ) -> GeneratorConfig {
        let mut config = self.config.clone();
        if let Some(dir) = content_dir {
            config = config.with_content_dir(dir);
        }
        if let Some(dir) = output_dir {
            config = config.with_diagram_output_dir(dir);
        }
        if let Some(url) = server {
            config = config.with_server_url(url);
        }
        if let Some(secs) = timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }

    fn plantuml_command(
        &self,
        content_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        server: Option<String>,
        timeout: Option<u64>,
        verbose: bool,
    ) -> Result<()> {
        let config = self.plantuml_config(content_dir, output_dir, server, timeout);
        if verbose {
            eprintln!("Server: {}", config.server_url);
            eprintln!("Output: {}", config.diagram_output_dir.display());
        }

        let renderer = PlantUmlRenderer::from_config(&config);
        let generator = Generator::new(config);
        let report = generator.generate_plantuml(&renderer)?;

        print_report(&report);
        println!(
            "Diagrams saved to: {}",
            generator.config().diagram_output_dir.display()
        );
        Ok(())
    }

    fn netlist_config(
        &self,
        output_dir: Option<PathBuf>,
        netlistsvg: Option<PathBuf>,
        skin: Option<SkinChoice>,
    ) -> GeneratorConfig {
        let mut config = self.config.clone();
        if let Some(dir) = output_dir {
            config = config.with_netlist_output_dir(dir);
        }
        if let Some(binary) = netlistsvg {
            config = config.with_netlistsvg(binary);
        }
        if let Some(skin) = skin {
            config = config.with_skin(skin);
        }
        config
    }

    /// Built-ins selected by name (all when none named) plus user files
    ///
    /// Unreadable user files are returned as failures in the report.
    fn select_circuits(
        names: &[String],
        inputs: &[PathBuf],
    ) -> Result<(Vec<Circuit>, BatchReport)> {
        let mut circuits = if names.is_empty() && !inputs.is_empty() {
            Vec::new()
        } else if names.is_empty() {
            builtin_circuits()
        } else {
            names
                .iter()
                .map(|name| find_circuit(name))
                .collect::<diagen::Result<Vec<_>>>()?
        };

        let (loaded, report) = load_circuit_files(inputs);
        circuits.extend(loaded);
        Ok((circuits, report))
    }

    fn netlist_command(
        &self,
        output_dir: Option<PathBuf>,
        netlistsvg: Option<PathBuf>,
        skin: Option<SkinChoice>,
        names: Vec<String>,
        inputs: Vec<PathBuf>,
        verbose: bool,
    ) -> Result<()> {
        let config = self.netlist_config(output_dir, netlistsvg, skin);
        let (circuits, mut report) = Self::select_circuits(&names, &inputs)?;
        if verbose {
            eprintln!("Rendering {} circuit(s)", circuits.len());
        }

        let renderer = NetlistRenderer::from_config(&config)?;
        let generator = Generator::new(config);
        report.merge(generator.generate_netlists(&circuits, &renderer)?);

        print_report(&report);
        println!(
            "Circuits saved to: {}",
            generator.config().netlist_output_dir.display()
        );
        Ok(())
    }

    fn encode_command(&self, input: Option<PathBuf>) -> Result<()> {
        let source = self.read_input(input)?;
        println!("{}", encode_plantuml(&source)?);
        Ok(())
    }

    fn decode_command(&self, input: Option<PathBuf>) -> Result<()> {
        let token = self.read_input(input)?;
        let source = decode_plantuml(token.trim())?;
        print!("{}", source);
        if !source.ends_with('\n') {
            println!();
        }
        io::stdout().flush()?;
        Ok(())
    }

    fn extract_command(&self, input: Option<PathBuf>, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;
        let units: Vec<_> = extract_units(&content).collect();
        if verbose {
            eprintln!("Found {} diagram(s)", units.len());
        }
        for unit in units {
            println!("--- diagram {} ---", unit.index);
            println!("{}", unit.source);
        }
        Ok(())
    }

    fn circuits_command(&self, json: bool) -> Result<()> {
        let circuits = builtin_circuits();
        if json {
            let entries: Vec<_> = circuits
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "name": c.name,
                        "description": c.description,
                        "cells": c.netlist.cell_count(),
                    })
                })
                .collect();
            let listing = serde_json::json!({
                "circuits": entries,
                "total": circuits.len(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            println!("Built-in circuits:");
            for circuit in &circuits {
                println!("  {:<16} - {}", circuit.name, circuit.description);
            }
            println!();
            println!("Total: {} circuit(s)", circuits.len());
        }
        Ok(())
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }
}

impl Default for DiagenApp {
    fn default() -> Self {
        Self::new()
    }
}

fn print_report(report: &BatchReport) {
    for failure in report.failures() {
        eprintln!("  failed: {} ({})", failure.name, failure.reason);
    }
    println!("{}", report.summary());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parsing_plantuml_command() {
        let args = vec![
            "diagen",
            "plantuml",
            "--content-dir",
            "docs",
            "--output-dir",
            "public/diagrams",
            "--server",
            "http://localhost:8080/svg/",
            "--timeout",
            "5",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Plantuml {
                content_dir,
                output_dir,
                server,
                timeout,
            } => {
                assert_eq!(content_dir.unwrap().to_string_lossy(), "docs");
                assert_eq!(output_dir.unwrap().to_string_lossy(), "public/diagrams");
                assert_eq!(server.as_deref(), Some("http://localhost:8080/svg/"));
                assert_eq!(timeout, Some(5));
            }
            _ => panic!("Expected Plantuml command"),
        }
    }

    #[test]
    fn test_cli_parsing_netlist_command() {
        let args = vec![
            "diagen",
            "netlist",
            "--circuit",
            "rc_lowpass",
            "--circuit",
            "rlc_series",
            "--skin",
            "default",
            "-i",
            "custom.json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Netlist {
                circuits,
                skin,
                inputs,
                netlistsvg,
                ..
            } => {
                assert_eq!(circuits, vec!["rc_lowpass", "rlc_series"]);
                assert_eq!(skin, Some(SkinChoice::Default));
                assert_eq!(inputs, vec![PathBuf::from("custom.json")]);
                assert!(netlistsvg.is_none());
            }
            _ => panic!("Expected Netlist command"),
        }
    }

    #[test]
    fn test_cli_parsing_skin_path() {
        let args = vec!["diagen", "netlist", "--skin", "skins/mono.svg"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Netlist { skin, .. } => {
                assert_eq!(skin, Some(SkinChoice::Custom(PathBuf::from("skins/mono.svg"))));
            }
            _ => panic!("Expected Netlist command"),
        }
    }

    #[test]
    fn test_cli_parsing_circuits_command() {
        let cli = Cli::try_parse_from(vec!["diagen", "circuits", "--json"]).unwrap();
        match cli.command {
            Commands::Circuits { json } => assert!(json),
            _ => panic!("Expected Circuits command"),
        }
    }

    #[test]
    fn test_verbose_and_log_flags() {
        let args = vec!["diagen", "--verbose", "--log-level", "debug", "encode"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_flags_override_config() {
        let app = DiagenApp::with_config(GeneratorConfig::default());
        let config = app.plantuml_config(
            Some(PathBuf::from("docs")),
            None,
            Some("http://local/svg/".to_string()),
            Some(3),
        );
        assert_eq!(config.content_dir, PathBuf::from("docs"));
        assert_eq!(config.server_url, "http://local/svg/");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(
            config.diagram_output_dir,
            GeneratorConfig::default().diagram_output_dir
        );
    }

    #[test]
    fn test_select_all_builtins_by_default() {
        let (circuits, report) = DiagenApp::select_circuits(&[], &[]).unwrap();
        assert_eq!(circuits.len(), 4);
        assert!(report.is_clean());
    }

    #[test]
    fn test_select_unknown_circuit_fails() {
        let result = DiagenApp::select_circuits(&["flux_capacitor".to_string()], &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_select_input_file_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buffer.json");
        let json = r#"{"modules":{"buffer":{"ports":{"A":{"direction":"input","bits":[2]}},"cells":{}}}}"#;
        fs::write(&path, json).unwrap();

        let (circuits, _) = DiagenApp::select_circuits(&[], &[path]).unwrap();
        assert_eq!(circuits.len(), 1);
        assert_eq!(circuits[0].name, "buffer");
    }

    #[test]
    fn test_select_keeps_going_past_bad_input() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("buffer.json");
        let bad = dir.path().join("broken.json");
        fs::write(&good, r#"{"modules":{"buffer":{}}}"#).unwrap();
        fs::write(&bad, "not json").unwrap();

        let names = vec!["rc_lowpass".to_string()];
        let (circuits, report) = DiagenApp::select_circuits(&names, &[bad, good]).unwrap();
        let selected: Vec<_> = circuits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(selected, vec!["rc_lowpass", "buffer"]);
        assert_eq!(report.failed(), 1);
        assert!(report.failures()[0].name.ends_with("broken.json"));
    }

    #[test]
    fn test_read_input_from_file() {
        let app = DiagenApp::with_config(GeneratorConfig::default());
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("diagram.puml");
        fs::write(&file_path, "A -> B").unwrap();

        assert_eq!(app.read_input(Some(file_path)).unwrap(), "A -> B");
    }

    #[test]
    fn test_read_input_missing_file() {
        let app = DiagenApp::with_config(GeneratorConfig::default());
        let err = app
            .read_input(Some(PathBuf::from("/no/such/file.md")))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));
    }

    #[test]
    fn test_circuits_command_formats() {
        let app = DiagenApp::with_config(GeneratorConfig::default());
        assert!(app.circuits_command(true).is_ok());
        assert!(app.circuits_command(false).is_ok());
    }
}
