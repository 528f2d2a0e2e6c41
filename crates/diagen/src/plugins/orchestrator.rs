//! Batch orchestration
//!
//! Drives each plugin over its whole input set:
//! markdown tree → PlantUML units → server → SVG files, and
//! circuits → JSON files → netlistsvg → SVG files.
//!
//! Units are processed one at a time. A unit that fails is logged and counted;
//! only setup problems (missing content directory, unwritable output
//! directory) stop a batch.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, span, trace, warn, Level};

use crate::core::{BatchReport, GenerateError, GeneratorConfig, Result};
use crate::plugins::netlist::{Circuit, NetlistBackend};
use crate::plugins::plantuml::{extract_units, Fetcher, PlantUmlRenderer};

/// One PlantUML diagram waiting to be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantUmlJob {
    /// Output file name, e.g. `networking_tcp_diagram_1.svg`
    pub file_name: String,
    /// Source with start/end markers
    pub source: String,
}

/// `{category}_{file-stem}_diagram_{index}.svg`, category being the parent
/// directory name
pub fn output_file_name(document: &Path, index: usize) -> String {
    let category = document
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    let stem = document
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}_{}_diagram_{}.svg", category, stem, index)
}

/// Every `*.md` file below `root`, sorted
///
/// Symlinked directories are not followed. A subdirectory that cannot be read
/// is logged and skipped; only an unreadable `root` is an error.
pub fn find_markdown_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(GenerateError::MissingDirectory {
            path: root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    let mut pending = Vec::new();
    collect_markdown(root, &mut files, &mut pending)?;

    while let Some(dir) = pending.pop() {
        if let Err(err) = collect_markdown(&dir, &mut files, &mut pending) {
            warn!(dir = %dir.display(), error = %err, "Skipping unreadable directory");
        }
    }
    files.sort();
    Ok(files)
}

/// Markdown files of one directory; its subdirectories go to `subdirs`
fn collect_markdown(
    dir: &Path,
    files: &mut Vec<PathBuf>,
    subdirs: &mut Vec<PathBuf>,
) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // file_type() describes the link itself, not its target
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_symlink() && path.is_dir() {
            debug!(path = %path.display(), "Not following symlinked directory");
        } else if path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    Ok(())
}

/// Output names produced by more than one job, in first-seen order
pub fn duplicate_file_names(jobs: &[PlantUmlJob]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for job in jobs {
        let name = job.file_name.as_str();
        if !seen.insert(name) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    duplicates
}

/// Runs the generators described by a [`GeneratorConfig`]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Scan the content tree and render every PlantUML block found
    pub fn generate_plantuml<F: Fetcher>(
        &self,
        renderer: &PlantUmlRenderer<F>,
    ) -> Result<BatchReport> {
        let batch_span = span!(
            Level::INFO,
            "generate_plantuml",
            content_dir = %self.config.content_dir.display()
        );
        let _enter = batch_span.enter();

        let documents = find_markdown_files(&self.config.content_dir)?;
        info!(
            documents = documents.len(),
            server = renderer.server_url(),
            "Found markdown files"
        );

        let mut report = BatchReport::new();
        let mut jobs = Vec::new();
        for document in &documents {
            match self.collect_jobs(document) {
                Ok(found) => jobs.extend(found),
                Err(err) => {
                    warn!(document = %document.display(), error = %err, "Skipping document");
                    report.record_failure(document.display().to_string(), err);
                }
            }
        }

        for name in duplicate_file_names(&jobs) {
            warn!(
                diagram = %name,
                "Several documents map to this output name; later ones overwrite it"
            );
        }

        report.merge(self.render_plantuml_jobs(&jobs, renderer)?);
        Ok(report)
    }

    /// PlantUML jobs for one markdown document
    pub fn collect_jobs(&self, document: &Path) -> Result<Vec<PlantUmlJob>> {
        let bytes = fs::read(document)?;
        let content = String::from_utf8(bytes).map_err(|err| {
            GenerateError::encode_error(format!("{} is not UTF-8: {}", document.display(), err))
        })?;

        let jobs: Vec<_> = extract_units(&content)
            .map(|unit| PlantUmlJob {
                file_name: output_file_name(document, unit.index),
                source: unit.source,
            })
            .collect();

        if jobs.is_empty() {
            debug!(document = %document.display(), "No PlantUML diagrams found");
        } else {
            info!(document = %document.display(), diagrams = jobs.len(), "Found diagrams");
        }
        Ok(jobs)
    }

    /// Render and write each job in order
    pub fn render_plantuml_jobs<F: Fetcher>(
        &self,
        jobs: &[PlantUmlJob],
        renderer: &PlantUmlRenderer<F>,
    ) -> Result<BatchReport> {
        let output_dir = &self.config.diagram_output_dir;
        fs::create_dir_all(output_dir)?;

        let mut report = BatchReport::new();
        for (position, job) in jobs.iter().enumerate() {
            info!(
                diagram = %job.file_name,
                position = position + 1,
                total = jobs.len(),
                "Generating diagram"
            );
            let output = output_dir.join(&job.file_name);
            let result = renderer
                .render(&job.source)
                .and_then(|svg| fs::write(&output, svg).map_err(GenerateError::from));
            match result {
                Ok(()) => {
                    trace!(path = %output.display(), "Saved diagram");
                    report.record_success(output);
                }
                Err(err) => {
                    warn!(diagram = %job.file_name, error = %err, "Failed to generate diagram");
                    report.record_failure(job.file_name.clone(), err);
                }
            }
        }

        info!(%report, "PlantUML batch finished");
        Ok(report)
    }

    /// Write each circuit's JSON netlist and convert it to SVG
    pub fn generate_netlists<B: NetlistBackend>(
        &self,
        circuits: &[Circuit],
        backend: &B,
    ) -> Result<BatchReport> {
        let batch_span = span!(
            Level::INFO,
            "generate_netlists",
            output_dir = %self.config.netlist_output_dir.display()
        );
        let _enter = batch_span.enter();

        let output_dir = &self.config.netlist_output_dir;
        fs::create_dir_all(output_dir)?;

        let mut report = BatchReport::new();
        for circuit in circuits {
            info!(circuit = %circuit.name, "Generating circuit");
            match self.render_circuit(circuit, backend) {
                Ok(svg_path) => report.record_success(svg_path),
                Err(err) => {
                    warn!(circuit = %circuit.name, error = %err, "Failed to generate circuit");
                    report.record_failure(circuit.name.clone(), err);
                }
            }
        }

        info!(%report, "Netlist batch finished");
        Ok(report)
    }

    fn render_circuit<B: NetlistBackend>(&self, circuit: &Circuit, backend: &B) -> Result<PathBuf> {
        let output_dir = &self.config.netlist_output_dir;
        let json_path = output_dir.join(format!("{}.json", circuit.name));
        let svg_path = output_dir.join(format!("{}.svg", circuit.name));

        circuit.netlist.validate()?;
        fs::write(&json_path, circuit.netlist.to_json_pretty()?)?;
        debug!(path = %json_path.display(), "JSON netlist saved");

        backend.render(&json_path, &svg_path)?;
        Ok(svg_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(file_name: &str) -> PlantUmlJob {
        PlantUmlJob {
            file_name: file_name.to_string(),
            source: "@startuml\n@enduml".to_string(),
        }
    }

    #[test]
    fn test_same_category_and_stem_collide() {
        let a = output_file_name(Path::new("content/a/x/foo.md"), 1);
        let b = output_file_name(Path::new("content/b/x/foo.md"), 1);
        assert_eq!(a, b);

        let jobs = vec![job(&a), job("x_bar_diagram_1.svg"), job(&b), job(&a)];
        assert_eq!(duplicate_file_names(&jobs), vec!["x_foo_diagram_1.svg"]);
    }

    #[test]
    fn test_distinct_names_have_no_duplicates() {
        let jobs = vec![job("a_b_diagram_1.svg"), job("a_b_diagram_2.svg")];
        assert!(duplicate_file_names(&jobs).is_empty());
    }

    #[test]
    fn test_output_file_name() {
        let name = output_file_name(Path::new("content/networking/tcp-handshake.md"), 2);
        assert_eq!(name, "networking_tcp-handshake_diagram_2.svg");
    }

    #[test]
    fn test_output_file_name_without_parent() {
        assert_eq!(output_file_name(Path::new("notes.md"), 1), "root_notes_diagram_1.svg");
    }

    #[test]
    fn test_missing_content_dir() {
        let err = find_markdown_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, GenerateError::MissingDirectory { .. }));
    }
}
