//! PlantUML block extraction from markdown
//!
//! Finds fenced code blocks tagged `plantuml` or `uml` and yields their bodies
//! in document order.

use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

pub const START_MARKER: &str = "@startuml";
pub const END_MARKER: &str = "@enduml";

/// One diagram found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramUnit {
    /// 1-based position within the document
    pub index: usize,
    /// Source with start/end markers guaranteed
    pub source: String,
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // An info string may follow the tag on the same line; the body runs to
        // the next fence.
        Regex::new(r"(?s)```(?:plantuml|uml)(?:[ \t]+[^\n]*)?\r?\n(.*?)```")
            .expect("fence pattern is valid")
    })
}

/// Lazily yield the raw body of every PlantUML block, in document order
///
/// Trailing line breaks before the closing fence are dropped.
pub fn extract_diagrams(document: &str) -> impl Iterator<Item = String> + '_ {
    fence_pattern().captures_iter(document).filter_map(|caps| {
        let body = caps.get(1)?;
        trace!(start = body.start(), end = body.end(), "Found PlantUML block");
        Some(body.as_str().trim_end_matches(['\n', '\r']).to_string())
    })
}

/// Add `@startuml` / `@enduml` when missing, never duplicating them
pub fn ensure_markers(source: &str) -> String {
    let mut wrapped =
        String::with_capacity(source.len() + START_MARKER.len() + END_MARKER.len() + 2);
    if !source.contains(START_MARKER) {
        wrapped.push_str(START_MARKER);
        wrapped.push('\n');
    }
    wrapped.push_str(source);
    if !source.contains(END_MARKER) {
        wrapped.push('\n');
        wrapped.push_str(END_MARKER);
    }
    wrapped
}

/// Extract, wrap and number every diagram in a document
pub fn extract_units(document: &str) -> impl Iterator<Item = DiagramUnit> + '_ {
    extract_diagrams(document)
        .enumerate()
        .map(|(i, body)| DiagramUnit {
            index: i + 1,
            source: ensure_markers(&body),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block_is_wrapped() {
        let doc = "# Title\n\n```plantuml\nA --> B\n```\n";
        let units: Vec<_> = extract_units(doc).collect();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].index, 1);
        assert_eq!(units[0].source, "@startuml\nA --> B\n@enduml");
    }

    #[test]
    fn test_uml_tag_and_info_string() {
        let doc = "```uml title=\"flow\"\nX -> Y\n```";
        let bodies: Vec<_> = extract_diagrams(doc).collect();
        assert_eq!(bodies, vec!["X -> Y".to_string()]);
    }

    #[test]
    fn test_other_languages_are_ignored() {
        let doc = "```rust\nfn main() {}\n```\n```mermaid\ngraph TD; A-->B\n```";
        assert_eq!(extract_diagrams(doc).count(), 0);
    }

    #[test]
    fn test_no_blocks_is_not_an_error() {
        assert_eq!(extract_units("plain prose, no fences").count(), 0);
        assert_eq!(extract_units("").count(), 0);
    }

    #[test]
    fn test_existing_markers_are_kept() {
        let source = "@startuml\nA -> B\n@enduml";
        assert_eq!(ensure_markers(source), source);
    }

    #[test]
    fn test_only_missing_marker_is_added() {
        assert_eq!(ensure_markers("@startuml\nA -> B"), "@startuml\nA -> B\n@enduml");
        assert_eq!(ensure_markers("A -> B\n@enduml"), "@startuml\nA -> B\n@enduml");
    }

    #[test]
    fn test_wrapping_is_idempotent() {
        let once = ensure_markers("A -> B");
        assert_eq!(ensure_markers(&once), once);
    }

    #[test]
    fn test_first_body_line_is_kept() {
        let doc = "```plantuml\nAlice -> Bob\nBob -> Carol\n```";
        let bodies: Vec<_> = extract_diagrams(doc).collect();
        assert_eq!(bodies, vec!["Alice -> Bob\nBob -> Carol".to_string()]);
    }

    #[test]
    fn test_tag_must_end_the_word() {
        let doc = "```umlet\nnot a diagram\n```";
        assert_eq!(extract_diagrams(doc).count(), 0);
    }

    #[test]
    fn test_crlf_body() {
        let doc = "```plantuml\r\nA -> B\r\n```";
        let bodies: Vec<_> = extract_diagrams(doc).collect();
        assert_eq!(bodies, vec!["A -> B".to_string()]);
    }
}
