//! PlantUML diagram plugin
//!
//! Markdown documents carry PlantUML in fenced blocks. This plugin extracts
//! them, encodes each into the server's URL token format, and fetches the
//! rendered SVG.

mod encoder;
mod extractor;
mod renderer;

pub use encoder::*;
pub use extractor::*;
pub use renderer::*;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_extracted_unit_encodes_and_decodes() {
        let doc = "Intro\n\n```plantuml\nAlice -> Bob: hi\n```\n";
        let unit = extract_units(doc).next().unwrap();
        let token = encode(&unit.source).unwrap();

        assert!(token.bytes().all(|c| ALPHABET.contains(&c)));
        assert_eq!(decode(&token).unwrap(), "@startuml\nAlice -> Bob: hi\n@enduml");
    }
}
