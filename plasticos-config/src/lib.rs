//! PlasticOS Configuration DSL
//!
//! A small declarative language for the four tunables spec.md leaves as
//! operator policy rather than code: synonym normalization entries (§4.1),
//! `MatchWeights` overrides (§4.5), Reasoning Block Registry exposure tags
//! (§4.6), and named pipeline timeouts (§6). Mirrors the teacher's
//! lexer → parser → pretty-printer architecture, retargeted from a
//! memory-policy DSL to this domain's much smaller statement set.
//!
//! ```text
//! DSL source (.plasticos-config)
//!     ↓
//! Lexer (tokenize)
//!     ↓
//! Parser (build ConfigDocument)
//!     ↓
//! compile() -> SynonymTable + MatchWeights + TagTable + TimeoutTable
//!     ↓ (or, round-tripping edits back to source)
//! Pretty-printer
//! ```

pub mod compile;
pub mod lexer;
pub mod parser;
pub mod pretty_printer;

pub use compile::{compile, CompileError, CompiledConfig, TagTable, TimeoutTable};
pub use parser::{ConfigDocument, Exposure, ParseError, Parser, Statement};
pub use pretty_printer::print_document;

/// Parses and compiles a document in one call — the entry point most
/// callers (config loading at startup) use.
pub fn load(source: &str) -> Result<CompiledConfig, LoadError> {
    let doc = Parser::parse_str(source)?;
    let compiled = compile(&doc)?;
    Ok(compiled)
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_minimal_document() {
        let compiled = load(
            r#"
            synonym "blown film" -> "film"
            weight vector_similarity: 0.4
            tag strategic_decomposition: strategic
            timeout job_timeout_seconds: 300
            "#,
        )
        .unwrap();
        assert_eq!(compiled.synonyms.normalize("Blown Film"), "film");
    }

    #[test]
    fn surfaces_parse_errors_through_load() {
        assert!(load("weight").is_err());
    }
}
