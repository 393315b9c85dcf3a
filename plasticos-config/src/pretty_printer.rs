//! Pretty-printer for [`ConfigDocument`]: re-emits a parsed document as DSL
//! source text. Used for round-trip tests (`parse(print(doc)) == doc`) and
//! for writing back a document after programmatic edits (e.g. an
//! operator-facing tool that adds a `synonym` entry).

use crate::parser::{ConfigDocument, Exposure, Statement};
use std::fmt::Write as _;

pub fn print_document(doc: &ConfigDocument) -> String {
    let mut out = String::new();
    for statement in &doc.statements {
        print_statement(statement, &mut out);
        out.push('\n');
    }
    out
}

fn print_statement(statement: &Statement, out: &mut String) {
    match statement {
        Statement::Synonym { from, to } => {
            let _ = write!(out, "synonym \"{from}\" -> \"{to}\"");
        }
        Statement::Weight { name, value } => {
            let _ = write!(out, "weight {name}: {value}");
        }
        Statement::Tag { block_name, exposure } => {
            let exposure = match exposure {
                Exposure::Strategic => "strategic",
                Exposure::DomainSafe => "domain-safe",
            };
            let _ = write!(out, "tag {block_name}: {exposure}");
        }
        Statement::Timeout { name, seconds } => {
            let _ = write!(out, "timeout {name}: {seconds}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    #[test]
    fn round_trips_a_document() {
        let src = "synonym \"blown film\" -> \"film\"\nweight rule_fit: 0.25\ntag rule_gate_check: domain-safe\ntimeout job_timeout_seconds: 300\n";
        let doc = Parser::parse_str(src).unwrap();
        let printed = print_document(&doc);
        let reparsed = Parser::parse_str(&printed).unwrap();
        assert_eq!(doc, reparsed);
    }
}
