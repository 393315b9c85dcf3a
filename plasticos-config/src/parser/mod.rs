//! Recursive-descent parser and AST for the configuration DSL.

mod ast;
mod parser;

pub use ast::{ConfigDocument, Exposure, Statement};
pub use parser::{ParseError, Parser};
