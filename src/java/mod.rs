/// In-crate tree access layer: AST, parser, printer and edit transactions
pub mod ast;
pub mod edit;
pub mod parser;
pub mod printer;

pub use parser::{parse_method, parse_source, parse_statement};
