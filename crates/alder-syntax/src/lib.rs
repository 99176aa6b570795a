//! Lexing and parsing for Alder source code.
//!
//! The semantic core consumes the [`alder_ast::Program`] this crate
//! produces; everything downstream of the parser treats the tree as
//! annotate-only.

pub mod lexer;
pub mod parser;
pub mod token;

use alder_ast::{Expr, FileId, Program};
use alder_diag::Diagnostic;

pub use lexer::{lex, lex_at};
pub use parser::{parse_expr, parse_program};
pub use token::{TemplatePart, Token, TokenKind};

/// Lex and parse a whole program from source text.
pub fn parse_program_source(source: &str, file: FileId) -> Result<Program, Vec<Diagnostic>> {
    let tokens = lex(source, file)?;
    parse_program(tokens, file)
}

/// Lex and parse a single expression from source text.
pub fn parse_expr_source(source: &str, file: FileId) -> Result<Expr, Vec<Diagnostic>> {
    let tokens = lex(source, file)?;
    parse_expr(tokens, file)
}
