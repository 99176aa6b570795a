//! Token types produced by the Alder lexer.

use alder_ast::Span;

/// A token with its kind and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// A part of a template literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text segment, with escapes already applied.
    Text(String),
    /// Embedded expression source text and its absolute byte offset, to be
    /// lexed and parsed by the parser.
    Expr(String, u32),
}

/// The kind of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // -- Literals --
    Number(f64),
    /// Template literal: `` `hello ${name}` ``.
    Template(Vec<TemplatePart>),

    // -- Identifiers --
    /// Lowercase-initial identifier: `foo`, `barBaz`
    Ident(String),
    /// PascalCase identifier: `Some`, `User`
    UpperIdent(String),

    // -- Keywords --
    Module,
    Import,
    Expose,
    Const,
    TypeKw,
    Enum,
    Match,
    If,
    Else,
    True,
    False,

    // -- Operators --
    Plus,     // +
    Minus,    // -
    Star,     // *
    StarStar, // **
    Slash,    // /
    EqEq,     // ==
    BangEq,   // !=
    Lt,       // <
    LtEq,     // <=
    Gt,       // >
    GtEq,     // >=
    AmpAmp,   // &&
    PipePipe, // ||
    Bang,     // !

    // -- Assignment / arrows --
    Eq,       // =
    Arrow,    // ->
    FatArrow, // =>
    Spread,   // ...

    // -- Delimiters --
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]

    // -- Punctuation --
    Colon, // :
    Comma, // ,
    Dot,   // .
    Pipe,  // |

    // -- Structural --
    Newline,
    Eof,
}

impl TokenKind {
    /// Returns `true` if this token is a newline.
    pub fn is_newline(&self) -> bool {
        matches!(self, TokenKind::Newline)
    }
}
