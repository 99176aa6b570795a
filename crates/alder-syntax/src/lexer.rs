//! Hand-written lexer for Alder source code.

use alder_ast::{FileId, Span};
use alder_diag::{Category, Diagnostic, SourceLocation};

use crate::token::{TemplatePart, Token, TokenKind};

/// Lex source text into a sequence of tokens.
///
/// Returns `Ok(tokens)` where the last token is always `Eof`.
/// Returns `Err` with diagnostics for lexical errors.
pub fn lex(source: &str, file: FileId) -> Result<Vec<Token>, Vec<Diagnostic>> {
    lex_at(source, file, 0)
}

/// Lex a source fragment whose first byte sits at `base` within the file.
///
/// Used for template-literal interpolations so their token spans stay
/// anchored to the enclosing file.
pub fn lex_at(source: &str, file: FileId, base: u32) -> Result<Vec<Token>, Vec<Diagnostic>> {
    let mut lexer = Lexer::new(source, file, base);
    lexer.scan_all();
    if lexer.errors.is_empty() {
        Ok(lexer.tokens)
    } else {
        Err(lexer.errors)
    }
}

struct Lexer<'s> {
    source: &'s str,
    chars: Vec<char>,
    pos: usize,
    /// Byte offset of `pos` within `source`.
    byte_pos: usize,
    file: FileId,
    base: u32,
    tokens: Vec<Token>,
    errors: Vec<Diagnostic>,
}

impl<'s> Lexer<'s> {
    fn new(source: &'s str, file: FileId, base: u32) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            byte_pos: 0,
            file,
            base,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn scan_all(&mut self) {
        while self.pos < self.chars.len() {
            self.scan_token();
        }
        let at = self.offset();
        self.push_at(TokenKind::Eof, at, at);
    }

    fn offset(&self) -> u32 {
        self.base + self.byte_pos as u32
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        self.byte_pos += c.len_utf8();
        Some(c)
    }

    fn push_at(&mut self, kind: TokenKind, start: u32, end: u32) {
        self.tokens.push(Token {
            kind,
            span: Span::new(self.file, start, end),
        });
    }

    fn error(&mut self, start: u32, end: u32, message: impl Into<String>) {
        self.errors.push(
            Diagnostic::error(Category::Syntax, message).at(SourceLocation {
                file_id: self.file.0,
                start,
                end,
            }),
        );
    }

    fn scan_token(&mut self) {
        let start = self.offset();
        let c = match self.bump() {
            Some(c) => c,
            None => return,
        };

        match c {
            ' ' | '\t' | '\r' => {}
            '\n' => self.push_at(TokenKind::Newline, start, start + 1),
            '/' => {
                if self.peek() == Some('*') {
                    self.bump();
                    self.skip_block_comment(start);
                } else {
                    self.push_at(TokenKind::Slash, start, self.offset());
                }
            }
            '`' => self.scan_template(start),
            '+' => self.push_at(TokenKind::Plus, start, self.offset()),
            '-' => {
                if self.peek() == Some('>') {
                    self.bump();
                    self.push_at(TokenKind::Arrow, start, self.offset());
                } else {
                    self.push_at(TokenKind::Minus, start, self.offset());
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.bump();
                    self.push_at(TokenKind::StarStar, start, self.offset());
                } else {
                    self.push_at(TokenKind::Star, start, self.offset());
                }
            }
            '=' => match self.peek() {
                Some('=') => {
                    self.bump();
                    self.push_at(TokenKind::EqEq, start, self.offset());
                }
                Some('>') => {
                    self.bump();
                    self.push_at(TokenKind::FatArrow, start, self.offset());
                }
                _ => self.push_at(TokenKind::Eq, start, self.offset()),
            },
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    self.push_at(TokenKind::BangEq, start, self.offset());
                } else {
                    self.push_at(TokenKind::Bang, start, self.offset());
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    self.push_at(TokenKind::LtEq, start, self.offset());
                } else {
                    self.push_at(TokenKind::Lt, start, self.offset());
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    self.push_at(TokenKind::GtEq, start, self.offset());
                } else {
                    self.push_at(TokenKind::Gt, start, self.offset());
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                    self.push_at(TokenKind::AmpAmp, start, self.offset());
                } else {
                    self.error(start, self.offset(), "expected `&&`");
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                    self.push_at(TokenKind::PipePipe, start, self.offset());
                } else {
                    self.push_at(TokenKind::Pipe, start, self.offset());
                }
            }
            '(' => self.push_at(TokenKind::LParen, start, self.offset()),
            ')' => self.push_at(TokenKind::RParen, start, self.offset()),
            '{' => self.push_at(TokenKind::LBrace, start, self.offset()),
            '}' => self.push_at(TokenKind::RBrace, start, self.offset()),
            '[' => self.push_at(TokenKind::LBracket, start, self.offset()),
            ']' => self.push_at(TokenKind::RBracket, start, self.offset()),
            ':' => self.push_at(TokenKind::Colon, start, self.offset()),
            ',' => self.push_at(TokenKind::Comma, start, self.offset()),
            '.' => {
                if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
                    self.bump();
                    self.bump();
                    self.push_at(TokenKind::Spread, start, self.offset());
                } else {
                    self.push_at(TokenKind::Dot, start, self.offset());
                }
            }
            c if c.is_ascii_digit() => self.scan_number(start, c),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_word(start, c),
            other => {
                self.error(
                    start,
                    self.offset(),
                    format!("unexpected character `{other}`"),
                );
            }
        }
    }

    fn skip_block_comment(&mut self, start: u32) {
        let mut depth = 1usize;
        while depth > 0 {
            match self.bump() {
                Some('/') if self.peek() == Some('*') => {
                    self.bump();
                    depth += 1;
                }
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    depth -= 1;
                }
                Some(_) => {}
                None => {
                    self.error(start, self.offset(), "unterminated comment");
                    return;
                }
            }
        }
    }

    fn scan_number(&mut self, start: u32, first: char) {
        let mut text = String::new();
        text.push(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        match text.parse::<f64>() {
            Ok(value) => self.push_at(TokenKind::Number(value), start, self.offset()),
            Err(_) => self.error(start, self.offset(), format!("invalid number `{text}`")),
        }
    }

    fn scan_word(&mut self, start: u32, first: char) {
        let mut text = String::new();
        text.push(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = match text.as_str() {
            "module" => TokenKind::Module,
            "import" => TokenKind::Import,
            "expose" => TokenKind::Expose,
            "const" => TokenKind::Const,
            "type" => TokenKind::TypeKw,
            "enum" => TokenKind::Enum,
            "match" => TokenKind::Match,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ if first.is_ascii_uppercase() => TokenKind::UpperIdent(text),
            _ => TokenKind::Ident(text),
        };
        self.push_at(kind, start, self.offset());
    }

    /// Scan a backtick template literal into text and expression parts.
    ///
    /// Expression parts keep their raw source text plus its absolute offset;
    /// the parser lexes and parses them on demand.
    fn scan_template(&mut self, start: u32) {
        let mut parts: Vec<TemplatePart> = Vec::new();
        let mut text = String::new();

        loop {
            match self.bump() {
                None => {
                    self.error(start, self.offset(), "unterminated template literal");
                    return;
                }
                Some('`') => break,
                Some('\\') => match self.bump() {
                    Some(escaped) => text.push(escaped),
                    None => {
                        self.error(start, self.offset(), "unterminated template literal");
                        return;
                    }
                },
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    let expr_begin = self.byte_pos;
                    let expr_offset = self.offset();
                    let mut depth = 1usize;
                    loop {
                        match self.bump() {
                            None => {
                                self.error(start, self.offset(), "unterminated `${` span");
                                return;
                            }
                            Some('{') => depth += 1,
                            Some('}') => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            Some(_) => {}
                        }
                    }
                    // byte_pos now sits just past the closing brace.
                    let expr_end = self.byte_pos - 1;
                    let expr_src = self.source[expr_begin..expr_end].to_string();
                    parts.push(TemplatePart::Expr(expr_src, expr_offset));
                }
                Some(c) => text.push(c),
            }
        }

        if !text.is_empty() || parts.is_empty() {
            parts.push(TemplatePart::Text(text));
        }
        self.push_at(TokenKind::Template(parts), start, self.offset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source, FileId(0))
            .expect("lexing should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_const_declaration() {
        let toks = kinds("const foo: number = 4");
        assert_eq!(
            toks,
            vec![
                TokenKind::Const,
                TokenKind::Ident("foo".to_string()),
                TokenKind::Colon,
                TokenKind::Ident("number".to_string()),
                TokenKind::Eq,
                TokenKind::Number(4.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_operators() {
        let toks = kinds("** -> => == != <= >= && || ...");
        assert_eq!(
            toks,
            vec![
                TokenKind::StarStar,
                TokenKind::Arrow,
                TokenKind::FatArrow,
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Spread,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_upper_and_lower_identifiers() {
        let toks = kinds("Option value");
        assert_eq!(
            toks,
            vec![
                TokenKind::UpperIdent("Option".to_string()),
                TokenKind::Ident("value".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_template_with_span() {
        let toks = kinds("`hello ${name}!`");
        match &toks[0] {
            TokenKind::Template(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], TemplatePart::Text("hello ".to_string()));
                match &parts[1] {
                    TemplatePart::Expr(src, offset) => {
                        assert_eq!(src, "name");
                        assert_eq!(*offset, 9);
                    }
                    other => panic!("expected expression part, got {other:?}"),
                }
                assert_eq!(parts[2], TemplatePart::Text("!".to_string()));
            }
            other => panic!("expected template token, got {other:?}"),
        }
    }

    #[test]
    fn lex_plain_template_is_single_text_part() {
        let toks = kinds("`just text`");
        match &toks[0] {
            TokenKind::Template(parts) => {
                assert_eq!(parts, &[TemplatePart::Text("just text".to_string())]);
            }
            other => panic!("expected template token, got {other:?}"),
        }
    }

    #[test]
    fn comments_are_skipped_and_may_nest() {
        let toks = kinds("1 /* one /* two */ still one */ 2");
        assert_eq!(
            toks,
            vec![
                TokenKind::Number(1.0),
                TokenKind::Number(2.0),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn newlines_are_tokens() {
        let toks = kinds("a\nb");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Newline,
                TokenKind::Ident("b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_template_is_an_error() {
        let err = lex("`oops", FileId(0)).unwrap_err();
        assert_eq!(err[0].category, Category::Syntax);
        assert!(err[0].message.contains("unterminated"));
    }
}
