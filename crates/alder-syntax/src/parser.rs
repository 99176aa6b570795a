//! Recursive descent parser with precedence climbing for Alder.

use alder_ast::*;
use alder_diag::{Category, Diagnostic, SourceLocation};

use crate::lexer::lex_at;
use crate::token::{TemplatePart, Token, TokenKind};

/// Parse a whole program from a token stream.
pub fn parse_program(tokens: Vec<Token>, file: FileId) -> Result<Program, Vec<Diagnostic>> {
    let mut parser = Parser::new(tokens, file);
    let program = parser.program();
    if parser.errors.is_empty() {
        Ok(program)
    } else {
        Err(parser.errors)
    }
}

/// Parse a single expression from a token stream.
pub fn parse_expr(tokens: Vec<Token>, file: FileId) -> Result<Expr, Vec<Diagnostic>> {
    let mut parser = Parser::new(tokens, file);
    parser.skip_newlines();
    let expr = parser.expression();
    parser.skip_newlines();
    if !parser.at_eof() {
        parser.error_at_current("unexpected token after expression");
    }
    match expr {
        Some(e) if parser.errors.is_empty() => Ok(e),
        Some(_) => Err(parser.errors),
        None => {
            if parser.errors.is_empty() {
                parser.error_at_current("expected expression");
            }
            Err(parser.errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: FileId,
    errors: Vec<Diagnostic>,
}

impl Parser {
    fn new(tokens: Vec<Token>, file: FileId) -> Self {
        Self {
            tokens,
            pos: 0,
            file,
            errors: Vec::new(),
        }
    }

    // -- Token plumbing --

    fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream ends with Eof"))
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.pos == 0 {
            self.current_span()
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    fn nth_kind(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    /// The nth upcoming token kind, ignoring newlines.
    fn nth_kind_skipping_newlines(&self, mut n: usize) -> Option<&TokenKind> {
        let mut idx = self.pos;
        loop {
            match self.tokens.get(idx).map(|t| &t.kind) {
                Some(TokenKind::Newline) => idx += 1,
                Some(kind) => {
                    if n == 0 {
                        return Some(kind);
                    }
                    n -= 1;
                    idx += 1;
                }
                None => return None,
            }
        }
    }

    fn at_eof(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Option<()> {
        if self.eat(kind) {
            Some(())
        } else {
            self.error_at_current(format!("expected {expected}"));
            None
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.current_kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    fn location(&self, span: Span) -> SourceLocation {
        SourceLocation {
            file_id: span.file.0,
            start: span.start,
            end: span.end,
        }
    }

    fn error_at_current(&mut self, message: impl Into<String>) {
        let span = self.current_span();
        self.errors
            .push(Diagnostic::error(Category::Syntax, message).at(self.location(span)));
    }

    fn ident(&mut self) -> Option<Ident> {
        let span = self.current_span();
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current("expected identifier");
                None
            }
        }
    }

    fn upper_ident(&mut self) -> Option<Ident> {
        let span = self.current_span();
        match self.current_kind().clone() {
            TokenKind::UpperIdent(name) => {
                self.advance();
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current("expected capitalized identifier");
                None
            }
        }
    }

    // -- Program-level parsing --

    fn program(&mut self) -> Program {
        let start = self.current_span();
        self.skip_newlines();

        let module = if self.eat(&TokenKind::Module) {
            self.module_decl()
        } else {
            None
        };
        self.skip_newlines();

        let mut imports = Vec::new();
        while self.eat(&TokenKind::Import) {
            if let Some(import) = self.import_decl() {
                imports.push(import);
            }
            self.skip_newlines();
        }

        let mut body = Vec::new();
        while !self.at_eof() {
            if let Some(statement) = self.statement() {
                body.push(statement);
            } else {
                // Skip the offending token so a cascade of errors cannot
                // stall the parser.
                self.advance();
            }
            self.skip_newlines();
        }

        let end = self.previous_span();
        Program {
            module,
            imports,
            body,
            scope: None,
            span: start.merge(end),
        }
    }

    fn module_decl(&mut self) -> Option<ModuleDecl> {
        let start = self.previous_span();
        let mut segments = vec![self.upper_ident()?.name];
        while self.eat(&TokenKind::Dot) {
            segments.push(self.upper_ident()?.name);
        }
        Some(ModuleDecl {
            segments,
            span: start.merge(self.previous_span()),
        })
    }

    fn import_decl(&mut self) -> Option<ImportDecl> {
        let start = self.previous_span();
        let mut segments = vec![self.upper_ident()?.name];
        while self.eat(&TokenKind::Dot) {
            segments.push(self.upper_ident()?.name);
        }
        let mut exposing = Vec::new();
        if self.eat(&TokenKind::Expose) {
            self.expect(&TokenKind::LParen, "`(` after `expose`")?;
            loop {
                let span = self.current_span();
                match self.current_kind().clone() {
                    TokenKind::Ident(name) | TokenKind::UpperIdent(name) => {
                        self.advance();
                        exposing.push(Ident::new(name, span));
                    }
                    _ => {
                        self.error_at_current("expected exposed name");
                        return None;
                    }
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen, "`)` closing the expose list")?;
        }
        Some(ImportDecl {
            segments,
            exposing,
            span: start.merge(self.previous_span()),
        })
    }

    fn statement(&mut self) -> Option<Statement> {
        match self.current_kind() {
            TokenKind::Const => self.const_decl().map(Statement::Const),
            TokenKind::TypeKw => self.type_decl().map(Statement::Type),
            TokenKind::Enum => self.enum_decl().map(Statement::Enum),
            _ => {
                let before = self.errors.len();
                match self.expression() {
                    Some(expr) => Some(Statement::Expr(expr)),
                    None => {
                        if self.errors.len() == before {
                            self.error_at_current("expected statement");
                        }
                        None
                    }
                }
            }
        }
    }

    // -- Declarations --

    fn const_decl(&mut self) -> Option<ConstDecl> {
        let start = self.current_span();
        self.expect(&TokenKind::Const, "`const`")?;
        let binding = self.binding()?;
        let annotation = if self.eat(&TokenKind::Colon) {
            Some(self.type_annotation()?)
        } else {
            None
        };
        self.expect(&TokenKind::Eq, "`=` in const declaration")?;
        self.skip_newlines();
        let value = self.expression()?;
        Some(ConstDecl {
            binding,
            annotation,
            span: start.merge(value.span),
            value: Box::new(value),
        })
    }

    fn binding(&mut self) -> Option<Binding> {
        let start = self.current_span();
        match self.current_kind().clone() {
            TokenKind::Ident(_) => Some(Binding::Name(self.ident()?)),
            TokenKind::LBrace => {
                self.advance();
                let names = self.binding_names(&TokenKind::RBrace)?;
                self.expect(&TokenKind::RBrace, "`}` closing the destructuring pattern")?;
                Some(Binding::Object(names, start.merge(self.previous_span())))
            }
            TokenKind::LBracket => {
                self.advance();
                let names = self.binding_names(&TokenKind::RBracket)?;
                self.expect(&TokenKind::RBracket, "`]` closing the destructuring pattern")?;
                Some(Binding::Array(names, start.merge(self.previous_span())))
            }
            TokenKind::UpperIdent(_) => {
                let enum_name = self.upper_ident()?;
                self.expect(&TokenKind::Dot, "`.` in enum destructuring")?;
                let member = self.upper_ident()?;
                self.expect(&TokenKind::LParen, "`(` in enum destructuring")?;
                let binding = self.ident()?;
                self.expect(&TokenKind::RParen, "`)` closing the enum destructuring")?;
                Some(Binding::EnumMember {
                    enum_name,
                    member,
                    binding,
                    span: start.merge(self.previous_span()),
                })
            }
            _ => {
                self.error_at_current("expected a binding pattern");
                None
            }
        }
    }

    fn binding_names(&mut self, closing: &TokenKind) -> Option<Vec<Ident>> {
        let mut names = Vec::new();
        self.skip_newlines();
        while !self.check(closing) {
            names.push(self.ident()?);
            self.skip_newlines();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        Some(names)
    }

    fn type_decl(&mut self) -> Option<TypeDecl> {
        let start = self.current_span();
        self.expect(&TokenKind::TypeKw, "`type`")?;
        let name = self.upper_ident()?;
        let params = self.generic_params()?;
        self.expect(&TokenKind::Eq, "`=` in type declaration")?;
        self.skip_newlines();
        let value = self.type_annotation()?;
        Some(TypeDecl {
            name,
            params,
            span: start.merge(value.span),
            value,
            scope: None,
        })
    }

    fn enum_decl(&mut self) -> Option<EnumDecl> {
        let start = self.current_span();
        self.expect(&TokenKind::Enum, "`enum`")?;
        let name = self.upper_ident()?;
        let params = self.generic_params()?;
        self.expect(&TokenKind::LBrace, "`{` opening the enum body")?;
        self.skip_newlines();

        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let member_start = self.current_span();
            let member_name = self.upper_ident()?;
            let mut member_params = Vec::new();
            if self.eat(&TokenKind::LParen) {
                loop {
                    member_params.push(self.type_annotation()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RParen, "`)` closing the member parameters")?;
            }
            members.push(EnumMemberDecl {
                name: member_name,
                params: member_params,
                span: member_start.merge(self.previous_span()),
            });
            self.skip_newlines();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(&TokenKind::RBrace, "`}` closing the enum body")?;
        Some(EnumDecl {
            name,
            params,
            members,
            scope: None,
            span: start.merge(self.previous_span()),
        })
    }

    fn generic_params(&mut self) -> Option<Vec<Ident>> {
        let mut params = Vec::new();
        if self.eat(&TokenKind::Lt) {
            loop {
                params.push(self.upper_ident()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Gt, "`>` closing the type parameters")?;
        }
        Some(params)
    }

    // -- Type annotations --

    fn type_annotation(&mut self) -> Option<TypeAnnotation> {
        let start = self.current_span();
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Some(Spanned::new(TypeAnnotationKind::Named(name), start))
            }
            TokenKind::UpperIdent(name) => {
                self.advance();
                if self.eat(&TokenKind::Lt) {
                    let mut args = Vec::new();
                    loop {
                        args.push(self.type_annotation()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::Gt, "`>` closing the type arguments")?;
                    Some(Spanned::new(
                        TypeAnnotationKind::Generic { base: name, args },
                        start.merge(self.previous_span()),
                    ))
                } else {
                    Some(Spanned::new(TypeAnnotationKind::Named(name), start))
                }
            }
            TokenKind::LBrace => {
                self.advance();
                self.skip_newlines();
                let mut props = Vec::new();
                while !self.check(&TokenKind::RBrace) {
                    let field = self.ident()?;
                    self.expect(&TokenKind::Colon, "`:` after the field name")?;
                    let value = self.type_annotation()?;
                    props.push((field, value));
                    self.skip_newlines();
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                    self.skip_newlines();
                }
                self.expect(&TokenKind::RBrace, "`}` closing the record type")?;
                Some(Spanned::new(
                    TypeAnnotationKind::Object(props),
                    start.merge(self.previous_span()),
                ))
            }
            TokenKind::Colon => {
                let mut alts = Vec::new();
                self.advance();
                alts.push(self.upper_ident()?);
                while self.eat(&TokenKind::Pipe) {
                    self.skip_newlines();
                    self.expect(&TokenKind::Colon, "`:` before the variant tag")?;
                    alts.push(self.upper_ident()?);
                }
                Some(Spanned::new(
                    TypeAnnotationKind::Variant(alts),
                    start.merge(self.previous_span()),
                ))
            }
            _ => {
                self.error_at_current("expected type expression");
                None
            }
        }
    }

    // -- Expressions --

    fn expression(&mut self) -> Option<Expr> {
        self.binary_expr(0)
    }

    fn binary_expr(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.unary_expr()?;

        loop {
            let Some((op, l_bp, r_bp)) = binary_op(self.current_kind()) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.advance();
            self.skip_newlines();
            let rhs = self.binary_expr(r_bp)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                },
                span,
            );
        }

        Some(lhs)
    }

    fn unary_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.current_kind() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Negate),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.unary_expr()?;
            let span = start.merge(operand.span);
            return Some(Spanned::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.postfix_expr()
    }

    fn postfix_expr(&mut self) -> Option<Expr> {
        let mut expr = self.primary_expr()?;

        loop {
            // A `(` or `[` on the next line starts a new statement, not a
            // call on the previous expression.
            match self.current_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.call_args()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Spanned::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let field_span = self.current_span();
                    let field = match self.current_kind().clone() {
                        TokenKind::Ident(name) | TokenKind::UpperIdent(name) => {
                            self.advance();
                            Ident::new(name, field_span)
                        }
                        _ => {
                            self.error_at_current("expected field name after `.`");
                            return None;
                        }
                    };
                    let span = expr.span.merge(field_span);
                    expr = Spanned::new(
                        ExprKind::Dot {
                            left: Box::new(expr),
                            field,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    self.skip_newlines();
                    let index = self.expression()?;
                    self.skip_newlines();
                    self.expect(&TokenKind::RBracket, "`]` closing the index")?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Spanned::new(
                        ExprKind::Index {
                            left: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }

        Some(expr)
    }

    fn call_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::RParen) {
            args.push(self.expression()?);
            self.skip_newlines();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(&TokenKind::RParen, "`)` closing the arguments")?;
        Some(args)
    }

    fn primary_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        match self.current_kind().clone() {
            TokenKind::Number(value) => {
                self.advance();
                Some(Spanned::new(ExprKind::Lit(Lit::Number(value)), start))
            }
            TokenKind::True => {
                self.advance();
                Some(Spanned::new(ExprKind::Lit(Lit::Bool(true)), start))
            }
            TokenKind::False => {
                self.advance();
                Some(Spanned::new(ExprKind::Lit(Lit::Bool(false)), start))
            }
            TokenKind::Template(parts) => {
                self.advance();
                let chunks = self.template_chunks(parts)?;
                Some(Spanned::new(ExprKind::Template(chunks), start))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Some(Spanned::new(
                    ExprKind::Ident(Ident::new(name, start)),
                    start,
                ))
            }
            TokenKind::UpperIdent(name) => {
                self.advance();
                // `Enum.Member` (optionally applied) is an enum call; a bare
                // capitalized name is a value reference.
                if self.check(&TokenKind::Dot)
                    && matches!(self.nth_kind(1), Some(TokenKind::UpperIdent(_)))
                {
                    self.advance();
                    let member = self.upper_ident()?;
                    let args = if self.eat(&TokenKind::LParen) {
                        self.call_args()?
                    } else {
                        Vec::new()
                    };
                    let span = start.merge(self.previous_span());
                    Some(Spanned::new(
                        ExprKind::EnumCall {
                            enum_name: Ident::new(name, start),
                            member,
                            args,
                        },
                        span,
                    ))
                } else {
                    Some(Spanned::new(
                        ExprKind::Ident(Ident::new(name, start)),
                        start,
                    ))
                }
            }
            TokenKind::LParen => {
                if self.function_ahead() {
                    self.function_expr()
                } else {
                    self.advance();
                    self.skip_newlines();
                    let inner = self.expression()?;
                    self.skip_newlines();
                    self.expect(&TokenKind::RParen, "`)` closing the group")?;
                    Some(inner)
                }
            }
            TokenKind::LBrace => {
                if self.object_ahead() {
                    self.object_literal()
                } else {
                    let block = self.block()?;
                    let span = block.span;
                    Some(Spanned::new(ExprKind::Block(block), span))
                }
            }
            TokenKind::LBracket => {
                self.advance();
                self.skip_newlines();
                let mut items = Vec::new();
                while !self.check(&TokenKind::RBracket) {
                    items.push(self.expression()?);
                    self.skip_newlines();
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                    self.skip_newlines();
                }
                self.expect(&TokenKind::RBracket, "`]` closing the array")?;
                Some(Spanned::new(
                    ExprKind::Array(items),
                    start.merge(self.previous_span()),
                ))
            }
            TokenKind::If => self.if_expr(),
            TokenKind::Match => self.match_expr(),
            _ => {
                self.error_at_current("expected expression");
                None
            }
        }
    }

    fn template_chunks(&mut self, parts: Vec<TemplatePart>) -> Option<Vec<TemplateChunk>> {
        let mut chunks = Vec::new();
        for part in parts {
            match part {
                TemplatePart::Text(text) => chunks.push(TemplateChunk::Text(text)),
                TemplatePart::Expr(source, offset) => {
                    let tokens = match lex_at(&source, self.file, offset) {
                        Ok(tokens) => tokens,
                        Err(errors) => {
                            self.errors.extend(errors);
                            return None;
                        }
                    };
                    match parse_expr(tokens, self.file) {
                        Ok(expr) => chunks.push(TemplateChunk::Expr(expr)),
                        Err(errors) => {
                            self.errors.extend(errors);
                            return None;
                        }
                    }
                }
            }
        }
        Some(chunks)
    }

    /// Decide whether the `(` at the current position starts a function
    /// expression by scanning ahead for `) =>` or `) :`.
    fn function_ahead(&self) -> bool {
        debug_assert!(self.check(&TokenKind::LParen));
        let mut idx = self.pos + 1;
        let mut depth = 1usize;
        while let Some(token) = self.tokens.get(idx) {
            match &token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(idx + 1).map(|t| &t.kind),
                            Some(TokenKind::FatArrow) | Some(TokenKind::Colon)
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            idx += 1;
        }
        false
    }

    fn function_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::LParen, "`(` opening the parameter list")?;
        let mut params = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::RParen) {
            let spread = self.eat(&TokenKind::Spread);
            let name = self.ident()?;
            let annotation = if self.eat(&TokenKind::Colon) {
                Some(self.type_annotation()?)
            } else {
                None
            };
            params.push(Param {
                name,
                annotation,
                spread,
            });
            self.skip_newlines();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(&TokenKind::RParen, "`)` closing the parameter list")?;

        let return_annotation = if self.eat(&TokenKind::Colon) {
            Some(self.type_annotation()?)
        } else {
            None
        };
        self.expect(&TokenKind::FatArrow, "`=>` before the function body")?;
        self.skip_newlines();
        let body = self.expression()?;
        let span = start.merge(body.span);
        Some(Spanned::new(
            ExprKind::Function(FunctionExpr {
                name: None,
                params,
                return_annotation,
                body: Box::new(body),
                scope: None,
            }),
            span,
        ))
    }

    /// Decide whether the `{` at the current position starts an object
    /// literal (`{ name: ... }`) rather than a block.
    fn object_ahead(&self) -> bool {
        debug_assert!(self.check(&TokenKind::LBrace));
        matches!(
            (
                self.nth_kind_skipping_newlines(1),
                self.nth_kind_skipping_newlines(2)
            ),
            (Some(TokenKind::Ident(_)), Some(TokenKind::Colon))
        )
    }

    fn object_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace, "`{` opening the object")?;
        self.skip_newlines();
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let name = self.ident()?;
            self.expect(&TokenKind::Colon, "`:` after the field name")?;
            self.skip_newlines();
            let value = self.expression()?;
            fields.push(ObjectField { name, value });
            self.skip_newlines();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(&TokenKind::RBrace, "`}` closing the object")?;
        Some(Spanned::new(
            ExprKind::Object(fields),
            start.merge(self.previous_span()),
        ))
    }

    fn block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace, "`{` opening the block")?;
        self.skip_newlines();
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            if let Some(statement) = self.statement() {
                body.push(statement);
            } else {
                self.advance();
            }
            self.skip_newlines();
        }
        self.expect(&TokenKind::RBrace, "`}` closing the block")?;
        Some(Block {
            body,
            scope: None,
            span: start.merge(self.previous_span()),
        })
    }

    fn if_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::If, "`if`")?;
        let condition = self.expression()?;
        let then_branch = self.block()?;
        self.skip_newlines();
        self.expect(&TokenKind::Else, "`else` branch")?;
        self.skip_newlines();
        let else_branch = self.block()?;
        let span = start.merge(else_branch.span);
        Some(Spanned::new(
            ExprKind::If {
                condition: Box::new(condition),
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn match_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::Match, "`match`")?;
        let subject = self.expression()?;
        self.expect(&TokenKind::LBrace, "`{` opening the match body")?;
        self.skip_newlines();

        let mut clauses = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            let clause_start = self.current_span();
            let pattern = self.expression()?;
            self.expect(&TokenKind::Arrow, "`->` after the pattern")?;
            self.skip_newlines();
            let body = self.expression()?;
            clauses.push(MatchClause {
                span: clause_start.merge(body.span),
                pattern,
                body,
                scope: None,
            });
            self.skip_newlines();
        }
        self.expect(&TokenKind::RBrace, "`}` closing the match body")?;
        if clauses.is_empty() {
            self.errors.push(
                Diagnostic::error(Category::Syntax, "match expression has no clauses")
                    .at(self.location(start)),
            );
        }
        let span = start.merge(self.previous_span());
        Some(Spanned::new(
            ExprKind::Match {
                subject: Box::new(subject),
                clauses,
            },
            span,
        ))
    }
}

/// Binding powers for binary operators. Higher binds tighter; `**` is
/// right-associative.
fn binary_op(kind: &TokenKind) -> Option<(BinOp, u8, u8)> {
    let entry = match kind {
        TokenKind::PipePipe => (BinOp::Or, 1, 2),
        TokenKind::AmpAmp => (BinOp::And, 3, 4),
        TokenKind::EqEq => (BinOp::Equal, 5, 6),
        TokenKind::BangEq => (BinOp::NotEqual, 5, 6),
        TokenKind::Lt => (BinOp::LessThan, 7, 8),
        TokenKind::LtEq => (BinOp::LessOrEqual, 7, 8),
        TokenKind::Gt => (BinOp::GreaterThan, 7, 8),
        TokenKind::GtEq => (BinOp::GreaterOrEqual, 7, 8),
        TokenKind::Plus => (BinOp::Add, 9, 10),
        TokenKind::Minus => (BinOp::Subtract, 9, 10),
        TokenKind::Star => (BinOp::Multiply, 11, 12),
        TokenKind::Slash => (BinOp::Divide, 11, 12),
        TokenKind::StarStar => (BinOp::Power, 14, 13),
        _ => return None,
    };
    Some(entry)
}
