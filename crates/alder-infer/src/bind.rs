//! The binder: walks the AST and constructs the scope graph.
//!
//! Every lexical region gains a scope; every declaration installs a value or
//! type symbol in the owning scope. Declarations without an annotation get a
//! fresh type variable. Redeclaration and shadowing are rejected here; no
//! later phase mutates the scope structure.

use alder_ast::{
    Binding, Block, ConstDecl, EnumDecl, Expr, ExprKind, FunctionExpr, Ident, MatchClause,
    Program, ScopeId, Statement, TypeAnnotation, TypeAnnotationKind, TypeDecl,
};
use alder_diag::{Category, Diagnostic, DiagnosticError};
use alder_types::{
    EnumMemberType, EnumType, FunctionType, ObjectType, ParamType, PropDef, Type,
};

use crate::scope::ScopeGraph;
use crate::span_to_location;

/// Bind a whole program: build its scope tree and install every declaration.
///
/// Fails on the first duplicate declaration; the scope graph is not usable
/// for collection after a failure.
pub fn bind_program(graph: &mut ScopeGraph, program: &mut Program) -> Result<(), DiagnosticError> {
    let mut binder = Binder { graph };
    binder.program(program)
}

/// Lower a syntactic type annotation to a semantic type.
///
/// Native names lower directly; user-defined names become identifiers the
/// unifier resolves through the scope graph.
pub fn lower_annotation(annotation: &TypeAnnotation) -> Type {
    match &annotation.node {
        TypeAnnotationKind::Named(name) => match name.as_str() {
            "string" => Type::STRING,
            "number" => Type::NUMBER,
            "boolean" => Type::BOOLEAN,
            other => Type::Ident(other.to_string()),
        },
        TypeAnnotationKind::Generic { base, args } => Type::Reference {
            base: Box::new(Type::Ident(base.clone())),
            args: args.iter().map(lower_annotation).collect(),
        },
        TypeAnnotationKind::Object(props) => Type::Object(ObjectType {
            ident: None,
            props: props
                .iter()
                .map(|(name, value)| PropDef {
                    name: name.name.clone(),
                    value: lower_annotation(value),
                })
                .collect(),
        }),
        TypeAnnotationKind::Variant(alts) => Type::Variant(
            alts.iter()
                .map(|alt| Type::Literal(alt.name.clone()))
                .collect(),
        ),
    }
}

struct Binder<'g> {
    graph: &'g mut ScopeGraph,
}

impl Binder<'_> {
    fn program(&mut self, program: &mut Program) -> Result<(), DiagnosticError> {
        let scope = self.graph.new_child_scope(ScopeGraph::ROOT);
        program.scope = Some(scope);
        for statement in &mut program.body {
            self.statement(scope, statement)?;
        }
        Ok(())
    }

    fn statement(&mut self, scope: ScopeId, statement: &mut Statement) -> Result<(), DiagnosticError> {
        match statement {
            Statement::Const(decl) => self.const_decl(scope, decl),
            Statement::Type(decl) => self.type_decl(scope, decl),
            Statement::Enum(decl) => self.enum_decl(scope, decl),
            Statement::Expr(expr) => self.expression(scope, expr),
        }
    }

    fn const_decl(&mut self, scope: ScopeId, decl: &mut ConstDecl) -> Result<(), DiagnosticError> {
        match &decl.binding {
            Binding::Name(ident) => {
                let ty = match &decl.annotation {
                    Some(annotation) => lower_annotation(annotation),
                    None => self.graph.fresh_type_var(scope),
                };
                self.graph.declare_value(scope, &ident.name, ty, ident.span)?;
                // Forward the binding's identifier so the function's type
                // symbol gets a stable name.
                if let ExprKind::Function(func) = &mut decl.value.node {
                    if func.name.is_none() {
                        func.name = Some(ident.name.clone());
                    }
                }
            }
            Binding::Object(names, _) | Binding::Array(names, _) => {
                for name in names {
                    let var = self.graph.fresh_type_var(scope);
                    self.graph.declare_value(scope, &name.name, var, name.span)?;
                }
            }
            Binding::EnumMember { binding, .. } => {
                let var = self.graph.fresh_type_var(scope);
                self.graph
                    .declare_value(scope, &binding.name, var, binding.span)?;
            }
        }
        self.expression(scope, &mut decl.value)
    }

    fn type_decl(&mut self, scope: ScopeId, decl: &mut TypeDecl) -> Result<(), DiagnosticError> {
        check_unique(
            decl.params.iter(),
            Category::DuplicateTypeParameter,
            "type parameter",
        )?;
        let lowered = lower_annotation(&decl.value);
        if let Type::Variant(alts) = &lowered {
            check_unique_variants(alts, decl.value.span)?;
        }
        self.graph
            .declare_type(scope, &decl.name.name, lowered, decl.name.span)?;

        if !decl.params.is_empty() {
            let param_scope = self.graph.new_child_scope(scope);
            decl.scope = Some(param_scope);
            for param in &decl.params {
                self.install_type_param(param_scope, param)?;
            }
        }
        Ok(())
    }

    fn enum_decl(&mut self, scope: ScopeId, decl: &mut EnumDecl) -> Result<(), DiagnosticError> {
        check_unique(
            decl.members.iter().map(|m| &m.name),
            Category::DuplicateEnumMember,
            "enum member",
        )?;
        check_unique(
            decl.params.iter(),
            Category::DuplicateTypeParameter,
            "type parameter",
        )?;

        let param_scope = self.graph.new_child_scope(scope);
        decl.scope = Some(param_scope);
        for param in &decl.params {
            self.install_type_param(param_scope, param)?;
        }

        let enum_type = EnumType {
            id: self.graph.fresh_enum_id(),
            ident: decl.name.name.clone(),
            params: decl.params.iter().map(|p| p.name.clone()).collect(),
            members: decl
                .members
                .iter()
                .map(|member| EnumMemberType {
                    ident: member.name.name.clone(),
                    params: member.params.iter().map(lower_annotation).collect(),
                })
                .collect(),
        };

        // The declaration name doubles as a value namespace, so the
        // constructors are reachable from expressions.
        self.graph.declare_type(
            scope,
            &decl.name.name,
            Type::Enum(enum_type.clone()),
            decl.name.span,
        )?;
        self.graph.declare_value(
            scope,
            &decl.name.name,
            Type::Enum(enum_type),
            decl.name.span,
        )?;
        Ok(())
    }

    /// Install one type parameter as an unsolved type symbol.
    fn install_type_param(&mut self, scope: ScopeId, param: &Ident) -> Result<(), DiagnosticError> {
        let var = self.graph.fresh_type_var(scope);
        self.graph.declare_type(scope, &param.name, var, param.span)
    }

    fn expression(&mut self, scope: ScopeId, expr: &mut Expr) -> Result<(), DiagnosticError> {
        match &mut expr.node {
            ExprKind::Lit(_) | ExprKind::Ident(_) => Ok(()),
            ExprKind::Template(chunks) => {
                for chunk in chunks {
                    if let alder_ast::TemplateChunk::Expr(inner) = chunk {
                        self.expression(scope, inner)?;
                    }
                }
                Ok(())
            }
            ExprKind::Object(fields) => {
                for field in fields {
                    self.expression(scope, &mut field.value)?;
                }
                Ok(())
            }
            ExprKind::Array(items) => {
                for item in items {
                    self.expression(scope, item)?;
                }
                Ok(())
            }
            ExprKind::Function(func) => self.function(scope, func),
            ExprKind::Call { callee, args } => {
                self.expression(scope, callee)?;
                for arg in args {
                    self.expression(scope, arg)?;
                }
                Ok(())
            }
            ExprKind::Dot { left, .. } => self.expression(scope, left),
            ExprKind::Index { left, index } => {
                self.expression(scope, left)?;
                self.expression(scope, index)
            }
            ExprKind::EnumCall { args, .. } => {
                for arg in args {
                    self.expression(scope, arg)?;
                }
                Ok(())
            }
            ExprKind::Binary { left, right, .. } => {
                self.expression(scope, left)?;
                self.expression(scope, right)
            }
            ExprKind::Unary { operand, .. } => self.expression(scope, operand),
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expression(scope, condition)?;
                // Each branch is a sibling child scope of the enclosing one.
                self.block(scope, then_branch)?;
                self.block(scope, else_branch)
            }
            ExprKind::Match { subject, clauses } => {
                self.expression(scope, subject)?;
                for clause in clauses {
                    self.match_clause(scope, clause)?;
                }
                Ok(())
            }
            ExprKind::Block(block) => self.block(scope, block),
        }
    }

    fn block(&mut self, parent: ScopeId, block: &mut Block) -> Result<(), DiagnosticError> {
        let scope = self.graph.new_child_scope(parent);
        block.scope = Some(scope);
        for statement in &mut block.body {
            self.statement(scope, statement)?;
        }
        Ok(())
    }

    fn function(&mut self, scope: ScopeId, func: &mut FunctionExpr) -> Result<(), DiagnosticError> {
        let fn_scope = self.graph.new_child_scope(scope);
        func.scope = Some(fn_scope);
        if func.name.is_none() {
            func.name = Some(self.graph.fresh_fn_name());
        }
        let name = func
            .name
            .clone()
            .expect("function identifier was just assigned");

        // Parameter and return variables live in the enclosing scope: the
        // function type is a parent-scope obligation.
        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let ty = match &param.annotation {
                Some(annotation) => lower_annotation(annotation),
                None => self.graph.fresh_type_var(scope),
            };
            self.graph
                .declare_value(fn_scope, &param.name.name, ty.clone(), param.name.span)?;
            params.push(ParamType {
                name: param.name.name.clone(),
                annotation: ty,
                spread: param.spread,
            });
        }
        let ret = match &func.return_annotation {
            Some(annotation) => lower_annotation(annotation),
            None => self.graph.fresh_type_var(scope),
        };

        let fn_type = Type::Function(FunctionType {
            ident: Some(name.clone()),
            params,
            ret: Box::new(ret),
        });
        self.graph
            .declare_type(fn_scope, &name, fn_type, func.body.span)?;

        self.expression(fn_scope, &mut func.body)
    }

    fn match_clause(
        &mut self,
        parent: ScopeId,
        clause: &mut MatchClause,
    ) -> Result<(), DiagnosticError> {
        let scope = self.graph.new_child_scope(parent);
        clause.scope = Some(scope);
        self.pattern(scope, &clause.pattern)?;
        self.expression(scope, &mut clause.body)
    }

    /// Install the identifiers a pattern binds. Patterns share the
    /// expression grammar; only binding positions introduce symbols.
    fn pattern(&mut self, scope: ScopeId, pattern: &Expr) -> Result<(), DiagnosticError> {
        match &pattern.node {
            ExprKind::Ident(ident) => {
                let var = self.graph.fresh_type_var(scope);
                self.graph.declare_value(scope, &ident.name, var, ident.span)
            }
            ExprKind::Array(items) => {
                for item in items {
                    self.pattern(scope, item)?;
                }
                Ok(())
            }
            ExprKind::Object(fields) => {
                for field in fields {
                    self.pattern(scope, &field.value)?;
                }
                Ok(())
            }
            ExprKind::EnumCall { args, .. } => {
                for arg in args {
                    self.pattern(scope, arg)?;
                }
                Ok(())
            }
            // Literals and templates match by value and bind nothing.
            _ => Ok(()),
        }
    }
}

fn check_unique<'a>(
    idents: impl Iterator<Item = &'a Ident>,
    category: Category,
    what: &str,
) -> Result<(), DiagnosticError> {
    let mut seen: Vec<&str> = Vec::new();
    for ident in idents {
        if seen.contains(&ident.name.as_str()) {
            return Err(DiagnosticError::single(
                Diagnostic::error(
                    category,
                    format!("Duplicate {what} `{}`", ident.name),
                )
                .at(span_to_location(ident.span)),
            ));
        }
        seen.push(ident.name.as_str());
    }
    Ok(())
}

fn check_unique_variants(alts: &[Type], span: alder_ast::Span) -> Result<(), DiagnosticError> {
    let mut seen: Vec<&Type> = Vec::new();
    for alt in alts {
        if seen.contains(&alt) {
            let label = match alt {
                Type::Literal(tag) => format!(":{tag}"),
                other => other.to_string(),
            };
            return Err(DiagnosticError::single(
                Diagnostic::error(
                    Category::DuplicateEnumMember,
                    format!("Duplicate enum member `{label}`"),
                )
                .at(span_to_location(span)),
            ));
        }
        seen.push(alt);
    }
    Ok(())
}
