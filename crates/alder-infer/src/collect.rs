//! The collector: walks the bound AST and emits type constraints.
//!
//! Every expression collects to a canonical type; statements that are not
//! expressions collect to the native `void`. Constraints are recorded on
//! their owning scope and returned in emission order for the unifier.

use alder_ast::{
    BinOp, Binding, Block, ConstDecl, Expr, ExprKind, Program, ScopeId, Span, Statement,
    TemplateChunk, UnaryOp,
};
use alder_diag::{Category, Diagnostic, DiagnosticError};
use alder_types::{
    EnumCallType, EnumPatternType, FunctionCallType, ObjectType, PatternType, PropDef, Type,
};

use crate::scope::ScopeGraph;
use crate::{span_to_location, Constraint, ConstraintKind, Provenance, Reason};

/// Collect constraints for a bound program.
///
/// Returns the constraints in emission order. Fails on unknown references,
/// uncallable callees, and unknown enum members.
pub fn collect_program(
    graph: &mut ScopeGraph,
    program: &Program,
) -> Result<Vec<Constraint>, DiagnosticError> {
    let scope = program
        .scope
        .expect("program is bound before constraint collection");
    let mut collector = Collector {
        graph,
        constraints: Vec::new(),
    };
    for statement in &program.body {
        collector.statement(scope, statement)?;
    }
    Ok(collector.constraints)
}

struct Collector<'g> {
    graph: &'g mut ScopeGraph,
    constraints: Vec<Constraint>,
}

impl Collector<'_> {
    fn push(
        &mut self,
        lhs: Type,
        rhs: Type,
        scope: ScopeId,
        kind: ConstraintKind,
        span: Span,
        reason: Reason,
    ) {
        let constraint = Constraint {
            lhs,
            rhs,
            scope,
            kind,
            provenance: Provenance { span, reason },
        };
        self.graph.push_constraint(constraint.clone());
        self.constraints.push(constraint);
    }

    fn statement(&mut self, scope: ScopeId, statement: &Statement) -> Result<Type, DiagnosticError> {
        match statement {
            Statement::Const(decl) => {
                self.const_decl(scope, decl)?;
                Ok(Type::VOID)
            }
            // Declarations were fully installed by the binder.
            Statement::Type(_) | Statement::Enum(_) => Ok(Type::VOID),
            Statement::Expr(expr) => self.expression(scope, expr),
        }
    }

    fn const_decl(&mut self, scope: ScopeId, decl: &ConstDecl) -> Result<(), DiagnosticError> {
        match &decl.binding {
            Binding::Name(ident) => {
                let const_type = self
                    .graph
                    .find_value(scope, &ident.name)
                    .map(|symbol| symbol.ty.clone())
                    .expect("const binding was installed by the binder");
                let value_type = self.expression(scope, &decl.value)?;
                self.push(
                    const_type,
                    value_type,
                    scope,
                    ConstraintKind::Equality,
                    decl.span,
                    Reason::ConstBinding,
                );
            }
            Binding::Object(names, span) => {
                let value_type = self.expression(scope, &decl.value)?;
                let props = names
                    .iter()
                    .map(|name| PropDef {
                        name: name.name.clone(),
                        value: self.binding_var(scope, &name.name),
                    })
                    .collect();
                // The pattern requires its fields on the value; the value
                // may carry more.
                self.push(
                    Type::Object(ObjectType { ident: None, props }),
                    value_type,
                    scope,
                    ConstraintKind::Subset,
                    *span,
                    Reason::Destructuring,
                );
            }
            Binding::Array(names, span) => {
                let value_type = self.expression(scope, &decl.value)?;
                let elem = self.graph.fresh_type_var(scope);
                self.push(
                    Type::array_of(elem.clone()),
                    value_type,
                    scope,
                    ConstraintKind::Equality,
                    *span,
                    Reason::Destructuring,
                );
                for name in names {
                    let var = self.binding_var(scope, &name.name);
                    self.push(
                        var,
                        elem.clone(),
                        scope,
                        ConstraintKind::Equality,
                        name.span,
                        Reason::Destructuring,
                    );
                }
            }
            Binding::EnumMember {
                enum_name,
                member,
                binding,
                span,
            } => {
                let enum_type = self.resolve_enum(scope, &enum_name.name, enum_name.span)?;
                let Some(enum_def) = enum_type.enum_type() else {
                    return Err(not_an_enum(&enum_name.name, enum_name.span));
                };
                if enum_def.member(&member.name).is_none() {
                    return Err(unknown_enum_member(
                        &enum_def.ident,
                        &member.name,
                        member.span,
                    ));
                }
                let var = self.binding_var(scope, &binding.name);
                let value_type = self.expression(scope, &decl.value)?;
                let pattern = Type::Pattern(PatternType {
                    pattern: Box::new(Type::EnumPattern(EnumPatternType {
                        enum_ty: Box::new(enum_type.clone()),
                        member: member.name.clone(),
                    })),
                    var: Box::new(var),
                });
                self.push(
                    pattern,
                    value_type,
                    scope,
                    ConstraintKind::Equality,
                    *span,
                    Reason::Destructuring,
                );
            }
        }
        Ok(())
    }

    fn binding_var(&self, scope: ScopeId, name: &str) -> Type {
        self.graph
            .find_value(scope, name)
            .map(|symbol| symbol.ty.clone())
            .expect("destructured binding was installed by the binder")
    }

    fn expression(&mut self, scope: ScopeId, expr: &Expr) -> Result<Type, DiagnosticError> {
        match &expr.node {
            ExprKind::Lit(lit) => Ok(match lit {
                alder_ast::Lit::Number(_) => Type::NUMBER,
                alder_ast::Lit::Bool(_) => Type::BOOLEAN,
            }),

            ExprKind::Template(chunks) => {
                for chunk in chunks {
                    if let TemplateChunk::Expr(inner) = chunk {
                        let span_type = self.expression(scope, inner)?;
                        self.push(
                            span_type,
                            Type::STRING,
                            scope,
                            ConstraintKind::Equality,
                            inner.span,
                            Reason::TemplateSpan,
                        );
                    }
                }
                Ok(Type::STRING)
            }

            ExprKind::Ident(ident) => match self.graph.find_value(scope, &ident.name) {
                Some(symbol) => Ok(symbol.ty.clone()),
                None => Err(DiagnosticError::single(
                    Diagnostic::error(
                        Category::UnknownReference,
                        format!("Unknown reference `{}`", ident.name),
                    )
                    .at(span_to_location(ident.span)),
                )),
            },

            ExprKind::Object(fields) => {
                let mut props = Vec::with_capacity(fields.len());
                for field in fields {
                    let value = self.expression(scope, &field.value)?;
                    props.push(PropDef {
                        name: field.name.name.clone(),
                        value,
                    });
                }
                Ok(Type::Object(ObjectType { ident: None, props }))
            }

            ExprKind::Array(items) => {
                let elem = self.graph.fresh_type_var(scope);
                for item in items {
                    let item_type = self.expression(scope, item)?;
                    self.push(
                        elem.clone(),
                        item_type,
                        scope,
                        ConstraintKind::Equality,
                        item.span,
                        Reason::ArrayElement,
                    );
                }
                Ok(Type::array_of(elem))
            }

            ExprKind::Function(func) => {
                let fn_scope = func.scope.expect("function is bound before collection");
                let name = func
                    .name
                    .as_deref()
                    .expect("binder assigns every function an identifier");
                let fn_type = self
                    .graph
                    .find_type(fn_scope, name)
                    .map(|symbol| symbol.ty.clone())
                    .expect("binder installs the function type symbol");
                let Type::Function(ref signature) = fn_type else {
                    return Err(DiagnosticError::single(
                        Diagnostic::error(
                            Category::CouldNotUnify,
                            format!("`{name}` is not a function type in the symbol table"),
                        )
                        .at(span_to_location(expr.span)),
                    ));
                };
                let declared_ret = (*signature.ret).clone();
                let body_type = self.expression(fn_scope, &func.body)?;
                // Emitted in the function's parent scope: unifying the
                // return type is a parent-scope obligation.
                self.push(
                    declared_ret,
                    body_type,
                    scope,
                    ConstraintKind::Equality,
                    func.body.span,
                    Reason::ReturnType,
                );
                Ok(fn_type)
            }

            ExprKind::Call { callee, args } => {
                let callee_type = self.expression(scope, callee)?;
                let resolved = self.graph.resolve_type(scope, &callee_type);
                let mut arg_types = Vec::with_capacity(args.len());
                for arg in args {
                    arg_types.push(self.expression(scope, arg)?);
                }
                let ret = self.graph.fresh_type_var(scope);
                let call_type = Type::Call(FunctionCallType {
                    callee: Box::new(callee_type),
                    args: arg_types,
                    ret: Box::new(ret.clone()),
                });

                match resolved {
                    Type::Function(_) => {
                        self.push(
                            call_type,
                            resolved,
                            scope,
                            ConstraintKind::Equality,
                            expr.span,
                            Reason::CallSite,
                        );
                    }
                    Type::Var(_) | Type::Ident(_) => {
                        self.push(
                            resolved,
                            call_type,
                            scope,
                            ConstraintKind::Equality,
                            expr.span,
                            Reason::CallSite,
                        );
                    }
                    other => {
                        return Err(DiagnosticError::single(
                            Diagnostic::error(
                                Category::NotCallable,
                                format!("`{other}` is not callable"),
                            )
                            .at(span_to_location(callee.span)),
                        ));
                    }
                }
                Ok(ret)
            }

            ExprKind::Dot { left, field } => {
                let left_type = self.expression(scope, left)?;
                let resolved = self.graph.resolve_type(scope, &left_type);
                match resolved {
                    Type::Enum(enum_def) => {
                        if enum_def.member(&field.name).is_none() {
                            return Err(unknown_enum_member(
                                &enum_def.ident,
                                &field.name,
                                field.span,
                            ));
                        }
                        Ok(Type::EnumCall(EnumCallType {
                            enum_ty: Box::new(Type::Enum(enum_def)),
                            member: field.name.clone(),
                            args: Vec::new(),
                        }))
                    }
                    Type::Object(obj) => match obj.prop(&field.name) {
                        Some(value) => Ok(value.clone()),
                        None => Err(DiagnosticError::single(
                            Diagnostic::error(
                                Category::UnknownReference,
                                format!("Unknown field `{}` on object", field.name),
                            )
                            .at(span_to_location(field.span)),
                        )),
                    },
                    unresolved @ (Type::Var(_) | Type::Ident(_)) => {
                        // Infer a partial record shape for the left side.
                        let prop = self.graph.fresh_type_var(scope);
                        self.push(
                            unresolved,
                            Type::Object(ObjectType {
                                ident: None,
                                props: vec![PropDef {
                                    name: field.name.clone(),
                                    value: prop.clone(),
                                }],
                            }),
                            scope,
                            ConstraintKind::Equality,
                            expr.span,
                            Reason::FieldAccess,
                        );
                        Ok(prop)
                    }
                    other => Err(DiagnosticError::single(
                        Diagnostic::error(
                            Category::TypeMismatch,
                            format!("type `{other}` has no field `{}`", field.name),
                        )
                        .at(span_to_location(field.span)),
                    )),
                }
            }

            ExprKind::Index { left, index } => {
                let index_type = self.expression(scope, index)?;
                self.push(
                    Type::NUMBER,
                    index_type,
                    scope,
                    ConstraintKind::Equality,
                    index.span,
                    Reason::IndexAccess,
                );
                let left_type = self.expression(scope, left)?;
                let elem = self.graph.fresh_type_var(scope);
                self.push(
                    Type::array_of(elem.clone()),
                    left_type,
                    scope,
                    ConstraintKind::Equality,
                    left.span,
                    Reason::IndexAccess,
                );
                Ok(elem)
            }

            ExprKind::EnumCall {
                enum_name,
                member,
                args,
            } => {
                let enum_type = self.resolve_enum(scope, &enum_name.name, enum_name.span)?;
                let Some(enum_def) = enum_type.enum_type().cloned() else {
                    return Err(not_an_enum(&enum_name.name, enum_name.span));
                };
                let Some(member_def) = enum_def.member(&member.name).cloned() else {
                    return Err(unknown_enum_member(
                        &enum_def.ident,
                        &member.name,
                        member.span,
                    ));
                };
                if args.len() != member_def.params.len() {
                    return Err(DiagnosticError::single(
                        Diagnostic::error(
                            Category::TypeMismatch,
                            format!(
                                "`{}.{}` expects {} arguments, got {}",
                                enum_def.ident,
                                member.name,
                                member_def.params.len(),
                                args.len()
                            ),
                        )
                        .at(span_to_location(expr.span)),
                    ));
                }
                let mut arg_types = Vec::with_capacity(args.len());
                for arg in args {
                    arg_types.push(self.expression(scope, arg)?);
                }
                Ok(Type::EnumCall(EnumCallType {
                    enum_ty: Box::new(enum_type),
                    member: member.name.clone(),
                    args: arg_types,
                }))
            }

            ExprKind::Binary { op, left, right } => {
                let left_type = self.expression(scope, left)?;
                let right_type = self.expression(scope, right)?;
                Ok(self.binary_regime(
                    scope, *op, left_type, right_type, left.span, right.span, expr.span,
                ))
            }

            ExprKind::Unary { op, operand } => {
                let operand_type = self.expression(scope, operand)?;
                let (required, result, symbol) = match op {
                    UnaryOp::Not => (Type::BOOLEAN, Type::BOOLEAN, "!"),
                    UnaryOp::Negate => (Type::NUMBER, Type::NUMBER, "-"),
                };
                self.push(
                    required,
                    operand_type,
                    scope,
                    ConstraintKind::Equality,
                    operand.span,
                    Reason::UnaryOp(symbol),
                );
                Ok(result)
            }

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition_type = self.expression(scope, condition)?;
                self.push(
                    condition_type,
                    Type::BOOLEAN,
                    scope,
                    ConstraintKind::Equality,
                    condition.span,
                    Reason::Condition,
                );
                let then_type = self.block(then_branch)?;
                let else_type = self.block(else_branch)?;
                self.push(
                    then_type.clone(),
                    else_type,
                    scope,
                    ConstraintKind::Equality,
                    expr.span,
                    Reason::IfBranches,
                );
                Ok(then_type)
            }

            ExprKind::Match { subject, clauses } => {
                let subject_type = self.expression(scope, subject)?;
                let mut result: Option<Type> = None;
                for (index, clause) in clauses.iter().enumerate() {
                    let clause_scope =
                        clause.scope.expect("match clause is bound before collection");
                    let pattern_type = self.expression(clause_scope, &clause.pattern)?;
                    // The first clause pins the subject; the rest only need
                    // to fit it.
                    let kind = if index == 0 {
                        ConstraintKind::Equality
                    } else {
                        ConstraintKind::Subset
                    };
                    self.push(
                        pattern_type,
                        subject_type.clone(),
                        clause_scope,
                        kind,
                        clause.pattern.span,
                        Reason::MatchPattern,
                    );
                    let body_type = self.expression(clause_scope, &clause.body)?;
                    match &result {
                        Some(first) => self.push(
                            body_type,
                            first.clone(),
                            clause_scope,
                            ConstraintKind::Equality,
                            clause.body.span,
                            Reason::MatchArms,
                        ),
                        None => result = Some(body_type),
                    }
                }
                Ok(result.unwrap_or(Type::VOID))
            }

            ExprKind::Block(block) => self.block(block),
        }
    }

    fn block(&mut self, block: &Block) -> Result<Type, DiagnosticError> {
        let scope = block.scope.expect("block is bound before collection");
        let mut last = Type::VOID;
        for statement in &block.body {
            last = self.statement(scope, statement)?;
        }
        Ok(last)
    }

    #[allow(clippy::too_many_arguments)]
    fn binary_regime(
        &mut self,
        scope: ScopeId,
        op: BinOp,
        left: Type,
        right: Type,
        left_span: Span,
        right_span: Span,
        span: Span,
    ) -> Type {
        let reason = Reason::BinaryOp(op.as_str());
        match op {
            BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Power => self
                .require_operands(
                    scope, Type::NUMBER, Type::NUMBER, left, right, left_span, right_span, reason,
                ),
            BinOp::LessThan | BinOp::LessOrEqual | BinOp::GreaterThan | BinOp::GreaterOrEqual => {
                self.require_operands(
                    scope,
                    Type::NUMBER,
                    Type::BOOLEAN,
                    left,
                    right,
                    left_span,
                    right_span,
                    reason,
                )
            }
            BinOp::And | BinOp::Or => self.require_operands(
                scope,
                Type::BOOLEAN,
                Type::BOOLEAN,
                left,
                right,
                left_span,
                right_span,
                reason,
            ),
            BinOp::Equal | BinOp::NotEqual => {
                // Polymorphic: both sides agree, result is boolean.
                self.push(left, right, scope, ConstraintKind::Equality, span, reason);
                Type::BOOLEAN
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn require_operands(
        &mut self,
        scope: ScopeId,
        required: Type,
        result: Type,
        left: Type,
        right: Type,
        left_span: Span,
        right_span: Span,
        reason: Reason,
    ) -> Type {
        self.push(
            required.clone(),
            left,
            scope,
            ConstraintKind::Equality,
            left_span,
            reason.clone(),
        );
        self.push(
            required,
            right,
            scope,
            ConstraintKind::Equality,
            right_span,
            reason,
        );
        result
    }

    fn resolve_enum(
        &self,
        scope: ScopeId,
        name: &str,
        span: Span,
    ) -> Result<Type, DiagnosticError> {
        let Some(symbol) = self.graph.find_value(scope, name) else {
            return Err(DiagnosticError::single(
                Diagnostic::error(
                    Category::UnknownReference,
                    format!("Unknown reference `{name}`"),
                )
                .at(span_to_location(span)),
            ));
        };
        let resolved = self.graph.resolve_type(scope, &symbol.ty);
        match resolved {
            Type::Enum(_) => Ok(resolved),
            _ => Err(not_an_enum(name, span)),
        }
    }
}

fn not_an_enum(name: &str, span: Span) -> DiagnosticError {
    DiagnosticError::single(
        Diagnostic::error(Category::TypeMismatch, format!("`{name}` is not an enum"))
            .at(span_to_location(span)),
    )
}

fn unknown_enum_member(enum_name: &str, member: &str, span: Span) -> DiagnosticError {
    DiagnosticError::single(
        Diagnostic::error(
            Category::UnknownEnumMember,
            format!("Unknown enum member `{enum_name}.{member}`"),
        )
        .at(span_to_location(span)),
    )
}
