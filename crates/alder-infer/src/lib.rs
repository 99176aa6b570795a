//! Semantic analysis core for Alder: scope binding, constraint collection,
//! and unification.
//!
//! The three phases share one data structure, the [`ScopeGraph`]:
//!
//! - the binder ([`bind_program`]) walks the AST and constructs the scope
//!   graph, installing a symbol for every declaration;
//! - the collector ([`collect_program`]) walks the bound AST and emits type
//!   constraints, annotating every expression with a type;
//! - the unifier ([`Unifier`]) solves the constraints by rewriting the type
//!   tables, which double as the substitution store, then applies the
//!   substitution so every table entry is canonical.
//!
//! Constraints carry provenance so failures can point at the source
//! construct that generated them.

pub mod bind;
pub mod collect;
pub mod scope;
pub mod trace;

use alder_ast::{ScopeId, Span};
use alder_types::{EnumCallType, EnumType, FunctionCallType, FunctionType, PatternType, Type};

// Re-export for convenience.
pub use alder_diag::{Category, Diagnostic, DiagnosticError, SourceLocation};
pub use bind::bind_program;
pub use collect::collect_program;
pub use scope::{Scope, ScopeGraph, TypeSymbol, ValueSymbol};

// ---------------------------------------------------------------------------
// Provenance: why a constraint exists
// ---------------------------------------------------------------------------

/// Tracks the origin of a type constraint for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub span: Span,
    pub reason: Reason,
}

/// Why a constraint was generated.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    /// Operands of a binary operator must fit its regime.
    BinaryOp(&'static str),
    /// Operand of a unary operator must fit its regime.
    UnaryOp(&'static str),
    /// `if`/`match` condition or subject obligation.
    Condition,
    /// Both `if` branches must have the same type.
    IfBranches,
    /// A match clause pattern must fit the subject.
    MatchPattern,
    /// All match clause bodies must agree.
    MatchArms,
    /// Template literal spans must be strings.
    TemplateSpan,
    /// A const binding's value must match its declared or inferred type.
    ConstBinding,
    /// A destructuring pattern must fit the value it unpacks.
    Destructuring,
    /// A function body must produce the declared return type.
    ReturnType,
    /// A call site must fit the callee's signature.
    CallSite,
    /// A field access constrains the record shape.
    FieldAccess,
    /// Array elements share one element type.
    ArrayElement,
    /// Index expressions are numbers.
    IndexAccess,
}

// ---------------------------------------------------------------------------
// Type constraints
// ---------------------------------------------------------------------------

/// How the two sides of a constraint must relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Both sides must unify exactly.
    Equality,
    /// The left side must be a structural subset of the right.
    Subset,
}

/// A constraint generated during collection, solved by the unifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub lhs: Type,
    pub rhs: Type,
    /// Scope the constraint was emitted in; resolution starts here.
    pub scope: ScopeId,
    pub kind: ConstraintKind,
    pub provenance: Provenance,
}

// ---------------------------------------------------------------------------
// Unifier: solves constraints
// ---------------------------------------------------------------------------

/// Solves type constraints by rewriting the scope graph's type tables.
///
/// Constraints are processed in emission order. The first failure aborts
/// solving; there is no recovery past the erring constraint. On success the
/// substitution is applied transitively so every table entry is canonical.
pub struct Unifier<'g> {
    graph: &'g mut ScopeGraph,
    tracing: bool,
    steps: Vec<trace::UnifyStep>,
}

impl<'g> Unifier<'g> {
    pub fn new(graph: &'g mut ScopeGraph) -> Self {
        Self {
            graph,
            tracing: false,
            steps: Vec::new(),
        }
    }

    /// Enable step-by-step unification tracing for observability tools.
    pub fn enable_tracing(&mut self) {
        self.tracing = true;
    }

    /// Whether unification tracing is currently enabled.
    pub fn is_tracing(&self) -> bool {
        self.tracing
    }

    /// The collected unification trace.
    pub fn unify_trace(&self) -> &[trace::UnifyStep] {
        &self.steps
    }

    /// Solve a set of constraints, then apply the substitution store to
    /// every symbol table.
    pub fn solve(&mut self, constraints: Vec<Constraint>) -> Result<(), DiagnosticError> {
        for constraint in constraints {
            self.unify(constraint)?;
        }
        self.graph.apply_substitutions();
        Ok(())
    }

    fn push_step(&mut self, action: trace::UnifyAction, lhs: &Type, rhs: &Type, detail: String) {
        if !self.tracing {
            return;
        }
        self.steps.push(trace::UnifyStep {
            step: self.steps.len(),
            action,
            left: lhs.to_string(),
            right: rhs.to_string(),
            detail,
        });
    }

    /// Solve one constraint, recursing structurally.
    ///
    /// The rule list is evaluated in order; the first matching case decides
    /// the outcome.
    fn unify(&mut self, constraint: Constraint) -> Result<(), DiagnosticError> {
        let Constraint {
            lhs,
            rhs,
            scope,
            kind,
            provenance,
        } = constraint;
        let lhs = self.graph.resolve_type(scope, &lhs);
        let rhs = self.graph.resolve_type(scope, &rhs);

        match (&lhs, &rhs) {
            // Already identical: nothing to do.
            _ if lhs == rhs => {
                self.push_step(
                    trace::UnifyAction::Identity,
                    &lhs,
                    &rhs,
                    "types already equal".into(),
                );
                Ok(())
            }

            // An unsolved reference on either side: rewrite its slot.
            (Type::Var(name), _) | (Type::Ident(name), _) => {
                self.bind_slot(scope, name.clone(), &lhs, &rhs, &provenance)
            }
            (_, Type::Var(name)) | (_, Type::Ident(name)) => {
                self.bind_slot(scope, name.clone(), &rhs, &lhs, &provenance)
            }

            // Native scalars and literal types must match exactly.
            (Type::Native(left), Type::Native(right)) => {
                if left == right {
                    Ok(())
                } else {
                    self.push_step(trace::UnifyAction::Error, &lhs, &rhs, "type mismatch".into());
                    Err(self.fail(
                        Category::TypeMismatch,
                        format!("type mismatch: expected `{lhs}`, got `{rhs}`"),
                        &provenance,
                    ))
                }
            }
            (Type::Literal(left), Type::Literal(right)) => {
                if left == right {
                    Ok(())
                } else {
                    Err(self.fail(
                        Category::TypeMismatch,
                        format!("type mismatch: expected `{lhs}`, got `{rhs}`"),
                        &provenance,
                    ))
                }
            }

            // Two function signatures: arities must match; recurse pairwise.
            (Type::Function(left), Type::Function(right)) => {
                if left.params.len() != right.params.len() {
                    return Err(self.fail(
                        Category::TypeMismatch,
                        format!(
                            "arity mismatch: expected {} parameters, got {}",
                            left.params.len(),
                            right.params.len()
                        ),
                        &provenance,
                    ));
                }
                self.push_step(
                    trace::UnifyAction::Decompose,
                    &lhs,
                    &rhs,
                    "function ~ function: unify parameters and returns".into(),
                );
                let (left, right) = (left.clone(), right.clone());
                for (l, r) in left.params.iter().zip(right.params.iter()) {
                    self.unify_parts(
                        l.annotation.clone(),
                        r.annotation.clone(),
                        scope,
                        ConstraintKind::Equality,
                        &provenance,
                    )?;
                }
                self.unify_parts(
                    (*left.ret).clone(),
                    (*right.ret).clone(),
                    scope,
                    ConstraintKind::Equality,
                    &provenance,
                )
            }

            // A call site against a function signature (either direction).
            (Type::Call(call), Type::Function(func)) => {
                let (call, func) = (call.clone(), func.clone());
                self.unify_call_with_function(&lhs, &rhs, call, func, scope, &provenance)
            }
            (Type::Function(func), Type::Call(call)) => {
                let (call, func) = (call.clone(), func.clone());
                self.unify_call_with_function(&lhs, &rhs, call, func, scope, &provenance)
            }

            // Enum declaration against an instance: identity only.
            (Type::Enum(e), Type::EnumCall(_)) | (Type::EnumCall(_), Type::Enum(e)) => {
                let other = if matches!(lhs, Type::Enum(_)) {
                    &rhs
                } else {
                    &lhs
                };
                if other.enum_id() == Some(e.id) {
                    Ok(())
                } else {
                    Err(self.enum_mismatch(&lhs, &rhs, &provenance))
                }
            }

            // Two enum declarations, or two instances: same identity.
            (Type::Enum(left), Type::Enum(right)) => {
                if left.id == right.id {
                    Ok(())
                } else {
                    Err(self.enum_mismatch(&lhs, &rhs, &provenance))
                }
            }
            (Type::EnumCall(left), Type::EnumCall(right)) => {
                if left.enum_ty.enum_id() != right.enum_ty.enum_id() {
                    return Err(self.enum_mismatch(&lhs, &rhs, &provenance));
                }
                self.push_step(
                    trace::UnifyAction::Decompose,
                    &lhs,
                    &rhs,
                    "enum instance ~ enum instance".into(),
                );
                // Payloads line up only when both sides name the same
                // constructor; a subset pattern may name a different one.
                if left.member == right.member && left.args.len() == right.args.len() {
                    let (left, right) = (left.clone(), right.clone());
                    for (l, r) in left.args.iter().zip(right.args.iter()) {
                        self.unify_parts(
                            l.clone(),
                            r.clone(),
                            scope,
                            ConstraintKind::Equality,
                            &provenance,
                        )?;
                    }
                }
                Ok(())
            }

            // Records: every left-hand field is required on the right;
            // equality additionally requires the reverse.
            (Type::Object(left), Type::Object(right)) => {
                let (left, right) = (left.clone(), right.clone());
                self.push_step(
                    trace::UnifyAction::Decompose,
                    &lhs,
                    &rhs,
                    "object ~ object: check fields".into(),
                );
                for prop in &left.props {
                    match right.prop(&prop.name) {
                        Some(value) => self.unify_parts(
                            prop.value.clone(),
                            value.clone(),
                            scope,
                            ConstraintKind::Equality,
                            &provenance,
                        )?,
                        None => {
                            return Err(self.fail(
                                Category::TypeMismatch,
                                format!("missing field `{}`", prop.name),
                                &provenance,
                            ));
                        }
                    }
                }
                if kind == ConstraintKind::Equality {
                    for prop in &right.props {
                        if left.prop(&prop.name).is_none() {
                            return Err(self.fail(
                                Category::TypeMismatch,
                                format!("missing field `{}`", prop.name),
                                &provenance,
                            ));
                        }
                    }
                }
                Ok(())
            }

            // A destructuring pattern against the value it unpacks.
            (Type::Pattern(pattern), Type::EnumCall(call))
            | (Type::EnumCall(call), Type::Pattern(pattern)) => {
                let (pattern, call) = (pattern.clone(), call.clone());
                self.unify_pattern_with_enum_call(&lhs, &rhs, pattern, call, scope, &provenance)
            }

            // Generic applications decompose structurally.
            (
                Type::Reference {
                    base: left_base,
                    args: left_args,
                },
                Type::Reference {
                    base: right_base,
                    args: right_args,
                },
            ) => {
                if left_args.len() != right_args.len() {
                    return Err(self.fail(
                        Category::TypeMismatch,
                        format!("type mismatch: expected `{lhs}`, got `{rhs}`"),
                        &provenance,
                    ));
                }
                self.push_step(
                    trace::UnifyAction::Decompose,
                    &lhs,
                    &rhs,
                    "reference ~ reference: unify base and arguments".into(),
                );
                let (left_base, right_base) = ((**left_base).clone(), (**right_base).clone());
                let pairs: Vec<(Type, Type)> = left_args
                    .iter()
                    .cloned()
                    .zip(right_args.iter().cloned())
                    .collect();
                self.unify_parts(left_base, right_base, scope, ConstraintKind::Equality, &provenance)?;
                for (l, r) in pairs {
                    self.unify_parts(l, r, scope, ConstraintKind::Equality, &provenance)?;
                }
                Ok(())
            }

            // Variant alternatives: membership for subset, same set for
            // equality.
            (Type::Variant(left), Type::Variant(right)) => {
                let missing = left.iter().find(|alt| !right.contains(*alt));
                if let Some(alt) = missing {
                    return Err(self.fail(
                        Category::TypeMismatch,
                        format!("variant `{alt}` is not part of `{rhs}`"),
                        &provenance,
                    ));
                }
                if kind == ConstraintKind::Equality {
                    if let Some(alt) = right.iter().find(|alt| !left.contains(*alt)) {
                        return Err(self.fail(
                            Category::TypeMismatch,
                            format!("variant `{alt}` is not part of `{lhs}`"),
                            &provenance,
                        ));
                    }
                }
                Ok(())
            }

            _ => {
                self.push_step(
                    trace::UnifyAction::Error,
                    &lhs,
                    &rhs,
                    "no unification rule applies".into(),
                );
                Err(self.fail(
                    Category::CouldNotUnify,
                    format!("could not unify `{lhs}` with `{rhs}`"),
                    &provenance,
                ))
            }
        }
    }

    /// Rewrite the slot for `name` to the solved side.
    fn bind_slot(
        &mut self,
        scope: ScopeId,
        name: String,
        unsolved: &Type,
        solved: &Type,
        provenance: &Provenance,
    ) -> Result<(), DiagnosticError> {
        if solved.contains_ref(&name) {
            self.push_step(
                trace::UnifyAction::OccursCheck,
                unsolved,
                solved,
                format!("`{name}` occurs in `{solved}`"),
            );
            return Err(self.fail(
                Category::CouldNotUnify,
                format!("cannot construct the infinite type `{name}` = `{solved}`"),
                provenance,
            ));
        }
        self.push_step(
            trace::UnifyAction::Bind,
            unsolved,
            solved,
            format!("{name} := {solved}"),
        );
        self.graph.rewrite_type_symbol(scope, &name, solved.clone());
        Ok(())
    }

    /// Rule for `FunctionCallType ~ FunctionType`.
    ///
    /// A parameter that already resolved to a concrete type checks the
    /// argument with a subset constraint; a parameter that is still an
    /// unsolved variable unifies exactly, so the function's own body drives
    /// that inference rather than the call site.
    fn unify_call_with_function(
        &mut self,
        lhs: &Type,
        rhs: &Type,
        call: FunctionCallType,
        func: FunctionType,
        scope: ScopeId,
        provenance: &Provenance,
    ) -> Result<(), DiagnosticError> {
        if call.args.len() != func.params.len() {
            return Err(self.fail(
                Category::TypeMismatch,
                format!(
                    "arity mismatch: expected {} arguments, got {}",
                    func.params.len(),
                    call.args.len()
                ),
                provenance,
            ));
        }
        self.push_step(
            trace::UnifyAction::Decompose,
            lhs,
            rhs,
            "call ~ function: check arguments and return".into(),
        );
        for (arg, param) in call.args.iter().zip(func.params.iter()) {
            let resolved_param = self.graph.resolve_type(scope, &param.annotation);
            let kind = if resolved_param.as_ref_name().is_some() {
                ConstraintKind::Equality
            } else {
                ConstraintKind::Subset
            };
            self.unify_parts(
                arg.clone(),
                param.annotation.clone(),
                scope,
                kind,
                provenance,
            )?;
        }
        self.unify_parts(
            (*call.ret).clone(),
            (*func.ret).clone(),
            scope,
            ConstraintKind::Equality,
            provenance,
        )
    }

    /// Rule for `PatternType { EnumPattern, var } ~ EnumCallType`.
    ///
    /// Recovers the destructured binding's type from the instance's
    /// arguments. Members that bind more than one payload are rejected: the
    /// pattern form carries exactly one variable.
    fn unify_pattern_with_enum_call(
        &mut self,
        lhs: &Type,
        rhs: &Type,
        pattern: PatternType,
        call: EnumCallType,
        scope: ScopeId,
        provenance: &Provenance,
    ) -> Result<(), DiagnosticError> {
        let Type::EnumPattern(enum_pattern) = pattern.pattern.as_ref() else {
            return Err(self.fail(
                Category::CouldNotUnify,
                format!("could not unify `{lhs}` with `{rhs}`"),
                provenance,
            ));
        };
        if enum_pattern.enum_ty.enum_id() != call.enum_ty.enum_id() {
            return Err(self.enum_mismatch(lhs, rhs, provenance));
        }
        let Some(enum_def) = enum_pattern.enum_ty.enum_type().cloned() else {
            return Err(self.fail(
                Category::CouldNotUnify,
                format!("could not unify `{lhs}` with `{rhs}`"),
                provenance,
            ));
        };
        let Some(member) = enum_def.member(&enum_pattern.member).cloned() else {
            return Err(self.fail(
                Category::UnknownEnumMember,
                format!(
                    "Unknown enum member `{}.{}`",
                    enum_def.ident, enum_pattern.member
                ),
                provenance,
            ));
        };
        if member.params.len() != 1 {
            return Err(self.fail(
                Category::CouldNotUnify,
                format!(
                    "destructuring `{}.{}` binds exactly one payload, the member declares {}",
                    enum_def.ident,
                    member.ident,
                    member.params.len()
                ),
                provenance,
            ));
        }
        let argument = payload_argument(&enum_def, &member.params[0], &call.args)
            .ok_or_else(|| {
                self.fail(
                    Category::CouldNotUnify,
                    format!("`{rhs}` carries no payload for `{}`", member.ident),
                    provenance,
                )
            })?
            .clone();
        self.push_step(
            trace::UnifyAction::Decompose,
            lhs,
            rhs,
            format!("pattern `{}` binds its payload", member.ident),
        );
        self.unify_parts(
            (*pattern.var).clone(),
            argument,
            scope,
            ConstraintKind::Equality,
            provenance,
        )
    }

    fn unify_parts(
        &mut self,
        lhs: Type,
        rhs: Type,
        scope: ScopeId,
        kind: ConstraintKind,
        provenance: &Provenance,
    ) -> Result<(), DiagnosticError> {
        self.unify(Constraint {
            lhs,
            rhs,
            scope,
            kind,
            provenance: provenance.clone(),
        })
    }

    fn enum_mismatch(&mut self, lhs: &Type, rhs: &Type, provenance: &Provenance) -> DiagnosticError {
        self.push_step(trace::UnifyAction::Error, lhs, rhs, "enum mismatch".into());
        self.fail(
            Category::EnumMismatch,
            format!("enum mismatch: `{lhs}` is not `{rhs}`"),
            provenance,
        )
    }

    fn fail(
        &self,
        category: Category,
        message: String,
        provenance: &Provenance,
    ) -> DiagnosticError {
        DiagnosticError::single(
            Diagnostic::error(category, message).at(span_to_location(provenance.span)),
        )
    }
}

/// The argument of an enum instance that corresponds to a member's single
/// declared parameter.
///
/// When the parameter names one of the enum's type parameters, its index
/// among them selects the argument; otherwise the payload sits at the
/// member's own (single) parameter position.
fn payload_argument<'a>(
    enum_def: &EnumType,
    member_param: &Type,
    args: &'a [Type],
) -> Option<&'a Type> {
    if let Some(name) = member_param.as_ref_name() {
        if let Some(index) = enum_def.params.iter().position(|p| p == name) {
            if index < args.len() {
                return args.get(index);
            }
        }
    }
    args.first()
}

/// Convert an AST span into a diagnostic source location.
pub fn span_to_location(span: Span) -> SourceLocation {
    SourceLocation {
        file_id: span.file.0,
        start: span.start,
        end: span.end,
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use alder_types::NativeKind;

    fn provenance() -> Provenance {
        Provenance {
            span: Span::synthetic(),
            reason: Reason::ConstBinding,
        }
    }

    fn equality(lhs: Type, rhs: Type, scope: ScopeId) -> Constraint {
        Constraint {
            lhs,
            rhs,
            scope,
            kind: ConstraintKind::Equality,
            provenance: provenance(),
        }
    }

    #[test]
    fn native_equality_succeeds() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let mut unifier = Unifier::new(&mut graph);
        unifier
            .solve(vec![equality(Type::NUMBER, Type::NUMBER, scope)])
            .expect("number unifies with number");
    }

    #[test]
    fn native_mismatch_fails_with_type_mismatch() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let mut unifier = Unifier::new(&mut graph);
        let err = unifier
            .solve(vec![equality(Type::NUMBER, Type::STRING, scope)])
            .unwrap_err();
        assert_eq!(err.category(), Some(Category::TypeMismatch));
        assert!(format!("{err}").contains("expected `number`, got `string`"));
    }

    #[test]
    fn variable_slot_is_rewritten() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let var = graph.fresh_type_var(scope);
        let mut unifier = Unifier::new(&mut graph);
        unifier
            .solve(vec![equality(var.clone(), Type::BOOLEAN, scope)])
            .expect("variable binds");
        assert_eq!(graph.resolve_type(scope, &var), Type::BOOLEAN);
    }

    #[test]
    fn variable_on_the_right_also_binds() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let var = graph.fresh_type_var(scope);
        let mut unifier = Unifier::new(&mut graph);
        unifier
            .solve(vec![equality(Type::STRING, var.clone(), scope)])
            .expect("mirror case binds");
        assert_eq!(graph.resolve_type(scope, &var), Type::STRING);
    }

    #[test]
    fn occurs_check_rejects_infinite_types() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let var = graph.fresh_type_var(scope);
        let mut unifier = Unifier::new(&mut graph);
        let err = unifier
            .solve(vec![equality(
                var.clone(),
                Type::array_of(var.clone()),
                scope,
            )])
            .unwrap_err();
        assert_eq!(err.category(), Some(Category::CouldNotUnify));
        assert!(format!("{err}").contains("infinite type"));
    }

    #[test]
    fn tracing_records_bind_steps() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let var = graph.fresh_type_var(scope);
        let mut unifier = Unifier::new(&mut graph);
        unifier.enable_tracing();
        unifier
            .solve(vec![equality(var, Type::NUMBER, scope)])
            .expect("binds");
        let steps = unifier.unify_trace();
        assert!(steps
            .iter()
            .any(|s| s.action == trace::UnifyAction::Bind && s.detail.contains(":= number")));
    }

    #[test]
    fn unknown_kind_combination_reports_could_not_unify() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let mut unifier = Unifier::new(&mut graph);
        let err = unifier
            .solve(vec![equality(
                Type::Native(NativeKind::Void),
                Type::Literal("x".to_string()),
                scope,
            )])
            .unwrap_err();
        assert_eq!(err.category(), Some(Category::CouldNotUnify));
    }
}
