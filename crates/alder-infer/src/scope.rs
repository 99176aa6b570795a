//! The scope graph: lexical scopes, symbol tables, and the substitution
//! store.
//!
//! Scopes form a tree held in one arena, addressed by [`ScopeId`]. Each
//! scope owns a value table and a type table; symbols carry their owning
//! scope id as a weak back-reference for diagnostics. The type tables double
//! as the substitution store: every type variable allocated during binding
//! gets a slot here, and the unifier rewrites slots as constraints are
//! solved.

use std::collections::BTreeMap;

use alder_ast::{ScopeId, Span};
use alder_diag::{Category, Diagnostic, DiagnosticError, SourceLocation};
use alder_types::{
    EnumId, FunctionCallType, FunctionType, NativeKind, ObjectType, ParamType, PatternType,
    PropDef, Type,
};

use crate::Constraint;

/// A named value binding and its (possibly still unsolved) type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSymbol {
    pub name: String,
    pub ty: Type,
    /// Owning scope. Weak back-reference, never followed for ownership.
    pub scope: ScopeId,
}

/// A named type binding. Type-variable slots live here too.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSymbol {
    pub name: String,
    pub ty: Type,
    /// Owning scope. Weak back-reference, never followed for ownership.
    pub scope: ScopeId,
}

/// One lexical scope.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    pub values: BTreeMap<String, ValueSymbol>,
    pub types: BTreeMap<String, TypeSymbol>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Constraints emitted within this scope, in emission order.
    pub constraints: Vec<Constraint>,
}

/// The scope tree for one program, plus the counters that keep type-variable
/// names unique within the compilation unit.
#[derive(Debug, Clone)]
pub struct ScopeGraph {
    scopes: Vec<Scope>,
    next_anon_var: u32,
    next_fn_var: u32,
    next_enum_id: u32,
}

impl ScopeGraph {
    pub const ROOT: ScopeId = ScopeId(0);

    /// Create a graph whose root scope has the built-in native types
    /// pre-installed.
    pub fn new() -> Self {
        let mut graph = Self {
            scopes: vec![Scope::default()],
            next_anon_var: 0,
            next_fn_var: 0,
            next_enum_id: 0,
        };
        for kind in [NativeKind::String, NativeKind::Number, NativeKind::Boolean] {
            graph.install_type(Self::ROOT, kind.as_str(), Type::Native(kind));
        }
        graph
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Iterate all scope ids in creation order.
    pub fn scope_ids(&self) -> impl Iterator<Item = ScopeId> {
        (0..self.scopes.len() as u32).map(ScopeId)
    }

    /// Append a new child scope under `parent`.
    pub fn new_child_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        self.scope_mut(parent).children.push(id);
        id
    }

    // -- Symbol declaration and lookup --

    /// Install a value symbol, rejecting redeclaration anywhere up the scope
    /// chain (the language forbids shadowing).
    pub fn declare_value(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: Type,
        span: Span,
    ) -> Result<(), DiagnosticError> {
        if self.find_value(scope, name).is_some() {
            return Err(redeclaration("value", name, span));
        }
        self.scope_mut(scope).values.insert(
            name.to_string(),
            ValueSymbol {
                name: name.to_string(),
                ty,
                scope,
            },
        );
        Ok(())
    }

    /// Install a type symbol, rejecting redeclaration anywhere up the scope
    /// chain.
    pub fn declare_type(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: Type,
        span: Span,
    ) -> Result<(), DiagnosticError> {
        if self.find_type(scope, name).is_some() {
            return Err(redeclaration("type", name, span));
        }
        self.install_type(scope, name, ty);
        Ok(())
    }

    fn install_type(&mut self, scope: ScopeId, name: &str, ty: Type) {
        self.scope_mut(scope).types.insert(
            name.to_string(),
            TypeSymbol {
                name: name.to_string(),
                ty,
                scope,
            },
        );
    }

    /// Look up a value symbol in `scope` or any ancestor.
    pub fn find_value(&self, scope: ScopeId, name: &str) -> Option<&ValueSymbol> {
        let mut current = self.scope(scope);
        loop {
            if let Some(symbol) = current.values.get(name) {
                return Some(symbol);
            }
            current = self.scope(current.parent?);
        }
    }

    /// Look up a type symbol in `scope` or any ancestor.
    pub fn find_type(&self, scope: ScopeId, name: &str) -> Option<&TypeSymbol> {
        let mut current = self.scope(scope);
        loop {
            if let Some(symbol) = current.types.get(name) {
                return Some(symbol);
            }
            current = self.scope(current.parent?);
        }
    }

    /// Find a type-variable slot anywhere in the graph.
    ///
    /// Variable names are unique within one compilation, so a name that is
    /// not on the scope chain (a body-scoped variable referenced by a
    /// parent-scope constraint) still identifies exactly one slot.
    fn find_slot_anywhere(&self, name: &str) -> Option<ScopeId> {
        self.scope_ids()
            .find(|id| self.scope(*id).types.contains_key(name))
    }

    // -- Fresh names --

    /// Allocate a fresh anonymous type variable (`t0`, `t1`, …) and install
    /// its slot in `scope`.
    pub fn fresh_type_var(&mut self, scope: ScopeId) -> Type {
        let name = format!("t{}", self.next_anon_var);
        self.next_anon_var += 1;
        let var = Type::Var(name.clone());
        self.install_type(scope, &name, var.clone());
        var
    }

    /// Allocate a fresh function identifier (`fn0`, `fn1`, …).
    pub fn fresh_fn_name(&mut self) -> String {
        let name = format!("fn{}", self.next_fn_var);
        self.next_fn_var += 1;
        name
    }

    /// Allocate a fresh enum declaration identity.
    pub fn fresh_enum_id(&mut self) -> EnumId {
        let id = EnumId(self.next_enum_id);
        self.next_enum_id += 1;
        id
    }

    // -- Constraints --

    pub fn push_constraint(&mut self, constraint: Constraint) {
        self.scope_mut(constraint.scope).constraints.push(constraint);
    }

    // -- The substitution store --

    /// Rewrite the slot of `name` to `ty`, searching the scope chain (and
    /// falling back to the unique slot anywhere in the graph). This is the
    /// unifier's single write path.
    pub fn rewrite_type_symbol(&mut self, scope: ScopeId, name: &str, ty: Type) {
        let mut current = scope;
        loop {
            if self.scope(current).types.contains_key(name) {
                break;
            }
            match self.scope(current).parent {
                Some(parent) => current = parent,
                None => {
                    let Some(owner) = self.find_slot_anywhere(name) else {
                        // A rewrite for a name with no slot installs one at
                        // the requesting scope, so chains stay followable.
                        self.install_type(scope, name, ty);
                        return;
                    };
                    current = owner;
                    break;
                }
            }
        }
        if let Some(symbol) = self.scope_mut(current).types.get_mut(name) {
            symbol.ty = ty;
        }
    }

    /// Resolve a type reference by following rewrite chains in the type
    /// tables, stopping at the first non-reference or at a self-reference
    /// (an unsolved slot).
    pub fn resolve_type(&self, scope: ScopeId, ty: &Type) -> Type {
        match ty {
            Type::Var(_) | Type::Ident(_) => {
                let mut seen: Vec<String> = Vec::new();
                let mut current = ty.clone();
                loop {
                    let name = match current.as_ref_name() {
                        Some(name) => name.to_string(),
                        None => return current,
                    };
                    if seen.contains(&name) {
                        return current;
                    }
                    let symbol = match self.find_type(scope, &name) {
                        Some(symbol) => Some(symbol),
                        // Variable slots may live outside the chain; their
                        // names are unique across the graph.
                        None if matches!(current, Type::Var(_)) => self
                            .find_slot_anywhere(&name)
                            .and_then(|owner| self.scope(owner).types.get(&name)),
                        None => None,
                    };
                    let Some(symbol) = symbol else {
                        return current;
                    };
                    if symbol.ty.as_ref_name() == Some(name.as_str()) {
                        // Unsolved slot pointing at itself.
                        return current;
                    }
                    let next = symbol.ty.clone();
                    seen.push(name);
                    current = next;
                }
            }
            Type::Reference { base, args } => match base.as_ref() {
                Type::Var(_) | Type::Ident(_) => {
                    let resolved = self.resolve_type(scope, base);
                    if resolved.as_ref_name().is_some() {
                        Type::Reference {
                            base: Box::new(resolved),
                            args: args.clone(),
                        }
                    } else {
                        // Strip the reference wrapper down to the named type.
                        resolved
                    }
                }
                _ => ty.clone(),
            },
            _ => ty.clone(),
        }
    }

    /// Apply the substitution store to a type, deeply: the top level is
    /// chased through `resolve_type`, then every nested position is rewritten
    /// the same way. Idempotent once the store has stopped changing.
    pub fn apply_type(&self, scope: ScopeId, ty: &Type) -> Type {
        let resolved = self.resolve_type(scope, ty);
        match resolved {
            Type::Function(func) => Type::Function(FunctionType {
                ident: func.ident,
                params: func
                    .params
                    .into_iter()
                    .map(|p| ParamType {
                        annotation: self.apply_type(scope, &p.annotation),
                        ..p
                    })
                    .collect(),
                ret: Box::new(self.apply_type(scope, &func.ret)),
            }),
            Type::Object(obj) => Type::Object(ObjectType {
                ident: obj.ident,
                props: obj
                    .props
                    .into_iter()
                    .map(|p| PropDef {
                        value: self.apply_type(scope, &p.value),
                        ..p
                    })
                    .collect(),
            }),
            Type::Reference { base, args } => Type::Reference {
                base,
                args: args.iter().map(|a| self.apply_type(scope, a)).collect(),
            },
            Type::Call(call) => Type::Call(FunctionCallType {
                callee: Box::new(self.apply_type(scope, &call.callee)),
                args: call.args.iter().map(|a| self.apply_type(scope, a)).collect(),
                ret: Box::new(self.apply_type(scope, &call.ret)),
            }),
            Type::EnumCall(mut call) => {
                call.args = call.args.iter().map(|a| self.apply_type(scope, a)).collect();
                Type::EnumCall(call)
            }
            Type::Variant(alts) => {
                Type::Variant(alts.iter().map(|a| self.apply_type(scope, a)).collect())
            }
            Type::Pattern(pattern) => Type::Pattern(PatternType {
                pattern: pattern.pattern,
                var: Box::new(self.apply_type(scope, &pattern.var)),
            }),
            leaf => leaf,
        }
    }

    /// Post-unification pass: run every symbol's type through the
    /// substitution store so the tables hold canonical types.
    pub fn apply_substitutions(&mut self) {
        for idx in 0..self.scopes.len() {
            let scope_id = ScopeId(idx as u32);

            let type_names: Vec<String> = self.scopes[idx].types.keys().cloned().collect();
            for name in type_names {
                let Some(ty) = self.scopes[idx].types.get(&name).map(|s| s.ty.clone()) else {
                    continue;
                };
                let applied = self.apply_type(scope_id, &ty);
                if let Some(symbol) = self.scopes[idx].types.get_mut(&name) {
                    symbol.ty = applied;
                }
            }

            let value_names: Vec<String> = self.scopes[idx].values.keys().cloned().collect();
            for name in value_names {
                let Some(ty) = self.scopes[idx].values.get(&name).map(|s| s.ty.clone()) else {
                    continue;
                };
                let applied = self.apply_type(scope_id, &ty);
                if let Some(symbol) = self.scopes[idx].values.get_mut(&name) {
                    symbol.ty = applied;
                }
            }
        }
    }
}

fn redeclaration(namespace: &str, name: &str, span: Span) -> DiagnosticError {
    DiagnosticError::single(
        Diagnostic::error(
            Category::Redeclaration,
            format!("Cannot redeclare {namespace} symbol `{name}`"),
        )
        .at(SourceLocation {
            file_id: span.file.0,
            start: span.start,
            end: span.end,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::synthetic()
    }

    #[test]
    fn new_graph_contains_root_scope_with_natives() {
        let graph = ScopeGraph::new();
        assert_eq!(graph.len(), 1);
        for native in ["string", "number", "boolean"] {
            assert!(
                graph.find_type(ScopeGraph::ROOT, native).is_some(),
                "root should pre-install `{native}`"
            );
        }
    }

    #[test]
    fn natives_are_visible_from_descendants() {
        let mut graph = ScopeGraph::new();
        let child = graph.new_child_scope(ScopeGraph::ROOT);
        let grandchild = graph.new_child_scope(child);
        let symbol = graph
            .find_type(grandchild, "number")
            .expect("native visible from grandchild");
        assert_eq!(symbol.ty, Type::NUMBER);
        assert_eq!(symbol.scope, ScopeGraph::ROOT);
    }

    #[test]
    fn child_scope_links_both_directions() {
        let mut graph = ScopeGraph::new();
        let child = graph.new_child_scope(ScopeGraph::ROOT);
        assert_eq!(graph.scope(child).parent, Some(ScopeGraph::ROOT));
        assert!(graph.scope(ScopeGraph::ROOT).children.contains(&child));
    }

    #[test]
    fn declare_value_rejects_redeclaration_in_same_scope() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        graph
            .declare_value(scope, "foo", Type::STRING, span())
            .expect("first declaration succeeds");
        let err = graph
            .declare_value(scope, "foo", Type::NUMBER, span())
            .unwrap_err();
        assert_eq!(err.category(), Some(Category::Redeclaration));
    }

    #[test]
    fn declare_value_rejects_shadowing_a_parent() {
        let mut graph = ScopeGraph::new();
        let parent = graph.new_child_scope(ScopeGraph::ROOT);
        let child = graph.new_child_scope(parent);
        graph
            .declare_value(parent, "foo", Type::STRING, span())
            .expect("parent declaration succeeds");
        let err = graph
            .declare_value(child, "foo", Type::NUMBER, span())
            .unwrap_err();
        assert_eq!(err.category(), Some(Category::Redeclaration));
    }

    #[test]
    fn sibling_scopes_may_reuse_names() {
        let mut graph = ScopeGraph::new();
        let parent = graph.new_child_scope(ScopeGraph::ROOT);
        let left = graph.new_child_scope(parent);
        let right = graph.new_child_scope(parent);
        graph
            .declare_value(left, "x", Type::STRING, span())
            .expect("left declaration succeeds");
        graph
            .declare_value(right, "x", Type::NUMBER, span())
            .expect("sibling may reuse the name");
        assert!(graph.find_value(parent, "x").is_none());
    }

    #[test]
    fn value_lookup_searches_parent_scopes() {
        let mut graph = ScopeGraph::new();
        let parent = graph.new_child_scope(ScopeGraph::ROOT);
        let child = graph.new_child_scope(parent);
        graph
            .declare_value(parent, "multi", Type::NUMBER, span())
            .expect("declaration succeeds");
        let symbol = graph.find_value(child, "multi").expect("visible in child");
        assert_eq!(symbol.ty, Type::NUMBER);
    }

    #[test]
    fn fresh_type_vars_have_sequential_names_and_slots() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let a = graph.fresh_type_var(scope);
        let b = graph.fresh_type_var(scope);
        assert_eq!(a, Type::Var("t0".to_string()));
        assert_eq!(b, Type::Var("t1".to_string()));
        assert!(graph.find_type(scope, "t0").is_some());
        assert!(graph.find_type(scope, "t1").is_some());
    }

    #[test]
    fn resolve_type_follows_rewrite_chains() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let a = graph.fresh_type_var(scope);
        let b = graph.fresh_type_var(scope);
        // t0 -> t1 -> number
        graph.rewrite_type_symbol(scope, "t0", b.clone());
        graph.rewrite_type_symbol(scope, "t1", Type::NUMBER);
        assert_eq!(graph.resolve_type(scope, &a), Type::NUMBER);
    }

    #[test]
    fn resolve_type_stops_on_unsolved_slot() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let a = graph.fresh_type_var(scope);
        assert_eq!(graph.resolve_type(scope, &a), a);
    }

    #[test]
    fn apply_substitutions_is_idempotent() {
        let mut graph = ScopeGraph::new();
        let scope = graph.new_child_scope(ScopeGraph::ROOT);
        let var = graph.fresh_type_var(scope);
        graph
            .declare_value(scope, "foo", var.clone(), span())
            .expect("declaration succeeds");
        graph.rewrite_type_symbol(scope, "t0", Type::NUMBER);

        graph.apply_substitutions();
        let snapshot = graph.clone();
        graph.apply_substitutions();

        assert_eq!(
            graph.scope(scope).values,
            snapshot.scope(scope).values,
            "second application must not change the tables"
        );
        assert_eq!(
            graph.find_value(scope, "foo").map(|s| s.ty.clone()),
            Some(Type::NUMBER)
        );
    }
}
