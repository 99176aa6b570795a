//! Tracing types for unifier observability.
//!
//! These types capture step-by-step traces of constraint solving so tools
//! can expose the unifier's reasoning. All tracing is opt-in via
//! `Unifier::enable_tracing()` — zero overhead when disabled.

use serde::Serialize;

/// A single step in a unification trace.
#[derive(Debug, Clone, Serialize)]
pub struct UnifyStep {
    pub step: usize,
    pub action: UnifyAction,
    pub left: String,
    pub right: String,
    pub detail: String,
}

/// What action was taken during a unification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnifyAction {
    /// Types are already identical — no-op.
    Identity,
    /// Type variable slot rewritten (e.g. t0 := number).
    Bind,
    /// Structural recursion: decompose compound types.
    Decompose,
    /// Occurs check fired — infinite type prevented.
    OccursCheck,
    /// Unification failed.
    Error,
}
