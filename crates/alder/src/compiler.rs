//! The per-program analysis pipeline and the module registry.
//!
//! Each program runs the same sequence: parse, require a module
//! declaration, bind the scope graph, collect constraints, solve, apply
//! substitutions. The registry maps module namespaces to analyzed programs;
//! one namespace belongs to exactly one program.

use std::collections::BTreeMap;

use alder_ast::{FileId, Program};
use alder_diag::{Category, Diagnostic, DiagnosticError};
use alder_infer::trace::UnifyStep;
use alder_infer::{bind_program, collect_program, ScopeGraph, Unifier};
use alder_syntax::parse_program_source;

/// A program that made it through the full pipeline.
#[derive(Debug, Clone)]
pub struct AnalyzedProgram {
    pub namespace: String,
    pub program: Program,
    pub graph: ScopeGraph,
    /// Resolved top-level bindings, for display.
    pub bindings: Vec<ModuleBinding>,
}

/// One resolved top-level binding.
#[derive(Debug, Clone)]
pub struct ModuleBinding {
    pub name: String,
    pub ty: String,
}

/// Analyze one source file.
pub fn analyze_source(source: &str, file: FileId) -> Result<AnalyzedProgram, DiagnosticError> {
    let (analyzed, _) = analyze_source_with(source, file, false)?;
    Ok(analyzed)
}

/// Analyze one source file, optionally capturing the unification trace.
pub fn analyze_source_with(
    source: &str,
    file: FileId,
    trace_unify: bool,
) -> Result<(AnalyzedProgram, Vec<UnifyStep>), DiagnosticError> {
    let mut program =
        parse_program_source(source, file).map_err(DiagnosticError::multiple)?;

    let Some(module) = &program.module else {
        return Err(DiagnosticError::single(Diagnostic::error(
            Category::MissingModule,
            "program is missing a module declaration",
        )));
    };
    let namespace = module.namespace();

    let mut graph = ScopeGraph::new();
    bind_program(&mut graph, &mut program)?;
    let constraints = collect_program(&mut graph, &program)?;

    let mut unifier = Unifier::new(&mut graph);
    if trace_unify {
        unifier.enable_tracing();
    }
    let solve_result = unifier.solve(constraints);
    let steps = unifier.unify_trace().to_vec();
    solve_result?;

    let bindings = top_level_bindings(&graph, &program);
    Ok((
        AnalyzedProgram {
            namespace,
            program,
            graph,
            bindings,
        },
        steps,
    ))
}

/// The resolved types of a program's top-level value symbols.
fn top_level_bindings(graph: &ScopeGraph, program: &Program) -> Vec<ModuleBinding> {
    let Some(scope) = program.scope else {
        return Vec::new();
    };
    graph
        .scope(scope)
        .values
        .values()
        .map(|symbol| ModuleBinding {
            name: symbol.name.clone(),
            ty: symbol.ty.to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Module registry
// ---------------------------------------------------------------------------

/// Process-wide mapping from module namespace to its analyzed program.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    programs: BTreeMap<String, AnalyzedProgram>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an analyzed program under its namespace.
    ///
    /// Two programs declaring the same namespace is an error.
    pub fn register(&mut self, analyzed: AnalyzedProgram) -> Result<(), DiagnosticError> {
        let namespace = analyzed.namespace.clone();
        if self.programs.contains_key(&namespace) {
            return Err(DiagnosticError::single(Diagnostic::error(
                Category::Redeclaration,
                format!("module namespace `{namespace}` is already registered"),
            )));
        }
        self.programs.insert(namespace, analyzed);
        Ok(())
    }

    pub fn get(&self, namespace: &str) -> Option<&AnalyzedProgram> {
        self.programs.get(namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

/// Render diagnostics to stderr.
pub fn emit_diagnostics(error: &DiagnosticError) {
    for diagnostic in error.diagnostics() {
        eprintln!("{diagnostic}");
    }
}
