mod compiler;

pub use compiler::{
    analyze_source, analyze_source_with, emit_diagnostics, AnalyzedProgram, ModuleBinding,
    ModuleRegistry,
};

#[cfg(test)]
mod e2e_tests;
