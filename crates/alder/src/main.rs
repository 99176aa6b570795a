use std::fs;
use std::path::PathBuf;

use alder::{analyze_source_with, emit_diagnostics, ModuleRegistry};
use alder_ast::FileId;

fn main() {
    if let Err(message) = run() {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = std::env::args().collect::<Vec<_>>();
    let command = parse_cli(&args)?;

    match command {
        Command::Check {
            inputs,
            trace_unify,
        } => check(&inputs, trace_unify),
    }
}

fn check(inputs: &[PathBuf], trace_unify: bool) -> Result<(), String> {
    let mut registry = ModuleRegistry::new();
    let mut failed = false;

    for (index, input) in inputs.iter().enumerate() {
        let source = fs::read_to_string(input)
            .map_err(|err| format!("failed to read `{}`: {err}", input.display()))?;

        match analyze_source_with(&source, FileId(index as u32), trace_unify) {
            Ok((analyzed, steps)) => {
                for step in &steps {
                    eprintln!(
                        "[unify {}] {} ~ {}: {}",
                        step.step, step.left, step.right, step.detail
                    );
                }
                println!("{}: module {}", input.display(), analyzed.namespace);
                for binding in &analyzed.bindings {
                    println!("  {}: {}", binding.name, binding.ty);
                }
                if let Err(err) = registry.register(analyzed) {
                    emit_diagnostics(&err);
                    failed = true;
                }
            }
            Err(err) => {
                eprintln!("{} failed:", input.display());
                emit_diagnostics(&err);
                failed = true;
            }
        }
    }

    if failed {
        Err("check failed".to_string())
    } else {
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Check {
        inputs: Vec<PathBuf>,
        trace_unify: bool,
    },
}

fn parse_cli(args: &[String]) -> Result<Command, String> {
    if args.len() < 3 {
        return Err(usage());
    }

    match args[1].as_str() {
        "check" => {
            let mut inputs = Vec::new();
            let mut trace_unify = false;
            for arg in &args[2..] {
                match arg.as_str() {
                    "--trace-unify" => trace_unify = true,
                    unknown if unknown.starts_with("--") => {
                        return Err(format!("unknown argument `{unknown}`\n{}", usage()));
                    }
                    path => inputs.push(PathBuf::from(path)),
                }
            }
            if inputs.is_empty() {
                return Err(usage());
            }
            Ok(Command::Check {
                inputs,
                trace_unify,
            })
        }
        _ => Err(usage()),
    }
}

fn usage() -> String {
    "usage:\n  alder check <file.ald>... [--trace-unify]".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_check_single_file() {
        let command = parse_cli(&args(&["alder", "check", "main.ald"]))
            .expect("cli parse should succeed");
        assert_eq!(
            command,
            Command::Check {
                inputs: vec![PathBuf::from("main.ald")],
                trace_unify: false,
            }
        );
    }

    #[test]
    fn parse_check_multiple_files_with_trace() {
        let command = parse_cli(&args(&[
            "alder",
            "check",
            "a.ald",
            "b.ald",
            "--trace-unify",
        ]))
        .expect("cli parse should succeed");
        assert_eq!(
            command,
            Command::Check {
                inputs: vec![PathBuf::from("a.ald"), PathBuf::from("b.ald")],
                trace_unify: true,
            }
        );
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = parse_cli(&args(&["alder", "check", "a.ald", "--wat"])).unwrap_err();
        assert!(err.contains("unknown argument"));
    }

    #[test]
    fn missing_inputs_print_usage() {
        let err = parse_cli(&args(&["alder", "check"])).unwrap_err();
        assert!(err.contains("usage:"));
        let err = parse_cli(&args(&["alder", "frobnicate", "a.ald"])).unwrap_err();
        assert!(err.contains("usage:"));
    }
}
