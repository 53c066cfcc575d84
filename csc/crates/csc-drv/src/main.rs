//! csc - CompilScript compiler CLI.
//!
//! Reads one source file, runs the pipeline, and reports diagnostics to
//! stderr. Exit codes: 0 on success, 1 when the source has errors, 2 for
//! host failures (unreadable file).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use csc_drv::{compile, CompileOptions};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// CompilScript compiler
#[derive(Parser, Debug)]
#[command(name = "csc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile CompilScript source to three-address code", long_about = None)]
struct Cli {
    /// Source file to compile
    file: PathBuf,

    /// Print the TAC listing to stdout
    #[arg(long)]
    emit_tac: bool,

    /// Print a Graphviz DOT dump of the typed AST to stdout
    #[arg(long)]
    emit_ast_dot: bool,

    /// Print the annotated scope tree as JSON to stdout
    #[arg(long)]
    emit_scopes: bool,

    /// Print the whole report as JSON to stdout (overrides other emits)
    #[arg(long)]
    json: bool,

    /// Skip the memory annotator
    #[arg(long)]
    no_annotate: bool,

    /// Enable debug logging
    #[arg(short, long, env = "CSC_VERBOSE")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = match read_source(&cli.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: {:#}", error);
            return ExitCode::from(2);
        }
    };

    let options = CompileOptions {
        return_ast_dot: cli.emit_ast_dot || cli.json,
        generate_tac: cli.emit_tac || cli.json,
        annotate_memory: !cli.no_annotate,
    };
    let report = compile(&source, &options);

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(error) => {
                eprintln!("error: cannot serialize report: {}", error);
                return ExitCode::from(2);
            }
        }
    } else {
        for diagnostic in &report.diagnostics {
            eprintln!("{}", diagnostic);
        }
        if report.ok {
            if cli.emit_tac {
                if let Some(tac) = &report.tac {
                    for line in &tac.code {
                        println!("{}", line);
                    }
                }
            }
            if cli.emit_ast_dot {
                if let Some(dot) = &report.ast_dot {
                    print!("{}", dot);
                }
            }
            if cli.emit_scopes {
                if let Some(scopes) = &report.scopes {
                    match serde_json::to_string_pretty(scopes) {
                        Ok(json) => println!("{}", json),
                        Err(error) => {
                            eprintln!("error: cannot serialize scopes: {}", error);
                            return ExitCode::from(2);
                        }
                    }
                }
            }
        }
    }

    if report.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

/// Read the source file, with the path folded into the error
fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Install the tracing subscriber for the CLI process
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_minimal() {
        let cli = Cli::parse_from(["csc", "main.csp"]);
        assert_eq!(cli.file, PathBuf::from("main.csp"));
        assert!(!cli.emit_tac);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_parse_emit_flags() {
        let cli = Cli::parse_from(["csc", "main.csp", "--emit-tac", "--emit-scopes"]);
        assert!(cli.emit_tac);
        assert!(cli.emit_scopes);
        assert!(!cli.emit_ast_dot);
    }

    #[test]
    fn test_cli_parse_json_and_verbose() {
        let cli = Cli::parse_from(["csc", "-v", "--json", "main.csp"]);
        assert!(cli.json);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_no_annotate() {
        let cli = Cli::parse_from(["csc", "main.csp", "--no-annotate"]);
        assert!(cli.no_annotate);
    }
}
