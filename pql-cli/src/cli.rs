//! Argument parsing and the two run loops behind `pql` and `pql eval`.
//!
//! `eval` is the only named subcommand; the default (compile) mode is
//! invoked with no subcommand keyword at all, so dispatch happens by hand
//! on the raw argv before handing the rest to `clap`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use pql_ast::TokenKind;

use crate::{diagnostics, table_io};

#[derive(Parser, Debug)]
#[command(name = "pql", about = "Compiles PQL pipelines to SQL")]
struct CompileArgs {
    /// Write SQL here instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// PQL source files; stdin is read when none are given (or `-`).
    #[arg(value_name = "INPUT")]
    input: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(name = "pql eval", about = "Evaluates PQL pipelines against CSV tables")]
struct EvalArgs {
    /// A CSV file to load as a table; repeatable. The table name is the
    /// file's stem (basename without `.csv`).
    #[arg(long = "table", value_name = "PATH")]
    table: Vec<PathBuf>,

    /// Write CSV here instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// PQL source files; stdin is read when none are given (or `-`).
    #[arg(value_name = "INPUT")]
    input: Vec<PathBuf>,
}

pub fn run(mut argv: Vec<String>) -> Result<ExitCode> {
    let program = if argv.is_empty() {
        "pql".to_string()
    } else {
        argv.remove(0)
    };
    if argv.first().map(String::as_str) == Some("eval") {
        argv.remove(0);
        let args = EvalArgs::parse_from(std::iter::once(program).chain(argv));
        run_eval(args)
    } else {
        let args = CompileArgs::parse_from(std::iter::once(program).chain(argv));
        run_compile(args)
    }
}

fn run_compile(args: CompileArgs) -> Result<ExitCode> {
    let sources = read_sources(&args.input)?;
    let mut out = open_output(args.output.as_deref())?;
    let mut failed = false;
    let mut wrote_one = false;

    for (label, content) in &sources {
        for stmt in pql_parser::split_statements(content) {
            if is_blank(stmt) {
                continue;
            }
            match pql_compiler::compile(stmt) {
                Ok(sql) => {
                    if wrote_one {
                        writeln!(out)?;
                    }
                    wrote_one = true;
                    writeln!(out, "{sql}")?;
                }
                Err(diags) => {
                    failed = true;
                    for diag in &diags {
                        diagnostics::report(label, stmt, diag);
                    }
                }
            }
        }
    }
    Ok(exit_code(failed))
}

fn run_eval(args: EvalArgs) -> Result<ExitCode> {
    let tables = table_io::load_tables(&args.table)?;
    let sources = read_sources(&args.input)?;
    let mut out = open_output(args.output.as_deref())?;
    let mut failed = false;
    let mut wrote_one = false;

    for (label, content) in &sources {
        for stmt in pql_parser::split_statements(content) {
            if is_blank(stmt) {
                continue;
            }
            match pql_compiler::eval::eval(stmt, &tables) {
                Ok(table) => {
                    if wrote_one {
                        writeln!(out)?;
                    }
                    wrote_one = true;
                    table_io::write_table(&mut out, &table)?;
                }
                Err(diag) => {
                    failed = true;
                    diagnostics::report(label, stmt, &diag);
                }
            }
        }
    }
    Ok(exit_code(failed))
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn open_output(path: Option<&std::path::Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("{}: cannot create output file", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

/// Reads every input into memory up front, tagging each with a label used
/// only for diagnostic rendering.
fn read_sources(inputs: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if inputs.is_empty() {
        return Ok(vec![("<stdin>".to_string(), read_stdin()?)]);
    }
    inputs
        .iter()
        .map(|path| {
            if path.as_os_str() == "-" {
                Ok(("<stdin>".to_string(), read_stdin()?))
            } else {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("{}: cannot read input file", path.display()))?;
                Ok((path.display().to_string(), content))
            }
        })
        .collect()
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf).context("cannot read stdin")?;
    Ok(buf)
}

/// A statement whose token scan is nothing but `Eof` — pure whitespace,
/// comments, or the empty string after the last `;` — is discarded rather
/// than compiled.
fn is_blank(stmt: &str) -> bool {
    pql_parser::scan(stmt)
        .iter()
        .all(|t| matches!(t.kind, TokenKind::Eof))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blank_statement_is_whitespace_or_comment_only() {
        assert!(is_blank("   "));
        assert!(is_blank("// just a comment\n"));
        assert!(!is_blank("T | count"));
    }
}
