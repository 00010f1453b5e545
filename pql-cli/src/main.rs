//! CLI front end for the PQL compiler. Kept deliberately thin:
//! all real work happens in `pql-compiler`; this crate only wires up
//! argument parsing, file I/O and diagnostic rendering around it.

mod cli;
mod diagnostics;
mod table_io;

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_default_env().format_timestamp(None).init();
    match cli::run(std::env::args().collect()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("pql: {err}");
            ExitCode::FAILURE
        }
    }
}
