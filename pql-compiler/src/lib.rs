//! Compiles PQL pipelines to SQL, and evaluates them directly against
//! in-memory tables.

pub mod eval;
mod sql;

use pql_ast::Diagnostic;

/// Parses and lowers a single PQL statement to SQL. Returns the diagnostics
/// collected by either stage if anything went wrong; in that case no SQL is
/// emitted.
pub fn compile(source: &str) -> Result<String, Vec<Diagnostic>> {
    let (ast, mut diagnostics) = pql_parser::parse(source);
    let Some(ast) = ast.filter(|_| diagnostics.is_empty()) else {
        if diagnostics.is_empty() {
            diagnostics.push(Diagnostic::simple("empty input produced no query"));
        }
        return Err(diagnostics);
    };
    log::debug!("parsed {} operator(s) from {} byte(s)", ast.operators.len(), source.len());
    sql::lower(&ast)
}
