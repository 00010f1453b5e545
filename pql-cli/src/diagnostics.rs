//! Renders a [`Diagnostic`] both to the exact `pql: <message>` contract line
//! and, beneath it, an `ariadne`-drawn snippet pointing at the
//! offending span for a human reading the terminal.

use std::ops::Range;

use ariadne::{Label, Report, ReportKind, Source};
use pql_ast::Diagnostic;

/// Prints one diagnostic to stderr. `label` names the source (a file path or
/// `<stdin>`) and `source` is the statement text the diagnostic's span was
/// computed against.
pub fn report(label: &str, source: &str, diag: &Diagnostic) {
    eprintln!("pql: {}", diag.reason);

    let range: Range<usize> = diag
        .span
        .map(Into::into)
        .unwrap_or(0..source.len().min(1));
    let built = Report::build(ReportKind::Error, label, range.start)
        .with_message(diag.reason.to_string())
        .with_label(Label::new((label, range)).with_message("here"))
        .finish();
    let _ = built.write((label, Source::from(source)), anstream::stderr());
}
