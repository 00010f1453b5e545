//! A minimal in-memory evaluator for the subset of PQL that doesn't need a
//! SQL engine at all: `count`, `take N`, `where P` over tables
//! already loaded into memory. Unlike the compiler, which accumulates every
//! diagnostic it can find, the evaluator aborts on the first error — there's
//! no partial result to report once a row can't be evaluated.

mod table;
mod value;

use std::collections::HashMap;

use pql_ast::{BinaryOp, Diagnostic, Expr, Operator, TabularExpr, UnaryOp};

pub use table::Table;
pub use value::Value;

/// Evaluates a single PQL statement against already-loaded tables.
pub fn eval(source: &str, tables: &HashMap<String, Table>) -> Result<Table, Diagnostic> {
    let (ast, diagnostics) = pql_parser::parse(source);
    if let Some(first) = diagnostics.into_iter().next() {
        return Err(first);
    }
    let ast = ast.ok_or_else(|| Diagnostic::simple("empty input produced no query"))?;
    run(&ast, tables)
}

fn run(ast: &TabularExpr, tables: &HashMap<String, Table>) -> Result<Table, Diagnostic> {
    let table_name = ast.source.name.display_name();
    let mut table = tables
        .get(&table_name)
        .cloned()
        .ok_or_else(|| {
            Diagnostic::simple(format!("unknown table `{table_name}`")).with_span(ast.source.span)
        })?;

    for op in &ast.operators {
        table = apply(op, table)?;
    }
    Ok(table)
}

fn apply(op: &Operator, table: Table) -> Result<Table, Diagnostic> {
    match op {
        Operator::Count { .. } => Ok(Table::new(
            vec!["count()".to_string()],
            vec![vec![table.rows.len().to_string()]],
        )),
        Operator::Take { row_count, span } => {
            let n = literal_row_count(row_count)
                .ok_or_else(|| Diagnostic::simple("`take` requires a literal row count").with_span(*span))?;
            let rows = table.rows.into_iter().take(n).collect();
            Ok(Table::new(table.columns, rows))
        }
        Operator::Where { predicate, .. } => {
            let mut kept = Vec::with_capacity(table.rows.len());
            for row in &table.rows {
                if eval_expr(predicate, &table.columns, row)?.is_truthy() {
                    kept.push(row.clone());
                }
            }
            Ok(Table::new(table.columns, kept))
        }
        other => Err(Diagnostic::simple(format!(
            "the evaluator doesn't support `{}`",
            operator_name(other)
        ))
        .with_span(other.span())),
    }
}

fn operator_name(op: &Operator) -> &'static str {
    match op {
        Operator::Count { .. } => "count",
        Operator::Take { .. } => "take",
        Operator::Top { .. } => "top",
        Operator::Where { .. } => "where",
        Operator::Sort { .. } => "sort",
        Operator::Project { .. } => "project",
        Operator::Extend { .. } => "extend",
        Operator::Summarize { .. } => "summarize",
        Operator::Join { .. } => "join",
        Operator::As { .. } => "as",
        Operator::Render { .. } => "render",
    }
}

fn literal_row_count(e: &Expr) -> Option<usize> {
    match e {
        Expr::BasicLit { value, .. } => value.as_long().copied().filter(|n| *n >= 0).map(|n| n as usize),
        _ => None,
    }
}

fn eval_expr(e: &Expr, columns: &[String], row: &[String]) -> Result<Value, Diagnostic> {
    match e {
        Expr::BasicLit { value, .. } => Ok(Value::from_literal(value)),
        Expr::Ident(ident) => {
            let name = ident.display_name();
            match name.as_str() {
                "true" => Ok(Value::bool(true)),
                "false" => Ok(Value::bool(false)),
                "null" => Ok(Value(Value::NULL.to_string())),
                _ => {
                    let idx = columns
                        .iter()
                        .position(|c| c == &name)
                        .ok_or_else(|| Diagnostic::simple(format!("unknown column `{name}`")).with_span(ident.span))?;
                    Ok(Value(row[idx].clone()))
                }
            }
        }
        Expr::Unary { op: UnaryOp::Not, x, .. } => {
            let v = eval_expr(x, columns, row)?;
            Ok(Value::bool(!v.is_truthy()))
        }
        Expr::Unary { op: UnaryOp::Minus, x, .. } => {
            let v = eval_expr(x, columns, row)?;
            Ok(Value(match v.as_str().strip_prefix('-') {
                Some(rest) => rest.to_string(),
                None => format!("-{}", v.as_str()),
            }))
        }
        Expr::Unary { op: UnaryOp::Plus, x, .. } => eval_expr(x, columns, row),
        Expr::Binary { op: BinaryOp::Eq, x, y, .. } => {
            let (x, y) = (eval_expr(x, columns, row)?, eval_expr(y, columns, row)?);
            Ok(Value::bool(x.as_str() == y.as_str()))
        }
        Expr::Binary { op: BinaryOp::Ne, x, y, .. } => {
            let (x, y) = (eval_expr(x, columns, row)?, eval_expr(y, columns, row)?);
            Ok(Value::bool(x.as_str() != y.as_str()))
        }
        Expr::Binary { op: BinaryOp::And, x, y, .. } => {
            let x = eval_expr(x, columns, row)?;
            if x.is_truthy() {
                eval_expr(y, columns, row)
            } else {
                Ok(x)
            }
        }
        Expr::Binary { op: BinaryOp::Or, x, y, .. } => {
            let x = eval_expr(x, columns, row)?;
            if x.is_truthy() {
                Ok(x)
            } else {
                eval_expr(y, columns, row)
            }
        }
        Expr::Binary { span, .. } => {
            Err(Diagnostic::simple("the evaluator only supports `==`, `!=`, `and`, `or`").with_span(*span))
        }
        Expr::In { x, vals, span } => {
            let x = eval_expr(x, columns, row)?;
            for v in vals {
                if eval_expr(v, columns, row)?.as_str() == x.as_str() {
                    return Ok(Value::bool(true));
                }
            }
            let _ = span;
            Ok(Value::bool(false))
        }
        Expr::Paren { x, .. } => eval_expr(x, columns, row),
        Expr::Call { func, args, span } if func.eq_ignore_ascii_case("not") && args.len() == 1 => {
            let v = eval_expr(&args[0], columns, row)?;
            let _ = span;
            Ok(Value::bool(!v.is_truthy()))
        }
        Expr::Call { func, args, .. } if func.eq_ignore_ascii_case("strcat") => {
            let mut out = String::new();
            for a in args {
                out.push_str(eval_expr(a, columns, row)?.as_str());
            }
            Ok(Value(out))
        }
        Expr::Call { func, span, .. } => {
            Err(Diagnostic::simple(format!("the evaluator doesn't support function `{func}`")).with_span(*span))
        }
        Expr::Index { span, .. } => {
            Err(Diagnostic::simple("the evaluator doesn't support indexing").with_span(*span))
        }
        Expr::Error(span) => Err(Diagnostic::simple("cannot evaluate an expression with a parse error").with_span(*span)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<&str>>) -> Table {
        Table::new(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn tables(name: &str, t: Table) -> HashMap<String, Table> {
        let mut map = HashMap::new();
        map.insert(name.to_string(), t);
        map
    }

    #[test]
    fn count_returns_row_total() {
        let t = table(&["a"], vec![vec!["1"], vec!["2"], vec!["3"]]);
        let result = eval("T | count", &tables("T", t)).unwrap();
        assert_eq!(result.columns, vec!["count()".to_string()]);
        assert_eq!(result.rows, vec![vec!["3".to_string()]]);
    }

    #[test]
    fn take_truncates_rows() {
        let t = table(&["a"], vec![vec!["1"], vec!["2"], vec!["3"]]);
        let result = eval("T | take 2", &tables("T", t)).unwrap();
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn where_filters_by_string_equality() {
        let t = table(&["State"], vec![vec!["TEXAS"], vec!["UTAH"]]);
        let result = eval("T | where State == 'TEXAS'", &tables("T", t)).unwrap();
        assert_eq!(result.rows, vec![vec!["TEXAS".to_string()]]);
    }

    #[test]
    fn and_short_circuits_and_returns_an_operand() {
        let t = table(&["a"], vec![vec!["0"]]);
        let result = eval("T | where a == '0' and a == '0'", &tables("T", t)).unwrap();
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn unsupported_operator_is_an_error() {
        let t = table(&["a"], vec![vec!["1"]]);
        assert!(eval("T | sort by a", &tables("T", t)).is_err());
    }

    #[test]
    fn unknown_table_is_an_error() {
        let t = table(&["a"], vec![]);
        assert!(eval("Other | count", &tables("T", t)).is_err());
    }
}
