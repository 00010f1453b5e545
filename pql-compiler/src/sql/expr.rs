//! Lowers AST expressions to SQL text.
//!
//! Arithmetic operators render without padding (`"x"+1`) while comparison
//! and logical operators render with it (`"State" = 'TEXAS'`) — both forms
//! come directly from the worked examples in the test corpus.

use pql_ast::{BinaryOp, Expr, Literal, UnaryOp};

use super::functions::translate_call;
use super::ident::quote_qualified;

pub fn render_expr(e: &Expr) -> String {
    match e {
        Expr::BasicLit { value, .. } => render_literal(value),
        Expr::Ident(ident) => quote_qualified(ident),
        Expr::Unary { op, x, .. } => render_unary(*op, x),
        Expr::Binary { op, x, y, .. } => render_binary(*op, x, y),
        Expr::In { x, vals, .. } => {
            let items = vals.iter().map(render_expr).collect::<Vec<_>>().join(", ");
            format!("{} IN ({items})", render_expr(x))
        }
        Expr::Paren { x, .. } => format!("({})", render_expr(x)),
        Expr::Call { func, args, .. } => {
            let rendered = args.iter().map(render_expr).collect::<Vec<_>>();
            translate_call(func, &rendered)
        }
        Expr::Index { x, index, .. } => format!("{}[{}]", render_expr(x), render_expr(index)),
        Expr::Error(_) => unreachable!("lowering never runs over an AST carrying diagnostics"),
    }
}

fn render_literal(lit: &Literal) -> String {
    match lit {
        Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
        Literal::Long(n) => n.to_string(),
        Literal::Real(n) => {
            if n.fract() == 0.0 {
                format!("{n:.1}")
            } else {
                n.to_string()
            }
        }
    }
}

fn render_unary(op: UnaryOp, x: &Expr) -> String {
    let inner = render_expr(x);
    match op {
        UnaryOp::Plus => format!("+{inner}"),
        UnaryOp::Minus => format!("-{inner}"),
        UnaryOp::Not => format!("NOT {inner}"),
    }
}

fn render_binary(op: BinaryOp, x: &Expr, y: &Expr) -> String {
    let lhs = render_expr(x);
    let rhs = render_expr(y);
    match op {
        BinaryOp::Mul => format!("{lhs}*{rhs}"),
        BinaryOp::Div => format!("{lhs}/{rhs}"),
        BinaryOp::Mod => format!("{lhs}%{rhs}"),
        BinaryOp::Add => format!("{lhs}+{rhs}"),
        BinaryOp::Sub => format!("{lhs}-{rhs}"),
        BinaryOp::Lt => format!("{lhs} < {rhs}"),
        BinaryOp::Le => format!("{lhs} <= {rhs}"),
        BinaryOp::Gt => format!("{lhs} > {rhs}"),
        BinaryOp::Ge => format!("{lhs} >= {rhs}"),
        BinaryOp::Eq => format!("{lhs} = {rhs}"),
        BinaryOp::Ne => format!("{lhs} <> {rhs}"),
        BinaryOp::RegexMatch => format!("{lhs} ~ {rhs}"),
        BinaryOp::NotRegexMatch => format!("{lhs} !~ {rhs}"),
        BinaryOp::And => format!("{lhs} AND {rhs}"),
        BinaryOp::Or => format!("{lhs} OR {rhs}"),
    }
}

/// Infers a display name for an aliasless column (`project`
/// and `summarize` accept a bare expression when it's an identifier or a
/// call; anything else needs an explicit name).
pub fn infer_alias(e: &Expr) -> Option<String> {
    match e {
        Expr::Ident(ident) => ident.parts.last().map(|p| p.name.clone()),
        Expr::Call { func, .. } => Some(format!("{func}()")),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use pql_ast::{IdentPart, QualifiedIdent, Span};

    use super::*;

    fn ident(name: &str) -> Expr {
        let span = Span::new(0, name.len());
        Expr::Ident(QualifiedIdent::single(IdentPart::new(name, false), span))
    }

    #[test]
    fn arithmetic_has_no_padding() {
        let span = Span::new(0, 0);
        let e = Expr::Binary {
            op: BinaryOp::Add,
            x: Box::new(ident("x")),
            y: Box::new(Expr::BasicLit {
                value: Literal::Long(1),
                span,
            }),
            span,
        };
        assert_eq!(render_expr(&e), "\"x\"+1");
    }

    #[test]
    fn comparison_is_padded() {
        let span = Span::new(0, 0);
        let e = Expr::Binary {
            op: BinaryOp::Eq,
            x: Box::new(ident("State")),
            y: Box::new(Expr::BasicLit {
                value: Literal::String("TEXAS".into()),
                span,
            }),
            span,
        };
        assert_eq!(render_expr(&e), "\"State\" = 'TEXAS'");
    }

    #[test]
    fn string_literal_doubles_single_quotes() {
        let span = Span::new(0, 0);
        let lit = Literal::String("it's".into());
        assert_eq!(render_literal(&lit), "'it''s'");
        let _ = span;
    }

    #[test]
    fn infer_alias_from_call_uses_bare_function_name() {
        let span = Span::new(0, 0);
        let call = Expr::Call {
            func: "count".into(),
            args: vec![],
            span,
        };
        assert_eq!(infer_alias(&call).as_deref(), Some("count()"));
    }
}
