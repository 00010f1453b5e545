//! Lowering from a [`TabularExpr`] to a single SQL statement.
//!
//! The lowering walks the operator list left to right, folding each operator
//! into the stage under construction where possible and flushing that stage
//! into a `WITH` CTE when it can't be folded further. A pristine stage (one
//! nothing has been folded into yet) is never flushed — emitting a
//! `SELECT * FROM x` CTE purely to rename `x` would be wasted ceremony the
//! worked examples never produce.

mod expr;
mod functions;
mod ident;
mod stage;

use itertools::Itertools;
use pql_ast::{Assign, Diagnostic, Expr, JoinKind, Operator, TabularExpr};

use self::expr::{infer_alias, render_expr};
use self::ident::{quote, quote_qualified};
use self::stage::{render_sort_term, SelectItem, Stage};

/// Lowers a parsed pipeline to SQL. Returns `Err` with accumulated
/// diagnostics and emits no SQL if anything along the way couldn't be
/// resolved.
pub fn lower(ast: &TabularExpr) -> Result<String, Vec<Diagnostic>> {
    let mut lowering = Lowering::new();
    let from = quote_qualified(&ast.source.name);
    lowering.stage = Stage::fresh(from);
    lowering.apply_all(&ast.operators);

    if !lowering.diagnostics.is_empty() {
        return Err(lowering.diagnostics);
    }

    Ok(lowering.finish())
}

struct Lowering {
    stage: Stage,
    ctes: Vec<(String, String)>,
    counter: usize,
    used_boundary_operator: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Lowering {
    fn new() -> Self {
        Lowering {
            stage: Stage::fresh(String::new()),
            ctes: Vec::new(),
            counter: 0,
            used_boundary_operator: false,
            diagnostics: Vec::new(),
        }
    }

    /// Commits the in-progress stage as a new CTE and starts a fresh one
    /// reading from it — unless the stage is pristine, in which case there's
    /// nothing worth committing and `from` is left untouched.
    fn flush(&mut self) {
        if self.stage.is_pristine() {
            return;
        }
        let name = format!("__subquery{}", self.counter);
        self.counter += 1;
        let sql = self.stage.render();
        let from = quote(&name);
        self.ctes.push((name, sql));
        self.stage = Stage::fresh(from);
    }

    fn finish(mut self) -> String {
        if !self.used_boundary_operator && self.ctes.is_empty() {
            return format!("{};", self.stage.render());
        }
        self.flush();
        let last = self
            .ctes
            .last()
            .map(|(name, _)| quote(name))
            .unwrap_or_else(|| self.stage.from.clone());
        let mut sql = String::from("WITH ");
        sql.push_str(
            &self
                .ctes
                .iter()
                .map(|(name, body)| format!("{} AS ({body})", quote(name)))
                .join(", "),
        );
        sql.push_str(&format!(" SELECT * FROM {last};"));
        sql
    }

    /// Applies every operator in order, giving each one a look at the
    /// operators still to come — `take` needs this to tell whether a
    /// pending `sort` should force it into its own stage.
    fn apply_all(&mut self, ops: &[Operator]) {
        for (i, op) in ops.iter().enumerate() {
            self.apply(op, &ops[i + 1..]);
        }
    }

    fn apply(&mut self, op: &Operator, rest: &[Operator]) {
        match op {
            Operator::Count { .. } => self.apply_count(),
            Operator::Take { row_count, .. } => self.apply_take(row_count, rest),
            Operator::Top { k, by, .. } => self.apply_top(k, by),
            Operator::Where { predicate, .. } => self.apply_where(predicate),
            Operator::Sort { terms, .. } => self.apply_sort(terms),
            Operator::Project { columns, span } => self.apply_project(columns, *span),
            Operator::Extend { columns, span } => self.apply_extend(columns, *span),
            Operator::Summarize {
                aggregates,
                group_by,
                span,
            } => self.apply_summarize(aggregates, group_by, *span),
            Operator::Join { kind, right, on, .. } => self.apply_join(*kind, right, on),
            Operator::As { name, .. } => self.apply_as(name),
            Operator::Render { .. } => {}
        }
    }

    fn apply_as(&mut self, name: &str) {
        self.stage.alias = Some(quote(name));
    }

    fn apply_count(&mut self) {
        self.used_boundary_operator = true;
        self.flush();
        self.stage.select = vec![SelectItem::Column {
            sql: "COUNT(*)".to_string(),
            alias: "count()".to_string(),
        }];
        self.stage.group_by = None;
        self.stage.aggregated = true;
    }

    /// `take` composes with an existing literal limit by taking the minimum;
    /// any other combination (a non-literal argument, or composing against a
    /// non-literal existing limit) just flushes and renders the new bound
    /// directly — the surrounding `LIMIT` stacking is equivalent SQL either
    /// way, the literal fold is purely cosmetic.
    fn apply_take(&mut self, row_count: &Expr, rest: &[Operator]) {
        if self.stage.aggregated {
            self.flush();
        }
        let existing = self.stage.limit.as_deref().and_then(|s| s.parse::<i64>().ok());
        match (existing, literal_long(row_count)) {
            (Some(existing), Some(new)) => self.stage.limit = Some(existing.min(new).to_string()),
            _ => {
                if self.stage.limit.is_some() {
                    self.flush();
                }
                self.stage.limit = Some(render_expr(row_count));
            }
        }
        if has_pending_order_by(rest) {
            self.flush();
        }
    }

    fn apply_top(&mut self, k: &Expr, by: &[pql_ast::SortTerm]) {
        self.used_boundary_operator = true;
        self.flush();
        self.stage.order_by = Some(by.iter().map(render_sort_term).collect());
        self.stage.limit = Some(render_expr(k));
    }

    fn apply_where(&mut self, predicate: &Expr) {
        if self.stage.aggregated || self.stage.limit.is_some() {
            self.flush();
        }
        self.stage.where_.push(render_expr(predicate));
    }

    fn apply_sort(&mut self, terms: &[pql_ast::SortTerm]) {
        if self.stage.aggregated {
            self.flush();
        }
        if self.stage.order_by.is_some() {
            self.flush();
        }
        self.stage.order_by = Some(terms.iter().map(render_sort_term).collect());
    }

    fn apply_project(&mut self, columns: &[Assign], span: pql_ast::Span) {
        if self.stage.aggregated {
            self.flush();
        }
        if let Some(items) = self.resolve_columns(columns, span) {
            self.stage.select = items;
        }
    }

    fn apply_extend(&mut self, columns: &[Assign], span: pql_ast::Span) {
        if self.stage.aggregated {
            self.flush();
        }
        if let Some(items) = self.resolve_columns(columns, span) {
            self.stage.select.extend(items);
        }
    }

    fn apply_summarize(&mut self, aggregates: &[Assign], group_by: &[Assign], span: pql_ast::Span) {
        self.used_boundary_operator = true;
        if aggregates.is_empty() && group_by.is_empty() {
            self.diagnostics.push(
                Diagnostic::simple("`summarize` needs at least one aggregate or group-by key")
                    .with_span(span),
            );
            return;
        }
        self.flush();
        let group_items = self.resolve_columns(group_by, span);
        let agg_items = self.resolve_columns(aggregates, span);
        let (Some(group_items), Some(agg_items)) = (group_items, agg_items) else {
            return;
        };
        let group_by_sql: Vec<String> = group_by.iter().map(|a| render_expr(&a.expr)).collect();
        self.stage.select = group_items.into_iter().chain(agg_items).collect();
        self.stage.group_by = if group_by_sql.is_empty() {
            None
        } else {
            Some(group_by_sql)
        };
        self.stage.aggregated = true;
    }

    fn apply_join(&mut self, kind: Option<JoinKind>, right: &TabularExpr, on: &[Expr]) {
        self.used_boundary_operator = true;
        self.flush();
        let left_from = self.stage.from.clone();

        let mut right_lowering = Lowering {
            stage: Stage::fresh(quote_qualified(&right.source.name)),
            ctes: Vec::new(),
            counter: self.counter,
            used_boundary_operator: false,
            diagnostics: Vec::new(),
        };
        right_lowering.apply_all(&right.operators);
        self.diagnostics.append(&mut right_lowering.diagnostics);
        right_lowering.flush();
        let right_from = if right_lowering.ctes.is_empty() {
            right_lowering.stage.from
        } else {
            right_lowering
                .ctes
                .last()
                .map(|(name, _)| quote(name))
                .expect("non-empty cte list has a last element")
        };
        self.counter = right_lowering.counter;
        self.ctes.append(&mut right_lowering.ctes);

        let join_kw = match kind {
            Some(JoinKind::Inner) => "INNER JOIN",
            Some(JoinKind::Left) => "LEFT JOIN",
            Some(JoinKind::Right) => "RIGHT JOIN",
            Some(JoinKind::Full) => "FULL JOIN",
            None => "JOIN",
        };
        let on_sql = on.iter().map(render_expr).collect::<Vec<_>>().join(" AND ");
        self.stage = Stage::fresh(format!("{left_from} {join_kw} {right_from} ON {on_sql}"));
    }

    /// Resolves a list of `Assign`s to rendered `SelectItem`s, inferring an
    /// alias for any bare expression and rejecting the rest; also rejects
    /// duplicate output names within the same operator.
    fn resolve_columns(&mut self, columns: &[Assign], span: pql_ast::Span) -> Option<Vec<SelectItem>> {
        let mut items = Vec::with_capacity(columns.len());
        let mut seen = std::collections::HashSet::new();
        let mut ok = true;
        for assign in columns {
            let alias = match &assign.name {
                Some(part) => part.name.clone(),
                None => match infer_alias(&assign.expr) {
                    Some(name) => name,
                    None => {
                        self.diagnostics.push(
                            Diagnostic::simple(
                                "cannot infer a column name for this expression; provide an explicit alias",
                            )
                            .with_span(assign.span),
                        );
                        ok = false;
                        continue;
                    }
                },
            };
            if !seen.insert(alias.clone()) {
                self.diagnostics.push(
                    Diagnostic::simple(format!("duplicate column name `{alias}`")).with_span(span),
                );
                ok = false;
                continue;
            }
            items.push(SelectItem::Column {
                sql: render_expr(&assign.expr),
                alias,
            });
        }
        ok.then_some(items)
    }
}

fn literal_long(e: &Expr) -> Option<i64> {
    match e {
        Expr::BasicLit { value, .. } => value.as_long().copied(),
        _ => None,
    }
}

/// Scans the operators still to come for a `sort` that would land in the
/// same stage as the `take` being applied now — a later boundary operator
/// (`top`/`count`/`summarize`/`join`) already flushes on its own, so a sort
/// past one of those doesn't count.
fn has_pending_order_by(rest: &[Operator]) -> bool {
    for op in rest {
        match op {
            Operator::Sort { .. } => return true,
            Operator::Top { .. } | Operator::Count { .. } | Operator::Summarize { .. } | Operator::Join { .. } => {
                return false
            }
            _ => {}
        }
    }
    false
}
