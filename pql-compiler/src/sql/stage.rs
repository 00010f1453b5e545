//! The stage builder: folds a `TabularExpr`'s operators into one or more
//! `SELECT` stages, flushing to a new CTE when an operator can't be folded
//! into the stage currently being built.

use itertools::Itertools;
use pql_ast::SortTerm;

use super::expr::render_expr;

#[derive(Clone, Debug)]
pub enum SelectItem {
    Star,
    Column { sql: String, alias: String },
}

/// A single `SELECT ... FROM ...` under construction. `aggregated` tracks
/// whether this stage's SELECT list is already a post-aggregation result
/// (set by `summarize`/`count`), which blocks any further row-level operator
/// from folding in without a flush first.
#[derive(Clone, Debug)]
pub struct Stage {
    pub select: Vec<SelectItem>,
    pub from: String,
    pub alias: Option<String>,
    pub where_: Vec<String>,
    pub group_by: Option<Vec<String>>,
    pub order_by: Option<Vec<String>>,
    pub limit: Option<String>,
    pub aggregated: bool,
}

impl Stage {
    pub fn fresh(from: String) -> Self {
        Stage {
            select: vec![SelectItem::Star],
            from,
            alias: None,
            where_: Vec::new(),
            group_by: None,
            order_by: None,
            limit: None,
            aggregated: false,
        }
    }

    /// True for a stage that has had nothing folded into it yet — flushing
    /// one would only produce a useless `SELECT * FROM x` CTE, so callers
    /// skip the commit entirely rather than waste a subquery slot on it.
    pub fn is_pristine(&self) -> bool {
        matches!(self.select.as_slice(), [SelectItem::Star])
            && self.alias.is_none()
            && self.where_.is_empty()
            && self.group_by.is_none()
            && self.order_by.is_none()
            && self.limit.is_none()
            && !self.aggregated
    }

    pub fn render(&self) -> String {
        let mut sql = String::from("SELECT ");
        sql.push_str(&self.select.iter().map(render_item).join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.from);
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
        if !self.where_.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_.join(" AND "));
        }
        if let Some(gb) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(&gb.join(", "));
        }
        if let Some(ob) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(&ob.join(", "));
        }
        if let Some(limit) = &self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(limit);
        }
        sql
    }
}

fn render_item(item: &SelectItem) -> String {
    match item {
        SelectItem::Star => "*".to_string(),
        SelectItem::Column { sql, alias } => format!("{sql} AS \"{alias}\""),
    }
}

pub fn render_sort_term(term: &SortTerm) -> String {
    let dir = if term.ascending { "ASC" } else { "DESC" };
    let nulls = if term.nulls_first { "NULLS FIRST" } else { "NULLS LAST" };
    format!("{} {dir} {nulls}", render_expr(&term.expr))
}
