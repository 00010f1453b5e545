use serde::{Deserialize, Serialize};

use crate::expr::{Assign, Expr, QualifiedIdent, SortTerm};
use crate::span::Span;

/// The only tabular source kind this spec supports: a reference to a table
/// by name. Kept as its own type (rather than folding it into `Operator`)
/// because the grammar treats the source specially — it's mandatory and
/// always comes first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub name: QualifiedIdent,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

/// A single pipeline stage. Order in `TabularExpr::operators` is
/// semantically significant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    Count {
        span: Span,
    },
    Take {
        row_count: Expr,
        span: Span,
    },
    Top {
        k: Expr,
        by: Vec<SortTerm>,
        span: Span,
    },
    Where {
        predicate: Expr,
        span: Span,
    },
    Sort {
        terms: Vec<SortTerm>,
        span: Span,
    },
    Project {
        columns: Vec<Assign>,
        span: Span,
    },
    Extend {
        columns: Vec<Assign>,
        span: Span,
    },
    Summarize {
        aggregates: Vec<Assign>,
        /// Group-by keys. Each may carry an explicit alias (`IsTest =
        /// endsWith(...)`) or be a bare expression whose display name is
        /// inferred during lowering — the worked example in this spec's
        /// test corpus mixes both in the same `by` clause.
        group_by: Vec<Assign>,
        span: Span,
    },
    Join {
        kind: Option<JoinKind>,
        right: Box<TabularExpr>,
        on: Vec<Expr>,
        span: Span,
    },
    As {
        name: String,
        span: Span,
    },
    /// Pass-through: affects nothing in lowering, kept only so a consuming
    /// tool (a visualizer) can see that rendering was requested.
    Render {
        span: Span,
    },
}

impl Operator {
    pub fn span(&self) -> Span {
        match self {
            Operator::Count { span }
            | Operator::Take { span, .. }
            | Operator::Top { span, .. }
            | Operator::Where { span, .. }
            | Operator::Sort { span, .. }
            | Operator::Project { span, .. }
            | Operator::Extend { span, .. }
            | Operator::Summarize { span, .. }
            | Operator::Join { span, .. }
            | Operator::As { span, .. }
            | Operator::Render { span } => *span,
        }
    }
}

/// The top-level AST node: a source table followed by zero or more
/// `|`-separated operators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TabularExpr {
    pub source: TableRef,
    pub operators: Vec<Operator>,
    pub span: Span,
}
