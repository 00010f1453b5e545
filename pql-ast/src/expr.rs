use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::token::Literal;

/// One segment of a dotted identifier, e.g. the `b` in `a.b`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentPart {
    pub name: String,
    pub is_quoted: bool,
}

impl IdentPart {
    pub fn new(name: impl Into<String>, is_quoted: bool) -> Self {
        IdentPart {
            name: name.into(),
            is_quoted,
        }
    }
}

/// A (possibly dotted) identifier. `parts` is always non-empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualifiedIdent {
    pub parts: Vec<IdentPart>,
    pub span: Span,
}

impl QualifiedIdent {
    pub fn single(part: IdentPart, span: Span) -> Self {
        QualifiedIdent {
            parts: vec![part],
            span,
        }
    }

    /// The identifier rendered with `.` joins, ignoring quoting — used for
    /// diagnostics, not for SQL emission.
    pub fn display_name(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    RegexMatch,
    NotRegexMatch,
    And,
    Or,
}

/// An expression node. Every variant carries its own span.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    BasicLit {
        value: Literal,
        span: Span,
    },
    Ident(QualifiedIdent),
    Unary {
        op: UnaryOp,
        x: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        x: Box<Expr>,
        y: Box<Expr>,
        span: Span,
    },
    In {
        x: Box<Expr>,
        vals: Vec<Expr>,
        span: Span,
    },
    Paren {
        x: Box<Expr>,
        span: Span,
    },
    Call {
        func: String,
        args: Vec<Expr>,
        span: Span,
    },
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    /// A recovery placeholder inserted where the parser could not build a
    /// real expression. Lowering never reaches one: the compiler refuses
    /// to emit SQL whenever any diagnostic was recorded.
    Error(Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::BasicLit { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::In { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Call { span, .. }
            | Expr::Index { span, .. }
            | Expr::Error(span) => *span,
            Expr::Ident(ident) => ident.span,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Expr::Error(_))
    }
}

/// `expr (asc|desc)? (nulls (first|last))?`, with the sort defaults applied
/// once parsing is done and recorded explicitly here rather than left
/// implicit, so lowering never has to re-derive them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SortTerm {
    pub expr: Expr,
    pub ascending: bool,
    pub nulls_first: bool,
    pub span: Span,
}

impl SortTerm {
    /// Applies the defaults: `ascending = true`, `nulls_first = ascending`
    /// unless the source was explicit about either.
    pub fn new(expr: Expr, ascending: Option<bool>, nulls_first: Option<bool>, span: Span) -> Self {
        let ascending = ascending.unwrap_or(true);
        let nulls_first = nulls_first.unwrap_or(ascending);
        SortTerm {
            expr,
            ascending,
            nulls_first,
            span,
        }
    }
}

/// `name = expr` in `extend`/`summarize`, or a bare `expr` that an alias is
/// inferred for later, in `project`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assign {
    pub name: Option<IdentPart>,
    pub expr: Expr,
    pub span: Span,
}
