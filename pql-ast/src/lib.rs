//! Passive AST, token and diagnostic types shared by the PQL scanner, parser
//! and compiler.
//!
//! This crate owns no behavior beyond small constructors — it exists so that
//! tooling which only needs to inspect PQL structure (a formatter, an LSP)
//! can depend on it without pulling in the parser or SQL lowering.

pub mod error;
pub mod expr;
pub mod query;
pub mod span;
pub mod token;

pub use error::{Diagnostic, Reason};
pub use expr::{Assign, BinaryOp, Expr, IdentPart, QualifiedIdent, SortTerm, UnaryOp};
pub use query::{JoinKind, Operator, TabularExpr, TableRef};
pub use span::Span;
pub use token::{Keyword, Literal, Token, TokenKind};
