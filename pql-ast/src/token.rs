use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A single lexical token, tagged with the byte span it was scanned from.
///
/// Pairs a `TokenKind` with the `Span` it came from: a token never owns a
/// reference into the source, so the scanner can hand tokens to the parser
/// without fighting the borrow checker over the input string's lifetime.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {:?}", self.span, self.kind)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    /// A bare or quoted identifier. `is_quoted` preserves whether the source
    /// spelled it `[Like This]` / `` `like this` `` — such identifiers are
    /// always classified as `Ident`, never a keyword, regardless of spelling.
    Ident { name: String, is_quoted: bool },
    Keyword(Keyword),
    Literal(Literal),

    /// Multi-character and single-character punctuation.
    Pipe,      // |
    LParen,    // (
    RParen,    // )
    Comma,     // ,
    Semicolon, // ;
    Dot,       // .
    Eq,        // == or =
    Ne,        // !=
    Lt,        // <
    Le,        // <=
    Gt,        // >
    Ge,        // >=
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Percent,   // %
    Tilde,     // ~
    NotTilde,  // !~

    /// A lexical error: an unterminated string or block comment. The span
    /// covers everything the scanner gave up on recovering.
    Error(String),

    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    And,
    Or,
    In,
    Not,
    By,
    Asc,
    Desc,
    Nulls,
    First,
    Last,
    Count,
    Take,
    Top,
    Where,
    Sort,
    Project,
    Extend,
    Summarize,
    Join,
    Inner,
    Left,
    Right,
    Full,
    On,
    As,
    Render,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident { name, .. } => {
                if name.is_empty() {
                    write!(f, "an identifier")
                } else {
                    write!(f, "`{name}`")
                }
            }
            TokenKind::Keyword(k) => write!(f, "keyword `{k}`"),
            TokenKind::Literal(lit) => write!(f, "{lit}"),
            TokenKind::Pipe => f.write_str("`|`"),
            TokenKind::LParen => f.write_str("`(`"),
            TokenKind::RParen => f.write_str("`)`"),
            TokenKind::Comma => f.write_str("`,`"),
            TokenKind::Semicolon => f.write_str("`;`"),
            TokenKind::Dot => f.write_str("`.`"),
            TokenKind::Eq => f.write_str("`==`"),
            TokenKind::Ne => f.write_str("`!=`"),
            TokenKind::Lt => f.write_str("`<`"),
            TokenKind::Le => f.write_str("`<=`"),
            TokenKind::Gt => f.write_str("`>`"),
            TokenKind::Ge => f.write_str("`>=`"),
            TokenKind::Plus => f.write_str("`+`"),
            TokenKind::Minus => f.write_str("`-`"),
            TokenKind::Star => f.write_str("`*`"),
            TokenKind::Slash => f.write_str("`/`"),
            TokenKind::Percent => f.write_str("`%`"),
            TokenKind::Tilde => f.write_str("`~`"),
            TokenKind::NotTilde => f.write_str("`!~`"),
            TokenKind::Error(msg) => write!(f, "an invalid token ({msg})"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// A scanned literal value, retaining enough of the original spelling to
/// round-trip through the lowering stage without losing precision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, enum_as_inner::EnumAsInner)]
pub enum Literal {
    String(String),
    Long(i64),
    Real(f64),
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "string {s:?}"),
            Literal::Long(n) => write!(f, "{n}"),
            Literal::Real(n) => write!(f, "{n}"),
        }
    }
}
