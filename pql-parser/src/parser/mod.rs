//! Recursive-descent parser. Consumes a token stream and
//! produces `(TabularExpr?, Diagnostics[])`. Recovery never loses the rest
//! of the input: a syntax error is recorded once and parsing resynchronizes
//! at the next `|`, a top-level statement terminator, or a matching close
//! bracket, leaving an `ErrorExpr` placeholder behind.

mod expr;

use pql_ast::query::{JoinKind, Operator, TabularExpr, TableRef};
use pql_ast::{Diagnostic, Expr, IdentPart, QualifiedIdent, Reason, Span, Token, TokenKind};

use crate::lexer;

/// Parses a single PQL statement. `src` should be one statement as returned
/// by [`crate::split::split_statements`] — this function does not itself
/// split on `;`.
pub fn parse(src: &str) -> (Option<TabularExpr>, Vec<Diagnostic>) {
    let tokens = lexer::scan(src);
    let mut parser = Parser::new(&tokens);
    let tabular = parser.parse_tabular_expr();
    (tabular, parser.diagnostics)
}

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Parser {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    fn current(&self) -> &Token {
        // The token stream always ends in Eof, so this never runs past the end.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn at_eof(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    fn bump(&mut self) -> Token {
        let tok = self.current().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.kind() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&mut self, reason: Reason, span: Span) {
        self.diagnostics.push(Diagnostic::new(reason).with_span(span));
    }

    fn expected(&mut self, what: &str) -> Span {
        let span = self.span();
        self.error(
            Reason::Expected {
                expected: what.to_string(),
                found: self.kind().to_string(),
            },
            span,
        );
        span
    }

    /// Skips any lexer-level error tokens encountered while scanning forward
    /// during recovery, recording one diagnostic per token so nothing is
    /// silently dropped. Consecutive error tokens are collapsed into
    /// individual diagnostics but do not otherwise interrupt the caller.
    fn report_lexer_error_if_any(&mut self) {
        if let TokenKind::Error(msg) = self.kind().clone() {
            let span = self.span();
            self.error(Reason::Simple(msg), span);
        }
    }

    /// Resynchronizes after a syntax error by scanning forward until a `|`,
    /// `;`, EOF, or a matching `)` is reached. Returns an
    /// `ErrorExpr` spanning the skipped text.
    fn recover_to(&mut self, start: Span) -> Expr {
        let mut depth: i32 = 0;
        loop {
            match self.kind() {
                TokenKind::Eof | TokenKind::Semicolon => break,
                TokenKind::Pipe if depth == 0 => break,
                TokenKind::LParen => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RParen => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
        Expr::Error(Span::merge(start, self.span()))
    }

    fn parse_qualified_ident(&mut self) -> Option<QualifiedIdent> {
        let part = self.parse_ident_part()?;
        let mut span = part.1;
        let mut parts = vec![part.0];
        while matches!(self.kind(), TokenKind::Dot) {
            self.bump();
            match self.parse_ident_part() {
                Some((p, s)) => {
                    span = Span::merge(span, s);
                    parts.push(p);
                }
                None => {
                    self.expected("an identifier after `.`");
                    break;
                }
            }
        }
        Some(QualifiedIdent { parts, span })
    }

    fn parse_ident_part(&mut self) -> Option<(IdentPart, Span)> {
        match self.kind().clone() {
            TokenKind::Ident { name, is_quoted } => {
                let span = self.span();
                self.bump();
                Some((IdentPart::new(name, is_quoted), span))
            }
            // Unknown keywords in identifier position are accepted as plain
            // identifiers rather than hard failures.
            TokenKind::Keyword(kw) => {
                let span = self.span();
                self.bump();
                Some((IdentPart::new(kw.to_string(), false), span))
            }
            _ => None,
        }
    }

    // ----- TabularExpr ----------------------------------------------------

    fn parse_tabular_expr(&mut self) -> Option<TabularExpr> {
        self.report_lexer_error_if_any();
        let source = self.parse_source()?;
        let mut operators = Vec::new();
        let mut span = source.span;
        while self.eat(&TokenKind::Pipe) {
            self.report_lexer_error_if_any();
            if let Some(op) = self.parse_operator() {
                span = Span::merge(span, op.span());
                operators.push(op);
            }
        }
        if !self.at_eof() {
            // Leftover tokens after the pipeline (e.g. a stray `;`-less
            // second statement) are a syntax error, but don't discard what
            // was already parsed.
            let unexpected_span = self.expected("end of statement");
            self.recover_to(unexpected_span);
        }
        Some(TabularExpr {
            source,
            operators,
            span,
        })
    }

    fn parse_source(&mut self) -> Option<TableRef> {
        let ident = self.parse_qualified_ident().or_else(|| {
            self.expected("a table name");
            None
        })?;
        Some(TableRef {
            span: ident.span,
            name: ident,
        })
    }

    fn parse_operator(&mut self) -> Option<Operator> {
        let start = self.span();
        let kw = match self.kind().clone() {
            TokenKind::Keyword(kw) => kw,
            _ => {
                self.expected("an operator keyword");
                return Some(Operator::As {
                    name: String::new(),
                    span: self.recover_to(start).span(),
                });
            }
        };
        use pql_ast::Keyword::*;
        self.bump();
        let op = match kw {
            Count => Operator::Count { span: start },
            Take => {
                let row_count = self.parse_expr();
                Operator::Take {
                    span: Span::merge(start, row_count.span()),
                    row_count,
                }
            }
            Top => {
                let k = self.parse_expr();
                self.require_keyword(By);
                let by = self.parse_sort_term_list();
                let end = by.last().map(|t| t.span).unwrap_or_else(|| k.span());
                Operator::Top {
                    k,
                    by,
                    span: Span::merge(start, end),
                }
            }
            Where => {
                let predicate = self.parse_expr();
                Operator::Where {
                    span: Span::merge(start, predicate.span()),
                    predicate,
                }
            }
            Sort => {
                self.require_keyword(By);
                let terms = self.parse_sort_term_list();
                let end = terms.last().map(|t| t.span).unwrap_or(start);
                Operator::Sort {
                    terms,
                    span: Span::merge(start, end),
                }
            }
            Project => {
                let columns = self.parse_assign_or_expr_list();
                let end = columns.last().map(|c| c.span).unwrap_or(start);
                Operator::Project {
                    columns,
                    span: Span::merge(start, end),
                }
            }
            Extend => {
                let columns = self.parse_assign_list();
                let end = columns.last().map(|c| c.span).unwrap_or(start);
                Operator::Extend {
                    columns,
                    span: Span::merge(start, end),
                }
            }
            Summarize => self.parse_summarize(start),
            Inner | Left | Right | Full => {
                let kind = match kw {
                    Inner => JoinKind::Inner,
                    Left => JoinKind::Left,
                    Right => JoinKind::Right,
                    _ => JoinKind::Full,
                };
                self.require_keyword(Join);
                self.parse_join(start, Some(kind))
            }
            Join => self.parse_join(start, None),
            As => {
                let name = self.parse_ident_part().map(|(p, _)| p.name).unwrap_or_else(|| {
                    self.expected("a name");
                    String::new()
                });
                Operator::As {
                    span: start,
                    name,
                }
            }
            Render => Operator::Render { span: start },
            other => {
                self.error(
                    Reason::Unexpected {
                        found: format!("keyword `{other}` in operator position"),
                    },
                    start,
                );
                Operator::Render { span: start }
            }
        };
        Some(op)
    }

    fn require_keyword(&mut self, kw: pql_ast::Keyword) {
        if matches!(self.kind(), TokenKind::Keyword(k) if *k == kw) {
            self.bump();
        } else {
            self.expected(&format!("keyword `{kw}`"));
        }
    }

    fn parse_summarize(&mut self, start: Span) -> Operator {
        let mut aggregates = Vec::new();
        if !matches!(self.kind(), TokenKind::Keyword(pql_ast::Keyword::By) | TokenKind::Pipe | TokenKind::Eof | TokenKind::Semicolon)
        {
            aggregates = self.parse_assign_list();
        }
        let mut group_by = Vec::new();
        if matches!(self.kind(), TokenKind::Keyword(pql_ast::Keyword::By)) {
            self.bump();
            group_by = self.parse_assign_or_expr_list();
        }
        if aggregates.is_empty() && group_by.is_empty() {
            self.error(
                Reason::Simple(
                    "`summarize` with no aggregates and no `by` columns is not allowed".into(),
                ),
                start,
            );
        }
        let end = group_by
            .last()
            .map(|e| e.span)
            .or_else(|| aggregates.last().map(|a| a.span))
            .unwrap_or(start);
        Operator::Summarize {
            aggregates,
            group_by,
            span: Span::merge(start, end),
        }
    }

    /// Parses the `'(' TabularExpr ')' 'on' Expr (',' Expr)*` tail of a join.
    /// The caller has already consumed the leading `join` keyword (and any
    /// `inner`/`left`/`right`/`full` prefix).
    fn parse_join(&mut self, start: Span, kind: Option<JoinKind>) -> Operator {
        let right = if self.eat(&TokenKind::LParen) {
            let inner = self.parse_tabular_expr();
            if !self.eat(&TokenKind::RParen) {
                self.expected("`)`");
            }
            inner
        } else {
            self.expected("`(`");
            None
        };
        let right = right.unwrap_or_else(|| TabularExpr {
            source: TableRef {
                name: QualifiedIdent::single(IdentPart::new("", false), start),
                span: start,
            },
            operators: Vec::new(),
            span: start,
        });
        self.require_keyword(pql_ast::Keyword::On);
        let mut on = Vec::new();
        loop {
            on.push(self.parse_expr());
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let end = on.last().map(|e| e.span()).unwrap_or(start);
        Operator::Join {
            kind,
            right: Box::new(right),
            on,
            span: Span::merge(start, end),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pql_ast::query::Operator;

    #[test]
    fn count_pipeline_has_no_diagnostics() {
        let (ast, diags) = parse("StormEvents | count");
        assert!(diags.is_empty());
        let ast = ast.unwrap();
        assert_eq!(ast.source.name.display_name(), "StormEvents");
        assert_eq!(ast.operators.len(), 1);
        assert!(matches!(ast.operators[0], Operator::Count { .. }));
    }

    #[test]
    fn where_and_take_chain() {
        let (ast, diags) = parse("StormEvents | where State == 'TEXAS' | take 3");
        assert!(diags.is_empty());
        let ast = ast.unwrap();
        assert_eq!(ast.operators.len(), 2);
        assert!(matches!(ast.operators[0], Operator::Where { .. }));
        assert!(matches!(ast.operators[1], Operator::Take { .. }));
    }

    #[test]
    fn sort_term_defaults() {
        let (ast, diags) = parse("T | sort by A, B desc");
        assert!(diags.is_empty());
        let ast = ast.unwrap();
        let Operator::Sort { terms, .. } = &ast.operators[0] else {
            panic!("expected Sort");
        };
        assert!(terms[0].ascending && terms[0].nulls_first);
        assert!(!terms[1].ascending && !terms[1].nulls_first);
    }

    #[test]
    fn project_accepts_alias_or_bare_expr() {
        let (ast, diags) = parse("T | project A=x+1, y");
        assert!(diags.is_empty());
        let ast = ast.unwrap();
        let Operator::Project { columns, .. } = &ast.operators[0] else {
            panic!("expected Project");
        };
        assert_eq!(columns[0].name.as_ref().unwrap().name, "A");
        assert!(columns[1].name.is_none());
    }

    #[test]
    fn summarize_by_allows_mixed_aliasing() {
        let (ast, diags) = parse(
            "SourceFiles | summarize TotalLines=sum(LineCount) by Directory, IsTest=endsWith(FileName,'_test.go')",
        );
        assert!(diags.is_empty());
        let ast = ast.unwrap();
        let Operator::Summarize {
            aggregates,
            group_by,
            ..
        } = &ast.operators[0]
        else {
            panic!("expected Summarize");
        };
        assert_eq!(aggregates[0].name.as_ref().unwrap().name, "TotalLines");
        assert!(group_by[0].name.is_none());
        assert_eq!(group_by[1].name.as_ref().unwrap().name, "IsTest");
    }

    #[test]
    fn empty_summarize_is_a_diagnostic() {
        let (_, diags) = parse("T | summarize");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn in_binds_tighter_than_and() {
        let (ast, diags) = parse("T | where a in (1, 2) and b");
        assert!(diags.is_empty());
        let ast = ast.unwrap();
        let Operator::Where { predicate, .. } = &ast.operators[0] else {
            panic!("expected Where");
        };
        assert!(matches!(predicate, Expr::Binary { op: pql_ast::BinaryOp::And, .. }));
    }

    #[test]
    fn unknown_keyword_in_operator_position_recovers() {
        // `frobnicate` is not a keyword at all, so it's simply an unexpected
        // token here, but parsing should still recover and keep going.
        let (ast, diags) = parse("T | frobnicate | count");
        assert!(!diags.is_empty());
        let ast = ast.unwrap();
        assert!(ast.operators.iter().any(|op| matches!(op, Operator::Count { .. })));
    }

    #[test]
    fn join_parses_nested_tabular_expr() {
        let (ast, diags) = parse("A | join (B | where x == 1) on A.id, id");
        assert!(diags.is_empty());
        let ast = ast.unwrap();
        let Operator::Join { right, on, kind, .. } = &ast.operators[0] else {
            panic!("expected Join");
        };
        assert!(kind.is_none());
        assert_eq!(right.operators.len(), 1);
        assert_eq!(on.len(), 2);
    }

    #[test]
    fn every_span_is_within_source() {
        let src = "StormEvents | where State == 'TEXAS' | take 3";
        let (ast, _) = parse(src);
        let ast = ast.unwrap();
        fn check(span: Span, len: usize) {
            assert!(span.start <= span.end && span.end <= len);
        }
        check(ast.span, src.len());
        check(ast.source.span, src.len());
        for op in &ast.operators {
            check(op.span(), src.len());
        }
    }
}
