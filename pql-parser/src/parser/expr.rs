//! Expression grammar: precedence climbing over primary,
//! unary, multiplicative, additive, relational, `and`, `or`, with `in` as a
//! primary postfix rather than a relational operator.

use pql_ast::{Assign, BinaryOp, Expr, IdentPart, Keyword, Reason, Span, SortTerm, TokenKind, UnaryOp};

use super::Parser;

impl<'t> Parser<'t> {
    pub(super) fn peek_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    pub(super) fn parse_expr(&mut self) -> Expr {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Expr {
        let mut x = self.parse_and();
        while matches!(self.kind(), TokenKind::Keyword(Keyword::Or)) {
            self.bump();
            let y = self.parse_and();
            let span = Span::merge(x.span(), y.span());
            x = Expr::Binary {
                op: BinaryOp::Or,
                x: Box::new(x),
                y: Box::new(y),
                span,
            };
        }
        x
    }

    fn parse_and(&mut self) -> Expr {
        let mut x = self.parse_relational();
        while matches!(self.kind(), TokenKind::Keyword(Keyword::And)) {
            self.bump();
            let y = self.parse_relational();
            let span = Span::merge(x.span(), y.span());
            x = Expr::Binary {
                op: BinaryOp::And,
                x: Box::new(x),
                y: Box::new(y),
                span,
            };
        }
        x
    }

    fn parse_relational(&mut self) -> Expr {
        let mut x = self.parse_additive();
        loop {
            let op = match self.kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::Ne => BinaryOp::Ne,
                TokenKind::Tilde => BinaryOp::RegexMatch,
                TokenKind::NotTilde => BinaryOp::NotRegexMatch,
                _ => break,
            };
            self.bump();
            let y = self.parse_additive();
            let span = Span::merge(x.span(), y.span());
            x = Expr::Binary {
                op,
                x: Box::new(x),
                y: Box::new(y),
                span,
            };
        }
        x
    }

    fn parse_additive(&mut self) -> Expr {
        let mut x = self.parse_multiplicative();
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let y = self.parse_multiplicative();
            let span = Span::merge(x.span(), y.span());
            x = Expr::Binary {
                op,
                x: Box::new(x),
                y: Box::new(y),
                span,
            };
        }
        x
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut x = self.parse_unary();
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            let y = self.parse_unary();
            let span = Span::merge(x.span(), y.span());
            x = Expr::Binary {
                op,
                x: Box::new(x),
                y: Box::new(y),
                span,
            };
        }
        x
    }

    fn parse_unary(&mut self) -> Expr {
        let op = match self.kind() {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
            _ => None,
        };
        match op {
            Some(op) => {
                let start = self.span();
                self.bump();
                let x = self.parse_unary();
                let span = Span::merge(start, x.span());
                Expr::Unary {
                    op,
                    x: Box::new(x),
                    span,
                }
            }
            None => self.parse_in_postfix(),
        }
    }

    fn parse_in_postfix(&mut self) -> Expr {
        let x = self.parse_primary();
        if matches!(self.kind(), TokenKind::Keyword(Keyword::In)) {
            self.bump();
            if !self.eat(&TokenKind::LParen) {
                self.expected("`(` after `in`");
            }
            let mut vals = Vec::new();
            if !matches!(self.kind(), TokenKind::RParen) {
                loop {
                    vals.push(self.parse_expr());
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            let close = self.span();
            if !self.eat(&TokenKind::RParen) {
                self.expected("`)`");
            }
            let span = Span::merge(x.span(), close);
            Expr::In {
                x: Box::new(x),
                vals,
                span,
            }
        } else {
            x
        }
    }

    fn parse_primary(&mut self) -> Expr {
        let start = self.span();
        match self.kind().clone() {
            TokenKind::Literal(lit) => {
                self.bump();
                Expr::BasicLit {
                    value: lit,
                    span: start,
                }
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr();
                let close = self.span();
                if !self.eat(&TokenKind::RParen) {
                    self.expected("`)`");
                }
                Expr::Paren {
                    x: Box::new(inner),
                    span: Span::merge(start, close),
                }
            }
            TokenKind::Ident { .. } => {
                let ident = self
                    .parse_qualified_ident()
                    .expect("Ident token already matched above");
                if matches!(self.kind(), TokenKind::LParen) {
                    self.bump();
                    let mut args = Vec::new();
                    if !matches!(self.kind(), TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr());
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let close = self.span();
                    if !self.eat(&TokenKind::RParen) {
                        self.expected("`)`");
                    }
                    Expr::Call {
                        func: ident.display_name(),
                        args,
                        span: Span::merge(ident.span, close),
                    }
                } else {
                    Expr::Ident(ident)
                }
            }
            _ => {
                self.error(
                    Reason::Expected {
                        expected: "an expression".to_string(),
                        found: self.kind().to_string(),
                    },
                    start,
                );
                self.recover_to(start)
            }
        }
    }

    // ----- sort terms & assignment lists -----------------------------------

    pub(super) fn parse_sort_term(&mut self) -> SortTerm {
        let expr = self.parse_expr();
        let mut ascending = None;
        if matches!(self.kind(), TokenKind::Keyword(Keyword::Asc)) {
            self.bump();
            ascending = Some(true);
        } else if matches!(self.kind(), TokenKind::Keyword(Keyword::Desc)) {
            self.bump();
            ascending = Some(false);
        }
        let mut nulls_first = None;
        if matches!(self.kind(), TokenKind::Keyword(Keyword::Nulls)) {
            self.bump();
            if matches!(self.kind(), TokenKind::Keyword(Keyword::First)) {
                self.bump();
                nulls_first = Some(true);
            } else if matches!(self.kind(), TokenKind::Keyword(Keyword::Last)) {
                self.bump();
                nulls_first = Some(false);
            } else {
                self.expected("`first` or `last`");
            }
        }
        let span = expr.span();
        SortTerm::new(expr, ascending, nulls_first, span)
    }

    pub(super) fn parse_sort_term_list(&mut self) -> Vec<SortTerm> {
        let mut terms = vec![self.parse_sort_term()];
        while self.eat(&TokenKind::Comma) {
            terms.push(self.parse_sort_term());
        }
        terms
    }

    /// `Ident '=' Expr`, used by `extend` and `summarize`'s aggregate list,
    /// where a name is mandatory.
    pub(super) fn parse_assign(&mut self) -> Assign {
        let start = self.span();
        match self.parse_ident_part() {
            Some((part, ident_span)) => {
                if !self.eat(&TokenKind::Eq) {
                    self.expected("`=`");
                }
                let expr = self.parse_expr();
                Assign {
                    span: Span::merge(ident_span, expr.span()),
                    name: Some(part),
                    expr,
                }
            }
            None => {
                self.expected("a column name");
                let expr = self.recover_to(start);
                Assign {
                    name: None,
                    span: start,
                    expr,
                }
            }
        }
    }

    pub(super) fn parse_assign_list(&mut self) -> Vec<Assign> {
        let mut assigns = vec![self.parse_assign()];
        while self.eat(&TokenKind::Comma) {
            assigns.push(self.parse_assign());
        }
        assigns
    }

    /// `Ident '=' Expr | Expr`, used by `project` and `summarize`'s `by`
    /// list, where naming is optional.
    pub(super) fn parse_assign_or_expr(&mut self) -> Assign {
        let start = self.span();
        if let TokenKind::Ident { name, is_quoted } = self.kind().clone() {
            if matches!(self.peek_at(1), TokenKind::Eq) {
                self.bump();
                self.bump();
                let expr = self.parse_expr();
                return Assign {
                    span: Span::merge(start, expr.span()),
                    name: Some(IdentPart::new(name, is_quoted)),
                    expr,
                };
            }
        }
        let expr = self.parse_expr();
        Assign {
            span: expr.span(),
            name: None,
            expr,
        }
    }

    pub(super) fn parse_assign_or_expr_list(&mut self) -> Vec<Assign> {
        let mut assigns = vec![self.parse_assign_or_expr()];
        while self.eat(&TokenKind::Comma) {
            assigns.push(self.parse_assign_or_expr());
        }
        assigns
    }
}
