//! Tokenizer. Consumes a source string and produces a finite token sequence
//! ending in `TokenKind::Eof`; never aborts.

use std::str::Chars;

use pql_ast::{Keyword, Literal, Span, Token, TokenKind};

/// Tokenizes `src` in full, producing an exhaustive token sequence
/// token shape, adapted from a chumsky char-stream parser into a hand-rolled
/// scanner, since this spec calls for a classic scan loop rather than a
/// parser-combinator lexer.
pub fn scan(src: &str) -> Vec<Token> {
    Scanner::new(src).scan_all()
}

struct Scanner<'a> {
    src: &'a str,
    chars: Chars<'a>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner {
            src,
            chars: src.chars(),
            pos: 0,
        }
    }

    fn scan_all(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let trivia_start = self.pos;
            if !self.skip_trivia() {
                // Hit EOF inside an unterminated block comment.
                let span = Span::new(trivia_start, self.pos);
                tokens.push(Token::new(
                    TokenKind::Error("unterminated block comment".to_string()),
                    span,
                ));
                tokens.push(Token::new(TokenKind::Eof, Span::at(self.pos)));
                break;
            }
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, Span::at(start)));
                break;
            };
            let kind = self.scan_token(c);
            let span = Span::new(start, self.pos);
            log::trace!("token {kind:?} at {span:?}");
            tokens.push(Token::new(kind, span));
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut it = self.chars.clone();
        it.next();
        it.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Skips whitespace and comments. Returns `false` if an unterminated
    /// block comment ran into end-of-input, so the caller can surface it as
    /// an error token rather than silently dropping the rest of the file.
    fn skip_trivia(&mut self) -> bool {
        loop {
            match self.peek() {
                Some(c) if c == ' ' || c == '\t' || c == '\r' || c == '\n' => {
                    self.bump();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    self.bump();
                    self.bump();
                    let mut depth = 1usize;
                    loop {
                        match self.peek() {
                            None => return false,
                            Some('/') if self.peek2() == Some('*') => {
                                self.bump();
                                self.bump();
                                depth += 1;
                            }
                            Some('*') if self.peek2() == Some('/') => {
                                self.bump();
                                self.bump();
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return true,
            }
        }
    }

    fn scan_token(&mut self, c: char) -> TokenKind {
        match c {
            '[' => self.scan_quoted_ident(']'),
            '`' => self.scan_quoted_ident('`'),
            '"' => self.scan_string('"'),
            '\'' => self.scan_string('\''),
            c if c.is_ascii_digit() => self.scan_number(),
            '.' if self.peek2().is_some_and(|d| d.is_ascii_digit()) => self.scan_number(),
            c if is_ident_start(c) => self.scan_ident(),
            _ => self.scan_punct(),
        }
    }

    fn scan_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        let name = &self.src[start..self.pos];
        match name.parse::<Keyword>() {
            Ok(kw) => TokenKind::Keyword(kw),
            Err(_) => TokenKind::Ident {
                name: name.to_string(),
                is_quoted: false,
            },
        }
    }

    fn scan_quoted_ident(&mut self, close: char) -> TokenKind {
        self.bump(); // opening delimiter
        let start = self.pos;
        loop {
            match self.peek() {
                None => {
                    let text = self.src[start..self.pos].to_string();
                    return TokenKind::Error(format!("unterminated quoted identifier `{text}`"));
                }
                Some(c) if c == close => {
                    let name = self.src[start..self.pos].to_string();
                    self.bump();
                    return TokenKind::Ident {
                        name,
                        is_quoted: true,
                    };
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return TokenKind::Error("unterminated string literal".to_string());
                }
                Some(c) if c == quote => {
                    self.bump();
                    return TokenKind::Literal(Literal::String(value));
                }
                Some('\\') => {
                    self.bump();
                    match self.scan_escape() {
                        Some(ch) => value.push(ch),
                        None => return TokenKind::Error("invalid escape sequence".to_string()),
                    }
                }
                Some(c) => {
                    self.bump();
                    value.push(c);
                }
            }
        }
    }

    fn scan_escape(&mut self) -> Option<char> {
        let c = self.bump()?;
        match c {
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            '0' => Some('\0'),
            'x' => {
                let hi = self.bump()?.to_digit(16)?;
                let lo = self.bump()?.to_digit(16)?;
                char::from_u32(hi * 16 + lo)
            }
            'u' => {
                let mut value = 0u32;
                for _ in 0..4 {
                    let digit = self.bump()?.to_digit(16)?;
                    value = value * 16 + digit;
                }
                char::from_u32(value)
            }
            _ => None,
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut is_real = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && self.peek2().is_some_and(|d| d.is_ascii_digit()) {
            is_real = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let mut exp_len = 1;
            if matches!(lookahead.clone().next(), Some('+') | Some('-')) {
                lookahead.next();
                exp_len += 1;
            }
            if lookahead.clone().next().is_some_and(|d| d.is_ascii_digit()) {
                is_real = true;
                for _ in 0..exp_len {
                    self.bump();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        let text = &self.src[start..self.pos];
        if is_real {
            TokenKind::Literal(Literal::Real(text.parse().unwrap_or(f64::NAN)))
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Literal(Literal::Long(n)),
                Err(_) => TokenKind::Error(format!("invalid integer literal `{text}`")),
            }
        }
    }

    fn scan_punct(&mut self) -> TokenKind {
        let rest = self.rest();
        // Longest match first.
        let two_char = [
            ("<=", TokenKind::Le),
            (">=", TokenKind::Ge),
            ("!=", TokenKind::Ne),
            ("==", TokenKind::Eq),
            ("!~", TokenKind::NotTilde),
        ];
        for (spelling, kind) in two_char {
            if rest.starts_with(spelling) {
                self.bump();
                self.bump();
                return kind;
            }
        }
        let c = self.bump().expect("caller already peeked a char");
        match c {
            '|' => TokenKind::Pipe,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '=' => TokenKind::Eq,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '~' => TokenKind::Tilde,
            other => TokenKind::Error(format!("stray character `{other}`")),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        scan(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_vs_idents() {
        assert_eq!(
            kinds("where and Foo"),
            vec![
                TokenKind::Keyword(Keyword::Where),
                TokenKind::Keyword(Keyword::And),
                TokenKind::Ident {
                    name: "Foo".into(),
                    is_quoted: false
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn quoted_ident_never_becomes_keyword() {
        assert_eq!(
            kinds("[where]"),
            vec![
                TokenKind::Ident {
                    name: "where".into(),
                    is_quoted: true
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(
            kinds("1 1.5 .5 1e3 1.2e-3"),
            vec![
                TokenKind::Literal(Literal::Long(1)),
                TokenKind::Literal(Literal::Real(1.5)),
                TokenKind::Literal(Literal::Real(0.5)),
                TokenKind::Literal(Literal::Real(1000.0)),
                TokenKind::Literal(Literal::Real(0.0012)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![
                TokenKind::Literal(Literal::String("a\nb".to_string())),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_recovers() {
        let toks = kinds("\"abc\nwhere");
        assert!(matches!(toks[0], TokenKind::Error(_)));
        assert_eq!(toks[1], TokenKind::Keyword(Keyword::Where));
    }

    #[test]
    fn longest_match_punctuation() {
        assert_eq!(
            kinds("<= >= != == !~ ~ |"),
            vec![
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Ne,
                TokenKind::Eq,
                TokenKind::NotTilde,
                TokenKind::Tilde,
                TokenKind::Pipe,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_errors_to_eof() {
        let toks = kinds("where /* never closed");
        assert_eq!(toks[0], TokenKind::Keyword(Keyword::Where));
        assert!(matches!(toks[1], TokenKind::Error(_)));
        assert_eq!(toks[2], TokenKind::Eof);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("where // trailing\n/* block */ and"),
            vec![
                TokenKind::Keyword(Keyword::Where),
                TokenKind::Keyword(Keyword::And),
                TokenKind::Eof,
            ]
        );
    }
}
