//! Java tokenizer.
//!
//! Produces just enough structure for declaration parsing: identifiers,
//! punctuation and opaque literals. Comments are dropped, but a `/** ... */`
//! comment directly in front of a token is remembered on that token so the
//! parser can hand it to the declaration starting there.

use super::ast::Span;
use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifiers and keywords alike.
    Ident,
    /// Number, string, text block or char literal.
    Literal,
    /// Any single punctuation character; `>>` is two tokens.
    Punct(char),
    /// `...`
    Ellipsis,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Documentation comment preceding this token with no other comment in between.
    pub doc: Option<Span>,
}

/// Split `src` into tokens. The result always ends with a single `Eof` token.
///
/// A leading byte order mark is skipped; spans still index into `src`.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    Lexer {
        src,
        pos: if src.starts_with('\u{feff}') { '\u{feff}'.len_utf8() } else { 0 },
        tokens: Vec::new(),
        pending_doc: None,
    }
    .run()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    pending_doc: Option<Span>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        while let Some(c) = self.peek() {
            let start = self.pos;

            if c.is_whitespace() {
                self.pos += c.len_utf8();
                continue;
            }
            if self.rest().starts_with("//") {
                self.line_comment();
                continue;
            }
            if self.rest().starts_with("/*") {
                self.block_comment(start)?;
                continue;
            }

            let kind = if c == '"' {
                self.string(start)?;
                TokenKind::Literal
            } else if c == '\'' {
                self.char_literal(start)?;
                TokenKind::Literal
            } else if is_ident_start(c) || self.escape().is_some_and(|(c, _)| is_ident_start(c)) {
                self.ident();
                TokenKind::Ident
            } else if c.is_ascii_digit() || (c == '.' && self.peek_second().is_some_and(|n| n.is_ascii_digit())) {
                self.number();
                TokenKind::Literal
            } else if self.rest().starts_with("...") {
                self.pos += 3;
                TokenKind::Ellipsis
            } else {
                self.pos += c.len_utf8();
                TokenKind::Punct(c)
            };

            self.tokens.push(Token {
                kind,
                span: Span {
                    start,
                    end: self.pos,
                },
                doc: self.pending_doc.take(),
            });
        }

        let end = self.src.len();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span { start: end, end },
            doc: self.pending_doc.take(),
        });
        Ok(self.tokens)
    }

    fn line_comment(&mut self) {
        let len = self.rest().find('\n').unwrap_or(self.rest().len());
        self.pos += len;
        self.pending_doc = None;
    }

    fn block_comment(&mut self, start: usize) -> Result<(), ParseError> {
        let Some(close) = self.src[start + 2..].find("*/") else {
            return Err(ParseError::at(self.src, start, "unterminated comment"));
        };
        self.pos = start + 2 + close + 2;

        let text = &self.src[start..self.pos];
        let is_doc = text.starts_with("/**") && text != "/**/";
        self.pending_doc = is_doc.then_some(Span {
            start,
            end: self.pos,
        });
        Ok(())
    }

    fn string(&mut self, start: usize) -> Result<(), ParseError> {
        if self.rest().starts_with("\"\"\"") {
            return self.text_block(start);
        }
        self.pos += 1;
        loop {
            match self.advance() {
                Some('\\') => {
                    self.advance();
                }
                Some('"') => return Ok(()),
                Some('\n') | None => {
                    return Err(ParseError::at(self.src, start, "unterminated string literal"))
                }
                Some(_) => {}
            }
        }
    }

    fn text_block(&mut self, start: usize) -> Result<(), ParseError> {
        self.pos += 3;
        loop {
            if self.rest().starts_with("\"\"\"") {
                self.pos += 3;
                return Ok(());
            }
            match self.advance() {
                Some('\\') => {
                    self.advance();
                }
                Some(_) => {}
                None => return Err(ParseError::at(self.src, start, "unterminated text block")),
            }
        }
    }

    fn char_literal(&mut self, start: usize) -> Result<(), ParseError> {
        self.pos += 1;
        loop {
            match self.advance() {
                Some('\\') => {
                    self.advance();
                }
                Some('\'') => return Ok(()),
                Some('\n') | None => {
                    return Err(ParseError::at(self.src, start, "unterminated character literal"))
                }
                Some(_) => {}
            }
        }
    }

    /// Identifier, possibly spelled with `\uXXXX` escapes. The token text
    /// keeps the escapes as written.
    fn ident(&mut self) {
        loop {
            if self.peek().is_some_and(is_ident_part) {
                self.advance();
            } else if let Some((c, len)) = self.escape() {
                if !is_ident_part(c) {
                    return;
                }
                self.pos += len;
            } else {
                return;
            }
        }
    }

    /// Unicode escape at the current position: the character it stands for
    /// and its length in bytes. Any number of `u`s may follow the backslash.
    fn escape(&self) -> Option<(char, usize)> {
        let rest = self.rest().strip_prefix('\\')?;
        let digits = rest.trim_start_matches('u');
        let us = rest.len() - digits.len();
        if us == 0 {
            return None;
        }
        let hex = digits.get(..4)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let c = char::from_u32(u32::from_str_radix(hex, 16).ok()?)?;
        Some((c, 1 + us + 4))
    }

    fn number(&mut self) {
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '+' | '-') && matches!(prev, 'e' | 'E' | 'p' | 'P');
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign) {
                break;
            }
            self.advance();
            prev = c;
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
