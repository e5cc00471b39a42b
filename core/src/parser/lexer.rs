//! Lexer
//!
//! Turns source text into a flat token list. Unknown characters are reported
//! and skipped; the lexer never stops early except when the input exceeds the
//! configured size limit.

use serde::{Deserialize, Serialize};

use super::ast::{LineIndex, Span};
use super::diagnostics::{Diagnostic, DiagnosticCode};

/// Words that lex as [`TokenKind::Keyword`] instead of identifiers
pub const KEYWORDS: &[&str] = &[
    "let", "const", "if", "else", "while", "for", "true", "false", "null",
];

const THREE_CHAR_OPERATORS: &[&str] = &["===", "!=="];

const TWO_CHAR_OPERATORS: &[&str] = &[
    "==", "!=", ">=", "<=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=",
];

const SINGLE_CHAR_PUNCT: &str = "+-*/%(){}[];,<>=!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Number,
    String,
    Identifier,
    Keyword,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// True for a punctuation or keyword token with exactly this text
    pub fn is(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Punct | TokenKind::Keyword) && self.text == text
    }
}

/// Size limit applied before lexing
#[derive(Debug, Clone, Copy)]
pub struct LexLimits {
    pub max_file_size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<Diagnostic>,
}

/// Tokenize `source`.
///
/// Inputs larger than `limits.max_file_size` bytes produce no tokens and a
/// single `max-file-size` diagnostic.
pub fn tokenize(source: &str, limits: LexLimits) -> LexOutput {
    let lines = LineIndex::new(source);
    if source.len() > limits.max_file_size {
        let span = Span::new(0, 0);
        return LexOutput {
            tokens: Vec::new(),
            errors: vec![Diagnostic::error(
                DiagnosticCode::MaxFileSize,
                format!(
                    "Input is {} bytes, which exceeds the limit of {} bytes",
                    source.len(),
                    limits.max_file_size
                ),
                span,
                lines.loc(span),
            )],
        };
    }

    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        lines,
        out: LexOutput::default(),
    };
    lexer.run();
    lexer.out
}

struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    lines: LineIndex<'s>,
    out: LexOutput,
}

impl<'s> Lexer<'s> {
    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            if c.is_ascii_whitespace() {
                self.pos += 1;
            } else if self.starts_with("//") {
                self.skip_line_comment();
            } else if self.starts_with("/*") {
                self.skip_block_comment();
            } else if c.is_ascii_digit() {
                self.number();
            } else if c == b'"' || c == b'\'' {
                self.string(c);
            } else if c == b'_' || c == b'$' || c.is_ascii_alphabetic() {
                self.word();
            } else if !self.punct() {
                self.unknown();
            }
        }
    }

    fn starts_with(&self, text: &str) -> bool {
        self.bytes[self.pos..].starts_with(text.as_bytes())
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.out.tokens.push(Token {
            kind,
            text: self.source[start..self.pos].to_string(),
            span: Span::new(start, self.pos),
        });
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.bytes.len() && !self.starts_with("*/") {
            self.pos += 1;
        }
        self.pos = (self.pos + 2).min(self.bytes.len());
    }

    fn number(&mut self) {
        let start = self.pos;
        self.eat_digits();
        if self.bytes.get(self.pos) == Some(&b'.')
            && self.bytes.get(self.pos + 1).is_some_and(|b| b.is_ascii_digit())
        {
            self.pos += 1;
            self.eat_digits();
        }
        self.push(TokenKind::Number, start);
    }

    fn eat_digits(&mut self) {
        while self.bytes.get(self.pos).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    /// Escapes are copied verbatim; the closing quote only ends the string
    /// when it is not preceded by a backslash.
    fn string(&mut self, quote: u8) {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.bytes.get(self.pos) {
                None => {
                    let span = Span::new(start, self.pos);
                    self.out.errors.push(Diagnostic::error(
                        DiagnosticCode::UnterminatedString,
                        "Unterminated string literal",
                        span,
                        self.lines.loc(span),
                    ));
                    break;
                }
                Some(b'\\') => self.pos = (self.pos + 2).min(self.bytes.len()),
                Some(&b) if b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        // a trailing lone backslash can leave pos inside a multi-byte char
        while !self.source.is_char_boundary(self.pos) {
            self.pos += 1;
        }
        self.push(TokenKind::String, start);
    }

    fn word(&mut self) {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| *b == b'_' || *b == b'$' || b.is_ascii_alphanumeric())
        {
            self.pos += 1;
        }
        let kind = if KEYWORDS.contains(&&self.source[start..self.pos]) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.push(kind, start);
    }

    fn punct(&mut self) -> bool {
        let start = self.pos;
        for op in THREE_CHAR_OPERATORS.iter().chain(TWO_CHAR_OPERATORS) {
            if self.starts_with(op) {
                self.pos += op.len();
                self.push(TokenKind::Punct, start);
                return true;
            }
        }
        if SINGLE_CHAR_PUNCT.as_bytes().contains(&self.bytes[self.pos]) {
            self.pos += 1;
            self.push(TokenKind::Punct, start);
            return true;
        }
        false
    }

    /// Skip one unknown character, reporting it once
    fn unknown(&mut self) {
        let start = self.pos;
        let ch = self.source[start..].chars().next().unwrap_or('\u{fffd}');
        // the byte cursor moves one byte at a time; continuation bytes of a
        // multi-byte character are folded into the same diagnostic
        self.pos += 1;
        while !self.source.is_char_boundary(self.pos) {
            self.pos += 1;
        }
        let span = Span::new(start, self.pos);
        self.out.errors.push(Diagnostic::error(
            DiagnosticCode::UnknownToken,
            format!("Unknown character '{}'", ch),
            span,
            self.lines.loc(span),
        ));
    }
}
