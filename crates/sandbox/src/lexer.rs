//! Hand-written lexer for the restricted language.
//!
//! No lexer-generator crate is used; this scans the source as a `Vec<char>`
//! with an explicit index.

use crate::error::SandboxError;

/// A lexical token, tagged with its source position for error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    /// Raw content of an `f"..."` literal, re-lexed/parsed for `{expr}`
    /// splices by the parser.
    FStr(String),
    Bytes(Vec<u8>),
    Ident(String),
    // Punctuation / operators
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Arrow,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Newline,
    Indent,
    Dedent,
    Eof,
}

/// Scan `source` into a token stream, synthesising `Indent`/`Dedent`
/// tokens from leading whitespace (Python-style significant indentation,
/// consistent with the "nearly the source language" framing in).
pub fn lex(source: &str) -> Result<Vec<Token>, SandboxError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    indent_stack: Vec<usize>,
    tokens: Vec<Token>,
    at_line_start: bool,
    paren_depth: i32,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            tokens: Vec::new(),
            at_line_start: true,
            paren_depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, line: usize, col: usize) {
        self.tokens.push(Token { kind, line, col });
    }

    fn err(&self, message: impl Into<String>) -> SandboxError {
        SandboxError::ParseError {
            line: self.line,
            col: self.col,
            message: message.into(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, SandboxError> {
        while self.pos < self.chars.len() {
            if self.at_line_start && self.paren_depth == 0 {
                self.handle_indentation()?;
                if self.pos >= self.chars.len() {
                    break;
                }
            }
            let c = match self.peek() {
                Some(c) => c,
                None => break,
            };

            if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            if c == '\n' {
                let (line, col) = (self.line, self.col);
                self.advance();
                if self.paren_depth == 0 {
                    self.push(TokenKind::Newline, line, col);
                    self.at_line_start = true;
                }
                continue;
            }

            if c.is_whitespace() {
                self.advance();
                continue;
            }

            if c.is_ascii_digit() {
                self.lex_number()?;
                continue;
            }

            if c == '"' || c == '\'' {
                self.lex_string(false)?;
                continue;
            }

            if (c == 'f' || c == 'F') && matches!(self.peek_at(1), Some('"') | Some('\'')) {
                self.advance();
                self.lex_string(true)?;
                continue;
            }

            if (c == 'b' || c == 'B') && matches!(self.peek_at(1), Some('"') | Some('\'')) {
                self.advance();
                self.lex_bytes()?;
                continue;
            }

            if c.is_alphabetic() || c == '_' {
                self.lex_ident();
                continue;
            }

            self.lex_operator()?;
        }

        let (line, col) = (self.line, self.col);
        self.push(TokenKind::Newline, line, col);
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, line, col);
        }
        self.push(TokenKind::Eof, line, col);
        Ok(self.tokens)
    }

    fn handle_indentation(&mut self) -> Result<(), SandboxError> {
        let line_start = self.pos;
        let mut width = 0usize;
        while let Some(c) = self.peek() {
            match c {
                ' ' => {
                    width += 1;
                    self.advance();
                }
                '\t' => {
                    width += 8;
                    self.advance();
                }
                _ => break,
            }
        }
        // Blank line or comment-only line: no indent change.
        match self.peek() {
            None => {
                self.at_line_start = false;
                return Ok(());
            }
            Some('\n') | Some('#') => {
                self.at_line_start = false;
                return Ok(());
            }
            _ => {}
        }
        self.at_line_start = false;
        let (line, col) = (self.line, self.col);
        let current = *self.indent_stack.last().unwrap();
        if width > current {
            self.indent_stack.push(width);
            self.push(TokenKind::Indent, line, col);
        } else {
            while width < *self.indent_stack.last().unwrap() {
                self.indent_stack.pop();
                self.push(TokenKind::Dedent, line, col);
            }
            if *self.indent_stack.last().unwrap() != width {
                return Err(self.err(format!(
                            "inconsistent indentation at line {line} (scanned from offset {line_start})"
                )));
            }
        }
        Ok(())
    }

    fn lex_number(&mut self) -> Result<(), SandboxError> {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() || c == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let text: String = self.chars[start..self.pos].iter().filter(|c| **c != '_').collect();
        if is_float {
            let v: f64 = text.parse().map_err(|_| self.err(format!("invalid float literal {text}")))?;
            self.push(TokenKind::Float(v), line, col);
        } else {
            let v: i64 = text.parse().map_err(|_| self.err(format!("invalid int literal {text}")))?;
            self.push(TokenKind::Int(v), line, col);
        }
        Ok(())
    }

    fn lex_string(&mut self, is_fstring: bool) -> Result<(), SandboxError> {
        let (line, col) = (self.line, self.col);
        let quote = self.advance().unwrap();
        let mut out = String::new();
        loop {
            match self.advance() {
                None => return Err(self.err("unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('\\') => out.push('\\'),
                    Some('{') => out.push('{'),
                    Some('}') => out.push('}'),
                    Some(c) if c == quote => out.push(quote),
                    Some(other) => out.push(other),
                    None => return Err(self.err("unterminated escape sequence")),
                },
                Some(c) => out.push(c),
            }
        }
        if is_fstring {
            self.push(TokenKind::FStr(out), line, col);
        } else {
            self.push(TokenKind::Str(out), line, col);
        }
        Ok(())
    }

    fn lex_bytes(&mut self) -> Result<(), SandboxError> {
        let (line, col) = (self.line, self.col);
        let quote = self.advance().unwrap();
        let mut out = Vec::new();
        loop {
            match self.advance() {
                None => return Err(self.err("unterminated bytes literal")),
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => out.push(b'\n'),
                    Some('t') => out.push(b'\t'),
                    Some('\\') => out.push(b'\\'),
                    Some(c) if c == quote => out.push(c as u8),
                    Some(other) => out.push(other as u8),
                    None => return Err(self.err("unterminated escape sequence")),
                },
                Some(c) => out.push(c as u8),
            }
        }
        self.push(TokenKind::Bytes(out), line, col);
        Ok(())
    }

    fn lex_ident(&mut self) {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.push(TokenKind::Ident(text), line, col);
    }

    fn lex_operator(&mut self) -> Result<(), SandboxError> {
        let (line, col) = (self.line, self.col);
        let c = self.advance().unwrap();
        let kind = match c {
            '(' => {
                self.paren_depth += 1;
                TokenKind::LParen
            }
            ')' => {
                self.paren_depth -= 1;
                TokenKind::RParen
            }
            '[' => {
                self.paren_depth += 1;
                TokenKind::LBracket
            }
            ']' => {
                self.paren_depth -= 1;
                TokenKind::RBracket
            }
            '{' => {
                self.paren_depth += 1;
                TokenKind::LBrace
            }
            '}' => {
                self.paren_depth -= 1;
                TokenKind::RBrace
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '+' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::MinusAssign
                } else if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    TokenKind::DoubleStar
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::StarAssign
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    TokenKind::DoubleSlash
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::SlashAssign
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::PercentAssign
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(self.err("unexpected character '!'"));
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Lte
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Gte
                } else {
                    TokenKind::Gt
                }
            }
            ';' => TokenKind::Newline,
            other => return Err(self.err(format!("unexpected character '{other}'"))),
        };
        self.push(kind, line, col);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_simple_assignment() {
        let k = kinds("x = 1\n");
        assert!(matches!(k[0], TokenKind::Ident(ref s) if s == "x"));
        assert_eq!(k[1], TokenKind::Assign);
        assert_eq!(k[2], TokenKind::Int(1));
    }

    #[test]
    fn lexes_float() {
        let k = kinds("3.14\n");
        assert_eq!(k[0], TokenKind::Float(3.14));
    }

    #[test]
    fn lexes_string_with_escapes() {
        let k = kinds("\"a\\nb\"\n");
        assert_eq!(k[0], TokenKind::Str("a\nb".to_string()));
    }

    #[test]
    fn lexes_fstring_raw_content() {
        let k = kinds("f\"hello {name}\"\n");
        assert_eq!(k[0], TokenKind::FStr("hello {name}".to_string()));
    }

    #[test]
    fn indentation_produces_indent_dedent() {
        let k = kinds("if x:\n y = 1\nz = 2\n");
        assert!(k.iter().any(|t| matches!(t, TokenKind::Indent)));
        assert!(k.iter().any(|t| matches!(t, TokenKind::Dedent)));
    }

    #[test]
    fn newline_suppressed_inside_parens() {
        let k = kinds("f(1,\n2)\n");
        let newline_count = k.iter().filter(|t| matches!(t, TokenKind::Newline)).count();
        assert_eq!(newline_count, 1);
    }
}
