//! Lexer: source text in, a stream of `Result<Token>` out.
//!
//! Blanks, newlines and `//` comments are skipped between tokens.  Any other
//! character either starts a token or is reported once as an unexpected
//! character (a whole code point, so `é` is one error, not two).  Scanning
//! carries on after an error and the stream always ends with exactly one
//! `EOF`, after which the scanner is fused.
//!
//! Lexemes borrow from the source; only string literal contents are copied
//! into their `TokenType::STRING`.
//!
//! ```
//! use rox::scanner::Scanner;
//!
//! let tokens: Vec<_> = Scanner::new("var x = a ? 1 : 2; // done").collect();
//!
//! assert!(tokens.iter().all(|t| t.is_ok()));
//! assert_eq!(tokens.len(), 10);
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::{memchr, memchr_iter};
use phf::phf_map;

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and"      => TokenType::AND,
    "break"    => TokenType::BREAK,
    "class"    => TokenType::CLASS,
    "continue" => TokenType::CONTINUE,
    "else"     => TokenType::ELSE,
    "false"    => TokenType::FALSE,
    "fun"      => TokenType::FUN,
    "for"      => TokenType::FOR,
    "if"       => TokenType::IF,
    "nil"      => TokenType::NIL,
    "or"       => TokenType::OR,
    "print"    => TokenType::PRINT,
    "return"   => TokenType::RETURN,
    "super"    => TokenType::SUPER,
    "this"     => TokenType::THIS,
    "true"     => TokenType::TRUE,
    "var"      => TokenType::VAR,
    "while"    => TokenType::WHILE,
};

pub struct Scanner<'a> {
    source: &'a str,
    /// Byte offset where the current lexeme begins.
    start: usize,
    /// Byte offset of the next unread byte.  Always on a char boundary
    /// between tokens.
    current: usize,
    line: usize,
    /// Set once `EOF` has been handed out.
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
            finished: false,
        }
    }

    #[inline]
    fn bytes(&self) -> &'a [u8] {
        self.source.as_bytes()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.current + offset).copied()
    }

    #[inline]
    fn bump(&mut self) -> Option<u8> {
        let byte: Option<u8> = self.peek_at(0);
        if byte.is_some() {
            self.current += 1;
        }
        byte
    }

    #[inline]
    fn lexeme(&self) -> &'a str {
        let source: &'a str = self.source;
        &source[self.start..self.current]
    }

    fn skip_trivia(&mut self) {
        while let Some(byte) = self.peek_at(0) {
            match byte {
                b' ' | b'\r' | b'\t' => self.current += 1,
                b'\n' => {
                    self.line += 1;
                    self.current += 1;
                }
                b'/' if self.peek_at(1) == Some(b'/') => {
                    // Leave the newline itself for the line counter.
                    self.current = memchr(b'\n', &self.bytes()[self.current..])
                        .map_or(self.source.len(), |offset| self.current + offset);
                }
                _ => break,
            }
        }
    }

    /// `single` or, when followed by `=`, `with_equal`.
    fn operator(&mut self, with_equal: TokenType, single: TokenType) -> TokenType {
        if self.peek_at(0) == Some(b'=') {
            self.current += 1;
            with_equal
        } else {
            single
        }
    }

    /// Finish the token whose first byte, `first`, was just consumed.
    fn scan_token(&mut self, first: u8) -> Result<TokenType> {
        let token_type: TokenType = match first {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'/' => TokenType::SLASH,
            b'?' => TokenType::QUESTION,
            b':' => TokenType::COLON,

            b'!' => self.operator(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.operator(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.operator(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.operator(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'"' => return self.string(),
            b'0'..=b'9' => return self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => return Err(self.unexpected()),
        };

        Ok(token_type)
    }

    /// Strings may span lines; the token reports the line it ends on.
    fn string(&mut self) -> Result<TokenType> {
        let rest: &'a [u8] = &self.bytes()[self.current..];

        let Some(offset) = memchr(b'"', rest) else {
            self.line += memchr_iter(b'\n', rest).count();
            self.current = self.source.len();
            return Err(LoxError::lex(self.line, "Unterminated string."));
        };

        self.line += memchr_iter(b'\n', &rest[..offset]).count();
        self.current += offset + 1;

        let lexeme: &'a str = self.lexeme();
        Ok(TokenType::STRING(lexeme[1..lexeme.len() - 1].to_owned()))
    }

    fn skip_digits(&mut self) {
        while self.peek_at(0).is_some_and(|b| b.is_ascii_digit()) {
            self.current += 1;
        }
    }

    /// `123` or `3.14`.  A trailing `.` is left for the next token.
    fn number(&mut self) -> Result<TokenType> {
        self.skip_digits();

        if self.peek_at(0) == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.current += 1;
            self.skip_digits();
        }

        self.lexeme()
            .parse::<f64>()
            .map(TokenType::NUMBER)
            .map_err(|e| LoxError::lex(self.line, format!("Invalid number: {}", e)))
    }

    fn identifier(&mut self) -> TokenType {
        while self
            .peek_at(0)
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.current += 1;
        }

        KEYWORDS
            .get(self.lexeme())
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }

    /// Consume the whole offending code point and describe it.
    fn unexpected(&mut self) -> LoxError {
        let c: char = self.source[self.start..]
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        self.current = self.start + c.len_utf8();

        LoxError::lex(self.line, format!("Unexpected character: {}", c))
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        self.skip_trivia();
        self.start = self.current;

        let Some(first) = self.bump() else {
            self.finished = true;
            debug!("Reached end of input on line {}", self.line);
            return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
        };

        let scanned: Result<Token<'a>> = self.scan_token(first).map(|token_type| {
            debug!("Scanned {:?} on line {}", token_type, self.line);
            Token::new(token_type, self.lexeme(), self.line)
        });

        Some(scanned)
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
