//! Lexer for Apache httpd configuration syntax
//!
//! Tokenizes httpd.conf style files.
//!
//! Key features:
//! - Line oriented (newlines terminate directives)
//! - `<Name args>` / `</Name>` tags for blocks
//! - "..." quoted strings are kept verbatim, quotes included
//! - `#` starts a comment only where a word cannot start
//! - `\` at the end of a line joins it with the next one

use logos::{Logos, Span};
use std::fmt;

/// Source location for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl From<Span> for Location {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Location,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: impl Into<Location>) -> Self {
        Self {
            value,
            span: span.into(),
        }
    }
}

/// Token types for httpd configuration syntax
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Skip whitespace (spaces and tabs), but NOT newlines
    #[regex(r"[ \t\f]+", logos::skip)]
    Whitespace,

    // Backslash-newline joins two physical lines
    #[regex(r"\\\r?\n", logos::skip)]
    Continuation,

    // ============================================================
    // Structural
    // ============================================================
    #[regex(r"\r?\n")]
    Newline,

    /// `<Name` opening a block
    #[regex(r"<[A-Za-z_][A-Za-z0-9_.:-]*", |lex| lex.slice()[1..].to_string())]
    OpenTag(String),

    /// `</Name>` closing a block
    #[regex(r"</[A-Za-z_][A-Za-z0-9_.:-]*[ \t]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].trim_end().to_string()
    })]
    CloseTag(String),

    #[token(">")]
    TagEnd,

    #[token("<")]
    Less,

    // ============================================================
    // Values
    // ============================================================

    /// Comment text including the leading `#`
    #[regex(r"#[^\r\n]*", |lex| lex.slice().to_string())]
    Comment(String),

    /// Quoted string literal, quotes included
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice().to_string())]
    QuotedString(String),

    /// Generic Word (unquoted argument, path, regex, etc.)
    #[regex(r#"[^ \t\f\r\n"<>#][^ \t\f\r\n"<>]*"#, |lex| lex.slice().to_string())]
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Newline => write!(f, "newline"),
            Token::OpenTag(s) => write!(f, "<{}", s),
            Token::CloseTag(s) => write!(f, "</{}>", s),
            Token::TagEnd => write!(f, ">"),
            Token::Less => write!(f, "<"),
            Token::Comment(s) => write!(f, "{}", s),
            Token::QuotedString(s) => write!(f, "{}", s),
            Token::Word(s) => write!(f, "{}", s),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// Lexer result type
pub type LexResult = Result<Vec<Spanned<Token>>, LexError>;

/// Lexer error
#[derive(Debug, Clone, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character at position {position}")]
    UnexpectedChar { position: usize },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::UnexpectedChar { position } => *position,
        }
    }
}

/// Tokenize a configuration source string
pub fn tokenize(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens: Vec<Spanned<Token>> = Vec::new();
    let mut joined = false;

    for (result, span) in lexer.spanned() {
        match result {
            Ok(Token::Whitespace) | Ok(Token::Continuation) => continue,
            Ok(Token::Newline) if joined => {
                // `word\` directly followed by the line break
                joined = false;
            }
            Ok(token) => {
                joined = false;
                if let Token::Word(word) = &token {
                    if let Some(stem) = word.strip_suffix('\\') {
                        if source[span.end..].starts_with('\n') || source[span.end..].starts_with("\r\n") {
                            joined = true;
                            let end = span.end - 1;
                            if !stem.is_empty() {
                                tokens.push(Spanned::new(Token::Word(stem.to_string()), span.start..end));
                            }
                            continue;
                        }
                    }
                }
                tokens.push(Spanned::new(token, span));
            }
            Err(_) => {
                return Err(LexError::UnexpectedChar { position: span.start });
            }
        }
    }

    Ok(tokens)
}
