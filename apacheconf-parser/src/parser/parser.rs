//! httpd configuration parser
//!
//! Recursive descent parser that converts tokens into raw fragments,
//! recording the span of every node and of the whitespace around it.

use crate::parser::lexer::{tokenize, LexError, Location, Spanned, Token};
use apacheconf_core::raw::{Fragment, FragmentKind, RawDocument, SourceFile, Span};
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Parser error types
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Lexer error: {0}")]
    Lex(#[from] LexError),

    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { position: usize, expected: String },

    #[error("Unclosed block <{name}> opened at position {position}")]
    UnclosedBlock { position: usize, name: String },

    #[error("Mismatched close tag at position {position}: expected </{expected}>, found </{found}>")]
    MismatchedClose {
        position: usize,
        expected: String,
        found: String,
    },
}

impl ParseError {
    /// Byte offset the error points at
    pub fn position(&self) -> usize {
        match self {
            ParseError::Lex(e) => e.position(),
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEof { position, .. }
            | ParseError::UnclosedBlock { position, .. }
            | ParseError::MismatchedClose { position, .. } => *position,
        }
    }

    fn label(&self) -> String {
        match self {
            ParseError::Lex(_) => "this character cannot start a token".to_string(),
            ParseError::UnexpectedToken { expected, .. } => format!("expected {}", expected),
            ParseError::UnexpectedEof { expected, .. } => format!("input ends here, expected {}", expected),
            ParseError::UnclosedBlock { name, .. } => format!("<{}> is never closed", name),
            ParseError::MismatchedClose { expected, .. } => format!("should close <{}>", expected),
        }
    }

    /// Render the error as a plain-text diagnostic pointing into `source`
    pub fn report(&self, path: &Path, source: &str) -> String {
        use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};

        let id = path.display().to_string();
        let span = diagnostic_span(self.position(), source);
        let mut out = Vec::new();

        let written = Report::build(ReportKind::Error, (id.as_str(), span.clone()))
            .with_config(
                Config::default()
                    .with_color(false)
                    .with_index_type(IndexType::Byte),
            )
            .with_message(self.to_string())
            .with_label(Label::new((id.as_str(), span)).with_message(self.label()))
            .finish()
            .write((id.as_str(), Source::from(source)), &mut out);

        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => format!("{}: {}", id, self),
        }
    }
}

/// One character wide where possible so the label has something to point at
fn diagnostic_span(position: usize, source: &str) -> Range<usize> {
    let start = position.min(source.len());
    let end = source[start..]
        .chars()
        .next()
        .map(|c| start + c.len_utf8())
        .unwrap_or(start);
    start..end
}

type ParseResult<T> = Result<T, ParseError>;

/// Parser state
pub struct Parser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    source: Arc<SourceFile>,
    /// End of the last thing attached to the tree (a node or a block header)
    last_end: usize,
}

impl Parser {
    /// Create a new parser for the file at `path` with contents `source`
    pub fn new(path: impl AsRef<Path>, source: &str) -> ParseResult<Self> {
        let tokens = tokenize(source)?;
        Ok(Self {
            tokens,
            pos: 0,
            source: Arc::new(SourceFile::new(path.as_ref(), source)),
            last_end: 0,
        })
    }

    /// Parse the entire file
    pub fn parse(&mut self) -> ParseResult<RawDocument> {
        let children = self.parse_children(None)?;
        let len = self.source.text.len();

        Ok(RawDocument::new(Fragment {
            source: self.source.clone(),
            kind: FragmentKind::Document,
            span: Span::new(0, len),
            leading: Span::empty(0),
            header: Span::empty(0),
            trailing: Span::new(self.last_end, len),
            footer: Span::empty(len),
            children,
        }))
    }

    // ========================================
    // Node sequences
    // ========================================

    /// Parse nodes until the close tag of `parent` (or EOF at top level)
    fn parse_children(&mut self, parent: Option<(&str, usize)>) -> ParseResult<Vec<Arc<Fragment>>> {
        let mut children = Vec::new();

        loop {
            while self.check(&Token::Newline) {
                self.advance();
            }

            let Some(token) = self.peek().cloned() else {
                return match parent {
                    Some((name, position)) => Err(ParseError::UnclosedBlock {
                        position,
                        name: name.to_string(),
                    }),
                    None => Ok(children),
                };
            };

            let fragment = match token {
                Token::CloseTag(found) => {
                    if parent.is_some() {
                        return Ok(children);
                    }
                    return Err(ParseError::UnexpectedToken {
                        position: self.current_span().start,
                        expected: "directive, comment or block".to_string(),
                        found: format!("</{}>", found),
                    });
                }
                Token::Comment(text) => self.parse_comment(&text),
                Token::OpenTag(name) => self.parse_block(name)?,
                Token::Word(name) => self.parse_directive(name)?,
                other => {
                    return Err(ParseError::UnexpectedToken {
                        position: self.current_span().start,
                        expected: "directive, comment or block".to_string(),
                        found: other.to_string(),
                    });
                }
            };
            children.push(Arc::new(fragment));
        }
    }

    // ========================================
    // Comments
    // ========================================

    fn parse_comment(&mut self, raw: &str) -> Fragment {
        let span = self.current_span();
        self.advance();

        let text = raw.trim_start_matches('#').trim().to_string();
        self.leaf(FragmentKind::Comment { text }, span)
    }

    // ========================================
    // Directives
    // ========================================

    fn parse_directive(&mut self, name: String) -> ParseResult<Fragment> {
        let mut span = self.current_span();
        self.advance();

        let mut arguments: Vec<String> = Vec::new();
        let mut previous_end = None;
        while let Some(token) = self.peek().cloned() {
            let words: Vec<String> = match token {
                Token::Newline => break,
                Token::Word(w) | Token::QuotedString(w) => vec![w],
                Token::TagEnd => vec![">".to_string()],
                Token::Less => vec!["<".to_string()],
                Token::OpenTag(tag) => vec![format!("<{}", tag)],
                // httpd has no trailing comments: the rest of the line is arguments
                Token::Comment(text) => text.split_whitespace().map(str::to_string).collect(),
                Token::CloseTag(tag) => {
                    return Err(ParseError::UnexpectedToken {
                        position: self.current_span().start,
                        expected: "argument or end of line".to_string(),
                        found: format!("</{}>", tag),
                    });
                }
                _ => break,
            };
            let current = self.current_span();
            span.end = current.end;

            // `%>s` lexes as three tokens with nothing between them
            let mut words = words.into_iter();
            if previous_end == Some(current.start) {
                if let Some(last) = arguments.last_mut() {
                    if let Some(first) = words.next() {
                        last.push_str(&first);
                    }
                }
            }
            arguments.extend(words);
            previous_end = Some(current.end);
            self.advance();
        }

        Ok(self.leaf(FragmentKind::Directive { name, arguments }, span))
    }

    // ========================================
    // Blocks
    // ========================================

    fn parse_block(&mut self, name: String) -> ParseResult<Fragment> {
        let open = self.current_span();
        let leading = Span::new(self.last_end, open.start);
        self.advance();

        let mut arguments = Vec::new();
        let header_end = loop {
            match self.peek().cloned() {
                Some(Token::TagEnd) => {
                    let end = self.current_span().end;
                    self.advance();
                    break end;
                }
                Some(Token::Word(w)) | Some(Token::QuotedString(w)) => {
                    arguments.push(w);
                    self.advance();
                }
                Some(Token::Less) => {
                    arguments.push("<".to_string());
                    self.advance();
                }
                Some(other) => {
                    return Err(ParseError::UnexpectedToken {
                        position: self.current_span().start,
                        expected: format!("'>' to end <{}", name),
                        found: other.to_string(),
                    });
                }
                None => {
                    return Err(ParseError::UnexpectedEof {
                        position: self.source.text.len(),
                        expected: format!("'>' to end <{}", name),
                    });
                }
            }
        };

        let header = Span::new(open.start, header_end);
        self.last_end = header_end;

        let children = self.parse_children(Some((name.as_str(), open.start)))?;

        let close = self.current_span();
        match self.advance() {
            Some(Token::CloseTag(found)) if found.eq_ignore_ascii_case(&name) => {}
            Some(Token::CloseTag(found)) => {
                return Err(ParseError::MismatchedClose {
                    position: close.start,
                    expected: name,
                    found,
                });
            }
            _ => {
                return Err(ParseError::UnclosedBlock {
                    position: open.start,
                    name,
                });
            }
        }

        let trailing = Span::new(self.last_end, close.start);
        self.last_end = close.end;

        Ok(Fragment {
            source: self.source.clone(),
            kind: FragmentKind::Block { name, arguments },
            span: Span::new(open.start, close.end),
            leading,
            header,
            trailing,
            footer: Span::new(close.start, close.end),
            children,
        })
    }

    // ========================================
    // Helpers
    // ========================================

    /// Build a single-line fragment and move `last_end` past it
    fn leaf(&mut self, kind: FragmentKind, span: Location) -> Fragment {
        let leading = Span::new(self.last_end, span.start);
        let own = Span::new(span.start, span.end);
        self.last_end = span.end;

        Fragment {
            source: self.source.clone(),
            kind,
            span: own,
            leading,
            header: own,
            trailing: Span::empty(span.end),
            footer: Span::empty(span.end),
            children: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.value)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.value.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek()
            .map(|t| std::mem::discriminant(t) == std::mem::discriminant(expected))
            .unwrap_or(false)
    }

    fn current_span(&self) -> Location {
        self.tokens
            .get(self.pos)
            .map(|s| s.span)
            .unwrap_or(Location {
                start: self.source.text.len(),
                end: self.source.text.len(),
            })
    }
}

/// Parse the configuration file `path` with contents `source`
pub fn parse(path: impl AsRef<Path>, source: &str) -> ParseResult<RawDocument> {
    let mut parser = Parser::new(path, source)?;
    parser.parse()
}
