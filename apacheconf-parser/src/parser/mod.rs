//! Parser module for httpd configuration files
//!
//! This module provides the lexer and parser producing raw fragments.

pub mod lexer;
pub mod parser;

pub use lexer::{tokenize, LexError, Location, Spanned, Token};
pub use parser::{parse, ParseError, Parser};
