//! Apache httpd configuration parser
//!
//! This crate turns configuration text into the raw fragments consumed by
//! `apacheconf-tree`. Every fragment remembers the exact bytes it came from.
//!
//! # Example
//!
//! ```rust,ignore
//! use apacheconf_parser::parse;
//!
//! let source = r#"
//! <VirtualHost *:80>
//!     ServerName example.com
//! </VirtualHost>
//! "#;
//!
//! let document = parse("sites/example.conf", source).unwrap();
//! assert_eq!(document.root.children.len(), 1);
//! ```

pub mod parser;

pub use parser::{parse, tokenize, LexError, ParseError, Parser, Token};

use apacheconf_core::raw::RawDocument;
use std::path::Path;

/// Read and parse a configuration file from a path
pub fn parse_file(path: impl AsRef<Path>) -> Result<RawDocument, LoadError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .map_err(|e| LoadError::Io(format!("{}: {}", path.display(), e)))?;

    let document = parse(path, &source)?;
    tracing::debug!(
        "Parsed {} ({} top-level nodes)",
        path.display(),
        document.root.children.len()
    );
    Ok(document)
}

/// Error loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}
