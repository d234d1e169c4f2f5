//! Apacheconf Core Library
//!
//! This crate provides the types shared by every apacheconf crate:
//! the error type, the tree configuration (activation policy) and the
//! raw parse-tree fragments handed over by a parser.

pub mod config;
pub mod error;
pub mod raw;

pub use config::{ActivationPolicy, ConfigLoader, TreeConfig};
pub use error::{Error, Result};
pub use raw::{Fragment, FragmentKind, RawDocument, SourceFile, Span};

/// Apacheconf version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
