//! Raw parse-tree fragments
//!
//! A parser hands the tree one [`RawDocument`] per configuration file. Every
//! fragment keeps the byte spans of its own text and of the gaps around it,
//! so unchanged regions can be written back exactly as they were read.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Byte range in a source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `at`
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// One configuration file as read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Text covered by `span`, empty when the span is out of bounds
    pub fn slice(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }
}

/// What a fragment represents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FragmentKind {
    /// A whole file
    Document,
    /// `# text`
    Comment { text: String },
    /// `Name arg1 arg2`
    Directive { name: String, arguments: Vec<String> },
    /// `<Name arg1> ... </Name>`
    Block { name: String, arguments: Vec<String> },
}

/// An immutable region of a parsed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    #[serde(skip)]
    pub source: Arc<SourceFile>,

    #[serde(flatten)]
    pub kind: FragmentKind,

    /// The fragment's own text, from the first byte of the name to the
    /// end of the close tag
    pub span: Span,

    /// Whitespace between the previous sibling (or the parent's header)
    /// and this fragment
    pub leading: Span,

    /// The open tag of a block, or the whole line of a directive/comment
    pub header: Span,

    /// Whitespace between the last child and the footer
    pub trailing: Span,

    /// The close tag of a block
    pub footer: Span,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<Fragment>>,
}

impl Fragment {
    /// Fragment text exactly as it appears in the source
    pub fn text(&self) -> &str {
        self.source.slice(self.span)
    }

    pub fn slice(&self, span: Span) -> &str {
        self.source.slice(span)
    }

    pub fn path(&self) -> &Path {
        &self.source.path
    }

    /// Name of a directive or block, `None` for comments and documents
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            FragmentKind::Directive { name, .. } | FragmentKind::Block { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// A parsed configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub root: Arc<Fragment>,
}

impl RawDocument {
    pub fn new(root: Fragment) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn source(&self) -> &str {
        &self.root.source.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_bounds() {
        let file = SourceFile::new("/etc/httpd.conf", "Listen 80\n");
        assert_eq!(file.slice(Span::new(0, 6)), "Listen");
        assert_eq!(file.slice(Span::new(4, 100)), "");
        assert!(Span::empty(3).is_empty());
    }

    #[test]
    fn test_fragment_name() {
        let source = Arc::new(SourceFile::new("a.conf", "Listen 80"));
        let fragment = Fragment {
            source,
            kind: FragmentKind::Directive {
                name: "Listen".to_string(),
                arguments: vec!["80".to_string()],
            },
            span: Span::new(0, 9),
            leading: Span::empty(0),
            header: Span::new(0, 9),
            trailing: Span::empty(9),
            footer: Span::empty(9),
            children: Vec::new(),
        };
        assert_eq!(fragment.name(), Some("Listen"));
        assert_eq!(fragment.text(), "Listen 80");

        let json = serde_json::to_value(&fragment).unwrap();
        assert_eq!(json["type"], "directive");
        assert_eq!(json["name"], "Listen");
    }
}
