//! Apacheconf configuration tree
//!
//! A live view over parsed httpd configuration: comments, directives and
//! blocks that can be searched and edited, with change tracking that tells
//! the caller exactly which files need to be written back.
//!
//! # Example
//!
//! ```rust,ignore
//! use apacheconf_tree::{BlockNode, FsWriter};
//!
//! let document = apacheconf_parser::parse_file("/etc/httpd/conf/httpd.conf")?;
//! let root = BlockNode::from_document(&document, Default::default())?;
//!
//! for vhost in root.find_blocks("VirtualHost", true) {
//!     vhost.add_child_directive("ServerAlias", &["www.example.com"], None)?;
//! }
//!
//! root.save("add www alias");
//! root.write_unsaved(&FsWriter)?;
//! ```

mod block;
mod comment;
mod directive;
mod node;
mod query;
mod render;
mod tracker;
mod writer;

pub use block::BlockNode;
pub use comment::CommentNode;
pub use directive::DirectiveNode;
pub use node::{Checkpoint, Metadata, Node, NodeParams, ParserNode};
pub use render::render;
pub use writer::{ConfigWriter, FsWriter, MemoryWriter};

pub use apacheconf_core::{Error, Result, TreeConfig};

#[cfg(test)]
pub(crate) mod testing {
    use crate::BlockNode;
    use apacheconf_core::raw::{Fragment, FragmentKind, SourceFile, Span};
    use apacheconf_core::TreeConfig;
    use std::sync::Arc;

    pub const PATH: &str = "/etc/httpd/conf/httpd.conf";

    /// Tree over `source` with the default activation policy
    pub fn tree(source: &str) -> BlockNode {
        tree_with(source, TreeConfig::default())
    }

    pub fn tree_with(source: &str, config: TreeConfig) -> BlockNode {
        let document = apacheconf_parser::parse(PATH, source).unwrap();
        BlockNode::from_document(&document, Arc::new(config)).unwrap()
    }

    /// Empty document fragment
    pub fn document(path: &str) -> Arc<Fragment> {
        Arc::new(Fragment {
            source: Arc::new(SourceFile::new(path, "")),
            kind: FragmentKind::Document,
            span: Span::empty(0),
            leading: Span::empty(0),
            header: Span::empty(0),
            trailing: Span::empty(0),
            footer: Span::empty(0),
            children: Vec::new(),
        })
    }

    #[test]
    fn test_handles_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BlockNode>();
        assert_send_sync::<crate::Node>();
    }

    #[test]
    fn test_concurrent_queries() {
        let root = tree("<VirtualHost *:80>\n    ServerName a\n</VirtualHost>\n");
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| assert_eq!(root.find_directives("ServerName", true).len(), 1));
            }
        });
    }
}
