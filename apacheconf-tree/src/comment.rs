//! Comment nodes

use crate::node::{NodeCore, NodeParams};
use crate::tracker;
use apacheconf_core::Result;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct CommentInner {
    core: NodeCore,
    comment: String,
}

impl PartialEq for CommentInner {
    fn eq(&self, other: &Self) -> bool {
        self.comment == other.comment && self.core == other.core
    }
}

/// A `# comment` line. Immutable: replace it by deleting and re-adding.
#[derive(Debug, Clone)]
pub struct CommentNode(Arc<CommentInner>);

impl CommentNode {
    /// Build a comment node from construction parameters
    pub fn new(params: NodeParams, comment: &str) -> Result<Self> {
        let node = Self::from_core(params.build()?, comment.to_string());
        tracker::settle_construction(node.core());
        Ok(node)
    }

    pub(crate) fn from_core(core: NodeCore, comment: String) -> Self {
        Self(Arc::new(CommentInner { core, comment }))
    }

    pub(crate) fn core(&self) -> &NodeCore {
        &self.0.core
    }

    /// Comment text without the leading `#`
    pub fn comment(&self) -> &str {
        &self.0.comment
    }

    pub fn ptr_eq(&self, other: &CommentNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for CommentNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Metadata, ParserNode};
    use crate::testing;

    #[test]
    fn test_new_comment() {
        let params = NodeParams::new().metadata(Metadata::new(testing::document("/etc/httpd.conf")));
        let node = CommentNode::new(params, "managed by apacheconf").unwrap();
        assert_eq!(node.comment(), "managed by apacheconf");
        assert!(node.ancestor().is_none());
    }

    #[test]
    fn test_equality_includes_text() {
        let root = testing::tree("# one\n# two\n");
        let comments = root.find_comments("", false);
        assert_eq!(comments.len(), 2);
        assert_ne!(comments[0], comments[1]);

        let again = root.find_comments("one", true);
        assert_eq!(again[0], comments[0]);
    }

    #[test]
    fn test_dirty_comment_marks_ancestor() {
        let root = testing::tree("");
        let params = NodeParams::new()
            .ancestor(&root)
            .metadata(root.metadata().clone())
            .dirty(true);
        let node = CommentNode::new(params, "pending").unwrap();

        assert!(node.dirty());
        assert!(root.dirty());
        assert!(node.ancestor().unwrap().ptr_eq(&root));
    }
}
