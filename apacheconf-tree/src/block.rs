//! Block nodes
//!
//! A block is a directive that owns an ordered list of children. All
//! structural edits and descendant searches go through [`BlockNode`].

use crate::comment::CommentNode;
use crate::directive::{DirectiveData, DirectiveNode};
use crate::node::{wrap_fragment, Checkpoint, Metadata, Node, NodeCore, NodeParams};
use crate::writer::ConfigWriter;
use crate::{query, tracker};
use apacheconf_core::raw::RawDocument;
use apacheconf_core::{Error, Result, TreeConfig};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

#[derive(Debug)]
pub(crate) struct BlockInner {
    pub(crate) core: NodeCore,
    pub(crate) data: DirectiveData,
    /// Materialised from the fragment on first access
    children: OnceLock<RwLock<Vec<Node>>>,
}

/// `<Name params> ... </Name>`, or the root of a file
#[derive(Debug, Clone)]
pub struct BlockNode(pub(crate) Arc<BlockInner>);

impl BlockNode {
    /// Build a block node from construction parameters
    pub fn new(params: NodeParams, name: &str, parameters: &[&str], enabled: bool) -> Result<Self> {
        let core = params.build()?;
        let parameters = parameters.iter().map(|p| p.to_string()).collect();
        let node = Self::from_core(core, name.to_string(), parameters, enabled);
        tracker::settle_construction(node.core());
        Ok(node)
    }

    /// Root block over a parsed file
    pub fn from_document(document: &RawDocument, config: Arc<TreeConfig>) -> Result<Self> {
        let params = NodeParams::new()
            .metadata(Metadata::new(document.root.clone()))
            .config(config);
        tracing::debug!("Opened configuration tree for {}", document.path().display());
        Self::new(params, "", &[], true)
    }

    pub(crate) fn from_core(core: NodeCore, name: String, parameters: Vec<String>, enabled: bool) -> Self {
        Self(Arc::new(BlockInner {
            core,
            data: DirectiveData::new(name, parameters, enabled),
            children: OnceLock::new(),
        }))
    }

    pub(crate) fn core(&self) -> &NodeCore {
        &self.0.core
    }

    /// Block name; empty for a file root
    pub fn name(&self) -> &str {
        &self.0.data.name
    }

    pub fn parameters(&self) -> Vec<String> {
        self.0.data.parameters()
    }

    pub fn enabled(&self) -> bool {
        self.0.data.enabled(&self.0.core)
    }

    /// Replace the parameters of the block's open tag
    pub fn set_parameters(&self, parameters: &[&str]) -> Result<()> {
        self.0.data.set_parameters(&self.0.core, parameters)
    }

    /// Whether the block's own condition is known to hold
    pub fn is_active(&self) -> bool {
        let parameters = self.0.data.parameters.read();
        self.config().activation.is_active(self.name(), &parameters)
    }

    pub fn config(&self) -> Arc<TreeConfig> {
        self.0.core.context.config.clone()
    }

    /// Snapshot of the children in document order
    pub fn children(&self) -> Vec<Node> {
        self.children_lock().read().clone()
    }

    pub fn ptr_eq(&self, other: &BlockNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The outermost block reachable through ancestor links
    pub fn root(&self) -> BlockNode {
        let mut current = self.clone();
        while let Some(parent) = current.core().ancestor() {
            current = parent;
        }
        current
    }

    fn children_lock(&self) -> &RwLock<Vec<Node>> {
        self.0.children.get_or_init(|| RwLock::new(self.materialize()))
    }

    fn materialize(&self) -> Vec<Node> {
        let metadata = &self.0.core.metadata;
        if metadata.is_synthetic() {
            return Vec::new();
        }

        let fragment = metadata.fragment();
        tracing::trace!(
            "Materialising {} children of <{}> in {}",
            fragment.children.len(),
            self.name(),
            self.0.core.filepath.display()
        );
        let enabled = self.child_enabled();
        fragment
            .children
            .iter()
            .filter_map(|child| wrap_fragment(self, child, enabled))
            .collect()
    }

    fn child_enabled(&self) -> bool {
        self.enabled() && self.is_active()
    }

    fn child_core(&self) -> NodeCore {
        NodeCore::child_of(
            self,
            self.0.core.metadata.derived(),
            self.0.core.filepath.clone(),
            true,
        )
    }

    // ========================================
    // Mutation
    // ========================================

    /// Insert `node` at `position` (or append), all-or-nothing
    fn insert_child(&self, position: Option<usize>, build: impl FnOnce() -> Node) -> Result<Node> {
        let mut children = self.children_lock().write();
        let index = match position {
            Some(position) if position > children.len() => {
                return Err(Error::IndexOutOfRange {
                    position,
                    len: children.len(),
                });
            }
            Some(position) => position,
            None => children.len(),
        };

        let node = build();
        children.insert(index, node.clone());
        drop(children);

        tracker::mark_modified(self.core());
        tracing::debug!(
            "{}: added {} at index {} of <{}>",
            self.0.core.filepath.display(),
            node.name().unwrap_or_else(|| "comment".to_string()),
            index,
            self.name()
        );
        Ok(node)
    }

    /// Add a nested block at `position`, or at the end
    pub fn add_child_block(&self, name: &str, parameters: &[&str], position: Option<usize>) -> Result<BlockNode> {
        require_name(name)?;
        let parameters: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
        let enabled = self.child_enabled();

        let node = self.insert_child(position, || {
            BlockNode::from_core(self.child_core(), name.to_string(), parameters, enabled).into()
        })?;
        node.as_block().cloned().ok_or(Error::NotFound)
    }

    /// Add a directive at `position`, or at the end
    pub fn add_child_directive(
        &self,
        name: &str,
        parameters: &[&str],
        position: Option<usize>,
    ) -> Result<DirectiveNode> {
        require_name(name)?;
        let parameters: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
        let enabled = self.child_enabled();

        let node = self.insert_child(position, || {
            DirectiveNode::from_core(self.child_core(), name.to_string(), parameters, enabled).into()
        })?;
        node.as_directive().cloned().ok_or(Error::NotFound)
    }

    /// Add a comment at `position`, or at the end
    pub fn add_child_comment(&self, comment: &str, position: Option<usize>) -> Result<CommentNode> {
        let node = self.insert_child(position, || {
            CommentNode::from_core(self.child_core(), comment.to_string()).into()
        })?;
        node.as_comment().cloned().ok_or(Error::NotFound)
    }

    /// Remove a direct child, matched by identity
    ///
    /// The removed node keeps its ancestor link.
    pub fn delete_child(&self, child: &Node) -> Result<()> {
        let mut children = self.children_lock().write();
        let index = children
            .iter()
            .position(|c| c.ptr_eq(child))
            .ok_or(Error::NotFound)?;
        children.remove(index);
        drop(children);

        tracker::mark_modified(self.core());
        tracing::debug!(
            "{}: removed child {} of <{}>",
            self.0.core.filepath.display(),
            index,
            self.name()
        );
        Ok(())
    }

    // ========================================
    // Queries
    // ========================================

    /// Descendant blocks named `name`, in document order
    ///
    /// With `exclude`, blocks that are not known to be active are skipped
    /// together with everything inside them.
    pub fn find_blocks(&self, name: &str, exclude: bool) -> Vec<BlockNode> {
        query::find_blocks(self, name, exclude)
    }

    /// Descendant directives named `name`, in document order
    pub fn find_directives(&self, name: &str, exclude: bool) -> Vec<DirectiveNode> {
        query::find_directives(self, name, exclude)
    }

    /// Descendant comments containing `comment`, or equal to it with `exact`
    pub fn find_comments(&self, comment: &str, exact: bool) -> Vec<CommentNode> {
        query::find_comments(self, comment, exact)
    }

    // ========================================
    // Saving
    // ========================================

    /// Files holding modified nodes of this subtree
    pub fn unsaved_files(&self) -> BTreeSet<PathBuf> {
        tracker::unsaved_files(&Node::Block(self.clone()))
    }

    /// Hand every unsaved file of this subtree to `writer`, then mark the
    /// written files clean. Returns the written paths.
    pub fn write_unsaved(&self, writer: &dyn ConfigWriter) -> Result<BTreeSet<PathBuf>> {
        tracker::write_unsaved(self, writer)
    }

    /// Forget pending changes in this subtree without writing them
    pub fn mark_clean(&self) {
        tracker::mark_clean(&Node::Block(self.clone()));
    }

    /// Checkpoints recorded by `save` anywhere in this tree
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.0.core.context.journal.lock().clone()
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.is_empty() {
        Err(Error::EmptyName)
    } else {
        Ok(())
    }
}

impl PartialEq for BlockInner {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
            && self.data.enabled(&self.core) == other.data.enabled(&other.core)
            && self.core == other.core
    }
}

impl PartialEq for BlockNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (*self.0 == *other.0 && self.children() == other.children())
    }
}
