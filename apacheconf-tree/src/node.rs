//! Node core
//!
//! Fields and identity shared by every node in a configuration tree.

use crate::block::{BlockInner, BlockNode};
use crate::comment::CommentNode;
use crate::directive::DirectiveNode;
use crate::{query, tracker};
use apacheconf_core::raw::{Fragment, FragmentKind};
use apacheconf_core::{Error, Result, TreeConfig};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Shared handle to the parse fragment a node wraps
///
/// Nodes created by the parser own their fragment. Nodes added later alias
/// their parent's fragment and are flagged `synthetic`, which tells the
/// renderer there is no parsed text to copy.
#[derive(Debug, Clone)]
pub struct Metadata {
    fragment: Arc<Fragment>,
    synthetic: bool,
}

impl Metadata {
    pub fn new(fragment: Arc<Fragment>) -> Self {
        Self {
            fragment,
            synthetic: false,
        }
    }

    pub fn fragment(&self) -> &Arc<Fragment> {
        &self.fragment
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Whether this wraps a whole parsed file
    pub fn is_document(&self) -> bool {
        !self.synthetic && self.fragment.kind == FragmentKind::Document
    }

    pub(crate) fn derived(&self) -> Self {
        Self {
            fragment: self.fragment.clone(),
            synthetic: true,
        }
    }
}

impl PartialEq for Metadata {
    fn eq(&self, other: &Self) -> bool {
        self.synthetic == other.synthetic
            && (Arc::ptr_eq(&self.fragment, &other.fragment) || self.fragment == other.fragment)
    }
}

/// Marker recorded by `save` before files are rewritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub message: String,
    pub files: BTreeSet<PathBuf>,
}

/// State shared by every node of one tree
#[derive(Debug)]
pub(crate) struct TreeContext {
    pub(crate) config: Arc<TreeConfig>,
    pub(crate) journal: Mutex<Vec<Checkpoint>>,
}

impl TreeContext {
    fn new(config: Arc<TreeConfig>) -> Arc<Self> {
        Arc::new(Self {
            config,
            journal: Mutex::new(Vec::new()),
        })
    }
}

/// Fields common to comments, directives and blocks
#[derive(Debug)]
pub(crate) struct NodeCore {
    pub(crate) ancestor: Option<Weak<BlockInner>>,
    pub(crate) filepath: PathBuf,
    pub(crate) metadata: Metadata,
    pub(crate) context: Arc<TreeContext>,
    dirty: AtomicBool,
    modified: AtomicBool,
}

impl NodeCore {
    /// Core for a node created under `parent` by the tree itself
    pub(crate) fn child_of(parent: &BlockNode, metadata: Metadata, filepath: PathBuf, modified: bool) -> Self {
        Self {
            ancestor: Some(Arc::downgrade(&parent.0)),
            filepath,
            metadata,
            context: parent.core().context.clone(),
            dirty: AtomicBool::new(modified),
            modified: AtomicBool::new(modified),
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub(crate) fn is_modified(&self) -> bool {
        self.modified.load(Ordering::Acquire)
    }

    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }

    pub(crate) fn set_modified(&self, modified: bool) {
        self.modified.store(modified, Ordering::Release);
    }

    pub(crate) fn ancestor(&self) -> Option<BlockNode> {
        self.ancestor.as_ref().and_then(Weak::upgrade).map(BlockNode)
    }
}

impl PartialEq for NodeCore {
    fn eq(&self, other: &Self) -> bool {
        self.is_dirty() == other.is_dirty()
            && self.filepath == other.filepath
            && self.metadata == other.metadata
            && same_ancestry(self.ancestor.as_ref(), other.ancestor.as_ref())
    }
}

/// Compare two ancestor chains by their own fields, never their children
fn same_ancestry(a: Option<&Weak<BlockInner>>, b: Option<&Weak<BlockInner>>) -> bool {
    let a = a.and_then(Weak::upgrade);
    let b = b.and_then(Weak::upgrade);
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            Arc::ptr_eq(&a, &b)
                || (a.data == b.data
                    && a.core.is_dirty() == b.core.is_dirty()
                    && a.core.filepath == b.core.filepath
                    && a.core.metadata == b.core.metadata
                    && same_ancestry(a.core.ancestor.as_ref(), b.core.ancestor.as_ref()))
        }
        _ => false,
    }
}

/// Construction parameters shared by every node kind
#[derive(Debug, Clone, Default)]
pub struct NodeParams {
    ancestor: Option<BlockNode>,
    filepath: Option<PathBuf>,
    dirty: bool,
    metadata: Option<Metadata>,
    config: Option<Arc<TreeConfig>>,
}

impl NodeParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parent block; the tree configuration is inherited from it
    pub fn ancestor(mut self, ancestor: &BlockNode) -> Self {
        self.ancestor = Some(ancestor.clone());
        self
    }

    /// Source file; defaults to the file of the metadata fragment
    pub fn filepath(mut self, filepath: impl Into<PathBuf>) -> Self {
        self.filepath = Some(filepath.into());
        self
    }

    pub fn dirty(mut self, dirty: bool) -> Self {
        self.dirty = dirty;
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Tree configuration for a root node
    pub fn config(mut self, config: Arc<TreeConfig>) -> Self {
        self.config = Some(config);
        self
    }

    pub(crate) fn build(self) -> Result<NodeCore> {
        let metadata = self.metadata.ok_or_else(|| {
            Error::InvalidConstruction("a node must wrap parse metadata".to_string())
        })?;

        let filepath = self
            .filepath
            .unwrap_or_else(|| metadata.fragment().path().to_path_buf());
        if filepath.as_os_str().is_empty() {
            return Err(Error::InvalidConstruction(
                "a node must originate from a file".to_string(),
            ));
        }

        let context = match &self.ancestor {
            Some(ancestor) => ancestor.core().context.clone(),
            None => TreeContext::new(self.config.unwrap_or_default()),
        };

        Ok(NodeCore {
            ancestor: self.ancestor.as_ref().map(|a| Arc::downgrade(&a.0)),
            filepath,
            metadata,
            context,
            dirty: AtomicBool::new(self.dirty),
            modified: AtomicBool::new(self.dirty),
        })
    }
}

/// Behaviour every node kind provides
pub trait ParserNode {
    /// The block this node was created under, if it is still alive
    fn ancestor(&self) -> Option<BlockNode>;

    /// File this node's text comes from
    fn filepath(&self) -> &Path;

    /// True once this node or a descendant changed since the last save
    fn dirty(&self) -> bool;

    fn metadata(&self) -> &Metadata;

    /// Ancestor blocks named `name` (case-insensitive), nearest first
    fn find_ancestors(&self, name: &str) -> Vec<BlockNode>;

    /// Record a checkpoint for the pending changes; no-op when clean
    fn save(&self, message: &str) -> Option<Checkpoint>;
}

/// Any node of the tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Comment(CommentNode),
    Directive(DirectiveNode),
    Block(BlockNode),
}

impl Node {
    pub(crate) fn core(&self) -> &NodeCore {
        match self {
            Node::Comment(c) => c.core(),
            Node::Directive(d) => d.core(),
            Node::Block(b) => b.core(),
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Comment(a), Node::Comment(b)) => a.ptr_eq(b),
            (Node::Directive(a), Node::Directive(b)) => a.ptr_eq(b),
            (Node::Block(a), Node::Block(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Directive or block name, `None` for comments
    pub fn name(&self) -> Option<String> {
        match self {
            Node::Comment(_) => None,
            Node::Directive(d) => Some(d.name().to_string()),
            Node::Block(b) => Some(b.name().to_string()),
        }
    }

    pub fn as_comment(&self) -> Option<&CommentNode> {
        match self {
            Node::Comment(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_directive(&self) -> Option<&DirectiveNode> {
        match self {
            Node::Directive(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&BlockNode> {
        match self {
            Node::Block(b) => Some(b),
            _ => None,
        }
    }
}

impl From<CommentNode> for Node {
    fn from(node: CommentNode) -> Self {
        Node::Comment(node)
    }
}

impl From<DirectiveNode> for Node {
    fn from(node: DirectiveNode) -> Self {
        Node::Directive(node)
    }
}

impl From<BlockNode> for Node {
    fn from(node: BlockNode) -> Self {
        Node::Block(node)
    }
}

macro_rules! impl_parser_node {
    ($ty:ty) => {
        impl ParserNode for $ty {
            fn ancestor(&self) -> Option<BlockNode> {
                self.core().ancestor()
            }

            fn filepath(&self) -> &Path {
                &self.core().filepath
            }

            fn dirty(&self) -> bool {
                self.core().is_dirty()
            }

            fn metadata(&self) -> &Metadata {
                &self.core().metadata
            }

            fn find_ancestors(&self, name: &str) -> Vec<BlockNode> {
                query::find_ancestors(self.core(), name)
            }

            fn save(&self, message: &str) -> Option<Checkpoint> {
                tracker::save(&Node::from(self.clone()), message)
            }
        }
    };
}

impl_parser_node!(CommentNode);
impl_parser_node!(DirectiveNode);
impl_parser_node!(BlockNode);
impl_parser_node!(Node);

/// Wrap a parsed fragment as a child of `parent`
pub(crate) fn wrap_fragment(parent: &BlockNode, fragment: &Arc<Fragment>, enabled: bool) -> Option<Node> {
    let core = || {
        NodeCore::child_of(
            parent,
            Metadata::new(fragment.clone()),
            fragment.path().to_path_buf(),
            false,
        )
    };

    match &fragment.kind {
        FragmentKind::Comment { text } => Some(CommentNode::from_core(core(), text.clone()).into()),
        FragmentKind::Directive { name, arguments } => {
            Some(DirectiveNode::from_core(core(), name.clone(), arguments.clone(), enabled).into())
        }
        FragmentKind::Block { name, arguments } => {
            Some(BlockNode::from_core(core(), name.clone(), arguments.clone(), enabled).into())
        }
        FragmentKind::Document => None,
    }
}
