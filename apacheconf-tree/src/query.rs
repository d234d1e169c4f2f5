//! Tree queries
//!
//! Upward search through ancestor links and pre-order descendant search.

use crate::block::BlockNode;
use crate::comment::CommentNode;
use crate::directive::DirectiveNode;
use crate::node::{Node, NodeCore};

/// Ancestor blocks named `name`, nearest first, excluding the node itself
///
/// The unnamed file root never matches.
pub(crate) fn find_ancestors(core: &NodeCore, name: &str) -> Vec<BlockNode> {
    let mut found = Vec::new();
    let mut current = core.ancestor();

    while let Some(block) = current {
        if !block.name().is_empty() && block.name().eq_ignore_ascii_case(name) {
            found.push(block.clone());
        }
        current = block.core().ancestor();
    }

    found
}

/// Visit every descendant of `block` in document order
///
/// With `exclude`, inactive blocks are not visited and neither is anything
/// below them.
fn walk(block: &BlockNode, exclude: bool, visit: &mut dyn FnMut(&Node)) {
    for child in block.children() {
        if let Node::Block(nested) = &child {
            if exclude && !nested.is_active() {
                continue;
            }
            visit(&child);
            walk(nested, exclude, visit);
        } else {
            visit(&child);
        }
    }
}

pub(crate) fn find_blocks(block: &BlockNode, name: &str, exclude: bool) -> Vec<BlockNode> {
    let mut found = Vec::new();
    walk(block, exclude, &mut |node| {
        if let Node::Block(b) = node {
            if b.name().eq_ignore_ascii_case(name) {
                found.push(b.clone());
            }
        }
    });
    found
}

pub(crate) fn find_directives(block: &BlockNode, name: &str, exclude: bool) -> Vec<DirectiveNode> {
    let mut found = Vec::new();
    walk(block, exclude, &mut |node| {
        if let Node::Directive(d) = node {
            if d.name().eq_ignore_ascii_case(name) {
                found.push(d.clone());
            }
        }
    });
    found
}

pub(crate) fn find_comments(block: &BlockNode, comment: &str, exact: bool) -> Vec<CommentNode> {
    let mut found = Vec::new();
    walk(block, false, &mut |node| {
        if let Node::Comment(c) = node {
            let matches = if exact {
                c.comment() == comment
            } else {
                c.comment().contains(comment)
            };
            if matches {
                found.push(c.clone());
            }
        }
    });
    found
}
