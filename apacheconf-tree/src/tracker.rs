//! Dirty/save tracking
//!
//! `modified` marks a node whose own text region changed; `dirty` marks a
//! node with a modified node anywhere in its subtree. A dirty node always
//! has dirty ancestors.

use crate::block::BlockNode;
use crate::node::{Checkpoint, Node, NodeCore};
use crate::writer::ConfigWriter;
use apacheconf_core::{Error, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Record a change to the node owning `core`
pub(crate) fn mark_modified(core: &NodeCore) {
    core.set_modified(true);
    core.set_dirty(true);
    propagate(core);
}

/// Nodes built dirty pass the flag on to their ancestors
pub(crate) fn settle_construction(core: &NodeCore) {
    if core.is_dirty() {
        propagate(core);
    }
}

fn propagate(core: &NodeCore) {
    let mut current = core.ancestor();
    while let Some(block) = current {
        block.core().set_dirty(true);
        current = block.core().ancestor();
    }
}

/// Files of every modified node in the subtree of `node`
pub(crate) fn unsaved_files(node: &Node) -> BTreeSet<PathBuf> {
    let mut files = BTreeSet::new();
    collect_unsaved(node, &mut files);
    files
}

fn collect_unsaved(node: &Node, files: &mut BTreeSet<PathBuf>) {
    let core = node.core();
    if !core.is_dirty() {
        return;
    }
    if core.is_modified() {
        files.insert(core.filepath.clone());
    }
    if let Node::Block(block) = node {
        for child in block.children() {
            collect_unsaved(&child, files);
        }
    }
}

pub(crate) fn save(node: &Node, message: &str) -> Option<Checkpoint> {
    let core = node.core();
    if !core.is_dirty() {
        return None;
    }

    let checkpoint = Checkpoint {
        message: message.to_string(),
        files: unsaved_files(node),
    };
    tracing::info!(
        "Checkpoint \"{}\" covering {} file(s)",
        checkpoint.message,
        checkpoint.files.len()
    );
    core.context.journal.lock().push(checkpoint.clone());
    Some(checkpoint)
}

/// Top-level nodes of `path` below `node`
///
/// A node belongs to the result when it comes from `path` and its parent
/// does not, or when it has no parent.
pub(crate) fn file_roots(node: &Node, path: &Path) -> Vec<Node> {
    let mut roots = Vec::new();
    collect_roots(node, path, &mut roots);
    roots
}

fn collect_roots(node: &Node, path: &Path, roots: &mut Vec<Node>) {
    if node.core().filepath == path {
        roots.push(node.clone());
        return;
    }
    if let Node::Block(block) = node {
        for child in block.children() {
            collect_roots(&child, path, roots);
        }
    }
}

pub(crate) fn write_unsaved(block: &BlockNode, writer: &dyn ConfigWriter) -> Result<BTreeSet<PathBuf>> {
    let files = block.unsaved_files();
    if files.is_empty() {
        return Ok(files);
    }

    let root = block.root();
    if !root.core().metadata.is_document() {
        // Rendering from a detached block would replace the file with one subtree
        return Err(Error::InvalidConstruction(
            "tree root is no longer alive".to_string(),
        ));
    }

    let root = Node::Block(root);
    for path in &files {
        let nodes = file_roots(&root, path);
        tracing::debug!("Writing {} ({} top-level nodes)", path.display(), nodes.len());
        writer.write(path, &nodes)?;
    }

    settle(&root, &files);
    Ok(files)
}

/// Clear `modified` on nodes of the written files and recompute `dirty`
fn settle(node: &Node, written: &BTreeSet<PathBuf>) -> bool {
    let core = node.core();
    if !core.is_dirty() {
        return false;
    }
    if written.contains(&core.filepath) {
        core.set_modified(false);
    }

    let mut dirty = core.is_modified();
    if let Node::Block(block) = node {
        for child in block.children() {
            dirty |= settle(&child, written);
        }
    }
    core.set_dirty(dirty);
    dirty
}

pub(crate) fn mark_clean(node: &Node) {
    let core = node.core();
    if !core.is_dirty() && !core.is_modified() {
        return;
    }
    core.set_modified(false);
    core.set_dirty(false);
    if let Node::Block(block) = node {
        for child in block.children() {
            mark_clean(&child);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::node::ParserNode;
    use crate::testing;
    use crate::writer::MemoryWriter;
    use apacheconf_core::Error;
    use std::path::PathBuf;

    #[test]
    fn test_untouched_tree_has_no_unsaved_files() {
        let root = testing::tree("Listen 80\n<VirtualHost *:80>\n    ServerName a\n</VirtualHost>\n");
        // Force materialisation of every level
        assert_eq!(root.find_directives("ServerName", false).len(), 1);
        assert!(root.unsaved_files().is_empty());
        assert!(!root.dirty());
    }

    #[test]
    fn test_dirty_propagates_to_root() {
        let root = testing::tree(
            "<VirtualHost *:80>\n    <Directory /srv>\n        Options None\n    </Directory>\n</VirtualHost>\n",
        );
        let options = root.find_directives("Options", true).remove(0);
        let directory = root.find_blocks("Directory", true).remove(0);
        let vhost = root.find_blocks("VirtualHost", true).remove(0);

        options.set_parameters(&["Indexes"]).unwrap();
        assert!(options.dirty());
        assert!(directory.dirty());
        assert!(vhost.dirty());
        assert!(root.dirty());
    }

    #[test]
    fn test_dirtiness_never_flows_down() {
        let root = testing::tree("<VirtualHost *:80>\n    ServerName a\n</VirtualHost>\n");
        let vhost = root.find_blocks("VirtualHost", true).remove(0);
        let name = root.find_directives("ServerName", true).remove(0);

        vhost.add_child_comment("new", None).unwrap();
        assert!(vhost.dirty());
        assert!(!name.dirty());
    }

    #[test]
    fn test_scenario_add_server_alias() {
        let root = testing::tree("<VirtualHost *:80>\n    ServerName example.com\n</VirtualHost>\n");
        let vhost = root.find_blocks("VirtualHost", true).remove(0);

        let names = vhost.find_directives("ServerName", true);
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].parameters(), vec!["example.com"]);

        vhost.add_child_directive("ServerAlias", &["www.example.com"], None).unwrap();
        assert_eq!(vhost.children().len(), 2);

        let files: Vec<PathBuf> = root.unsaved_files().into_iter().collect();
        assert_eq!(files, vec![PathBuf::from(testing::PATH)]);
        assert_eq!(vhost.unsaved_files().len(), 1);
    }

    #[test]
    fn test_detached_view_reports_own_file() {
        let root = testing::tree("<VirtualHost *:80>\n</VirtualHost>\n");
        let vhost = root.find_blocks("VirtualHost", true).remove(0);

        let included = crate::node::NodeParams::new()
            .ancestor(&vhost)
            .filepath("/etc/httpd/conf.d/ssl.conf")
            .metadata(vhost.metadata().clone());
        let ssl = crate::BlockNode::new(included, "IfModule", &["mod_ssl.c"], true).unwrap();
        assert!(root.unsaved_files().is_empty());

        ssl.set_parameters(&["ssl_module"]).unwrap();
        assert!(root.dirty());
        // `ssl` was never attached, so the walk from the root cannot see it
        assert!(root.unsaved_files().is_empty());
        assert_eq!(
            ssl.unsaved_files().into_iter().collect::<Vec<_>>(),
            vec![PathBuf::from("/etc/httpd/conf.d/ssl.conf")]
        );
    }

    #[test]
    fn test_save_records_checkpoint() {
        let root = testing::tree("Listen 80\n");
        assert!(root.save("nothing to do").is_none());
        assert!(root.checkpoints().is_empty());

        root.add_child_directive("Listen", &["443"], None).unwrap();
        let checkpoint = root.save("enable https").unwrap();
        assert_eq!(checkpoint.message, "enable https");
        assert!(checkpoint.files.contains(&PathBuf::from(testing::PATH)));
        assert_eq!(root.checkpoints(), vec![checkpoint]);
    }

    #[test]
    fn test_write_unsaved_cleans_tree() {
        let root = testing::tree("<VirtualHost *:80>\n    ServerName a\n</VirtualHost>\n");
        let name = root.find_directives("ServerName", true).remove(0);
        name.set_parameters(&["b"]).unwrap();

        let writer = MemoryWriter::default();
        let written = root.write_unsaved(&writer).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(
            writer.get(testing::PATH).unwrap(),
            "<VirtualHost *:80>\n    ServerName b\n</VirtualHost>\n"
        );

        assert!(!root.dirty());
        assert!(!name.dirty());
        assert!(root.unsaved_files().is_empty());
        assert!(root.write_unsaved(&writer).unwrap().is_empty());
    }

    #[test]
    fn test_write_from_nested_block_writes_whole_file() {
        let root = testing::tree("Listen 80\n<VirtualHost *:80>\n</VirtualHost>\n");
        let vhost = root.find_blocks("VirtualHost", true).remove(0);
        vhost.add_child_directive("ServerName", &["a"], None).unwrap();

        let writer = MemoryWriter::default();
        vhost.write_unsaved(&writer).unwrap();
        assert_eq!(
            writer.get(testing::PATH).unwrap(),
            "Listen 80\n<VirtualHost *:80>\n    ServerName a\n</VirtualHost>\n"
        );
        assert!(!root.dirty());
    }

    #[test]
    fn test_write_refused_once_root_is_dropped() {
        let vhost = testing::tree("Listen 80\nServerRoot /etc/httpd\n<VirtualHost *:80>\n</VirtualHost>\n")
            .find_blocks("VirtualHost", true)
            .remove(0);
        assert!(vhost.ancestor().is_none());
        vhost.add_child_directive("ServerName", &["a"], None).unwrap();

        let writer = MemoryWriter::default();
        let err = vhost.write_unsaved(&writer).unwrap_err();
        assert!(matches!(err, Error::InvalidConstruction(_)));
        assert!(writer.files().is_empty());
        // Nothing was written, so the change is still pending
        assert!(vhost.dirty());
        assert_eq!(vhost.unsaved_files().len(), 1);
    }

    #[test]
    fn test_mark_clean() {
        let root = testing::tree("Listen 80\n");
        root.add_child_directive("Listen", &["443"], None).unwrap();
        root.mark_clean();
        assert!(!root.dirty());
        assert!(root.unsaved_files().is_empty());
        assert!(root.children().iter().all(|c| !c.dirty()));
    }
}
