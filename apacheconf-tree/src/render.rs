//! Text rendering
//!
//! Turns nodes back into configuration text. Regions whose node is
//! unchanged are copied byte for byte from the parsed source; only changed
//! or added nodes are generated.

use crate::block::BlockNode;
use crate::node::{Node, NodeCore, ParserNode};
use apacheconf_core::raw::FragmentKind;

const INDENT: &str = "    ";

/// Render the top-level nodes of one file
pub fn render(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        render_node(node, nesting_depth(node), &mut out);
    }
    out
}

/// Number of enclosing blocks, not counting the file root
fn nesting_depth(node: &Node) -> usize {
    let mut depth = 0;
    let mut current = node.ancestor();
    while let Some(block) = current {
        current = block.ancestor();
        if current.is_some() {
            depth += 1;
        }
    }
    depth
}

fn render_node(node: &Node, depth: usize, out: &mut String) {
    match node {
        Node::Comment(comment) => {
            let core = comment.core();
            if core.metadata.is_synthetic() {
                out.push('#');
                if !comment.comment().is_empty() {
                    out.push(' ');
                    out.push_str(comment.comment());
                }
            } else {
                out.push_str(core.metadata.fragment().text());
            }
        }
        Node::Directive(directive) => {
            let parameters = directive.parameters();
            if unchanged_arguments(directive.core(), &parameters) {
                out.push_str(directive.core().metadata.fragment().text());
            } else {
                push_statement(out, directive.name(), &parameters);
            }
        }
        Node::Block(block) => render_block(block, depth, out),
    }
}

fn render_block(block: &BlockNode, depth: usize, out: &mut String) {
    let core = block.core();
    let metadata = &core.metadata;
    let fragment = metadata.fragment();

    if metadata.is_document() {
        render_children(block, 0, out);
        out.push_str(fragment.slice(fragment.trailing));
        return;
    }

    if !metadata.is_synthetic() && !core.is_dirty() {
        out.push_str(fragment.text());
        return;
    }

    let parameters = block.parameters();
    if unchanged_arguments(core, &parameters) {
        out.push_str(fragment.slice(fragment.header));
    } else {
        out.push('<');
        push_statement(out, block.name(), &parameters);
        out.push('>');
    }

    render_children(block, depth + 1, out);

    if metadata.is_synthetic() {
        out.push('\n');
        out.push_str(&INDENT.repeat(depth));
        out.push_str("</");
        out.push_str(block.name());
        out.push('>');
    } else {
        out.push_str(fragment.slice(fragment.trailing));
        out.push_str(fragment.slice(fragment.footer));
    }
}

fn render_children(block: &BlockNode, depth: usize, out: &mut String) {
    for child in block.children() {
        let metadata = &child.core().metadata;

        if metadata.is_synthetic() {
            if !out.is_empty() {
                out.push('\n');
                out.push_str(&INDENT.repeat(depth));
            }
        } else {
            let fragment = metadata.fragment();
            let gap = fragment.slice(fragment.leading);
            // The separator may have belonged to a node that is gone
            if !gap.contains('\n') && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(gap);
        }

        render_node(&child, depth, out);
    }
}

/// Whether a parsed node still carries the arguments it was parsed with
fn unchanged_arguments(core: &NodeCore, parameters: &[String]) -> bool {
    if core.metadata.is_synthetic() {
        return false;
    }
    match &core.metadata.fragment().kind {
        FragmentKind::Directive { arguments, .. } | FragmentKind::Block { arguments, .. } => {
            arguments.as_slice() == parameters
        }
        _ => false,
    }
}

fn push_statement(out: &mut String, name: &str, parameters: &[String]) {
    out.push_str(name);
    for parameter in parameters {
        out.push(' ');
        out.push_str(parameter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    const VHOST: &str = "# Sites\n\n<VirtualHost  *:80 >\n\tServerName example.com\n\n\tDocumentRoot \"/var/www\"\n</VirtualHost>\n";

    fn render_tree(root: &BlockNode) -> String {
        render(&[Node::from(root.clone())])
    }

    #[test]
    fn test_untouched_round_trip() {
        let root = testing::tree(VHOST);
        assert_eq!(root.find_directives("ServerName", true).len(), 1);
        assert_eq!(render_tree(&root), VHOST);
    }

    #[test]
    fn test_round_trip_with_continuations() {
        let source = "RewriteRule ^/old \\\n    /new [R]\n<IfModule mod_ssl.c>\n  Listen 443\n</IfModule>";
        let root = testing::tree(source);
        root.find_blocks("IfModule", false);
        assert_eq!(render_tree(&root), source);
    }

    #[test]
    fn test_changed_directive_keeps_surroundings() {
        let root = testing::tree(VHOST);
        root.find_directives("ServerName", true)[0]
            .set_parameters(&["www.example.com"])
            .unwrap();

        assert_eq!(
            render_tree(&root),
            "# Sites\n\n<VirtualHost  *:80 >\n\tServerName www.example.com\n\n\tDocumentRoot \"/var/www\"\n</VirtualHost>\n"
        );
    }

    #[test]
    fn test_changed_block_header() {
        let root = testing::tree(VHOST);
        root.find_blocks("VirtualHost", true)[0]
            .set_parameters(&["*:8080"])
            .unwrap();

        let text = render_tree(&root);
        assert!(text.contains("<VirtualHost *:8080>\n\tServerName example.com"));
        assert!(text.ends_with("</VirtualHost>\n"));
    }

    #[test]
    fn test_added_children() {
        let root = testing::tree(VHOST);
        let vhost = root.find_blocks("VirtualHost", true).remove(0);
        vhost.add_child_directive("ServerAlias", &["www.example.com"], Some(1)).unwrap();
        let dir = vhost.add_child_block("Directory", &["\"/var/www\""], None).unwrap();
        dir.add_child_directive("Require", &["all", "granted"], None).unwrap();
        root.add_child_comment("end of sites", None).unwrap();

        assert_eq!(
            render_tree(&root),
            "# Sites\n\n<VirtualHost  *:80 >\n\tServerName example.com\n    ServerAlias www.example.com\n\n\tDocumentRoot \"/var/www\"\n    <Directory \"/var/www\">\n        Require all granted\n    </Directory>\n</VirtualHost>\n# end of sites\n"
        );
    }

    #[test]
    fn test_deleted_child_takes_its_gap() {
        let root = testing::tree(VHOST);
        let vhost = root.find_blocks("VirtualHost", true).remove(0);
        let name = vhost.children().remove(0);
        vhost.delete_child(&name).unwrap();

        assert_eq!(
            render_tree(&root),
            "# Sites\n\n<VirtualHost  *:80 >\n\n\tDocumentRoot \"/var/www\"\n</VirtualHost>\n"
        );
    }

    #[test]
    fn test_insert_before_first_node() {
        let root = testing::tree("Listen 80\n");
        root.add_child_comment("generated", Some(0)).unwrap();
        assert_eq!(render_tree(&root), "# generated\nListen 80\n");
    }

    #[test]
    fn test_empty_document() {
        let root = testing::tree("");
        let vhost = root.add_child_block("VirtualHost", &["*:443"], None).unwrap();
        vhost.add_child_directive("SSLEngine", &["on"], None).unwrap();
        assert_eq!(render_tree(&root), "<VirtualHost *:443>\n    SSLEngine on\n</VirtualHost>");
    }

    #[test]
    fn test_render_nested_block_alone() {
        let root = testing::tree("<VirtualHost *:80>\n    <Directory /srv>\n    </Directory>\n</VirtualHost>\n");
        let dir = root.find_blocks("Directory", true).remove(0);
        dir.add_child_directive("Options", &["None"], None).unwrap();

        assert_eq!(
            render(&[Node::from(dir)]),
            "<Directory /srv>\n        Options None\n    </Directory>"
        );
    }
}
