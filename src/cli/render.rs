//! Text rendering of a map as a `termtree` tree.

use colored::Colorize;
use termtree::Tree;

use crate::domain::{NodeId, Palette, TreeStore};

/// Build a printable tree; each label is painted in its branch color.
///
/// Collapsed nodes show a `[+N]` marker instead of their children.
pub fn to_tree_string(tree: &TreeStore, palette: &Palette, show_ids: bool) -> Tree<String> {
    build(tree, tree.root_id(), palette, show_ids)
}

fn build(tree: &TreeStore, id: &NodeId, palette: &Palette, show_ids: bool) -> Tree<String> {
    let Some(node) = tree.get(id) else {
        return Tree::new(id.to_string());
    };
    let (r, g, b) = tree.color_of(id, palette).rgb();
    let mut label = node.text.truecolor(r, g, b).to_string();
    if show_ids {
        label = format!("{} {}", label, format!("({})", id).dimmed());
    }

    if node.is_collapsed() && !node.is_leaf() {
        let hidden = tree.descendants(id).len() - 1;
        return Tree::new(format!("{} {}", label, format!("[+{}]", hidden).dimmed()));
    }

    let leaves: Vec<_> = node
        .children
        .iter()
        .map(|child| build(tree, child, palette, show_ids))
        .collect();
    Tree::new(label).with_leaves(leaves)
}
