//! Integration tests for branch coloring.

use mindtree::domain::{color_of, Color, Node, NodeId, Palette, Position, TreeStore};
use rstest::rstest;

fn palette(branches: &[&str]) -> Palette {
    let branches: Vec<String> = branches.iter().map(|c| c.to_string()).collect();
    Palette::from_hex("#000000", &branches).unwrap()
}

fn new_tree() -> TreeStore {
    TreeStore::new(Node::new(NodeId::new("R"), "Root", Position::default()))
}

/// Pure colorizer over the store's exported collections.
fn pure_color<'p>(tree: &TreeStore, id: &NodeId, palette: &'p Palette) -> &'p Color {
    let (nodes, edges) = tree.to_parts();
    color_of(id, &nodes, &edges, palette)
}

#[test]
fn given_two_branches_when_coloring_then_follow_palette_order() {
    // Arrange
    let palette = Palette::default();
    let mut tree = new_tree();
    let r = tree.root_id().clone();
    let a = tree.create_child(&r, "A").unwrap();
    let b = tree.create_child(&r, "B").unwrap();

    // Act
    let c = tree.create_child(&a, "C").unwrap();

    // Assert
    assert_eq!(pure_color(&tree, &a, &palette), palette.branch(0));
    assert_eq!(pure_color(&tree, &b, &palette), palette.branch(1));
    assert_eq!(
        pure_color(&tree, &c, &palette),
        pure_color(&tree, &a, &palette)
    );
    assert_eq!(pure_color(&tree, &r, &palette), palette.root());
}

#[rstest]
#[case(0, "#111111")]
#[case(1, "#222222")]
#[case(2, "#333333")]
#[case(3, "#333333")]
#[case(7, "#333333")]
fn given_more_branches_than_colors_when_coloring_then_clamps_to_last(
    #[case] branch: usize,
    #[case] expected: &str,
) {
    // Arrange
    let palette = palette(&["#111111", "#222222", "#333333"]);
    let mut tree = new_tree();
    let r = tree.root_id().clone();
    let anchors: Vec<NodeId> = (0..8)
        .map(|i| tree.create_child(&r, &format!("n{}", i)).unwrap())
        .collect();
    let leaf = tree.create_child(&anchors[branch], "leaf").unwrap();

    // Act
    let color = pure_color(&tree, &leaf, &palette);

    // Assert
    assert_eq!(color.as_str(), expected);
}

#[test]
fn given_same_tree_when_coloring_repeatedly_then_same_result() {
    let palette = Palette::default();
    let mut tree = new_tree();
    let r = tree.root_id().clone();
    let a = tree.create_child(&r, "A").unwrap();
    let deep = tree.create_child(&a, "x").unwrap();
    let deeper = tree.create_child(&deep, "y").unwrap();

    let first = pure_color(&tree, &deeper, &palette).clone();
    for _ in 0..5 {
        assert_eq!(pure_color(&tree, &deeper, &palette), &first);
    }
}

#[test]
fn given_reparented_subtree_when_coloring_then_takes_new_branch_color() {
    // Arrange
    let palette = Palette::default();
    let mut tree = new_tree();
    let r = tree.root_id().clone();
    let a = tree.create_child(&r, "A").unwrap();
    let b = tree.create_child(&r, "B").unwrap();
    let c = tree.create_child(&a, "C").unwrap();
    let d = tree.create_child(&c, "D").unwrap();

    // Act
    assert!(tree.reparent(&c, &b));

    // Assert
    assert_eq!(tree.color_of(&d, &palette), palette.branch(1));
    assert_eq!(pure_color(&tree, &d, &palette), palette.branch(1));
}

#[test]
fn given_deleted_first_branch_when_coloring_then_remaining_branch_shifts() {
    let palette = Palette::default();
    let mut tree = new_tree();
    let r = tree.root_id().clone();
    let a = tree.create_child(&r, "A").unwrap();
    let b = tree.create_child(&r, "B").unwrap();

    tree.delete_subtree(&a);

    assert_eq!(tree.color_of(&b, &palette), palette.branch(0));
}

#[test]
fn given_any_node_when_coloring_then_store_and_pure_function_agree() {
    // Arrange
    let palette = Palette::default();
    let mut tree = new_tree();
    let r = tree.root_id().clone();
    let mut frontier = vec![r.clone()];
    for depth in 0..3 {
        let mut next = Vec::new();
        for parent in &frontier {
            for i in 0..3 {
                let id = tree
                    .create_child(parent, &format!("{}-{}", depth, i))
                    .unwrap();
                next.push(id);
            }
        }
        frontier = next;
    }
    let (nodes, edges) = tree.to_parts();

    // Act / Assert
    for node in &nodes {
        assert_eq!(
            tree.color_of(&node.id, &palette),
            color_of(&node.id, &nodes, &edges, &palette),
            "disagreement on {}",
            node.id
        );
    }
}

#[test]
fn given_unknown_node_when_coloring_then_fallback_is_first_branch_color() {
    let palette = Palette::default();
    let tree = new_tree();
    let (nodes, edges) = tree.to_parts();

    let color = color_of(&NodeId::new("missing"), &nodes, &edges, &palette);

    assert_eq!(color, palette.fallback());
    assert_eq!(color, palette.branch(0));
}

#[test]
fn given_empty_collections_when_coloring_then_fallback() {
    let palette = Palette::default();
    assert_eq!(
        color_of(&NodeId::new("x"), &[], &[], &palette),
        palette.fallback()
    );
}
