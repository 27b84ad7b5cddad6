//! Arena-backed tree store.
//!
//! Nodes live in a generational arena addressed through an id index. The node
//! collection order is tracked separately (root first), and a child → parent
//! index is kept next to the edge list so parent lookups do not scan edges.
//! Every structural operation checks its preconditions before touching state,
//! so a call either applies completely or leaves the store as it was.

use std::collections::{HashMap, HashSet};

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::colorizer::{Color, Palette};
use crate::domain::entities::{Edge, Layout, Node, NodeId, NodePatch, Position};
use crate::domain::error::{DomainError, DomainResult};

#[derive(Debug, Clone)]
pub struct TreeStore {
    arena: Arena<Node>,
    index: HashMap<NodeId, Index>,
    /// Collection order, `order[0]` is the root
    order: Vec<Index>,
    edges: Vec<Edge>,
    parents: HashMap<NodeId, NodeId>,
    layout: Layout,
}

impl TreeStore {
    /// Store holding only `root`. Any children listed on `root` are dropped.
    pub fn new(mut root: Node) -> Self {
        root.children.clear();
        let mut arena = Arena::new();
        let root_id = root.id.clone();
        let root_idx = arena.insert(root);
        Self {
            arena,
            index: HashMap::from([(root_id, root_idx)]),
            order: vec![root_idx],
            edges: Vec::new(),
            parents: HashMap::new(),
            layout: Layout::default(),
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Rebuild a store from serialized collections, validating the tree.
    ///
    /// The first node is the root. Rejects dangling edges, duplicate ids,
    /// nodes with zero or several parents, `children` lists that disagree with
    /// the edges, and nodes not reachable from the root.
    #[instrument(level = "debug", skip_all, fields(nodes = nodes.len(), edges = edges.len()))]
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> DomainResult<Self> {
        let root_id = nodes.first().ok_or(DomainError::EmptyTree)?.id.clone();

        let mut arena = Arena::with_capacity(nodes.len());
        let mut index = HashMap::with_capacity(nodes.len());
        let mut order = Vec::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(&node.id) {
                return Err(DomainError::DuplicateNode(node.id));
            }
            let id = node.id.clone();
            let idx = arena.insert(node);
            index.insert(id, idx);
            order.push(idx);
        }

        let mut edge_ids = HashSet::new();
        let mut parents: HashMap<NodeId, NodeId> = HashMap::new();
        for edge in &edges {
            if !edge_ids.insert(edge.id.clone()) {
                return Err(DomainError::DuplicateEdge(edge.id.clone()));
            }
            for end in [&edge.from, &edge.to] {
                if !index.contains_key(end) {
                    return Err(DomainError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: end.clone(),
                    });
                }
            }
            if edge.to == root_id {
                return Err(DomainError::RootHasParent(root_id));
            }
            if parents.insert(edge.to.clone(), edge.from.clone()).is_some() {
                return Err(DomainError::MultipleParents(edge.to.clone()));
            }
        }

        let store = Self {
            arena,
            index,
            order,
            edges,
            parents,
            layout: Layout::default(),
        };
        store.check_invariants()?;
        Ok(store)
    }

    /// Verify the tree invariants on the live store.
    pub fn check_invariants(&self) -> DomainResult<()> {
        let root_id = self.root_id();
        if self.parents.contains_key(root_id) {
            return Err(DomainError::RootHasParent(root_id.clone()));
        }

        let mut linked: HashMap<&NodeId, Vec<&NodeId>> = HashMap::with_capacity(self.order.len());
        for edge in &self.edges {
            linked.entry(&edge.from).or_default().push(&edge.to);
        }

        for node in self.nodes() {
            if node.id != *root_id && !self.parents.contains_key(&node.id) {
                return Err(DomainError::Orphan(node.id.clone()));
            }
            let mut listed: Vec<&NodeId> = node.children.iter().collect();
            let mut targets = linked.remove(&node.id).unwrap_or_default();
            listed.sort();
            targets.sort();
            if listed != targets || listed.windows(2).any(|w| w[0] == w[1]) {
                return Err(DomainError::ChildrenMismatch(node.id.clone()));
            }
        }

        let reachable = self.descendants(root_id);
        if reachable.len() != self.order.len() {
            let seen: HashSet<&NodeId> = reachable.iter().collect();
            if let Some(lost) = self.nodes().find(|n| !seen.contains(&n.id)) {
                return Err(DomainError::Unreachable(lost.id.clone()));
            }
        }
        Ok(())
    }

    pub fn root_id(&self) -> &NodeId {
        &self.arena[self.order[0]].id
    }

    pub fn root(&self) -> &Node {
        &self.arena[self.order[0]]
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).and_then(|&idx| self.arena.get(idx))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Nodes in collection order, root first.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().filter_map(|&idx| self.arena.get(idx))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.parents.get(id)
    }

    pub fn children_of(&self, id: &NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// `id` followed by all its descendants, depth-first in visual order.
    /// Empty when `id` is unknown.
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        if !self.contains(id) {
            return result;
        }
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            // Push children in reverse order for left-to-right traversal
            for child in self.children_of(&current).iter().rev() {
                stack.push(child.clone());
            }
            result.push(current);
        }
        result
    }

    /// True if `candidate` lies in the subtree of `ancestor` (inclusive).
    pub fn is_in_subtree(&self, ancestor: &NodeId, candidate: &NodeId) -> bool {
        let mut current = Some(candidate);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parents.get(id);
        }
        false
    }

    /// Number of levels, 1 for a lone root.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root_id(), 1)];
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            for child in self.children_of(id) {
                stack.push((child, level + 1));
            }
        }
        deepest
    }

    pub fn leaves(&self) -> Vec<&NodeId> {
        self.nodes().filter(|n| n.is_leaf()).map(|n| &n.id).collect()
    }

    /// Append a new node as the last child of `parent_id`.
    ///
    /// Returns `None` (no change) if the parent does not exist.
    #[instrument(level = "debug", skip(self))]
    pub fn create_child(&mut self, parent_id: &NodeId, text: &str) -> Option<NodeId> {
        let Some(parent) = self.get(parent_id) else {
            debug!("create_child: unknown parent {}", parent_id);
            return None;
        };
        let position = Position::new(
            parent.x + self.layout.child_offset_x,
            parent.y + parent.children.len() as f64 * self.layout.spacing_y,
        );
        Some(self.attach(parent_id, text, position))
    }

    /// Create a node next to `node_id` under the same parent.
    ///
    /// On the root this is `create_child(root)`. The new node is appended as the
    /// parent's last child and placed just below `node_id`.
    #[instrument(level = "debug", skip(self))]
    pub fn create_sibling(&mut self, node_id: &NodeId, text: &str) -> Option<NodeId> {
        if node_id == self.root_id() {
            let root_id = self.root_id().clone();
            return self.create_child(&root_id, text);
        }
        let Some(node) = self.get(node_id) else {
            debug!("create_sibling: unknown node {}", node_id);
            return None;
        };
        let Some(parent_id) = self.parents.get(node_id).cloned() else {
            debug!("create_sibling: no parent for {}", node_id);
            return None;
        };
        let position = Position::new(node.x, node.y + self.layout.spacing_y);
        Some(self.attach(&parent_id, text, position))
    }

    fn attach(&mut self, parent_id: &NodeId, text: &str, position: Position) -> NodeId {
        let node = Node::new(NodeId::generate(), text, position);
        let id = node.id.clone();
        let idx = self.arena.insert(node);
        self.index.insert(id.clone(), idx);
        self.order.push(idx);

        if let Some(parent) = self.index.get(parent_id).and_then(|&i| self.arena.get_mut(i)) {
            parent.children.push(id.clone());
        }
        self.edges.push(Edge::new(parent_id.clone(), id.clone()));
        self.parents.insert(id.clone(), parent_id.clone());
        id
    }

    /// Remove `node_id` with all its descendants and every edge touching them.
    ///
    /// Returns the removed ids; empty for unknown ids and for the root.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_subtree(&mut self, node_id: &NodeId) -> Vec<NodeId> {
        if node_id == self.root_id() {
            debug!("delete_subtree: refusing to delete root {}", node_id);
            return Vec::new();
        }
        let removed = self.descendants(node_id);
        if removed.is_empty() {
            debug!("delete_subtree: unknown node {}", node_id);
            return removed;
        }

        {
            let gone: HashSet<&NodeId> = removed.iter().collect();
            let mut gone_idx = HashSet::new();
            for id in &removed {
                if let Some(idx) = self.index.remove(id) {
                    self.arena.remove(idx);
                    gone_idx.insert(idx);
                }
                self.parents.remove(id);
            }
            self.order.retain(|idx| !gone_idx.contains(idx));
            self.edges
                .retain(|e| !gone.contains(&e.from) && !gone.contains(&e.to));
            for (_, node) in self.arena.iter_mut() {
                node.children.retain(|c| !gone.contains(c));
            }
        }

        debug!("delete_subtree: removed {} nodes", removed.len());
        removed
    }

    /// Move `node_id` under `new_parent_id`, appending it to the new parent's children.
    ///
    /// Rejected (returns `false`, no change) when either id is unknown or when
    /// `new_parent_id` is `node_id` itself or one of its descendants. The root
    /// can never be reparented.
    #[instrument(level = "debug", skip(self))]
    pub fn reparent(&mut self, node_id: &NodeId, new_parent_id: &NodeId) -> bool {
        if !self.contains(node_id) || !self.contains(new_parent_id) {
            debug!("reparent: unknown node");
            return false;
        }
        if self.is_in_subtree(node_id, new_parent_id) {
            debug!("reparent: {} is inside the subtree of {}", new_parent_id, node_id);
            return false;
        }
        let Some(old_parent_id) = self.parents.get(node_id).cloned() else {
            debug!("reparent: {} has no parent", node_id);
            return false;
        };

        if let Some(old_parent) = self
            .index
            .get(&old_parent_id)
            .and_then(|&i| self.arena.get_mut(i))
        {
            old_parent.children.retain(|c| c != node_id);
        }
        self.edges.retain(|e| e.to != *node_id);

        if let Some(new_parent) = self
            .index
            .get(new_parent_id)
            .and_then(|&i| self.arena.get_mut(i))
        {
            new_parent.children.push(node_id.clone());
        }
        self.edges
            .push(Edge::new(new_parent_id.clone(), node_id.clone()));
        self.parents.insert(node_id.clone(), new_parent_id.clone());
        true
    }

    /// Merge `patch` into the node. Returns `false` if the node does not exist.
    #[instrument(level = "debug", skip(self))]
    pub fn update_node(&mut self, node_id: &NodeId, patch: NodePatch) -> bool {
        let Some(node) = self.index.get(node_id).and_then(|&i| self.arena.get_mut(i)) else {
            debug!("update_node: unknown node {}", node_id);
            return false;
        };
        if let Some(text) = patch.text {
            node.text = text;
        }
        if let Some(position) = patch.position {
            node.x = position.x;
            node.y = position.y;
        }
        if let Some(collapsed) = patch.collapsed {
            node.collapsed = Some(collapsed);
        }
        true
    }

    /// Branch color of `node_id`, following the parent index.
    ///
    /// Agrees with [`crate::domain::colorizer::color_of`] on every valid tree.
    pub fn color_of<'p>(&self, node_id: &NodeId, palette: &'p Palette) -> &'p Color {
        let root_id = self.root_id();
        if node_id == root_id {
            return palette.root();
        }
        if !self.contains(node_id) {
            return palette.fallback();
        }
        let mut anchor = node_id;
        while let Some(parent) = self.parents.get(anchor) {
            if parent == root_id {
                return match self.root().children.iter().position(|c| c == anchor) {
                    Some(index) => palette.branch(index),
                    None => palette.fallback(),
                };
            }
            anchor = parent;
        }
        palette.fallback()
    }

    /// Node and edge collections, as stored and exported.
    pub fn to_parts(&self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes().cloned().collect(), self.edges.clone())
    }
}
