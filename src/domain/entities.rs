//! Domain entities: core data structures

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Fresh random id, e.g. `node-1f0c…`.
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::new_v4().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a node, unique within a map.
    NodeId,
    "node"
);
string_id!(
    /// Identifier of a parent → child edge.
    EdgeId,
    "edge"
);
string_id!(
    /// Identifier of a stored map.
    MapId,
    "map"
);

/// Point on the canvas. Unconstrained, may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Node record as stored and exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    /// Child ids in visual order
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

impl Node {
    pub fn new(id: NodeId, text: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            text: text.into(),
            x: position.x,
            y: position.y,
            children: Vec::new(),
            collapsed: None,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed.unwrap_or(false)
    }
}

/// Directed edge from parent (`from`) to child (`to`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            id: EdgeId::generate(),
            from,
            to,
        }
    }
}

/// Partial update for a node. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub text: Option<String>,
    pub position: Option<Position>,
    pub collapsed: Option<bool>,
}

impl NodePatch {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = Some(collapsed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.position.is_none() && self.collapsed.is_none()
    }
}

/// Offsets used to place newly created nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Horizontal distance between a parent and its children
    pub child_offset_x: f64,
    /// Vertical distance between consecutive siblings
    pub spacing_y: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            child_offset_x: 220.0,
            spacing_y: 80.0,
        }
    }
}

/// A named, timestamped map: the unit of persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMap {
    pub id: MapId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl MindMap {
    /// New map holding a single root node labelled with the map name.
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        let name = name.into();
        let root = Node::new(NodeId::generate(), name.clone(), Position::default());
        Self {
            id: MapId::generate(),
            name,
            created_at: now,
            updated_at: now,
            nodes: vec![root],
            edges: Vec::new(),
        }
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }
}

/// Portable JSON export of a map's tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    pub name: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl From<&MindMap> for MapDocument {
    fn from(map: &MindMap) -> Self {
        Self {
            name: map.name.clone(),
            nodes: map.nodes.clone(),
            edges: map.edges.clone(),
        }
    }
}
