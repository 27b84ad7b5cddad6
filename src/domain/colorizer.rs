//! Branch coloring.
//!
//! Every node below the root takes the color of its branch anchor, the direct
//! child of the root it descends from. Anchors are colored by their position
//! in the root's `children`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Edge, Node, NodeId};
use crate::domain::error::{DomainError, DomainResult};

/// Hex color in `#rrggbb` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn parse(hex: &str) -> DomainResult<Self> {
        let digits = hex
            .strip_prefix('#')
            .ok_or_else(|| DomainError::InvalidColor(hex.to_string()))?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidColor(hex.to_string()));
        }
        Ok(Self(format!("#{}", digits.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Red, green and blue components.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or(0);
        (channel(1), channel(3), channel(5))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Color {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

/// Root color plus the branch colors, in branch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    root: Color,
    branches: Vec<Color>,
}

pub const DEFAULT_ROOT_COLOR: &str = "#37474f";

pub const DEFAULT_BRANCH_COLORS: [&str; 8] = [
    "#e57373", "#64b5f6", "#81c784", "#ffb74d", "#ba68c8", "#4db6ac", "#f06292", "#a1887f",
];

impl Default for Palette {
    fn default() -> Self {
        Self {
            root: Color(DEFAULT_ROOT_COLOR.to_string()),
            branches: DEFAULT_BRANCH_COLORS
                .iter()
                .map(|c| Color(c.to_string()))
                .collect(),
        }
    }
}

impl Palette {
    pub fn new(root: Color, branches: Vec<Color>) -> DomainResult<Self> {
        if branches.is_empty() {
            return Err(DomainError::EmptyPalette);
        }
        Ok(Self { root, branches })
    }

    /// Build from hex strings, validating each one.
    pub fn from_hex(root: &str, branches: &[String]) -> DomainResult<Self> {
        let branches = branches
            .iter()
            .map(|c| Color::parse(c))
            .collect::<DomainResult<Vec<_>>>()?;
        Self::new(Color::parse(root)?, branches)
    }

    pub fn root(&self) -> &Color {
        &self.root
    }

    pub fn branches(&self) -> &[Color] {
        &self.branches
    }

    /// Color of the branch at `index`. Indexes past the end repeat the last color.
    pub fn branch(&self, index: usize) -> &Color {
        let last = self.branches.len() - 1;
        &self.branches[index.min(last)]
    }

    /// Color for nodes whose branch cannot be determined.
    pub fn fallback(&self) -> &Color {
        &self.branches[0]
    }
}

/// Color of `node_id` given the raw node and edge collections.
///
/// The root (first node) gets the root color. Any other node walks its
/// incoming edges up to the branch anchor. Unknown nodes, broken ancestry and
/// cycles in malformed data yield [`Palette::fallback`].
pub fn color_of<'p>(
    node_id: &NodeId,
    nodes: &[Node],
    edges: &[Edge],
    palette: &'p Palette,
) -> &'p Color {
    let Some(root) = nodes.first() else {
        return palette.fallback();
    };
    if *node_id == root.id {
        return palette.root();
    }
    if !nodes.iter().any(|n| n.id == *node_id) {
        return palette.fallback();
    }

    let mut visited = HashSet::new();
    let mut current = node_id;
    let anchor = loop {
        let Some(edge) = edges.iter().find(|e| e.to == *current) else {
            return palette.fallback();
        };
        if edge.from == root.id {
            break current;
        }
        if !visited.insert(&edge.from) {
            return palette.fallback();
        }
        current = &edge.from;
    };

    match root.children.iter().position(|c| c == anchor) {
        Some(index) => palette.branch(index),
        None => palette.fallback(),
    }
}
