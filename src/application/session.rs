//! Editing session over one map.
//!
//! Lifecycle: open (read) → mutate → write → close. Writes are debounced:
//! each successful mutation moves the autosave deadline to `now + delay`, so a
//! burst of edits results in one write once the burst settles.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::application::ApplicationResult;
use crate::domain::{
    Color, Layout, MapId, MindMap, NodeId, NodePatch, Palette, TreeStore,
};
use crate::infrastructure::traits::{Clock, MapStore};

/// Per-session knobs, usually derived from `Settings`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub autosave_delay: Duration,
    pub layout: Layout,
    pub palette: Palette,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_millis(800),
            layout: Layout::default(),
            palette: Palette::default(),
        }
    }
}

pub struct EditorSession {
    store: Arc<dyn MapStore>,
    clock: Arc<dyn Clock>,
    options: SessionOptions,
    id: MapId,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    tree: TreeStore,
    /// Autosave deadline; `Some` while there are unsaved changes
    deadline: Option<Instant>,
}

impl EditorSession {
    /// Open a stored map.
    ///
    /// Missing, unreadable and invalid records all yield `None`; the reason is
    /// logged.
    #[instrument(level = "debug", skip(store, clock, options))]
    pub fn open(
        store: Arc<dyn MapStore>,
        clock: Arc<dyn Clock>,
        options: SessionOptions,
        id: &MapId,
    ) -> Option<Self> {
        let map = match store.load(id) {
            Ok(Some(map)) => map,
            Ok(None) => {
                debug!("open: no stored map {}", id);
                return None;
            }
            Err(e) => {
                warn!("cannot read map {}: {}", id, e);
                return None;
            }
        };
        match Self::start(store, clock, options, map) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("stored map {} is not a valid tree: {}", id, e);
                None
            }
        }
    }

    /// Start a session over an in-memory map. Nothing is written until a mutation.
    pub fn start(
        store: Arc<dyn MapStore>,
        clock: Arc<dyn Clock>,
        options: SessionOptions,
        map: MindMap,
    ) -> ApplicationResult<Self> {
        let tree = TreeStore::from_parts(map.nodes, map.edges)?.with_layout(options.layout);
        Ok(Self {
            store,
            clock,
            options,
            id: map.id,
            name: map.name,
            created_at: map.created_at,
            updated_at: map.updated_at,
            tree,
            deadline: None,
        })
    }

    pub fn id(&self) -> &MapId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn tree(&self) -> &TreeStore {
        &self.tree
    }

    pub fn palette(&self) -> &Palette {
        &self.options.palette
    }

    pub fn color_of(&self, id: &NodeId) -> &Color {
        self.tree.color_of(id, &self.options.palette)
    }

    pub fn is_dirty(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn create_child(&mut self, parent: &NodeId, text: &str) -> Option<NodeId> {
        let id = self.tree.create_child(parent, text)?;
        self.touch();
        Some(id)
    }

    pub fn create_sibling(&mut self, node: &NodeId, text: &str) -> Option<NodeId> {
        let id = self.tree.create_sibling(node, text)?;
        self.touch();
        Some(id)
    }

    pub fn delete_subtree(&mut self, node: &NodeId) -> Vec<NodeId> {
        let removed = self.tree.delete_subtree(node);
        if !removed.is_empty() {
            self.touch();
        }
        removed
    }

    pub fn reparent(&mut self, node: &NodeId, new_parent: &NodeId) -> bool {
        let moved = self.tree.reparent(node, new_parent);
        if moved {
            self.touch();
        }
        moved
    }

    pub fn update_node(&mut self, node: &NodeId, patch: NodePatch) -> bool {
        if patch.is_empty() {
            return self.tree.contains(node);
        }
        let updated = self.tree.update_node(node, patch);
        if updated {
            self.touch();
        }
        updated
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name != self.name {
            self.name = name;
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.deadline = Some(self.clock.now() + self.options.autosave_delay);
    }

    /// Write if the autosave deadline has passed. Returns `true` if a write happened.
    pub fn tick(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if self.clock.now() >= deadline => self.flush(),
            _ => false,
        }
    }

    /// Write pending changes now. Returns `true` if a write happened.
    ///
    /// A failed write is logged and the changes stay pending.
    pub fn flush(&mut self) -> bool {
        match self.try_flush() {
            Ok(written) => written,
            Err(e) => {
                warn!("cannot save map {}: {}", self.id, e);
                false
            }
        }
    }

    /// Like [`flush`](Self::flush), but hands the write error to the caller.
    #[instrument(level = "debug", skip(self), fields(id = %self.id))]
    pub fn try_flush(&mut self) -> io::Result<bool> {
        if self.deadline.is_none() {
            return Ok(false);
        }
        let mut map = self.snapshot();
        self.store.save(&mut map)?;
        self.updated_at = map.updated_at;
        self.deadline = None;
        info!("saved map {} ({} nodes)", self.id, self.tree.node_count());
        Ok(true)
    }

    /// Flush and hand back the final map.
    pub fn close(mut self) -> MindMap {
        self.flush();
        self.snapshot()
    }

    /// Current state as a map record.
    pub fn snapshot(&self) -> MindMap {
        let (nodes, edges) = self.tree.to_parts();
        MindMap {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            nodes,
            edges,
        }
    }
}
