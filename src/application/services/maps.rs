//! Map management service
//!
//! Map-level CRUD on top of a `MapStore`, plus JSON export/import.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::application::session::{EditorSession, SessionOptions};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{MapDocument, MapId, MindMap, TreeStore};
use crate::infrastructure::traits::{Clock, MapStore};

/// Map management service.
pub struct MapService {
    store: Arc<dyn MapStore>,
    clock: Arc<dyn Clock>,
    options: SessionOptions,
}

impl MapService {
    pub fn new(store: Arc<dyn MapStore>, clock: Arc<dyn Clock>, options: SessionOptions) -> Self {
        Self {
            store,
            clock,
            options,
        }
    }

    /// Create and store a map holding a single root node.
    #[instrument(level = "debug", skip(self))]
    pub fn create(&self, name: &str) -> ApplicationResult<MindMap> {
        let mut map = MindMap::new(name, Utc::now());
        self.store.save(&mut map).with_context("save new map")?;
        info!("created map {} ({})", map.id, map.name);
        Ok(map)
    }

    pub fn list(&self) -> ApplicationResult<Vec<MindMap>> {
        self.store.list().with_context("list maps")
    }

    pub fn get(&self, id: &MapId) -> ApplicationResult<MindMap> {
        self.store
            .load(id)
            .with_context("load map")?
            .ok_or_else(|| ApplicationError::MapNotFound(id.to_string()))
    }

    /// Resolve a user-supplied reference: exact id, exact name, or unique id prefix.
    ///
    /// An empty reference only matches a map with an empty name.
    #[instrument(level = "debug", skip(self))]
    pub fn find(&self, reference: &str) -> ApplicationResult<MindMap> {
        let maps = self.list()?;
        if let Some(map) = maps.iter().find(|m| m.id.as_str() == reference) {
            return Ok(map.clone());
        }

        let by_name: Vec<&MindMap> = maps.iter().filter(|m| m.name == reference).collect();
        let candidates = if by_name.is_empty() && !reference.is_empty() {
            maps.iter()
                .filter(|m| m.id.as_str().starts_with(reference))
                .collect()
        } else {
            by_name
        };
        debug!("find: {} candidates for '{}'", candidates.len(), reference);

        match candidates.as_slice() {
            [single] => Ok((*single).clone()),
            [] => Err(ApplicationError::MapNotFound(reference.to_string())),
            many => Err(ApplicationError::AmbiguousMap {
                reference: reference.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Remove a map. Returns `false` if it did not exist.
    ///
    /// Records that cannot be parsed are removed as well.
    pub fn delete(&self, id: &MapId) -> ApplicationResult<bool> {
        let existed = self.store.exists(id).with_context("check map")?;
        if existed {
            self.store.delete(id).with_context("delete map")?;
            info!("deleted map {}", id);
        }
        Ok(existed)
    }

    pub fn duplicate(&self, id: &MapId) -> ApplicationResult<MindMap> {
        self.store
            .duplicate(id)
            .with_context("duplicate map")?
            .ok_or_else(|| ApplicationError::MapNotFound(id.to_string()))
    }

    /// Start an editing session on a stored map. `None` if it cannot be read.
    pub fn open_session(&self, id: &MapId) -> Option<EditorSession> {
        EditorSession::open(
            self.store.clone(),
            self.clock.clone(),
            self.options.clone(),
            id,
        )
    }

    pub fn export_json(&self, id: &MapId) -> ApplicationResult<String> {
        let map = self.get(id)?;
        serde_json::to_string_pretty(&MapDocument::from(&map)).map_err(|e| {
            ApplicationError::OperationFailed {
                context: format!("serialize map {}", id),
                source: Box::new(e),
            }
        })
    }

    /// Store an exported document as a new map.
    ///
    /// The tree is validated first; `name` overrides the document's name.
    #[instrument(level = "debug", skip(self, json))]
    pub fn import_json(&self, json: &str, name: Option<&str>) -> ApplicationResult<MindMap> {
        let document: MapDocument =
            serde_json::from_str(json).map_err(|e| ApplicationError::InvalidDocument {
                message: e.to_string(),
            })?;
        let tree = TreeStore::from_parts(document.nodes, document.edges)?;
        let (nodes, edges) = tree.to_parts();

        let now = Utc::now();
        let mut map = MindMap {
            id: MapId::generate(),
            name: name.map(str::to_string).unwrap_or(document.name),
            created_at: now,
            updated_at: now,
            nodes,
            edges,
        };
        self.store.save(&mut map).with_context("save imported map")?;
        info!("imported map {} ({} nodes)", map.id, map.nodes.len());
        Ok(map)
    }
}
