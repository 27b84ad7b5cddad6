//! Map storage backends.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::domain::{MapId, MindMap};
use crate::infrastructure::traits::{sort_recent_first, FileSystem, MapStore};

/// One JSON file per map (`<data_dir>/<id>.json`).
pub struct JsonFileStore {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(fs: Arc<dyn FileSystem>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &MapId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn read(&self, path: &Path) -> io::Result<MindMap> {
        let content = self.fs.read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("corrupt map file {}: {}", path.display(), e),
            )
        })
    }
}

impl MapStore for JsonFileStore {
    #[instrument(level = "debug", skip(self))]
    fn load(&self, id: &MapId) -> io::Result<Option<MindMap>> {
        let path = self.path_for(id);
        if !self.fs.exists(&path) {
            debug!("load: no file at {}", path.display());
            return Ok(None);
        }
        self.read(&path).map(Some)
    }

    #[instrument(level = "debug", skip_all, fields(id = %map.id))]
    fn save(&self, map: &mut MindMap) -> io::Result<()> {
        map.updated_at = Utc::now();
        let content = serde_json::to_string_pretty(map)?;

        let path = self.path_for(&map.id);
        self.fs.ensure_parent(&path)?;
        // Write next to the target, then rename over it
        let tmp = path.with_extension("json.tmp");
        self.fs.write(&tmp, &content)?;
        self.fs.rename(&tmp, &path)?;
        debug!("save: wrote {}", path.display());
        Ok(())
    }

    fn exists(&self, id: &MapId) -> io::Result<bool> {
        Ok(self.fs.exists(&self.path_for(id)))
    }

    #[instrument(level = "debug", skip(self))]
    fn delete(&self, id: &MapId) -> io::Result<()> {
        let path = self.path_for(id);
        if self.fs.exists(&path) {
            self.fs.remove_file(&path)?;
        }
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn list(&self) -> io::Result<Vec<MindMap>> {
        if !self.fs.is_dir(&self.dir) {
            return Ok(Vec::new());
        }
        let mut maps = Vec::new();
        for path in self.fs.list_files(&self.dir, "json")? {
            match self.read(&path) {
                Ok(map) => maps.push(map),
                Err(e) => warn!("skipping unreadable map {}: {}", path.display(), e),
            }
        }
        sort_recent_first(&mut maps);
        Ok(maps)
    }
}

/// Non-persistent store keyed by map id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    maps: Mutex<BTreeMap<MapId, MindMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, BTreeMap<MapId, MindMap>>> {
        self.maps
            .lock()
            .map_err(|_| io::Error::other("map store lock poisoned"))
    }
}

impl MapStore for MemoryStore {
    fn load(&self, id: &MapId) -> io::Result<Option<MindMap>> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn save(&self, map: &mut MindMap) -> io::Result<()> {
        map.updated_at = Utc::now();
        self.lock()?.insert(map.id.clone(), map.clone());
        Ok(())
    }

    fn delete(&self, id: &MapId) -> io::Result<()> {
        self.lock()?.remove(id);
        Ok(())
    }

    fn list(&self) -> io::Result<Vec<MindMap>> {
        let mut maps: Vec<MindMap> = self.lock()?.values().cloned().collect();
        sort_recent_first(&mut maps);
        Ok(maps)
    }
}
