//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::domain::{MapId, MindMap};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Rename/move a file.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Regular files directly inside `dir` with the given extension, sorted.
    fn list_files(&self, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Monotonic time source, used for autosave deadlines.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Persistence adapter for maps.
///
/// Implementations report failures as `io::Error`; callers decide how to
/// degrade. Corrupt records surface as `ErrorKind::InvalidData`.
pub trait MapStore: Send + Sync {
    /// Load a map by id. `Ok(None)` if no such map is stored.
    fn load(&self, id: &MapId) -> io::Result<Option<MindMap>>;

    /// Store `map`, refreshing its `updated_at`.
    fn save(&self, map: &mut MindMap) -> io::Result<()>;

    /// Remove a map. Removing an unknown id is not an error.
    fn delete(&self, id: &MapId) -> io::Result<()>;

    /// All stored maps, most recently updated first.
    fn list(&self) -> io::Result<Vec<MindMap>>;

    /// True if a record exists under `id`, readable or not.
    fn exists(&self, id: &MapId) -> io::Result<bool> {
        Ok(self.load(id)?.is_some())
    }

    /// Deep copy of a stored map under a fresh id and a ` (copy)` name suffix.
    fn duplicate(&self, id: &MapId) -> io::Result<Option<MindMap>> {
        let Some(original) = self.load(id)? else {
            return Ok(None);
        };
        let now = chrono::Utc::now();
        let mut copy = MindMap {
            id: MapId::generate(),
            name: format!("{} (copy)", original.name),
            created_at: now,
            updated_at: now,
            nodes: original.nodes.clone(),
            edges: original.edges.clone(),
        };
        self.save(&mut copy)?;
        Ok(Some(copy))
    }
}

/// Sort maps most recently updated first, ties broken by id.
pub(crate) fn sort_recent_first(maps: &mut [MindMap]) {
    maps.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn list_files(&self, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        use walkdir::WalkDir;

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(io::Error::other)?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == extension)
            {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Wall-clock implementation of [`Clock`].
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
