//! Integration tests for EditorSession: lifecycle and debounced autosave.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use mindtree::application::{EditorSession, SessionOptions};
use mindtree::domain::{Edge, MapId, MindMap, NodeId, NodePatch};
use mindtree::infrastructure::traits::MapStore;
use mindtree::infrastructure::MemoryStore;
use mindtree::util::testing::{self, ManualClock};

const DELAY: Duration = Duration::from_millis(800);

/// Memory store that counts writes and can be told to fail them.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

impl MapStore for CountingStore {
    fn load(&self, id: &MapId) -> io::Result<Option<MindMap>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(io::Error::other("storage unavailable"));
        }
        self.inner.load(id)
    }

    fn save(&self, map: &mut MindMap) -> io::Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(io::Error::other("quota exceeded"));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(map)
    }

    fn delete(&self, id: &MapId) -> io::Result<()> {
        self.inner.delete(id)
    }

    fn list(&self) -> io::Result<Vec<MindMap>> {
        self.inner.list()
    }
}

struct Fixture {
    store: Arc<CountingStore>,
    clock: Arc<ManualClock>,
    id: MapId,
}

impl Fixture {
    fn new() -> Self {
        testing::init_test_setup();
        let store = Arc::new(CountingStore::default());
        let mut map = MindMap::new("Plans", Utc::now());
        store.inner.save(&mut map).unwrap();
        Self {
            store,
            clock: Arc::new(ManualClock::new()),
            id: map.id,
        }
    }

    fn open(&self) -> Option<EditorSession> {
        EditorSession::open(
            self.store.clone(),
            self.clock.clone(),
            SessionOptions::default(),
            &self.id,
        )
    }

    fn saves(&self) -> usize {
        self.store.saves.load(Ordering::SeqCst)
    }

    fn stored(&self) -> MindMap {
        self.store.inner.load(&self.id).unwrap().unwrap()
    }
}

// ============================================================
// Lifecycle
// ============================================================

#[test]
fn given_stored_map_when_opening_then_session_is_clean() {
    let fx = Fixture::new();

    let session = fx.open().unwrap();

    assert_eq!(session.id(), &fx.id);
    assert_eq!(session.name(), "Plans");
    assert_eq!(session.tree().node_count(), 1);
    assert!(!session.is_dirty());
    assert_eq!(fx.saves(), 0);
}

#[test]
fn given_unknown_id_when_opening_then_none() {
    let fx = Fixture::new();
    let session = EditorSession::open(
        fx.store.clone(),
        fx.clock.clone(),
        SessionOptions::default(),
        &MapId::new("map-missing"),
    );
    assert!(session.is_none());
}

#[test]
fn given_failing_storage_when_opening_then_degrades_to_none() {
    let fx = Fixture::new();
    fx.store.fail_loads.store(true, Ordering::SeqCst);

    assert!(fx.open().is_none());
}

#[test]
fn given_stored_map_with_broken_tree_when_opening_then_none() {
    // Arrange: edge to a node that is not in the collection
    let fx = Fixture::new();
    let mut map = fx.stored();
    let root = map.nodes[0].id.clone();
    map.edges.push(Edge::new(root, NodeId::new("ghost")));
    fx.store.inner.save(&mut map).unwrap();

    // Act / Assert
    assert!(fx.open().is_none());
}

// ============================================================
// Debounce
// ============================================================

#[test]
fn given_mutation_when_delay_not_elapsed_then_no_write() {
    // Arrange
    let fx = Fixture::new();
    let mut session = fx.open().unwrap();
    let root = session.tree().root_id().clone();

    // Act
    session.create_child(&root, "A").unwrap();
    fx.clock.advance(DELAY - Duration::from_millis(1));

    // Assert
    assert!(!session.tick());
    assert!(session.is_dirty());
    assert_eq!(fx.saves(), 0);
}

#[test]
fn given_mutation_when_delay_elapsed_then_single_write() {
    // Arrange
    let fx = Fixture::new();
    let mut session = fx.open().unwrap();
    let root = session.tree().root_id().clone();
    session.create_child(&root, "A").unwrap();

    // Act
    fx.clock.advance(DELAY);
    let wrote = session.tick();

    // Assert
    assert!(wrote);
    assert!(!session.is_dirty());
    assert_eq!(fx.saves(), 1);
    assert_eq!(fx.stored().nodes.len(), 2);
    assert!(!session.tick());
    assert_eq!(fx.saves(), 1);
}

#[test]
fn given_burst_of_edits_when_settled_then_one_write_with_final_state() {
    // Arrange
    let fx = Fixture::new();
    let mut session = fx.open().unwrap();
    let root = session.tree().root_id().clone();

    // Act: each edit lands before the previous deadline
    let a = session.create_child(&root, "A").unwrap();
    for i in 0..5 {
        fx.clock.advance(Duration::from_millis(500));
        assert!(!session.tick());
        session.update_node(&a, NodePatch::default().text(format!("A{}", i)));
    }
    fx.clock.advance(DELAY);
    session.tick();

    // Assert
    assert_eq!(fx.saves(), 1);
    let stored = fx.stored();
    let node = stored.nodes.iter().find(|n| n.id == a).unwrap();
    assert_eq!(node.text, "A4");
}

#[test]
fn given_rejected_operations_when_ticking_then_nothing_pending() {
    let fx = Fixture::new();
    let mut session = fx.open().unwrap();
    let root = session.tree().root_id().clone();

    assert!(session.create_child(&NodeId::new("nope"), "x").is_none());
    assert!(session.delete_subtree(&root).is_empty());
    assert!(!session.reparent(&root, &root));
    assert!(session.update_node(&root, NodePatch::default()));

    assert!(!session.is_dirty());
    fx.clock.advance(DELAY * 2);
    assert!(!session.tick());
    assert_eq!(fx.saves(), 0);
}

#[test]
fn given_pending_changes_when_closing_then_flushes() {
    let fx = Fixture::new();
    let mut session = fx.open().unwrap();
    let root = session.tree().root_id().clone();
    session.create_child(&root, "A").unwrap();
    session.rename("Renamed");

    let map = session.close();

    assert_eq!(fx.saves(), 1);
    assert_eq!(map.name, "Renamed");
    assert_eq!(fx.stored().name, "Renamed");
    assert_eq!(fx.stored().nodes.len(), 2);
}

#[test]
fn given_clean_session_when_closing_then_no_write() {
    let fx = Fixture::new();
    let session = fx.open().unwrap();

    session.close();

    assert_eq!(fx.saves(), 0);
}

// ============================================================
// Persistence failures
// ============================================================

#[test]
fn given_failing_save_when_flushing_then_stays_dirty_and_retries() {
    // Arrange
    let fx = Fixture::new();
    let mut session = fx.open().unwrap();
    let root = session.tree().root_id().clone();
    session.create_child(&root, "A").unwrap();
    fx.store.fail_saves.store(true, Ordering::SeqCst);

    // Act
    let first = session.flush();

    // Assert: the session keeps working
    assert!(!first);
    assert!(session.is_dirty());
    assert!(session.create_child(&root, "B").is_some());

    fx.store.fail_saves.store(false, Ordering::SeqCst);
    assert!(session.flush());
    assert_eq!(fx.stored().nodes.len(), 3);
}

#[test]
fn given_failing_save_when_try_flushing_then_error_is_returned() {
    let fx = Fixture::new();
    let mut session = fx.open().unwrap();
    let root = session.tree().root_id().clone();
    session.create_child(&root, "A").unwrap();
    fx.store.fail_saves.store(true, Ordering::SeqCst);

    let err = session.try_flush().unwrap_err();

    assert_eq!(err.to_string(), "quota exceeded");
    assert!(session.is_dirty());
}

#[test]
fn given_write_when_flushing_then_updated_at_refreshed() {
    let fx = Fixture::new();
    let mut session = fx.open().unwrap();
    let before = session.updated_at();
    let root = session.tree().root_id().clone();
    session.create_child(&root, "A").unwrap();

    session.flush();

    assert!(session.updated_at() >= before);
    assert_eq!(session.updated_at(), fx.stored().updated_at);
}
