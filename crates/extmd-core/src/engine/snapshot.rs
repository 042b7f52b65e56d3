use super::error::EngineError;
use super::ids::EngineId;
use crate::core::io::error::FrameStoreError;
use crate::core::models::frame::Frame;
use nalgebra::{Matrix3, Point3, Vector3};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::trace;

/// What a snapshot needs from its engine to load its data.
///
/// Implemented by the shared core of
/// [`ExternalEngine`](super::external::ExternalEngine).
pub trait FrameSource: Send + Sync {
    fn engine_id(&self) -> EngineId;

    fn engine_name(&self) -> &str;

    /// Resolved path of the file holding segment `file_number`.
    fn segment_path(&self, file_number: usize) -> PathBuf;

    /// Reads one frame, reusing the engine's open reader where possible.
    fn read_frame_data(&self, path: &Path, file_position: usize) -> Result<Frame, FrameStoreError>;
}

/// A simulation state stored in an external trajectory file.
///
/// Internally this only stores the file number, the frame position within
/// that file, and a non-owning handle to the engine. Positions, velocities
/// and box vectors are read from disk on first access (read-through) and
/// cached together as a single immutable [`Frame`].
///
/// Two snapshots are equal when they point at the same frame of the same
/// engine; cached contents play no part.
pub struct ExternalMdSnapshot {
    file_number: usize,
    file_position: usize,
    engine_id: EngineId,
    engine_name: Arc<str>,
    engine: Weak<dyn FrameSource>,
    cache: Mutex<Option<Arc<Frame>>>,
}

impl ExternalMdSnapshot {
    pub(crate) fn from_source(
        file_number: usize,
        file_position: usize,
        engine: Weak<dyn FrameSource>,
        engine_id: EngineId,
        engine_name: Arc<str>,
    ) -> Self {
        Self {
            file_number,
            file_position,
            engine_id,
            engine_name,
            engine,
            cache: Mutex::new(None),
        }
    }

    pub fn file_number(&self) -> usize {
        self.file_number
    }

    pub fn file_position(&self) -> usize {
        self.file_position
    }

    pub fn engine_id(&self) -> EngineId {
        self.engine_id
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    fn cache(&self) -> MutexGuard<'_, Option<Arc<Frame>>> {
        // The guarded value is replaced whole, so a poisoned lock still holds a consistent state.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_loaded(&self) -> bool {
        self.cache().is_some()
    }

    /// Loads the frame from disk unless it is already cached.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EngineDropped`] if the engine no longer exists,
    /// or [`EngineError::Storage`] if the frame cannot be read.
    pub fn load(&self) -> Result<Arc<Frame>, EngineError> {
        let mut cache = self.cache();
        if let Some(frame) = cache.as_ref() {
            return Ok(Arc::clone(frame));
        }

        let engine = self.engine.upgrade().ok_or(EngineError::EngineDropped)?;
        let path = engine.segment_path(self.file_number);
        trace!(path = %path.display(), position = self.file_position, "Loading snapshot data.");
        let frame = Arc::new(engine.read_frame_data(&path, self.file_position)?);
        *cache = Some(Arc::clone(&frame));
        Ok(frame)
    }

    /// Drops the cached data; the next access reads it again.
    pub fn invalidate(&self) {
        *self.cache() = None;
    }

    /// The whole frame (read-through).
    pub fn frame(&self) -> Result<Arc<Frame>, EngineError> {
        self.load()
    }

    /// Atomic positions, copied out of the cache (read-through).
    pub fn coordinates(&self) -> Result<Vec<Point3<f32>>, EngineError> {
        Ok(self.load()?.coordinates.clone())
    }

    /// Atomic velocities, copied out of the cache (read-through).
    pub fn velocities(&self) -> Result<Vec<Vector3<f32>>, EngineError> {
        Ok(self.load()?.velocities.clone())
    }

    /// Box vectors as matrix rows (read-through).
    pub fn box_vectors(&self) -> Result<Matrix3<f32>, EngineError> {
        Ok(self.load()?.box_vectors)
    }
}

impl Clone for ExternalMdSnapshot {
    fn clone(&self) -> Self {
        Self {
            file_number: self.file_number,
            file_position: self.file_position,
            engine_id: self.engine_id,
            engine_name: Arc::clone(&self.engine_name),
            engine: Weak::clone(&self.engine),
            cache: Mutex::new(self.cache().clone()),
        }
    }
}

impl PartialEq for ExternalMdSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.file_number == other.file_number
            && self.file_position == other.file_position
            && self.engine_id == other.engine_id
    }
}

impl Eq for ExternalMdSnapshot {}

impl Hash for ExternalMdSnapshot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file_number.hash(state);
        self.file_position.hash(state);
        self.engine_id.hash(state);
    }
}

impl fmt::Debug for ExternalMdSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalMdSnapshot")
            .field("file_number", &self.file_number)
            .field("file_position", &self.file_position)
            .field("engine", &self.engine_name)
            .field("engine_id", &self.engine_id)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl fmt::Display for ExternalMdSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExternalMdSnapshot(file_number={}, file_position={}, engine={})",
            self.file_number, self.file_position, self.engine_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        id: EngineId,
        reads: AtomicUsize,
    }

    impl FakeSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: EngineId::next(),
                reads: AtomicUsize::new(0),
            })
        }
    }

    trait SnapshotOf {
        fn snapshot(&self, number: usize, position: usize) -> ExternalMdSnapshot;
    }

    impl SnapshotOf for Arc<FakeSource> {
        fn snapshot(&self, number: usize, position: usize) -> ExternalMdSnapshot {
            let weak: Weak<dyn FrameSource> = Arc::downgrade(self) as Weak<dyn FrameSource>;
            ExternalMdSnapshot::from_source(number, position, weak, self.id, Arc::from("fake"))
        }
    }

    impl FrameSource for FakeSource {
        fn engine_id(&self) -> EngineId {
            self.id
        }
        fn engine_name(&self) -> &str {
            "fake"
        }
        fn segment_path(&self, file_number: usize) -> PathBuf {
            PathBuf::from(format!("{file_number}.trr"))
        }
        fn read_frame_data(&self, _path: &Path, position: usize) -> Result<Frame, FrameStoreError> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            let mut frame = Frame::zeros(1);
            frame.coordinates[0] = Point3::new(position as f32, n as f32, 0.0);
            Ok(frame)
        }
    }

    #[test]
    fn construction_performs_no_io() {
        let source = FakeSource::new();
        let snap = source.snapshot(1, 2);
        assert!(!snap.is_loaded());
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn load_is_idempotent() {
        let source = FakeSource::new();
        let snap = source.snapshot(1, 4);
        let first = snap.load().unwrap();
        let second = snap.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(snap.coordinates().unwrap()[0].x, 4.0);
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalidate_triggers_exactly_one_fresh_read() {
        let source = FakeSource::new();
        let snap = source.snapshot(1, 0);
        assert_eq!(snap.coordinates().unwrap()[0].y, 1.0);

        snap.invalidate();
        assert!(!snap.is_loaded());
        assert_eq!(snap.coordinates().unwrap()[0].y, 2.0);
        let _ = snap.velocities().unwrap();
        let _ = snap.box_vectors().unwrap();
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn equality_ignores_cache_and_respects_engine_identity() {
        let source = FakeSource::new();
        let other = FakeSource::new();
        let a = source.snapshot(3, 4);
        let b = source.snapshot(3, 4);
        a.load().unwrap();

        assert_eq!(a, b);
        assert_ne!(a, source.snapshot(3, 5));
        assert_ne!(a, source.snapshot(2, 4));
        assert_ne!(a, other.snapshot(3, 4));

        let set: HashSet<_> = [a.clone(), b, other.snapshot(3, 4)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn clone_shares_loaded_data() {
        let source = FakeSource::new();
        let snap = source.snapshot(1, 1);
        snap.load().unwrap();
        let copy = snap.clone();
        assert!(copy.is_loaded());
        copy.load().unwrap();
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_outlives_engine_but_cannot_load() {
        let source = FakeSource::new();
        let snap = source.snapshot(1, 1);
        let same = source.snapshot(1, 1);
        drop(source);

        assert_eq!(snap, same);
        assert!(matches!(snap.load(), Err(EngineError::EngineDropped)));
    }

    #[test]
    fn display_names_file_coordinates() {
        let source = FakeSource::new();
        assert_eq!(
            source.snapshot(3, 4).to_string(),
            "ExternalMdSnapshot(file_number=3, file_position=4, engine=fake)"
        );
    }
}
