/// Fixed-capacity vertex storage guarded by an explicit lock protocol
///
/// A buffer must be locked over a range before its vertices can be read or
/// written, mirroring the map/unmap step device-resident memory needs.
/// Software buffers obey the same protocol so call sites stay storage-agnostic.
use nalgebra::{Point3, Vector2, Vector3};
use parking_lot::Mutex;

use crate::error::{PrimError, Result};
use crate::geometry::{Color, RawVertex, Vertex};

/// Where the vertex data lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageClass {
    #[default]
    Software,
    Video,
}

/// Access requested when locking a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    pub fn can_read(self) -> bool {
        matches!(self, AccessMode::Read | AccessMode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, AccessMode::Write | AccessMode::ReadWrite)
    }
}

/// What `unlock` does when nothing is locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnlockPolicy {
    /// Fail with `NotLocked`.
    #[default]
    Strict,
    /// Log and succeed.
    Lenient,
}

/// A held lock over `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockRange {
    pub start: usize,
    pub end: usize,
    pub access: AccessMode,
}

impl LockRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// Empty ranges hold no vertices and never overlap anything.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        start < end && !self.is_empty() && start < self.end && self.start < end
    }
}

struct BufferState {
    vertices: Vec<Vertex>,
    locks: Vec<LockRange>,
}

impl BufferState {
    fn lock_at(&self, index: usize) -> Option<LockRange> {
        self.locks.iter().copied().find(|lock| lock.contains(index))
    }

    /// True when every index of `[start, end)` lies in some held lock.
    fn covers(&self, start: usize, end: usize) -> bool {
        let mut sorted = self.locks.clone();
        sorted.sort_by_key(|lock| lock.start);

        let mut cursor = start;
        for lock in sorted {
            if cursor >= end {
                break;
            }
            if lock.start <= cursor && lock.end > cursor {
                cursor = lock.end;
            }
        }
        cursor >= end
    }
}

/// A fixed-capacity vertex buffer
///
/// Lock state lives behind a mutex so independent threads may hold disjoint
/// range locks on the same buffer. Lock calls never block on each other:
/// an overlapping request fails with `AlreadyLocked`.
pub struct VertexBuffer {
    storage: StorageClass,
    capacity: usize,
    unlock_policy: UnlockPolicy,
    state: Mutex<BufferState>,
}

impl VertexBuffer {
    pub fn create(capacity: usize, storage: StorageClass) -> Result<Self> {
        if capacity == 0 {
            return Err(PrimError::InvalidArgument(
                "vertex buffer capacity must be positive".to_string(),
            ));
        }

        let mut vertices = Vec::new();
        vertices.try_reserve_exact(capacity).map_err(|err| {
            PrimError::InvalidArgument(format!("cannot allocate {} vertices: {}", capacity, err))
        })?;
        vertices.resize(capacity, Vertex::default());

        log::debug!("created {:?} vertex buffer with {} vertices", storage, capacity);

        Ok(Self {
            storage,
            capacity,
            unlock_policy: UnlockPolicy::default(),
            state: Mutex::new(BufferState {
                vertices,
                locks: Vec::new(),
            }),
        })
    }

    pub fn with_unlock_policy(mut self, policy: UnlockPolicy) -> Self {
        self.unlock_policy = policy;
        self
    }

    /// Releases the buffer. A locked buffer is handed back inside the error.
    pub fn destroy(self) -> std::result::Result<(), DestroyError> {
        if self.is_locked() {
            return Err(DestroyError { buffer: self });
        }
        log::debug!("destroyed vertex buffer with {} vertices", self.capacity);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn storage(&self) -> StorageClass {
        self.storage
    }

    pub fn unlock_policy(&self) -> UnlockPolicy {
        self.unlock_policy
    }

    /// Locks the full buffer.
    pub fn lock(&self, access: AccessMode) -> Result<LockRange> {
        self.lock_range(0, self.capacity, access)
    }

    pub fn lock_range(&self, start: usize, end: usize, access: AccessMode) -> Result<LockRange> {
        if start > end || end > self.capacity {
            return Err(PrimError::out_of_range(start, end, self.capacity));
        }

        let lock = LockRange { start, end, access };
        if lock.is_empty() {
            // covers no vertex, so there is nothing to hold
            return Ok(lock);
        }

        let mut state = self.state.lock();
        if state.locks.iter().any(|held| held.overlaps(start, end)) {
            return Err(PrimError::AlreadyLocked { start, end });
        }

        state.locks.push(lock);
        Ok(lock)
    }

    /// Releases every held lock.
    pub fn unlock(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.locks.is_empty() {
            return self.unlock_unlocked();
        }
        state.locks.clear();
        Ok(())
    }

    /// Releases one lock previously returned by `lock` or `lock_range`.
    pub fn unlock_range(&self, lock: LockRange) -> Result<()> {
        if lock.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock();
        match state.locks.iter().position(|held| *held == lock) {
            Some(pos) => {
                state.locks.swap_remove(pos);
                Ok(())
            }
            None => self.unlock_unlocked(),
        }
    }

    fn unlock_unlocked(&self) -> Result<()> {
        match self.unlock_policy {
            UnlockPolicy::Strict => Err(PrimError::NotLocked),
            UnlockPolicy::Lenient => {
                log::warn!("unlock requested on a range that is not locked");
                Ok(())
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        !self.state.lock().locks.is_empty()
    }

    /// Span `(start, end)` covering every held lock.
    pub fn locked_range(&self) -> Option<(usize, usize)> {
        let state = self.state.lock();
        let start = state.locks.iter().map(|lock| lock.start).min()?;
        let end = state.locks.iter().map(|lock| lock.end).max()?;
        Some((start, end))
    }

    /// Whether all of `[start, end)` is covered by held locks.
    pub fn range_is_locked(&self, start: usize, end: usize) -> bool {
        if start > end || end > self.capacity {
            return false;
        }
        self.state.lock().covers(start, end)
    }

    pub fn locks(&self) -> Vec<LockRange> {
        self.state.lock().locks.clone()
    }

    pub fn get_vertex(&self, index: usize) -> Result<Vertex> {
        let state = self.state.lock();
        self.check_access(&state, index, AccessMode::can_read)?;
        Ok(state.vertices[index])
    }

    pub fn set_vertex(&self, index: usize, vertex: Vertex) -> Result<()> {
        self.modify(index, |slot| *slot = vertex)
    }

    pub fn set_position(&self, index: usize, x: f32, y: f32, z: f32) -> Result<()> {
        self.modify(index, |slot| slot.position = Point3::new(x, y, z))
    }

    pub fn set_normal(&self, index: usize, nx: f32, ny: f32, nz: f32) -> Result<()> {
        self.modify(index, |slot| slot.normal = Vector3::new(nx, ny, nz))
    }

    pub fn set_uv(&self, index: usize, u: f32, v: f32) -> Result<()> {
        self.modify(index, |slot| slot.uv = Vector2::new(u, v))
    }

    pub fn set_color(&self, index: usize, color: Color) -> Result<()> {
        self.modify(index, |slot| slot.color = color)
    }

    /// Copies `[start, end)` for drawing. The buffer must be unlocked.
    pub fn snapshot(&self, start: usize, end: usize) -> Result<Vec<Vertex>> {
        if start > end || end > self.capacity {
            return Err(PrimError::out_of_range(start, end, self.capacity));
        }
        let state = self.state.lock();
        if !state.locks.is_empty() {
            return Err(PrimError::ResourceBusy);
        }
        Ok(state.vertices[start..end].to_vec())
    }

    pub fn snapshot_raw(&self, start: usize, end: usize) -> Result<Vec<RawVertex>> {
        Ok(self
            .snapshot(start, end)?
            .iter()
            .map(Vertex::to_raw)
            .collect())
    }

    /// Opens a write scope over `[start, end)`.
    ///
    /// Reuses held write-capable locks when they already cover the range,
    /// otherwise takes a temporary `ReadWrite` lock released when the scope drops.
    pub fn write_scope(&self, start: usize, end: usize) -> Result<WriteScope<'_>> {
        if start > end || end > self.capacity {
            return Err(PrimError::out_of_range(start, end, self.capacity));
        }

        let writable = {
            let state = self.state.lock();
            state.covers(start, end)
                && (self.storage == StorageClass::Software
                    || state
                        .locks
                        .iter()
                        .filter(|lock| lock.overlaps(start, end))
                        .all(|lock| lock.access.can_write()))
        };

        let temporary = if writable {
            None
        } else {
            Some(self.lock_range(start, end, AccessMode::ReadWrite)?)
        };

        Ok(WriteScope {
            buffer: self,
            start,
            end,
            temporary,
        })
    }

    fn modify(&self, index: usize, f: impl FnOnce(&mut Vertex)) -> Result<()> {
        let mut state = self.state.lock();
        self.check_access(&state, index, AccessMode::can_write)?;
        f(&mut state.vertices[index]);
        Ok(())
    }

    fn check_access(
        &self,
        state: &BufferState,
        index: usize,
        allowed: fn(AccessMode) -> bool,
    ) -> Result<()> {
        if index >= self.capacity {
            return Err(PrimError::out_of_range(index, index.saturating_add(1), self.capacity));
        }
        let lock = state.lock_at(index).ok_or(PrimError::NotLocked)?;
        if self.storage == StorageClass::Video && !allowed(lock.access) {
            return Err(PrimError::AccessDenied {
                index,
                access: lock.access,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for VertexBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("storage", &self.storage)
            .field("capacity", &self.capacity)
            .field("unlock_policy", &self.unlock_policy)
            .field("locks", &self.locks())
            .finish()
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        if !self.state.get_mut().locks.is_empty() {
            log::warn!("vertex buffer dropped while locked");
        }
    }
}

/// Returned by `destroy` on a locked buffer, carrying the buffer back.
#[derive(Debug, thiserror::Error)]
#[error("Buffer is locked and cannot be destroyed")]
pub struct DestroyError {
    buffer: VertexBuffer,
}

impl DestroyError {
    pub fn kind(&self) -> PrimError {
        PrimError::ResourceBusy
    }

    pub fn into_buffer(self) -> VertexBuffer {
        self.buffer
    }
}

impl From<DestroyError> for PrimError {
    fn from(_: DestroyError) -> Self {
        PrimError::ResourceBusy
    }
}

/// Writable window onto a buffer range; see [`VertexBuffer::write_scope`].
pub struct WriteScope<'a> {
    buffer: &'a VertexBuffer,
    start: usize,
    end: usize,
    temporary: Option<LockRange>,
}

impl WriteScope<'_> {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn get_vertex(&self, index: usize) -> Result<Vertex> {
        self.check(index)?;
        self.buffer.get_vertex(index)
    }

    pub fn set_position(&self, index: usize, x: f32, y: f32, z: f32) -> Result<()> {
        self.check(index)?;
        self.buffer.set_position(index, x, y, z)
    }

    pub fn set_vertex(&self, index: usize, vertex: Vertex) -> Result<()> {
        self.check(index)?;
        self.buffer.set_vertex(index, vertex)
    }

    pub fn set_color(&self, index: usize, color: Color) -> Result<()> {
        self.check(index)?;
        self.buffer.set_color(index, color)
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.start || index >= self.end {
            return Err(PrimError::out_of_range(index, index.saturating_add(1), self.end));
        }
        Ok(())
    }
}

impl Drop for WriteScope<'_> {
    fn drop(&mut self) {
        if let Some(lock) = self.temporary.take() {
            if let Err(err) = self.buffer.unlock_range(lock) {
                log::warn!("failed to release temporary lock: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    fn sample_vertex() -> Vertex {
        Vertex::new(1.0, 2.0, 3.0, 0.0, 1.0, 0.0)
            .with_color(Color::new(0.1, 0.2, 0.3, 0.4))
            .with_uv(0.5, 0.6)
    }

    #[test]
    fn test_create_then_destroy() {
        for capacity in [1, 2, 17, 256] {
            let buffer = VertexBuffer::create(capacity, StorageClass::Software).unwrap();
            assert_eq!(buffer.capacity(), capacity);
            assert!(buffer.destroy().is_ok());
        }
    }

    #[test]
    fn test_create_rejects_zero_capacity() {
        let result = VertexBuffer::create(0, StorageClass::Video);
        assert!(matches!(result, Err(PrimError::InvalidArgument(_))));
    }

    #[test]
    fn test_accessors_fail_while_unlocked() {
        let buffer = VertexBuffer::create(4, StorageClass::Software).unwrap();
        let v = sample_vertex();

        assert!(matches!(buffer.set_vertex(0, v), Err(PrimError::NotLocked)));
        assert!(matches!(buffer.get_vertex(0), Err(PrimError::NotLocked)));
        assert!(matches!(buffer.set_position(1, 0.0, 0.0, 0.0), Err(PrimError::NotLocked)));
        assert!(matches!(buffer.set_normal(1, 0.0, 0.0, 1.0), Err(PrimError::NotLocked)));
        assert!(matches!(buffer.set_uv(2, 0.0, 0.0), Err(PrimError::NotLocked)));
        assert!(matches!(buffer.set_color(3, Color::white()), Err(PrimError::NotLocked)));
    }

    #[test]
    fn test_range_lock_round_trip() {
        let buffer = VertexBuffer::create(8, StorageClass::Software).unwrap();
        buffer.lock_range(2, 5, AccessMode::Write).unwrap();

        let v = sample_vertex();
        buffer.set_vertex(4, v).unwrap();
        assert_eq!(buffer.get_vertex(4).unwrap(), v);
    }

    #[test]
    fn test_index_outside_lock_is_rejected() {
        let buffer = VertexBuffer::create(8, StorageClass::Software).unwrap();
        buffer.lock_range(2, 5, AccessMode::ReadWrite).unwrap();

        assert!(matches!(buffer.set_vertex(5, sample_vertex()), Err(PrimError::NotLocked)));
        assert!(matches!(
            buffer.get_vertex(8),
            Err(PrimError::OutOfRange { start: 8, end: 9, capacity: 8 })
        ));
    }

    #[test]
    fn test_inverted_range_is_out_of_range() {
        let buffer = VertexBuffer::create(8, StorageClass::Software).unwrap();
        assert!(matches!(
            buffer.lock_range(5, 2, AccessMode::Write),
            Err(PrimError::OutOfRange { .. })
        ));
        assert!(matches!(
            buffer.lock_range(0, 9, AccessMode::Write),
            Err(PrimError::OutOfRange { .. })
        ));
        assert!(!buffer.is_locked());
    }

    #[test]
    fn test_double_lock_fails() {
        let buffer = VertexBuffer::create(8, StorageClass::Software).unwrap();
        buffer.lock(AccessMode::Read).unwrap();
        assert!(matches!(
            buffer.lock(AccessMode::Read),
            Err(PrimError::AlreadyLocked { start: 0, end: 8 })
        ));
        assert!(matches!(
            buffer.lock_range(3, 4, AccessMode::Write),
            Err(PrimError::AlreadyLocked { .. })
        ));
    }

    #[test]
    fn test_video_write_only_lock_denies_reads() {
        let buffer = VertexBuffer::create(4, StorageClass::Video).unwrap();
        buffer.lock(AccessMode::Write).unwrap();
        buffer.set_vertex(1, sample_vertex()).unwrap();

        assert!(matches!(
            buffer.get_vertex(1),
            Err(PrimError::AccessDenied { index: 1, access: AccessMode::Write })
        ));

        buffer.unlock().unwrap();
        buffer.lock(AccessMode::Read).unwrap();
        assert_eq!(buffer.get_vertex(1).unwrap(), sample_vertex());
        assert!(matches!(
            buffer.set_uv(1, 0.0, 0.0),
            Err(PrimError::AccessDenied { index: 1, access: AccessMode::Read })
        ));
    }

    #[test]
    fn test_per_field_setters_touch_one_field() {
        let buffer = VertexBuffer::create(2, StorageClass::Software).unwrap();
        buffer.lock(AccessMode::ReadWrite).unwrap();
        buffer.set_vertex(0, sample_vertex()).unwrap();

        buffer.set_position(0, 9.0, 8.0, 7.0).unwrap();
        buffer.set_color(0, Color::black()).unwrap();

        let v = buffer.get_vertex(0).unwrap();
        assert_eq!(v.position, Point3::new(9.0, 8.0, 7.0));
        assert_eq!(v.color, Color::black());
        assert_eq!(v.normal, sample_vertex().normal);
        assert_eq!(v.uv, sample_vertex().uv);

        buffer.set_normal(0, 0.0, 0.0, -1.0).unwrap();
        let v = buffer.get_vertex(0).unwrap();
        assert_eq!(v.normal, Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(v.position, Point3::new(9.0, 8.0, 7.0));
        assert_eq!(v.uv, sample_vertex().uv);

        buffer.set_uv(0, 0.25, 0.75).unwrap();
        let v = buffer.get_vertex(0).unwrap();
        assert_eq!(v.uv, Vector2::new(0.25, 0.75));
        assert_eq!(v.normal, Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(v.color, Color::black());
    }

    #[test]
    fn test_huge_index_is_out_of_range() {
        let buffer = VertexBuffer::create(4, StorageClass::Software).unwrap();
        buffer.lock(AccessMode::ReadWrite).unwrap();

        assert!(matches!(
            buffer.get_vertex(usize::MAX),
            Err(PrimError::OutOfRange { start: usize::MAX, end: usize::MAX, capacity: 4 })
        ));
        assert!(matches!(
            buffer.set_color(usize::MAX, Color::white()),
            Err(PrimError::OutOfRange { .. })
        ));
        buffer.unlock().unwrap();

        let scope = buffer.write_scope(0, 2).unwrap();
        assert!(matches!(
            scope.set_position(usize::MAX, 0.0, 0.0, 0.0),
            Err(PrimError::OutOfRange { end: usize::MAX, .. })
        ));
    }

    #[test]
    fn test_unallocatable_capacity_is_rejected() {
        let result = VertexBuffer::create(usize::MAX, StorageClass::Software);
        assert!(matches!(result, Err(PrimError::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_lock_holds_nothing() {
        let buffer = VertexBuffer::create(8, StorageClass::Software).unwrap();

        let empty = buffer.lock_range(3, 3, AccessMode::Write).unwrap();
        buffer.lock_range(3, 3, AccessMode::Write).unwrap();
        buffer.lock_range(0, 0, AccessMode::Read).unwrap();
        assert!(empty.is_empty());
        assert!(!buffer.is_locked());
        assert!(buffer.locks().is_empty());
        assert!(buffer.unlock_range(empty).is_ok());

        let full = buffer.lock(AccessMode::Write).unwrap();
        assert!(buffer.lock_range(4, 4, AccessMode::Read).is_ok());
        assert_eq!(buffer.locks(), vec![full]);
        assert!(!full.overlaps(4, 4));

        buffer.unlock().unwrap();
        assert!(buffer.destroy().is_ok());
    }

    #[test]
    fn test_destroy_while_locked() {
        let buffer = VertexBuffer::create(4, StorageClass::Software).unwrap();
        buffer.lock(AccessMode::Write).unwrap();

        let err = buffer.destroy().unwrap_err();
        assert!(matches!(err.kind(), PrimError::ResourceBusy));

        let buffer = err.into_buffer();
        buffer.unlock().unwrap();
        assert!(buffer.destroy().is_ok());
    }

    #[test]
    fn test_unlock_policies() {
        let strict = VertexBuffer::create(4, StorageClass::Software).unwrap();
        assert!(matches!(strict.unlock(), Err(PrimError::NotLocked)));

        let lenient = VertexBuffer::create(4, StorageClass::Software)
            .unwrap()
            .with_unlock_policy(UnlockPolicy::Lenient);
        assert!(lenient.unlock().is_ok());
        assert!(lenient.unlock().is_ok());
    }

    #[test]
    fn test_lock_queries() {
        let buffer = VertexBuffer::create(10, StorageClass::Software).unwrap();
        assert_eq!(buffer.locked_range(), None);

        let first = buffer.lock_range(1, 3, AccessMode::Write).unwrap();
        buffer.lock_range(3, 6, AccessMode::Read).unwrap();

        assert!(buffer.is_locked());
        assert_eq!(buffer.locked_range(), Some((1, 6)));
        assert!(buffer.range_is_locked(1, 6));
        assert!(buffer.range_is_locked(2, 4));
        assert!(!buffer.range_is_locked(0, 2));
        assert!(!buffer.range_is_locked(5, 7));

        buffer.unlock_range(first).unwrap();
        assert_eq!(buffer.locked_range(), Some((3, 6)));
        assert!(matches!(buffer.unlock_range(first), Err(PrimError::NotLocked)));

        buffer.unlock().unwrap();
        assert!(!buffer.is_locked());
    }

    #[test]
    fn test_snapshot_requires_unlocked_buffer() {
        let buffer = VertexBuffer::create(3, StorageClass::Software).unwrap();
        buffer.lock(AccessMode::Write).unwrap();
        buffer.set_vertex(2, sample_vertex()).unwrap();
        assert!(matches!(buffer.snapshot(0, 3), Err(PrimError::ResourceBusy)));

        buffer.unlock().unwrap();
        let vertices = buffer.snapshot(1, 3).unwrap();
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[1], sample_vertex());
        assert_eq!(buffer.snapshot_raw(2, 3).unwrap()[0], sample_vertex().to_raw());
    }

    #[test]
    fn test_write_scope_takes_and_releases_temporary_lock() {
        let buffer = VertexBuffer::create(6, StorageClass::Video).unwrap();
        {
            let scope = buffer.write_scope(1, 4).unwrap();
            assert!(buffer.range_is_locked(1, 4));
            scope.set_position(2, 1.0, 1.0, 0.0).unwrap();
            assert!(matches!(
                scope.set_position(4, 0.0, 0.0, 0.0),
                Err(PrimError::OutOfRange { .. })
            ));
        }
        assert!(!buffer.is_locked());

        let held = buffer.lock(AccessMode::ReadWrite).unwrap();
        {
            let scope = buffer.write_scope(0, 6).unwrap();
            scope.set_position(0, 5.0, 5.0, 0.0).unwrap();
        }
        assert_eq!(buffer.locks(), vec![held]);
        assert_eq!(buffer.get_vertex(2).unwrap().position, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_write_scope_conflicts_with_read_lock() {
        let buffer = VertexBuffer::create(6, StorageClass::Video).unwrap();
        buffer.lock_range(0, 2, AccessMode::Read).unwrap();
        assert!(matches!(
            buffer.write_scope(0, 4),
            Err(PrimError::AlreadyLocked { .. })
        ));
    }

    #[test]
    fn test_concurrent_disjoint_locks_both_succeed() {
        let buffer = VertexBuffer::create(16, StorageClass::Software).unwrap();
        let barrier = Barrier::new(2);

        let (a, b) = std::thread::scope(|s| {
            let a = s.spawn(|| {
                barrier.wait();
                buffer.lock_range(0, 8, AccessMode::Write)
            });
            let b = s.spawn(|| {
                barrier.wait();
                buffer.lock_range(8, 16, AccessMode::Write)
            });
            (a.join().unwrap(), b.join().unwrap())
        });

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert!(buffer.range_is_locked(0, 16));
    }

    #[test]
    fn test_concurrent_overlapping_locks_exactly_one_wins() {
        for _ in 0..32 {
            let buffer = VertexBuffer::create(16, StorageClass::Software).unwrap();
            let barrier = Barrier::new(2);

            let results = std::thread::scope(|s| {
                let a = s.spawn(|| {
                    barrier.wait();
                    buffer.lock_range(0, 10, AccessMode::Write)
                });
                let b = s.spawn(|| {
                    barrier.wait();
                    buffer.lock_range(5, 16, AccessMode::Write)
                });
                [a.join().unwrap(), b.join().unwrap()]
            });

            let wins = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(wins, 1);
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(PrimError::AlreadyLocked { .. }))));
            buffer.unlock().unwrap();
        }
    }
}
