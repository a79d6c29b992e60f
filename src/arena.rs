//! Permanent (never-freed) allocation for symbol storage.
//!
//! `PermArena` is a chunked bump allocator: it carves aligned, zero-filled
//! blocks out of large chunks obtained from the global allocator, and never
//! frees anything. Blocks never move, so a `&'static SymbolNode` built on
//! top of one stays valid for the whole process even if the owning table
//! value is dropped (isolated test tables leak their chunks intentionally).
//!
//! The arena is not internally synchronized; the registry keeps it behind
//! the single insert mutex.

use std::alloc::{alloc_zeroed, handle_alloc_error, Layout};

/// Allocation granularity for arena blocks. Every block is rounded up to a
/// multiple of this and returned at least this aligned.
pub const ALLOC_ALIGN: usize = 8;

/// Default chunk size. A single over-sized request gets its own chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// Bump allocator handing out immortal, zero-initialized blocks.
pub struct PermArena {
    cursor: *mut u8,
    remaining: usize,
    chunks: usize,
    allocated: usize,
}

// Sound: the raw cursor is only touched by the holder of the registry's
// insert mutex, and the memory behind it is never freed.
unsafe impl Send for PermArena {}

impl PermArena {
    pub const fn new() -> Self {
        Self {
            cursor: std::ptr::null_mut(),
            remaining: 0,
            chunks: 0,
            allocated: 0,
        }
    }

    /// Allocate `size` bytes of zeroed, 8-byte-aligned, immortal memory.
    ///
    /// The only failure mode is exhaustion of the underlying allocator,
    /// which is fatal ([`handle_alloc_error`]): a runtime that can no longer
    /// create identifiers cannot usefully continue.
    pub fn alloc(&mut self, size: usize) -> *mut u8 {
        let size = align_up(size, ALLOC_ALIGN);
        if size > self.remaining {
            self.grow(size);
        }
        let block = self.cursor;
        // Safety: grow() guarantees at least `size` bytes behind cursor.
        self.cursor = unsafe { self.cursor.add(size) };
        self.remaining -= size;
        self.allocated += size;
        block
    }

    fn grow(&mut self, min: usize) {
        let chunk = min.max(CHUNK_SIZE);
        let layout = Layout::from_size_align(chunk, ALLOC_ALIGN)
            .expect("arena chunk size exceeds address space");
        // Safety: layout has non-zero size.
        let base = unsafe { alloc_zeroed(layout) };
        if base.is_null() {
            handle_alloc_error(layout);
        }
        // The tail of the previous chunk is abandoned, never reused.
        self.cursor = base;
        self.remaining = chunk;
        self.chunks += 1;
        log::trace!(
            "symbol arena grew: chunk #{} of {} bytes ({} bytes live)",
            self.chunks,
            chunk,
            self.allocated
        );
    }

    /// Total bytes handed out so far (after rounding).
    pub fn allocated_bytes(&self) -> usize {
        self.allocated
    }

    /// Number of chunks requested from the global allocator.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }
}

impl Default for PermArena {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
pub(crate) const fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 8), 16);
        assert_eq!(align_up(100, 8), 104);
    }

    #[test]
    fn test_alloc_alignment_and_zeroing() {
        let mut arena = PermArena::new();
        for size in [1, 7, 8, 15, 64, 255] {
            let p = arena.alloc(size);
            assert_eq!(p as usize % ALLOC_ALIGN, 0);
            let bytes = unsafe { std::slice::from_raw_parts(p, size) };
            assert!(bytes.iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_alloc_blocks_disjoint() {
        let mut arena = PermArena::new();
        let a = arena.alloc(16) as usize;
        let b = arena.alloc(16) as usize;
        let c = arena.alloc(16) as usize;
        assert!(b >= a + 16);
        assert!(c >= b + 16);
    }

    #[test]
    fn test_oversized_request_gets_own_chunk() {
        let mut arena = PermArena::new();
        let _ = arena.alloc(8);
        assert_eq!(arena.chunk_count(), 1);
        let p = arena.alloc(CHUNK_SIZE * 2);
        assert!(!p.is_null());
        assert_eq!(arena.chunk_count(), 2);
    }

    #[test]
    fn test_allocated_bytes_rounds_up() {
        let mut arena = PermArena::new();
        arena.alloc(1);
        arena.alloc(9);
        assert_eq!(arena.allocated_bytes(), 8 + 16);
    }

    #[test]
    fn test_blocks_survive_many_chunks() {
        let mut arena = PermArena::new();
        let first = arena.alloc(32);
        unsafe { *first = 0xAB };
        for _ in 0..8 {
            let _ = arena.alloc(CHUNK_SIZE);
        }
        // Earlier blocks never move.
        assert_eq!(unsafe { *first }, 0xAB);
    }
}
