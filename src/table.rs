//! The symbol registry: one tree root, one write lock, one gensym counter.
//!
//! [`SymbolTable`] glues the hasher, intern tree, and permanent arena
//! together and exposes the public operations. The concurrency contract:
//!
//! - **Reads** (`lookup`, the fast path of `intern`) never block and never
//!   take the mutex. They rely on acquire loads of child slots paired with
//!   the release store at publish time, so a reader sees a fully-formed
//!   node or no node at all.
//! - **Writes** (the slow path of `intern`) serialize on the single mutex,
//!   which also owns the arena. The lock is held only across the
//!   re-validation probe, one allocation, and the publish store — never
//!   across I/O or unbounded work.
//! - Once any thread has interned a name, every later `lookup`/`intern` of
//!   that name, from any thread, observes the same unique [`Sym`].
//!
//! A process-wide default table is available as [`SYMTAB`], with
//! [`Sym::intern`] / [`Sym::fresh`] as shorthand. Isolated instances
//! (`SymbolTable::new()`) behave identically and are what tests use.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicPtr, AtomicU32, AtomicUsize, Ordering};
use std::sync::LazyLock;

use crate::arena::PermArena;
use crate::error::{InternError, Result};
use crate::hash::hash_name;
use crate::symbol::{Sym, SymbolNode, MAX_NAME_LEN};
use crate::tree;

/// Worst-case decimal digit count of a `u32` gensym counter.
const GENSYM_DIGITS: usize = 10;

/// Gensym names at most this long are assembled on the stack.
const GENSYM_STACK_BUF: usize = 64;

/// Process-wide symbol registry.
pub struct SymbolTable {
    /// Root slot of the intern tree. Null until the first insert.
    root: AtomicPtr<SymbolNode>,

    /// Serializes all insertions and owns the storage they allocate from.
    write_lock: Mutex<PermArena>,

    /// Monotonic counter behind `fresh`/`fresh_tagged`. Wraparound at 2^32
    /// is accepted behavior, not an error.
    gensym_ctr: AtomicU32,

    /// Number of distinct symbols ever interned.
    count: AtomicUsize,

    /// Intern calls resolved to an existing node.
    hits: AtomicUsize,

    /// Intern calls that created a new node.
    misses: AtomicUsize,
}

impl SymbolTable {
    /// Create an empty, isolated table.
    pub const fn new() -> Self {
        Self {
            root: AtomicPtr::new(std::ptr::null_mut()),
            write_lock: Mutex::new(PermArena::new()),
            gensym_ctr: AtomicU32::new(0),
            count: AtomicUsize::new(0),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    // ------------------------------------------------------------------
    // Interning
    // ------------------------------------------------------------------

    /// Intern `name`, returning its unique symbol.
    ///
    /// Caller contract: `name` contains no NUL byte (debug-asserted). Use
    /// [`SymbolTable::intern_checked`] when the input is untrusted.
    ///
    /// # Errors
    ///
    /// `NameTooLong` if `name` exceeds [`MAX_NAME_LEN`], detected before
    /// any hashing, locking, or allocation.
    pub fn intern(&self, name: &[u8]) -> Result<Sym> {
        check_len(name.len())?;
        debug_assert!(
            !name.contains(&0),
            "interned names may not contain NUL; use intern_checked"
        );
        Ok(self.intern_name(name, hash_name(name)))
    }

    /// Intern `name`, rejecting embedded NUL bytes.
    ///
    /// # Errors
    ///
    /// `EmbeddedNul` if a NUL occurs within `name`, `NameTooLong` as for
    /// [`SymbolTable::intern`].
    pub fn intern_checked(&self, name: &[u8]) -> Result<Sym> {
        if let Some(offset) = name.iter().position(|&b| b == 0) {
            return Err(InternError::EmbeddedNul { offset });
        }
        self.intern(name)
    }

    /// Intern a text name. Convenience wrapper over the NUL-checked path:
    /// a `&str` carries its own length but may still contain NUL.
    pub fn intern_str(&self, text: &str) -> Result<Sym> {
        self.intern_checked(text.as_bytes())
    }

    /// Find the symbol for `name` without creating one.
    ///
    /// Pure read: no allocation, no locking.
    pub fn lookup(&self, name: &[u8]) -> Option<Sym> {
        tree::search(&self.root, name, hash_name(name)).ok().map(Sym)
    }

    /// Find-or-create with double-checked insertion. `name` is already
    /// validated and `hash` precomputed.
    fn intern_name(&self, name: &[u8], hash: u64) -> Sym {
        match tree::search(&self.root, name, hash) {
            // Fast path: no lock taken.
            Ok(node) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Sym(node)
            }
            Err(slot) => {
                let mut arena = self.write_lock.lock();
                // Another thread may have inserted this name between the
                // optimistic probe and the lock. Re-run the search from the
                // slot the probe located, not from the root.
                let slot = match tree::search(slot, name, hash) {
                    Ok(node) => {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        return Sym(node);
                    }
                    Err(slot) => slot,
                };
                let node = SymbolNode::alloc_in(&mut arena, name, hash);
                // Publish: after this store the node is visible to lockless
                // readers, and nothing but its child slots may ever change.
                slot.store(node as *const _ as *mut _, Ordering::Release);
                self.count.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                Sym(node)
            }
        }
    }

    // ------------------------------------------------------------------
    // Gensym
    // ------------------------------------------------------------------

    /// Intern a fresh synthetic name of the form `##<counter>`.
    ///
    /// The `##` prefix cannot occur in user-written identifiers, and the
    /// counter makes every call unique (modulo `u32` wraparound).
    pub fn fresh(&self) -> Sym {
        let ctr = self.gensym_ctr.fetch_add(1, Ordering::Relaxed);
        let mut digits = [0u8; GENSYM_DIGITS];
        let start = fmt_u32(&mut digits, ctr);
        let ndigits = GENSYM_DIGITS - start;

        let mut buf = [0u8; 2 + GENSYM_DIGITS];
        buf[0] = b'#';
        buf[1] = b'#';
        buf[2..2 + ndigits].copy_from_slice(&digits[start..]);
        let name = &buf[..2 + ndigits];
        self.intern_name(name, hash_name(name))
    }

    /// Intern a fresh tagged synthetic name of the form `##<tag>#<counter>`.
    ///
    /// # Errors
    ///
    /// `EmbeddedNul` if `tag` contains a NUL byte; `NameTooLong` if the
    /// total name (checked against the worst-case digit count, before any
    /// other work) would exceed [`MAX_NAME_LEN`].
    pub fn fresh_tagged(&self, tag: &[u8]) -> Result<Sym> {
        if let Some(offset) = tag.iter().position(|&b| b == 0) {
            return Err(InternError::EmbeddedNul { offset });
        }
        let worst = 2 + tag.len() + 1 + GENSYM_DIGITS;
        if worst > MAX_NAME_LEN {
            return Err(InternError::NameTooLong {
                len: worst,
                max: MAX_NAME_LEN,
            });
        }

        let ctr = self.gensym_ctr.fetch_add(1, Ordering::Relaxed);
        let mut digits = [0u8; GENSYM_DIGITS];
        let start = fmt_u32(&mut digits, ctr);
        let digits = &digits[start..];
        let total = 2 + tag.len() + 1 + digits.len();

        // Short names assemble on the stack, long tags in a temporary heap
        // buffer released after interning.
        let mut stack = [0u8; GENSYM_STACK_BUF];
        let mut heap = Vec::new();
        let buf: &mut [u8] = if total <= GENSYM_STACK_BUF {
            &mut stack[..total]
        } else {
            heap.resize(total, 0);
            &mut heap
        };
        buf[0] = b'#';
        buf[1] = b'#';
        buf[2..2 + tag.len()].copy_from_slice(tag);
        buf[2 + tag.len()] = b'#';
        buf[3 + tag.len()..].copy_from_slice(digits);

        Ok(self.intern_name(buf, hash_name(buf)))
    }

    /// Snapshot the gensym counter, for external checkpoint tooling.
    pub fn gensym_counter(&self) -> u32 {
        self.gensym_ctr.load(Ordering::Relaxed)
    }

    /// Restore a previously snapshotted gensym counter.
    pub fn set_gensym_counter(&self, value: u32) {
        log::debug!("gensym counter set to {value}");
        self.gensym_ctr.store(value, Ordering::Relaxed);
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Read-only snapshot of the current tree root, for tooling that
    /// enumerates interned names. Never a mutation entry point: `Sym` only
    /// exposes read accessors.
    pub fn root(&self) -> Option<Sym> {
        let p = self.root.load(Ordering::Acquire);
        // Safety: a non-null root was published fully initialized.
        unsafe { p.as_ref().map(Sym) }
    }

    /// Depth-first enumeration of every symbol reachable from the current
    /// root snapshot. Concurrent inserts may or may not appear.
    pub fn iter(&self) -> SymIter {
        SymIter {
            stack: self.root().into_iter().collect(),
        }
    }

    /// Number of distinct symbols interned so far.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Table statistics for profiling.
    pub fn stats(&self) -> TableStats {
        let arena = self.write_lock.lock();
        TableStats {
            symbols: self.count.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            arena_bytes: arena.allocated_bytes(),
            arena_chunks: arena.chunk_count(),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Format `value` in decimal, right-aligned into `buf`, returning the index
/// of the first digit.
fn fmt_u32(buf: &mut [u8; GENSYM_DIGITS], mut value: u32) -> usize {
    let mut i = buf.len();
    loop {
        i -= 1;
        buf[i] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    i
}

#[inline]
fn check_len(len: usize) -> Result<()> {
    if len > MAX_NAME_LEN {
        return Err(InternError::NameTooLong {
            len,
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Statistics about a symbol table, in the spirit of a profiler counter
/// dump: cheap to collect, monotonic, racy under concurrency.
#[derive(Clone, Copy, Debug, Default)]
pub struct TableStats {
    /// Distinct symbols interned.
    pub symbols: usize,
    /// Intern calls that found an existing symbol.
    pub hits: usize,
    /// Intern calls that created a new symbol.
    pub misses: usize,
    /// Bytes handed out by the permanent arena.
    pub arena_bytes: usize,
    /// Chunks the arena has requested from the global allocator.
    pub arena_chunks: usize,
}

impl TableStats {
    /// Fraction of intern calls resolved without an insertion.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Depth-first iterator over a tree snapshot. See [`SymbolTable::iter`].
pub struct SymIter {
    stack: Vec<Sym>,
}

impl Iterator for SymIter {
    type Item = Sym;

    fn next(&mut self) -> Option<Sym> {
        let sym = self.stack.pop()?;
        if let Some(left) = sym.left() {
            self.stack.push(left);
        }
        if let Some(right) = sym.right() {
            self.stack.push(right);
        }
        Some(sym)
    }
}

/// The process-wide symbol table.
///
/// Initialized on first use; never torn down. Most callers go through the
/// [`Sym`] shorthand constructors rather than touching this directly.
pub static SYMTAB: LazyLock<SymbolTable> = LazyLock::new(SymbolTable::new);

impl Sym {
    /// Intern `text` in the process-wide table.
    pub fn intern(text: &str) -> Result<Sym> {
        SYMTAB.intern_str(text)
    }

    /// Fresh gensym from the process-wide table.
    pub fn fresh() -> Sym {
        SYMTAB.fresh()
    }
}

static_assertions::assert_impl_all!(SymbolTable: Send, Sync);
