//! Symbol storage layout and the public `Sym` handle.
//!
//! A [`SymbolNode`] is the unique, immutable, process-lifetime object behind
//! one interned name. The node header and the name bytes live in a single
//! immortal arena block:
//!
//! ```text
//! ┌────────┬────────┬────────┬────────┬───────────────┬────┬─────┐
//! │  hash  │  left  │ right  │  len   │  name bytes   │ \0 │ pad │
//! │  u64   │ atomic │ atomic │ usize  │   len bytes   │    │ →8  │
//! └────────┴────────┴────────┴────────┴───────────────┴────┴─────┘
//! ```
//!
//! Once a node is published into the tree, only its child slots may change,
//! and each of those changes exactly once: null → final child pointer, with
//! release ordering. Everything else is frozen at construction.
//!
//! [`Sym`] is the 8-byte `Copy` handle callers pass around. Equality is
//! pointer identity, which is exactly the interning guarantee: equal names
//! anywhere in the process resolve to the same node.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::arena::{align_up, PermArena, ALLOC_ALIGN};

/// Maximum representable name length in bytes: bounded by the address space
/// minus the per-node overhead (header plus terminator).
pub const MAX_NAME_LEN: usize = isize::MAX as usize - mem::size_of::<SymbolNode>() - 1;

/// Interned symbol node. Arena-owned, immortal, immutable once published.
#[repr(C)]
pub struct SymbolNode {
    hash: u64,
    left: AtomicPtr<SymbolNode>,
    right: AtomicPtr<SymbolNode>,
    len: usize,
    // name bytes + NUL terminator follow the header inline
}

// The arena hands out 8-byte-aligned blocks; the header must fit that.
static_assertions::const_assert!(mem::align_of::<SymbolNode>() <= ALLOC_ALIGN);

impl SymbolNode {
    /// Allocate and initialize a node in the arena. The caller (the insert
    /// path, under the registry mutex) publishes it into the tree afterward.
    pub(crate) fn alloc_in(arena: &mut PermArena, name: &[u8], hash: u64) -> &'static SymbolNode {
        let nbytes = align_up(mem::size_of::<SymbolNode>() + name.len() + 1, ALLOC_ALIGN);
        let block = arena.alloc(nbytes) as *mut SymbolNode;
        // Safety: the block is aligned for SymbolNode, large enough for the
        // header plus name plus terminator, zero-filled, and never freed.
        unsafe {
            ptr::write(
                block,
                SymbolNode {
                    hash,
                    left: AtomicPtr::new(ptr::null_mut()),
                    right: AtomicPtr::new(ptr::null_mut()),
                    len: name.len(),
                },
            );
            let name_dst = (block as *mut u8).add(mem::size_of::<SymbolNode>());
            ptr::copy_nonoverlapping(name.as_ptr(), name_dst, name.len());
            // Terminator byte is already zero from the arena.
            &*block
        }
    }

    /// Precomputed two-stage hash of the name.
    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// The raw name bytes (terminator excluded).
    #[inline]
    pub fn name(&self) -> &[u8] {
        // Safety: `len` bytes were copied directly after the header at
        // construction and are never written again.
        unsafe {
            let base = (self as *const SymbolNode as *const u8).add(mem::size_of::<SymbolNode>());
            std::slice::from_raw_parts(base, self.len)
        }
    }

    #[inline]
    pub(crate) fn left_slot(&self) -> &AtomicPtr<SymbolNode> {
        &self.left
    }

    #[inline]
    pub(crate) fn right_slot(&self) -> &AtomicPtr<SymbolNode> {
        &self.right
    }
}

impl fmt::Debug for SymbolNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolNode")
            .field("name", &String::from_utf8_lossy(self.name()))
            .field("hash", &self.hash)
            .finish()
    }
}

/// Handle to an interned symbol.
///
/// `Copy`, pointer-sized, and comparable in O(1) by identity. Handles are
/// non-owning: the registry's arena owns every node for the process
/// lifetime, so a `Sym` never dangles.
#[derive(Clone, Copy)]
pub struct Sym(pub(crate) &'static SymbolNode);

impl Sym {
    /// The raw name bytes.
    #[inline]
    pub fn name(&self) -> &'static [u8] {
        // Lifetime promotion is sound: the node is immortal.
        let node: &'static SymbolNode = self.0;
        node.name()
    }

    /// The name as UTF-8 text, when it is valid UTF-8.
    #[inline]
    pub fn as_str(&self) -> Option<&'static str> {
        std::str::from_utf8(self.name()).ok()
    }

    /// Length of the name in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }

    /// Precomputed hash of the name.
    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.0.hash
    }

    /// Left child in the intern tree, for read-only enumeration.
    pub fn left(&self) -> Option<Sym> {
        let p = self.0.left.load(Ordering::Acquire);
        // Safety: a non-null child slot always refers to a fully published,
        // immortal node.
        unsafe { p.as_ref().map(Sym) }
    }

    /// Right child in the intern tree, for read-only enumeration.
    pub fn right(&self) -> Option<Sym> {
        let p = self.0.right.load(Ordering::Acquire);
        // Safety: as for `left`.
        unsafe { p.as_ref().map(Sym) }
    }

    /// Raw node address, for identity-based diagnostics.
    #[inline]
    pub fn as_ptr(&self) -> *const SymbolNode {
        self.0
    }
}

impl PartialEq for Sym {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.0, other.0)
    }
}

impl Eq for Sym {}

impl Hash for Sym {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.name()))
    }
}

impl fmt::Debug for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sym({})", String::from_utf8_lossy(self.name()))
    }
}

static_assertions::assert_impl_all!(Sym: Send, Sync);
static_assertions::assert_impl_all!(SymbolNode: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_name;

    fn mk(arena: &mut PermArena, name: &[u8]) -> Sym {
        Sym(SymbolNode::alloc_in(arena, name, hash_name(name)))
    }

    #[test]
    fn test_node_layout_roundtrip() {
        let mut arena = PermArena::new();
        let s = mk(&mut arena, b"hello");
        assert_eq!(s.name(), b"hello");
        assert_eq!(s.len(), 5);
        assert_eq!(s.hash_value(), hash_name(b"hello"));
        assert!(s.left().is_none());
        assert!(s.right().is_none());
    }

    #[test]
    fn test_empty_name() {
        let mut arena = PermArena::new();
        let s = mk(&mut arena, b"");
        assert_eq!(s.name(), b"");
        assert!(s.is_empty());
    }

    #[test]
    fn test_identity_equality() {
        let mut arena = PermArena::new();
        let a = mk(&mut arena, b"same");
        let b = mk(&mut arena, b"same");
        // Equality is identity, not content: these are distinct nodes. The
        // registry is what guarantees one node per name.
        assert_ne!(a, b);
        assert_eq!(a, a);
        let copy = a;
        assert_eq!(a, copy);
    }

    #[test]
    fn test_display_and_debug() {
        let mut arena = PermArena::new();
        let s = mk(&mut arena, b"hello");
        assert_eq!(format!("{s}"), "hello");
        assert_eq!(format!("{s:?}"), "Sym(hello)");
    }

    #[test]
    fn test_as_str_non_utf8() {
        let mut arena = PermArena::new();
        let s = mk(&mut arena, &[0xff, 0xfe]);
        assert!(s.as_str().is_none());
        assert_eq!(s.name(), &[0xff, 0xfe]);
    }

    #[test]
    fn test_terminator_byte_present() {
        let mut arena = PermArena::new();
        let s = mk(&mut arena, b"abc");
        let base = s.as_ptr() as *const u8;
        let term = unsafe { *base.add(mem::size_of::<SymbolNode>() + 3) };
        assert_eq!(term, 0);
    }
}
