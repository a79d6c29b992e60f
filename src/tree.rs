//! Lock-free search over the intern tree.
//!
//! The tree is a binary search tree over immortal [`SymbolNode`]s, ordered
//! by a major key of the 64-bit name hash and a minor key of the byte
//! content. Child slots are `AtomicPtr`s that transition exactly once from
//! null to a final node pointer; searches read them with acquire ordering
//! and the insert path publishes with release ordering, so a traversal
//! either sees a fully initialized node or no node at all.
//!
//! Only searching lives here. Insertion (allocation plus the single release
//! store) belongs to the registry, which serializes writers on one mutex.

use std::cmp::Ordering as ByteOrder;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::symbol::SymbolNode;

/// A child slot (or the root slot) of the intern tree.
pub(crate) type Slot = AtomicPtr<SymbolNode>;

/// Walk the tree from `slot` looking for `name` with precomputed `hash`.
///
/// Returns the matching node, or on a miss the empty slot where the probe
/// would attach. The insert path re-runs the search from that slot after
/// taking the write lock, so a racing insert of the same name is always
/// re-discovered without rescanning from the root.
///
/// Performs no locking and no writes; safe to run concurrently with other
/// searches and with inserts.
pub(crate) fn search<'a>(
    mut slot: &'a Slot,
    name: &[u8],
    hash: u64,
) -> Result<&'static SymbolNode, &'a Slot> {
    loop {
        let p = slot.load(Ordering::Acquire);
        if p.is_null() {
            return Err(slot);
        }
        // Safety: a non-null slot was published with release ordering after
        // full initialization, and the node is immortal.
        let node: &'static SymbolNode = unsafe { &*p };

        let go_right = if hash == node.hash_value() {
            match name_order(name, node.name()) {
                None => return Ok(node),
                Some(ByteOrder::Less) => false,
                Some(_) => true,
            }
        } else {
            hash > node.hash_value()
        };

        slot = if go_right {
            node.right_slot()
        } else {
            node.left_slot()
        };
    }
}

/// Minor-key comparison on a hash tie: byte comparison truncated to the
/// probe's length, with an exact-length confirmation.
///
/// Returns `None` on an exact match. A stored name that is shorter than the
/// probe, or of which the probe is a strict prefix, is not a match and
/// orders the probe to the right, matching a NUL-terminated truncated
/// compare (the stored terminator sorts below any probe byte; a zero
/// truncated compare that fails the terminator check falls through right).
fn name_order(probe: &[u8], stored: &[u8]) -> Option<ByteOrder> {
    let shared = probe.len().min(stored.len());
    match probe[..shared].cmp(&stored[..shared]) {
        ByteOrder::Equal if probe.len() == stored.len() => None,
        ByteOrder::Equal => Some(ByteOrder::Greater),
        diff => Some(diff),
    }
}
