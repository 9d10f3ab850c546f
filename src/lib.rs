//! # climatree
//!
//! An ordered in-memory store for timestamped sensor readings, backed by an
//! arena-allocated binary search tree.
//!
//! Readings are keyed by timestamp. Insertion order is arbitrary; in-order
//! iteration always yields ascending timestamps. The tree does not balance
//! itself, so height depends on insertion order — callers that control the
//! input (see [`sim`]) shuffle it before inserting.
//!
//! ## Example
//!
//! ```rust
//! use climatree::{Reading, SensorTree};
//!
//! let mut tree = SensorTree::new();
//! tree.insert(Reading { timestamp: 1001, temperature: 55, humidity: 60 }).unwrap();
//! tree.insert(Reading { timestamp: 1000, temperature: 43, humidity: 55 }).unwrap();
//!
//! assert_eq!(tree.find(1000).map(|r| r.temperature), Some(43));
//! let order: Vec<i64> = tree.iter().map(|r| r.timestamp).collect();
//! assert_eq!(order, vec![1000, 1001]);
//! ```

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::collections::TryReserveError;

use thiserror::Error;

pub mod sim;

/// Seconds since the Unix epoch. The surrounding application keys readings at
/// day granularity, but the store accepts any distinct timestamps.
pub type Timestamp = i64;

// =============================================================================
// Reading
// =============================================================================

/// A single sensor measurement. The timestamp is the sort key; the payload is
/// immutable once stored (duplicate-timestamp inserts are discarded, never
/// merged).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    pub timestamp: Timestamp,
    /// Temperature in whole degrees.
    pub temperature: u32,
    /// Relative humidity in whole percent.
    pub humidity: u32,
}

// =============================================================================
// Errors
// =============================================================================

/// Returned by [`SensorTree::insert`] when no node could be allocated.
///
/// A failed insert has no effect: the tree keeps its prior contents and every
/// operation remains usable afterwards.
#[derive(Debug, Error)]
pub enum InsertError {
    /// The host could not provide memory for one more node.
    #[error("failed to allocate storage for a new reading")]
    OutOfMemory(#[from] TryReserveError),
    /// The arena has exhausted its 32-bit index space.
    #[error("node arena is full")]
    ArenaFull,
}

// =============================================================================
// Node arena
// =============================================================================

/// Index of a node in the arena. 32 bits keeps the node footprint small; the
/// all-ones value encodes the empty subtree.
#[derive(Clone, Copy, PartialEq, Eq)]
struct NodeId(u32);

impl NodeId {
    const NIL: NodeId = NodeId(u32::MAX);

    #[inline]
    fn is_nil(self) -> bool {
        self == Self::NIL
    }

    #[inline]
    fn index(self) -> usize {
        debug_assert!(!self.is_nil());
        self.0 as usize
    }
}

#[derive(Clone, Copy)]
struct Node {
    reading: Reading,
    left: NodeId,
    right: NodeId,
}

// =============================================================================
// SensorTree
// =============================================================================

/// An unbalanced binary search tree keyed by [`Reading::timestamp`].
///
/// Nodes live in an arena and reference their children by index, so the
/// structure is single-owner throughout: the tree owns the arena, each node
/// is reachable from exactly one parent slot, and teardown releases the whole
/// arena at once. There is no single-node removal; [`SensorTree::clear`] is
/// the only destructor.
///
/// All operations are iterative. Worst-case descent is O(n) for a tree built
/// from monotonic timestamps (a chain), O(log n) expected for shuffled input;
/// neither case can overflow the call stack.
#[derive(Clone)]
pub struct SensorTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SensorTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId::NIL,
        }
    }

    /// Number of stored readings. Every arena slot is live (no removal), so
    /// this is just the arena length.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_nil()
    }

    fn alloc_node(&mut self, reading: Reading) -> Result<NodeId, InsertError> {
        if self.nodes.len() >= NodeId::NIL.0 as usize {
            return Err(InsertError::ArenaFull);
        }
        self.nodes.try_reserve(1)?;
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            reading,
            left: NodeId::NIL,
            right: NodeId::NIL,
        });
        Ok(id)
    }

    /// Inserts a reading, keyed by its timestamp.
    ///
    /// A reading whose timestamp is already present is silently discarded:
    /// the stored payload is not updated and the tree is unchanged. On
    /// allocation failure the insert simply did not happen.
    pub fn insert(&mut self, reading: Reading) -> Result<(), InsertError> {
        if self.root.is_nil() {
            self.root = self.alloc_node(reading)?;
            return Ok(());
        }

        // Descend to the attach point before allocating, so a duplicate key
        // costs no arena growth.
        let mut cur = self.root;
        loop {
            let node = &self.nodes[cur.index()];
            let next = match reading.timestamp.cmp(&node.reading.timestamp) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Ok(()),
            };
            if next.is_nil() {
                break;
            }
            cur = next;
        }

        let id = self.alloc_node(reading)?;
        let parent = &mut self.nodes[cur.index()];
        if reading.timestamp < parent.reading.timestamp {
            parent.left = id;
        } else {
            parent.right = id;
        }
        Ok(())
    }

    /// Looks up the reading stored for `timestamp`, if any. Absence is a
    /// normal result, not an error.
    pub fn find(&self, timestamp: Timestamp) -> Option<&Reading> {
        let mut cur = self.root;
        while !cur.is_nil() {
            let node = &self.nodes[cur.index()];
            match timestamp.cmp(&node.reading.timestamp) {
                Ordering::Less => cur = node.left,
                Ordering::Greater => cur = node.right,
                Ordering::Equal => return Some(&node.reading),
            }
        }
        None
    }

    #[inline]
    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.find(timestamp).is_some()
    }

    /// Visits every reading in ascending timestamp order. Each call walks the
    /// tree from scratch; see [`SensorTree::iter`] for the lazy form.
    pub fn for_each_in_order(&self, mut visit: impl FnMut(&Reading)) {
        for reading in self.iter() {
            visit(reading);
        }
    }

    /// Lazy ascending in-order iteration.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    /// Tears down the whole tree. The arena releases every node at once, so
    /// no node is freed while a parent still references it. Afterwards the
    /// handle is empty and ready for reuse; clearing an empty tree is a
    /// no-op.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = NodeId::NIL;
    }

    /// Height of the tree: the number of nodes on the longest root-to-leaf
    /// path. Zero for an empty tree, n for a degenerate chain of n nodes.
    pub fn height(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack: Vec<(NodeId, usize)> = Vec::new();
        if !self.root.is_nil() {
            stack.push((self.root, 1));
        }
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            let node = &self.nodes[id.index()];
            if !node.left.is_nil() {
                stack.push((node.left, depth + 1));
            }
            if !node.right.is_nil() {
                stack.push((node.right, depth + 1));
            }
        }
        max_depth
    }
}

impl Default for SensorTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SensorTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.iter()
                    .map(|r| (r.timestamp, (r.temperature, r.humidity))),
            )
            .finish()
    }
}

// =============================================================================
// In-order iterator
// =============================================================================

/// Ascending in-order iterator over a [`SensorTree`].
///
/// The stack holds the left spine of whatever remains to be visited: each
/// stacked node's own reading and right subtree are still pending.
pub struct Iter<'a> {
    tree: &'a SensorTree,
    stack: Vec<NodeId>,
}

impl<'a> Iter<'a> {
    fn push_left_spine(&mut self, mut id: NodeId) {
        while !id.is_nil() {
            self.stack.push(id);
            id = self.tree.nodes[id.index()].left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Reading;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.tree.nodes[id.index()];
        self.push_left_spine(node.right);
        Some(&node.reading)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // At least one pending reading per stacked node, never more than the
        // whole tree.
        (self.stack.len(), Some(self.tree.len()))
    }
}


#[cfg(test)]
mod proptests;
