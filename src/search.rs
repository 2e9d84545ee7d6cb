//! Queries over a [`DoubleArray`].
//!
//! All four walks share one step: from node `pos`, the child reached through
//! byte `b` sits at `pos ^ offset(unit(pos)) ^ b`, and the step is valid only
//! if that unit's label equals `b`. A node with a leaf keeps its value in the
//! unit at `pos ^ offset(unit(pos))`.
//!
//! None of the walks allocate beyond their result, and none keep state
//! outside the call or the cursor that owns it.

use crate::array::DoubleArray;
use crate::error::{Error, Result};
use crate::unit::Unit;

/// A stored key found in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match {
    pub value: u32,
    /// Index one past the last matched byte of the input. With a search
    /// offset of 0 this is the length of the matched key.
    pub end: usize,
}

/// Outcome of a [`DoubleArray::traverse`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Traversal {
    /// Every requested byte matched and the reached node ends a key.
    Value(u32),
    /// Every requested byte matched but no key ends at the reached node.
    Incomplete,
    /// A byte had no edge. The walk stopped in front of it.
    Mismatch,
}

/// Resumable state returned by [`DoubleArray::traverse`].
///
/// Passing `offset` and `node_pos` back into `traverse` continues the walk
/// as if it had never been interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraverseResult {
    pub status: Traversal,
    /// Index into the key of the next unconsumed byte. On
    /// [`Traversal::Mismatch`] this is the byte that failed.
    pub offset: usize,
    /// Last node reached by a successful step (or the start node).
    pub node_pos: usize,
}

impl TraverseResult {
    /// Integer code of the status: the stored value, `-1` for
    /// [`Traversal::Incomplete`], `-2` for [`Traversal::Mismatch`].
    pub fn result(&self) -> i64 {
        match self.status {
            Traversal::Value(value) => i64::from(value),
            Traversal::Incomplete => -1,
            Traversal::Mismatch => -2,
        }
    }
}

impl DoubleArray {
    /// Child of `node_pos` through `byte`, if that edge exists.
    #[inline]
    fn child(&self, node_pos: usize, unit: Unit, byte: u8) -> Option<(usize, Unit)> {
        let pos = node_pos ^ unit.offset() as usize ^ byte as usize;
        let child = self.unit(pos);
        (child.label() == u32::from(byte)).then_some((pos, child))
    }

    #[inline]
    fn leaf_value(&self, node_pos: usize, unit: Unit) -> u32 {
        self.unit(node_pos ^ unit.offset() as usize).value()
    }

    /// Looks up `key` as a whole.
    ///
    /// ```rust
    /// use darts_index::DoubleArray;
    ///
    /// let da = DoubleArray::build(&["a", "ab", "cd"], Some(&[10, 20, 30][..])).unwrap();
    /// assert_eq!(da.exact_match(b"ab").map(|m| (m.value, m.end)), Some((20, 2)));
    /// assert_eq!(da.exact_match(b"ac"), None);
    /// ```
    pub fn exact_match(&self, key: &[u8]) -> Option<Match> {
        let mut node_pos = 0;
        let mut unit = self.unit(node_pos);
        for &byte in key {
            (node_pos, unit) = self.child(node_pos, unit, byte)?;
        }
        if !unit.has_leaf() {
            return None;
        }
        Some(Match {
            value: self.leaf_value(node_pos, unit),
            end: key.len(),
        })
    }

    /// [`exact_match`](Self::exact_match) as a `(value, length)` pair, with
    /// `(-1, 0)` meaning "not found".
    pub fn exact_match_raw(&self, key: &[u8]) -> (i64, usize) {
        match self.exact_match(key) {
            Some(m) => (i64::from(m.value), m.end),
            None => (-1, 0),
        }
    }

    /// Every stored key that is a prefix of `key[offset..]`, shortest first,
    /// keeping at most `max_results` of them.
    pub fn common_prefix_search(&self, key: &[u8], offset: usize, max_results: usize) -> Vec<Match> {
        self.common_prefix_iter(key, offset)
            .take(max_results)
            .collect()
    }

    /// Lazy form of [`common_prefix_search`](Self::common_prefix_search).
    pub fn common_prefix_iter<'a>(&'a self, key: &'a [u8], offset: usize) -> CommonPrefixCursor<'a> {
        let root = self.unit(0);
        CommonPrefixCursor {
            array: self,
            key,
            offset,
            node_pos: root.offset() as usize,
            exhausted: false,
        }
    }

    /// Walks `key[offset..]` starting at node `node_pos` (0 is the root).
    ///
    /// Splitting a walk into several calls, each fed the `offset` and
    /// `node_pos` of the previous result, ends in the same result as one
    /// call over all bytes. After a [`Traversal::Mismatch`] the returned
    /// state is the node in front of the failing byte, so the caller can try
    /// a different continuation from there.
    ///
    /// ```rust
    /// use darts_index::{DoubleArray, Traversal};
    ///
    /// let da = DoubleArray::build(&["a", "ab", "cd"], Some(&[10, 20, 30][..])).unwrap();
    /// let r = da.traverse(b"ac", 0, 0);
    /// assert_eq!((r.status, r.offset), (Traversal::Mismatch, 1));
    /// let r = da.traverse(b"b", 0, r.node_pos);
    /// assert_eq!((r.status, r.offset), (Traversal::Value(20), 1));
    /// ```
    pub fn traverse(&self, key: &[u8], offset: usize, node_pos: usize) -> TraverseResult {
        let mut node_pos = node_pos;
        let mut unit = self.unit(node_pos);
        let mut at = offset;
        while let Some(&byte) = key.get(at) {
            match self.child(node_pos, unit, byte) {
                Some(next) => (node_pos, unit) = next,
                None => {
                    return TraverseResult {
                        status: Traversal::Mismatch,
                        offset: at,
                        node_pos,
                    };
                }
            }
            at += 1;
        }

        let status = if unit.has_leaf() {
            Traversal::Value(self.leaf_value(node_pos, unit))
        } else {
            Traversal::Incomplete
        };
        TraverseResult {
            status,
            offset: at,
            node_pos,
        }
    }
}

/// Forward-only cursor over the stored prefixes of a key.
///
/// Yields the same matches, in the same order, as an unbounded
/// [`DoubleArray::common_prefix_search`]. Once it reports the end it stays
/// at the end.
pub struct CommonPrefixCursor<'a> {
    array: &'a DoubleArray,
    key: &'a [u8],
    offset: usize,
    /// Child block of the current node, i.e. already XORed with its offset.
    node_pos: usize,
    exhausted: bool,
}

impl CommonPrefixCursor<'_> {
    /// The next match, or `Ok(None)` the first time there are no more.
    /// Calling again after `Ok(None)` is a logic error and fails with
    /// [`Error::CursorExhausted`].
    pub fn try_next(&mut self) -> Result<Option<Match>> {
        if self.exhausted {
            return Err(Error::CursorExhausted);
        }
        let found = self.advance();
        self.exhausted = found.is_none();
        Ok(found)
    }

    fn advance(&mut self) -> Option<Match> {
        while let Some(&byte) = self.key.get(self.offset) {
            self.node_pos ^= byte as usize;
            let unit = self.array.unit(self.node_pos);
            if unit.label() != u32::from(byte) {
                // Nothing longer can match once an edge is missing.
                self.offset = self.key.len();
                return None;
            }

            self.node_pos ^= unit.offset() as usize;
            self.offset += 1;
            if unit.has_leaf() {
                return Some(Match {
                    value: self.array.unit(self.node_pos).value(),
                    end: self.offset,
                });
            }
        }
        None
    }
}

impl Iterator for CommonPrefixCursor<'_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        if self.exhausted {
            return None;
        }
        self.try_next().ok().flatten()
    }
}

impl std::iter::FusedIterator for CommonPrefixCursor<'_> {}
