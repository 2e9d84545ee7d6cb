//! # darts-index
//!
//! A compact, immutable double-array trie over byte-string keys, each mapped
//! to a 31-bit value. The whole trie is one flat array of 32-bit units that
//! can be written to disk as is and memory-mapped back.
//!
//! Supported queries:
//!
//! - exact match of a whole key,
//! - common-prefix search, eager ([`DoubleArray::common_prefix_search`]) or
//!   lazy ([`DoubleArray::common_prefix_iter`]),
//! - resumable byte-by-byte traversal ([`DoubleArray::traverse`]), for callers
//!   that walk the trie in step with another automaton.
//!
//! ## Example
//!
//! ```rust
//! use darts_index::{DoubleArray, Match};
//!
//! let da = DoubleArray::build(&["a", "ab", "cd"], Some(&[10, 20, 30][..])).unwrap();
//!
//! assert_eq!(da.exact_match(b"cd"), Some(Match { value: 30, end: 2 }));
//! assert_eq!(
//!     da.common_prefix_search(b"abc", 0, 10),
//!     vec![Match { value: 10, end: 1 }, Match { value: 20, end: 2 }]
//! );
//!
//! let mut bytes = Vec::new();
//! da.save(&mut bytes).unwrap();
//! let loaded = DoubleArray::from_bytes(bytes).unwrap();
//! assert_eq!(loaded.exact_match(b"ab").map(|m| m.value), Some(20));
//! ```
//!
//! ## Layout
//!
//! Unit `0` is the root. A node's children live at
//! `node ^ offset(node) ^ byte`, and every unit stores the label of the edge
//! that enters it, so a lookup confirms each step by comparing labels. See
//! [`unit`] for the bit layout.
//!
//! The array is trusted: it must have been produced by [`DoubleArrayBuilder`]
//! or loaded from an unmodified [`DoubleArray::save`].

#![deny(unsafe_op_in_unsafe_fn)]

mod array;
mod builder;
mod error;
mod persist;
mod search;
pub mod unit;

pub use array::DoubleArray;
pub use builder::{DoubleArrayBuilder, KeySet};
pub use error::{Error, Result};
pub use persist::{LoadMode, LoadOptions};
pub use search::{CommonPrefixCursor, Match, TraverseResult, Traversal};
pub use unit::{Unit, MAX_VALUE};

#[cfg(test)]
mod proptests;
