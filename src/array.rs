//! Flat unit storage.
//!
//! A [`DoubleArray`] owns exactly one byte buffer (an owned `Vec<u8>` or a
//! read-only memory map) holding `4 * size()` little-endian bytes. Units are
//! decoded from it on demand; there is no second typed copy that could drift
//! from the bytes.
//!
//! The buffer is never mutated after construction, so a `DoubleArray` can be
//! shared by any number of reader threads.

use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::unit::Unit;

pub(crate) const UNIT_SIZE: usize = std::mem::size_of::<u32>();

pub(crate) enum Storage {
    Empty,
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Storage {
    #[inline]
    fn bytes(&self) -> &[u8] {
        match self {
            Storage::Empty => &[],
            Storage::Owned(bytes) => bytes.as_slice(),
            Storage::Mapped(map) => &map[..],
        }
    }
}

/// An immutable double-array trie.
///
/// # Trust
///
/// Queries decode whatever bytes they are given. The array must come from
/// [`DoubleArrayBuilder`](crate::DoubleArrayBuilder) or from an unmodified
/// [`save`](DoubleArray::save). Addresses computed during a query are not
/// validated against anything but the buffer length, so a corrupt array
/// yields wrong answers or a panic on an out-of-range unit, never undefined
/// memory access.
pub struct DoubleArray {
    storage: Storage,
}

impl DoubleArray {
    pub(crate) fn from_storage(storage: Storage) -> Result<Self> {
        let len = storage.bytes().len();
        if len % UNIT_SIZE != 0 {
            return Err(Error::UnalignedLength(len));
        }
        Ok(Self { storage })
    }

    /// Wraps an owned little-endian byte buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_storage(Storage::Owned(bytes))
    }

    pub(crate) fn from_units(units: &[Unit]) -> Self {
        let mut bytes = Vec::with_capacity(units.len() * UNIT_SIZE);
        for unit in units {
            bytes.extend_from_slice(&unit.raw().to_le_bytes());
        }
        Self {
            storage: Storage::Owned(bytes),
        }
    }

    /// Number of units. This is not the number of keys.
    #[inline]
    pub fn size(&self) -> usize {
        self.storage.bytes().len() / UNIT_SIZE
    }

    /// Number of bytes backing the array; always `4 * size()`.
    #[inline]
    pub fn total_size(&self) -> usize {
        UNIT_SIZE * self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Whether the bytes come from a memory map rather than an owned buffer.
    pub fn is_mapped(&self) -> bool {
        matches!(self.storage, Storage::Mapped(_))
    }

    /// Releases the backing buffer. The array then has size 0 and must not
    /// be queried again; queries on a cleared array panic.
    pub fn clear(&mut self) {
        self.storage = Storage::Empty;
    }

    /// Raw little-endian bytes, exactly as they are persisted.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.bytes()
    }

    /// Decodes the unit at `index`.
    ///
    /// # Panics
    ///
    /// If `index >= self.size()`.
    #[inline]
    pub fn unit(&self, index: usize) -> Unit {
        let at = index * UNIT_SIZE;
        let b = &self.storage.bytes()[at..at + UNIT_SIZE];
        Unit::from_raw(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Word view over the whole buffer.
    pub fn units(&self) -> impl ExactSizeIterator<Item = Unit> + '_ {
        self.storage
            .bytes()
            .chunks_exact(UNIT_SIZE)
            .map(|b| Unit::from_raw(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
    }
}

impl Default for DoubleArray {
    fn default() -> Self {
        Self {
            storage: Storage::Empty,
        }
    }
}

impl std::fmt::Debug for DoubleArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoubleArray")
            .field("size", &self.size())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}
