//! Node-unit codec.
//!
//! Every slot of a double array is one 32-bit unit. Which fields are
//! meaningful depends on the role of the slot:
//!
//! ```text
//!  31  30 ............ 10   9    8    7 ...... 0
//! +---+------------------+----+----+-----------+
//! | L |  base            | X  | H  |  label    |   node unit
//! +---+------------------+----+----+-----------+
//! | 1 |  value (bits 0..30)                    |   leaf-value unit
//! +---+----------------------------------------+
//! ```
//!
//! - `H` (bit 8): the node terminates a stored key.
//! - `X` (bit 9): the base is scaled by 256 when decoding the offset.
//! - `L` (bit 31): set only on leaf-value and empty units, so their decoded
//!   label can never equal a byte in `0..=255`.

use crate::error::{Error, Result};

const HAS_LEAF_BIT: u32 = 1 << 8;
const EXTENSION_BIT: u32 = 1 << 9;
const OFFSET_SHIFT: u32 = 10;
/// `(unit & EXTENSION_BIT) >> EXTENSION_TO_SHIFT` yields either 0 or 8.
const EXTENSION_TO_SHIFT: u32 = 6;
const IS_LEAF_BIT: u32 = 1 << 31;
const LABEL_MASK: u32 = IS_LEAF_BIT | 0xFF;
const VALUE_MASK: u32 = !IS_LEAF_BIT;

/// Offsets below this bound are stored inline.
pub(crate) const MAX_INLINE_OFFSET: u32 = 1 << 21;
/// Exclusive upper bound of any encodable offset.
pub(crate) const MAX_OFFSET: u32 = 1 << 29;
/// Largest value a leaf-value unit can hold.
pub const MAX_VALUE: u32 = VALUE_MASK;

/// One 32-bit double-array unit.
///
/// All decoders are total: any `u32` decodes to something. Whether the result
/// is meaningful depends on the unit's role, which only the traversal knows.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Unit(u32);

impl Unit {
    /// Filler for slots that belong to no node. Its label matches no byte.
    pub const EMPTY: Unit = Unit(IS_LEAF_BIT);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether the node ends a stored key. The value lives at
    /// `node_pos ^ offset()`.
    #[inline]
    pub const fn has_leaf(self) -> bool {
        self.0 & HAS_LEAF_BIT != 0
    }

    /// Label of the edge entering this node. Compared against a byte widened
    /// to `u32`, so leaf-value and empty units (bit 31 set) never match.
    #[inline]
    pub const fn label(self) -> u32 {
        self.0 & LABEL_MASK
    }

    /// Stored value; meaningful only on a leaf-value unit.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0 & VALUE_MASK
    }

    /// XOR displacement from this node to its child block.
    #[inline]
    pub const fn offset(self) -> u32 {
        (self.0 >> OFFSET_SHIFT) << ((self.0 & EXTENSION_BIT) >> EXTENSION_TO_SHIFT)
    }

    /// A node unit entered through `label`, with no offset and no leaf yet.
    #[inline]
    pub const fn node(label: u8) -> Self {
        Self(label as u32)
    }

    /// A leaf-value unit. Values above [`MAX_VALUE`] are rejected.
    pub fn value_slot(value: u32) -> Result<Self> {
        if value > MAX_VALUE {
            return Err(Error::ValueOutOfRange { value });
        }
        Ok(Self(value | IS_LEAF_BIT))
    }

    #[inline]
    pub fn set_has_leaf(&mut self) {
        self.0 |= HAS_LEAF_BIT;
    }

    /// Stores `offset` in the base field, using the extension flag when it
    /// does not fit inline.
    pub fn set_offset(&mut self, offset: u32) -> Result<()> {
        let encoded = encode_offset(offset).ok_or(Error::TooLarge)?;
        self.0 = (self.0 & (LABEL_MASK | HAS_LEAF_BIT)) | encoded;
        Ok(())
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("raw", &format_args!("{:#010x}", self.0))
            .field("label", &self.label())
            .field("has_leaf", &self.has_leaf())
            .field("offset", &self.offset())
            .finish()
    }
}

/// Whether `offset` has an exact encoding in the base field.
#[inline]
pub(crate) const fn is_encodable_offset(offset: u32) -> bool {
    offset < MAX_INLINE_OFFSET || (offset < MAX_OFFSET && offset & 0xFF == 0)
}

#[inline]
const fn encode_offset(offset: u32) -> Option<u32> {
    if offset < MAX_INLINE_OFFSET {
        Some(offset << OFFSET_SHIFT)
    } else if is_encodable_offset(offset) {
        // (offset >> 8) << 10 == offset << 2 because the low byte is clear.
        Some((offset << 2) | EXTENSION_BIT)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fields() {
        // label 'a', has_leaf, base 5 without extension.
        let unit = Unit::from_raw((5 << 10) | HAS_LEAF_BIT | b'a' as u32);
        assert!(unit.has_leaf());
        assert_eq!(unit.label(), b'a' as u32);
        assert_eq!(unit.offset(), 5);

        let unit = Unit::from_raw((3 << 10) | EXTENSION_BIT | b'z' as u32);
        assert!(!unit.has_leaf());
        assert_eq!(unit.offset(), 3 << 8);
    }

    #[test]
    fn test_value_slot_never_matches_a_byte() {
        let unit = Unit::value_slot(0x61).unwrap();
        assert_eq!(unit.value(), 0x61);
        for b in 0..=255u32 {
            assert_ne!(unit.label(), b);
            assert_ne!(Unit::EMPTY.label(), b);
        }
    }

    #[test]
    fn test_value_limits() {
        assert_eq!(Unit::value_slot(MAX_VALUE).unwrap().value(), MAX_VALUE);
        assert!(matches!(
            Unit::value_slot(MAX_VALUE + 1),
            Err(Error::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_set_offset_inline_and_extended() {
        let mut unit = Unit::node(b'q');
        unit.set_has_leaf();

        unit.set_offset(MAX_INLINE_OFFSET - 1).unwrap();
        assert_eq!(unit.offset(), MAX_INLINE_OFFSET - 1);
        assert_eq!(unit.label(), b'q' as u32);
        assert!(unit.has_leaf());

        unit.set_offset(MAX_INLINE_OFFSET << 3).unwrap();
        assert_eq!(unit.offset(), MAX_INLINE_OFFSET << 3);
        assert_eq!(unit.label(), b'q' as u32);
        assert!(unit.has_leaf());
        assert_eq!(unit.raw() & IS_LEAF_BIT, 0);

        // Re-encoding a small offset must clear the extension flag.
        unit.set_offset(7).unwrap();
        assert_eq!(unit.offset(), 7);
    }

    #[test]
    fn test_unencodable_offsets() {
        let mut unit = Unit::node(1);
        assert!(matches!(
            unit.set_offset(MAX_INLINE_OFFSET + 1),
            Err(Error::TooLarge)
        ));
        assert!(matches!(unit.set_offset(MAX_OFFSET), Err(Error::TooLarge)));
        assert!(is_encodable_offset(MAX_OFFSET - 256));
        assert!(!is_encodable_offset(MAX_OFFSET - 255));
    }
}
