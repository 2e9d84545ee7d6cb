//! Double-array construction.
//!
//! The builder walks the sorted key set depth first. For every node it picks
//! a free slot `base` such that `base` and every `base ^ label` of its
//! children are unoccupied, then stores `node ^ base` as the node's offset.
//! Slot `base` itself is always reserved: it holds the leaf value when the
//! node ends a key and [`Unit::EMPTY`] otherwise. Because every base owns its
//! own slot, no two nodes share a base, which is what keeps the label check
//! during lookup free of false positives.
//!
//! The array grows in blocks of 256 units, so every probe `base ^ byte` lands
//! inside the array.

use smallvec::SmallVec;

use crate::array::DoubleArray;
use crate::error::{Error, Result};
use crate::unit::{is_encodable_offset, Unit, MAX_OFFSET, MAX_VALUE};

const BLOCK_SIZE: usize = 256;

/// Canonical builder input: non-empty, unique keys without zero bytes,
/// sorted bytewise, each paired with a 31-bit value.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    entries: Vec<(Vec<u8>, u32)>,
}

impl KeySet {
    /// Validates and sorts `keys`.
    ///
    /// Without `values`, each key maps to its index in `keys`.
    pub fn new<K: AsRef<[u8]>>(keys: &[K], values: Option<&[u32]>) -> Result<Self> {
        if let Some(values) = values {
            if values.len() != keys.len() {
                return Err(Error::LengthMismatch {
                    keys: keys.len(),
                    values: values.len(),
                });
            }
        }

        let mut entries = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let key = key.as_ref();
            if key.is_empty() {
                return Err(Error::EmptyKey(i));
            }
            if key.contains(&0) {
                return Err(Error::ZeroByteInKey(i));
            }
            let value = match values {
                Some(values) => values[i],
                None => u32::try_from(i).map_err(|_| Error::TooLarge)?,
            };
            if value > MAX_VALUE {
                return Err(Error::ValueOutOfRange { value });
            }
            entries.push((key.to_vec(), value));
        }

        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(Error::DuplicateKey(pair[0].0.clone()));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&[u8], u32)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_slice(), *v))
    }
}

type ProgressFn<'a> = Box<dyn FnMut(usize, usize) + 'a>;

/// Builds a [`DoubleArray`] from a [`KeySet`].
///
/// ```rust
/// use darts_index::{DoubleArrayBuilder, KeySet};
///
/// let keys = KeySet::new(&["a", "ab", "cd"], Some(&[10, 20, 30][..])).unwrap();
/// let mut seen = Vec::new();
/// let da = DoubleArrayBuilder::new()
///     .with_progress(|done, total| seen.push((done, total)))
///     .build(&keys)
///     .unwrap();
///
/// assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
/// assert_eq!(da.exact_match(b"ab").map(|m| m.value), Some(20));
/// ```
#[derive(Default)]
pub struct DoubleArrayBuilder<'a> {
    progress: Option<ProgressFn<'a>>,
}

impl<'a> DoubleArrayBuilder<'a> {
    pub fn new() -> Self {
        Self { progress: None }
    }

    /// Observer called with `(keys placed, total keys)` once per key, in key
    /// order. It cannot influence the build.
    pub fn with_progress(mut self, progress: impl FnMut(usize, usize) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn build(mut self, keys: &KeySet) -> Result<DoubleArray> {
        let total = keys.len();
        let mut layout = Layout::new();
        let mut placed = 0usize;
        let mut stack = vec![Pending {
            id: 0,
            lo: 0,
            hi: total,
            depth: 0,
        }];

        while let Some(node) = stack.pop() {
            let entries = &keys.entries[node.lo..node.hi];
            // Keys share the first `depth` bytes; only the first can end here.
            let has_leaf = entries.first().is_some_and(|(k, _)| k.len() == node.depth);
            let children = group_children(entries, node.depth, node.lo, usize::from(has_leaf));
            let labels: SmallVec<[u8; 8]> = children.iter().map(|c| c.label).collect();

            let base = layout.find_base(node.id, &labels)?;
            layout.occupy(base);
            layout.units[node.id].set_offset((node.id ^ base) as u32)?;

            if has_leaf {
                layout.units[node.id].set_has_leaf();
                layout.units[base] = Unit::value_slot(entries[0].1)?;
                placed += 1;
                self.report(placed, total);
            }

            for child in &children {
                let pos = base ^ child.label as usize;
                layout.occupy(pos);
                layout.units[pos] = Unit::node(child.label);
            }
            // Reversed so the smallest label is expanded next.
            for child in children.iter().rev() {
                stack.push(Pending {
                    id: base ^ child.label as usize,
                    lo: child.lo,
                    hi: child.hi,
                    depth: node.depth + 1,
                });
            }
        }

        tracing::debug!(
            keys = total,
            units = layout.units.len(),
            "built double array"
        );
        Ok(DoubleArray::from_units(&layout.units))
    }

    fn report(&mut self, placed: usize, total: usize) {
        tracing::trace!(placed, total, "placed key");
        if let Some(progress) = self.progress.as_mut() {
            progress(placed, total);
        }
    }
}

impl DoubleArray {
    /// Builds from unsorted keys; see [`KeySet::new`] for the rules.
    pub fn build<K: AsRef<[u8]>>(keys: &[K], values: Option<&[u32]>) -> Result<Self> {
        DoubleArrayBuilder::new().build(&KeySet::new(keys, values)?)
    }
}

/// A node whose slot is placed but whose children are not yet.
struct Pending {
    id: usize,
    lo: usize,
    hi: usize,
    depth: usize,
}

struct Child {
    label: u8,
    lo: usize,
    hi: usize,
}

/// Splits `entries[skip..]` into runs sharing the byte at `depth`. Indices in
/// the result are absolute, shifted by `first`.
fn group_children(
    entries: &[(Vec<u8>, u32)],
    depth: usize,
    first: usize,
    skip: usize,
) -> SmallVec<[Child; 8]> {
    let mut children = SmallVec::new();
    let mut i = skip;
    while i < entries.len() {
        let label = entries[i].0[depth];
        let mut j = i + 1;
        while j < entries.len() && entries[j].0[depth] == label {
            j += 1;
        }
        children.push(Child {
            label,
            lo: first + i,
            hi: first + j,
        });
        i = j;
    }
    children
}

struct Layout {
    units: Vec<Unit>,
    occupied: Vec<bool>,
    /// Every slot below this one is occupied.
    first_free: usize,
}

impl Layout {
    fn new() -> Self {
        let mut layout = Self {
            units: Vec::new(),
            occupied: Vec::new(),
            first_free: 0,
        };
        layout.grow_to(BLOCK_SIZE);
        layout.units[0] = Unit::node(0);
        layout.occupy(0);
        layout
    }

    fn grow_to(&mut self, len: usize) {
        if len > self.units.len() {
            let len = len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
            self.units.resize(len, Unit::EMPTY);
            self.occupied.resize(len, false);
        }
    }

    fn occupy(&mut self, pos: usize) {
        self.occupied[pos] = true;
        while self.first_free < self.occupied.len() && self.occupied[self.first_free] {
            self.first_free += 1;
        }
    }

    fn find_base(&mut self, id: usize, labels: &[u8]) -> Result<usize> {
        let mut base = self.first_free;
        loop {
            if base >= MAX_OFFSET as usize {
                return Err(Error::TooLarge);
            }
            self.grow_to((base | (BLOCK_SIZE - 1)) + 1);
            if self.fits(id, base, labels) {
                return Ok(base);
            }
            base += 1;
        }
    }

    fn fits(&self, id: usize, base: usize, labels: &[u8]) -> bool {
        !self.occupied[base]
            && is_encodable_offset((id ^ base) as u32)
            && labels
                .iter()
                .all(|&label| !self.occupied[base ^ label as usize])
    }
}
