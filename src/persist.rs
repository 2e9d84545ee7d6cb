//! Loading and saving the unit buffer.
//!
//! The persisted form is the array's bytes and nothing else: `4 * size()`
//! little-endian words with no header, magic, or length prefix. Whatever
//! container holds the array must record its byte range.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use memmap2::MmapOptions;

use crate::array::{DoubleArray, Storage, UNIT_SIZE};
use crate::error::{Error, Result};

/// How [`DoubleArray::open`] brings the bytes into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Read-only memory map of the range.
    #[default]
    Map,
    /// Copy the range into an owned buffer.
    Read,
}

/// Byte range and load mode for [`DoubleArray::open`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Start of the range. Negative values are treated as 0.
    pub offset: i64,
    /// Length of the range. Zero or negative means "to the end of the file".
    pub len: i64,
    pub mode: LoadMode,
}

impl LoadOptions {
    pub fn range(offset: i64, len: i64) -> Self {
        Self {
            offset,
            len,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: LoadMode) -> Self {
        self.mode = mode;
        self
    }
}

impl DoubleArray {
    /// Loads the byte range described by `options` from `file`.
    ///
    /// The bytes are taken as they are; nothing checks that they were written
    /// by [`save`](Self::save). In [`LoadMode::Read`] the file's cursor is
    /// moved.
    pub fn open(file: &File, options: &LoadOptions) -> Result<Self> {
        let file_len = file.metadata()?.len();
        let (offset, len) = resolve_range(file_len, options.offset, options.len)?;
        if len % UNIT_SIZE != 0 {
            return Err(Error::UnalignedLength(len));
        }

        let storage = if len == 0 {
            Storage::Empty
        } else {
            match options.mode {
                LoadMode::Map => {
                    // SAFETY: the map is read-only. The file must not be truncated
                    // or rewritten while the array is alive; that is the caller's
                    // contract, as with any memory-mapped dictionary.
                    let map = unsafe { MmapOptions::new().offset(offset).len(len).map(file)? };
                    Storage::Mapped(map)
                }
                LoadMode::Read => {
                    let mut bytes = vec![0u8; len];
                    let mut reader = file;
                    reader.seek(SeekFrom::Start(offset))?;
                    reader.read_exact(&mut bytes)?;
                    Storage::Owned(bytes)
                }
            }
        };

        tracing::debug!(offset, bytes = len, mode = ?options.mode, "loaded double array");
        Self::from_storage(storage)
    }

    pub fn open_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        let file = File::open(path)?;
        Self::open(&file, options)
    }

    /// Writes the backing bytes verbatim.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.as_bytes())?;
        Ok(())
    }

    pub fn save_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        self.save(&mut file)?;
        file.flush()?;
        tracing::debug!(bytes = self.total_size(), "saved double array");
        Ok(())
    }
}

/// Clamps and checks a requested range against the file length.
fn resolve_range(file_len: u64, offset: i64, len: i64) -> io::Result<(u64, usize)> {
    let offset = offset.max(0) as u64;
    if offset > file_len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("range start {offset} is past the end of a {file_len}-byte file"),
        ));
    }
    let len = if len <= 0 {
        file_len - offset
    } else {
        let len = len as u64;
        if len > file_len - offset {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("range {offset}+{len} exceeds a {file_len}-byte file"),
            ));
        }
        len
    };
    let len = usize::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "range does not fit in memory"))?;
    Ok((offset, len))
}
