//! NUL-terminated string tables (`SHT_STRTAB`).

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;

use crate::cursor::ByteCursor;
use crate::error::ElfError;
use crate::section::SectionHeader;

/// An owned string table.
///
/// Construction checks that the table ends in a NUL, so every in-range
/// lookup finds a terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTable {
    data: Vec<u8>,
    /// Start offset of every string, left to right.
    starts: Vec<u32>,
}

impl StringTable {
    /// Build a string table from its raw bytes.
    ///
    /// An empty buffer is a valid table holding one empty string.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::MalformedStringTable`] if the last string is not
    /// NUL-terminated.
    pub fn new(data: Vec<u8>) -> Result<Self, ElfError> {
        let mut starts = Vec::new();
        let mut start = 0usize;
        for (i, &b) in data.iter().enumerate() {
            if b == 0 {
                starts.push(offset_u32(start));
                start = i + 1;
            }
        }
        if start < data.len() {
            return Err(ElfError::MalformedStringTable {
                offset: start as u64,
            });
        }
        if starts.is_empty() {
            starts.push(0);
        }
        Ok(Self { data, starts })
    }

    /// Copy the bytes of `header` out of `image` and build a table from them.
    ///
    /// # Errors
    ///
    /// Returns a bounds error if the section does not fit in `image`, or
    /// [`ElfError::MalformedStringTable`].
    pub fn from_section(header: &SectionHeader, image: &[u8]) -> Result<Self, ElfError> {
        Self::new(header.data(image)?.to_vec())
    }

    /// Returns the raw bytes from `offset` up to the next NUL.
    ///
    /// Offsets that land inside a string return its suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::StringTableIndexOutOfRange`] if `offset` is not
    /// inside the table.
    pub fn get_bytes(&self, offset: u32) -> Result<&[u8], ElfError> {
        if self.data.is_empty() && offset == 0 {
            return Ok(&[]);
        }
        if offset as usize >= self.data.len() {
            return Err(ElfError::StringTableIndexOutOfRange {
                offset: u64::from(offset),
                size: self.data.len() as u64,
            });
        }
        ByteCursor::new(&self.data).cstr_at(u64::from(offset))
    }

    /// Returns the string starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::StringTableIndexOutOfRange`] or
    /// [`ElfError::InvalidUtf8`].
    pub fn get(&self, offset: u32) -> Result<&str, ElfError> {
        let bytes = self.get_bytes(offset)?;
        core::str::from_utf8(bytes).map_err(|_| ElfError::InvalidUtf8 {
            offset: u64::from(offset),
        })
    }

    /// Iterates over every string in table order as `(offset, text)`.
    ///
    /// Invalid UTF-8 is replaced, so this is meant for display.
    pub fn strings(&self) -> impl Iterator<Item = (u32, Cow<'_, str>)> + '_ {
        self.starts.iter().map(move |&start| {
            let bytes = self.get_bytes(start).unwrap_or_default();
            (start, String::from_utf8_lossy(bytes))
        })
    }

    /// Number of strings in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// Always `false`: even an empty section holds the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Size of the table in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The raw table bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "string offsets are u32 in ELF64; larger tables are only reachable past u32::MAX"
)]
fn offset_u32(offset: usize) -> u32 {
    offset as u32
}
