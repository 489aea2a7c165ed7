//! Bounds-checked little-endian reader over an immutable byte buffer.
//!
//! Every decoder in this crate reads through a [`ByteCursor`]. Reads come in
//! two flavours: absolute (`*_at`, never move the cursor) and sequential
//! (`read_*`, advance the cursor on success). A failed read never moves the
//! cursor.

use alloc::vec::Vec;

use crate::error::{ElfError, Table};

/// A random-access reader over a borrowed byte slice.
///
/// Cursors are `Copy`: callers that need to look elsewhere without
/// disturbing their own position take a [`fork_at`](Self::fork_at) instead
/// of seeking back and forth on a shared instance.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at offset 0.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the whole underlying buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the length of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the current read position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes between the position and the end of the buffer.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Moves the read position to `offset`. Seeking to exactly the end is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::OutOfBounds`] if `offset` lies past the end.
    pub fn seek(&mut self, offset: u64) -> Result<(), ElfError> {
        self.pos = self.check_start(offset, 0)?;
        Ok(())
    }

    /// Advances the read position by `count` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::OutOfBounds`] if the new position would lie past the end.
    pub fn skip(&mut self, count: u64) -> Result<(), ElfError> {
        let target = (self.pos as u64)
            .checked_add(count)
            .ok_or(self.out_of_bounds(self.pos as u64, count))?;
        self.seek(target)
    }

    /// Returns an independent cursor over the same buffer positioned at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::OutOfBounds`] if `offset` lies past the end.
    pub fn fork_at(&self, offset: u64) -> Result<Self, ElfError> {
        let mut fork = Self::new(self.data);
        fork.seek(offset)?;
        Ok(fork)
    }

    // -----------------------------------------------------------------------
    // Absolute reads
    // -----------------------------------------------------------------------

    /// Returns `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::OutOfBounds`] if `offset` lies past the end or the
    /// range overflows, and [`ElfError::Truncated`] if fewer than `len` bytes
    /// remain after `offset`.
    pub fn bytes_at(&self, offset: u64, len: u64) -> Result<&'a [u8], ElfError> {
        let start = self.check_start(offset, len)?;
        let available = self.data.len() - start;
        let len_usize = usize::try_from(len).map_err(|_| self.out_of_bounds(offset, len))?;
        if len_usize > available {
            return Err(ElfError::Truncated {
                offset,
                needed: len,
                available: available as u64,
            });
        }
        Ok(&self.data[start..start + len_usize])
    }

    /// Reads a fixed-size byte array at `offset`.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn array_at<const N: usize>(&self, offset: u64) -> Result<[u8; N], ElfError> {
        let bytes = self.bytes_at(offset, N as u64)?;
        let truncated = ElfError::Truncated {
            offset,
            needed: N as u64,
            available: bytes.len() as u64,
        };
        bytes.first_chunk::<N>().copied().ok_or(truncated)
    }

    /// Reads a byte at `offset`.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn u8_at(&self, offset: u64) -> Result<u8, ElfError> {
        Ok(self.array_at::<1>(offset)?[0])
    }

    /// Reads a little-endian `u16` at `offset`.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn u16_at(&self, offset: u64) -> Result<u16, ElfError> {
        self.array_at(offset).map(u16::from_le_bytes)
    }

    /// Reads a little-endian `u32` at `offset`.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn u32_at(&self, offset: u64) -> Result<u32, ElfError> {
        self.array_at(offset).map(u32::from_le_bytes)
    }

    /// Reads a little-endian `u64` at `offset`.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn u64_at(&self, offset: u64) -> Result<u64, ElfError> {
        self.array_at(offset).map(u64::from_le_bytes)
    }

    /// Reads a little-endian `i64` at `offset`.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn i64_at(&self, offset: u64) -> Result<i64, ElfError> {
        self.array_at(offset).map(i64::from_le_bytes)
    }

    /// Returns the bytes from `offset` up to (not including) the next NUL.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::OutOfBounds`] if `offset` lies past the end, and
    /// [`ElfError::MalformedStringTable`] if no NUL follows `offset`.
    pub fn cstr_at(&self, offset: u64) -> Result<&'a [u8], ElfError> {
        let start = self.check_start(offset, 1)?;
        let rest = &self.data[start..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ElfError::MalformedStringTable { offset })?;
        Ok(&rest[..nul])
    }

    // -----------------------------------------------------------------------
    // Sequential reads
    // -----------------------------------------------------------------------

    /// Reads `len` bytes at the position and advances past them.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn read_bytes(&mut self, len: u64) -> Result<&'a [u8], ElfError> {
        let bytes = self.bytes_at(self.pos as u64, len)?;
        self.pos += bytes.len();
        Ok(bytes)
    }

    /// Reads a fixed-size byte array at the position and advances past it.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ElfError> {
        let value = self.array_at::<N>(self.pos as u64)?;
        self.pos += N;
        Ok(value)
    }

    /// Reads a byte and advances.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn read_u8(&mut self) -> Result<u8, ElfError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a little-endian `u16` and advances.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn read_u16(&mut self) -> Result<u16, ElfError> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Reads a little-endian `u32` and advances.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn read_u32(&mut self) -> Result<u32, ElfError> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Reads a little-endian `u64` and advances.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn read_u64(&mut self) -> Result<u64, ElfError> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Reads a little-endian `i64` and advances.
    ///
    /// # Errors
    ///
    /// See [`bytes_at`](Self::bytes_at).
    pub fn read_i64(&mut self) -> Result<i64, ElfError> {
        self.read_array().map(i64::from_le_bytes)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Converts `offset` to a buffer index, rejecting starts past the end.
    fn check_start(&self, offset: u64, len: u64) -> Result<usize, ElfError> {
        usize::try_from(offset)
            .ok()
            .filter(|&start| start <= self.data.len())
            .ok_or(self.out_of_bounds(offset, len))
    }

    fn out_of_bounds(&self, offset: u64, len: u64) -> ElfError {
        ElfError::OutOfBounds {
            offset,
            len,
            size: self.data.len() as u64,
        }
    }
}

/// Decodes `count` fixed-size records starting at `offset`.
///
/// Record `n` is decoded from a fresh cursor at `offset + n * entry_size`,
/// so an `entry_size` larger than `record_size` skips trailing padding
/// without reading it. The whole table range is bounds-checked before any
/// record is decoded.
pub(crate) fn read_table<'a, T>(
    data: &'a [u8],
    table: Table,
    offset: u64,
    count: u64,
    entry_size: u64,
    record_size: usize,
    mut decode: impl FnMut(&mut ByteCursor<'a>) -> Result<T, ElfError>,
) -> Result<Vec<T>, ElfError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if entry_size < record_size as u64 {
        return Err(ElfError::UndersizedEntry {
            table,
            entry_size,
            required: record_size as u64,
        });
    }

    let base = ByteCursor::new(data);
    let total = count.checked_mul(entry_size).ok_or(ElfError::OutOfBounds {
        offset,
        len: u64::MAX,
        size: data.len() as u64,
    })?;
    base.bytes_at(offset, total)?;

    #[expect(
        clippy::cast_possible_truncation,
        reason = "count * entry_size fits in the buffer, so count fits in usize"
    )]
    let mut records = Vec::with_capacity(count as usize);
    for n in 0..count {
        let mut cursor = base.fork_at(offset + n * entry_size)?;
        records.push(decode(&mut cursor)?);
    }
    Ok(records)
}
