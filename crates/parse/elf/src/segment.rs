//! ELF64 program header (segment) table.
//!
//! [`ProgramHeader::parse_table`] decodes every entry of the table described
//! by the file header. Layout invariants are checked separately by
//! [`ProgramHeader::validate`] and never abort decoding.

use alloc::vec::Vec;

use crate::cursor::{ByteCursor, read_table};
use crate::error::{ElfError, Table};
use crate::header::{ELF64_PHDR_SIZE, Elf64Header};
use crate::section::SectionHeader;
use crate::types::{SectionType, SegmentFlags, SegmentType};

/// Parsed ELF64 program header entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader {
    /// Segment type.
    pub p_type: SegmentType,
    /// Segment permission flags.
    pub p_flags: SegmentFlags,
    /// Offset of the segment data in the file.
    pub p_offset: u64,
    /// Virtual address of the segment.
    pub p_vaddr: u64,
    /// Physical address of the segment.
    pub p_paddr: u64,
    /// Size of the segment data in the file.
    pub p_filesz: u64,
    /// Size of the segment in memory.
    pub p_memsz: u64,
    /// Alignment of the segment in memory and in the file.
    pub p_align: u64,
}

impl ProgramHeader {
    /// Decode one program header from `cursor`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] or [`ElfError::OutOfBounds`] if the
    /// record does not fit.
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self, ElfError> {
        Ok(Self {
            p_type: SegmentType::from_raw(cursor.read_u32()?),
            p_flags: SegmentFlags::from_bits_retain(cursor.read_u32()?),
            p_offset: cursor.read_u64()?,
            p_vaddr: cursor.read_u64()?,
            p_paddr: cursor.read_u64()?,
            p_filesz: cursor.read_u64()?,
            p_memsz: cursor.read_u64()?,
            p_align: cursor.read_u64()?,
        })
    }

    /// Decode the whole program header table described by `header`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::UndersizedEntry`] if `e_phentsize` is below 56
    /// bytes, or a bounds error if the table does not fit in `data`.
    pub fn parse_table(data: &[u8], header: &Elf64Header) -> Result<Vec<Self>, ElfError> {
        read_table(
            data,
            Table::ProgramHeaders,
            header.e_phoff,
            u64::from(header.e_phnum),
            u64::from(header.e_phentsize),
            ELF64_PHDR_SIZE,
            Self::parse,
        )
    }

    /// Checks the segment layout invariants.
    ///
    /// An alignment of 0 or 1 means "no constraint". Otherwise it must be a
    /// power of two and `p_vaddr` must be congruent to `p_offset` modulo it.
    /// The file image may not be larger than the memory image.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::BadAlignment`], [`ElfError::AlignmentMismatch`] or
    /// [`ElfError::FileSizeExceedsMemory`].
    pub fn validate(&self) -> Result<(), ElfError> {
        if self.p_align > 1 {
            if !self.p_align.is_power_of_two() {
                return Err(ElfError::BadAlignment {
                    align: self.p_align,
                });
            }
            if self.p_vaddr % self.p_align != self.p_offset % self.p_align {
                return Err(ElfError::AlignmentMismatch {
                    vaddr: self.p_vaddr,
                    offset: self.p_offset,
                    align: self.p_align,
                });
            }
        }
        if self.p_filesz > self.p_memsz {
            return Err(ElfError::FileSizeExceedsMemory {
                filesz: self.p_filesz,
                memsz: self.p_memsz,
            });
        }
        Ok(())
    }

    /// Returns `true` if `section` lies inside this segment.
    ///
    /// File-backed sections are matched by file range, `SHT_NOBITS` sections
    /// by address range against the memory image. Null segments and null
    /// sections never contain anything.
    #[must_use]
    pub fn contains(&self, section: &SectionHeader) -> bool {
        if self.p_type == SegmentType::Null || section.sh_type == SectionType::Null {
            return false;
        }
        if section.sh_type == SectionType::NoBits {
            return section.sh_addr != 0
                && within(self.p_vaddr, self.p_memsz, section.sh_addr, section.sh_size);
        }
        within(
            self.p_offset,
            self.p_filesz,
            section.sh_offset,
            section.sh_size,
        )
    }
}

/// `[start, start + len)` inside `[outer, outer + outer_len)`, without overflow.
fn within(outer: u64, outer_len: u64, start: u64, len: u64) -> bool {
    match (outer.checked_add(outer_len), start.checked_add(len)) {
        (Some(outer_end), Some(end)) => outer <= start && end <= outer_end,
        _ => false,
    }
}
