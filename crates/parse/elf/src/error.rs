//! Error taxonomy for ELF64 decoding.
//!
//! Every failure is an [`ElfError`]. Errors fall into two classes (see
//! [`ErrorClass`]): structural errors make the affected entity undecodable,
//! resolution errors only affect the single lookup that was requested.
//! Unrecognized enumeration values are never errors; they are carried as
//! `Unknown(raw)` variants of the constant tables in [`crate::types`].

use core::fmt;

use crate::section::SectionKind;

/// A fixed-record table inside an ELF image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// The program header table (`e_phoff`).
    ProgramHeaders,
    /// The section header table (`e_shoff`).
    SectionHeaders,
    /// A `SHT_SYMTAB` / `SHT_DYNSYM` section.
    Symbols,
    /// A `SHT_REL` / `SHT_RELA` section.
    Relocations,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ProgramHeaders => "program header table",
            Self::SectionHeaders => "section header table",
            Self::Symbols => "symbol table",
            Self::Relocations => "relocation table",
        })
    }
}

/// Coarse classification of an [`ElfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The bytes themselves are malformed; the affected entity cannot be decoded.
    Structural,
    /// An index or link points somewhere unusable; only that lookup fails.
    Resolution,
}

/// Errors that can occur when decoding or resolving an ELF64 image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfError {
    /// The file does not start with `\x7fELF`.
    BadMagic([u8; 4]),
    /// `EI_CLASS` is not `ELFCLASS64`.
    UnsupportedClass(u8),
    /// `EI_DATA` is not `ELFDATA2LSB`.
    UnsupportedEncoding(u8),
    /// A read starts past the end of the buffer, or its range overflows.
    OutOfBounds {
        /// Requested start offset.
        offset: u64,
        /// Requested length.
        len: u64,
        /// Size of the buffer being read.
        size: u64,
    },
    /// A read starts inside the buffer but runs past its end.
    Truncated {
        /// Requested start offset.
        offset: u64,
        /// Bytes required.
        needed: u64,
        /// Bytes actually available from `offset`.
        available: u64,
    },
    /// A table declares an entry size smaller than its record layout.
    UndersizedEntry {
        /// The table being decoded.
        table: Table,
        /// Declared entry size.
        entry_size: u64,
        /// Size of one structurally-known record.
        required: u64,
    },
    /// A fixed-entry section declares `sh_entsize == 0`.
    ZeroEntrySize {
        /// The table being decoded.
        table: Table,
    },
    /// A fixed-entry section size is not a multiple of its entry size.
    EntrySizeMismatch {
        /// Declared `sh_size`.
        size: u64,
        /// Declared `sh_entsize`.
        entry_size: u64,
    },
    /// `e_shstrndx` does not name a section.
    InvalidNameTableIndex {
        /// Declared `e_shstrndx`.
        index: u16,
        /// Declared `e_shnum`.
        count: u16,
    },
    /// A string table lookup starts past the end of the table.
    StringTableIndexOutOfRange {
        /// Requested byte offset.
        offset: u64,
        /// Size of the string table.
        size: u64,
    },
    /// A string runs to the end of its table without a NUL terminator.
    MalformedStringTable {
        /// Offset of the unterminated string.
        offset: u64,
    },
    /// A string is not valid UTF-8.
    InvalidUtf8 {
        /// Offset of the string inside its table.
        offset: u64,
    },
    /// A segment declares an alignment that is not a power of two.
    BadAlignment {
        /// Declared `p_align`.
        align: u64,
    },
    /// A segment's `p_vaddr` and `p_offset` disagree modulo `p_align`.
    AlignmentMismatch {
        /// Declared `p_vaddr`.
        vaddr: u64,
        /// Declared `p_offset`.
        offset: u64,
        /// Declared `p_align`.
        align: u64,
    },
    /// A segment's file size exceeds its memory size.
    FileSizeExceedsMemory {
        /// Declared `p_filesz`.
        filesz: u64,
        /// Declared `p_memsz`.
        memsz: u64,
    },
    /// The image has no section name string table.
    MissingNameTable,
    /// A section index is past the end of the section header table.
    SectionIndexOutOfRange {
        /// Requested index.
        index: u64,
        /// Number of sections.
        count: usize,
    },
    /// A link field names a section of the wrong kind.
    UnsuitableLink {
        /// The linked section index.
        index: usize,
        /// What the link was expected to name.
        expected: SectionKind,
    },
    /// A symbol index is past the end of its symbol table.
    SymbolIndexOutOfRange {
        /// Requested index.
        index: u32,
        /// Number of symbols in the table.
        count: usize,
    },
}

impl ElfError {
    /// Returns whether this error is structural or a failed lookup.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingNameTable
            | Self::SectionIndexOutOfRange { .. }
            | Self::UnsuitableLink { .. }
            | Self::SymbolIndexOutOfRange { .. }
            | Self::StringTableIndexOutOfRange { .. } => ErrorClass::Resolution,
            _ => ErrorClass::Structural,
        }
    }
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic(magic) => write!(f, "invalid ELF magic bytes {magic:02x?}"),
            Self::UnsupportedClass(class) => {
                write!(f, "unsupported ELF class {class} (expected ELFCLASS64)")
            }
            Self::UnsupportedEncoding(data) => {
                write!(f, "unsupported data encoding {data} (expected little-endian)")
            }
            Self::OutOfBounds { offset, len, size } => {
                write!(f, "range {offset:#x}+{len:#x} is outside the {size:#x}-byte buffer")
            }
            Self::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "truncated read at {offset:#x}: need {needed} bytes, {available} available"
            ),
            Self::UndersizedEntry {
                table,
                entry_size,
                required,
            } => write!(
                f,
                "{table} entry size {entry_size} is smaller than the {required}-byte record"
            ),
            Self::ZeroEntrySize { table } => write!(f, "{table} declares a zero entry size"),
            Self::EntrySizeMismatch { size, entry_size } => {
                write!(f, "section size {size} is not a multiple of entry size {entry_size}")
            }
            Self::InvalidNameTableIndex { index, count } => {
                write!(f, "section name table index {index} is out of range ({count} sections)")
            }
            Self::StringTableIndexOutOfRange { offset, size } => {
                write!(f, "string offset {offset:#x} is outside the {size:#x}-byte string table")
            }
            Self::MalformedStringTable { offset } => {
                write!(f, "unterminated string at offset {offset:#x}")
            }
            Self::InvalidUtf8 { offset } => write!(f, "invalid UTF-8 in string at {offset:#x}"),
            Self::BadAlignment { align } => {
                write!(f, "segment alignment {align:#x} is not a power of two")
            }
            Self::AlignmentMismatch {
                vaddr,
                offset,
                align,
            } => write!(
                f,
                "segment vaddr {vaddr:#x} and offset {offset:#x} disagree modulo {align:#x}"
            ),
            Self::FileSizeExceedsMemory { filesz, memsz } => {
                write!(f, "segment file size {filesz:#x} exceeds memory size {memsz:#x}")
            }
            Self::MissingNameTable => write!(f, "image has no section name string table"),
            Self::SectionIndexOutOfRange { index, count } => {
                write!(f, "section index {index} is out of range ({count} sections)")
            }
            Self::UnsuitableLink { index, expected } => {
                write!(f, "linked section {index} is not a {expected}")
            }
            Self::SymbolIndexOutOfRange { index, count } => {
                write!(f, "symbol index {index} is out of range ({count} symbols)")
            }
        }
    }
}

impl core::error::Error for ElfError {}
