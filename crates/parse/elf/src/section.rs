//! ELF64 section headers and section content dispatch.
//!
//! The section header table is decoded eagerly. Each section's content is
//! then classified by [`classify`] into a [`SectionKind`] and decoded into the
//! matching [`SectionContent`] variant.

use alloc::vec::Vec;
use core::fmt;

use crate::cursor::{ByteCursor, read_table};
use crate::error::{ElfError, Table};
use crate::header::{ELF64_SHDR_SIZE, Elf64Header};
use crate::reloc::RelocationTable;
use crate::strtab::StringTable;
use crate::symbol::SymbolTable;
use crate::types::{SectionFlags, SectionType};

/// Parsed ELF64 section header entry.
///
/// The name is kept as a raw offset into the section name string table; use
/// [`ElfFile::section_name`](crate::ElfFile::section_name) to resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Offset into the section header string table for this section's name.
    pub sh_name: u32,
    /// Section type.
    pub sh_type: SectionType,
    /// Section flags.
    pub sh_flags: SectionFlags,
    /// Virtual address of the section in memory (0 if not allocated).
    pub sh_addr: u64,
    /// Offset of the section data in the file.
    pub sh_offset: u64,
    /// Size of the section in bytes.
    pub sh_size: u64,
    /// Section header table index link (meaning depends on section type).
    pub sh_link: u32,
    /// Extra information (meaning depends on section type).
    pub sh_info: u32,
    /// Required alignment of the section.
    pub sh_addralign: u64,
    /// Size of each entry for fixed-entry sections.
    pub sh_entsize: u64,
}

impl SectionHeader {
    /// Decode one section header from `cursor`.
    ///
    /// # Errors
    ///
    /// Returns a bounds error if the record does not fit.
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self, ElfError> {
        Ok(Self {
            sh_name: cursor.read_u32()?,
            sh_type: SectionType::from_raw(cursor.read_u32()?),
            sh_flags: SectionFlags::from_bits_retain(cursor.read_u64()?),
            sh_addr: cursor.read_u64()?,
            sh_offset: cursor.read_u64()?,
            sh_size: cursor.read_u64()?,
            sh_link: cursor.read_u32()?,
            sh_info: cursor.read_u32()?,
            sh_addralign: cursor.read_u64()?,
            sh_entsize: cursor.read_u64()?,
        })
    }

    /// Decode the whole section header table described by `header`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::UndersizedEntry`] if `e_shentsize` is below 64
    /// bytes, or a bounds error if the table does not fit in `data`.
    pub fn parse_table(data: &[u8], header: &Elf64Header) -> Result<Vec<Self>, ElfError> {
        read_table(
            data,
            Table::SectionHeaders,
            header.e_shoff,
            u64::from(header.e_shnum),
            u64::from(header.e_shentsize),
            ELF64_SHDR_SIZE,
            Self::parse,
        )
    }

    /// Returns the file bytes of this section.
    ///
    /// `SHT_NOBITS` sections occupy no file bytes and yield an empty slice.
    ///
    /// # Errors
    ///
    /// Returns a bounds error if `[sh_offset, sh_offset + sh_size)` does not
    /// lie inside `image`.
    pub fn data<'a>(&self, image: &'a [u8]) -> Result<&'a [u8], ElfError> {
        if self.sh_type == SectionType::NoBits {
            return Ok(&[]);
        }
        ByteCursor::new(image).bytes_at(self.sh_offset, self.sh_size)
    }

    /// Returns the number of `record_size`-byte entries in a fixed-entry table.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::ZeroEntrySize`], [`ElfError::UndersizedEntry`] or
    /// [`ElfError::EntrySizeMismatch`].
    pub fn entry_count(&self, table: Table, record_size: usize) -> Result<u64, ElfError> {
        if self.sh_entsize == 0 {
            return Err(ElfError::ZeroEntrySize { table });
        }
        if self.sh_entsize < record_size as u64 {
            return Err(ElfError::UndersizedEntry {
                table,
                entry_size: self.sh_entsize,
                required: record_size as u64,
            });
        }
        if self.sh_size % self.sh_entsize != 0 {
            return Err(ElfError::EntrySizeMismatch {
                size: self.sh_size,
                entry_size: self.sh_entsize,
            });
        }
        Ok(self.sh_size / self.sh_entsize)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// How a section's content will be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// The null section.
    Null,
    /// Uninterpreted bytes.
    Raw,
    /// A NUL-terminated string table.
    StringTable,
    /// A symbol table.
    SymbolTable,
    /// A relocation table.
    Relocations {
        /// `true` for RELA (explicit addends), `false` for REL.
        addend: bool,
    },
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null section",
            Self::Raw => "raw section",
            Self::StringTable => "string table",
            Self::SymbolTable => "symbol table",
            Self::Relocations { addend: true } => "RELA relocation table",
            Self::Relocations { addend: false } => "REL relocation table",
        })
    }
}

/// Selects how sections are classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Classify by `sh_type`; the name only distinguishes `.interp`.
    #[default]
    ByType,
    /// Classify by the conventional toolchain section names.
    ///
    /// Sections whose name could not be resolved fall back to [`ByType`](Self::ByType).
    ByName,
}

/// Classifies section `index` under `policy`.
///
/// Section 0 is always [`SectionKind::Null`].
#[must_use]
pub fn classify(
    index: usize,
    header: &SectionHeader,
    name: Option<&str>,
    policy: DispatchPolicy,
) -> SectionKind {
    if index == 0 {
        return SectionKind::Null;
    }
    match (policy, name) {
        (DispatchPolicy::ByName, Some(name)) => classify_by_name(header, name),
        _ => classify_by_type(header, name),
    }
}

fn classify_by_type(header: &SectionHeader, name: Option<&str>) -> SectionKind {
    match header.sh_type {
        SectionType::Null => SectionKind::Null,
        SectionType::StrTab => SectionKind::StringTable,
        SectionType::SymTab | SectionType::DynSym => SectionKind::SymbolTable,
        SectionType::Rel => SectionKind::Relocations { addend: false },
        SectionType::Rela => SectionKind::Relocations { addend: true },
        SectionType::Progbits if name == Some(".interp") => SectionKind::StringTable,
        _ => SectionKind::Raw,
    }
}

fn classify_by_name(header: &SectionHeader, name: &str) -> SectionKind {
    match name {
        "" => SectionKind::Null,
        ".interp" | ".strtab" | ".dynstr" | ".shstrtab" => SectionKind::StringTable,
        ".symtab" | ".dynsym" => SectionKind::SymbolTable,
        _ if name.starts_with(".rel.") || name.starts_with(".rela.") => {
            SectionKind::Relocations {
                addend: match header.sh_type {
                    SectionType::Rela => true,
                    SectionType::Rel => false,
                    _ => name.starts_with(".rela."),
                },
            }
        }
        _ => SectionKind::Raw,
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Decoded content of one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionContent {
    /// The null section.
    Null,
    /// Uninterpreted bytes (empty for `SHT_NOBITS`).
    Raw(Vec<u8>),
    /// A string table.
    Strings(StringTable),
    /// A symbol table.
    Symbols(SymbolTable),
    /// A REL or RELA relocation table.
    Relocations(RelocationTable),
}

impl SectionContent {
    /// Decode the bytes of `header` inside `image` as `kind`.
    ///
    /// # Errors
    ///
    /// Returns the structural error of the decoder selected by `kind`.
    pub fn decode(
        kind: SectionKind,
        header: &SectionHeader,
        image: &[u8],
    ) -> Result<Self, ElfError> {
        Ok(match kind {
            SectionKind::Null => Self::Null,
            SectionKind::Raw => Self::Raw(header.data(image)?.to_vec()),
            SectionKind::StringTable => Self::Strings(StringTable::from_section(header, image)?),
            SectionKind::SymbolTable => Self::Symbols(SymbolTable::parse(header, image)?),
            SectionKind::Relocations { addend } => {
                Self::Relocations(RelocationTable::parse(header, image, addend)?)
            }
        })
    }

    /// Returns the kind this content was decoded as.
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Null => SectionKind::Null,
            Self::Raw(_) => SectionKind::Raw,
            Self::Strings(_) => SectionKind::StringTable,
            Self::Symbols(_) => SectionKind::SymbolTable,
            Self::Relocations(table) => SectionKind::Relocations {
                addend: table.with_addend(),
            },
        }
    }
}

/// One entry of the section header table together with its decoded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    index: usize,
    header: SectionHeader,
    content: Result<SectionContent, ElfError>,
}

impl Section {
    pub(crate) fn new(
        index: usize,
        header: SectionHeader,
        content: Result<SectionContent, ElfError>,
    ) -> Self {
        Self {
            index,
            header,
            content,
        }
    }

    /// Position of this section in the section header table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The raw section header.
    #[must_use]
    pub fn header(&self) -> &SectionHeader {
        &self.header
    }

    /// The decoded content, or the error that prevented decoding it.
    ///
    /// # Errors
    ///
    /// Returns the structural error recorded when the content was decoded.
    pub fn content(&self) -> Result<&SectionContent, ElfError> {
        self.content.as_ref().map_err(|err| *err)
    }
}
