//! ELF64 relocation tables (`SHT_REL`, `SHT_RELA`) and relocation resolution.

use alloc::vec::Vec;

use crate::cursor::{ByteCursor, read_table};
use crate::error::{ElfError, Table};
use crate::file::ElfFile;
use crate::section::SectionHeader;
use crate::symbol::ResolvedSymbol;
use crate::types::Machine;

// ---------------------------------------------------------------------------
// x86-64 relocation type constants (ELF ABI supplement)
// ---------------------------------------------------------------------------

/// No relocation.
pub const R_X86_64_NONE: u32 = 0;

/// Absolute 64-bit: `S + A`.
pub const R_X86_64_64: u32 = 1;

/// PC-relative 32-bit: `S + A - P`.
pub const R_X86_64_PC32: u32 = 2;

/// PLT-relative 32-bit: `L + A - P`.
pub const R_X86_64_PLT32: u32 = 4;

/// Global data: `S` (symbol value).
pub const R_X86_64_GLOB_DAT: u32 = 6;

/// PLT slot: `S`.
pub const R_X86_64_JUMP_SLOT: u32 = 7;

/// Base-relative 64-bit: `B + A` (used in static-PIE / `ET_DYN`).
pub const R_X86_64_RELATIVE: u32 = 8;

/// Absolute 32-bit, zero-extended: `S + A`.
pub const R_X86_64_32: u32 = 10;

/// Absolute 32-bit, sign-extended: `S + A`.
pub const R_X86_64_32S: u32 = 11;

// ---------------------------------------------------------------------------
// Entry sizes
// ---------------------------------------------------------------------------

/// Size of an ELF64 `Rel` entry (16 bytes).
pub const ELF64_REL_SIZE: usize = 16;

/// Size of an ELF64 `Rela` entry (24 bytes).
pub const ELF64_RELA_SIZE: usize = 24;

// ---------------------------------------------------------------------------
// Relocation
// ---------------------------------------------------------------------------

/// A parsed ELF64 relocation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// Offset within the section (or virtual address) where the relocation applies.
    pub r_offset: u64,
    /// Packed symbol index (upper 32 bits) and type (lower 32 bits).
    pub r_info: u64,
    /// Addend value; `Some` exactly for `SHT_RELA` entries.
    pub r_addend: Option<i64>,
}

impl Relocation {
    /// Decode a `Rel` entry from `cursor`.
    ///
    /// # Errors
    ///
    /// Returns a bounds error if the record does not fit.
    pub fn parse_rel(cursor: &mut ByteCursor<'_>) -> Result<Self, ElfError> {
        Ok(Self {
            r_offset: cursor.read_u64()?,
            r_info: cursor.read_u64()?,
            r_addend: None,
        })
    }

    /// Decode a `Rela` entry from `cursor`.
    ///
    /// # Errors
    ///
    /// Returns a bounds error if the record does not fit.
    pub fn parse_rela(cursor: &mut ByteCursor<'_>) -> Result<Self, ElfError> {
        Ok(Self {
            r_offset: cursor.read_u64()?,
            r_info: cursor.read_u64()?,
            r_addend: Some(cursor.read_i64()?),
        })
    }

    /// Packs a symbol index and a relocation type into `r_info`.
    #[must_use]
    pub const fn info(sym: u32, r_type: u32) -> u64 {
        ((sym as u64) << 32) | r_type as u64
    }

    /// Symbol table index (upper 32 bits of `r_info`).
    #[must_use]
    pub fn sym(&self) -> u32 {
        (self.r_info >> 32) as u32
    }

    /// Relocation type (lower 32 bits of `r_info`).
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "r_info split into r_type/r_sym is defined by the ELF spec"
    )]
    pub fn r_type(&self) -> u32 {
        self.r_info as u32
    }
}

// ---------------------------------------------------------------------------
// RelocationTable
// ---------------------------------------------------------------------------

/// Decoder for one REL or RELA record.
type DecodeFn = fn(&mut ByteCursor<'_>) -> Result<Relocation, ElfError>;

/// A decoded REL or RELA table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationTable {
    link: u32,
    target: u32,
    with_addend: bool,
    entries: Vec<Relocation>,
}

impl RelocationTable {
    /// Decode the relocation table held by section `header`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::ZeroEntrySize`], [`ElfError::UndersizedEntry`],
    /// [`ElfError::EntrySizeMismatch`] or a bounds error.
    pub fn parse(
        header: &SectionHeader,
        image: &[u8],
        with_addend: bool,
    ) -> Result<Self, ElfError> {
        let (record_size, decode): (usize, DecodeFn) = if with_addend {
            (ELF64_RELA_SIZE, Relocation::parse_rela)
        } else {
            (ELF64_REL_SIZE, Relocation::parse_rel)
        };
        let count = header.entry_count(Table::Relocations, record_size)?;
        let entries = read_table(
            image,
            Table::Relocations,
            header.sh_offset,
            count,
            header.sh_entsize,
            record_size,
            decode,
        )?;
        Ok(Self {
            link: header.sh_link,
            target: header.sh_info,
            with_addend,
            entries,
        })
    }

    /// Index of the symbol table the entries refer to (`sh_link`).
    #[must_use]
    pub fn link(&self) -> u32 {
        self.link
    }

    /// Index of the section the relocations apply to (`sh_info`).
    #[must_use]
    pub fn target(&self) -> u32 {
        self.target
    }

    /// `true` for RELA tables.
    #[must_use]
    pub fn with_addend(&self) -> bool {
        self.with_addend
    }

    /// All entries in table order.
    #[must_use]
    pub fn entries(&self) -> &[Relocation] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves the symbol of every entry against `file`.
    ///
    /// If `sh_link` does not name a symbol table every entry reports
    /// [`ElfError::UnsuitableLink`]; offset, type and addend stay available.
    pub fn resolve<'f>(
        &'f self,
        file: &'f ElfFile,
    ) -> impl Iterator<Item = ResolvedRelocation<'f>> + 'f {
        let symtab = file.symbol_table(self.link as usize);
        self.entries
            .iter()
            .enumerate()
            .map(move |(index, relocation)| {
                let symbol = symtab.and_then(|symtab| match relocation.sym() {
                    0 => Ok(None),
                    sym => symtab.resolve_one(file, sym).map(Some),
                });
                ResolvedRelocation {
                    index,
                    relocation,
                    symbol,
                }
            })
    }
}

/// A relocation with its symbol looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRelocation<'f> {
    /// Position in the relocation table.
    pub index: usize,
    /// The raw relocation.
    pub relocation: &'f Relocation,
    /// The referenced symbol; `None` for symbol index 0.
    pub symbol: Result<Option<ResolvedSymbol<'f>>, ElfError>,
}

// ---------------------------------------------------------------------------
// Type names
// ---------------------------------------------------------------------------

/// Returns the ABI name of relocation type `r_type` on `machine`.
///
/// Known for x86-64 and AArch64; `None` otherwise.
#[must_use]
pub fn type_name(machine: Machine, r_type: u32) -> Option<&'static str> {
    match machine {
        Machine::X86_64 => x86_64_name(r_type),
        Machine::AArch64 => aarch64_name(r_type),
        _ => None,
    }
}

fn x86_64_name(r_type: u32) -> Option<&'static str> {
    Some(match r_type {
        R_X86_64_NONE => "R_X86_64_NONE",
        R_X86_64_64 => "R_X86_64_64",
        R_X86_64_PC32 => "R_X86_64_PC32",
        3 => "R_X86_64_GOT32",
        R_X86_64_PLT32 => "R_X86_64_PLT32",
        5 => "R_X86_64_COPY",
        R_X86_64_GLOB_DAT => "R_X86_64_GLOB_DAT",
        R_X86_64_JUMP_SLOT => "R_X86_64_JUMP_SLOT",
        R_X86_64_RELATIVE => "R_X86_64_RELATIVE",
        9 => "R_X86_64_GOTPCREL",
        R_X86_64_32 => "R_X86_64_32",
        R_X86_64_32S => "R_X86_64_32S",
        12 => "R_X86_64_16",
        13 => "R_X86_64_PC16",
        14 => "R_X86_64_8",
        15 => "R_X86_64_PC8",
        16 => "R_X86_64_DTPMOD64",
        17 => "R_X86_64_DTPOFF64",
        18 => "R_X86_64_TPOFF64",
        19 => "R_X86_64_TLSGD",
        20 => "R_X86_64_TLSLD",
        21 => "R_X86_64_DTPOFF32",
        22 => "R_X86_64_GOTTPOFF",
        23 => "R_X86_64_TPOFF32",
        24 => "R_X86_64_PC64",
        25 => "R_X86_64_GOTOFF64",
        26 => "R_X86_64_GOTPC32",
        32 => "R_X86_64_SIZE32",
        33 => "R_X86_64_SIZE64",
        37 => "R_X86_64_IRELATIVE",
        41 => "R_X86_64_GOTPCRELX",
        42 => "R_X86_64_REX_GOTPCRELX",
        _ => return None,
    })
}

fn aarch64_name(r_type: u32) -> Option<&'static str> {
    Some(match r_type {
        0 => "R_AARCH64_NONE",
        257 => "R_AARCH64_ABS64",
        258 => "R_AARCH64_ABS32",
        259 => "R_AARCH64_ABS16",
        260 => "R_AARCH64_PREL64",
        261 => "R_AARCH64_PREL32",
        262 => "R_AARCH64_PREL16",
        275 => "R_AARCH64_ADR_PREL_PG_HI21",
        277 => "R_AARCH64_ADD_ABS_LO12_NC",
        278 => "R_AARCH64_LDST8_ABS_LO12_NC",
        282 => "R_AARCH64_JUMP26",
        283 => "R_AARCH64_CALL26",
        284 => "R_AARCH64_LDST16_ABS_LO12_NC",
        285 => "R_AARCH64_LDST32_ABS_LO12_NC",
        286 => "R_AARCH64_LDST64_ABS_LO12_NC",
        299 => "R_AARCH64_LDST128_ABS_LO12_NC",
        311 => "R_AARCH64_ADR_GOT_PAGE",
        312 => "R_AARCH64_LD64_GOT_LO12_NC",
        1024 => "R_AARCH64_COPY",
        1025 => "R_AARCH64_GLOB_DAT",
        1026 => "R_AARCH64_JUMP_SLOT",
        1027 => "R_AARCH64_RELATIVE",
        1028 => "R_AARCH64_TLS_DTPMOD",
        1029 => "R_AARCH64_TLS_DTPREL",
        1030 => "R_AARCH64_TLS_TPREL",
        1031 => "R_AARCH64_TLSDESC",
        1032 => "R_AARCH64_IRELATIVE",
        _ => return None,
    })
}
