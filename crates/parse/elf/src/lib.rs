//! ELF64 decoder for static inspection tools.
//!
//! Decodes a little-endian ELF64 image into a cross-referenced model: the
//! file header, the program headers, the section headers and the typed
//! contents of string, symbol and relocation sections. Every offset, size
//! and index is bounds-checked; nothing in the input can cause a panic.
//! No unsafe code, no I/O.
//!
//! # Usage
//!
//! ```
//! use elfscope_elf::ElfFile;
//!
//! fn list_symbols(image: Vec<u8>) {
//!     let elf = ElfFile::parse(image).expect("valid ELF");
//!     for (_, symtab) in elf.symbol_tables() {
//!         for sym in symtab.resolve(&elf) {
//!             let name = sym.display_name().unwrap_or("<bad name>");
//!             // Print name, sym.symbol.binding(), sym.section, ...
//!             let _ = name;
//!         }
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod cursor;
pub mod error;
pub mod file;
pub mod header;
pub mod reloc;
pub mod section;
pub mod segment;
pub mod strtab;
pub mod symbol;
pub mod types;

#[cfg(test)]
mod fixture;

pub use cursor::ByteCursor;
pub use error::{ElfError, ErrorClass, Table};
pub use file::{ElfFile, ParseOptions};
pub use header::{Elf64Header, Ident};
pub use reloc::{Relocation, RelocationTable, ResolvedRelocation};
pub use section::{DispatchPolicy, Section, SectionContent, SectionHeader, SectionKind};
pub use segment::ProgramHeader;
pub use strtab::StringTable;
pub use symbol::{ResolvedSymbol, Symbol, SymbolSection, SymbolTable};
pub use types::{
    ElfClass, ElfData, ElfType, Machine, OsAbi, SectionFlags, SectionIndex, SectionType,
    SegmentFlags, SegmentType, SymbolBinding, SymbolType, SymbolVisibility,
};
