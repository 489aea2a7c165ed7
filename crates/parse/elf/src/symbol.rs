//! ELF64 symbol tables (`SHT_SYMTAB`, `SHT_DYNSYM`) and symbol resolution.

use alloc::vec::Vec;

use crate::cursor::{ByteCursor, read_table};
use crate::error::{ElfError, Table};
use crate::file::ElfFile;
use crate::section::SectionHeader;
use crate::types::{SectionIndex, SymbolBinding, SymbolType, SymbolVisibility};

/// Size of an ELF64 symbol entry (24 bytes).
pub const ELF64_SYM_SIZE: usize = 24;

/// Parsed ELF64 symbol table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Offset into the linked string table for this symbol's name.
    pub st_name: u32,
    /// Symbol type (low 4 bits) and binding (high 4 bits).
    pub st_info: u8,
    /// Symbol visibility (low 2 bits).
    pub st_other: u8,
    /// Section index this symbol is defined in (or a reserved index).
    pub st_shndx: u16,
    /// Symbol value (address or offset).
    pub st_value: u64,
    /// Size of the symbol.
    pub st_size: u64,
}

impl Symbol {
    /// Decode one symbol from `cursor`.
    ///
    /// # Errors
    ///
    /// Returns a bounds error if the record does not fit.
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self, ElfError> {
        Ok(Self {
            st_name: cursor.read_u32()?,
            st_info: cursor.read_u8()?,
            st_other: cursor.read_u8()?,
            st_shndx: cursor.read_u16()?,
            st_value: cursor.read_u64()?,
            st_size: cursor.read_u64()?,
        })
    }

    /// Returns the symbol binding (`STB_*`).
    #[must_use]
    pub fn binding(&self) -> SymbolBinding {
        SymbolBinding::from_raw(self.st_info >> 4)
    }

    /// Returns the symbol type (`STT_*`).
    #[must_use]
    pub fn sym_type(&self) -> SymbolType {
        SymbolType::from_raw(self.st_info & 0xf)
    }

    /// Returns the symbol visibility (`STV_*`).
    #[must_use]
    pub fn visibility(&self) -> SymbolVisibility {
        SymbolVisibility::from_raw(self.st_other & 0x3)
    }

    /// Returns the classified section index.
    #[must_use]
    pub fn section_index(&self) -> SectionIndex {
        SectionIndex::from_raw(self.st_shndx)
    }
}

/// A decoded symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    link: u32,
    info: u32,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Decode the symbol table held by section `header`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::ZeroEntrySize`], [`ElfError::UndersizedEntry`],
    /// [`ElfError::EntrySizeMismatch`] or a bounds error.
    pub fn parse(header: &SectionHeader, image: &[u8]) -> Result<Self, ElfError> {
        let count = header.entry_count(Table::Symbols, ELF64_SYM_SIZE)?;
        let symbols = read_table(
            image,
            Table::Symbols,
            header.sh_offset,
            count,
            header.sh_entsize,
            ELF64_SYM_SIZE,
            Symbol::parse,
        )?;
        Ok(Self {
            link: header.sh_link,
            info: header.sh_info,
            symbols,
        })
    }

    /// Index of the string table holding the symbol names (`sh_link`).
    #[must_use]
    pub fn link(&self) -> u32 {
        self.link
    }

    /// Index of the first non-local symbol (`sh_info`).
    #[must_use]
    pub fn first_global(&self) -> u32 {
        self.info
    }

    /// All symbols in table order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Returns the symbol at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::SymbolIndexOutOfRange`].
    pub fn get(&self, index: u32) -> Result<&Symbol, ElfError> {
        self.symbols
            .get(index as usize)
            .ok_or(ElfError::SymbolIndexOutOfRange {
                index,
                count: self.symbols.len(),
            })
    }

    /// Number of symbols, including the null symbol.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if the table holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Resolves every symbol against `file`.
    pub fn resolve<'f>(
        &'f self,
        file: &'f ElfFile,
    ) -> impl Iterator<Item = ResolvedSymbol<'f>> + 'f {
        self.symbols
            .iter()
            .enumerate()
            .map(move |(index, symbol)| self.resolve_entry(file, index, symbol))
    }

    /// Resolves the symbol at `index` against `file`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::SymbolIndexOutOfRange`]. Name and section lookup
    /// failures are reported inside the returned [`ResolvedSymbol`].
    pub fn resolve_one<'f>(
        &'f self,
        file: &'f ElfFile,
        index: u32,
    ) -> Result<ResolvedSymbol<'f>, ElfError> {
        let symbol = self.get(index)?;
        Ok(self.resolve_entry(file, index as usize, symbol))
    }

    fn resolve_entry<'f>(
        &'f self,
        file: &'f ElfFile,
        index: usize,
        symbol: &'f Symbol,
    ) -> ResolvedSymbol<'f> {
        let name = file
            .string_table(self.link as usize)
            .and_then(|strtab| strtab.get(symbol.st_name));
        let section = match symbol.section_index() {
            SectionIndex::Regular(shndx) => {
                let index = usize::from(shndx);
                if index < file.sections().len() {
                    Ok(SymbolSection::Defined {
                        index,
                        name: file.section_name(index),
                    })
                } else {
                    Err(ElfError::SectionIndexOutOfRange {
                        index: u64::from(shndx),
                        count: file.sections().len(),
                    })
                }
            }
            special => Ok(SymbolSection::Special(special)),
        };
        ResolvedSymbol {
            index,
            symbol,
            name,
            section,
        }
    }
}

/// Where a resolved symbol is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolSection<'f> {
    /// A reserved index (undefined, absolute, common, ...). Never indexed.
    Special(SectionIndex),
    /// A section of the file.
    Defined {
        /// Index into the section header table.
        index: usize,
        /// The section's name, if it resolves.
        name: Result<&'f str, ElfError>,
    },
}

/// A symbol with its cross-references looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSymbol<'f> {
    /// Position in the symbol table.
    pub index: usize,
    /// The raw symbol.
    pub symbol: &'f Symbol,
    /// Name from the linked string table.
    pub name: Result<&'f str, ElfError>,
    /// Defining section.
    pub section: Result<SymbolSection<'f>, ElfError>,
}

impl<'f> ResolvedSymbol<'f> {
    /// The name to show for this symbol.
    ///
    /// Unnamed `STT_SECTION` symbols borrow the name of their section.
    #[must_use]
    pub fn display_name(&self) -> Option<&'f str> {
        match (self.name, self.symbol.sym_type(), self.section) {
            (Ok(""), SymbolType::Section, Ok(SymbolSection::Defined { name: Ok(name), .. })) => {
                Some(name)
            }
            (name, _, _) => name.ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{ElfBuilder, SHT_STRTAB, SHT_SYMTAB, concat, sample_object, sym};

    #[test]
    fn info_and_other_unpack() {
        let bytes = sym(1, 0x12, 0x02, 5, 0x1000, 0x42);
        let symbol = Symbol::parse(&mut ByteCursor::new(&bytes)).unwrap();
        assert_eq!(symbol.binding(), SymbolBinding::Global);
        assert_eq!(symbol.sym_type(), SymbolType::Func);
        assert_eq!(symbol.visibility(), SymbolVisibility::Hidden);
        assert_eq!(symbol.section_index(), SectionIndex::Regular(5));
        assert_eq!(symbol.st_value, 0x1000);
        assert_eq!(symbol.st_size, 0x42);
    }

    #[test]
    fn visibility_ignores_upper_bits() {
        let bytes = sym(0, 0, 0xfd, 0, 0, 0);
        let symbol = Symbol::parse(&mut ByteCursor::new(&bytes)).unwrap();
        assert_eq!(symbol.visibility(), SymbolVisibility::Internal);

        let bytes = sym(0, 0, 0xff, 0, 0, 0);
        let symbol = Symbol::parse(&mut ByteCursor::new(&bytes)).unwrap();
        assert_eq!(symbol.visibility(), SymbolVisibility::Protected);
    }

    #[test]
    fn parse_table_and_index() {
        let image = sample_object();
        let file = ElfFile::parse(image).unwrap();
        let symtab = file.symbol_table(4).unwrap();
        assert_eq!(symtab.len(), 6);
        assert_eq!(symtab.link(), 5);
        assert_eq!(symtab.first_global(), 3);
        assert_eq!(symtab.get(3).unwrap().st_value, 0x10);
        assert_eq!(
            symtab.get(6),
            Err(ElfError::SymbolIndexOutOfRange { index: 6, count: 6 })
        );
    }

    #[test]
    fn resolve_names_and_sections() {
        let file = ElfFile::parse(sample_object()).unwrap();
        let symtab = file.symbol_table(4).unwrap();
        let resolved: Vec<_> = symtab.resolve(&file).collect();
        assert_eq!(resolved.len(), 6);

        assert_eq!(resolved[0].name, Ok(""));
        assert_eq!(
            resolved[0].section,
            Ok(SymbolSection::Special(SectionIndex::Undefined))
        );

        assert_eq!(resolved[3].name, Ok("main"));
        assert_eq!(
            resolved[3].section,
            Ok(SymbolSection::Defined {
                index: 1,
                name: Ok(".text"),
            })
        );

        assert_eq!(resolved[2].name, Ok("counter"));
        assert_eq!(resolved[2].symbol.visibility(), SymbolVisibility::Hidden);
        assert_eq!(resolved[4].name, Ok("printf"));
        assert_eq!(
            resolved[5].section,
            Ok(SymbolSection::Special(SectionIndex::Absolute))
        );
    }

    #[test]
    fn section_symbols_borrow_section_names() {
        let file = ElfFile::parse(sample_object()).unwrap();
        let symtab = file.symbol_table(4).unwrap();
        let text = symtab.resolve_one(&file, 1).unwrap();
        assert_eq!(text.name, Ok(""));
        assert_eq!(text.display_name(), Some(".text"));
        let main = symtab.resolve_one(&file, 3).unwrap();
        assert_eq!(main.display_name(), Some("main"));
    }

    #[test]
    fn per_entry_resolution_errors() {
        let strtab = b"\0ok\0";
        let symbols = concat(&[
            sym(0, 0, 0, 0, 0, 0),
            sym(1, 0x10, 0, 1, 0, 0),
            sym(99, 0x10, 0, 1, 0, 0),
            sym(1, 0x10, 0, 40, 0, 0),
        ]);
        let image = ElfBuilder::new()
            .section(".symtab", SHT_SYMTAB, &symbols)
            .link(2)
            .section(".strtab", SHT_STRTAB, strtab)
            .build();
        let file = ElfFile::parse(image).unwrap();
        let resolved: Vec<_> = file.symbol_table(1).unwrap().resolve(&file).collect();

        assert_eq!(resolved[1].name, Ok("ok"));
        assert_eq!(
            resolved[2].name,
            Err(ElfError::StringTableIndexOutOfRange { offset: 99, size: 4 })
        );
        assert_eq!(
            resolved[3].section,
            Err(ElfError::SectionIndexOutOfRange { index: 40, count: 4 })
        );
        assert_eq!(resolved[3].name, Ok("ok"));
    }

    #[test]
    fn unsuitable_string_table_link() {
        let symbols = concat(&[sym(0, 0, 0, 0, 0, 0), sym(1, 0x10, 0, 0, 0, 0)]);
        let image = ElfBuilder::new()
            .section(".symtab", SHT_SYMTAB, &symbols)
            .link(1)
            .build();
        let file = ElfFile::parse(image).unwrap();
        let resolved: Vec<_> = file.symbol_table(1).unwrap().resolve(&file).collect();
        assert_eq!(
            resolved[1].name,
            Err(ElfError::UnsuitableLink {
                index: 1,
                expected: crate::SectionKind::StringTable,
            })
        );
        assert!(resolved[1].section.is_ok());
    }

    #[test]
    fn zero_entry_size_is_structural() {
        let image = ElfBuilder::new()
            .section(".symtab", SHT_SYMTAB, &sym(0, 0, 0, 0, 0, 0))
            .entsize(0)
            .build();
        let file = ElfFile::parse(image).unwrap();
        assert_eq!(
            file.sections()[1].content(),
            Err(ElfError::ZeroEntrySize {
                table: Table::Symbols,
            })
        );
    }
}
