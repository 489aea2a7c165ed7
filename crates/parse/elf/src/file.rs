//! The [`ElfFile`] container: the decoded image and its cross-references.

use alloc::vec::Vec;

use crate::error::ElfError;
use crate::header::Elf64Header;
use crate::reloc::RelocationTable;
use crate::section::{
    DispatchPolicy, Section, SectionContent, SectionHeader, SectionKind, classify,
};
use crate::segment::ProgramHeader;
use crate::strtab::StringTable;
use crate::symbol::SymbolTable;
use crate::types::{SectionType, SegmentType};

/// Decoding options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// How section contents are classified.
    pub dispatch: DispatchPolicy,
    /// Fail construction on the first section whose content cannot be decoded,
    /// instead of recording the error on that section.
    pub strict: bool,
}

/// A fully decoded ELF64 image.
///
/// Owns the input buffer. Everything is decoded once by
/// [`parse_with`](Self::parse_with); cross-references are looked up lazily
/// by the accessors and borrow from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfFile {
    data: Vec<u8>,
    header: Elf64Header,
    program_headers: Vec<ProgramHeader>,
    sections: Vec<Section>,
    name_table: Option<usize>,
}

impl ElfFile {
    /// Decode `data` with the default [`ParseOptions`].
    ///
    /// # Errors
    ///
    /// See [`parse_with`](Self::parse_with).
    pub fn parse(data: Vec<u8>) -> Result<Self, ElfError> {
        Self::parse_with(data, ParseOptions::default())
    }

    /// Decode `data`.
    ///
    /// The file header, both header tables and the section name string table
    /// must decode; anything else that fails is recorded on its
    /// [`Section`] unless `options.strict` is set.
    ///
    /// # Errors
    ///
    /// Returns the first structural error of the header, the header tables or
    /// the name table, or (in strict mode) of any section.
    pub fn parse_with(data: Vec<u8>, options: ParseOptions) -> Result<Self, ElfError> {
        let header = Elf64Header::parse(&data)?;
        let program_headers = ProgramHeader::parse_table(&data, &header)?;
        let headers = SectionHeader::parse_table(&data, &header)?;

        let name_table = match usize::from(header.e_shstrndx) {
            0 => None,
            index if index < headers.len() => Some(index),
            _ => None,
        };
        let names = match name_table {
            Some(index) => Some(StringTable::from_section(&headers[index], &data)?),
            None => None,
        };

        let mut sections = Vec::with_capacity(headers.len());
        for (index, shdr) in headers.iter().enumerate() {
            let content = if Some(index) == name_table {
                match &names {
                    Some(names) => Ok(SectionContent::Strings(names.clone())),
                    None => Ok(SectionContent::Null),
                }
            } else {
                let name = names
                    .as_ref()
                    .and_then(|names| names.get(shdr.sh_name).ok());
                let kind = classify(index, shdr, name, options.dispatch);
                SectionContent::decode(kind, shdr, &data)
            };
            let content = match content {
                Err(err) if options.strict => return Err(err),
                content => content,
            };
            sections.push(Section::new(index, *shdr, content));
        }

        Ok(Self {
            data,
            header,
            program_headers,
            sections,
            name_table,
        })
    }

    /// The raw image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the parsed ELF64 file header.
    #[must_use]
    pub fn header(&self) -> &Elf64Header {
        &self.header
    }

    /// Returns the virtual address of the entry point.
    #[must_use]
    pub fn entry_point(&self) -> u64 {
        self.header.e_entry
    }

    /// Program headers in table order.
    #[must_use]
    pub fn program_headers(&self) -> &[ProgramHeader] {
        &self.program_headers
    }

    /// Sections in table order; `sections()[i].index() == i`.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns section `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::SectionIndexOutOfRange`].
    pub fn section(&self, index: usize) -> Result<&Section, ElfError> {
        self.sections
            .get(index)
            .ok_or(ElfError::SectionIndexOutOfRange {
                index: index as u64,
                count: self.sections.len(),
            })
    }

    /// The section name string table, if the image has one.
    #[must_use]
    pub fn name_table(&self) -> Option<&StringTable> {
        let section = self.sections.get(self.name_table?)?;
        match section.content() {
            Ok(SectionContent::Strings(table)) => Some(table),
            _ => None,
        }
    }

    /// Resolves the name of section `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::SectionIndexOutOfRange`],
    /// [`ElfError::MissingNameTable`] or a string lookup error.
    pub fn section_name(&self, index: usize) -> Result<&str, ElfError> {
        let section = self.section(index)?;
        self.name_table()
            .ok_or(ElfError::MissingNameTable)?
            .get(section.header().sh_name)
    }

    /// Returns the first section named `name`.
    #[must_use]
    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| self.section_name(section.index()) == Ok(name))
    }

    /// Returns the string table at section `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::SectionIndexOutOfRange`], or
    /// [`ElfError::UnsuitableLink`] if the section is not a decoded string table.
    pub fn string_table(&self, index: usize) -> Result<&StringTable, ElfError> {
        match self.section(index)?.content() {
            Ok(SectionContent::Strings(table)) => Ok(table),
            _ => Err(ElfError::UnsuitableLink {
                index,
                expected: SectionKind::StringTable,
            }),
        }
    }

    /// Returns the symbol table at section `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::SectionIndexOutOfRange`], or
    /// [`ElfError::UnsuitableLink`] if the section is not a decoded symbol table.
    pub fn symbol_table(&self, index: usize) -> Result<&SymbolTable, ElfError> {
        match self.section(index)?.content() {
            Ok(SectionContent::Symbols(table)) => Ok(table),
            _ => Err(ElfError::UnsuitableLink {
                index,
                expected: SectionKind::SymbolTable,
            }),
        }
    }

    /// Returns the relocation table at section `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::SectionIndexOutOfRange`], or
    /// [`ElfError::UnsuitableLink`] if the section is not a decoded
    /// relocation table.
    pub fn relocation_table(&self, index: usize) -> Result<&RelocationTable, ElfError> {
        match self.section(index)?.content() {
            Ok(SectionContent::Relocations(table)) => Ok(table),
            _ => Err(ElfError::UnsuitableLink {
                index,
                expected: SectionKind::Relocations {
                    addend: self.sections[index].header().sh_type == SectionType::Rela,
                },
            }),
        }
    }

    /// Iterates over the symbol tables as `(section index, table)`.
    pub fn symbol_tables(&self) -> impl Iterator<Item = (usize, &SymbolTable)> {
        self.sections
            .iter()
            .filter_map(|section| match section.content() {
                Ok(SectionContent::Symbols(table)) => Some((section.index(), table)),
                _ => None,
            })
    }

    /// Iterates over the relocation tables as `(section index, table)`.
    pub fn relocation_tables(&self) -> impl Iterator<Item = (usize, &RelocationTable)> {
        self.sections
            .iter()
            .filter_map(|section| match section.content() {
                Ok(SectionContent::Relocations(table)) => Some((section.index(), table)),
                _ => None,
            })
    }

    /// Returns the file image of a segment (`p_filesz` bytes at `p_offset`).
    ///
    /// # Errors
    ///
    /// Returns a bounds error if the range is outside the image.
    pub fn segment_data(&self, phdr: &ProgramHeader) -> Result<&[u8], ElfError> {
        crate::cursor::ByteCursor::new(&self.data).bytes_at(phdr.p_offset, phdr.p_filesz)
    }

    /// Lists the indices of the sections contained in a segment.
    pub fn segment_sections<'a>(
        &'a self,
        phdr: &'a ProgramHeader,
    ) -> impl Iterator<Item = usize> + 'a {
        self.sections
            .iter()
            .filter(move |section| phdr.contains(section.header()))
            .map(Section::index)
    }

    /// The program interpreter path named by `PT_INTERP`, without its NUL.
    ///
    /// Returns `None` if there is no `PT_INTERP` segment or its bytes are not
    /// a UTF-8 string.
    #[must_use]
    pub fn interpreter(&self) -> Option<&str> {
        let phdr = self
            .program_headers
            .iter()
            .find(|phdr| phdr.p_type == SegmentType::Interp)?;
        let bytes = self.segment_data(phdr).ok()?;
        let bytes = bytes.split(|&b| b == 0).next().unwrap_or(bytes);
        core::str::from_utf8(bytes).ok()
    }
}
