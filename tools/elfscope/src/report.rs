//! Report model and rendering.
//!
//! A [`Report`] is a plain serializable snapshot of the parts of an
//! [`ElfFile`] selected on the command line. It renders either as text tables
//! or, through serde, as JSON.

use elfscope_elf::reloc::type_name;
use elfscope_elf::{
    ElfFile, ProgramHeader, ResolvedSymbol, Section, SectionContent, SymbolSection,
};
use serde::Serialize;

use crate::cli::Command;

/// Which parts of the file to report.
#[derive(Clone, Copy, Debug, Default)]
pub struct Parts {
    pub header: bool,
    pub segments: bool,
    pub sections: bool,
    pub symbols: bool,
    pub relocs: bool,
    pub strings: bool,
}

impl Parts {
    /// Parts selected by a subcommand.
    pub fn for_command(command: &Command) -> Self {
        let none = Self::default();
        match command {
            Command::Header(_) => Self {
                header: true,
                ..none
            },
            Command::Segments(_) => Self {
                segments: true,
                ..none
            },
            Command::Sections(_) => Self {
                sections: true,
                ..none
            },
            Command::Symbols(_) => Self {
                symbols: true,
                ..none
            },
            Command::Relocs(_) => Self {
                relocs: true,
                ..none
            },
            Command::Strings(_) => Self {
                strings: true,
                ..none
            },
            Command::All(_) => Self {
                header: true,
                segments: true,
                sections: true,
                symbols: true,
                relocs: true,
                strings: true,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Everything printed for one file.
#[derive(Debug, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<SegmentReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<SectionReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_tables: Option<Vec<SymbolTableReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relocation_tables: Option<Vec<RelocationTableReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_tables: Option<Vec<StringTableReport>>,
}

#[derive(Debug, Serialize)]
pub struct HeaderReport {
    pub class: String,
    pub data: String,
    pub ident_version: u8,
    pub os_abi: String,
    pub abi_version: u8,
    pub object_type: String,
    pub machine: String,
    pub version: u32,
    pub entry: u64,
    pub phoff: u64,
    pub shoff: u64,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

#[derive(Debug, Serialize)]
pub struct SegmentReport {
    pub index: usize,
    pub kind: String,
    pub flags: String,
    pub offset: u64,
    pub vaddr: u64,
    pub paddr: u64,
    pub filesz: u64,
    pub memsz: u64,
    pub align: u64,
    pub sections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SectionReport {
    pub index: usize,
    pub name: String,
    pub kind: String,
    pub content: String,
    pub flags: String,
    pub addr: u64,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SymbolTableReport {
    pub section: usize,
    pub name: String,
    pub symbols: Vec<SymbolReport>,
}

#[derive(Debug, Serialize)]
pub struct SymbolReport {
    pub index: usize,
    pub value: u64,
    pub size: u64,
    pub kind: String,
    pub binding: String,
    pub visibility: String,
    pub section: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RelocationTableReport {
    pub section: usize,
    pub name: String,
    pub target: String,
    pub with_addend: bool,
    pub entries: Vec<RelocationReport>,
}

#[derive(Debug, Serialize)]
pub struct RelocationReport {
    pub offset: u64,
    pub info: u64,
    pub r_type: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<&'static str>,
    /// `None` for symbol index 0; serialized as `null`.
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_value: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addend: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StringTableReport {
    pub section: usize,
    pub name: String,
    pub strings: Vec<StringEntry>,
}

#[derive(Debug, Serialize)]
pub struct StringEntry {
    pub offset: u32,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

impl Report {
    /// Snapshot the selected `parts` of `file`.
    pub fn build(file: &ElfFile, parts: Parts) -> Self {
        Self {
            header: parts.header.then(|| header_report(file)),
            segments: parts.segments.then(|| segment_reports(file)),
            sections: parts.sections.then(|| section_reports(file)),
            symbol_tables: parts.symbols.then(|| symbol_reports(file)),
            relocation_tables: parts.relocs.then(|| relocation_reports(file)),
            string_tables: parts.strings.then(|| string_reports(file)),
        }
    }
}

/// Name of section `index`, or a placeholder when it cannot be resolved.
fn section_label(file: &ElfFile, index: usize) -> String {
    match file.section_name(index) {
        Ok(name) => name.to_owned(),
        Err(_) => format!("<section {index}>"),
    }
}

fn header_report(file: &ElfFile) -> HeaderReport {
    let h = file.header();
    HeaderReport {
        class: h.ident.class.to_string(),
        data: h.ident.data.to_string(),
        ident_version: h.ident.version,
        os_abi: h.ident.os_abi.to_string(),
        abi_version: h.ident.abi_version,
        object_type: h.e_type.to_string(),
        machine: h.e_machine.to_string(),
        version: h.e_version,
        entry: h.e_entry,
        phoff: h.e_phoff,
        shoff: h.e_shoff,
        flags: h.e_flags,
        ehsize: h.e_ehsize,
        phentsize: h.e_phentsize,
        phnum: h.e_phnum,
        shentsize: h.e_shentsize,
        shnum: h.e_shnum,
        shstrndx: h.e_shstrndx,
    }
}

fn segment_reports(file: &ElfFile) -> Vec<SegmentReport> {
    file.program_headers()
        .iter()
        .enumerate()
        .map(|(index, phdr): (usize, &ProgramHeader)| SegmentReport {
            index,
            kind: phdr.p_type.to_string(),
            flags: phdr.p_flags.to_string(),
            offset: phdr.p_offset,
            vaddr: phdr.p_vaddr,
            paddr: phdr.p_paddr,
            filesz: phdr.p_filesz,
            memsz: phdr.p_memsz,
            align: phdr.p_align,
            sections: file
                .segment_sections(phdr)
                .map(|i| section_label(file, i))
                .collect(),
            problem: phdr.validate().err().map(|err| err.to_string()),
        })
        .collect()
}

fn section_reports(file: &ElfFile) -> Vec<SectionReport> {
    file.sections()
        .iter()
        .map(|section: &Section| {
            let h = section.header();
            let (content, error) = match section.content() {
                Ok(content) => (content.kind().to_string(), None),
                Err(err) => ("undecodable".to_owned(), Some(err.to_string())),
            };
            SectionReport {
                index: section.index(),
                name: section_label(file, section.index()),
                kind: h.sh_type.to_string(),
                content,
                flags: h.sh_flags.to_string(),
                addr: h.sh_addr,
                offset: h.sh_offset,
                size: h.sh_size,
                link: h.sh_link,
                info: h.sh_info,
                addralign: h.sh_addralign,
                entsize: h.sh_entsize,
                error,
            }
        })
        .collect()
}

fn symbol_label(sym: &ResolvedSymbol<'_>) -> (String, Option<String>) {
    match (sym.display_name(), sym.name) {
        (Some(name), _) => (name.to_owned(), None),
        (None, Err(err)) => (String::new(), Some(err.to_string())),
        (None, Ok(name)) => (name.to_owned(), None),
    }
}

fn symbol_reports(file: &ElfFile) -> Vec<SymbolTableReport> {
    file.symbol_tables()
        .map(|(index, symtab)| SymbolTableReport {
            section: index,
            name: section_label(file, index),
            symbols: symtab
                .resolve(file)
                .map(|sym| {
                    let (name, name_error) = symbol_label(&sym);
                    let (section, section_error) = match sym.section {
                        Ok(SymbolSection::Special(special)) => (special.to_string(), None),
                        Ok(SymbolSection::Defined { index, .. }) => (index.to_string(), None),
                        Err(err) => (sym.symbol.st_shndx.to_string(), Some(err.to_string())),
                    };
                    SymbolReport {
                        index: sym.index,
                        value: sym.symbol.st_value,
                        size: sym.symbol.st_size,
                        kind: sym.symbol.sym_type().to_string(),
                        binding: sym.symbol.binding().to_string(),
                        visibility: sym.symbol.visibility().to_string(),
                        section,
                        name,
                        error: name_error.or(section_error),
                    }
                })
                .collect(),
        })
        .collect()
}

fn relocation_reports(file: &ElfFile) -> Vec<RelocationTableReport> {
    let machine = file.header().e_machine;
    file.relocation_tables()
        .map(|(index, table)| RelocationTableReport {
            section: index,
            name: section_label(file, index),
            target: match table.target() {
                0 => String::new(),
                target => section_label(file, usize::try_from(target).unwrap_or(usize::MAX)),
            },
            with_addend: table.with_addend(),
            entries: table
                .resolve(file)
                .map(|resolved| {
                    let reloc = resolved.relocation;
                    let (symbol, symbol_value, error) = match resolved.symbol {
                        Ok(Some(sym)) => {
                            let (name, error) = symbol_label(&sym);
                            (Some(name), Some(sym.symbol.st_value), error)
                        }
                        Ok(None) => (None, None, None),
                        Err(err) => (None, None, Some(err.to_string())),
                    };
                    RelocationReport {
                        offset: reloc.r_offset,
                        info: reloc.r_info,
                        r_type: reloc.r_type(),
                        type_name: type_name(machine, reloc.r_type()),
                        symbol,
                        symbol_value,
                        addend: reloc.r_addend,
                        error,
                    }
                })
                .collect(),
        })
        .collect()
}

fn string_reports(file: &ElfFile) -> Vec<StringTableReport> {
    file.sections()
        .iter()
        .filter_map(|section| match section.content() {
            Ok(SectionContent::Strings(strtab)) => Some(StringTableReport {
                section: section.index(),
                name: section_label(file, section.index()),
                strings: strtab
                    .strings()
                    .filter(|(_, value)| !value.is_empty())
                    .map(|(offset, value)| StringEntry {
                        offset,
                        value: value.into_owned(),
                    })
                    .collect(),
            }),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

impl Report {
    /// Print the report as text tables on stdout.
    pub fn print(&self) {
        if let Some(header) = &self.header {
            print_header(header);
        }
        if let Some(segments) = &self.segments {
            print_segments(segments);
        }
        if let Some(sections) = &self.sections {
            print_sections(sections);
        }
        if let Some(tables) = &self.symbol_tables {
            for table in tables {
                print_symbols(table);
            }
        }
        if let Some(tables) = &self.relocation_tables {
            for table in tables {
                print_relocations(table);
            }
        }
        if let Some(tables) = &self.string_tables {
            for table in tables {
                print_strings(table);
            }
        }
    }
}

fn print_header(h: &HeaderReport) {
    println!("ELF Header:");
    println!("  {:<36}{}", "Class:", h.class);
    println!("  {:<36}{}", "Data:", h.data);
    println!("  {:<36}{}", "Version:", h.ident_version);
    println!("  {:<36}{}", "OS/ABI:", h.os_abi);
    println!("  {:<36}{}", "ABI Version:", h.abi_version);
    println!("  {:<36}{}", "Type:", h.object_type);
    println!("  {:<36}{}", "Machine:", h.machine);
    println!("  {:<36}{:#x}", "Version:", h.version);
    println!("  {:<36}{:#x}", "Entry point address:", h.entry);
    println!("  {:<36}{} (bytes into file)", "Start of program headers:", h.phoff);
    println!("  {:<36}{} (bytes into file)", "Start of section headers:", h.shoff);
    println!("  {:<36}{:#x}", "Flags:", h.flags);
    println!("  {:<36}{} (bytes)", "Size of this header:", h.ehsize);
    println!("  {:<36}{} (bytes)", "Size of program headers:", h.phentsize);
    println!("  {:<36}{}", "Number of program headers:", h.phnum);
    println!("  {:<36}{} (bytes)", "Size of section headers:", h.shentsize);
    println!("  {:<36}{}", "Number of section headers:", h.shnum);
    println!("  {:<36}{}", "Section header string table index:", h.shstrndx);
    println!();
}

fn print_segments(segments: &[SegmentReport]) {
    println!("Program Headers:");
    println!(
        "  {:<16} {:>18} {:>18} {:>18} {:>18} {:>18} {:<5} {:>8}",
        "Type", "Offset", "VirtAddr", "PhysAddr", "FileSiz", "MemSiz", "Flg", "Align"
    );
    for seg in segments {
        println!(
            "  {:<16} {:#018x} {:#018x} {:#018x} {:#018x} {:#018x} {:<5} {:>#8x}",
            seg.kind, seg.offset, seg.vaddr, seg.paddr, seg.filesz, seg.memsz, seg.flags, seg.align
        );
        if let Some(problem) = &seg.problem {
            println!("      [{problem}]");
        }
    }
    println!();
    println!(" Section to Segment mapping:");
    for seg in segments {
        println!("  {:02}     {}", seg.index, seg.sections.join(" "));
    }
    println!();
}

fn print_sections(sections: &[SectionReport]) {
    println!("Section Headers:");
    println!(
        "  [{:>2}] {:<20} {:<16} {:>18} {:>10} {:>10} {:>6} {:<6} {:>4} {:>4} {:>5}  Content",
        "Nr", "Name", "Type", "Address", "Offset", "Size", "EntSz", "Flags", "Link", "Info",
        "Align"
    );
    for s in sections {
        println!(
            "  [{:>2}] {:<20} {:<16} {:#018x} {:#010x} {:#010x} {:>6x} {:<6} {:>4} {:>4} {:>5}  {}",
            s.index,
            s.name,
            s.kind,
            s.addr,
            s.offset,
            s.size,
            s.entsize,
            s.flags,
            s.link,
            s.info,
            s.addralign,
            s.content
        );
        if let Some(error) = &s.error {
            println!("       [{error}]");
        }
    }
    println!("Key to Flags:");
    println!("  W (write), A (alloc), X (execute), M (merge), S (strings), I (info),");
    println!("  L (link order), O (extra OS processing required), G (group), T (TLS),");
    println!("  C (compressed), E (exclude)");
    println!();
}

fn print_symbols(table: &SymbolTableReport) {
    println!(
        "Symbol table '{}' (section {}) contains {} entries:",
        table.name,
        table.section,
        table.symbols.len()
    );
    println!(
        "  {:>5}: {:<18} {:>6} {:<8} {:<7} {:<9} {:>5} Name",
        "Num", "Value", "Size", "Type", "Bind", "Vis", "Ndx"
    );
    for sym in &table.symbols {
        println!(
            "  {:>5}: {:016x} {:>6} {:<8} {:<7} {:<9} {:>5} {}",
            sym.index,
            sym.value,
            sym.size,
            sym.kind,
            sym.binding,
            sym.visibility,
            sym.section,
            sym.name
        );
        if let Some(error) = &sym.error {
            println!("         [{error}]");
        }
    }
    println!();
}

fn print_relocations(table: &RelocationTableReport) {
    let target = if table.target.is_empty() {
        String::new()
    } else {
        format!(" against '{}'", table.target)
    };
    println!(
        "Relocation section '{}'{target} contains {} entries:",
        table.name,
        table.entries.len()
    );
    println!(
        "  {:<12} {:<12} {:<24} {:<16} Symbol's Name{}",
        "Offset",
        "Info",
        "Type",
        "Sym. Value",
        if table.with_addend { " + Addend" } else { "" }
    );
    for entry in &table.entries {
        let ty = match entry.type_name {
            Some(name) => name.to_owned(),
            None => format!("<unknown: {:#x}>", entry.r_type),
        };
        let value = entry
            .symbol_value
            .map(|v| format!("{v:016x}"))
            .unwrap_or_default();
        let symbol = match (&entry.symbol, &entry.error) {
            (Some(name), _) => name.as_str(),
            (None, None) => "none",
            (None, Some(_)) => "",
        };
        let addend = match entry.addend {
            Some(a) if a < 0 => format!(" - {:x}", a.unsigned_abs()),
            Some(a) => format!(" + {a:x}"),
            None => String::new(),
        };
        println!(
            "  {:012x} {:012x} {:<24} {:<16} {symbol}{addend}",
            entry.offset, entry.info, ty, value
        );
        if let Some(error) = &entry.error {
            println!("      [{error}]");
        }
    }
    println!();
}

fn print_strings(table: &StringTableReport) {
    println!("String dump of section '{}':", table.name);
    for entry in &table.strings {
        println!("  [{:>6x}]  {}", entry.offset, entry.value);
    }
    println!();
}
