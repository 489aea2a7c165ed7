//! In-memory ELF64 image builders shared by the unit tests.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::header::{ELF_MAGIC, ELF64_EHDR_SIZE, ELF64_PHDR_SIZE, ELF64_SHDR_SIZE};

pub(crate) const PT_LOAD: u32 = 1;
pub(crate) const PT_INTERP: u32 = 3;
pub(crate) const PF_X: u32 = 1;
pub(crate) const PF_W: u32 = 2;
pub(crate) const PF_R: u32 = 4;

pub(crate) const SHT_PROGBITS: u32 = 1;
pub(crate) const SHT_SYMTAB: u32 = 2;
pub(crate) const SHT_STRTAB: u32 = 3;
pub(crate) const SHT_RELA: u32 = 4;
pub(crate) const SHT_NOBITS: u32 = 8;
pub(crate) const SHT_REL: u32 = 9;
pub(crate) const SHT_DYNSYM: u32 = 11;

pub(crate) const SHF_WRITE: u64 = 0x1;
pub(crate) const SHF_ALLOC: u64 = 0x2;
pub(crate) const SHF_EXECINSTR: u64 = 0x4;
pub(crate) const SHF_INFO_LINK: u64 = 0x40;

/// Build a minimal valid ELF64 header (64 bytes) as a `Vec<u8>`.
///
/// Defaults: `ET_EXEC`, `EM_X86_64`, entry=0x401000, phoff=64, phnum=0, phentsize=56.
/// Section header fields default to 0 (no sections).
pub(crate) fn make_elf_header() -> Vec<u8> {
    let mut buf = vec![0u8; ELF64_EHDR_SIZE];
    buf[0..4].copy_from_slice(&ELF_MAGIC);
    buf[4] = 2; // ELFCLASS64
    buf[5] = 1; // ELFDATA2LSB
    buf[6] = 1; // EV_CURRENT
    buf[16..18].copy_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    buf[18..20].copy_from_slice(&62u16.to_le_bytes()); // EM_X86_64
    buf[20..24].copy_from_slice(&1u32.to_le_bytes());
    buf[24..32].copy_from_slice(&0x0040_1000u64.to_le_bytes());
    buf[32..40].copy_from_slice(&(ELF64_EHDR_SIZE as u64).to_le_bytes());
    buf[52..54].copy_from_slice(&(ELF64_EHDR_SIZE as u16).to_le_bytes());
    buf[54..56].copy_from_slice(&(ELF64_PHDR_SIZE as u16).to_le_bytes());
    buf[58..60].copy_from_slice(&(ELF64_SHDR_SIZE as u16).to_le_bytes());
    buf
}

/// Append a program header to the given ELF buffer and bump `e_phnum`.
///
/// `p_paddr` mirrors `p_vaddr` and `p_align` is 0x1000.
pub(crate) fn append_phdr(
    buf: &mut Vec<u8>,
    p_type: u32,
    p_flags: u32,
    p_offset: u64,
    p_vaddr: u64,
    p_filesz: u64,
    p_memsz: u64,
) {
    let start = buf.len();
    buf.resize(start + ELF64_PHDR_SIZE, 0);
    let b = &mut buf[start..];

    b[0..4].copy_from_slice(&p_type.to_le_bytes());
    b[4..8].copy_from_slice(&p_flags.to_le_bytes());
    b[8..16].copy_from_slice(&p_offset.to_le_bytes());
    b[16..24].copy_from_slice(&p_vaddr.to_le_bytes());
    b[24..32].copy_from_slice(&p_vaddr.to_le_bytes());
    b[32..40].copy_from_slice(&p_filesz.to_le_bytes());
    b[40..48].copy_from_slice(&p_memsz.to_le_bytes());
    b[48..56].copy_from_slice(&0x1000u64.to_le_bytes());

    let phnum = u16::from_le_bytes([buf[56], buf[57]]) + 1;
    buf[56..58].copy_from_slice(&phnum.to_le_bytes());
}

/// Build a symbol entry as raw bytes.
pub(crate) fn sym(
    st_name: u32,
    st_info: u8,
    st_other: u8,
    st_shndx: u16,
    st_value: u64,
    st_size: u64,
) -> [u8; 24] {
    let mut b = [0u8; 24];
    b[0..4].copy_from_slice(&st_name.to_le_bytes());
    b[4] = st_info;
    b[5] = st_other;
    b[6..8].copy_from_slice(&st_shndx.to_le_bytes());
    b[8..16].copy_from_slice(&st_value.to_le_bytes());
    b[16..24].copy_from_slice(&st_size.to_le_bytes());
    b
}

/// Build a `REL` entry as raw bytes.
pub(crate) fn rel(r_offset: u64, r_sym: u32, r_type: u32) -> [u8; 16] {
    let mut b = [0u8; 16];
    b[0..8].copy_from_slice(&r_offset.to_le_bytes());
    b[8..16].copy_from_slice(&((u64::from(r_sym) << 32) | u64::from(r_type)).to_le_bytes());
    b
}

/// Build a `RELA` entry as raw bytes.
pub(crate) fn rela(r_offset: u64, r_sym: u32, r_type: u32, r_addend: i64) -> [u8; 24] {
    let mut b = [0u8; 24];
    b[..16].copy_from_slice(&rel(r_offset, r_sym, r_type));
    b[16..24].copy_from_slice(&r_addend.to_le_bytes());
    b
}

/// Concatenate `parts` into one buffer.
pub(crate) fn concat<const N: usize>(parts: &[[u8; N]]) -> Vec<u8> {
    parts.iter().flatten().copied().collect()
}

struct PendingSection {
    name: String,
    sh_type: u32,
    flags: u64,
    addr: u64,
    link: u32,
    info: u32,
    entsize: u64,
    size: Option<u64>,
    data: Vec<u8>,
}

struct PendingSegment {
    p_type: u32,
    p_flags: u32,
    covers: Option<usize>,
}

/// Lays out a complete image: header, program headers, section data,
/// section header table.
///
/// Section 0 is the null section. Sections added with
/// [`section`](Self::section) get indices 1, 2, ... in order, and
/// `.shstrtab` is appended last. The chained setters (`link`, `info`, ...)
/// apply to the most recently added section.
pub(crate) struct ElfBuilder {
    e_type: u16,
    machine: u16,
    segments: Vec<PendingSegment>,
    sections: Vec<PendingSection>,
}

impl ElfBuilder {
    pub(crate) fn new() -> Self {
        Self {
            e_type: 2,
            machine: 62,
            segments: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub(crate) fn e_type(mut self, e_type: u16) -> Self {
        self.e_type = e_type;
        self
    }

    pub(crate) fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    /// Adds a segment. With `covers = Some(i)` it spans exactly section `i`.
    pub(crate) fn segment(mut self, p_type: u32, p_flags: u32, covers: Option<usize>) -> Self {
        self.segments.push(PendingSegment {
            p_type,
            p_flags,
            covers,
        });
        self
    }

    pub(crate) fn section(mut self, name: &str, sh_type: u32, data: &[u8]) -> Self {
        self.sections.push(PendingSection {
            name: name.into(),
            sh_type,
            flags: 0,
            addr: 0,
            link: 0,
            info: 0,
            entsize: match sh_type {
                SHT_SYMTAB | SHT_DYNSYM | SHT_RELA => 24,
                SHT_REL => 16,
                _ => 0,
            },
            size: None,
            data: data.to_vec(),
        });
        self
    }

    fn last(&mut self) -> &mut PendingSection {
        self.sections.last_mut().expect("no section added yet")
    }

    pub(crate) fn link(mut self, link: u32) -> Self {
        self.last().link = link;
        self
    }

    pub(crate) fn info(mut self, info: u32) -> Self {
        self.last().info = info;
        self
    }

    pub(crate) fn entsize(mut self, entsize: u64) -> Self {
        self.last().entsize = entsize;
        self
    }

    pub(crate) fn flags(mut self, flags: u64) -> Self {
        self.last().flags = flags;
        self
    }

    pub(crate) fn addr(mut self, addr: u64) -> Self {
        self.last().addr = addr;
        self
    }

    /// Overrides `sh_size` (the only way to give `SHT_NOBITS` a size).
    pub(crate) fn size(mut self, size: u64) -> Self {
        self.last().size = Some(size);
        self
    }

    pub(crate) fn build(mut self) -> Vec<u8> {
        let mut names = vec![0u8];
        let mut name_offsets = Vec::new();
        self.sections.push(PendingSection {
            name: ".shstrtab".into(),
            sh_type: SHT_STRTAB,
            flags: 0,
            addr: 0,
            link: 0,
            info: 0,
            entsize: 0,
            size: None,
            data: Vec::new(),
        });
        for section in &self.sections {
            name_offsets.push(names.len() as u32);
            names.extend_from_slice(section.name.as_bytes());
            names.push(0);
        }
        if let Some(shstrtab) = self.sections.last_mut() {
            shstrtab.data = names;
        }

        let mut buf = make_elf_header();
        buf[16..18].copy_from_slice(&self.e_type.to_le_bytes());
        buf[18..20].copy_from_slice(&self.machine.to_le_bytes());

        let phdr_start = buf.len();
        buf.resize(phdr_start + self.segments.len() * ELF64_PHDR_SIZE, 0);

        // (offset, size) of every section, null section first.
        let mut layout = vec![(0u64, 0u64)];
        for section in &self.sections {
            buf.resize(buf.len().next_multiple_of(8), 0);
            let offset = buf.len() as u64;
            let size = if section.sh_type == SHT_NOBITS {
                section.size.unwrap_or(0)
            } else {
                buf.extend_from_slice(&section.data);
                section.size.unwrap_or(section.data.len() as u64)
            };
            layout.push((offset, size));
        }

        buf.resize(buf.len().next_multiple_of(8), 0);
        let shoff = buf.len() as u64;
        let shnum = self.sections.len() as u16 + 1;
        buf[40..48].copy_from_slice(&shoff.to_le_bytes());
        buf[60..62].copy_from_slice(&shnum.to_le_bytes());
        buf[62..64].copy_from_slice(&(shnum - 1).to_le_bytes());

        buf.extend_from_slice(&[0u8; ELF64_SHDR_SIZE]);
        for (i, section) in self.sections.iter().enumerate() {
            let (offset, size) = layout[i + 1];
            let mut b = [0u8; ELF64_SHDR_SIZE];
            b[0..4].copy_from_slice(&name_offsets[i].to_le_bytes());
            b[4..8].copy_from_slice(&section.sh_type.to_le_bytes());
            b[8..16].copy_from_slice(&section.flags.to_le_bytes());
            b[16..24].copy_from_slice(&section.addr.to_le_bytes());
            b[24..32].copy_from_slice(&offset.to_le_bytes());
            b[32..40].copy_from_slice(&size.to_le_bytes());
            b[40..44].copy_from_slice(&section.link.to_le_bytes());
            b[44..48].copy_from_slice(&section.info.to_le_bytes());
            b[48..56].copy_from_slice(&1u64.to_le_bytes());
            b[56..64].copy_from_slice(&section.entsize.to_le_bytes());
            buf.extend_from_slice(&b);
        }

        buf[56..58].copy_from_slice(&(self.segments.len() as u16).to_le_bytes());
        for (n, segment) in self.segments.iter().enumerate() {
            let (offset, size, vaddr) = match segment.covers {
                Some(i) => (layout[i].0, layout[i].1, self.sections[i - 1].addr),
                None => (0, 0, 0),
            };
            let filesz = match segment.covers {
                Some(i) if self.sections[i - 1].sh_type == SHT_NOBITS => 0,
                _ => size,
            };
            let start = phdr_start + n * ELF64_PHDR_SIZE;
            let b = &mut buf[start..start + ELF64_PHDR_SIZE];
            b[0..4].copy_from_slice(&segment.p_type.to_le_bytes());
            b[4..8].copy_from_slice(&segment.p_flags.to_le_bytes());
            b[8..16].copy_from_slice(&offset.to_le_bytes());
            b[16..24].copy_from_slice(&vaddr.to_le_bytes());
            b[24..32].copy_from_slice(&vaddr.to_le_bytes());
            b[32..40].copy_from_slice(&filesz.to_le_bytes());
            b[40..48].copy_from_slice(&size.to_le_bytes());
            b[48..56].copy_from_slice(&1u64.to_le_bytes());
        }

        buf
    }
}

/// A relocatable object with a symbol table, a function, a data object,
/// and `.rela.text` / `.rel.data` tables against them.
///
/// | idx | name        | type     |
/// |-----|-------------|----------|
/// | 1   | `.text`     | PROGBITS |
/// | 2   | `.data`     | PROGBITS |
/// | 3   | `.bss`      | NOBITS   |
/// | 4   | `.symtab`   | SYMTAB   |
/// | 5   | `.strtab`   | STRTAB   |
/// | 6   | `.rela.text`| RELA     |
/// | 7   | `.rel.data` | REL      |
/// | 8   | `.shstrtab` | STRTAB   |
///
/// Symbols: 0 null, 1 `.text` section symbol, 2 `counter` (local hidden
/// object in `.data`), 3 `main` (global func in `.text`), 4 `printf`
/// (undefined global), 5 `abs_val` (absolute).
///
/// `.rela.text`: `printf` `R_X86_64_PLT32` -4 at 0x14, `.text`
/// `R_X86_64_PC32` +16 at 0x1c. `.rel.data`: `counter` `R_X86_64_64` at 0,
/// `R_X86_64_RELATIVE` with no symbol at 8.
pub(crate) fn sample_object() -> Vec<u8> {
    let strtab = b"\0main\0counter\0printf\0abs_val\0";
    let symbols = concat(&[
        sym(0, 0, 0, 0, 0, 0),
        sym(0, 0x03, 0, 1, 0, 0),
        sym(6, 0x01, 0x02, 2, 0, 8),
        sym(1, 0x12, 0, 1, 0x10, 0x20),
        sym(14, 0x10, 0, 0, 0, 0),
        sym(21, 0x10, 0, 0xfff1, 0x1234, 0),
    ]);
    let rela_text = concat(&[rela(0x14, 4, 4, -4), rela(0x1c, 1, 2, 16)]);
    let rel_data = concat(&[rel(0, 2, 1), rel(8, 0, 8)]);

    ElfBuilder::new()
        .e_type(1)
        .section(".text", SHT_PROGBITS, &[0x90; 0x30])
        .flags(SHF_ALLOC | SHF_EXECINSTR)
        .section(".data", SHT_PROGBITS, &[0; 16])
        .flags(SHF_ALLOC | SHF_WRITE)
        .section(".bss", SHT_NOBITS, &[])
        .flags(SHF_ALLOC | SHF_WRITE)
        .size(0x40)
        .section(".symtab", SHT_SYMTAB, &symbols)
        .link(5)
        .info(3)
        .section(".strtab", SHT_STRTAB, strtab)
        .section(".rela.text", SHT_RELA, &rela_text)
        .link(4)
        .info(1)
        .flags(SHF_INFO_LINK)
        .section(".rel.data", SHT_REL, &rel_data)
        .link(4)
        .info(2)
        .flags(SHF_INFO_LINK)
        .build()
}

/// A small executable with `.interp`, `.text`, `.bss` and three segments.
///
/// | idx | name        | type     |
/// |-----|-------------|----------|
/// | 1   | `.interp`   | PROGBITS |
/// | 2   | `.text`     | PROGBITS |
/// | 3   | `.bss`      | NOBITS   |
/// | 4   | `.shstrtab` | STRTAB   |
///
/// Segments: 0 `PT_INTERP` over `.interp`, 1 `PT_LOAD` over `.text`,
/// 2 `PT_LOAD` over `.bss`.
pub(crate) fn sample_executable() -> Vec<u8> {
    ElfBuilder::new()
        .segment(PT_INTERP, PF_R, Some(1))
        .segment(PT_LOAD, PF_R | PF_X, Some(2))
        .segment(PT_LOAD, PF_R | PF_W, Some(3))
        .section(".interp", SHT_PROGBITS, b"/lib64/ld-linux-x86-64.so.2\0")
        .flags(SHF_ALLOC)
        .addr(0x40_0200)
        .section(".text", SHT_PROGBITS, &[0xc3; 0x20])
        .flags(SHF_ALLOC | SHF_EXECINSTR)
        .addr(0x40_1000)
        .section(".bss", SHT_NOBITS, &[])
        .flags(SHF_ALLOC | SHF_WRITE)
        .addr(0x40_3000)
        .size(0x100)
        .build()
}
