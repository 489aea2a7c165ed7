//! Enumerated ELF64 constants.
//!
//! Every enumeration is closed over the values this crate knows about, plus
//! range variants for the OS- and processor-reserved ranges and an
//! `Unknown(raw)` fallback. Decoding never fails on an unrecognized value and
//! [`raw`](ElfType::raw) always returns the exact number that was read.

use core::fmt;

/// Defines a closed constant table over a raw integer type.
///
/// Exact values are matched before ranges, so a well-known value inside an
/// OS or processor range (e.g. `PT_GNU_STACK`) gets its own variant.
macro_rules! elf_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident($raw:ty) {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $label:literal, )+
        }
        ranges {
            $( $(#[$rmeta:meta])* $range:ident = $lo:literal ..= $hi:literal => $rlabel:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            $( $(#[$rmeta])* $range($raw), )*
            /// A value outside every known value and range.
            Unknown($raw),
        }

        impl $name {
            /// Classifies a raw value.
            #[must_use]
            pub const fn from_raw(raw: $raw) -> Self {
                match raw {
                    $( $value => Self::$variant, )+
                    $( $lo..=$hi => Self::$range(raw), )*
                    _ => Self::Unknown(raw),
                }
            }

            /// Returns the raw value this variant was decoded from.
            #[must_use]
            pub const fn raw(self) -> $raw {
                match self {
                    $( Self::$variant => $value, )+
                    $( Self::$range(raw) => raw, )*
                    Self::Unknown(raw) => raw,
                }
            }

            /// Returns the conventional name of a known value.
            #[must_use]
            pub const fn name(self) -> Option<&'static str> {
                match self {
                    $( Self::$variant => Some($label), )+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( Self::$variant => f.write_str($label), )+
                    $( Self::$range(raw) => write!(f, "{}+{:#x}", $rlabel, raw - $lo), )*
                    Self::Unknown(raw) => write!(f, "<unknown: {:#x}>", raw),
                }
            }
        }
    };
}

elf_enum! {
    /// `EI_CLASS`: word size of the file.
    pub enum ElfClass(u8) {
        /// `ELFCLASSNONE`.
        None = 0 => "none",
        /// `ELFCLASS32`.
        Elf32 = 1 => "ELF32",
        /// `ELFCLASS64`.
        Elf64 = 2 => "ELF64",
    }
    ranges {}
}

elf_enum! {
    /// `EI_DATA`: byte order of multi-byte fields.
    pub enum ElfData(u8) {
        /// `ELFDATANONE`.
        None = 0 => "none",
        /// `ELFDATA2LSB`.
        Lsb = 1 => "2's complement, little endian",
        /// `ELFDATA2MSB`.
        Msb = 2 => "2's complement, big endian",
    }
    ranges {}
}

elf_enum! {
    /// `EI_OSABI`: target operating system ABI.
    pub enum OsAbi(u8) {
        /// `ELFOSABI_SYSV`.
        SystemV = 0 => "UNIX - System V",
        /// `ELFOSABI_HPUX`.
        HpUx = 1 => "UNIX - HP-UX",
        /// `ELFOSABI_NETBSD`.
        NetBsd = 2 => "UNIX - NetBSD",
        /// `ELFOSABI_GNU` / `ELFOSABI_LINUX`.
        Gnu = 3 => "UNIX - GNU",
        /// `ELFOSABI_HURD`.
        Hurd = 4 => "GNU/Hurd",
        /// `ELFOSABI_SOLARIS`.
        Solaris = 6 => "UNIX - Solaris",
        /// `ELFOSABI_AIX`.
        Aix = 7 => "UNIX - AIX",
        /// `ELFOSABI_IRIX`.
        Irix = 8 => "UNIX - IRIX",
        /// `ELFOSABI_FREEBSD`.
        FreeBsd = 9 => "UNIX - FreeBSD",
        /// `ELFOSABI_TRU64`.
        Tru64 = 10 => "UNIX - TRU64",
        /// `ELFOSABI_MODESTO`.
        Modesto = 11 => "Novell - Modesto",
        /// `ELFOSABI_OPENBSD`.
        OpenBsd = 12 => "UNIX - OpenBSD",
        /// `ELFOSABI_OPENVMS`.
        OpenVms = 13 => "VMS - OpenVMS",
        /// `ELFOSABI_NSK`.
        Nsk = 14 => "HP - Non-Stop Kernel",
        /// `ELFOSABI_AROS`.
        Aros = 15 => "AROS",
        /// `ELFOSABI_FENIXOS`.
        FenixOs = 16 => "FenixOS",
        /// `ELFOSABI_CLOUDABI`.
        CloudAbi = 17 => "Nuxi CloudABI",
        /// `ELFOSABI_OPENVOS`.
        OpenVos = 18 => "Stratus Technologies OpenVOS",
        /// `ELFOSABI_STANDALONE`.
        Standalone = 255 => "Standalone App",
    }
    ranges {
        /// Architecture-specific ABI (64..=255).
        Processor = 64..=255 => "ARCH",
    }
}

elf_enum! {
    /// `e_type`: object file type.
    pub enum ElfType(u16) {
        /// `ET_NONE`.
        None = 0 => "NONE (None)",
        /// `ET_REL`.
        Rel = 1 => "REL (Relocatable file)",
        /// `ET_EXEC`.
        Exec = 2 => "EXEC (Executable file)",
        /// `ET_DYN`.
        Dyn = 3 => "DYN (Shared object file)",
        /// `ET_CORE`.
        Core = 4 => "CORE (Core file)",
    }
    ranges {
        /// `ET_LOOS..=ET_HIOS`.
        Os = 0xfe00..=0xfeff => "LOOS",
        /// `ET_LOPROC..=ET_HIPROC`.
        Processor = 0xff00..=0xffff => "LOPROC",
    }
}

elf_enum! {
    /// `e_machine`: target instruction set architecture.
    pub enum Machine(u16) {
        /// `EM_NONE`.
        None = 0 => "None",
        /// `EM_SPARC`.
        Sparc = 2 => "Sparc",
        /// `EM_386`.
        X86 = 3 => "Intel 80386",
        /// `EM_68K`.
        M68k = 4 => "MC68000",
        /// `EM_MIPS`.
        Mips = 8 => "MIPS R3000",
        /// `EM_PPC`.
        PowerPc = 20 => "PowerPC",
        /// `EM_PPC64`.
        PowerPc64 = 21 => "PowerPC64",
        /// `EM_S390`.
        S390 = 22 => "IBM S/390",
        /// `EM_ARM`.
        Arm = 40 => "ARM",
        /// `EM_SH`.
        SuperH = 42 => "Renesas / SuperH SH",
        /// `EM_SPARCV9`.
        SparcV9 = 43 => "Sparc v9",
        /// `EM_IA_64`.
        Ia64 = 50 => "Intel IA-64",
        /// `EM_X86_64`.
        X86_64 = 62 => "Advanced Micro Devices X86-64",
        /// `EM_AARCH64`.
        AArch64 = 183 => "AArch64",
        /// `EM_RISCV`.
        RiscV = 243 => "RISC-V",
        /// `EM_BPF`.
        Bpf = 247 => "Linux BPF",
        /// `EM_LOONGARCH`.
        LoongArch = 258 => "LoongArch",
    }
    ranges {}
}

elf_enum! {
    /// `p_type`: program header (segment) type.
    pub enum SegmentType(u32) {
        /// `PT_NULL`.
        Null = 0 => "NULL",
        /// `PT_LOAD`.
        Load = 1 => "LOAD",
        /// `PT_DYNAMIC`.
        Dynamic = 2 => "DYNAMIC",
        /// `PT_INTERP`.
        Interp = 3 => "INTERP",
        /// `PT_NOTE`.
        Note = 4 => "NOTE",
        /// `PT_SHLIB`.
        Shlib = 5 => "SHLIB",
        /// `PT_PHDR`.
        Phdr = 6 => "PHDR",
        /// `PT_TLS`.
        Tls = 7 => "TLS",
        /// `PT_GNU_EH_FRAME`.
        GnuEhFrame = 0x6474_e550 => "GNU_EH_FRAME",
        /// `PT_GNU_STACK`.
        GnuStack = 0x6474_e551 => "GNU_STACK",
        /// `PT_GNU_RELRO`.
        GnuRelro = 0x6474_e552 => "GNU_RELRO",
        /// `PT_GNU_PROPERTY`.
        GnuProperty = 0x6474_e553 => "GNU_PROPERTY",
    }
    ranges {
        /// `PT_LOOS..=PT_HIOS`.
        Os = 0x6000_0000..=0x6fff_ffff => "LOOS",
        /// `PT_LOPROC..=PT_HIPROC`.
        Processor = 0x7000_0000..=0x7fff_ffff => "LOPROC",
    }
}

elf_enum! {
    /// `sh_type`: section type.
    pub enum SectionType(u32) {
        /// `SHT_NULL`: inactive header.
        Null = 0 => "NULL",
        /// `SHT_PROGBITS`: program-defined contents.
        Progbits = 1 => "PROGBITS",
        /// `SHT_SYMTAB`: link-time symbol table.
        SymTab = 2 => "SYMTAB",
        /// `SHT_STRTAB`: string table.
        StrTab = 3 => "STRTAB",
        /// `SHT_RELA`: relocations with addends.
        Rela = 4 => "RELA",
        /// `SHT_HASH`: symbol hash table.
        Hash = 5 => "HASH",
        /// `SHT_DYNAMIC`: dynamic linking information.
        Dynamic = 6 => "DYNAMIC",
        /// `SHT_NOTE`: notes.
        Note = 7 => "NOTE",
        /// `SHT_NOBITS`: occupies memory but no file bytes.
        NoBits = 8 => "NOBITS",
        /// `SHT_REL`: relocations without addends.
        Rel = 9 => "REL",
        /// `SHT_SHLIB`: reserved.
        Shlib = 10 => "SHLIB",
        /// `SHT_DYNSYM`: dynamic linker symbol table.
        DynSym = 11 => "DYNSYM",
        /// `SHT_INIT_ARRAY`: constructors.
        InitArray = 14 => "INIT_ARRAY",
        /// `SHT_FINI_ARRAY`: destructors.
        FiniArray = 15 => "FINI_ARRAY",
        /// `SHT_PREINIT_ARRAY`: pre-constructors.
        PreinitArray = 16 => "PREINIT_ARRAY",
        /// `SHT_GROUP`: section group.
        Group = 17 => "GROUP",
        /// `SHT_SYMTAB_SHNDX`: extended section indices.
        SymTabShndx = 18 => "SYMTAB SECTION INDICES",
        /// `SHT_GNU_ATTRIBUTES`.
        GnuAttributes = 0x6fff_fff5 => "GNU_ATTRIBUTES",
        /// `SHT_GNU_HASH`.
        GnuHash = 0x6fff_fff6 => "GNU_HASH",
        /// `SHT_GNU_verdef`.
        GnuVerDef = 0x6fff_fffd => "VERDEF",
        /// `SHT_GNU_verneed`.
        GnuVerNeed = 0x6fff_fffe => "VERNEED",
        /// `SHT_GNU_versym`.
        GnuVerSym = 0x6fff_ffff => "VERSYM",
    }
    ranges {
        /// `SHT_LOOS..=SHT_HIOS`.
        Os = 0x6000_0000..=0x6fff_ffff => "LOOS",
        /// `SHT_LOPROC..=SHT_HIPROC`.
        Processor = 0x7000_0000..=0x7fff_ffff => "LOPROC",
        /// `SHT_LOUSER..=SHT_HIUSER`.
        User = 0x8000_0000..=0xffff_ffff => "LOUSER",
    }
}

elf_enum! {
    /// Symbol binding (high nibble of `st_info`).
    pub enum SymbolBinding(u8) {
        /// `STB_LOCAL`.
        Local = 0 => "LOCAL",
        /// `STB_GLOBAL`.
        Global = 1 => "GLOBAL",
        /// `STB_WEAK`.
        Weak = 2 => "WEAK",
        /// `STB_GNU_UNIQUE`.
        GnuUnique = 10 => "UNIQUE",
    }
    ranges {
        /// `STB_LOOS..=STB_HIOS`.
        Os = 10..=12 => "LOOS",
        /// `STB_LOPROC..=STB_HIPROC`.
        Processor = 13..=15 => "LOPROC",
    }
}

elf_enum! {
    /// Symbol type (low nibble of `st_info`).
    pub enum SymbolType(u8) {
        /// `STT_NOTYPE`.
        NoType = 0 => "NOTYPE",
        /// `STT_OBJECT`.
        Object = 1 => "OBJECT",
        /// `STT_FUNC`.
        Func = 2 => "FUNC",
        /// `STT_SECTION`.
        Section = 3 => "SECTION",
        /// `STT_FILE`.
        File = 4 => "FILE",
        /// `STT_COMMON`.
        Common = 5 => "COMMON",
        /// `STT_TLS`.
        Tls = 6 => "TLS",
        /// `STT_GNU_IFUNC`.
        GnuIfunc = 10 => "IFUNC",
    }
    ranges {
        /// `STT_LOOS..=STT_HIOS`.
        Os = 10..=12 => "LOOS",
        /// `STT_LOPROC..=STT_HIPROC`.
        Processor = 13..=15 => "LOPROC",
    }
}

elf_enum! {
    /// Symbol visibility (low two bits of `st_other`).
    pub enum SymbolVisibility(u8) {
        /// `STV_DEFAULT`.
        Default = 0 => "DEFAULT",
        /// `STV_INTERNAL`.
        Internal = 1 => "INTERNAL",
        /// `STV_HIDDEN`.
        Hidden = 2 => "HIDDEN",
        /// `STV_PROTECTED`.
        Protected = 3 => "PROTECTED",
    }
    ranges {}
}

/// `SHN_UNDEF`.
pub const SHN_UNDEF: u16 = 0;
/// `SHN_LORESERVE`: first reserved section index.
pub const SHN_LORESERVE: u16 = 0xff00;
/// `SHN_ABS`.
pub const SHN_ABS: u16 = 0xfff1;
/// `SHN_COMMON`.
pub const SHN_COMMON: u16 = 0xfff2;
/// `SHN_XINDEX`.
pub const SHN_XINDEX: u16 = 0xffff;

/// A symbol's `st_shndx`, with the reserved indices split out.
///
/// Only [`SectionIndex::Regular`] refers to the section header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionIndex {
    /// `SHN_UNDEF`: the symbol is undefined.
    Undefined,
    /// `SHN_ABS`: the value is absolute.
    Absolute,
    /// `SHN_COMMON`: an unallocated common block.
    Common,
    /// `SHN_XINDEX`: the real index lives in a `SHT_SYMTAB_SHNDX` section.
    ExtendedIndex,
    /// `SHN_LOPROC..=SHN_HIPROC`.
    Processor(u16),
    /// `SHN_LOOS..=SHN_HIOS`.
    Os(u16),
    /// Any other value in the reserved range.
    Reserved(u16),
    /// An index into the section header table.
    Regular(u16),
}

impl SectionIndex {
    /// Classifies a raw `st_shndx`.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            SHN_UNDEF => Self::Undefined,
            SHN_ABS => Self::Absolute,
            SHN_COMMON => Self::Common,
            SHN_XINDEX => Self::ExtendedIndex,
            0xff00..=0xff1f => Self::Processor(raw),
            0xff20..=0xff3f => Self::Os(raw),
            SHN_LORESERVE..=0xffff => Self::Reserved(raw),
            _ => Self::Regular(raw),
        }
    }

    /// Returns the raw `st_shndx` value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        match self {
            Self::Undefined => SHN_UNDEF,
            Self::Absolute => SHN_ABS,
            Self::Common => SHN_COMMON,
            Self::ExtendedIndex => SHN_XINDEX,
            Self::Processor(raw) | Self::Os(raw) | Self::Reserved(raw) | Self::Regular(raw) => {
                raw
            }
        }
    }
}

impl fmt::Display for SectionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("UND"),
            Self::Absolute => f.write_str("ABS"),
            Self::Common => f.write_str("COM"),
            Self::ExtendedIndex => f.write_str("XINDEX"),
            Self::Processor(raw) => write!(f, "PRC[{raw:#06x}]"),
            Self::Os(raw) => write!(f, "OS[{raw:#06x}]"),
            Self::Reserved(raw) => write!(f, "RSV[{raw:#06x}]"),
            Self::Regular(raw) => write!(f, "{raw}"),
        }
    }
}

bitflags::bitflags! {
    /// `p_flags`: segment permissions.
    ///
    /// Bits outside the named flags (OS/processor masks) are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SegmentFlags: u32 {
        /// `PF_X`: executable.
        const X = 0x1;
        /// `PF_W`: writable.
        const W = 0x2;
        /// `PF_R`: readable.
        const R = 0x4;
    }
}

impl fmt::Display for SegmentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = |flag: Self, c: char| if self.contains(flag) { c } else { ' ' };
        write!(
            f,
            "{}{}{}",
            letter(Self::R, 'R'),
            letter(Self::W, 'W'),
            letter(Self::X, 'E')
        )?;
        let unknown = self.bits() & !Self::all().bits();
        if unknown != 0 {
            write!(f, " +{unknown:#x}")?;
        }
        Ok(())
    }
}

bitflags::bitflags! {
    /// `sh_flags`: section attributes.
    ///
    /// Bits outside the named flags (OS/processor masks) are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SectionFlags: u64 {
        /// `SHF_WRITE`.
        const WRITE = 0x1;
        /// `SHF_ALLOC`.
        const ALLOC = 0x2;
        /// `SHF_EXECINSTR`.
        const EXECINSTR = 0x4;
        /// `SHF_MERGE`.
        const MERGE = 0x10;
        /// `SHF_STRINGS`.
        const STRINGS = 0x20;
        /// `SHF_INFO_LINK`: `sh_info` holds a section index.
        const INFO_LINK = 0x40;
        /// `SHF_LINK_ORDER`.
        const LINK_ORDER = 0x80;
        /// `SHF_OS_NONCONFORMING`.
        const OS_NONCONFORMING = 0x100;
        /// `SHF_GROUP`.
        const GROUP = 0x200;
        /// `SHF_TLS`.
        const TLS = 0x400;
        /// `SHF_COMPRESSED`.
        const COMPRESSED = 0x800;
        /// `SHF_EXCLUDE`.
        const EXCLUDE = 0x8000_0000;
    }
}

impl fmt::Display for SectionFlags {
    /// Renders the readelf key letters (`WAXMSILOGTCE`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KEYS: [(SectionFlags, char); 12] = [
            (SectionFlags::WRITE, 'W'),
            (SectionFlags::ALLOC, 'A'),
            (SectionFlags::EXECINSTR, 'X'),
            (SectionFlags::MERGE, 'M'),
            (SectionFlags::STRINGS, 'S'),
            (SectionFlags::INFO_LINK, 'I'),
            (SectionFlags::LINK_ORDER, 'L'),
            (SectionFlags::OS_NONCONFORMING, 'O'),
            (SectionFlags::GROUP, 'G'),
            (SectionFlags::TLS, 'T'),
            (SectionFlags::COMPRESSED, 'C'),
            (SectionFlags::EXCLUDE, 'E'),
        ];
        for (flag, key) in KEYS {
            if self.contains(flag) {
                write!(f, "{key}")?;
            }
        }
        let unknown = self.bits() & !Self::all().bits();
        if unknown != 0 {
            write!(f, "+{unknown:#x}")?;
        }
        Ok(())
    }
}
