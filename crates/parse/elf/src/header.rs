//! ELF64 file header parsing.
//!
//! Decodes the 64-byte file header through a [`ByteCursor`] and checks that
//! the program and section header tables it describes fit inside the image.

use crate::cursor::ByteCursor;
use crate::error::{ElfError, Table};
use crate::types::{ElfClass, ElfData, ElfType, Machine, OsAbi};

/// ELF magic bytes: `\x7fELF`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Size of an ELF64 file header (64 bytes).
pub const ELF64_EHDR_SIZE: usize = 64;

/// Size of an ELF64 program header entry (56 bytes).
pub const ELF64_PHDR_SIZE: usize = 56;

/// Size of an ELF64 section header entry (64 bytes).
pub const ELF64_SHDR_SIZE: usize = 64;

/// The 16-byte `e_ident` block.
///
/// Everything after the class and encoding bytes is retained verbatim so the
/// header re-encodes exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
    /// `EI_MAG0..=EI_MAG3`.
    pub magic: [u8; 4],
    /// `EI_CLASS`. Always [`ElfClass::Elf64`] after a successful parse.
    pub class: ElfClass,
    /// `EI_DATA`. Always [`ElfData::Lsb`] after a successful parse.
    pub data: ElfData,
    /// `EI_VERSION`.
    pub version: u8,
    /// `EI_OSABI`.
    pub os_abi: OsAbi,
    /// `EI_ABIVERSION`.
    pub abi_version: u8,
    /// `EI_PAD`.
    pub padding: [u8; 7],
}

/// Parsed ELF64 file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Header {
    /// Identification block.
    pub ident: Ident,
    /// Object file type.
    pub e_type: ElfType,
    /// Target machine architecture.
    pub e_machine: Machine,
    /// Object file version.
    pub e_version: u32,
    /// Virtual address of the entry point.
    pub e_entry: u64,
    /// Offset of the program header table in the file.
    pub e_phoff: u64,
    /// Offset of the section header table in the file.
    pub e_shoff: u64,
    /// Processor-specific flags.
    pub e_flags: u32,
    /// Declared size of this header.
    pub e_ehsize: u16,
    /// Size of each program header entry.
    pub e_phentsize: u16,
    /// Number of program header entries.
    pub e_phnum: u16,
    /// Size of each section header entry.
    pub e_shentsize: u16,
    /// Number of section header entries.
    pub e_shnum: u16,
    /// Section header string table index.
    pub e_shstrndx: u16,
}

impl Elf64Header {
    /// Parse an ELF64 file header from the start of `data`.
    ///
    /// The magic is checked before anything else, then the header length,
    /// class and data encoding. Both header tables must lie within `data`
    /// and `e_shstrndx` must name a section whenever sections exist.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::BadMagic`], [`ElfError::UnsupportedClass`],
    /// [`ElfError::UnsupportedEncoding`], [`ElfError::OutOfBounds`],
    /// [`ElfError::UndersizedEntry`] or [`ElfError::InvalidNameTableIndex`].
    pub fn parse(data: &[u8]) -> Result<Self, ElfError> {
        let mut cursor = ByteCursor::new(data);

        if data.len() < ELF_MAGIC.len() {
            return Err(short_buffer(data, ELF_MAGIC.len()));
        }
        let magic = cursor.read_array::<4>()?;
        if magic != ELF_MAGIC {
            return Err(ElfError::BadMagic(magic));
        }
        if data.len() < ELF64_EHDR_SIZE {
            return Err(short_buffer(data, ELF64_EHDR_SIZE));
        }

        let class = cursor.read_u8()?;
        if ElfClass::from_raw(class) != ElfClass::Elf64 {
            return Err(ElfError::UnsupportedClass(class));
        }
        let encoding = cursor.read_u8()?;
        if ElfData::from_raw(encoding) != ElfData::Lsb {
            return Err(ElfError::UnsupportedEncoding(encoding));
        }

        let ident = Ident {
            magic,
            class: ElfClass::from_raw(class),
            data: ElfData::from_raw(encoding),
            version: cursor.read_u8()?,
            os_abi: OsAbi::from_raw(cursor.read_u8()?),
            abi_version: cursor.read_u8()?,
            padding: cursor.read_array()?,
        };

        let header = Self {
            ident,
            e_type: ElfType::from_raw(cursor.read_u16()?),
            e_machine: Machine::from_raw(cursor.read_u16()?),
            e_version: cursor.read_u32()?,
            e_entry: cursor.read_u64()?,
            e_phoff: cursor.read_u64()?,
            e_shoff: cursor.read_u64()?,
            e_flags: cursor.read_u32()?,
            e_ehsize: cursor.read_u16()?,
            e_phentsize: cursor.read_u16()?,
            e_phnum: cursor.read_u16()?,
            e_shentsize: cursor.read_u16()?,
            e_shnum: cursor.read_u16()?,
            e_shstrndx: cursor.read_u16()?,
        };

        check_table(
            data,
            Table::ProgramHeaders,
            header.e_phoff,
            header.e_phnum,
            header.e_phentsize,
            ELF64_PHDR_SIZE,
        )?;
        check_table(
            data,
            Table::SectionHeaders,
            header.e_shoff,
            header.e_shnum,
            header.e_shentsize,
            ELF64_SHDR_SIZE,
        )?;

        if header.e_shnum > 0 && header.e_shstrndx >= header.e_shnum {
            return Err(ElfError::InvalidNameTableIndex {
                index: header.e_shstrndx,
                count: header.e_shnum,
            });
        }

        Ok(header)
    }

    /// Re-encode the header into its 64-byte on-disk form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; ELF64_EHDR_SIZE] {
        let mut buf = [0u8; ELF64_EHDR_SIZE];
        buf[0..4].copy_from_slice(&self.ident.magic);
        buf[4] = self.ident.class.raw();
        buf[5] = self.ident.data.raw();
        buf[6] = self.ident.version;
        buf[7] = self.ident.os_abi.raw();
        buf[8] = self.ident.abi_version;
        buf[9..16].copy_from_slice(&self.ident.padding);
        buf[16..18].copy_from_slice(&self.e_type.raw().to_le_bytes());
        buf[18..20].copy_from_slice(&self.e_machine.raw().to_le_bytes());
        buf[20..24].copy_from_slice(&self.e_version.to_le_bytes());
        buf[24..32].copy_from_slice(&self.e_entry.to_le_bytes());
        buf[32..40].copy_from_slice(&self.e_phoff.to_le_bytes());
        buf[40..48].copy_from_slice(&self.e_shoff.to_le_bytes());
        buf[48..52].copy_from_slice(&self.e_flags.to_le_bytes());
        buf[52..54].copy_from_slice(&self.e_ehsize.to_le_bytes());
        buf[54..56].copy_from_slice(&self.e_phentsize.to_le_bytes());
        buf[56..58].copy_from_slice(&self.e_phnum.to_le_bytes());
        buf[58..60].copy_from_slice(&self.e_shentsize.to_le_bytes());
        buf[60..62].copy_from_slice(&self.e_shnum.to_le_bytes());
        buf[62..64].copy_from_slice(&self.e_shstrndx.to_le_bytes());
        buf
    }
}

fn short_buffer(data: &[u8], needed: usize) -> ElfError {
    ElfError::OutOfBounds {
        offset: 0,
        len: needed as u64,
        size: data.len() as u64,
    }
}

/// Validates the entry size and byte range of a header table.
fn check_table(
    data: &[u8],
    table: Table,
    offset: u64,
    count: u16,
    entry_size: u16,
    record_size: usize,
) -> Result<(), ElfError> {
    if count == 0 {
        return Ok(());
    }
    if usize::from(entry_size) < record_size {
        return Err(ElfError::UndersizedEntry {
            table,
            entry_size: u64::from(entry_size),
            required: record_size as u64,
        });
    }
    let len = u64::from(count) * u64::from(entry_size);
    let out_of_bounds = ElfError::OutOfBounds {
        offset,
        len,
        size: data.len() as u64,
    };
    let end = offset.checked_add(len).ok_or(out_of_bounds)?;
    if end > data.len() as u64 {
        return Err(out_of_bounds);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{ElfBuilder, make_elf_header};

    #[test]
    fn parse_valid_header() {
        let buf = make_elf_header();
        let hdr = Elf64Header::parse(&buf).expect("valid header");
        assert_eq!(hdr.ident.class, ElfClass::Elf64);
        assert_eq!(hdr.ident.data, ElfData::Lsb);
        assert_eq!(hdr.e_type, ElfType::Exec);
        assert_eq!(hdr.e_machine, Machine::X86_64);
        assert_eq!(hdr.e_entry, 0x0040_1000);
        assert_eq!(hdr.e_phoff, ELF64_EHDR_SIZE as u64);
        assert_eq!(hdr.e_phnum, 0);
        assert_eq!(hdr.e_phentsize, ELF64_PHDR_SIZE as u16);
    }

    #[test]
    fn round_trip_preserves_every_byte() {
        let mut buf = make_elf_header();
        buf[7] = 3; // ELFOSABI_GNU
        buf[8] = 1;
        buf[9..16].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7]);
        buf[16..18].copy_from_slice(&0xfe42u16.to_le_bytes());
        buf[18..20].copy_from_slice(&0x1234u16.to_le_bytes());
        buf[48..52].copy_from_slice(&0xdead_beefu32.to_le_bytes());
        let hdr = Elf64Header::parse(&buf).expect("valid header");
        assert_eq!(hdr.ident.os_abi, OsAbi::Gnu);
        assert_eq!(hdr.e_type, ElfType::Os(0xfe42));
        assert_eq!(hdr.e_machine, Machine::Unknown(0x1234));
        assert_eq!(hdr.to_bytes()[..], buf[..]);
    }

    #[test]
    fn round_trip_built_image() {
        let image = ElfBuilder::new().section(".text", 1, &[0x90; 4]).build();
        let hdr = Elf64Header::parse(&image).unwrap();
        assert_eq!(hdr.to_bytes()[..], image[..ELF64_EHDR_SIZE]);
    }

    #[test]
    fn reject_bad_magic() {
        let mut buf = make_elf_header();
        buf[0] = 0x00;
        assert_eq!(
            Elf64Header::parse(&buf),
            Err(ElfError::BadMagic([0x00, b'E', b'L', b'F']))
        );
    }

    #[test]
    fn magic_is_checked_before_length() {
        assert_eq!(
            Elf64Header::parse(b"MZ\x90\x00\x03"),
            Err(ElfError::BadMagic(*b"MZ\x90\x00"))
        );
    }

    #[test]
    fn reject_32bit_class() {
        let mut buf = make_elf_header();
        buf[4] = 1; // ELFCLASS32
        assert_eq!(Elf64Header::parse(&buf), Err(ElfError::UnsupportedClass(1)));
    }

    #[test]
    fn reject_big_endian() {
        let mut buf = make_elf_header();
        buf[5] = 2; // ELFDATA2MSB
        assert_eq!(
            Elf64Header::parse(&buf),
            Err(ElfError::UnsupportedEncoding(2))
        );
    }

    #[test]
    fn reject_truncated_data() {
        let buf = &make_elf_header()[..32];
        assert_eq!(
            Elf64Header::parse(buf),
            Err(ElfError::OutOfBounds {
                offset: 0,
                len: 64,
                size: 32,
            })
        );
    }

    #[test]
    fn reject_truncated_empty() {
        assert!(matches!(
            Elf64Header::parse(&[]),
            Err(ElfError::OutOfBounds { size: 0, .. })
        ));
    }

    #[test]
    fn reject_phdr_out_of_bounds() {
        let mut buf = make_elf_header();
        // Set phnum=1 but don't append any program header data
        buf[56..58].copy_from_slice(&1u16.to_le_bytes());
        assert_eq!(
            Elf64Header::parse(&buf),
            Err(ElfError::OutOfBounds {
                offset: 64,
                len: 56,
                size: 64,
            })
        );
    }

    #[test]
    fn reject_undersized_phentsize() {
        let mut buf = make_elf_header();
        buf[54..56].copy_from_slice(&32u16.to_le_bytes());
        buf[56..58].copy_from_slice(&1u16.to_le_bytes());
        buf.resize(256, 0);
        assert_eq!(
            Elf64Header::parse(&buf),
            Err(ElfError::UndersizedEntry {
                table: Table::ProgramHeaders,
                entry_size: 32,
                required: 56,
            })
        );
    }

    #[test]
    fn reject_overflowing_shoff() {
        let mut buf = make_elf_header();
        buf[40..48].copy_from_slice(&u64::MAX.to_le_bytes());
        buf[60..62].copy_from_slice(&1u16.to_le_bytes());
        assert!(matches!(
            Elf64Header::parse(&buf),
            Err(ElfError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn reject_bad_shstrndx() {
        let mut image = ElfBuilder::new().build();
        // Two sections (null + .shstrtab); point e_shstrndx past them.
        image[62..64].copy_from_slice(&2u16.to_le_bytes());
        assert_eq!(
            Elf64Header::parse(&image),
            Err(ElfError::InvalidNameTableIndex { index: 2, count: 2 })
        );
    }

    #[test]
    fn shstrndx_ignored_without_sections() {
        let mut buf = make_elf_header();
        buf[62..64].copy_from_slice(&9u16.to_le_bytes());
        assert!(Elf64Header::parse(&buf).is_ok());
    }
}
