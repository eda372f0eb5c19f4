//! ELF-symbols tag (kind 9): section headers of the running kernel image.

use nucleus_core::addr::PhysAddr;

bitflags::bitflags! {
    /// Flags on an ELF section, as reported by the ELF-symbols tag.
    ///
    /// Bit values match the tag's on-the-wire layout (and, incidentally,
    /// the standard ELF `SHF_*` flags): `Writable = 1`, `Allocated = 2`,
    /// `Executable = 4`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u64 {
        /// Section contents are writable at runtime.
        const WRITABLE  = 1 << 0;
        /// Section occupies memory during kernel execution.
        const ALLOCATED = 1 << 1;
        /// Section contains executable machine instructions.
        const EXECUTABLE = 1 << 2;
    }
}

/// One non-zero-size ELF section belonging to the running kernel image.
#[derive(Debug, Clone, Copy)]
pub struct ElfSection<'a> {
    /// Section name, resolved against the string table section.
    pub name: &'a str,
    /// Section flags.
    pub flags: SectionFlags,
    /// Virtual address the section is loaded at.
    pub address: PhysAddr,
    /// Size of the section in bytes.
    pub size: u64,
}

/// Raw 64-bit ELF section header (`Elf64_Shdr`), as embedded in the tag.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub(crate) struct RawShdr {
    pub name_index: u32,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
}

impl RawShdr {
    pub(crate) const SIZE: usize = 64;

    pub(crate) fn read(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            name_index: u32::from_le_bytes(bytes[0..4].try_into().ok()?),
            sh_type: u32::from_le_bytes(bytes[4..8].try_into().ok()?),
            flags: u64::from_le_bytes(bytes[8..16].try_into().ok()?),
            addr: u64::from_le_bytes(bytes[16..24].try_into().ok()?),
            offset: u64::from_le_bytes(bytes[24..32].try_into().ok()?),
            size: u64::from_le_bytes(bytes[32..40].try_into().ok()?),
            link: u32::from_le_bytes(bytes[40..44].try_into().ok()?),
            info: u32::from_le_bytes(bytes[44..48].try_into().ok()?),
            addralign: u64::from_le_bytes(bytes[48..56].try_into().ok()?),
            entsize: u64::from_le_bytes(bytes[56..64].try_into().ok()?),
        })
    }
}

/// Reads a NUL-terminated string starting at `offset` within `strtab`.
pub(crate) fn str_in_table(strtab: &[u8], offset: usize) -> Option<&str> {
    let bytes = strtab.get(offset..)?;
    let end = bytes.iter().position(|&b| b == 0)?;
    core::str::from_utf8(&bytes[..end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_flags_bit_values_match_spec() {
        assert_eq!(SectionFlags::WRITABLE.bits(), 1);
        assert_eq!(SectionFlags::ALLOCATED.bits(), 2);
        assert_eq!(SectionFlags::EXECUTABLE.bits(), 4);
    }

    #[test]
    fn str_in_table_reads_up_to_nul() {
        let table = b"\0.text\0.data\0";
        assert_eq!(str_in_table(table, 1), Some(".text"));
        assert_eq!(str_in_table(table, 7), Some(".data"));
    }

    #[test]
    fn str_in_table_rejects_out_of_range_offset() {
        let table = b"\0.text\0";
        assert_eq!(str_in_table(table, 100), None);
    }

    #[test]
    fn raw_shdr_roundtrips_fields() {
        let mut bytes = [0u8; RawShdr::SIZE];
        bytes[0..4].copy_from_slice(&7u32.to_le_bytes());
        bytes[8..16].copy_from_slice(&SectionFlags::EXECUTABLE.bits().to_le_bytes());
        bytes[32..40].copy_from_slice(&4096u64.to_le_bytes());
        let shdr = RawShdr::read(&bytes).unwrap();
        assert_eq!(shdr.name_index, 7);
        assert_eq!(shdr.flags, SectionFlags::EXECUTABLE.bits());
        assert_eq!(shdr.size, 4096);
    }
}
