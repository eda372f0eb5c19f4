//! Multiboot2 boot-information parser.
//!
//! The boot loader hands the kernel a physical pointer to a tagged info
//! block (GNU Multiboot2 §3.4): a `{total_size, reserved}` header followed
//! by a sequence of 8-byte-aligned tags, terminated by a zero-kind tag. All
//! accessors here are read-only views into boot-loader-owned memory; none
//! of them copy or rewrite a tag, matching the "read-only against
//! boot-loader memory" contract.
//!
//! Call [`set_info_ptr`] exactly once, before any other accessor in this
//! module, with the physical (identity-mapped at this point in boot)
//! address the loader left in `%ebx`.

pub mod elf;
pub mod framebuffer;
pub mod memmap;

use alloc::collections::BTreeMap;
use alloc::string::String;
use core::sync::atomic::{AtomicUsize, Ordering};

use nucleus_core::addr::PhysAddr;
use nucleus_core::sync::SpinLock;

pub use elf::{ElfSection, SectionFlags};
pub use framebuffer::{FramebufferInfo, FramebufferType, RgbLayout};
pub use memmap::{MemoryKind, MemoryMapEntry};

/// Closed enumeration of known Multiboot2 tag kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TagKind {
    /// Kernel command line (kind 1).
    BootCmdline = 1,
    /// Name of the boot loader (kind 2).
    BootLoaderName = 2,
    /// Loaded module list (kind 3).
    Modules = 3,
    /// Lower/upper memory sizes in KiB (kind 4).
    BasicMemoryInfo = 4,
    /// BIOS boot device (kind 5).
    BiosBootDevice = 5,
    /// Physical memory map (kind 6).
    MemoryMap = 6,
    /// VBE mode info (kind 7).
    VbeInfo = 7,
    /// Framebuffer info (kind 8).
    FramebufferInfo = 8,
    /// ELF section headers of the kernel image (kind 9).
    ElfSymbols = 9,
    /// APM table (kind 10).
    ApmTable = 10,
}

const TAG_TERMINATOR: u32 = 0;
const TAG_HEADER_SIZE: u32 = 8;

/// Physical address of the info block's first byte; `0` means unset.
///
/// An `AtomicUsize` rather than a `SpinLock`, since the design assumes
/// single-threaded first access: there is nothing to contend with this
/// early in boot, only a need to share the pointer with later accessors
/// without a `&mut` threaded through every call site.
static INFO_PTR: AtomicUsize = AtomicUsize::new(0);

/// Eagerly seeded, process-wide cache of the parsed command line.
static CMDLINE_CACHE: SpinLock<Option<BTreeMap<String, String>>> = SpinLock::new(None);

/// Records the boot-loader info block's base physical address.
///
/// Must be called exactly once, before any other accessor in this module.
/// Per the design's bootstrap-ordering guarantee, this also eagerly parses
/// and caches the command line, rather than leaving a mutable lazy cache
/// behind what is otherwise a read-only API surface.
pub fn set_info_ptr(addr: usize) {
    INFO_PTR.store(addr, Ordering::Release);
    *CMDLINE_CACHE.lock() = Some(parse_cmdline());
}

fn base_ptr() -> Option<*const u8> {
    let addr = INFO_PTR.load(Ordering::Acquire);
    if addr == 0 {
        None
    } else {
        Some(addr as *const u8)
    }
}

/// Reads the block's `{total_size, reserved}` header.
fn total_size() -> Option<u32> {
    let base = base_ptr()?;
    // SAFETY: the caller contract of `set_info_ptr` guarantees `base` points
    // at a live Multiboot2 info block for as long as this module is used.
    Some(unsafe { (base.cast::<u32>()).read_unaligned() })
}

/// `(header.size + 7) & !7`: rounds a tag's header-inclusive size up to the
/// next 8-byte boundary.
const fn align_tag_size(size: u32) -> u32 {
    (size + 7) & !7
}

/// Walks the tag list from `base + 8`, stopping at the terminator or once
/// `total_size` bytes have been consumed (a defensive bound against a
/// malformed, non-terminating tag list, per spec §4.2's failure semantics).
fn find_tag_raw(kind: u32) -> Option<(*const u8, u32)> {
    let base = base_ptr()?;
    let total = total_size()?;
    let mut offset: u32 = TAG_HEADER_SIZE;

    while offset + TAG_HEADER_SIZE <= total {
        // SAFETY: `offset` is bounds-checked against `total` above, and
        // `total` is the loader-reported size of the same block `base`
        // points into.
        let tag_ptr = unsafe { base.add(offset as usize) };
        let tag_kind = unsafe { tag_ptr.cast::<u32>().read_unaligned() };
        let tag_size = unsafe { tag_ptr.add(4).cast::<u32>().read_unaligned() };

        if tag_kind == TAG_TERMINATOR {
            return None;
        }
        if tag_kind == kind {
            let payload_ptr = unsafe { tag_ptr.add(TAG_HEADER_SIZE as usize) };
            let payload_size = tag_size.saturating_sub(TAG_HEADER_SIZE);
            return Some((payload_ptr, payload_size));
        }

        offset += align_tag_size(tag_size);
    }
    None
}

/// Locates the tag of the given `kind`, returning its payload pointer and
/// size (header excluded). Returns `None` if the tag is absent.
#[must_use]
pub fn find_tag(kind: TagKind) -> Option<(*const u8, usize)> {
    find_tag_raw(kind as u32).map(|(ptr, size)| (ptr, size as usize))
}

fn payload_slice(kind: TagKind) -> Option<&'static [u8]> {
    let (ptr, size) = find_tag_raw(kind as u32)?;
    // SAFETY: `size` is the tag's own reported payload length, bounded by
    // `total_size` in `find_tag_raw`.
    Some(unsafe { core::slice::from_raw_parts(ptr, size as usize) })
}

/// Visits every entry of the memory-map tag (kind 6), if present.
///
/// Returns silently (visiting nothing) if no memory-map tag exists, per
/// spec. Entries are read using the loader-reported `entry_size`, never
/// `size_of::<MemoryMapEntry>()`, since the loader may publish larger
/// entries than this implementation knows about. Any raw kind of 0 or `>=
/// 5` is remapped to [`MemoryKind::Reserved`] before the visitor sees it.
/// The visitor's `false` return is honored immediately, including on the
/// final entry (resolving the spec's own noted open question).
pub fn visit_mem_regions<F>(mut f: F)
where
    F: FnMut(&MemoryMapEntry) -> bool,
{
    let Some(payload) = payload_slice(TagKind::MemoryMap) else {
        return;
    };
    if payload.len() < 8 {
        return;
    }
    let entry_size = u32::from_le_bytes(payload[0..4].try_into().unwrap()) as usize;
    if entry_size < 24 || entry_size == 0 {
        return;
    }

    let entries = &payload[8..];
    let count = entries.len() / entry_size;
    for i in 0..count {
        let raw = &entries[i * entry_size..i * entry_size + entry_size];
        let phys_address = u64::from_le_bytes(raw[0..8].try_into().unwrap());
        let length = u64::from_le_bytes(raw[8..16].try_into().unwrap());
        let kind = u32::from_le_bytes(raw[16..20].try_into().unwrap());
        let entry = MemoryMapEntry {
            base: PhysAddr::new(phys_address),
            length,
            kind: MemoryKind::from_raw(kind),
        };
        if !f(&entry) {
            return;
        }
    }
}

/// Visits every non-zero-size ELF section of the kernel image, resolving
/// each section's name against the string-table section named by the
/// tag's `strtab_index`.
///
/// Returns silently if no ELF-symbols tag (kind 9) exists.
pub fn visit_elf_sections<F>(mut f: F)
where
    F: FnMut(ElfSection<'_>) -> bool,
{
    let Some(payload) = payload_slice(TagKind::ElfSymbols) else {
        return;
    };
    if payload.len() < 8 {
        return;
    }
    let num_sections = u16::from_le_bytes(payload[0..2].try_into().unwrap()) as usize;
    let section_size = u32::from_le_bytes(payload[2..6].try_into().unwrap()) as usize;
    let strtab_index = u32::from_le_bytes(payload[6..10].try_into().unwrap()) as usize;
    let data = &payload[10..];

    if section_size < elf::RawShdr::SIZE || strtab_index >= num_sections {
        return;
    }
    let Some(strtab_bytes) = data.get(strtab_index * section_size..) else {
        return;
    };
    let Some(strtab_hdr) = elf::RawShdr::read(strtab_bytes) else {
        return;
    };
    // The string table's own section data sits at `strtab_hdr.addr` in the
    // running image, which for a statically-linked kernel at this stage is
    // reachable at its physical/identity-mapped load address.
    let strtab_ptr = strtab_hdr.addr as *const u8;
    // SAFETY: `strtab_hdr.size` is the loader-reported size of the kernel's
    // own `.strtab`, already resident in memory by the time the kernel runs.
    let strtab = unsafe { core::slice::from_raw_parts(strtab_ptr, strtab_hdr.size as usize) };

    for i in 0..num_sections {
        let Some(raw_bytes) = data.get(i * section_size..i * section_size + elf::RawShdr::SIZE) else {
            continue;
        };
        let Some(shdr) = elf::RawShdr::read(raw_bytes) else {
            continue;
        };
        if shdr.size == 0 {
            continue;
        }
        let Some(name) = elf::str_in_table(strtab, shdr.name_index as usize) else {
            continue;
        };
        let flags = SectionFlags::from_bits_truncate(shdr.flags);
        let section = ElfSection {
            name,
            flags,
            address: PhysAddr::new(shdr.addr),
            size: shdr.size,
        };
        if !f(section) {
            return;
        }
    }
}

/// Returns the decoded framebuffer-info tag (kind 8), if present.
#[must_use]
pub fn get_framebuffer_info() -> Option<FramebufferInfo> {
    payload_slice(TagKind::FramebufferInfo).and_then(FramebufferInfo::parse)
}

fn parse_cmdline() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let Some(payload) = payload_slice(TagKind::BootCmdline) else {
        return map;
    };
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    let Ok(text) = core::str::from_utf8(&payload[..end]) else {
        return map;
    };
    for token in text.split_whitespace() {
        match token.split_once('=') {
            Some((k, v)) => {
                map.insert(String::from(k), String::from(v));
            }
            None => {
                map.insert(String::from(token), String::from(token));
            }
        }
    }
    map
}

/// Returns the parsed boot command line as key/value pairs.
///
/// `k=v` tokens become `(k, v)`; a bare `k` token becomes `(k, k)`. Built
/// once, eagerly, at [`set_info_ptr`] time; this returns a clone of the
/// cached map.
#[must_use]
pub fn boot_cmdline() -> BTreeMap<String, String> {
    {
        let cache = CMDLINE_CACHE.lock();
        if let Some(map) = cache.as_ref() {
            return map.clone();
        }
    }
    let map = parse_cmdline();
    *CMDLINE_CACHE.lock() = Some(map.clone());
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn push_tag(buf: &mut Vec<u8>, kind: u32, payload: &[u8]) {
        let size = TAG_HEADER_SIZE + payload.len() as u32;
        buf.extend_from_slice(&kind.to_le_bytes());
        buf.extend_from_slice(&size.to_le_bytes());
        buf.extend_from_slice(payload);
        while buf.len() % 8 != 0 {
            buf.push(0);
        }
    }

    fn build_info(tag_bytes: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0u32.to_le_bytes()); // total_size placeholder
        buf.extend_from_slice(&0u32.to_le_bytes()); // reserved
        buf.extend_from_slice(tag_bytes);
        push_tag(&mut buf, TAG_TERMINATOR, &[]);
        let total = buf.len() as u32;
        buf[0..4].copy_from_slice(&total.to_le_bytes());
        buf
    }

    // Each test that installs an info pointer must serialize against the
    // others, since `INFO_PTR`/`CMDLINE_CACHE` are process-wide statics.
    static TEST_LOCK: SpinLock<()> = SpinLock::new(());

    #[test]
    fn find_tag_returns_payload_size_minus_header() {
        let _guard = TEST_LOCK.lock();
        let mut tags = Vec::new();
        push_tag(&mut tags, TagKind::BootLoaderName as u32, b"GRUB 2.06\0");
        let info = build_info(&tags);
        set_info_ptr(info.as_ptr() as usize);

        let (_, size) = find_tag(TagKind::BootLoaderName).unwrap();
        assert_eq!(size, 10);
        assert!(find_tag(TagKind::VbeInfo).is_none());
    }

    #[test]
    fn visit_mem_regions_is_never_invoked_without_a_memory_map_tag() {
        let _guard = TEST_LOCK.lock();
        let tags = Vec::new();
        let info = build_info(&tags);
        set_info_ptr(info.as_ptr() as usize);

        let mut called = false;
        visit_mem_regions(|_| {
            called = true;
            true
        });
        assert!(!called);
    }

    fn mmap_entry(buf: &mut Vec<u8>, base: u64, length: u64, kind: u32) {
        buf.extend_from_slice(&base.to_le_bytes());
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&kind.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
    }

    #[test]
    fn corrupted_and_out_of_range_kinds_are_observed_as_reserved() {
        let _guard = TEST_LOCK.lock();
        let mut payload = Vec::new();
        payload.extend_from_slice(&24u32.to_le_bytes()); // entry_size
        payload.extend_from_slice(&0u32.to_le_bytes()); // entry_version
        mmap_entry(&mut payload, 0, 0x1000, 0); // corrupted -> Reserved
        mmap_entry(&mut payload, 0x1000, 0x1000, 2); // Reserved
        mmap_entry(&mut payload, 0x2000, 0x1000, 3); // AcpiReclaimable
        mmap_entry(&mut payload, 0x10_0000, 133_038_080, 1); // Available
        mmap_entry(&mut payload, 0x9000_0000, 0x1000, 4); // Nvs
        mmap_entry(&mut payload, 0xA000_0000, 0x1000, 99); // out of range -> Reserved

        let mut tags = Vec::new();
        push_tag(&mut tags, TagKind::MemoryMap as u32, &payload);
        let info = build_info(&tags);
        set_info_ptr(info.as_ptr() as usize);

        let mut seen = Vec::new();
        visit_mem_regions(|entry| {
            seen.push(*entry);
            true
        });

        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0].kind, MemoryKind::Reserved);
        assert_eq!(seen[3].kind, MemoryKind::Available);
        assert_eq!(seen[3].base.as_u64(), 0x10_0000);
        assert_eq!(seen[3].length, 133_038_080);
        assert_eq!(seen[5].kind, MemoryKind::Reserved);
    }

    #[test]
    fn visitor_false_return_stops_iteration_immediately() {
        let _guard = TEST_LOCK.lock();
        let mut payload = Vec::new();
        payload.extend_from_slice(&24u32.to_le_bytes());
        payload.extend_from_slice(&0u32.to_le_bytes());
        mmap_entry(&mut payload, 0, 0x1000, 1);
        mmap_entry(&mut payload, 0x1000, 0x1000, 1);
        mmap_entry(&mut payload, 0x2000, 0x1000, 1);

        let mut tags = Vec::new();
        push_tag(&mut tags, TagKind::MemoryMap as u32, &payload);
        let info = build_info(&tags);
        set_info_ptr(info.as_ptr() as usize);

        let mut count = 0;
        visit_mem_regions(|_| {
            count += 1;
            count < 2
        });
        assert_eq!(count, 2);
    }

    #[test]
    fn framebuffer_tag_decodes_ega_mode() {
        let _guard = TEST_LOCK.lock();
        let mut payload = alloc::vec![0u8; 22];
        payload[0..8].copy_from_slice(&0xB_8000u64.to_le_bytes());
        payload[8..12].copy_from_slice(&160u32.to_le_bytes());
        payload[12..16].copy_from_slice(&80u32.to_le_bytes());
        payload[16..20].copy_from_slice(&25u32.to_le_bytes());
        payload[21] = 2; // EGA

        let mut tags = Vec::new();
        push_tag(&mut tags, TagKind::FramebufferInfo as u32, &payload);
        let info = build_info(&tags);
        set_info_ptr(info.as_ptr() as usize);

        let fb = get_framebuffer_info().unwrap();
        assert_eq!(fb.fb_type, FramebufferType::Ega);
        assert_eq!(fb.phys_addr.as_u64(), 0xB_8000);
        assert_eq!(fb.width, 80);
        assert_eq!(fb.height, 25);
        assert_eq!(fb.pitch, 160);
    }

    fn raw_shdr_bytes(name_index: u32, flags: u64, addr: u64, size: u64) -> [u8; elf::RawShdr::SIZE] {
        let mut bytes = [0u8; elf::RawShdr::SIZE];
        bytes[0..4].copy_from_slice(&name_index.to_le_bytes());
        bytes[8..16].copy_from_slice(&flags.to_le_bytes());
        bytes[16..24].copy_from_slice(&addr.to_le_bytes());
        bytes[32..40].copy_from_slice(&size.to_le_bytes());
        bytes
    }

    #[test]
    fn visit_elf_sections_resolves_names_past_the_header() {
        let _guard = TEST_LOCK.lock();

        // Section 0 is the string table itself; section 1 is a real,
        // non-zero-size section whose name lives inside it.
        let strtab: &'static [u8] = b"\0.text\0";
        let mut payload = Vec::new();
        payload.extend_from_slice(&2u16.to_le_bytes()); // num_sections
        payload.extend_from_slice(&(elf::RawShdr::SIZE as u32).to_le_bytes()); // section_size
        payload.extend_from_slice(&0u32.to_le_bytes()); // strtab_index
        payload.extend_from_slice(&raw_shdr_bytes(0, 0, strtab.as_ptr() as u64, strtab.len() as u64));
        payload.extend_from_slice(&raw_shdr_bytes(1, 0b101, 0x1000, 4096));

        let mut tags = Vec::new();
        push_tag(&mut tags, TagKind::ElfSymbols as u32, &payload);
        let info = build_info(&tags);
        set_info_ptr(info.as_ptr() as usize);

        let mut seen = Vec::new();
        visit_elf_sections(|section| {
            seen.push((alloc::string::String::from(section.name), section.flags, section.size));
            true
        });

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].0, ".text");
        assert_eq!(seen[1].1, SectionFlags::EXECUTABLE | SectionFlags::ALLOCATED);
        assert_eq!(seen[1].2, 4096);
    }

    #[test]
    fn cmdline_parses_kv_and_bare_tokens() {
        let _guard = TEST_LOCK.lock();
        let mut tags = Vec::new();
        push_tag(&mut tags, TagKind::BootCmdline as u32, b"consoleLogo=off quiet consoleFont=term16\0");
        let info = build_info(&tags);
        set_info_ptr(info.as_ptr() as usize);

        let map = boot_cmdline();
        assert_eq!(map.get("consoleLogo").map(String::as_str), Some("off"));
        assert_eq!(map.get("quiet").map(String::as_str), Some("quiet"));
        assert_eq!(map.get("consoleFont").map(String::as_str), Some("term16"));
    }

    #[test]
    fn missing_cmdline_tag_yields_empty_map() {
        let _guard = TEST_LOCK.lock();
        let tags = Vec::new();
        let info = build_info(&tags);
        set_info_ptr(info.as_ptr() as usize);
        assert!(boot_cmdline().is_empty());
    }
}
