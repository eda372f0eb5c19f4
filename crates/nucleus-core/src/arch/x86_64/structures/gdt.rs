//! Global Descriptor Table (GDT) structures.
//!
//! This crate's boot core runs entirely in ring 0 with no per-CPU task
//! switching (`nucleus-driver-api`'s scope stops at drivers and the
//! console/TTY wiring), so unlike a general-purpose kernel's GDT this one
//! carries no TSS or user-mode segments: a null descriptor plus one kernel
//! code and one kernel data segment are all the entry point needs to reload
//! CS to the selector the IDT's gates are built against.

use core::mem::size_of;

mod segment_bits {
    pub const SELECTOR_INDEX_SHIFT: u16 = 3;
    pub const RPL_MASK: u16 = 0b11;
}

/// A segment selector value for the GDT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct SegmentSelector(u16);

impl SegmentSelector {
    /// Creates a new segment selector from a GDT index and privilege level.
    #[inline]
    pub const fn new(index: u16, rpl: u16) -> Self {
        Self((index << segment_bits::SELECTOR_INDEX_SHIFT) | (rpl & segment_bits::RPL_MASK))
    }

    /// Creates a segment selector from a raw `u16` value.
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw u16 value.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the GDT index (bits 3..15).
    #[inline]
    pub const fn index(self) -> u16 {
        self.0 >> segment_bits::SELECTOR_INDEX_SHIFT
    }

    /// Returns the requested privilege level (bits 0..1).
    #[inline]
    pub const fn rpl(self) -> u16 {
        self.0 & segment_bits::RPL_MASK
    }
}

/// A GDT descriptor entry. Every entry this kernel installs is a plain
/// 64-bit user segment; there is no TSS to need a system-segment variant.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor(u64);

impl Descriptor {
    /// Creates a null descriptor.
    #[inline]
    pub const fn null() -> Self {
        Self(0)
    }

    /// Creates a 64-bit kernel code segment descriptor.
    ///
    /// L=1, D=0, P=1, DPL=0, type=execute/read.
    #[inline]
    pub const fn kernel_code_segment() -> Self {
        Self(0x00AF_9A00_0000_FFFF)
    }

    /// Creates a kernel data segment descriptor.
    ///
    /// P=1, DPL=0, type=read/write.
    #[inline]
    pub const fn kernel_data_segment() -> Self {
        Self(0x00CF_9200_0000_FFFF)
    }

    const DPL_SHIFT: u64 = 45;
    const DPL_MASK: u64 = 0b11;

    fn privilege_level(self) -> u16 {
        ((self.0 >> Self::DPL_SHIFT) & Self::DPL_MASK) as u16
    }
}

/// Pointer to the GDT, used by `lgdt`.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct DescriptorTablePointer {
    /// Size of the table minus one.
    pub limit: u16,
    /// Linear base address of the table.
    pub base: u64,
}

/// A fixed-capacity GDT. The default capacity of 3 holds exactly the
/// null, kernel-code, and kernel-data descriptors this kernel installs.
#[repr(C, align(16))]
pub struct GlobalDescriptorTable<const N: usize = 3> {
    table: [u64; N],
    len: usize,
}

impl<const N: usize> GlobalDescriptorTable<N> {
    /// Creates a new GDT with only a null descriptor in slot 0.
    #[inline]
    pub const fn new() -> Self {
        Self {
            table: [0u64; N],
            len: 1,
        }
    }

    /// Appends a descriptor to the GDT and returns its selector.
    ///
    /// # Panics
    ///
    /// Panics if the table is full.
    pub fn append(&mut self, descriptor: Descriptor) -> SegmentSelector {
        let index = self.len;
        assert!(index < N, "GDT full");
        self.table[index] = descriptor.0;
        self.len += 1;
        SegmentSelector::new(index as u16, descriptor.privilege_level())
    }

    /// Loads this GDT into the CPU via `lgdt`.
    ///
    /// # Safety
    ///
    /// - The GDT must be `'static` (must not be dropped while loaded).
    /// - Segment registers must be reloaded after this call.
    #[inline]
    pub unsafe fn load(&'static self) {
        let ptr = DescriptorTablePointer {
            limit: (self.len * size_of::<u64>() - 1) as u16,
            base: self.table.as_ptr() as u64,
        };
        unsafe {
            core::arch::asm!(
                "lgdt [{}]",
                in(reg) &ptr,
                options(readonly, nostack, preserves_flags),
            );
        }
    }
}

impl<const N: usize> Default for GlobalDescriptorTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_encoding() {
        let sel = SegmentSelector::new(1, 0);
        assert_eq!(sel.as_u16(), 0x08);
    }

    #[test]
    fn selector_with_rpl() {
        let sel = SegmentSelector::new(2, 3);
        assert_eq!(sel.as_u16(), (2 << 3) | 3);
        assert_eq!(sel.index(), 2);
        assert_eq!(sel.rpl(), 3);
    }

    #[test]
    fn selector_rpl_masked() {
        let sel = SegmentSelector::new(1, 0xFF);
        assert_eq!(sel.rpl(), 3);
    }

    #[test]
    fn gdt_append_kernel_code_then_data() {
        let mut gdt = GlobalDescriptorTable::<3>::new();
        let code = gdt.append(Descriptor::kernel_code_segment());
        let data = gdt.append(Descriptor::kernel_data_segment());
        assert_eq!(code.as_u16(), 0x08);
        assert_eq!(data.as_u16(), 0x10);
        assert_eq!(code.rpl(), 0);
    }

    #[test]
    fn kernel_code_segment_bits() {
        let desc = Descriptor::kernel_code_segment();
        assert_ne!(desc.0 & (1 << 47), 0, "present bit not set");
        assert_ne!(desc.0 & (1 << 53), 0, "long mode bit not set");
        assert_eq!(desc.0 & (1 << 54), 0, "D bit should be 0 for 64-bit");
        assert_eq!((desc.0 >> 45) & 0b11, 0, "DPL should be 0");
    }

    #[test]
    #[should_panic(expected = "GDT full")]
    fn gdt_overflow_panics() {
        let mut gdt = GlobalDescriptorTable::<2>::new();
        gdt.append(Descriptor::kernel_code_segment());
        gdt.append(Descriptor::kernel_data_segment());
    }

    #[test]
    fn null_descriptor_is_zero() {
        assert_eq!(Descriptor::null().0, 0);
    }
}
