//! Control registers (CR0, CR2, CR3, CR4).

use crate::addr::PhysAddr;

bitflags::bitflags! {
    /// Flags of the CR0 control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr0Flags: u64 {
        /// Protected mode enable.
        const PROTECTED_MODE   = 1 << 0;
        /// Monitor co-processor: traps `wait`/`fwait` when `TASK_SWITCHED` is set.
        const MONITOR_COPROCESSOR = 1 << 1;
        /// Emulation: when set, the FPU/SSE unit is disabled and every
        /// floating-point or `movaps`-class instruction raises `#NM`.
        const EMULATE_COPROCESSOR = 1 << 2;
        /// Task switched.
        const TASK_SWITCHED    = 1 << 3;
        /// Write protect: enforces read-only pages even at CPL 0.
        const WRITE_PROTECT    = 1 << 16;
        /// Paging enable.
        const PAGING           = 1 << 31;
    }
}

bitflags::bitflags! {
    /// Flags of the CR4 control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr4Flags: u64 {
        /// Physical address extension (required for long mode).
        const PAE              = 1 << 5;
        /// Page global enable.
        const PAGE_GLOBAL      = 1 << 7;
        /// OS supports `fxsave`/`fxrstor` (required before any SSE
        /// instruction, including the `movaps` saves the interrupt
        /// trampolines use, is safe to execute).
        const OSFXSR           = 1 << 9;
        /// OS supports unmasked SIMD floating-point exceptions.
        const OSXMMEXCPT       = 1 << 10;
    }
}

/// CR0 register (processor mode and paging control).
pub struct Cr0;

impl Cr0 {
    /// Reads the current CR0 value.
    #[inline]
    #[must_use]
    pub fn read() -> Cr0Flags {
        let val: u64;
        unsafe {
            core::arch::asm!("mov {}, cr0", out(reg) val, options(nomem, nostack, preserves_flags));
        }
        Cr0Flags::from_bits_truncate(val)
    }

    /// Writes a new CR0 value.
    ///
    /// # Safety
    ///
    /// Clearing `PROTECTED_MODE` or `PAGING` at the wrong time, or toggling
    /// `EMULATE_COPROCESSOR` while SSE state is live, can fault or corrupt
    /// the running kernel.
    #[inline]
    pub unsafe fn write(flags: Cr0Flags) {
        unsafe {
            core::arch::asm!("mov cr0, {}", in(reg) flags.bits(), options(nostack, preserves_flags));
        }
    }
}

/// CR4 register (extended processor features).
pub struct Cr4;

impl Cr4 {
    /// Reads the current CR4 value.
    #[inline]
    #[must_use]
    pub fn read() -> Cr4Flags {
        let val: u64;
        unsafe {
            core::arch::asm!("mov {}, cr4", out(reg) val, options(nomem, nostack, preserves_flags));
        }
        Cr4Flags::from_bits_truncate(val)
    }

    /// Writes a new CR4 value.
    ///
    /// # Safety
    ///
    /// The caller must ensure the requested features are actually supported
    /// by the running CPU.
    #[inline]
    pub unsafe fn write(flags: Cr4Flags) {
        unsafe {
            core::arch::asm!("mov cr4, {}", in(reg) flags.bits(), options(nostack, preserves_flags));
        }
    }
}

/// CR2 register (page-fault linear address).
pub struct Cr2;

impl Cr2 {
    /// Reads the faulting linear address left in CR2 by the last page fault.
    #[inline]
    #[must_use]
    pub fn read() -> u64 {
        let val: u64;
        unsafe {
            core::arch::asm!("mov {}, cr2", out(reg) val, options(nomem, nostack, preserves_flags));
        }
        val
    }
}

/// CR3 register (page table root).
pub struct Cr3;

impl Cr3 {
    /// Reads the current page table root physical address from CR3.
    #[inline]
    #[must_use]
    pub fn read() -> PhysAddr {
        let val: u64;
        unsafe {
            core::arch::asm!("mov {}, cr3", out(reg) val, options(nomem, nostack, preserves_flags));
        }
        PhysAddr::new(val)
    }

    /// Writes a new page table root physical address to CR3, implicitly
    /// flushing all non-global TLB entries.
    ///
    /// # Safety
    ///
    /// The caller must ensure `addr` points to a valid, correctly-mapped
    /// top-level page table.
    #[inline]
    pub unsafe fn write(addr: PhysAddr) {
        unsafe {
            core::arch::asm!("mov cr3, {}", in(reg) addr.as_u64(), options(nostack, preserves_flags));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cr0_flag_bit_positions() {
        assert_eq!(Cr0Flags::PROTECTED_MODE.bits(), 1 << 0);
        assert_eq!(Cr0Flags::EMULATE_COPROCESSOR.bits(), 1 << 2);
        assert_eq!(Cr0Flags::PAGING.bits(), 1 << 31);
    }

    #[test]
    fn cr4_flag_bit_positions() {
        assert_eq!(Cr4Flags::PAE.bits(), 1 << 5);
        assert_eq!(Cr4Flags::OSFXSR.bits(), 1 << 9);
        assert_eq!(Cr4Flags::OSXMMEXCPT.bits(), 1 << 10);
    }
}
