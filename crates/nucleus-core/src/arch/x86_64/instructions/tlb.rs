//! TLB (Translation Lookaside Buffer) management instructions.

use crate::addr::VirtAddr;
use crate::arch::x86_64::registers::control::Cr3;

/// Flushes the TLB entry for the given virtual address (INVLPG).
#[inline]
pub fn flush_entry(addr: VirtAddr) {
    // SAFETY: INVLPG only invalidates a single TLB entry and has no other
    // side effects.
    unsafe {
        core::arch::asm!(
            "invlpg [{}]",
            in(reg) addr.as_u64(),
            options(nostack, preserves_flags),
        );
    }
}

/// Switches the active page table root, implicitly flushing the TLB.
///
/// # Safety
///
/// `phys_addr` must be the physical address of a valid, correctly-mapped
/// top-level page table for the address space about to become active.
#[inline]
pub unsafe fn switch_pdt(phys_addr: crate::addr::PhysAddr) {
    unsafe { Cr3::write(phys_addr) };
}

/// Returns the physical address of the currently active page table root.
#[inline]
#[must_use]
pub fn active_pdt() -> crate::addr::PhysAddr {
    Cr3::read()
}
