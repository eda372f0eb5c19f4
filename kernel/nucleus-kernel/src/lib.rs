//! Multiboot2 parsing, interrupt gate installation, and the driver-probe /
//! console / TTY boot core of the nucleus kernel.
//!
//! Everything here is host-testable except [`panic`], which only exists
//! under the bare-metal target: the host test binary supplies its own.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod drivers;
pub mod hal;
pub mod interrupts;
pub mod multiboot;

#[cfg(target_os = "none")]
mod panic;

/// Runs the kernel's one-time bootstrap sequence and never returns.
///
/// Called by the entry point with the physical address the boot loader
/// left the Multiboot2 info block at. Per the
/// ordering spec §5 requires, every process-wide table here is installed
/// before the next stage touches it: the multiboot pointer before anything
/// reads the command line or memory map, the IDT before any driver probe
/// could plausibly fault, and the driver registry's capability wiring last.
#[cfg(target_os = "none")]
pub fn kernel_main(mb_info_addr: usize) -> ! {
    multiboot::set_info_ptr(mb_info_addr);

    // SAFETY: this is the kernel's single bootstrap thread, called before
    // any interrupt is unmasked.
    unsafe { interrupts::init() };

    drivers::register_builtin_drivers();
    hal::detect_hardware();

    nucleus_core::kinfo!("nucleus-kernel boot core initialised");

    loop {
        nucleus_core::arch::x86_64::instructions::interrupts::halt();
    }
}
