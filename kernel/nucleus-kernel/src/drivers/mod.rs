//! Built-in console/TTY drivers and their driver-registry descriptors.
//!
//! None of these probe real hardware registers beyond what the multiboot
//! framebuffer tag already reports: the boot loader has already set the
//! video mode by the time the kernel runs, so "probing" here means reading
//! back what mode it chose, not driving mode-set registers the way a PCI
//! display driver would.

pub mod linear_fb;
pub mod tty;
pub mod vga_text;

use nucleus_driver_api::{DriverDescriptor, DriverOrder};

/// Registers every built-in driver descriptor with the HAL, in the order a
/// fresh boot should probe them.
///
/// Console drivers run before the TTY descriptor: `detect_hardware`'s
/// post-init hook wires a TTY to whatever console is already active, so a
/// console installed first gives the TTY something to attach to
/// immediately rather than waiting for a second pass.
pub fn register_builtin_drivers() {
    crate::hal::register(DriverDescriptor {
        order: DriverOrder::Acpi as i8,
        probe: vga_text::probe,
    });
    crate::hal::register(DriverDescriptor {
        order: DriverOrder::Acpi as i8,
        probe: linear_fb::probe,
    });
    crate::hal::register(DriverDescriptor {
        order: DriverOrder::Last as i8,
        probe: tty::probe,
    });
}
