//! Driver descriptor, probe order, and the capability container a
//! successful probe returns.

use alloc::sync::Arc;

use crate::console::Console;
use crate::error::DriverError;
use crate::tty::Tty;

/// Reserved [`DriverDescriptor::order`] values. Probing runs in ascending
/// `order`; ties keep registration order (the sort is stable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum DriverOrder {
    /// Runs before any firmware table has been parsed.
    Early = -128,
    /// Runs after `Early`, before ACPI-dependent drivers.
    BeforeAcpi = -127,
    /// The default order for drivers with no ordering requirement.
    Acpi = 0,
    /// Runs after every other driver.
    Last = 127,
}

/// An entry in the driver registry: a detection-order value and the probe
/// function run at that position.
#[derive(Clone, Copy)]
pub struct DriverDescriptor {
    /// Position in the stable probe order; see [`DriverOrder`] for the
    /// reserved values.
    pub order: i8,
    /// Looks for this driver's hardware, returning `None` if absent.
    pub probe: fn() -> Option<Driver>,
}

/// A driver instance found by a successful probe, not yet initialised.
pub struct Driver {
    /// Name used in init-failure log messages.
    pub name: &'static str,
    /// Version used in init-failure log messages.
    pub version: u32,
    /// Completes initialisation and reports the capability this driver
    /// provides.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::DriverInitFailed`] if hardware setup fails.
    pub init: fn() -> Result<DriverKind, DriverError>,
}

/// The capability (or capabilities) an initialised driver provides to the
/// registry's post-init hook.
///
/// Modeled as a tagged enum carrying capability records rather than a
/// downcastable trait object, per the driver-capability dispatch design: the
/// post-init hook matches on this directly instead of querying a dynamic
/// type.
pub enum DriverKind {
    /// Provides only the console capability.
    Console(Arc<dyn Console>),
    /// Provides only the TTY capability.
    Tty(Arc<dyn Tty>),
    /// Provides both capabilities from a single device (e.g. a combined
    /// framebuffer console with its own cursor tracking).
    ConsoleAndTty(Arc<dyn Console>, Arc<dyn Tty>),
    /// Initialised successfully but offers neither capability (e.g. a timer
    /// or storage driver probed by the same registry).
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_order_values_match_spec() {
        assert_eq!(DriverOrder::Early as i8, -128);
        assert_eq!(DriverOrder::BeforeAcpi as i8, -127);
        assert_eq!(DriverOrder::Acpi as i8, 0);
        assert_eq!(DriverOrder::Last as i8, 127);
    }
}
