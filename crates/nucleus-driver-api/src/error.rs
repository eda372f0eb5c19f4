//! Error kinds surfaced by the multiboot accessors and the driver pipeline.

/// Errors produced by the driver-probe pipeline and the TTY's write path.
///
/// Most of these are not fatal: [`Self::MissingTag`] and
/// [`Self::DriverProbeAbsent`] are swallowed silently by their callers, and
/// [`Self::DriverInitFailed`] only skips the one driver that failed. Only
/// [`Self::WriteToUnattachedTty`] is surfaced to an external caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// A queried multiboot tag is not present in the info block.
    MissingTag,
    /// A descriptor's `probe` returned `None`; its hardware was not found.
    DriverProbeAbsent,
    /// A driver's `init` returned an error.
    DriverInitFailed {
        /// Name of the driver that failed to initialise.
        driver_name: &'static str,
        /// Version of the driver that failed to initialise.
        version: u32,
    },
    /// A TTY write was attempted while the terminal had no console attached.
    WriteToUnattachedTty,
}

impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingTag => write!(f, "requested multiboot tag is not present"),
            Self::DriverProbeAbsent => write!(f, "driver probe found no matching hardware"),
            Self::DriverInitFailed {
                driver_name,
                version,
            } => write!(f, "driver {driver_name} v{version} failed to initialise"),
            Self::WriteToUnattachedTty => write!(f, "write to a tty with no attached console"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn driver_init_failed_message_names_driver_and_version() {
        let err = DriverError::DriverInitFailed {
            driver_name: "vga-text",
            version: 1,
        };
        assert_eq!(format!("{err}"), "driver vga-text v1 failed to initialise");
    }
}
