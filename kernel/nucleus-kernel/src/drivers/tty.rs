//! TTY capability descriptor wrapping [`nucleus_tty::VirtualTerminal`].
//!
//! Unlike the console drivers, this one probes no hardware state at all:
//! the virtual terminal is a pure software construct, always available.

use alloc::sync::Arc;

use nucleus_driver_api::{Driver, DriverError, DriverKind};
use nucleus_tty::VirtualTerminal;

/// Horizontal tab stop width, in columns.
const TAB_WIDTH: u8 = 8;
/// Extra scrollback rows kept above the visible viewport.
const SCROLLBACK_LINES: u32 = 200;

fn init() -> Result<DriverKind, DriverError> {
    let terminal = VirtualTerminal::new(TAB_WIDTH, SCROLLBACK_LINES);
    Ok(DriverKind::Tty(Arc::new(terminal)))
}

/// Always succeeds: the virtual terminal needs no backing hardware.
pub fn probe() -> Option<Driver> {
    Some(Driver {
        name: "virtual-terminal",
        version: 1,
        init,
    })
}
