//! The TTY capability: a byte-writable terminal that may mirror to a console.

use alloc::sync::Arc;

use crate::console::Console;
use crate::error::DriverError;

/// Lifecycle state of a TTY with respect to console mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtyState {
    /// Writes update the cell buffer only; nothing is mirrored to a console.
    Inactive,
    /// Writes are mirrored to the attached console as they happen.
    Active,
}

/// Capability a driver must expose to be recognised as a TTY by the driver
/// registry's post-init hook.
///
/// Cursor coordinates at this layer are 1-based, matching the virtual
/// terminal's cell-grid convention. Methods take `&self` for the same
/// shared-ownership reason as [`Console`].
pub trait Tty: Send + Sync {
    /// Writes a single byte, applying terminal control-character semantics
    /// (CR, LF, BS, TAB) and, in [`TtyState::Active`], mirroring to the
    /// attached console.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::WriteToUnattachedTty`] if the terminal is
    /// active but has no console attached.
    fn write(&self, byte: u8) -> Result<(), DriverError>;

    /// Attaches this terminal to `console`, resizing its viewport and
    /// clearing its cell buffer to the console's default colors. Passing
    /// `None` detaches the terminal from whatever console it was attached
    /// to, if any.
    fn attach_to(&self, console: Option<Arc<dyn Console>>);

    /// Returns the current mirroring state.
    fn state(&self) -> TtyState;

    /// Sets the mirroring state. Transitioning into [`TtyState::Active`]
    /// replays the current cell buffer to the attached console, if any.
    fn set_state(&self, new: TtyState);

    /// Returns the 1-based `(x, y)` cursor position.
    fn cursor_position(&self) -> (u32, u32);

    /// Moves the cursor to `(x, y)`, clamped to the viewport bounds.
    fn set_cursor_position(&self, x: u32, y: u32);
}
