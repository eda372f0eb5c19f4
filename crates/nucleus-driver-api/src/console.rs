//! The console capability: a device a terminal can write cells to.
//!
//! Methods take `&self`: a console is shared (`Arc<dyn Console>`) between the
//! HAL's "active console" handle and whichever TTY is attached to it, so any
//! driver implementing this trait guards its own mutable state internally
//! (a [`nucleus_core::sync::SpinLock`] around a cell grid, typically).

use alloc::vec::Vec;

use crate::color::{Color, Rgba};
use crate::font::{Font, Logo};

/// Unit a [`Console::dimensions`] query is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionUnit {
    /// Raw pixel dimensions of the backing surface.
    Pixels,
    /// Character-cell dimensions (glyph width/height already divided out).
    Characters,
}

/// Direction for [`Console::scroll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Content moves up; a blank row appears at the bottom.
    Up,
    /// Content moves down; a blank row appears at the top.
    Down,
}

/// Capability a driver must expose to be recognised as a console by the
/// driver registry's post-init hook.
///
/// All coordinates are in character cells and 0-based; this differs from the
/// TTY capability's 1-based cursor coordinates, which are translated at the
/// terminal/console boundary.
pub trait Console: Send + Sync {
    /// Reports this console's size in the requested unit.
    ///
    /// Returns `(width, height)`.
    fn dimensions(&self, unit: DimensionUnit) -> (u32, u32);

    /// Returns this console's default foreground/background colors, used to
    /// fill blank cells.
    ///
    /// Returns `(fg, bg)`.
    fn default_colors(&self) -> (Color, Color);

    /// Writes one character cell at `(x, y)`.
    fn write(&self, byte: u8, fg: Color, bg: Color, x: u32, y: u32);

    /// Fills a rectangle of cells with a single color pair.
    fn fill(&self, x: u32, y: u32, width: u32, height: u32, fg: Color, bg: Color);

    /// Scrolls the console's visible area by `lines` rows.
    fn scroll(&self, direction: ScrollDirection, lines: u32);

    /// Sets palette entry `index` to `rgba`, if this console supports a
    /// programmable palette.
    fn set_palette_color(&self, index: u8, rgba: Rgba) {
        let _ = (index, rgba);
    }

    /// Returns a copy of the console's current palette, if it has one.
    fn palette(&self) -> Option<Vec<Rgba>> {
        None
    }

    /// Installs `font` as the console's active glyph set, if supported.
    fn set_font(&self, font: &Font) {
        let _ = font;
    }

    /// Installs `logo` as the console's boot splash, if supported.
    fn set_logo(&self, logo: &Logo) {
        let _ = logo;
    }
}
