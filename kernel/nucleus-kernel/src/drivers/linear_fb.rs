//! Linear-framebuffer console over a direct-RGB surface.
//!
//! Glyph rasterization needs a font bitmap, which is out of this crate's
//! scope (asset *data*, not the selection machinery around it): each cell
//! is rendered as a solid block, filled with `bg` and, for any byte other
//! than a space, an inset block of `fg` marking it non-blank. A real font
//! renderer attaches by calling [`Console::set_font`] once one is
//! registered; until then this is what boot output looks like.

use alloc::sync::Arc;

use nucleus_driver_api::{
    Color, Console, DimensionUnit, Driver, DriverError, DriverKind, Rgba, ScrollDirection,
};

use crate::multiboot::{self, FramebufferType, RgbLayout};

const CELL_WIDTH: u32 = 8;
const CELL_HEIGHT: u32 = 16;
const INSET: u32 = 2;

const ANSI_RGB: [Rgba; 16] = [
    Rgba::opaque(0x00, 0x00, 0x00), // Black
    Rgba::opaque(0xAA, 0x00, 0x00), // Red
    Rgba::opaque(0x00, 0xAA, 0x00), // Green
    Rgba::opaque(0xAA, 0x55, 0x00), // Yellow
    Rgba::opaque(0x00, 0x00, 0xAA), // Blue
    Rgba::opaque(0xAA, 0x00, 0xAA), // Magenta
    Rgba::opaque(0x00, 0xAA, 0xAA), // Cyan
    Rgba::opaque(0xAA, 0xAA, 0xAA), // White
    Rgba::opaque(0x55, 0x55, 0x55), // BrightBlack
    Rgba::opaque(0xFF, 0x55, 0x55), // BrightRed
    Rgba::opaque(0x55, 0xFF, 0x55), // BrightGreen
    Rgba::opaque(0xFF, 0xFF, 0x55), // BrightYellow
    Rgba::opaque(0x55, 0x55, 0xFF), // BrightBlue
    Rgba::opaque(0xFF, 0x55, 0xFF), // BrightMagenta
    Rgba::opaque(0x55, 0xFF, 0xFF), // BrightCyan
    Rgba::opaque(0xFF, 0xFF, 0xFF), // BrightWhite
];

const DEFAULT_FG: Rgba = Rgba::opaque(0xAA, 0xAA, 0xAA);
const DEFAULT_BG: Rgba = Rgba::opaque(0x00, 0x00, 0x00);

fn rgba_of(color: Color, default: Rgba) -> Rgba {
    match color {
        Color::Ansi(ansi) => ANSI_RGB[ansi as usize],
        Color::Default => default,
    }
}

fn channel(value: u8, bits: u8) -> u32 {
    match bits {
        0 => 0,
        bits if bits >= 8 => u32::from(value),
        bits => u32::from(value) >> (8 - bits),
    }
}

fn pack(rgba: Rgba, layout: RgbLayout) -> u32 {
    (channel(rgba.red, layout.red_mask) << layout.red_pos)
        | (channel(rgba.green, layout.green_mask) << layout.green_pos)
        | (channel(rgba.blue, layout.blue_mask) << layout.blue_pos)
}

/// A direct-RGB framebuffer console, cell-addressed in fixed 8x16 blocks.
pub struct LinearFbConsole {
    base: u64,
    pitch: u32,
    width_px: u32,
    height_px: u32,
    layout: RgbLayout,
}

impl LinearFbConsole {
    fn write_pixel(&self, x: u32, y: u32, value: u32) {
        if x >= self.width_px || y >= self.height_px {
            return;
        }
        let offset = (y * self.pitch + x * 4) as usize;
        let ptr = self.base.wrapping_add(offset as u64) as *mut u32;
        // SAFETY: bounds checked above; `base` is the linear framebuffer the
        // boot loader reported, mapped read/write for the kernel's runtime.
        unsafe { core::ptr::write_volatile(ptr, value) };
    }

    fn fill_pixels(&self, x: u32, y: u32, width: u32, height: u32, value: u32) {
        for row in y..(y + height).min(self.height_px) {
            for col in x..(x + width).min(self.width_px) {
                self.write_pixel(col, row, value);
            }
        }
    }
}

impl Console for LinearFbConsole {
    fn dimensions(&self, unit: DimensionUnit) -> (u32, u32) {
        match unit {
            DimensionUnit::Pixels => (self.width_px, self.height_px),
            DimensionUnit::Characters => (self.width_px / CELL_WIDTH, self.height_px / CELL_HEIGHT),
        }
    }

    fn default_colors(&self) -> (Color, Color) {
        (Color::Default, Color::Default)
    }

    fn write(&self, byte: u8, fg: Color, bg: Color, x: u32, y: u32) {
        let bg_value = pack(rgba_of(bg, DEFAULT_BG), self.layout);
        let px = x * CELL_WIDTH;
        let py = y * CELL_HEIGHT;
        self.fill_pixels(px, py, CELL_WIDTH, CELL_HEIGHT, bg_value);

        if byte != b' ' {
            let fg_value = pack(rgba_of(fg, DEFAULT_FG), self.layout);
            self.fill_pixels(
                px + INSET,
                py + INSET,
                CELL_WIDTH - 2 * INSET,
                CELL_HEIGHT - 2 * INSET,
                fg_value,
            );
        }
    }

    fn fill(&self, x: u32, y: u32, width: u32, height: u32, fg: Color, bg: Color) {
        let _ = fg;
        let bg_value = pack(rgba_of(bg, DEFAULT_BG), self.layout);
        self.fill_pixels(x * CELL_WIDTH, y * CELL_HEIGHT, width * CELL_WIDTH, height * CELL_HEIGHT, bg_value);
    }

    fn scroll(&self, direction: ScrollDirection, lines: u32) {
        let (_, height_cells) = self.dimensions(DimensionUnit::Characters);
        let lines_px = (lines * CELL_HEIGHT).min(self.height_px);
        if lines_px == 0 {
            return;
        }
        let row_bytes = self.pitch as usize;
        let moved_rows = (self.height_px - lines_px) as usize;
        if moved_rows == 0 || height_cells == 0 {
            return;
        }
        let base = self.base as *mut u8;
        match direction {
            ScrollDirection::Up => {
                let src = (lines_px as usize) * row_bytes;
                // SAFETY: `src` and `0` both lie within the framebuffer's
                // `height_px * pitch` bytes; the copied span fits between
                // `src` and the end of the buffer by construction.
                unsafe { core::ptr::copy(base.add(src), base, moved_rows * row_bytes) };
            }
            ScrollDirection::Down => {
                let dst = (lines_px as usize) * row_bytes;
                // SAFETY: symmetric with the `Up` case.
                unsafe { core::ptr::copy(base, base.add(dst), moved_rows * row_bytes) };
            }
        }
    }
}

fn init_failed() -> DriverError {
    DriverError::DriverInitFailed {
        driver_name: "linear-fb",
        version: 1,
    }
}

fn init() -> Result<DriverKind, DriverError> {
    let info = multiboot::get_framebuffer_info().ok_or_else(init_failed)?;
    if info.fb_type != FramebufferType::Rgb || info.bpp != 32 {
        return Err(init_failed());
    }
    let layout = info.rgb().ok_or_else(init_failed)?;
    let console = LinearFbConsole {
        base: info.phys_addr.as_u64(),
        pitch: info.pitch,
        width_px: info.width,
        height_px: info.height,
        layout,
    };
    nucleus_core::kinfo!(
        "linear-fb: {}x{}x{} at {:#x}",
        console.width_px,
        console.height_px,
        info.bpp,
        console.base
    );
    Ok(DriverKind::Console(Arc::new(console)))
}

/// Probe for a direct-RGB framebuffer console.
///
/// Only 32-bit-per-pixel RGB surfaces are supported; any other bit depth
/// (or a text-mode/indexed surface, which the VGA-text driver or a future
/// palette-aware driver handles) is reported absent.
pub fn probe() -> Option<Driver> {
    let info = multiboot::get_framebuffer_info()?;
    if info.fb_type != FramebufferType::Rgb || info.bpp != 32 {
        return None;
    }
    Some(Driver {
        name: "linear-fb",
        version: 1,
        init,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_scales_sub_byte_widths_down() {
        assert_eq!(channel(0xFF, 8), 0xFF);
        assert_eq!(channel(0xFF, 5), 0x1F);
        assert_eq!(channel(0xFF, 0), 0);
    }

    #[test]
    fn pack_places_each_channel_at_its_bit_position() {
        let layout = RgbLayout {
            red_pos: 16,
            red_mask: 8,
            green_pos: 8,
            green_mask: 8,
            blue_pos: 0,
            blue_mask: 8,
        };
        let value = pack(Rgba::opaque(0x12, 0x34, 0x56), layout);
        assert_eq!(value, 0x0012_3456);
    }

    #[test]
    fn rgba_of_default_uses_supplied_fallback() {
        let fallback = Rgba::opaque(1, 2, 3);
        assert_eq!(rgba_of(Color::Default, fallback), fallback);
    }
}
