//! VGA text-mode (EGA-compatible) console, addressed at the framebuffer the
//! boot loader already reported through the multiboot framebuffer tag.
//!
//! The boot loader leaves the CPU in whatever text mode it booted in (BIOS
//! boot, typically 80x25 at physical 0xB8000); this driver does not set a
//! mode itself, only writes the cell grid the loader already set up.

use alloc::sync::Arc;

use nucleus_core::addr::PhysAddr;
use nucleus_driver_api::{
    AnsiColor, Color, Console, DimensionUnit, Driver, DriverError, DriverKind, ScrollDirection,
};

use crate::multiboot::{self, FramebufferType};

/// Maps an [`AnsiColor`] index (ANSI ordering) to its VGA palette index.
const ANSI_TO_VGA: [u8; 16] = [0, 4, 2, 6, 1, 5, 3, 7, 8, 12, 10, 14, 9, 13, 11, 15];

/// VGA's default text attribute: light gray (7) on black (0).
const DEFAULT_FG_VGA: u8 = 7;
const DEFAULT_BG_VGA: u8 = 0;

fn vga_index(color: Color, default: u8) -> u8 {
    match color {
        Color::Ansi(ansi) => ANSI_TO_VGA[ansi as usize],
        Color::Default => default,
    }
}

/// Text-mode console backed by the VGA/EGA character cell framebuffer.
pub struct VgaTextConsole {
    base: PhysAddr,
    pitch: u32,
    width: u32,
    height: u32,
}

impl VgaTextConsole {
    fn cell_ptr(&self, x: u32, y: u32) -> *mut u16 {
        let offset = (y * self.pitch + x * 2) as usize;
        // SAFETY: caller ensures `x < width` and `y < height`; the base
        // address is the identity-mapped legacy text framebuffer the boot
        // loader reported, live for the kernel's entire runtime.
        unsafe { self.base.as_u64().wrapping_add(offset as u64) as *mut u16 }
    }

    fn write_cell(&self, x: u32, y: u32, byte: u8, fg: u8, bg: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let attr = (bg << 4) | (fg & 0x0F);
        let value = u16::from(byte) | (u16::from(attr) << 8);
        // SAFETY: bounds checked above; the framebuffer is plain memory
        // mapped read/write for the whole text-mode cell grid.
        unsafe { core::ptr::write_volatile(self.cell_ptr(x, y), value) };
    }
}

impl Console for VgaTextConsole {
    fn dimensions(&self, _unit: DimensionUnit) -> (u32, u32) {
        // EGA text mode has no separate pixel/character distinction; the
        // framebuffer tag already reports character-cell dimensions.
        (self.width, self.height)
    }

    fn default_colors(&self) -> (Color, Color) {
        (Color::Default, Color::Default)
    }

    fn write(&self, byte: u8, fg: Color, bg: Color, x: u32, y: u32) {
        self.write_cell(x, y, byte, vga_index(fg, DEFAULT_FG_VGA), vga_index(bg, DEFAULT_BG_VGA));
    }

    fn fill(&self, x: u32, y: u32, width: u32, height: u32, fg: Color, bg: Color) {
        let fg = vga_index(fg, DEFAULT_FG_VGA);
        let bg = vga_index(bg, DEFAULT_BG_VGA);
        for row in y..(y + height).min(self.height) {
            for col in x..(x + width).min(self.width) {
                self.write_cell(col, row, b' ', fg, bg);
            }
        }
    }

    fn scroll(&self, direction: ScrollDirection, lines: u32) {
        let lines = lines.min(self.height);
        if lines == 0 {
            return;
        }
        let row_bytes = self.pitch as usize;
        let moved_rows = (self.height - lines) as usize;
        if moved_rows == 0 {
            return;
        }
        let base = self.base.as_u64() as *mut u8;
        match direction {
            ScrollDirection::Up => {
                let src = (lines as usize) * row_bytes;
                // SAFETY: `src` and the destination `0` both lie within the
                // `height * pitch`-byte text framebuffer; `moved_rows *
                // row_bytes` never exceeds the remaining span from `src`.
                unsafe { core::ptr::copy(base.add(src), base, moved_rows * row_bytes) };
            }
            ScrollDirection::Down => {
                let dst = (lines as usize) * row_bytes;
                // SAFETY: symmetric with the `Up` case.
                unsafe { core::ptr::copy(base, base.add(dst), moved_rows * row_bytes) };
            }
        }
    }
}

fn init_failed() -> DriverError {
    DriverError::DriverInitFailed {
        driver_name: "vga-text",
        version: 1,
    }
}

fn init() -> Result<DriverKind, DriverError> {
    let info = multiboot::get_framebuffer_info().ok_or_else(init_failed)?;
    if info.fb_type != FramebufferType::Ega {
        return Err(init_failed());
    }
    let console = VgaTextConsole {
        base: info.phys_addr,
        pitch: info.pitch,
        width: info.width,
        height: info.height,
    };
    nucleus_core::kinfo!("vga-text: {}x{} at {:#x}", console.width, console.height, console.base.as_u64());
    Ok(DriverKind::Console(Arc::new(console)))
}

/// Probe for the EGA text-mode console: present whenever the boot loader's
/// framebuffer tag reports text mode.
pub fn probe() -> Option<Driver> {
    let info = multiboot::get_framebuffer_info()?;
    if info.fb_type != FramebufferType::Ega {
        return None;
    }
    Some(Driver {
        name: "vga-text",
        version: 1,
        init,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_to_vga_maps_primary_colors() {
        assert_eq!(ANSI_TO_VGA[AnsiColor::Black as usize], 0);
        assert_eq!(ANSI_TO_VGA[AnsiColor::Blue as usize], 1);
        assert_eq!(ANSI_TO_VGA[AnsiColor::Red as usize], 4);
        assert_eq!(ANSI_TO_VGA[AnsiColor::White as usize], 7);
    }

    #[test]
    fn vga_index_falls_back_to_default_for_default_color() {
        assert_eq!(vga_index(Color::Default, DEFAULT_FG_VGA), DEFAULT_FG_VGA);
        assert_eq!(vga_index(Color::Ansi(AnsiColor::Green), 0), 2);
    }
}
