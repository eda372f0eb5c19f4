//! Color types shared by the console capability set.

/// Standard ANSI color indices (0..15).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AnsiColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

/// A cell foreground/background color as seen by the terminal and the
/// drivers it writes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// One of the 16 standard ANSI colors.
    Ansi(AnsiColor),
    /// The console's default color (its choice of fg/bg for a blank cell).
    Default,
}

/// 8-bit-per-channel color with alpha, used for palette entries.
///
/// Channel order is `(red, green, blue, alpha)`; a console that only
/// supports opaque colors ignores `alpha`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    /// Alpha channel; opaque consoles ignore this.
    pub alpha: u8,
}

impl Rgba {
    /// Builds an opaque color (`alpha = 0xff`).
    #[must_use]
    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 0xff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_sets_full_alpha() {
        let c = Rgba::opaque(1, 2, 3);
        assert_eq!(c.alpha, 0xff);
    }

    #[test]
    fn default_color_is_distinct_from_any_ansi_entry() {
        assert_ne!(Color::Default, Color::Ansi(AnsiColor::Black));
    }
}
