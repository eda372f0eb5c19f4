//! Framebuffer-info tag types.

use nucleus_core::addr::PhysAddr;

/// Pixel layout of a framebuffer, from the tag's `type` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferType {
    /// Indexed-color (palette-driven) framebuffer.
    Indexed,
    /// Direct RGB framebuffer; [`FramebufferInfo::rgb`] describes the
    /// channel layout.
    Rgb,
    /// VGA text mode (EGA-compatible); `width`/`height` are in characters,
    /// not pixels.
    Ega,
}

impl FramebufferType {
    const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Indexed),
            1 => Some(Self::Rgb),
            2 => Some(Self::Ega),
            _ => None,
        }
    }
}

/// Per-channel bit position and mask for an RGB framebuffer, valid only
/// when [`FramebufferInfo::fb_type`] is [`FramebufferType::Rgb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbLayout {
    pub red_pos: u8,
    pub red_mask: u8,
    pub green_pos: u8,
    pub green_mask: u8,
    pub blue_pos: u8,
    pub blue_mask: u8,
}

/// Decoded framebuffer-info tag (kind 8) payload.
#[derive(Debug, Clone, Copy)]
pub struct FramebufferInfo {
    /// Physical address of the framebuffer's first byte.
    pub phys_addr: PhysAddr,
    /// Bytes per scanline.
    pub pitch: u32,
    /// Width, in pixels for [`FramebufferType::Indexed`]/[`FramebufferType::Rgb`],
    /// in characters for [`FramebufferType::Ega`].
    pub width: u32,
    /// Height, same unit convention as `width`.
    pub height: u32,
    /// Bits per pixel (0 for EGA text mode).
    pub bpp: u8,
    /// Pixel layout.
    pub fb_type: FramebufferType,
    /// RGB channel layout; only meaningful when `fb_type == Rgb`.
    rgb: Option<RgbLayout>,
}

impl FramebufferInfo {
    /// Returns the RGB channel layout, or `None` if this framebuffer is not
    /// [`FramebufferType::Rgb`] — the colour info is only addressable for
    /// that type, per spec.
    #[must_use]
    pub const fn rgb(&self) -> Option<RgbLayout> {
        if matches!(self.fb_type, FramebufferType::Rgb) {
            self.rgb
        } else {
            None
        }
    }

    /// Parses a framebuffer-info tag payload.
    ///
    /// `payload` must be at least 20 bytes (the fixed header up to and
    /// including `type`); RGB layouts additionally require 6 trailing
    /// colour-info bytes starting at offset 20. Returns `None` if the
    /// payload is too short or `type` is not one of the three known values.
    #[must_use]
    pub(crate) fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < 20 {
            return None;
        }
        let phys_addr = u64::from_le_bytes(payload[0..8].try_into().ok()?);
        let pitch = u32::from_le_bytes(payload[8..12].try_into().ok()?);
        let width = u32::from_le_bytes(payload[12..16].try_into().ok()?);
        let height = u32::from_le_bytes(payload[16..20].try_into().ok()?);
        let bpp = payload[20];
        let fb_type = FramebufferType::from_raw(payload[21])?;

        let rgb = if matches!(fb_type, FramebufferType::Rgb) {
            let c = payload.get(24..30)?;
            Some(RgbLayout {
                red_pos: c[0],
                red_mask: c[1],
                green_pos: c[2],
                green_mask: c[3],
                blue_pos: c[4],
                blue_mask: c[5],
            })
        } else {
            None
        };

        Some(Self {
            phys_addr: PhysAddr::new(phys_addr),
            pitch,
            width,
            height,
            bpp,
            fb_type,
            rgb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ega_payload() -> Vec<u8> {
        let mut p = vec![0u8; 22];
        p[0..8].copy_from_slice(&0xB_8000u64.to_le_bytes());
        p[8..12].copy_from_slice(&160u32.to_le_bytes());
        p[12..16].copy_from_slice(&80u32.to_le_bytes());
        p[16..20].copy_from_slice(&25u32.to_le_bytes());
        p[20] = 0; // bpp unused for EGA
        p[21] = 2; // type = EGA
        p
    }

    #[test]
    fn parses_ega_text_mode() {
        let payload = ega_payload();
        let fb = FramebufferInfo::parse(&payload).unwrap();
        assert_eq!(fb.fb_type, FramebufferType::Ega);
        assert_eq!(fb.phys_addr.as_u64(), 0xB_8000);
        assert_eq!(fb.pitch, 160);
        assert_eq!(fb.width, 80);
        assert_eq!(fb.height, 25);
        assert!(fb.rgb().is_none());
    }

    #[test]
    fn rgb_colour_info_only_addressable_for_rgb_type() {
        let mut payload = vec![0u8; 30];
        payload[12..16].copy_from_slice(&1024u32.to_le_bytes());
        payload[16..20].copy_from_slice(&768u32.to_le_bytes());
        payload[20] = 32;
        payload[21] = 1; // type = RGB
        payload[24..30].copy_from_slice(&[16, 8, 8, 8, 0, 8]);
        let fb = FramebufferInfo::parse(&payload).unwrap();
        let rgb = fb.rgb().unwrap();
        assert_eq!(rgb.red_pos, 16);
        assert_eq!(rgb.blue_mask, 8);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        assert!(FramebufferInfo::parse(&[0u8; 10]).is_none());
    }

    #[test]
    fn unknown_type_byte_is_rejected() {
        let mut payload = ega_payload();
        payload[21] = 7;
        assert!(FramebufferInfo::parse(&payload).is_none());
    }
}
