use crate::foundation::{
    core::Rgba8Premul,
    error::{CollageError, CollageResult},
};

/// Byte layout of a packed 32-bit hex color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ByteOrder {
    /// `AARRGGBB`, used by version 2 documents.
    #[default]
    Argb,
    /// `RRGGBBAA`, used by early documents.
    Rgba,
}

/// Straight-alpha color with channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
    /// Alpha channel.
    pub a: f64,
}

impl Color {
    /// Opaque white, used when a document has no background at all.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    /// Opaque black, used for placeholder strokes.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    /// Build a color from straight channels.
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Quantize to straight RGBA8.
    pub fn to_rgba8(self) -> [u8; 4] {
        [
            to_u8(self.r),
            to_u8(self.g),
            to_u8(self.b),
            to_u8(self.a),
        ]
    }

    /// Quantize to premultiplied RGBA8.
    pub fn to_rgba8_premul(self) -> Rgba8Premul {
        let a = self.a.clamp(0.0, 1.0);
        Rgba8Premul {
            r: to_u8(self.r.clamp(0.0, 1.0) * a),
            g: to_u8(self.g.clamp(0.0, 1.0) * a),
            b: to_u8(self.b.clamp(0.0, 1.0) * a),
            a: to_u8(a),
        }
    }
}

fn to_u8(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Decode an 8-digit hex color in the given byte order.
///
/// A leading `#` is tolerated. Anything other than exactly eight hex digits after that
/// fails with [`CollageError::MalformedColor`].
pub fn decode_hex_color(s: &str, order: ByteOrder) -> CollageResult<Color> {
    let digits = s.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CollageError::MalformedColor(s.to_owned()));
    }
    let packed =
        u32::from_str_radix(digits, 16).map_err(|_| CollageError::MalformedColor(s.to_owned()))?;

    let byte = |shift: u32| f64::from((packed >> shift) & 0xFF) / 255.0;
    let color = match order {
        ByteOrder::Argb => Color::rgba(byte(16), byte(8), byte(0), byte(24)),
        ByteOrder::Rgba => Color::rgba(byte(24), byte(16), byte(8), byte(0)),
    };
    Ok(color)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
