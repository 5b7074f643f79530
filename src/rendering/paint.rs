/// Paint command set for 2D overlay composition

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);

    /// Build from a CSS-style `rgba()` with alpha in `0.0..=1.0`.
    pub fn with_alpha(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Rgba(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
        rgba: Rgba,
    },
    Triangle {
        points: [(f32, f32); 3],
        rgba: Rgba,
    },
    /// Text centred horizontally on `cx` with its baseline at `baseline`.
    Text {
        cx: f32,
        baseline: f32,
        px: f32,
        text: String,
        rgba: Rgba,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_alpha_maps_to_byte() {
        assert_eq!(Rgba::with_alpha(0, 0, 0, 0.5), Rgba(0, 0, 0, 128));
        assert_eq!(Rgba::with_alpha(0, 0, 0, 2.0).3, 255);
    }
}
