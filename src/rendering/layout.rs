/// Layout of the tap-to-play overlay canvas

use super::paint::{PaintCommand, Rgba};

/// Geometry of the overlay drawing, scaled from a 512 px reference canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    pub size: u32,
    pub label: String,
}

const REFERENCE: f32 = 512.0;

impl OverlayLayout {
    pub fn new(size: u32, label: impl Into<String>) -> Self {
        Self { size, label: label.into() }
    }

    fn unit(&self) -> f32 {
        self.size as f32 / REFERENCE
    }

    /// Backing disc: centre and radius.
    pub fn disc(&self) -> (f32, f32, f32) {
        let s = self.size as f32;
        let u = self.unit();
        (s / 2.0, s / 2.0 - 60.0 * u, 120.0 * u)
    }

    /// Play glyph pointing right.
    pub fn play_glyph(&self) -> [(f32, f32); 3] {
        let c = self.size as f32 / 2.0;
        let u = self.unit();
        [
            (c - 40.0 * u, c - 120.0 * u),
            (c - 40.0 * u, c),
            (c + 70.0 * u, c - 60.0 * u),
        ]
    }

    /// Label centre x, baseline y and font size.
    pub fn label_anchor(&self) -> (f32, f32, f32) {
        let s = self.size as f32;
        let u = self.unit();
        (s / 2.0, s - 80.0 * u, 50.0 * u)
    }

    /// Ordered paint commands: disc, glyph, label.
    pub fn commands(&self) -> Vec<PaintCommand> {
        let (cx, cy, radius) = self.disc();
        let (lx, baseline, px) = self.label_anchor();
        vec![
            PaintCommand::Circle { cx, cy, radius, rgba: Rgba::with_alpha(0, 0, 0, 0.5) },
            PaintCommand::Triangle { points: self.play_glyph(), rgba: Rgba::WHITE },
            PaintCommand::Text { cx: lx, baseline, px, text: self.label.clone(), rgba: Rgba::WHITE },
        ]
    }
}
