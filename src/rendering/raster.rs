/// Software rasterizer for overlay textures

use super::paint::{PaintCommand, Rgba};
use sha2::{Digest, Sha256};

/// RGBA8 pixel buffer, row-major, top-left origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Texture {
    /// A fully transparent texture.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some(Rgba(self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]))
    }

    /// Hex SHA-256 over dimensions and pixels.
    pub fn content_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(&self.rgba);
        hex::encode(hasher.finalize())
    }

    // source-over compositing with straight alpha
    fn blend(&mut self, x: i64, y: i64, src: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 || src.3 == 0 {
            return;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let sa = src.3 as f32 / 255.0;
        let da = self.rgba[i + 3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        let channels = [src.0, src.1, src.2];
        for (c, s) in channels.iter().enumerate() {
            let sc = *s as f32;
            let dc = self.rgba[i + c] as f32;
            let v = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            self.rgba[i + c] = v.round().clamp(0.0, 255.0) as u8;
        }
        self.rgba[i + 3] = (out_a * 255.0).round() as u8;
    }
}

/// Paint `commands` in order onto a transparent `width` x `height` texture.
pub fn rasterize(width: u32, height: u32, commands: &[PaintCommand]) -> Texture {
    let mut tex = Texture::transparent(width, height);
    for cmd in commands {
        match cmd {
            PaintCommand::Circle { cx, cy, radius, rgba } => {
                let r2 = radius * radius;
                let (x0, x1) = span(cx - radius, cx + radius, width);
                let (y0, y1) = span(cy - radius, cy + radius, height);
                for py in y0..y1 {
                    for px in x0..x1 {
                        let dx = px as f32 + 0.5 - cx;
                        let dy = py as f32 + 0.5 - cy;
                        if dx * dx + dy * dy <= r2 {
                            tex.blend(px, py, *rgba);
                        }
                    }
                }
            }
            PaintCommand::Triangle { points, rgba } => {
                let min_x = points.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
                let max_x = points.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
                let min_y = points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
                let max_y = points.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);
                let (x0, x1) = span(min_x, max_x, width);
                let (y0, y1) = span(min_y, max_y, height);
                for py in y0..y1 {
                    for px in x0..x1 {
                        if inside_triangle(points, px as f32 + 0.5, py as f32 + 0.5) {
                            tex.blend(px, py, *rgba);
                        }
                    }
                }
            }
            PaintCommand::Text { cx, baseline, px, text, rgba } => {
                draw_text(&mut tex, *cx, *baseline, *px, text, *rgba);
            }
        }
    }
    tex
}

fn span(lo: f32, hi: f32, limit: u32) -> (i64, i64) {
    let lo = lo.floor().max(0.0) as i64;
    let hi = (hi.ceil() as i64).min(limit as i64);
    (lo, hi.max(lo))
}

fn edge(a: (f32, f32), b: (f32, f32), x: f32, y: f32) -> f32 {
    (b.0 - a.0) * (y - a.1) - (b.1 - a.1) * (x - a.0)
}

fn inside_triangle(p: &[(f32, f32); 3], x: f32, y: f32) -> bool {
    let e0 = edge(p[0], p[1], x, y);
    let e1 = edge(p[1], p[2], x, y);
    let e2 = edge(p[2], p[0], x, y);
    (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0)
}

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
const ADVANCE: u32 = GLYPH_W + 1;

/// 5x7 bitmap glyphs, one byte per row, bit 4 is the leftmost column.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0x00; 7],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        // unknown characters render as a hollow box
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}

/// Horizontal extent in pixels of `text` set at `px`.
pub fn text_width(text: &str, px: f32) -> f32 {
    let cell = px / GLYPH_H as f32;
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0.0;
    }
    (n * ADVANCE - 1) as f32 * cell
}

fn draw_text(tex: &mut Texture, cx: f32, baseline: f32, px: f32, text: &str, rgba: Rgba) {
    let cell = px / GLYPH_H as f32;
    let left = cx - text_width(text, px) / 2.0;
    let top = baseline - GLYPH_H as f32 * cell;
    for (i, c) in text.chars().enumerate() {
        let gx = left + (i as u32 * ADVANCE) as f32 * cell;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let x0 = (gx + col as f32 * cell).round() as i64;
                let x1 = (gx + (col + 1) as f32 * cell).round() as i64;
                let y0 = (top + row as f32 * cell).round() as i64;
                let y1 = (top + (row + 1) as f32 * cell).round() as i64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        tex.blend(x, y, rgba);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_list_is_transparent() {
        let t = rasterize(16, 8, &[]);
        assert_eq!(t.rgba.len(), 16 * 8 * 4);
        assert!(t.rgba.iter().all(|b| *b == 0));
    }

    #[test]
    fn translucent_circle_blends_over_transparent() {
        let t = rasterize(
            64,
            64,
            &[PaintCommand::Circle { cx: 32.0, cy: 32.0, radius: 10.0, rgba: Rgba(0, 0, 0, 128) }],
        );
        assert_eq!(t.pixel(32, 32), Some(Rgba(0, 0, 0, 128)));
        assert_eq!(t.pixel(0, 0), Some(Rgba(0, 0, 0, 0)));
    }

    #[test]
    fn opaque_triangle_covers_centroid() {
        let t = rasterize(
            32,
            32,
            &[PaintCommand::Triangle { points: [(2.0, 2.0), (2.0, 30.0), (30.0, 16.0)], rgba: Rgba::WHITE }],
        );
        assert_eq!(t.pixel(11, 16), Some(Rgba::WHITE));
        assert_eq!(t.pixel(30, 2).map(|p| p.3), Some(0));
    }

    #[test]
    fn white_over_translucent_black_is_opaque_white() {
        let t = rasterize(
            32,
            32,
            &[
                PaintCommand::Circle { cx: 16.0, cy: 16.0, radius: 16.0, rgba: Rgba(0, 0, 0, 128) },
                PaintCommand::Triangle { points: [(8.0, 8.0), (8.0, 24.0), (24.0, 16.0)], rgba: Rgba::WHITE },
            ],
        );
        assert_eq!(t.pixel(12, 16), Some(Rgba::WHITE));
        assert_eq!(t.pixel(16, 28), Some(Rgba(0, 0, 0, 128)));
    }

    #[test]
    fn text_is_centred_on_anchor() {
        let w = text_width("TAP", 14.0);
        assert_eq!(w, 34.0);
        let t = rasterize(
            64,
            32,
            &[PaintCommand::Text { cx: 32.0, baseline: 24.0, px: 14.0, text: "T".into(), rgba: Rgba::WHITE }],
        );
        // the T stem sits on the centre column
        assert_eq!(t.pixel(32, 20).map(|p| p.3), Some(255));
        assert_eq!(t.pixel(2, 20).map(|p| p.3), Some(0));
    }

    #[test]
    fn digest_changes_with_content() {
        let a = rasterize(8, 8, &[]);
        let b = rasterize(8, 8, &[PaintCommand::Circle { cx: 4.0, cy: 4.0, radius: 1.0, rgba: Rgba(0, 0, 0, 255) }]);
        assert_eq!(a.content_digest().len(), 64);
        assert_ne!(a.content_digest(), b.content_digest());
    }
}
