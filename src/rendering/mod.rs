//! Overlay rendering: layout, paint commands and a software rasterizer

pub mod layout;
pub mod paint;
pub mod raster;

pub use layout::OverlayLayout;
pub use paint::{PaintCommand, Rgba};
pub use raster::{rasterize, Texture};

/// Paint the tap-to-play overlay into a single square texture.
pub fn render_overlay(layout: &OverlayLayout) -> Texture {
    rasterize(layout.size, layout.size, &layout.commands())
}
