//! Tap-to-play overlay shown on platforms that gate audible playback behind a
//! user gesture.
//!
//! The overlay is a backing plane (thumbnail, or solid black when there is
//! none) with the painted play button in front of it, grouped under the
//! anchor so it tracks the image target. A pointer hit while the overlay is
//! visible mints the session's single [`UnlockSignal`].

use crate::playback::{OverlayVisibility, UnlockSignal};
use crate::rendering::{render_overlay, OverlayLayout, Texture};
use crate::scene::{GroupId, Material, Mesh, Ndc, NodeId, PlaneGeometry, SceneHost, SceneNode};
use crate::Viewport;
use log::debug;
use std::sync::Arc;

/// Backing color used when no thumbnail is available.
pub const FALLBACK_BACKING: u32 = 0x000000;

// keeps the overlay planes in front of the video plane
const BACKING_DEPTH: f32 = 0.001;
const BUTTON_DEPTH: f32 = 0.002;

/// Source material for the plane behind the play button.
#[derive(Debug, Clone)]
pub enum Backing {
    Thumbnail { url: String, bytes: Arc<Vec<u8>> },
    Fallback,
}

impl Backing {
    fn material(&self) -> Material {
        match self {
            Backing::Thumbnail { url, bytes } => Material::Image { url: url.clone(), bytes: bytes.clone() },
            Backing::Fallback => Material::Solid { color: FALLBACK_BACKING },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Backing::Fallback)
    }
}

/// Client-space pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerEvent {
    pub fn new(client_x: f32, client_y: f32) -> Self {
        Self { client_x, client_y }
    }
}

pub struct OverlayController {
    node: NodeId,
    texture: Arc<Texture>,
    backing: Backing,
    consumed: bool,
}

impl OverlayController {
    /// Paint the overlay and attach it under `group`. Starts hidden.
    pub fn build(
        scene: &mut dyn SceneHost,
        group: GroupId,
        geometry: PlaneGeometry,
        layout: &OverlayLayout,
        backing: Backing,
    ) -> Self {
        let texture = Arc::new(render_overlay(layout));
        debug!(
            "overlay texture {}x{} digest={} fallback={}",
            texture.width,
            texture.height,
            texture.content_digest(),
            backing.is_fallback()
        );
        let node = SceneNode::Group(vec![
            SceneNode::Mesh(Mesh { geometry, material: backing.material(), depth: BACKING_DEPTH }),
            SceneNode::Mesh(Mesh {
                geometry,
                material: Material::Canvas { texture: texture.clone(), transparent: true },
                depth: BUTTON_DEPTH,
            }),
        ]);
        let node = scene.attach(group, node);
        scene.set_visible(node, false);
        Self { node, texture, backing, consumed: false }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    /// True once the overlay has produced its unlock signal.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Mirror the controller's derived visibility onto the scene.
    pub fn sync(&self, visibility: OverlayVisibility, scene: &mut dyn SceneHost) {
        let visible = visibility.is_visible() && !self.consumed;
        if scene.is_visible(self.node) != visible {
            scene.set_visible(self.node, visible);
        }
    }

    /// Hit-test a pointer event. A hit hides the overlay for good and yields
    /// the unlock signal; every later call returns `None`.
    pub fn handle_pointer(
        &mut self,
        pointer: PointerEvent,
        viewport: Viewport,
        visibility: OverlayVisibility,
        scene: &mut dyn SceneHost,
    ) -> Option<UnlockSignal> {
        if self.consumed || !visibility.is_visible() {
            return None;
        }
        let ndc = Ndc::from_client(pointer.client_x, pointer.client_y, viewport);
        if !scene.raycast(ndc, self.node) {
            return None;
        }
        self.consumed = true;
        scene.set_visible(self.node, false);
        debug!("overlay hit at ndc ({:.3}, {:.3})", ndc.x, ndc.y);
        Some(UnlockSignal::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{HeadlessScene, NdcRect};

    const VP: Viewport = Viewport { width: 400, height: 800 };

    fn setup(backing: Backing) -> (OverlayController, HeadlessScene) {
        let mut scene = HeadlessScene::new();
        let g = GroupId(0);
        scene.set_projection(g, Some(NdcRect { min: Ndc { x: -0.5, y: -0.5 }, max: Ndc { x: 0.5, y: 0.5 } }));
        let geometry = PlaneGeometry::from_video_size(16, 9).unwrap();
        let layout = OverlayLayout::new(64, "TAP TO PLAY");
        let o = OverlayController::build(&mut scene, g, geometry, &layout, backing);
        (o, scene)
    }

    #[test]
    fn built_overlay_is_hidden_until_synced() {
        let (o, mut scene) = setup(Backing::Fallback);
        assert!(!scene.is_visible(o.node()));
        o.sync(OverlayVisibility::Visible, &mut scene);
        assert!(scene.is_visible(o.node()));
        o.sync(OverlayVisibility::Hidden, &mut scene);
        assert!(!scene.is_visible(o.node()));
    }

    #[test]
    fn hit_yields_single_signal_and_hides() {
        let (mut o, mut scene) = setup(Backing::Fallback);
        o.sync(OverlayVisibility::Visible, &mut scene);
        let centre = PointerEvent::new(200.0, 400.0);
        assert!(o.handle_pointer(centre, VP, OverlayVisibility::Visible, &mut scene).is_some());
        assert!(o.is_consumed());
        assert!(!scene.is_visible(o.node()));
        assert!(o.handle_pointer(centre, VP, OverlayVisibility::Visible, &mut scene).is_none());
        o.sync(OverlayVisibility::Visible, &mut scene);
        assert!(!scene.is_visible(o.node()));
    }

    #[test]
    fn miss_and_hidden_overlay_are_ignored() {
        let (mut o, mut scene) = setup(Backing::Fallback);
        o.sync(OverlayVisibility::Visible, &mut scene);
        let corner = PointerEvent::new(5.0, 5.0);
        assert!(o.handle_pointer(corner, VP, OverlayVisibility::Visible, &mut scene).is_none());
        let centre = PointerEvent::new(200.0, 400.0);
        assert!(o.handle_pointer(centre, VP, OverlayVisibility::Hidden, &mut scene).is_none());
        assert!(!o.is_consumed());
    }

    #[test]
    fn thumbnail_and_fallback_backings_hit_identically() {
        let thumb = Backing::Thumbnail { url: "t.jpg".into(), bytes: Arc::new(vec![0xff, 0xd8]) };
        for backing in [thumb, Backing::Fallback] {
            let (mut o, mut scene) = setup(backing);
            o.sync(OverlayVisibility::Visible, &mut scene);
            assert!(o
                .handle_pointer(PointerEvent::new(5.0, 5.0), VP, OverlayVisibility::Visible, &mut scene)
                .is_none());
            assert!(o
                .handle_pointer(PointerEvent::new(210.0, 390.0), VP, OverlayVisibility::Visible, &mut scene)
                .is_some());
        }
    }

    #[test]
    fn fallback_backing_is_solid_black() {
        let (o, scene) = setup(Backing::Fallback);
        let mats = scene.materials(GroupId(0));
        assert_eq!(mats.len(), 2);
        assert!(matches!(mats[0], Material::Solid { color: FALLBACK_BACKING }));
        assert!(matches!(mats[1], Material::Canvas { transparent: true, .. }));
        assert_eq!(o.texture().width, 64);
    }
}
