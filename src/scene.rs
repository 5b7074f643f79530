//! Scene graph boundary.
//!
//! The 3D renderer is a host collaborator. The core only describes what it
//! wants attached under an anchor group ([`SceneNode`]), toggles visibility,
//! asks the host to ray cast, and requests renders. [`HeadlessScene`] is an
//! in-memory host that projects each anchor group to a screen-space rectangle.

use crate::rendering::Texture;
use crate::Viewport;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Scene node holding an anchor's content, owned by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub usize);

/// Node attached by the core under a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Plane sized to the video's aspect ratio, one unit wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
}

impl PlaneGeometry {
    /// Plane for a video of `width` x `height`; `None` until dimensions are known.
    pub fn from_video_size(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            width: 1.0,
            height: height as f32 / width as f32,
        })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.height / self.width
    }
}

/// Texture fed from the video element; the renderer re-uploads it when dirty.
#[derive(Debug)]
pub struct VideoTexture {
    /// Linear min/mag filtering.
    pub linear_filtering: bool,
    pub generate_mipmaps: bool,
    needs_update: AtomicBool,
    marks: AtomicU64,
}

impl VideoTexture {
    pub fn new() -> Self {
        Self {
            linear_filtering: true,
            generate_mipmaps: false,
            needs_update: AtomicBool::new(false),
            marks: AtomicU64::new(0),
        }
    }

    pub fn mark_needs_update(&self) {
        self.needs_update.store(true, Ordering::Release);
        self.marks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update.load(Ordering::Acquire)
    }

    /// Clear the dirty flag, returning whether an upload is due.
    pub fn take_update(&self) -> bool {
        self.needs_update.swap(false, Ordering::AcqRel)
    }

    /// Number of times the texture has been marked dirty.
    pub fn marks(&self) -> u64 {
        self.marks.load(Ordering::Relaxed)
    }
}

impl Default for VideoTexture {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub enum Material {
    Video(Arc<VideoTexture>),
    /// Rasterized texture; `transparent` enables alpha blending.
    Canvas { texture: Arc<Texture>, transparent: bool },
    /// Encoded image bytes decoded by the host.
    Image { url: String, bytes: Arc<Vec<u8>> },
    Solid { color: u32 },
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: PlaneGeometry,
    pub material: Material,
    /// Offset along the plane normal, towards the camera.
    pub depth: f32,
}

#[derive(Debug, Clone)]
pub enum SceneNode {
    Mesh(Mesh),
    Group(Vec<SceneNode>),
}

impl SceneNode {
    /// Meshes in this subtree, depth-first.
    pub fn meshes(&self) -> Vec<&Mesh> {
        match self {
            SceneNode::Mesh(m) => vec![m],
            SceneNode::Group(children) => children.iter().flat_map(|c| c.meshes()).collect(),
        }
    }
}

/// Pointer position in normalized device coordinates (`-1..=1`, y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ndc {
    pub x: f32,
    pub y: f32,
}

impl Ndc {
    /// Project client-space pointer coordinates into NDC.
    pub fn from_client(client_x: f32, client_y: f32, viewport: Viewport) -> Self {
        Ndc {
            x: (client_x / viewport.width as f32) * 2.0 - 1.0,
            y: -(client_y / viewport.height as f32) * 2.0 + 1.0,
        }
    }
}

/// Rendering engine the core attaches content to.
pub trait SceneHost: Send {
    fn attach(&mut self, group: GroupId, node: SceneNode) -> NodeId;
    fn set_visible(&mut self, node: NodeId, visible: bool);
    fn is_visible(&self, node: NodeId) -> bool;
    /// Cast a ray from the camera through `ndc`; true on any intersection with `node`.
    fn raycast(&self, ndc: Ndc, node: NodeId) -> bool;
    fn render(&mut self);
}

/// Axis-aligned screen rectangle in NDC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NdcRect {
    pub min: Ndc,
    pub max: Ndc,
}

impl NdcRect {
    pub fn contains(&self, p: Ndc) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

struct AttachedNode {
    group: GroupId,
    node: SceneNode,
    visible: bool,
}

#[derive(Default)]
struct HeadlessState {
    nodes: Vec<AttachedNode>,
    projections: Vec<(GroupId, NdcRect)>,
    renders: u64,
    uploads: u64,
}

/// In-memory scene host; clones share the same scene.
#[derive(Clone, Default)]
pub struct HeadlessScene {
    inner: Arc<Mutex<HeadlessState>>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place `group` on screen, or take it off screen with `None`.
    pub fn set_projection(&self, group: GroupId, rect: Option<NdcRect>) {
        let mut s = self.lock();
        s.projections.retain(|(g, _)| *g != group);
        if let Some(r) = rect {
            s.projections.push((group, r));
        }
    }

    pub fn node_count(&self, group: GroupId) -> usize {
        self.lock().nodes.iter().filter(|n| n.group == group).count()
    }

    /// Materials of every mesh attached under `group`, in attach order.
    pub fn materials(&self, group: GroupId) -> Vec<Material> {
        self.lock()
            .nodes
            .iter()
            .filter(|n| n.group == group)
            .flat_map(|n| n.node.meshes().into_iter().map(|m| m.material.clone()).collect::<Vec<_>>())
            .collect()
    }

    pub fn renders(&self) -> u64 {
        self.lock().renders
    }

    /// Video texture uploads performed by `render`.
    pub fn uploads(&self) -> u64 {
        self.lock().uploads
    }
}

impl SceneHost for HeadlessScene {
    fn attach(&mut self, group: GroupId, node: SceneNode) -> NodeId {
        let mut s = self.lock();
        s.nodes.push(AttachedNode { group, node, visible: true });
        NodeId(s.nodes.len() - 1)
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.lock().nodes.get_mut(node.0) {
            n.visible = visible;
        }
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.lock().nodes.get(node.0).map(|n| n.visible).unwrap_or(false)
    }

    fn raycast(&self, ndc: Ndc, node: NodeId) -> bool {
        let s = self.lock();
        let Some(n) = s.nodes.get(node.0) else {
            return false;
        };
        if !n.visible || n.node.meshes().is_empty() {
            return false;
        }
        s.projections
            .iter()
            .any(|(g, rect)| *g == n.group && rect.contains(ndc))
    }

    fn render(&mut self) {
        let mut s = self.lock();
        let uploads = s
            .nodes
            .iter()
            .flat_map(|n| n.node.meshes())
            .filter(|m| matches!(&m.material, Material::Video(t) if t.take_update()))
            .count() as u64;
        s.uploads += uploads;
        s.renders += 1;
    }
}
