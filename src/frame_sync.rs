//! Per-tick video texture synchronization.

use crate::platform::VideoElement;
use crate::scene::{SceneHost, VideoTexture};
use std::sync::Arc;

/// Marks the video texture dirty when a frame is available, then renders.
#[derive(Debug, Clone)]
pub struct FrameSync {
    texture: Arc<VideoTexture>,
}

impl FrameSync {
    pub fn new(texture: Arc<VideoTexture>) -> Self {
        Self { texture }
    }

    pub fn texture(&self) -> &Arc<VideoTexture> {
        &self.texture
    }

    /// Run one render tick. Returns whether the texture was marked for upload.
    pub fn tick(&self, video: &dyn VideoElement, scene: &mut dyn SceneHost) -> bool {
        let fresh = video.ready_state().has_current_frame();
        if fresh {
            self.texture.mark_needs_update();
        }
        scene.render();
        fresh
    }
}
