//! Session bring-up and event routing.
//!
//! [`ArSession::launch`] validates the page slug, fetches the media asset,
//! prepares the video element, registers the anchor and starts the tracker.
//! Once the video reports its dimensions, [`ArSession::on_video_metadata`]
//! creates the playback controller, attaches the video plane (and the
//! tap-to-play overlay on gesture-gated platforms) and wires the anchor's
//! found/lost slots. Pointer events and render ticks are forwarded by the
//! host through [`ArSession::pointer_down`] and [`ArSession::tick`].

use crate::assets::{AssetSource, MediaAsset, Slug, ThumbnailLoader, RETRIEVAL_ALERT, SLUG_ALERT};
use crate::frame_sync::FrameSync;
use crate::overlay::{Backing, OverlayController, PointerEvent};
use crate::platform::{EnvironmentSignature, GesturePolicy, PolicyClassifier, VideoElement, VideoSource};
use crate::playback::{MediaController, OverlayVisibility, PlaybackState};
use crate::rendering::OverlayLayout;
use crate::scene::{GroupId, Material, Mesh, PlaneGeometry, SceneHost, SceneNode, VideoTexture};
use crate::tracker::{AnchorHandle, TrackerAdapter};
use crate::{Error, Result, SessionConfig};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const LOADING_TEXT: &str = "Loading...";
pub const CAMERA_DENIED_TEXT: &str = "Camera access denied";
pub const INIT_FAILED_TEXT: &str = "Initialization failed";

/// Page chrome around the AR view: loader, title, alerts.
pub trait LoaderSurface: Send + Sync {
    fn hide_loader(&self);
    fn set_loader_text(&self, text: &str);
    fn set_title(&self, title: &str);
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnapshot {
    pub loader_visible: bool,
    pub loader_text: String,
    pub title: Option<String>,
    pub alerts: Vec<String>,
}

/// Surface that records every update for later inspection.
pub struct RecordingSurface {
    state: Mutex<SurfaceSnapshot>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SurfaceSnapshot {
                loader_visible: true,
                loader_text: LOADING_TEXT.to_string(),
                title: None,
                alerts: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.lock().clone()
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderSurface for RecordingSurface {
    fn hide_loader(&self) {
        self.lock().loader_visible = false;
    }

    fn set_loader_text(&self, text: &str) {
        self.lock().loader_text = text.to_string();
    }

    fn set_title(&self, title: &str) {
        self.lock().title = Some(title.to_string());
    }

    fn alert(&self, message: &str) {
        self.lock().alerts.push(message.to_string());
    }
}

/// Host collaborators handed to a session.
pub struct SessionDeps {
    pub assets: Arc<dyn AssetSource>,
    pub tracker: Box<dyn TrackerAdapter>,
    pub scene: Box<dyn SceneHost>,
    pub video: Arc<dyn VideoElement>,
    pub thumbnails: Arc<dyn ThumbnailLoader>,
    pub surface: Arc<dyn LoaderSurface>,
    pub classifier: Arc<dyn PolicyClassifier>,
}

// Everything the tracker callbacks, pointer events and ticks touch.
struct Stage {
    scene: Box<dyn SceneHost>,
    controller: Option<MediaController>,
    overlay: Option<OverlayController>,
}

impl Stage {
    fn sync_overlay(&mut self) {
        let Stage { scene, controller, overlay } = self;
        if let (Some(c), Some(o)) = (controller.as_ref(), overlay.as_ref()) {
            o.sync(c.overlay_visibility(), scene.as_mut());
        }
    }

    fn install_overlay(
        &mut self,
        group: GroupId,
        geometry: PlaneGeometry,
        layout: &OverlayLayout,
        backing: Backing,
    ) {
        if self.overlay.is_some() {
            return;
        }
        let overlay = OverlayController::build(self.scene.as_mut(), group, geometry, layout, backing);
        self.overlay = Some(overlay);
        self.sync_overlay();
    }
}

fn lock(stage: &Mutex<Stage>) -> MutexGuard<'_, Stage> {
    stage.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ArSession {
    config: SessionConfig,
    asset: MediaAsset,
    policy: GesturePolicy,
    anchor: AnchorHandle,
    video: Arc<dyn VideoElement>,
    frame_sync: FrameSync,
    thumbnails: Arc<dyn ThumbnailLoader>,
    surface: Arc<dyn LoaderSurface>,
    tracker: Box<dyn TrackerAdapter>,
    stage: Arc<Mutex<Stage>>,
}

impl ArSession {
    /// Bring up a session from the page query string.
    ///
    /// Fatal errors are reported on `deps.surface` before being returned:
    /// a bad slug raises an alert, a failed retrieval raises an alert and
    /// marks initialization as failed, and a refused tracker start sets the
    /// camera-denied loader text.
    pub fn launch(query: &str, config: SessionConfig, deps: SessionDeps) -> Result<Self> {
        let surface = deps.surface.clone();
        Self::initialize(query, config, deps).map_err(|e| {
            report_failure(surface.as_ref(), &e);
            e
        })
    }

    fn initialize(query: &str, config: SessionConfig, deps: SessionDeps) -> Result<Self> {
        let slug = Slug::from_query(query, &config.slug_param)?;
        info!("launching session for slug {}", slug);
        let asset = deps.assets.fetch(&slug).map_err(|e| match e {
            Error::RetrievalError(_) => e,
            other => Error::RetrievalError(other.to_string()),
        })?;

        let SessionDeps {
            mut tracker,
            scene,
            video,
            thumbnails,
            surface,
            classifier,
            ..
        } = deps;

        surface.set_title(asset.title(&config.default_title));
        let policy = classifier.classify(&EnvironmentSignature::from(&config));
        debug!("gesture policy {:?} for '{}'", policy, config.user_agent);

        let anchor = tracker.add_anchor(config.anchor_index);
        video.configure(&VideoSource::new(asset.video_url.clone()));
        let frame_sync = FrameSync::new(Arc::new(VideoTexture::new()));

        let mut session = Self {
            config,
            asset,
            policy,
            anchor,
            video,
            frame_sync,
            thumbnails,
            surface,
            tracker,
            stage: Arc::new(Mutex::new(Stage { scene, controller: None, overlay: None })),
        };
        session.start()?;
        Ok(session)
    }

    fn start(&mut self) -> Result<()> {
        self.tracker.start(&self.asset.mind_url).map_err(|e| match e {
            Error::PermissionError(_) => e,
            other => Error::PermissionError(other.to_string()),
        })?;
        self.surface.hide_loader();
        info!("tracking started (anchor {})", self.anchor.index());
        Ok(())
    }

    /// Handle the video's `loadedmetadata`: enter `Idle`, attach content and
    /// wire tracking callbacks. Repeated calls are ignored.
    pub fn on_video_metadata(&self) -> Result<()> {
        let (w, h) = self
            .video
            .natural_size()
            .ok_or_else(|| Error::Other("video metadata not loaded".into()))?;
        let geometry = PlaneGeometry::from_video_size(w, h)
            .ok_or_else(|| Error::Other(format!("video has no usable dimensions ({}x{})", w, h)))?;

        {
            let mut stage = lock(&self.stage);
            if stage.controller.is_some() {
                debug!("metadata already handled");
                return Ok(());
            }
            stage.scene.attach(
                self.anchor.group(),
                SceneNode::Mesh(Mesh {
                    geometry,
                    material: Material::Video(self.frame_sync.texture().clone()),
                    depth: 0.0,
                }),
            );
            stage.controller = Some(MediaController::new(self.policy, self.video.clone(), geometry));
        }

        // the loader may call back before returning, so the stage must be unlocked here
        if self.policy.requires_gesture() {
            self.build_overlay(geometry);
        }
        self.install_handlers();
        Ok(())
    }

    fn build_overlay(&self, geometry: PlaneGeometry) {
        let layout = OverlayLayout::new(self.config.overlay_size, self.config.overlay_label.clone());
        let group = self.anchor.group();
        match &self.asset.thumbnail_url {
            Some(url) => {
                let stage = self.stage.clone();
                let thumb_url = url.clone();
                self.thumbnails.load(
                    url,
                    Box::new(move |res| {
                        let backing = match res {
                            Ok(bytes) => Backing::Thumbnail { url: thumb_url, bytes },
                            Err(e) => {
                                warn!("{}; overlay uses fallback backing", e);
                                Backing::Fallback
                            }
                        };
                        lock(&stage).install_overlay(group, geometry, &layout, backing);
                    }),
                );
            }
            None => lock(&self.stage).install_overlay(group, geometry, &layout, Backing::Fallback),
        }
    }

    fn install_handlers(&self) {
        let stage = self.stage.clone();
        self.anchor.on_target_found(move || {
            let mut st = lock(&stage);
            if let Some(c) = st.controller.as_mut() {
                c.tracking_found();
            }
            st.sync_overlay();
        });

        let stage = self.stage.clone();
        self.anchor.on_target_lost(move || {
            let mut st = lock(&stage);
            if let Some(c) = st.controller.as_mut() {
                c.tracking_lost();
            }
            st.sync_overlay();
        });
    }

    /// Route a pointer press to the overlay. Returns true if it unlocked playback.
    pub fn pointer_down(&self, pointer: PointerEvent) -> bool {
        let mut guard = lock(&self.stage);
        let Stage { scene, controller, overlay } = &mut *guard;
        let (Some(c), Some(o)) = (controller.as_mut(), overlay.as_mut()) else {
            return false;
        };
        match o.handle_pointer(pointer, self.config.viewport, c.overlay_visibility(), scene.as_mut()) {
            Some(signal) => {
                c.gesture_unlock(signal);
                o.sync(c.overlay_visibility(), scene.as_mut());
                true
            }
            None => false,
        }
    }

    /// One render-loop tick. Returns whether the video texture was marked dirty.
    pub fn tick(&self) -> bool {
        let mut st = lock(&self.stage);
        self.frame_sync.tick(self.video.as_ref(), st.scene.as_mut())
    }

    pub fn playback_state(&self) -> Option<PlaybackState> {
        lock(&self.stage).controller.as_ref().map(|c| c.state())
    }

    pub fn overlay_visibility(&self) -> OverlayVisibility {
        lock(&self.stage)
            .controller
            .as_ref()
            .map(|c| c.overlay_visibility())
            .unwrap_or(OverlayVisibility::Hidden)
    }

    pub fn is_unlocked(&self) -> bool {
        lock(&self.stage).controller.as_ref().map(|c| c.is_unlocked()).unwrap_or(false)
    }

    /// Whether the overlay has been built (it may still be waiting on a thumbnail).
    pub fn has_overlay(&self) -> bool {
        lock(&self.stage).overlay.is_some()
    }

    /// Backing the overlay was built with, if it exists.
    pub fn overlay_backing(&self) -> Option<Backing> {
        lock(&self.stage).overlay.as_ref().map(|o| o.backing().clone())
    }

    pub fn policy(&self) -> GesturePolicy {
        self.policy
    }

    pub fn asset(&self) -> &MediaAsset {
        &self.asset
    }

    pub fn anchor(&self) -> &AnchorHandle {
        &self.anchor
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn video_texture(&self) -> &Arc<VideoTexture> {
        self.frame_sync.texture()
    }

    /// Detach tracking callbacks and stop playback.
    pub fn close(self) {
        self.anchor.clear_handlers();
        self.video.pause();
        self.video.set_muted(true);
        info!("session closed");
    }
}

fn report_failure(surface: &dyn LoaderSurface, err: &Error) {
    if !err.is_fatal() {
        warn!("non-fatal error at launch boundary: {}", err);
        return;
    }
    error!("initialization failed: {}", err);
    match err {
        Error::ConfigError(_) => surface.alert(SLUG_ALERT),
        Error::RetrievalError(_) => {
            surface.alert(RETRIEVAL_ALERT);
            surface.set_loader_text(INIT_FAILED_TEXT);
        }
        Error::PermissionError(_) => surface.set_loader_text(CAMERA_DENIED_TEXT),
        _ => surface.set_loader_text(INIT_FAILED_TEXT),
    }
}
