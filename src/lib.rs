//! Framerz AR playback runtime
//!
//! Presents a video registered to a recognized image target in a live camera
//! feed, and keeps playback in step with recognition while respecting
//! platform autoplay restrictions.
//!
//! # Features
//!
//! - **Playback state machine**: tracking found/lost and a one-time gesture
//!   unlock drive play, pause and mute on the video element
//! - **Gesture policy**: platforms that forbid unmuted autoplay get a
//!   tap-to-play overlay anchored to the target
//! - **Host boundaries**: tracker, renderer, video element, loader UI and asset
//!   service are traits with in-memory implementations for headless runs
//! - **HTTP asset retrieval** (default `http` feature)
//!
//! # Example
//!
//! ```no_run
//! use framerz::{ArSession, SessionConfig, SessionDeps};
//! use framerz::assets::{HttpAssetSource, MemoryThumbnails};
//! use framerz::platform::{MemoryVideo, UserAgentClassifier};
//! use framerz::scene::HeadlessScene;
//! use framerz::session::RecordingSurface;
//! use framerz::tracker::ScriptedTracker;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::default();
//! let deps = SessionDeps {
//!     assets: Arc::new(HttpAssetSource::from_config(&config)?),
//!     tracker: Box::new(ScriptedTracker::new()),
//!     scene: Box::new(HeadlessScene::new()),
//!     video: Arc::new(MemoryVideo::new()),
//!     thumbnails: Arc::new(MemoryThumbnails::new()),
//!     surface: Arc::new(RecordingSurface::new()),
//!     classifier: Arc::new(UserAgentClassifier),
//! };
//! let session = ArSession::launch("?f=ABCDEF", config, deps)?;
//! println!("policy: {:?}", session.policy());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod assets;
pub mod frame_sync;
pub mod overlay;
pub mod platform;
pub mod playback;
pub mod rendering;
pub mod scene;
pub mod session;
pub mod tracker;

// Async facade owning a session on a worker thread
pub mod async_api;

pub use assets::{MediaAsset, Slug};
pub use async_api::SessionWorker;
pub use overlay::PointerEvent;
pub use platform::GesturePolicy;
pub use playback::{MediaController, OverlayVisibility, PlaybackState};
pub use session::{ArSession, SessionDeps};

/// Default asset service endpoint.
pub const DEFAULT_API_BASE: &str = "https://framerz-dashboard.vercel.app/api";

/// Configuration for an AR session
///
/// Mirrors what the hosting page would supply: where to fetch assets, how to
/// identify the platform, and the viewport used to normalize pointer events.
///
/// # Examples
///
/// ```
/// let cfg = framerz::SessionConfig::default();
/// assert_eq!(cfg.slug_param, "f");
/// assert_eq!(cfg.default_title, "AR Experience");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Asset service endpoint; the slug is appended as `?slug=`
    pub api_base: String,
    /// Query parameter carrying the page slug
    pub slug_param: String,
    /// Timeout for asset and thumbnail requests in milliseconds
    pub timeout_ms: u64,
    /// User agent used for requests and gesture policy classification
    pub user_agent: String,
    /// Maximum touch points reported by the host
    pub touch_points: u8,
    /// Window dimensions used to normalize pointer coordinates
    pub viewport: Viewport,
    /// Page title when the payload carries no customer name
    pub default_title: String,
    /// Image target index inside the tracking descriptor
    pub anchor_index: usize,
    /// Edge length of the square overlay texture
    pub overlay_size: u32,
    /// Text painted under the play glyph
    pub overlay_label: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            slug_param: "f".to_string(),
            timeout_ms: 30000,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/115.0".to_string(),
            touch_points: 0,
            viewport: Viewport::default(),
            default_title: "AR Experience".to_string(),
            anchor_index: 0,
            overlay_size: 512,
            overlay_label: "TAP TO PLAY".to_string(),
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
