/// Video element surface driven by the playback controller

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Buffered-data readiness, ordered like the HTML media `readyState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl ReadyState {
    /// Enough data to supply the frame at the current playback position.
    pub fn has_current_frame(self) -> bool {
        self >= ReadyState::HaveCurrentData
    }
}

/// Attributes applied to the video element before it starts loading.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSource {
    pub src: String,
    pub loop_playback: bool,
    pub plays_inline: bool,
    pub cross_origin: String,
    pub muted: bool,
    pub preload: String,
}

impl VideoSource {
    pub fn new(src: impl Into<String>) -> Self {
        VideoSource {
            src: src.into(),
            loop_playback: true,
            plays_inline: true,
            cross_origin: "anonymous".to_string(),
            // unmuted autoplay is never attempted before the state machine asks for it
            muted: true,
            preload: "auto".to_string(),
        }
    }
}

/// Why the host refused a play request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRejection(pub String);

pub trait VideoElement: Send + Sync {
    fn configure(&self, source: &VideoSource);
    /// Request playback; the host resolves or rejects per its autoplay rules.
    fn play(&self) -> Result<(), PlayRejection>;
    fn pause(&self);
    fn set_muted(&self, muted: bool);
    fn muted(&self) -> bool;
    fn paused(&self) -> bool;
    fn ready_state(&self) -> ReadyState;
    /// Natural `(width, height)` once metadata has loaded.
    fn natural_size(&self) -> Option<(u32, u32)>;
}

#[derive(Debug, Clone)]
struct VideoState {
    source: Option<VideoSource>,
    muted: bool,
    paused: bool,
    ready: ReadyState,
    size: Option<(u32, u32)>,
    block_unmuted_play: bool,
    play_requests: usize,
}

/// In-memory video element for headless runs and tests.
///
/// `block_unmuted_play` mimics platforms that reject audible autoplay; the
/// play request counter lets callers assert on side effects.
pub struct MemoryVideo {
    state: Mutex<VideoState>,
}

impl MemoryVideo {
    pub fn new() -> Self {
        MemoryVideo {
            state: Mutex::new(VideoState {
                source: None,
                muted: false,
                paused: true,
                ready: ReadyState::HaveNothing,
                size: None,
                block_unmuted_play: false,
                play_requests: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VideoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate `loadedmetadata`.
    pub fn load_metadata(&self, width: u32, height: u32) {
        let mut s = self.lock();
        s.size = Some((width, height));
        if s.ready < ReadyState::HaveMetadata {
            s.ready = ReadyState::HaveMetadata;
        }
    }

    pub fn set_ready_state(&self, ready: ReadyState) {
        self.lock().ready = ready;
    }

    pub fn set_block_unmuted_play(&self, block: bool) {
        self.lock().block_unmuted_play = block;
    }

    pub fn source(&self) -> Option<VideoSource> {
        self.lock().source.clone()
    }

    pub fn play_requests(&self) -> usize {
        self.lock().play_requests
    }
}

impl Default for MemoryVideo {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoElement for MemoryVideo {
    fn configure(&self, source: &VideoSource) {
        let mut s = self.lock();
        s.muted = source.muted;
        s.source = Some(source.clone());
    }

    fn play(&self) -> Result<(), PlayRejection> {
        let mut s = self.lock();
        s.play_requests += 1;
        if s.block_unmuted_play && !s.muted {
            return Err(PlayRejection("NotAllowedError: play() requires a user gesture".into()));
        }
        s.paused = false;
        Ok(())
    }

    fn pause(&self) {
        self.lock().paused = true;
    }

    fn set_muted(&self, muted: bool) {
        self.lock().muted = muted;
    }

    fn muted(&self) -> bool {
        self.lock().muted
    }

    fn paused(&self) -> bool {
        self.lock().paused
    }

    fn ready_state(&self) -> ReadyState {
        self.lock().ready
    }

    fn natural_size(&self) -> Option<(u32, u32)> {
        self.lock().size
    }
}
