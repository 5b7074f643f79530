//! Playback lifecycle: binds tracking events and the gesture unlock to the
//! video element.
//!
//! The controller is created once the video's metadata is known and then only
//! reacts to four inputs: target found, target lost, gesture unlock, and the
//! outcome of its own play requests. Anything else is a no-op.

use crate::platform::{GesturePolicy, VideoElement};
use crate::scene::PlaneGeometry;
use crate::Error;
use log::{debug, info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    AwaitingGesture,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayVisibility {
    Hidden,
    Visible,
}

impl OverlayVisibility {
    pub fn is_visible(self) -> bool {
        self == OverlayVisibility::Visible
    }
}

/// Proof of a user gesture on the overlay; only the overlay can mint one.
#[derive(Debug)]
pub struct UnlockSignal {
    _private: (),
}

impl UnlockSignal {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

pub struct MediaController {
    policy: GesturePolicy,
    video: Arc<dyn VideoElement>,
    geometry: PlaneGeometry,
    state: PlaybackState,
    unlocked: bool,
}

impl MediaController {
    /// Enter `Idle` for a video whose metadata just became available.
    pub fn new(policy: GesturePolicy, video: Arc<dyn VideoElement>, geometry: PlaneGeometry) -> Self {
        video.set_muted(true);
        debug!(
            "playback idle (policy={:?}, aspect={:.4})",
            policy,
            geometry.aspect_ratio()
        );
        Self {
            policy,
            video,
            geometry,
            state: PlaybackState::Idle,
            unlocked: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn policy(&self) -> GesturePolicy {
        self.policy
    }

    pub fn geometry(&self) -> PlaneGeometry {
        self.geometry
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Visible only while a gesture is actually being awaited.
    pub fn overlay_visibility(&self) -> OverlayVisibility {
        if self.policy.requires_gesture()
            && self.state == PlaybackState::AwaitingGesture
            && !self.unlocked
        {
            OverlayVisibility::Visible
        } else {
            OverlayVisibility::Hidden
        }
    }

    fn may_autoplay(&self) -> bool {
        self.policy == GesturePolicy::AutoplayAllowed || self.unlocked
    }

    fn transition(&mut self, next: PlaybackState) {
        if self.state != next {
            debug!("playback {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Unmute and request playback. The video is re-muted if the host refuses.
    fn start_audible(&mut self) -> Result<(), Error> {
        self.video.set_muted(false);
        match self.video.play() {
            Ok(()) => {
                self.transition(PlaybackState::Playing);
                Ok(())
            }
            Err(rejection) => {
                self.video.set_muted(true);
                let err = Error::PlaybackBlocked(rejection.0);
                warn!("{} (state stays {:?})", err, self.state);
                Err(err)
            }
        }
    }

    pub fn tracking_found(&mut self) -> PlaybackState {
        if self.state == PlaybackState::Playing {
            return self.state;
        }
        if self.may_autoplay() {
            // PlaybackBlocked is absorbed; the gesture path can still recover
            let _ = self.start_audible();
        } else {
            self.transition(PlaybackState::AwaitingGesture);
        }
        self.state
    }

    pub fn tracking_lost(&mut self) -> PlaybackState {
        self.video.pause();
        self.video.set_muted(true);
        self.transition(PlaybackState::Paused);
        self.state
    }

    /// Consume a gesture. Only the first signal of a session has any effect.
    pub fn gesture_unlock(&mut self, _signal: UnlockSignal) -> PlaybackState {
        if self.unlocked {
            return self.state;
        }
        self.unlocked = true;
        info!("playback unlocked by user gesture");
        let _ = self.start_audible();
        self.state
    }
}

impl std::fmt::Debug for MediaController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaController")
            .field("policy", &self.policy)
            .field("state", &self.state)
            .field("unlocked", &self.unlocked)
            .finish()
    }
}
