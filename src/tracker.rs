//! Tracking engine boundary.
//!
//! The image-recognition engine is external. It hands out one
//! [`AnchorHandle`] per image target; the core fills the handle's
//! found/lost slots and attaches content to its group.

use crate::scene::GroupId;
use crate::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type TargetHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct AnchorSlots {
    on_target_found: Option<TargetHandler>,
    on_target_lost: Option<TargetHandler>,
}

/// Attachment point whose transform follows a recognized image target.
///
/// Clones share callback slots, so the tracker can keep one clone to fire
/// events while the core populates another.
#[derive(Clone)]
pub struct AnchorHandle {
    index: usize,
    group: GroupId,
    slots: Arc<Mutex<AnchorSlots>>,
}

impl AnchorHandle {
    pub fn new(index: usize, group: GroupId) -> Self {
        Self {
            index,
            group,
            slots: Arc::new(Mutex::new(AnchorSlots::default())),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    fn lock(&self) -> MutexGuard<'_, AnchorSlots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn on_target_found<F>(&self, cb: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.lock().on_target_found = Some(Arc::new(cb));
    }

    pub fn on_target_lost<F>(&self, cb: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.lock().on_target_lost = Some(Arc::new(cb));
    }

    pub fn clear_handlers(&self) {
        let mut s = self.lock();
        s.on_target_found = None;
        s.on_target_lost = None;
    }

    pub fn has_handlers(&self) -> bool {
        let s = self.lock();
        s.on_target_found.is_some() && s.on_target_lost.is_some()
    }

    /// Deliver a found event. Returns false if no handler is installed.
    pub fn fire_found(&self) -> bool {
        // release the slot lock before dispatch so handlers may touch the anchor
        let handler = self.lock().on_target_found.clone();
        match handler {
            Some(h) => {
                h();
                true
            }
            None => false,
        }
    }

    /// Deliver a lost event. Returns false if no handler is installed.
    pub fn fire_lost(&self) -> bool {
        let handler = self.lock().on_target_lost.clone();
        match handler {
            Some(h) => {
                h();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for AnchorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorHandle")
            .field("index", &self.index)
            .field("group", &self.group)
            .field("handlers", &self.has_handlers())
            .finish()
    }
}

/// Image-target tracking engine.
pub trait TrackerAdapter: Send {
    /// Start the camera and tracking loop against the compiled image-target
    /// descriptor at `target_src`.
    fn start(&mut self, target_src: &str) -> Result<()>;

    /// Register image target `index` and return its anchor.
    fn add_anchor(&mut self, index: usize) -> AnchorHandle;
}

#[derive(Default)]
struct ScriptedState {
    anchors: Vec<AnchorHandle>,
    started: bool,
    target_src: Option<String>,
    deny_start: Option<String>,
}

/// Tracker driven by explicit `found`/`lost` calls; clones share state.
#[derive(Clone, Default)]
pub struct ScriptedTracker {
    inner: Arc<Mutex<ScriptedState>>,
}

impl ScriptedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker whose `start` fails as if camera permission was refused.
    pub fn denying(reason: impl Into<String>) -> Self {
        let t = Self::default();
        t.lock().deny_start = Some(reason.into());
        t
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn anchor(&self, index: usize) -> Option<AnchorHandle> {
        self.lock().anchors.iter().find(|a| a.index() == index).cloned()
    }

    pub fn is_started(&self) -> bool {
        self.lock().started
    }

    /// Descriptor URL the tracker was started with.
    pub fn target_src(&self) -> Option<String> {
        self.lock().target_src.clone()
    }

    /// Report target `index` as recognized. False if nothing handled it.
    pub fn found(&self, index: usize) -> bool {
        self.anchor(index).map(|a| a.fire_found()).unwrap_or(false)
    }

    /// Report target `index` as lost. False if nothing handled it.
    pub fn lost(&self, index: usize) -> bool {
        self.anchor(index).map(|a| a.fire_lost()).unwrap_or(false)
    }
}

impl TrackerAdapter for ScriptedTracker {
    fn start(&mut self, target_src: &str) -> Result<()> {
        let mut s = self.lock();
        if let Some(reason) = &s.deny_start {
            return Err(Error::PermissionError(reason.clone()));
        }
        s.started = true;
        s.target_src = Some(target_src.to_string());
        Ok(())
    }

    fn add_anchor(&mut self, index: usize) -> AnchorHandle {
        if let Some(existing) = self.anchor(index) {
            return existing;
        }
        let mut s = self.lock();
        let anchor = AnchorHandle::new(index, GroupId(index));
        s.anchors.push(anchor.clone());
        anchor
    }
}
