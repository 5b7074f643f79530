//! Gesture policy classification.
//!
//! Some platforms refuse unmuted autoplay until the user has interacted with
//! the page. Detection is heuristic, so it sits behind [`PolicyClassifier`]
//! and tests inject a [`FixedPolicy`] instead of faking user agents.

use super::device::EnvironmentSignature;

/// Whether audible playback needs a user gesture first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePolicy {
    RequiresGesture,
    AutoplayAllowed,
}

impl GesturePolicy {
    pub fn requires_gesture(self) -> bool {
        self == GesturePolicy::RequiresGesture
    }
}

pub trait PolicyClassifier: Send + Sync {
    fn classify(&self, env: &EnvironmentSignature) -> GesturePolicy;
}

/// Classifies iOS-family user agents as gesture-gated.
#[derive(Debug, Clone, Default)]
pub struct UserAgentClassifier;

const IOS_DEVICES: &[&str] = &["iPhone", "iPad", "iPod"];

impl PolicyClassifier for UserAgentClassifier {
    fn classify(&self, env: &EnvironmentSignature) -> GesturePolicy {
        if env.user_agent_contains_any(IOS_DEVICES) {
            return GesturePolicy::RequiresGesture;
        }
        // iPadOS reports a desktop Safari user agent but keeps touch support
        if env.user_agent_contains_any(&["Macintosh"]) && env.touch_points > 1 {
            return GesturePolicy::RequiresGesture;
        }
        GesturePolicy::AutoplayAllowed
    }
}

/// Always answers with the wrapped policy.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub GesturePolicy);

impl PolicyClassifier for FixedPolicy {
    fn classify(&self, _env: &EnvironmentSignature) -> GesturePolicy {
        self.0
    }
}
