//! Gesture policy classification for representative user agents.

use framerz::platform::{EnvironmentSignature, GesturePolicy, PolicyClassifier, UserAgentClassifier};
use framerz::SessionConfig;

const IPHONE: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
const IPAD_LEGACY: &str =
    "Mozilla/5.0 (iPad; CPU OS 12_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";
const IPADOS_DESKTOP: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
const ANDROID: &str =
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36";

fn classify(ua: &str, touch_points: u8) -> GesturePolicy {
    UserAgentClassifier.classify(&EnvironmentSignature::new(ua, touch_points))
}

#[test]
fn ios_devices_require_gesture() {
    assert_eq!(classify(IPHONE, 5), GesturePolicy::RequiresGesture);
    assert_eq!(classify(IPAD_LEGACY, 5), GesturePolicy::RequiresGesture);
}

#[test]
fn ipados_desktop_agent_is_detected_by_touch() {
    assert_eq!(classify(IPADOS_DESKTOP, 5), GesturePolicy::RequiresGesture);
    // a real Mac reports no touch points
    assert_eq!(classify(IPADOS_DESKTOP, 0), GesturePolicy::AutoplayAllowed);
}

#[test]
fn other_platforms_allow_autoplay() {
    assert_eq!(classify(ANDROID, 5), GesturePolicy::AutoplayAllowed);
    assert_eq!(classify(&SessionConfig::default().user_agent, 0), GesturePolicy::AutoplayAllowed);
}

#[test]
fn signature_is_derived_from_config() {
    let cfg = SessionConfig { user_agent: IPHONE.into(), touch_points: 5, ..Default::default() };
    let sig = EnvironmentSignature::from(&cfg);
    assert!(sig.is_touch());
    assert!(UserAgentClassifier.classify(&sig).requires_gesture());
}
