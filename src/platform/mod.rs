//! Platform surface: environment signature, gesture policy, video element
//!
//! These are the host-provided primitives the playback core reads. Each trait
//! ships with an in-memory implementation so sessions can run headless and
//! deterministically in tests.

pub mod device;
pub mod media;
pub mod policy;

pub use device::EnvironmentSignature;
pub use media::{MemoryVideo, PlayRejection, ReadyState, VideoElement, VideoSource};
pub use policy::{FixedPolicy, GesturePolicy, PolicyClassifier, UserAgentClassifier};
