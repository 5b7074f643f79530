/// Environment signature used to classify the host platform

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSignature {
    pub user_agent: String,
    /// Maximum simultaneous touch points reported by the host (0 on desktop)
    pub touch_points: u8,
}

impl EnvironmentSignature {
    pub fn new(user_agent: impl Into<String>, touch_points: u8) -> Self {
        EnvironmentSignature {
            user_agent: user_agent.into(),
            touch_points,
        }
    }

    /// Case-insensitive search for any of `needles` in the user agent.
    pub fn user_agent_contains_any(&self, needles: &[&str]) -> bool {
        let ua = self.user_agent.to_ascii_lowercase();
        needles
            .iter()
            .any(|n| ua.contains(&n.to_ascii_lowercase()))
    }

    pub fn is_touch(&self) -> bool {
        self.touch_points > 0
    }
}

impl From<&crate::SessionConfig> for EnvironmentSignature {
    fn from(cfg: &crate::SessionConfig) -> Self {
        EnvironmentSignature::new(cfg.user_agent.clone(), cfg.touch_points)
    }
}
