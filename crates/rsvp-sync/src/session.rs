/// Guards that live for one app session and survive screen remounts.
#[derive(Debug, Default)]
pub struct SessionGuards {
    welcome_shown: bool,
}

impl SessionGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the welcome banner was already triggered this session.
    pub fn welcome_shown(&self) -> bool {
        self.welcome_shown
    }

    /// Record that the welcome banner is being shown. Returns `false` if it
    /// had already been shown this session.
    pub(crate) fn claim_welcome(&mut self) -> bool {
        !std::mem::replace(&mut self.welcome_shown, true)
    }
}
