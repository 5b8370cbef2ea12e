//! Transient user-facing messages.

use serde::Serialize;

pub const PROFILE_SAVED: &str = "Profile saved";
pub const STATUS_SAVED: &str = "Status saved";
pub const SAVE_FAILED: &str = "Couldn't save";
pub const FAMILY_SAVED: &str = "Saved";
pub const OPEN_IN_PLATFORM: &str = "Open the app through Telegram";
pub const ENTER_PARTNER_USERNAME: &str = "Enter your partner's Telegram username";
pub const USERNAME_NOT_FOUND: &str =
    "No guest with that username yet. Ask your partner to open the app first";
pub const USERNAME_MULTIPLE: &str = "Several guests match that username. Ask the organizers";
pub const USERNAME_LOOKUP_FAILED: &str = "Couldn't check the username. Try again later";
pub const INVITE_SENT: &str = "Invitation sent";
pub const INVITE_FAILED: &str = "Couldn't send the invitation";
pub const STATUS_REFRESH_FAILED: &str = "Couldn't refresh the family status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            variant: NoticeVariant::Ok,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            variant: NoticeVariant::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.variant == NoticeVariant::Error
    }

    /// Message shown when a username lookup succeeds.
    pub fn username_found(name: Option<&str>) -> Self {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Self::ok(format!("Found: {name}")),
            None => Self::ok("Guest found"),
        }
    }
}
