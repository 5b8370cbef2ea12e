use rsvp_contract::notice::{ENTER_PARTNER_USERNAME, OPEN_IN_PLATFORM};
use rsvp_contract::{GatewayError, Notice, ProfileViolation, UsernameError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Neither platform init data nor an invite token is available.
    #[error("no credential available")]
    MissingCredential,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Invalid(#[from] ProfileViolation),

    #[error(transparent)]
    Username(#[from] UsernameError),

    #[error("no RSVP change is pending")]
    NothingPending,
}

impl SyncError {
    /// Convert into the notice shown to the guest; `fallback` is used when
    /// the error carries nothing more specific.
    pub fn notice(&self, fallback: &str) -> Notice {
        match self {
            Self::MissingCredential => Notice::error(OPEN_IN_PLATFORM),
            Self::Gateway(e) => Notice::error(e.user_message().unwrap_or(fallback)),
            Self::Invalid(violation) => Notice::error(capitalize(&violation.to_string())),
            Self::Username(_) => Notice::error(ENTER_PARTNER_USERNAME),
            Self::NothingPending => Notice::error(fallback),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
