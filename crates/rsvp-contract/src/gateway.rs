use crate::family::{
    FamilyMember, FamilyState, InviteReply, LinkStatus, RemoteFamily, Username, UsernameMatch,
};
use crate::identity::Credential;
use crate::profile::GuestProfile;
use async_trait::async_trait;
use thiserror::Error;

/// Remote profile service.
///
/// Every call carries the caller's credential; absent data is `Ok(None)`,
/// never an error.
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    async fn get_profile(&self, credential: &Credential)
        -> Result<Option<GuestProfile>, GatewayError>;

    async fn save_profile(
        &self,
        credential: &Credential,
        profile: &GuestProfile,
    ) -> Result<(), GatewayError>;

    /// Cheap existence probe used before fetching the full profile.
    async fn profile_exists(&self, credential: &Credential) -> Result<bool, GatewayError>;

    async fn mark_welcome_seen(&self, credential: &Credential) -> Result<(), GatewayError>;

    /// Stored family form. The link status is only reported when the
    /// payload carries one.
    async fn load_family(&self, credential: &Credential)
        -> Result<Option<RemoteFamily>, GatewayError>;

    async fn save_family(
        &self,
        credential: &Credential,
        family: &FamilyState,
    ) -> Result<(), GatewayError>;

    async fn check_username(
        &self,
        credential: &Credential,
        username: &Username,
    ) -> Result<UsernameMatch, GatewayError>;

    async fn send_invite(
        &self,
        credential: &Credential,
        username: &Username,
    ) -> Result<InviteReply, GatewayError>;

    /// Current link status plus the members already linked to this guest.
    async fn family_status(
        &self,
        credential: &Credential,
    ) -> Result<(LinkStatus, Vec<FamilyMember>), GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The server answered with a non-success status.
    #[error("request rejected with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Server-provided explanation, when there is one worth showing.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } => Some(message.as_str()).filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }
}
