use crate::identity::GuestId;
use thiserror::Error;

/// Key under which the resolved guest id is persisted.
pub const IDENTITY_KEY: &str = "wedding.guest_id";

/// Local key-value storage for per-guest snapshots.
///
/// Calls are synchronous: the store backs a single interactive session and
/// every read happens before the first frame of a screen.
pub trait CacheStore: Send + Sync {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// Kinds of per-guest entries kept in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Profile,
    Family,
    Invite,
    WelcomeSeen,
}

impl CacheKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Family => "family",
            Self::Invite => "invite",
            Self::WelcomeSeen => "welcome_seen",
        }
    }

    /// Storage key, namespaced by guest so different guests on one device
    /// never see each other's data.
    pub fn key(self, guest_id: GuestId) -> String {
        format!("wedding.{}.{}", self.as_str(), guest_id)
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Key unusable by the backing store (path traversal, control chars).
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
