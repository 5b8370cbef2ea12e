//! Guest identity and authentication credential types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of the current guest.
///
/// Either the platform-native numeric user id or a locally generated
/// pseudo-id when the client runs outside the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(i64);

impl GuestId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GuestId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

/// User record supplied by the host platform (unverified, display only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl PlatformUser {
    /// First and last name joined by a space, `None` when both are blank.
    pub fn display_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }
}

/// Authentication material attached to every gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Credential {
    /// Signed init payload handed over by the host platform.
    InitData(String),
    /// Personal invite token, used when the client runs outside the platform.
    InviteToken(String),
}

impl Credential {
    pub fn value(&self) -> &str {
        match self {
            Self::InitData(v) | Self::InviteToken(v) => v,
        }
    }

    /// HTTP header carrying this credential.
    pub fn header_name(&self) -> &'static str {
        match self {
            Self::InitData(_) => "x-tg-initdata",
            Self::InviteToken(_) => "x-invite-token",
        }
    }
}

/// What the host environment provides at startup.
#[derive(Debug, Clone, Default)]
pub struct HostContext {
    pub user: Option<PlatformUser>,
    pub init_data: Option<String>,
    pub invite_token: Option<String>,
}

impl HostContext {
    /// Select the credential for gateway calls: platform init data first,
    /// invite token second. Blank values count as absent.
    pub fn credential(&self) -> Option<Credential> {
        let present = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        present(&self.init_data)
            .map(Credential::InitData)
            .or_else(|| present(&self.invite_token).map(Credential::InviteToken))
    }

    /// Platform-native numeric id, if the platform supplied one.
    pub fn platform_id(&self) -> Option<GuestId> {
        self.user.as_ref().and_then(|u| u.id).map(GuestId::new)
    }
}
