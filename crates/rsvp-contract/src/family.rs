//! Family composition and partner linking types.

use crate::profile::RsvpStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const URL_PREFIXES: [&str; 5] = ["https://", "http://", "www.", "t.me/", "telegram.me/"];

/// Progress of the partner link. Only ever moves forward, except for an
/// explicit reset.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    #[default]
    None,
    Sent,
    Confirmed,
}

impl LinkStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sent" | "pending" => Self::Sent,
            "confirmed" | "accepted" => Self::Confirmed,
            _ => Self::None,
        }
    }

    /// Monotonic merge: the further-along status wins.
    pub fn advance(self, other: Self) -> Self {
        self.max(other)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    pub age: String,
    pub note: String,
}

/// Who the guest comes with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct FamilyState {
    pub with_partner: bool,
    pub partner_username: Option<String>,
    pub partner_status: LinkStatus,
    pub children: Vec<Child>,
}

impl FamilyState {
    /// Fold a remotely reported link status into this state.
    ///
    /// An explicit remote `None` means the link was withdrawn. A payload that
    /// reported no status leaves the local one alone; anything else can only
    /// advance it.
    pub fn merge_remote_status(&mut self, remote: Option<LinkStatus>) {
        match remote {
            None => {}
            Some(LinkStatus::None) => self.reset_link(),
            Some(other) => self.partner_status = self.partner_status.advance(other),
        }
    }

    pub fn reset_link(&mut self) {
        self.partner_status = LinkStatus::None;
    }
}

/// A family payload as the server sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFamily {
    /// Form data; `partner_status` holds `link` or `None` when unreported.
    pub family: FamilyState,
    /// Link status, only when the payload actually carried one.
    pub link: Option<LinkStatus>,
}

impl RemoteFamily {
    /// A payload that reports its link status.
    pub fn reported(family: FamilyState) -> Self {
        Self {
            link: Some(family.partner_status),
            family,
        }
    }
}

/// A linked family member as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub name: String,
    pub rsvp: RsvpStatus,
}

/// Result of looking up a partner username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsernameMatch {
    Found { name: Option<String> },
    NotFound,
    MultipleMatches,
}

/// Result of sending a partner invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteReply {
    Sent { name: Option<String> },
    NotFound,
    MultipleMatches,
}

/// Cached record of the last invitation sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteRecord {
    pub username: String,
    pub status: LinkStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("username is empty")]
    Empty,
}

/// A normalized, non-empty platform username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> Result<Self, UsernameError> {
        let normalized = normalize_username(raw);
        if normalized.is_empty() {
            return Err(UsernameError::Empty);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Reduce whatever the guest typed (a handle, `@handle`, a profile link) to
/// the bare lowercase username.
///
/// Idempotent: normalizing an already normalized value returns it unchanged.
pub fn normalize_username(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            return current.to_lowercase();
        }
        current = next;
    }
}

fn strip_once(value: &str) -> String {
    let mut rest = value.trim();
    for prefix in URL_PREFIXES {
        if rest.len() >= prefix.len()
            && rest.is_char_boundary(prefix.len())
            && rest[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            rest = &rest[prefix.len()..];
        }
    }
    rest.trim_start_matches('@')
        .trim_end_matches('/')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_username_shapes() {
        assert_eq!(normalize_username("@Anna_K"), "anna_k");
        assert_eq!(normalize_username("  https://t.me/Anna_K/ "), "anna_k");
        assert_eq!(normalize_username("www.telegram.me/@anna"), "anna");
        assert_eq!(normalize_username("T.ME/anna"), "anna");
        assert_eq!(normalize_username("   "), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["@@anna", "https://https://t.me/anna", "t.me/@t.me/anna", "Anna"] {
            let once = normalize_username(raw);
            assert_eq!(normalize_username(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn empty_username_rejected() {
        assert_eq!(Username::parse(" @ "), Err(UsernameError::Empty));
        assert_eq!(Username::parse("@anna").unwrap().as_str(), "anna");
    }

    #[test]
    fn link_status_only_advances_except_remote_reset() {
        let mut family = FamilyState {
            partner_status: LinkStatus::Confirmed,
            ..Default::default()
        };
        family.merge_remote_status(Some(LinkStatus::Sent));
        assert_eq!(family.partner_status, LinkStatus::Confirmed);

        family.merge_remote_status(None);
        assert_eq!(family.partner_status, LinkStatus::Confirmed);

        family.merge_remote_status(Some(LinkStatus::None));
        assert_eq!(family.partner_status, LinkStatus::None);

        family.merge_remote_status(Some(LinkStatus::Sent));
        assert_eq!(family.partner_status, LinkStatus::Sent);
    }

    #[test]
    fn link_status_parse() {
        assert_eq!(LinkStatus::parse("SENT"), LinkStatus::Sent);
        assert_eq!(LinkStatus::parse("confirmed"), LinkStatus::Confirmed);
        assert_eq!(LinkStatus::parse("whatever"), LinkStatus::None);
    }
}
