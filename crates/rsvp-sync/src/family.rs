//! Family composition form and partner linking by username.

use crate::cache::LocalCache;
use crate::error::SyncError;
use rsvp_contract::notice::{
    FAMILY_SAVED, INVITE_FAILED, INVITE_SENT, SAVE_FAILED, USERNAME_LOOKUP_FAILED,
    USERNAME_MULTIPLE, USERNAME_NOT_FOUND,
};
use rsvp_contract::{
    CacheKind, Child, Credential, FamilyMember, FamilyState, GuestId, InviteRecord, InviteReply,
    LinkStatus, Notice, ProfileGateway, RemoteFamily, Username, UsernameMatch,
};
use tracing::{debug, warn};

/// Outcome of a username lookup, including transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsernameLookup {
    Found { name: Option<String> },
    NotFound,
    MultipleMatches,
    TransportError,
}

impl UsernameLookup {
    pub fn notice(&self) -> Notice {
        match self {
            Self::Found { name } => Notice::username_found(name.as_deref()),
            Self::NotFound => Notice::error(USERNAME_NOT_FOUND),
            Self::MultipleMatches => Notice::error(USERNAME_MULTIPLE),
            Self::TransportError => Notice::error(USERNAME_LOOKUP_FAILED),
        }
    }
}

/// Look a partner username up without changing any state.
///
/// An empty username is rejected before the credential check and before any
/// gateway call.
pub async fn lookup_username(
    gateway: &dyn ProfileGateway,
    credential: Option<&Credential>,
    raw: &str,
) -> Result<UsernameLookup, SyncError> {
    let username = Username::parse(raw)?;
    let credential = credential.ok_or(SyncError::MissingCredential)?;
    Ok(match gateway.check_username(credential, &username).await {
        Ok(UsernameMatch::Found { name }) => UsernameLookup::Found { name },
        Ok(UsernameMatch::NotFound) => UsernameLookup::NotFound,
        Ok(UsernameMatch::MultipleMatches) => UsernameLookup::MultipleMatches,
        Err(e) => {
            debug!(error = %e, username = %username, "username lookup failed");
            UsernameLookup::TransportError
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildField {
    Name,
    Age,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyEdit {
    TogglePartner,
    PartnerUsername(String),
    AddChild,
    RemoveChild(String),
    Child {
        id: String,
        field: ChildField,
        value: String,
    },
}

/// Family screen state for one mount.
pub struct FamilySync {
    guest_id: GuestId,
    cache: LocalCache,
    family: FamilyState,
    members: Vec<FamilyMember>,
    dirty: bool,
}

impl FamilySync {
    /// Hydrate from the cache, folding in the last invite sent from this
    /// device.
    pub fn mount(guest_id: GuestId, cache: LocalCache) -> Self {
        let mut family: FamilyState = cache
            .load(CacheKind::Family, guest_id)
            .unwrap_or_default();
        if let Some(invite) = cache.load::<InviteRecord>(CacheKind::Invite, guest_id) {
            family.partner_status = family.partner_status.advance(invite.status);
            if family.partner_status != LinkStatus::None {
                family.with_partner = true;
            }
            family.partner_username.get_or_insert(invite.username);
        }
        Self {
            guest_id,
            cache,
            family,
            members: Vec::new(),
            dirty: false,
        }
    }

    pub fn family(&self) -> &FamilyState {
        &self.family
    }

    pub fn members(&self) -> &[FamilyMember] {
        &self.members
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply a remote family payload. Returns whether form data was merged.
    ///
    /// The link status is never user-edited, so it is merged even while the
    /// form is dirty. A payload without a status keeps the known link.
    pub fn apply_remote(&mut self, remote: Option<RemoteFamily>) -> bool {
        let Some(RemoteFamily { family, link }) = remote else {
            return false;
        };
        self.family.merge_remote_status(link);
        let merged = if self.dirty {
            debug!(guest_id = %self.guest_id, "local edits pending, remote family ignored");
            false
        } else {
            self.family = FamilyState {
                partner_status: self.family.partner_status,
                ..family
            };
            true
        };
        self.cache
            .write_through(CacheKind::Family, self.guest_id, &self.family);
        merged
    }

    pub async fn hydrate(
        &mut self,
        gateway: &dyn ProfileGateway,
        credential: Option<&Credential>,
    ) -> bool {
        let Some(credential) = credential else {
            return false;
        };
        match gateway.load_family(credential).await {
            Ok(remote) => self.apply_remote(remote),
            Err(e) => {
                debug!(error = %e, "remote family fetch failed");
                false
            }
        }
    }

    /// Apply a form edit. Returns the id of a newly added child.
    pub fn edit(&mut self, edit: FamilyEdit) -> Option<String> {
        self.dirty = true;
        match edit {
            FamilyEdit::TogglePartner => self.family.with_partner = !self.family.with_partner,
            FamilyEdit::PartnerUsername(raw) => {
                self.family.partner_username = Some(raw).filter(|r| !r.trim().is_empty());
            }
            FamilyEdit::AddChild => {
                let id = uuid::Uuid::new_v4().to_string();
                self.family.children.push(Child {
                    id: id.clone(),
                    ..Default::default()
                });
                return Some(id);
            }
            FamilyEdit::RemoveChild(id) => self.family.children.retain(|c| c.id != id),
            FamilyEdit::Child { id, field, value } => {
                if let Some(child) = self.family.children.iter_mut().find(|c| c.id == id) {
                    match field {
                        ChildField::Name => child.name = value,
                        ChildField::Age => child.age = value,
                        ChildField::Note => child.note = value,
                    }
                }
            }
        }
        None
    }

    pub async fn save(
        &mut self,
        gateway: &dyn ProfileGateway,
        credential: Option<&Credential>,
    ) -> Notice {
        self.cache
            .write_through(CacheKind::Family, self.guest_id, &self.family);
        let result = match credential {
            Some(credential) => gateway
                .save_family(credential, &self.family)
                .await
                .map_err(SyncError::from),
            None => Err(SyncError::MissingCredential),
        };
        match result {
            Ok(()) => Notice::ok(FAMILY_SAVED),
            Err(e) => {
                warn!(error = %e, guest_id = %self.guest_id, "family save failed");
                e.notice(SAVE_FAILED)
            }
        }
    }

    /// Check whether `raw` names a known guest. Never mutates state.
    pub async fn check_username(
        &self,
        gateway: &dyn ProfileGateway,
        credential: Option<&Credential>,
        raw: &str,
    ) -> Notice {
        match lookup_username(gateway, credential, raw).await {
            Ok(lookup) => lookup.notice(),
            Err(e) => e.notice(USERNAME_LOOKUP_FAILED),
        }
    }

    /// Invite `raw` as partner. On success the link becomes `Sent` and the
    /// invite is cached.
    pub async fn send_invite(
        &mut self,
        gateway: &dyn ProfileGateway,
        credential: Option<&Credential>,
        raw: &str,
    ) -> Notice {
        let username = match Username::parse(raw) {
            Ok(username) => username,
            Err(e) => return SyncError::from(e).notice(INVITE_FAILED),
        };
        let Some(credential) = credential else {
            return SyncError::MissingCredential.notice(INVITE_FAILED);
        };

        match gateway.send_invite(credential, &username).await {
            Ok(InviteReply::Sent { name }) => {
                self.family.with_partner = true;
                self.family.partner_username = Some(username.as_str().to_string());
                self.family.partner_status = self.family.partner_status.advance(LinkStatus::Sent);
                let record = InviteRecord {
                    username: username.as_str().to_string(),
                    status: self.family.partner_status,
                };
                self.cache
                    .write_through(CacheKind::Invite, self.guest_id, &record);
                self.cache
                    .write_through(CacheKind::Family, self.guest_id, &self.family);
                match name.filter(|n| !n.trim().is_empty()) {
                    Some(name) => Notice::ok(format!("{INVITE_SENT}: {name}")),
                    None => Notice::ok(INVITE_SENT),
                }
            }
            Ok(InviteReply::NotFound) => Notice::error(USERNAME_NOT_FOUND),
            Ok(InviteReply::MultipleMatches) => Notice::error(USERNAME_MULTIPLE),
            Err(e) => {
                warn!(error = %e, username = %username, "invite failed");
                SyncError::from(e).notice(INVITE_FAILED)
            }
        }
    }

    /// Reload linked members. On failure the previous list is kept.
    ///
    /// The status endpoint can only advance the link; withdrawals are picked
    /// up by [`Self::hydrate`].
    pub async fn refresh_status(
        &mut self,
        gateway: &dyn ProfileGateway,
        credential: Option<&Credential>,
    ) -> Result<&[FamilyMember], SyncError> {
        let credential = credential.ok_or(SyncError::MissingCredential)?;
        let (status, members) = gateway.family_status(credential).await.map_err(|e| {
            debug!(error = %e, "family status refresh failed");
            SyncError::from(e)
        })?;
        let before = self.family.partner_status;
        self.family.partner_status = before.advance(status);
        if self.family.partner_status != before {
            self.cache
                .write_through(CacheKind::Family, self.guest_id, &self.family);
        }
        self.members = members;
        Ok(&self.members)
    }
}
