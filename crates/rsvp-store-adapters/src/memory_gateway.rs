use async_trait::async_trait;
use rsvp_contract::wire::{family_from_value, profile_from_value};
use rsvp_contract::{
    normalize_username, Credential, FamilyMember, FamilyState, GatewayError, GuestProfile,
    InviteReply, LinkStatus, ProfileGateway, RemoteFamily, Username, UsernameMatch,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{RwLock, RwLockWriteGuard};

#[derive(Default)]
struct GuestRecord {
    username: Option<String>,
    display_name: Option<String>,
    profile: Option<Value>,
    family: Option<Value>,
    welcome_seen_at: Option<String>,
}

struct Link {
    inviter: String,
    invitee: String,
    status: LinkStatus,
}

#[derive(Default)]
struct State {
    guests: HashMap<String, GuestRecord>,
    links: Vec<Link>,
    failure: Option<GatewayError>,
}

/// In-memory profile service for tests and local development.
///
/// Guests are keyed by credential value. Payloads are stored as JSON and
/// read back through the same normalizer as the HTTP adapter.
#[derive(Default)]
pub struct MemoryGateway {
    state: RwLock<State>,
    calls: AtomicUsize,
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
}

fn decode_err(e: rsvp_contract::WireError) -> GatewayError {
    GatewayError::Decode(e.to_string())
}

fn now_marker() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string()
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total gateway calls made so far, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make a guest discoverable by username.
    pub async fn register_guest(&self, credential: &Credential, username: &str, name: &str) {
        let mut state = self.state.write().await;
        let record = state
            .guests
            .entry(credential.value().to_string())
            .or_default();
        record.username = Some(normalize_username(username));
        record.display_name = Some(name.to_string());
    }

    /// Seed a stored profile without counting a call.
    pub async fn put_profile(&self, credential: &Credential, profile: &GuestProfile) {
        let Ok(value) = serde_json::to_value(profile) else {
            return;
        };
        let mut state = self.state.write().await;
        let record = state
            .guests
            .entry(credential.value().to_string())
            .or_default();
        record.welcome_seen_at = profile.welcome_seen_at.clone();
        record.profile = Some(value);
    }

    /// Fail every subsequent call with `failure`, or recover with `None`.
    pub async fn set_failure(&self, failure: Option<GatewayError>) {
        self.state.write().await.failure = failure;
    }

    pub async fn set_offline(&self, offline: bool) {
        let failure = offline.then(|| GatewayError::Transport("connection refused".to_string()));
        self.set_failure(failure).await;
    }

    /// The invitee accepts every pending invitation addressed to them.
    pub async fn accept_invite(&self, invitee: &Credential) -> bool {
        let mut state = self.state.write().await;
        let mut accepted = false;
        for link in state
            .links
            .iter_mut()
            .filter(|l| l.invitee == invitee.value())
        {
            link.status = LinkStatus::Confirmed;
            accepted = true;
        }
        accepted
    }

    /// The invitee declines; the link disappears for both sides.
    pub async fn decline_invite(&self, invitee: &Credential) {
        let mut state = self.state.write().await;
        state.links.retain(|l| l.invitee != invitee.value());
    }

    async fn begin(&self) -> Result<RwLockWriteGuard<'_, State>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.write().await;
        if let Some(failure) = &state.failure {
            return Err(failure.clone());
        }
        Ok(state)
    }
}

impl State {
    fn link_status(&self, key: &str) -> LinkStatus {
        self.links
            .iter()
            .filter(|l| l.inviter == key || l.invitee == key)
            .map(|l| l.status)
            .max()
            .unwrap_or_default()
    }

    fn member(&self, key: &str) -> FamilyMember {
        let record = self.guests.get(key);
        let profile = record
            .and_then(|r| r.profile.clone())
            .and_then(|v| profile_from_value(v).ok().flatten());
        let name = profile
            .as_ref()
            .and_then(|p| p.full_name.clone())
            .or_else(|| record.and_then(|r| r.display_name.clone()))
            .unwrap_or_default();
        FamilyMember {
            name,
            rsvp: profile.map(|p| p.rsvp).unwrap_or_default(),
        }
    }

    fn matches(&self, caller: &str, username: &Username) -> Vec<String> {
        self.guests
            .iter()
            .filter(|(key, record)| {
                key.as_str() != caller && record.username.as_deref() == Some(username.as_str())
            })
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl ProfileGateway for MemoryGateway {
    async fn get_profile(
        &self,
        credential: &Credential,
    ) -> Result<Option<GuestProfile>, GatewayError> {
        let state = self.begin().await?;
        let Some(record) = state.guests.get(credential.value()) else {
            return Ok(None);
        };
        let Some(value) = record.profile.clone() else {
            return Ok(None);
        };
        let mut profile = profile_from_value(value).map_err(decode_err)?;
        if let Some(profile) = profile.as_mut() {
            profile.welcome_seen_at = record.welcome_seen_at.clone();
        }
        Ok(profile)
    }

    async fn save_profile(
        &self,
        credential: &Credential,
        profile: &GuestProfile,
    ) -> Result<(), GatewayError> {
        let value = encode(profile)?;
        let mut state = self.begin().await?;
        let record = state
            .guests
            .entry(credential.value().to_string())
            .or_default();
        if record.welcome_seen_at.is_none() {
            record.welcome_seen_at = profile.welcome_seen_at.clone();
        }
        record.profile = Some(value);
        Ok(())
    }

    async fn profile_exists(&self, credential: &Credential) -> Result<bool, GatewayError> {
        let state = self.begin().await?;
        Ok(state
            .guests
            .get(credential.value())
            .is_some_and(|r| r.profile.is_some()))
    }

    async fn mark_welcome_seen(&self, credential: &Credential) -> Result<(), GatewayError> {
        let mut state = self.begin().await?;
        let record = state
            .guests
            .entry(credential.value().to_string())
            .or_default();
        record.welcome_seen_at.get_or_insert_with(now_marker);
        Ok(())
    }

    async fn load_family(
        &self,
        credential: &Credential,
    ) -> Result<Option<RemoteFamily>, GatewayError> {
        let state = self.begin().await?;
        let key = credential.value();
        let status = state.link_status(key);
        let stored = state.guests.get(key).and_then(|r| r.family.clone());
        let Some(value) = stored else {
            if status == LinkStatus::None {
                return Ok(None);
            }
            return Ok(Some(RemoteFamily::reported(FamilyState {
                with_partner: true,
                partner_status: status,
                ..Default::default()
            })));
        };
        // The link table is authoritative, so the status is always reported.
        let family = family_from_value(value).map_err(decode_err)?;
        Ok(family.map(|family| {
            RemoteFamily::reported(FamilyState {
                partner_status: status,
                ..family
            })
        }))
    }

    async fn save_family(
        &self,
        credential: &Credential,
        family: &FamilyState,
    ) -> Result<(), GatewayError> {
        let value = encode(family)?;
        let mut state = self.begin().await?;
        state
            .guests
            .entry(credential.value().to_string())
            .or_default()
            .family = Some(value);
        Ok(())
    }

    async fn check_username(
        &self,
        credential: &Credential,
        username: &Username,
    ) -> Result<UsernameMatch, GatewayError> {
        let state = self.begin().await?;
        let matches = state.matches(credential.value(), username);
        Ok(match matches.as_slice() {
            [] => UsernameMatch::NotFound,
            [key] => UsernameMatch::Found {
                name: Some(state.member(key).name).filter(|n| !n.is_empty()),
            },
            _ => UsernameMatch::MultipleMatches,
        })
    }

    async fn send_invite(
        &self,
        credential: &Credential,
        username: &Username,
    ) -> Result<InviteReply, GatewayError> {
        let mut state = self.begin().await?;
        let matches = state.matches(credential.value(), username);
        let invitee = match matches.as_slice() {
            [] => return Ok(InviteReply::NotFound),
            [key] => key.clone(),
            _ => return Ok(InviteReply::MultipleMatches),
        };
        let name = Some(state.member(&invitee).name).filter(|n| !n.is_empty());
        let inviter = credential.value().to_string();
        state.links.retain(|l| l.inviter != inviter);
        state.links.push(Link {
            inviter,
            invitee,
            status: LinkStatus::Sent,
        });
        Ok(InviteReply::Sent { name })
    }

    async fn family_status(
        &self,
        credential: &Credential,
    ) -> Result<(LinkStatus, Vec<FamilyMember>), GatewayError> {
        let state = self.begin().await?;
        let key = credential.value();
        let members = state
            .links
            .iter()
            .filter(|l| l.status == LinkStatus::Confirmed)
            .filter_map(|l| {
                if l.inviter == key {
                    Some(state.member(&l.invitee))
                } else if l.invitee == key {
                    Some(state.member(&l.inviter))
                } else {
                    None
                }
            })
            .collect();
        Ok((state.link_status(key), members))
    }
}
