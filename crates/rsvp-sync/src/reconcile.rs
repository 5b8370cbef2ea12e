//! Profile reconciliation between the local cache and the remote gateway.

use crate::cache::LocalCache;
use crate::error::SyncError;
use crate::form::{apply_edit, ProfileEdit};
use crate::rsvp::RsvpFlow;
use crate::session::SessionGuards;
use rsvp_contract::notice::{PROFILE_SAVED, SAVE_FAILED};
use rsvp_contract::{
    CacheKind, Credential, GuestId, GuestProfile, HostContext, Notice, ProfileGateway,
};
use tracing::{debug, warn};

/// Onboarding banners currently visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Banners {
    /// No RSVP status is known for this guest yet.
    pub first_time: bool,
    pub welcome: bool,
}

/// Outcome of fetching the remote profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteProfile {
    /// Request failed; local data stays authoritative.
    Unavailable,
    /// The server has no profile for this guest.
    Missing,
    Present(GuestProfile),
}

/// Fetch the remote profile: existence probe first, then the profile.
///
/// Failures are swallowed into [`RemoteProfile::Unavailable`].
pub async fn fetch_remote(gateway: &dyn ProfileGateway, credential: &Credential) -> RemoteProfile {
    match gateway.profile_exists(credential).await {
        Ok(true) => {}
        Ok(false) => return RemoteProfile::Missing,
        Err(e) => {
            debug!(error = %e, "profile existence check failed");
            return RemoteProfile::Unavailable;
        }
    }
    match gateway.get_profile(credential).await {
        Ok(Some(profile)) => RemoteProfile::Present(profile),
        Ok(None) => RemoteProfile::Missing,
        Err(e) => {
            debug!(error = %e, "remote profile fetch failed");
            RemoteProfile::Unavailable
        }
    }
}

/// Profile screen state for one mount.
pub struct ProfileSync {
    pub(crate) guest_id: GuestId,
    pub(crate) cache: LocalCache,
    pub(crate) profile: GuestProfile,
    pub(crate) dirty: bool,
    pub(crate) banners: Banners,
    /// Welcome was dismissed on this device or marked seen in the cache.
    pub(crate) seen_locally: bool,
    pub(crate) optional_expanded: bool,
    pub(crate) rsvp: RsvpFlow,
}

impl ProfileSync {
    /// Hydrate synchronously from the cache.
    ///
    /// A blank full name is prefilled from the platform user; that does not
    /// count as an edit.
    pub fn mount(
        guest_id: GuestId,
        cache: LocalCache,
        guards: &mut SessionGuards,
        host: &HostContext,
    ) -> Self {
        let cached: Option<GuestProfile> = cache.load(CacheKind::Profile, guest_id);
        let has_local_profile = cached.is_some();
        let mut profile = cached.unwrap_or_default();
        profile.guest_id = Some(guest_id);

        if profile.full_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            if let Some(name) = host.user.as_ref().and_then(|u| u.display_name()) {
                profile.full_name = Some(name);
            }
        }

        let seen_locally = cache
            .load::<bool>(CacheKind::WelcomeSeen, guest_id)
            .unwrap_or(false)
            || profile.welcome_seen_at.is_some();
        let welcome = if has_local_profile && seen_locally {
            false
        } else {
            guards.claim_welcome()
        };

        let banners = Banners {
            first_time: !profile.rsvp.is_set(),
            welcome,
        };
        let optional_expanded = profile.is_attending();

        Self {
            guest_id,
            cache,
            profile,
            dirty: false,
            banners,
            seen_locally,
            optional_expanded,
            rsvp: RsvpFlow::Idle,
        }
    }

    pub fn guest_id(&self) -> GuestId {
        self.guest_id
    }

    pub fn profile(&self) -> &GuestProfile {
        &self.profile
    }

    pub fn banners(&self) -> Banners {
        self.banners
    }

    /// Whether the guest edited anything since mount.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn optional_expanded(&self) -> bool {
        self.optional_expanded
    }

    pub fn set_optional_expanded(&mut self, expanded: bool) {
        self.optional_expanded = expanded;
    }

    /// Apply a fetched remote result. Returns whether profile data was merged.
    ///
    /// Banner facts from the server always apply; profile fields are only
    /// taken while the dirty flag is clear. Once a remote profile exists, the
    /// welcome is no longer forced and a local seen flag hides it too.
    pub fn apply_remote(&mut self, remote: RemoteProfile) -> bool {
        let RemoteProfile::Present(mut remote) = remote else {
            return false;
        };
        if self.seen_locally || remote.welcome_seen_at.is_some() {
            self.banners.welcome = false;
        }
        if remote.rsvp.is_set() {
            self.banners.first_time = false;
        }
        if self.dirty {
            debug!(guest_id = %self.guest_id, "local edits pending, remote profile ignored");
            return false;
        }

        remote.guest_id = Some(self.guest_id);
        if remote.full_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            remote.full_name = self.profile.full_name.take();
        }
        self.optional_expanded = remote.is_attending();
        self.profile = remote;
        self.cache
            .write_through(CacheKind::Profile, self.guest_id, &self.profile);
        true
    }

    /// Fetch and apply the remote profile. Without a credential this is a
    /// no-op.
    pub async fn hydrate(
        &mut self,
        gateway: &dyn ProfileGateway,
        credential: Option<&Credential>,
    ) -> bool {
        let Some(credential) = credential else {
            return false;
        };
        let remote = fetch_remote(gateway, credential).await;
        self.apply_remote(remote)
    }

    pub fn edit(&mut self, edit: ProfileEdit) {
        apply_edit(&mut self.profile, edit);
        self.dirty = true;
    }

    /// Validate, cache, then save remotely.
    pub async fn save(
        &mut self,
        gateway: &dyn ProfileGateway,
        credential: Option<&Credential>,
    ) -> Notice {
        match self.try_save(gateway, credential).await {
            Ok(()) => Notice::ok(PROFILE_SAVED),
            Err(e) => {
                warn!(error = %e, guest_id = %self.guest_id, "profile save failed");
                e.notice(SAVE_FAILED)
            }
        }
    }

    async fn try_save(
        &mut self,
        gateway: &dyn ProfileGateway,
        credential: Option<&Credential>,
    ) -> Result<(), SyncError> {
        self.profile.validate()?;
        self.cache
            .write_through(CacheKind::Profile, self.guest_id, &self.profile);
        if self.profile.rsvp.is_set() {
            self.banners.first_time = false;
        }
        let credential = credential.ok_or(SyncError::MissingCredential)?;
        gateway.save_profile(credential, &self.profile).await?;
        Ok(())
    }

    /// Hide the welcome banner and remember that, locally and remotely.
    pub async fn dismiss_welcome(
        &mut self,
        gateway: &dyn ProfileGateway,
        credential: Option<&Credential>,
    ) {
        self.banners.welcome = false;
        self.seen_locally = true;
        self.cache
            .write_through(CacheKind::WelcomeSeen, self.guest_id, &true);
        if let Some(credential) = credential {
            if let Err(e) = gateway.mark_welcome_seen(credential).await {
                debug!(error = %e, "failed to mark welcome as seen remotely");
            }
        }
    }
}
