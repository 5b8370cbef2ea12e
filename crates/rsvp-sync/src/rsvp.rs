//! Two-step RSVP change: select, then confirm.

use crate::error::SyncError;
use crate::reconcile::ProfileSync;
use rsvp_contract::notice::{SAVE_FAILED, STATUS_SAVED};
use rsvp_contract::{CacheKind, Credential, Notice, ProfileGateway, RsvpChoice, RsvpStatus};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RsvpFlow {
    #[default]
    Idle,
    PendingConfirmation {
        target: RsvpChoice,
    },
    Applying {
        target: RsvpChoice,
    },
}

impl RsvpFlow {
    /// Target awaiting confirmation, if any.
    pub fn pending_target(&self) -> Option<RsvpChoice> {
        match self {
            Self::PendingConfirmation { target } => Some(*target),
            _ => None,
        }
    }

    pub fn is_applying(&self) -> bool {
        matches!(self, Self::Applying { .. })
    }

    /// Label for the confirm action, when one is offered.
    pub fn confirm_label(&self) -> Option<&'static str> {
        self.pending_target().map(RsvpChoice::confirm_label)
    }

    /// Returns whether the flow changed.
    pub fn select(&mut self, committed: RsvpStatus, choice: RsvpChoice) -> bool {
        if self.is_applying() || RsvpStatus::from(choice) == committed {
            return false;
        }
        let next = Self::PendingConfirmation { target: choice };
        let changed = *self != next;
        *self = next;
        changed
    }

    pub fn cancel(&mut self) {
        if !self.is_applying() {
            *self = Self::Idle;
        }
    }

    fn begin_apply(&mut self) -> Option<RsvpChoice> {
        let target = self.pending_target()?;
        *self = Self::Applying { target };
        Some(target)
    }

    fn finish(&mut self) {
        *self = Self::Idle;
    }
}

impl ProfileSync {
    pub fn rsvp_flow(&self) -> RsvpFlow {
        self.rsvp
    }

    /// Start a status change. The committed status is untouched until
    /// [`Self::confirm_rsvp`].
    pub fn select_rsvp(&mut self, choice: RsvpChoice) -> bool {
        self.rsvp.select(self.profile.rsvp, choice)
    }

    /// Drop the pending target without touching the profile or the cache.
    pub fn cancel_rsvp(&mut self) {
        self.rsvp.cancel();
    }

    /// Commit the pending target locally and move to `Applying`.
    pub fn commit_pending_rsvp(&mut self) -> Result<RsvpChoice, SyncError> {
        let target = self.rsvp.begin_apply().ok_or(SyncError::NothingPending)?;
        self.profile.rsvp = target.into();
        self.dirty = true;
        self.banners.first_time = false;
        if target == RsvpChoice::No {
            self.optional_expanded = false;
        }
        self.cache
            .write_through(CacheKind::Profile, self.guest_id, &self.profile);
        Ok(target)
    }

    /// Return to `Idle` once the remote save has resolved.
    pub fn settle_rsvp(&mut self) {
        self.rsvp.finish();
    }

    /// Confirm the pending change: commit locally, then save remotely.
    ///
    /// Returns `None` when nothing was pending. A failed save keeps the local
    /// commit.
    pub async fn confirm_rsvp(
        &mut self,
        gateway: &dyn ProfileGateway,
        credential: Option<&Credential>,
    ) -> Option<Notice> {
        let target = self.commit_pending_rsvp().ok()?;
        let result = match credential {
            Some(credential) => gateway
                .save_profile(credential, &self.profile)
                .await
                .map_err(SyncError::from),
            None => Err(SyncError::MissingCredential),
        };
        self.settle_rsvp();

        Some(match result {
            Ok(()) => Notice::ok(STATUS_SAVED),
            Err(e) => {
                warn!(error = %e, target = target.as_str(), "rsvp save failed");
                e.notice(SAVE_FAILED)
            }
        })
    }
}
