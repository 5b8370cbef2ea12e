//! Client-side synchronization core for the wedding guest client.
//!
//! A session resolves the guest identity once, then mounts one
//! [`ProfileSync`] and one [`FamilySync`] per screen visit. Both hydrate
//! synchronously from the [`LocalCache`] and reconcile with the remote
//! gateway afterwards, guarded by a per-mount dirty flag so that a slow
//! response never clobbers what the guest typed in the meantime.

pub mod cache;
pub mod error;
pub mod family;
pub mod form;
pub mod identity;
pub mod reconcile;
pub mod rsvp;
pub mod session;

pub use cache::LocalCache;
pub use error::SyncError;
pub use family::{lookup_username, ChildField, FamilyEdit, FamilySync, UsernameLookup};
pub use form::ProfileEdit;
pub use identity::{resolve_identity, resolve_identity_with, PSEUDO_ID_RANGE};
pub use reconcile::{fetch_remote, Banners, ProfileSync, RemoteProfile};
pub use rsvp::RsvpFlow;
pub use session::SessionGuards;
