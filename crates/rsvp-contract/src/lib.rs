//! Shared contracts for the wedding guest client: the guest data model,
//! the local cache and remote gateway seams, and wire normalization.
//!
//! Everything that crosses a boundary (server payloads, cached snapshots) is
//! normalized by [`wire`] into the canonical types defined here, so the
//! synchronization core never sees alternate field names.

pub mod cache;
pub mod family;
pub mod gateway;
pub mod identity;
pub mod notice;
pub mod profile;
pub mod wire;

pub use cache::{CacheError, CacheKind, CacheStore, IDENTITY_KEY};
pub use family::{
    normalize_username, Child, FamilyMember, FamilyState, InviteRecord, InviteReply, LinkStatus,
    RemoteFamily, Username, UsernameError, UsernameMatch,
};
pub use gateway::{GatewayError, ProfileGateway};
pub use identity::{Credential, GuestId, HostContext, PlatformUser};
pub use notice::{Notice, NoticeVariant};
pub use profile::{
    normalize_phone, AlcoholPrefs, FoodPreference, Gender, GuestProfile, ProfileViolation,
    RsvpChoice, RsvpStatus, Side, NO_ALCOHOL_TAG, PHONE_PREFIX,
};
pub use wire::WireError;
