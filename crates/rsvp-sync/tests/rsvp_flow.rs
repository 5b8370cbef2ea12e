use rsvp_contract::notice::{OPEN_IN_PLATFORM, SAVE_FAILED, STATUS_SAVED};
use rsvp_contract::{
    CacheKind, CacheStore, Credential, GuestId, GuestProfile, HostContext, ProfileGateway, RsvpChoice, RsvpStatus,
};
use rsvp_store_adapters::{MemoryCacheStore, MemoryGateway};
use rsvp_sync::{LocalCache, ProfileSync, RsvpFlow, SessionGuards, SyncError};
use std::sync::Arc;

const GUEST: GuestId = GuestId::new(321_654);

fn mounted_with(profile: Option<GuestProfile>) -> (Arc<MemoryCacheStore>, ProfileSync) {
    let store = Arc::new(MemoryCacheStore::new());
    let cache = LocalCache::new(store.clone());
    if let Some(profile) = profile {
        cache.save(CacheKind::Profile, GUEST, &profile).unwrap();
    }
    let mut guards = SessionGuards::new();
    let sync = ProfileSync::mount(GUEST, cache, &mut guards, &HostContext::default());
    (store, sync)
}

fn attending() -> GuestProfile {
    GuestProfile {
        rsvp: RsvpStatus::Yes,
        full_name: Some("Ivan".into()),
        birth_date: Some("1990-01-01".into()),
        ..Default::default()
    }
}

#[test]
fn selecting_does_not_commit_and_cancel_changes_nothing() {
    let (store, mut sync) = mounted_with(Some(attending()));
    let cached_before = store.get(&CacheKind::Profile.key(GUEST)).unwrap();

    assert!(sync.select_rsvp(RsvpChoice::No));
    assert_eq!(sync.profile().rsvp, RsvpStatus::Yes);
    assert_eq!(
        sync.rsvp_flow(),
        RsvpFlow::PendingConfirmation {
            target: RsvpChoice::No
        }
    );

    sync.cancel_rsvp();
    assert_eq!(sync.rsvp_flow(), RsvpFlow::Idle);
    assert_eq!(sync.profile().rsvp, RsvpStatus::Yes);
    assert!(!sync.is_dirty());
    assert_eq!(
        store.get(&CacheKind::Profile.key(GUEST)).unwrap(),
        cached_before
    );
}

#[test]
fn committing_without_pending_target_is_an_error() {
    let (_, mut sync) = mounted_with(None);
    assert!(matches!(
        sync.commit_pending_rsvp(),
        Err(SyncError::NothingPending)
    ));
}

#[tokio::test]
async fn confirm_commits_locally_and_saves_remotely() {
    let gw = MemoryGateway::new();
    let cred = Credential::InitData("ivan".into());
    let (store, mut sync) = mounted_with(Some(attending()));
    sync.set_optional_expanded(true);

    sync.select_rsvp(RsvpChoice::No);
    let notice = sync.confirm_rsvp(&gw, Some(&cred)).await.unwrap();

    assert_eq!(notice.message, STATUS_SAVED);
    assert_eq!(sync.rsvp_flow(), RsvpFlow::Idle);
    assert_eq!(sync.profile().rsvp, RsvpStatus::No);
    assert!(!sync.optional_expanded());
    assert!(sync.is_dirty());

    let cached: GuestProfile =
        serde_json::from_str(&store.get(&CacheKind::Profile.key(GUEST)).unwrap().unwrap())
            .unwrap();
    assert_eq!(cached.rsvp, RsvpStatus::No);
    let remote = gw.get_profile(&cred).await.unwrap().unwrap();
    assert_eq!(remote.rsvp, RsvpStatus::No);
}

#[tokio::test]
async fn confirm_clears_first_time_banner() {
    let gw = MemoryGateway::new();
    let (_, mut sync) = mounted_with(None);
    assert!(sync.banners().first_time);

    sync.select_rsvp(RsvpChoice::Maybe);
    sync.confirm_rsvp(&gw, Some(&Credential::InviteToken("tok".into())))
        .await;
    assert!(!sync.banners().first_time);
}

#[tokio::test]
async fn failed_save_keeps_local_commit() {
    let gw = MemoryGateway::new();
    gw.set_offline(true).await;
    let (_, mut sync) = mounted_with(Some(attending()));

    sync.select_rsvp(RsvpChoice::Maybe);
    let notice = sync
        .confirm_rsvp(&gw, Some(&Credential::InitData("ivan".into())))
        .await
        .unwrap();

    assert!(notice.is_error());
    assert_eq!(notice.message, SAVE_FAILED);
    assert_eq!(sync.profile().rsvp, RsvpStatus::Maybe);
    assert_eq!(sync.rsvp_flow(), RsvpFlow::Idle);
}

#[tokio::test]
async fn missing_credential_is_reported_without_network_call() {
    let gw = MemoryGateway::new();
    let (_, mut sync) = mounted_with(Some(attending()));

    sync.select_rsvp(RsvpChoice::No);
    let notice = sync.confirm_rsvp(&gw, None).await.unwrap();

    assert_eq!(notice.message, OPEN_IN_PLATFORM);
    assert_eq!(sync.profile().rsvp, RsvpStatus::No);
    assert_eq!(gw.call_count(), 0);
}

#[tokio::test]
async fn confirm_with_nothing_pending_yields_no_notice() {
    let gw = MemoryGateway::new();
    let (_, mut sync) = mounted_with(Some(attending()));

    assert!(!sync.select_rsvp(RsvpChoice::Yes));
    assert!(sync.confirm_rsvp(&gw, None).await.is_none());
    assert_eq!(gw.call_count(), 0);
}

#[test]
fn selection_while_applying_is_ignored() {
    let (_, mut sync) = mounted_with(Some(attending()));
    sync.select_rsvp(RsvpChoice::Maybe);
    assert_eq!(sync.commit_pending_rsvp().unwrap(), RsvpChoice::Maybe);

    assert!(!sync.select_rsvp(RsvpChoice::No));
    assert_eq!(
        sync.rsvp_flow(),
        RsvpFlow::Applying {
            target: RsvpChoice::Maybe
        }
    );
    sync.settle_rsvp();
    assert_eq!(sync.rsvp_flow(), RsvpFlow::Idle);
}
