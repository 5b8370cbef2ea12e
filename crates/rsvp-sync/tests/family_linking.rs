use rsvp_contract::notice::{
    ENTER_PARTNER_USERNAME, FAMILY_SAVED, INVITE_SENT, USERNAME_LOOKUP_FAILED, USERNAME_MULTIPLE,
    USERNAME_NOT_FOUND,
};
use rsvp_contract::{
    CacheKind, Credential, FamilyState, GuestId, GuestProfile, InviteRecord, LinkStatus,
    ProfileGateway, RemoteFamily, RsvpStatus,
};
use rsvp_contract::wire::remote_family_from_value;
use serde_json::json;
use rsvp_store_adapters::{MemoryCacheStore, MemoryGateway};
use rsvp_sync::{
    lookup_username, ChildField, FamilyEdit, FamilySync, LocalCache, SyncError, UsernameLookup,
};
use std::sync::Arc;

const GUEST: GuestId = GuestId::new(700_007);

fn ivan() -> Credential {
    Credential::InitData("ivan".into())
}

fn anna() -> Credential {
    Credential::InitData("anna".into())
}

fn local_cache() -> LocalCache {
    LocalCache::new(Arc::new(MemoryCacheStore::new()))
}

#[tokio::test]
async fn not_found_lookup_has_its_own_message_and_sends_nothing() {
    let gw = MemoryGateway::new();
    let sync = FamilySync::mount(GUEST, local_cache());

    let notice = sync.check_username(&gw, Some(&ivan()), "@john").await;
    assert!(notice.is_error());
    assert_eq!(notice.message, USERNAME_NOT_FOUND);
    assert_ne!(notice.message, USERNAME_LOOKUP_FAILED);
    assert_eq!(gw.call_count(), 1);
    assert_eq!(gw.family_status(&ivan()).await.unwrap().0, LinkStatus::None);
}

#[tokio::test]
async fn lookup_taxonomy() {
    let gw = MemoryGateway::new();
    gw.register_guest(&anna(), "anna_k", "Anna").await;
    gw.register_guest(&Credential::InitData("t1".into()), "twin", "T1")
        .await;
    gw.register_guest(&Credential::InitData("t2".into()), "twin", "T2")
        .await;

    assert_eq!(
        lookup_username(&gw, Some(&ivan()), "https://t.me/Anna_K")
            .await
            .unwrap(),
        UsernameLookup::Found {
            name: Some("Anna".into())
        }
    );
    assert_eq!(
        lookup_username(&gw, Some(&ivan()), "twin").await.unwrap(),
        UsernameLookup::MultipleMatches
    );

    gw.set_offline(true).await;
    let lookup = lookup_username(&gw, Some(&ivan()), "anna_k")
        .await
        .unwrap();
    assert_eq!(lookup, UsernameLookup::TransportError);
    assert_eq!(lookup.notice().message, USERNAME_LOOKUP_FAILED);
    assert_eq!(
        UsernameLookup::MultipleMatches.notice().message,
        USERNAME_MULTIPLE
    );
}

#[tokio::test]
async fn empty_username_rejected_before_any_call() {
    let gw = MemoryGateway::new();
    let mut sync = FamilySync::mount(GUEST, local_cache());

    for raw in ["", "   ", "@", "https://t.me/"] {
        let notice = sync.send_invite(&gw, Some(&ivan()), raw).await;
        assert_eq!(notice.message, ENTER_PARTNER_USERNAME);
        let notice = sync.check_username(&gw, None, raw).await;
        assert_eq!(notice.message, ENTER_PARTNER_USERNAME);
    }
    assert!(matches!(
        lookup_username(&gw, None, " ").await,
        Err(SyncError::Username(_))
    ));
    assert_eq!(gw.call_count(), 0);
    assert_eq!(sync.family().partner_status, LinkStatus::None);
}

#[tokio::test]
async fn successful_invite_marks_link_sent_and_caches_record() {
    let gw = MemoryGateway::new();
    gw.register_guest(&anna(), "anna_k", "Anna").await;
    let cache = local_cache();
    let mut sync = FamilySync::mount(GUEST, cache.clone());

    let notice = sync.send_invite(&gw, Some(&ivan()), "@Anna_K").await;
    assert!(!notice.is_error());
    assert!(notice.message.starts_with(INVITE_SENT));

    let family = sync.family();
    assert!(family.with_partner);
    assert_eq!(family.partner_username.as_deref(), Some("anna_k"));
    assert_eq!(family.partner_status, LinkStatus::Sent);

    let record: InviteRecord = cache.load(CacheKind::Invite, GUEST).unwrap();
    assert_eq!(record.username, "anna_k");
    assert_eq!(record.status, LinkStatus::Sent);

    // A reload before the server reports anything still shows the pending invite.
    let remount = FamilySync::mount(GUEST, cache);
    assert_eq!(remount.family().partner_status, LinkStatus::Sent);
}

#[tokio::test]
async fn invite_to_unknown_username_changes_nothing() {
    let gw = MemoryGateway::new();
    let mut sync = FamilySync::mount(GUEST, local_cache());

    let notice = sync.send_invite(&gw, Some(&ivan()), "ghost").await;
    assert_eq!(notice.message, USERNAME_NOT_FOUND);
    assert_eq!(sync.family().partner_status, LinkStatus::None);
    assert!(sync.family().partner_username.is_none());
}

#[tokio::test]
async fn link_status_advances_and_resets_on_decline() {
    let gw = MemoryGateway::new();
    gw.register_guest(&anna(), "anna_k", "Anna").await;
    gw.put_profile(
        &anna(),
        &GuestProfile {
            rsvp: RsvpStatus::Yes,
            full_name: Some("Anna Ivanova".into()),
            ..Default::default()
        },
    )
    .await;
    let mut sync = FamilySync::mount(GUEST, local_cache());
    sync.send_invite(&gw, Some(&ivan()), "anna_k").await;
    sync.save(&gw, Some(&ivan())).await;

    gw.accept_invite(&anna()).await;
    let members = sync.refresh_status(&gw, Some(&ivan())).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "Anna Ivanova");
    assert_eq!(members[0].rsvp, RsvpStatus::Yes);
    assert_eq!(sync.family().partner_status, LinkStatus::Confirmed);

    // A stale lower status never moves the link backwards.
    sync.apply_remote(Some(RemoteFamily::reported(FamilyState {
        partner_status: LinkStatus::Sent,
        ..Default::default()
    })));
    assert_eq!(sync.family().partner_status, LinkStatus::Confirmed);

    gw.decline_invite(&anna()).await;
    sync.hydrate(&gw, Some(&ivan())).await;
    assert_eq!(sync.family().partner_status, LinkStatus::None);
}

#[tokio::test]
async fn refresh_failure_keeps_previous_members() {
    let gw = MemoryGateway::new();
    gw.register_guest(&anna(), "anna_k", "Anna").await;
    let mut sync = FamilySync::mount(GUEST, local_cache());
    sync.send_invite(&gw, Some(&ivan()), "anna_k").await;
    gw.accept_invite(&anna()).await;
    sync.refresh_status(&gw, Some(&ivan())).await.unwrap();
    assert_eq!(sync.members().len(), 1);

    gw.set_offline(true).await;
    assert!(sync.refresh_status(&gw, Some(&ivan())).await.is_err());
    assert_eq!(sync.members().len(), 1);
    assert_eq!(sync.members()[0].name, "Anna");
}

#[tokio::test]
async fn dirty_form_ignores_remote_fields_but_takes_status() {
    let gw = MemoryGateway::new();
    let mut sync = FamilySync::mount(GUEST, local_cache());
    sync.edit(FamilyEdit::TogglePartner);
    sync.edit(FamilyEdit::PartnerUsername("@typed".into()));

    let merged = sync.apply_remote(Some(RemoteFamily::reported(FamilyState {
        with_partner: false,
        partner_username: Some("server".into()),
        partner_status: LinkStatus::Sent,
        children: Vec::new(),
    })));
    assert!(!merged);
    assert!(sync.family().with_partner);
    assert_eq!(sync.family().partner_username.as_deref(), Some("@typed"));
    assert_eq!(sync.family().partner_status, LinkStatus::Sent);
    assert_eq!(gw.call_count(), 0);
}

#[tokio::test]
async fn children_edits_and_save() {
    let gw = MemoryGateway::new();
    let cache = local_cache();
    let mut sync = FamilySync::mount(GUEST, cache.clone());

    let masha = sync.edit(FamilyEdit::AddChild).unwrap();
    let petya = sync.edit(FamilyEdit::AddChild).unwrap();
    assert_ne!(masha, petya);
    sync.edit(FamilyEdit::Child {
        id: masha.clone(),
        field: ChildField::Name,
        value: "Masha".into(),
    });
    sync.edit(FamilyEdit::Child {
        id: masha.clone(),
        field: ChildField::Age,
        value: "5".into(),
    });
    sync.edit(FamilyEdit::RemoveChild(petya));

    let notice = sync.save(&gw, Some(&ivan())).await;
    assert_eq!(notice.message, FAMILY_SAVED);

    let cached: FamilyState = cache.load(CacheKind::Family, GUEST).unwrap();
    assert_eq!(cached.children.len(), 1);
    assert_eq!(cached.children[0].name, "Masha");
    assert_eq!(cached.children[0].age, "5");

    let remote = gw.load_family(&ivan()).await.unwrap().unwrap();
    assert_eq!(remote.family.children, cached.children);
}

#[tokio::test]
async fn payload_without_link_status_keeps_pending_invite() {
    let cache = local_cache();
    cache
        .save(
            CacheKind::Invite,
            GUEST,
            &InviteRecord {
                username: "anna_k".into(),
                status: LinkStatus::Sent,
            },
        )
        .unwrap();
    let mut sync = FamilySync::mount(GUEST, cache.clone());
    assert_eq!(sync.family().partner_status, LinkStatus::Sent);

    let remote = remote_family_from_value(json!({
        "data": { "withPartner": true, "partnerName": "anna_k", "children": [] }
    }))
    .unwrap();
    assert!(remote.as_ref().is_some_and(|r| r.link.is_none()));

    assert!(sync.apply_remote(remote));
    assert_eq!(sync.family().partner_status, LinkStatus::Sent);
    let cached: FamilyState = cache.load(CacheKind::Family, GUEST).unwrap();
    assert_eq!(cached.partner_status, LinkStatus::Sent);

    // An explicit withdrawal still resets the link.
    let declined = remote_family_from_value(json!({
        "data": { "withPartner": true, "children": [] },
        "invite": { "status": "none" }
    }))
    .unwrap();
    sync.apply_remote(declined);
    assert_eq!(sync.family().partner_status, LinkStatus::None);
}
