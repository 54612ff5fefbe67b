use tokio::sync::broadcast::error::TryRecvError;

use crate::identity::{IdentityStore, ProfileUpdate, SessionEvent, StoreKeys};
use crate::substrate::{MemorySubstrate, Substrate};
use crate::test_utils::*;

#[tokio::test]
async fn test_watch_sees_restoration_complete() {
    let substrate = MemorySubstrate::new();
    let mut store = IdentityStore::new(substrate, StoreKeys::default());
    let mut rx = store.subscribe();
    assert!(!rx.borrow().restored);

    store.restore();

    rx.changed().await.unwrap();
    let state = rx.borrow_and_update().clone();
    assert!(state.restored);
    assert!(!state.is_authenticated());
}

#[tokio::test]
async fn test_watch_follows_login_and_logout() {
    let (mut store, _substrate) = memory_store();
    store.signup(jo_signup()).unwrap();
    store.logout().unwrap();

    let mut rx = store.subscribe();
    rx.borrow_and_update();

    let jo = store.login("jo@x.com", "secret1").unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().account.as_ref(), Some(&jo));

    store.logout().unwrap();
    rx.changed().await.unwrap();
    let state = rx.borrow_and_update().clone();
    assert!(state.restored);
    assert_none(state.account);
}

#[test]
fn test_failed_login_does_not_notify() {
    let (mut store, _substrate) = memory_store();
    let mut rx = store.subscribe();
    rx.borrow_and_update();

    assert!(store.login("jo@x.com", "nope").is_err());
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_events_arrive_in_operation_order() {
    let substrate = MemorySubstrate::new();
    let mut store = IdentityStore::new(substrate, StoreKeys::default());
    let mut events = store.events();

    store.restore();
    let jo = store.signup(jo_signup()).unwrap();
    let updated = store
        .update_profile(ProfileUpdate::new().full_name("Joanne"))
        .unwrap();
    store.logout().unwrap();
    let again = store.login("jo@x.com", "secret1").unwrap();

    assert_eq!(events.recv().await.unwrap(), SessionEvent::Restored(None));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedUp(jo));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::ProfileUpdated(updated.clone()));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedIn(again.clone()));
    assert_eq!(again, updated);
}

#[test]
fn test_restored_event_carries_session_id() {
    let substrate = MemorySubstrate::new();
    let account = TestAccountBuilder::new(42, "a@x.com").build();
    substrate.set("currentUser", &account.to_json().unwrap()).unwrap();

    let mut store = IdentityStore::new(substrate, StoreKeys::default());
    let mut events = store.events();
    store.restore();

    assert_eq!(events.try_recv().unwrap(), SessionEvent::Restored(Some(account.id)));
}

#[test]
fn test_logout_while_logged_out_emits_nothing() {
    let (mut store, _substrate) = memory_store();
    let mut events = store.events();

    assert_ok(store.logout());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
fn test_rejected_signup_emits_nothing() {
    let (mut store, _substrate) = memory_store();
    store.signup(jo_signup()).unwrap();
    let mut events = store.events();

    assert!(store.signup(jo_signup()).is_err());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
fn test_dispose_closes_event_channel() {
    let (store, _substrate) = memory_store();
    let mut events = store.events();

    store.dispose();
    assert!(matches!(events.try_recv(), Err(TryRecvError::Closed)));
}
