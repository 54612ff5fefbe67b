/*
    Identity Store Integration Tests

    Drives the public API the way an application would:
    - the sign up / log out / log in walkthrough
    - restart round trips over every durable backend
    - building a store from configuration
*/

use authstore_core::config::{BackendKind, StoreConfig};
use authstore_core::identity::Directory;
use authstore_core::test_utils::{assert_error_kind, jo_signup, test_signup};
use authstore_core::{
    ErrorKind, FileSubstrate, IdentityStore, ProfileUpdate, RestoreOutcome, SqliteSubstrate,
    StoreKeys, Substrate,
};
use tempfile::tempdir;

fn stored_directory(substrate: &impl Substrate) -> Directory {
    let raw = substrate.get("users").unwrap().unwrap();
    Directory::parse(&raw).unwrap()
}

/// Sign up, log out, fail a login, log back in
#[test]
fn test_jo_walkthrough() {
    let temp = tempdir().unwrap();
    let substrate = FileSubstrate::open(temp.path(), "default").unwrap();
    let mut store = IdentityStore::open(substrate, StoreKeys::default());
    assert_eq!(store.substrate().get("users").unwrap(), None);

    let jo = store.signup(jo_signup()).unwrap();
    assert_eq!(stored_directory(store.substrate()).len(), 1);
    assert_eq!(store.current().map(|a| a.email.as_str()), Some("jo@x.com"));

    store.logout().unwrap();
    assert!(store.current().is_none());

    assert_error_kind(store.login("jo@x.com", "wrong"), ErrorKind::InvalidCredentials);
    assert!(store.current().is_none());

    let again = store.login("jo@x.com", "secret1").unwrap();
    assert_eq!(again.email, "jo@x.com");
    assert_eq!(again, jo);
}

#[test]
fn test_file_substrate_restart_round_trip() {
    let temp = tempdir().unwrap();

    let jo = {
        let substrate = FileSubstrate::open(temp.path(), "default").unwrap();
        let mut store = IdentityStore::open(substrate, StoreKeys::default());
        store.signup(jo_signup()).unwrap();
        store
            .update_profile(ProfileUpdate::new().phone("5550001111"))
            .unwrap()
    };

    let substrate = FileSubstrate::open(temp.path(), "default").unwrap();
    let mut store = IdentityStore::new(substrate, StoreKeys::default());
    assert_eq!(store.restore(), RestoreOutcome::Restored(jo.id));
    assert_eq!(store.current(), Some(&jo));
}

#[test]
fn test_sqlite_substrate_restart_round_trip() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("identity.db");

    let (a, b) = {
        let substrate = SqliteSubstrate::open(&path).unwrap();
        let mut store = IdentityStore::open(substrate, StoreKeys::default());
        let a = store.signup(test_signup("a@x.com")).unwrap();
        let b = store.signup(test_signup("b@x.com")).unwrap();
        (a, b)
    };

    let substrate = SqliteSubstrate::open(&path).unwrap();
    let mut store = IdentityStore::open(substrate, StoreKeys::default());
    assert_eq!(store.current(), Some(&b));
    assert_eq!(store.accounts().unwrap(), vec![a.clone(), b]);

    store.logout().unwrap();
    assert_eq!(store.login("a@x.com", "secret1").unwrap(), a);
}

#[test]
fn test_namespaces_are_isolated() {
    let temp = tempdir().unwrap();
    let first = FileSubstrate::open(temp.path(), "app-one").unwrap();
    let second = FileSubstrate::open(temp.path(), "app-two").unwrap();

    let mut one = IdentityStore::open(first, StoreKeys::default());
    one.signup(jo_signup()).unwrap();

    let mut two = IdentityStore::open(second, StoreKeys::default());
    assert!(!two.is_authenticated());
    assert!(two.accounts().unwrap().is_empty());
    assert!(two.signup(jo_signup()).is_ok());
}

#[test]
fn test_store_from_config() {
    let temp = tempdir().unwrap();

    for backend in [BackendKind::File, BackendKind::Sqlite] {
        let config = StoreConfig {
            backend,
            data_dir: temp.path().join(backend.to_string()),
            ..StoreConfig::default()
        };

        let jo = {
            let mut store = IdentityStore::from_config(&config).unwrap();
            assert!(store.is_restored());
            store.signup(jo_signup()).unwrap()
        };

        let store = IdentityStore::from_config(&config).unwrap();
        assert_eq!(store.current(), Some(&jo), "backend {}", backend);
    }
}

#[test]
fn test_memory_backend_from_config_starts_empty() {
    let config = StoreConfig {
        backend: BackendKind::Memory,
        ..StoreConfig::default()
    };

    let store = IdentityStore::from_config(&config).unwrap();
    assert!(store.is_restored());
    assert!(!store.is_authenticated());
}

#[test]
fn test_from_config_rejects_bad_namespace() {
    let temp = tempdir().unwrap();
    let config = StoreConfig {
        backend: BackendKind::File,
        data_dir: temp.path().to_path_buf(),
        namespace: "../escape".to_string(),
        ..StoreConfig::default()
    };

    assert!(IdentityStore::from_config(&config).is_err());
}

#[test]
fn test_corrupted_session_file_is_discarded_on_startup() {
    let temp = tempdir().unwrap();
    let substrate = FileSubstrate::open(temp.path(), "default").unwrap();
    substrate.set("currentUser", "{\"id\":").unwrap();

    let mut store = IdentityStore::new(substrate, StoreKeys::default());
    assert_eq!(store.restore(), RestoreOutcome::Discarded);
    assert!(!store
        .substrate()
        .base_path()
        .join("currentUser.val")
        .exists());
}
