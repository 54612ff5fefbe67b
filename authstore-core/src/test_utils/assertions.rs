//! Assertions for store tests

use std::fmt::Debug;

use crate::identity::{Account, Directory, ErrorKind, IdentityResult, IdentityStore};
use crate::substrate::Substrate;

#[track_caller]
pub fn assert_ok<T, E: Debug>(result: Result<T, E>) -> T {
    result.unwrap_or_else(|e| panic!("operation failed: {:?}", e))
}

#[track_caller]
pub fn assert_err<T: Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(value) => panic!("operation unexpectedly succeeded with {:?}", value),
        Err(e) => e,
    }
}

#[track_caller]
pub fn assert_some<T>(option: Option<T>) -> T {
    option.unwrap_or_else(|| panic!("value missing"))
}

#[track_caller]
pub fn assert_none<T: Debug>(option: Option<T>) {
    assert!(option.is_none(), "expected nothing, found {:?}", option);
}

/// The operation failed, and with the given kind
#[track_caller]
pub fn assert_error_kind<T: Debug>(result: IdentityResult<T>, expected: ErrorKind) {
    match result {
        Ok(value) => panic!("expected {:?}, operation returned {:?}", expected, value),
        Err(e) => assert_eq!(e.kind(), expected, "unexpected error: {}", e),
    }
}

/// The store is logged in as `account` both in memory and in the substrate
#[track_caller]
pub fn assert_session<S: Substrate>(store: &IdentityStore<S>, account: &Account) {
    assert_eq!(store.current(), Some(account));
    let stored = store
        .substrate()
        .get(&store.keys().session)
        .unwrap_or_else(|e| panic!("session unreadable: {}", e))
        .unwrap_or_else(|| panic!("no session persisted for {}", account.email));
    assert_eq!(&Account::from_json(&stored).expect("session does not parse"), account);
}

/// Neither memory nor the substrate holds a session
#[track_caller]
pub fn assert_logged_out<S: Substrate>(store: &IdentityStore<S>) {
    assert_none(store.current());
    let stored = store.substrate().get(&store.keys().session);
    assert!(matches!(stored, Ok(None)), "session key still holds {:?}", stored);
}

/// Emails in the persisted directory, in stored order
#[track_caller]
pub fn directory_emails<S: Substrate>(substrate: &S, directory_key: &str) -> Vec<String> {
    match substrate.get(directory_key).expect("directory unreadable") {
        None => Vec::new(),
        Some(raw) => Directory::parse(&raw)
            .expect("directory does not parse")
            .into_accounts()
            .into_iter()
            .map(|a| a.email)
            .collect(),
    }
}
