//! Identity store
//!
//! Emulates an authentication backend entirely against a local key-value
//! substrate:
//! - `IdentityStore::signup()` -> registers an account and logs it in
//! - `IdentityStore::login()` -> exact email/password match, sets the session
//! - `IdentityStore::logout()` -> clears the session (idempotent)
//! - `IdentityStore::update_profile()` -> typed partial update of the logged-in account
//! - `IdentityStore::restore()` -> reloads the session after a restart
//!
//! Passwords are stored and compared as plain text. This mirrors the system
//! being emulated and is not a credential vault.

mod account;
mod directory;
mod error;
mod events;
mod id;
mod store;

#[cfg(test)]
mod tests;

pub use account::{Account, AccountId, CreatedAt, ProfileUpdate, SignupRequest};
pub use directory::Directory;
pub use error::{ErrorKind, IdentityError, IdentityResult};
pub use events::{SessionEvent, SessionEvents, SessionState};
pub use id::IdGenerator;
pub use store::{IdentityStore, RestoreOutcome, StoreKeys};
