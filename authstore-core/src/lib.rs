//! authstore: a client-resident identity store over a local key-value
//! substrate.

pub mod config;
pub mod identity;
pub mod logging;
pub mod metrics;
pub mod substrate;
pub mod test_utils;
pub mod tracing;

pub use config::Config;
pub use identity::{
    Account, AccountId, CreatedAt, ErrorKind, IdentityError, IdentityStore, ProfileUpdate,
    RestoreOutcome, SessionEvent, SessionState, SignupRequest, StoreKeys,
};
pub use logging::{init_logging, LogLevel};
pub use substrate::{FileSubstrate, MemorySubstrate, SqliteSubstrate, Substrate, SubstrateError};
