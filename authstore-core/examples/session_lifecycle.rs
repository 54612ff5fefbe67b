//! Walk through an account's lifecycle against a file substrate
//!
//! Run with:
//! ```bash
//! cargo run --example session_lifecycle
//! ```
//!
//! Set `AUTHSTORE_STORE_DATA_DIR` to keep the data between runs; a second
//! run then starts with the session restored and the signup rejected.

use anyhow::Context;
use authstore_core::logging::{init_logging_with_config, LogConfig};
use authstore_core::{Config, IdentityStore, ProfileUpdate, SignupRequest};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    let mut config = Config::from_env().context("loading configuration")?;
    init_logging_with_config(LogConfig::from_settings(&config.logging)?)?;
    authstore_core::metrics::init_metrics();

    // Without an explicit data dir, run in a throwaway directory
    let _scratch = match std::env::var_os("AUTHSTORE_STORE_DATA_DIR") {
        Some(_) => None,
        None => {
            let dir = tempfile::tempdir()?;
            config.store.data_dir = dir.path().to_path_buf();
            Some(dir)
        }
    };

    let mut store =
        IdentityStore::from_config(&config.store).context("opening identity store")?;
    info!(
        backend = %config.store.backend,
        data_dir = %config.store.data_dir.display(),
        authenticated = store.is_authenticated(),
        "store ready"
    );

    match store.signup(SignupRequest::new("Jo", "jo@x.com", "secret1", "1234567890")) {
        Ok(jo) => info!(account_id = %jo.id, "signed up"),
        Err(e) => warn!(error = %e, "signup failed"),
    }

    store.logout()?;
    info!(authenticated = store.is_authenticated(), "logged out");

    if let Err(e) = store.login("jo@x.com", "wrong") {
        info!(error = %e, "login with the wrong password rejected");
    }

    let jo = store.login("jo@x.com", "secret1")?;
    info!(email = %jo.email, "logged in");

    let jo = store.update_profile(ProfileUpdate::new().phone("5550001111"))?;
    info!(phone = %jo.phone, "profile updated");

    let substrate = store.dispose();
    let restarted = IdentityStore::open(substrate, config.store.keys());
    info!(
        restored = ?restarted.current().map(|a| &a.email),
        "session after restart"
    );

    Ok(())
}
