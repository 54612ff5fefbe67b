//! Metrics for identity store operations
//!
//! Counters go through the `metrics` facade and are no-ops until the
//! embedding application installs a recorder.

use metrics::{counter, describe_counter};

pub const SIGNUP_SUCCESS: &str = "identity.signup.success";
pub const SIGNUP_DUPLICATE: &str = "identity.signup.duplicate";
pub const LOGIN_SUCCESS: &str = "identity.login.success";
pub const LOGIN_FAILED: &str = "identity.login.failed";
pub const LOGOUT: &str = "identity.logout";
pub const PROFILE_UPDATED: &str = "identity.profile.updated";
pub const RESTORE_RESTORED: &str = "identity.restore.restored";
pub const RESTORE_EMPTY: &str = "identity.restore.empty";
pub const RESTORE_DISCARDED: &str = "identity.restore.discarded";
pub const PERSISTENCE_FAILED: &str = "identity.persistence.failed";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(SIGNUP_SUCCESS, "Accounts created");
    describe_counter!(SIGNUP_DUPLICATE, "Signups rejected for a duplicate email");
    describe_counter!(LOGIN_SUCCESS, "Successful logins");
    describe_counter!(LOGIN_FAILED, "Logins rejected for invalid credentials");
    describe_counter!(LOGOUT, "Logout calls");
    describe_counter!(PROFILE_UPDATED, "Profile updates persisted");
    describe_counter!(RESTORE_RESTORED, "Startups that restored a session");
    describe_counter!(RESTORE_EMPTY, "Startups with no stored session");
    describe_counter!(RESTORE_DISCARDED, "Startups that discarded a corrupted session");
    describe_counter!(PERSISTENCE_FAILED, "Substrate reads or writes that failed");
}

/// Record a counter metric
pub fn record_counter(name: &'static str) {
    counter!(name).increment(1);
}
