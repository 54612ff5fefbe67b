//! Test fixtures for creating common test objects

use chrono::{TimeZone, Utc};
use serde_json::Map;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::identity::{
    Account, AccountId, CreatedAt, IdGenerator, IdentityStore, SignupRequest, StoreKeys,
};
use crate::substrate::MemorySubstrate;

/// Builder for signup input
pub struct TestSignupBuilder {
    full_name: String,
    email: String,
    password: String,
    phone: String,
}

impl TestSignupBuilder {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            full_name: "Test User".to_string(),
            email: email.into(),
            password: "secret1".to_string(),
            phone: "1234567890".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = name.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn build(self) -> SignupRequest {
        SignupRequest::new(self.full_name, self.email, self.password, self.phone)
    }
}

/// Builder for accounts written straight into a substrate, bypassing the store
pub struct TestAccountBuilder {
    id: u64,
    email: String,
    full_name: String,
}

impl TestAccountBuilder {
    pub fn new(id: u64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            full_name: "Test User".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = name.into();
        self
    }

    pub fn build(self) -> Account {
        Account {
            id: AccountId(self.id),
            full_name: self.full_name,
            email: self.email,
            password: "secret1".to_string(),
            phone: "1234567890".to_string(),
            created_at: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .map(CreatedAt::from_datetime),
            extra: Map::new(),
        }
    }
}

// Quick fixture functions for common test objects

/// The "Jo" signup used throughout the acceptance scenario
pub fn jo_signup() -> SignupRequest {
    SignupRequest::new("Jo", "jo@x.com", "secret1", "1234567890")
}

pub fn test_signup(email: &str) -> SignupRequest {
    TestSignupBuilder::new(email).build()
}

/// Id generator whose clock never advances; ids still increase by one
pub fn frozen_ids(at: u64) -> IdGenerator {
    IdGenerator::with_clock(move || at)
}

/// Id generator driven by a shared counter the test can move
pub fn manual_ids() -> (IdGenerator, Arc<AtomicU64>) {
    let now = Arc::new(AtomicU64::new(1_000));
    let clock = now.clone();
    (IdGenerator::with_clock(move || clock.load(Ordering::SeqCst)), now)
}

/// Restored store over a fresh memory substrate, plus a handle to that
/// substrate for inspecting or "restarting" it
pub fn memory_store() -> (IdentityStore<MemorySubstrate>, MemorySubstrate) {
    let substrate = MemorySubstrate::new();
    let store = IdentityStore::open(substrate.clone(), StoreKeys::default());
    (store, substrate)
}

/// Simulated process restart: a new store over the same substrate
pub fn restart(substrate: &MemorySubstrate) -> IdentityStore<MemorySubstrate> {
    IdentityStore::open(substrate.clone(), StoreKeys::default())
}
