//! The account directory: every registered account, in signup order

use serde::{Deserialize, Serialize};

use super::{Account, AccountId};

/// Ordered accounts, serialized as a bare JSON array.
///
/// Invariant: no two entries share an `email` once an operation completes.
/// The store checks this before every write; the type itself only offers the
/// lookups needed to do so.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory {
    accounts: Vec<Account>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn into_accounts(self) -> Vec<Account> {
        self.accounts
    }

    /// First account with exactly this email (case-sensitive)
    pub fn find_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.email == email)
    }

    /// First account, in stored order, matching both fields exactly
    pub fn find_by_credentials(&self, email: &str, password: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.email == email && a.password == password)
    }

    pub fn position(&self, id: AccountId) -> Option<usize> {
        self.accounts.iter().position(|a| a.id == id)
    }

    /// True when an account other than `id` already uses `email`
    pub fn email_taken_by_other(&self, email: &str, id: AccountId) -> bool {
        self.accounts.iter().any(|a| a.email == email && a.id != id)
    }

    pub fn max_id(&self) -> Option<AccountId> {
        self.accounts.iter().map(|a| a.id).max()
    }

    pub fn push(&mut self, account: Account) {
        self.accounts.push(account);
    }

    /// Replace the entry at `index` in place, returning the old entry.
    ///
    /// Panics if `index` is out of bounds, like slice indexing.
    pub fn replace(&mut self, index: usize, account: Account) -> Account {
        std::mem::replace(&mut self.accounts[index], account)
    }
}
