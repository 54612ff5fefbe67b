//! The identity store
//!
//! Owns two substrate keys: the account directory and the current session.
//! Every operation runs to completion synchronously. Writes always go
//! directory first, then session, so a crash between the two leaves a
//! registered account without a session (the user can still log in) and
//! never a session whose account was not recorded.

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{
    Account, AccountId, Directory, IdGenerator, IdentityError, IdentityResult, ProfileUpdate,
    SessionEvent, SessionEvents, SessionState, SignupRequest,
};
use crate::config::StoreConfig;
use crate::metrics::{self as counters, record_counter};
use crate::substrate::{open_substrate, Substrate, SubstrateError};
use crate::tracing::identity as trace;

/// Substrate keys used by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    /// Key holding the JSON array of all accounts
    pub directory: String,
    /// Key holding the JSON object of the logged-in account
    pub session: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            directory: "users".to_string(),
            session: "currentUser".to_string(),
        }
    }
}

/// What [`IdentityStore::restore`] found under the session key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No stored session
    Empty,
    /// A stored session was loaded
    Restored(AccountId),
    /// The stored value did not parse and was removed
    Discarded,
    /// The substrate could not be read; starting logged out
    Unreadable,
}

/// Client-resident identity store over a key-value substrate.
///
/// Lifecycle: [`IdentityStore::new`] → [`IdentityStore::restore`] →
/// operations → [`IdentityStore::dispose`]. [`IdentityStore::open`] combines
/// the first two.
pub struct IdentityStore<S: Substrate> {
    substrate: S,
    keys: StoreKeys,
    ids: IdGenerator,
    session: Option<Account>,
    restored: bool,
    state: watch::Sender<SessionState>,
    events: SessionEvents,
}

impl IdentityStore<Box<dyn Substrate>> {
    /// Open the substrate described by `config` and restore its session
    pub fn from_config(config: &StoreConfig) -> Result<Self, SubstrateError> {
        let substrate = open_substrate(config)?;
        let mut store = Self::new(substrate, config.keys());
        store.restore();
        Ok(store)
    }
}

impl<S: Substrate> IdentityStore<S> {
    /// Create a store without reading the substrate. Readers see
    /// `restored == false` until [`IdentityStore::restore`] runs.
    pub fn new(substrate: S, keys: StoreKeys) -> Self {
        let (state, _rx) = watch::channel(SessionState::default());
        Self {
            substrate,
            keys,
            ids: IdGenerator::new(),
            session: None,
            restored: false,
            state,
            events: SessionEvents::default(),
        }
    }

    /// [`IdentityStore::new`] followed by [`IdentityStore::restore`]
    pub fn open(substrate: S, keys: StoreKeys) -> Self {
        let mut store = Self::new(substrate, keys);
        store.restore();
        store
    }

    /// Replace the id generator (tests pin the clock with this)
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Load the persisted session into memory.
    ///
    /// Never fails: an unparseable value is removed and the store starts
    /// logged out. The stored account is trusted as-is; it is not checked
    /// against the directory.
    pub fn restore(&mut self) -> RestoreOutcome {
        let op = trace::trace_restore(&self.keys.session);

        let outcome = match self.substrate.get(&self.keys.session) {
            Ok(None) => {
                self.session = None;
                RestoreOutcome::Empty
            }
            Ok(Some(raw)) => match Account::from_json(&raw) {
                Ok(account) => {
                    let id = account.id;
                    self.session = Some(account);
                    RestoreOutcome::Restored(id)
                }
                Err(e) => {
                    warn!(key = %self.keys.session, error = %e, "discarding corrupted session");
                    op.record_error(&e.to_string());
                    if let Err(e) = self.substrate.remove(&self.keys.session) {
                        warn!(error = %e, "failed to remove corrupted session");
                        record_counter(counters::PERSISTENCE_FAILED);
                    }
                    self.session = None;
                    RestoreOutcome::Discarded
                }
            },
            Err(e) => {
                warn!(key = %self.keys.session, error = %e, "session unreadable, starting logged out");
                op.record_error(&e.to_string());
                record_counter(counters::PERSISTENCE_FAILED);
                self.session = None;
                RestoreOutcome::Unreadable
            }
        };

        record_counter(match outcome {
            RestoreOutcome::Restored(_) => counters::RESTORE_RESTORED,
            RestoreOutcome::Discarded => counters::RESTORE_DISCARDED,
            RestoreOutcome::Empty | RestoreOutcome::Unreadable => counters::RESTORE_EMPTY,
        });

        self.restored = true;
        self.publish();
        self.events.emit(SessionEvent::Restored(self.session.as_ref().map(|a| a.id)));

        info!(?outcome, "session restoration complete");
        op.complete();
        outcome
    }

    /// Register a new account and log it in
    pub fn signup(&mut self, request: SignupRequest) -> IdentityResult<Account> {
        let op = trace::trace_signup(&self.keys.directory);

        let (mut directory, previous) = self.load_directory()?;

        if directory.find_by_email(&request.email).is_some() {
            debug!("signup rejected: email already registered");
            record_counter(counters::SIGNUP_DUPLICATE);
            op.record_error("duplicate email");
            return Err(IdentityError::DuplicateEmail);
        }

        let floor = directory.max_id();
        let id = match self.ids.next(floor) {
            Some(id) => id,
            None => {
                let max = floor.unwrap_or(AccountId(u64::MAX));
                warn!(%max, "account id space exhausted");
                op.record_error("ids exhausted");
                return Err(IdentityError::IdsExhausted { max });
            }
        };
        let account = Account::create(id, request);

        directory.push(account.clone());
        self.commit(&directory, previous.as_deref(), &account)?;

        self.session = Some(account.clone());
        self.publish();
        self.events.emit(SessionEvent::SignedUp(account.clone()));
        record_counter(counters::SIGNUP_SUCCESS);

        info!(account_id = %id, directory_size = directory.len(), "account created");
        op.complete();
        Ok(account)
    }

    /// Log in with an exact email/password match
    pub fn login(&mut self, email: &str, password: &str) -> IdentityResult<Account> {
        let op = trace::trace_login(&self.keys.directory);

        let (directory, _) = self.load_directory()?;

        let account = match directory.find_by_credentials(email, password) {
            Some(account) => account.clone(),
            None => {
                debug!("login rejected");
                record_counter(counters::LOGIN_FAILED);
                op.record_error("invalid credentials");
                return Err(IdentityError::InvalidCredentials);
            }
        };

        self.write_session(&account)?;

        self.session = Some(account.clone());
        self.publish();
        self.events.emit(SessionEvent::LoggedIn(account.clone()));
        record_counter(counters::LOGIN_SUCCESS);

        info!(account_id = %account.id, "logged in");
        op.complete();
        Ok(account)
    }

    /// End the session. Calling it while logged out is a successful no-op.
    ///
    /// The in-memory session is cleared even when the substrate refuses to
    /// delete the key. With a session active the error is still returned, so
    /// the caller knows the session would come back after a restart; without
    /// one the failure is only logged.
    pub fn logout(&mut self) -> IdentityResult<()> {
        let op = trace::trace_logout(&self.keys.session);

        let removed = self.substrate.remove(&self.keys.session);
        let previous = self.session.take();

        self.publish();
        if let Some(account) = &previous {
            self.events.emit(SessionEvent::LoggedOut);
            info!(account_id = %account.id, "logged out");
        }
        record_counter(counters::LOGOUT);

        match removed {
            Err(e) if previous.is_none() => {
                debug!(error = %e, "no active session; ignoring failed key removal");
            }
            Err(e) => {
                warn!(error = %e, "failed to remove persisted session");
                record_counter(counters::PERSISTENCE_FAILED);
                op.record_error(&e.to_string());
                return Err(e.into());
            }
            Ok(()) => {}
        }

        op.complete();
        Ok(())
    }

    /// Change profile fields of the logged-in account.
    ///
    /// Fails with [`IdentityError::OrphanedSession`], writing nothing, when
    /// the directory has no entry with the session's id. An email change that
    /// collides with another account fails with
    /// [`IdentityError::DuplicateEmail`].
    pub fn update_profile(&mut self, update: ProfileUpdate) -> IdentityResult<Account> {
        let current = self.session.as_ref().ok_or(IdentityError::NoActiveSession)?;
        let op = trace::trace_update_profile(current.id.as_u64());

        let merged = update.apply_to(current);

        let (mut directory, previous) = self.load_directory()?;

        let index = match directory.position(merged.id) {
            Some(index) => index,
            None => {
                warn!(account_id = %merged.id, "session account missing from directory");
                op.record_error("orphaned session");
                return Err(IdentityError::OrphanedSession { id: merged.id });
            }
        };

        if directory.email_taken_by_other(&merged.email, merged.id) {
            debug!(account_id = %merged.id, "profile update rejected: email in use");
            op.record_error("duplicate email");
            return Err(IdentityError::DuplicateEmail);
        }

        directory.replace(index, merged.clone());
        self.commit(&directory, previous.as_deref(), &merged)?;

        self.session = Some(merged.clone());
        self.publish();
        self.events.emit(SessionEvent::ProfileUpdated(merged.clone()));
        record_counter(counters::PROFILE_UPDATED);

        info!(account_id = %merged.id, "profile updated");
        op.complete();
        Ok(merged)
    }

    /// Logged-in account, if any
    pub fn current(&self) -> Option<&Account> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Whether [`IdentityStore::restore`] has run
    pub fn is_restored(&self) -> bool {
        self.restored
    }

    /// Snapshot of the current state plus a receiver for later changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Discrete session transitions from now on
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// All registered accounts, in signup order
    pub fn accounts(&self) -> IdentityResult<Vec<Account>> {
        Ok(self.load_directory()?.0.into_accounts())
    }

    pub fn find_by_email(&self, email: &str) -> IdentityResult<Option<Account>> {
        Ok(self.load_directory()?.0.find_by_email(email).cloned())
    }

    pub fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    /// Drop the in-memory state and hand the substrate back. Persisted state
    /// is left untouched; event subscribers see their channel close.
    pub fn dispose(self) -> S {
        debug!("identity store disposed");
        self.substrate
    }

    /// Read the directory together with its raw stored value, which
    /// [`IdentityStore::commit`] needs to roll back.
    fn load_directory(&self) -> IdentityResult<(Directory, Option<String>)> {
        let raw = self.substrate.get(&self.keys.directory).map_err(|e| {
            record_counter(counters::PERSISTENCE_FAILED);
            IdentityError::from(e)
        })?;

        let directory = match raw.as_deref() {
            None => Directory::new(),
            Some(raw) => Directory::parse(raw).map_err(|e| {
                warn!(key = %self.keys.directory, error = %e, "stored directory does not parse");
                IdentityError::CorruptedDirectory(e.to_string())
            })?,
        };

        Ok((directory, raw))
    }

    fn write_session(&self, account: &Account) -> IdentityResult<()> {
        let json = account.to_json()?;
        self.substrate.set(&self.keys.session, &json).map_err(|e| {
            warn!(error = %e, "failed to persist session");
            record_counter(counters::PERSISTENCE_FAILED);
            IdentityError::from(e)
        })
    }

    /// Persist `directory`, then `session`. If the session write fails the
    /// directory is put back to `previous` so neither key reflects the
    /// operation.
    fn commit(
        &self,
        directory: &Directory,
        previous: Option<&str>,
        session: &Account,
    ) -> IdentityResult<()> {
        let directory_json = directory.to_json()?;
        self.substrate
            .set(&self.keys.directory, &directory_json)
            .map_err(|e| {
                warn!(error = %e, "failed to persist directory");
                record_counter(counters::PERSISTENCE_FAILED);
                IdentityError::from(e)
            })?;

        if let Err(err) = self.write_session(session) {
            let rollback = match previous {
                Some(raw) => self.substrate.set(&self.keys.directory, raw),
                None => self.substrate.remove(&self.keys.directory),
            };
            if let Err(e) = rollback {
                warn!(error = %e, "directory rollback failed; account stays registered without a session");
            }
            return Err(err);
        }

        Ok(())
    }

    fn publish(&self) {
        self.state.send_replace(SessionState {
            restored: self.restored,
            account: self.session.clone(),
        });
    }
}
