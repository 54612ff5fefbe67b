//! Account id generation
//!
//! Ids are seeded from the wall clock (milliseconds since the epoch) so they
//! stay comparable with ids written by earlier clock-based writers, but each
//! id is forced above both the previous one handed out by this generator and
//! the largest id already in the directory. Two signups inside the same
//! millisecond, or a clock that steps backwards, still get distinct,
//! increasing ids.

use super::AccountId;
use chrono::Utc;

type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

fn wall_clock_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

pub struct IdGenerator {
    clock: Clock,
    last: Option<AccountId>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::with_clock(wall_clock_millis)
    }

    /// Generator reading time from `clock` instead of the system clock
    pub fn with_clock(clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            last: None,
        }
    }

    /// Next id, strictly greater than `floor` and than every id this
    /// generator returned before. `None` once no such id fits in a `u64`.
    pub fn next(&mut self, floor: Option<AccountId>) -> Option<AccountId> {
        let mut candidate = (self.clock)();

        for bound in [self.last, floor].into_iter().flatten() {
            candidate = candidate.max(bound.0.checked_add(1)?);
        }

        let id = AccountId(candidate);
        self.last = Some(id);
        Some(id)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
