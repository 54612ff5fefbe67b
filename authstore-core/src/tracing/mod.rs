//! Spans around identity store operations
//!
//! Each operation runs inside an entered `identity` span, so every event the
//! store logs while it runs carries the operation name. The span's `outcome`
//! field is filled in when the operation finishes.

use std::time::Instant;
use tracing::field::Empty;
use tracing::span::EnteredSpan;
use tracing::{debug, debug_span};

/// An entered operation span with its start time
pub struct TracedOperation {
    span: EnteredSpan,
    start: Instant,
}

impl TracedOperation {
    /// Open and enter the span for `operation`
    pub fn enter(operation: &'static str) -> Self {
        let span = debug_span!("identity", op = operation, outcome = Empty).entered();
        Self {
            span,
            start: Instant::now(),
        }
    }

    pub fn record_event(&self, event: &str) {
        debug!(event, "step");
    }

    /// Mark the operation failed. The span closes when `self` drops.
    pub fn record_error(&self, error: &str) {
        self.span.record("outcome", "error");
        debug!(error, "operation failed");
    }

    pub fn complete(self) {
        self.span.record("outcome", "ok");
        debug!(
            elapsed_us = self.start.elapsed().as_micros() as u64,
            "operation completed"
        );
    }
}

/// One constructor per store operation
pub mod identity {
    use super::TracedOperation;

    pub fn trace_restore(session_key: &str) -> TracedOperation {
        let op = TracedOperation::enter("restore");
        op.record_event(session_key);
        op
    }

    pub fn trace_signup(directory_key: &str) -> TracedOperation {
        let op = TracedOperation::enter("signup");
        op.record_event(directory_key);
        op
    }

    pub fn trace_login(directory_key: &str) -> TracedOperation {
        let op = TracedOperation::enter("login");
        op.record_event(directory_key);
        op
    }

    pub fn trace_logout(session_key: &str) -> TracedOperation {
        let op = TracedOperation::enter("logout");
        op.record_event(session_key);
        op
    }

    pub fn trace_update_profile(account_id: u64) -> TracedOperation {
        let op = TracedOperation::enter("update_profile");
        tracing::debug!(account_id, "updating profile");
        op
    }
}
