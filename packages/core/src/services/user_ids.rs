//! User identifier generation
//!
//! Identifiers have the form `u<unix-millis>`. The generator never hands out
//! the same value twice: when the clock has not advanced past the last issued
//! value (same millisecond, or the clock stepped back) it issues
//! `last + 1` instead.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

const USER_ID_PREFIX: &str = "u";

/// Monotonic, timestamp-derived user identifiers
#[derive(Debug, Default)]
pub struct UserIdGenerator {
    last: AtomicI64,
}

impl UserIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier derived from the current time
    pub fn next_id(&self) -> String {
        self.next_id_at(Utc::now())
    }

    /// Identifier derived from a caller-supplied timestamp
    pub fn next_id_at(&self, now: DateTime<Utc>) -> String {
        let candidate = now.timestamp_millis();
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let issued = candidate.max(last + 1);
            match self
                .last
                .compare_exchange(last, issued, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return format!("{}{}", USER_ID_PREFIX, issued),
                Err(current) => last = current,
            }
        }
    }
}
