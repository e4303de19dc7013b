//! Time-bounded set of revoked token identities.
//!
//! Entries expire `retention` after they were recorded, or later when the
//! caller asks for a longer hold. Expired entries are never reported as
//! revoked, and are dropped either lazily on insert or by an explicit purge,
//! so memory tracks the revocation rate rather than the number of tokens
//! ever issued.

use crate::jwt::TokenIdentity;
use crate::metrics::{REVOCATIONS_PURGED, REVOCATION_ENTRIES};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// A single revocation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevocationEntry {
    pub recorded_at: Instant,
    /// `None` when the deadline is past what `Instant` can represent.
    pub expires_at: Option<Instant>,
}

impl RevocationEntry {
    fn new(recorded_at: Instant, hold: Duration) -> Self {
        RevocationEntry {
            recorded_at,
            expires_at: recorded_at.checked_add(hold),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

pub struct RevocationStore {
    entries: RwLock<HashMap<TokenIdentity, RevocationEntry>>,
    retention: Duration,
    sweep_interval: Duration,
    last_sweep: Mutex<Instant>,
}

impl RevocationStore {
    pub fn new(retention: Duration, sweep_interval: Duration) -> Self {
        RevocationStore {
            entries: RwLock::new(HashMap::new()),
            retention,
            sweep_interval,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Record `identity` as revoked as of `now` for the store's retention.
    ///
    /// Re-inserting a known identity restarts its retention window.
    pub fn insert(&self, identity: TokenIdentity, now: Instant) {
        self.insert_for(identity, now, self.retention);
    }

    /// Record `identity` as revoked for at least `hold`, and never less
    /// than the store's retention.
    ///
    /// An existing entry is only ever extended, never shortened.
    pub fn insert_for(&self, identity: TokenIdentity, now: Instant, hold: Duration) {
        let entry = RevocationEntry::new(now, hold.max(self.retention));

        let mut entries = self.entries.write();
        match entries.get_mut(&identity) {
            Some(existing) => {
                existing.recorded_at = now;
                if existing.expires_at.is_some_and(|current| {
                    entry.expires_at.map_or(true, |next| next > current)
                }) {
                    existing.expires_at = entry.expires_at;
                }
            }
            None => {
                entries.insert(identity, entry);
                REVOCATION_ENTRIES.inc();
            }
        }

        let mut last_sweep = self.last_sweep.lock();
        if now.saturating_duration_since(*last_sweep) >= self.sweep_interval {
            *last_sweep = now;
            drop(last_sweep);
            self.purge_locked(&mut entries, now);
        }
    }

    /// True iff `identity` was revoked and its hold has not elapsed.
    pub fn contains(&self, identity: &TokenIdentity, now: Instant) -> bool {
        self.entries
            .read()
            .get(identity)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Drop every entry whose hold has elapsed, returning how many.
    pub fn purge_expired(&self, now: Instant) -> usize {
        *self.last_sweep.lock() = now;
        let mut entries = self.entries.write();
        self.purge_locked(&mut entries, now)
    }

    /// Number of entries held, including any not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn purge_locked(&self, entries: &mut HashMap<TokenIdentity, RevocationEntry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let purged = before - entries.len();

        if purged > 0 {
            REVOCATION_ENTRIES.sub(purged as i64);
            REVOCATIONS_PURGED.inc_by(purged as u64);
            debug!(purged, remaining = entries.len(), "Purged expired revocations");
        }
        purged
    }
}

impl Drop for RevocationStore {
    fn drop(&mut self) {
        REVOCATION_ENTRIES.sub(self.entries.get_mut().len() as i64);
    }
}
