//! Counting-session domain store.
//!
//! Holds the round in progress plus everything that survives a restart. The
//! round's progress (`current_count`) is never written out.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::dhikr::DEFAULT_DHIKR_ID;
use crate::error::Result;
use crate::gesture::CountSink;
use crate::storage::{PersistedSession, SessionStorage};

pub const ALLOWED_TARGETS: [u32; 5] = [33, 99, 100, 500, 1000];
pub const DEFAULT_TARGET: u32 = ALLOWED_TARGETS[0];
/// Completed rounds kept in history
pub const HISTORY_LIMIT: usize = 50;

pub fn is_allowed_target(target: u32) -> bool {
    ALLOWED_TARGETS.contains(&target)
}

/// One archived, completed round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub count: u32,
    pub target: u32,
    pub dhikr: String,
    pub completed_at: DateTime<Local>,
}

impl SessionRecord {
    pub fn new(count: u32, target: u32, dhikr: impl Into<String>, completed_at: DateTime<Local>) -> Self {
        Self {
            id: format!("round_{}", Ulid::new().to_string().to_lowercase()),
            count,
            target,
            dhikr: dhikr.into(),
            completed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterSession {
    pub current_count: u32,
    pub current_target: u32,
    pub current_dhikr: String,
    /// Newest first, at most [`HISTORY_LIMIT`] entries
    pub sessions: Vec<SessionRecord>,
    pub total_lifetime_count: u64,
    pub haptic_enabled: bool,
}

impl Default for CounterSession {
    fn default() -> Self {
        Self {
            current_count: 0,
            current_target: DEFAULT_TARGET,
            current_dhikr: DEFAULT_DHIKR_ID.to_string(),
            sessions: Vec::new(),
            total_lifetime_count: 0,
            haptic_enabled: true,
        }
    }
}

impl From<PersistedSession> for CounterSession {
    fn from(p: PersistedSession) -> Self {
        let current_target = if is_allowed_target(p.current_target) {
            p.current_target
        } else {
            warn!(requested = p.current_target, "persisted target not allowed, using default");
            DEFAULT_TARGET
        };
        let mut sessions = p.sessions;
        sessions.truncate(HISTORY_LIMIT);

        Self {
            current_count: 0,
            current_target,
            current_dhikr: p.current_dhikr,
            sessions,
            total_lifetime_count: p.total_lifetime_count,
            haptic_enabled: p.haptic_enabled,
        }
    }
}

impl From<&CounterSession> for PersistedSession {
    fn from(s: &CounterSession) -> Self {
        Self {
            current_target: s.current_target,
            current_dhikr: s.current_dhikr.clone(),
            sessions: s.sessions.clone(),
            total_lifetime_count: s.total_lifetime_count,
            haptic_enabled: s.haptic_enabled,
        }
    }
}

/// Owner of the [`CounterSession`]. Every mutation writes the durable fields
/// through `S`; a failed write is retried on the next mutation.
#[derive(Debug)]
pub struct CountingSessionStore<S: SessionStorage> {
    session: CounterSession,
    storage: S,
    pending_flush: bool,
}

impl<S: SessionStorage> CountingSessionStore<S> {
    /// Restore from `storage`, or start from defaults when it is empty or unreadable
    pub fn load(storage: S) -> Self {
        let session = match storage.load() {
            Ok(Some(persisted)) => {
                let session = CounterSession::from(persisted);
                info!(
                    round_target = session.current_target,
                    dhikr = %session.current_dhikr,
                    rounds = session.sessions.len(),
                    lifetime = session.total_lifetime_count,
                    "session restored"
                );
                session
            }
            Ok(None) => {
                info!("no saved session, starting fresh");
                CounterSession::default()
            }
            Err(e) => {
                warn!(error = %e, "failed to read saved session, starting fresh");
                CounterSession::default()
            }
        };

        Self {
            session,
            storage,
            pending_flush: false,
        }
    }

    /// Count one bead. Returns true when this count completed the round.
    pub fn increment(&mut self) -> bool {
        let next = self.session.current_count + 1;
        self.session.total_lifetime_count = self.session.total_lifetime_count.saturating_add(1);

        let completed = next >= self.session.current_target;
        if completed {
            let record = SessionRecord::new(
                next,
                self.session.current_target,
                self.session.current_dhikr.clone(),
                Local::now(),
            );
            debug!(id = %record.id, count = next, dhikr = %record.dhikr, "round completed");
            self.session.sessions.insert(0, record);
            self.session.sessions.truncate(HISTORY_LIMIT);
            self.session.current_count = 0;
        } else {
            self.session.current_count = next;
        }

        self.persist();
        completed
    }

    /// Abandon the round in progress. History and lifetime are untouched.
    pub fn reset(&mut self) {
        self.session.current_count = 0;
        self.persist();
    }

    /// Switch target; values outside [`ALLOWED_TARGETS`] are ignored.
    /// Returns whether the target was applied.
    pub fn set_target(&mut self, target: u32) -> bool {
        if !is_allowed_target(target) {
            debug!(requested = target, "ignoring target outside allowed set");
            return false;
        }
        self.session.current_target = target;
        self.session.current_count = 0;
        self.persist();
        true
    }

    /// Move to the next allowed target, wrapping around
    pub fn cycle_target(&mut self) -> u32 {
        let next = ALLOWED_TARGETS
            .iter()
            .position(|&t| t == self.session.current_target)
            .map_or(DEFAULT_TARGET, |i| ALLOWED_TARGETS[(i + 1) % ALLOWED_TARGETS.len()]);
        self.set_target(next);
        next
    }

    /// Select a phrase. Re-selecting the current one keeps the round going.
    /// Returns whether the selection changed.
    pub fn set_dhikr(&mut self, id: &str) -> bool {
        if id == self.session.current_dhikr {
            return false;
        }
        self.session.current_dhikr = id.to_string();
        self.session.current_count = 0;
        self.persist();
        true
    }

    /// Returns the new value
    pub fn toggle_haptic(&mut self) -> bool {
        self.session.haptic_enabled = !self.session.haptic_enabled;
        self.persist();
        self.session.haptic_enabled
    }

    /// Write the durable fields now, reporting failure to the caller
    pub fn flush(&mut self) -> Result<()> {
        let persisted = PersistedSession::from(&self.session);
        self.storage.save(&persisted)?;
        self.pending_flush = false;
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "failed to save session, will retry on next change");
            self.pending_flush = true;
        }
    }

    pub fn session(&self) -> &CounterSession {
        &self.session
    }

    pub fn current_count(&self) -> u32 {
        self.session.current_count
    }

    pub fn current_target(&self) -> u32 {
        self.session.current_target
    }

    pub fn current_dhikr(&self) -> &str {
        &self.session.current_dhikr
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.session.sessions
    }

    pub fn total_lifetime_count(&self) -> u64 {
        self.session.total_lifetime_count
    }

    pub fn haptic_enabled(&self) -> bool {
        self.session.haptic_enabled
    }

    /// Beads left in this round
    pub fn remaining(&self) -> u32 {
        self.session.current_target.saturating_sub(self.session.current_count)
    }

    /// Fraction of the round done, in `[0, 1)`
    pub fn progress(&self) -> f64 {
        self.session.current_count as f64 / self.session.current_target as f64
    }

    /// True while the last write failed and has not been retried successfully
    pub fn has_pending_flush(&self) -> bool {
        self.pending_flush
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

impl<S: SessionStorage> CountSink for CountingSessionStore<S> {
    fn increment(&mut self) -> bool {
        CountingSessionStore::increment(self)
    }
}
