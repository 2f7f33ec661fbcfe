//! Bookkeeping for transactions started by this process.
//!
//! The Data API rolls a transaction back once it has been idle for three
//! minutes. The tracker mirrors that so a statement aimed at a finished or
//! expired transaction fails locally instead of reaching the backend.
//! Statements naming an id this process never saw pass through, but a
//! successful commit or rollback of such an id is recorded like any other.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domains::tools::{ToolError, TransactionState};

/// Idle timeout the Data API applies to open transactions.
pub const DATA_API_IDLE_TIMEOUT: Duration = Duration::from_secs(180);

/// How long finished transactions are remembered.
const RETENTION: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy)]
struct Entry {
    state: TransactionState,
    last_used: Instant,
}

#[derive(Debug)]
pub struct TransactionTracker {
    idle_timeout: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for TransactionTracker {
    fn default() -> Self {
        Self::new(DATA_API_IDLE_TIMEOUT)
    }
}

impl TransactionTracker {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record a transaction returned by BeginTransaction.
    pub fn started(&self, transaction_id: &str) {
        self.started_at(transaction_id, Instant::now());
    }

    /// Fail if the transaction is known to be finished; otherwise mark it used.
    pub fn ensure_usable(&self, transaction_id: &str) -> Result<(), ToolError> {
        self.ensure_usable_at(transaction_id, Instant::now())
    }

    /// Record the outcome of a commit or rollback.
    pub fn finish(&self, transaction_id: &str, state: TransactionState) {
        self.finish_at(transaction_id, state, Instant::now());
    }

    pub fn state(&self, transaction_id: &str) -> Option<TransactionState> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(transaction_id).map(|entry| entry.state)
    }

    /// Expire idle transactions and forget finished ones past retention.
    fn prune(&self, entries: &mut HashMap<String, Entry>, now: Instant) {
        entries.retain(|_, entry| {
            let idle = now.saturating_duration_since(entry.last_used);
            if entry.state == TransactionState::Active && idle >= self.idle_timeout {
                entry.state = TransactionState::Expired;
            }
            entry.state == TransactionState::Active || idle < RETENTION
        });
    }

    fn started_at(&self, transaction_id: &str, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut entries, now);
        entries.insert(
            transaction_id.to_string(),
            Entry {
                state: TransactionState::Active,
                last_used: now,
            },
        );
    }

    fn finish_at(&self, transaction_id: &str, state: TransactionState, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut entries, now);
        entries.insert(
            transaction_id.to_string(),
            Entry {
                state,
                last_used: now,
            },
        );
    }

    fn ensure_usable_at(&self, transaction_id: &str, now: Instant) -> Result<(), ToolError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = entries.get_mut(transaction_id) else {
            return Ok(());
        };

        if entry.state == TransactionState::Active
            && now.saturating_duration_since(entry.last_used) >= self.idle_timeout
        {
            debug!("Transaction expired after idling");
            entry.state = TransactionState::Expired;
        }

        match entry.state {
            TransactionState::Active => {
                entry.last_used = now;
                Ok(())
            }
            state => Err(ToolError::TransactionState {
                transaction_id: transaction_id.to_string(),
                state,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ErrorKind;

    #[test]
    fn test_unknown_transactions_pass_through() {
        let tracker = TransactionTracker::default();
        assert!(tracker.ensure_usable("tx-from-elsewhere").is_ok());
        assert_eq!(tracker.state("tx-from-elsewhere"), None);
    }

    #[test]
    fn test_finished_transaction_rejected() {
        let tracker = TransactionTracker::default();
        tracker.started("tx-1");
        assert!(tracker.ensure_usable("tx-1").is_ok());

        tracker.finish("tx-1", TransactionState::Committed);
        let err = tracker.ensure_usable("tx-1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionStateError);
        assert!(err.to_string().contains("committed"));
    }

    #[test]
    fn test_idle_transaction_expires() {
        let tracker = TransactionTracker::new(Duration::from_secs(180));
        let start = Instant::now();
        tracker.started_at("tx-2", start);

        assert!(tracker.ensure_usable_at("tx-2", start + Duration::from_secs(170)).is_ok());
        // Use refreshed the idle clock.
        assert!(tracker.ensure_usable_at("tx-2", start + Duration::from_secs(340)).is_ok());

        let err = tracker
            .ensure_usable_at("tx-2", start + Duration::from_secs(600))
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::TransactionState { state: TransactionState::Expired, .. }
        ));
        assert_eq!(tracker.state("tx-2"), Some(TransactionState::Expired));
    }

    #[test]
    fn test_old_finished_entries_are_pruned() {
        let tracker = TransactionTracker::default();
        let start = Instant::now();
        tracker.started_at("old", start);
        tracker.finish_at("old", TransactionState::RolledBack, start);
        tracker.started_at("new", start + RETENTION + Duration::from_secs(1));
        assert_eq!(tracker.state("old"), None);
        assert_eq!(tracker.state("new"), Some(TransactionState::Active));
    }

    #[test]
    fn test_commit_of_untracked_id_is_recorded() {
        let tracker = TransactionTracker::default();
        tracker.finish("tx-elsewhere", TransactionState::Committed);
        assert_eq!(tracker.state("tx-elsewhere"), Some(TransactionState::Committed));
        let err = tracker.ensure_usable("tx-elsewhere").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionStateError);
    }

    #[test]
    fn test_abandoned_transactions_expire_then_age_out() {
        let tracker = TransactionTracker::new(Duration::from_secs(180));
        let start = Instant::now();
        tracker.started_at("abandoned", start);

        tracker.started_at("later", start + Duration::from_secs(200));
        assert_eq!(tracker.state("abandoned"), Some(TransactionState::Expired));
        assert_eq!(tracker.entries.lock().unwrap().len(), 2);

        tracker.started_at("much-later", start + RETENTION + Duration::from_secs(1));
        assert_eq!(tracker.state("abandoned"), None);
        assert_eq!(tracker.entries.lock().unwrap().len(), 2);
    }
}
