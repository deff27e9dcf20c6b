//! Message conservation ledger.
//!
//! Every emitted message ends up handled, pending or dropped, so
//! `created == handled + dropped + pending` at every observation point.
//! Pending is never stored: it is read off the inboxes on demand.

use std::fmt;

use serde::Serialize;

use crate::core::routing::DropReason;
use crate::core::scheduler::Registry;
use crate::error::{Error, Result};

/// Monotonic message counters.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    created: u64,
    enqueued: u64,
    handled: u64,
    rejected: u64,
    overflowed: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_created(&mut self) {
        self.created += 1;
    }

    pub(crate) fn record_enqueued(&mut self) {
        self.enqueued += 1;
    }

    pub(crate) fn record_handled(&mut self) {
        self.handled += 1;
    }

    pub(crate) fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::CapabilityRejected => self.rejected += 1,
            DropReason::InboxOverflow => self.overflowed += 1,
        }
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn enqueued(&self) -> u64 {
        self.enqueued
    }

    pub fn handled(&self) -> u64 {
        self.handled
    }

    pub fn dropped(&self) -> u64 {
        self.rejected + self.overflowed
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn overflowed(&self) -> u64 {
        self.overflowed
    }

    /// Snapshot the counters against an externally computed pending count.
    pub fn snapshot(&self, pending: u64) -> LedgerSnapshot {
        let balance = self.created as i64
            - self.handled as i64
            - self.dropped() as i64
            - pending as i64;
        LedgerSnapshot {
            created: self.created,
            enqueued: self.enqueued,
            handled: self.handled,
            dropped: self.dropped(),
            rejected: self.rejected,
            overflowed: self.overflowed,
            pending,
            balance,
        }
    }

    /// Snapshot against the registry's inboxes.
    pub fn report(&self, registry: &Registry) -> LedgerSnapshot {
        self.snapshot(pending_messages(registry))
    }

    /// Like [`Ledger::report`], but a nonzero balance is an error.
    pub fn reconcile(&self, registry: &Registry) -> Result<LedgerSnapshot> {
        let snapshot = self.report(registry);
        if !snapshot.is_balanced() {
            tracing::warn!(%snapshot, "Message ledger does not balance");
            return Err(Error::Imbalance {
                created: snapshot.created,
                handled: snapshot.handled,
                dropped: snapshot.dropped,
                pending: snapshot.pending,
                balance: snapshot.balance,
            });
        }
        Ok(snapshot)
    }
}

/// Sum of occupied inbox slots across the registry.
pub fn pending_messages(registry: &Registry) -> u64 {
    registry.iter().map(|agent| agent.inbox().len() as u64).sum()
}

/// Point-in-time ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub created: u64,
    pub enqueued: u64,
    pub handled: u64,
    pub dropped: u64,
    pub rejected: u64,
    pub overflowed: u64,
    pub pending: u64,
    pub balance: i64,
}

impl LedgerSnapshot {
    pub fn is_balanced(&self) -> bool {
        self.balance == 0
    }
}

impl fmt::Display for LedgerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[MSG_BALANCE] created={} enqueued={} handled={} dropped={} pending={} balance={}",
            self.created, self.enqueued, self.handled, self.dropped, self.pending, self.balance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_balance() {
        let mut ledger = Ledger::new();
        for _ in 0..5 {
            ledger.record_created();
        }
        ledger.record_enqueued();
        ledger.record_enqueued();
        ledger.record_enqueued();
        ledger.record_handled();
        ledger.record_drop(DropReason::CapabilityRejected);
        ledger.record_drop(DropReason::InboxOverflow);

        let snap = ledger.snapshot(2);
        assert_eq!(snap.dropped, 2);
        assert_eq!(snap.rejected, 1);
        assert_eq!(snap.overflowed, 1);
        assert!(snap.is_balanced());

        let off = ledger.snapshot(1);
        assert_eq!(off.balance, 1);
        assert!(!off.is_balanced());
    }

    #[test]
    fn test_reconcile_flags_imbalance() {
        let mut ledger = Ledger::new();
        ledger.record_created();

        let registry = Registry::new(4);
        let err = ledger.reconcile(&registry).unwrap_err();
        assert!(matches!(err, Error::Imbalance { balance: 1, .. }));

        ledger.record_drop(DropReason::CapabilityRejected);
        assert!(ledger.reconcile(&registry).unwrap().is_balanced());
    }

    #[test]
    fn test_display_line() {
        let snap = Ledger::new().snapshot(0);
        assert_eq!(
            snap.to_string(),
            "[MSG_BALANCE] created=0 enqueued=0 handled=0 dropped=0 pending=0 balance=0"
        );
    }
}
