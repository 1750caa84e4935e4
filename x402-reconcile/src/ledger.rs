//! Idempotent reconciliation of settled payments.
//!
//! Settlement notifications arrive more than once: transport retries,
//! duplicated webhooks, and polling overlap are expected, not exceptional.
//! [`ReconciliationLedger`] is the deduplication boundary — an append-only,
//! in-process store keyed by `(networkId, txHash)` that guarantees exactly one
//! [`ReconcileOutcome::NewlySettled`] per key, so downstream bookkeeping
//! credits a payment at most once.
//!
//! The ledger is sharded by key via [`DashMap`], so reconciliations of
//! unrelated keys never contend on a common lock, while the check-and-insert
//! for one key is atomic relative to concurrent callers of the same key.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

use crate::proto::Extensions;
use crate::record::SettlementRecord;

/// Composite ledger key: the network plus the transaction hash on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    /// Network where the settlement occurred.
    pub network_id: String,
    /// Transaction hash of the settled payment.
    pub tx_hash: String,
}

/// An immutable settlement fact.
///
/// Created on first reconciliation of a settled record, never mutated, never
/// deleted. The stored extension snapshot is the wire-level view at first
/// sight, used to detect contradictory later notifications.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    network_id: String,
    tx_hash: String,
    extensions: Extensions,
}

impl LedgerEntry {
    /// Returns the network where the settlement occurred.
    #[must_use]
    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    /// Returns the transaction hash.
    #[must_use]
    pub fn tx_hash(&self) -> &str {
        &self.tx_hash
    }

    /// Returns the extension snapshot recorded at first reconciliation.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the entry's composite key.
    #[must_use]
    pub fn key(&self) -> LedgerKey {
        LedgerKey {
            network_id: self.network_id.clone(),
            tx_hash: self.tx_hash.clone(),
        }
    }
}

/// Why a record was rejected without entering the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RejectReason {
    /// The record's outcome is `Failed`; only settled facts are ledgered.
    NotSettled,
}

/// Result of reconciling a settlement record.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ReconcileOutcome {
    /// First sighting of this `(networkId, txHash)` pair; the entry was
    /// created. Produced exactly once per key.
    NewlySettled(Arc<LedgerEntry>),
    /// The pair was already ledgered with identical data — a benign duplicate.
    AlreadySettled(Arc<LedgerEntry>),
    /// The record never entered the ledger.
    Rejected(RejectReason),
}

impl ReconcileOutcome {
    /// Returns `true` if this reconciliation created the ledger entry.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::NewlySettled(_))
    }
}

/// Fatal reconciliation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ReconcileError {
    /// The same `(networkId, txHash)` pair arrived with contradictory data.
    ///
    /// Settlement facts are never mutated; this indicates a facilitator or
    /// protocol bug and requires operator attention. The stored entry is left
    /// untouched.
    #[error("conflicting settlement data for tx `{tx_hash}` on network `{network_id}`")]
    ConflictingSettlement {
        /// Network of the conflicting notification.
        network_id: String,
        /// Transaction hash of the conflicting notification.
        tx_hash: String,
    },
}

/// Append-only, concurrency-safe store of settlement facts.
///
/// # Example
///
/// ```rust
/// use x402_reconcile::ledger::ReconciliationLedger;
/// use x402_reconcile::proto::RawSettlementPayload;
/// use x402_reconcile::validator::SettlementValidator;
///
/// let ledger = ReconciliationLedger::new();
/// let record = SettlementValidator::new()
///     .validate(RawSettlementPayload::settled("0xabc", "base"))
///     .unwrap();
///
/// assert!(ledger.reconcile(&record).unwrap().is_new());
/// assert!(!ledger.reconcile(&record).unwrap().is_new());
/// assert_eq!(ledger.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ReconciliationLedger {
    entries: DashMap<LedgerKey, Arc<LedgerEntry>>,
}

impl ReconciliationLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a settlement record to the ledger.
    ///
    /// Failed records are rejected with [`RejectReason::NotSettled`] and never
    /// touch the ledger. For settled records the lookup-and-insert is atomic
    /// per key: of any number of concurrent calls for a new key, exactly one
    /// observes [`ReconcileOutcome::NewlySettled`].
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ConflictingSettlement`] if the key is already
    /// ledgered with different data. The stored entry is not overwritten.
    pub fn reconcile(
        &self,
        record: &SettlementRecord,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let SettlementRecord::Settled {
            tx_hash,
            network_id,
            extensions,
        } = record
        else {
            return Ok(ReconcileOutcome::Rejected(RejectReason::NotSettled));
        };

        let key = LedgerKey {
            network_id: network_id.clone(),
            tx_hash: tx_hash.clone(),
        };
        let incoming = extensions.raw_view();

        // The entry guard holds the shard lock across the check-and-insert.
        match self.entries.entry(key) {
            Entry::Occupied(occupied) => {
                let stored = Arc::clone(occupied.get());
                if stored.extensions == incoming {
                    Ok(ReconcileOutcome::AlreadySettled(stored))
                } else {
                    #[cfg(feature = "telemetry")]
                    tracing::error!(
                        network_id = %stored.network_id,
                        tx_hash = %stored.tx_hash,
                        "conflicting settlement notification for an existing ledger entry"
                    );
                    Err(ReconcileError::ConflictingSettlement {
                        network_id: stored.network_id.clone(),
                        tx_hash: stored.tx_hash.clone(),
                    })
                }
            }
            Entry::Vacant(vacant) => {
                let entry = Arc::new(LedgerEntry {
                    network_id: network_id.clone(),
                    tx_hash: tx_hash.clone(),
                    extensions: incoming,
                });
                vacant.insert(Arc::clone(&entry));
                #[cfg(feature = "telemetry")]
                tracing::debug!(
                    network_id = %entry.network_id,
                    tx_hash = %entry.tx_hash,
                    "new settlement ledgered"
                );
                Ok(ReconcileOutcome::NewlySettled(entry))
            }
        }
    }

    /// Looks up a ledgered settlement by network and transaction hash.
    #[must_use]
    pub fn get(&self, network_id: &str, tx_hash: &str) -> Option<Arc<LedgerEntry>> {
        let key = LedgerKey {
            network_id: network_id.to_owned(),
            tx_hash: tx_hash.to_owned(),
        };
        self.entries.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the number of ledgered settlements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been ledgered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::DecodedExtensions;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn settled(tx_hash: &str, network_id: &str, extensions: Extensions) -> SettlementRecord {
        SettlementRecord::Settled {
            tx_hash: tx_hash.into(),
            network_id: network_id.into(),
            extensions: DecodedExtensions::from_raw(extensions),
        }
    }

    fn ext(entries: &[(&str, serde_json::Value)]) -> Extensions {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let ledger = ReconciliationLedger::new();
        let record = settled("0xabc", "base", ext(&[("foo", json!(1))]));

        let first = ledger.reconcile(&record).unwrap();
        assert!(matches!(first, ReconcileOutcome::NewlySettled(_)));

        let second = ledger.reconcile(&record).unwrap();
        assert!(matches!(second, ReconcileOutcome::AlreadySettled(_)));

        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_failed_record_is_rejected() {
        let ledger = ReconciliationLedger::new();
        let record = SettlementRecord::Failed {
            error_message: "insufficient funds".into(),
            extensions: DecodedExtensions::default(),
        };
        let outcome = ledger.reconcile(&record).unwrap();
        assert!(matches!(
            outcome,
            ReconcileOutcome::Rejected(RejectReason::NotSettled)
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_conflicting_data_is_fatal_and_preserves_entry() {
        let ledger = ReconciliationLedger::new();
        let original = settled("0xabc", "base", ext(&[("foo", json!(1))]));
        let contradictory = settled("0xabc", "base", ext(&[("foo", json!(2))]));

        ledger.reconcile(&original).unwrap();
        let err = ledger.reconcile(&contradictory).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::ConflictingSettlement {
                network_id: "base".into(),
                tx_hash: "0xabc".into(),
            }
        );

        // The original fact is untouched.
        let entry = ledger.get("base", "0xabc").unwrap();
        assert_eq!(entry.extensions().get("foo"), Some(&json!(1)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_same_hash_different_networks_are_distinct() {
        let ledger = ReconciliationLedger::new();
        let base = settled("0xabc", "base", Extensions::new());
        let polygon = settled("0xabc", "polygon", Extensions::new());

        assert!(ledger.reconcile(&base).unwrap().is_new());
        assert!(ledger.reconcile(&polygon).unwrap().is_new());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_concurrent_reconcile_has_single_winner() {
        let ledger = ReconciliationLedger::new();
        let record = settled("0xabc", "base", ext(&[("foo", json!(1))]));
        let wins = AtomicUsize::new(0);
        let duplicates = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| match ledger.reconcile(&record).unwrap() {
                    ReconcileOutcome::NewlySettled(_) => {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                    ReconcileOutcome::AlreadySettled(_) => {
                        duplicates.fetch_add(1, Ordering::SeqCst);
                    }
                    ReconcileOutcome::Rejected(_) => panic!("settled record rejected"),
                });
            }
        });

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert_eq!(duplicates.load(Ordering::SeqCst), 7);
        assert_eq!(ledger.len(), 1);
    }
}
