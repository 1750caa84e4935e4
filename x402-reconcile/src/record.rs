//! Validated settlement records.
//!
//! A [`SettlementRecord`] is what a [`RawSettlementPayload`] becomes after
//! validation: either a settled payment identified by transaction hash and
//! network, or a failed attempt identified by an error message. The enum
//! representation makes the core invariant unrepresentable to violate —
//! exactly one of the two identities exists per record, never both, never
//! neither.
//!
//! [`RawSettlementPayload`]: crate::proto::RawSettlementPayload

use crate::extensions::DecodedExtensions;

/// The overall outcome of a settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettlementOutcome {
    /// The payment was finalized on the target network.
    Settled,
    /// The facilitator reported a settlement failure.
    Failed,
}

/// A validated, invariant-respecting settlement record.
///
/// Produced by [`SettlementValidator::validate`] and consumed by
/// [`ReconciliationLedger::reconcile`]. Both variants carry the response's
/// extension data; a failed settlement may still include forward-compatible
/// extension payloads.
///
/// [`SettlementValidator::validate`]: crate::validator::SettlementValidator::validate
/// [`ReconciliationLedger::reconcile`]: crate::ledger::ReconciliationLedger::reconcile
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SettlementRecord {
    /// Settlement succeeded on-chain.
    Settled {
        /// Transaction hash of the settled payment. Non-empty.
        tx_hash: String,
        /// Network where the settlement occurred. Non-empty.
        network_id: String,
        /// Decoded protocol extensions.
        extensions: DecodedExtensions,
    },
    /// Settlement failed.
    Failed {
        /// Facilitator-reported error message. Non-empty.
        error_message: String,
        /// Decoded protocol extensions.
        extensions: DecodedExtensions,
    },
}

impl SettlementRecord {
    /// Returns the outcome of this record.
    #[must_use]
    pub const fn outcome(&self) -> SettlementOutcome {
        match self {
            Self::Settled { .. } => SettlementOutcome::Settled,
            Self::Failed { .. } => SettlementOutcome::Failed,
        }
    }

    /// Returns `true` if the settlement succeeded.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Settled { .. })
    }

    /// Returns the transaction hash, if this record is settled.
    #[must_use]
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            Self::Settled { tx_hash, .. } => Some(tx_hash),
            Self::Failed { .. } => None,
        }
    }

    /// Returns the network identifier, if this record is settled.
    #[must_use]
    pub fn network_id(&self) -> Option<&str> {
        match self {
            Self::Settled { network_id, .. } => Some(network_id),
            Self::Failed { .. } => None,
        }
    }

    /// Returns the error message, if this record is failed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Settled { .. } => None,
            Self::Failed { error_message, .. } => Some(error_message),
        }
    }

    /// Returns the record's extension data.
    #[must_use]
    pub const fn extensions(&self) -> &DecodedExtensions {
        match self {
            Self::Settled { extensions, .. } | Self::Failed { extensions, .. } => extensions,
        }
    }

    /// Returns the record's extension data mutably.
    pub const fn extensions_mut(&mut self) -> &mut DecodedExtensions {
        match self {
            Self::Settled { extensions, .. } | Self::Failed { extensions, .. } => extensions,
        }
    }
}
