//! Umbrella error type for the settlement consumption pipeline.

use crate::ledger::ReconcileError;
use crate::validator::ValidationError;

/// Any error the pipeline can surface.
///
/// Validation errors are boundary rejections of a single raw payload; no
/// ledger mutation has occurred and the caller's recovery is to log and move
/// on. Reconcile errors are integrity failures that require operator
/// attention. Extension decode failures never appear here — they downgrade to
/// warnings on the record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    /// The raw payload was rejected at the validation boundary.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Reconciliation surfaced a settlement-integrity failure.
    #[error("{0}")]
    Reconcile(#[from] ReconcileError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_validation_error() {
        let err: SettlementError = ValidationError::MissingField("txHash").into();
        assert!(matches!(err, SettlementError::Validation(_)));
        assert_eq!(err.to_string(), "required field `txHash` is missing or empty");
    }

    #[test]
    fn test_from_reconcile_error() {
        let err: SettlementError = ReconcileError::ConflictingSettlement {
            network_id: "base".into(),
            tx_hash: "0xabc".into(),
        }
        .into();
        assert!(matches!(err, SettlementError::Reconcile(_)));
    }
}
