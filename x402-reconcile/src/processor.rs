//! Validate → enrich → reconcile composition.
//!
//! [`SettlementProcessor`] bundles the three pipeline stages behind a single
//! call per decoded `/settle` response. It owns the ledger and takes `&self`
//! throughout, so one processor can sit behind an `Arc` next to a transport
//! client and absorb concurrent, possibly-duplicated notifications.

use crate::error::SettlementError;
use crate::extensions::ExtensionRegistry;
use crate::ledger::{ReconcileOutcome, ReconciliationLedger};
use crate::proto::RawSettlementPayload;
use crate::record::SettlementRecord;
use crate::validator::SettlementValidator;

/// The full settlement consumption pipeline.
///
/// # Example
///
/// ```rust
/// use x402_reconcile::processor::SettlementProcessor;
/// use x402_reconcile::proto::RawSettlementPayload;
///
/// let processor = SettlementProcessor::default();
/// let raw = RawSettlementPayload::settled("0xabc", "base");
///
/// assert!(processor.process(raw.clone()).unwrap().is_new());
/// // A transport retry delivering the same response is a benign duplicate.
/// assert!(!processor.process(raw).unwrap().is_new());
/// ```
#[derive(Debug, Default)]
pub struct SettlementProcessor {
    validator: SettlementValidator,
    registry: ExtensionRegistry,
    ledger: ReconciliationLedger,
}

impl SettlementProcessor {
    /// Creates a processor from a validator and extension registry, with an
    /// empty ledger.
    #[must_use]
    pub fn new(validator: SettlementValidator, registry: ExtensionRegistry) -> Self {
        Self {
            validator,
            registry,
            ledger: ReconciliationLedger::new(),
        }
    }

    /// Builder-style method: sets the validator.
    #[must_use]
    pub fn with_validator(mut self, validator: SettlementValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Builder-style method: sets the extension registry.
    #[must_use]
    pub fn with_registry(mut self, registry: ExtensionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Validates and enriches a raw payload without touching the ledger.
    ///
    /// Useful when the caller wants the record itself (e.g., to inspect the
    /// error message of a failed settlement) before or instead of
    /// reconciling.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`](crate::validator::ValidationError)
    /// that rejected the payload.
    pub fn interpret(
        &self,
        raw: RawSettlementPayload,
    ) -> Result<SettlementRecord, SettlementError> {
        let mut record = self.validator.validate(raw)?;
        self.registry.enrich(&mut record);
        Ok(record)
    }

    /// Runs the full pipeline on one decoded `/settle` response.
    ///
    /// Failed settlements validate successfully but are rejected by the
    /// ledger with [`RejectReason::NotSettled`](crate::ledger::RejectReason);
    /// they never create entries.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Validation`] if the payload is rejected at
    /// the boundary, or [`SettlementError::Reconcile`] on a settlement
    /// integrity conflict.
    pub fn process(
        &self,
        raw: RawSettlementPayload,
    ) -> Result<ReconcileOutcome, SettlementError> {
        let record = self.interpret(raw)?;
        let outcome = self.ledger.reconcile(&record)?;
        Ok(outcome)
    }

    /// Returns the processor's ledger for direct queries.
    #[must_use]
    pub const fn ledger(&self) -> &ReconciliationLedger {
        &self.ledger
    }
}
