//! Validation of raw `/settle` response payloads.
//!
//! [`SettlementValidator`] is the trust boundary between the wire and the
//! rest of the crate: it takes a [`RawSettlementPayload`] and either produces
//! an invariant-respecting [`SettlementRecord`] or rejects it with a typed
//! [`ValidationError`]. Validation is a pure function of the input and the
//! validator's configuration; no state is touched.
//!
//! Transaction-hash shape checking is advisory and configurable via
//! [`TxHashRules`]: networks vary, and an unknown network name never causes a
//! rejection on hash shape alone.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::extensions::DecodedExtensions;
use crate::networks::{self, NetworkFamily};
use crate::proto::RawSettlementPayload;
use crate::record::SettlementRecord;

/// `0x`-prefixed 32-byte hex digest, the EVM transaction-hash shape.
static EVM_TX_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("valid regex"));

/// Base58-rendered 64-byte signature, the Solana transaction-id shape.
static SOLANA_TX_SIGNATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{64,88}$").expect("valid regex"));

/// Rejection of a raw settlement payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A field required by the declared outcome is missing or empty.
    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),
    /// The payload declares contradictory fields.
    #[error("inconsistent fields: {detail}")]
    InconsistentFields {
        /// Description of the contradiction.
        detail: String,
    },
    /// The transaction hash does not match the declared network's shape.
    #[error("transaction hash `{tx_hash}` is malformed for network `{network_id}`")]
    MalformedTxHash {
        /// The declared network.
        network_id: String,
        /// The offending hash.
        tx_hash: String,
    },
}

/// Advisory transaction-hash shape rules, keyed by network family.
///
/// The default is [`lenient`](Self::lenient): no shape checking at all.
/// [`known_networks`](Self::known_networks) enables per-family patterns for
/// the networks in [`crate::networks`]; names outside the table are always
/// accepted.
#[derive(Debug, Clone, Default)]
pub struct TxHashRules {
    patterns: HashMap<NetworkFamily, Regex>,
}

impl TxHashRules {
    /// No shape checking; every non-empty hash is accepted.
    #[must_use]
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Shape checking for the known network families (EVM hex digests,
    /// Solana base58 signatures).
    #[must_use]
    pub fn known_networks() -> Self {
        Self::default()
            .with_pattern(NetworkFamily::Evm, EVM_TX_HASH.clone())
            .with_pattern(NetworkFamily::Solana, SOLANA_TX_SIGNATURE.clone())
    }

    /// Builder-style method: sets the pattern for a network family.
    #[must_use]
    pub fn with_pattern(mut self, family: NetworkFamily, pattern: Regex) -> Self {
        self.patterns.insert(family, pattern);
        self
    }

    /// Returns `true` if `tx_hash` is acceptable for `network_id`.
    ///
    /// Unknown networks and families without a configured pattern always pass.
    #[must_use]
    pub fn check(&self, network_id: &str, tx_hash: &str) -> bool {
        let Some(family) = networks::family_by_name(network_id) else {
            return true;
        };
        let Some(pattern) = self.patterns.get(&family) else {
            return true;
        };
        pattern.is_match(tx_hash)
    }
}

/// Validator for raw settlement payloads.
///
/// # Example
///
/// ```rust
/// use x402_reconcile::proto::RawSettlementPayload;
/// use x402_reconcile::validator::{SettlementValidator, TxHashRules};
///
/// let validator = SettlementValidator::new().with_hash_rules(TxHashRules::known_networks());
/// let record = validator
///     .validate(RawSettlementPayload::failed("insufficient funds"))
///     .unwrap();
/// assert_eq!(record.error_message(), Some("insufficient funds"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SettlementValidator {
    hash_rules: TxHashRules,
}

impl SettlementValidator {
    /// Creates a validator with lenient hash rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method: sets the transaction-hash shape rules.
    #[must_use]
    pub fn with_hash_rules(mut self, rules: TxHashRules) -> Self {
        self.hash_rules = rules;
        self
    }

    /// Validates a raw payload into a [`SettlementRecord`].
    ///
    /// - `success: true` requires non-empty `txHash` and `networkId` and an
    ///   absent-or-empty `error`; a non-empty `error` alongside success is
    ///   [`ValidationError::InconsistentFields`].
    /// - `success: false` requires a non-empty `error`; `txHash`/`networkId`
    ///   are permitted but ignored, since a facilitator may report a failed
    ///   attempt that nonetheless touched a chain.
    ///
    /// Extensions pass through verbatim as opaque entries; decode them with
    /// an [`ExtensionRegistry`](crate::extensions::ExtensionRegistry).
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first violated rule.
    pub fn validate(
        &self,
        raw: RawSettlementPayload,
    ) -> Result<SettlementRecord, ValidationError> {
        let RawSettlementPayload {
            success,
            error,
            tx_hash,
            network_id,
            extensions,
        } = raw;
        let extensions = DecodedExtensions::from_raw(extensions);

        if success {
            if let Some(error) = error.filter(|e| !e.trim().is_empty()) {
                return Err(ValidationError::InconsistentFields {
                    detail: format!("success=true with non-empty error `{error}`"),
                });
            }
            let tx_hash = required("txHash", tx_hash)?;
            let network_id = required("networkId", network_id)?;
            if !self.hash_rules.check(&network_id, &tx_hash) {
                return Err(ValidationError::MalformedTxHash {
                    network_id,
                    tx_hash,
                });
            }
            Ok(SettlementRecord::Settled {
                tx_hash,
                network_id,
                extensions,
            })
        } else {
            let error_message = required("error", error)?;
            Ok(SettlementRecord::Failed {
                error_message,
                extensions,
            })
        }
    }
}

/// Unwraps a required field, treating whitespace-only strings as absent.
fn required(name: &'static str, field: Option<String>) -> Result<String, ValidationError> {
    field
        .filter(|value| !value.trim().is_empty())
        .ok_or(ValidationError::MissingField(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SettlementOutcome;
    use serde_json::json;

    const EVM_HASH: &str =
        "0x4e3a3754410177e6937ef1f84bba68ea139e8d1a2258c5f85db9f1cd715a1bdd";

    #[test]
    fn test_valid_success_payload() {
        let raw = RawSettlementPayload::settled("0xabc", "base")
            .with_extension("foo", json!(1));
        let record = SettlementValidator::new().validate(raw).unwrap();
        assert_eq!(record.outcome(), SettlementOutcome::Settled);
        assert_eq!(record.tx_hash(), Some("0xabc"));
        assert_eq!(record.network_id(), Some("base"));
        assert_eq!(record.extensions().len(), 1);
    }

    #[test]
    fn test_valid_failure_payload() {
        let record = SettlementValidator::new()
            .validate(RawSettlementPayload::failed("insufficient funds"))
            .unwrap();
        assert_eq!(record.outcome(), SettlementOutcome::Failed);
        assert_eq!(record.error_message(), Some("insufficient funds"));
    }

    #[test]
    fn test_failure_with_tx_hash_is_ignored() {
        let raw = RawSettlementPayload {
            success: false,
            error: Some("reverted on-chain".into()),
            tx_hash: Some(EVM_HASH.into()),
            network_id: Some("base".into()),
            extensions: crate::proto::Extensions::new(),
        };
        let record = SettlementValidator::new().validate(raw).unwrap();
        assert_eq!(record.outcome(), SettlementOutcome::Failed);
        assert_eq!(record.tx_hash(), None);
        assert_eq!(record.network_id(), None);
    }

    #[test]
    fn test_success_with_error_is_inconsistent() {
        let mut raw = RawSettlementPayload::settled("0xabc", "base");
        raw.error = Some("but also failed".into());
        let err = SettlementValidator::new().validate(raw).unwrap_err();
        assert!(matches!(err, ValidationError::InconsistentFields { .. }));
    }

    #[test]
    fn test_success_with_empty_error_is_accepted() {
        let mut raw = RawSettlementPayload::settled("0xabc", "base");
        raw.error = Some(String::new());
        assert!(SettlementValidator::new().validate(raw).is_ok());
    }

    #[test]
    fn test_success_missing_tx_hash() {
        let mut raw = RawSettlementPayload::settled("0xabc", "base");
        raw.tx_hash = None;
        let err = SettlementValidator::new().validate(raw).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("txHash"));
    }

    #[test]
    fn test_success_whitespace_network_id_is_missing() {
        let mut raw = RawSettlementPayload::settled("0xabc", "base");
        raw.network_id = Some("   ".into());
        let err = SettlementValidator::new().validate(raw).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("networkId"));
    }

    #[test]
    fn test_failure_missing_error() {
        let raw = RawSettlementPayload {
            success: false,
            ..RawSettlementPayload::default()
        };
        let err = SettlementValidator::new().validate(raw).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("error"));
    }

    #[test]
    fn test_hash_rules_reject_malformed_evm_hash() {
        let validator = SettlementValidator::new().with_hash_rules(TxHashRules::known_networks());
        let err = validator
            .validate(RawSettlementPayload::settled("0xabc", "base"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::MalformedTxHash { .. }));
    }

    #[test]
    fn test_hash_rules_accept_well_formed_evm_hash() {
        let validator = SettlementValidator::new().with_hash_rules(TxHashRules::known_networks());
        let record = validator
            .validate(RawSettlementPayload::settled(EVM_HASH, "base"))
            .unwrap();
        assert_eq!(record.tx_hash(), Some(EVM_HASH));
    }

    #[test]
    fn test_hash_rules_are_advisory_for_unknown_networks() {
        let validator = SettlementValidator::new().with_hash_rules(TxHashRules::known_networks());
        let record = validator
            .validate(RawSettlementPayload::settled("anything-goes", "lightning"))
            .unwrap();
        assert_eq!(record.network_id(), Some("lightning"));
    }

    #[test]
    fn test_lenient_rules_accept_any_shape() {
        let validator = SettlementValidator::new().with_hash_rules(TxHashRules::lenient());
        assert!(
            validator
                .validate(RawSettlementPayload::settled("0xabc", "base"))
                .is_ok()
        );
    }

    #[test]
    fn test_solana_signature_shape() {
        let rules = TxHashRules::known_networks();
        let signature = "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW";
        assert!(rules.check("solana", signature));
        assert!(!rules.check("solana", "0xabc"));
    }
}
