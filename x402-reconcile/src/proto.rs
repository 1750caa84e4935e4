//! Wire format of the facilitator's `POST /settle` response.
//!
//! The response body is a flat JSON object with camelCase field names, fixed
//! by the protocol:
//!
//! ```json
//! {
//!   "success": true,
//!   "txHash": "0xabc...",
//!   "networkId": "base",
//!   "extensions": { "vendorKey": { "nested": "anything" } }
//! }
//! ```
//!
//! [`RawSettlementPayload`] maps this shape one-to-one and performs no
//! validation of its own; the transport layer decodes into it and hands it to
//! a [`SettlementValidator`](crate::validator::SettlementValidator).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Protocol extension data attached to a settlement response.
///
/// Keys are extension names; values are arbitrary JSON data specific to each
/// extension. Insertion order is irrelevant.
pub type Extensions = HashMap<String, serde_json::Value>;

/// Untrusted decoded JSON body of a facilitator `/settle` response.
///
/// Every field combination the wire permits is representable here, including
/// inconsistent ones (e.g., `success: true` with a non-empty `error`). The
/// [`validator`](crate::validator) module decides which combinations are
/// acceptable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSettlementPayload {
    /// Whether the payment settlement succeeded.
    pub success: bool,
    /// Error message if settlement failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Transaction hash of the settled payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Network ID where the settlement occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    /// Optional extensions attached to the settlement response.
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl RawSettlementPayload {
    /// Constructs a successful payload with the given transaction hash and network.
    #[must_use]
    pub fn settled(tx_hash: impl Into<String>, network_id: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            tx_hash: Some(tx_hash.into()),
            network_id: Some(network_id.into()),
            extensions: Extensions::new(),
        }
    }

    /// Constructs a failed payload with the given error message.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            tx_hash: None,
            network_id: None,
            extensions: Extensions::new(),
        }
    }

    /// Builder-style method: attaches an extension value under `key`.
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_success_payload() {
        let payload: RawSettlementPayload = serde_json::from_value(json!({
            "success": true,
            "txHash": "0xabc",
            "networkId": "base",
            "extensions": { "foo": 1 }
        }))
        .unwrap();
        assert!(payload.success);
        assert_eq!(payload.tx_hash.as_deref(), Some("0xabc"));
        assert_eq!(payload.network_id.as_deref(), Some("base"));
        assert_eq!(payload.extensions.get("foo"), Some(&json!(1)));
        assert!(payload.error.is_none());
    }

    #[test]
    fn test_deserialize_failure_payload_defaults() {
        let payload: RawSettlementPayload = serde_json::from_value(json!({
            "success": false,
            "error": "insufficient funds"
        }))
        .unwrap();
        assert!(!payload.success);
        assert_eq!(payload.error.as_deref(), Some("insufficient funds"));
        assert!(payload.tx_hash.is_none());
        assert!(payload.network_id.is_none());
        assert!(payload.extensions.is_empty());
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let payload = RawSettlementPayload::settled("0xabc", "base");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({ "success": true, "txHash": "0xabc", "networkId": "base" })
        );
    }

    #[test]
    fn test_extension_values_round_trip_verbatim() {
        let nested = json!({ "a": [1, 2, { "b": null }] });
        let payload =
            RawSettlementPayload::settled("0xabc", "base").with_extension("vendor", nested.clone());
        let encoded = serde_json::to_string(&payload).unwrap();
        let decoded: RawSettlementPayload = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.extensions.get("vendor"), Some(&nested));
    }
}
