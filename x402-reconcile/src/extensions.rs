//! Pluggable decoding of the settlement response's extension map.
//!
//! The `extensions` object on a `/settle` response is open-ended by design:
//! facilitators attach vendor-specific data under keys the client may or may
//! not know about. [`ExtensionRegistry`] maps extension keys to decoders,
//! producing a [`DecodedExtensions`] view in which:
//!
//! - keys with a registered decoder become strongly-typed values;
//! - keys without one are retained verbatim as opaque JSON;
//! - decode failures downgrade to soft warnings, never rejecting the payload.
//!
//! Forward compatibility is the priority: an unknown or malformed extension
//! must never block settlement recognition. New extension types are added by
//! registering a decoder; the validator and ledger are untouched.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::proto::Extensions;
use crate::record::SettlementRecord;

/// A strongly-typed, decoded extension value.
///
/// Implemented automatically for any `Any + Debug + Send + Sync` type, so a
/// decoder can return plain data structs. Retrieve concrete types with
/// [`DecodedExtensions::get_decoded`].
pub trait DecodedExtension: Any + Debug + Send + Sync {
    /// Returns `self` as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Debug + Send + Sync> DecodedExtension for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Error produced by an [`ExtensionDecoder`].
///
/// Always downgraded to a [`DecodeWarning`] by the registry; it never fails
/// the payload.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionDecodeError {
    /// The value did not match the decoder's expected JSON shape.
    #[error("{0}")]
    Shape(#[from] serde_json::Error),
    /// Decoder-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Decoder for one extension key's expected shape.
pub trait ExtensionDecoder: Send + Sync {
    /// Decodes a raw extension value into a typed representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not have the expected shape. The
    /// registry records the error as a warning and retains the raw value.
    fn decode(&self, value: &Value) -> Result<Arc<dyn DecodedExtension>, ExtensionDecodeError>;
}

/// An [`ExtensionDecoder`] that deserializes the raw value into `T` via serde.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use x402_reconcile::extensions::{ExtensionRegistry, JsonDecoder};
///
/// #[derive(Debug, Deserialize)]
/// struct FeeBreakdown {
///     network_fee: String,
/// }
///
/// let registry = ExtensionRegistry::new()
///     .with_decoder("feeBreakdown", JsonDecoder::<FeeBreakdown>::new());
/// ```
pub struct JsonDecoder<T>(PhantomData<fn() -> T>);

impl<T> JsonDecoder<T> {
    /// Creates a new decoder for `T`.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> ExtensionDecoder for JsonDecoder<T>
where
    T: DeserializeOwned + Debug + Send + Sync + 'static,
{
    fn decode(&self, value: &Value) -> Result<Arc<dyn DecodedExtension>, ExtensionDecodeError> {
        let typed: T = serde_json::from_value(value.clone())?;
        Ok(Arc::new(typed))
    }
}

/// A single decoded (or passed-through) extension entry.
#[derive(Debug, Clone)]
pub enum ExtensionValue {
    /// A registered decoder accepted the value.
    Decoded {
        /// The typed value.
        value: Arc<dyn DecodedExtension>,
        /// The original raw JSON, kept for exact wire-level comparison.
        raw: Value,
    },
    /// No decoder accepted the value; the raw JSON is retained verbatim.
    Opaque(Value),
}

impl ExtensionValue {
    /// Returns the raw JSON image of this entry.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        match self {
            Self::Decoded { raw, .. } | Self::Opaque(raw) => raw,
        }
    }
}

/// Warning recorded when a registered decoder rejects a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    /// The extension key whose decoder failed.
    pub key: String,
    /// Description of the failure.
    pub detail: String,
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "extension `{}` failed to decode: {}", self.key, self.detail)
    }
}

/// Decoded view of a settlement response's extension map.
///
/// Known keys hold strongly-typed values; unknown keys are preserved verbatim
/// as opaque blobs. Iteration order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct DecodedExtensions {
    entries: HashMap<String, ExtensionValue>,
    warnings: Vec<DecodeWarning>,
}

impl DecodedExtensions {
    /// Wraps a raw extension map with every entry opaque.
    #[must_use]
    pub fn from_raw(raw: Extensions) -> Self {
        Self {
            entries: raw
                .into_iter()
                .map(|(key, value)| (key, ExtensionValue::Opaque(value)))
                .collect(),
            warnings: Vec::new(),
        }
    }

    /// Returns the entry for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ExtensionValue> {
        self.entries.get(key)
    }

    /// Returns the typed value for `key`, if it decoded to a `T`.
    #[must_use]
    pub fn get_decoded<T: 'static>(&self, key: &str) -> Option<&T> {
        match self.entries.get(key)? {
            ExtensionValue::Decoded { value, .. } => value.as_any().downcast_ref::<T>(),
            ExtensionValue::Opaque(_) => None,
        }
    }

    /// Iterates over all entries. No ordering guarantee.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtensionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Warnings accumulated while decoding.
    #[must_use]
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Projects the entries back onto their raw wire representation.
    ///
    /// Decoded entries keep their original JSON image, so this is an exact
    /// reconstruction of the map that arrived on the wire. The ledger uses it
    /// for conflict comparison between repeated notifications.
    #[must_use]
    pub fn raw_view(&self) -> Extensions {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.raw().clone()))
            .collect()
    }
}

/// Registry of per-key extension decoders.
///
/// Maps extension key strings to boxed [`ExtensionDecoder`] trait objects.
#[derive(Default)]
pub struct ExtensionRegistry(HashMap<String, Box<dyn ExtensionDecoder>>);

impl Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.0.keys().map(String::as_str).collect();
        f.debug_tuple("ExtensionRegistry").field(&keys).finish()
    }
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Registers a decoder for an extension key, replacing any previous one.
    pub fn register(&mut self, key: impl Into<String>, decoder: impl ExtensionDecoder + 'static) {
        self.0.insert(key.into(), Box::new(decoder));
    }

    /// Builder-style method: registers a decoder and returns `self`.
    #[must_use]
    pub fn with_decoder(
        mut self,
        key: impl Into<String>,
        decoder: impl ExtensionDecoder + 'static,
    ) -> Self {
        self.register(key, decoder);
        self
    }

    /// Returns `true` if a decoder is registered for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Decodes a raw extension map.
    ///
    /// Keys with a registered decoder become typed entries; decoder failures
    /// are recorded as warnings with the raw value retained; everything else
    /// stays opaque.
    #[must_use]
    pub fn decode(&self, raw: &Extensions) -> DecodedExtensions {
        let mut decoded = DecodedExtensions::from_raw(raw.clone());
        self.apply(&mut decoded);
        decoded
    }

    /// Re-runs decoding over a record's opaque extension entries in place.
    pub fn enrich(&self, record: &mut SettlementRecord) {
        self.apply(record.extensions_mut());
    }

    fn apply(&self, decoded: &mut DecodedExtensions) {
        for (key, decoder) in &self.0 {
            let Some(slot) = decoded.entries.get_mut(key) else {
                continue;
            };
            let ExtensionValue::Opaque(raw) = slot else {
                continue;
            };
            match decoder.decode(raw) {
                Ok(value) => {
                    let raw = std::mem::take(raw);
                    *slot = ExtensionValue::Decoded { value, raw };
                }
                Err(err) => {
                    #[cfg(feature = "telemetry")]
                    tracing::warn!(
                        key = %key,
                        error = %err,
                        "extension decode failed, retaining raw value"
                    );
                    decoded.warnings.push(DecodeWarning {
                        key: key.clone(),
                        detail: err.to_string(),
                    });
                }
            }
        }
    }
}
