#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Settlement-response validation and reconciliation for the x402 payment protocol.
//!
//! A facilitator settles payments on behalf of a merchant and reports the result
//! through the JSON body of its `POST /settle` endpoint. That body is a flat,
//! partially-trusted bag of fields: a success flag, an optional error message,
//! an optional transaction hash and network identifier, and an open-ended
//! extension map. This crate turns that raw payload into a reliable settlement
//! record and applies it exactly once.
//!
//! # Pipeline
//!
//! 1. [`proto::RawSettlementPayload`] — the untrusted decoded response body.
//! 2. [`validator::SettlementValidator`] — structural and semantic checks,
//!    producing an invariant-respecting [`record::SettlementRecord`] or a typed
//!    rejection.
//! 3. [`extensions::ExtensionRegistry`] — forward-compatible decoding of the
//!    extension map; unknown keys are preserved verbatim and decode failures
//!    never block settlement recognition.
//! 4. [`ledger::ReconciliationLedger`] — idempotent application keyed by
//!    `(networkId, txHash)`, deduplicating retried notifications so downstream
//!    bookkeeping credits a settlement at most once.
//!
//! [`processor::SettlementProcessor`] wires the stages together for callers
//! that want a single entry point per decoded response.
//!
//! # Modules
//!
//! - [`error`] - Umbrella error type spanning validation and reconciliation
//! - [`extensions`] - Pluggable extension decoding with opaque fallback
//! - [`ledger`] - Concurrent, append-only settlement ledger
//! - [`networks`] - Known network names and their transaction-hash families
//! - [`processor`] - Validate → enrich → reconcile composition
//! - [`proto`] - Wire format of the facilitator `/settle` response
//! - [`record`] - Validated settlement records
//! - [`validator`] - Payload validation and hash-shape rules
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod error;
pub mod extensions;
pub mod ledger;
pub mod networks;
pub mod processor;
pub mod proto;
pub mod record;
pub mod validator;
