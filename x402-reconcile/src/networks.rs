//! Known network identifiers and their transaction-hash families.
//!
//! The `/settle` response identifies the settlement network with a
//! human-readable V1 network name (e.g., `"base"`). For the advisory
//! hash-shape checks in [`TxHashRules`](crate::validator::TxHashRules), each
//! known name maps to a [`NetworkFamily`] describing what its transaction
//! hashes look like. Unknown names map to no family and are never rejected —
//! networks vary, and the protocol keeps the identifier open-ended.

/// Family of networks sharing a transaction-hash format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum NetworkFamily {
    /// EVM chains: 32-byte hashes rendered as `0x`-prefixed hex.
    Evm,
    /// Solana chains: 64-byte signatures rendered as base58.
    Solana,
}

/// A known network name with its hash family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable V1 network name (e.g., "base-sepolia", "solana").
    pub name: &'static str,
    /// Transaction-hash family for the network.
    pub family: NetworkFamily,
}

/// Networks with well-known V1 names.
pub const KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "base",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "base-sepolia",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "ethereum",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "polygon",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "polygon-amoy",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "avalanche",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "avalanche-fuji",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "celo",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "iotex",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "sei",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "sei-testnet",
        family: NetworkFamily::Evm,
    },
    NetworkInfo {
        name: "solana",
        family: NetworkFamily::Solana,
    },
    NetworkInfo {
        name: "solana-devnet",
        family: NetworkFamily::Solana,
    },
];

/// Looks up the hash family for a V1 network name.
#[must_use]
pub fn family_by_name(name: &str) -> Option<NetworkFamily> {
    KNOWN_NETWORKS
        .iter()
        .find(|info| info.name == name)
        .map(|info| info.family)
}
