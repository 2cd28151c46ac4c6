#![deny(unused_crate_dependencies)]
#![warn(unused_extern_crates)]
#![warn(unused_imports)]

//! Request-scoped Prometheus collectors, one module per scrape endpoint.
//!
//! A scrape builds a fresh registry, fans out the upstream queries
//! concurrently, and renders whatever succeeded. A failed query logs and
//! leaves its families absent instead of failing the whole scrape; only
//! queries nothing else can proceed without abort the request.

use client::{bech, ConsensusPubkey, Decimal, NodeClient, Validator};

mod error;
pub mod general;
pub mod params;
mod registry;
mod sanitize;
pub mod validator;
pub mod validators;
pub mod wallet;

pub use error::{Error, Result};
pub use registry::CONTENT_TYPE;
pub use sanitize::sanitize_utf8;

/// Bech32 prefixes of the monitored chain.
#[derive(Debug, Clone)]
pub struct BechPrefixes {
    pub account: String,
    pub validator: String,
    pub consensus: String,
}

impl BechPrefixes {
    /// Derives the standard prefix family from the account prefix, the
    /// way Cosmos SDK chains do ("cosmos" gives "cosmosvaloper" and
    /// "cosmosvalcons").
    pub fn from_base(base: &str) -> Self {
        Self {
            account: base.to_string(),
            validator: format!("{base}valoper"),
            consensus: format!("{base}valcons"),
        }
    }
}

/// Everything a scrape needs, shared behind an `Arc`.
pub struct ExporterContext {
    pub client: NodeClient,
    pub chain_id: String,
    pub denom: String,
    pub denom_coefficient: f64,
    pub prefixes: BechPrefixes,
}

impl ExporterContext {
    /// Converts a base-denomination amount to display units.
    pub fn scale(&self, amount: &Decimal) -> f64 {
        amount.to_f64() / self.denom_coefficient
    }
}

/// Waits for a scrape's fan-out to finish. A panicked task only loses
/// its own families; the scrape still renders.
pub(crate) async fn join_tasks(tasks: Vec<tokio::task::JoinHandle<()>>) {
    for result in futures::future::join_all(tasks).await {
        if let Err(err) = result {
            tracing::error!(%err, "collector task failed");
        }
    }
}

/// Bech32 consensus address for hash-derived key schemes. BN254 keys
/// need a validator-set lookup instead, see [`resolve_consensus_address`].
fn derived_consensus_address(ctx: &ExporterContext, pubkey: &ConsensusPubkey) -> Option<String> {
    let raw = pubkey.consensus_address()?;
    bech::encode(&ctx.prefixes.consensus, &raw).ok()
}

/// Consensus address of a validator, going to the Tendermint RPC for
/// schemes whose address cannot be derived by hashing.
async fn resolve_consensus_address(ctx: &ExporterContext, validator: &Validator) -> Option<String> {
    let pubkey = validator.consensus_pubkey.as_ref()?;
    if let Some(address) = derived_consensus_address(ctx, pubkey) {
        return Some(address);
    }
    match ctx
        .client
        .tendermint()
        .bn254_consensus_address(pubkey.key_bytes())
        .await
    {
        Ok(address) => address,
        Err(err) => {
            tracing::warn!(
                operator_address = %validator.operator_address,
                %err,
                "could not look up consensus address in the validator set"
            );
            None
        }
    }
}
