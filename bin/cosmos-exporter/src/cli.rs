use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// Scrapes the validator set, specific validators, or wallets of a
/// Cosmos-family chain into Prometheus metrics.
#[derive(Parser, Debug, Default)]
#[command(version, author, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file; flags override its values.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Display denomination, discovered from bank metadata when unset.
    #[arg(long)]
    pub(crate) denom: Option<String>,

    /// Base units per display unit.
    #[arg(long)]
    pub(crate) denom_coefficient: Option<f64>,

    /// Power of ten of base units per display unit.
    #[arg(long)]
    pub(crate) denom_exponent: Option<u32>,

    /// Address this exporter listens on.
    #[arg(long)]
    pub(crate) listen_address: Option<String>,

    /// gRPC endpoint of the node.
    #[arg(long)]
    pub(crate) node: Option<String>,

    /// Tendermint RPC endpoint of the node.
    #[arg(long)]
    pub(crate) tendermint_rpc: Option<Url>,

    /// Logging level.
    #[arg(long)]
    pub(crate) log_level: Option<String>,

    /// Output logs as JSON.
    #[arg(long)]
    pub(crate) json: bool,

    /// Pagination limit for gRPC requests.
    #[arg(long)]
    pub(crate) limit: Option<u64>,

    /// Staking dialect, "cosmos" or "zenrock"; probed when unset.
    #[arg(long)]
    pub(crate) network_type: Option<String>,

    /// Chain id override; taken from the node status when unset.
    #[arg(long)]
    pub(crate) chain_id: Option<String>,

    /// Bech32 global prefix.
    #[arg(long)]
    pub(crate) bech_prefix: Option<String>,

    /// Bech32 account prefix, derived from the global prefix when unset.
    #[arg(long)]
    pub(crate) bech_account_prefix: Option<String>,

    /// Bech32 validator prefix, derived from the global prefix when
    /// unset.
    #[arg(long)]
    pub(crate) bech_validator_prefix: Option<String>,

    /// Bech32 consensus node prefix, derived from the global prefix when
    /// unset.
    #[arg(long)]
    pub(crate) bech_consensus_node_prefix: Option<String>,

    /// Bech32 account pubkey prefix; accepted but unused, no metric
    /// renders a bech32 pubkey.
    #[arg(long)]
    pub(crate) bech_account_pubkey_prefix: Option<String>,

    /// Bech32 validator pubkey prefix; accepted but unused.
    #[arg(long)]
    pub(crate) bech_validator_pubkey_prefix: Option<String>,

    /// Bech32 consensus node pubkey prefix; accepted but unused.
    #[arg(long)]
    pub(crate) bech_consensus_node_pubkey_prefix: Option<String>,
}
