use std::{fs, net::SocketAddr, path::Path, str::FromStr};

use serde::Deserialize;
use url::Url;

use client::NetworkType;
use collectors::BechPrefixes;

use crate::{cli::Args, error::Error};

const DEFAULT_LISTEN_ADDRESS: &str = ":9300";
const DEFAULT_NODE: &str = "localhost:9090";
const DEFAULT_TENDERMINT_RPC: &str = "http://localhost:26657";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LIMIT: u64 = 1000;
const DEFAULT_BECH_PREFIX: &str = "persistence";

/// Optional overrides read from a TOML file; keys match the flag names.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct FileConfig {
    denom: Option<String>,
    denom_coefficient: Option<f64>,
    denom_exponent: Option<u32>,
    listen_address: Option<String>,
    node: Option<String>,
    tendermint_rpc: Option<Url>,
    log_level: Option<String>,
    json: Option<bool>,
    limit: Option<u64>,
    network_type: Option<String>,
    chain_id: Option<String>,
    bech_prefix: Option<String>,
    bech_account_prefix: Option<String>,
    bech_validator_prefix: Option<String>,
    bech_consensus_node_prefix: Option<String>,
    bech_account_pubkey_prefix: Option<String>,
    bech_validator_pubkey_prefix: Option<String>,
    bech_consensus_node_pubkey_prefix: Option<String>,
}

impl FileConfig {
    pub(crate) fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(config_path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Fully resolved runtime settings: flags win over the config file,
/// which wins over the defaults.
#[derive(Debug)]
pub(crate) struct Settings {
    pub listen_address: SocketAddr,
    pub node: String,
    pub tendermint_rpc: Url,
    pub log_level: String,
    pub json: bool,
    pub limit: u64,
    pub network_type: Option<NetworkType>,
    pub chain_id: Option<String>,
    pub denom: Option<String>,
    pub denom_coefficient: Option<f64>,
    pub denom_exponent: Option<u32>,
    pub prefixes: BechPrefixes,
}

impl Settings {
    pub(crate) fn resolve(args: Args) -> Result<Self, Error> {
        let file = match &args.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        let denom = args.denom.or(file.denom);
        let denom_coefficient = args.denom_coefficient.or(file.denom_coefficient);
        let denom_exponent = args.denom_exponent.or(file.denom_exponent);
        if denom_coefficient.is_some() && denom_exponent.is_some() {
            return Err(Error::ConflictingDenomSettings);
        }
        if let Some(coefficient) = denom_coefficient {
            // The comparison also rejects NaN.
            if !(coefficient > 0.0) {
                return Err(Error::NonPositiveDenomCoefficient(coefficient));
            }
        }

        let listen_address = args
            .listen_address
            .or(file.listen_address)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string());
        let listen_address = parse_listen_address(&listen_address)?;

        let tendermint_rpc = match args.tendermint_rpc.or(file.tendermint_rpc) {
            Some(url) => url,
            None => Url::parse(DEFAULT_TENDERMINT_RPC).map_err(|_| {
                Error::Io(std::io::Error::other("invalid default tendermint rpc url"))
            })?,
        };

        let network_type = args
            .network_type
            .or(file.network_type)
            .map(|s| NetworkType::from_str(&s).map_err(|_| Error::UnknownNetworkType(s)))
            .transpose()?;

        let log_level = normalize_log_level(
            &args
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        );

        let base_prefix = args
            .bech_prefix
            .or(file.bech_prefix)
            .unwrap_or_else(|| DEFAULT_BECH_PREFIX.to_string());
        let mut prefixes = BechPrefixes::from_base(&base_prefix);
        if let Some(account) = args.bech_account_prefix.or(file.bech_account_prefix) {
            prefixes.account = account;
        }
        if let Some(validator) = args.bech_validator_prefix.or(file.bech_validator_prefix) {
            prefixes.validator = validator;
        }
        if let Some(consensus) = args
            .bech_consensus_node_prefix
            .or(file.bech_consensus_node_prefix)
        {
            prefixes.consensus = consensus;
        }

        // Pubkey prefixes are part of the accepted invocation surface, but
        // no metric renders a bech32 pubkey, so they configure nothing.
        if args
            .bech_account_pubkey_prefix
            .or(file.bech_account_pubkey_prefix)
            .or(args.bech_validator_pubkey_prefix)
            .or(file.bech_validator_pubkey_prefix)
            .or(args.bech_consensus_node_pubkey_prefix)
            .or(file.bech_consensus_node_pubkey_prefix)
            .is_some()
        {
            tracing::debug!("bech32 pubkey prefixes are accepted but have no effect");
        }

        Ok(Settings {
            listen_address,
            node: args
                .node
                .or(file.node)
                .unwrap_or_else(|| DEFAULT_NODE.to_string()),
            tendermint_rpc,
            log_level,
            json: args.json || file.json.unwrap_or(false),
            limit: args.limit.or(file.limit).unwrap_or(DEFAULT_LIMIT),
            network_type,
            chain_id: args.chain_id.or(file.chain_id),
            denom,
            denom_coefficient,
            denom_exponent,
            prefixes,
        })
    }
}

/// Accepts both full socket addresses and the ":port" shorthand.
fn parse_listen_address(address: &str) -> Result<SocketAddr, Error> {
    if let Some(port) = address.strip_prefix(':') {
        return Ok(format!("0.0.0.0:{port}").parse()?);
    }
    Ok(address.parse()?)
}

/// Levels this exporter understands but tracing does not.
fn normalize_log_level(level: &str) -> String {
    match level {
        "fatal" | "panic" => "error".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["cosmos-exporter"];
        full.extend_from_slice(argv);
        Args::parse_from(full)
    }

    #[test]
    fn defaults_apply_without_flags_or_file() {
        let settings = Settings::resolve(args(&[])).unwrap();
        assert_eq!(settings.listen_address.to_string(), "0.0.0.0:9300");
        assert_eq!(settings.node, "localhost:9090");
        assert_eq!(settings.tendermint_rpc.as_str(), "http://localhost:26657/");
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.limit, 1000);
        assert!(settings.network_type.is_none());
        assert_eq!(settings.prefixes.account, "persistence");
        assert_eq!(settings.prefixes.validator, "persistencevaloper");
        assert_eq!(settings.prefixes.consensus, "persistencevalcons");
    }

    #[test]
    fn flags_override_file_values() {
        let dir = std::env::temp_dir().join("cosmos-exporter-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("override.toml");
        std::fs::write(
            &path,
            "node = \"file-node:9090\"\nlimit = 50\nbech_prefix = \"osmo\"\n",
        )
        .unwrap();

        let settings = Settings::resolve(args(&[
            "--config",
            path.to_str().unwrap(),
            "--node",
            "flag-node:9090",
        ]))
        .unwrap();

        assert_eq!(settings.node, "flag-node:9090");
        assert_eq!(settings.limit, 50);
        assert_eq!(settings.prefixes.validator, "osmovaloper");
    }

    #[test]
    fn explicit_prefixes_win_over_derived_ones() {
        let settings = Settings::resolve(args(&[
            "--bech-prefix",
            "cosmos",
            "--bech-validator-prefix",
            "cosmosval",
        ]))
        .unwrap();
        assert_eq!(settings.prefixes.account, "cosmos");
        assert_eq!(settings.prefixes.validator, "cosmosval");
        assert_eq!(settings.prefixes.consensus, "cosmosvalcons");
    }

    #[test]
    fn coefficient_and_exponent_conflict() {
        let result = Settings::resolve(args(&[
            "--denom",
            "atom",
            "--denom-coefficient",
            "1000000",
            "--denom-exponent",
            "6",
        ]));
        assert!(matches!(result, Err(Error::ConflictingDenomSettings)));
    }

    #[test]
    fn rejects_non_positive_denom_coefficient() {
        for value in ["--denom-coefficient=0", "--denom-coefficient=-1000000"] {
            let result = Settings::resolve(args(&["--denom", "atom", value]));
            assert!(matches!(
                result,
                Err(Error::NonPositiveDenomCoefficient(_))
            ));
        }
    }

    #[test]
    fn accepts_pubkey_prefix_flags() {
        let settings = Settings::resolve(args(&[
            "--bech-account-pubkey-prefix",
            "persistencepub",
            "--bech-validator-pubkey-prefix",
            "persistencevaloperpub",
            "--bech-consensus-node-pubkey-prefix",
            "persistencevalconspub",
        ]))
        .unwrap();
        assert_eq!(settings.prefixes.account, "persistence");
        assert_eq!(settings.prefixes.validator, "persistencevaloper");
    }

    #[test]
    fn fatal_level_maps_to_error() {
        let settings = Settings::resolve(args(&["--log-level", "fatal"])).unwrap();
        assert_eq!(settings.log_level, "error");
    }

    #[test]
    fn rejects_unknown_network_type() {
        let result = Settings::resolve(args(&["--network-type", "osmosis"]));
        assert!(matches!(result, Err(Error::UnknownNetworkType(_))));
    }
}
