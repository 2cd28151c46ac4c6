//! Thin JSON client for the Tendermint RPC endpoint.
//!
//! Only two calls are needed: `/status` for the chain id at startup and
//! `/validators` to resolve BN254 consensus addresses, which cannot be
//! derived by hashing the key.

use std::time::Duration;

use base64::Engine;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// Tendermint JSON type tag for BN254 consensus keys.
pub const BN254_TYPE: &str = "cometbft/PubKeyBn254";

const RPC_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TendermintClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TendermintClient {
    pub fn new(base_url: Url) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(RPC_TIMEOUT).build()?;
        Ok(Self { http, base_url })
    }

    /// The chain id the node reports in `node_info.network`.
    pub async fn chain_id(&self) -> Result<String> {
        let url = self.base_url.join("status")?;
        let status: StatusResponse = self.http.get(url).send().await?.json().await?;
        let network = status.result.node_info.network;
        if network.is_empty() {
            return Err(Error::MalformedResponse(
                "node status reports an empty chain id".to_string(),
            ));
        }
        Ok(network)
    }

    /// The current consensus validator set.
    pub async fn validators(&self) -> Result<Vec<SetValidator>> {
        let url = self.base_url.join("validators")?;
        let resp: ValidatorsResponse = self.http.get(url).send().await?.json().await?;
        Ok(resp.result.validators)
    }

    /// Looks up the consensus address of a BN254 key in the validator
    /// set. Matches on the key bytes first and falls back to the only
    /// BN254 entry when the node omits key values.
    pub async fn bn254_consensus_address(&self, key: &[u8]) -> Result<Option<String>> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(key);
        let validators = self.validators().await?;
        if let Some(v) = validators
            .iter()
            .find(|v| v.pub_key.kind == BN254_TYPE && v.pub_key.value == encoded)
        {
            return Ok(Some(v.address.clone()));
        }
        Ok(validators
            .into_iter()
            .find(|v| v.pub_key.kind == BN254_TYPE)
            .map(|v| v.address))
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    result: StatusResult,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    node_info: NodeInfo,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    network: String,
}

#[derive(Debug, Deserialize)]
struct ValidatorsResponse {
    result: ValidatorsResult,
}

#[derive(Debug, Deserialize)]
struct ValidatorsResult {
    validators: Vec<SetValidator>,
}

/// One entry of the Tendermint validator set.
#[derive(Debug, Clone, Deserialize)]
pub struct SetValidator {
    pub address: String,
    pub pub_key: SetPubkey,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetPubkey {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_status_payload() {
        let payload = r#"{
            "jsonrpc": "2.0",
            "id": -1,
            "result": {
                "node_info": {
                    "network": "cosmoshub-4",
                    "version": "0.34.28"
                },
                "sync_info": {"catching_up": false}
            }
        }"#;
        let status: StatusResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(status.result.node_info.network, "cosmoshub-4");
    }

    #[test]
    fn parses_validator_set_payload() {
        let payload = r#"{
            "jsonrpc": "2.0",
            "id": -1,
            "result": {
                "block_height": "100",
                "validators": [
                    {
                        "address": "AABBCCDDEEFF00112233445566778899AABBCCDD",
                        "pub_key": {
                            "type": "cometbft/PubKeyBn254",
                            "value": "CQkJCQ=="
                        },
                        "voting_power": "10"
                    }
                ]
            }
        }"#;
        let resp: ValidatorsResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(resp.result.validators.len(), 1);
        assert_eq!(resp.result.validators[0].pub_key.kind, BN254_TYPE);
    }
}
