//! Startup resolution of chain id, denomination, and staking dialect.

use eyre::{bail, eyre, Result};
use tonic::transport::Channel;

use client::{denoms_metadata, detect_network_type, NetworkType, TendermintClient};

use crate::config::Settings;

/// Chains whose staking dialect is known ahead of probing.
const CUSTOM_NETWORKS: &[(&str, NetworkType)] = &[("diamond-1", NetworkType::Zenrock)];

/// The chain id labels every metric, so startup fails when neither the
/// flag nor the node provides one.
pub(crate) async fn resolve_chain_id(
    flag: Option<String>,
    tendermint: &TendermintClient,
) -> Result<String> {
    if let Some(chain_id) = flag {
        tracing::info!(%chain_id, "using configured chain id");
        return Ok(chain_id);
    }
    let chain_id = tendermint
        .chain_id()
        .await
        .map_err(|err| eyre!("could not get chain id from the node status: {err}"))?;
    tracing::info!(%chain_id, "got chain id from node status");
    Ok(chain_id)
}

/// Display denomination and its coefficient, from flags when fully
/// specified and from bank metadata otherwise.
pub(crate) async fn resolve_denom(settings: &Settings, channel: &Channel) -> Result<(String, f64)> {
    if let Some(denom) = &settings.denom {
        if let Some(coefficient) = settings.denom_coefficient {
            tracing::info!(%denom, coefficient, "using provided denom and coefficient");
            return Ok((denom.clone(), coefficient));
        }
        if let Some(exponent) = settings.denom_exponent {
            let coefficient = 10f64.powi(exponent as i32);
            tracing::info!(%denom, exponent, coefficient, "using provided denom and exponent");
            return Ok((denom.clone(), coefficient));
        }
    }

    let metadatas = denoms_metadata(channel).await?;
    let Some(metadata) = metadatas.first() else {
        bail!(
            "no denom metadata on chain; run with --denom and --denom-coefficient to set them manually"
        );
    };

    let denom = settings
        .denom
        .clone()
        .unwrap_or_else(|| metadata.display.clone());
    for unit in &metadata.units {
        tracing::debug!(denom = %unit.denom, exponent = unit.exponent, "denom unit");
        if unit.denom == denom {
            let coefficient = 10f64.powi(unit.exponent as i32);
            tracing::info!(%denom, coefficient, "got denom info from bank metadata");
            return Ok((denom, coefficient));
        }
    }

    bail!("could not find denom {denom:?} in the chain's denom metadata")
}

/// Staking dialect: the flag wins, then the chain id registry, then
/// probing the node's query services.
pub(crate) async fn resolve_network_type(
    flag: Option<NetworkType>,
    chain_id: &str,
    channel: &Channel,
) -> Result<NetworkType> {
    if let Some(network_type) = flag {
        return Ok(network_type);
    }
    if let Some((_, network_type)) = CUSTOM_NETWORKS.iter().find(|(id, _)| *id == chain_id) {
        tracing::info!(%chain_id, network_type = network_type.as_str(), "network type determined by chain id");
        return Ok(*network_type);
    }
    let network_type = detect_network_type(channel)
        .await
        .map_err(|err| eyre!("could not determine network type: {err}"))?;
    tracing::info!(network_type = network_type.as_str(), "network type determined automatically");
    Ok(network_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_network_registry_knows_zenrock_chains() {
        let found = CUSTOM_NETWORKS.iter().find(|(id, _)| *id == "diamond-1");
        assert!(matches!(found, Some((_, NetworkType::Zenrock))));
    }
}
