//! One queried node: a shared gRPC channel, the dialect-specific staking
//! seam behind it, and the Tendermint RPC sidecar.

use std::time::Duration;

use cosmos_sdk_proto::cosmos::bank::v1beta1 as bank;
use cosmos_sdk_proto::cosmos::base::query::v1beta1::PageRequest;
use cosmos_sdk_proto::cosmos::base::v1beta1::{Coin as ProtoCoin, DecCoin};
use cosmos_sdk_proto::cosmos::distribution::v1beta1 as distribution;
use cosmos_sdk_proto::cosmos::mint::v1beta1 as mint;
use cosmos_sdk_proto::cosmos::slashing::v1beta1 as slashing;
use cosmos_sdk_proto::cosmos::staking::v1beta1 as staking;
use tonic::transport::Channel;

use crate::{
    decimal::Decimal,
    error::{Error, Result},
    staking::{parse_dec, parse_int, staking_client, StakingQuery},
    tendermint::TendermintClient,
    types::{
        Coin, DelegatorReward, DenomMetadata, DenomUnit, NetworkType, SigningInfo,
    },
    zenrock,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to one upstream node.
///
/// Cheap to use behind an `Arc`; the channel multiplexes internally and
/// every query clones it.
pub struct NodeClient {
    channel: Channel,
    staking: Box<dyn StakingQuery>,
    tendermint: TendermintClient,
    limit: u64,
}

impl NodeClient {
    pub fn new(
        channel: Channel,
        network_type: NetworkType,
        tendermint: TendermintClient,
        limit: u64,
    ) -> Self {
        let staking = staking_client(network_type, channel.clone(), limit);
        Self {
            channel,
            staking,
            tendermint,
            limit,
        }
    }

    /// The staking seam for the detected dialect.
    pub fn staking(&self) -> &dyn StakingQuery {
        self.staking.as_ref()
    }

    pub fn tendermint(&self) -> &TendermintClient {
        &self.tendermint
    }

    fn page(&self) -> Option<PageRequest> {
        let mut page = PageRequest::default();
        page.limit = self.limit;
        Some(page)
    }

    pub async fn total_supply(&self) -> Result<Vec<Coin>> {
        let mut client = bank::query_client::QueryClient::new(self.channel.clone());
        let mut req = bank::QueryTotalSupplyRequest::default();
        req.pagination = self.page();
        let resp = client.total_supply(req).await?.into_inner();
        int_coins(resp.supply)
    }

    pub async fn all_balances(&self, address: &str) -> Result<Vec<Coin>> {
        let mut client = bank::query_client::QueryClient::new(self.channel.clone());
        let mut req = bank::QueryAllBalancesRequest::default();
        req.address = address.to_string();
        req.pagination = self.page();
        let resp = client.all_balances(req).await?.into_inner();
        int_coins(resp.balances)
    }

    pub async fn denoms_metadata(&self) -> Result<Vec<DenomMetadata>> {
        denoms_metadata(&self.channel).await
    }

    pub async fn community_pool(&self) -> Result<Vec<Coin>> {
        let mut client = distribution::query_client::QueryClient::new(self.channel.clone());
        let resp = client
            .community_pool(distribution::QueryCommunityPoolRequest {})
            .await?
            .into_inner();
        dec_coins(resp.pool)
    }

    pub async fn inflation(&self) -> Result<Decimal> {
        let mut client = mint::query_client::QueryClient::new(self.channel.clone());
        let resp = client
            .inflation(mint::QueryInflationRequest {})
            .await?
            .into_inner();
        dec_bytes(&resp.inflation, "inflation")
    }

    pub async fn annual_provisions(&self) -> Result<Decimal> {
        let mut client = mint::query_client::QueryClient::new(self.channel.clone());
        let resp = client
            .annual_provisions(mint::QueryAnnualProvisionsRequest {})
            .await?
            .into_inner();
        dec_bytes(&resp.annual_provisions, "annual provisions")
    }

    /// Signing infos for the whole validator set, keyed by consensus
    /// address.
    pub async fn signing_infos(&self) -> Result<Vec<SigningInfo>> {
        let mut client = slashing::query_client::QueryClient::new(self.channel.clone());
        let mut req = slashing::QuerySigningInfosRequest::default();
        req.pagination = self.page();
        let resp = client.signing_infos(req).await?.into_inner();
        Ok(resp.info.into_iter().map(signing_info_from_proto).collect())
    }

    pub async fn signing_info(&self, cons_address: &str) -> Result<SigningInfo> {
        let mut client = slashing::query_client::QueryClient::new(self.channel.clone());
        let mut req = slashing::QuerySigningInfoRequest::default();
        req.cons_address = cons_address.to_string();
        let resp = client.signing_info(req).await?.into_inner();
        let info = resp.val_signing_info.ok_or_else(|| {
            Error::MalformedResponse("signing info response without info".into())
        })?;
        Ok(signing_info_from_proto(info))
    }

    pub async fn validator_commission(&self, operator_address: &str) -> Result<Vec<Coin>> {
        let mut client = distribution::query_client::QueryClient::new(self.channel.clone());
        let mut req = distribution::QueryValidatorCommissionRequest::default();
        req.validator_address = operator_address.to_string();
        let resp = client.validator_commission(req).await?.into_inner();
        match resp.commission {
            Some(commission) => dec_coins(commission.commission),
            None => Ok(Vec::new()),
        }
    }

    pub async fn validator_outstanding_rewards(
        &self,
        operator_address: &str,
    ) -> Result<Vec<Coin>> {
        let mut client = distribution::query_client::QueryClient::new(self.channel.clone());
        let mut req = distribution::QueryValidatorOutstandingRewardsRequest::default();
        req.validator_address = operator_address.to_string();
        let resp = client
            .validator_outstanding_rewards(req)
            .await?
            .into_inner();
        match resp.rewards {
            Some(rewards) => dec_coins(rewards.rewards),
            None => Ok(Vec::new()),
        }
    }

    pub async fn delegation_total_rewards(
        &self,
        delegator_address: &str,
    ) -> Result<Vec<DelegatorReward>> {
        let mut client = distribution::query_client::QueryClient::new(self.channel.clone());
        let mut req = distribution::QueryDelegationTotalRewardsRequest::default();
        req.delegator_address = delegator_address.to_string();
        let resp = client.delegation_total_rewards(req).await?.into_inner();
        resp.rewards
            .into_iter()
            .map(|r| {
                Ok(DelegatorReward {
                    validator_address: r.validator_address,
                    reward: dec_coins(r.reward)?,
                })
            })
            .collect()
    }
}

/// Bank metadata for all denominations. Standalone because startup needs
/// it before a `NodeClient` exists.
pub async fn denoms_metadata(channel: &Channel) -> Result<Vec<DenomMetadata>> {
    let mut client = bank::query_client::QueryClient::new(channel.clone());
    let resp = client
        .denoms_metadata(bank::QueryDenomsMetadataRequest::default())
        .await?
        .into_inner();
    Ok(resp
        .metadatas
        .into_iter()
        .map(|m| DenomMetadata {
            display: m.display,
            units: m
                .denom_units
                .into_iter()
                .map(|u| DenomUnit {
                    denom: u.denom,
                    exponent: u.exponent,
                })
                .collect(),
        })
        .collect())
}

/// Figures out which staking dialect the node speaks by probing known
/// query services, each with a short deadline. Standard modules are
/// tried first so that a node exposing both is treated as cosmos.
pub async fn detect_network_type(channel: &Channel) -> Result<NetworkType> {
    {
        let mut client = staking::query_client::QueryClient::new(channel.clone());
        let mut req = tonic::Request::new(staking::QueryParamsRequest {});
        req.set_timeout(PROBE_TIMEOUT);
        if client.params(req).await.is_ok() {
            return Ok(NetworkType::Cosmos);
        }
    }
    {
        let mut client = bank::query_client::QueryClient::new(channel.clone());
        let mut req = tonic::Request::new(bank::QueryParamsRequest {});
        req.set_timeout(PROBE_TIMEOUT);
        if client.params(req).await.is_ok() {
            return Ok(NetworkType::Cosmos);
        }
    }
    {
        let mut client = mint::query_client::QueryClient::new(channel.clone());
        let mut req = tonic::Request::new(mint::QueryParamsRequest {});
        req.set_timeout(PROBE_TIMEOUT);
        if client.params(req).await.is_ok() {
            return Ok(NetworkType::Cosmos);
        }
    }
    {
        let mut client = zenrock::ValidationQueryClient::new(channel.clone());
        if client.params().await.is_ok() {
            return Ok(NetworkType::Zenrock);
        }
    }
    Err(Error::UnknownNetworkType)
}

fn signing_info_from_proto(info: slashing::ValidatorSigningInfo) -> SigningInfo {
    SigningInfo {
        address: info.address,
        missed_blocks: info.missed_blocks_counter,
    }
}

fn int_coins(coins: Vec<ProtoCoin>) -> Result<Vec<Coin>> {
    coins
        .into_iter()
        .map(|c| {
            Ok(Coin {
                amount: parse_int(&c.amount, "coin amount")?,
                denom: c.denom,
            })
        })
        .collect()
}

fn dec_coins(coins: Vec<DecCoin>) -> Result<Vec<Coin>> {
    coins
        .into_iter()
        .map(|c| {
            Ok(Coin {
                amount: parse_dec(&c.amount, "coin amount")?,
                denom: c.denom,
            })
        })
        .collect()
}

fn dec_bytes(raw: &[u8], what: &str) -> Result<Decimal> {
    let s = std::str::from_utf8(raw)
        .map_err(|_| Error::MalformedResponse(format!("non-utf8 {what} value")))?;
    parse_dec(s, what)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn dec_bytes_parses_atomics() {
        // 13% inflation as an SDK Dec.
        let value = dec_bytes(b"130000000000000000", "inflation").unwrap();
        assert_eq!(value.to_f64(), 0.13);
    }

    #[test]
    fn dec_bytes_rejects_binary_garbage() {
        assert!(dec_bytes(&[0xff, 0xfe], "inflation").is_err());
    }

    #[test]
    fn dec_coins_keep_denoms() {
        let coins = dec_coins(vec![DecCoin {
            denom: "uatom".to_string(),
            amount: "2500000000000000000".to_string(),
        }])
        .unwrap();
        assert_eq!(coins[0].denom, "uatom");
        assert_eq!(coins[0].amount.to_f64(), 2.5);
    }
}
