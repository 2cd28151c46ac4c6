//! The staking query seam and its standard `cosmos.staking.v1beta1`
//! implementation.

use async_trait::async_trait;
use cosmos_sdk_proto::cosmos::base::query::v1beta1::PageRequest;
use cosmos_sdk_proto::cosmos::staking::v1beta1 as staking;
use tonic::transport::Channel;

use crate::{
    consensus::ConsensusPubkey,
    decimal::{Decimal, DEC_SCALE},
    error::{Error, Result},
    types::{
        BondStatus, Coin, Delegation, NetworkType, Pool, Redelegation, StakingParams, Unbonding,
        Validator,
    },
    zenrock::ZenrockStakingClient,
};

/// Staking reads used by the collectors, independent of which query
/// service the node exposes.
#[async_trait]
pub trait StakingQuery: Send + Sync {
    async fn pool(&self) -> Result<Pool>;

    /// The full validator set, bonded or not, in upstream order.
    async fn validators(&self) -> Result<Vec<Validator>>;

    async fn validator(&self, operator_address: &str) -> Result<Validator>;

    async fn validator_delegations(&self, operator_address: &str) -> Result<Vec<Delegation>>;

    async fn delegator_delegations(&self, delegator_address: &str) -> Result<Vec<Delegation>>;

    async fn validator_unbondings(&self, operator_address: &str) -> Result<Vec<Unbonding>>;

    async fn delegator_unbondings(&self, delegator_address: &str) -> Result<Vec<Unbonding>>;

    /// Redelegations filtered by delegator or source validator; empty
    /// strings are wildcards.
    async fn redelegations(
        &self,
        delegator_address: &str,
        src_validator_address: &str,
    ) -> Result<Vec<Redelegation>>;

    async fn params(&self) -> Result<StakingParams>;
}

/// Picks the dialect implementation for a detected network type.
pub fn staking_client(
    network_type: NetworkType,
    channel: Channel,
    limit: u64,
) -> Box<dyn StakingQuery> {
    match network_type {
        NetworkType::Cosmos => Box::new(CosmosStakingClient::new(channel, limit)),
        NetworkType::Zenrock => Box::new(ZenrockStakingClient::new(channel, limit)),
    }
}

/// `cosmos.staking.v1beta1` over gRPC.
pub struct CosmosStakingClient {
    channel: Channel,
    limit: u64,
}

impl CosmosStakingClient {
    pub fn new(channel: Channel, limit: u64) -> Self {
        Self { channel, limit }
    }

    fn query(&self) -> staking::query_client::QueryClient<Channel> {
        staking::query_client::QueryClient::new(self.channel.clone())
    }

    fn page(&self) -> Option<PageRequest> {
        let mut page = PageRequest::default();
        page.limit = self.limit;
        Some(page)
    }
}

#[async_trait]
impl StakingQuery for CosmosStakingClient {
    async fn pool(&self) -> Result<Pool> {
        let resp = self
            .query()
            .pool(staking::QueryPoolRequest {})
            .await?
            .into_inner();
        let pool = resp
            .pool
            .ok_or_else(|| Error::MalformedResponse("staking pool response without pool".into()))?;
        Ok(Pool {
            bonded_tokens: parse_int(&pool.bonded_tokens, "pool.bonded_tokens")?,
            not_bonded_tokens: parse_int(&pool.not_bonded_tokens, "pool.not_bonded_tokens")?,
        })
    }

    async fn validators(&self) -> Result<Vec<Validator>> {
        let mut req = staking::QueryValidatorsRequest::default();
        req.pagination = self.page();
        let resp = self.query().validators(req).await?.into_inner();
        resp.validators.iter().map(validator_from_proto).collect()
    }

    async fn validator(&self, operator_address: &str) -> Result<Validator> {
        let resp = self
            .query()
            .validator(staking::QueryValidatorRequest {
                validator_addr: operator_address.to_string(),
            })
            .await?
            .into_inner();
        let validator = resp.validator.ok_or_else(|| {
            Error::MalformedResponse("validator response without validator".into())
        })?;
        validator_from_proto(&validator)
    }

    async fn validator_delegations(&self, operator_address: &str) -> Result<Vec<Delegation>> {
        let mut req = staking::QueryValidatorDelegationsRequest::default();
        req.validator_addr = operator_address.to_string();
        req.pagination = self.page();
        let resp = self.query().validator_delegations(req).await?.into_inner();
        resp.delegation_responses
            .into_iter()
            .map(delegation_from_proto)
            .collect()
    }

    async fn delegator_delegations(&self, delegator_address: &str) -> Result<Vec<Delegation>> {
        let mut req = staking::QueryDelegatorDelegationsRequest::default();
        req.delegator_addr = delegator_address.to_string();
        req.pagination = self.page();
        let resp = self.query().delegator_delegations(req).await?.into_inner();
        resp.delegation_responses
            .into_iter()
            .map(delegation_from_proto)
            .collect()
    }

    async fn validator_unbondings(&self, operator_address: &str) -> Result<Vec<Unbonding>> {
        let mut req = staking::QueryValidatorUnbondingDelegationsRequest::default();
        req.validator_addr = operator_address.to_string();
        req.pagination = self.page();
        let resp = self
            .query()
            .validator_unbonding_delegations(req)
            .await?
            .into_inner();
        resp.unbonding_responses
            .into_iter()
            .map(unbonding_from_proto)
            .collect()
    }

    async fn delegator_unbondings(&self, delegator_address: &str) -> Result<Vec<Unbonding>> {
        let mut req = staking::QueryDelegatorUnbondingDelegationsRequest::default();
        req.delegator_addr = delegator_address.to_string();
        req.pagination = self.page();
        let resp = self
            .query()
            .delegator_unbonding_delegations(req)
            .await?
            .into_inner();
        resp.unbonding_responses
            .into_iter()
            .map(unbonding_from_proto)
            .collect()
    }

    async fn redelegations(
        &self,
        delegator_address: &str,
        src_validator_address: &str,
    ) -> Result<Vec<Redelegation>> {
        let mut req = staking::QueryRedelegationsRequest::default();
        req.delegator_addr = delegator_address.to_string();
        req.src_validator_addr = src_validator_address.to_string();
        req.pagination = self.page();
        let resp = self.query().redelegations(req).await?.into_inner();
        resp.redelegation_responses
            .into_iter()
            .map(|entry| {
                let redelegation = entry.redelegation.ok_or_else(|| {
                    Error::MalformedResponse("redelegation response without redelegation".into())
                })?;
                let mut balance = Decimal::zero();
                for e in &entry.entries {
                    balance = balance + parse_int(&e.balance, "redelegation entry balance")?;
                }
                Ok(Redelegation {
                    delegator_address: redelegation.delegator_address,
                    src_validator_address: redelegation.validator_src_address,
                    dst_validator_address: redelegation.validator_dst_address,
                    balance,
                })
            })
            .collect()
    }

    async fn params(&self) -> Result<StakingParams> {
        let resp = self
            .query()
            .params(staking::QueryParamsRequest {})
            .await?
            .into_inner();
        let params = resp.params.ok_or_else(|| {
            Error::MalformedResponse("staking params response without params".into())
        })?;
        Ok(StakingParams {
            unbonding_time_seconds: params
                .unbonding_time
                .map(|d| d.seconds as f64)
                .unwrap_or_default(),
            max_validators: params.max_validators,
            max_entries: params.max_entries,
            historical_entries: params.historical_entries,
            bond_denom: params.bond_denom,
        })
    }
}

/// SDK `Dec` fields arrive as 18-decimal fixed-point mantissa strings.
pub(crate) fn parse_dec(s: &str, what: &str) -> Result<Decimal> {
    Decimal::from_atomics(s, DEC_SCALE)
        .map_err(|_| Error::MalformedResponse(format!("bad {what} decimal {s:?}")))
}

/// SDK `Int` fields arrive as plain base-10 integer strings.
pub(crate) fn parse_int(s: &str, what: &str) -> Result<Decimal> {
    Decimal::parse(s).map_err(|_| Error::MalformedResponse(format!("bad {what} integer {s:?}")))
}

fn validator_from_proto(v: &staking::Validator) -> Result<Validator> {
    let consensus_pubkey = match &v.consensus_pubkey {
        Some(any) => match ConsensusPubkey::from_any(&any.type_url, &any.value) {
            Ok(pk) => Some(pk),
            Err(err) => {
                tracing::warn!(
                    operator_address = %v.operator_address,
                    %err,
                    "skipping undecodable consensus pubkey"
                );
                None
            }
        },
        None => None,
    };
    let commission_rate = v
        .commission
        .as_ref()
        .and_then(|c| c.commission_rates.as_ref())
        .map(|r| parse_dec(&r.rate, "commission rate"))
        .transpose()?
        .unwrap_or_else(Decimal::zero);
    Ok(Validator {
        operator_address: v.operator_address.clone(),
        moniker: v
            .description
            .as_ref()
            .map(|d| d.moniker.clone())
            .unwrap_or_default(),
        consensus_pubkey,
        jailed: v.jailed,
        status: BondStatus::from_code(v.status),
        tokens: parse_int(&v.tokens, "validator tokens")?,
        delegator_shares: parse_dec(&v.delegator_shares, "delegator shares")?,
        min_self_delegation: parse_int(&v.min_self_delegation, "min self delegation")?,
        commission_rate,
    })
}

fn delegation_from_proto(resp: staking::DelegationResponse) -> Result<Delegation> {
    let delegation = resp.delegation.ok_or_else(|| {
        Error::MalformedResponse("delegation response without delegation".into())
    })?;
    let balance = resp
        .balance
        .ok_or_else(|| Error::MalformedResponse("delegation response without balance".into()))?;
    Ok(Delegation {
        delegator_address: delegation.delegator_address,
        validator_address: delegation.validator_address,
        balance: Coin {
            amount: parse_int(&balance.amount, "delegation balance")?,
            denom: balance.denom,
        },
    })
}

fn unbonding_from_proto(u: staking::UnbondingDelegation) -> Result<Unbonding> {
    let mut balance = Decimal::zero();
    for entry in &u.entries {
        balance = balance + parse_int(&entry.balance, "unbonding entry balance")?;
    }
    Ok(Unbonding {
        delegator_address: u.delegator_address,
        validator_address: u.validator_address,
        balance,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn proto_validator() -> staking::Validator {
        let mut v = staking::Validator::default();
        v.operator_address = "cosmosvaloper1qqqqq".to_string();
        v.jailed = true;
        v.status = 3;
        v.tokens = "1500000".to_string();
        v.delegator_shares = "1500000000000000000000000".to_string();
        v.min_self_delegation = "1".to_string();
        v.description = Some({
            let mut d = staking::Description::default();
            d.moniker = "node one".to_string();
            d
        });
        v.commission = Some({
            let mut c = staking::Commission::default();
            c.commission_rates = Some({
                let mut r = staking::CommissionRates::default();
                r.rate = "50000000000000000".to_string();
                r
            });
            c
        });
        v
    }

    #[test]
    fn converts_validator_fields() {
        let v = validator_from_proto(&proto_validator()).unwrap();
        assert_eq!(v.moniker, "node one");
        assert_eq!(v.status, BondStatus::Bonded);
        assert!(v.jailed);
        assert_eq!(v.tokens.to_f64(), 1_500_000.0);
        // Shares come in as 18-decimal atomics, so both land on the same
        // token amount.
        assert_eq!(v.delegator_shares.to_f64(), 1_500_000.0);
        assert_eq!(v.commission_rate.to_f64(), 0.05);
        assert!(v.consensus_pubkey.is_none());
    }

    #[test]
    fn rejects_garbled_tokens() {
        let mut v = proto_validator();
        v.tokens = "not-a-number".to_string();
        assert!(validator_from_proto(&v).is_err());
    }

    #[test]
    fn unbonding_entries_are_summed() {
        let mut u = staking::UnbondingDelegation::default();
        u.delegator_address = "cosmos1del".to_string();
        u.validator_address = "cosmosvaloper1val".to_string();
        for balance in ["100", "250"] {
            let mut e = staking::UnbondingDelegationEntry::default();
            e.balance = balance.to_string();
            u.entries.push(e);
        }
        let unbonding = unbonding_from_proto(u).unwrap();
        assert_eq!(unbonding.balance.to_f64(), 350.0);
    }
}
