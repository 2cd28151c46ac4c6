//! The `zrchain.validation` staking dialect.
//!
//! Zenrock chains expose a fork of the staking module under a different
//! gRPC service name with slightly different wire types: the consensus
//! pubkey is a plain string instead of an `Any`, and numeric fields are
//! display strings rather than 18-decimal atomics.

use async_trait::async_trait;
use base64::Engine;
use cosmos_sdk_proto::cosmos::base::query::v1beta1::PageRequest;
use cosmos_sdk_proto::cosmos::base::v1beta1::Coin as ProtoCoin;
use prost::Message;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

use crate::{
    consensus::ConsensusPubkey,
    decimal::Decimal,
    error::{Error, Result},
    staking::StakingQuery,
    types::{
        BondStatus, Coin, Delegation, Pool as PoolTotals, Redelegation as RedelegationTotals,
        StakingParams, Unbonding, Validator as DomainValidator,
    },
};

// Wire messages of zrchain.validation. The module ships no proto
// descriptors, so these mirror the chain's published message layouts.

#[derive(Clone, PartialEq, Message)]
pub struct QueryPoolRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct QueryPoolResponse {
    #[prost(message, optional, tag = "1")]
    pub pool: Option<Pool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Pool {
    #[prost(string, tag = "1")]
    pub not_bonded_tokens: String,
    #[prost(string, tag = "2")]
    pub bonded_tokens: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryParamsRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct QueryParamsResponse {
    #[prost(message, optional, tag = "1")]
    pub params: Option<Params>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Params {
    #[prost(int64, tag = "1")]
    pub unbonding_time: i64,
    #[prost(uint32, tag = "2")]
    pub max_validators: u32,
    #[prost(uint32, tag = "3")]
    pub max_entries: u32,
    #[prost(uint32, tag = "4")]
    pub historical_entries: u32,
    #[prost(string, tag = "5")]
    pub bond_denom: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorsRequest {
    #[prost(string, tag = "1")]
    pub status: String,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorsResponse {
    #[prost(message, repeated, tag = "1")]
    pub validators: Vec<Validator>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorRequest {
    #[prost(string, tag = "1")]
    pub validator_addr: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorResponse {
    #[prost(message, optional, tag = "1")]
    pub validator: Option<Validator>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Validator {
    #[prost(string, tag = "1")]
    pub operator_address: String,
    #[prost(string, tag = "2")]
    pub consensus_pubkey: String,
    #[prost(bool, tag = "3")]
    pub jailed: bool,
    #[prost(int32, tag = "4")]
    pub status: i32,
    #[prost(string, tag = "5")]
    pub tokens: String,
    #[prost(string, tag = "6")]
    pub delegator_shares: String,
    #[prost(message, optional, tag = "7")]
    pub description: Option<Description>,
    #[prost(int64, tag = "8")]
    pub unbonding_height: i64,
    #[prost(int64, tag = "9")]
    pub unbonding_time: i64,
    #[prost(message, optional, tag = "10")]
    pub commission: Option<Commission>,
    #[prost(string, tag = "11")]
    pub min_self_delegation: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Description {
    #[prost(string, tag = "1")]
    pub moniker: String,
    #[prost(string, tag = "2")]
    pub identity: String,
    #[prost(string, tag = "3")]
    pub website: String,
    #[prost(string, tag = "4")]
    pub security_contact: String,
    #[prost(string, tag = "5")]
    pub details: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Commission {
    #[prost(message, optional, tag = "1")]
    pub commission_rates: Option<CommissionRates>,
    #[prost(int64, tag = "2")]
    pub update_time: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct CommissionRates {
    #[prost(string, tag = "1")]
    pub rate: String,
    #[prost(string, tag = "2")]
    pub max_rate: String,
    #[prost(string, tag = "3")]
    pub max_change_rate: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorDelegationsRequest {
    #[prost(string, tag = "1")]
    pub validator_addr: String,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorDelegationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub delegation_responses: Vec<DelegationResponse>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryDelegatorDelegationsRequest {
    #[prost(string, tag = "1")]
    pub delegator_addr: String,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryDelegatorDelegationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub delegation_responses: Vec<DelegationResponse>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DelegationResponse {
    #[prost(message, optional, tag = "1")]
    pub delegation: Option<WireDelegation>,
    #[prost(message, optional, tag = "2")]
    pub balance: Option<ProtoCoin>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireDelegation {
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    #[prost(string, tag = "2")]
    pub validator_address: String,
    #[prost(string, tag = "3")]
    pub shares: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorUnbondingDelegationsRequest {
    #[prost(string, tag = "1")]
    pub validator_addr: String,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorUnbondingDelegationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub unbonding_responses: Vec<UnbondingDelegation>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryDelegatorUnbondingDelegationsRequest {
    #[prost(string, tag = "1")]
    pub delegator_addr: String,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryDelegatorUnbondingDelegationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub unbonding_responses: Vec<UnbondingDelegation>,
}

#[derive(Clone, PartialEq, Message)]
pub struct UnbondingDelegation {
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    #[prost(string, tag = "2")]
    pub validator_address: String,
    #[prost(message, repeated, tag = "3")]
    pub entries: Vec<UnbondingEntry>,
}

#[derive(Clone, PartialEq, Message)]
pub struct UnbondingEntry {
    #[prost(int64, tag = "1")]
    pub creation_height: i64,
    #[prost(int64, tag = "2")]
    pub completion_time: i64,
    #[prost(string, tag = "3")]
    pub initial_balance: String,
    #[prost(string, tag = "4")]
    pub balance: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryRedelegationsRequest {
    #[prost(string, tag = "1")]
    pub delegator_addr: String,
    #[prost(string, tag = "2")]
    pub src_validator_addr: String,
    #[prost(string, tag = "3")]
    pub dst_validator_addr: String,
    #[prost(message, optional, tag = "4")]
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryRedelegationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub redelegation_responses: Vec<RedelegationResponse>,
}

#[derive(Clone, PartialEq, Message)]
pub struct RedelegationResponse {
    #[prost(message, optional, tag = "1")]
    pub redelegation: Option<Redelegation>,
    #[prost(message, repeated, tag = "2")]
    pub entries: Vec<RedelegationEntryResponse>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Redelegation {
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    #[prost(string, tag = "2")]
    pub validator_src_address: String,
    #[prost(string, tag = "3")]
    pub validator_dst_address: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct RedelegationEntryResponse {
    #[prost(string, tag = "4")]
    pub balance: String,
}

/// Raw gRPC client for `zrchain.validation.Query`.
pub struct ValidationQueryClient {
    inner: tonic::client::Grpc<Channel>,
}

impl ValidationQueryClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    async fn unary<Req, Resp>(&mut self, path: &'static str, request: Req) -> Result<Resp>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::unknown(format!("service not ready: {e}"))
        })?;
        let codec = tonic::codec::ProstCodec::default();
        let response = self
            .inner
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await?;
        Ok(response.into_inner())
    }

    pub async fn pool(&mut self) -> Result<QueryPoolResponse> {
        self.unary("/zrchain.validation.Query/Pool", QueryPoolRequest {})
            .await
    }

    pub async fn params(&mut self) -> Result<QueryParamsResponse> {
        self.unary("/zrchain.validation.Query/Params", QueryParamsRequest {})
            .await
    }

    pub async fn validators(
        &mut self,
        request: QueryValidatorsRequest,
    ) -> Result<QueryValidatorsResponse> {
        self.unary("/zrchain.validation.Query/Validators", request)
            .await
    }

    pub async fn validator(
        &mut self,
        request: QueryValidatorRequest,
    ) -> Result<QueryValidatorResponse> {
        self.unary("/zrchain.validation.Query/Validator", request)
            .await
    }

    pub async fn validator_delegations(
        &mut self,
        request: QueryValidatorDelegationsRequest,
    ) -> Result<QueryValidatorDelegationsResponse> {
        self.unary("/zrchain.validation.Query/ValidatorDelegations", request)
            .await
    }

    pub async fn delegator_delegations(
        &mut self,
        request: QueryDelegatorDelegationsRequest,
    ) -> Result<QueryDelegatorDelegationsResponse> {
        self.unary("/zrchain.validation.Query/DelegatorDelegations", request)
            .await
    }

    pub async fn validator_unbonding_delegations(
        &mut self,
        request: QueryValidatorUnbondingDelegationsRequest,
    ) -> Result<QueryValidatorUnbondingDelegationsResponse> {
        self.unary(
            "/zrchain.validation.Query/ValidatorUnbondingDelegations",
            request,
        )
        .await
    }

    pub async fn delegator_unbonding_delegations(
        &mut self,
        request: QueryDelegatorUnbondingDelegationsRequest,
    ) -> Result<QueryDelegatorUnbondingDelegationsResponse> {
        self.unary(
            "/zrchain.validation.Query/DelegatorUnbondingDelegations",
            request,
        )
        .await
    }

    pub async fn redelegations(
        &mut self,
        request: QueryRedelegationsRequest,
    ) -> Result<QueryRedelegationsResponse> {
        self.unary("/zrchain.validation.Query/Redelegations", request)
            .await
    }
}

/// `zrchain.validation` behind the common staking seam.
pub struct ZenrockStakingClient {
    channel: Channel,
    limit: u64,
}

impl ZenrockStakingClient {
    pub fn new(channel: Channel, limit: u64) -> Self {
        Self { channel, limit }
    }

    fn query(&self) -> ValidationQueryClient {
        ValidationQueryClient::new(self.channel.clone())
    }

    fn page(&self) -> Option<PageRequest> {
        let mut page = PageRequest::default();
        page.limit = self.limit;
        Some(page)
    }
}

#[async_trait]
impl StakingQuery for ZenrockStakingClient {
    async fn pool(&self) -> Result<PoolTotals> {
        let resp = self.query().pool().await?;
        let pool = resp
            .pool
            .ok_or_else(|| Error::MalformedResponse("pool response without pool".into()))?;
        Ok(PoolTotals {
            bonded_tokens: parse_display(&pool.bonded_tokens, "pool.bonded_tokens")?,
            not_bonded_tokens: parse_display(&pool.not_bonded_tokens, "pool.not_bonded_tokens")?,
        })
    }

    async fn validators(&self) -> Result<Vec<DomainValidator>> {
        let resp = self
            .query()
            .validators(QueryValidatorsRequest {
                status: String::new(),
                pagination: self.page(),
            })
            .await?;
        resp.validators.iter().map(validator_from_wire).collect()
    }

    async fn validator(&self, operator_address: &str) -> Result<DomainValidator> {
        let resp = self
            .query()
            .validator(QueryValidatorRequest {
                validator_addr: operator_address.to_string(),
            })
            .await?;
        let validator = resp.validator.ok_or_else(|| {
            Error::MalformedResponse("validator response without validator".into())
        })?;
        validator_from_wire(&validator)
    }

    async fn validator_delegations(&self, operator_address: &str) -> Result<Vec<Delegation>> {
        let resp = self
            .query()
            .validator_delegations(QueryValidatorDelegationsRequest {
                validator_addr: operator_address.to_string(),
                pagination: self.page(),
            })
            .await?;
        resp.delegation_responses
            .into_iter()
            .map(delegation_from_wire)
            .collect()
    }

    async fn delegator_delegations(&self, delegator_address: &str) -> Result<Vec<Delegation>> {
        let resp = self
            .query()
            .delegator_delegations(QueryDelegatorDelegationsRequest {
                delegator_addr: delegator_address.to_string(),
                pagination: self.page(),
            })
            .await?;
        resp.delegation_responses
            .into_iter()
            .map(delegation_from_wire)
            .collect()
    }

    async fn validator_unbondings(&self, operator_address: &str) -> Result<Vec<Unbonding>> {
        let resp = self
            .query()
            .validator_unbonding_delegations(QueryValidatorUnbondingDelegationsRequest {
                validator_addr: operator_address.to_string(),
                pagination: self.page(),
            })
            .await?;
        resp.unbonding_responses
            .into_iter()
            .map(unbonding_from_wire)
            .collect()
    }

    async fn delegator_unbondings(&self, delegator_address: &str) -> Result<Vec<Unbonding>> {
        let resp = self
            .query()
            .delegator_unbonding_delegations(QueryDelegatorUnbondingDelegationsRequest {
                delegator_addr: delegator_address.to_string(),
                pagination: self.page(),
            })
            .await?;
        resp.unbonding_responses
            .into_iter()
            .map(unbonding_from_wire)
            .collect()
    }

    async fn redelegations(
        &self,
        delegator_address: &str,
        src_validator_address: &str,
    ) -> Result<Vec<RedelegationTotals>> {
        let resp = self
            .query()
            .redelegations(QueryRedelegationsRequest {
                delegator_addr: delegator_address.to_string(),
                src_validator_addr: src_validator_address.to_string(),
                dst_validator_addr: String::new(),
                pagination: self.page(),
            })
            .await?;
        resp.redelegation_responses
            .into_iter()
            .map(|entry| {
                let redelegation = entry.redelegation.ok_or_else(|| {
                    Error::MalformedResponse("redelegation response without redelegation".into())
                })?;
                let mut balance = Decimal::zero();
                for e in &entry.entries {
                    balance = balance + parse_display(&e.balance, "redelegation entry balance")?;
                }
                Ok(RedelegationTotals {
                    delegator_address: redelegation.delegator_address,
                    src_validator_address: redelegation.validator_src_address,
                    dst_validator_address: redelegation.validator_dst_address,
                    balance,
                })
            })
            .collect()
    }

    async fn params(&self) -> Result<StakingParams> {
        let resp = self.query().params().await?;
        let params = resp
            .params
            .ok_or_else(|| Error::MalformedResponse("params response without params".into()))?;
        Ok(StakingParams {
            unbonding_time_seconds: params.unbonding_time as f64,
            max_validators: params.max_validators,
            max_entries: params.max_entries,
            historical_entries: params.historical_entries,
            bond_denom: params.bond_denom,
        })
    }
}

/// Zenrock numbers come over the wire as display strings ("123.456"),
/// never as atomics.
fn parse_display(s: &str, what: &str) -> Result<Decimal> {
    Decimal::parse(s).map_err(|_| Error::MalformedResponse(format!("bad {what} value {s:?}")))
}

fn validator_from_wire(v: &Validator) -> Result<DomainValidator> {
    let consensus_pubkey = if v.consensus_pubkey.is_empty() {
        None
    } else {
        // The chain serializes the key as base64; tolerate raw bytes in
        // case a node hands the field through unencoded.
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&v.consensus_pubkey)
            .unwrap_or_else(|_| v.consensus_pubkey.clone().into_bytes());
        Some(ConsensusPubkey::Ed25519(bytes))
    };
    let commission_rate = v
        .commission
        .as_ref()
        .and_then(|c| c.commission_rates.as_ref())
        .map(|r| parse_display(&r.rate, "commission rate"))
        .transpose()?
        .unwrap_or_else(Decimal::zero);
    Ok(DomainValidator {
        operator_address: v.operator_address.clone(),
        moniker: v
            .description
            .as_ref()
            .map(|d| d.moniker.clone())
            .unwrap_or_default(),
        consensus_pubkey,
        jailed: v.jailed,
        status: BondStatus::from_code(v.status),
        tokens: parse_display(&v.tokens, "validator tokens")?,
        delegator_shares: parse_display(&v.delegator_shares, "delegator shares")?,
        min_self_delegation: parse_display(&v.min_self_delegation, "min self delegation")?,
        commission_rate,
    })
}

fn delegation_from_wire(resp: DelegationResponse) -> Result<Delegation> {
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
            amount: parse_display(&balance.amount, "delegation balance")?,
            denom: balance.denom,
        },
    })
}

fn unbonding_from_wire(u: UnbondingDelegation) -> Result<Unbonding> {
    let mut balance = Decimal::zero();
    for entry in &u.entries {
        balance = balance + parse_display(&entry.balance, "unbonding entry balance")?;
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

    fn wire_validator() -> Validator {
        let mut v = Validator::default();
        v.operator_address = "zenvaloper1abc".to_string();
        v.consensus_pubkey =
            base64::engine::general_purpose::STANDARD.encode([9u8; 32]);
        v.status = 3;
        v.tokens = "200".to_string();
        v.delegator_shares = "200.5".to_string();
        v.min_self_delegation = "1".to_string();
        v.description = Some(Description {
            moniker: "zen node".to_string(),
            ..Default::default()
        });
        v.commission = Some(Commission {
            commission_rates: Some(CommissionRates {
                rate: "0.1".to_string(),
                ..Default::default()
            }),
            update_time: 0,
        });
        v
    }

    #[test]
    fn converts_display_strings() {
        let v = validator_from_wire(&wire_validator()).unwrap();
        assert_eq!(v.moniker, "zen node");
        assert_eq!(v.tokens.to_f64(), 200.0);
        assert_eq!(v.delegator_shares.to_f64(), 200.5);
        assert_eq!(v.commission_rate.to_f64(), 0.1);
        assert_eq!(
            v.consensus_pubkey,
            Some(ConsensusPubkey::Ed25519(vec![9u8; 32]))
        );
    }

    #[test]
    fn empty_pubkey_becomes_none() {
        let mut v = wire_validator();
        v.consensus_pubkey.clear();
        assert!(validator_from_wire(&v).unwrap().consensus_pubkey.is_none());
    }

    #[test]
    fn round_trips_validators_request() {
        let req = QueryValidatorsRequest {
            status: "BOND_STATUS_BONDED".to_string(),
            pagination: Some({
                let mut p = PageRequest::default();
                p.limit = 1000;
                p
            }),
        };
        let decoded = QueryValidatorsRequest::decode(req.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, req);
    }
}
