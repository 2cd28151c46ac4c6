//! Domain records shared by both staking dialects.
//!
//! Collectors only ever see these shapes; whether the numbers arrived as
//! SDK `Dec` atomics or zenrock display strings is the dialect's problem.

use std::str::FromStr;

use crate::{consensus::ConsensusPubkey, decimal::Decimal, error::Error};

/// Which staking query service the upstream node speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    /// The standard `cosmos.staking.v1beta1` module.
    Cosmos,
    /// The `zrchain.validation` variant.
    Zenrock,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Cosmos => "cosmos",
            NetworkType::Zenrock => "zenrock",
        }
    }
}

impl FromStr for NetworkType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "cosmos" => Ok(NetworkType::Cosmos),
            "zenrock" => Ok(NetworkType::Zenrock),
            other => Err(Error::MalformedResponse(format!(
                "unknown network type {other:?}"
            ))),
        }
    }
}

/// Validator state in the staking FSM, exposed as gauge values 0..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondStatus {
    Unspecified,
    Unbonded,
    Unbonding,
    Bonded,
}

impl BondStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => BondStatus::Unbonded,
            2 => BondStatus::Unbonding,
            3 => BondStatus::Bonded,
            _ => BondStatus::Unspecified,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            BondStatus::Unspecified => 0,
            BondStatus::Unbonded => 1,
            BondStatus::Unbonding => 2,
            BondStatus::Bonded => 3,
        }
    }
}

/// A single denomination amount.
#[derive(Debug, Clone)]
pub struct Coin {
    pub denom: String,
    pub amount: Decimal,
}

/// One validator of the set, as reported by either dialect.
#[derive(Debug, Clone)]
pub struct Validator {
    pub operator_address: String,
    pub moniker: String,
    pub consensus_pubkey: Option<ConsensusPubkey>,
    pub jailed: bool,
    pub status: BondStatus,
    pub tokens: Decimal,
    pub delegator_shares: Decimal,
    pub min_self_delegation: Decimal,
    pub commission_rate: Decimal,
}

/// Bonded / not-bonded token totals of the staking pool.
#[derive(Debug, Clone)]
pub struct Pool {
    pub bonded_tokens: Decimal,
    pub not_bonded_tokens: Decimal,
}

/// Staking module parameters.
#[derive(Debug, Clone)]
pub struct StakingParams {
    pub unbonding_time_seconds: f64,
    pub max_validators: u32,
    pub max_entries: u32,
    pub historical_entries: u32,
    pub bond_denom: String,
}

/// One delegation with its token balance.
#[derive(Debug, Clone)]
pub struct Delegation {
    pub delegator_address: String,
    pub validator_address: String,
    pub balance: Coin,
}

/// An unbonding delegation with its entries already summed.
#[derive(Debug, Clone)]
pub struct Unbonding {
    pub delegator_address: String,
    pub validator_address: String,
    pub balance: Decimal,
}

/// A redelegation with its entries already summed.
#[derive(Debug, Clone)]
pub struct Redelegation {
    pub delegator_address: String,
    pub src_validator_address: String,
    pub dst_validator_address: String,
    pub balance: Decimal,
}

/// Liveness record from the slashing module.
#[derive(Debug, Clone)]
pub struct SigningInfo {
    pub address: String,
    pub missed_blocks: i64,
}

/// Pending rewards of one delegator on one validator.
#[derive(Debug, Clone)]
pub struct DelegatorReward {
    pub validator_address: String,
    pub reward: Vec<Coin>,
}

/// One named unit of a denomination with its decimal exponent.
#[derive(Debug, Clone)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
}

/// Bank metadata describing a denomination.
#[derive(Debug, Clone)]
pub struct DenomMetadata {
    pub display: String,
    pub units: Vec<DenomUnit>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bond_status_codes_round_trip() {
        for code in 0..=3 {
            assert_eq!(BondStatus::from_code(code).code(), code as i64);
        }
        assert_eq!(BondStatus::from_code(42), BondStatus::Unspecified);
    }

    #[test]
    fn network_type_parses() {
        assert_eq!("cosmos".parse::<NetworkType>().unwrap(), NetworkType::Cosmos);
        assert_eq!(
            "zenrock".parse::<NetworkType>().unwrap(),
            NetworkType::Zenrock
        );
        assert!("osmosis".parse::<NetworkType>().is_err());
    }
}
