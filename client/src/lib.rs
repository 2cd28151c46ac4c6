#![deny(unused_crate_dependencies)]
#![warn(unused_extern_crates)]
#![warn(unused_imports)]

//! Interactions with Cosmos-family nodes over gRPC and Tendermint RPC.

pub mod bech;
pub mod consensus;
pub mod decimal;
mod error;
pub mod node;
pub mod staking;
pub mod tendermint;
pub mod types;
pub mod zenrock;

pub use error::{Error, Result};

pub use consensus::ConsensusPubkey;
pub use decimal::Decimal;
pub use node::{denoms_metadata, detect_network_type, NodeClient};
pub use staking::StakingQuery;
pub use tendermint::TendermintClient;
pub use types::{
    BondStatus, Coin, Delegation, DelegatorReward, DenomMetadata, DenomUnit, NetworkType, Pool,
    Redelegation, SigningInfo, StakingParams, Unbonding, Validator,
};
