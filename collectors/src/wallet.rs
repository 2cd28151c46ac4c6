//! Wallet metrics behind `/metrics/wallet?address=...`.

use std::sync::Arc;

use client::bech;
use prometheus::{GaugeVec, Registry};

use crate::{
    error::{Error, Result},
    registry::{gauge_vec, render},
    ExporterContext,
};

/// Scrapes one account: balances, stake positions, and pending rewards.
pub async fn collect(ctx: Arc<ExporterContext>, address: &str) -> Result<String> {
    bech::decode(&ctx.prefixes.account, address)
        .map_err(|err| Error::BadRequest(format!("invalid account address: {err}")))?;

    let registry = Registry::new();
    let balance = gauge_vec(
        &registry,
        "cosmos_wallet_balance",
        "Bank balance of the wallet",
        &["address", "denom"],
        &ctx.chain_id,
    )?;
    let delegations = gauge_vec(
        &registry,
        "cosmos_wallet_delegations",
        "Delegations of the wallet",
        &["address", "denom", "delegated_to"],
        &ctx.chain_id,
    )?;
    let redelegations = gauge_vec(
        &registry,
        "cosmos_wallet_redelegations",
        "Redelegations of the wallet",
        &["address", "denom", "redelegated_from", "redelegated_to"],
        &ctx.chain_id,
    )?;
    let unbondings = gauge_vec(
        &registry,
        "cosmos_wallet_unbondings",
        "Unbonding delegations of the wallet",
        &["address", "denom", "unbonded_from"],
        &ctx.chain_id,
    )?;
    let rewards = gauge_vec(
        &registry,
        "cosmos_wallet_rewards",
        "Pending rewards of the wallet",
        &["address", "denom", "validator_address"],
        &ctx.chain_id,
    )?;

    let tasks = vec![
        tokio::spawn(balance_task(ctx.clone(), address.to_string(), balance)),
        tokio::spawn(delegations_task(ctx.clone(), address.to_string(), delegations)),
        tokio::spawn(unbondings_task(ctx.clone(), address.to_string(), unbondings)),
        tokio::spawn(redelegations_task(
            ctx.clone(),
            address.to_string(),
            redelegations,
        )),
        tokio::spawn(rewards_task(ctx.clone(), address.to_string(), rewards)),
    ];
    crate::join_tasks(tasks).await;

    render(&registry)
}

async fn balance_task(ctx: Arc<ExporterContext>, address: String, family: GaugeVec) {
    match ctx.client.all_balances(&address).await {
        Ok(coins) => {
            for coin in coins {
                family
                    .with_label_values(&[&address, &coin.denom])
                    .set(ctx.scale(&coin.amount));
            }
        }
        Err(err) => tracing::error!(%address, %err, "could not get balance"),
    }
}

async fn delegations_task(ctx: Arc<ExporterContext>, address: String, family: GaugeVec) {
    match ctx.client.staking().delegator_delegations(&address).await {
        Ok(delegations) => {
            for delegation in delegations {
                family
                    .with_label_values(&[
                        &address,
                        &delegation.balance.denom,
                        &delegation.validator_address,
                    ])
                    .set(ctx.scale(&delegation.balance.amount));
            }
        }
        Err(err) => tracing::error!(%address, %err, "could not get delegations"),
    }
}

async fn unbondings_task(ctx: Arc<ExporterContext>, address: String, family: GaugeVec) {
    match ctx.client.staking().delegator_unbondings(&address).await {
        Ok(unbondings) => {
            for unbonding in unbondings {
                // The response carries no denomination; unbondings are
                // always in the bond denom.
                family
                    .with_label_values(&[
                        &unbonding.delegator_address,
                        &ctx.denom,
                        &unbonding.validator_address,
                    ])
                    .set(ctx.scale(&unbonding.balance));
            }
        }
        Err(err) => tracing::error!(%address, %err, "could not get unbonding delegations"),
    }
}

async fn redelegations_task(ctx: Arc<ExporterContext>, address: String, family: GaugeVec) {
    match ctx.client.staking().redelegations(&address, "").await {
        Ok(redelegations) => {
            for redelegation in redelegations {
                family
                    .with_label_values(&[
                        &redelegation.delegator_address,
                        &ctx.denom,
                        &redelegation.src_validator_address,
                        &redelegation.dst_validator_address,
                    ])
                    .set(ctx.scale(&redelegation.balance));
            }
        }
        Err(err) => tracing::error!(%address, %err, "could not get redelegations"),
    }
}

async fn rewards_task(ctx: Arc<ExporterContext>, address: String, family: GaugeVec) {
    match ctx.client.delegation_total_rewards(&address).await {
        Ok(validator_rewards) => {
            for reward in validator_rewards {
                for coin in reward.reward {
                    family
                        .with_label_values(&[&address, &coin.denom, &reward.validator_address])
                        .set(ctx.scale(&coin.amount));
                }
            }
        }
        Err(err) => tracing::error!(%address, %err, "could not get rewards"),
    }
}
