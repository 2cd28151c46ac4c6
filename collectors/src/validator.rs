//! Single-validator metrics behind `/metrics/validator?address=...`.

use std::sync::Arc;

use client::{bech, BondStatus};
use prometheus::{GaugeVec, Registry};

use crate::{
    error::{Error, Result},
    registry::{gauge_vec, render},
    resolve_consensus_address,
    sanitize::sanitize_utf8,
    validators::sort_by_shares,
    ExporterContext,
};

/// Scrapes one validator: stake, commission, liveness, and the
/// delegations pointing at it.
pub async fn collect(ctx: Arc<ExporterContext>, address: &str) -> Result<String> {
    bech::decode(&ctx.prefixes.validator, address)
        .map_err(|err| Error::BadRequest(format!("invalid validator address: {err}")))?;

    let registry = Registry::new();
    let delegations = gauge_vec(
        &registry,
        "cosmos_validator_delegations",
        "Delegations to the validator",
        &["address", "moniker", "denom", "delegated_by"],
        &ctx.chain_id,
    )?;
    let tokens = gauge_vec(
        &registry,
        "cosmos_validator_tokens",
        "Tokens bonded to the validator",
        &["address", "moniker", "denom"],
        &ctx.chain_id,
    )?;
    let delegator_shares = gauge_vec(
        &registry,
        "cosmos_validator_delegators_shares",
        "Delegator shares of the validator",
        &["address", "moniker", "denom"],
        &ctx.chain_id,
    )?;
    let commission_rate = gauge_vec(
        &registry,
        "cosmos_validator_commission_rate",
        "Commission rate of the validator",
        &["address", "moniker"],
        &ctx.chain_id,
    )?;
    let commission = gauge_vec(
        &registry,
        "cosmos_validator_commission",
        "Accumulated commission of the validator",
        &["address", "moniker", "denom"],
        &ctx.chain_id,
    )?;
    let rewards = gauge_vec(
        &registry,
        "cosmos_validator_rewards",
        "Outstanding rewards of the validator",
        &["address", "moniker", "denom"],
        &ctx.chain_id,
    )?;
    let unbondings = gauge_vec(
        &registry,
        "cosmos_validator_unbondings",
        "Unbonding delegations from the validator",
        &["address", "moniker", "denom", "unbonded_by"],
        &ctx.chain_id,
    )?;
    let redelegations = gauge_vec(
        &registry,
        "cosmos_validator_redelegations",
        "Redelegations away from the validator",
        &["address", "moniker", "denom", "redelegated_by", "redelegated_to"],
        &ctx.chain_id,
    )?;
    let missed_blocks = gauge_vec(
        &registry,
        "cosmos_validator_missed_blocks",
        "Missed blocks of the validator",
        &["address", "moniker"],
        &ctx.chain_id,
    )?;
    let rank = gauge_vec(
        &registry,
        "cosmos_validator_rank",
        "Rank of the validator by delegator shares",
        &["address", "moniker"],
        &ctx.chain_id,
    )?;
    let active = gauge_vec(
        &registry,
        "cosmos_validator_active",
        "1 if the validator is in the active set",
        &["address", "moniker"],
        &ctx.chain_id,
    )?;
    let status = gauge_vec(
        &registry,
        "cosmos_validator_status",
        "Bond status of the validator",
        &["address", "moniker"],
        &ctx.chain_id,
    )?;
    let jailed = gauge_vec(
        &registry,
        "cosmos_validator_jailed",
        "1 if the validator is jailed",
        &["address", "moniker"],
        &ctx.chain_id,
    )?;

    // Everything else hangs off the validator record, so this one is
    // allowed to fail the scrape.
    let validator = ctx.client.staking().validator(address).await?;
    let moniker = sanitize_utf8(validator.moniker.as_bytes());

    tokens
        .with_label_values(&[address, &moniker, &ctx.denom])
        .set(ctx.scale(&validator.tokens));
    delegator_shares
        .with_label_values(&[address, &moniker, &ctx.denom])
        .set(ctx.scale(&validator.delegator_shares));
    commission_rate
        .with_label_values(&[address, &moniker])
        .set(validator.commission_rate.to_f64());
    status
        .with_label_values(&[address, &moniker])
        .set(validator.status.code() as f64);
    jailed
        .with_label_values(&[address, &moniker])
        .set(if validator.jailed { 1.0 } else { 0.0 });

    let tasks = vec![
        tokio::spawn(delegations_task(
            ctx.clone(),
            address.to_string(),
            moniker.clone(),
            delegations,
        )),
        tokio::spawn(commission_task(
            ctx.clone(),
            address.to_string(),
            moniker.clone(),
            commission,
        )),
        tokio::spawn(rewards_task(
            ctx.clone(),
            address.to_string(),
            moniker.clone(),
            rewards,
        )),
        tokio::spawn(unbondings_task(
            ctx.clone(),
            address.to_string(),
            moniker.clone(),
            unbondings,
        )),
        tokio::spawn(redelegations_task(
            ctx.clone(),
            address.to_string(),
            moniker.clone(),
            redelegations,
        )),
        tokio::spawn(signing_task(
            ctx.clone(),
            validator.clone(),
            moniker.clone(),
            missed_blocks,
        )),
        tokio::spawn(rank_task(
            ctx.clone(),
            address.to_string(),
            moniker.clone(),
            rank,
            active,
        )),
    ];
    crate::join_tasks(tasks).await;

    render(&registry)
}

async fn delegations_task(
    ctx: Arc<ExporterContext>,
    address: String,
    moniker: String,
    family: GaugeVec,
) {
    match ctx.client.staking().validator_delegations(&address).await {
        Ok(delegations) => {
            for delegation in delegations {
                family
                    .with_label_values(&[
                        &delegation.validator_address,
                        &moniker,
                        &ctx.denom,
                        &delegation.delegator_address,
                    ])
                    .set(ctx.scale(&delegation.balance.amount));
            }
        }
        Err(err) => tracing::error!(%address, %err, "could not get validator delegations"),
    }
}

async fn commission_task(
    ctx: Arc<ExporterContext>,
    address: String,
    moniker: String,
    family: GaugeVec,
) {
    match ctx.client.validator_commission(&address).await {
        Ok(coins) => {
            for coin in coins {
                family
                    .with_label_values(&[&address, &moniker, &coin.denom])
                    .set(ctx.scale(&coin.amount));
            }
        }
        Err(err) => tracing::error!(%address, %err, "could not get validator commission"),
    }
}

async fn rewards_task(
    ctx: Arc<ExporterContext>,
    address: String,
    moniker: String,
    family: GaugeVec,
) {
    match ctx.client.validator_outstanding_rewards(&address).await {
        Ok(coins) => {
            for coin in coins {
                family
                    .with_label_values(&[&address, &moniker, &coin.denom])
                    .set(ctx.scale(&coin.amount));
            }
        }
        Err(err) => tracing::error!(%address, %err, "could not get validator rewards"),
    }
}

async fn unbondings_task(
    ctx: Arc<ExporterContext>,
    address: String,
    moniker: String,
    family: GaugeVec,
) {
    match ctx.client.staking().validator_unbondings(&address).await {
        Ok(unbondings) => {
            for unbonding in unbondings {
                family
                    .with_label_values(&[
                        &unbonding.validator_address,
                        &moniker,
                        &ctx.denom,
                        &unbonding.delegator_address,
                    ])
                    .set(ctx.scale(&unbonding.balance));
            }
        }
        Err(err) => tracing::error!(%address, %err, "could not get validator unbondings"),
    }
}

async fn redelegations_task(
    ctx: Arc<ExporterContext>,
    address: String,
    moniker: String,
    family: GaugeVec,
) {
    match ctx.client.staking().redelegations("", &address).await {
        Ok(redelegations) => {
            for redelegation in redelegations {
                family
                    .with_label_values(&[
                        &redelegation.src_validator_address,
                        &moniker,
                        &ctx.denom,
                        &redelegation.delegator_address,
                        &redelegation.dst_validator_address,
                    ])
                    .set(ctx.scale(&redelegation.balance));
            }
        }
        Err(err) => tracing::error!(%address, %err, "could not get validator redelegations"),
    }
}

async fn signing_task(
    ctx: Arc<ExporterContext>,
    validator: client::Validator,
    moniker: String,
    family: GaugeVec,
) {
    let Some(cons_address) = resolve_consensus_address(&ctx, &validator).await else {
        tracing::warn!(
            address = %validator.operator_address,
            "could not resolve consensus address, skipping liveness metrics"
        );
        return;
    };
    match ctx.client.signing_info(&cons_address).await {
        Ok(info) if validator.status == BondStatus::Bonded => {
            family
                .with_label_values(&[&validator.operator_address, &moniker])
                .set(info.missed_blocks as f64);
        }
        Ok(_) => {
            tracing::trace!(
                address = %validator.operator_address,
                "validator is not active, omitting missed blocks"
            );
        }
        Err(err) => {
            tracing::debug!(address = %validator.operator_address, %err, "no signing info");
        }
    }
}

async fn rank_task(
    ctx: Arc<ExporterContext>,
    address: String,
    moniker: String,
    rank_family: GaugeVec,
    active_family: GaugeVec,
) {
    let mut validators = match ctx.client.staking().validators().await {
        Ok(validators) => validators,
        Err(err) => {
            tracing::error!(%address, %err, "could not get validators for ranking");
            return;
        }
    };
    sort_by_shares(&mut validators);

    let Some(position) = validators
        .iter()
        .position(|v| v.operator_address == address)
    else {
        tracing::warn!(%address, "validator not found in validator set");
        return;
    };
    let rank = position + 1;
    rank_family
        .with_label_values(&[&address, &moniker])
        .set(rank as f64);

    match ctx.client.staking().params().await {
        Ok(params) => {
            let in_set = rank <= params.max_validators as usize;
            active_family
                .with_label_values(&[&address, &moniker])
                .set(if in_set { 1.0 } else { 0.0 });
        }
        Err(err) => tracing::error!(%address, %err, "could not get staking params"),
    }
}
