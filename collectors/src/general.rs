//! Chain-wide metrics behind `/metrics/general`.

use std::sync::Arc;

use prometheus::{Gauge, GaugeVec, Registry};

use crate::{
    error::Result,
    registry::{gauge, gauge_vec, render},
    ExporterContext,
};

/// Scrapes pool totals, community pool, supply, and mint figures.
pub async fn collect(ctx: Arc<ExporterContext>) -> Result<String> {
    let registry = Registry::new();
    let bonded = gauge(
        &registry,
        "cosmos_pool_bonded_tokens",
        "Bonded tokens in the staking pool",
        &ctx.chain_id,
    )?;
    let not_bonded = gauge(
        &registry,
        "cosmos_pool_not_bonded_tokens",
        "Not bonded tokens in the staking pool",
        &ctx.chain_id,
    )?;
    let community_pool = gauge_vec(
        &registry,
        "cosmos_general_community_pool",
        "Community pool balance",
        &["denom"],
        &ctx.chain_id,
    )?;
    let supply = gauge_vec(
        &registry,
        "cosmos_general_supply_total",
        "Total token supply",
        &["denom"],
        &ctx.chain_id,
    )?;
    let inflation = gauge(
        &registry,
        "cosmos_general_inflation",
        "Mint inflation rate",
        &ctx.chain_id,
    )?;
    let annual_provisions = gauge_vec(
        &registry,
        "cosmos_general_annual_provisions",
        "Mint annual provisions",
        &["denom"],
        &ctx.chain_id,
    )?;

    let tasks = vec![
        tokio::spawn(pool_task(ctx.clone(), bonded, not_bonded)),
        tokio::spawn(community_pool_task(ctx.clone(), community_pool)),
        tokio::spawn(supply_task(ctx.clone(), supply)),
        tokio::spawn(inflation_task(ctx.clone(), inflation)),
        tokio::spawn(annual_provisions_task(ctx.clone(), annual_provisions)),
    ];
    crate::join_tasks(tasks).await;

    render(&registry)
}

async fn pool_task(ctx: Arc<ExporterContext>, bonded: Gauge, not_bonded: Gauge) {
    match ctx.client.staking().pool().await {
        Ok(pool) => {
            bonded.set(ctx.scale(&pool.bonded_tokens));
            not_bonded.set(ctx.scale(&pool.not_bonded_tokens));
        }
        Err(err) => tracing::error!(%err, "could not get staking pool"),
    }
}

async fn community_pool_task(ctx: Arc<ExporterContext>, family: GaugeVec) {
    match ctx.client.community_pool().await {
        Ok(coins) => {
            for coin in coins {
                family
                    .with_label_values(&[&coin.denom])
                    .set(ctx.scale(&coin.amount));
            }
        }
        Err(err) => tracing::error!(%err, "could not get community pool"),
    }
}

async fn supply_task(ctx: Arc<ExporterContext>, family: GaugeVec) {
    match ctx.client.total_supply().await {
        Ok(coins) => {
            for coin in coins {
                family
                    .with_label_values(&[&coin.denom])
                    .set(ctx.scale(&coin.amount));
            }
        }
        Err(err) => tracing::error!(%err, "could not get total supply"),
    }
}

async fn inflation_task(ctx: Arc<ExporterContext>, inflation: Gauge) {
    match ctx.client.inflation().await {
        // The rate is already a ratio, not an amount in base units.
        Ok(rate) => inflation.set(rate.to_f64()),
        Err(err) => tracing::error!(%err, "could not get inflation"),
    }
}

async fn annual_provisions_task(ctx: Arc<ExporterContext>, family: GaugeVec) {
    match ctx.client.annual_provisions().await {
        Ok(amount) => {
            family
                .with_label_values(&[&ctx.denom])
                .set(ctx.scale(&amount));
        }
        Err(err) => tracing::error!(%err, "could not get annual provisions"),
    }
}
