//! Staking parameter metrics behind `/metrics/params`.

use std::sync::Arc;

use prometheus::Registry;

use crate::{
    error::Result,
    registry::{gauge, gauge_vec, render},
    ExporterContext,
};

/// Scrapes the staking module parameters.
pub async fn collect(ctx: Arc<ExporterContext>) -> Result<String> {
    let registry = Registry::new();
    let max_validators = gauge(
        &registry,
        "cosmos_params_max_validators",
        "Maximum size of the active validator set",
        &ctx.chain_id,
    )?;
    let unbonding_time = gauge(
        &registry,
        "cosmos_params_unbonding_time",
        "Unbonding period in seconds",
        &ctx.chain_id,
    )?;
    let max_entries = gauge(
        &registry,
        "cosmos_params_max_entries",
        "Maximum unbonding and redelegation entries per pair",
        &ctx.chain_id,
    )?;
    let historical_entries = gauge(
        &registry,
        "cosmos_params_historical_entries",
        "Number of historical entries kept",
        &ctx.chain_id,
    )?;
    let bond_denom = gauge_vec(
        &registry,
        "cosmos_params_bond_denom",
        "Bond denomination of the chain, as a label",
        &["denom"],
        &ctx.chain_id,
    )?;

    // One query feeds every family here, so its failure fails the
    // scrape.
    let params = ctx.client.staking().params().await?;

    max_validators.set(params.max_validators as f64);
    unbonding_time.set(params.unbonding_time_seconds);
    max_entries.set(params.max_entries as f64);
    historical_entries.set(params.historical_entries as f64);
    bond_denom.with_label_values(&[&params.bond_denom]).set(1.0);

    render(&registry)
}
