#![deny(unused_crate_dependencies)]
#![warn(unused_extern_crates)]
#![warn(unused_imports)]

//! Prometheus exporter for Cosmos-family proof-of-stake nodes.

use std::sync::Arc;

use clap::Parser;
use eyre::Result;
use tonic::transport::Channel;

use client::{NodeClient, TendermintClient};
use collectors::ExporterContext;

use crate::{cli::Args, config::Settings};

mod cli;
mod config;
mod error;
mod server;
mod startup;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::resolve(args)?;

    let _sentry_guard = vlog::init(&settings.log_level, settings.json);

    tracing::info!(
        listen_address = %settings.listen_address,
        node = %settings.node,
        tendermint_rpc = %settings.tendermint_rpc,
        limit = settings.limit,
        account_prefix = %settings.prefixes.account,
        validator_prefix = %settings.prefixes.validator,
        consensus_prefix = %settings.prefixes.consensus,
        "started with following parameters"
    );

    let channel = Channel::from_shared(format!("http://{}", settings.node))?
        .connect()
        .await?;
    let tendermint = TendermintClient::new(settings.tendermint_rpc.clone())?;

    let chain_id = startup::resolve_chain_id(settings.chain_id.clone(), &tendermint).await?;
    let (denom, denom_coefficient) = startup::resolve_denom(&settings, &channel).await?;
    let network_type =
        startup::resolve_network_type(settings.network_type, &chain_id, &channel).await?;

    let client = NodeClient::new(channel, network_type, tendermint, settings.limit);
    let ctx = Arc::new(ExporterContext {
        client,
        chain_id,
        denom,
        denom_coefficient,
        prefixes: settings.prefixes.clone(),
    });

    let listener = tokio::net::TcpListener::bind(settings.listen_address).await?;
    tracing::info!(address = %settings.listen_address, "listening");
    axum::serve(listener, server::router(ctx)).await?;

    Ok(())
}
