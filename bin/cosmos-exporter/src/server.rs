//! HTTP surface: one scrape route per collector.

use std::{sync::Arc, time::Instant};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

use collectors::{Error, ExporterContext, CONTENT_TYPE};

pub(crate) fn router(ctx: Arc<ExporterContext>) -> Router {
    Router::new()
        .route("/metrics/general", get(general))
        .route("/metrics/validators", get(validators))
        .route("/metrics/validator", get(validator))
        .route("/metrics/wallet", get(wallet))
        .route("/metrics/params", get(params))
        .with_state(ctx)
}

#[derive(Deserialize)]
struct AddressQuery {
    address: Option<String>,
}

async fn general(State(ctx): State<Arc<ExporterContext>>) -> Response {
    scrape("/metrics/general", collectors::general::collect(ctx)).await
}

async fn validators(State(ctx): State<Arc<ExporterContext>>) -> Response {
    scrape("/metrics/validators", collectors::validators::collect(ctx)).await
}

async fn validator(
    State(ctx): State<Arc<ExporterContext>>,
    Query(query): Query<AddressQuery>,
) -> Response {
    let Some(address) = query.address else {
        return missing_address();
    };
    scrape("/metrics/validator", async move {
        collectors::validator::collect(ctx, &address).await
    })
    .await
}

async fn wallet(
    State(ctx): State<Arc<ExporterContext>>,
    Query(query): Query<AddressQuery>,
) -> Response {
    let Some(address) = query.address else {
        return missing_address();
    };
    scrape("/metrics/wallet", async move {
        collectors::wallet::collect(ctx, &address).await
    })
    .await
}

async fn params(State(ctx): State<Arc<ExporterContext>>) -> Response {
    scrape("/metrics/params", collectors::params::collect(ctx)).await
}

/// Runs one collector under a request-scoped span and maps its outcome
/// onto HTTP.
async fn scrape<F>(endpoint: &'static str, collect: F) -> Response
where
    F: std::future::Future<Output = collectors::Result<String>>,
{
    let started = Instant::now();
    let span = tracing::info_span!(
        "scrape",
        %endpoint,
        request_id = %Uuid::new_v4(),
    );
    let result = collect.instrument(span).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(body) => {
            tracing::info!(endpoint, elapsed, "request processed");
            ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
        }
        Err(Error::BadRequest(reason)) => {
            tracing::warn!(endpoint, %reason, "rejected request");
            (StatusCode::BAD_REQUEST, reason).into_response()
        }
        Err(err) => {
            tracing::error!(endpoint, %err, elapsed, "request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

fn missing_address() -> Response {
    (StatusCode::BAD_REQUEST, "address parameter is required").into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use client::{NetworkType, NodeClient, TendermintClient};
    use collectors::BechPrefixes;
    use pretty_assertions::assert_eq;
    use tonic::transport::Channel;
    use tower::ServiceExt;
    use url::Url;

    use super::*;

    // A context whose upstream does not exist; routing and input
    // validation never touch it.
    fn test_router() -> Router {
        let channel = Channel::from_static("http://127.0.0.1:1").connect_lazy();
        let tendermint =
            TendermintClient::new(Url::parse("http://127.0.0.1:1").unwrap()).unwrap();
        let client = NodeClient::new(channel, NetworkType::Cosmos, tendermint, 1000);
        router(Arc::new(ExporterContext {
            client,
            chain_id: "test-1".to_string(),
            denom: "atom".to_string(),
            denom_coefficient: 1e6,
            prefixes: BechPrefixes::from_base("cosmos"),
        }))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let response = test_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn validator_without_address_is_a_bad_request() {
        assert_eq!(status_of("/metrics/validator").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wallet_without_address_is_a_bad_request() {
        assert_eq!(status_of("/metrics/wallet").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validator_with_garbage_address_is_a_bad_request() {
        assert_eq!(
            status_of("/metrics/validator?address=not-bech32").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn wallet_with_wrong_prefix_is_a_bad_request() {
        // A valid bech32 string, but not under the account prefix.
        let address = client::bech::encode("osmo", &[0u8; 20]).unwrap();
        assert_eq!(
            status_of(&format!("/metrics/wallet?address={address}")).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        assert_eq!(status_of("/metrics/other").await, StatusCode::NOT_FOUND);
    }
}
