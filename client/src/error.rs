/// Failure modes of upstream queries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The node rejected or failed a gRPC call.
    #[error(transparent)]
    Grpc(#[from] tonic::Status),

    /// The shared channel could not be established.
    #[error(transparent)]
    Transport(#[from] tonic::transport::Error),

    /// The Tendermint RPC call failed.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A Tendermint RPC URL could not be built.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// The node answered with data that does not parse.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    /// A Bech32 address failed to decode or carried the wrong prefix.
    #[error("invalid bech32 address: {0}")]
    Bech32(String),

    /// None of the known query services answered the probe.
    #[error("could not determine network type")]
    UnknownNetworkType,
}

/// The crate result type.
pub type Result<T> = std::result::Result<T, Error>;
