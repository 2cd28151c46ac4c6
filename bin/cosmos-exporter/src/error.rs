#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("unknown network type {0:?}, expected \"cosmos\" or \"zenrock\"")]
    UnknownNetworkType(String),

    #[error("denom-coefficient and denom-exponent are both provided, must provide only one")]
    ConflictingDenomSettings,

    #[error("denom-coefficient must be a positive number, got {0}")]
    NonPositiveDenomCoefficient(f64),
}
