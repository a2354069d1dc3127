use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] pbq_config::ConfigError),

    #[error(transparent)]
    Registry(#[from] pbq_proto::RegistryError),

    #[error(transparent)]
    Codec(#[from] pbq_proto::CodecError),

    #[error("unknown alias in query: {0:?}")]
    UnknownAlias(String),

    #[error("unknown driver: {0:?}")]
    UnknownDriver(String),

    #[error("invalid connection config: {0}")]
    ConnString(String),

    #[error("invalid connection config: {0}")]
    Url(#[from] url::ParseError),

    #[error("unsupported column type: {0}")]
    UnsupportedType(String),

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("query cancelled")]
    Cancelled,
}
