use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse config document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("invalid alias definition: {0:?}")]
    InvalidInAlias(String),

    #[error("duplicate in message alias: {0:?}")]
    DuplicateInAlias(String),

    #[error("duplicate parameter name for alias {alias:?}: {param:?}")]
    DuplicateParam { alias: String, param: String },

    #[error("unknown variable name for alias {alias:?}: {var:?}")]
    UnknownTemplateVar { alias: String, var: String },

    #[error("invalid alias definition: {0:?}")]
    InvalidOutAlias(String),

    #[error("invalid message template for alias {alias:?}: {source}")]
    BadTemplate {
        alias: String,
        source: minijinja::Error,
    },

    #[error("wrong argument count for alias {alias:?}: expected {expected}, got {actual}")]
    Arity {
        alias: String,
        expected: usize,
        actual: usize,
    },

    #[error("could not render template for alias {alias:?}: {source}")]
    Render {
        alias: String,
        source: minijinja::Error,
    },

    #[error("driver is not specified")]
    MissingDriver,

    #[error("host is not specified")]
    MissingHost,

    #[error("port is not specified")]
    MissingPort,

    #[error("database name is not specified")]
    MissingName,

    #[error("user name is not specified")]
    MissingUserName,
}
