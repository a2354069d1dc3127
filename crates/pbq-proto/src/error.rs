use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("could not walk proto source directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("no .proto files found under {0:?}")]
    NoProtoFiles(String),

    #[error("could not run protoc at {protoc:?}: {source}")]
    Spawn {
        protoc: String,
        source: std::io::Error,
    },

    #[error("protoc exited with {0}")]
    Compiler(std::process::ExitStatus),

    #[error("could not read descriptor set: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse descriptor set: {0}")]
    BadDescriptorSet(#[from] prost_reflect::DescriptorError),

    #[error("message not found: {0:?}")]
    MessageNotFound(String),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("could not decode JSON into {name}: {source}")]
    Json {
        name: String,
        source: serde_json::Error,
    },

    #[error("could not decode message bytes as {name}: {source}")]
    Decode {
        name: String,
        source: prost::DecodeError,
    },

    #[error("invalid property {prop:?} in path {path:?} on {name}")]
    Property {
        name: String,
        prop: String,
        path: String,
    },

    #[error("could not render message {name}: {source}")]
    Render {
        name: String,
        source: minijinja::Error,
    },

    #[error("could not serialize field value: {0}")]
    Value(#[from] serde_json::Error),
}
