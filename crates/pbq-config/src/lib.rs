//! Configuration for pbq.
//!
//! A config is assembled from an optional JSON document and CLI overrides,
//! then validated. The interesting part is the message aliases: `in`
//! messages expand SQL macros into protobuf-encoded query parameters, `out`
//! messages render protobuf-bearing result columns through templates.
//!
//! ```json
//! {
//!   "proto": {"c": "protoc", "dir": "protos"},
//!   "db": {"driver": "postgres", "host": "localhost", "port": 5432,
//!          "name": "shop", "userName": "app", "password": "..."},
//!   "messages": {
//!     "in":  {"o(id, text)": {"name": "shop.Order",
//!                             "template": {"id": "$id", "text": "$text"}}},
//!     "out": {"o": {"name": "shop.Order", "template": "order $id: $text"}},
//!     "autoMap": true
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

mod error;
mod parse_in;
mod parse_out;
mod raw;
pub mod tmpl;

pub use error::ConfigError;
pub use raw::Overrides;
pub use tmpl::Template;

const DEFAULT_PROTOC: &str = "protoc";

/// Fully parsed and validated application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub proto: ProtoConfig,
    pub db: DbConfig,
    pub in_messages: HashMap<String, InMessage>,
    pub out_messages: HashMap<String, OutMessage>,
    /// Pre-bind every out message as a stringifier keyed by its own alias.
    pub auto_map: bool,
}

/// Protobuf toolchain configuration.
#[derive(Debug, Clone, Default)]
pub struct ProtoConfig {
    /// Path to the protoc binary.
    pub c: String,
    /// Root directory of the `.proto` sources.
    pub dir: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user_name: String,
    pub password: String,
    /// Extra connection-string parameters, e.g. `sslmode`.
    pub params: BTreeMap<String, String>,
    /// Query to execute, when given in the file or as the positional arg.
    pub query: String,
}

/// A message going to the database: a SQL macro `$alias(args...)` expands
/// into a protobuf-encoded query parameter.
#[derive(Debug, Clone)]
pub struct InMessage {
    pub alias: String,
    /// Fully-qualified protobuf message name.
    pub name: String,
    template: Template,
    params: Vec<String>,
}

impl InMessage {
    /// Instantiate the JSON template with one literal token per parameter.
    pub fn json(&self, args: &[String]) -> Result<String, ConfigError> {
        if args.len() != self.params.len() {
            return Err(ConfigError::Arity {
                alias: self.alias.clone(),
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        let ctx: HashMap<&str, &str> = self
            .params
            .iter()
            .map(String::as_str)
            .zip(args.iter().map(String::as_str))
            .collect();
        self.template
            .render(&ctx)
            .map_err(|source| ConfigError::Render {
                alias: self.alias.clone(),
                source,
            })
    }

    /// Parameter names, in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

/// A message coming from the database: a result column marked with
/// `$alias:col` is decoded and rendered through the template.
#[derive(Debug, Clone)]
pub struct OutMessage {
    pub alias: String,
    /// Fully-qualified protobuf message name.
    pub name: String,
    pub template: Template,
    /// All dotted property paths referenced by the template.
    pub props: BTreeSet<String>,
}

impl Config {
    /// Build a config from an optional file document and CLI overrides.
    /// Overrides always win, including explicitly-set zero values.
    pub fn load(file_bytes: Option<&[u8]>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut raw = match file_bytes {
            Some(bytes) => raw::RawConfig::from_bytes(bytes)?,
            None => raw::RawConfig::default(),
        };
        raw.merge(overrides);

        let mut res = Config {
            proto: ProtoConfig {
                c: raw.proto.c,
                dir: raw.proto.dir,
            },
            db: DbConfig {
                driver: raw.db.driver,
                host: raw.db.host,
                port: raw.db.port,
                name: raw.db.name,
                user_name: raw.db.user_name,
                password: raw.db.password,
                params: raw.db.params,
                query: raw.db.query,
            },
            in_messages: parse_in::parse(&raw.messages.in_messages)?,
            out_messages: parse_out::parse(&raw.messages.out_messages)?,
            auto_map: raw.messages.auto_map.unwrap_or(true),
        };
        res.validate()?;
        Ok(res)
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.proto.c.is_empty() {
            self.proto.c = DEFAULT_PROTOC.to_string();
        }
        if self.db.driver.is_empty() {
            return Err(ConfigError::MissingDriver);
        }
        if self.db.host.is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.db.port == 0 {
            return Err(ConfigError::MissingPort);
        }
        if self.db.name.is_empty() {
            return Err(ConfigError::MissingName);
        }
        if self.db.user_name.is_empty() {
            return Err(ConfigError::MissingUserName);
        }
        Ok(())
    }
}
