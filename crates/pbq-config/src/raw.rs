//! The config document as it appears on disk, before alias parsing.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::ConfigError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawConfig {
    pub proto: RawProto,
    pub db: RawDb,
    pub messages: RawMessages,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawProto {
    pub c: String,
    pub dir: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawDb {
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub password: String,
    pub params: BTreeMap<String, String>,
    pub query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawMessages {
    #[serde(rename = "in")]
    pub in_messages: HashMap<String, InMessageConfig>,
    #[serde(rename = "out")]
    pub out_messages: HashMap<String, OutMessageConfig>,
    #[serde(rename = "autoMap")]
    pub auto_map: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InMessageConfig {
    pub name: String,
    /// Arbitrary JSON; objects are the common case.
    pub template: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutMessageConfig {
    pub name: String,
    pub template: String,
}

/// CLI values that were explicitly provided. `Some` always replaces the
/// file value, including zero values.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub protoc: Option<String>,
    pub proto_dir: Option<String>,
    pub driver: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub query: Option<String>,
    pub auto_map: Option<bool>,
}

impl RawConfig {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn merge(&mut self, overrides: &Overrides) {
        merge_field(&mut self.proto.c, &overrides.protoc);
        merge_field(&mut self.proto.dir, &overrides.proto_dir);
        merge_field(&mut self.db.driver, &overrides.driver);
        merge_field(&mut self.db.host, &overrides.host);
        merge_field(&mut self.db.port, &overrides.port);
        merge_field(&mut self.db.name, &overrides.name);
        merge_field(&mut self.db.user_name, &overrides.user_name);
        merge_field(&mut self.db.password, &overrides.password);
        merge_field(&mut self.db.query, &overrides.query);
        if let Some(auto_map) = overrides.auto_map {
            self.messages.auto_map = Some(auto_map);
        }
    }
}

fn merge_field<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_full_document() {
        let doc = br#"{
            "proto": {"c": "/usr/bin/protoc", "dir": "protos"},
            "db": {
                "driver": "postgres",
                "host": "localhost",
                "port": 5432,
                "name": "orders",
                "userName": "app",
                "password": "secret",
                "params": {"sslmode": "disable"},
                "query": "select 1"
            },
            "messages": {
                "in": {"o(id)": {"name": "shop.Order", "template": {"id": "$id"}}},
                "out": {"o": {"name": "shop.Order", "template": "order $id"}},
                "autoMap": false
            }
        }"#;
        let raw = RawConfig::from_bytes(doc).unwrap();
        assert_eq!(raw.proto.c, "/usr/bin/protoc");
        assert_eq!(raw.db.port, 5432);
        assert_eq!(raw.db.user_name, "app");
        assert_eq!(raw.db.params["sslmode"], "disable");
        assert_eq!(raw.messages.auto_map, Some(false));
        assert!(raw.messages.in_messages.contains_key("o(id)"));
        assert!(raw.messages.out_messages.contains_key("o"));
    }

    #[test]
    fn test_from_bytes_empty_document() {
        let raw = RawConfig::from_bytes(b"{}").unwrap();
        assert_eq!(raw.db.port, 0);
        assert_eq!(raw.messages.auto_map, None);
        assert!(raw.messages.in_messages.is_empty());
    }

    #[test]
    fn test_from_bytes_invalid_document() {
        assert!(RawConfig::from_bytes(b"{").is_err());
    }

    #[test]
    fn test_merge_overrides_take_precedence() {
        let mut raw = RawConfig::from_bytes(
            br#"{"db": {"host": "db.internal", "port": 5433}, "proto": {"c": "protoc-3"}}"#,
        )
        .unwrap();
        raw.merge(&Overrides {
            host: Some("localhost".into()),
            auto_map: Some(false),
            ..Overrides::default()
        });
        assert_eq!(raw.db.host, "localhost");
        // untouched fields keep their file values
        assert_eq!(raw.db.port, 5433);
        assert_eq!(raw.proto.c, "protoc-3");
        assert_eq!(raw.messages.auto_map, Some(false));
    }

    #[test]
    fn test_merge_zero_values_still_override() {
        let mut raw =
            RawConfig::from_bytes(br#"{"db": {"port": 5433, "password": "hunter2"}}"#).unwrap();
        raw.merge(&Overrides {
            port: Some(0),
            password: Some(String::new()),
            ..Overrides::default()
        });
        assert_eq!(raw.db.port, 0);
        assert_eq!(raw.db.password, "");
    }
}
