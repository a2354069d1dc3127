//! The database adapter: one exclusive connection, macro-aware query
//! execution, cancellation racing.

use std::collections::HashMap;

use pbq_config::{DbConfig, InMessage, OutMessage};
use pbq_proto::Registry;
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::conn_str::conn_str;
use crate::query::{ParsedQuery, QueryParser, Value, row_values};

/// A live database connection plus the query parser configured for its
/// driver. No concurrent `query` on one adapter.
pub struct Db {
    client: Client,
    connection: JoinHandle<()>,
    parser: QueryParser,
}

impl Db {
    /// Open a connection described by `cfg` and set up macro parsing from
    /// the configured messages.
    pub async fn connect(
        cfg: &DbConfig,
        registry: Registry,
        in_messages: HashMap<String, InMessage>,
        out_messages: HashMap<String, OutMessage>,
        auto_map: bool,
    ) -> Result<Self, Error> {
        let parser = QueryParser::new(&cfg.driver, registry, in_messages, out_messages, auto_map)?;
        let conn_str = conn_str(cfg)?;
        let (client, connection) = tokio_postgres::connect(&conn_str, NoTls).await?;
        let connection = tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!("connection error: {err}");
            }
        });
        Ok(Self {
            client,
            connection,
            parser,
        })
    }

    /// One round trip to the server, raced against the token.
    pub async fn ping(&self, token: &CancellationToken) -> Result<(), Error> {
        tokio::select! {
            _ = token.cancelled() => Err(Error::Cancelled),
            res = self.client.query_one("select 1", &[]) => {
                res?;
                Ok(())
            }
        }
    }

    /// Compile and run one macro-bearing query. Returns the output column
    /// names and the materialized rows, in driver order. Cancellation
    /// discards any partial result.
    pub async fn query(
        &self,
        token: &CancellationToken,
        sql: &str,
    ) -> Result<(Vec<String>, Vec<Vec<Value>>), Error> {
        let parsed = self.parser.parse(sql)?;
        tokio::select! {
            _ = token.cancelled() => Err(Error::Cancelled),
            res = self.run(&parsed) => res,
        }
    }

    async fn run(&self, parsed: &ParsedQuery) -> Result<(Vec<String>, Vec<Vec<Value>>), Error> {
        // preparing first keeps column names and types available even for
        // empty result sets
        let statement = self.client.prepare(&parsed.sql).await?;
        let cols: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let params: Vec<&(dyn ToSql + Sync)> = parsed
            .args
            .iter()
            .map(|blob| blob as &(dyn ToSql + Sync))
            .collect();
        let rows = self.client.query(&statement, &params).await?;

        let mut res = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = row_values(row)?;
            for (idx, col) in cols.iter().enumerate() {
                let Some(stringifier) = parsed.stringifiers.get(col) else {
                    continue;
                };
                if let Value::Bytes(bytes) = &values[idx] {
                    values[idx] = Value::String(stringifier.stringify(bytes)?);
                }
            }
            res.push(values);
        }
        Ok((cols, res))
    }

    /// Tear the connection down. Safe to call on any error path.
    pub fn close(self) {
        drop(self.client);
        self.connection.abort();
    }
}
