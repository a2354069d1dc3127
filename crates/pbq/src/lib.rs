//! Query PostgreSQL with protobuf-encoded parameters and template-decoded
//! results.
//!
//! The pipeline: SQL with macros goes through [`query::QueryParser`], which
//! produces driver-ready SQL, one protobuf blob per in-macro, and a map of
//! column stringifiers; [`Db`] executes the result and materializes typed
//! rows, running stringifiers over protobuf-bearing columns.
//!
//! ```ignore
//! let db = Db::connect(&cfg.db, registry, cfg.in_messages, cfg.out_messages, cfg.auto_map).await?;
//! let (cols, rows) = db.query(&token, "select $o:dat as d from t where c = $o(1, 'hi')").await?;
//! ```

mod conn_str;
mod db;
mod error;
pub mod query;

pub use db::Db;
pub use error::Error;
pub use query::{ParsedQuery, QueryParser, Value};
