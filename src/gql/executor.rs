use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// One result row, addressable by the names in the RETURN clause.
pub type Row = Map<String, Value>;

/// Query parameters. The walk engine inlines every literal, so this is
/// always empty, but drivers expect the argument.
pub type Params = Map<String, Value>;

/// The database driver as seen by the walk engine.
///
/// Errors are transport, authentication or execution failures; their
/// message is shown to the user verbatim.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn run(&self, query: &str, params: &Params, timeout: Duration) -> anyhow::Result<Vec<Row>>;
}

