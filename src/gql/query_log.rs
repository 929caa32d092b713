use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use time::{macros::format_description, OffsetDateTime};

use crate::persistence::settings::WalkSettings;

use super::executor::{Params, QueryExecutor, Row};

fn log_path_for_now(dir: &Path) -> PathBuf {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year][month][day]");
    let date = now.format(&fmt).unwrap_or_else(|_| "unknown".into());
    dir.join(format!("queries_{}.log", date))
}

pub fn log_query(dir: &Path, query: &str, outcome: &anyhow::Result<Vec<Row>>) {
    if let Err(e) = create_dir_all(dir) {
        log::warn!("could not create query log dir {}: {}", dir.display(), e);
        return;
    }
    let path = log_path_for_now(dir);
    let now = OffsetDateTime::now_utc();
    let ts_fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let ts = now.format(&ts_fmt).unwrap_or_else(|_| "".into());
    let status = match outcome {
        Ok(rows) => format!("OK rows={}", rows.len()),
        Err(e) => format!("ERR {}", e),
    };
    let line = format!("{} | {}\n{}\n\n", ts, status, query.trim());
    let written = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut file| file.write_all(line.as_bytes()));
    if let Err(e) = written {
        log::warn!("could not write query log {}: {}", path.display(), e);
    }
}

/// Wraps an executor and appends every query it runs to a dated log file.
/// Without a log directory it passes queries straight through.
pub struct LoggingExecutor<E> {
    inner: E,
    dir: Option<PathBuf>,
}

impl<E> LoggingExecutor<E> {
    pub fn new(inner: E, dir: impl Into<PathBuf>) -> Self {
        Self { inner, dir: Some(dir.into()) }
    }

    /// Log only when `query_log_enabled` is set, into the configured directory.
    pub fn from_settings(inner: E, settings: &WalkSettings) -> Self {
        Self { inner, dir: settings.query_log_dir() }
    }

    pub fn log_dir(&self) -> Option<&Path> { self.dir.as_deref() }
    pub fn inner(&self) -> &E { &self.inner }
}

#[async_trait]
impl<E: QueryExecutor> QueryExecutor for LoggingExecutor<E> {
    async fn run(&self, query: &str, params: &Params, timeout: Duration) -> anyhow::Result<Vec<Row>> {
        let res = self.inner.run(query, params, timeout).await;
        if let Some(dir) = &self.dir {
            log_query(dir, query, &res);
        }
        res
    }
}
