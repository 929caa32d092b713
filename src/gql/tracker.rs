//! Observable state of a single query builder.
//!
//! Requests may overlap when the walk or the candidate changes quickly. Each
//! request takes a generation ticket when it starts, and a completion only
//! lands if its ticket is still the newest one. Older completions are
//! dropped, so the state always reflects the most recently started request.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, WalkError};

use super::builders::CompiledQuery;
use super::executor::{Params, QueryExecutor, Row};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryState<T> {
    pub result: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// Exact text of the latest query started, for display and copy.
    pub query_used: String,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self { result: None, loading: false, error: None, query_used: String::new() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

struct Inner<T> {
    generation: u64,
    state: QueryState<T>,
}

pub struct QueryTracker<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for QueryTracker<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> Default for QueryTracker<T> {
    fn default() -> Self {
        Self { inner: Arc::new(Mutex::new(Inner { generation: 0, state: QueryState::default() })) }
    }
}

/// Send a compiled query with its timeout. Executor failures and timeouts
/// come back as errors; nothing is retried.
pub async fn execute<E>(executor: &E, query: &CompiledQuery) -> Result<Vec<Row>>
where
    E: QueryExecutor + ?Sized,
{
    log::debug!("{}: {}", query.kind, query.text);
    let params = Params::new();
    match tokio::time::timeout(query.timeout, executor.run(&query.text, &params, query.timeout)).await {
        Ok(Ok(rows)) => Ok(rows),
        Ok(Err(e)) => {
            log::error!("{} failed: {}", query.kind, e);
            Err(WalkError::Execution(e.to_string()))
        }
        Err(_) => {
            let ms = query.timeout.as_millis() as u64;
            log::error!("{} timed out after {} ms", query.kind, ms);
            Err(WalkError::Timeout(ms))
        }
    }
}

impl<T: Clone> QueryTracker<T> {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // a panic while holding the lock cannot leave the state half-written
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> QueryState<T> {
        self.lock().state.clone()
    }

    pub fn query_used(&self) -> String {
        self.lock().state.query_used.clone()
    }

    /// Start a request: publish its query text and supersede anything in
    /// flight. The previous result belongs to another query and is dropped.
    pub fn begin(&self, query: &CompiledQuery) -> Ticket {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state.loading = true;
        inner.state.result = None;
        inner.state.error = None;
        inner.state.query_used = query.text.clone();
        Ticket(inner.generation)
    }

    /// Apply a completion. Returns false when the ticket is stale and the
    /// outcome was discarded.
    pub fn finish(&self, ticket: Ticket, outcome: Result<T>) -> bool {
        let mut inner = self.lock();
        if ticket.0 != inner.generation {
            log::debug!("dropping stale result for generation {} (current {})", ticket.0, inner.generation);
            return false;
        }
        inner.state.loading = false;
        match outcome {
            Ok(value) => {
                inner.state.result = Some(value);
                inner.state.error = None;
            }
            Err(e) => {
                inner.state.result = None;
                inner.state.error = Some(e.to_string());
            }
        }
        true
    }

    /// Not ready: nothing to ask. Clears the state and invalidates any
    /// request still in flight.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = QueryState::default();
    }

    /// Issue `query`, decode its rows and record the outcome.
    pub async fn run<E, F>(&self, executor: &E, query: CompiledQuery, decode: F) -> bool
    where
        E: QueryExecutor + ?Sized,
        F: FnOnce(&[Row]) -> Result<T>,
    {
        let ticket = self.begin(&query);
        let outcome = execute(executor, &query).await.and_then(|rows| decode(&rows));
        self.finish(ticket, outcome)
    }

    /// Like [`run`](Self::run), but resets instead when the builder was not ready.
    pub async fn run_or_reset<E, F>(&self, executor: &E, query: Option<CompiledQuery>, decode: F) -> bool
    where
        E: QueryExecutor + ?Sized,
        F: FnOnce(&[Row]) -> Result<T>,
    {
        match query {
            Some(q) => self.run(executor, q, decode).await,
            None => {
                self.reset();
                false
            }
        }
    }
}
