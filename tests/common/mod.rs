#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use graph_walk::gql::executor::{Params, QueryExecutor, Row};
use serde_json::Value;
use tokio::sync::oneshot;

pub fn row(v: Value) -> Row {
    v.as_object().cloned().expect("row literal must be a JSON object")
}

/// Answers each query with a closure and remembers what was asked.
pub struct FnExecutor<F> {
    f: F,
    calls: Mutex<Vec<String>>,
}

impl<F> FnExecutor<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<Row>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f, calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> QueryExecutor for FnExecutor<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<Row>> + Send + Sync,
{
    async fn run(&self, query: &str, params: &Params, _timeout: Duration) -> anyhow::Result<Vec<Row>> {
        assert!(params.is_empty(), "walk queries never carry parameters");
        self.calls.lock().unwrap().push(query.to_string());
        (self.f)(query)
    }
}

/// Holds each query until the test releases the matching gate, so tests
/// decide the order in which responses arrive.
pub struct GatedExecutor {
    gates: Mutex<HashMap<String, oneshot::Receiver<Vec<Row>>>>,
}

impl GatedExecutor {
    pub fn new(gates: Vec<(&str, oneshot::Receiver<Vec<Row>>)>) -> Self {
        let gates = gates.into_iter().map(|(k, rx)| (k.to_string(), rx)).collect();
        Self { gates: Mutex::new(gates) }
    }
}

#[async_trait]
impl QueryExecutor for GatedExecutor {
    async fn run(&self, query: &str, _params: &Params, _timeout: Duration) -> anyhow::Result<Vec<Row>> {
        let gate = {
            let mut gates = self.gates.lock().unwrap();
            let key = gates.keys().find(|k| query.contains(k.as_str())).cloned();
            key.and_then(|k| gates.remove(&k))
        };
        match gate {
            Some(rx) => rx.await.map_err(|_| anyhow::anyhow!("gate dropped")),
            None => Err(anyhow::anyhow!("no gate for query: {}", query)),
        }
    }
}

/// Never answers.
pub struct StalledExecutor;

#[async_trait]
impl QueryExecutor for StalledExecutor {
    async fn run(&self, _query: &str, _params: &Params, _timeout: Duration) -> anyhow::Result<Vec<Row>> {
        std::future::pending().await
    }
}
