//! The node stepper: a walk plus the step currently being composed.
//!
//! The session owns the walk machine, the candidate selection and one
//! tracker per builder. Every user action replaces the candidate (or the
//! walk) as a whole and then refreshes the builders that depend on it.

use std::collections::BTreeMap;

use crate::error::{Result, WalkError};
use crate::gql::builders::QueryBuilder;
use crate::gql::decode::{decode_adjacency, decode_counts, decode_value_counts, AdjacencyRecord, Counts, ValueCount};
use crate::gql::executor::QueryExecutor;
use crate::gql::tracker::{execute, QueryState, QueryTracker};
use crate::persistence::store::KvStore;

use super::grouping::{group_by_type, split_by_direction, GroupedAdjacency};
use super::machine::WalkMachine;
use super::model::{CandidateSelection, Direction, FilterSet, PropertySelection, RelationshipPick, Step, Walk};

pub struct WalkSession<S: KvStore, E: QueryExecutor> {
    machine: WalkMachine<S>,
    executor: E,
    builder: QueryBuilder,
    candidate: CandidateSelection,
    next_labels: QueryTracker<Counts>,
    adjacency: QueryTracker<Vec<AdjacencyRecord>>,
    prop_counts: QueryTracker<Counts>,
    prop_values: BTreeMap<String, QueryTracker<Vec<ValueCount>>>,
}

impl<S: KvStore, E: QueryExecutor> WalkSession<S, E> {
    /// Restore the walk from `store` and look up the labels it reaches.
    pub async fn open(store: S, executor: E, builder: QueryBuilder) -> Self {
        let mut session = Self {
            machine: WalkMachine::open(store),
            executor,
            builder,
            candidate: CandidateSelection::default(),
            next_labels: QueryTracker::new(),
            adjacency: QueryTracker::new(),
            prop_counts: QueryTracker::new(),
            prop_values: BTreeMap::new(),
        };
        session.refresh_next_labels().await;
        session
    }

    pub fn walk(&self) -> &Walk { self.machine.walk() }
    pub fn machine(&self) -> &WalkMachine<S> { &self.machine }
    pub fn candidate(&self) -> &CandidateSelection { &self.candidate }
    pub fn builder(&self) -> &QueryBuilder { &self.builder }

    pub fn next_labels(&self) -> QueryState<Counts> { self.next_labels.state() }
    pub fn adjacency(&self) -> QueryState<Vec<AdjacencyRecord>> { self.adjacency.state() }
    pub fn property_counts(&self) -> QueryState<Counts> { self.prop_counts.state() }

    pub fn property_value_state(&self, property: &str) -> Option<QueryState<Vec<ValueCount>>> {
        self.prop_values.get(property).map(QueryTracker::state)
    }

    /// Adjacency rows grouped for display, as (inbound, outbound).
    pub fn grouped_adjacency(&self) -> (GroupedAdjacency, GroupedAdjacency) {
        let records = self.adjacency.state().result.unwrap_or_default();
        let (inbound, outbound) = split_by_direction(&records);
        (group_by_type(&inbound, false), group_by_type(&outbound, true))
    }

    /// description -> exact query text, for every builder that has sent one.
    pub fn queries_used(&self) -> BTreeMap<String, String> {
        let mut used = BTreeMap::new();
        let mut put = |desc: String, query: String| {
            if !query.is_empty() {
                used.insert(desc, query);
            }
        };
        put("Next labels".to_string(), self.next_labels.query_used());
        put("Adjacent relations".to_string(), self.adjacency.query_used());
        put("Prop counts".to_string(), self.prop_counts.query_used());
        for (prop, tracker) in &self.prop_values {
            put(format!("{} prop {} vals", self.candidate.label(), prop), tracker.query_used());
        }
        used
    }

    pub async fn refresh_next_labels(&mut self) {
        let query = self.builder.reachable_labels(self.machine.walk());
        self.next_labels.run(&self.executor, query, |rows| decode_counts(rows, "label")).await;

        // a single reachable label needs no choosing
        let only = match self.next_labels.state().result {
            Some(labels) if labels.len() == 1 => labels.into_keys().next(),
            _ => None,
        };
        if let Some(label) = only
            && label != self.candidate.label()
        {
            log::debug!("auto-selecting only reachable label {}", label);
            self.candidate = self.candidate.with_label(label);
            self.refresh_focal().await;
        }
    }

    // adjacency and key counts both hang off the focal node
    async fn refresh_focal(&mut self) {
        self.prop_values.clear();
        let walk = self.machine.walk();
        let adjacent = self.builder.adjacent_relationships(walk, &self.candidate);
        let keys = self.builder.property_key_counts(walk, &self.candidate);
        tokio::join!(
            self.adjacency.run_or_reset(&self.executor, adjacent, decode_adjacency),
            self.prop_counts.run_or_reset(&self.executor, keys, |rows| decode_counts(rows, "key")),
        );
    }

    /// Switch the focal label. Filters picked for the old label are dropped.
    pub async fn set_label(&mut self, label: impl Into<String>) {
        self.candidate = self.candidate.with_label(label);
        self.refresh_focal().await;
    }

    pub async fn add_filter(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let selection = PropertySelection::new(name, value)?;
        self.candidate = self.candidate.with_filter(selection);
        self.refresh_focal().await;
        Ok(())
    }

    pub async fn remove_filter(&mut self, index: usize) {
        if index >= self.candidate.properties().len() {
            return;
        }
        self.candidate = self.candidate.without_filter(index);
        self.refresh_focal().await;
    }

    /// Load the value distribution of one property of the focal node.
    pub async fn property_values(&mut self, property: &str) -> QueryState<Vec<ValueCount>> {
        let tracker = self.prop_values.entry(property.to_string()).or_default().clone();
        let query = self.builder.property_value_counts(self.machine.walk(), &self.candidate, property);
        tracker.run_or_reset(&self.executor, query, decode_value_counts).await;
        tracker.state()
    }

    /// Commit the candidate as the origin of a new hop along `type_name`.
    pub async fn pick_relationship(
        &mut self,
        type_name: impl Into<String>,
        properties: Vec<PropertySelection>,
        direction: Direction,
    ) -> Result<()> {
        if !self.candidate.is_ready() {
            return Err(WalkError::InvalidStep("no label selected".into()));
        }
        let origin = self.candidate.to_node_pick()?;
        let relationship = RelationshipPick::new(type_name, properties)?;
        self.machine.append(Step::new(origin, relationship, direction));
        self.reset_candidate();
        self.refresh_next_labels().await;
        Ok(())
    }

    /// Commit one of the grouped adjacency entries.
    pub async fn pick_group(&mut self, type_name: &str, filters: &FilterSet, direction: Direction) -> Result<()> {
        self.pick_relationship(type_name, filters.selections().to_vec(), direction).await
    }

    /// Remove step `index` and every step after it. An index past the end
    /// changes nothing and keeps the candidate.
    pub async fn delete_step(&mut self, index: usize) {
        if index >= self.walk().len() {
            return;
        }
        self.machine.truncate(index);
        self.reset_candidate();
        self.refresh_next_labels().await;
    }

    pub async fn clear_walk(&mut self) {
        self.machine.clear();
        self.reset_candidate();
        self.refresh_next_labels().await;
    }

    fn reset_candidate(&mut self) {
        self.candidate = CandidateSelection::default();
        self.adjacency.reset();
        self.prop_counts.reset();
        self.prop_values.clear();
    }

    pub async fn all_labels(&self) -> Result<Counts> {
        let rows = execute(&self.executor, &self.builder.all_labels()).await?;
        decode_counts(&rows, "label")
    }

    pub async fn all_relationship_types(&self) -> Result<Counts> {
        let rows = execute(&self.executor, &self.builder.all_relationship_types()).await?;
        decode_counts(&rows, "type")
    }
}
