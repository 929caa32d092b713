use std::fmt;
use std::time::Duration;

use crate::persistence::settings::WalkSettings;
use crate::walk::model::{CandidateSelection, Walk};

use super::prefix::{compile_prefix, node_pattern};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    AdjacentRelationships,
    PropertyKeyCounts,
    PropertyValueCounts,
    ReachableLabels,
    AllLabels,
    AllRelationshipTypes,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryKind::AdjacentRelationships => "Adjacent relations",
            QueryKind::PropertyKeyCounts => "Prop counts",
            QueryKind::PropertyValueCounts => "Prop vals",
            QueryKind::ReachableLabels => "Next labels",
            QueryKind::AllLabels => "Labels",
            QueryKind::AllRelationshipTypes => "Relationship types",
        };
        write!(f, "{}", s)
    }
}

/// A query string ready for the executor, exactly as it will be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledQuery {
    pub kind: QueryKind,
    pub text: String,
    pub timeout: Duration,
}

pub const DEFAULT_WALK_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_OVERVIEW_TIMEOUT: Duration = Duration::from_millis(3_000);

const ADJACENT_SUFFIX: &str = "-[r]-() UNWIND labels(startNode(r)) as startLabel UNWIND labels(endNode(r)) as endLabel RETURN distinct type(r) as type, properties(r) as props, startLabel, endLabel, (startNode(r) = n) as out, count(distinct(r)) as count ORDER BY type ASC;";
const KEY_COUNTS_SUFFIX: &str = " WITH distinct(n), keys(n) as keys UNWIND keys as key RETURN distinct(key) as key, count(*) as count;";
const REACHABLE_SUFFIX: &str = "(n) UNWIND labels(n) as label RETURN label, count(distinct(n)) as count;";
const ALL_LABELS: &str = "MATCH (n) WITH *, LABELS(n) as labels UNWIND labels as label RETURN distinct(label) as label, count(distinct(n)) as count";
const ALL_REL_TYPES: &str = "MATCH ()-[n]-() RETURN DISTINCT type(n) as type, count(*) as count";

/// Compiles walk state into the read queries the stepper needs.
///
/// Builders that need a focal node return `None` while the candidate has
/// no label; nothing should be sent to the database in that case.
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    walk_timeout: Duration,
    overview_timeout: Duration,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self { walk_timeout: DEFAULT_WALK_TIMEOUT, overview_timeout: DEFAULT_OVERVIEW_TIMEOUT }
    }
}

impl QueryBuilder {
    pub fn new(walk_timeout: Duration, overview_timeout: Duration) -> Self {
        Self { walk_timeout, overview_timeout }
    }

    pub fn from_settings(settings: &WalkSettings) -> Self {
        Self::new(settings.walk_timeout(), settings.overview_timeout())
    }

    pub fn walk_timeout(&self) -> Duration { self.walk_timeout }

    // prefix + (n:`Label`{filters}); None when the candidate has no label
    fn focal(&self, walk: &Walk, candidate: &CandidateSelection) -> Option<String> {
        if !candidate.is_ready() {
            return None;
        }
        let mut query = compile_prefix(walk);
        query.push_str(&node_pattern("n", candidate.label(), candidate.properties()));
        Some(query)
    }

    fn walk_query(&self, kind: QueryKind, text: String) -> CompiledQuery {
        CompiledQuery { kind, text, timeout: self.walk_timeout }
    }

    pub fn adjacent_relationships(&self, walk: &Walk, candidate: &CandidateSelection) -> Option<CompiledQuery> {
        let mut query = self.focal(walk, candidate)?;
        query.push_str(ADJACENT_SUFFIX);
        Some(self.walk_query(QueryKind::AdjacentRelationships, query))
    }

    pub fn property_key_counts(&self, walk: &Walk, candidate: &CandidateSelection) -> Option<CompiledQuery> {
        let mut query = self.focal(walk, candidate)?;
        query.push_str(KEY_COUNTS_SUFFIX);
        Some(self.walk_query(QueryKind::PropertyKeyCounts, query))
    }

    pub fn property_value_counts(
        &self,
        walk: &Walk,
        candidate: &CandidateSelection,
        property: &str,
    ) -> Option<CompiledQuery> {
        if property.is_empty() {
            return None;
        }
        let mut query = self.focal(walk, candidate)?;
        query.push_str(&format!(" WITH distinct(n) RETURN distinct(n.{}) as val, count(*) as count;", property));
        Some(self.walk_query(QueryKind::PropertyValueCounts, query))
    }

    /// Labels reachable at the far end of the walk. The candidate is not
    /// consulted, so an empty walk lists every label in the graph.
    pub fn reachable_labels(&self, walk: &Walk) -> CompiledQuery {
        let mut query = compile_prefix(walk);
        query.push_str(REACHABLE_SUFFIX);
        self.walk_query(QueryKind::ReachableLabels, query)
    }

    pub fn all_labels(&self) -> CompiledQuery {
        CompiledQuery { kind: QueryKind::AllLabels, text: ALL_LABELS.to_string(), timeout: self.overview_timeout }
    }

    pub fn all_relationship_types(&self) -> CompiledQuery {
        CompiledQuery {
            kind: QueryKind::AllRelationshipTypes,
            text: ALL_REL_TYPES.to_string(),
            timeout: self.overview_timeout,
        }
    }
}
