mod common;

use std::collections::BTreeMap;

use graph_walk::gql::builders::{QueryBuilder, QueryKind, DEFAULT_WALK_TIMEOUT};
use graph_walk::gql::decode::{
    decode_adjacency, decode_counts, decode_value_counts, is_all_unique, sorted_by_frequency, AdjacencyRecord,
};
use graph_walk::gql::literal::{encode, encode_identifier, LiteralToken};
use graph_walk::gql::prefix::compile_prefix;
use graph_walk::persistence::settings::WalkSettings;
use graph_walk::persistence::store::{FileStore, KvStore, MemoryStore};
use graph_walk::walk::grouping::{entry_count, group_by_type, split_by_direction};
use graph_walk::walk::machine::{parse_snapshot, WalkMachine, WalkPhase, WALK_KEY};
use graph_walk::walk::model::{
    CandidateSelection, Direction, FilterSet, NodePick, PropertySelection, RelationshipPick, Step, Walk,
};
use graph_walk::WalkError;
use serde_json::json;

use common::row;

const ADJ_SUFFIX: &str = "-[r]-() UNWIND labels(startNode(r)) as startLabel UNWIND labels(endNode(r)) as endLabel RETURN distinct type(r) as type, properties(r) as props, startLabel, endLabel, (startNode(r) = n) as out, count(distinct(r)) as count ORDER BY type ASC;";

fn sel(name: &str, value: &str) -> PropertySelection {
    PropertySelection::new(name, value).expect("valid selection")
}

fn step(label: &str, node_props: Vec<PropertySelection>, rel: &str, rel_props: Vec<PropertySelection>, dir: Direction) -> Step {
    Step::new(
        NodePick::new(label, node_props).expect("valid node pick"),
        RelationshipPick::new(rel, rel_props).expect("valid relationship pick"),
        dir,
    )
}

fn knows_walk() -> Walk {
    Walk::new().appended(step("Person", vec![], "KNOWS", vec![], Direction::Outbound))
}

fn record(rel: &str, props: &[(&str, &str)], start: &str, end: &str, out: bool, count: u64) -> AdjacencyRecord {
    AdjacencyRecord {
        relationship_type: rel.to_string(),
        relationship_properties: props.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        start_label: start.to_string(),
        end_label: end.to_string(),
        is_outbound_from_focus: out,
        count,
    }
}

#[test]
fn literal_numbers_are_bare_and_text_is_quoted() {
    for v in ["42", "-3.5", "0", "1e3", "+7"] {
        assert!(encode(v).is_numeric(), "{} should be numeric", v);
        assert_eq!(encode(v).to_string(), v);
    }
    for v in ["abc", "", "3abc", " 42", "inf", "NaN", "infinity"] {
        assert_eq!(encode(v), LiteralToken::Text(v.to_string()), "{:?} should be text", v);
        assert_eq!(encode(v).to_string(), format!("'{}'", v));
    }
}

#[test]
fn literal_booleans_are_bare() {
    assert_eq!(encode("true"), LiteralToken::Bool(true));
    assert_eq!(encode("false").to_string(), "false");
    assert!(encode("true").is_bare());
    assert!(!encode("true").is_numeric());
    for v in ["True", "FALSE", " true", "yes"] {
        assert_eq!(encode(v), LiteralToken::Text(v.to_string()), "{:?} should be text", v);
    }
}

#[test]
fn boolean_filters_compile_unquoted() {
    let walk = Walk::new().appended(step("User", vec![sel("active", "true")], "FOLLOWS", vec![sel("muted", "false")], Direction::Outbound));
    assert_eq!(compile_prefix(&walk), "MATCH (:`User`{active: true})-[:FOLLOWS{muted: false}]->");
}

#[test]
fn literal_text_does_not_escape_quotes() {
    // known gap: the quote ends the literal early
    assert_eq!(encode("it's").to_string(), "'it's'");
    assert_eq!(encode_identifier("My`Label"), "`My`Label`");
    assert_eq!(encode_identifier("Has Space"), "`Has Space`");
}

#[test]
fn empty_walk_compiles_to_bare_match() {
    assert_eq!(compile_prefix(&Walk::new()), "MATCH ");
}

#[test]
fn outbound_step_puts_arrow_on_the_right() {
    assert_eq!(compile_prefix(&knows_walk()), "MATCH (:`Person`)-[:KNOWS]->");
}

#[test]
fn inbound_step_with_filters() {
    let walk = Walk::new().appended(step(
        "Person",
        vec![sel("name", "Ada"), sel("age", "36")],
        "KNOWS",
        vec![sel("since", "2020")],
        Direction::Inbound,
    ));
    assert_eq!(
        compile_prefix(&walk),
        "MATCH (:`Person`{name: 'Ada', age: 36})<-[:KNOWS{since: 2020}]-"
    );
}

#[test]
fn steps_concatenate_without_separator() {
    let walk = knows_walk().appended(step("Person", vec![], "WORKS_AT", vec![sel("role", "dev")], Direction::Outbound));
    assert_eq!(
        compile_prefix(&walk),
        "MATCH (:`Person`)-[:KNOWS]->(:`Person`)-[:WORKS_AT{role: 'dev'}]->"
    );
    assert_eq!(compile_prefix(&walk), compile_prefix(&walk.clone()));
}

#[test]
fn reachable_labels_ignores_candidate() {
    let b = QueryBuilder::default();
    let q = b.reachable_labels(&Walk::new());
    assert_eq!(q.kind, QueryKind::ReachableLabels);
    assert_eq!(q.text, "MATCH (n) UNWIND labels(n) as label RETURN label, count(distinct(n)) as count;");
    assert_eq!(q.timeout, DEFAULT_WALK_TIMEOUT);

    let q = b.reachable_labels(&knows_walk());
    assert_eq!(
        q.text,
        "MATCH (:`Person`)-[:KNOWS]->(n) UNWIND labels(n) as label RETURN label, count(distinct(n)) as count;"
    );
}

#[test]
fn adjacency_query_for_bare_label() {
    let b = QueryBuilder::default();
    let q = b
        .adjacent_relationships(&Walk::new(), &CandidateSelection::new("Person"))
        .expect("ready");
    assert_eq!(q.text, format!("MATCH (n:`Person`){}", ADJ_SUFFIX));
}

#[test]
fn numeric_candidate_filter_is_unquoted() {
    let b = QueryBuilder::default();
    let candidate = CandidateSelection::new("Person").with_filter(sel("age", "30"));
    let q = b.property_key_counts(&Walk::new(), &candidate).expect("ready");
    assert_eq!(
        q.text,
        "MATCH (n:`Person`{age: 30}) WITH distinct(n), keys(n) as keys UNWIND keys as key RETURN distinct(key) as key, count(*) as count;"
    );
}

#[test]
fn value_counts_follow_the_walk() {
    let b = QueryBuilder::default();
    let q = b
        .property_value_counts(&knows_walk(), &CandidateSelection::new("Person"), "name")
        .expect("ready");
    assert_eq!(
        q.text,
        "MATCH (:`Person`)-[:KNOWS]->(n:`Person`) WITH distinct(n) RETURN distinct(n.name) as val, count(*) as count;"
    );
}

#[test]
fn builders_are_not_ready_without_label() {
    let b = QueryBuilder::default();
    let empty = CandidateSelection::default();
    assert!(b.adjacent_relationships(&Walk::new(), &empty).is_none());
    assert!(b.property_key_counts(&Walk::new(), &empty).is_none());
    assert!(b.property_value_counts(&Walk::new(), &empty, "name").is_none());
    assert!(b.property_value_counts(&Walk::new(), &CandidateSelection::new("A"), "").is_none());
}

#[test]
fn overview_queries_use_overview_timeout() {
    let settings = WalkSettings { overview_timeout_ms: 1500, ..Default::default() };
    let b = QueryBuilder::from_settings(&settings);
    assert_eq!(b.all_labels().timeout.as_millis(), 1500);
    assert!(b.all_labels().text.contains("UNWIND labels as label"));
    assert_eq!(b.all_relationship_types().text, "MATCH ()-[n]-() RETURN DISTINCT type(n) as type, count(*) as count");
}

#[test]
fn candidate_label_switch_drops_filters() {
    let c = CandidateSelection::new("Person").with_filter(sel("age", "30"));
    let switched = c.with_label("Company");
    assert_eq!(switched.label(), "Company");
    assert!(switched.properties().is_empty());
    // the old selection is untouched
    assert_eq!(c.properties().len(), 1);
}

#[test]
fn candidate_filter_on_same_property_replaces() {
    let c = CandidateSelection::new("Person")
        .with_filter(sel("age", "30"))
        .with_filter(sel("name", "Ada"))
        .with_filter(sel("age", "31"));
    let names: Vec<&str> = c.properties().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["age", "name"]);
    assert_eq!(c.properties()[0].value(), "31");
    let removed = c.without_filter(0);
    assert_eq!(removed.properties().len(), 1);
    assert_eq!(removed.without_filter(9), removed);
}

#[test]
fn empty_names_are_rejected() {
    assert!(matches!(PropertySelection::new("", "x"), Err(WalkError::InvalidSelection(_))));
    assert!(matches!(NodePick::new("", vec![]), Err(WalkError::InvalidStep(_))));
    assert!(matches!(RelationshipPick::new("", vec![]), Err(WalkError::InvalidStep(_))));
}

#[test]
fn display_forms() {
    assert_eq!(sel("age", "30").to_string(), "age = 30");
    let s = step("Person", vec![sel("age", "30")], "KNOWS", vec![], Direction::Inbound);
    assert_eq!(s.to_string(), "(Person {age = 30})<-[KNOWS]-");
}

#[test]
fn decode_adjacency_rows() {
    let rows = vec![row(json!({
        "type": "KNOWS", "props": {"since": 2020, "weight": "high"},
        "startLabel": "Person", "endLabel": "Person", "out": true, "count": 4
    }))];
    let recs = decode_adjacency(&rows).expect("decodes");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].relationship_properties.get("since").map(String::as_str), Some("2020"));
    assert_eq!(recs[0].relationship_properties.get("weight").map(String::as_str), Some("high"));
    assert!(recs[0].is_outbound_from_focus);
    assert_eq!(recs[0].count, 4);
}

#[test]
fn bad_property_map_fails_whole_batch() {
    let rows = vec![
        row(json!({"type": "A", "props": {}, "startLabel": "X", "endLabel": "Y", "out": true, "count": 1})),
        row(json!({"type": "B", "props": "oops", "startLabel": "X", "endLabel": "Y", "out": false, "count": 1})),
    ];
    match decode_adjacency(&rows) {
        Err(WalkError::Decode { row, reason }) => {
            assert_eq!(row, 1);
            assert!(reason.contains("props is not a map"));
        }
        other => panic!("expected decode failure, got {:?}", other),
    }
}

#[test]
fn decode_counts_and_values() {
    let rows = vec![
        row(json!({"label": "Person", "count": 3})),
        row(json!({"label": "Company", "count": 1})),
    ];
    let counts = decode_counts(&rows, "label").unwrap();
    assert_eq!(counts.get("Person"), Some(&3));
    assert!(decode_counts(&rows, "key").is_err());

    let vals = decode_value_counts(&[
        row(json!({"val": "Ada", "count": 1})),
        row(json!({"val": null, "count": 2})),
        row(json!({"val": 36, "count": 5})),
    ])
    .unwrap();
    assert_eq!(vals[0].value.as_deref(), Some("36"));
    assert_eq!(vals[1].value, None);
    assert_eq!(vals[2].value.as_deref(), Some("Ada"));
    assert!(is_all_unique(&vals, 3));
    assert!(!is_all_unique(&vals, 8));
}

#[test]
fn frequency_order_breaks_ties_by_name() {
    let counts: BTreeMap<String, u64> =
        [("b".to_string(), 2), ("a".to_string(), 2), ("z".to_string(), 9)].into_iter().collect();
    let ordered: Vec<String> = sorted_by_frequency(&counts).into_iter().map(|(k, _)| k).collect();
    assert_eq!(ordered, vec!["z", "a", "b"]);
}

#[test]
fn filter_set_sorts_reconstructed_properties() {
    let props: BTreeMap<String, String> =
        [("b".to_string(), "2".to_string()), ("a".to_string(), "1".to_string())].into_iter().collect();
    let set = FilterSet::from_properties(&props);
    let names: Vec<&str> = set.selections().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(set.to_string(), "a = 1, b = 2");
}

#[test]
fn grouping_keeps_every_row() {
    let records = vec![
        record("KNOWS", &[], "Person", "Person", true, 5),
        record("KNOWS", &[("since", "2020")], "Person", "Person", true, 2),
        record("WORKS_AT", &[], "Person", "Company", true, 3),
        record("WORKS_AT", &[], "Person", "Company", true, 1),
    ];
    let grouped = group_by_type(&records, true);
    assert_eq!(entry_count(&grouped), records.len());
    assert_eq!(grouped["KNOWS"].len(), 2);
    let works = &grouped["WORKS_AT"][&FilterSet::default()];
    assert_eq!(works, &vec![("Company".to_string(), 3), ("Company".to_string(), 1)]);
}

#[test]
fn grouping_picks_other_endpoint() {
    let records = vec![
        record("WORKS_AT", &[], "Person", "Company", false, 3),
        record("KNOWS", &[], "Person", "Person", true, 1),
    ];
    let (inbound, outbound) = split_by_direction(&records);
    assert_eq!(inbound.len(), 1);
    assert_eq!(outbound.len(), 1);
    let grouped_in = group_by_type(&inbound, false);
    assert_eq!(grouped_in["WORKS_AT"][&FilterSet::default()][0].0, "Person");
    let grouped_out = group_by_type(&inbound, true);
    assert_eq!(grouped_out["WORKS_AT"][&FilterSet::default()][0].0, "Company");
}

#[test]
fn machine_persists_after_every_transition() {
    let mut m = WalkMachine::new(MemoryStore::new());
    assert_eq!(m.phase(), WalkPhase::Empty);
    m.append(step("Person", vec![], "KNOWS", vec![], Direction::Outbound));
    m.append(step("Person", vec![], "WORKS_AT", vec![], Direction::Outbound));
    assert_eq!(m.phase(), WalkPhase::InProgress);

    let stored = m.store().get(WALK_KEY).unwrap().expect("snapshot written");
    assert_eq!(&parse_snapshot(&stored).unwrap(), m.walk());

    m.truncate(1);
    assert_eq!(m.walk().len(), 1);
    let stored = m.store().get(WALK_KEY).unwrap().unwrap();
    assert_eq!(parse_snapshot(&stored).unwrap().len(), 1);
}

#[test]
fn truncate_past_end_is_noop_and_zero_empties() {
    let mut m = WalkMachine::new(MemoryStore::new());
    m.append(step("Person", vec![], "KNOWS", vec![], Direction::Outbound));
    let before = m.walk().clone();
    m.truncate(7);
    assert_eq!(m.walk(), &before);
    m.clear();
    assert_eq!(m.walk(), &Walk::new());
    assert_eq!(m.phase(), WalkPhase::Empty);
}

#[test]
fn failed_restore_keeps_current_walk() {
    let mut m = WalkMachine::new(MemoryStore::new());
    m.append(step("Person", vec![], "KNOWS", vec![], Direction::Outbound));
    let before = m.walk().clone();
    assert!(matches!(m.restore("this is not ron ["), Err(WalkError::Restore(_))));
    assert_eq!(m.walk(), &before);

    // structurally valid but breaks the non-empty label rule
    let bad = m.snapshot().unwrap().replace("\"Person\"", "\"\"");
    assert!(m.restore(&bad).is_err());
    assert_eq!(m.walk(), &before);
}

#[test]
fn open_restores_or_starts_empty() {
    let mut store = MemoryStore::new();
    store.set(WALK_KEY, "garbage").unwrap();
    assert!(WalkMachine::open(store).walk().is_empty());

    let mut m = WalkMachine::new(MemoryStore::new());
    m.append(step("Person", vec![sel("age", "30")], "KNOWS", vec![], Direction::Inbound));
    let reopened = WalkMachine::open(m.store().clone());
    assert_eq!(reopened.walk(), m.walk());
}

#[test]
fn file_store_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut store = FileStore::new(dir.path().join("state"));
    assert_eq!(store.get(WALK_KEY).unwrap(), None);
    store.set(WALK_KEY, "[]").unwrap();
    assert_eq!(store.get(WALK_KEY).unwrap().as_deref(), Some("[]"));
    assert!(dir.path().join("state").join("walk.ron").exists());
    assert!(store.set("../escape", "x").is_err());

    let mut m = WalkMachine::new(FileStore::new(dir.path().join("state")));
    m.append(step("Person", vec![], "KNOWS", vec![], Direction::Outbound));
    let reopened = WalkMachine::open(FileStore::new(dir.path().join("state")));
    assert_eq!(reopened.walk(), m.walk());
}

#[test]
fn settings_defaults_and_partial_json() {
    let s: WalkSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(s, WalkSettings::default());
    assert_eq!(s.walk_timeout_ms, 30_000);
    assert_eq!(s.overview_timeout_ms, 3_000);
    assert_eq!(s.query_log_dir(), None);

    let s: WalkSettings =
        serde_json::from_str(r#"{"query_log_enabled": true, "query_log_override": "/tmp/x", "walk_timeout_ms": 10}"#).unwrap();
    assert_eq!(s.query_log_dir(), Some(std::path::PathBuf::from("/tmp/x")));
    assert_eq!(s.walk_timeout().as_millis(), 10);
}
