use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Result, WalkError};

use super::executor::Row;

/// label/key/type -> number of matches
pub type Counts = BTreeMap<String, u64>;

/// One row of the adjacency query, before grouping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjacencyRecord {
    pub relationship_type: String,
    pub relationship_properties: BTreeMap<String, String>,
    pub start_label: String,
    pub end_label: String,
    /// True when the focal node is the relationship's start node. For a
    /// self-loop on the focal node this is whatever the database reported.
    pub is_outbound_from_focus: bool,
    pub count: u64,
}

/// A distinct value of one property and how many focal nodes carry it.
/// `None` stands for nodes where the property is null or missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueCount {
    pub value: Option<String>,
    pub count: u64,
}

fn decode_err(row: usize, reason: impl Into<String>) -> WalkError {
    WalkError::Decode { row, reason: reason.into() }
}

/// Textual form of a property value as the filter model stores it.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn field<'a>(row: &'a Row, idx: usize, name: &str) -> Result<&'a Value> {
    row.get(name).ok_or_else(|| decode_err(idx, format!("missing field '{}'", name)))
}

fn str_field(row: &Row, idx: usize, name: &str) -> Result<String> {
    match field(row, idx, name)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(decode_err(idx, format!("field '{}' is not a string: {}", name, other))),
    }
}

fn count_field(row: &Row, idx: usize, name: &str) -> Result<u64> {
    let v = field(row, idx, name)?;
    v.as_u64()
        .ok_or_else(|| decode_err(idx, format!("field '{}' is not a count: {}", name, v)))
}

/// Decode adjacency rows. A single undecodable row fails the whole batch.
pub fn decode_adjacency(rows: &[Row]) -> Result<Vec<AdjacencyRecord>> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let props = match field(row, idx, "props")? {
                Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), value_text(v))).collect(),
                other => return Err(decode_err(idx, format!("props is not a map: {}", other))),
            };
            let out = match field(row, idx, "out")? {
                Value::Bool(b) => *b,
                other => return Err(decode_err(idx, format!("field 'out' is not a boolean: {}", other))),
            };
            Ok(AdjacencyRecord {
                relationship_type: str_field(row, idx, "type")?,
                relationship_properties: props,
                start_label: str_field(row, idx, "startLabel")?,
                end_label: str_field(row, idx, "endLabel")?,
                is_outbound_from_focus: out,
                count: count_field(row, idx, "count")?,
            })
        })
        .collect()
}

/// Decode `<key_field>, count` rows into a map. Later duplicates win.
pub fn decode_counts(rows: &[Row], key_field: &str) -> Result<Counts> {
    let mut out = Counts::new();
    for (idx, row) in rows.iter().enumerate() {
        let key = str_field(row, idx, key_field)?;
        let count = count_field(row, idx, "count")?;
        out.insert(key, count);
    }
    Ok(out)
}

/// Decode `val, count` rows, most frequent value first.
pub fn decode_value_counts(rows: &[Row]) -> Result<Vec<ValueCount>> {
    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let value = match row.get("val") {
            None | Some(Value::Null) => None,
            Some(v) => Some(value_text(v)),
        };
        out.push(ValueCount { value, count: count_field(row, idx, "count")? });
    }
    // stable: equal counts keep row order
    out.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(out)
}

/// Key counts ordered by frequency, ties broken by name.
pub fn sorted_by_frequency(counts: &Counts) -> Vec<(String, u64)> {
    let mut list: Vec<(String, u64)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    list
}

/// Every focal node carrying the property has a different value.
pub fn is_all_unique(values: &[ValueCount], nodes_with_property: u64) -> bool {
    values.len() as u64 == nodes_with_property
}
