use std::collections::BTreeMap;

use crate::gql::decode::AdjacencyRecord;
use crate::walk::model::FilterSet;

/// relationship type -> relationship filters -> (other label, count) in row order
pub type GroupedAdjacency = BTreeMap<String, BTreeMap<FilterSet, Vec<(String, u64)>>>;

// A relationship type can reach several labels, and the query returns one
// row per type/props/label combination. Fold them into one entry per type
// and property set. Rows are never merged: two rows with the same key stay
// two entries.
pub fn group_by_type(records: &[AdjacencyRecord], focus_is_origin: bool) -> GroupedAdjacency {
    let mut grouped = GroupedAdjacency::new();
    for record in records {
        let filters = FilterSet::from_properties(&record.relationship_properties);
        let label = if focus_is_origin { &record.end_label } else { &record.start_label };
        grouped
            .entry(record.relationship_type.clone())
            .or_default()
            .entry(filters)
            .or_default()
            .push((label.clone(), record.count));
    }
    grouped
}

/// Split adjacency rows into (inbound, outbound) relative to the focal node.
pub fn split_by_direction(records: &[AdjacencyRecord]) -> (Vec<AdjacencyRecord>, Vec<AdjacencyRecord>) {
    records.iter().cloned().partition(|r| !r.is_outbound_from_focus)
}

pub fn entry_count(grouped: &GroupedAdjacency) -> usize {
    grouped.values().flat_map(|by_props| by_props.values()).map(Vec::len).sum()
}
