use crate::walk::model::{Direction, PropertySelection, Walk};

use super::literal::{encode, encode_identifier};

pub const MATCH_KEYWORD: &str = "MATCH ";

// `{name: value, ...}` in insertion order; nothing at all when there are no filters.
pub(crate) fn property_block(props: &[PropertySelection]) -> String {
    if props.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = props
        .iter()
        .map(|p| format!("{}: {}", p.name(), encode(p.value())))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

/// Node pattern `(var:`Label`{...})`. `var` may be empty for anonymous nodes.
pub(crate) fn node_pattern(var: &str, label: &str, props: &[PropertySelection]) -> String {
    format!("({}:{}{})", var, encode_identifier(label), property_block(props))
}

/// Fold the committed steps of a walk into a `MATCH` prefix.
///
/// Each step contributes its origin node pattern followed by the relationship
/// pattern, with the arrow on the side given by the step's direction. The
/// result ends with an open relationship, so callers append the node pattern
/// the walk arrives at. An empty walk yields just `MATCH `.
pub fn compile_prefix(walk: &Walk) -> String {
    let mut query = String::from(MATCH_KEYWORD);
    for step in walk {
        let node = step.origin_node();
        query.push_str(&node_pattern("", node.label(), node.properties()));

        if step.direction() == Direction::Inbound {
            query.push('<');
        }
        let rel = step.relationship();
        query.push_str("-[:");
        query.push_str(rel.type_name());
        query.push_str(&property_block(rel.properties()));
        query.push_str("]-");
        if step.direction() == Direction::Outbound {
            query.push('>');
        }
    }
    query
}
