use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WalkError};

// Comparison used by a property filter. Only equality exists today but the
// field is persisted so older snapshots keep loading once more are added.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    Equality,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Equality => write!(f, "="),
        }
    }
}

/// A single `name = value` filter on a node or relationship.
///
/// The value is always kept in its textual form; whether it is emitted as a
/// number or a string is decided by the literal encoder at compile time.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertySelection {
    name: String,
    #[serde(default)]
    operator: Operator,
    value: String,
}

impl PropertySelection {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(WalkError::InvalidSelection("property name must not be empty".into()));
        }
        Ok(Self { name, operator: Operator::Equality, value: value.into() })
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn operator(&self) -> Operator { self.operator }
    pub fn value(&self) -> &str { &self.value }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(WalkError::InvalidSelection("property name must not be empty".into()));
        }
        Ok(())
    }
}

impl fmt::Display for PropertySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.operator, self.value)
    }
}

/// Filters reconstructed from a relationship's property map, ordered by
/// property name. Used as the second-level grouping key for adjacency
/// results, so two maps with the same entries always land in one bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterSet(Vec<PropertySelection>);

impl FilterSet {
    pub fn from_properties(props: &BTreeMap<String, String>) -> Self {
        // BTreeMap iteration is already key-sorted; empty keys cannot form a filter
        let selections = props
            .iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| PropertySelection {
                name: name.clone(),
                operator: Operator::Equality,
                value: value.clone(),
            })
            .collect();
        FilterSet(selections)
    }

    pub fn selections(&self) -> &[PropertySelection] { &self.0 }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn into_selections(self) -> Vec<PropertySelection> { self.0 }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// The relationship type and filters locked in for one hop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipPick {
    type_name: String,
    #[serde(default)]
    properties: Vec<PropertySelection>,
}

impl RelationshipPick {
    pub fn new(type_name: impl Into<String>, properties: Vec<PropertySelection>) -> Result<Self> {
        let pick = Self { type_name: type_name.into(), properties };
        pick.validate()?;
        Ok(pick)
    }

    pub fn type_name(&self) -> &str { &self.type_name }
    pub fn properties(&self) -> &[PropertySelection] { &self.properties }

    fn validate(&self) -> Result<()> {
        if self.type_name.is_empty() {
            return Err(WalkError::InvalidStep("relationship type must not be empty".into()));
        }
        self.properties.iter().try_for_each(PropertySelection::validate)
    }
}

/// The node label and filters active where a hop starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePick {
    label: String,
    #[serde(default)]
    properties: Vec<PropertySelection>,
}

impl NodePick {
    pub fn new(label: impl Into<String>, properties: Vec<PropertySelection>) -> Result<Self> {
        let pick = Self { label: label.into(), properties };
        pick.validate()?;
        Ok(pick)
    }

    pub fn label(&self) -> &str { &self.label }
    pub fn properties(&self) -> &[PropertySelection] { &self.properties }

    fn validate(&self) -> Result<()> {
        if self.label.is_empty() {
            return Err(WalkError::InvalidStep("node label must not be empty".into()));
        }
        self.properties.iter().try_for_each(PropertySelection::validate)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn is_inbound(self) -> bool { matches!(self, Direction::Inbound) }
}

/// One committed hop of a walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    relationship: RelationshipPick,
    direction: Direction,
    origin_node: NodePick,
}

impl Step {
    pub fn new(origin_node: NodePick, relationship: RelationshipPick, direction: Direction) -> Self {
        Self { relationship, direction, origin_node }
    }

    pub fn relationship(&self) -> &RelationshipPick { &self.relationship }
    pub fn direction(&self) -> Direction { self.direction }
    pub fn origin_node(&self) -> &NodePick { &self.origin_node }

    pub(crate) fn validate(&self) -> Result<()> {
        self.origin_node.validate()?;
        self.relationship.validate()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node_props: Vec<String> = self.origin_node.properties.iter().map(|p| p.to_string()).collect();
        let rel_props: Vec<String> = self.relationship.properties.iter().map(|p| p.to_string()).collect();
        write!(f, "({}", self.origin_node.label)?;
        if !node_props.is_empty() { write!(f, " {{{}}}", node_props.join(", "))?; }
        write!(f, ")")?;
        if self.direction.is_inbound() { write!(f, "<")?; }
        write!(f, "-[{}", self.relationship.type_name)?;
        if !rel_props.is_empty() { write!(f, " {{{}}}", rel_props.join(", "))?; }
        write!(f, "]-")?;
        if !self.direction.is_inbound() { write!(f, ">")?; }
        Ok(())
    }
}

/// Ordered hops from an implicit anonymous start node.
///
/// A walk is a value: transitions return a new walk instead of editing this
/// one in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Walk {
    steps: Vec<Step>,
}

impl Walk {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.steps.len() }
    pub fn is_empty(&self) -> bool { self.steps.is_empty() }
    pub fn steps(&self) -> &[Step] { &self.steps }
    pub fn iter(&self) -> std::slice::Iter<'_, Step> { self.steps.iter() }

    pub fn appended(&self, step: Step) -> Walk {
        let mut steps = self.steps.clone();
        steps.push(step);
        Walk { steps }
    }

    // Later steps depend on earlier schema choices, so everything from
    // `from` onwards goes. Past-the-end indexes leave the walk unchanged.
    pub fn truncated(&self, from: usize) -> Walk {
        let keep = from.min(self.steps.len());
        Walk { steps: self.steps[..keep].to_vec() }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.steps.iter().try_for_each(Step::validate)
    }
}

impl FromIterator<Step> for Walk {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Walk { steps: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a Walk {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;
    fn into_iter(self) -> Self::IntoIter { self.steps.iter() }
}

/// Scratch state for the step being composed: the focal label and the
/// filters picked for it so far. An empty label means "not ready".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateSelection {
    label: String,
    properties: Vec<PropertySelection>,
}

impl CandidateSelection {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), properties: Vec::new() }
    }

    pub fn label(&self) -> &str { &self.label }
    pub fn properties(&self) -> &[PropertySelection] { &self.properties }
    pub fn is_ready(&self) -> bool { !self.label.is_empty() }

    /// Switching label drops every filter picked for the previous one.
    pub fn with_label(&self, label: impl Into<String>) -> Self {
        Self::new(label)
    }

    /// Adds a filter; a filter on a property that is already filtered
    /// replaces the old value in place.
    pub fn with_filter(&self, selection: PropertySelection) -> Self {
        let mut properties = self.properties.clone();
        match properties.iter_mut().find(|p| p.name == selection.name) {
            Some(existing) => *existing = selection,
            None => properties.push(selection),
        }
        Self { label: self.label.clone(), properties }
    }

    pub fn without_filter(&self, index: usize) -> Self {
        let mut properties = self.properties.clone();
        if index < properties.len() {
            properties.remove(index);
        }
        Self { label: self.label.clone(), properties }
    }

    pub fn to_node_pick(&self) -> Result<NodePick> {
        NodePick::new(self.label.clone(), self.properties.clone())
    }
}
