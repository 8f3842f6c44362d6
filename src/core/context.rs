//! Per-request routing context.
//!
//! A [`RoutingContext`] is only built when the inbound call carries the
//! routing-label header. Its absence is a valid state meaning "no label-based
//! constraints"; helpers here treat it as a context whose label sets are all
//! empty.
use std::{collections::HashMap, fmt, str::FromStr};

use crate::core::label_codec::{LabelCodecResult, Labels, decode_labels};

/// Named label sets carried by a [`RoutingContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LabelSet {
    /// Labels propagated along the call chain from ambient metadata
    Transitive,
    /// Labels decoded from the current request's routing-label header
    RuleRouter,
}

impl LabelSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelSet::Transitive => "transitive",
            LabelSet::RuleRouter => "rule-router",
        }
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transitive" => Ok(LabelSet::Transitive),
            "rule-router" => Ok(LabelSet::RuleRouter),
            other => Err(format!("Unknown label set: {other}")),
        }
    }
}

/// Mutable container of label sets for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingContext {
    label_sets: HashMap<LabelSet, Labels>,
}

impl RoutingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the labels stored under `set`.
    pub fn set_labels(&mut self, set: LabelSet, labels: Labels) {
        self.label_sets.insert(set, labels);
    }

    /// Labels stored under `set`, or an empty mapping when the set is absent.
    pub fn labels(&self, set: LabelSet) -> Labels {
        self.label_sets.get(&set).cloned().unwrap_or_default()
    }

    /// Build a context from inbound headers.
    ///
    /// Returns `Ok(None)` when `header_name` is absent or carries no values.
    /// Otherwise the transitive set is always filled from `transitive`, and
    /// the rule-router set only when the decoded header labels are non-empty.
    /// Header names are matched case-insensitively; when several spellings
    /// are present their values are taken in byte order of the names.
    pub fn from_headers(
        headers: &HashMap<String, Vec<String>>,
        header_name: &str,
        transitive: &Labels,
    ) -> LabelCodecResult<Option<Self>> {
        let values = header_values(headers, header_name);
        if values.is_empty() {
            return Ok(None);
        }

        let mut context = RoutingContext::new();
        context.set_labels(LabelSet::Transitive, transitive.clone());

        let rule_labels = decode_labels(values)?;
        if !rule_labels.is_empty() {
            context.set_labels(LabelSet::RuleRouter, rule_labels);
        }

        Ok(Some(context))
    }
}

/// Labels of `set` in an optional context; an absent context has no labels.
pub fn labels_of(context: Option<&RoutingContext>, set: LabelSet) -> Labels {
    context.map(|ctx| ctx.labels(set)).unwrap_or_default()
}

fn header_values<'a>(headers: &'a HashMap<String, Vec<String>>, name: &str) -> Vec<&'a str> {
    let mut matching: Vec<(&String, &Vec<String>)> = headers
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .collect();
    matching.sort_by(|(a, _), (b, _)| a.cmp(b));

    matching
        .into_iter()
        .flat_map(|(_, values)| values.iter().map(String::as_str))
        .collect()
}
