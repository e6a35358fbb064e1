use crate::core::rules::{matches_with, UnknownConditionPolicy};
use crate::domain::model::{Center, Rule};
use std::collections::BTreeMap;

/// Cross-matches every rule against every center.
///
/// This is a plain O(centers x rules x conditions) scan with no index.
/// Both collections are expected to stay in the tens to low hundreds;
/// past that an index keyed on material would be the next step.
///
/// Conclusions keep rule order. Centers that trigger nothing are left
/// out, and centers sharing a name share one entry.
pub fn run(
    rules: &[Rule],
    centers: &[Center],
    unknown: UnknownConditionPolicy,
) -> BTreeMap<String, Vec<String>> {
    let mut triggered: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for center in centers {
        let conclusions: Vec<String> = rules
            .iter()
            .filter(|rule| matches_with(rule, center, unknown))
            .map(|rule| rule.conclusion.clone())
            .collect();

        if conclusions.is_empty() {
            continue;
        }

        tracing::debug!(
            "Center '{}' triggered {} rule(s)",
            center.name,
            conclusions.len()
        );
        triggered
            .entry(center.name.clone())
            .or_default()
            .extend(conclusions);
    }

    triggered
}
