//! Rule documents and the `key:value;key:value` condition language.

use crate::domain::model::{Center, Condition, Predicate, Record, Rule};
use crate::utils::error::{FinderError, Result};
use serde::{Deserialize, Serialize};

const CONDITION_PREFIXES: &[&str] = &["condition", "condicion"];

/// What to do with a condition whose key names no known predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownConditionPolicy {
    #[default]
    Pass,
    Fail,
}

/// What to do with a rule that parsed to zero conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRulePolicy {
    #[default]
    MatchAll,
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePolicy {
    #[serde(default)]
    pub unknown_conditions: UnknownConditionPolicy,
    #[serde(default)]
    pub empty_rules: EmptyRulePolicy,
}

/// Splits on `;`, then on the first `:` of each segment. Segments
/// without a `:` are dropped.
pub fn parse_conditions(raw: &str) -> Vec<Condition> {
    raw.split(';')
        .filter_map(|segment| segment.split_once(':'))
        .map(|(key, value)| Condition::new(key, value))
        .collect()
}

pub fn parse_rule(collection: &str, index: usize, value: serde_json::Value) -> Result<Rule> {
    let record = Record::from_value(collection, index, value)?;
    rule_from_record(&record).map_err(|reason| FinderError::RecordMalformed {
        collection: collection.to_string(),
        index,
        reason,
    })
}

/// Every `condition*` field contributes one `;`-separated group; the
/// groups are combined in order of their numeric suffix.
pub fn rule_from_record(record: &Record) -> std::result::Result<Rule, String> {
    let conclusion = match record.get("conclusion") {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(_) => return Err("'conclusion' must be a non-empty string".to_string()),
        None => return Err("missing 'conclusion'".to_string()),
    };

    let mut groups: Vec<(SuffixKey, &str, &str)> = record
        .data
        .iter()
        .filter_map(|(key, value)| {
            let suffix = condition_suffix(key)?;
            match value {
                serde_json::Value::String(s) => {
                    Some((SuffixKey::from(suffix), key.as_str(), s.as_str()))
                }
                other => {
                    tracing::debug!("Ignoring non-text condition field '{}': {}", key, other);
                    None
                }
            }
        })
        .collect();
    // Ties on the suffix fall back to the field name.
    groups.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let combined = groups
        .iter()
        .map(|(_, _, group)| *group)
        .collect::<Vec<_>>()
        .join(";");

    Ok(Rule {
        conditions: parse_conditions(&combined),
        conclusion,
    })
}

fn condition_suffix(key: &str) -> Option<String> {
    let lowered = key.trim().to_lowercase();
    CONDITION_PREFIXES
        .iter()
        .find_map(|prefix| lowered.strip_prefix(prefix).map(str::to_string))
}

/// Bare `condition` first, then `condition2` before `condition10`;
/// non-numeric suffixes sort last.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SuffixKey {
    Bare,
    Numbered(u64),
    Named(String),
}

impl From<String> for SuffixKey {
    fn from(suffix: String) -> Self {
        let stripped = suffix.trim_start_matches(['_', '-']);
        if stripped.is_empty() {
            return SuffixKey::Bare;
        }
        let digits: String = stripped.chars().filter(char::is_ascii_digit).collect();
        if digits.len() == stripped.len() {
            if let Ok(n) = digits.parse() {
                return SuffixKey::Numbered(n);
            }
        }
        SuffixKey::Named(suffix)
    }
}

/// `None` when the key names no known predicate.
pub fn condition_holds(condition: &Condition, center: &Center) -> Option<bool> {
    let value = condition.value.as_str();
    match condition.predicate() {
        Predicate::Material => Some(center.accepts(value)),
        Predicate::Schedule => Some(center.schedule.to_lowercase().contains(value)),
        Predicate::Location => Some(center.location_label.trim().to_lowercase() == value),
        Predicate::Unknown => None,
    }
}

/// Conjunction of all conditions; unknown keys pass.
pub fn matches(rule: &Rule, center: &Center) -> bool {
    matches_with(rule, center, UnknownConditionPolicy::Pass)
}

pub fn matches_with(rule: &Rule, center: &Center, unknown: UnknownConditionPolicy) -> bool {
    rule.conditions.iter().all(|condition| {
        condition_holds(condition, center)
            .unwrap_or(unknown == UnknownConditionPolicy::Pass)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalizer::normalize_value;
    use serde_json::json;

    fn center(value: serde_json::Value) -> Center {
        normalize_value("centers", 0, value).unwrap()
    }

    fn rule(conditions: &str) -> Rule {
        Rule {
            conditions: parse_conditions(conditions),
            conclusion: "fires".to_string(),
        }
    }

    #[test]
    fn test_parse_conditions() {
        let conditions = parse_conditions(" Material : PET ;garbage; ;ubicacion:Centro");
        assert_eq!(
            conditions,
            vec![
                Condition::new("material", "pet"),
                Condition::new("ubicacion", "centro"),
            ]
        );
        assert!(parse_conditions("").is_empty());
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let conditions = parse_conditions("schedule:9:00-17:00");
        assert_eq!(conditions, vec![Condition::new("schedule", "9:00-17:00")]);
    }

    #[test]
    fn test_rule_from_condition_fields() {
        let rule = parse_rule(
            "rules",
            0,
            json!({
                "condicion2": "ubicacion:centro",
                "condicion1": "material:pet",
                "conclusion": "Eligible for PET rebate"
            }),
        )
        .unwrap();
        assert_eq!(
            rule.conditions,
            vec![
                Condition::new("material", "pet"),
                Condition::new("ubicacion", "centro"),
            ]
        );
        assert_eq!(rule.conclusion, "Eligible for PET rebate");
    }

    #[test]
    fn test_condition_fields_use_numeric_order() {
        let rule = parse_rule(
            "rules",
            0,
            json!({
                "condition10": "location:c",
                "condition2": "schedule:b",
                "condition1": "material:a",
                "conclusion": "ok"
            }),
        )
        .unwrap();
        let keys: Vec<_> = rule.conditions.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["material", "schedule", "location"]);
    }

    #[test]
    fn test_bare_condition_field_comes_first() {
        let rule = parse_rule(
            "rules",
            0,
            json!({
                "condition2": "schedule:b",
                "condition": "material:a",
                "condition1": "location:c",
                "conclusion": "ok"
            }),
        )
        .unwrap();
        let keys: Vec<_> = rule.conditions.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["material", "location", "schedule"]);
    }

    #[test]
    fn test_tied_suffixes_order_by_field_name() {
        for _ in 0..50 {
            let rule = parse_rule(
                "rules",
                0,
                json!({
                    "condition1": "material:pet",
                    "condicion1": "location:centro",
                    "condition_1": "schedule:lunes",
                    "conclusion": "x"
                }),
            )
            .unwrap();
            let keys: Vec<_> = rule.conditions.iter().map(|c| c.key.as_str()).collect();
            assert_eq!(keys, vec!["location", "material", "schedule"]);
        }
    }

    #[test]
    fn test_rule_without_conclusion_is_malformed() {
        assert!(parse_rule("rules", 1, json!({"condition": "material:pet"})).is_err());
        assert!(parse_rule("rules", 1, json!({"conclusion": 5})).is_err());
        assert!(parse_rule("rules", 1, json!(null)).is_err());
    }

    #[test]
    fn test_material_predicate() {
        let r = rule("material:pet");
        assert!(matches(&r, &center(json!({"materials": "pet,glass"}))));
        assert!(!matches(&r, &center(json!({"materials": "glass"}))));
    }

    #[test]
    fn test_schedule_and_location_predicates() {
        let c = center(json!({
            "name": "Centro Histórico",
            "schedule": "Lunes a Viernes 9-17",
            "materials": ["pet"]
        }));
        assert!(matches(&rule("schedule:viernes"), &c));
        assert!(!matches(&rule("schedule:domingo"), &c));
        // location falls back to the name and must match exactly
        assert!(matches(&rule("location:centro histórico"), &c));
        assert!(!matches(&rule("location:centro"), &c));
        assert!(matches(&rule("material:pet;schedule:lunes"), &c));
        assert!(!matches(&rule("material:pet;schedule:domingo"), &c));
    }

    #[test]
    fn test_unknown_predicates() {
        let c = center(json!({"materials": "pet"}));
        let r = rule("material:pet;color:green");
        assert!(matches(&r, &c));
        assert!(!matches_with(&r, &c, UnknownConditionPolicy::Fail));
        assert!(r.has_unknown_conditions());
    }

    #[test]
    fn test_empty_rule_matches_everything() {
        let r = rule("no separators here");
        assert!(r.conditions.is_empty());
        assert!(matches(&r, &center(json!({}))));
    }
}
