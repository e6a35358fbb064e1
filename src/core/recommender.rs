use crate::core::normalizer::{canonical_material, normalize_value};
use crate::core::rules::{parse_rule, EmptyRulePolicy, RulePolicy};
use crate::core::{geo, inference};
use crate::domain::model::{Center, GeoPoint, LoadReport, Rule};
use crate::utils::error::Result;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub const CENTERS_COLLECTION: &str = "centers";
pub const RULES_COLLECTION: &str = "rules";

/// Holds one load cycle's centers and rules. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    centers: Vec<Center>,
    rules: Vec<Rule>,
    policy: RulePolicy,
    report: LoadReport,
}

impl Recommender {
    pub fn load(
        center_records: Vec<serde_json::Value>,
        rule_records: Vec<serde_json::Value>,
    ) -> Self {
        Self::load_with_policy(center_records, rule_records, RulePolicy::default())
    }

    /// Never fails: records that cannot be normalized are logged and skipped.
    pub fn load_with_policy(
        center_records: Vec<serde_json::Value>,
        rule_records: Vec<serde_json::Value>,
        policy: RulePolicy,
    ) -> Self {
        let mut report = LoadReport::default();

        let mut centers = Vec::with_capacity(center_records.len());
        for (index, value) in center_records.into_iter().enumerate() {
            match normalize_value(CENTERS_COLLECTION, index, value) {
                Ok(center) => centers.push(center),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping center: {}", e);
                    report.centers_skipped += 1;
                }
            }
        }

        let mut rules = Vec::with_capacity(rule_records.len());
        for (index, value) in rule_records.into_iter().enumerate() {
            let rule = match parse_rule(RULES_COLLECTION, index, value) {
                Ok(rule) => rule,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping rule: {}", e);
                    report.rules_skipped += 1;
                    continue;
                }
            };

            if rule.conditions.is_empty() {
                if policy.empty_rules == EmptyRulePolicy::Reject {
                    tracing::warn!(
                        "⚠️ Rejecting rule #{} ('{}'): no parsable conditions",
                        index,
                        rule.conclusion
                    );
                    report.rules_skipped += 1;
                    continue;
                }
                tracing::warn!(
                    "⚠️ Rule #{} ('{}') has no conditions and will match every center",
                    index,
                    rule.conclusion
                );
            }
            if rule.has_unknown_conditions() {
                tracing::warn!(
                    "⚠️ Rule #{} ('{}') uses unknown condition keys; policy: {:?}",
                    index,
                    rule.conclusion,
                    policy.unknown_conditions
                );
            }
            rules.push(rule);
        }

        report.centers_loaded = centers.len();
        report.rules_loaded = rules.len();
        tracing::info!(
            "Loaded {} centers ({} skipped) and {} rules ({} skipped)",
            report.centers_loaded,
            report.centers_skipped,
            report.rules_loaded,
            report.rules_skipped
        );

        Self {
            centers,
            rules,
            policy,
            report,
        }
    }

    pub fn centers(&self) -> &[Center] {
        &self.centers
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Every accepted material, capitalized for display, sorted, deduplicated.
    pub fn all_materials(&self) -> Vec<String> {
        self.centers
            .iter()
            .flat_map(|c| c.materials.iter())
            .map(|m| capitalize(m))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Centers accepting every selected material. An empty selection
    /// filters nothing.
    pub fn filter_by_materials<I, S>(&self, selected: I) -> Vec<Center>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: BTreeSet<String> = selected
            .into_iter()
            .filter_map(|m| canonical_material(m.as_ref()))
            .collect();

        if wanted.is_empty() {
            return self.centers.clone();
        }

        self.centers
            .iter()
            .filter(|c| c.accepts_all(&wanted))
            .cloned()
            .collect()
    }

    /// Returns copies of `centers` carrying `distance_km`, nearest first.
    /// Ties keep their input order. The inputs are left untouched.
    pub fn sort_by_distance(&self, lat: f64, lon: f64, centers: &[Center]) -> Result<Vec<Center>> {
        let origin = GeoPoint::new(lat, lon)?;
        Ok(sort_from(origin, centers))
    }

    pub fn apply_rules(&self, centers: &[Center]) -> BTreeMap<String, Vec<String>> {
        inference::run(&self.rules, centers, self.policy.unknown_conditions)
    }
}

pub fn sort_from(origin: GeoPoint, centers: &[Center]) -> Vec<Center> {
    let mut ranked: Vec<Center> = centers
        .iter()
        .map(|c| Center {
            distance_km: Some(geo::distance(
                origin.latitude,
                origin.longitude,
                c.latitude,
                c.longitude,
            )),
            ..c.clone()
        })
        .collect();

    // `sort_by` is stable
    ranked.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Recommender {
        Recommender::load(
            vec![
                json!({"name": "Norte", "latitude": 19.50, "longitude": -99.13, "materials": "pet,glass,paper"}),
                json!({"name": "Centro", "latitude": 19.43, "longitude": -99.13, "materials": ["Glass"]}),
                json!({"name": "Sur", "latitude": 19.30, "longitude": -99.15, "materials": "pet, cartón"}),
            ],
            vec![json!({"condition1": "material:pet", "conclusion": "PET rebate"})],
        )
    }

    #[test]
    fn test_all_materials() {
        assert_eq!(
            sample().all_materials(),
            vec!["Cartón", "Glass", "Paper", "Pet"]
        );
        assert!(Recommender::default().all_materials().is_empty());
    }

    #[test]
    fn test_empty_selection_is_identity() {
        let r = sample();
        assert_eq!(r.filter_by_materials(Vec::<String>::new()), r.centers());
        assert_eq!(r.filter_by_materials(["  "]).len(), 3);
    }

    #[test]
    fn test_filter_is_superset_and_case_insensitive() {
        let r = sample();
        let names = |cs: Vec<Center>| cs.into_iter().map(|c| c.name).collect::<Vec<_>>();

        assert_eq!(names(r.filter_by_materials(["PET"])), vec!["Norte", "Sur"]);
        assert_eq!(names(r.filter_by_materials(["pet", "Glass"])), vec!["Norte"]);
        assert!(r.filter_by_materials(["metal"]).is_empty());

        let all = r.filter_by_materials(Vec::<&str>::new());
        for c in r.filter_by_materials(["glass"]) {
            assert!(all.contains(&c));
        }
    }

    #[test]
    fn test_sort_by_distance_returns_fresh_copies() {
        let r = sample();
        let input = r.filter_by_materials(Vec::<&str>::new());
        let sorted = r.sort_by_distance(19.29, -99.15, &input).unwrap();

        let names: Vec<_> = sorted.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Sur", "Centro", "Norte"]);
        assert!(sorted
            .windows(2)
            .all(|w| w[0].distance_km.unwrap() <= w[1].distance_km.unwrap()));
        assert!(input.iter().all(|c| c.distance_km.is_none()));
        assert!(r.centers().iter().all(|c| c.distance_km.is_none()));
    }

    #[test]
    fn test_sort_is_stable_and_overwrites_distance() {
        let r = Recommender::load(
            vec![
                json!({"name": "first", "latitude": 10.0, "longitude": 10.0}),
                json!({"name": "second", "latitude": 10.0, "longitude": 10.0}),
                json!({"name": "third", "latitude": 0.0, "longitude": 0.0}),
            ],
            vec![],
        );
        let once = r.sort_by_distance(0.0, 0.0, r.centers()).unwrap();
        let names: Vec<_> = once.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["third", "first", "second"]);

        let again = r.sort_by_distance(10.0, 10.0, &once).unwrap();
        let names: Vec<_> = again.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(again[0].distance_km, Some(0.0));
    }

    #[test]
    fn test_sort_rejects_invalid_coordinates() {
        let r = sample();
        assert!(r.sort_by_distance(f64::NAN, 0.0, r.centers()).is_err());
        assert!(r.sort_by_distance(0.0, 200.0, r.centers()).is_err());
    }

    #[test]
    fn test_apply_rules() {
        let r = sample();
        let result = r.apply_rules(&r.filter_by_materials(["pet"]));
        assert_eq!(result["Norte"], vec!["PET rebate".to_string()]);
        assert_eq!(result["Sur"], vec!["PET rebate".to_string()]);
        assert!(!result.contains_key("Centro"));
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let r = Recommender::load(
            vec![
                json!({"name": "A"}),
                json!({"name": "B"}),
                json!(42),
                json!({"name": "C"}),
                json!({"name": "D"}),
                json!({"name": "E"}),
            ],
            vec![json!("nope"), json!({"conclusion": "ok", "condition": "material:pet"})],
        );
        assert_eq!(r.centers().len(), 5);
        assert_eq!(r.report().centers_skipped, 1);
        assert_eq!(r.rules().len(), 1);
        assert_eq!(r.report().rules_skipped, 1);
    }

    #[test]
    fn test_empty_rule_policies() {
        let centers = vec![json!({"name": "A"})];
        let rules = vec![json!({"conclusion": "Always shown"})];

        let permissive = Recommender::load(centers.clone(), rules.clone());
        assert_eq!(
            permissive.apply_rules(permissive.centers())["A"],
            vec!["Always shown".to_string()]
        );

        let strict = Recommender::load_with_policy(
            centers,
            rules,
            RulePolicy {
                empty_rules: EmptyRulePolicy::Reject,
                ..Default::default()
            },
        );
        assert!(strict.rules().is_empty());
        assert!(strict.apply_rules(strict.centers()).is_empty());
    }

    #[test]
    fn test_empty_collection() {
        let r = Recommender::load(vec![], vec![]);
        assert!(r.all_materials().is_empty());
        assert!(r.filter_by_materials(["pet"]).is_empty());
        assert!(r.filter_by_materials(Vec::<&str>::new()).is_empty());
        assert!(r.apply_rules(r.centers()).is_empty());
        assert!(r.sort_by_distance(0.0, 0.0, r.centers()).unwrap().is_empty());
    }
}
