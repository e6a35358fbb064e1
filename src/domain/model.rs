use crate::utils::error::{FinderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A loosely-typed document as delivered by the record store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    /// Only JSON objects can become records; everything else is malformed.
    pub fn from_value(collection: &str, index: usize, value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(obj) => Ok(Record {
                data: obj.into_iter().collect(),
            }),
            other => Err(FinderError::RecordMalformed {
                collection: collection.to_string(),
                index,
                reason: format!("expected an object, found {}", json_kind(&other)),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

pub const NAME_UNAVAILABLE: &str = "Name unavailable";
pub const SCHEDULE_UNAVAILABLE: &str = "Unavailable";

/// A normalized recycling center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub schedule: String,
    pub location_label: String,
    /// Lowercased, trimmed, non-empty.
    pub materials: BTreeSet<String>,
    /// Only set on copies returned by a distance sort.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub distance_km: Option<f64>,
}

impl Center {
    pub fn accepts(&self, material: &str) -> bool {
        self.materials.contains(material)
    }

    pub fn accepts_all<'a, I>(&self, materials: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        materials.into_iter().all(|m| self.accepts(m))
    }
}

/// One `key:value` pair of a rule, both sides lowercased and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    pub value: String,
}

impl Condition {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.trim().to_lowercase(),
            value: value.trim().to_lowercase(),
        }
    }

    pub fn predicate(&self) -> Predicate {
        Predicate::from_key(&self.key)
    }
}

/// The predicate kinds a condition key can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Material,
    Schedule,
    Location,
    Unknown,
}

impl Predicate {
    pub fn from_key(key: &str) -> Self {
        match key {
            "material" => Predicate::Material,
            "schedule" => Predicate::Schedule,
            "location" => Predicate::Location,
            _ => Predicate::Unknown,
        }
    }
}

/// An if-then fact: all conditions hold => emit the conclusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub conditions: Vec<Condition>,
    pub conclusion: String,
}

impl Rule {
    pub fn has_unknown_conditions(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.predicate() == Predicate::Unknown)
    }
}

/// A validated (latitude, longitude) pair supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(FinderError::invalid_query(
                "latitude",
                latitude,
                "must be a finite number between -90 and 90",
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(FinderError::invalid_query(
                "longitude",
                longitude,
                "must be a finite number between -180 and 180",
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parses user-entered text. Never falls back to 0.0.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self> {
        let lat = parse_coordinate("latitude", latitude)?;
        let lon = parse_coordinate("longitude", longitude)?;
        Self::new(lat, lon)
    }
}

fn parse_coordinate(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| FinderError::invalid_query(field, raw, "not a number"))
}

/// What the presentation layer asks for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub materials: Vec<String>,
    pub location: Option<GeoPoint>,
}

impl Query {
    pub fn new<I, S>(materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            materials: materials.into_iter().map(Into::into).collect(),
            location: None,
        }
    }

    pub fn near(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }
}

/// What goes back: matching centers plus triggered conclusions per center name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub centers: Vec<Center>,
    pub conclusions: BTreeMap<String, Vec<String>>,
    pub reference: Option<GeoPoint>,
}

impl Recommendation {
    pub fn count(&self) -> usize {
        self.centers.len()
    }

    /// The closest center, only meaningful once a distance sort ran.
    pub fn nearest(&self) -> Option<&Center> {
        self.reference?;
        self.centers.first()
    }

    pub fn conclusions_for(&self, center_name: &str) -> &[String] {
        self.conclusions
            .get(center_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Bookkeeping for one load cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub centers_loaded: usize,
    pub centers_skipped: usize,
    pub rules_loaded: usize,
    pub rules_skipped: usize,
    pub loaded_at: DateTime<Utc>,
}

impl Default for LoadReport {
    fn default() -> Self {
        Self {
            centers_loaded: 0,
            centers_skipped: 0,
            rules_loaded: 0,
            rules_skipped: 0,
            loaded_at: Utc::now(),
        }
    }
}
