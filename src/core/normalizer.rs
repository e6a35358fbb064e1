//! Turns loosely-typed center documents into fully-defaulted `Center`s.
//!
//! The store is semi-structured, so nothing here fails on a missing or
//! unparsable field; only a document that is not a mapping at all is
//! rejected (see `Record::from_value`).

use crate::domain::model::{Center, Record, NAME_UNAVAILABLE, SCHEDULE_UNAVAILABLE};
use crate::utils::error::Result;
use serde_json::Value;
use std::collections::BTreeSet;

const NAME_KEYS: &[&str] = &["name", "nombre"];
const LATITUDE_KEYS: &[&str] = &["latitude", "lat"];
const LONGITUDE_KEYS: &[&str] = &["longitude", "lon", "lng"];
const SCHEDULE_KEYS: &[&str] = &["schedule", "horario"];
const LOCATION_KEYS: &[&str] = &["location_label", "ubicacion"];
const MATERIAL_KEYS: &[&str] = &["materials", "materiales"];

pub fn normalize_value(collection: &str, index: usize, value: Value) -> Result<Center> {
    let record = Record::from_value(collection, index, value)?;
    Ok(normalize_center(&record))
}

pub fn normalize_center(record: &Record) -> Center {
    let name = field(record, NAME_KEYS)
        .and_then(scalar_text)
        .unwrap_or_else(|| NAME_UNAVAILABLE.to_string());

    let schedule = field(record, SCHEDULE_KEYS)
        .and_then(scalar_text)
        .unwrap_or_else(|| SCHEDULE_UNAVAILABLE.to_string());

    let location_label = field(record, LOCATION_KEYS)
        .and_then(scalar_text)
        .unwrap_or_else(|| name.clone());

    Center {
        latitude: field(record, LATITUDE_KEYS).map(coordinate).unwrap_or(0.0),
        longitude: field(record, LONGITUDE_KEYS).map(coordinate).unwrap_or(0.0),
        materials: field(record, MATERIAL_KEYS)
            .map(materials)
            .unwrap_or_default(),
        name,
        schedule,
        location_label,
        distance_km: None,
    }
}

/// Lowercase and trim a material name; `None` when nothing is left.
pub fn canonical_material(raw: &str) -> Option<String> {
    let value = raw.trim().to_lowercase();
    (!value.is_empty()).then_some(value)
}

// Canonical keys win over aliases; blank text falls through to the next key.
fn field<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(key))
        .find(|value| !matches!(value, Value::String(s) if s.trim().is_empty()))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coordinate(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn materials(value: &Value) -> BTreeSet<String> {
    match value {
        Value::String(s) => s.split(',').filter_map(canonical_material).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .filter_map(|m| canonical_material(&m))
            .collect(),
        Value::Number(_) | Value::Bool(_) => scalar_text(value)
            .and_then(|m| canonical_material(&m))
            .into_iter()
            .collect(),
        _ => BTreeSet::new(),
    }
}
