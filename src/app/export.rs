use crate::domain::model::{Center, Recommendation};
use crate::utils::error::{FinderError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

pub fn render(recommendation: &Recommendation, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(recommendation)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(recommendation)?),
        OutputFormat::Csv => render_csv(recommendation),
    }
}

pub fn render_materials(materials: &[String]) -> String {
    materials.iter().map(|m| format!("{}\n", m)).collect()
}

fn format_distance(center: &Center) -> String {
    center
        .distance_km
        .map(|d| format!("{:.2} km", d))
        .unwrap_or_default()
}

fn render_text(recommendation: &Recommendation) -> String {
    let mut lines = vec![format!("Centers found: {}", recommendation.count())];

    if recommendation.centers.is_empty() {
        lines.push("No recycling centers found. Try fewer filters.".to_string());
        return lines.join("\n") + "\n";
    }

    if let Some(nearest) = recommendation.nearest() {
        lines.push(format!(
            "Nearest center: {} ({})",
            nearest.name,
            format_distance(nearest)
        ));
    }
    lines.push(String::new());

    for center in &recommendation.centers {
        match center.distance_km {
            Some(_) => lines.push(format!("- {} [{}]", center.name, format_distance(center))),
            None => lines.push(format!("- {}", center.name)),
        }
        lines.push(format!("    Schedule:  {}", center.schedule));
        lines.push(format!("    Location:  {}", center.location_label));
        lines.push(format!(
            "    Materials: {}",
            center.materials.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
        for conclusion in recommendation.conclusions_for(&center.name) {
            lines.push(format!("    * {}", conclusion));
        }
    }
    lines.join("\n") + "\n"
}

fn render_csv(recommendation: &Recommendation) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "name",
        "latitude",
        "longitude",
        "schedule",
        "location_label",
        "materials",
        "distance_km",
        "recommendations",
    ])?;

    for center in &recommendation.centers {
        writer.write_record([
            center.name.clone(),
            center.latitude.to_string(),
            center.longitude.to_string(),
            center.schedule.clone(),
            center.location_label.clone(),
            center.materials.iter().cloned().collect::<Vec<_>>().join(";"),
            center
                .distance_km
                .map(|d| format!("{:.2}", d))
                .unwrap_or_default(),
            recommendation.conclusions_for(&center.name).join(" | "),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FinderError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| FinderError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recommender::Recommender;
    use crate::domain::model::GeoPoint;
    use serde_json::json;

    fn recommendation(with_location: bool) -> Recommendation {
        let r = Recommender::load(
            vec![
                json!({"name": "Norte", "latitude": 19.5, "longitude": -99.13, "materials": "pet,glass", "schedule": "9-17"}),
                json!({"name": "Sur", "latitude": 19.3, "longitude": -99.15, "materials": "pet"}),
            ],
            vec![json!({"condition1": "material:glass", "conclusion": "Rinse jars first"})],
        );
        let mut centers = r.filter_by_materials(["pet"]);
        let mut reference = None;
        if with_location {
            centers = r.sort_by_distance(19.29, -99.15, &centers).unwrap();
            reference = Some(GeoPoint::new(19.29, -99.15).unwrap());
        }
        let conclusions = r.apply_rules(&centers);
        Recommendation {
            centers,
            conclusions,
            reference,
        }
    }

    #[test]
    fn test_text_output() {
        let text = render(&recommendation(true), OutputFormat::Text).unwrap();
        assert!(text.starts_with("Centers found: 2"));
        assert!(text.contains("Nearest center: Sur ("));
        assert!(text.contains("    * Rinse jars first"));

        let text = render(&recommendation(false), OutputFormat::Text).unwrap();
        assert!(!text.contains("Nearest center"));

        let text = render(&Recommendation::default(), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "Centers found: 0\nNo recycling centers found. Try fewer filters.\n"
        );
    }

    #[test]
    fn test_materials_listing() {
        let listing = render_materials(&["Glass".to_string(), "Pet".to_string()]);
        assert_eq!(listing, "Glass\nPet\n");
        assert_eq!(render_materials(&[]), "");
    }

    #[test]
    fn test_csv_output() {
        let csv = render(&recommendation(true), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("name,latitude"));
        assert!(lines[1].starts_with("Sur,"));
        assert!(lines[2].contains("glass;pet"));
        assert!(lines[2].ends_with("Rinse jars first"));
    }

    #[test]
    fn test_json_output() {
        let out = render(&recommendation(false), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["centers"].as_array().unwrap().len(), 2);
        assert_eq!(value["conclusions"]["Norte"][0], "Rinse jars first");
        assert!(value["centers"][0].get("distance_km").is_none());
    }
}
