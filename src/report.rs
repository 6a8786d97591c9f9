//! Tabular rendering of resolved requirements

use std::collections::HashMap;
use std::fmt;

use crate::calculator::Requirements;

/// Cut a value to two decimals for display
pub fn truncate2(value: f64) -> f64 {
    (value * 100.0 + 1e-9).trunc() / 100.0
}

/// Format one row per material, optionally followed by its ingredient rates
pub fn format_requirements(requirements: &Requirements) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<32} {:>10}  {:<28} {:>8}\n",
        "Material", "Rate (/s)", "Building", "Count"
    ));
    output.push_str(&format!("{}\n", "-".repeat(82)));

    for (material, req) in requirements.iter() {
        match &req.building {
            Some(building) => output.push_str(&format!(
                "{:<32} {:>10.2}  {:<28} {:>8.2}\n",
                material,
                truncate2(req.rate),
                building.name,
                truncate2(building.amount)
            )),
            None => output.push_str(&format!(
                "{:<32} {:>10.2}  {:<28} {:>8}\n",
                material,
                truncate2(req.rate),
                "(raw input)",
                "-"
            )),
        }

        for ingredient in req.input.iter().flatten() {
            output.push_str(&format!(
                "  <- {:<27} {:>10.2}\n",
                ingredient.name,
                truncate2(ingredient.amount)
            ));
        }
    }

    output
}

/// Summary of a production chain calculation
#[derive(Debug)]
pub struct ChainSummary {
    pub target_material: String,
    pub target_rate: f64,
    pub building_counts: Vec<(String, f64)>,
    pub raw_inputs: Vec<(String, f64)>,
}

/// Total buildings per building name and raw input rates
pub fn summarize(requirements: &Requirements, target_material: &str, target_rate: f64) -> ChainSummary {
    let mut building_counts: HashMap<String, f64> = HashMap::new();
    let mut raw_inputs: HashMap<String, f64> = HashMap::new();

    for (material, req) in requirements.iter() {
        match &req.building {
            Some(building) => {
                *building_counts.entry(building.name.clone()).or_default() += building.amount;
            }
            None => {
                *raw_inputs.entry(material.to_string()).or_default() += req.rate;
            }
        }
    }

    let mut building_list: Vec<_> = building_counts.into_iter().collect();
    building_list.sort_by(|a, b| a.0.cmp(&b.0));

    let mut raw_list: Vec<_> = raw_inputs.into_iter().collect();
    raw_list.sort_by(|a, b| a.0.cmp(&b.0));

    ChainSummary {
        target_material: target_material.to_string(),
        target_rate,
        building_counts: building_list,
        raw_inputs: raw_list,
    }
}

impl fmt::Display for ChainSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Production Summary ===")?;
        writeln!(
            f,
            "Target: {} @ {:.2}/s",
            self.target_material,
            truncate2(self.target_rate)
        )?;
        writeln!(f)?;

        writeln!(f, "{:<32} {:>8}", "Building", "Count")?;
        writeln!(f, "{}", "-".repeat(41))?;
        for (name, count) in &self.building_counts {
            writeln!(f, "{:<32} {:>8.2}", name, truncate2(*count))?;
        }
        writeln!(f)?;

        writeln!(f, "Raw inputs required:")?;
        for (name, rate) in &self.raw_inputs {
            writeln!(f, "  {} @ {:.2}/s", name, truncate2(*rate))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::RequirementForMaterial;
    use crate::models::MaterialAmount;

    fn produced(rate: f64, building: &str, count: f64) -> RequirementForMaterial {
        RequirementForMaterial {
            rate,
            building: Some(MaterialAmount::new(building, count)),
            input: None,
        }
    }

    fn requirements() -> Requirements {
        let mut requirements = Requirements::new();
        requirements
            .merge_entry("Iron Ore", RequirementForMaterial::raw(3.0, false))
            .unwrap();
        requirements
            .merge_entry("Iron Ingot", produced(3.0, "Smelter", 3.0))
            .unwrap();
        requirements
            .merge_entry("Gear", produced(1.0, "Assembling Machine Mk.1", 1.333))
            .unwrap();
        requirements
            .merge_entry("Motor", produced(1.0, "Assembling Machine Mk.1", 2.6667))
            .unwrap();
        requirements
    }

    #[test]
    fn truncates_instead_of_rounding() {
        assert_eq!(truncate2(1.239), 1.23);
        assert_eq!(truncate2(0.29), 0.29);
        assert_eq!(truncate2(2.0), 2.0);
    }

    #[test]
    fn summary_totals_buildings_by_name() {
        let summary = summarize(&requirements(), "Motor", 1.0);
        assert_eq!(summary.building_counts.len(), 2);
        assert_eq!(summary.building_counts[0].0, "Assembling Machine Mk.1");
        assert!((summary.building_counts[0].1 - 3.9997).abs() < 1e-9);
        assert_eq!(summary.building_counts[1], ("Smelter".to_string(), 3.0));
        assert_eq!(summary.raw_inputs, vec![("Iron Ore".to_string(), 3.0)]);
    }

    #[test]
    fn summary_display_lists_sections() {
        let text = summarize(&requirements(), "Motor", 1.0).to_string();
        assert!(text.contains("Target: Motor @ 1.00/s"));
        assert!(text.contains("Assembling Machine Mk.1"));
        assert!(text.contains("3.99"));
        assert!(text.contains("  Iron Ore @ 3.00/s"));
    }

    #[test]
    fn table_marks_raw_inputs_and_keeps_order() {
        let table = format_requirements(&requirements());
        let lines: Vec<_> = table.lines().collect();
        assert!(lines[2].starts_with("Iron Ore"));
        assert!(lines[2].contains("(raw input)"));
        assert!(lines[4].starts_with("Gear"));
        assert!(lines[4].contains("1.33"));
    }

    #[test]
    fn table_shows_breakdown_when_present() {
        let mut requirements = Requirements::new();
        requirements
            .merge_entry(
                "Gear",
                RequirementForMaterial {
                    rate: 2.0,
                    building: Some(MaterialAmount::new("Assembling Machine Mk.1", 2.0)),
                    input: Some(vec![MaterialAmount::new("Iron Ingot", 2.0)]),
                },
            )
            .unwrap();
        let table = format_requirements(&requirements);
        assert!(table.contains("<- Iron Ingot"));
    }
}
