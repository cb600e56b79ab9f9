//! Loading and sanity checks for the engine's rule tables.

use crate::error::{FormforgeError, Result};
use formforge_schemas::rules::EngineRules;
use std::{fs, path::Path};
use tracing::info;

/// Reads rule tables from a YAML file. Sections missing from the file keep
/// their built-in defaults.
pub fn load_rules<P: AsRef<Path>>(path: P) -> Result<EngineRules> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| FormforgeError::FileIO(shown.clone(), e))?;
    let rules: EngineRules =
        serde_yaml::from_str(&content).map_err(|e| FormforgeError::YamlParsing(shown.clone(), e))?;
    validate_rules(&rules)?;
    info!(path = %shown, "loaded engine rules");
    Ok(rules)
}

/// Rejects tables that would let the engine produce out-of-range doses.
pub fn validate_rules(rules: &EngineRules) -> Result<()> {
    let policy = &rules.concentration;
    if !(policy.default_min >= 0.0 && policy.default_min <= policy.default_max && policy.default_max <= 100.0) {
        return Err(FormforgeError::ConfigError(format!(
            "default concentration bounds must satisfy 0 <= min <= max <= 100, got [{}, {}]",
            policy.default_min, policy.default_max
        )));
    }
    for (name, fraction) in [
        ("reserve_fraction", policy.reserve_fraction),
        ("active_performance_fraction", policy.active_performance_fraction),
        ("active_standard_fraction", policy.active_standard_fraction),
    ] {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(FormforgeError::ConfigError(format!("{} must be within [0, 1], got {}", name, fraction)));
        }
    }
    if !(rules.build.fill_target > 0.0 && rules.build.fill_target <= 100.0) {
        return Err(FormforgeError::ConfigError(format!(
            "fill_target must be within (0, 100], got {}",
            rules.build.fill_target
        )));
    }
    for (product_type, product_rules) in &rules.product_rules {
        let ranges = [
            product_rules.water_range,
            product_rules.oil_range,
            product_rules.emulsifier_range,
            product_rules.preservative_range,
            product_rules.active_range,
        ];
        if ranges.iter().flatten().any(|r| r.min > r.max) {
            return Err(FormforgeError::ConfigError(format!(
                "product rules for '{}' contain a range with min > max",
                product_type
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_rules_are_valid() {
        assert!(validate_rules(&EngineRules::default()).is_ok());
    }

    #[test]
    fn yaml_override_merges_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "concentration:\n  preservative_dose: 0.8\nfallback_instructions: Mix well"
        )
        .unwrap();

        let rules = load_rules(file.path()).unwrap();
        assert_eq!(rules.concentration.preservative_dose, 0.8);
        assert_eq!(rules.concentration.default_max, 5.0);
        assert_eq!(rules.fallback_instructions, "Mix well");
        assert_eq!(rules.default_shelf_life_months, 24);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut rules = EngineRules::default();
        rules.concentration.default_min = 6.0;
        assert!(matches!(validate_rules(&rules), Err(FormforgeError::ConfigError(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_rules("/definitely/not/here/rules.yaml").unwrap_err();
        assert!(matches!(err, FormforgeError::FileIO(_, _)));
    }
}
