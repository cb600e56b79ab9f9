//! Post-build comparison against the compositional envelope of a product type.

use crate::repository::IngredientRepository;
use formforge_schemas::{
    formulation::{FormulationIngredient, ProductType},
    ingredient::IngredientFunction,
    rules::{EngineRules, PercentRange},
};

const OIL_CATEGORIES: [&str; 3] = ["oil", "emollient", "butter"];

/// Returns one message per range or required function the formulation misses.
/// Product types without rules produce no findings.
pub fn review_composition(
    product_type: ProductType,
    entries: &[FormulationIngredient],
    rules: &EngineRules,
    repo: &dyn IngredientRepository,
) -> Vec<String> {
    let Some(product_rules) = rules.product_rules.get(&product_type) else {
        return Vec::new();
    };

    let share_of = |function: IngredientFunction| -> f64 {
        entries
            .iter()
            .filter(|e| e.function == function)
            .map(|e| e.concentration)
            .fold(0.0, |acc, c| acc + c)
    };
    let oil: f64 = entries
        .iter()
        .filter(|e| {
            repo.get_ingredient_by_id(&e.ingredient_id)
                .map_or(false, |i| OIL_CATEGORIES.contains(&i.category.to_lowercase().as_str()))
        })
        .map(|e| e.concentration)
        .fold(0.0, |acc, c| acc + c);

    let checks = [
        ("water", product_rules.water_range, share_of(IngredientFunction::Solvent)),
        ("oil", product_rules.oil_range, oil),
        ("emulsifier", product_rules.emulsifier_range, share_of(IngredientFunction::Emulsifier)),
        ("preservative", product_rules.preservative_range, share_of(IngredientFunction::Preservative)),
        ("active", product_rules.active_range, share_of(IngredientFunction::Active)),
    ];

    let mut findings: Vec<String> = checks
        .into_iter()
        .filter_map(|(label, range, value)| out_of_range(product_type, label, range?, value))
        .collect();

    for function in &product_rules.required_functions {
        if !entries.iter().any(|e| e.function == *function) {
            findings.push(format!("{} requires at least one {} ingredient", product_type, function));
        }
    }
    findings
}

fn out_of_range(product_type: ProductType, label: &str, range: PercentRange, value: f64) -> Option<String> {
    // Rounded shares avoid flagging 2-decimal normalization noise.
    let value = super::round_to(value, 2);
    if range.contains(value) {
        return None;
    }
    Some(format!(
        "{} content {}% is outside the {}-{}% range for {}",
        label, value, range.min, range.max, product_type
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::JsonStore;

    fn entry(id: &str, concentration: f64, function: IngredientFunction) -> FormulationIngredient {
        FormulationIngredient {
            ingredient_id: id.to_string(),
            name: id.to_string(),
            inci_name: id.to_string(),
            concentration,
            function,
        }
    }

    #[test]
    fn serum_within_envelope_has_no_findings() {
        let store = JsonStore::in_memory();
        let rules = EngineRules::default();
        let entries = vec![
            entry("water", 88.0, IngredientFunction::Solvent),
            entry("glycerin", 9.5, IngredientFunction::Moisturiser),
            entry("phenoxyethanol", 0.5, IngredientFunction::Preservative),
            entry("hyaluronic_acid", 2.0, IngredientFunction::Active),
        ];
        assert!(review_composition(ProductType::Serum, &entries, &rules, &store).is_empty());
    }

    #[test]
    fn cream_without_oil_or_emulsifier_is_flagged() {
        let store = JsonStore::in_memory();
        let rules = EngineRules::default();
        let entries = vec![
            entry("water", 95.0, IngredientFunction::Solvent),
            entry("glycerin", 4.5, IngredientFunction::Moisturiser),
            entry("phenoxyethanol", 0.5, IngredientFunction::Preservative),
        ];
        let findings = review_composition(ProductType::Cream, &entries, &rules, &store);

        assert!(findings.contains(&"water content 95% is outside the 40-80% range for cream".to_string()));
        assert!(findings.contains(&"oil content 0% is outside the 10-30% range for cream".to_string()));
        assert!(findings.iter().any(|f| f.starts_with("emulsifier content 0%")));
        assert!(findings.contains(&"cream requires at least one emulsifier ingredient".to_string()));
        assert!(!findings.iter().any(|f| f.starts_with("preservative")));
    }

    #[test]
    fn product_types_without_rules_are_not_reviewed() {
        let store = JsonStore::in_memory();
        let rules = EngineRules::default();
        let entries = vec![entry("water", 100.0, IngredientFunction::Solvent)];
        assert!(review_composition(ProductType::Toner, &entries, &rules, &store).is_empty());
    }
}
