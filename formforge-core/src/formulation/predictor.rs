use super::round_to;
use crate::repository::IngredientRepository;
use formforge_schemas::{
    formulation::{FormulationIngredient, ProductType},
    rules::EngineRules,
};

/// Derives aggregate cost, pH and stability from a finished formulation.
pub struct PropertyPredictor<'a> {
    repo: &'a dyn IngredientRepository,
    rules: &'a EngineRules,
}

impl<'a> PropertyPredictor<'a> {
    pub fn new(repo: &'a dyn IngredientRepository, rules: &'a EngineRules) -> Self {
        Self { repo, rules }
    }

    /// Cost per kilogram of product, or `None` when no entry has a known cost.
    pub fn estimate_cost(&self, entries: &[FormulationIngredient]) -> Option<f64> {
        let total: f64 = entries
            .iter()
            .filter_map(|entry| {
                let cost = self.repo.get_ingredient_by_id(&entry.ingredient_id)?.cost_per_kg?;
                Some(entry.concentration / 100.0 * cost)
            })
            .sum();
        if total > 0.0 {
            Some(round_to(total, 2))
        } else {
            None
        }
    }

    /// Concentration-weighted pH over the ingredients with a known pH.
    pub fn predict_ph(&self, entries: &[FormulationIngredient]) -> f64 {
        let (weighted, weight) = entries
            .iter()
            .filter_map(|entry| {
                self.rules
                    .ph
                    .contributors
                    .get(&entry.ingredient_id)
                    .map(|ph| (ph * entry.concentration, entry.concentration))
            })
            .fold((0.0, 0.0), |(sum, total), (ph, w)| (sum + ph, total + w));
        if weight > 0.0 {
            round_to(weighted / weight, 1)
        } else {
            self.rules.ph.default_ph
        }
    }

    /// Stability score on a 0 to 10 scale.
    pub fn predict_stability(&self, entries: &[FormulationIngredient]) -> f64 {
        let model = &self.rules.stability;
        let mut score = model.base_score;

        for (function, bonus) in &model.function_bonuses {
            if entries.iter().any(|e| e.function == *function) {
                score += bonus;
            }
        }

        let has = |id: &str| entries.iter().any(|e| e.ingredient_id == id);
        for pair in &model.unstable_pairs {
            if has(&pair.first) && has(&pair.second) {
                score -= pair.penalty;
            }
        }

        round_to(score, 1).clamp(0.0, 10.0)
    }

    pub fn instructions(&self, product_type: ProductType) -> &'a str {
        self.rules
            .instructions
            .get(&product_type)
            .map(String::as_str)
            .unwrap_or(&self.rules.fallback_instructions)
    }

    /// Months.
    pub fn shelf_life(&self) -> u32 {
        self.rules.default_shelf_life_months
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::JsonStore;
    use formforge_schemas::ingredient::IngredientFunction;

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
    fn cost_sums_known_costs_per_kilogram() {
        let store = JsonStore::in_memory();
        let rules = EngineRules::default();
        let predictor = PropertyPredictor::new(&store, &rules);
        let entries = vec![
            entry("water", 90.0, IngredientFunction::Solvent),
            entry("hyaluronic_acid", 1.0, IngredientFunction::Active),
            entry("unknown", 9.0, IngredientFunction::Solvent),
        ];
        // 0.9 * 0.50 + 0.01 * 350
        assert_eq!(predictor.estimate_cost(&entries), Some(3.95));
        assert_eq!(predictor.estimate_cost(&[entry("unknown", 100.0, IngredientFunction::Solvent)]), None);
    }

    #[test]
    fn ph_is_weighted_by_concentration() {
        let store = JsonStore::in_memory();
        let rules = EngineRules::default();
        let predictor = PropertyPredictor::new(&store, &rules);
        let entries = vec![
            entry("water", 80.0, IngredientFunction::Solvent),
            entry("vitamin_c", 20.0, IngredientFunction::Antioxidant),
            entry("cetyl_alcohol", 5.0, IngredientFunction::Emulsifier),
        ];
        // (7.0 * 80 + 3.5 * 20) / 100
        assert_eq!(predictor.predict_ph(&entries), 6.3);
        assert_eq!(predictor.predict_ph(&[entry("cetyl_alcohol", 100.0, IngredientFunction::Emulsifier)]), 6.5);
    }

    #[test]
    fn stability_rewards_functions_and_penalizes_unstable_pairs() {
        let store = JsonStore::in_memory();
        let rules = EngineRules::default();
        let predictor = PropertyPredictor::new(&store, &rules);

        let mut entries = vec![
            entry("water", 90.0, IngredientFunction::Solvent),
            entry("cetyl_alcohol", 3.0, IngredientFunction::Emulsifier),
            entry("phenoxyethanol", 1.0, IngredientFunction::Preservative),
            entry("vitamin_c", 5.0, IngredientFunction::Antioxidant),
        ];
        let without_retinol = predictor.predict_stability(&entries);
        assert_eq!(without_retinol, 10.0);

        entries.push(entry("retinol", 1.0, IngredientFunction::Antioxidant));
        let with_retinol = predictor.predict_stability(&entries);
        assert!((without_retinol - with_retinol - 2.0).abs() < 1e-9);

        assert_eq!(predictor.predict_stability(&[entry("water", 100.0, IngredientFunction::Solvent)]), 7.0);
    }

    #[test]
    fn stability_is_clamped_to_scale() {
        let store = JsonStore::in_memory();
        let mut rules = EngineRules::default();
        rules.stability.base_score = 12.0;
        let predictor = PropertyPredictor::new(&store, &rules);
        assert_eq!(predictor.predict_stability(&[]), 10.0);

        rules.stability.base_score = -4.0;
        let predictor = PropertyPredictor::new(&store, &rules);
        assert_eq!(predictor.predict_stability(&[]), 0.0);
    }

    #[test]
    fn instructions_fall_back_for_unknown_product_types() {
        let store = JsonStore::in_memory();
        let rules = EngineRules::default();
        let predictor = PropertyPredictor::new(&store, &rules);
        assert!(predictor.instructions(ProductType::Serum).contains("Adjust pH to 5.5-6.5"));
        assert_eq!(predictor.instructions(ProductType::Shampoo), "Standard cosmetic manufacturing process");
    }
}
