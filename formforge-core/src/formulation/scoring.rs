use formforge_schemas::{
    formulation::FormulationRequest,
    ingredient::{Ingredient, IngredientFunction},
    rules::{FunctionPriorities, MatchField, PropertyBoost, ScoringRules},
};
use std::collections::HashSet;

/// Ranks candidate ingredients against a request. Higher is more desirable;
/// a score of zero or below keeps the ingredient out of the formulation.
#[derive(Debug, Clone, Copy)]
pub struct IngredientScorer<'a> {
    priorities: &'a FunctionPriorities,
    rules: &'a ScoringRules,
}

impl<'a> IngredientScorer<'a> {
    pub fn new(priorities: &'a FunctionPriorities, rules: &'a ScoringRules) -> Self {
        Self { priorities, rules }
    }

    pub fn score(
        &self,
        ingredient: &Ingredient,
        request: &FormulationRequest,
        used_functions: &HashSet<IngredientFunction>,
    ) -> f64 {
        let mut score = self.priorities.weight(ingredient.function);

        if !used_functions.contains(&ingredient.function) {
            score *= self.rules.diversity_bonus;
        }

        if request.natural_preference && ingredient.natural_origin {
            score *= self.rules.natural_bonus;
        }

        if let (Some(ceiling), Some(cost)) = (request.max_cost_per_kg, ingredient.cost_per_kg) {
            if cost > ceiling * self.rules.cost_threshold_fraction {
                score *= self.rules.cost_penalty;
            }
        }

        for boost in &self.rules.property_boosts {
            if request.has_target(&boost.property) && boost_matches(boost, ingredient) {
                score *= boost.multiplier;
            }
        }

        score.max(0.0)
    }
}

fn boost_matches(boost: &PropertyBoost, ingredient: &Ingredient) -> bool {
    if boost.function.map_or(false, |f| f != ingredient.function) {
        return false;
    }
    if boost.keywords.is_empty() {
        return true;
    }
    let text = match boost.field {
        MatchField::Name => ingredient.name.to_lowercase(),
        MatchField::Id => ingredient.id.to_lowercase(),
    };
    boost.keywords.iter().any(|k| text.contains(&k.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_schemas::formulation::ProductType;
    use serde_json::json;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
    }

    fn score(ingredient: &Ingredient, request: &FormulationRequest, used: &[IngredientFunction]) -> f64 {
        let priorities = FunctionPriorities::default();
        let rules = ScoringRules::default();
        let used: HashSet<_> = used.iter().copied().collect();
        IngredientScorer::new(&priorities, &rules).score(ingredient, request, &used)
    }

    #[test]
    fn unused_function_gets_the_diversity_bonus() {
        let glycerin = Ingredient::new("glycerin", "Glycerin", "Glycerin", IngredientFunction::Moisturiser, "humectant");
        let request = FormulationRequest::new(ProductType::Cream);
        assert_close(score(&glycerin, &request, &[]), 12.0);
        assert_close(score(&glycerin, &request, &[IngredientFunction::Moisturiser]), 8.0);
    }

    #[test]
    fn unlisted_function_scores_one() {
        let water = Ingredient::new("water", "Purified Water", "Aqua", IngredientFunction::Solvent, "base");
        let request = FormulationRequest::new(ProductType::Cream);
        assert_close(score(&water, &request, &[IngredientFunction::Solvent]), 1.0);
    }

    #[test]
    fn natural_preference_and_cost_ceiling_adjust_the_score() {
        let hyaluronic = Ingredient::new("hyaluronic_acid", "Hyaluronic Acid", "Sodium Hyaluronate", IngredientFunction::Active, "active")
            .with_cost(350.0)
            .natural();
        let mut request = FormulationRequest::new(ProductType::Serum);
        request.natural_preference = true;
        assert_close(score(&hyaluronic, &request, &[IngredientFunction::Active]), 13.0);

        request.max_cost_per_kg = Some(1000.0);
        assert_close(score(&hyaluronic, &request, &[IngredientFunction::Active]), 9.1);

        // 350 is below 10% of a 5000 ceiling.
        request.max_cost_per_kg = Some(5000.0);
        assert_close(score(&hyaluronic, &request, &[IngredientFunction::Active]), 13.0);
    }

    #[test]
    fn anti_aging_boosts_peptide_and_retinol_actives_only() {
        let mut request = FormulationRequest::new(ProductType::Serum);
        request.target_properties.insert("anti_aging".into(), json!(true));

        let peptide = Ingredient::new("matrixyl", "Palmitoyl Peptide Complex", "Palmitoyl Tripeptide-1", IngredientFunction::Active, "active");
        let retinol_antioxidant = Ingredient::new("retinol", "Retinol", "Retinol", IngredientFunction::Antioxidant, "active");
        assert_close(score(&peptide, &request, &[IngredientFunction::Active]), 15.0);
        assert_close(score(&retinol_antioxidant, &request, &[IngredientFunction::Antioxidant]), 6.0);
    }

    #[test]
    fn moisturizing_and_brightening_targets_apply_keyword_boosts() {
        let mut request = FormulationRequest::new(ProductType::Cream);
        request.target_properties.insert("moisturizing".into(), json!(true));
        request.target_properties.insert("brightening".into(), json!(true));

        let glycerin = Ingredient::new("glycerin", "Glycerin", "Glycerin", IngredientFunction::Moisturiser, "humectant");
        let vitamin_c = Ingredient::new("vitamin_c", "Vitamin C", "Ascorbic Acid", IngredientFunction::Antioxidant, "active");
        assert_close(score(&glycerin, &request, &[IngredientFunction::Moisturiser]), 8.0 * 1.4);
        assert_close(score(&vitamin_c, &request, &[IngredientFunction::Antioxidant]), 6.0 * 1.4);
    }

    #[test]
    fn negative_priorities_clamp_to_zero() {
        let mut priorities = FunctionPriorities::default();
        priorities.weights.insert(IngredientFunction::Colorant, -3.0);
        let rules = ScoringRules::default();
        let colorant = Ingredient::new("ci_77491", "Iron Oxide", "CI 77491", IngredientFunction::Colorant, "colorant");
        let request = FormulationRequest::new(ProductType::Mask);
        let score = IngredientScorer::new(&priorities, &rules).score(&colorant, &request, &HashSet::new());
        assert_eq!(score, 0.0);
    }
}
