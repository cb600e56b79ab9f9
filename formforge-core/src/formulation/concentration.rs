use formforge_schemas::{
    formulation::FormulationRequest,
    ingredient::{Ingredient, IngredientFunction},
    rules::ConcentrationPolicy,
};

/// Derives a single ingredient's dose from its bounds, its function and the
/// budget still unallocated in the formulation.
#[derive(Debug, Clone, Copy)]
pub struct ConcentrationCalculator<'a> {
    policy: &'a ConcentrationPolicy,
}

impl<'a> ConcentrationCalculator<'a> {
    pub fn new(policy: &'a ConcentrationPolicy) -> Self {
        Self { policy }
    }

    /// Effective `(min, max)` bounds, with policy defaults for unset values.
    pub fn bounds(&self, ingredient: &Ingredient) -> (f64, f64) {
        (
            ingredient.min_concentration.unwrap_or(self.policy.default_min),
            ingredient.max_concentration.unwrap_or(self.policy.default_max),
        )
    }

    /// The dose for `ingredient` when `current_total` percent is already used.
    ///
    /// Never negative and never above `min(max, reserve_fraction * remaining)`.
    pub fn optimal_concentration(
        &self,
        ingredient: &Ingredient,
        request: &FormulationRequest,
        current_total: f64,
    ) -> f64 {
        let (min, max) = self.bounds(ingredient);
        let remaining = 100.0 - current_total;
        let capped = max.min(remaining * self.policy.reserve_fraction);
        if capped <= 0.0 {
            return 0.0;
        }

        let dose = match ingredient.function {
            IngredientFunction::Active => {
                if request.target_is_truthy("performance_priority") {
                    capped * self.policy.active_performance_fraction
                } else {
                    capped * self.policy.active_standard_fraction
                }
            }
            IngredientFunction::Preservative => self.policy.preservative_dose.max(min).min(capped),
            IngredientFunction::Emulsifier => {
                let ceiling = self
                    .policy
                    .emulsifier_ceilings
                    .get(&request.product_type)
                    .copied()
                    .unwrap_or(self.policy.default_emulsifier_ceiling);
                ceiling.min(capped)
            }
            _ => ((min + capped) / 2.0).min(capped),
        };
        dose.max(0.0)
    }
}
