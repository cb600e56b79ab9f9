//! The formulation engine: dosing, scoring, assembly, prediction and
//! compliance checking.

pub mod builder;
pub mod compliance;
pub mod concentration;
pub mod design;
pub mod engine;
pub mod optimizer;
pub mod predictor;
pub mod scoring;

pub use builder::FormulationBuilder;
pub use compliance::ComplianceChecker;
pub use concentration::ConcentrationCalculator;
pub use engine::FormulationEngine;
pub use optimizer::Optimizer;
pub use predictor::PropertyPredictor;
pub use scoring::IngredientScorer;

use formforge_schemas::{formulation::FormulationIngredient, ingredient::Ingredient};

/// Tolerance used when comparing a formulation's total against 100%.
pub const TOTAL_TOLERANCE: f64 = 1e-6;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    // Adding zero turns -0.0 into 0.0.
    (value * factor).round() / factor + 0.0
}

pub fn total_percentage(entries: &[FormulationIngredient]) -> f64 {
    entries.iter().map(|e| e.concentration).fold(0.0, |acc, c| acc + c)
}

pub(crate) fn entry_for(ingredient: &Ingredient, concentration: f64) -> FormulationIngredient {
    FormulationIngredient {
        ingredient_id: ingredient.id.clone(),
        name: ingredient.name.clone(),
        inci_name: ingredient.inci_name.clone(),
        concentration,
        function: ingredient.function,
    }
}
