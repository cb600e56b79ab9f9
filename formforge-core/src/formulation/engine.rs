use super::{
    design::review_composition, round_to, total_percentage, ComplianceChecker, FormulationBuilder, Optimizer,
    PropertyPredictor,
};
use crate::{
    error::{FormforgeError, Result},
    repository::IngredientRepository,
};
use chrono::Utc;
use formforge_schemas::{
    compliance::{ComplianceCheck, ComplianceStatus},
    formulation::{FormulationIngredient, FormulationPayload, FormulationRequest, FormulationResponse, OptimizationRequest, ProductType},
    rules::EngineRules,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Entry point for generating, checking and optimizing formulations.
///
/// Holds read-only rule tables and a borrowed repository, so one engine can
/// serve concurrent callers.
pub struct FormulationEngine<'r> {
    repo: &'r dyn IngredientRepository,
    rules: EngineRules,
}

impl<'r> FormulationEngine<'r> {
    pub fn new(repo: &'r dyn IngredientRepository, rules: EngineRules) -> Self {
        Self { repo, rules }
    }

    pub fn with_default_rules(repo: &'r dyn IngredientRepository) -> Self {
        Self::new(repo, EngineRules::default())
    }

    pub fn rules(&self) -> &EngineRules {
        &self.rules
    }

    /// Builds a formulation for the request.
    ///
    /// A build that leaves no ingredient with a positive concentration is not
    /// an error: it yields an empty response marked `requires_review`.
    pub fn generate_formulation(&self, request: &FormulationRequest) -> Result<FormulationResponse> {
        request.validate().map_err(FormforgeError::InvalidRequest)?;

        let entries = match FormulationBuilder::new(self.repo, &self.rules, request).build() {
            Ok(entries) => entries,
            Err(FormforgeError::DegenerateFormulation) => {
                warn!(product_type = %request.product_type, "no ingredient could be dosed");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        Ok(self.finish_response(request.product_type, entries))
    }

    pub fn check_compliance(&self, payload: &FormulationPayload) -> ComplianceCheck {
        ComplianceChecker::new(self.repo).check(payload)
    }

    /// Improves an existing formulation against the requested objective.
    /// The product type defaults to cream when the request leaves it out.
    pub fn optimize_formulation(&self, request: &OptimizationRequest) -> Result<FormulationResponse> {
        let outcome = Optimizer::new(self.repo, &self.rules).optimize(request)?;
        let product_type = request.product_type.unwrap_or(ProductType::Cream);
        Ok(self.finish_response(product_type, outcome.entries))
    }

    fn finish_response(&self, product_type: ProductType, entries: Vec<FormulationIngredient>) -> FormulationResponse {
        let id = Uuid::new_v4().to_string();
        let total = round_to(total_percentage(&entries), 2);

        if entries.is_empty() {
            return FormulationResponse {
                id,
                product_type,
                ingredients: entries,
                total_percentage: total,
                estimated_cost_per_kg: None,
                predicted_ph: None,
                stability_score: None,
                compliance_status: ComplianceStatus::RequiresReview,
                instructions: None,
                shelf_life_estimate: None,
                created_at: Utc::now(),
                design_warnings: vec![format!("no ingredients could be dosed for {}", product_type)],
            };
        }

        let predictor = PropertyPredictor::new(self.repo, &self.rules);
        let compliance = self.check_compliance(&FormulationPayload::from(entries.as_slice()));
        let design_warnings = review_composition(product_type, &entries, &self.rules, self.repo);

        let response = FormulationResponse {
            id,
            product_type,
            total_percentage: total,
            estimated_cost_per_kg: predictor.estimate_cost(&entries),
            predicted_ph: Some(predictor.predict_ph(&entries)),
            stability_score: Some(predictor.predict_stability(&entries)),
            compliance_status: compliance.overall_status,
            instructions: Some(predictor.instructions(product_type).to_string()),
            shelf_life_estimate: Some(predictor.shelf_life()),
            created_at: Utc::now(),
            design_warnings,
            ingredients: entries,
        };
        info!(
            id = %response.id,
            product_type = %product_type,
            ingredients = response.ingredients.len(),
            total = response.total_percentage,
            status = %response.compliance_status,
            "formulation ready"
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::JsonStore;
    use formforge_schemas::formulation::{OptimizationConstraints, OptimizationTarget};

    #[test]
    fn invalid_requests_are_rejected_before_building() {
        let store = JsonStore::in_memory();
        let engine = FormulationEngine::with_default_rules(&store);
        let mut request = FormulationRequest::new(ProductType::Serum);
        request.target_ph = Some(15.0);
        assert!(matches!(
            engine.generate_formulation(&request),
            Err(FormforgeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn repeated_required_ingredient_is_dosed_once() {
        let store = JsonStore::in_memory();
        let engine = FormulationEngine::with_default_rules(&store);
        let mut request = FormulationRequest::new(ProductType::Serum);
        request.required_ingredients = vec!["hyaluronic_acid".into(), "hyaluronic_acid".into()];

        let response = engine.generate_formulation(&request).unwrap();
        let count = response
            .ingredients
            .iter()
            .filter(|i| i.ingredient_id == "hyaluronic_acid")
            .count();
        assert_eq!(count, 1);
        assert!((total_percentage(&response.ingredients) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn exclusion_does_not_override_a_required_ingredient() {
        let store = JsonStore::in_memory();
        let engine = FormulationEngine::with_default_rules(&store);
        let mut request = FormulationRequest::new(ProductType::Serum);
        request.required_ingredients = vec!["vitamin_c".into()];
        request.excluded_ingredients = vec!["vitamin_c".into()];

        let response = engine.generate_formulation(&request).unwrap();
        assert!(response.ingredient("vitamin_c").is_some());
    }

    #[test]
    fn default_cream_is_complete_and_sums_to_one_hundred() {
        let store = JsonStore::in_memory();
        let engine = FormulationEngine::with_default_rules(&store);
        let response = engine.generate_formulation(&FormulationRequest::new(ProductType::Cream)).unwrap();

        assert!((total_percentage(&response.ingredients) - 100.0).abs() < 1e-6);
        assert_eq!(response.total_percentage, 100.0);
        assert_eq!(response.ingredients[0].ingredient_id, "water");
        assert!(response.ingredient("hyaluronic_acid").is_some());
        assert_eq!(response.shelf_life_estimate, Some(24));
        assert!(response.instructions.as_deref().unwrap().starts_with("1. Heat water phase"));
        assert!(response.estimated_cost_per_kg.is_some());
        assert!(Uuid::parse_str(&response.id).is_ok());
        // The default data has no oil-phase ingredient.
        assert!(response
            .design_warnings
            .contains(&"oil content 0% is outside the 10-30% range for cream".to_string()));
    }

    #[test]
    fn degenerate_build_is_reported_for_review() {
        let store = JsonStore::in_memory();
        let engine = FormulationEngine::with_default_rules(&store);
        let mut request = FormulationRequest::new(ProductType::Toner);
        request.excluded_ingredients = store
            .get_ingredients(&crate::repository::IngredientFilter::all())
            .into_iter()
            .map(|i| i.id)
            .collect();

        let response = engine.generate_formulation(&request).unwrap();
        assert!(response.ingredients.is_empty());
        assert_eq!(response.total_percentage, 0.0);
        assert!(response.total_percentage.is_sign_positive());
        assert_eq!(response.compliance_status, ComplianceStatus::RequiresReview);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total_percentage"].to_string(), "0.0");
    }

    #[test]
    fn optimize_defaults_to_cream() {
        let store = JsonStore::in_memory();
        let engine = FormulationEngine::with_default_rules(&store);
        let generated = engine.generate_formulation(&FormulationRequest::new(ProductType::Serum)).unwrap();

        let request = OptimizationRequest {
            formulation_id: None,
            current_formulation: Some(generated.ingredients.clone()),
            product_type: None,
            optimization_target: OptimizationTarget::Cost,
            constraints: OptimizationConstraints::default(),
            max_changes: 2,
        };
        let optimized = engine.optimize_formulation(&request).unwrap();
        assert_eq!(optimized.product_type, ProductType::Cream);
        assert!(optimized.estimated_cost_per_kg <= generated.estimated_cost_per_kg);
        assert!((total_percentage(&optimized.ingredients) - 100.0).abs() < 1e-6);
        assert_ne!(optimized.id, generated.id);
    }

    #[test]
    fn engine_can_be_shared_across_threads() {
        let store = JsonStore::in_memory();
        let engine = FormulationEngine::with_default_rules(&store);
        let request = FormulationRequest::new(ProductType::Serum);

        let totals: Vec<f64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| engine.generate_formulation(&request).map(|r| r.total_percentage)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
        });
        assert!(totals.iter().all(|t| *t == 100.0));
    }
}
