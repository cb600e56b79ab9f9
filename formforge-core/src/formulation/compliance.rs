use crate::repository::IngredientRepository;
use formforge_schemas::{
    compliance::{ComplianceCheck, ComplianceIssue, ComplianceStatus, IssueKind, Severity},
    formulation::FormulationPayload,
};
use tracing::debug;

/// Advisory UKES/EU check of a formulation against ingredient flags and limits.
pub struct ComplianceChecker<'a> {
    repo: &'a dyn IngredientRepository,
}

impl<'a> ComplianceChecker<'a> {
    pub fn new(repo: &'a dyn IngredientRepository) -> Self {
        Self { repo }
    }

    pub fn check(&self, payload: &FormulationPayload) -> ComplianceCheck {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        let mut prohibited = Vec::new();
        let mut violations = Vec::new();

        for item in &payload.ingredients {
            let Some(ingredient) = self.repo.get_ingredient_by_id(&item.ingredient_id) else {
                debug!(id = %item.ingredient_id, "unknown ingredient skipped by compliance check");
                continue;
            };

            if ingredient.prohibited_in_eu {
                prohibited.push(ingredient.name.clone());
                issues.push(ComplianceIssue {
                    ingredient_id: item.ingredient_id.clone(),
                    ingredient_name: ingredient.name.clone(),
                    issue_type: IssueKind::Prohibited,
                    severity: Severity::Critical,
                    description: format!("{} is prohibited in EU cosmetics", ingredient.name),
                    recommendation: Some("Remove this ingredient".to_string()),
                });
            }

            if let Some(max) = ingredient.max_concentration {
                if item.concentration > max {
                    let (conc, max) = (fmt_percent(item.concentration), fmt_percent(max));
                    violations.push(format!("{}: {}% (max: {}%)", ingredient.name, conc, max));
                    issues.push(ComplianceIssue {
                        ingredient_id: item.ingredient_id.clone(),
                        ingredient_name: ingredient.name.clone(),
                        issue_type: IssueKind::ConcentrationLimit,
                        severity: Severity::High,
                        description: format!("Concentration {}% exceeds limit of {}%", conc, max),
                        recommendation: Some(format!("Reduce concentration to max {}%", max)),
                    });
                }
            }

            if ingredient.restricted_in_eu && !ingredient.prohibited_in_eu {
                warnings.push(format!("{} is restricted - verify compliance", ingredient.name));
            }
        }

        let overall_status = if issues.iter().any(|i| i.severity == Severity::Critical) {
            ComplianceStatus::NonCompliant
        } else if !issues.is_empty() {
            ComplianceStatus::RequiresReview
        } else {
            ComplianceStatus::Compliant
        };
        let compliant = overall_status == ComplianceStatus::Compliant;

        ComplianceCheck {
            overall_status,
            ukes_compliant: compliant,
            cpnp_ready: compliant,
            issues,
            warnings,
            prohibited_ingredients: prohibited,
            concentration_violations: violations,
            labeling_requirements: self.repo.get_regulatory_data().labeling_requirements,
        }
    }
}

/// Whole percentages keep one decimal (`2.0`), others print as-is (`0.35`).
fn fmt_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
