//! Deterministic local search over an existing formulation.
//!
//! Each round enumerates every swap and rescale move, settles each candidate
//! (normalize + validate) and applies the best one that strictly improves the
//! objective. The search stops after `max_changes` accepted moves or when no
//! move helps.

use super::{builder::settle, entry_for, PropertyPredictor};
use crate::{
    error::{FormforgeError, Result},
    repository::{IngredientFilter, IngredientRepository},
};
use formforge_schemas::{
    formulation::{FormulationIngredient, OptimizationRequest, OptimizationTarget},
    ingredient::Ingredient,
    rules::EngineRules,
};
use std::cmp::Ordering;
use tracing::{debug, info};

pub const MAX_CHANGES_LIMIT: u32 = 10;

/// Share of an entry's concentration moved by one rescale step.
const RESCALE_STEP: f64 = 0.1;
const IMPROVEMENT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationOutcome {
    pub entries: Vec<FormulationIngredient>,
    /// Human-readable description of each accepted move, in order.
    pub applied: Vec<String>,
    pub objective: f64,
}

struct Candidate {
    entries: Vec<FormulationIngredient>,
    description: String,
}

pub struct Optimizer<'a> {
    repo: &'a dyn IngredientRepository,
    rules: &'a EngineRules,
}

impl<'a> Optimizer<'a> {
    pub fn new(repo: &'a dyn IngredientRepository, rules: &'a EngineRules) -> Self {
        Self { repo, rules }
    }

    /// # Errors
    ///
    /// `InvalidRequest` when `max_changes` is outside [1, 10], the request
    /// carries no formulation to start from or a concentration lies outside
    /// [0, 100]; `DegenerateFormulation` when the
    /// starting formulation has no positive concentration.
    pub fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationOutcome> {
        if !(1..=MAX_CHANGES_LIMIT).contains(&request.max_changes) {
            return Err(FormforgeError::InvalidRequest(format!(
                "max_changes must be within [1, {}], got {}",
                MAX_CHANGES_LIMIT, request.max_changes
            )));
        }
        let start = match (&request.current_formulation, &request.formulation_id) {
            (Some(entries), _) if !entries.is_empty() => entries.clone(),
            (_, Some(id)) => {
                return Err(FormforgeError::InvalidRequest(format!(
                    "formulation '{}' is not stored; send current_formulation instead",
                    id
                )))
            }
            _ => {
                return Err(FormforgeError::InvalidRequest(
                    "current_formulation is required".to_string(),
                ))
            }
        };

        if let Some(entry) = start.iter().find(|e| !(0.0..=100.0).contains(&e.concentration)) {
            return Err(FormforgeError::InvalidRequest(format!(
                "concentration of '{}' must be within [0, 100], got {}",
                entry.ingredient_id, entry.concentration
            )));
        }

        let mut entries = settle(start, self.repo, self.rules)?;
        let mut score = self.feasible_score(request, &entries).unwrap_or(f64::NEG_INFINITY);
        let mut applied = Vec::new();

        while applied.len() < request.max_changes as usize {
            let best = self
                .candidates(request, &entries)
                .into_iter()
                .filter_map(|candidate| {
                    let settled = settle(candidate.entries, self.repo, self.rules).ok()?;
                    let candidate_score = self.feasible_score(request, &settled)?;
                    Some((settled, candidate.description, candidate_score))
                })
                .fold(None::<(Vec<FormulationIngredient>, String, f64)>, |best, next| {
                    // Strict comparison keeps the earliest of equally good moves.
                    let better = best.as_ref().map_or(true, |b| next.2 > b.2);
                    if better {
                        Some(next)
                    } else {
                        best
                    }
                });

            match best {
                Some((next_entries, description, next_score)) if next_score > score + IMPROVEMENT_EPSILON => {
                    debug!(step = %description, score = next_score, "accepted optimization move");
                    entries = next_entries;
                    score = next_score;
                    applied.push(description);
                }
                _ => break,
            }
        }

        info!(
            goal = ?request.optimization_target,
            changes = applied.len(),
            objective = score,
            "optimization finished"
        );
        Ok(OptimizationOutcome {
            entries,
            applied,
            objective: score,
        })
    }

    /// Objective value for a target; higher is better.
    pub fn objective(&self, target: OptimizationTarget, entries: &[FormulationIngredient]) -> f64 {
        let predictor = PropertyPredictor::new(self.repo, self.rules);
        match target {
            OptimizationTarget::Cost => -predictor.estimate_cost(entries).unwrap_or(0.0),
            OptimizationTarget::Stability => predictor.predict_stability(entries),
            OptimizationTarget::Performance => entries
                .iter()
                .map(|e| self.rules.function_priorities.weight(e.function) * e.concentration / 100.0)
                .sum(),
            OptimizationTarget::Naturalness => {
                let total: f64 = entries.iter().map(|e| e.concentration).sum();
                if total <= 0.0 {
                    return 0.0;
                }
                let natural: f64 = entries
                    .iter()
                    .filter(|e| {
                        self.repo
                            .get_ingredient_by_id(&e.ingredient_id)
                            .map_or(false, |i| i.natural_origin)
                    })
                    .map(|e| e.concentration)
                    .sum();
                natural / total
            }
        }
    }

    /// Objective value, or `None` when the cost ceiling is exceeded.
    fn feasible_score(&self, request: &OptimizationRequest, entries: &[FormulationIngredient]) -> Option<f64> {
        if let Some(ceiling) = request.constraints.max_cost_per_kg {
            let cost = PropertyPredictor::new(self.repo, self.rules).estimate_cost(entries);
            if cost.map_or(false, |c| c > ceiling) {
                return None;
            }
        }
        Some(self.objective(request.optimization_target, entries))
    }

    fn candidates(&self, request: &OptimizationRequest, entries: &[FormulationIngredient]) -> Vec<Candidate> {
        let pool = self.repo.get_ingredients(&IngredientFilter::all());
        let largest = entries
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.concentration.partial_cmp(&b.concentration).unwrap_or(Ordering::Equal))
            .map(|(index, _)| index);

        let mut candidates = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            for replacement in pool.iter().filter(|i| {
                i.function == entry.function
                    && !entries.iter().any(|e| e.ingredient_id == i.id)
                    && !request.constraints.excluded_ingredients.contains(&i.id)
            }) {
                let mut next = entries.to_vec();
                next[index] = entry_for(replacement, entry.concentration);
                candidates.push(Candidate {
                    entries: next,
                    description: format!("swap {} for {}", entry.ingredient_id, replacement.id),
                });
            }

            let Some(largest) = largest.filter(|l| *l != index) else {
                continue;
            };
            let delta = entry.concentration * RESCALE_STEP;
            if delta <= 0.0 {
                continue;
            }
            for direction in [1.0, -1.0] {
                let mut next = entries.to_vec();
                next[index].concentration += direction * delta;
                next[largest].concentration -= direction * delta;
                if self.within_bounds(&next[index]) && self.within_bounds(&next[largest]) {
                    let verb = if direction > 0.0 { "raise" } else { "lower" };
                    candidates.push(Candidate {
                        entries: next,
                        description: format!("{} {} against {}", verb, entry.ingredient_id, entries[largest].ingredient_id),
                    });
                }
            }
        }
        candidates
    }

    fn within_bounds(&self, entry: &FormulationIngredient) -> bool {
        let Some(ingredient) = self.repo.get_ingredient_by_id(&entry.ingredient_id) else {
            return false;
        };
        let (min, max) = bounds(&ingredient);
        entry.concentration >= min && entry.concentration <= max
    }
}

fn bounds(ingredient: &Ingredient) -> (f64, f64) {
    (
        ingredient.min_concentration.unwrap_or(0.0),
        ingredient.max_concentration.unwrap_or(100.0),
    )
}
