use super::{entry_for, round_to, total_percentage, ConcentrationCalculator, IngredientScorer, TOTAL_TOLERANCE};
use crate::{
    error::{FormforgeError, Result},
    repository::{IngredientFilter, IngredientRepository},
};
use formforge_schemas::{
    formulation::{FormulationIngredient, FormulationRequest},
    ingredient::{Ingredient, IngredientFunction},
    rules::{CompatibilityEntry, EngineRules},
};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashSet},
};
use tracing::{debug, warn};

/// Assembles a formulation for one request in five ordered stages:
/// template seeding, required ingredients, complementary ingredients,
/// normalization and validation. Stages never backtrack.
///
/// Ingredient ids missing from the repository are skipped at every stage.
pub struct FormulationBuilder<'a> {
    repo: &'a dyn IngredientRepository,
    rules: &'a EngineRules,
    request: &'a FormulationRequest,
    entries: Vec<FormulationIngredient>,
    total: f64,
}

impl<'a> FormulationBuilder<'a> {
    pub fn new(repo: &'a dyn IngredientRepository, rules: &'a EngineRules, request: &'a FormulationRequest) -> Self {
        Self {
            repo,
            rules,
            request,
            entries: Vec::new(),
            total: 0.0,
        }
    }

    /// Runs every stage and returns the settled ingredient list.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateFormulation` when no ingredient ends up with a
    /// positive concentration.
    pub fn build(mut self) -> Result<Vec<FormulationIngredient>> {
        self.seed_from_template();
        self.insert_required();
        self.fill_complementary();
        self.finish()
    }

    pub fn entries(&self) -> &[FormulationIngredient] {
        &self.entries
    }

    /// Running total before normalization.
    pub fn running_total(&self) -> f64 {
        self.total
    }

    fn calculator(&self) -> ConcentrationCalculator<'a> {
        ConcentrationCalculator::new(&self.rules.concentration)
    }

    fn contains(&self, ingredient_id: &str) -> bool {
        self.entries.iter().any(|e| e.ingredient_id == ingredient_id)
    }

    /// Stage 1: copy the first matching template's base ingredients verbatim.
    pub fn seed_from_template(&mut self) {
        let templates = self.repo.get_templates(Some(self.request.product_type));
        let Some(template) = templates.first() else {
            debug!(product_type = %self.request.product_type, "no template, starting empty");
            return;
        };
        debug!(template = %template.id, "seeding from template");

        for base in &template.base_ingredients {
            match self.repo.get_ingredient_by_id(&base.ingredient_id) {
                Some(ingredient) => {
                    self.entries.push(entry_for(&ingredient, base.concentration));
                    self.total += base.concentration;
                }
                None => debug!(id = %base.ingredient_id, "template ingredient not found, skipping"),
            }
        }
    }

    /// Stage 2: dose each required ingredient that is not already present.
    pub fn insert_required(&mut self) {
        let calculator = self.calculator();
        for id in &self.request.required_ingredients {
            if self.contains(id) {
                continue;
            }
            let Some(ingredient) = self.repo.get_ingredient_by_id(id) else {
                debug!(id = %id, "required ingredient not found, skipping");
                continue;
            };
            let concentration = calculator.optimal_concentration(&ingredient, self.request, self.total);
            if concentration > 0.0 {
                self.entries.push(entry_for(&ingredient, concentration));
                self.total += concentration;
            }
        }
    }

    /// Stage 3: greedily add the best-scoring unused ingredients until the
    /// fill target is reached or candidates run out.
    pub fn fill_complementary(&mut self) {
        let fill_target = self.rules.build.fill_target;
        if self.total >= fill_target {
            return;
        }

        let used_ids: HashSet<&str> = self.entries.iter().map(|e| e.ingredient_id.as_str()).collect();
        let mut used_functions: HashSet<IngredientFunction> = self.entries.iter().map(|e| e.function).collect();
        let scorer = IngredientScorer::new(&self.rules.function_priorities, &self.rules.scoring);

        let mut scored: Vec<(Ingredient, f64)> = self
            .repo
            .get_ingredients(&IngredientFilter::all())
            .into_iter()
            .filter(|i| !used_ids.contains(i.id.as_str()) && !self.request.is_excluded(&i.id))
            .map(|i| {
                let score = scorer.score(&i, self.request, &used_functions);
                (i, score)
            })
            .filter(|(_, score)| *score > 0.0)
            .collect();
        // Stable sort: ties keep repository order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let calculator = self.calculator();
        let mut remaining = fill_target - self.total;
        let mut added = Vec::new();
        for (ingredient, score) in scored {
            if remaining <= self.rules.build.min_remaining {
                break;
            }
            let concentration = calculator.optimal_concentration(&ingredient, self.request, 100.0 - remaining);
            if concentration > 0.0 && concentration <= remaining {
                debug!(id = %ingredient.id, score, concentration, "adding complementary ingredient");
                added.push(entry_for(&ingredient, concentration));
                remaining -= concentration;
                used_functions.insert(ingredient.function);
            }
        }

        self.entries.extend(added);
        self.total = total_percentage(&self.entries);
    }

    /// Stages 4 and 5: normalize to 100%, then validate, repeating while
    /// clamping or dropped entries leave the total off 100%.
    pub fn finish(self) -> Result<Vec<FormulationIngredient>> {
        settle(self.entries, self.repo, self.rules)
    }
}

/// Normalizes and validates a list. While clamping or dropped entries leave
/// the total off 100%, the residual is spread over the entries that are not
/// pinned at a bound, for at most the configured number of rounds.
pub fn settle(
    entries: Vec<FormulationIngredient>,
    repo: &dyn IngredientRepository,
    rules: &EngineRules,
) -> Result<Vec<FormulationIngredient>> {
    let mut entries = validate(normalize(entries)?, repo, &rules.compatibility);
    for _ in 0..rules.build.max_rebalance_rounds {
        if (total_percentage(&entries) - 100.0).abs() <= TOTAL_TOLERANCE {
            return Ok(entries);
        }
        entries = validate(rebalance(entries, repo)?, repo, &rules.compatibility);
    }
    let total = total_percentage(&entries);
    if (total - 100.0).abs() > TOTAL_TOLERANCE {
        warn!(total, "concentration bounds keep the formulation off 100%");
    }
    Ok(entries)
}

/// Rescales the entries that still have room in the direction of the
/// residual, keeping entries pinned at their bound fixed. Values are rounded
/// to two decimals and what rounding leaves over goes to the largest entry
/// that can take it.
fn rebalance(
    mut entries: Vec<FormulationIngredient>,
    repo: &dyn IngredientRepository,
) -> Result<Vec<FormulationIngredient>> {
    let total = total_percentage(&entries);
    if !(total > 0.0) {
        return Err(FormforgeError::DegenerateFormulation);
    }
    let bounds: Vec<(f64, f64)> = entries
        .iter()
        .map(|e| {
            repo.get_ingredient_by_id(&e.ingredient_id).map_or((0.0, 100.0), |i| {
                (i.min_concentration.unwrap_or(0.0), i.max_concentration.unwrap_or(100.0))
            })
        })
        .collect();

    let growing = total < 100.0;
    let pinned = |index: usize, concentration: f64| {
        let (min, max) = bounds[index];
        if growing {
            concentration >= max
        } else {
            concentration <= min
        }
    };
    let pinned_sum: f64 = entries
        .iter()
        .enumerate()
        .filter(|(i, e)| pinned(*i, e.concentration))
        .map(|(_, e)| e.concentration)
        .fold(0.0, |acc, c| acc + c);
    let free_sum = total - pinned_sum;
    if !(free_sum > 0.0) {
        return Ok(entries);
    }

    let factor = (100.0 - pinned_sum) / free_sum;
    for (index, entry) in entries.iter_mut().enumerate() {
        if !pinned(index, entry.concentration) {
            let (min, max) = bounds[index];
            entry.concentration = round_to((entry.concentration * factor).clamp(min, max), 2);
        }
    }

    let residual = round_to(100.0 - total_percentage(&entries), 2);
    if residual != 0.0 {
        let target = entries
            .iter()
            .enumerate()
            .filter(|(i, e)| {
                let (min, max) = bounds[*i];
                let next = e.concentration + residual;
                next >= min && next <= max
            })
            .max_by(|(_, a), (_, b)| a.concentration.partial_cmp(&b.concentration).unwrap_or(Ordering::Equal))
            .map(|(index, _)| index);
        if let Some(index) = target {
            entries[index].concentration = round_to(entries[index].concentration + residual, 2);
        }
    }
    Ok(entries)
}

/// Rescales every concentration so the list sums to exactly 100%.
///
/// Values are rounded to two decimals and the rounding residual goes to the
/// largest entry. A list already summing to 100% is returned unchanged.
///
/// # Errors
///
/// Returns `DegenerateFormulation` when the total is not positive.
pub fn normalize(mut entries: Vec<FormulationIngredient>) -> Result<Vec<FormulationIngredient>> {
    let total = total_percentage(&entries);
    if !(total > 0.0) {
        return Err(FormforgeError::DegenerateFormulation);
    }
    if (total - 100.0).abs() <= 1e-9 {
        return Ok(entries);
    }

    let factor = 100.0 / total;
    for entry in entries.iter_mut() {
        entry.concentration = round_to(entry.concentration * factor, 2);
    }

    let residual = round_to(100.0 - total_percentage(&entries), 2);
    if residual != 0.0 {
        let largest = entries
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.concentration.partial_cmp(&b.concentration).unwrap_or(Ordering::Equal))
            .map(|(index, _)| index);
        if let Some(index) = largest {
            entries[index].concentration = round_to(entries[index].concentration + residual, 2);
        }
    }
    Ok(entries)
}

/// Clamps each entry into its ingredient's bounds (max first, then min) and
/// drops entries that are unknown or incompatible with an entry kept earlier.
pub fn validate(
    entries: Vec<FormulationIngredient>,
    repo: &dyn IngredientRepository,
    compatibility: &BTreeMap<String, CompatibilityEntry>,
) -> Vec<FormulationIngredient> {
    let mut validated: Vec<FormulationIngredient> = Vec::with_capacity(entries.len());
    for mut entry in entries {
        let Some(ingredient) = repo.get_ingredient_by_id(&entry.ingredient_id) else {
            debug!(id = %entry.ingredient_id, "unknown ingredient dropped during validation");
            continue;
        };

        if let Some(max) = ingredient.max_concentration {
            entry.concentration = entry.concentration.min(max);
        }
        if let Some(min) = ingredient.min_concentration {
            entry.concentration = entry.concentration.max(min);
        }

        if let Some(conflict) = validated
            .iter()
            .find(|kept| is_incompatible(compatibility, &entry.ingredient_id, &kept.ingredient_id))
        {
            debug!(id = %entry.ingredient_id, conflict = %conflict.ingredient_id, "incompatible ingredient dropped");
            continue;
        }
        validated.push(entry);
    }
    validated
}

/// Whether two ingredients are listed as incompatible, in either direction.
pub fn is_incompatible(compatibility: &BTreeMap<String, CompatibilityEntry>, a: &str, b: &str) -> bool {
    let listed = |from: &str, to: &str| {
        compatibility
            .get(from)
            .map_or(false, |entry| entry.incompatible.iter().any(|id| id == to))
    };
    listed(a, b) || listed(b, a)
}
