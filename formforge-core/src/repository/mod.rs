//! Keyed storage for ingredients, peptides, templates and regulatory data.
//!
//! The engine only reads through [`IngredientRepository`]; [`JsonStore`] is the
//! file-backed implementation used by the CLI and the tests.

mod defaults;
mod store;

pub use defaults::{default_ingredients, default_peptides, default_regulatory_data, default_templates};
pub use store::JsonStore;

use crate::error::Result;
use formforge_schemas::{
    compliance::RegulatoryData,
    formulation::ProductType,
    ingredient::{Ingredient, IngredientAdd, IngredientFunction},
    peptide::PeptideData,
    template::FormularyTemplate,
};

/// Optional filters for listing ingredients.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientFilter {
    pub category: Option<String>,
    pub function: Option<IngredientFunction>,
    pub limit: usize,
}

impl Default for IngredientFilter {
    fn default() -> Self {
        Self {
            category: None,
            function: None,
            limit: 100,
        }
    }
}

impl IngredientFilter {
    /// Every stored ingredient, in insertion order.
    pub fn all() -> Self {
        Self {
            limit: usize::MAX,
            ..Self::default()
        }
    }

    pub fn matches(&self, ingredient: &Ingredient) -> bool {
        self.category.as_ref().map_or(true, |c| &ingredient.category == c)
            && self.function.map_or(true, |f| ingredient.function == f)
    }
}

pub trait IngredientRepository: Send + Sync {
    /// Templates for a product type, or all templates when `None`.
    fn get_templates(&self, product_type: Option<ProductType>) -> Vec<FormularyTemplate>;

    fn get_ingredient_by_id(&self, id: &str) -> Option<Ingredient>;

    fn get_ingredients(&self, filter: &IngredientFilter) -> Vec<Ingredient>;

    fn get_peptides(&self) -> Vec<PeptideData>;

    fn get_regulatory_data(&self) -> RegulatoryData;

    /// Stores a new ingredient and returns its generated id.
    ///
    /// # Errors
    ///
    /// Rejects an INCI name that already exists (case-insensitive) and bounds
    /// outside [0, 100] or with min > max. The repository is unchanged on error.
    fn add_ingredient(&self, ingredient: IngredientAdd) -> Result<String>;
}
