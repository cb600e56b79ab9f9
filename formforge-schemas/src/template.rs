use crate::formulation::ProductType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseIngredient {
    pub ingredient_id: String,
    pub concentration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRange {
    pub min: f64,
    pub max: f64,
}

/// A base recipe for one product type, used to seed a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormularyTemplate {
    pub id: String,
    pub name: String,
    pub product_type: ProductType,
    pub base_ingredients: Vec<BaseIngredient>,
    #[serde(default)]
    pub variable_ingredients: Vec<String>,
    pub instructions: String,
    pub typical_cost_range: CostRange,
    #[serde(default)]
    pub stability_notes: Option<String>,
}
