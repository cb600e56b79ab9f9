use crate::{compliance::ComplianceStatus, ingredient::IngredientFunction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Cream,
    Lotion,
    Serum,
    Cleanser,
    Toner,
    Mask,
    Sunscreen,
    Shampoo,
    Conditioner,
}

impl ProductType {
    pub const ALL: [ProductType; 9] = [
        ProductType::Cream,
        ProductType::Lotion,
        ProductType::Serum,
        ProductType::Cleanser,
        ProductType::Toner,
        ProductType::Mask,
        ProductType::Sunscreen,
        ProductType::Shampoo,
        ProductType::Conditioner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Cream => "cream",
            ProductType::Lotion => "lotion",
            ProductType::Serum => "serum",
            ProductType::Cleanser => "cleanser",
            ProductType::Toner => "toner",
            ProductType::Mask => "mask",
            ProductType::Sunscreen => "sunscreen",
            ProductType::Shampoo => "shampoo",
            ProductType::Conditioner => "conditioner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ingredient placed in a formulation at a given concentration (% w/w).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulationIngredient {
    pub ingredient_id: String,
    pub name: String,
    pub inci_name: String,
    pub concentration: f64,
    pub function: IngredientFunction,
}

/// Request for generating a new formulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulationRequest {
    pub product_type: ProductType,
    /// Free-form goals such as `anti_aging`, `moisturizing`, `brightening`
    /// or `performance_priority`.
    #[serde(default)]
    pub target_properties: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub required_ingredients: Vec<String>,
    #[serde(default)]
    pub excluded_ingredients: Vec<String>,
    #[serde(default)]
    pub max_cost_per_kg: Option<f64>,
    #[serde(default)]
    pub natural_preference: bool,
    #[serde(default)]
    pub target_ph: Option<f64>,
    #[serde(default = "default_true")]
    pub stability_priority: bool,

    // UK specific requirements
    #[serde(default = "default_true")]
    pub ukes_compliant: bool,
    #[serde(default = "default_true")]
    pub cpnp_ready: bool,
}

impl FormulationRequest {
    pub fn new(product_type: ProductType) -> Self {
        Self {
            product_type,
            target_properties: HashMap::new(),
            required_ingredients: Vec::new(),
            excluded_ingredients: Vec::new(),
            max_cost_per_kg: None,
            natural_preference: false,
            target_ph: None,
            stability_priority: true,
            ukes_compliant: true,
            cpnp_ready: true,
        }
    }

    pub fn has_target(&self, property: &str) -> bool {
        self.target_properties.contains_key(property)
    }

    /// Whether a target property is set to a truthy value (`true`, a non-zero
    /// number, a non-empty string, array or object).
    pub fn target_is_truthy(&self, property: &str) -> bool {
        match self.target_properties.get(property) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::Number(n)) => n.as_f64().map_or(false, |v| v != 0.0),
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Array(a)) => !a.is_empty(),
            Some(serde_json::Value::Object(o)) => !o.is_empty(),
        }
    }

    pub fn is_excluded(&self, ingredient_id: &str) -> bool {
        self.excluded_ingredients.iter().any(|id| id == ingredient_id)
    }

    /// Checks the numeric ranges a request must respect.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(cost) = self.max_cost_per_kg {
            if !(cost > 0.0) {
                return Err(format!("max_cost_per_kg must be positive, got {}", cost));
            }
        }
        if let Some(ph) = self.target_ph {
            if !(0.0..=14.0).contains(&ph) {
                return Err(format!("target_ph must be within 0-14, got {}", ph));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

/// A finished formulation with its predicted properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulationResponse {
    pub id: String,
    pub product_type: ProductType,
    pub ingredients: Vec<FormulationIngredient>,
    pub total_percentage: f64,
    #[serde(default)]
    pub estimated_cost_per_kg: Option<f64>,
    #[serde(default)]
    pub predicted_ph: Option<f64>,
    #[serde(default)]
    pub stability_score: Option<f64>,
    pub compliance_status: ComplianceStatus,

    // Additional information
    #[serde(default)]
    pub instructions: Option<String>,
    /// Months.
    #[serde(default)]
    pub shelf_life_estimate: Option<u32>,
    pub created_at: DateTime<Utc>,
    /// Advisory findings from the product-type composition rules.
    #[serde(default)]
    pub design_warnings: Vec<String>,
}

impl FormulationResponse {
    pub fn ingredient(&self, ingredient_id: &str) -> Option<&FormulationIngredient> {
        self.ingredients.iter().find(|i| i.ingredient_id == ingredient_id)
    }
}

/// An externally supplied formulation, as accepted by the compliance checker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulationPayload {
    #[serde(default)]
    pub ingredients: Vec<PayloadIngredient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadIngredient {
    pub ingredient_id: String,
    #[serde(default)]
    pub concentration: f64,
}

impl From<&[FormulationIngredient]> for FormulationPayload {
    fn from(ingredients: &[FormulationIngredient]) -> Self {
        Self {
            ingredients: ingredients
                .iter()
                .map(|i| PayloadIngredient {
                    ingredient_id: i.ingredient_id.clone(),
                    concentration: i.concentration,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationTarget {
    Cost,
    Stability,
    Performance,
    Naturalness,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConstraints {
    #[serde(default)]
    pub excluded_ingredients: Vec<String>,
    #[serde(default)]
    pub max_cost_per_kg: Option<f64>,
}

/// Request for improving an existing formulation against one objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    #[serde(default)]
    pub formulation_id: Option<String>,
    #[serde(default)]
    pub current_formulation: Option<Vec<FormulationIngredient>>,
    #[serde(default)]
    pub product_type: Option<ProductType>,
    pub optimization_target: OptimizationTarget,
    #[serde(default)]
    pub constraints: OptimizationConstraints,
    #[serde(default = "default_max_changes")]
    pub max_changes: u32,
}

fn default_max_changes() -> u32 {
    3
}
