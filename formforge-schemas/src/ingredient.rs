use serde::{Deserialize, Serialize};
use std::fmt;

/// The functional role an ingredient plays in a formulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientFunction {
    Emulsifier,
    Moisturiser,
    Active,
    Preservative,
    Thickener,
    Antioxidant,
    Surfactant,
    Fragrance,
    Colorant,
    PhAdjuster,
    Solvent,
}

impl IngredientFunction {
    pub const ALL: [IngredientFunction; 11] = [
        IngredientFunction::Emulsifier,
        IngredientFunction::Moisturiser,
        IngredientFunction::Active,
        IngredientFunction::Preservative,
        IngredientFunction::Thickener,
        IngredientFunction::Antioxidant,
        IngredientFunction::Surfactant,
        IngredientFunction::Fragrance,
        IngredientFunction::Colorant,
        IngredientFunction::PhAdjuster,
        IngredientFunction::Solvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientFunction::Emulsifier => "emulsifier",
            IngredientFunction::Moisturiser => "moisturiser",
            IngredientFunction::Active => "active",
            IngredientFunction::Preservative => "preservative",
            IngredientFunction::Thickener => "thickener",
            IngredientFunction::Antioxidant => "antioxidant",
            IngredientFunction::Surfactant => "surfactant",
            IngredientFunction::Fragrance => "fragrance",
            IngredientFunction::Colorant => "colorant",
            IngredientFunction::PhAdjuster => "ph_adjuster",
            IngredientFunction::Solvent => "solvent",
        }
    }

    /// Parses the wire name of a function, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

impl fmt::Display for IngredientFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhRange {
    pub min: f64,
    pub max: f64,
}

/// A stored ingredient record with its UK/EU regulatory flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub inci_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas_number: Option<String>,
    pub function: IngredientFunction,
    pub category: String,

    // Regulatory information
    #[serde(default)]
    pub max_concentration: Option<f64>,
    #[serde(default)]
    pub min_concentration: Option<f64>,
    #[serde(default)]
    pub prohibited_in_eu: bool,
    #[serde(default)]
    pub restricted_in_eu: bool,
    #[serde(default = "default_true")]
    pub cpnp_reportable: bool,

    // Physical/chemical properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecular_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph_range: Option<PhRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solubility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_notes: Option<String>,

    // Cost and sourcing
    #[serde(default)]
    pub cost_per_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default)]
    pub natural_origin: bool,
    #[serde(default)]
    pub organic_certified: bool,
}

impl Ingredient {
    /// A minimal record with no bounds, cost or regulatory flags set.
    pub fn new(id: &str, name: &str, inci_name: &str, function: IngredientFunction, category: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            inci_name: inci_name.to_string(),
            cas_number: None,
            function,
            category: category.to_string(),
            max_concentration: None,
            min_concentration: None,
            prohibited_in_eu: false,
            restricted_in_eu: false,
            cpnp_reportable: true,
            molecular_weight: None,
            ph_range: None,
            solubility: None,
            stability_notes: None,
            cost_per_kg: None,
            supplier: None,
            natural_origin: false,
            organic_certified: false,
        }
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_concentration = Some(min);
        self.max_concentration = Some(max);
        self
    }

    pub fn with_cost(mut self, cost_per_kg: f64) -> Self {
        self.cost_per_kg = Some(cost_per_kg);
        self
    }

    pub fn natural(mut self) -> Self {
        self.natural_origin = true;
        self
    }
}

fn default_true() -> bool {
    true
}

/// Payload for registering a new ingredient. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientAdd {
    pub name: String,
    pub inci_name: String,
    #[serde(default)]
    pub cas_number: Option<String>,
    pub function: IngredientFunction,
    pub category: String,
    #[serde(default)]
    pub max_concentration: Option<f64>,
    #[serde(default)]
    pub min_concentration: Option<f64>,
    #[serde(default)]
    pub prohibited_in_eu: bool,
    #[serde(default)]
    pub restricted_in_eu: bool,
    #[serde(default)]
    pub cost_per_kg: Option<f64>,
    #[serde(default)]
    pub natural_origin: bool,
}

impl IngredientAdd {
    pub fn into_ingredient(self, id: String) -> Ingredient {
        Ingredient {
            id,
            name: self.name,
            inci_name: self.inci_name,
            cas_number: self.cas_number,
            function: self.function,
            category: self.category,
            max_concentration: self.max_concentration,
            min_concentration: self.min_concentration,
            prohibited_in_eu: self.prohibited_in_eu,
            restricted_in_eu: self.restricted_in_eu,
            cpnp_reportable: true,
            molecular_weight: None,
            ph_range: None,
            solubility: None,
            stability_notes: None,
            cost_per_kg: self.cost_per_kg,
            supplier: None,
            natural_origin: self.natural_origin,
            organic_certified: false,
        }
    }
}
