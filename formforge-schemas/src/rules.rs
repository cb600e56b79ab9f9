//! Static rule tables consumed by the formulation engine.
//!
//! Every table has a built-in default matching the reference formulary, and
//! every struct is `#[serde(default)]` so a YAML override only needs to name
//! the sections it changes.

use crate::{formulation::ProductType, ingredient::IngredientFunction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentRange {
    pub min: f64,
    pub max: f64,
}

impl PercentRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineRules {
    pub function_priorities: FunctionPriorities,
    pub scoring: ScoringRules,
    pub concentration: ConcentrationPolicy,
    pub build: BuildPolicy,
    pub ph: PhModel,
    pub stability: StabilityModel,
    pub compatibility: BTreeMap<String, CompatibilityEntry>,
    pub product_rules: BTreeMap<ProductType, ProductTypeRules>,
    pub instructions: BTreeMap<ProductType, String>,
    pub fallback_instructions: String,
    pub default_shelf_life_months: u32,
}

impl Default for EngineRules {
    fn default() -> Self {
        Self {
            function_priorities: FunctionPriorities::default(),
            scoring: ScoringRules::default(),
            concentration: ConcentrationPolicy::default(),
            build: BuildPolicy::default(),
            ph: PhModel::default(),
            stability: StabilityModel::default(),
            compatibility: default_compatibility(),
            product_rules: default_product_rules(),
            instructions: default_instructions(),
            fallback_instructions: "Standard cosmetic manufacturing process".to_string(),
            default_shelf_life_months: 24,
        }
    }
}

/// Base desirability of each ingredient function when filling a formulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionPriorities {
    pub weights: BTreeMap<IngredientFunction, f64>,
    pub default_weight: f64,
}

impl Default for FunctionPriorities {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (IngredientFunction::Active, 10.0),
                (IngredientFunction::Moisturiser, 8.0),
                (IngredientFunction::Antioxidant, 6.0),
                (IngredientFunction::Thickener, 4.0),
                (IngredientFunction::Fragrance, 2.0),
            ]),
            default_weight: 1.0,
        }
    }
}

impl FunctionPriorities {
    pub fn weight(&self, function: IngredientFunction) -> f64 {
        self.weights.get(&function).copied().unwrap_or(self.default_weight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Name,
    Id,
}

/// Keyword boost applied when a request names `property` as a target.
/// An empty keyword list matches every ingredient of the given function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyBoost {
    pub property: String,
    #[serde(default)]
    pub function: Option<IngredientFunction>,
    pub field: MatchField,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub diversity_bonus: f64,
    pub natural_bonus: f64,
    pub cost_penalty: f64,
    /// Share of the request's cost ceiling above which an ingredient counts as expensive.
    pub cost_threshold_fraction: f64,
    pub property_boosts: Vec<PropertyBoost>,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            diversity_bonus: 1.5,
            natural_bonus: 1.3,
            cost_penalty: 0.7,
            cost_threshold_fraction: 0.1,
            property_boosts: vec![
                PropertyBoost {
                    property: "anti_aging".to_string(),
                    function: Some(IngredientFunction::Active),
                    field: MatchField::Name,
                    keywords: vec!["peptide".to_string(), "retinol".to_string()],
                    multiplier: 1.5,
                },
                PropertyBoost {
                    property: "moisturizing".to_string(),
                    function: Some(IngredientFunction::Moisturiser),
                    field: MatchField::Name,
                    keywords: Vec::new(),
                    multiplier: 1.4,
                },
                PropertyBoost {
                    property: "brightening".to_string(),
                    function: None,
                    field: MatchField::Id,
                    keywords: vec!["vitamin_c".to_string()],
                    multiplier: 1.4,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcentrationPolicy {
    pub default_min: f64,
    pub default_max: f64,
    /// Share of the remaining budget a single ingredient may claim.
    pub reserve_fraction: f64,
    pub active_performance_fraction: f64,
    pub active_standard_fraction: f64,
    pub preservative_dose: f64,
    pub emulsifier_ceilings: BTreeMap<ProductType, f64>,
    pub default_emulsifier_ceiling: f64,
}

impl Default for ConcentrationPolicy {
    fn default() -> Self {
        Self {
            default_min: 0.01,
            default_max: 5.0,
            reserve_fraction: 0.8,
            active_performance_fraction: 0.8,
            active_standard_fraction: 0.5,
            preservative_dose: 0.5,
            emulsifier_ceilings: BTreeMap::from([
                (ProductType::Cream, 3.0),
                (ProductType::Lotion, 2.0),
            ]),
            default_emulsifier_ceiling: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildPolicy {
    /// Complementary ingredients are added until the total reaches this value.
    pub fill_target: f64,
    /// Filling stops once the remaining budget drops to this value.
    pub min_remaining: f64,
    /// Upper bound on normalize/validate passes after the first validation.
    pub max_rebalance_rounds: u32,
}

impl Default for BuildPolicy {
    fn default() -> Self {
        Self {
            fill_target: 99.0,
            min_remaining: 0.1,
            max_rebalance_rounds: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhModel {
    pub contributors: BTreeMap<String, f64>,
    pub default_ph: f64,
}

impl Default for PhModel {
    fn default() -> Self {
        Self {
            contributors: BTreeMap::from([
                ("water".to_string(), 7.0),
                ("glycerin".to_string(), 7.0),
                ("vitamin_c".to_string(), 3.5),
                ("hyaluronic_acid".to_string(), 6.5),
                ("phenoxyethanol".to_string(), 6.0),
            ]),
            default_ph: 6.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnstablePair {
    pub first: String,
    pub second: String,
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityModel {
    pub base_score: f64,
    pub function_bonuses: BTreeMap<IngredientFunction, f64>,
    pub unstable_pairs: Vec<UnstablePair>,
}

impl Default for StabilityModel {
    fn default() -> Self {
        Self {
            base_score: 7.0,
            function_bonuses: BTreeMap::from([
                (IngredientFunction::Emulsifier, 1.0),
                (IngredientFunction::Preservative, 1.5),
                (IngredientFunction::Antioxidant, 0.5),
            ]),
            unstable_pairs: vec![UnstablePair {
                first: "vitamin_c".to_string(),
                second: "retinol".to_string(),
                penalty: 2.0,
            }],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    #[serde(default)]
    pub incompatible: Vec<String>,
    #[serde(default)]
    pub synergistic: Vec<String>,
}

fn default_compatibility() -> BTreeMap<String, CompatibilityEntry> {
    let entry = |incompatible: &[&str], synergistic: &[&str]| CompatibilityEntry {
        incompatible: incompatible.iter().map(|s| s.to_string()).collect(),
        synergistic: synergistic.iter().map(|s| s.to_string()).collect(),
    };
    BTreeMap::from([
        ("vitamin_c".to_string(), entry(&["niacinamide"], &["vitamin_e"])),
        ("retinol".to_string(), entry(&["vitamin_c", "aha_bha"], &["hyaluronic_acid"])),
        ("niacinamide".to_string(), entry(&["vitamin_c"], &["hyaluronic_acid"])),
    ])
}

/// Compositional envelope for one product type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductTypeRules {
    #[serde(default)]
    pub water_range: Option<PercentRange>,
    #[serde(default)]
    pub oil_range: Option<PercentRange>,
    #[serde(default)]
    pub emulsifier_range: Option<PercentRange>,
    #[serde(default)]
    pub preservative_range: Option<PercentRange>,
    #[serde(default)]
    pub active_range: Option<PercentRange>,
    #[serde(default)]
    pub required_functions: Vec<IngredientFunction>,
}

fn default_product_rules() -> BTreeMap<ProductType, ProductTypeRules> {
    BTreeMap::from([
        (
            ProductType::Cream,
            ProductTypeRules {
                water_range: Some(PercentRange::new(40.0, 80.0)),
                oil_range: Some(PercentRange::new(10.0, 30.0)),
                emulsifier_range: Some(PercentRange::new(2.0, 8.0)),
                preservative_range: Some(PercentRange::new(0.1, 1.0)),
                active_range: None,
                required_functions: vec![IngredientFunction::Emulsifier, IngredientFunction::Preservative],
            },
        ),
        (
            ProductType::Serum,
            ProductTypeRules {
                water_range: Some(PercentRange::new(70.0, 95.0)),
                oil_range: Some(PercentRange::new(0.0, 10.0)),
                emulsifier_range: None,
                preservative_range: Some(PercentRange::new(0.1, 1.0)),
                active_range: Some(PercentRange::new(1.0, 20.0)),
                required_functions: vec![IngredientFunction::Preservative],
            },
        ),
        (
            ProductType::Lotion,
            ProductTypeRules {
                water_range: Some(PercentRange::new(60.0, 85.0)),
                oil_range: Some(PercentRange::new(5.0, 25.0)),
                emulsifier_range: Some(PercentRange::new(1.0, 5.0)),
                preservative_range: Some(PercentRange::new(0.1, 1.0)),
                active_range: None,
                required_functions: vec![IngredientFunction::Emulsifier, IngredientFunction::Preservative],
            },
        ),
    ])
}

fn default_instructions() -> BTreeMap<ProductType, String> {
    BTreeMap::from([
        (
            ProductType::Cream,
            "1. Heat water phase ingredients to 70°C\n\
             2. Heat oil phase ingredients to 70°C\n\
             3. Slowly add oil phase to water phase with continuous mixing\n\
             4. Cool to 40°C while mixing\n\
             5. Add heat-sensitive actives below 40°C\n\
             6. Adjust pH if needed\n\
             7. Fill into sterilized containers"
                .to_string(),
        ),
        (
            ProductType::Serum,
            "1. Mix water and glycols at room temperature\n\
             2. Add water-soluble actives one by one\n\
             3. Mix until completely dissolved\n\
             4. Add preservative system\n\
             5. Adjust pH to 5.5-6.5\n\
             6. Fill into sterilized containers"
                .to_string(),
        ),
        (
            ProductType::Lotion,
            "1. Heat water phase to 65°C\n\
             2. Heat oil phase to 65°C\n\
             3. Add oil phase to water phase with mixing\n\
             4. Cool to room temperature\n\
             5. Add actives and preservatives\n\
             6. Adjust pH and viscosity\n\
             7. Fill into containers"
                .to_string(),
        ),
    ])
}
