use crate::ingredient::PhRange;
use serde::{Deserialize, Serialize};

/// A peptide active with its efficacy and safety profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideData {
    pub id: String,
    pub name: String,
    pub sequence: String,
    pub molecular_weight: f64,
    pub function: String,
    pub stability_ph_range: PhRange,
    pub max_concentration: f64,
    pub cost_per_gram: f64,
    #[serde(default)]
    pub efficacy_studies: Vec<String>,

    // Regulatory specific
    #[serde(default)]
    pub novel_ingredient: bool,
    #[serde(default = "default_true")]
    pub safety_assessment_required: bool,
}

fn default_true() -> bool {
    true
}
