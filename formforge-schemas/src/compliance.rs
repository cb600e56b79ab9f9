use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    RequiresReview,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::NonCompliant => "non_compliant",
            ComplianceStatus::RequiresReview => "requires_review",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Prohibited,
    ConcentrationLimit,
}

/// A single regulatory finding against one ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub issue_type: IssueKind,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// Result of checking a formulation against UKES/EU rules. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub overall_status: ComplianceStatus,
    pub ukes_compliant: bool,
    pub cpnp_ready: bool,
    #[serde(default)]
    pub issues: Vec<ComplianceIssue>,
    #[serde(default)]
    pub warnings: Vec<String>,

    // Regulatory summary
    #[serde(default)]
    pub prohibited_ingredients: Vec<String>,
    #[serde(default)]
    pub concentration_violations: Vec<String>,
    #[serde(default)]
    pub labeling_requirements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryData {
    #[serde(default)]
    pub prohibited_substances: Vec<String>,
    #[serde(default)]
    pub restricted_concentrations: BTreeMap<String, f64>,
    #[serde(default)]
    pub cpnp_requirements: BTreeMap<String, bool>,
    #[serde(default)]
    pub labeling_requirements: Vec<String>,
}

impl RegulatoryData {
    pub fn is_empty(&self) -> bool {
        self.prohibited_substances.is_empty()
            && self.restricted_concentrations.is_empty()
            && self.cpnp_requirements.is_empty()
            && self.labeling_requirements.is_empty()
    }
}
