use crate::{
    compliance::RegulatoryData, ingredient::Ingredient, peptide::PeptideData,
    template::FormularyTemplate,
};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientFile {
    pub schema_version: String,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PeptideFile {
    pub schema_version: String,
    pub peptides: Vec<PeptideData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateFile {
    pub schema_version: String,
    pub templates: Vec<FormularyTemplate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegulatoryFile {
    pub schema_version: String,
    pub regulatory_data: RegulatoryData,
}
