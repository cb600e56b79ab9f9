use crate::error::{FormforgeError, Result};
use csv::{Writer, WriterBuilder};
use formforge_schemas::formulation::FormulationResponse;
use serde::Serialize;
use std::{
    fs::{self, OpenOptions},
    path::Path,
};

#[derive(Debug, Serialize)]
struct LogEntry {
    id: String,
    created_at: String,
    product_type: String,
    ingredient_count: usize,
    total_percentage: f64,
    estimated_cost_per_kg: Option<f64>,
    predicted_ph: Option<f64>,
    stability_score: Option<f64>,
    compliance_status: String,
    ingredients_json: String,
}

/// Appends one CSV row per produced formulation. The header is written only
/// when the file is new or empty.
pub struct FormulationLogger {
    path: String,
    writer: Writer<fs::File>,
}

impl FormulationLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| FormforgeError::FileIO(display.clone(), e))?;
        let writer = WriterBuilder::new().has_headers(needs_header).from_writer(file);
        Ok(Self { path: display, writer })
    }

    pub fn log_formulation(&mut self, response: &FormulationResponse) -> Result<()> {
        let entry = LogEntry {
            id: response.id.clone(),
            created_at: response.created_at.to_rfc3339(),
            product_type: response.product_type.to_string(),
            ingredient_count: response.ingredients.len(),
            total_percentage: response.total_percentage,
            estimated_cost_per_kg: response.estimated_cost_per_kg,
            predicted_ph: response.predicted_ph,
            stability_score: response.stability_score,
            compliance_status: response.compliance_status.to_string(),
            ingredients_json: serde_json::to_string(&response.ingredients)?,
        };

        self.writer
            .serialize(entry)
            .map_err(|e| FormforgeError::CsvError(self.path.clone(), e))?;
        self.writer
            .flush()
            .map_err(|e| FormforgeError::FileIO(self.path.clone(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{repository::JsonStore, FormulationEngine};
    use formforge_schemas::formulation::{FormulationRequest, ProductType};

    #[test]
    fn header_is_written_once_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");
        let store = JsonStore::in_memory();
        let engine = FormulationEngine::with_default_rules(&store);
        let response = engine.generate_formulation(&FormulationRequest::new(ProductType::Serum)).unwrap();

        FormulationLogger::new(&path).unwrap().log_formulation(&response).unwrap();
        FormulationLogger::new(&path).unwrap().log_formulation(&response).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,created_at,product_type,ingredient_count"));
        assert_eq!(content.matches("ingredients_json").count(), 1);
        assert!(lines[1].starts_with(&response.id));
        assert!(lines[2].contains(",serum,"));
    }
}
