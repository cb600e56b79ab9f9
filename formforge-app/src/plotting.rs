//! Composition chart for a finished formulation.

use anyhow::{Context, Result};
use formforge_schemas::{formulation::FormulationResponse, ingredient::IngredientFunction};
use plotters::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Draws one horizontal bar per ingredient, coloured by function, in
/// formulation order.
pub fn plot_composition(path: &Path, response: &FormulationResponse) -> Result<()> {
    if response.ingredients.is_empty() {
        warn!("formulation has no ingredients, skipping chart");
        return Ok(());
    }

    let labels: Vec<String> = response
        .ingredients
        .iter()
        .map(|i| format!("{} ({:.2}%)", i.name, i.concentration))
        .collect();
    let count = labels.len() as i32;
    let x_max = response
        .ingredients
        .iter()
        .map(|i| i.concentration)
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;

    let height = 120 + 40 * labels.len() as u32;
    let root = BitMapBackend::new(path, (1024, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let caption = format!("{} composition ({})", response.product_type, response.compliance_status);
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 28).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(260)
        .build_cartesian_2d(0f64..x_max, (0..count).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Concentration (%)")
        .y_labels(labels.len())
        .y_label_formatter(&|value| match value {
            SegmentValue::CenterOf(index) => labels.get(*index as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    for (index, ingredient) in response.ingredients.iter().enumerate() {
        let index = index as i32;
        chart.draw_series(std::iter::once(Rectangle::new(
            [
                (0.0, SegmentValue::Exact(index)),
                (ingredient.concentration, SegmentValue::Exact(index + 1)),
            ],
            function_color(ingredient.function).filled(),
        )))?;
    }

    root.present()
        .with_context(|| format!("Failed to write chart to {:?}", path))?;
    info!(path = %path.display(), "composition chart written");
    Ok(())
}

fn function_color(function: IngredientFunction) -> RGBColor {
    match function {
        IngredientFunction::Solvent => RGBColor(100, 149, 237),
        IngredientFunction::Moisturiser => RGBColor(72, 201, 176),
        IngredientFunction::Emulsifier => RGBColor(244, 208, 63),
        IngredientFunction::Preservative => RGBColor(231, 76, 60),
        IngredientFunction::Active => RGBColor(142, 68, 173),
        IngredientFunction::Antioxidant => RGBColor(230, 126, 34),
        _ => RGBColor(149, 165, 166),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_core::{FormulationEngine, JsonStore};
    use formforge_schemas::formulation::{FormulationRequest, ProductType};

    #[test]
    fn empty_formulation_writes_no_chart() {
        let store = JsonStore::from_parts(Vec::new(), Vec::new(), Vec::new(), Default::default());
        let engine = FormulationEngine::with_default_rules(&store);
        let response = engine.generate_formulation(&FormulationRequest::new(ProductType::Toner)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        plot_composition(&path, &response).unwrap();
        assert!(!path.exists());
    }
}
