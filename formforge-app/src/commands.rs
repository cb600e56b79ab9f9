use crate::{
    cli::{Commands, FormulateArgs, IngredientsCommand, OptimizeArgs},
    config::{read_input, AppConfig},
    plotting,
};
use anyhow::{Context, Result};
use formforge_core::{FormforgeError, FormulationEngine, FormulationLogger, IngredientFilter, IngredientRepository};
use formforge_schemas::{
    formulation::{FormulationPayload, FormulationRequest, FormulationResponse, OptimizationRequest, ProductType},
    ingredient::{IngredientAdd, IngredientFunction},
};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

pub fn run(command: Commands, config: &AppConfig) -> Result<()> {
    let store = config.open_store()?;
    let engine = FormulationEngine::new(&store, config.engine_rules()?);

    match command {
        Commands::Formulate(args) => formulate(&engine, config, args),
        Commands::Check { formulation } => {
            let payload: FormulationPayload = read_input(&formulation)?;
            write_json(&engine.check_compliance(&payload), None)
        }
        Commands::Optimize(args) => optimize(&engine, config, args),
        Commands::Ingredients(IngredientsCommand::List {
            category,
            function,
            limit,
        }) => {
            let function = function.as_deref().map(parse_function).transpose()?;
            let filter = IngredientFilter {
                category,
                function,
                limit,
            };
            write_json(&store.get_ingredients(&filter), None)
        }
        Commands::Ingredients(IngredientsCommand::Add { file }) => {
            let ingredient: IngredientAdd = read_input(&file)?;
            let id = store.add_ingredient(ingredient)?;
            info!(id = %id, "ingredient added");
            write_json(&serde_json::json!({ "id": id }), None)
        }
        Commands::Templates { product_type } => {
            let product_type = product_type.as_deref().map(parse_product_type).transpose()?;
            write_json(&store.get_templates(product_type), None)
        }
        Commands::Peptides => write_json(&store.get_peptides(), None),
        Commands::Regulatory => write_json(&store.get_regulatory_data(), None),
    }
}

fn formulate(engine: &FormulationEngine, config: &AppConfig, args: FormulateArgs) -> Result<()> {
    let request: FormulationRequest = read_input(&args.request)?;
    let response = engine.generate_formulation(&request)?;
    publish(&response, config, args.output, args.chart, args.run_log)
}

fn optimize(engine: &FormulationEngine, config: &AppConfig, args: OptimizeArgs) -> Result<()> {
    let request: OptimizationRequest = read_input(&args.request)?;
    let response = engine.optimize_formulation(&request)?;
    publish(&response, config, args.output, args.chart, args.run_log)
}

/// Writes the response, then the optional chart and run-log row.
fn publish(
    response: &FormulationResponse,
    config: &AppConfig,
    output: Option<PathBuf>,
    chart: Option<PathBuf>,
    run_log: Option<PathBuf>,
) -> Result<()> {
    let output = output.or_else(|| {
        config
            .output_dir
            .as_ref()
            .map(|dir| dir.join(output_file_name(response)))
    });
    write_json(response, output.as_deref())?;

    if let Some(path) = chart {
        plotting::plot_composition(&path, response)?;
    }
    if let Some(path) = run_log.or_else(|| config.run_log.clone()) {
        FormulationLogger::new(&path)
            .and_then(|mut logger| logger.log_formulation(response))
            .with_context(|| format!("Failed to append to run log {:?}", path))?;
    }
    Ok(())
}

fn output_file_name(response: &FormulationResponse) -> String {
    format!(
        "{}_{}_{}.json",
        response.product_type,
        response.created_at.format("%Y%m%d_%H%M%S"),
        response.id
    )
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
            }
            fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
            info!(path = %path.display(), "response written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn parse_function(value: &str) -> Result<IngredientFunction, FormforgeError> {
    IngredientFunction::parse(value)
        .ok_or_else(|| FormforgeError::InvalidRequest(format!("unknown ingredient function '{}'", value)))
}

fn parse_product_type(value: &str) -> Result<ProductType, FormforgeError> {
    ProductType::parse(value)
        .ok_or_else(|| FormforgeError::InvalidRequest(format!("unknown product type '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_core::JsonStore;

    #[test]
    fn unknown_filter_values_are_client_errors() {
        assert!(parse_function("glitter").unwrap_err().is_client_error());
        assert_eq!(parse_function("preservative").unwrap(), IngredientFunction::Preservative);
        assert!(parse_product_type("perfume").unwrap_err().is_client_error());
    }

    #[test]
    fn publish_writes_response_and_run_log_under_configured_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().join("data"),
            rules_path: None,
            output_dir: Some(dir.path().join("out")),
            run_log: Some(dir.path().join("runs.csv")),
        };
        let store = JsonStore::in_memory();
        let engine = FormulationEngine::with_default_rules(&store);
        let response = engine.generate_formulation(&FormulationRequest::new(ProductType::Cream)).unwrap();

        publish(&response, &config, None, None, None).unwrap();

        let written = dir.path().join("out").join(output_file_name(&response));
        assert!(written.file_name().unwrap().to_str().unwrap().starts_with("cream_"));
        let parsed: FormulationResponse = serde_json::from_str(&fs::read_to_string(written).unwrap()).unwrap();
        assert_eq!(parsed.id, response.id);
        assert_eq!(fs::read_to_string(dir.path().join("runs.csv")).unwrap().lines().count(), 2);
    }
}
