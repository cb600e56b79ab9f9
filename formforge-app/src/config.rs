use anyhow::{Context, Result};
use formforge_core::{rules::load_rules, FormforgeError, JsonStore};
use formforge_schemas::rules::EngineRules;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Settings for one CLI invocation. Every field may be omitted from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Optional YAML override of the engine's rule tables.
    pub rules_path: Option<PathBuf>,
    /// Where responses are written when no `--output` is given.
    pub output_dir: Option<PathBuf>,
    pub run_log: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            rules_path: None,
            output_dir: None,
            run_log: None,
        }
    }
}

impl AppConfig {
    /// Reads the config file when one is given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("no config file given, using defaults");
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Applies command-line overrides on top of the file values.
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }

    pub fn open_store(&self) -> Result<JsonStore> {
        JsonStore::open(&self.data_dir)
            .with_context(|| format!("Failed to open data directory: {:?}", self.data_dir))
    }

    pub fn engine_rules(&self) -> Result<EngineRules> {
        match &self.rules_path {
            Some(path) => load_rules(path).with_context(|| format!("Failed to load rules from {:?}", path)),
            None => Ok(EngineRules::default()),
        }
    }
}

/// Reads a request file. `serde_yaml` accepts JSON documents as well as YAML.
/// Unreadable or malformed input is reported as an invalid request.
pub fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| FormforgeError::InvalidRequest(format!("cannot read {}: {}", path.display(), e)))?;
    let value = serde_yaml::from_str(&content)
        .map_err(|e| FormforgeError::InvalidRequest(format!("cannot parse {}: {}", path.display(), e)))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_schemas::formulation::{FormulationRequest, ProductType};
    use std::io::Write;

    #[test]
    fn missing_config_uses_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.engine_rules().unwrap(), EngineRules::default());
    }

    #[test]
    fn partial_config_and_cli_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_dir: /srv/formforge\nrun_log: runs.csv").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/formforge"));
        assert_eq!(config.run_log, Some(PathBuf::from("runs.csv")));
        assert!(config.rules_path.is_none());

        let config = config.with_data_dir(Some(PathBuf::from("/tmp/other")));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/other"));
    }

    #[test]
    fn requests_can_be_yaml_or_json() {
        let mut yaml = tempfile::NamedTempFile::new().unwrap();
        writeln!(yaml, "product_type: serum\nrequired_ingredients: [hyaluronic_acid]").unwrap();
        let mut json = tempfile::NamedTempFile::new().unwrap();
        writeln!(json, r#"{{"product_type": "serum", "required_ingredients": ["hyaluronic_acid"]}}"#).unwrap();

        let from_yaml: FormulationRequest = read_input(yaml.path()).unwrap();
        let from_json: FormulationRequest = read_input(json.path()).unwrap();
        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml.product_type, ProductType::Serum);
    }

    #[test]
    fn malformed_input_is_a_client_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "product_type: [not, a, type]").unwrap();
        let err = read_input::<FormulationRequest>(file.path()).unwrap_err();
        let formforge = err.downcast_ref::<FormforgeError>().unwrap();
        assert!(formforge.is_client_error());
    }

    #[test]
    fn store_is_seeded_in_the_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default().with_data_dir(Some(dir.path().to_path_buf()));
        config.open_store().unwrap();
        assert!(dir.path().join("ingredients.json").is_file());
        assert!(dir.path().join("regulatory_data.json").is_file());
    }
}
