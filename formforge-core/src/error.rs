use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormforgeError {
    #[error("Ingredient {0} already exists")]
    DuplicateIngredient(String),

    #[error("Invalid ingredient: {0}")]
    InvalidIngredient(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Formulation has no positive concentration to normalize")]
    DegenerateFormulation,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("Repository lock poisoned")]
    LockPoisoned,
}

impl FormforgeError {
    /// Errors caused by the caller's input rather than by the engine or its storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FormforgeError::DuplicateIngredient(_)
                | FormforgeError::InvalidIngredient(_)
                | FormforgeError::InvalidRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FormforgeError>;
