//! Formulation generation and compliance evaluation for cosmetic products.
//!
//! The [`formulation::FormulationEngine`] assembles a mixture from a
//! [`repository::IngredientRepository`], predicts its cost, pH and stability,
//! and checks it against the repository's regulatory data.

pub mod error;
pub mod formulation;
pub mod logger;
pub mod repository;
pub mod rules;

pub use error::{FormforgeError, Result};
pub use formulation::FormulationEngine;
pub use logger::FormulationLogger;
pub use repository::{IngredientFilter, IngredientRepository, JsonStore};
