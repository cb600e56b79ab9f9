use super::{
    defaults::{default_ingredients, default_peptides, default_regulatory_data, default_templates},
    IngredientFilter, IngredientRepository,
};
use crate::error::{FormforgeError, Result};
use formforge_schemas::{
    compliance::RegulatoryData,
    file_formats::{IngredientFile, PeptideFile, RegulatoryFile, TemplateFile, SCHEMA_VERSION},
    formulation::ProductType,
    ingredient::{Ingredient, IngredientAdd},
    peptide::PeptideData,
    template::FormularyTemplate,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

const INGREDIENTS_FILE: &str = "ingredients.json";
const PEPTIDES_FILE: &str = "peptides.json";
const TEMPLATES_FILE: &str = "formulary.json";
const REGULATORY_FILE: &str = "regulatory_data.json";

/// Ingredient repository held in memory and mirrored to JSON files.
///
/// Each collection has its own lock. Writers hold the ingredient write lock
/// across the duplicate check, the insert and the save.
pub struct JsonStore {
    data_path: Option<PathBuf>,
    ingredients: RwLock<Vec<Ingredient>>,
    peptides: RwLock<Vec<PeptideData>>,
    templates: RwLock<Vec<FormularyTemplate>>,
    regulatory: RwLock<RegulatoryData>,
}

impl JsonStore {
    /// A store seeded with the default data and no backing files.
    pub fn in_memory() -> Self {
        Self::from_parts(
            default_ingredients(),
            default_peptides(),
            default_templates(),
            default_regulatory_data(),
        )
    }

    /// A store over exactly the given collections, with no backing files.
    pub fn from_parts(
        ingredients: Vec<Ingredient>,
        peptides: Vec<PeptideData>,
        templates: Vec<FormularyTemplate>,
        regulatory: RegulatoryData,
    ) -> Self {
        Self {
            data_path: None,
            ingredients: RwLock::new(ingredients),
            peptides: RwLock::new(peptides),
            templates: RwLock::new(templates),
            regulatory: RwLock::new(regulatory),
        }
    }

    /// Opens the data directory, loading every collection. A file that is
    /// missing or unreadable yields an empty collection, and any empty
    /// collection is seeded with the defaults and written back.
    pub fn open<P: AsRef<Path>>(data_path: P) -> Result<Self> {
        let data_path = data_path.as_ref().to_path_buf();
        fs::create_dir_all(&data_path)
            .map_err(|e| FormforgeError::FileIO(data_path.display().to_string(), e))?;
        info!(path = %data_path.display(), "opening ingredient store");

        let ingredients = load_collection(&data_path.join(INGREDIENTS_FILE), |f: IngredientFile| f.ingredients);
        let peptides = load_collection(&data_path.join(PEPTIDES_FILE), |f: PeptideFile| f.peptides);
        let templates = load_collection(&data_path.join(TEMPLATES_FILE), |f: TemplateFile| f.templates);
        let regulatory = load_collection(&data_path.join(REGULATORY_FILE), |f: RegulatoryFile| f.regulatory_data);

        let store = Self {
            data_path: Some(data_path),
            ingredients: RwLock::new(ingredients.unwrap_or_default()),
            peptides: RwLock::new(peptides.unwrap_or_default()),
            templates: RwLock::new(templates.unwrap_or_default()),
            regulatory: RwLock::new(regulatory.unwrap_or_default()),
        };
        store.seed_missing()?;
        Ok(store)
    }

    fn seed_missing(&self) -> Result<()> {
        {
            let mut ingredients = self.ingredients.write().map_err(|_| FormforgeError::LockPoisoned)?;
            if ingredients.is_empty() {
                info!("seeding default ingredients");
                *ingredients = default_ingredients();
                self.save_ingredients(&ingredients)?;
            }
        }
        {
            let mut peptides = self.peptides.write().map_err(|_| FormforgeError::LockPoisoned)?;
            if peptides.is_empty() {
                info!("seeding default peptides");
                *peptides = default_peptides();
                self.save(PEPTIDES_FILE, &PeptideFile {
                    schema_version: SCHEMA_VERSION.to_string(),
                    peptides: peptides.clone(),
                })?;
            }
        }
        {
            let mut templates = self.templates.write().map_err(|_| FormforgeError::LockPoisoned)?;
            if templates.is_empty() {
                info!("seeding default templates");
                *templates = default_templates();
                self.save(TEMPLATES_FILE, &TemplateFile {
                    schema_version: SCHEMA_VERSION.to_string(),
                    templates: templates.clone(),
                })?;
            }
        }
        let mut regulatory = self.regulatory.write().map_err(|_| FormforgeError::LockPoisoned)?;
        if regulatory.is_empty() {
            info!("seeding default regulatory data");
            *regulatory = default_regulatory_data();
            self.save(REGULATORY_FILE, &RegulatoryFile {
                schema_version: SCHEMA_VERSION.to_string(),
                regulatory_data: regulatory.clone(),
            })?;
        }
        Ok(())
    }

    fn save_ingredients(&self, ingredients: &[Ingredient]) -> Result<()> {
        self.save(INGREDIENTS_FILE, &IngredientFile {
            schema_version: SCHEMA_VERSION.to_string(),
            ingredients: ingredients.to_vec(),
        })
    }

    fn save<T: Serialize>(&self, file_name: &str, value: &T) -> Result<()> {
        let Some(data_path) = &self.data_path else {
            return Ok(());
        };
        let path = data_path.join(file_name);
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&path, content).map_err(|e| FormforgeError::FileIO(path.display().to_string(), e))?;
        debug!(path = %path.display(), "saved collection");
        Ok(())
    }
}

/// Reads one wrapper file and extracts its collection. Failures are logged
/// and reported as `None` so the caller can fall back to an empty collection.
fn load_collection<F, T, E>(path: &Path, extract: E) -> Option<T>
where
    F: DeserializeOwned,
    E: Fn(F) -> T,
{
    if !path.is_file() {
        debug!(path = %path.display(), "data file not present");
        return None;
    }
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str::<F>(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(file) => Some(extract(file)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load data file, starting empty");
            None
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    // Readers only clone data out, so a poisoned lock still holds a usable snapshot.
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn validate_new_ingredient(ingredient: &IngredientAdd) -> Result<()> {
    for (field, value) in [
        ("name", &ingredient.name),
        ("inci_name", &ingredient.inci_name),
        ("category", &ingredient.category),
    ] {
        if value.trim().is_empty() {
            return Err(FormforgeError::InvalidIngredient(format!("{} must not be empty", field)));
        }
    }
    for (field, value) in [
        ("min_concentration", ingredient.min_concentration),
        ("max_concentration", ingredient.max_concentration),
    ] {
        if let Some(v) = value {
            if !(0.0..=100.0).contains(&v) {
                return Err(FormforgeError::InvalidIngredient(format!(
                    "{} must be within [0, 100], got {}",
                    field, v
                )));
            }
        }
    }
    if let (Some(min), Some(max)) = (ingredient.min_concentration, ingredient.max_concentration) {
        if max < min {
            return Err(FormforgeError::InvalidIngredient(
                "max_concentration must be >= min_concentration".to_string(),
            ));
        }
    }
    if let Some(cost) = ingredient.cost_per_kg {
        if !(cost > 0.0) {
            return Err(FormforgeError::InvalidIngredient(format!("cost_per_kg must be positive, got {}", cost)));
        }
    }
    Ok(())
}

impl IngredientRepository for JsonStore {
    fn get_templates(&self, product_type: Option<ProductType>) -> Vec<FormularyTemplate> {
        read(&self.templates)
            .iter()
            .filter(|t| product_type.map_or(true, |p| t.product_type == p))
            .cloned()
            .collect()
    }

    fn get_ingredient_by_id(&self, id: &str) -> Option<Ingredient> {
        read(&self.ingredients).iter().find(|i| i.id == id).cloned()
    }

    fn get_ingredients(&self, filter: &IngredientFilter) -> Vec<Ingredient> {
        read(&self.ingredients)
            .iter()
            .filter(|i| filter.matches(i))
            .take(filter.limit)
            .cloned()
            .collect()
    }

    fn get_peptides(&self) -> Vec<PeptideData> {
        read(&self.peptides).clone()
    }

    fn get_regulatory_data(&self) -> RegulatoryData {
        read(&self.regulatory).clone()
    }

    fn add_ingredient(&self, ingredient: IngredientAdd) -> Result<String> {
        validate_new_ingredient(&ingredient)?;

        let mut ingredients = self.ingredients.write().map_err(|_| FormforgeError::LockPoisoned)?;
        let inci = ingredient.inci_name.trim().to_lowercase();
        if ingredients.iter().any(|i| i.inci_name.trim().to_lowercase() == inci) {
            return Err(FormforgeError::DuplicateIngredient(ingredient.inci_name));
        }

        let id = Uuid::new_v4().to_string();
        ingredients.push(ingredient.into_ingredient(id.clone()));
        if let Err(e) = self.save_ingredients(&ingredients) {
            ingredients.pop();
            return Err(e);
        }
        info!(id = %id, "added ingredient");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_schemas::ingredient::IngredientFunction;
    use std::{sync::Arc, thread};

    fn new_ingredient(name: &str, inci: &str) -> IngredientAdd {
        IngredientAdd {
            name: name.to_string(),
            inci_name: inci.to_string(),
            cas_number: None,
            function: IngredientFunction::Moisturiser,
            category: "humectant".to_string(),
            max_concentration: Some(5.0),
            min_concentration: Some(1.0),
            prohibited_in_eu: false,
            restricted_in_eu: false,
            cost_per_kg: Some(3.0),
            natural_origin: true,
        }
    }

    #[test]
    fn open_seeds_an_empty_directory_and_reloads_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        assert_eq!(store.get_ingredients(&IngredientFilter::all()).len(), 6);
        for file in [INGREDIENTS_FILE, PEPTIDES_FILE, TEMPLATES_FILE, REGULATORY_FILE] {
            assert!(dir.path().join(file).is_file(), "{} was not written", file);
        }

        let id = store.add_ingredient(new_ingredient("Panthenol", "Panthenol")).unwrap();
        drop(store);

        let reopened = JsonStore::open(dir.path()).unwrap();
        let ingredients = reopened.get_ingredients(&IngredientFilter::all());
        assert_eq!(ingredients.len(), 7);
        assert_eq!(ingredients.last().map(|i| i.id.as_str()), Some(id.as_str()));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INGREDIENTS_FILE), "{ not json").unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        assert!(store.get_ingredient_by_id("water").is_some());
    }

    #[test]
    fn filters_apply_category_function_and_limit() {
        let store = JsonStore::in_memory();
        let actives = store.get_ingredients(&IngredientFilter {
            category: Some("active".to_string()),
            ..IngredientFilter::default()
        });
        let ids: Vec<_> = actives.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["hyaluronic_acid", "vitamin_c"]);

        let preservatives = store.get_ingredients(&IngredientFilter {
            function: Some(IngredientFunction::Preservative),
            ..IngredientFilter::default()
        });
        assert_eq!(preservatives.len(), 1);

        let limited = store.get_ingredients(&IngredientFilter {
            limit: 2,
            ..IngredientFilter::default()
        });
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn templates_filter_by_product_type() {
        let store = JsonStore::in_memory();
        let serums = store.get_templates(Some(ProductType::Serum));
        assert_eq!(serums.len(), 1);
        assert_eq!(serums[0].id, "anti_aging_serum");
        assert!(store.get_templates(Some(ProductType::Toner)).is_empty());
        assert_eq!(store.get_templates(None).len(), 2);
    }

    #[test]
    fn duplicate_inci_name_is_rejected_case_insensitively() {
        let store = JsonStore::in_memory();
        let before = store.get_ingredients(&IngredientFilter::all());

        let err = store.add_ingredient(new_ingredient("Vegetable Glycerin", "GLYCERIN")).unwrap_err();
        assert!(matches!(err, FormforgeError::DuplicateIngredient(_)));
        assert_eq!(store.get_ingredients(&IngredientFilter::all()), before);
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let store = JsonStore::in_memory();
        let mut inverted = new_ingredient("Squalane", "Squalane");
        inverted.min_concentration = Some(8.0);
        assert!(matches!(store.add_ingredient(inverted), Err(FormforgeError::InvalidIngredient(_))));

        let mut blank = new_ingredient("Squalane", "  ");
        blank.min_concentration = None;
        assert!(matches!(store.add_ingredient(blank), Err(FormforgeError::InvalidIngredient(_))));
    }

    #[test]
    fn concurrent_adds_of_the_same_inci_name_store_one_record() {
        let store = Arc::new(JsonStore::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.add_ingredient(new_ingredient(&format!("Squalane {}", i), "Squalane")))
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(successes, 1);
        let squalane = store
            .get_ingredients(&IngredientFilter::all())
            .into_iter()
            .filter(|i| i.inci_name == "Squalane")
            .count();
        assert_eq!(squalane, 1);
    }
}
