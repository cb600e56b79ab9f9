use formforge_schemas::{
    compliance::RegulatoryData,
    formulation::ProductType,
    ingredient::{Ingredient, IngredientFunction, PhRange},
    peptide::PeptideData,
    template::{BaseIngredient, CostRange, FormularyTemplate},
};
use std::collections::BTreeMap;

/// The ingredient set a fresh data directory is seeded with.
pub fn default_ingredients() -> Vec<Ingredient> {
    let mut phenoxyethanol = Ingredient::new(
        "phenoxyethanol",
        "Phenoxyethanol",
        "Phenoxyethanol",
        IngredientFunction::Preservative,
        "preservative",
    )
    .with_bounds(0.1, 1.0)
    .with_cost(12.50);
    phenoxyethanol.restricted_in_eu = true;

    let mut vitamin_c = Ingredient::new("vitamin_c", "Vitamin C", "Ascorbic Acid", IngredientFunction::Antioxidant, "active")
        .with_bounds(0.1, 20.0)
        .with_cost(45.00);
    vitamin_c.stability_notes = Some("Light and air sensitive".to_string());

    vec![
        Ingredient::new("water", "Purified Water", "Aqua", IngredientFunction::Solvent, "base")
            .with_bounds(10.0, 95.0)
            .with_cost(0.50)
            .natural(),
        Ingredient::new("glycerin", "Glycerin", "Glycerin", IngredientFunction::Moisturiser, "humectant")
            .with_bounds(0.5, 10.0)
            .with_cost(2.50)
            .natural(),
        Ingredient::new("cetyl_alcohol", "Cetyl Alcohol", "Cetyl Alcohol", IngredientFunction::Emulsifier, "emulsifier")
            .with_bounds(0.5, 5.0)
            .with_cost(4.20)
            .natural(),
        phenoxyethanol,
        Ingredient::new("hyaluronic_acid", "Hyaluronic Acid", "Sodium Hyaluronate", IngredientFunction::Active, "active")
            .with_bounds(0.01, 2.0)
            .with_cost(350.00)
            .natural(),
        vitamin_c,
    ]
}

pub fn default_peptides() -> Vec<PeptideData> {
    vec![
        PeptideData {
            id: "matrixyl_3000".to_string(),
            name: "Matrixyl 3000".to_string(),
            sequence: "Pal-GHK + Pal-GQPR".to_string(),
            molecular_weight: 578.73,
            function: "anti-aging".to_string(),
            stability_ph_range: PhRange { min: 5.0, max: 7.0 },
            max_concentration: 8.0,
            cost_per_gram: 125.00,
            efficacy_studies: vec![
                "Reduces wrinkles by 45% in 8 weeks".to_string(),
                "Increases collagen synthesis by 117%".to_string(),
            ],
            novel_ingredient: false,
            safety_assessment_required: true,
        },
        PeptideData {
            id: "argireline".to_string(),
            name: "Argireline".to_string(),
            sequence: "Ac-EEMQRR-NH2".to_string(),
            molecular_weight: 888.99,
            function: "expression_lines".to_string(),
            stability_ph_range: PhRange { min: 4.0, max: 8.0 },
            max_concentration: 10.0,
            cost_per_gram: 280.00,
            efficacy_studies: vec!["Reduces expression lines by 17% in 15 days".to_string()],
            novel_ingredient: false,
            safety_assessment_required: true,
        },
    ]
}

pub fn default_templates() -> Vec<FormularyTemplate> {
    let base = |id: &str, concentration: f64| BaseIngredient {
        ingredient_id: id.to_string(),
        concentration,
    };
    vec![
        FormularyTemplate {
            id: "basic_cream".to_string(),
            name: "Basic Moisturizing Cream".to_string(),
            product_type: ProductType::Cream,
            base_ingredients: vec![
                base("water", 65.0),
                base("glycerin", 5.0),
                base("cetyl_alcohol", 3.0),
                base("phenoxyethanol", 0.5),
            ],
            variable_ingredients: vec!["hyaluronic_acid".to_string(), "vitamin_c".to_string()],
            instructions: "Heat oil and water phases separately to 70°C. Add oil phase to water phase with mixing."
                .to_string(),
            typical_cost_range: CostRange { min: 8.50, max: 25.00 },
            stability_notes: None,
        },
        FormularyTemplate {
            id: "anti_aging_serum".to_string(),
            name: "Anti-Aging Serum".to_string(),
            product_type: ProductType::Serum,
            base_ingredients: vec![base("water", 80.0), base("glycerin", 10.0), base("phenoxyethanol", 0.3)],
            variable_ingredients: vec![
                "hyaluronic_acid".to_string(),
                "matrixyl_3000".to_string(),
                "argireline".to_string(),
            ],
            instructions: "Mix all ingredients at room temperature. Adjust pH to 6.0-6.5.".to_string(),
            typical_cost_range: CostRange { min: 35.00, max: 120.00 },
            stability_notes: None,
        },
    ]
}

pub fn default_regulatory_data() -> RegulatoryData {
    RegulatoryData {
        prohibited_substances: vec![
            "hydroquinone".to_string(),
            "mercury_compounds".to_string(),
            "lead_compounds".to_string(),
        ],
        restricted_concentrations: BTreeMap::from([
            ("phenoxyethanol".to_string(), 1.0),
            ("benzyl_alcohol".to_string(), 1.0),
            ("salicylic_acid".to_string(), 2.0),
        ]),
        cpnp_requirements: BTreeMap::from([
            ("safety_assessment".to_string(), true),
            ("product_information_file".to_string(), true),
            ("responsible_person".to_string(), true),
        ]),
        labeling_requirements: vec![
            "INCI names in descending order".to_string(),
            "Warnings and precautions".to_string(),
            "Batch number and expiry date".to_string(),
            "Net content".to_string(),
            "Function of product".to_string(),
        ],
    }
}
