use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "formforge",
    version,
    about = "Generate, check and optimize cosmetic formulations against UK/EU rules."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a YAML configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding ingredients.json, peptides.json, formulary.json and regulatory_data.json
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a formulation from a request file (YAML or JSON).
    Formulate(FormulateArgs),
    /// Check an existing formulation for UKES/EU compliance.
    Check {
        /// Formulation file with `ingredients: [{ingredient_id, concentration}]`
        #[arg(value_name = "PATH")]
        formulation: PathBuf,
    },
    /// Improve an existing formulation against one objective.
    Optimize(OptimizeArgs),
    /// List or register ingredients.
    #[command(subcommand)]
    Ingredients(IngredientsCommand),
    /// List formulary templates.
    Templates {
        /// Only templates for this product type
        #[arg(long, value_name = "TYPE")]
        product_type: Option<String>,
    },
    /// List peptides.
    Peptides,
    /// Show the regulatory reference data.
    Regulatory,
}

#[derive(Args, Debug)]
pub struct FormulateArgs {
    /// Request file (YAML or JSON)
    #[arg(value_name = "PATH")]
    pub request: PathBuf,

    /// Write the response here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Render a composition chart (PNG)
    #[arg(long, value_name = "PATH")]
    pub chart: Option<PathBuf>,

    /// Append a summary row to this CSV run log
    #[arg(long, value_name = "PATH")]
    pub run_log: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Optimization request file (YAML or JSON)
    #[arg(value_name = "PATH")]
    pub request: PathBuf,

    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    pub chart: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    pub run_log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum IngredientsCommand {
    /// List stored ingredients.
    List {
        #[arg(long)]
        category: Option<String>,
        /// Ingredient function, e.g. `active` or `preservative`
        #[arg(long)]
        function: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Register a new ingredient from a YAML or JSON file.
    Add {
        #[arg(value_name = "PATH")]
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "formforge",
            "formulate",
            "request.yaml",
            "--chart",
            "out.png",
            "--data-dir",
            "/tmp/data",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        match cli.command {
            Commands::Formulate(args) => {
                assert_eq!(args.request, PathBuf::from("request.yaml"));
                assert_eq!(args.chart, Some(PathBuf::from("out.png")));
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn ingredient_listing_defaults_to_one_hundred() {
        let cli = Cli::try_parse_from(["formforge", "ingredients", "list", "--function", "active"]).unwrap();
        match cli.command {
            Commands::Ingredients(IngredientsCommand::List { function, limit, category }) => {
                assert_eq!(function.as_deref(), Some("active"));
                assert_eq!(limit, 100);
                assert!(category.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
