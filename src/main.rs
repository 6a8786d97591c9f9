//! DSP Production Calculator
//!
//! A production chain calculator for Dyson Sphere Program.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use regex::Regex;
use rusqlite::Connection;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dsp_calculator::calculator::{Requirements, Resolver};
use dsp_calculator::catalog::{self, Catalog};
use dsp_calculator::db;
use dsp_calculator::index::RecipeIndex;
use dsp_calculator::input;
use dsp_calculator::models::{
    DEFAULT_ASSEMBLER, DEFAULT_CHEMICAL_PLANT, DEFAULT_LAB_HEIGHT, DEFAULT_SMELTER, Facility,
    FacilityChoice, MATRIX_LAB_NAME, OIL_REFINERY_NAME, UserInput,
};
use dsp_calculator::report;

#[derive(Parser)]
#[command(name = "dsp-calculator")]
#[command(about = "Production chain calculator for Dyson Sphere Program")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "dsp_data.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import recipes, multipliers and materials from a directory of YAML files
    Import {
        /// Directory holding recipes*.yaml, multipliers.yaml and materials.yaml
        data_dir: PathBuf,

        /// Clear existing catalog before importing
        #[arg(long)]
        clear: bool,
    },

    /// Calculate production chain for a target material
    Calc {
        /// Material to produce (e.g., "Electromagnetic Matrix"); prompts when omitted
        material: Option<String>,

        /// Target production rate in items per second
        #[arg(short, long, default_value = "1.0")]
        rate: f64,

        /// Assembler variant
        #[arg(long, default_value = DEFAULT_ASSEMBLER)]
        assembler: String,

        /// Smelter variant
        #[arg(long, default_value = DEFAULT_SMELTER)]
        smelter: String,

        /// Chemical plant variant
        #[arg(long, default_value = DEFAULT_CHEMICAL_PLANT)]
        chemical_plant: String,

        /// Number of stacked matrix labs
        #[arg(long, default_value_t = DEFAULT_LAB_HEIGHT)]
        lab_height: u32,

        /// Show per-ingredient consumption for every material
        #[arg(long)]
        detailed: bool,

        /// Read the catalog from this YAML directory instead of the database
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// List known materials
    ListMaterials {
        /// Only show materials matching this regular expression
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// List building variants and their speed multipliers
    ListBuildings,

    /// Show the recipe producing a material
    Recipe {
        /// Material name
        material: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load the bundled sample catalog
    LoadSample,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dsp_calculator=warn")),
        )
        .init();

    let cli = Cli::parse();

    let conn = Connection::open(&cli.database)?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Import { data_dir, clear } => {
            let catalog = catalog::load_catalog(&data_dir)?;

            if clear {
                println!("Clearing existing catalog...");
                db::clear_catalog(&conn)?;
            }

            db::store_catalog(&conn, &catalog)?;
            info!(dir = %data_dir.display(), recipes = catalog.recipes.len(), "imported catalog");
            println!(
                "Imported {} recipes and {} materials from {}",
                catalog.recipes.len(),
                catalog.materials.len(),
                data_dir.display()
            );
        }

        Commands::Calc {
            material,
            rate,
            assembler,
            smelter,
            chemical_plant,
            lab_height,
            detailed,
            data_dir,
        } => {
            let flags = UserInput {
                material: material.clone().unwrap_or_default(),
                rate,
                assembler,
                smelter,
                chemical_plant,
                lab_height,
            };
            let user_input = match material {
                Some(_) => flags,
                None => {
                    input::prompt_user_input(&mut io::stdin().lock(), &mut io::stdout(), &flags)?
                }
            };

            let catalog = calc_catalog(&conn, data_dir.as_deref())?;

            let requirements = calculate(&catalog, &user_input, detailed)?;

            println!("{}", report::format_requirements(&requirements));
            println!(
                "{}",
                report::summarize(&requirements, &user_input.material, user_input.rate)
            );
        }

        Commands::ListMaterials { filter } => {
            let catalog = db::load_catalog(&conn)?;
            let filter = filter.as_deref().map(Regex::new).transpose()?;
            let index = RecipeIndex::build(&catalog.recipes);

            let materials: Vec<_> = catalog
                .known_materials()
                .into_iter()
                .filter(|m| filter.as_ref().is_none_or(|re| re.is_match(m)))
                .collect();

            if materials.is_empty() {
                println!("No materials found. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<32} {}", "Material", "Produced in");
                println!("{}", "-".repeat(48));
                for material in materials {
                    let source = index
                        .get(material)
                        .map_or("(raw)", |recipe| recipe.facility.as_str());
                    println!("{:<32} {}", material, source);
                }
            }
        }

        Commands::ListBuildings => {
            let multipliers = db::load_multipliers(&conn)?;
            println!("{:<16} {:<28} {:>10}", "Class", "Building", "Multiplier");
            println!("{}", "-".repeat(56));
            for facility in [Facility::Assembler, Facility::Smelter, Facility::ChemicalPlant] {
                for variant in multipliers.table(facility).unwrap_or_default() {
                    println!(
                        "{:<16} {:<28} {:>10}",
                        facility.as_str(),
                        variant.name,
                        variant.multiplier
                    );
                }
            }
            println!("{:<16} {:<28} {:>10}", Facility::MatrixLab.as_str(), MATRIX_LAB_NAME, "lab height");
            println!("{:<16} {:<28} {:>10}", Facility::OilRefinery.as_str(), OIL_REFINERY_NAME, 1);
        }

        Commands::Recipe { material } => {
            let recipes = db::load_recipes(&conn)?;
            let index = RecipeIndex::build(&recipes);

            if index.is_empty() {
                println!("No recipes in database. Run 'import' or 'load-sample' first.");
            } else if let Some(recipe) = index.get(&material) {
                println!("Recipe for {}", material);
                println!("  Facility: {}", recipe.facility);
                println!("  Duration: {}s", recipe.duration);
                println!("  Inputs:");
                for i in &recipe.inputs {
                    println!("    {} x{}", i.name, i.amount);
                }
                println!("  Outputs:");
                for o in &recipe.outputs {
                    println!("    {} x{}", o.name, o.amount);
                }
            } else {
                println!("'{}' has no enabled recipe (raw material)", material);
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }
    }

    Ok(())
}

/// Catalog for a calculation, from YAML files when a directory is given
fn calc_catalog(conn: &Connection, data_dir: Option<&Path>) -> Result<Catalog> {
    let catalog = match data_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "reading catalog from yaml");
            catalog::load_catalog(dir)?
        }
        None => db::load_catalog(conn)?,
    };
    if catalog.recipes.is_empty() {
        bail!("No recipes in catalog. Run 'import' or 'load-sample' first, or pass --data-dir.");
    }
    Ok(catalog)
}

/// Validate the request and resolve it against the catalog
fn calculate(catalog: &Catalog, user_input: &UserInput, detailed: bool) -> Result<Requirements> {
    input::validate(user_input, catalog)?;
    let facilities = FacilityChoice::resolve(user_input, &catalog.multipliers)?;
    let index = RecipeIndex::build(&catalog.recipes);

    info!(
        material = %user_input.material,
        rate = user_input.rate,
        recipes = index.len(),
        "calculating production chain"
    );

    let requirements = Resolver::new(&index, &facilities)
        .detailed(detailed)
        .resolve(&user_input.material, user_input.rate)?;
    Ok(requirements)
}

const SAMPLE_RECIPES: &str = include_str!("../data/recipes.yaml");
const SAMPLE_MULTIPLIERS: &str = include_str!("../data/multipliers.yaml");
const SAMPLE_MATERIALS: &str = include_str!("../data/materials.yaml");

fn sample_catalog() -> Result<Catalog> {
    Ok(Catalog {
        recipes: catalog::parse_recipes(Path::new("data/recipes.yaml"), SAMPLE_RECIPES)?,
        multipliers: catalog::parse_multipliers(
            Path::new("data/multipliers.yaml"),
            SAMPLE_MULTIPLIERS,
        )?,
        materials: catalog::parse_materials(Path::new("data/materials.yaml"), SAMPLE_MATERIALS)?,
    })
}

/// Load the bundled DSP catalog for trying things out without data files
fn load_sample_data(conn: &Connection) -> Result<()> {
    let catalog = sample_catalog()?;

    db::clear_catalog(conn)?;
    db::store_catalog(conn, &catalog)?;

    println!("Loaded {} sample recipes", catalog.recipes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_catalog_parses() {
        let catalog = sample_catalog().unwrap();
        assert!(!catalog.recipes.is_empty());
        assert!(catalog.recipes.iter().any(|r| !r.enabled));
        assert_eq!(catalog.multipliers.assembler.len(), 3);
    }

    #[test]
    fn sample_electromagnetic_matrix_chain() {
        let catalog = sample_catalog().unwrap();
        let requirements =
            calculate(&catalog, &UserInput::new("Electromagnetic Matrix"), false).unwrap();

        assert_eq!(requirements.get("Iron Ore").unwrap().rate, 2.0);
        assert_eq!(requirements.get("Copper Ore").unwrap().rate, 1.0);

        let summary = report::summarize(&requirements, "Electromagnetic Matrix", 1.0);
        let count = |name: &str| {
            summary
                .building_counts
                .iter()
                .find(|(building, _)| building == name)
                .map(|(_, count)| *count)
                .unwrap()
        };
        assert!((count("Smelter") - 3.5).abs() < 1e-9);
        assert!((count("Assembling Machine Mk.1") - 4.0 / 3.0).abs() < 1e-9);
        assert!((count("Matrix Lab") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disabled_refinery_recipe_does_not_produce_graphite() {
        let catalog = sample_catalog().unwrap();
        let requirements = calculate(&catalog, &UserInput::new("Energy Matrix"), true).unwrap();

        let graphite = requirements.get("Energetic Graphite").unwrap();
        assert_eq!(graphite.building.as_ref().unwrap().name, "Smelter");
        assert_eq!(requirements.get("Coal").unwrap().rate, 4.0);
    }

    #[test]
    fn sample_catalog_round_trips_through_database() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        load_sample_data(&conn).unwrap();
        assert_eq!(db::load_catalog(&conn).unwrap(), sample_catalog().unwrap());
    }

    #[test]
    fn calc_reads_yaml_directory_without_database() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("recipes.yaml"), SAMPLE_RECIPES).unwrap();
        std::fs::write(dir.path().join("multipliers.yaml"), SAMPLE_MULTIPLIERS).unwrap();
        std::fs::write(dir.path().join("materials.yaml"), SAMPLE_MATERIALS).unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();

        let catalog = calc_catalog(&conn, Some(dir.path())).unwrap();
        assert_eq!(catalog, sample_catalog().unwrap());
        assert!(db::load_recipes(&conn).unwrap().is_empty());
    }

    #[test]
    fn calc_without_catalog_fails() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let err = calc_catalog(&conn, None).unwrap_err();
        assert!(err.to_string().contains("No recipes"));
    }

    #[test]
    fn unknown_material_is_rejected_before_resolution() {
        let catalog = sample_catalog().unwrap();
        let err = calculate(&catalog, &UserInput::new("Dark Fog Matrix"), false).unwrap_err();
        assert!(err.to_string().contains("unknown material"));
    }
}
