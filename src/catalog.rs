//! YAML catalog loading
//!
//! A catalog directory holds one or more `recipes*.yaml` files, a
//! `multipliers.yaml` file with the building variant tables and an optional
//! `materials.yaml` list of known material names.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::CalcError;
use crate::models::{BuildingVariant, Facility, MaterialAmount, Multipliers, Recipe};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    #[error("conflicting catalog files: {a} and {b}")]
    ConflictingFiles { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("invalid recipe #{index} in {file}: {source}")]
    InvalidRecipe {
        file: PathBuf,
        index: usize,
        source: CalcError,
    },

    #[error("multiplier for '{name}' in {file} must be positive, got {value}")]
    InvalidMultiplier {
        file: PathBuf,
        name: String,
        value: f64,
    },

    #[error("failed to scan {dir}: {source}")]
    Walk {
        dir: PathBuf,
        source: walkdir::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct MaterialData {
    name: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct RecipeData {
    input: Vec<MaterialData>,
    output: Vec<MaterialData>,
    building: String,
    duration: f64,
    #[serde(default = "default_true")]
    enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct VariantData {
    name: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct MultipliersData {
    #[serde(rename = "Assembler")]
    assembler: Vec<VariantData>,
    #[serde(rename = "Smelter")]
    smelter: Vec<VariantData>,
    #[serde(rename = "Chemical Plant")]
    chemical_plant: Vec<VariantData>,
}

/// Everything the calculator needs from static data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub recipes: Vec<Recipe>,
    pub multipliers: Multipliers,
    pub materials: Vec<String>,
}

impl Catalog {
    /// Material names a user may ask for. Falls back to every material
    /// mentioned by a recipe when no explicit list was loaded.
    pub fn known_materials(&self) -> BTreeSet<&str> {
        if !self.materials.is_empty() {
            return self.materials.iter().map(String::as_str).collect();
        }
        self.recipes
            .iter()
            .flat_map(|r| r.inputs.iter().chain(&r.outputs))
            .map(|m| m.name.as_str())
            .collect()
    }
}

/// Catalog files found in a data directory
#[derive(Debug, Default)]
pub struct CatalogFiles {
    pub recipes: Vec<PathBuf>,
    pub multipliers: Option<PathBuf>,
    pub materials: Option<PathBuf>,
}

/// Find catalog files under `dir`, recipes sorted by path
pub fn find_catalog_files(dir: &Path) -> Result<CatalogFiles, CatalogError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|source| CatalogError::Walk {
            dir: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_yaml(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut files = CatalogFiles::default();
    for path in paths {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        match stem.as_str() {
            "multipliers" => set_once(&mut files.multipliers, path)?,
            "materials" => set_once(&mut files.materials, path)?,
            s if s.starts_with("recipes") => files.recipes.push(path),
            _ => debug!(path = %path.display(), "ignoring unrelated yaml file"),
        }
    }
    Ok(files)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn set_once(slot: &mut Option<PathBuf>, path: PathBuf) -> Result<(), CatalogError> {
    if let Some(existing) = slot {
        return Err(CatalogError::ConflictingFiles {
            a: existing.clone(),
            b: path,
        });
    }
    *slot = Some(path);
    Ok(())
}

/// Load a whole catalog directory
pub fn load_catalog(dir: &Path) -> Result<Catalog, CatalogError> {
    let files = find_catalog_files(dir)?;
    if files.recipes.is_empty() {
        return Err(CatalogError::MissingRequired {
            file: "recipes.yaml",
            dir: dir.to_path_buf(),
        });
    }
    let multipliers_path = files.multipliers.ok_or_else(|| CatalogError::MissingRequired {
        file: "multipliers.yaml",
        dir: dir.to_path_buf(),
    })?;

    let mut recipes = Vec::new();
    for path in &files.recipes {
        let loaded = parse_recipes(path, &fs::read_to_string(path)?)?;
        debug!(path = %path.display(), recipes = loaded.len(), "loaded recipe file");
        recipes.extend(loaded);
    }

    let multipliers = parse_multipliers(&multipliers_path, &fs::read_to_string(&multipliers_path)?)?;

    let materials = match &files.materials {
        Some(path) => parse_materials(path, &fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    Ok(Catalog {
        recipes,
        multipliers,
        materials,
    })
}

fn from_yaml<T: DeserializeOwned>(source: &Path, text: &str) -> Result<T, CatalogError> {
    serde_yaml::from_str(text).map_err(|err| CatalogError::Parse {
        file: source.to_path_buf(),
        detail: err.to_string(),
    })
}

/// Parse a recipe list, keeping file order
pub fn parse_recipes(source: &Path, text: &str) -> Result<Vec<Recipe>, CatalogError> {
    let data: Vec<RecipeData> = from_yaml(source, text)?;
    data.into_iter()
        .enumerate()
        .map(|(index, recipe)| {
            let facility: Facility =
                recipe
                    .building
                    .parse()
                    .map_err(|err| CatalogError::InvalidRecipe {
                        file: source.to_path_buf(),
                        index,
                        source: err,
                    })?;
            Ok(Recipe {
                inputs: recipe.input.into_iter().map(to_amount).collect(),
                outputs: recipe.output.into_iter().map(to_amount).collect(),
                facility,
                duration: recipe.duration,
                enabled: recipe.enabled,
            })
        })
        .collect()
}

fn to_amount(data: MaterialData) -> MaterialAmount {
    MaterialAmount::new(data.name, data.amount)
}

pub fn parse_multipliers(source: &Path, text: &str) -> Result<Multipliers, CatalogError> {
    let data: MultipliersData = from_yaml(source, text)?;
    let table = |variants: Vec<VariantData>| {
        variants
            .into_iter()
            .map(|v| {
                if v.value > 0.0 {
                    Ok(BuildingVariant {
                        name: v.name,
                        multiplier: v.value,
                    })
                } else {
                    Err(CatalogError::InvalidMultiplier {
                        file: source.to_path_buf(),
                        name: v.name,
                        value: v.value,
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()
    };

    Ok(Multipliers {
        assembler: table(data.assembler)?,
        smelter: table(data.smelter)?,
        chemical_plant: table(data.chemical_plant)?,
    })
}

pub fn parse_materials(source: &Path, text: &str) -> Result<Vec<String>, CatalogError> {
    from_yaml(source, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RECIPES: &str = r#"
- input:
    - name: Iron Ore
      amount: 1
  output:
    - name: Iron Ingot
      amount: 1
  building: Smelter
  duration: 1
  enabled: true
- input:
    - name: Iron Ingot
      amount: 1
  output:
    - name: Gear
      amount: 1
  building: Assembler
  duration: 1
"#;

    const MULTIPLIERS: &str = r#"
Assembler:
  - name: Assembling Machine Mk.1
    value: 0.75
Smelter:
  - name: Smelter
    value: 1
Chemical Plant:
  - name: Chemical Plant
    value: 1
"#;

    fn write(dir: &TempDir, name: &str, text: &str) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn parses_recipes_in_file_order() {
        let recipes = parse_recipes(Path::new("recipes.yaml"), RECIPES).unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].facility, Facility::Smelter);
        assert_eq!(recipes[1].outputs, vec![MaterialAmount::new("Gear", 1.0)]);
        assert!(recipes[1].enabled);
    }

    #[test]
    fn unknown_building_is_rejected() {
        let text = "- {input: [], output: [{name: X, amount: 1}], building: Forge, duration: 1}";
        let err = parse_recipes(Path::new("recipes.yaml"), text).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidRecipe {
                index: 0,
                source: CalcError::UnknownFacility(_),
                ..
            }
        ));
    }

    #[test]
    fn malformed_yaml_reports_file() {
        let err = parse_recipes(Path::new("bad.yaml"), "- input: [").unwrap_err();
        match err {
            CatalogError::Parse { file, .. } => assert_eq!(file, PathBuf::from("bad.yaml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parses_multiplier_tables() {
        let multipliers = parse_multipliers(Path::new("multipliers.yaml"), MULTIPLIERS).unwrap();
        assert_eq!(
            multipliers
                .lookup(Facility::Assembler, "Assembling Machine Mk.1")
                .map(|v| v.multiplier),
            Some(0.75)
        );
        assert!(multipliers.lookup(Facility::Smelter, "Plane Smelter").is_none());
    }

    #[test]
    fn zero_multiplier_is_rejected() {
        let text = MULTIPLIERS.replace("value: 0.75", "value: 0");
        let err = parse_multipliers(Path::new("multipliers.yaml"), &text).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidMultiplier { value, .. } if value == 0.0));
    }

    #[test]
    fn loads_directory_with_split_recipe_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "recipes.yaml", RECIPES);
        write(
            &dir,
            "recipes_extra.yml",
            "- {input: [{name: Gear, amount: 2}], output: [{name: Motor, amount: 1}], building: Assembler, duration: 2}",
        );
        write(&dir, "multipliers.yaml", MULTIPLIERS);
        write(&dir, "notes.yaml", "ignored: true");

        let catalog = load_catalog(dir.path()).unwrap();
        assert_eq!(catalog.recipes.len(), 3);
        assert_eq!(catalog.recipes[2].outputs[0].name, "Motor");
        assert!(catalog.materials.is_empty());
        assert!(catalog.known_materials().contains("Iron Ore"));
        assert!(catalog.known_materials().contains("Motor"));
    }

    #[test]
    fn explicit_materials_list_wins() {
        let dir = TempDir::new().unwrap();
        write(&dir, "recipes.yaml", RECIPES);
        write(&dir, "multipliers.yaml", MULTIPLIERS);
        write(&dir, "materials.yaml", "- Gear\n- Iron Ingot\n");

        let catalog = load_catalog(dir.path()).unwrap();
        let known = catalog.known_materials();
        assert_eq!(known.into_iter().collect::<Vec<_>>(), ["Gear", "Iron Ingot"]);
    }

    #[test]
    fn missing_multipliers_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "recipes.yaml", RECIPES);

        let err = load_catalog(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingRequired {
                file: "multipliers.yaml",
                ..
            }
        ));
    }

    #[test]
    fn duplicate_multiplier_files_conflict() {
        let dir = TempDir::new().unwrap();
        write(&dir, "recipes.yaml", RECIPES);
        write(&dir, "multipliers.yaml", MULTIPLIERS);
        write(&dir, "nested/multipliers.yml", MULTIPLIERS);

        let err = load_catalog(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::ConflictingFiles { .. }));
    }
}
