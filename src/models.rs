//! Data models for DSP recipes and buildings

use std::fmt;
use std::str::FromStr;

use crate::error::CalcError;

/// A quantity of a named material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAmount {
    pub name: String,
    pub amount: f64,
}

impl MaterialAmount {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.name.clone(), self.amount * factor)
    }

    /// Add two amounts of the same material
    pub fn combine(&self, other: &MaterialAmount) -> Result<Self, CalcError> {
        if self.name != other.name {
            return Err(CalcError::MaterialMismatch {
                left: self.name.clone(),
                right: other.name.clone(),
            });
        }
        Ok(Self::new(self.name.clone(), self.amount + other.amount))
    }
}

/// Production building class a recipe runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facility {
    Assembler,
    Smelter,
    ChemicalPlant,
    MatrixLab,
    OilRefinery,
}

pub const MATRIX_LAB_NAME: &str = "Matrix Lab";
pub const OIL_REFINERY_NAME: &str = "Oil Refinery";

impl Facility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facility::Assembler => "Assembler",
            Facility::Smelter => "Smelter",
            Facility::ChemicalPlant => "Chemical Plant",
            Facility::MatrixLab => MATRIX_LAB_NAME,
            Facility::OilRefinery => OIL_REFINERY_NAME,
        }
    }

    /// Speed multiplier of the chosen building for this class
    pub fn multiplier(&self, choice: &FacilityChoice) -> f64 {
        match self {
            Facility::Assembler => choice.assembler.multiplier,
            Facility::Smelter => choice.smelter.multiplier,
            Facility::ChemicalPlant => choice.chemical_plant.multiplier,
            Facility::MatrixLab => f64::from(choice.lab_height),
            Facility::OilRefinery => 1.0,
        }
    }

    /// Display name of the chosen building for this class
    pub fn building_name<'a>(&self, choice: &'a FacilityChoice) -> &'a str {
        match self {
            Facility::Assembler => &choice.assembler.name,
            Facility::Smelter => &choice.smelter.name,
            Facility::ChemicalPlant => &choice.chemical_plant.name,
            Facility::MatrixLab => MATRIX_LAB_NAME,
            Facility::OilRefinery => OIL_REFINERY_NAME,
        }
    }
}

impl FromStr for Facility {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Assembler" => Ok(Facility::Assembler),
            "Smelter" => Ok(Facility::Smelter),
            "Chemical Plant" => Ok(Facility::ChemicalPlant),
            "Matrix Lab" => Ok(Facility::MatrixLab),
            "Oil Refinery" => Ok(Facility::OilRefinery),
            other => Err(CalcError::UnknownFacility(other.to_string())),
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub inputs: Vec<MaterialAmount>,
    pub outputs: Vec<MaterialAmount>,
    pub facility: Facility,
    pub duration: f64, // seconds per craft cycle
    pub enabled: bool,
}

impl Recipe {
    pub fn output(&self, material: &str) -> Option<&MaterialAmount> {
        self.outputs.iter().find(|o| o.name == material)
    }
}

/// A concrete building for a facility class, e.g. "Assembling Machine Mk.2"
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingVariant {
    pub name: String,
    pub multiplier: f64,
}

/// Speed multiplier tables for the facility classes that have variants
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Multipliers {
    pub assembler: Vec<BuildingVariant>,
    pub smelter: Vec<BuildingVariant>,
    pub chemical_plant: Vec<BuildingVariant>,
}

impl Multipliers {
    /// Variant table for a class, `None` for classes without variants
    pub fn table(&self, facility: Facility) -> Option<&[BuildingVariant]> {
        match facility {
            Facility::Assembler => Some(&self.assembler),
            Facility::Smelter => Some(&self.smelter),
            Facility::ChemicalPlant => Some(&self.chemical_plant),
            Facility::MatrixLab | Facility::OilRefinery => None,
        }
    }

    pub fn table_mut(&mut self, facility: Facility) -> Option<&mut Vec<BuildingVariant>> {
        match facility {
            Facility::Assembler => Some(&mut self.assembler),
            Facility::Smelter => Some(&mut self.smelter),
            Facility::ChemicalPlant => Some(&mut self.chemical_plant),
            Facility::MatrixLab | Facility::OilRefinery => None,
        }
    }

    pub fn lookup(&self, facility: Facility, variant: &str) -> Option<&BuildingVariant> {
        self.table(facility)?.iter().find(|v| v.name == variant)
    }
}

pub const DEFAULT_ASSEMBLER: &str = "Assembling Machine Mk.1";
pub const DEFAULT_SMELTER: &str = "Smelter";
pub const DEFAULT_CHEMICAL_PLANT: &str = "Chemical Plant";
pub const DEFAULT_LAB_HEIGHT: u32 = 3;

/// What the user asked for
#[derive(Debug, Clone, PartialEq)]
pub struct UserInput {
    pub material: String,
    pub rate: f64,
    pub assembler: String,
    pub smelter: String,
    pub chemical_plant: String,
    pub lab_height: u32,
}

impl UserInput {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            rate: 1.0,
            assembler: DEFAULT_ASSEMBLER.to_string(),
            smelter: DEFAULT_SMELTER.to_string(),
            chemical_plant: DEFAULT_CHEMICAL_PLANT.to_string(),
            lab_height: DEFAULT_LAB_HEIGHT,
        }
    }
}

/// Chosen building per facility class with its multiplier already looked up
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityChoice {
    pub assembler: BuildingVariant,
    pub smelter: BuildingVariant,
    pub chemical_plant: BuildingVariant,
    pub lab_height: u32,
}

impl FacilityChoice {
    pub fn resolve(input: &UserInput, multipliers: &Multipliers) -> Result<Self, CalcError> {
        let pick = |facility: Facility, variant: &str| {
            multipliers
                .lookup(facility, variant)
                .cloned()
                .ok_or_else(|| CalcError::VariantNotFound {
                    facility: facility.to_string(),
                    variant: variant.to_string(),
                })
        };

        Ok(Self {
            assembler: pick(Facility::Assembler, &input.assembler)?,
            smelter: pick(Facility::Smelter, &input.smelter)?,
            chemical_plant: pick(Facility::ChemicalPlant, &input.chemical_plant)?,
            lab_height: input.lab_height,
        })
    }
}
