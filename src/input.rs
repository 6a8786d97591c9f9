//! Collecting and validating what the user wants to produce

use std::io::{BufRead, Write};

use thiserror::Error;

use crate::catalog::Catalog;
use crate::models::{Facility, UserInput};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("unknown material: {0}")]
    UnknownMaterial(String),

    #[error("production rate must be a positive finite number, got {0}")]
    NonPositiveRate(f64),

    #[error("matrix lab height must be positive")]
    NonPositiveLabHeight,

    #[error("{facility} '{variant}' is not one of: {allowed}")]
    UnknownVariant {
        facility: String,
        variant: String,
        allowed: String,
    },

    #[error("invalid {field}: '{value}'")]
    Unparsable { field: &'static str, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Check a request against the catalog before any resolution happens
pub fn validate(input: &UserInput, catalog: &Catalog) -> Result<(), InputError> {
    if !catalog.known_materials().contains(input.material.as_str()) {
        return Err(InputError::UnknownMaterial(input.material.clone()));
    }
    if !input.rate.is_finite() || input.rate <= 0.0 {
        return Err(InputError::NonPositiveRate(input.rate));
    }
    if input.lab_height == 0 {
        return Err(InputError::NonPositiveLabHeight);
    }

    for (facility, variant) in [
        (Facility::Assembler, &input.assembler),
        (Facility::Smelter, &input.smelter),
        (Facility::ChemicalPlant, &input.chemical_plant),
    ] {
        if catalog.multipliers.lookup(facility, variant).is_none() {
            let allowed = catalog
                .multipliers
                .table(facility)
                .unwrap_or_default()
                .iter()
                .map(|v| v.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(InputError::UnknownVariant {
                facility: facility.to_string(),
                variant: variant.clone(),
                allowed,
            });
        }
    }
    Ok(())
}

/// Ask for every field on `reader`. Empty answers keep the value from
/// `defaults`, whose material is ignored.
pub fn prompt_user_input<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    defaults: &UserInput,
) -> Result<UserInput, InputError> {
    let material = ask(reader, writer, "Enter the material you want to produce: ")?;
    let rate = ask(
        reader,
        writer,
        &format!("Enter the production rate (default - {}): ", defaults.rate),
    )?;
    let assembler = ask(
        reader,
        writer,
        &format!("Enter the assembler (default - {}): ", defaults.assembler),
    )?;
    let smelter = ask(
        reader,
        writer,
        &format!("Enter the smelter (default - {}): ", defaults.smelter),
    )?;
    let chemical_plant = ask(
        reader,
        writer,
        &format!("Enter the chemical plant (default - {}): ", defaults.chemical_plant),
    )?;
    let lab_height = ask(
        reader,
        writer,
        &format!("Enter the matrix lab height (default - {}): ", defaults.lab_height),
    )?;

    let mut input = UserInput {
        material,
        ..defaults.clone()
    };
    if !rate.is_empty() {
        input.rate = rate.parse().map_err(|_| InputError::Unparsable {
            field: "production rate",
            value: rate.clone(),
        })?;
    }
    if !assembler.is_empty() {
        input.assembler = assembler;
    }
    if !smelter.is_empty() {
        input.smelter = smelter;
    }
    if !chemical_plant.is_empty() {
        input.chemical_plant = chemical_plant;
    }
    if !lab_height.is_empty() {
        input.lab_height = lab_height.parse().map_err(|_| InputError::Unparsable {
            field: "matrix lab height",
            value: lab_height.clone(),
        })?;
    }
    Ok(input)
}

fn ask<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, prompt: &str) -> Result<String, InputError> {
    write!(writer, "{prompt}")?;
    writer.flush()?;
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
