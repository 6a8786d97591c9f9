//! Production chain calculator logic
//!
//! Walks the recipe graph depth-first from a target material, scaling each
//! ingredient's rate by the producing recipe's batch size and folding every
//! visited material into one accumulated [`Requirements`] map.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::CalcError;
use crate::index::RecipeIndex;
use crate::models::{FacilityChoice, MaterialAmount};

const MAX_DEPTH: usize = 64; // Prevent infinite recursion on cyclic catalogs

/// Aggregated demand for one material
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementForMaterial {
    pub rate: f64,
    /// Building type and count producing this material, `None` for raw inputs
    pub building: Option<MaterialAmount>,
    /// Per-ingredient consumption rates, only filled for detailed queries
    pub input: Option<Vec<MaterialAmount>>,
}

impl RequirementForMaterial {
    pub fn raw(rate: f64, detailed: bool) -> Self {
        Self {
            rate,
            building: None,
            input: detailed.then(Vec::new),
        }
    }

    pub fn is_raw(&self) -> bool {
        self.building.is_none()
    }

    /// Rates and building counts add; the incoming building name wins.
    /// On error `self` is left untouched.
    fn absorb(&mut self, material: &str, incoming: RequirementForMaterial) -> Result<(), CalcError> {
        let input = match (&self.input, incoming.input) {
            (None, None) => None,
            (Some(existing), Some(incoming)) if existing.len() == incoming.len() => Some(
                existing
                    .iter()
                    .zip(&incoming)
                    .map(|(a, b)| a.combine(b))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            (existing, incoming) => {
                return Err(CalcError::InputBreakdownMismatch {
                    material: material.to_string(),
                    existing: existing.as_ref().map_or(0, Vec::len),
                    incoming: incoming.as_ref().map_or(0, Vec::len),
                });
            }
        };

        let building = match (self.building.take(), incoming.building) {
            (Some(existing), Some(incoming)) => Some(MaterialAmount::new(
                incoming.name,
                existing.amount + incoming.amount,
            )),
            (existing, incoming) => incoming.or(existing),
        };

        self.rate += incoming.rate;
        self.building = building;
        self.input = input;
        Ok(())
    }
}

/// Requirements keyed by material, kept in first-seen order
#[derive(Debug, Clone, Default)]
pub struct Requirements {
    entries: Vec<(String, RequirementForMaterial)>,
    slots: HashMap<String, usize>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(material: &str, requirement: RequirementForMaterial) -> Self {
        let mut requirements = Self::new();
        requirements.insert_new(material, requirement);
        requirements
    }

    pub fn get(&self, material: &str) -> Option<&RequirementForMaterial> {
        self.slots.get(material).map(|&slot| &self.entries[slot].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RequirementForMaterial)> {
        self.entries.iter().map(|(name, req)| (name.as_str(), req))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a material or fold it into the existing entry
    pub fn merge_entry(
        &mut self,
        material: &str,
        requirement: RequirementForMaterial,
    ) -> Result<(), CalcError> {
        match self.slots.get(material) {
            Some(&slot) => self.entries[slot].1.absorb(material, requirement),
            None => {
                self.insert_new(material, requirement);
                Ok(())
            }
        }
    }

    /// Merge several maps, walking them in order
    pub fn merge<I>(maps: I) -> Result<Self, CalcError>
    where
        I: IntoIterator<Item = Requirements>,
    {
        let mut merged = Self::new();
        for map in maps {
            for (material, requirement) in map.entries {
                merged.merge_entry(&material, requirement)?;
            }
        }
        Ok(merged)
    }

    fn insert_new(&mut self, material: &str, requirement: RequirementForMaterial) {
        self.slots.insert(material.to_string(), self.entries.len());
        self.entries.push((material.to_string(), requirement));
    }
}

// Order of first appearance is a presentation detail, not part of equality.
impl PartialEq for Requirements {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(material, req)| other.get(material) == Some(req))
    }
}

/// Resolves a target material into the full set of requirements
pub struct Resolver<'a> {
    index: &'a RecipeIndex,
    facilities: &'a FacilityChoice,
    detailed: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a RecipeIndex, facilities: &'a FacilityChoice) -> Self {
        Self {
            index,
            facilities,
            detailed: false,
        }
    }

    /// Also record the per-ingredient breakdown for every produced material
    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    /// Calculate everything needed to sustain `rate` units of `material`
    /// per second. Inputs are assumed to be validated already.
    pub fn resolve(&self, material: &str, rate: f64) -> Result<Requirements, CalcError> {
        let mut requirements = Requirements::new();
        self.resolve_into(material, rate, 0, &mut requirements)?;
        debug!(
            material,
            rate,
            materials = requirements.len(),
            "resolved production chain"
        );
        Ok(requirements)
    }

    fn resolve_into(
        &self,
        material: &str,
        rate: f64,
        depth: usize,
        acc: &mut Requirements,
    ) -> Result<(), CalcError> {
        if depth > MAX_DEPTH {
            return Err(CalcError::DepthExceeded(material.to_string()));
        }

        let Some(recipe) = self.index.get(material) else {
            trace!(material, rate, "raw material");
            return acc.merge_entry(material, RequirementForMaterial::raw(rate, self.detailed));
        };

        let output = recipe
            .output(material)
            .ok_or_else(|| CalcError::OutputNotFound(material.to_string()))?;
        let batch = output.amount;
        let multiplier = recipe.facility.multiplier(self.facilities);
        ensure_positive(material, "batch amount", batch)?;
        ensure_positive(material, "duration", recipe.duration)?;
        ensure_positive(material, "facility multiplier", multiplier)?;

        let scale = rate / batch;
        for ingredient in &recipe.inputs {
            self.resolve_into(&ingredient.name, scale * ingredient.amount, depth + 1, acc)?;
        }

        let count = rate * recipe.duration / batch / multiplier;
        let building_name = recipe.facility.building_name(self.facilities);
        trace!(material, rate, count, building = building_name, "produced material");

        let input = self
            .detailed
            .then(|| recipe.inputs.iter().map(|i| i.scale(scale)).collect());

        acc.merge_entry(
            material,
            RequirementForMaterial {
                rate,
                building: Some(MaterialAmount::new(building_name, count)),
                input,
            },
        )
    }
}

fn ensure_positive(material: &str, what: &'static str, value: f64) -> Result<(), CalcError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(CalcError::ZeroDivisor {
            material: material.to_string(),
            what,
            value,
        })
    }
}
