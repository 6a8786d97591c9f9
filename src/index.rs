//! Lookup from material name to the enabled recipe that produces it

use std::collections::HashMap;

use crate::models::Recipe;

/// Materials without an entry are raw inputs.
#[derive(Debug, Default)]
pub struct RecipeIndex {
    by_output: HashMap<String, Recipe>,
}

impl RecipeIndex {
    /// Later recipes overwrite earlier ones that declare the same output,
    /// so callers must pass recipes in catalog order.
    pub fn build(recipes: &[Recipe]) -> Self {
        let mut by_output = HashMap::new();
        for recipe in recipes.iter().filter(|r| r.enabled) {
            for output in &recipe.outputs {
                by_output.insert(output.name.clone(), recipe.clone());
            }
        }
        Self { by_output }
    }

    pub fn get(&self, material: &str) -> Option<&Recipe> {
        self.by_output.get(material)
    }

    pub fn contains(&self, material: &str) -> bool {
        self.by_output.contains_key(material)
    }

    pub fn len(&self) -> usize {
        self.by_output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_output.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, material: &str, recipe: Recipe) {
        self.by_output.insert(material.to_string(), recipe);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Facility, MaterialAmount};

    fn recipe(outputs: &[(&str, f64)], duration: f64, enabled: bool) -> Recipe {
        Recipe {
            inputs: vec![MaterialAmount::new("Iron Ore", 1.0)],
            outputs: outputs
                .iter()
                .map(|(name, amount)| MaterialAmount::new(*name, *amount))
                .collect(),
            facility: Facility::Smelter,
            duration,
            enabled,
        }
    }

    #[test]
    fn registers_every_output() {
        let index = RecipeIndex::build(&[recipe(&[("Hydrogen", 1.0), ("Refined Oil", 2.0)], 4.0, true)]);
        assert_eq!(index.len(), 2);
        assert!(index.contains("Hydrogen"));
        assert!(index.contains("Refined Oil"));
    }

    #[test]
    fn skips_disabled_recipes() {
        let index = RecipeIndex::build(&[recipe(&[("Iron Ingot", 1.0)], 1.0, false)]);
        assert!(index.is_empty());
        assert!(index.get("Iron Ingot").is_none());
    }

    #[test]
    fn later_recipe_wins_on_collision() {
        let index = RecipeIndex::build(&[
            recipe(&[("Iron Ingot", 1.0)], 1.0, true),
            recipe(&[("Iron Ingot", 1.0)], 2.0, true),
        ]);
        assert_eq!(index.get("Iron Ingot").unwrap().duration, 2.0);
    }

    #[test]
    fn disabled_recipe_does_not_shadow_enabled_one() {
        let index = RecipeIndex::build(&[
            recipe(&[("Iron Ingot", 1.0)], 1.0, true),
            recipe(&[("Iron Ingot", 1.0)], 2.0, false),
        ]);
        assert_eq!(index.get("Iron Ingot").unwrap().duration, 1.0);
    }

    #[test]
    fn raw_materials_are_absent() {
        let index = RecipeIndex::build(&[recipe(&[("Iron Ingot", 1.0)], 1.0, true)]);
        assert!(!index.contains("Iron Ore"));
    }
}
