//! Extension registry.
//!
//! Extra table recipes and linking units are registered here before a
//! [`Decompiler`](crate::engine::Decompiler) is built. The decompiler takes
//! the registry by value, so nothing can be added once a run is possible.

use std::collections::BTreeMap;

use crate::decoder::TableRecipe;
use crate::error::{DecompileError, DecompileResult};
use crate::finalize::LinkingUnit;

/// Recipes for tables without a built-in recipe, and linking units that
/// run after the built-in ones.
#[derive(Default)]
pub struct ExtensionRegistry {
    recipes: BTreeMap<String, Box<dyn TableRecipe>>,
    units: Vec<Box<dyn LinkingUnit>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe under the table it names. One recipe per table.
    pub fn register_recipe<R: TableRecipe + 'static>(&mut self, recipe: R) -> DecompileResult<()> {
        let table = recipe.table().to_string();
        if self.recipes.contains_key(&table) {
            return Err(DecompileError::DuplicateExtension(table));
        }
        self.recipes.insert(table, Box::new(recipe));
        Ok(())
    }

    /// Append a linking unit; units run in registration order.
    pub fn register_unit<U: LinkingUnit + 'static>(&mut self, unit: U) {
        self.units.push(Box::new(unit));
    }

    pub fn has_recipe(&self, table: &str) -> bool {
        self.recipes.contains_key(table)
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (BTreeMap<String, Box<dyn TableRecipe>>, Vec<Box<dyn LinkingUnit>>) {
        (self.recipes, self.units)
    }
}
