//! Database schema and operations for the recipe catalog

use anyhow::{Context, Result, bail};
use rusqlite::Connection;

use crate::catalog::Catalog;
use crate::models::{BuildingVariant, Facility, MaterialAmount, Multipliers, Recipe};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Recipes in catalog order; id order decides index collisions
        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            facility TEXT NOT NULL,
            duration REAL NOT NULL,
            enabled INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_inputs (
            recipe_id INTEGER,
            position INTEGER,
            material TEXT NOT NULL,
            amount REAL NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        CREATE TABLE IF NOT EXISTS recipe_outputs (
            recipe_id INTEGER,
            position INTEGER,
            material TEXT NOT NULL,
            amount REAL NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        -- Concrete buildings per facility class (e.g. Assembling Machine Mk.2)
        CREATE TABLE IF NOT EXISTS building_variants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            facility TEXT NOT NULL,
            name TEXT NOT NULL,
            multiplier REAL NOT NULL,
            UNIQUE (facility, name)
        );

        CREATE TABLE IF NOT EXISTS materials (
            name TEXT PRIMARY KEY
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_outputs_material ON recipe_outputs(material);
        "#,
    )?;
    Ok(())
}

/// Clear all catalog data (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_outputs;
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        DELETE FROM building_variants;
        DELETE FROM materials;
        "#,
    )?;
    Ok(())
}

/// Insert a recipe with its inputs and outputs, returning its id
pub fn insert_recipe(conn: &Connection, recipe: &Recipe) -> Result<i64> {
    conn.execute(
        "INSERT INTO recipes (facility, duration, enabled) VALUES (?1, ?2, ?3)",
        (recipe.facility.as_str(), recipe.duration, recipe.enabled),
    )?;
    let recipe_id = conn.last_insert_rowid();

    for (position, input) in recipe.inputs.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_inputs (recipe_id, position, material, amount)
             VALUES (?1, ?2, ?3, ?4)",
            (recipe_id, position as i64, &input.name, input.amount),
        )?;
    }
    for (position, output) in recipe.outputs.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_outputs (recipe_id, position, material, amount)
             VALUES (?1, ?2, ?3, ?4)",
            (recipe_id, position as i64, &output.name, output.amount),
        )?;
    }
    Ok(recipe_id)
}

/// Insert or replace a building variant
pub fn insert_variant(conn: &Connection, facility: Facility, variant: &BuildingVariant) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO building_variants (facility, name, multiplier)
         VALUES (?1, ?2, ?3)",
        (facility.as_str(), &variant.name, variant.multiplier),
    )?;
    Ok(())
}

pub fn insert_material(conn: &Connection, name: &str) -> Result<()> {
    conn.execute("INSERT OR IGNORE INTO materials (name) VALUES (?1)", [name])?;
    Ok(())
}

/// Store a whole catalog in one transaction
pub fn store_catalog(conn: &Connection, catalog: &Catalog) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    for recipe in &catalog.recipes {
        insert_recipe(&tx, recipe)?;
    }
    for facility in [Facility::Assembler, Facility::Smelter, Facility::ChemicalPlant] {
        for variant in catalog.multipliers.table(facility).unwrap_or_default() {
            insert_variant(&tx, facility, variant)?;
        }
    }
    for material in &catalog.materials {
        insert_material(&tx, material)?;
    }

    tx.commit()?;
    Ok(())
}

/// Load every recipe in catalog order
pub fn load_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare("SELECT id, facility, duration, enabled FROM recipes ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, bool>(3)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (id, facility, duration, enabled) = row?;
        let facility: Facility = facility
            .parse()
            .with_context(|| format!("recipe {id} has an invalid facility"))?;
        results.push(Recipe {
            inputs: load_amounts(conn, "recipe_inputs", id)?,
            outputs: load_amounts(conn, "recipe_outputs", id)?,
            facility,
            duration,
            enabled,
        });
    }
    Ok(results)
}

fn load_amounts(conn: &Connection, table: &str, recipe_id: i64) -> Result<Vec<MaterialAmount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT material, amount FROM {table} WHERE recipe_id = ?1 ORDER BY position"
    ))?;
    let rows = stmt.query_map([recipe_id], |row| {
        Ok(MaterialAmount::new(row.get::<_, String>(0)?, row.get(1)?))
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Load the building variant tables
pub fn load_multipliers(conn: &Connection) -> Result<Multipliers> {
    let mut stmt =
        conn.prepare("SELECT facility, name, multiplier FROM building_variants ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            BuildingVariant {
                name: row.get(1)?,
                multiplier: row.get(2)?,
            },
        ))
    })?;

    let mut multipliers = Multipliers::default();
    for row in rows {
        let (facility, variant) = row?;
        let facility: Facility = facility.parse()?;
        match multipliers.table_mut(facility) {
            Some(table) => table.push(variant),
            None => bail!("{facility} has no building variants, found '{}'", variant.name),
        }
    }
    Ok(multipliers)
}

/// List all known material names
pub fn list_materials(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM materials ORDER BY name")?;

    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Load the full catalog back out of the database
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    Ok(Catalog {
        recipes: load_recipes(conn)?,
        multipliers: load_multipliers(conn)?,
        materials: list_materials(conn)?,
    })
}
