//! Recipe repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `recipes` and the owned `recipe_ingredients` / `recipe_steps`.
//! - Encode `is_public` to `0/1` on write and decode it on read.
//!
//! # Invariants
//! - Listing order is `created_at DESC, id DESC` (newest first).
//! - Ingredients are listed by id, steps by `step_no` then id.
//! - Deleting a recipe relies on schema cascades for its children and on
//!   `SET NULL` for meal plan slots.

use super::{
    delete_row, ensure_connection_ready, row_exists, PartialUpdate, RepoError, RepoResult,
};
use crate::mapping::{bool_to_int, int_to_bool, integer_value, text_value};
use crate::model::recipe::{
    IngredientId, IngredientPatch, NewIngredient, NewRecipe, NewStep, Recipe, RecipeId,
    RecipeIngredient, RecipePatch, RecipeStep, StepId, StepPatch,
};
use crate::model::Entity;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

const RECIPE_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    servings,
    prep_time,
    cook_time,
    is_public,
    created_at,
    updated_at
FROM recipes";

const INGREDIENT_SELECT_SQL: &str = "SELECT
    id,
    recipe_id,
    name,
    quantity,
    unit
FROM recipe_ingredients";

const STEP_SELECT_SQL: &str = "SELECT
    id,
    recipe_id,
    step_no,
    instruction
FROM recipe_steps";

const TOUCH_UPDATED_AT: &str = "updated_at = (strftime('%s', 'now') * 1000)";

/// Repository interface for recipes and their owned children.
pub trait RecipeRepository {
    fn create_recipe(&self, input: &NewRecipe) -> RepoResult<RecipeId>;
    fn get_recipe(&self, id: RecipeId) -> RepoResult<Option<Recipe>>;
    /// Lists newest recipes first, at most `limit` rows.
    fn list_recipes(&self, limit: u32) -> RepoResult<Vec<Recipe>>;
    fn update_recipe(&self, id: RecipeId, patch: &RecipePatch) -> RepoResult<()>;
    /// Deletes a recipe; children cascade and meal plan slots are nulled.
    fn delete_recipe(&self, id: RecipeId) -> RepoResult<()>;
    fn recipe_exists(&self, id: RecipeId) -> RepoResult<bool>;

    /// Fails with `ForeignKeyViolation` when `recipe_id` does not exist.
    fn create_ingredient(&self, recipe_id: RecipeId, input: &NewIngredient)
        -> RepoResult<IngredientId>;
    fn get_ingredient(&self, id: IngredientId) -> RepoResult<Option<RecipeIngredient>>;
    fn list_ingredients(&self, recipe_id: RecipeId) -> RepoResult<Vec<RecipeIngredient>>;
    fn update_ingredient(&self, id: IngredientId, patch: &IngredientPatch) -> RepoResult<()>;
    fn delete_ingredient(&self, id: IngredientId) -> RepoResult<()>;

    /// Fails with `ForeignKeyViolation` when `recipe_id` does not exist.
    fn create_step(&self, recipe_id: RecipeId, input: &NewStep) -> RepoResult<StepId>;
    fn get_step(&self, id: StepId) -> RepoResult<Option<RecipeStep>>;
    fn list_steps(&self, recipe_id: RecipeId) -> RepoResult<Vec<RecipeStep>>;
    fn update_step(&self, id: StepId, patch: &StepPatch) -> RepoResult<()>;
    fn delete_step(&self, id: StepId) -> RepoResult<()>;
}

/// SQLite-backed recipe repository.
pub struct SqliteRecipeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecipeRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RecipeRepository for SqliteRecipeRepository<'_> {
    fn create_recipe(&self, input: &NewRecipe) -> RepoResult<RecipeId> {
        self.conn.execute(
            "INSERT INTO recipes (
                title,
                description,
                servings,
                prep_time,
                cook_time,
                is_public
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                input.title.as_str(),
                input.description.as_deref(),
                input.servings,
                input.prep_time,
                input.cook_time,
                bool_to_int(input.is_public.unwrap_or(false)),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_recipe(&self, id: RecipeId) -> RepoResult<Option<Recipe>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECIPE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_recipe_row(row)?));
        }
        Ok(None)
    }

    fn list_recipes(&self, limit: u32) -> RepoResult<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECIPE_SELECT_SQL} ORDER BY created_at DESC, id DESC LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut recipes = Vec::new();
        while let Some(row) = rows.next()? {
            recipes.push(parse_recipe_row(row)?);
        }
        Ok(recipes)
    }

    fn update_recipe(&self, id: RecipeId, patch: &RecipePatch) -> RepoResult<()> {
        let mut update = PartialUpdate::new("recipes", Entity::Recipe);
        if let Some(title) = patch.title.as_ref() {
            update.set("title", Value::Text(title.clone()));
        }
        if !patch.description.is_unchanged() {
            update.set(
                "description",
                text_value(patch.description.as_set().cloned()),
            );
        }
        for (column, field) in [
            ("servings", &patch.servings),
            ("prep_time", &patch.prep_time),
            ("cook_time", &patch.cook_time),
        ] {
            if !field.is_unchanged() {
                update.set(column, integer_value(field.as_set().copied()));
            }
        }
        if let Some(is_public) = patch.is_public {
            update.set("is_public", Value::Integer(bool_to_int(is_public)));
        }
        update.touch(TOUCH_UPDATED_AT);
        update.execute(self.conn, id)
    }

    fn delete_recipe(&self, id: RecipeId) -> RepoResult<()> {
        delete_row(self.conn, "recipes", Entity::Recipe, id)
    }

    fn recipe_exists(&self, id: RecipeId) -> RepoResult<bool> {
        row_exists(self.conn, "recipes", id)
    }

    fn create_ingredient(
        &self,
        recipe_id: RecipeId,
        input: &NewIngredient,
    ) -> RepoResult<IngredientId> {
        self.conn.execute(
            "INSERT INTO recipe_ingredients (recipe_id, name, quantity, unit)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                recipe_id,
                input.name.as_str(),
                input.quantity.as_deref(),
                input.unit.as_deref(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_ingredient(&self, id: IngredientId) -> RepoResult<Option<RecipeIngredient>> {
        let ingredient = self
            .conn
            .query_row(
                &format!("{INGREDIENT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_ingredient_row,
            )
            .optional()?;
        Ok(ingredient)
    }

    fn list_ingredients(&self, recipe_id: RecipeId) -> RepoResult<Vec<RecipeIngredient>> {
        let mut stmt = self.conn.prepare(&format!(
            "{INGREDIENT_SELECT_SQL} WHERE recipe_id = ?1 ORDER BY id ASC;"
        ))?;
        let ingredients = stmt
            .query_map([recipe_id], parse_ingredient_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    fn update_ingredient(&self, id: IngredientId, patch: &IngredientPatch) -> RepoResult<()> {
        let mut update = PartialUpdate::new("recipe_ingredients", Entity::Ingredient);
        if let Some(name) = patch.name.as_ref() {
            update.set("name", Value::Text(name.clone()));
        }
        for (column, field) in [("quantity", &patch.quantity), ("unit", &patch.unit)] {
            if !field.is_unchanged() {
                update.set(column, text_value(field.as_set().cloned()));
            }
        }
        update.execute(self.conn, id)
    }

    fn delete_ingredient(&self, id: IngredientId) -> RepoResult<()> {
        delete_row(self.conn, "recipe_ingredients", Entity::Ingredient, id)
    }

    fn create_step(&self, recipe_id: RecipeId, input: &NewStep) -> RepoResult<StepId> {
        self.conn.execute(
            "INSERT INTO recipe_steps (recipe_id, step_no, instruction)
             VALUES (?1, ?2, ?3);",
            params![recipe_id, input.step_no, input.instruction.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_step(&self, id: StepId) -> RepoResult<Option<RecipeStep>> {
        let step = self
            .conn
            .query_row(
                &format!("{STEP_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_step_row,
            )
            .optional()?;
        Ok(step)
    }

    fn list_steps(&self, recipe_id: RecipeId) -> RepoResult<Vec<RecipeStep>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STEP_SELECT_SQL} WHERE recipe_id = ?1 ORDER BY step_no ASC, id ASC;"
        ))?;
        let steps = stmt
            .query_map([recipe_id], parse_step_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(steps)
    }

    fn update_step(&self, id: StepId, patch: &StepPatch) -> RepoResult<()> {
        let mut update = PartialUpdate::new("recipe_steps", Entity::Step);
        if let Some(step_no) = patch.step_no {
            update.set("step_no", Value::Integer(step_no));
        }
        if let Some(instruction) = patch.instruction.as_ref() {
            update.set("instruction", Value::Text(instruction.clone()));
        }
        update.execute(self.conn, id)
    }

    fn delete_step(&self, id: StepId) -> RepoResult<()> {
        delete_row(self.conn, "recipe_steps", Entity::Step, id)
    }
}

fn parse_recipe_row(row: &Row<'_>) -> RepoResult<Recipe> {
    let is_public = match int_to_bool(row.get::<_, i64>("is_public")?) {
        Some(value) => value,
        None => {
            let id: i64 = row.get("id")?;
            return Err(RepoError::InvalidData(format!(
                "invalid is_public value in recipes row {id}"
            )));
        }
    };

    Ok(Recipe {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        servings: row.get("servings")?,
        prep_time: row.get("prep_time")?,
        cook_time: row.get("cook_time")?,
        is_public,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_ingredient_row(row: &Row<'_>) -> rusqlite::Result<RecipeIngredient> {
    Ok(RecipeIngredient {
        id: row.get("id")?,
        recipe_id: row.get("recipe_id")?,
        name: row.get("name")?,
        quantity: row.get("quantity")?,
        unit: row.get("unit")?,
    })
}

fn parse_step_row(row: &Row<'_>) -> rusqlite::Result<RecipeStep> {
    Ok(RecipeStep {
        id: row.get("id")?,
        recipe_id: row.get("recipe_id")?,
        step_no: row.get("step_no")?,
        instruction: row.get("instruction")?,
    })
}
