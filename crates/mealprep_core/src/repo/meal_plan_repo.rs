//! Meal plan repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `meal_plans` and the `meal_plan_recipes` join rows.
//!
//! # Invariants
//! - Listing order is `created_at DESC, id DESC` (newest first).
//! - Slots are listed by `planned_date` (undated last), then id.
//! - Deleting a meal plan relies on the schema cascade for its slots.

use super::{delete_row, ensure_connection_ready, row_exists, PartialUpdate, RepoResult};
use crate::mapping::{integer_value, text_value};
use crate::model::meal_plan::{
    MealPlan, MealPlanId, MealPlanPatch, MealPlanRecipe, MealPlanRecipeId, MealPlanRecipePatch,
    NewMealPlan, NewMealPlanRecipe,
};
use crate::model::Entity;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

const MEAL_PLAN_SELECT_SQL: &str = "SELECT
    id,
    name,
    start_date,
    end_date,
    created_at
FROM meal_plans";

const MEAL_PLAN_RECIPE_SELECT_SQL: &str = "SELECT
    id,
    meal_plan_id,
    recipe_id,
    meal_type,
    planned_date
FROM meal_plan_recipes";

/// Repository interface for meal plans and their recipe slots.
pub trait MealPlanRepository {
    fn create_meal_plan(&self, input: &NewMealPlan) -> RepoResult<MealPlanId>;
    fn get_meal_plan(&self, id: MealPlanId) -> RepoResult<Option<MealPlan>>;
    /// Lists newest meal plans first, at most `limit` rows.
    fn list_meal_plans(&self, limit: u32) -> RepoResult<Vec<MealPlan>>;
    fn update_meal_plan(&self, id: MealPlanId, patch: &MealPlanPatch) -> RepoResult<()>;
    /// Deletes a meal plan; its slots cascade.
    fn delete_meal_plan(&self, id: MealPlanId) -> RepoResult<()>;
    fn meal_plan_exists(&self, id: MealPlanId) -> RepoResult<bool>;

    /// Fails with `ForeignKeyViolation` when either the plan or the supplied
    /// recipe does not exist.
    fn create_meal_plan_recipe(
        &self,
        meal_plan_id: MealPlanId,
        input: &NewMealPlanRecipe,
    ) -> RepoResult<MealPlanRecipeId>;
    fn get_meal_plan_recipe(&self, id: MealPlanRecipeId) -> RepoResult<Option<MealPlanRecipe>>;
    fn list_meal_plan_recipes(&self, meal_plan_id: MealPlanId)
        -> RepoResult<Vec<MealPlanRecipe>>;
    fn update_meal_plan_recipe(
        &self,
        id: MealPlanRecipeId,
        patch: &MealPlanRecipePatch,
    ) -> RepoResult<()>;
    fn delete_meal_plan_recipe(&self, id: MealPlanRecipeId) -> RepoResult<()>;
}

/// SQLite-backed meal plan repository.
pub struct SqliteMealPlanRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMealPlanRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MealPlanRepository for SqliteMealPlanRepository<'_> {
    fn create_meal_plan(&self, input: &NewMealPlan) -> RepoResult<MealPlanId> {
        self.conn.execute(
            "INSERT INTO meal_plans (name, start_date, end_date) VALUES (?1, ?2, ?3);",
            params![input.name.as_str(), input.start_date, input.end_date],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_meal_plan(&self, id: MealPlanId) -> RepoResult<Option<MealPlan>> {
        let plan = self
            .conn
            .query_row(
                &format!("{MEAL_PLAN_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_meal_plan_row,
            )
            .optional()?;
        Ok(plan)
    }

    fn list_meal_plans(&self, limit: u32) -> RepoResult<Vec<MealPlan>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEAL_PLAN_SELECT_SQL} ORDER BY created_at DESC, id DESC LIMIT ?1;"
        ))?;
        let plans = stmt
            .query_map([i64::from(limit)], parse_meal_plan_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    fn update_meal_plan(&self, id: MealPlanId, patch: &MealPlanPatch) -> RepoResult<()> {
        let mut update = PartialUpdate::new("meal_plans", Entity::MealPlan);
        if let Some(name) = patch.name.as_ref() {
            update.set("name", Value::Text(name.clone()));
        }
        if let Some(start_date) = patch.start_date {
            update.set("start_date", date_value(Some(start_date)));
        }
        if let Some(end_date) = patch.end_date {
            update.set("end_date", date_value(Some(end_date)));
        }
        update.execute(self.conn, id)
    }

    fn delete_meal_plan(&self, id: MealPlanId) -> RepoResult<()> {
        delete_row(self.conn, "meal_plans", Entity::MealPlan, id)
    }

    fn meal_plan_exists(&self, id: MealPlanId) -> RepoResult<bool> {
        row_exists(self.conn, "meal_plans", id)
    }

    fn create_meal_plan_recipe(
        &self,
        meal_plan_id: MealPlanId,
        input: &NewMealPlanRecipe,
    ) -> RepoResult<MealPlanRecipeId> {
        self.conn.execute(
            "INSERT INTO meal_plan_recipes (meal_plan_id, recipe_id, meal_type, planned_date)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                meal_plan_id,
                input.recipe_id,
                input.meal_type.as_deref(),
                input.planned_date,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_meal_plan_recipe(&self, id: MealPlanRecipeId) -> RepoResult<Option<MealPlanRecipe>> {
        let slot = self
            .conn
            .query_row(
                &format!("{MEAL_PLAN_RECIPE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_meal_plan_recipe_row,
            )
            .optional()?;
        Ok(slot)
    }

    fn list_meal_plan_recipes(
        &self,
        meal_plan_id: MealPlanId,
    ) -> RepoResult<Vec<MealPlanRecipe>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEAL_PLAN_RECIPE_SELECT_SQL}
             WHERE meal_plan_id = ?1
             ORDER BY planned_date IS NULL, planned_date ASC, id ASC;"
        ))?;
        let slots = stmt
            .query_map([meal_plan_id], parse_meal_plan_recipe_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(slots)
    }

    fn update_meal_plan_recipe(
        &self,
        id: MealPlanRecipeId,
        patch: &MealPlanRecipePatch,
    ) -> RepoResult<()> {
        let mut update = PartialUpdate::new("meal_plan_recipes", Entity::MealPlanRecipe);
        if !patch.recipe_id.is_unchanged() {
            update.set("recipe_id", integer_value(patch.recipe_id.as_set().copied()));
        }
        if !patch.meal_type.is_unchanged() {
            update.set("meal_type", text_value(patch.meal_type.as_set().cloned()));
        }
        if !patch.planned_date.is_unchanged() {
            update.set(
                "planned_date",
                date_value(patch.planned_date.as_set().copied()),
            );
        }
        update.execute(self.conn, id)
    }

    fn delete_meal_plan_recipe(&self, id: MealPlanRecipeId) -> RepoResult<()> {
        delete_row(self.conn, "meal_plan_recipes", Entity::MealPlanRecipe, id)
    }
}

/// Encodes a date the same way rusqlite's `chrono` support does (`%F`).
fn date_value(value: Option<NaiveDate>) -> Value {
    text_value(value.map(|date| date.format("%F").to_string()))
}

fn parse_meal_plan_row(row: &Row<'_>) -> rusqlite::Result<MealPlan> {
    Ok(MealPlan {
        id: row.get("id")?,
        name: row.get("name")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_meal_plan_recipe_row(row: &Row<'_>) -> rusqlite::Result<MealPlanRecipe> {
    Ok(MealPlanRecipe {
        id: row.get("id")?,
        meal_plan_id: row.get("meal_plan_id")?,
        recipe_id: row.get("recipe_id")?,
        meal_type: row.get("meal_type")?,
        planned_date: row.get("planned_date")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{MealPlanRepository, SqliteMealPlanRepository};
    use crate::db::open_db_in_memory;
    use crate::model::meal_plan::{NewMealPlan, NewMealPlanRecipe};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn dates_are_stored_as_iso_text() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteMealPlanRepository::try_new(&conn).unwrap();
        let id = repo
            .create_meal_plan(&NewMealPlan::new("Week", date(4), date(10)))
            .unwrap();

        let raw: String = conn
            .query_row("SELECT start_date FROM meal_plans WHERE id = ?1;", [id], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(raw, "2024-03-04");
    }

    #[test]
    fn slots_list_dated_first_then_undated() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteMealPlanRepository::try_new(&conn).unwrap();
        let plan_id = repo
            .create_meal_plan(&NewMealPlan::new("Week", date(4), date(10)))
            .unwrap();

        let undated = repo
            .create_meal_plan_recipe(plan_id, &NewMealPlanRecipe::default())
            .unwrap();
        let later = repo
            .create_meal_plan_recipe(
                plan_id,
                &NewMealPlanRecipe {
                    planned_date: Some(date(8)),
                    ..NewMealPlanRecipe::default()
                },
            )
            .unwrap();
        let earlier = repo
            .create_meal_plan_recipe(
                plan_id,
                &NewMealPlanRecipe {
                    planned_date: Some(date(5)),
                    ..NewMealPlanRecipe::default()
                },
            )
            .unwrap();

        let ids: Vec<_> = repo
            .list_meal_plan_recipes(plan_id)
            .unwrap()
            .into_iter()
            .map(|slot| slot.id)
            .collect();
        assert_eq!(ids, vec![earlier, later, undated]);
    }
}
