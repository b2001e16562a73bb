//! Meal plan use-case service.
//!
//! # Responsibility
//! - CRUD entry points for meal plans and their recipe slots.
//! - Resolve recipe references when a slot insert/update trips the
//!   foreign-key constraint, to tell a missing plan from a bad recipe id.
//!
//! # Invariants
//! - A supplied `recipe_id` that does not exist is a validation error;
//!   an omitted or cleared one is legal.
//! - A slot's `meal_plan_id` never changes after creation.

use super::recipe_service::missing_after_write;
use super::{log_create, log_write, ServiceError, ServiceResult, LIST_LIMIT};
use crate::mapping::{validate_id, Deleted};
use crate::model::meal_plan::{
    MealPlan, MealPlanId, MealPlanPatch, MealPlanRecipe, MealPlanRecipeId, MealPlanRecipePatch,
    NewMealPlan, NewMealPlanRecipe,
};
use crate::model::recipe::RecipeId;
use crate::model::{Entity, ValidationError};
use crate::repo::meal_plan_repo::MealPlanRepository;
use crate::repo::recipe_repo::RecipeRepository;
use crate::repo::RepoError;

/// Use-case service for meal plans. Holds a recipe repository only to
/// resolve slot recipe references.
pub struct MealPlanService<M: MealPlanRepository, R: RecipeRepository> {
    plans: M,
    recipes: R,
}

impl<M: MealPlanRepository, R: RecipeRepository> MealPlanService<M, R> {
    pub fn new(plans: M, recipes: R) -> Self {
        Self { plans, recipes }
    }

    /// Lists up to [`LIST_LIMIT`] meal plans, most recently created first.
    pub fn list_meal_plans(&self) -> ServiceResult<Vec<MealPlan>> {
        Ok(self.plans.list_meal_plans(LIST_LIMIT)?)
    }

    pub fn get_meal_plan(&self, id: MealPlanId) -> ServiceResult<MealPlan> {
        let id = validate_id("id", id)?;
        self.plans
            .get_meal_plan(id)?
            .ok_or(ServiceError::not_found(Entity::MealPlan, id))
    }

    /// Creates a meal plan. `end_date` before `start_date` is accepted.
    pub fn create_meal_plan(&self, input: NewMealPlan) -> ServiceResult<MealPlan> {
        let input = input.validate()?;
        let result = self
            .plans
            .create_meal_plan(&input)
            .map_err(ServiceError::from)
            .and_then(|id| self.read_back_plan(id));
        log_create("meal_plan_create", &result, |plan| plan.id);
        result
    }

    pub fn update_meal_plan(
        &self,
        id: MealPlanId,
        patch: MealPlanPatch,
    ) -> ServiceResult<MealPlan> {
        let id = validate_id("id", id)?;
        let patch = patch.validate()?;
        let result = self
            .plans
            .update_meal_plan(id, &patch)
            .map_err(ServiceError::from)
            .and_then(|()| self.read_back_plan(id));
        log_write("meal_plan_update", id, &result);
        result
    }

    /// Deletes a meal plan together with all of its slots.
    pub fn delete_meal_plan(&self, id: MealPlanId) -> ServiceResult<Deleted> {
        let id = validate_id("id", id)?;
        let result = self
            .plans
            .delete_meal_plan(id)
            .map(|()| Deleted::new(id))
            .map_err(ServiceError::from);
        log_write("meal_plan_delete", id, &result);
        result
    }

    pub fn list_meal_plan_recipes_for_plan(
        &self,
        meal_plan_id: MealPlanId,
    ) -> ServiceResult<Vec<MealPlanRecipe>> {
        let meal_plan_id = validate_id("meal_plan_id", meal_plan_id)?;
        if !self.plans.meal_plan_exists(meal_plan_id)? {
            return Err(ServiceError::not_found(Entity::MealPlan, meal_plan_id));
        }
        Ok(self.plans.list_meal_plan_recipes(meal_plan_id)?)
    }

    /// Adds a recipe slot to a meal plan.
    ///
    /// # Errors
    /// - `NotFound` when the meal plan does not exist.
    /// - `Validation` on `recipe_id` when a supplied recipe does not exist.
    pub fn create_meal_plan_recipe(
        &self,
        meal_plan_id: MealPlanId,
        input: NewMealPlanRecipe,
    ) -> ServiceResult<MealPlanRecipe> {
        let meal_plan_id = validate_id("meal_plan_id", meal_plan_id)?;
        let input = input.validate()?;
        let result = self
            .plans
            .create_meal_plan_recipe(meal_plan_id, &input)
            .map_err(|err| self.slot_write_error(err, Some(meal_plan_id), input.recipe_id))
            .and_then(|id| self.read_back_slot(id));
        log_create("meal_plan_recipe_create", &result, |slot| slot.id);
        result
    }

    pub fn get_meal_plan_recipe(&self, id: MealPlanRecipeId) -> ServiceResult<MealPlanRecipe> {
        let id = validate_id("id", id)?;
        self.plans
            .get_meal_plan_recipe(id)?
            .ok_or(ServiceError::not_found(Entity::MealPlanRecipe, id))
    }

    /// Partially updates a slot. Clearing `recipe_id` is legal; pointing it
    /// at a missing recipe is a validation error.
    pub fn update_meal_plan_recipe(
        &self,
        id: MealPlanRecipeId,
        patch: MealPlanRecipePatch,
    ) -> ServiceResult<MealPlanRecipe> {
        let id = validate_id("id", id)?;
        let patch = patch.validate()?;
        let result = self
            .plans
            .update_meal_plan_recipe(id, &patch)
            .map_err(|err| self.slot_write_error(err, None, patch.recipe_id.as_set().copied()))
            .and_then(|()| self.read_back_slot(id));
        log_write("meal_plan_recipe_update", id, &result);
        result
    }

    pub fn delete_meal_plan_recipe(&self, id: MealPlanRecipeId) -> ServiceResult<Deleted> {
        let id = validate_id("id", id)?;
        let result = self
            .plans
            .delete_meal_plan_recipe(id)
            .map(|()| Deleted::new(id))
            .map_err(ServiceError::from);
        log_write("meal_plan_recipe_delete", id, &result);
        result
    }

    fn slot_write_error(
        &self,
        err: RepoError,
        meal_plan_id: Option<MealPlanId>,
        recipe_id: Option<RecipeId>,
    ) -> ServiceError {
        match err {
            RepoError::ForeignKeyViolation => self
                .classify_slot_reference(meal_plan_id, recipe_id)
                .unwrap_or_else(|lookup_failure| lookup_failure),
            other => other.into(),
        }
    }

    /// Works out which reference made a slot write fail its foreign keys.
    ///
    /// Returns the classified error to report; the outer `Result` carries
    /// storage failures hit while checking.
    fn classify_slot_reference(
        &self,
        meal_plan_id: Option<MealPlanId>,
        recipe_id: Option<RecipeId>,
    ) -> ServiceResult<ServiceError> {
        if let Some(meal_plan_id) = meal_plan_id {
            if !self.plans.meal_plan_exists(meal_plan_id)? {
                return Ok(ServiceError::not_found(Entity::MealPlan, meal_plan_id));
            }
        }
        if let Some(recipe_id) = recipe_id {
            if !self.recipes.recipe_exists(recipe_id)? {
                return Ok(ServiceError::Validation(ValidationError::new(
                    "recipe_id",
                    format!("recipe {recipe_id} does not exist"),
                )));
            }
        }
        Ok(ServiceError::from(RepoError::ForeignKeyViolation))
    }

    fn read_back_plan(&self, id: MealPlanId) -> ServiceResult<MealPlan> {
        self.plans
            .get_meal_plan(id)?
            .ok_or_else(|| missing_after_write(Entity::MealPlan, id))
    }

    fn read_back_slot(&self, id: MealPlanRecipeId) -> ServiceResult<MealPlanRecipe> {
        self.plans
            .get_meal_plan_recipe(id)?
            .ok_or_else(|| missing_after_write(Entity::MealPlanRecipe, id))
    }
}
