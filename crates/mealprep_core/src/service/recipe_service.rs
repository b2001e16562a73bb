//! Recipe use-case service.
//!
//! # Responsibility
//! - CRUD entry points for recipes, ingredients and steps.
//! - Translate missing-parent foreign-key failures into `NotFound`.
//!
//! # Invariants
//! - Created and updated entities are re-read by their own id.
//! - Nested list operations fail with `NotFound` when the recipe is missing
//!   and return an empty list when it simply has no children.

use super::{log_create, log_write, ServiceError, ServiceResult, LIST_LIMIT};
use crate::mapping::{validate_id, Deleted};
use crate::model::recipe::{
    IngredientId, IngredientPatch, NewIngredient, NewRecipe, NewStep, Recipe, RecipeDetail,
    RecipeId, RecipeIngredient, RecipePatch, RecipeStep, StepId, StepPatch,
};
use crate::model::Entity;
use crate::repo::recipe_repo::RecipeRepository;
use crate::repo::RepoError;

/// Use-case service for the recipe aggregate.
pub struct RecipeService<R: RecipeRepository> {
    repo: R,
}

impl<R: RecipeRepository> RecipeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists up to [`LIST_LIMIT`] recipes, most recently created first.
    pub fn list_recipes(&self) -> ServiceResult<Vec<Recipe>> {
        Ok(self.repo.list_recipes(LIST_LIMIT)?)
    }

    pub fn get_recipe(&self, id: RecipeId) -> ServiceResult<Recipe> {
        let id = validate_id("id", id)?;
        self.repo
            .get_recipe(id)?
            .ok_or(ServiceError::not_found(Entity::Recipe, id))
    }

    /// Loads a recipe with its ingredients and ordered steps.
    pub fn get_recipe_detail(&self, id: RecipeId) -> ServiceResult<RecipeDetail> {
        let recipe = self.get_recipe(id)?;
        let ingredients = self.repo.list_ingredients(recipe.id)?;
        let steps = self.repo.list_steps(recipe.id)?;
        Ok(RecipeDetail {
            recipe,
            ingredients,
            steps,
        })
    }

    /// Creates a recipe and returns it with server-assigned id and timestamps.
    pub fn create_recipe(&self, input: NewRecipe) -> ServiceResult<Recipe> {
        let input = input.validate()?;
        let result = self
            .repo
            .create_recipe(&input)
            .map_err(ServiceError::from)
            .and_then(|id| self.read_back_recipe(id));
        log_create("recipe_create", &result, |recipe| recipe.id);
        result
    }

    /// Applies a partial update; omitted fields keep their stored values.
    pub fn update_recipe(&self, id: RecipeId, patch: RecipePatch) -> ServiceResult<Recipe> {
        let id = validate_id("id", id)?;
        let patch = patch.validate()?;
        let result = self
            .repo
            .update_recipe(id, &patch)
            .map_err(ServiceError::from)
            .and_then(|()| self.read_back_recipe(id));
        log_write("recipe_update", id, &result);
        result
    }

    /// Deletes a recipe. A repeated delete reports `NotFound`.
    pub fn delete_recipe(&self, id: RecipeId) -> ServiceResult<Deleted> {
        let id = validate_id("id", id)?;
        let result = self
            .repo
            .delete_recipe(id)
            .map(|()| Deleted::new(id))
            .map_err(ServiceError::from);
        log_write("recipe_delete", id, &result);
        result
    }

    pub fn list_ingredients_for_recipe(
        &self,
        recipe_id: RecipeId,
    ) -> ServiceResult<Vec<RecipeIngredient>> {
        let recipe_id = self.existing_recipe(recipe_id)?;
        Ok(self.repo.list_ingredients(recipe_id)?)
    }

    /// Adds an ingredient to a recipe. A missing recipe is `NotFound`.
    pub fn create_ingredient_for_recipe(
        &self,
        recipe_id: RecipeId,
        input: NewIngredient,
    ) -> ServiceResult<RecipeIngredient> {
        let recipe_id = validate_id("recipe_id", recipe_id)?;
        let input = input.validate()?;
        let result = self
            .repo
            .create_ingredient(recipe_id, &input)
            .map_err(|err| child_create_error(err, recipe_id))
            .and_then(|id| self.read_back_ingredient(id));
        log_create("ingredient_create", &result, |ingredient| ingredient.id);
        result
    }

    pub fn get_ingredient(&self, id: IngredientId) -> ServiceResult<RecipeIngredient> {
        let id = validate_id("id", id)?;
        self.repo
            .get_ingredient(id)?
            .ok_or(ServiceError::not_found(Entity::Ingredient, id))
    }

    pub fn update_ingredient(
        &self,
        id: IngredientId,
        patch: IngredientPatch,
    ) -> ServiceResult<RecipeIngredient> {
        let id = validate_id("id", id)?;
        let patch = patch.validate()?;
        let result = self
            .repo
            .update_ingredient(id, &patch)
            .map_err(ServiceError::from)
            .and_then(|()| self.read_back_ingredient(id));
        log_write("ingredient_update", id, &result);
        result
    }

    pub fn delete_ingredient(&self, id: IngredientId) -> ServiceResult<Deleted> {
        let id = validate_id("id", id)?;
        let result = self
            .repo
            .delete_ingredient(id)
            .map(|()| Deleted::new(id))
            .map_err(ServiceError::from);
        log_write("ingredient_delete", id, &result);
        result
    }

    /// Lists steps in display order (`step_no`, then id).
    pub fn list_steps_for_recipe(&self, recipe_id: RecipeId) -> ServiceResult<Vec<RecipeStep>> {
        let recipe_id = self.existing_recipe(recipe_id)?;
        Ok(self.repo.list_steps(recipe_id)?)
    }

    pub fn create_step_for_recipe(
        &self,
        recipe_id: RecipeId,
        input: NewStep,
    ) -> ServiceResult<RecipeStep> {
        let recipe_id = validate_id("recipe_id", recipe_id)?;
        let input = input.validate()?;
        let result = self
            .repo
            .create_step(recipe_id, &input)
            .map_err(|err| child_create_error(err, recipe_id))
            .and_then(|id| self.read_back_step(id));
        log_create("step_create", &result, |step| step.id);
        result
    }

    pub fn get_step(&self, id: StepId) -> ServiceResult<RecipeStep> {
        let id = validate_id("id", id)?;
        self.repo
            .get_step(id)?
            .ok_or(ServiceError::not_found(Entity::Step, id))
    }

    pub fn update_step(&self, id: StepId, patch: StepPatch) -> ServiceResult<RecipeStep> {
        let id = validate_id("id", id)?;
        let patch = patch.validate()?;
        let result = self
            .repo
            .update_step(id, &patch)
            .map_err(ServiceError::from)
            .and_then(|()| self.read_back_step(id));
        log_write("step_update", id, &result);
        result
    }

    pub fn delete_step(&self, id: StepId) -> ServiceResult<Deleted> {
        let id = validate_id("id", id)?;
        let result = self
            .repo
            .delete_step(id)
            .map(|()| Deleted::new(id))
            .map_err(ServiceError::from);
        log_write("step_delete", id, &result);
        result
    }

    fn existing_recipe(&self, recipe_id: RecipeId) -> ServiceResult<RecipeId> {
        let recipe_id = validate_id("recipe_id", recipe_id)?;
        if !self.repo.recipe_exists(recipe_id)? {
            return Err(ServiceError::not_found(Entity::Recipe, recipe_id));
        }
        Ok(recipe_id)
    }

    fn read_back_recipe(&self, id: RecipeId) -> ServiceResult<Recipe> {
        self.repo
            .get_recipe(id)?
            .ok_or_else(|| missing_after_write(Entity::Recipe, id))
    }

    fn read_back_ingredient(&self, id: IngredientId) -> ServiceResult<RecipeIngredient> {
        self.repo
            .get_ingredient(id)?
            .ok_or_else(|| missing_after_write(Entity::Ingredient, id))
    }

    fn read_back_step(&self, id: StepId) -> ServiceResult<RecipeStep> {
        self.repo
            .get_step(id)?
            .ok_or_else(|| missing_after_write(Entity::Step, id))
    }
}

/// A child insert only trips a foreign key when its recipe is gone.
fn child_create_error(err: RepoError, recipe_id: RecipeId) -> ServiceError {
    match err {
        RepoError::ForeignKeyViolation => ServiceError::not_found(Entity::Recipe, recipe_id),
        other => other.into(),
    }
}

pub(crate) fn missing_after_write(entity: Entity, id: i64) -> ServiceError {
    ServiceError::Unavailable(RepoError::InvalidData(format!(
        "{entity} {id} missing on read-back after write"
    )))
}
