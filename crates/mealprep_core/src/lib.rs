//! Core domain logic for the meal prep planner.
//! Recipes with ingredients and steps, meal plans, and the slots linking them.

pub mod config;
pub mod db;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use db::{Database, DbError, DbResult};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LogSettings,
};
pub use mapping::{parse_id, Deleted, FieldUpdate};
pub use model::meal_plan::{
    MealPlan, MealPlanId, MealPlanPatch, MealPlanRecipe, MealPlanRecipeId, MealPlanRecipePatch,
    NewMealPlan, NewMealPlanRecipe,
};
pub use model::recipe::{
    IngredientId, IngredientPatch, NewIngredient, NewRecipe, NewStep, Recipe, RecipeDetail,
    RecipeId, RecipeIngredient, RecipePatch, RecipeStep, StepId, StepPatch,
};
pub use model::{Entity, ValidationError};
pub use repo::meal_plan_repo::{MealPlanRepository, SqliteMealPlanRepository};
pub use repo::recipe_repo::{RecipeRepository, SqliteRecipeRepository};
pub use repo::{RepoError, RepoResult};
pub use service::meal_plan_service::MealPlanService;
pub use service::recipe_service::RecipeService;
pub use service::{
    with_meal_plan_service, with_recipe_service, ServiceError, ServiceResult, LIST_LIMIT,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
