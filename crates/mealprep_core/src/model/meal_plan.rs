//! Meal plans and their recipe slots.
//!
//! # Invariants
//! - A slot belongs to exactly one meal plan and is removed with it.
//! - A slot's `recipe_id` is a weak reference: it becomes `None` when the
//!   recipe is deleted, and the slot itself survives.
//! - `end_date >= start_date` is not enforced.

use super::recipe::RecipeId;
use super::{required_text, ValidationError};
use crate::mapping::{validate_id, FieldUpdate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type MealPlanId = i64;
pub type MealPlanRecipeId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: MealPlanId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// One recipe slot inside a meal plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlanRecipe {
    pub id: MealPlanRecipeId,
    pub meal_plan_id: MealPlanId,
    pub recipe_id: Option<RecipeId>,
    /// Free text such as `breakfast` or `dinner`.
    pub meal_type: Option<String>,
    pub planned_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMealPlan {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewMealPlan {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date,
            end_date,
        }
    }

    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = required_text("name", &self.name)?;
        Ok(self)
    }
}

/// Partial update for a meal plan. Every field is required on the entity,
/// so fields can be replaced but not cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlanPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl MealPlanPatch {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(name) = self.name.as_deref() {
            self.name = Some(required_text("name", name)?);
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMealPlanRecipe {
    #[serde(default)]
    pub recipe_id: Option<RecipeId>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub planned_date: Option<NaiveDate>,
}

impl NewMealPlanRecipe {
    pub fn validate(self) -> Result<Self, ValidationError> {
        if let Some(recipe_id) = self.recipe_id {
            validate_id("recipe_id", recipe_id)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlanRecipePatch {
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub recipe_id: FieldUpdate<RecipeId>,
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub meal_type: FieldUpdate<String>,
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub planned_date: FieldUpdate<NaiveDate>,
}

impl MealPlanRecipePatch {
    pub fn validate(self) -> Result<Self, ValidationError> {
        if let Some(recipe_id) = self.recipe_id.as_set() {
            validate_id("recipe_id", *recipe_id)?;
        }
        Ok(self)
    }
}
