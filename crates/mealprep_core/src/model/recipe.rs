//! Recipe aggregate: recipes plus their owned ingredients and steps.
//!
//! # Invariants
//! - Ingredients and steps belong to exactly one recipe and are removed with it.
//! - `step_no` orders steps within a recipe; gaps are allowed.
//! - `quantity` is free text, never parsed as a number.

use super::{non_negative, required_text, ValidationError};
use crate::mapping::FieldUpdate;
use serde::{Deserialize, Serialize};

pub type RecipeId = i64;
pub type IngredientId = i64;
pub type StepId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: Option<String>,
    pub servings: Option<i64>,
    /// Minutes.
    pub prep_time: Option<i64>,
    /// Minutes.
    pub cook_time: Option<i64>,
    pub is_public: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: IngredientId,
    pub recipe_id: RecipeId,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub id: StepId,
    pub recipe_id: RecipeId,
    pub step_no: i64,
    pub instruction: String,
}

/// Recipe together with its owned children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
}

/// Create input for a recipe.
///
/// Omitted optional fields are stored as absent, except `is_public`
/// which defaults to `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub servings: Option<i64>,
    #[serde(default)]
    pub prep_time: Option<i64>,
    #[serde(default)]
    pub cook_time: Option<i64>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl NewRecipe {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validates and normalizes the input (trimmed title).
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.title = required_text("title", &self.title)?;
        non_negative("servings", self.servings)?;
        non_negative("prep_time", self.prep_time)?;
        non_negative("cook_time", self.cook_time)?;
        Ok(self)
    }
}

/// Partial update for a recipe. `title` can be replaced but never cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub description: FieldUpdate<String>,
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub servings: FieldUpdate<i64>,
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub prep_time: FieldUpdate<i64>,
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub cook_time: FieldUpdate<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl RecipePatch {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(title) = self.title.as_deref() {
            self.title = Some(required_text("title", title)?);
        }
        non_negative("servings", self.servings.as_set().copied())?;
        non_negative("prep_time", self.prep_time.as_set().copied())?;
        non_negative("cook_time", self.cook_time.as_set().copied())?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl NewIngredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = required_text("name", &self.name)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub quantity: FieldUpdate<String>,
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub unit: FieldUpdate<String>,
}

impl IngredientPatch {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(name) = self.name.as_deref() {
            self.name = Some(required_text("name", name)?);
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStep {
    pub step_no: i64,
    pub instruction: String,
}

impl NewStep {
    pub fn new(step_no: i64, instruction: impl Into<String>) -> Self {
        Self {
            step_no,
            instruction: instruction.into(),
        }
    }

    pub fn validate(mut self) -> Result<Self, ValidationError> {
        non_negative("step_no", Some(self.step_no))?;
        self.instruction = required_text("instruction", &self.instruction)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_no: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

impl StepPatch {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        non_negative("step_no", self.step_no)?;
        if let Some(instruction) = self.instruction.as_deref() {
            self.instruction = Some(required_text("instruction", instruction)?);
        }
        Ok(self)
    }
}
