//! Domain model for recipes and meal plans.
//!
//! # Responsibility
//! - Define read models returned by services.
//! - Define create/patch inputs and their upfront validation.
//!
//! # Invariants
//! - Ids and timestamps are assigned by storage, never by callers.
//! - Required text fields are trimmed and must be non-empty.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod meal_plan;
pub mod recipe;

/// Input validation failure naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: {}", self.field, self.message)
    }
}

impl Error for ValidationError {}

/// Entity families managed by the core, used in not-found reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Recipe,
    Ingredient,
    Step,
    MealPlan,
    MealPlanRecipe,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recipe => "recipe",
            Self::Ingredient => "ingredient",
            Self::Step => "step",
            Self::MealPlan => "meal_plan",
            Self::MealPlanRecipe => "meal_plan_recipe",
        }
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trims a required text field and rejects blank values.
pub(crate) fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn non_negative(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(value) if value < 0 => Err(ValidationError::new(
            field,
            format!("must not be negative, got {value}"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{non_negative, required_text};

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("title", "  Soup ").unwrap(), "Soup");
        let err = required_text("title", " \t").unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn non_negative_allows_none_and_zero() {
        assert!(non_negative("servings", None).is_ok());
        assert!(non_negative("servings", Some(0)).is_ok());
        assert!(non_negative("servings", Some(-1)).is_err());
    }
}
