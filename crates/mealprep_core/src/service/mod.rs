//! Core use-case services.
//!
//! # Responsibility
//! - Validate inputs and orchestrate repository calls into use-case APIs.
//! - Classify failures into validation / not-found / conflict / unavailable.
//! - Bind services to the process-scoped `Database` handle.
//!
//! # Invariants
//! - No operation retries a write.
//! - Every failure is local to one operation.

use crate::db::{Database, DbError};
use crate::model::{Entity, ValidationError};
use crate::repo::meal_plan_repo::SqliteMealPlanRepository;
use crate::repo::recipe_repo::SqliteRecipeRepository;
use crate::repo::RepoError;
use log::{log, Level};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod meal_plan_service;
pub mod recipe_service;

use meal_plan_service::MealPlanService;
use recipe_service::RecipeService;

/// Maximum rows returned by list operations. There is no offset support.
pub const LIST_LIMIT: u32 = 100;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Classified failure returned by every service operation.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed or missing input; never retried.
    Validation(ValidationError),
    /// No row matches the id, or a referenced parent does not exist.
    NotFound { entity: Entity, id: i64 },
    /// Constraint violation not caught by upfront validation.
    Conflict(String),
    /// Storage could not serve the request.
    Unavailable(RepoError),
}

impl ServiceError {
    /// Stable machine-readable classification.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unavailable(_) => "unavailable",
        }
    }

    pub(crate) fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Unavailable(err) => write!(f, "storage unavailable: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Unavailable(err) => Some(err),
            Self::NotFound { .. } | Self::Conflict(_) => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::ConstraintViolation(message) => Self::Conflict(message),
            RepoError::ForeignKeyViolation => {
                Self::Conflict("referenced row does not exist".to_string())
            }
            other => Self::Unavailable(other),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::from(RepoError::from(value))
    }
}

/// Runs `f` with a recipe service bound to the store's connection.
pub fn with_recipe_service<T>(
    db: &Database,
    f: impl FnOnce(&RecipeService<SqliteRecipeRepository<'_>>) -> ServiceResult<T>,
) -> ServiceResult<T> {
    db.with_connection(|conn| {
        let repo = SqliteRecipeRepository::try_new(conn)?;
        f(&RecipeService::new(repo))
    })?
}

/// Runs `f` with a meal plan service bound to the store's connection.
pub fn with_meal_plan_service<T>(
    db: &Database,
    f: impl FnOnce(
        &MealPlanService<SqliteMealPlanRepository<'_>, SqliteRecipeRepository<'_>>,
    ) -> ServiceResult<T>,
) -> ServiceResult<T> {
    db.with_connection(|conn| {
        let plans = SqliteMealPlanRepository::try_new(conn)?;
        let recipes = SqliteRecipeRepository::try_new(conn)?;
        f(&MealPlanService::new(plans, recipes))
    })?
}

/// Emits the outcome of a write on an existing row.
pub(crate) fn log_write<T>(event: &'static str, id: i64, result: &ServiceResult<T>) {
    let (level, line) = write_event(event, Some(id), result);
    log!(level, "{line}");
}

/// Emits the outcome of a create. The new id is only known on success.
pub(crate) fn log_create<T>(
    event: &'static str,
    result: &ServiceResult<T>,
    id_of: impl FnOnce(&T) -> i64,
) {
    let id = result.as_ref().ok().map(id_of);
    let (level, line) = write_event(event, id, result);
    log!(level, "{line}");
}

/// Level and `key=value` line for a write outcome. Only ids and error codes
/// are included, never user-supplied text.
fn write_event<T>(
    event: &'static str,
    id: Option<i64>,
    result: &ServiceResult<T>,
) -> (Level, String) {
    let id_field = id.map(|id| format!(" id={id}")).unwrap_or_default();
    match result {
        Ok(_) => (
            Level::Debug,
            format!("event={event} module=service status=ok{id_field}"),
        ),
        Err(err) => (
            Level::Warn,
            format!(
                "event={event} module=service status=error{id_field} error_code={}",
                err.code()
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{write_event, ServiceError, ServiceResult};
    use crate::model::{Entity, ValidationError};
    use crate::repo::RepoError;
    use log::Level;

    #[test]
    fn repo_errors_map_to_service_classes() {
        let not_found = ServiceError::from(RepoError::NotFound {
            entity: Entity::Recipe,
            id: 9,
        });
        assert_eq!(not_found.code(), "not_found");

        let conflict = ServiceError::from(RepoError::ConstraintViolation("CHECK".to_string()));
        assert_eq!(conflict.code(), "conflict");

        let fk = ServiceError::from(RepoError::ForeignKeyViolation);
        assert_eq!(fk.code(), "conflict");

        let unavailable = ServiceError::from(RepoError::MissingRequiredTable("recipes"));
        assert_eq!(unavailable.code(), "unavailable");
    }

    #[test]
    fn validation_error_keeps_field_in_message() {
        let err = ServiceError::from(ValidationError::new("title", "must not be empty"));
        assert_eq!(err.code(), "validation");
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn failed_create_is_a_warn_line_with_error_code() {
        let failed: ServiceResult<()> = Err(ServiceError::not_found(Entity::Recipe, 999_999));
        let (level, line) = write_event("ingredient_create", None, &failed);
        assert_eq!(level, Level::Warn);
        assert_eq!(
            line,
            "event=ingredient_create module=service status=error error_code=not_found"
        );
    }

    #[test]
    fn successful_write_is_a_debug_line_with_id() {
        let done: ServiceResult<()> = Ok(());
        let (level, line) = write_event("recipe_create", Some(12), &done);
        assert_eq!(level, Level::Debug);
        assert_eq!(line, "event=recipe_create module=service status=ok id=12");
    }
}
