use chrono::NaiveDate;
use mealprep_core::db::open_db_in_memory;
use mealprep_core::{
    Entity, FieldUpdate, MealPlanPatch, MealPlanRecipePatch, MealPlanService, NewMealPlan,
    NewMealPlanRecipe, NewRecipe, RecipeService, ServiceError, SqliteMealPlanRepository,
    SqliteRecipeRepository,
};
use rusqlite::Connection;

type Plans<'conn> = MealPlanService<SqliteMealPlanRepository<'conn>, SqliteRecipeRepository<'conn>>;

fn services(conn: &Connection) -> (Plans<'_>, RecipeService<SqliteRecipeRepository<'_>>) {
    let plans = MealPlanService::new(
        SqliteMealPlanRepository::try_new(conn).unwrap(),
        SqliteRecipeRepository::try_new(conn).unwrap(),
    );
    let recipes = RecipeService::new(SqliteRecipeRepository::try_new(conn).unwrap());
    (plans, recipes)
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

fn week(name: &str) -> NewMealPlan {
    NewMealPlan::new(name, date(6), date(12))
}

fn slot_for(recipe_id: Option<i64>, meal_type: &str, day: u32) -> NewMealPlanRecipe {
    NewMealPlanRecipe {
        recipe_id,
        meal_type: Some(meal_type.to_string()),
        planned_date: Some(date(day)),
    }
}

#[test]
fn create_and_get_meal_plan() {
    let conn = open_db_in_memory().unwrap();
    let (plans, _) = services(&conn);

    let created = plans.create_meal_plan(week("Week 19")).unwrap();
    assert!(created.id > 0);
    assert_eq!(created.name, "Week 19");
    assert_eq!(created.start_date, date(6));
    assert_eq!(created.end_date, date(12));

    assert_eq!(plans.get_meal_plan(created.id).unwrap(), created);
    assert_eq!(plans.get_meal_plan(0).unwrap_err().code(), "validation");
    assert!(matches!(
        plans.get_meal_plan(created.id + 1).unwrap_err(),
        ServiceError::NotFound {
            entity: Entity::MealPlan,
            ..
        }
    ));
}

#[test]
fn blank_plan_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let (plans, _) = services(&conn);

    match plans.create_meal_plan(week("  ")).unwrap_err() {
        ServiceError::Validation(err) => assert_eq!(err.field, "name"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn end_date_before_start_date_is_accepted() {
    let conn = open_db_in_memory().unwrap();
    let (plans, _) = services(&conn);

    let reversed = plans
        .create_meal_plan(NewMealPlan::new("Backwards", date(20), date(10)))
        .unwrap();
    assert!(reversed.end_date < reversed.start_date);
}

#[test]
fn meal_plans_list_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let (plans, _) = services(&conn);

    let first = plans.create_meal_plan(week("First")).unwrap();
    let second = plans.create_meal_plan(week("Second")).unwrap();

    let ids: Vec<_> = plans
        .list_meal_plans()
        .unwrap()
        .into_iter()
        .map(|plan| plan.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn partial_meal_plan_update() {
    let conn = open_db_in_memory().unwrap();
    let (plans, _) = services(&conn);
    let created = plans.create_meal_plan(week("Draft")).unwrap();

    let updated = plans
        .update_meal_plan(
            created.id,
            MealPlanPatch {
                end_date: Some(date(19)),
                ..MealPlanPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Draft");
    assert_eq!(updated.start_date, date(6));
    assert_eq!(updated.end_date, date(19));

    assert_eq!(
        plans
            .update_meal_plan(created.id + 50, MealPlanPatch::default())
            .unwrap_err()
            .code(),
        "not_found"
    );
}

#[test]
fn slot_survives_recipe_deletion_with_null_reference() {
    let conn = open_db_in_memory().unwrap();
    let (plans, recipes) = services(&conn);
    let plan = plans.create_meal_plan(week("Week")).unwrap();
    let recipe = recipes.create_recipe(NewRecipe::new("Tacos")).unwrap();

    let slot = plans
        .create_meal_plan_recipe(plan.id, slot_for(Some(recipe.id), "dinner", 7))
        .unwrap();
    assert_eq!(slot.recipe_id, Some(recipe.id));

    recipes.delete_recipe(recipe.id).unwrap();

    let after = plans.get_meal_plan_recipe(slot.id).unwrap();
    assert_eq!(after.recipe_id, None);
    assert_eq!(after.meal_type.as_deref(), Some("dinner"));
    assert_eq!(after.planned_date, Some(date(7)));
    assert_eq!(plans.list_meal_plan_recipes_for_plan(plan.id).unwrap().len(), 1);
}

#[test]
fn deleting_plan_removes_all_slots() {
    let conn = open_db_in_memory().unwrap();
    let (plans, recipes) = services(&conn);
    let plan = plans.create_meal_plan(week("Week")).unwrap();
    let other = plans.create_meal_plan(week("Other")).unwrap();
    let recipe = recipes.create_recipe(NewRecipe::new("Oats")).unwrap();

    plans
        .create_meal_plan_recipe(plan.id, slot_for(Some(recipe.id), "breakfast", 6))
        .unwrap();
    plans
        .create_meal_plan_recipe(plan.id, slot_for(None, "lunch", 6))
        .unwrap();
    plans
        .create_meal_plan_recipe(other.id, slot_for(None, "lunch", 6))
        .unwrap();

    let deleted = plans.delete_meal_plan(plan.id).unwrap();
    assert_eq!(deleted.id, plan.id);

    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM meal_plan_recipes WHERE meal_plan_id = ?1;",
            [plan.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0);
    assert_eq!(plans.list_meal_plan_recipes_for_plan(other.id).unwrap().len(), 1);
    assert!(recipes.get_recipe(recipe.id).is_ok());
    assert_eq!(
        plans.delete_meal_plan(plan.id).unwrap_err().code(),
        "not_found"
    );
}

#[test]
fn slot_with_unknown_recipe_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let (plans, _) = services(&conn);
    let plan = plans.create_meal_plan(week("Week")).unwrap();

    match plans
        .create_meal_plan_recipe(plan.id, slot_for(Some(424_242), "dinner", 8))
        .unwrap_err()
    {
        ServiceError::Validation(err) => assert_eq!(err.field, "recipe_id"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(plans
        .list_meal_plan_recipes_for_plan(plan.id)
        .unwrap()
        .is_empty());
}

#[test]
fn slot_without_recipe_is_legal() {
    let conn = open_db_in_memory().unwrap();
    let (plans, _) = services(&conn);
    let plan = plans.create_meal_plan(week("Week")).unwrap();

    let slot = plans
        .create_meal_plan_recipe(plan.id, NewMealPlanRecipe::default())
        .unwrap();
    assert_eq!(slot.meal_plan_id, plan.id);
    assert_eq!(slot.recipe_id, None);
    assert_eq!(slot.meal_type, None);
    assert_eq!(slot.planned_date, None);
}

#[test]
fn slot_for_missing_plan_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let (plans, recipes) = services(&conn);
    let recipe = recipes.create_recipe(NewRecipe::new("Soup")).unwrap();

    assert!(matches!(
        plans
            .create_meal_plan_recipe(77, slot_for(Some(recipe.id), "lunch", 9))
            .unwrap_err(),
        ServiceError::NotFound {
            entity: Entity::MealPlan,
            id: 77
        }
    ));
    assert!(matches!(
        plans.list_meal_plan_recipes_for_plan(77).unwrap_err(),
        ServiceError::NotFound {
            entity: Entity::MealPlan,
            id: 77
        }
    ));
}

#[test]
fn partial_slot_update_supports_set_clear_and_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let (plans, recipes) = services(&conn);
    let plan = plans.create_meal_plan(week("Week")).unwrap();
    let soup = recipes.create_recipe(NewRecipe::new("Soup")).unwrap();
    let salad = recipes.create_recipe(NewRecipe::new("Salad")).unwrap();
    let slot = plans
        .create_meal_plan_recipe(plan.id, slot_for(Some(soup.id), "lunch", 8))
        .unwrap();

    let swapped = plans
        .update_meal_plan_recipe(
            slot.id,
            MealPlanRecipePatch {
                recipe_id: FieldUpdate::Set(salad.id),
                ..MealPlanRecipePatch::default()
            },
        )
        .unwrap();
    assert_eq!(swapped.recipe_id, Some(salad.id));
    assert_eq!(swapped.meal_type.as_deref(), Some("lunch"));
    assert_eq!(swapped.planned_date, Some(date(8)));

    let cleared = plans
        .update_meal_plan_recipe(
            slot.id,
            MealPlanRecipePatch {
                recipe_id: FieldUpdate::Clear,
                planned_date: FieldUpdate::Clear,
                ..MealPlanRecipePatch::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.recipe_id, None);
    assert_eq!(cleared.planned_date, None);
    assert_eq!(cleared.meal_type.as_deref(), Some("lunch"));
}

#[test]
fn slot_update_to_unknown_recipe_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let (plans, _) = services(&conn);
    let plan = plans.create_meal_plan(week("Week")).unwrap();
    let slot = plans
        .create_meal_plan_recipe(plan.id, slot_for(None, "dinner", 9))
        .unwrap();

    let err = plans
        .update_meal_plan_recipe(
            slot.id,
            MealPlanRecipePatch {
                recipe_id: FieldUpdate::Set(9_999),
                ..MealPlanRecipePatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.code(), "validation");
    assert_eq!(plans.get_meal_plan_recipe(slot.id).unwrap().recipe_id, None);
}

#[test]
fn slot_get_and_delete_by_id() {
    let conn = open_db_in_memory().unwrap();
    let (plans, _) = services(&conn);
    let plan = plans.create_meal_plan(week("Week")).unwrap();
    let slot = plans
        .create_meal_plan_recipe(plan.id, slot_for(None, "snack", 10))
        .unwrap();

    assert_eq!(plans.get_meal_plan_recipe(slot.id).unwrap(), slot);
    let deleted = plans.delete_meal_plan_recipe(slot.id).unwrap();
    assert!(deleted.deleted);
    assert_eq!(
        plans.get_meal_plan_recipe(slot.id).unwrap_err().code(),
        "not_found"
    );
    assert_eq!(
        plans.delete_meal_plan_recipe(slot.id).unwrap_err().code(),
        "not_found"
    );
    assert!(plans.get_meal_plan(plan.id).is_ok());
}
