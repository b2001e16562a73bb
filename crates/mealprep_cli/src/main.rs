//! CLI entry point.
//!
//! # Responsibility
//! - Bootstrap the process: config, logging, one store handle.
//! - Dispatch one command to the core services and print JSON.
//! - Release the store handle before exit.

use log::{error, info};
use mealprep_core::{
    core_version, init_logging_from_config, parse_id, ping, with_meal_plan_service,
    with_recipe_service, CoreConfig, Database, NewRecipe, ServiceError,
};
use serde_json::Value;
use std::process::ExitCode;

const USAGE: &str = "usage: mealprep_cli <command>

commands:
  ping                        print core health and version
  recipes                     list newest recipes
  recipe <id>                 show one recipe with ingredients and steps
  add-recipe <json>           create a recipe from a JSON body
  delete-recipe <id>          delete a recipe
  meal-plans                  list newest meal plans
  meal-plan-recipes <id>      list recipe slots of one meal plan";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    if command == "ping" {
        println!("mealprep_core ping={}", ping());
        println!("mealprep_core version={}", core_version());
        return ExitCode::SUCCESS;
    }

    let config = CoreConfig::from_env();
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let db = match Database::open(&config.db_path) {
        Ok(db) => db,
        Err(err) => {
            eprintln!("failed to open {}: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };
    info!("event=cli_command module=cli status=start command={command}");

    let outcome = run(&db, command, &args[1..]);

    if let Err(err) = db.close() {
        error!("event=cli_shutdown module=cli status=error error={err}");
    }

    match outcome {
        Ok(value) => {
            println!("{value:#}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(db: &Database, command: &str, rest: &[String]) -> Result<Value, String> {
    match (command, rest) {
        ("recipes", []) => respond(with_recipe_service(db, |service| service.list_recipes())),
        ("recipe", [raw_id]) => {
            let id = parse_id("id", raw_id).map_err(ServiceError::from);
            respond(id.and_then(|id| {
                with_recipe_service(db, |service| service.get_recipe_detail(id))
            }))
        }
        ("add-recipe", [body]) => {
            let input: NewRecipe =
                serde_json::from_str(body).map_err(|err| format!("invalid body: {err}"))?;
            respond(with_recipe_service(db, |service| service.create_recipe(input)))
        }
        ("delete-recipe", [raw_id]) => {
            let id = parse_id("id", raw_id).map_err(ServiceError::from);
            respond(id.and_then(|id| with_recipe_service(db, |service| service.delete_recipe(id))))
        }
        ("meal-plans", []) => respond(with_meal_plan_service(db, |service| {
            service.list_meal_plans()
        })),
        ("meal-plan-recipes", [raw_id]) => {
            let id = parse_id("id", raw_id).map_err(ServiceError::from);
            respond(id.and_then(|id| {
                with_meal_plan_service(db, |service| service.list_meal_plan_recipes_for_plan(id))
            }))
        }
        _ => Err(USAGE.to_string()),
    }
}

fn respond<T: serde::Serialize>(result: Result<T, ServiceError>) -> Result<Value, String> {
    match result {
        Ok(value) => serde_json::to_value(value).map_err(|err| err.to_string()),
        Err(err) => Err(format!("error[{}]: {err}", err.code())),
    }
}
