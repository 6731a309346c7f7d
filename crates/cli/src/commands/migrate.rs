use customers_core::config::{AppConfig, LoadOptions};
use customers_db::{connect_with_config, migrations};

use crate::commands::{CommandResult, ErrorClass};

pub fn run() -> CommandResult {
    run_with(LoadOptions::default())
}

pub fn run_with(options: LoadOptions) -> CommandResult {
    CommandResult::from_outcome("migrate", apply(options))
}

fn apply(options: LoadOptions) -> Result<String, (ErrorClass, String)> {
    let config = AppConfig::load(options).map_err(|error| {
        (ErrorClass::ConfigValidation, format!("configuration issue: {error}"))
    })?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(
        |error| (ErrorClass::RuntimeInit, format!("failed to initialize async runtime: {error}")),
    )?;

    runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| (ErrorClass::DbConnectivity, error.to_string()))?;
        let outcome = migrations::run_pending(&pool)
            .await
            .map_err(|error| (ErrorClass::Migration, error.to_string()));
        pool.close().await;
        outcome
    })?;

    Ok("applied pending migrations".to_string())
}
