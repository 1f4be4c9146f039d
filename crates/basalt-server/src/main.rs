//! Basalt server — application entry point.
//!
//! Connects to SurrealDB, applies migrations and optionally bootstraps
//! a platform-operator credential from `BASALT_SUPERDOG_LOGIN` /
//! `BASALT_SUPERDOG_PASSWORD` before the transport layers start.

use std::env;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use basalt_auth::{AuthConfig, CredentialService};
use basalt_db::{DbConfig, DbManager, SurrealCredentialStore, run_migrations};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("basalt=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting basalt server...");

    let config = DbConfig::from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Database connection failed");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Migrations failed");
        return ExitCode::FAILURE;
    }

    if let (Ok(login), Ok(password)) = (
        env::var("BASALT_SUPERDOG_LOGIN"),
        env::var("BASALT_SUPERDOG_PASSWORD"),
    ) {
        let store = SurrealCredentialStore::new(manager.client().clone());
        let service = CredentialService::new(store, AuthConfig::default());
        if let Err(e) = service.bootstrap_superdog(&login, &password).await {
            tracing::error!(error = %e, "Operator bootstrap failed");
            return ExitCode::FAILURE;
        }
    }

    // TODO: Start REST API server

    tracing::info!("Basalt server stopped.");
    ExitCode::SUCCESS
}
