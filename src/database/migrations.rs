//! Database Migrations
//!
//! Embedded refinery migrations for tokio-postgres, run at startup.

use anyhow::{Context, Result};
use deadpool_postgres::Pool;
use std::ops::DerefMut;

refinery::embed_migrations!("migrations");

/// Run all pending migrations
pub async fn run_migrations(pool: &Pool) -> Result<()> {
    tracing::info!("Running database migrations...");

    let mut client = pool
        .get()
        .await
        .context("Failed to get connection for migrations")?;

    let report = migrations::runner()
        .run_async(client.deref_mut().deref_mut())
        .await
        .context("Failed to run migrations")?;

    for migration in report.applied_migrations() {
        tracing::info!("Applied migration: {}", migration);
    }

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
