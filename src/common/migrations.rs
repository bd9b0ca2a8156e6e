// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created if missing. Setting RESET_DB=true drops everything
/// first, which loses all user accounts and loaded indicator rows.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("RESET_DB=true - dropping all tables and recreating schema");
        drop_all_tables(pool).await?;
    }

    create_user_tables(pool).await?;
    create_indicator_tables(pool).await?;
    create_indexes(pool).await?;

    info!("Database migration completed");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let tables = [
        "users",
        "jwt_token_blocklist",
        "education_data",
        "agriculture_data",
        "economic_data",
    ];

    for table in tables {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// User accounts and the JWT revocation list
async fn create_user_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            email TEXT UNIQUE,
            password TEXT,
            jwt_auth_active INTEGER NOT NULL DEFAULT 0,
            date_joined TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only; rows are only ever read back by exact token match
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jwt_token_blocklist (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            jwt_token TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Three structurally identical long-format indicator tables, one per sector.
/// Rows are bulk-loaded out of band; the API never writes them.
async fn create_indicator_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let tables = ["education_data", "agriculture_data", "economic_data"];

    for table in tables {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                province TEXT,
                series_name TEXT,
                indicator_value REAL,
                indicator TEXT,
                year TEXT,
                series_code TEXT,
                sector TEXT,
                subsector_1 TEXT,
                subsector_2 TEXT,
                source TEXT,
                latitude TEXT,
                longitude TEXT,
                indicator_unit TEXT,
                tag TEXT,
                filters TEXT
            )
            "#,
            table
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
        "CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)",
        "CREATE INDEX IF NOT EXISTS idx_blocklist_token ON jwt_token_blocklist(jwt_token)",
        "CREATE INDEX IF NOT EXISTS idx_education_subsector ON education_data(subsector_1)",
        "CREATE INDEX IF NOT EXISTS idx_agriculture_subsector ON agriculture_data(subsector_1)",
        "CREATE INDEX IF NOT EXISTS idx_economic_subsector ON economic_data(subsector_1)",
    ];

    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}
