//! Database configuration module for the cash-flow ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the foreign keys (cascade from
//! type to category to subcategory, restrict from records to every lookup)
//! come straight from the entity relations. Composite uniqueness of lookup
//! names under their parent is added with explicit indexes.

use crate::entities::{
    CashFlowRecord, Category, FlowType, Status, Subcategory, category, subcategory,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/cashflow.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Creates the parent directory of a file-backed `SQLite` URL.
///
/// In-memory and non-`SQLite` URLs are left alone.
pub fn ensure_database_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Establishes a connection to the given database and turns on foreign key
/// enforcement, which `SQLite` leaves off unless asked.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    let db = Database::connect(database_url).await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    Ok(db)
}

/// Creates all ledger tables and indexes if they do not exist yet.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables = [
        schema.create_table_from_entity(Status),
        schema.create_table_from_entity(FlowType),
        schema.create_table_from_entity(Category),
        schema.create_table_from_entity(Subcategory),
        schema.create_table_from_entity(CashFlowRecord),
    ];
    for table in &mut tables {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    let indexes = [
        Index::create()
            .if_not_exists()
            .name("idx_categories_type_name")
            .table(Category)
            .col(category::Column::TypeId)
            .col(category::Column::Name)
            .unique()
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_subcategories_category_name")
            .table(Subcategory)
            .col(subcategory::Column::CategoryId)
            .col(subcategory::Column::Name)
            .unique()
            .to_owned(),
    ];
    for index in &indexes {
        db.execute(builder.build(index)).await?;
    }

    info!("Ledger tables ensured.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CashFlowRecordModel, CategoryModel, StatusModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<StatusModel> = Status::find().limit(1).all(&db).await?;
        let _: Vec<CategoryModel> = Category::find().limit(1).all(&db).await?;
        let _: Vec<CashFlowRecordModel> = CashFlowRecord::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[test]
    fn test_ensure_database_dir_skips_memory() -> Result<()> {
        ensure_database_dir("sqlite::memory:")?;
        ensure_database_dir("postgres://localhost/ledger")?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
