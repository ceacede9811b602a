//! Shared test utilities for the ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating reference rows and record inputs with sensible defaults.

use crate::{
    config::database::{create_connection, create_tables},
    core::{
        record::RecordInput,
        reference::{self, LookupInput},
    },
    entities::{category, flow_type, status, subcategory},
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = create_connection("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

pub async fn create_test_status(db: &DatabaseConnection, name: &str) -> Result<status::Model> {
    reference::create_status(db, &LookupInput::new(name, "")).await
}

pub async fn create_test_type(db: &DatabaseConnection, name: &str) -> Result<flow_type::Model> {
    reference::create_type(db, &LookupInput::new(name, "")).await
}

pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
    type_id: i64,
) -> Result<category::Model> {
    reference::create_category(db, &LookupInput::new(name, ""), type_id).await
}

pub async fn create_test_subcategory(
    db: &DatabaseConnection,
    name: &str,
    category_id: i64,
) -> Result<subcategory::Model> {
    reference::create_subcategory(db, &LookupInput::new(name, ""), category_id).await
}

/// A small two-branch classification tree.
///
/// * Пополнение → Зарплата → Премия
/// * Списание → Продукты → Рынок
pub struct TestHierarchy {
    pub personal: status::Model,
    pub business: status::Model,
    pub income: flow_type::Model,
    pub expense: flow_type::Model,
    pub salary: category::Model,
    pub groceries: category::Model,
    pub bonus: subcategory::Model,
    pub market: subcategory::Model,
}

impl TestHierarchy {
    /// A valid income input for the given date and amount.
    #[must_use]
    pub fn income_input(&self, date: NaiveDate, amount: Decimal) -> RecordInput {
        RecordInput {
            date,
            status_id: self.personal.id,
            type_id: self.income.id,
            category_id: self.salary.id,
            subcategory_id: self.bonus.id,
            amount,
            comment: String::new(),
        }
    }

    /// A valid expense input for the given date and amount.
    #[must_use]
    pub fn expense_input(&self, date: NaiveDate, amount: Decimal) -> RecordInput {
        RecordInput {
            date,
            status_id: self.business.id,
            type_id: self.expense.id,
            category_id: self.groceries.id,
            subcategory_id: self.market.id,
            amount,
            comment: String::new(),
        }
    }
}

/// Seeds [`TestHierarchy`] into the database.
pub async fn seed_test_hierarchy(db: &DatabaseConnection) -> Result<TestHierarchy> {
    let personal = create_test_status(db, "Личное").await?;
    let business = create_test_status(db, "Бизнес").await?;
    let income = create_test_type(db, "Пополнение").await?;
    let expense = create_test_type(db, "Списание").await?;
    let salary = create_test_category(db, "Зарплата", income.id).await?;
    let groceries = create_test_category(db, "Продукты", expense.id).await?;
    let bonus = create_test_subcategory(db, "Премия", salary.id).await?;
    let market = create_test_subcategory(db, "Рынок", groceries.id).await?;
    Ok(TestHierarchy {
        personal,
        business,
        income,
        expense,
        salary,
        groceries,
        bonus,
        market,
    })
}

/// Builds a date, panicking on an impossible one. Test-only.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
