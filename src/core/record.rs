//! Cash-flow record business logic - create, edit, delete and display.
//!
//! Every write goes through [`validate_input`], which checks the amount, makes
//! sure all four referenced lookups exist and applies the hierarchy rule. The
//! entity's `before_save` hook repeats the amount and hierarchy checks at the
//! storage layer, so there is no write path that skips them.

use crate::{
    core::{
        form::INVALID_CHOICE,
        hierarchy,
        reference::ReferenceLists,
    },
    entities::{CashFlowRecord, Category, FlowType, Status, Subcategory, cash_flow_record},
    errors::{Error, FormErrors, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{Set, prelude::*};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Decimal places kept for amounts.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;
/// Total significant digits allowed for an amount, decimals included.
pub const AMOUNT_MAX_DIGITS: u32 = 12;

/// Reasons an amount is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Ensure this value is greater than or equal to 0.01.")]
    NotPositive,
    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimals,
    #[error("Ensure that there are no more than 12 digits in total.")]
    TooManyDigits,
}

/// Converts an amount to kopecks, enforcing the positive, two-decimal rule.
///
/// Decimal places are counted as written: `12.500` has three and is rejected.
pub fn amount_to_cents(amount: Decimal) -> std::result::Result<i64, AmountError> {
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    if amount.scale() > AMOUNT_DECIMAL_PLACES {
        return Err(AmountError::TooManyDecimals);
    }
    let normalized = amount.normalize();
    let limit = Decimal::from(10_i64.pow(AMOUNT_MAX_DIGITS - AMOUNT_DECIMAL_PLACES));
    if normalized >= limit {
        return Err(AmountError::TooManyDigits);
    }
    (normalized * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .ok_or(AmountError::TooManyDigits)
}

/// A fully typed record, ready to be validated and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInput {
    pub date: NaiveDate,
    pub status_id: i64,
    pub type_id: i64,
    pub category_id: i64,
    pub subcategory_id: i64,
    pub amount: Decimal,
    pub comment: String,
}

/// Validates a record input against the database and returns the amount in kopecks.
///
/// # Errors
/// - [`Error::InvalidAmount`] for a non-positive or over-precise amount
/// - [`Error::Validation`] naming every lookup field whose id does not exist
/// - [`Error::Hierarchy`] when the category or subcategory is under another parent
pub async fn validate_input<C: ConnectionTrait>(db: &C, input: &RecordInput) -> Result<i64> {
    let cents = amount_to_cents(input.amount).map_err(|reason| Error::InvalidAmount {
        amount: input.amount.to_string(),
        reason,
    })?;

    let mut errors = FormErrors::default();
    if Status::find_by_id(input.status_id).one(db).await?.is_none() {
        errors.add("status", INVALID_CHOICE);
    }
    if FlowType::find_by_id(input.type_id).one(db).await?.is_none() {
        errors.add("type", INVALID_CHOICE);
    }
    let category = Category::find_by_id(input.category_id).one(db).await?;
    if category.is_none() {
        errors.add("category", INVALID_CHOICE);
    }
    let subcategory = Subcategory::find_by_id(input.subcategory_id).one(db).await?;
    if subcategory.is_none() {
        errors.add("subcategory", INVALID_CHOICE);
    }

    match (category, subcategory) {
        (Some(category), Some(subcategory)) if errors.is_empty() => {
            hierarchy::check(input.type_id, &category, &subcategory)?;
            Ok(cents)
        }
        _ => {
            debug!("Record input rejected: {}", errors);
            Err(Error::Validation(errors))
        }
    }
}

/// Retrieves a specific record by its unique ID.
pub async fn get_record(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<cash_flow_record::Model>> {
    CashFlowRecord::find_by_id(id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a record by ID, failing with [`Error::NotFound`] if it is missing.
pub async fn find_record(db: &DatabaseConnection, id: i64) -> Result<cash_flow_record::Model> {
    get_record(db, id).await?.ok_or(Error::NotFound {
        entity: "record",
        id,
    })
}

/// Creates a new record after full validation.
pub async fn create_record(
    db: &DatabaseConnection,
    input: &RecordInput,
) -> Result<cash_flow_record::Model> {
    let cents = validate_input(db, input).await?;
    let model = cash_flow_record::ActiveModel {
        date: Set(input.date),
        status_id: Set(input.status_id),
        type_id: Set(input.type_id),
        category_id: Set(input.category_id),
        subcategory_id: Set(input.subcategory_id),
        amount_cents: Set(cents),
        comment: Set(input.comment.clone()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created record {} dated {} for {}", model.id, model.date, model.amount());
    Ok(model)
}

/// Replaces every editable field of an existing record after re-validation.
///
/// Concurrent edits are last-write-wins.
pub async fn update_record(
    db: &DatabaseConnection,
    id: i64,
    input: &RecordInput,
) -> Result<cash_flow_record::Model> {
    let existing = find_record(db, id).await?;
    let cents = validate_input(db, input).await?;

    let mut active: cash_flow_record::ActiveModel = existing.into();
    active.date = Set(input.date);
    active.status_id = Set(input.status_id);
    active.type_id = Set(input.type_id);
    active.category_id = Set(input.category_id);
    active.subcategory_id = Set(input.subcategory_id);
    active.amount_cents = Set(cents);
    active.comment = Set(input.comment.clone());

    let model = active.update(db).await?;
    info!("Updated record {}", model.id);
    Ok(model)
}

/// Permanently deletes a record.
pub async fn delete_record(db: &DatabaseConnection, id: i64) -> Result<()> {
    let result = CashFlowRecord::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "record",
            id,
        });
    }
    info!("Deleted record {}", id);
    Ok(())
}

/// An `{id, name}` reference to a lookup row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

/// A record with its lookups resolved to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub id: i64,
    pub date: NaiveDate,
    pub status: NamedRef,
    #[serde(rename = "type")]
    pub flow_type: NamedRef,
    pub category: NamedRef,
    pub subcategory: NamedRef,
    pub amount: Decimal,
    pub comment: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl RecordView {
    /// Resolves the lookup names of a record from already-loaded lists.
    #[must_use]
    pub fn build(record: &cash_flow_record::Model, lists: &ReferenceLists) -> Self {
        let named = |id: i64, name: Option<&str>| NamedRef {
            id,
            name: name.unwrap_or_default().to_string(),
        };
        Self {
            id: record.id,
            date: record.date,
            status: named(record.status_id, lists.status_name(record.status_id)),
            flow_type: named(record.type_id, lists.type_name(record.type_id)),
            category: named(record.category_id, lists.category_name(record.category_id)),
            subcategory: named(
                record.subcategory_id,
                lists.subcategory_name(record.subcategory_id),
            ),
            amount: record.amount(),
            comment: record.comment.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::reference;
    use crate::test_utils::*;
    use sea_orm::{ActiveModelTrait, PaginatorTrait};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_amount_to_cents() {
        assert_eq!(amount_to_cents(dec("1000.00")), Ok(100_000));
        assert_eq!(amount_to_cents(dec("0.01")), Ok(1));
        assert_eq!(amount_to_cents(dec("12.50")), Ok(1250));
        assert_eq!(
            amount_to_cents(dec("12.500")),
            Err(AmountError::TooManyDecimals)
        );
        assert_eq!(amount_to_cents(dec("0")), Err(AmountError::NotPositive));
        assert_eq!(amount_to_cents(dec("-5")), Err(AmountError::NotPositive));
        assert_eq!(
            amount_to_cents(dec("1.005")),
            Err(AmountError::TooManyDecimals)
        );
        assert_eq!(
            amount_to_cents(dec("9999999999.99")),
            Ok(999_999_999_999)
        );
        assert_eq!(
            amount_to_cents(dec("10000000000")),
            Err(AmountError::TooManyDigits)
        );
    }

    #[tokio::test]
    async fn test_create_valid_record() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;

        let record = create_record(&db, &h.income_input(date(2024, 3, 1), dec("1000.00"))).await?;

        assert_eq!(record.type_id, h.income.id);
        assert_eq!(record.category_id, h.salary.id);
        assert_eq!(record.subcategory_id, h.bonus.id);
        assert_eq!(record.amount(), dec("1000.00"));
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(find_record(&db, record.id).await?, record);
        Ok(())
    }

    #[tokio::test]
    async fn test_subcategory_from_other_category_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;

        let mut input = h.income_input(date(2024, 3, 1), dec("1000.00"));
        input.subcategory_id = h.market.id;
        let result = create_record(&db, &input).await;

        assert!(matches!(
            result,
            Err(Error::Hierarchy(
                hierarchy::HierarchyError::SubcategoryCategoryMismatch { .. }
            ))
        ));
        assert_eq!(CashFlowRecord::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_category_from_other_type_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;

        let mut input = h.expense_input(date(2024, 3, 1), dec("10"));
        input.type_id = h.income.id;
        let result = create_record(&db, &input).await;

        assert!(matches!(
            result,
            Err(Error::Hierarchy(
                hierarchy::HierarchyError::CategoryTypeMismatch { .. }
            ))
        ));
        assert_eq!(CashFlowRecord::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_amount_and_unknown_lookup() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;

        let zero = create_record(&db, &h.income_input(date(2024, 3, 1), dec("0"))).await;
        assert!(matches!(
            zero,
            Err(Error::InvalidAmount {
                reason: AmountError::NotPositive,
                ..
            })
        ));

        let mut input = h.income_input(date(2024, 3, 1), dec("5"));
        input.status_id = 9999;
        match create_record(&db, &input).await {
            Err(Error::Validation(errors)) => assert!(errors.has_field("status")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(CashFlowRecord::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_record_revalidates() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;
        let record = create_record(&db, &h.income_input(date(2024, 3, 1), dec("100"))).await?;

        let mut broken = h.income_input(date(2024, 3, 2), dec("200"));
        broken.category_id = h.groceries.id;
        broken.subcategory_id = h.market.id;
        assert!(update_record(&db, record.id, &broken).await.is_err());
        assert_eq!(find_record(&db, record.id).await?.amount(), dec("100"));

        let mut moved = h.expense_input(date(2024, 3, 2), dec("200.50"));
        moved.comment = "market run".to_string();
        let updated = update_record(&db, record.id, &moved).await?;
        assert_eq!(updated.type_id, h.expense.id);
        assert_eq!(updated.amount(), dec("200.50"));
        assert_eq!(updated.comment, "market run");
        assert_eq!(updated.created_at, record.created_at);
        assert!(updated.updated_at >= record.updated_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_record() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;
        let input = h.income_input(date(2024, 3, 1), dec("1"));

        assert!(matches!(
            update_record(&db, 42, &input).await,
            Err(Error::NotFound { id: 42, .. })
        ));
        assert!(matches!(
            delete_record(&db, 42).await,
            Err(Error::NotFound { id: 42, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_record() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;
        let record = create_record(&db, &h.income_input(date(2024, 3, 1), dec("1"))).await?;

        delete_record(&db, record.id).await?;
        assert!(get_record(&db, record.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_hook_rejects_direct_inconsistent_insert() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;

        let result = cash_flow_record::ActiveModel {
            date: Set(date(2024, 3, 1)),
            status_id: Set(h.personal.id),
            type_id: Set(h.income.id),
            category_id: Set(h.salary.id),
            subcategory_id: Set(h.market.id),
            amount_cents: Set(100),
            comment: Set(String::new()),
            ..Default::default()
        }
        .insert(&db)
        .await;

        assert!(result.is_err());
        assert_eq!(CashFlowRecord::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_hook_checks_partial_updates() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;
        let record = create_record(&db, &h.income_input(date(2024, 3, 1), dec("1"))).await?;

        let partial = cash_flow_record::ActiveModel {
            id: sea_orm::ActiveValue::Unchanged(record.id),
            subcategory_id: Set(h.market.id),
            ..Default::default()
        };
        assert!(partial.update(&db).await.is_err());

        let negative = cash_flow_record::ActiveModel {
            id: sea_orm::ActiveValue::Unchanged(record.id),
            amount_cents: Set(-5),
            ..Default::default()
        };
        assert!(negative.update(&db).await.is_err());

        assert_eq!(find_record(&db, record.id).await?, record);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_view_resolves_names() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;
        let record = create_record(&db, &h.income_input(date(2024, 3, 1), dec("7.5"))).await?;
        let lists = reference::load_all(&db).await?;

        let view = RecordView::build(&record, &lists);
        assert_eq!(view.flow_type.name, "Пополнение");
        assert_eq!(view.category.name, "Зарплата");
        assert_eq!(view.subcategory.name, "Премия");
        assert_eq!(view.status.name, "Личное");
        assert_eq!(view.amount, dec("7.50"));
        Ok(())
    }
}
