//! Reference data business logic - statuses, types, categories and subcategories.
//!
//! Provides create, update, delete and listing for the four lookup tables.
//! Uniqueness of names (globally for statuses and types, per parent for
//! categories and subcategories) is enforced by the database and surfaces as
//! [`Error::Integrity`].
//!
//! Deletes run inside a transaction: records referencing the lookup, or any
//! lookup the delete would cascade to, are counted first and the delete is
//! refused with a readable message. The `Restrict` foreign keys stay in place
//! as a backstop, so a racing insert still cannot leave a partial delete.

use crate::{
    core::form::{INVALID_CHOICE, REQUIRED},
    entities::{
        CashFlowRecord, Category, FlowType, Status, Subcategory, cash_flow_record, category,
        flow_type, status, subcategory,
    },
    errors::{Error, FormErrors, Result},
};
use sea_orm::{
    Condition, DatabaseTransaction, PaginatorTrait, QueryOrder, Set, TransactionTrait,
    prelude::*,
};
use serde::Serialize;
use tracing::info;

/// Longest accepted lookup name, in characters.
pub const NAME_MAX_LEN: usize = 100;

/// Name and description shared by every lookup form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupInput {
    pub name: String,
    pub description: String,
}

impl LookupInput {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Trims and checks the name, returning a cleaned copy.
    pub fn cleaned(&self) -> Result<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormErrors::single("name", REQUIRED).into());
        }
        if name.chars().count() > NAME_MAX_LEN {
            return Err(FormErrors::single(
                "name",
                format!("Ensure this value has at most {NAME_MAX_LEN} characters."),
            )
            .into());
        }
        Ok(Self {
            name: name.to_string(),
            description: self.description.trim().to_string(),
        })
    }
}

/// A category with the name of its type, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub type_id: i64,
    pub type_name: String,
}

/// A subcategory with the name of its category, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubcategoryView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category_id: i64,
    pub category_name: String,
}

/// Every lookup list, as shown on the reference page and used by filter controls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceLists {
    pub statuses: Vec<status::Model>,
    pub types: Vec<flow_type::Model>,
    pub categories: Vec<CategoryView>,
    pub subcategories: Vec<SubcategoryView>,
}

impl ReferenceLists {
    /// Name of a status by id, if present.
    #[must_use]
    pub fn status_name(&self, id: i64) -> Option<&str> {
        self.statuses
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
    }

    /// Name of a type by id, if present.
    #[must_use]
    pub fn type_name(&self, id: i64) -> Option<&str> {
        self.types
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.as_str())
    }

    /// Name of a category by id, if present.
    #[must_use]
    pub fn category_name(&self, id: i64) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    /// Name of a subcategory by id, if present.
    #[must_use]
    pub fn subcategory_name(&self, id: i64) -> Option<&str> {
        self.subcategories
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
    }
}

/// Loads all four lookup lists in display order.
pub async fn load_all(db: &DatabaseConnection) -> Result<ReferenceLists> {
    Ok(ReferenceLists {
        statuses: list_statuses(db).await?,
        types: list_types(db).await?,
        categories: list_categories(db).await?,
        subcategories: list_subcategories(db).await?,
    })
}

/// Retrieves all statuses ordered by name.
pub async fn list_statuses(db: &DatabaseConnection) -> Result<Vec<status::Model>> {
    Status::find()
        .order_by_asc(status::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all types ordered by name.
pub async fn list_types(db: &DatabaseConnection) -> Result<Vec<flow_type::Model>> {
    FlowType::find()
        .order_by_asc(flow_type::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all categories ordered by type name, then name.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<CategoryView>> {
    let rows = Category::find()
        .find_also_related(FlowType)
        .order_by_asc(flow_type::Column::Name)
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(c, t)| CategoryView {
            id: c.id,
            name: c.name,
            description: c.description,
            type_id: c.type_id,
            type_name: t.map(|t| t.name).unwrap_or_default(),
        })
        .collect())
}

/// Retrieves all subcategories ordered by category name, then name.
pub async fn list_subcategories(db: &DatabaseConnection) -> Result<Vec<SubcategoryView>> {
    let rows = Subcategory::find()
        .find_also_related(Category)
        .order_by_asc(category::Column::Name)
        .order_by_asc(subcategory::Column::Name)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(s, c)| SubcategoryView {
            id: s.id,
            name: s.name,
            description: s.description,
            category_id: s.category_id,
            category_name: c.map(|c| c.name).unwrap_or_default(),
        })
        .collect())
}

async fn ensure_unreferenced<C: ConnectionTrait>(
    db: &C,
    condition: Condition,
    what: &str,
    action: &str,
) -> Result<()> {
    let count = CashFlowRecord::find().filter(condition).count(db).await?;
    if count > 0 {
        return Err(Error::Integrity {
            message: format!("{what} is used by {count} record(s) and cannot be {action}"),
        });
    }
    Ok(())
}

async fn subcategory_ids_of<C: ConnectionTrait>(db: &C, category_ids: &[i64]) -> Result<Vec<i64>> {
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(Subcategory::find()
        .filter(subcategory::Column::CategoryId.is_in(category_ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect())
}

/// Records that would break if the category (and its subcategories) went away or moved.
async fn category_usage<C: ConnectionTrait>(db: &C, category_id: i64) -> Result<Condition> {
    let subcategory_ids = subcategory_ids_of(db, &[category_id]).await?;
    let mut condition =
        Condition::any().add(cash_flow_record::Column::CategoryId.eq(category_id));
    if !subcategory_ids.is_empty() {
        condition =
            condition.add(cash_flow_record::Column::SubcategoryId.is_in(subcategory_ids));
    }
    Ok(condition)
}

async fn commit_delete(
    txn: DatabaseTransaction,
    rows_affected: u64,
    entity: &'static str,
    id: i64,
) -> Result<()> {
    if rows_affected == 0 {
        txn.rollback().await?;
        return Err(Error::NotFound { entity, id });
    }
    txn.commit().await?;
    info!("Deleted {} {}", entity, id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

/// Creates a status. Fails with [`Error::Integrity`] if the name is taken.
pub async fn create_status(db: &DatabaseConnection, input: &LookupInput) -> Result<status::Model> {
    let input = input.cleaned()?;
    let model = status::ActiveModel {
        name: Set(input.name),
        description: Set(input.description),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created status {} ({})", model.name, model.id);
    Ok(model)
}

/// Renames or re-describes a status.
pub async fn update_status(
    db: &DatabaseConnection,
    id: i64,
    input: &LookupInput,
) -> Result<status::Model> {
    let input = input.cleaned()?;
    let existing = Status::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "status",
            id,
        })?;
    let mut active: status::ActiveModel = existing.into();
    active.name = Set(input.name);
    active.description = Set(input.description);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a status that no record references.
pub async fn delete_status(db: &DatabaseConnection, id: i64) -> Result<()> {
    let txn = db.begin().await?;
    ensure_unreferenced(
        &txn,
        Condition::all().add(cash_flow_record::Column::StatusId.eq(id)),
        "This status",
        "deleted",
    )
    .await?;
    let result = Status::delete_by_id(id).exec(&txn).await?;
    commit_delete(txn, result.rows_affected, "status", id).await
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Creates a type. Fails with [`Error::Integrity`] if the name is taken.
pub async fn create_type(db: &DatabaseConnection, input: &LookupInput) -> Result<flow_type::Model> {
    let input = input.cleaned()?;
    let model = flow_type::ActiveModel {
        name: Set(input.name),
        description: Set(input.description),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created type {} ({})", model.name, model.id);
    Ok(model)
}

/// Renames or re-describes a type.
pub async fn update_type(
    db: &DatabaseConnection,
    id: i64,
    input: &LookupInput,
) -> Result<flow_type::Model> {
    let input = input.cleaned()?;
    let existing = FlowType::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "type", id })?;
    let mut active: flow_type::ActiveModel = existing.into();
    active.name = Set(input.name);
    active.description = Set(input.description);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a type together with its categories and their subcategories.
///
/// Refused when any record references the type or one of those descendants.
pub async fn delete_type(db: &DatabaseConnection, id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let category_ids: Vec<i64> = Category::find()
        .filter(category::Column::TypeId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    let subcategory_ids = subcategory_ids_of(&txn, &category_ids).await?;

    let mut usage = Condition::any().add(cash_flow_record::Column::TypeId.eq(id));
    if !category_ids.is_empty() {
        usage = usage.add(cash_flow_record::Column::CategoryId.is_in(category_ids));
    }
    if !subcategory_ids.is_empty() {
        usage = usage.add(cash_flow_record::Column::SubcategoryId.is_in(subcategory_ids));
    }
    ensure_unreferenced(&txn, usage, "This type or one of its categories", "deleted").await?;

    let result = FlowType::delete_by_id(id).exec(&txn).await?;
    commit_delete(txn, result.rows_affected, "type", id).await
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

async fn require_type<C: ConnectionTrait>(db: &C, type_id: i64) -> Result<flow_type::Model> {
    FlowType::find_by_id(type_id)
        .one(db)
        .await?
        .ok_or_else(|| FormErrors::single("type", INVALID_CHOICE).into())
}

/// Creates a category under a type. The name must be unique within that type.
pub async fn create_category(
    db: &DatabaseConnection,
    input: &LookupInput,
    type_id: i64,
) -> Result<category::Model> {
    let input = input.cleaned()?;
    require_type(db, type_id).await?;
    let model = category::ActiveModel {
        name: Set(input.name),
        description: Set(input.description),
        type_id: Set(type_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created category {} ({}) under type {}", model.name, model.id, type_id);
    Ok(model)
}

/// Updates a category, optionally moving it to another type.
///
/// Moving is refused while records reference the category or its
/// subcategories, because their type would no longer match. The check and the
/// update share one transaction.
pub async fn update_category(
    db: &DatabaseConnection,
    id: i64,
    input: &LookupInput,
    type_id: i64,
) -> Result<category::Model> {
    let input = input.cleaned()?;
    let txn = db.begin().await?;
    let existing = Category::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "category",
            id,
        })?;
    if existing.type_id != type_id {
        require_type(&txn, type_id).await?;
        let usage = category_usage(&txn, id).await?;
        ensure_unreferenced(&txn, usage, "This category", "moved to another type").await?;
    }
    let mut active: category::ActiveModel = existing.into();
    active.name = Set(input.name);
    active.description = Set(input.description);
    active.type_id = Set(type_id);
    let model = active.update(&txn).await?;
    txn.commit().await?;
    Ok(model)
}

/// Deletes a category together with its subcategories.
pub async fn delete_category(db: &DatabaseConnection, id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let usage = category_usage(&txn, id).await?;
    ensure_unreferenced(&txn, usage, "This category or one of its subcategories", "deleted")
        .await?;
    let result = Category::delete_by_id(id).exec(&txn).await?;
    commit_delete(txn, result.rows_affected, "category", id).await
}

// ---------------------------------------------------------------------------
// Subcategories
// ---------------------------------------------------------------------------

async fn require_category<C: ConnectionTrait>(
    db: &C,
    category_id: i64,
) -> Result<category::Model> {
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| FormErrors::single("category", INVALID_CHOICE).into())
}

/// Creates a subcategory under a category. The name must be unique within that category.
pub async fn create_subcategory(
    db: &DatabaseConnection,
    input: &LookupInput,
    category_id: i64,
) -> Result<subcategory::Model> {
    let input = input.cleaned()?;
    require_category(db, category_id).await?;
    let model = subcategory::ActiveModel {
        name: Set(input.name),
        description: Set(input.description),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(
        "Created subcategory {} ({}) under category {}",
        model.name, model.id, category_id
    );
    Ok(model)
}

/// Updates a subcategory, optionally moving it to another category.
///
/// Same transaction rule as [`update_category`].
pub async fn update_subcategory(
    db: &DatabaseConnection,
    id: i64,
    input: &LookupInput,
    category_id: i64,
) -> Result<subcategory::Model> {
    let input = input.cleaned()?;
    let txn = db.begin().await?;
    let existing = Subcategory::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "subcategory",
            id,
        })?;
    if existing.category_id != category_id {
        require_category(&txn, category_id).await?;
        ensure_unreferenced(
            &txn,
            Condition::all().add(cash_flow_record::Column::SubcategoryId.eq(id)),
            "This subcategory",
            "moved to another category",
        )
        .await?;
    }
    let mut active: subcategory::ActiveModel = existing.into();
    active.name = Set(input.name);
    active.description = Set(input.description);
    active.category_id = Set(category_id);
    let model = active.update(&txn).await?;
    txn.commit().await?;
    Ok(model)
}

/// Deletes a subcategory that no record references.
pub async fn delete_subcategory(db: &DatabaseConnection, id: i64) -> Result<()> {
    let txn = db.begin().await?;
    ensure_unreferenced(
        &txn,
        Condition::all().add(cash_flow_record::Column::SubcategoryId.eq(id)),
        "This subcategory",
        "deleted",
    )
    .await?;
    let result = Subcategory::delete_by_id(id).exec(&txn).await?;
    commit_delete(txn, result.rows_affected, "subcategory", id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::record::create_record;
    use crate::test_utils::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_create_and_list_in_name_order() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;

        let lists = load_all(&db).await?;
        let statuses: Vec<&str> = lists.statuses.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(statuses, vec!["Бизнес", "Личное"]);
        assert_eq!(lists.categories.len(), 2);
        assert_eq!(lists.category_name(h.salary.id), Some("Зарплата"));
        assert_eq!(lists.subcategories[0].category_name, "Зарплата");
        assert_eq!(lists.type_name(9999), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_status(&db, &LookupInput::new("   ", "nothing")).await;
        match result {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.fields["name"], vec![REQUIRED]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let too_long = "я".repeat(NAME_MAX_LEN + 1);
        let result = create_type(&db, &LookupInput::new(too_long, "")).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_names() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;

        let dup_status = create_status(&db, &LookupInput::new("Личное", "")).await;
        assert!(matches!(dup_status, Err(Error::Integrity { .. })));

        let dup_category = create_test_category(&db, "Зарплата", h.income.id).await;
        assert!(matches!(dup_category, Err(Error::Integrity { .. })));

        // The same name under another type is a different category.
        let other = create_test_category(&db, "Зарплата", h.expense.id).await?;
        assert_eq!(other.type_id, h.expense.id);

        let dup_sub = create_test_subcategory(&db, "Премия", h.salary.id).await;
        assert!(matches!(dup_sub, Err(Error::Integrity { .. })));
        create_test_subcategory(&db, "Премия", h.groceries.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_parent_is_invalid_choice() -> Result<()> {
        let db = setup_test_db().await?;
        match create_category(&db, &LookupInput::new("Прочее", ""), 9999).await {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.fields["type"], vec![INVALID_CHOICE]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_type_cascades_to_descendants() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;

        delete_type(&db, h.income.id).await?;

        assert!(FlowType::find_by_id(h.income.id).one(&db).await?.is_none());
        assert!(Category::find_by_id(h.salary.id).one(&db).await?.is_none());
        assert!(Subcategory::find_by_id(h.bonus.id).one(&db).await?.is_none());
        // The other branch is untouched.
        assert!(Category::find_by_id(h.groceries.id).one(&db).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_category_cascades_to_subcategories() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;
        let delivery = create_test_subcategory(&db, "Доставка еды", h.groceries.id).await?;

        delete_category(&db, h.groceries.id).await?;

        assert!(Category::find_by_id(h.groceries.id).one(&db).await?.is_none());
        assert!(Subcategory::find_by_id(h.market.id).one(&db).await?.is_none());
        assert!(Subcategory::find_by_id(delivery.id).one(&db).await?.is_none());
        // Siblings under other categories survive, and so does the type.
        assert!(Subcategory::find_by_id(h.bonus.id).one(&db).await?.is_some());
        assert!(FlowType::find_by_id(h.expense.id).one(&db).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_referenced_lookups_cannot_be_deleted() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;
        create_record(&db, &h.income_input(date(2024, 4, 1), Decimal::from(10))).await?;

        assert!(matches!(
            delete_status(&db, h.personal.id).await,
            Err(Error::Integrity { .. })
        ));
        assert!(matches!(
            delete_type(&db, h.income.id).await,
            Err(Error::Integrity { .. })
        ));
        assert!(matches!(
            delete_category(&db, h.salary.id).await,
            Err(Error::Integrity { .. })
        ));
        assert!(matches!(
            delete_subcategory(&db, h.bonus.id).await,
            Err(Error::Integrity { .. })
        ));

        let lists = load_all(&db).await?;
        assert_eq!(lists.statuses.len(), 2);
        assert_eq!(lists.types.len(), 2);
        assert_eq!(lists.categories.len(), 2);
        assert_eq!(lists.subcategories.len(), 2);

        // Unused lookups still go.
        delete_status(&db, h.business.id).await?;
        delete_subcategory(&db, h.market.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            delete_status(&db, 42).await,
            Err(Error::NotFound { entity: "status", id: 42 })
        ));
        assert!(matches!(
            delete_category(&db, 42).await,
            Err(Error::NotFound { entity: "category", .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_refused_reparent_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;
        create_record(&db, &h.income_input(date(2024, 4, 1), Decimal::from(10))).await?;

        let result = update_category(
            &db,
            h.salary.id,
            &LookupInput::new("Оклад", "renamed"),
            h.expense.id,
        )
        .await;
        assert!(matches!(result, Err(Error::Integrity { .. })));
        let stored = Category::find_by_id(h.salary.id).one(&db).await?.unwrap();
        assert_eq!(stored, h.salary);

        let result = update_subcategory(
            &db,
            h.bonus.id,
            &LookupInput::new("Бонус", ""),
            h.groceries.id,
        )
        .await;
        assert!(matches!(result, Err(Error::Integrity { .. })));
        let stored = Subcategory::find_by_id(h.bonus.id).one(&db).await?.unwrap();
        assert_eq!(stored, h.bonus);

        // The connection is usable again once the refused update rolled back.
        let moved = update_subcategory(
            &db,
            h.market.id,
            &LookupInput::new("Рынок", ""),
            h.salary.id,
        )
        .await?;
        assert_eq!(moved.category_id, h.salary.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_reparent() -> Result<()> {
        let db = setup_test_db().await?;
        let h = seed_test_hierarchy(&db).await?;

        let renamed = update_status(&db, h.personal.id, &LookupInput::new(" Семья ", "")).await?;
        assert_eq!(renamed.name, "Семья");

        // Unused categories may move freely.
        let moved = update_category(
            &db,
            h.groceries.id,
            &LookupInput::new("Продукты", ""),
            h.income.id,
        )
        .await?;
        assert_eq!(moved.type_id, h.income.id);

        create_record(&db, &h.income_input(date(2024, 4, 1), Decimal::from(10))).await?;
        let result = update_category(
            &db,
            h.salary.id,
            &LookupInput::new("Зарплата", ""),
            h.expense.id,
        )
        .await;
        assert!(matches!(result, Err(Error::Integrity { .. })));

        let result = update_subcategory(
            &db,
            h.bonus.id,
            &LookupInput::new("Премия", ""),
            h.groceries.id,
        )
        .await;
        assert!(matches!(result, Err(Error::Integrity { .. })));

        // Renaming in place is still allowed.
        let renamed = update_category(
            &db,
            h.salary.id,
            &LookupInput::new("Оклад", "основной доход"),
            h.income.id,
        )
        .await?;
        assert_eq!(renamed.description, "основной доход");

        assert!(matches!(
            update_type(&db, 9999, &LookupInput::new("x", "")).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }
}
