//! Reference data seeding and subcategory backfill.
//!
//! Both operations run inside a single database transaction: a failure part
//! way through leaves the reference tables exactly as they were.

use crate::{
    config::reference::{BackfillConfig, ReferenceConfig},
    entities::{
        CashFlowRecord, Category, FlowType, Status, Subcategory, category, flow_type, status,
        subcategory,
    },
    errors::{Error, Result},
};
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Row counts after a seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub statuses: u64,
    pub types: u64,
    pub categories: u64,
    pub subcategories: u64,
    /// Rows inserted by this run
    pub created: u64,
}

async fn get_or_create_status(
    txn: &DatabaseTransaction,
    name: &str,
    description: &str,
) -> Result<(status::Model, bool)> {
    if let Some(existing) = Status::find()
        .filter(status::Column::Name.eq(name))
        .one(txn)
        .await?
    {
        return Ok((existing, false));
    }
    let model = status::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    debug!("Created status: {}", model.name);
    Ok((model, true))
}

async fn get_or_create_type(
    txn: &DatabaseTransaction,
    name: &str,
    description: &str,
) -> Result<(flow_type::Model, bool)> {
    if let Some(existing) = FlowType::find()
        .filter(flow_type::Column::Name.eq(name))
        .one(txn)
        .await?
    {
        return Ok((existing, false));
    }
    let model = flow_type::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    debug!("Created type: {}", model.name);
    Ok((model, true))
}

async fn get_or_create_category(
    txn: &DatabaseTransaction,
    name: &str,
    description: &str,
    type_id: i64,
) -> Result<(category::Model, bool)> {
    if let Some(existing) = Category::find()
        .filter(category::Column::Name.eq(name))
        .filter(category::Column::TypeId.eq(type_id))
        .one(txn)
        .await?
    {
        return Ok((existing, false));
    }
    let model = category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        type_id: Set(type_id),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    debug!("Created category: {}", model.name);
    Ok((model, true))
}

async fn get_or_create_subcategory(
    txn: &DatabaseTransaction,
    name: &str,
    category_id: i64,
) -> Result<bool> {
    let exists = Subcategory::find()
        .filter(subcategory::Column::Name.eq(name))
        .filter(subcategory::Column::CategoryId.eq(category_id))
        .one(txn)
        .await?
        .is_some();
    if exists {
        return Ok(false);
    }
    subcategory::ActiveModel {
        name: Set(name.to_string()),
        description: Set(String::new()),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    debug!("Created subcategory: {}", name);
    Ok(true)
}

/// Seeds statuses, types, categories and subcategories from `config`.
///
/// Existing rows are kept (get-or-create by name and parent). With `reset`,
/// all reference rows are removed first; that is refused while any record
/// exists, since records protect the lookups they use.
#[instrument(skip(db, config))]
pub async fn seed_reference_data(
    db: &DatabaseConnection,
    config: &ReferenceConfig,
    reset: bool,
) -> Result<SeedSummary> {
    let txn = db.begin().await?;

    if reset {
        let records = CashFlowRecord::find().count(&txn).await?;
        if records > 0 {
            return Err(Error::Integrity {
                message: format!(
                    "cannot reset reference data while {records} record(s) reference it"
                ),
            });
        }
        info!("Resetting existing reference data...");
        Subcategory::delete_many().exec(&txn).await?;
        Category::delete_many().exec(&txn).await?;
        FlowType::delete_many().exec(&txn).await?;
        Status::delete_many().exec(&txn).await?;
    }

    let mut created = 0_u64;
    for entry in &config.statuses {
        let (_, new) = get_or_create_status(&txn, &entry.name, &entry.description).await?;
        created += u64::from(new);
    }
    for type_entry in &config.types {
        let (flow_type, new) =
            get_or_create_type(&txn, &type_entry.name, &type_entry.description).await?;
        created += u64::from(new);
        for category_entry in &type_entry.categories {
            let (category, new) = get_or_create_category(
                &txn,
                &category_entry.name,
                &category_entry.description,
                flow_type.id,
            )
            .await?;
            created += u64::from(new);
            for name in &category_entry.subcategories {
                created += u64::from(get_or_create_subcategory(&txn, name, category.id).await?);
            }
        }
    }

    let summary = SeedSummary {
        statuses: Status::find().count(&txn).await?,
        types: FlowType::find().count(&txn).await?,
        categories: Category::find().count(&txn).await?,
        subcategories: Subcategory::find().count(&txn).await?,
        created,
    };
    txn.commit().await?;

    info!(
        "Reference data seeded: {} statuses, {} types, {} categories, {} subcategories ({} new)",
        summary.statuses, summary.types, summary.categories, summary.subcategories, created
    );
    Ok(summary)
}

/// Adds default subcategories to every category that has none.
///
/// Returns the number of subcategories added.
#[instrument(skip(db, backfill))]
pub async fn backfill_subcategories(
    db: &DatabaseConnection,
    backfill: &BackfillConfig,
) -> Result<u64> {
    let txn = db.begin().await?;
    let categories = Category::find()
        .find_also_related(FlowType)
        .order_by_asc(category::Column::Id)
        .all(&txn)
        .await?;

    let mut added = 0_u64;
    for (category, flow_type) in categories {
        let existing = Subcategory::find()
            .filter(subcategory::Column::CategoryId.eq(category.id))
            .count(&txn)
            .await?;
        if existing > 0 {
            continue;
        }
        let type_name = flow_type.map(|t| t.name).unwrap_or_default();
        for name in backfill.defaults_for(&type_name, &category.name) {
            if get_or_create_subcategory(&txn, name, category.id).await? {
                info!("Added subcategory \"{}\" to \"{}\"", name, category.name);
                added += 1;
            }
        }
    }

    txn.commit().await?;
    info!("Added {} subcategories", added);
    Ok(added)
}
