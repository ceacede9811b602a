//! Cash-flow record entity - One dated monetary movement with its full classification.
//!
//! A record denormalizes all three levels of the classification tree, so the
//! consistency between them is not structural. `before_save` re-checks it
//! against the database on every insert and update, which keeps direct
//! `ActiveModel` writes from persisting an inconsistent triple.
//!
//! Amounts are stored as integer minor units (`amount_cents`) and exposed as
//! [`Decimal`] through [`Model::amount`].

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::core::hierarchy;

/// Cash-flow record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_flow_records")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Date of the operation
    pub date: Date,
    /// ID of the status tag
    pub status_id: i64,
    /// ID of the type (top classification level)
    pub type_id: i64,
    /// ID of the category, must belong to `type_id`
    pub category_id: i64,
    /// ID of the subcategory, must belong to `category_id`
    pub subcategory_id: i64,
    /// Amount in kopecks, always positive
    pub amount_cents: i64,
    /// Free-form comment, may be empty
    pub comment: String,
    /// When the record was created
    pub created_at: DateTime,
    /// When the record was last modified
    pub updated_at: DateTime,
}

impl Model {
    /// Amount as a two-decimal-place value.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.amount_cents, 2)
    }
}

/// Defines relationships between a record and the lookups it references.
///
/// Every reference is `Restrict`: a lookup cannot be deleted while a record
/// points at it.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Status tag of the record
    #[sea_orm(
        belongs_to = "super::status::Entity",
        from = "Column::StatusId",
        to = "super::status::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Status,
    /// Type of the record
    #[sea_orm(
        belongs_to = "super::flow_type::Entity",
        from = "Column::TypeId",
        to = "super::flow_type::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    FlowType,
    /// Category of the record
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Category,
    /// Subcategory of the record
    #[sea_orm(
        belongs_to = "super::subcategory::Entity",
        from = "Column::SubcategoryId",
        to = "super::subcategory::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Subcategory,
}

impl Related<super::status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Status.def()
    }
}

impl Related<super::flow_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlowType.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subcategory.def()
    }
}

fn current<V>(value: &ActiveValue<V>) -> Option<V>
where
    V: Copy + Into<sea_orm::Value>,
{
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(*v),
        ActiveValue::NotSet => None,
    }
}

impl ActiveModel {
    /// Fills unset classification and amount fields from the stored row so
    /// partial updates are validated against the full triple.
    async fn resolved<C>(&self, db: &C, insert: bool) -> Result<(i64, i64, i64, i64), DbErr>
    where
        C: ConnectionTrait,
    {
        let fields = (
            current(&self.type_id),
            current(&self.category_id),
            current(&self.subcategory_id),
            current(&self.amount_cents),
        );
        if let (Some(t), Some(c), Some(s), Some(a)) = fields {
            return Ok((t, c, s, a));
        }
        let stored = match (insert, current(&self.id)) {
            (false, Some(id)) => Entity::find_by_id(id).one(db).await?,
            _ => None,
        };
        let Some(stored) = stored else {
            return Err(DbErr::Custom(
                "record classification and amount are required".to_string(),
            ));
        };
        Ok((
            fields.0.unwrap_or(stored.type_id),
            fields.1.unwrap_or(stored.category_id),
            fields.2.unwrap_or(stored.subcategory_id),
            fields.3.unwrap_or(stored.amount_cents),
        ))
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let (type_id, category_id, subcategory_id, amount_cents) =
            self.resolved(db, insert).await?;

        if amount_cents <= 0 {
            return Err(DbErr::Custom(format!(
                "record amount must be positive, got {}",
                Decimal::new(amount_cents, 2)
            )));
        }

        let category = super::category::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("category {category_id}")))?;
        let subcategory = super::subcategory::Entity::find_by_id(subcategory_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("subcategory {subcategory_id}")))?;

        hierarchy::check(type_id, &category, &subcategory)
            .map_err(|e| DbErr::Custom(e.to_string()))?;

        let now = Utc::now().naive_utc();
        if insert {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
