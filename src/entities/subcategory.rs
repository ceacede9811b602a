//! Subcategory entity - Third level of the classification tree, scoped to one category.

use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

/// Subcategory database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subcategories")]
pub struct Model {
    /// Unique identifier for the subcategory
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique within its category
    pub name: String,
    /// Free-form description, may be empty
    pub description: String,
    /// ID of the owning category
    pub category_id: i64,
    /// When the subcategory was created
    pub created_at: DateTime,
    /// When the subcategory was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Subcategory and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each subcategory belongs to one category and goes away with it
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Category,
    /// One subcategory classifies many records
    #[sea_orm(has_many = "super::cash_flow_record::Entity")]
    Records,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::cash_flow_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now().naive_utc();
        if insert {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
