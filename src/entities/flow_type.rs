//! Type entity - The top level of the classification tree (incoming vs outgoing).
//!
//! Deleting a type cascades to its categories and, through them, to their
//! subcategories. Records referencing the type block the delete.

use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

/// Type database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "types")]
pub struct Model {
    /// Unique identifier for the type
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across all types (e.g. "Пополнение", "Списание")
    #[sea_orm(unique)]
    pub name: String,
    /// Free-form description, may be empty
    pub description: String,
    /// When the type was created
    pub created_at: DateTime,
    /// When the type was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Type and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One type owns many categories
    #[sea_orm(has_many = "super::category::Entity")]
    Categories,
    /// One type classifies many records
    #[sea_orm(has_many = "super::cash_flow_record::Entity")]
    Records,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
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
