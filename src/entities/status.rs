//! Status entity - An orthogonal tag on ledger records (e.g. business, personal, tax).
//!
//! Statuses are independent of the type/category/subcategory hierarchy. A status
//! cannot be deleted while any record references it.

use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

/// Status database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "statuses")]
pub struct Model {
    /// Unique identifier for the status
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across all statuses
    #[sea_orm(unique)]
    pub name: String,
    /// Free-form description, may be empty
    pub description: String,
    /// When the status was created
    pub created_at: DateTime,
    /// When the status was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Status and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One status tags many records
    #[sea_orm(has_many = "super::cash_flow_record::Entity")]
    Records,
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
