//! Category entity - Second level of the classification tree, scoped to one type.
//!
//! `(name, type_id)` is unique; the composite index is created alongside the
//! table in [`crate::config::database::create_tables`].

use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique within its type
    pub name: String,
    /// Free-form description, may be empty
    pub description: String,
    /// ID of the owning type
    pub type_id: i64,
    /// When the category was created
    pub created_at: DateTime,
    /// When the category was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each category belongs to one type and goes away with it
    #[sea_orm(
        belongs_to = "super::flow_type::Entity",
        from = "Column::TypeId",
        to = "super::flow_type::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    FlowType,
    /// One category owns many subcategories
    #[sea_orm(has_many = "super::subcategory::Entity")]
    Subcategories,
    /// One category classifies many records
    #[sea_orm(has_many = "super::cash_flow_record::Entity")]
    Records,
}

impl Related<super::flow_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlowType.def()
    }
}

impl Related<super::subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subcategories.def()
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
