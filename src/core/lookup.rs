//! Cascading option lookups for dependent dropdowns.
//!
//! Given a parent id, these return the valid child options ordered by name.
//! A missing or non-numeric parent id is not an error: it simply yields no
//! options, which is what a client clearing a dropdown expects.

use crate::{
    entities::{Category, Subcategory, category, subcategory},
    errors::Result,
};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;

/// One `{id, name}` pair for a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupOption {
    pub id: i64,
    pub name: String,
}

/// Parses a raw query-string id. Blank or non-numeric input yields `None`.
#[must_use]
pub fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<i64>().ok())
}

/// Lists the categories of a type, ordered by name.
pub async fn categories_by_type<C: ConnectionTrait>(
    db: &C,
    type_id: Option<i64>,
) -> Result<Vec<LookupOption>> {
    let Some(type_id) = type_id else {
        return Ok(Vec::new());
    };
    let categories = Category::find()
        .filter(category::Column::TypeId.eq(type_id))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;
    Ok(categories
        .into_iter()
        .map(|c| LookupOption {
            id: c.id,
            name: c.name,
        })
        .collect())
}

/// Lists the subcategories of a category, ordered by name.
pub async fn subcategories_by_category<C: ConnectionTrait>(
    db: &C,
    category_id: Option<i64>,
) -> Result<Vec<LookupOption>> {
    let Some(category_id) = category_id else {
        return Ok(Vec::new());
    };
    let subcategories = Subcategory::find()
        .filter(subcategory::Column::CategoryId.eq(category_id))
        .order_by_asc(subcategory::Column::Name)
        .all(db)
        .await?;
    Ok(subcategories
        .into_iter()
        .map(|s| LookupOption {
            id: s.id,
            name: s.name,
        })
        .collect())
}
