//! JSON endpoints feeding the cascading type → category → subcategory selectors.
//!
//! A missing, blank, non-numeric or repeated parent id yields an answer
//! rather than an error: the last value is used, and an unusable one gives an
//! empty array.

use super::{AppState, query::QueryPairs};
use crate::{
    core::lookup::{self, LookupOption},
    errors::Result,
};
use axum::{
    Json,
    extract::{Query, State},
};

/// `GET /api/categories-by-type/?type_id=<id>`
pub async fn categories_by_type(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<LookupOption>>> {
    let type_id = lookup::parse_id(QueryPairs::from(pairs).last("type_id").as_deref());
    Ok(Json(lookup::categories_by_type(&state.db, type_id).await?))
}

/// `GET /api/subcategories-by-category/?category_id=<id>`
pub async fn subcategories_by_category(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<LookupOption>>> {
    let category_id = lookup::parse_id(QueryPairs::from(pairs).last("category_id").as_deref());
    Ok(Json(
        lookup::subcategories_by_category(&state.db, category_id).await?,
    ))
}
