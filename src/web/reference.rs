//! Reference data page and lookup management.
//!
//! Every successful change redirects back to `/reference/`. Failures are
//! answered through the [`Error`](crate::errors::Error) response mapping.

use super::AppState;
use crate::{
    core::{
        form::{INVALID_CHOICE, REQUIRED},
        reference::{self, LookupInput, ReferenceLists},
    },
    errors::{FormErrors, Result},
};
use axum::{
    Form, Json,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::debug;

/// Which lookup table a management route addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Statuses,
    Types,
    Categories,
    Subcategories,
}

/// Fields of every lookup form. Categories name their type in `type`,
/// subcategories name their category in `category`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LookupForm {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_id: Option<String>,
    pub category: Option<String>,
}

impl LookupForm {
    fn input(&self) -> LookupInput {
        LookupInput::new(
            self.name.clone().unwrap_or_default(),
            self.description.clone().unwrap_or_default(),
        )
    }

    fn parent(field: &str, raw: Option<&String>) -> Result<i64> {
        let value = raw.map(|v| v.trim()).filter(|v| !v.is_empty());
        let Some(value) = value else {
            return Err(FormErrors::single(field, REQUIRED).into());
        };
        value
            .parse::<i64>()
            .map_err(|_| FormErrors::single(field, INVALID_CHOICE).into())
    }

    fn type_id(&self) -> Result<i64> {
        Self::parent("type", self.type_id.as_ref())
    }

    fn category_id(&self) -> Result<i64> {
        Self::parent("category", self.category.as_ref())
    }
}

const REFERENCE_PAGE: &str = "/reference/";

/// `GET /reference/`
pub async fn index(State(state): State<AppState>) -> Result<Json<ReferenceLists>> {
    Ok(Json(reference::load_all(&state.db).await?))
}

/// `POST /reference/{kind}/create/`
pub async fn create(
    State(state): State<AppState>,
    Path(kind): Path<ReferenceKind>,
    Form(form): Form<LookupForm>,
) -> Result<Redirect> {
    let db = &state.db;
    let input = form.input();
    match kind {
        ReferenceKind::Statuses => {
            reference::create_status(db, &input).await?;
        }
        ReferenceKind::Types => {
            reference::create_type(db, &input).await?;
        }
        ReferenceKind::Categories => {
            reference::create_category(db, &input, form.type_id()?).await?;
        }
        ReferenceKind::Subcategories => {
            reference::create_subcategory(db, &input, form.category_id()?).await?;
        }
    }
    debug!("Created {:?} entry via form", kind);
    Ok(Redirect::to(REFERENCE_PAGE))
}

/// `POST /reference/{kind}/{id}/edit/`
pub async fn update(
    State(state): State<AppState>,
    Path((kind, id)): Path<(ReferenceKind, i64)>,
    Form(form): Form<LookupForm>,
) -> Result<Redirect> {
    let db = &state.db;
    let input = form.input();
    match kind {
        ReferenceKind::Statuses => {
            reference::update_status(db, id, &input).await?;
        }
        ReferenceKind::Types => {
            reference::update_type(db, id, &input).await?;
        }
        ReferenceKind::Categories => {
            reference::update_category(db, id, &input, form.type_id()?).await?;
        }
        ReferenceKind::Subcategories => {
            reference::update_subcategory(db, id, &input, form.category_id()?).await?;
        }
    }
    Ok(Redirect::to(REFERENCE_PAGE))
}

/// `POST /reference/{kind}/{id}/delete/`
pub async fn delete(
    State(state): State<AppState>,
    Path((kind, id)): Path<(ReferenceKind, i64)>,
) -> Result<Redirect> {
    let db = &state.db;
    match kind {
        ReferenceKind::Statuses => reference::delete_status(db, id).await?,
        ReferenceKind::Types => reference::delete_type(db, id).await?,
        ReferenceKind::Categories => reference::delete_category(db, id).await?,
        ReferenceKind::Subcategories => reference::delete_subcategory(db, id).await?,
    }
    Ok(Redirect::to(REFERENCE_PAGE))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_parent_field_parsing() {
        let form = LookupForm {
            type_id: Some(" 12 ".to_string()),
            category: Some("twelve".to_string()),
            ..Default::default()
        };
        assert_eq!(form.type_id().unwrap(), 12);
        match form.category_id() {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.fields["category"], vec![INVALID_CHOICE]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        match LookupForm::default().type_id() {
            Err(Error::Validation(errors)) => assert_eq!(errors.fields["type"], vec![REQUIRED]),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
