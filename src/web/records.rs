//! Record pages: the filtered list, the create/edit form and delete confirmation.

use super::{AppState, query::QueryPairs};
use crate::{
    core::{
        filter::{self, LedgerFilter, Page},
        form::RecordForm,
        lookup::{self, LookupOption},
        record::{self, RecordView},
        reference::{self, ReferenceLists},
    },
    entities::{flow_type, status},
    errors::{Error, FormErrors, Result},
};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::debug;

/// Maps a redirect notice key onto the message shown above the list.
#[must_use]
pub fn notice_message(key: &str) -> Option<&'static str> {
    match key {
        "created" => Some("Record created."),
        "updated" => Some("Record updated."),
        "deleted" => Some("Record deleted."),
        _ => None,
    }
}

/// Context of the list page.
#[derive(Debug, Serialize)]
pub struct ListPage {
    pub notice: Option<&'static str>,
    pub filters: LedgerFilter,
    pub page: Page<RecordView>,
    pub reference: ReferenceLists,
}

/// Context of the create/edit form.
#[derive(Debug, Serialize)]
pub struct FormPage {
    /// Set when editing an existing record
    pub record_id: Option<i64>,
    pub form: RecordForm,
    pub errors: FormErrors,
    pub statuses: Vec<status::Model>,
    pub types: Vec<flow_type::Model>,
    /// Categories of the currently selected type
    pub categories: Vec<LookupOption>,
    /// Subcategories of the currently selected category
    pub subcategories: Vec<LookupOption>,
}

/// Context of the delete confirmation.
#[derive(Debug, Serialize)]
pub struct DeletePage {
    pub record: RecordView,
}

async fn form_page(
    db: &DatabaseConnection,
    record_id: Option<i64>,
    form: RecordForm,
    errors: FormErrors,
) -> Result<FormPage> {
    let type_id = lookup::parse_id(form.type_id.as_deref());
    let category_id = lookup::parse_id(form.category.as_deref());
    Ok(FormPage {
        record_id,
        statuses: reference::list_statuses(db).await?,
        types: reference::list_types(db).await?,
        categories: lookup::categories_by_type(db, type_id).await?,
        subcategories: lookup::subcategories_by_category(db, category_id).await?,
        form,
        errors,
    })
}

/// `GET /`
pub async fn index(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ListPage>> {
    let query = QueryPairs::from(pairs);
    let filters = LedgerFilter::parse(&query.raw_filter());
    let requested = filter::parse_page_number(query.last("page").as_deref());
    let records = filter::list_records(&state.db, &filters, requested).await?;
    let lists = reference::load_all(&state.db).await?;
    let page = records.map(|r| RecordView::build(&r, &lists));

    Ok(Json(ListPage {
        notice: query.last("notice").as_deref().and_then(notice_message),
        filters,
        page,
        reference: lists,
    }))
}

/// `GET /record/create/`
pub async fn create_form(State(state): State<AppState>) -> Result<Json<FormPage>> {
    let page = form_page(&state.db, None, RecordForm::initial(), FormErrors::default()).await?;
    Ok(Json(page))
}

/// Re-renders the form with its errors, or passes any other failure through.
async fn rejected(
    db: &DatabaseConnection,
    record_id: Option<i64>,
    form: RecordForm,
    err: Error,
) -> Result<Response> {
    match err {
        Error::Validation(errors) => {
            debug!("Record form rejected: {}", errors);
            let page = form_page(db, record_id, form, errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response())
        }
        other => Err(other),
    }
}

/// `POST /record/create/`
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<RecordForm>,
) -> Result<Response> {
    let input = match form.bind(&state.db).await {
        Ok(input) => input,
        Err(e) => return rejected(&state.db, None, form, e).await,
    };
    record::create_record(&state.db, &input).await?;
    Ok(Redirect::to("/?notice=created").into_response())
}

/// `GET /record/{id}/edit/`
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FormPage>> {
    let existing = record::find_record(&state.db, id).await?;
    let page = form_page(
        &state.db,
        Some(id),
        RecordForm::from_model(&existing),
        FormErrors::default(),
    )
    .await?;
    Ok(Json(page))
}

/// `POST /record/{id}/edit/`
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<RecordForm>,
) -> Result<Response> {
    record::find_record(&state.db, id).await?;
    let input = match form.bind(&state.db).await {
        Ok(input) => input,
        Err(e) => return rejected(&state.db, Some(id), form, e).await,
    };
    record::update_record(&state.db, id, &input).await?;
    Ok(Redirect::to("/?notice=updated").into_response())
}

/// `GET /record/{id}/delete/`
pub async fn delete_confirm(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletePage>> {
    let existing = record::find_record(&state.db, id).await?;
    let lists = reference::load_all(&state.db).await?;
    Ok(Json(DeletePage {
        record: RecordView::build(&existing, &lists),
    }))
}

/// `POST /record/{id}/delete/`
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Redirect> {
    record::delete_record(&state.db, id).await?;
    Ok(Redirect::to("/?notice=deleted"))
}
