//! Ledger filtering and pagination.
//!
//! Filters are independent and conjunctive: every supplied filter narrows the
//! result, an absent one does not constrain it. Results are ordered newest
//! first (date, then creation time, then id) and cut into fixed-size pages.
//! Out-of-range page numbers clamp to the nearest valid page.

use crate::{
    entities::{CashFlowRecord, cash_flow_record},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{Condition, ItemsAndPagesNumber, PaginatorTrait, QueryOrder, prelude::*};
use serde::Serialize;
use tracing::debug;

/// Records per page.
pub const PAGE_SIZE: u64 = 20;

/// Filter values exactly as they arrive in the query string.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RawFilter {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub type_id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

/// Typed ledger filter. `None` means "no constraint".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<i64>,
    #[serde(rename = "type")]
    pub type_id: Option<i64>,
    pub category: Option<i64>,
    pub subcategory: Option<i64>,
}

fn non_blank(raw: Option<&String>) -> Option<&str> {
    raw.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, raw: Option<&String>) -> Option<NaiveDate> {
    let value = non_blank(raw)?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .inspect_err(|_| debug!("Ignoring unparseable {} filter: {:?}", field, value))
        .ok()
}

fn parse_id(field: &str, raw: Option<&String>) -> Option<i64> {
    let value = non_blank(raw)?;
    value
        .parse::<i64>()
        .inspect_err(|_| debug!("Ignoring unparseable {} filter: {:?}", field, value))
        .ok()
}

impl LedgerFilter {
    /// Parses raw query values. Blank values are absent; unparseable ones are ignored.
    #[must_use]
    pub fn parse(raw: &RawFilter) -> Self {
        Self {
            date_from: parse_date("date_from", raw.date_from.as_ref()),
            date_to: parse_date("date_to", raw.date_to.as_ref()),
            status: parse_id("status", raw.status.as_ref()),
            type_id: parse_id("type", raw.type_id.as_ref()),
            category: parse_id("category", raw.category.as_ref()),
            subcategory: parse_id("subcategory", raw.subcategory.as_ref()),
        }
    }

    /// The conjunction of every supplied filter.
    #[must_use]
    pub fn condition(&self) -> Condition {
        use cash_flow_record::Column;

        let mut condition = Condition::all();
        if let Some(date_from) = self.date_from {
            condition = condition.add(Column::Date.gte(date_from));
        }
        if let Some(date_to) = self.date_to {
            condition = condition.add(Column::Date.lte(date_to));
        }
        if let Some(status) = self.status {
            condition = condition.add(Column::StatusId.eq(status));
        }
        if let Some(type_id) = self.type_id {
            condition = condition.add(Column::TypeId.eq(type_id));
        }
        if let Some(category) = self.category {
            condition = condition.add(Column::CategoryId.eq(category));
        }
        if let Some(subcategory) = self.subcategory {
            condition = condition.add(Column::SubcategoryId.eq(subcategory));
        }
        condition
    }
}

/// One page of results plus the metadata needed to render pagination.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Converts the items while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }
}

/// Parses a raw page number. Missing or non-numeric input means the first page.
#[must_use]
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(1)
}

/// Clamps a requested page into `1..=num_pages`.
#[must_use]
pub fn clamp_page(requested: i64, num_pages: u64) -> u64 {
    let last = num_pages.max(1);
    u64::try_from(requested).map_or(1, |n| n.clamp(1, last))
}

/// Fetches one page of records matching `filter`, newest first.
pub async fn list_records(
    db: &DatabaseConnection,
    filter: &LedgerFilter,
    requested_page: i64,
) -> Result<Page<cash_flow_record::Model>> {
    let paginator = CashFlowRecord::find()
        .filter(filter.condition())
        .order_by_desc(cash_flow_record::Column::Date)
        .order_by_desc(cash_flow_record::Column::CreatedAt)
        .order_by_desc(cash_flow_record::Column::Id)
        .paginate(db, PAGE_SIZE);

    let ItemsAndPagesNumber {
        number_of_items,
        number_of_pages,
    } = paginator.num_items_and_pages().await?;
    let num_pages = number_of_pages.max(1);
    let number = clamp_page(requested_page, num_pages);
    let items = paginator.fetch_page(number - 1).await?;

    debug!(
        "Serving page {}/{} ({} matching records)",
        number, num_pages, number_of_items
    );
    Ok(Page {
        items,
        number,
        num_pages,
        total: number_of_items,
        has_previous: number > 1,
        has_next: number < num_pages,
    })
}
