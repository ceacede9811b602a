//! Input binding for submitted forms.
//!
//! A [`RecordForm`] holds the raw strings of a record form. Binding turns it
//! into a [`RecordInput`] or into a [`FormErrors`] set that can be shown next
//! to the fields. Field problems are reported first; the hierarchy rule runs
//! only once every field parsed, and its failure becomes a form-level message.

use crate::{
    core::record::{self, RecordInput},
    entities::cash_flow_record,
    errors::{Error, FormErrors, Result},
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_NUMBER: &str = "Enter a number.";

/// Raw record form fields, as posted by a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordForm {
    pub date: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub type_id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub amount: Option<String>,
    pub comment: Option<String>,
}

fn required<'a>(errors: &mut FormErrors, field: &str, raw: Option<&'a String>) -> Option<&'a str> {
    let value = raw.map(|v| v.trim()).filter(|v| !v.is_empty());
    if value.is_none() {
        errors.add(field, REQUIRED);
    }
    value
}

fn choice(errors: &mut FormErrors, field: &str, raw: Option<&String>) -> Option<i64> {
    let value = required(errors, field, raw)?;
    value
        .parse::<i64>()
        .inspect_err(|_| errors.add(field, INVALID_CHOICE))
        .ok()
}

impl RecordForm {
    /// An empty form with today's date filled in.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            date: Some(Local::now().date_naive().format("%Y-%m-%d").to_string()),
            ..Default::default()
        }
    }

    /// A form pre-populated from a stored record.
    #[must_use]
    pub fn from_model(record: &cash_flow_record::Model) -> Self {
        Self {
            date: Some(record.date.format("%Y-%m-%d").to_string()),
            status: Some(record.status_id.to_string()),
            type_id: Some(record.type_id.to_string()),
            category: Some(record.category_id.to_string()),
            subcategory: Some(record.subcategory_id.to_string()),
            amount: Some(record.amount().to_string()),
            comment: Some(record.comment.clone()),
        }
    }

    /// Parses every field without touching the database.
    pub fn parse(&self) -> std::result::Result<RecordInput, FormErrors> {
        let mut errors = FormErrors::default();

        let date = required(&mut errors, "date", self.date.as_ref()).and_then(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .inspect_err(|_| errors.add("date", INVALID_DATE))
                .ok()
        });
        let status_id = choice(&mut errors, "status", self.status.as_ref());
        let type_id = choice(&mut errors, "type", self.type_id.as_ref());
        let category_id = choice(&mut errors, "category", self.category.as_ref());
        let subcategory_id = choice(&mut errors, "subcategory", self.subcategory.as_ref());
        let amount = required(&mut errors, "amount", self.amount.as_ref()).and_then(|v| {
            match Decimal::from_str(v) {
                Ok(amount) => match record::amount_to_cents(amount) {
                    Ok(_) => Some(amount),
                    Err(reason) => {
                        errors.add("amount", reason.to_string());
                        None
                    }
                },
                Err(_) => {
                    errors.add("amount", INVALID_NUMBER);
                    None
                }
            }
        });

        match (date, status_id, type_id, category_id, subcategory_id, amount) {
            (
                Some(date),
                Some(status_id),
                Some(type_id),
                Some(category_id),
                Some(subcategory_id),
                Some(amount),
            ) if errors.is_empty() => Ok(RecordInput {
                date,
                status_id,
                type_id,
                category_id,
                subcategory_id,
                amount,
                comment: self.comment.as_deref().unwrap_or_default().trim().to_string(),
            }),
            _ => Err(errors),
        }
    }

    /// Parses the form and validates it against the database.
    ///
    /// Every failure is returned as [`Error::Validation`] so it can be
    /// rendered inline; database failures pass through unchanged.
    pub async fn bind<C: ConnectionTrait>(&self, db: &C) -> Result<RecordInput> {
        let input = self.parse()?;
        match record::validate_input(db, &input).await {
            Ok(_) => Ok(input),
            Err(Error::Hierarchy(e)) => {
                let mut errors = FormErrors::default();
                errors.add_non_field(e.to_string());
                Err(Error::Validation(errors))
            }
            Err(Error::InvalidAmount { reason, .. }) => {
                Err(FormErrors::single("amount", reason.to_string()).into())
            }
            Err(e) => Err(e),
        }
    }
}
