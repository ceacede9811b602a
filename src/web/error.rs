//! HTTP mapping for [`Error`].

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

impl Error {
    /// The HTTP status a handler answers with for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Hierarchy(_) | Self::InvalidAmount { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Integrity { .. } => StatusCode::CONFLICT,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Validation(errors) => {
                debug!("Rejected input: {}", errors);
                json!({ "error": "Please correct the errors below.", "errors": errors })
            }
            other if status.is_server_error() => {
                error!("Request failed: {}", other);
                json!({ "error": "Internal server error" })
            }
            other => {
                debug!("Request refused: {}", other);
                json!({ "error": other.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hierarchy::HierarchyError;
    use crate::errors::FormErrors;
    use sea_orm::DbErr;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::from(FormErrors::single("name", "This field is required.")).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::from(HierarchyError::CategoryTypeMismatch {
                category_id: 1,
                type_id: 2
            })
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::NotFound {
                entity: "record",
                id: 7
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Integrity {
                message: "in use".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::from(DbErr::Custom("boom".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = Error::from(DbErr::Custom("secret path".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
