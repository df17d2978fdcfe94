use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Application-level error type that maps to HTTP responses.
///
/// The two booking failures (`SeatOutOfRange`, `SeatTaken`) are always
/// recoverable by the caller choosing another seat; nothing here is fatal
/// to the process.
#[derive(Error, Debug)]
pub enum AppError {
    /// Requested coordinate falls outside the dome grid on one axis.
    #[error("{field} number must be in available range: (1, {bound_name}): (1, {bound})")]
    SeatOutOfRange {
        field: &'static str,
        bound_name: &'static str,
        bound: i32,
    },

    /// Another ticket already holds this (session, row, seat) triple.
    #[error("seat (row: {row}, seat: {seat}) is already taken for this session")]
    SeatTaken { row: i32, seat: i32 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SeatOutOfRange { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::SeatTaken { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a failed ticket insert to `SeatTaken` when the composite
    /// (session, row, seat) key is violated.
    pub fn from_ticket_insert(err: sqlx::Error, row: i32, seat: i32) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return AppError::SeatTaken { row, seat };
            }
        }
        AppError::Database(err)
    }

    // Range errors are keyed by the failing axis so clients can attach
    // the message to the right form field; everything else goes under
    // "detail". Storage and i/o faults get an opaque body.
    fn body(&self) -> serde_json::Value {
        match self {
            AppError::SeatOutOfRange { field, .. } => json!({ (*field): self.to_string() }),
            AppError::Database(_) | AppError::Io(_) => {
                json!({ "detail": "internal server error" })
            }
            other => json!({ "detail": other.to_string() }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        }

        let mut response = (status, Json(self.body())).into_response();
        if matches!(self, AppError::Unauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Basic"),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_error_names_the_failing_axis() {
        let err = AppError::SeatOutOfRange {
            field: "row",
            bound_name: "rows",
            bound: 20,
        };
        assert_eq!(
            err.to_string(),
            "row number must be in available range: (1, rows): (1, 20)"
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let body = err.body();
        assert!(body.get("row").is_some());
        assert!(body.get("seat").is_none());
    }

    #[test]
    fn seat_taken_is_a_conflict() {
        let err = AppError::SeatTaken { row: 5, seat: 5 };
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(
            err.body()["detail"],
            "seat (row: 5, seat: 5) is already taken for this session"
        );
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::NotFound("reservation".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("staff access required".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::BadRequest("bad".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body()["detail"], "internal server error");
    }
}
