//! Expense Tracker is a personal expense tracker: users record dated expenses,
//! see their running total against a budget, get a notice when they overspend
//! and export an itemized PDF report.
//!
//! This library provides:
//! - a pure PDF report generator in [report],
//! - SQLite persistence for users and expenses,
//! - a JSON REST API built with [build_router].
//!
//! Authentication is left to the embedding application: protected routes expect
//! an auth layer to insert the signed-in [UserID] into the request extensions.

#![warn(missing_docs)]

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

mod app_state;
pub mod budget;
mod database_id;
mod db;
mod email;
pub mod endpoints;
mod expense;
mod logging;
mod register_user;
pub mod report;
mod routing;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use database_id::{DatabaseId, ExpenseId};
pub use db::initialize as initialize_db;
pub use email::Email;
pub use expense::{
    Expense, ExpenseBuilder, ExpenseForm, ExpenseSummary, SortOrder, create_expense,
    delete_expense, get_expense, list_expenses, now_local, render_report, total_expenses,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use user::{
    User, UserID, count_users, create_user, get_user_by_email, get_user_by_id, parse_budget,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email address is empty or malformed.
    #[error("{0:?} is not a valid email address")]
    InvalidEmail(String),

    /// The email address is already registered to another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// A required form field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The amount entered for an expense is not a number.
    #[error("{0:?} is not a valid amount")]
    InvalidAmount(String),

    /// The user's expenses add up to more than can be represented.
    #[error("the total of all expenses is too large")]
    TotalOverflow,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The user tried to change a resource that belongs to another user.
    #[error("not allowed")]
    NotAllowed,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The expense report could not be generated.
    #[error(transparent)]
    RenderError(#[from] report::RenderError),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent with error responses.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::InvalidEmail(_) | Error::MissingField(_) | Error::InvalidAmount(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::NotAllowed => StatusCode::FORBIDDEN,
            Error::TotalOverflow
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::RenderError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal errors are not intended to be shown to the client.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
