//! Defines the endpoint for recording a new expense.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    budget::{Notifier, notify_if_over_budget},
    expense::{ExpenseForm, create_expense},
    user::UserID,
};

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Delivers a notice when the new expense takes the user over budget.
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            notifier: state.notifier.clone(),
        }
    }
}

/// A route handler for recording a new expense, responds with the created expense.
///
/// If the new expense takes the user over their budget, a budget notice is
/// sent. A failed notice does not fail the request.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let today = OffsetDateTime::now_utc().date();

    let builder = match form.into_builder(user_id, today) {
        Ok(builder) => builder,
        Err(error) => {
            tracing::debug!("rejected expense form from user {user_id}: {error}");
            return error.into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let expense = match create_expense(builder, &connection) {
        Ok(expense) => expense,
        Err(error) => {
            tracing::error!("could not create expense: {error}");
            return error.into_response();
        }
    };

    if let Some(notifier) = &state.notifier
        && let Err(error) = notify_if_over_budget(user_id, notifier.as_ref(), &connection)
    {
        tracing::error!("could not check budget for user {user_id}: {error}");
    }

    (StatusCode::CREATED, Json(expense)).into_response()
}
