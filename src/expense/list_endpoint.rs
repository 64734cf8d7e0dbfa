//! Defines the endpoint for listing a user's expenses with their budget status.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    budget::is_over_budget,
    expense::{Expense, SortOrder, list_expenses, total_expenses},
    user::{UserID, get_user_by_id},
};

/// The state needed to list expenses.
#[derive(Debug, Clone)]
pub struct ListExpensesState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A user's expenses, newest first, along with how they compare to the budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    /// The expenses, newest first.
    pub expenses: Vec<Expense>,
    /// The exact sum of all the expenses.
    pub total: Decimal,
    /// The user's budget, zero if they have not set one.
    pub budget: Decimal,
    /// Whether the total is over a set budget.
    pub over_budget: bool,
}

/// A route handler that responds with the signed-in user's [ExpenseSummary].
pub async fn list_expenses_endpoint(
    State(state): State<ListExpensesState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_expense_summary(user_id, &connection) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => {
            tracing::error!("could not list expenses for user {user_id}: {error}");
            error.into_response()
        }
    }
}

fn get_expense_summary(user_id: UserID, connection: &Connection) -> Result<ExpenseSummary, Error> {
    let user = get_user_by_id(user_id, connection)?;
    let expenses = list_expenses(user_id, SortOrder::Descending, connection)?;
    let total = total_expenses(user_id, connection)?;

    Ok(ExpenseSummary {
        expenses,
        total,
        budget: user.budget,
        over_budget: is_over_budget(total, user.budget),
    })
}
