//! The endpoint for registering a new user with an optional budget.
use std::sync::{Arc, Mutex};

use axum::{
    Form, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Email, Error,
    user::{create_user, parse_budget},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for registering a user.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The user's email address. Required.
    #[serde(default)]
    pub email: String,
    /// The spending limit. Blank or invalid means no budget.
    #[serde(default)]
    pub budget: String,
}

/// A route handler for registering a new user, responds with the created user.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let email = match Email::new(&user_data.email) {
        Ok(email) => email,
        Err(error) => return error.into_response(),
    };
    let budget = parse_budget(&user_data.budget);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_user(email, budget, &connection) {
        Ok(user) => {
            tracing::info!("Registered user {}", user.id);
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Err(error) => {
            tracing::debug!("Could not register user: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::{
        User,
        test_utils::{assert_status, get_test_connection, parse_json_body},
        user::count_users,
    };

    use super::{RegisterForm, RegistrationState, register_user};

    fn get_test_state() -> RegistrationState {
        RegistrationState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    fn form(email: &str, budget: &str) -> RegisterForm {
        RegisterForm {
            email: email.to_owned(),
            budget: budget.to_owned(),
        }
    }

    #[tokio::test]
    async fn register_user_succeeds() {
        let state = get_test_state();

        let response =
            register_user(State(state.clone()), Form(form(" Alice@Example.com ", "500"))).await;

        assert_status(&response, StatusCode::CREATED);
        let user: User = parse_json_body(response).await;
        assert_eq!(user.email.to_string(), "alice@example.com");
        assert_eq!(user.budget, dec!(500));
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(1));
    }

    #[tokio::test]
    async fn invalid_budget_means_no_budget() {
        let response =
            register_user(State(get_test_state()), Form(form("alice@example.com", "lots"))).await;

        let user: User = parse_json_body(response).await;
        assert_eq!(user.budget, Decimal::ZERO);
    }

    #[tokio::test]
    async fn register_user_fails_on_invalid_email() {
        let response = register_user(State(get_test_state()), Form(form("alice", ""))).await;

        assert_status(&response, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_user_fails_on_duplicate_email() {
        let state = get_test_state();
        register_user(State(state.clone()), Form(form("alice@example.com", ""))).await;

        let response =
            register_user(State(state.clone()), Form(form("ALICE@example.com", ""))).await;

        assert_status(&response, StatusCode::CONFLICT);
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(1));
    }
}
