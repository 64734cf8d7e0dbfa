//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Email, Error, db::get_decimal};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// Credentials are managed by whatever authenticates requests, the
/// application only needs to know who to report to and their budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, used to label reports and send budget notices.
    pub email: Email,
    /// The total spending the user wants to stay under. Zero means no budget.
    pub budget: Decimal,
}

/// Parse a budget entered by the user.
///
/// A blank or malformed budget is treated as no budget (zero) rather than
/// rejected.
pub fn parse_budget(raw_budget: &str) -> Decimal {
    let raw_budget = raw_budget.trim();

    if raw_budget.is_empty() {
        return Decimal::ZERO;
    }

    raw_budget.parse().unwrap_or_else(|error| {
        tracing::debug!("Ignoring invalid budget {raw_budget:?}: {error}");
        Decimal::ZERO
    })
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                budget TEXT NOT NULL DEFAULT '0'
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateEmail] if a user with `email` already exists,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(email: Email, budget: Decimal, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, budget) VALUES (?1, ?2)",
        (email.as_ref(), budget.to_string()),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User { id, email, budget })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, budget FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database registered with `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &Email, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, budget FROM user WHERE email = :email")?
        .query_row(&[(":email", email.as_ref())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| {
            let count: i64 = row.get(0)?;
            usize::try_from(count).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, count))
        })
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserID::new(row.get(0)?);
    let email = Email::new_unchecked(row.get(1)?);
    let budget = get_decimal(row, 2)?;

    Ok(User { id, email, budget })
}
