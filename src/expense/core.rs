//! Defines the core data model and database queries for expenses.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::ExpenseId,
    db::get_decimal,
    report::sum_amounts,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Money a user spent on something.
///
/// To create a new `Expense`, use [Expense::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user who recorded the expense.
    pub user_id: UserID,
    /// A short description of what the money was spent on.
    pub title: String,
    /// The amount of money spent.
    pub amount: Decimal,
    /// An optional free-text category, e.g. "Food" or "Rent".
    pub category: Option<String>,
    /// When the money was spent.
    pub date: Date,
}

impl Expense {
    /// Create a new expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(user_id: UserID, title: &str, amount: Decimal, date: Date) -> ExpenseBuilder {
        ExpenseBuilder {
            user_id,
            title: title.to_owned(),
            amount,
            category: None,
            date,
        }
    }
}

/// A builder for creating [Expense] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct ExpenseBuilder {
    /// The user who owns the expense.
    pub user_id: UserID,
    /// A short, non-empty description.
    pub title: String,
    /// The amount spent. Negative amounts (e.g., refunds) are allowed.
    pub amount: Decimal,
    /// An optional category. Empty strings should be passed as `None`.
    pub category: Option<String>,
    /// When the money was spent.
    pub date: Date,
}

impl ExpenseBuilder {
    /// Set the category for the expense.
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

/// The order to list a user's expenses in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first, as printed in reports.
    Ascending,
    /// Newest first, as shown in listings.
    Descending,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new expense in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the builder's user ID does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(builder: ExpenseBuilder, connection: &Connection) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "INSERT INTO expense (user_id, title, amount, category, date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, title, amount, category, date",
        )?
        .query_row(
            (
                builder.user_id.as_i64(),
                builder.title,
                builder.amount.to_string(),
                builder.category,
                builder.date,
            ),
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })?;

    Ok(expense)
}

/// Retrieve an expense from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, user_id, title, amount, category, date FROM expense WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_expense_row)?;

    Ok(expense)
}

/// Retrieve all of a user's expenses sorted by date.
///
/// Expenses on the same day keep the order they were created in (reversed for
/// [SortOrder::Descending]).
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_expenses(
    user_id: UserID,
    order: SortOrder,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let query = match order {
        SortOrder::Ascending => {
            "SELECT id, user_id, title, amount, category, date FROM expense
             WHERE user_id = :user_id ORDER BY date ASC, id ASC"
        }
        SortOrder::Descending => {
            "SELECT id, user_id, title, amount, category, date FROM expense
             WHERE user_id = :user_id ORDER BY date DESC, id DESC"
        }
    };

    connection
        .prepare(query)?
        .query_map(&[(":user_id", &user_id.as_i64())], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Add up the amounts of all of a user's expenses.
///
/// The sum is exact; round it only for display.
///
/// # Errors
/// This function will return a:
/// - [Error::TotalOverflow] if the total is too large to represent,
/// - or [Error::SqlError] if there is an SQL error.
pub fn total_expenses(user_id: UserID, connection: &Connection) -> Result<Decimal, Error> {
    let amounts = connection
        .prepare("SELECT amount FROM expense WHERE user_id = :user_id")?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| get_decimal(row, 0))?
        .collect::<Result<Vec<Decimal>, rusqlite::Error>>()?;

    sum_amounts(amounts).ok_or(Error::TotalOverflow)
}

/// Delete one of a user's expenses.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - [Error::NotAllowed] if the expense belongs to a different user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(id: ExpenseId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let expense = get_expense(id, connection)?;

    if expense.user_id != user_id {
        tracing::warn!("User {user_id} tried to delete expense {id} owned by user {}", expense.user_id);
        return Err(Error::NotAllowed);
    }

    connection.execute("DELETE FROM expense WHERE id = :id", &[(":id", &id)])?;

    Ok(())
}

/// Get the total number of expenses in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_expenses(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM expense;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                amount TEXT NOT NULL,
                category TEXT,
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Covers listing and totalling a user's expenses by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an Expense.
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let title = row.get(2)?;
    let amount = get_decimal(row, 3)?;
    let category = row.get(4)?;
    let date = row.get(5)?;

    Ok(Expense {
        id,
        user_id,
        title,
        amount,
        category,
        date,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Email, Error,
        db::initialize,
        expense::{
            Expense, SortOrder, count_expenses, create_expense, delete_expense, get_expense,
            list_expenses, total_expenses,
        },
        user::{User, UserID, create_user},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_user(email: &str, conn: &Connection) -> User {
        create_user(Email::new(email).unwrap(), Decimal::ZERO, conn).unwrap()
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", &conn);

        let result = create_expense(
            Expense::build(user.id, "Coffee", dec!(3.50), date!(2024 - 01 - 05))
                .category(Some("Food".to_owned())),
            &conn,
        );

        match result {
            Ok(expense) => {
                assert_eq!(expense.amount, dec!(3.50));
                assert_eq!(expense.category.as_deref(), Some("Food"));
                assert_eq!(expense.user_id, user.id);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn amounts_round_trip_exactly() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", &conn);
        let created = create_expense(
            Expense::build(user.id, "Odd", dec!(0.1234567890123), date!(2024 - 01 - 05)),
            &conn,
        )
        .unwrap();

        let fetched = get_expense(created.id, &conn).unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.amount, dec!(0.1234567890123));
    }

    #[test]
    fn create_fails_on_unknown_user() {
        let conn = get_test_connection();

        let result = create_expense(
            Expense::build(UserID::new(42), "Coffee", dec!(1), date!(2024 - 01 - 05)),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_fails_on_missing_expense() {
        let conn = get_test_connection();

        assert_eq!(get_expense(1, &conn), Err(Error::NotFound));
    }

    #[test]
    fn lists_only_the_users_expenses_in_date_order() {
        let conn = get_test_connection();
        let alice = create_test_user("alice@example.com", &conn);
        let bob = create_test_user("bob@example.com", &conn);
        let rent = create_expense(
            Expense::build(alice.id, "Rent", dec!(1200), date!(2024 - 02 - 10)),
            &conn,
        )
        .unwrap();
        let coffee = create_expense(
            Expense::build(alice.id, "Coffee", dec!(3.5), date!(2024 - 01 - 05)),
            &conn,
        )
        .unwrap();
        let tea = create_expense(
            Expense::build(alice.id, "Tea", dec!(2), date!(2024 - 01 - 05)),
            &conn,
        )
        .unwrap();
        create_expense(
            Expense::build(bob.id, "Lunch", dec!(15), date!(2024 - 01 - 06)),
            &conn,
        )
        .unwrap();

        let ascending = list_expenses(alice.id, SortOrder::Ascending, &conn).unwrap();
        let descending = list_expenses(alice.id, SortOrder::Descending, &conn).unwrap();

        assert_eq!(ascending, vec![coffee.clone(), tea.clone(), rent.clone()]);
        assert_eq!(descending, vec![rent, tea, coffee]);
    }

    #[test]
    fn list_is_empty_for_new_user() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", &conn);

        let expenses = list_expenses(user.id, SortOrder::Ascending, &conn).unwrap();

        assert!(expenses.is_empty());
    }

    #[test]
    fn total_sums_exactly_per_user() {
        let conn = get_test_connection();
        let alice = create_test_user("alice@example.com", &conn);
        let bob = create_test_user("bob@example.com", &conn);
        for amount in [dec!(0.1), dec!(0.2), dec!(-0.05)] {
            create_expense(
                Expense::build(alice.id, "Thing", amount, date!(2024 - 01 - 05)),
                &conn,
            )
            .unwrap();
        }
        create_expense(
            Expense::build(bob.id, "Other", dec!(99), date!(2024 - 01 - 05)),
            &conn,
        )
        .unwrap();

        assert_eq!(total_expenses(alice.id, &conn), Ok(dec!(0.25)));
        assert_eq!(total_expenses(bob.id, &conn), Ok(dec!(99)));
    }

    #[test]
    fn total_is_zero_without_expenses() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", &conn);

        assert_eq!(total_expenses(user.id, &conn), Ok(Decimal::ZERO));
    }

    #[test]
    fn deletes_own_expense() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", &conn);
        let expense = create_expense(
            Expense::build(user.id, "Coffee", dec!(3.5), date!(2024 - 01 - 05)),
            &conn,
        )
        .unwrap();

        delete_expense(expense.id, user.id, &conn).unwrap();

        assert_eq!(get_expense(expense.id, &conn), Err(Error::NotFound));
        assert_eq!(count_expenses(&conn), Ok(0));
    }

    #[test]
    fn delete_rejects_other_users_expense() {
        let conn = get_test_connection();
        let alice = create_test_user("alice@example.com", &conn);
        let bob = create_test_user("bob@example.com", &conn);
        let expense = create_expense(
            Expense::build(alice.id, "Coffee", dec!(3.5), date!(2024 - 01 - 05)),
            &conn,
        )
        .unwrap();

        let result = delete_expense(expense.id, bob.id, &conn);

        assert_eq!(result, Err(Error::NotAllowed));
        assert_eq!(count_expenses(&conn), Ok(1));
    }

    #[test]
    fn delete_fails_on_missing_expense() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", &conn);

        assert_eq!(delete_expense(7, user.id, &conn), Err(Error::NotFound));
    }
}
