use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    Email,
    db::initialize,
    user::{User, create_user},
};

pub(crate) fn get_test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    conn
}

#[track_caller]
pub(crate) fn create_test_user(email: &str, budget: Decimal, conn: &Connection) -> User {
    create_user(Email::new(email).unwrap(), budget, conn).unwrap()
}
