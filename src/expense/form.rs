//! Parses the form data a user submits to record an expense.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    expense::{Expense, ExpenseBuilder},
    user::UserID,
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The raw form data for creating an expense.
///
/// Every field is text so that validation can report which field is wrong
/// instead of rejecting the whole request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseForm {
    /// What the money was spent on. Required.
    #[serde(default)]
    pub title: String,
    /// How much was spent. Required.
    #[serde(default)]
    pub amount: String,
    /// An optional category.
    #[serde(default)]
    pub category: String,
    /// The date as `YYYY-MM-DD`. Defaults to `today` if blank or malformed.
    #[serde(default)]
    pub date: String,
}

impl ExpenseForm {
    /// Validate the form and turn it into an expense for `user_id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::MissingField] if the title or amount is blank,
    /// - or [Error::InvalidAmount] if the amount is not a number.
    pub fn into_builder(self, user_id: UserID, today: Date) -> Result<ExpenseBuilder, Error> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::MissingField("title"));
        }

        let amount = self.amount.trim();
        if amount.is_empty() {
            return Err(Error::MissingField("amount"));
        }
        let amount = parse_amount(amount)?;

        let category = Some(self.category.trim())
            .filter(|category| !category.is_empty())
            .map(str::to_owned);

        let date = parse_date(self.date.trim()).unwrap_or(today);

        Ok(Expense::build(user_id, title, amount, date).category(category))
    }
}

fn parse_amount(raw_amount: &str) -> Result<Decimal, Error> {
    raw_amount
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw_amount))
        .map_err(|_| Error::InvalidAmount(raw_amount.to_owned()))
}

fn parse_date(raw_date: &str) -> Option<Date> {
    if raw_date.is_empty() {
        return None;
    }

    Date::parse(raw_date, DATE_FORMAT)
        .inspect_err(|error| {
            tracing::debug!("Could not parse date {raw_date:?}, using today instead: {error}")
        })
        .ok()
}
