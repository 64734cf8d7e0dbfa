//! Expense management for the expense tracker.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model and `ExpenseBuilder` for creating expenses
//! - Parsing and validating the expense form
//! - Database functions for storing, listing, totalling and deleting expenses
//! - Route handlers for the expense API and the PDF report

mod core;
mod create_endpoint;
mod delete_endpoint;
mod form;
mod list_endpoint;
mod report_endpoint;

pub use core::{
    Expense, ExpenseBuilder, SortOrder, create_expense, create_expense_table, delete_expense,
    get_expense, list_expenses, total_expenses,
};
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use form::ExpenseForm;
pub use list_endpoint::{ExpenseSummary, list_expenses_endpoint};
pub use report_endpoint::{export_report_endpoint, now_local, render_report};

#[cfg(test)]
pub use core::count_expenses;
