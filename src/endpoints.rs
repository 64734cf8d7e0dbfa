//! The API endpoints URIs.

/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to list and create the current user's expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to delete one of the current user's expenses.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to download the current user's expense report.
pub const EXPENSE_REPORT: &str = "/api/expenses/report";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// Expects the path to contain exactly one parameter, e.g. `/api/expenses/{expense_id}`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    match (endpoint_path.find('{'), endpoint_path.find('}')) {
        (Some(start), Some(end)) if start < end => format!(
            "{}{id}{}",
            &endpoint_path[..start],
            &endpoint_path[end + 1..]
        ),
        _ => endpoint_path.to_owned(),
    }
}
