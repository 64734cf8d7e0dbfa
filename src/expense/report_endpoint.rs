//! Defines the endpoint for downloading a PDF report of a user's expenses.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{
    AppState, Error,
    expense::{SortOrder, list_expenses},
    report::{ExpenseRecord, PageSize, RenderedReport, ReportContext, ReportLayout, generate},
    user::{UserID, get_user_by_id},
};

/// The state needed to export a report.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The page size of the report.
    pub page_size: PageSize,
    /// Where text is drawn on the report.
    pub report_layout: Arc<ReportLayout>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            page_size: state.page_size,
            report_layout: state.report_layout.clone(),
        }
    }
}

/// A route handler that responds with a PDF of the signed-in user's expenses
/// as a file download.
pub async fn export_report_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let report = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        render_report(
            user_id,
            now_local(),
            state.page_size,
            &state.report_layout,
            &connection,
        )
    };

    match report {
        Ok(report) => (
            [
                (CONTENT_TYPE, report.content_type.to_owned()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", report.filename),
                ),
            ],
            report.bytes,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not export report for user {user_id}: {error}");
            error.into_response()
        }
    }
}

/// Render a report of all of a user's expenses, oldest first.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the user does not exist,
/// - [Error::RenderError] if the report could not be generated,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn render_report(
    user_id: UserID,
    generated_at: PrimitiveDateTime,
    page_size: PageSize,
    layout: &ReportLayout,
    connection: &Connection,
) -> Result<RenderedReport, Error> {
    let user = get_user_by_id(user_id, connection)?;
    let records: Vec<ExpenseRecord> = list_expenses(user_id, SortOrder::Ascending, connection)?
        .iter()
        .map(ExpenseRecord::from)
        .collect();

    let context = ReportContext {
        generated_at,
        user_label: user.email.as_ref(),
        records: &records,
    };

    Ok(generate(&context, page_size, layout)?)
}

/// The current local wall-clock time, or UTC if the local offset is unknown.
pub fn now_local() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|error| {
        tracing::debug!("Could not determine local time, using UTC: {error}");
        OffsetDateTime::now_utc()
    });

    PrimitiveDateTime::new(now.date(), now.time())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        expense::{Expense, create_expense},
        report::{PDF_CONTENT_TYPE, PageSize, RenderError, ReportLayout},
        test_utils::{
            assert_content_type, assert_status, assert_status_ok, create_test_user,
            get_header, get_test_connection,
        },
        user::UserID,
    };

    use super::{ReportState, export_report_endpoint, render_report};

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[tokio::test]
    async fn responds_with_pdf_download() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", dec!(0), &conn);
        create_expense(
            Expense::build(user.id, "Coffee", dec!(3.5), date!(2024 - 01 - 05))
                .category(Some("Food".to_owned())),
            &conn,
        )
        .unwrap();
        let state = ReportState {
            db_connection: Arc::new(Mutex::new(conn)),
            page_size: PageSize::A4,
            report_layout: Arc::new(ReportLayout::default()),
        };

        let response = export_report_endpoint(State(state), Extension(user.id)).await;

        assert_status_ok(&response);
        assert_content_type(&response, PDF_CONTENT_TYPE);
        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=\"Expense_Report.pdf\""
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.starts_with(b"%PDF-"));
        assert!(contains(&body, b"(Total: 3.50)"));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let state = ReportState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            page_size: PageSize::A4,
            report_layout: Arc::new(ReportLayout::default()),
        };

        let response = export_report_endpoint(State(state), Extension(UserID::new(9))).await;

        assert_status(&response, StatusCode::NOT_FOUND);
    }

    #[test]
    fn report_only_has_the_users_expenses_oldest_first() {
        let conn = get_test_connection();
        let alice = create_test_user("alice@example.com", dec!(0), &conn);
        let bob = create_test_user("bob@example.com", dec!(0), &conn);
        for (user, title, date) in [
            (&alice, "Rent", date!(2024 - 02 - 10)),
            (&bob, "Secret", date!(2024 - 01 - 01)),
            (&alice, "Coffee", date!(2024 - 01 - 05)),
        ] {
            create_expense(Expense::build(user.id, title, dec!(1), date), &conn).unwrap();
        }

        let report = render_report(
            alice.id,
            datetime!(2024-03-01 09:30:00),
            PageSize::A4,
            &ReportLayout::default(),
            &conn,
        )
        .unwrap();

        let coffee = report
            .bytes
            .windows(8)
            .position(|window| window == b"(Coffee)")
            .unwrap();
        let rent = report
            .bytes
            .windows(6)
            .position(|window| window == b"(Rent)")
            .unwrap();
        assert!(coffee < rent);
        assert!(!contains(&report.bytes, b"(Secret)"));
        assert!(contains(&report.bytes, b"(Total: 2.00)"));
    }

    #[test]
    fn empty_report_has_one_page() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", dec!(0), &conn);

        let report = render_report(
            user.id,
            datetime!(2024-03-01 09:30:00),
            PageSize::A4,
            &ReportLayout::default(),
            &conn,
        )
        .unwrap();

        assert_eq!(report.page_count, 1);
        assert!(contains(&report.bytes, b"(Total: 0.00)"));
    }

    #[test]
    fn invalid_layout_is_a_render_error() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", dec!(0), &conn);
        let page_size = PageSize {
            width: 0.0,
            height: 842.0,
        };

        let result = render_report(
            user.id,
            datetime!(2024-03-01 09:30:00),
            page_size,
            &ReportLayout::default(),
            &conn,
        );

        assert!(matches!(
            result,
            Err(Error::RenderError(RenderError::InvalidLayout(_)))
        ));
    }
}
