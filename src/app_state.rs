//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    budget::Notifier,
    db::initialize,
    report::{PageSize, ReportLayout},
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// Delivers budget notices. `None` disables notices.
    pub notifier: Option<Arc<dyn Notifier>>,

    /// The page size of exported reports.
    pub page_size: PageSize,

    /// Where text is drawn on exported reports.
    pub report_layout: Arc<ReportLayout>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models,
    /// and check that `report_layout` fits on a page of `page_size` so that a bad layout is
    /// caught at start-up rather than on the first export.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the report layout is invalid.
    pub fn new(
        db_connection: Connection,
        notifier: Option<Arc<dyn Notifier>>,
        page_size: PageSize,
        report_layout: ReportLayout,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;
        report_layout.validate(page_size)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            notifier,
            page_size,
            report_layout: Arc::new(report_layout),
        })
    }
}
