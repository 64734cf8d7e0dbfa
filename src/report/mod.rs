//! Itemized PDF expense reports.
//!
//! Generating a report is a pure, in-memory operation:
//! - [layout] walks the records once and paginates them into draw operations,
//! - [pdf] serializes those pages into PDF bytes.
//!
//! The generator never sorts, filters or fetches records. Callers pass the
//! records for one user, already in the order they should appear.

mod font;
mod format;
mod layout;
mod pdf;

use rust_decimal::Decimal;
use time::{Date, PrimitiveDateTime};

use crate::expense::Expense;

pub use font::{Font, text_width};
pub use format::{format_amount, sum_amounts};
pub use layout::{
    COLUMN_HEADERS, ColumnOffsets, DrawOp, MISSING_CATEGORY, Page, PageSize, REPORT_TITLE,
    ReportLayout, lay_out,
};

/// The suggested file name for a downloaded report.
pub const REPORT_FILENAME: &str = "Expense_Report.pdf";

/// The MIME type of a rendered report.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// The errors that may occur while generating a report.
///
/// Both are fatal to the export: no partial document is ever returned.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RenderError {
    /// The page size or layout offsets cannot produce a readable page.
    #[error("invalid report layout: {0}")]
    InvalidLayout(String),

    /// The document could not be encoded.
    #[error("could not serialize the report: {0}")]
    SerializationFailure(String),
}

/// One row of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    /// When the expense happened.
    pub date: Date,
    /// What the expense was for.
    pub title: String,
    /// An optional category, drawn as a dash when missing or empty.
    pub category: Option<String>,
    /// The amount spent. Negative amounts are drawn as-is.
    pub amount: Decimal,
}

impl From<&Expense> for ExpenseRecord {
    fn from(expense: &Expense) -> Self {
        Self {
            date: expense.date,
            title: expense.title.clone(),
            category: expense.category.clone(),
            amount: expense.amount,
        }
    }
}

/// Everything a report shows besides its layout.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    /// The wall-clock time printed under the title.
    pub generated_at: PrimitiveDateTime,
    /// Identifies who the report belongs to, e.g. their email address.
    pub user_label: &'a str,
    /// The rows to draw, in order.
    pub records: &'a [ExpenseRecord],
}

/// A finished report, ready to be sent as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    /// The PDF document.
    pub bytes: Vec<u8>,
    /// The suggested file name, see [REPORT_FILENAME].
    pub filename: &'static str,
    /// The MIME type, see [PDF_CONTENT_TYPE].
    pub content_type: &'static str,
    /// The number of pages in the document.
    pub page_count: usize,
}

/// Render `context` as a paginated PDF document.
///
/// # Errors
/// Returns a [RenderError::InvalidLayout] if `layout` does not fit on a page
/// of `page_size`, or a [RenderError::SerializationFailure] if the document
/// could not be encoded.
pub fn generate(
    context: &ReportContext,
    page_size: PageSize,
    layout: &ReportLayout,
) -> Result<RenderedReport, RenderError> {
    let pages = lay_out(context, page_size, layout)?;
    let bytes = pdf::serialize(&pages, page_size)?;

    tracing::debug!(
        "Rendered report with {} records on {} pages ({} bytes)",
        context.records.len(),
        pages.len(),
        bytes.len()
    );

    Ok(RenderedReport {
        bytes,
        filename: REPORT_FILENAME,
        content_type: PDF_CONTENT_TYPE,
        page_count: pages.len(),
    })
}
