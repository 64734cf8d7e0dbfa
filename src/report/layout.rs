//! The pagination pass that turns expense records into pages of draw operations.

use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::report::{
    ExpenseRecord, RenderError, ReportContext,
    font::{Font, text_width},
    format::{format_amount, sum_amounts},
};

/// The text drawn at the top of the first page.
pub const REPORT_TITLE: &str = "Expense Report";

/// The column headers, in the order date, title, category, amount.
pub const COLUMN_HEADERS: [&str; 4] = ["Date", "Title", "Category", "Amount"];

/// Drawn in place of a missing or empty category.
pub const MISSING_CATEGORY: &str = "-";

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The size of a page in PDF user units (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Page width.
    pub width: f32,
    /// Page height.
    pub height: f32,
}

impl PageSize {
    /// A4 rounded to whole user units.
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Where each table column starts, measured from the left edge of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnOffsets {
    /// The date column.
    pub date: f32,
    /// The title column.
    pub title: f32,
    /// The category column.
    pub category: f32,
    /// The amount column header. Amounts are right-aligned to
    /// `amount + ReportLayout::amount_width`.
    pub amount: f32,
}

/// The coordinates and sizes that control where report text is drawn.
///
/// Vertical positions named `*_top` are measured down from the top edge of
/// the page, gaps are distances the cursor moves down, and
/// `page_break_threshold` is measured up from the bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    /// Column x-offsets.
    pub columns: ColumnOffsets,
    /// Distance from the amount column offset to the right edge of amounts.
    pub amount_width: f32,
    /// Vertical distance between two table rows.
    pub row_height: f32,
    /// Font size of the report title.
    pub title_font_size: f32,
    /// Font size of the column headers and the total line.
    pub header_font_size: f32,
    /// Font size of the timestamp and user label lines.
    pub info_font_size: f32,
    /// Font size of table rows.
    pub body_font_size: f32,
    /// X-offset of the title.
    pub title_x: f32,
    /// X-offset of the timestamp, user label and total lines.
    pub margin_x: f32,
    /// Baseline of the title.
    pub title_top: f32,
    /// Baseline of the generation timestamp.
    pub timestamp_top: f32,
    /// Baseline of the user label.
    pub user_label_top: f32,
    /// Baseline of the column headers on the first page.
    pub table_top: f32,
    /// Baseline of the column headers on continuation pages.
    pub continuation_top: f32,
    /// Gap between the header baseline and the rule beneath it.
    pub header_rule_gap: f32,
    /// Gap between the header rule and the first row.
    pub first_row_gap: f32,
    /// Gap between the header baseline and the first row on continuation pages.
    pub continuation_row_gap: f32,
    /// Gap between the cursor after the last row and the closing rule.
    pub closing_rule_gap: f32,
    /// Gap between the closing rule and the total line.
    pub total_gap: f32,
    /// A new page starts when the cursor drops below this height.
    pub page_break_threshold: f32,
    /// Left end of horizontal rules.
    pub rule_left: f32,
    /// Right end of horizontal rules.
    pub rule_right: f32,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            columns: ColumnOffsets {
                date: 50.0,
                title: 150.0,
                category: 350.0,
                amount: 470.0,
            },
            amount_width: 50.0,
            row_height: 20.0,
            title_font_size: 18.0,
            header_font_size: 12.0,
            info_font_size: 12.0,
            body_font_size: 11.0,
            title_x: 180.0,
            margin_x: 50.0,
            title_top: 50.0,
            timestamp_top: 70.0,
            user_label_top: 90.0,
            table_top: 130.0,
            continuation_top: 100.0,
            header_rule_gap: 15.0,
            first_row_gap: 20.0,
            continuation_row_gap: 30.0,
            closing_rule_gap: 10.0,
            total_gap: 25.0,
            page_break_threshold: 80.0,
            rule_left: 45.0,
            rule_right: 550.0,
        }
    }
}

impl ReportLayout {
    /// Check that the layout can be drawn on a page of `page_size`.
    ///
    /// # Errors
    /// Returns [RenderError::InvalidLayout] if:
    /// - either page dimension is not a positive, finite number,
    /// - a font size or the row height is not positive, or a gap is negative,
    /// - an x-offset lies outside the page,
    /// - the rules do not run left to right,
    /// - or a continuation page has no room for a single row.
    pub fn validate(&self, page_size: PageSize) -> Result<(), RenderError> {
        let PageSize { width, height } = page_size;

        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(invalid(format!(
                "page size must be positive, got {width}x{height}"
            )));
        }

        let positive = [
            ("row height", self.row_height),
            ("title font size", self.title_font_size),
            ("header font size", self.header_font_size),
            ("info font size", self.info_font_size),
            ("body font size", self.body_font_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let gaps = [
            ("amount width", self.amount_width),
            ("title top", self.title_top),
            ("timestamp top", self.timestamp_top),
            ("user label top", self.user_label_top),
            ("table top", self.table_top),
            ("continuation top", self.continuation_top),
            ("header rule gap", self.header_rule_gap),
            ("first row gap", self.first_row_gap),
            ("continuation row gap", self.continuation_row_gap),
            ("closing rule gap", self.closing_rule_gap),
            ("total gap", self.total_gap),
            ("page break threshold", self.page_break_threshold),
        ];
        for (name, value) in gaps {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!("{name} must not be negative, got {value}")));
            }
        }

        let x_offsets = [
            ("date column", self.columns.date),
            ("title column", self.columns.title),
            ("category column", self.columns.category),
            ("amount column", self.columns.amount),
            ("amount anchor", self.columns.amount + self.amount_width),
            ("title", self.title_x),
            ("margin", self.margin_x),
            ("rule left end", self.rule_left),
            ("rule right end", self.rule_right),
        ];
        for (name, x) in x_offsets {
            if !(x.is_finite() && (0.0..=width).contains(&x)) {
                return Err(invalid(format!(
                    "{name} at x={x} is outside a page {width} wide"
                )));
            }
        }

        if self.rule_left >= self.rule_right {
            return Err(invalid(format!(
                "rules must run left to right, got {} to {}",
                self.rule_left, self.rule_right
            )));
        }

        let first_continuation_row = height - self.continuation_top - self.continuation_row_gap;
        if first_continuation_row < self.page_break_threshold {
            return Err(invalid(format!(
                "continuation pages start rows at y={first_continuation_row}, \
                below the page break threshold {}",
                self.page_break_threshold
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> RenderError {
    RenderError::InvalidLayout(message)
}

/// A single drawing instruction on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A run of text whose baseline starts at (`x`, `y`).
    Text {
        /// The typeface.
        font: Font,
        /// The font size.
        size: f32,
        /// Left edge of the text.
        x: f32,
        /// Baseline of the text.
        y: f32,
        /// The text to draw.
        text: String,
    },
    /// A horizontal line at height `y`.
    Rule {
        /// Left end.
        from_x: f32,
        /// Right end.
        to_x: f32,
        /// Height above the bottom edge.
        y: f32,
    },
}

/// The draw operations for one page, in drawing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Operations in drawing order.
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// The text runs on the page, in drawing order.
    #[cfg(test)]
    pub(crate) fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Rule { .. } => None,
        })
    }

    /// The number of horizontal rules on the page.
    #[cfg(test)]
    pub(crate) fn rule_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Rule { .. }))
            .count()
    }

    fn text(&mut self, font: Font, size: f32, x: f32, y: f32, text: impl Into<String>) {
        self.ops.push(DrawOp::Text {
            font,
            size,
            x,
            y,
            text: text.into(),
        });
    }

    fn right_aligned_text(&mut self, font: Font, size: f32, right: f32, y: f32, text: String) {
        let x = right - text_width(&text, font, size);
        self.text(font, size, x, y, text);
    }

    fn rule(&mut self, from_x: f32, to_x: f32, y: f32) {
        self.ops.push(DrawOp::Rule { from_x, to_x, y });
    }
}

/// Lay out the report for `context` as a sequence of pages.
///
/// Records are drawn in the order given. Before each row, if the cursor has
/// dropped below [ReportLayout::page_break_threshold] the current page is
/// closed and the row starts a new page under a repeated header row.
///
/// # Errors
/// Returns a [RenderError::InvalidLayout] if `layout` does not fit
/// `page_size`, or a [RenderError::SerializationFailure] if the timestamp or
/// a date cannot be formatted or the total overflows.
pub fn lay_out(
    context: &ReportContext,
    page_size: PageSize,
    layout: &ReportLayout,
) -> Result<Vec<Page>, RenderError> {
    layout.validate(page_size)?;

    let height = page_size.height;
    let timestamp = context
        .generated_at
        .format(TIMESTAMP_FORMAT)
        .map_err(|error| RenderError::SerializationFailure(error.to_string()))?;

    let mut pages = Vec::new();
    let mut page = Page::default();

    page.text(
        Font::Bold,
        layout.title_font_size,
        layout.title_x,
        height - layout.title_top,
        REPORT_TITLE,
    );
    page.text(
        Font::Regular,
        layout.info_font_size,
        layout.margin_x,
        height - layout.timestamp_top,
        format!("Generated on: {timestamp}"),
    );
    page.text(
        Font::Regular,
        layout.info_font_size,
        layout.margin_x,
        height - layout.user_label_top,
        format!("User: {}", context.user_label),
    );

    let mut y = height - layout.table_top;
    draw_column_headers(&mut page, layout, y);
    y -= layout.header_rule_gap;
    page.rule(layout.rule_left, layout.rule_right, y);
    y -= layout.first_row_gap;

    for record in context.records {
        if y < layout.page_break_threshold {
            pages.push(std::mem::take(&mut page));
            y = height - layout.continuation_top;
            draw_column_headers(&mut page, layout, y);
            y -= layout.continuation_row_gap;
        }

        draw_row(&mut page, layout, y, record)?;
        y -= layout.row_height;
    }

    let total = sum_amounts(context.records.iter().map(|record| record.amount)).ok_or_else(|| {
        RenderError::SerializationFailure("the total of all amounts overflows".to_owned())
    })?;

    y -= layout.closing_rule_gap;
    page.rule(layout.rule_left, layout.rule_right, y);
    y -= layout.total_gap;
    page.text(
        Font::Bold,
        layout.header_font_size,
        layout.margin_x,
        y,
        format!("Total: {}", format_amount(total)),
    );
    pages.push(page);

    Ok(pages)
}

fn draw_column_headers(page: &mut Page, layout: &ReportLayout, y: f32) {
    let columns = &layout.columns;
    let offsets = [columns.date, columns.title, columns.category, columns.amount];

    for (header, x) in COLUMN_HEADERS.into_iter().zip(offsets) {
        page.text(Font::Bold, layout.header_font_size, x, y, header);
    }
}

fn draw_row(
    page: &mut Page,
    layout: &ReportLayout,
    y: f32,
    record: &ExpenseRecord,
) -> Result<(), RenderError> {
    let size = layout.body_font_size;
    let columns = &layout.columns;

    let date = record
        .date
        .format(DATE_FORMAT)
        .map_err(|error| RenderError::SerializationFailure(error.to_string()))?;
    let category = match record.category.as_deref() {
        Some(category) if !category.is_empty() => category,
        _ => MISSING_CATEGORY,
    };

    page.text(Font::Regular, size, columns.date, y, date);
    page.text(Font::Regular, size, columns.title, y, record.title.as_str());
    page.text(Font::Regular, size, columns.category, y, category);
    page.right_aligned_text(
        Font::Regular,
        size,
        columns.amount + layout.amount_width,
        y,
        format_amount(record.amount),
    );

    Ok(())
}
