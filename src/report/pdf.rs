//! Serializes laid-out pages into a PDF document.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::report::{
    RenderError,
    font::{Font, encode_win_ansi},
    layout::{DrawOp, Page, PageSize, REPORT_TITLE},
};

/// Hands out sequential object IDs, starting at 1.
struct RefAllocator {
    next: i32,
}

impl RefAllocator {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn bump(&mut self) -> Result<Ref, RenderError> {
        let id = self.next;
        self.next = id.checked_add(1).ok_or_else(|| {
            RenderError::SerializationFailure("ran out of PDF object IDs".to_owned())
        })?;

        Ok(Ref::new(id))
    }
}

/// Write `pages` as a PDF document with every page sized `page_size`.
///
/// Text uses the non-embedded standard fonts Helvetica and Helvetica-Bold
/// with `WinAnsiEncoding`. Content streams are left uncompressed and the
/// output contains no timestamps, so identical pages give identical bytes.
///
/// # Errors
/// Returns a [RenderError::SerializationFailure] if the document needs more
/// objects than PDF object IDs can address.
pub fn serialize(pages: &[Page], page_size: PageSize) -> Result<Vec<u8>, RenderError> {
    let mut refs = RefAllocator::new();
    let catalog_id = refs.bump()?;
    let page_tree_id = refs.bump()?;
    let regular_font_id = refs.bump()?;
    let bold_font_id = refs.bump()?;
    let info_id = refs.bump()?;

    let mut page_ids = Vec::with_capacity(pages.len());
    let mut content_ids = Vec::with_capacity(pages.len());
    for _ in pages {
        page_ids.push(refs.bump()?);
        content_ids.push(refs.bump()?);
    }

    let page_count = i32::try_from(pages.len()).map_err(|_| {
        RenderError::SerializationFailure(format!("too many pages: {}", pages.len()))
    })?;

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_count);

    let media_box = Rect::new(0.0, 0.0, page_size.width, page_size.height);
    for ((page, &page_id), &content_id) in pages.iter().zip(&page_ids).zip(&content_ids) {
        let mut pdf_page = pdf.page(page_id);
        pdf_page.media_box(media_box);
        pdf_page.parent(page_tree_id);
        pdf_page.contents(content_id);
        pdf_page
            .resources()
            .fonts()
            .pair(Font::Regular.resource_name(), regular_font_id)
            .pair(Font::Bold.resource_name(), bold_font_id);
        pdf_page.finish();

        pdf.stream(content_id, &encode_page(page));
    }

    for (font, id) in [(Font::Regular, regular_font_id), (Font::Bold, bold_font_id)] {
        pdf.type1_font(id)
            .base_font(font.base_font())
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    pdf.document_info(info_id).title(TextStr(REPORT_TITLE));

    Ok(pdf.finish())
}

fn encode_page(page: &Page) -> Vec<u8> {
    let mut content = Content::new();

    for op in &page.ops {
        match op {
            DrawOp::Text {
                font,
                size,
                x,
                y,
                text,
            } => {
                content.begin_text();
                content.set_font(font.resource_name(), *size);
                content.next_line(*x, *y);
                content.show(Str(&encode_win_ansi(text)));
                content.end_text();
            }
            DrawOp::Rule { from_x, to_x, y } => {
                content.move_to(*from_x, *y);
                content.line_to(*to_x, *y);
                content.stroke();
            }
        }
    }

    content.finish()
}
