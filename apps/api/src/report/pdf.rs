//! Serialises a laid-out [`Document`] with `pdf-writer`.
//!
//! Text uses the standard Helvetica and Helvetica-Bold Type 1 fonts with WinAnsi encoding,
//! so nothing is embedded. Content streams are left uncompressed.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use unicode_normalization::UnicodeNormalization;

use crate::report::document::{Align, Document, DrawOp, Weight};
use crate::report::metrics::{measure, MM_PER_PT};

const REGULAR_FONT: Name<'static> = Name(b"F1");
const BOLD_FONT: Name<'static> = Name(b"F2");

fn mm(v: f32) -> f32 {
    v / MM_PER_PT
}

fn font_name(weight: Weight) -> Name<'static> {
    match weight {
        Weight::Regular => REGULAR_FONT,
        Weight::Bold => BOLD_FONT,
    }
}

/// WinAnsi (Windows-1252) byte for `c`, if it has one.
fn winansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x0020..=0x007E => Some(c as u8),
        0x00A0..=0x00FF => Some(c as u8),
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x2026 => Some(0x85),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x0152 => Some(0x8C),
        0x0153 => Some(0x9C),
        _ => None,
    }
}

/// Encodes `s` for a WinAnsi string operand. Characters outside the code page fall back
/// to their unaccented base letter, then to `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| {
            winansi_byte(c)
                .or_else(|| c.nfd().next().and_then(winansi_byte))
                .unwrap_or(b'?')
        })
        .collect()
}

fn draw(content: &mut Content, op: &DrawOp, page_height: f32) {
    let flip = |y: f32| mm(page_height - y);
    match op {
        DrawOp::Text {
            x,
            y,
            text,
            size,
            weight,
            align,
        } => {
            let width = measure(text, *weight, *size);
            let left = match align {
                Align::Left => *x,
                Align::Center => x - width / 2.0,
                Align::Right => x - width,
            };
            content
                .begin_text()
                .set_font(font_name(*weight), *size)
                .next_line(mm(left), flip(*y))
                .show(Str(&to_winansi_bytes(text)))
                .end_text();
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width,
        } => {
            content
                .set_line_width(mm(*width))
                .move_to(mm(*x1), flip(*y1))
                .line_to(mm(*x2), flip(*y2))
                .stroke();
        }
        DrawOp::Rect { x, y, w, h, width } => {
            content
                .set_line_width(mm(*width))
                .rect(mm(*x), flip(y + h), mm(*w), mm(*h))
                .stroke();
        }
    }
}

/// Writes `doc` as a complete PDF file.
pub fn write_pdf(doc: &Document, title: &str) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();
    let regular_id = alloc();
    let bold_id = alloc();
    let page_ids: Vec<(Ref, Ref)> = doc.pages.iter().map(|_| (alloc(), alloc())).collect();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().map(|(page, _)| *page))
        .count(page_ids.len() as i32);
    pdf.document_info(info_id).title(TextStr(title));

    pdf.type1_font(regular_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_id)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    let media_box = Rect::new(0.0, 0.0, mm(doc.width), mm(doc.height));
    for (page, (page_id, content_id)) in doc.pages.iter().zip(&page_ids) {
        {
            let mut pdf_page = pdf.page(*page_id);
            pdf_page
                .media_box(media_box)
                .parent(pages_id)
                .contents(*content_id);
            let mut resources = pdf_page.resources();
            let mut fonts = resources.fonts();
            fonts.pair(REGULAR_FONT, regular_id);
            fonts.pair(BOLD_FONT, bold_id);
            fonts.finish();
            resources.finish();
            pdf_page.finish();
        }

        let mut content = Content::new();
        for op in &page.ops {
            draw(&mut content, op, doc.height);
        }
        let raw = content.finish();
        pdf.stream(*content_id, raw.as_slice());
    }

    pdf.finish()
}
