// Interview sheet ("ficha") report: layout into a page model, then PDF serialisation.
// Layout is CPU-bound; handlers run it inside tokio::task::spawn_blocking.

pub mod config;
pub mod document;
pub mod handlers;
pub mod metrics;
pub mod pdf;
pub mod sheet;

use chrono::NaiveDateTime;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::models::person::PersonRecord;
use crate::report::config::LayoutConfig;

/// Lays out and serialises the sheet for `person`.
pub fn render_report(
    person: &PersonRecord,
    cfg: &LayoutConfig,
    generated_at: NaiveDateTime,
) -> Vec<u8> {
    let doc = sheet::layout_sheet(person, cfg, generated_at);
    debug!(pages = doc.page_count(), "Sheet laid out");
    pdf::write_pdf(&doc, &format!("{} - {}", sheet::TITLE, person.full_name()))
}

/// Characters left bare in an RFC 5987 `ext-value`; everything else is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `ficha_usuario_<name>_<surnames>.pdf`, reduced to ASCII so it is a valid header value.
/// Falls back to the record id when neither name part has a Latin letter or digit.
pub fn report_filename(person: &PersonRecord) -> String {
    let parts: Vec<String> = [&person.fields.name, &person.fields.surnames]
        .into_iter()
        .map(|part| ascii_fold(part))
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        return format!("ficha_usuario_{}.pdf", person.id);
    }
    format!("ficha_usuario_{}.pdf", parts.join("_"))
}

/// The same name as [`report_filename`] without folding, in its original script.
pub fn report_filename_utf8(person: &PersonRecord) -> String {
    format!(
        "ficha_usuario_{}_{}.pdf",
        underscore_spaces(&person.fields.name),
        underscore_spaces(&person.fields.surnames)
    )
}

/// `Content-Disposition` value with an ASCII `filename` and an RFC 6266 `filename*`.
pub fn content_disposition(person: &PersonRecord) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        report_filename(person),
        utf8_percent_encode(&report_filename_utf8(person), ATTR_CHAR)
    )
}

fn underscore_spaces(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn ascii_fold(text: &str) -> String {
    text.trim()
        .nfd()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}
