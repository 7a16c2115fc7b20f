use chrono::{DateTime, Datelike, Local, NaiveDate};

/// Whole years between `birth` and `today`.
///
/// Calendar-year difference, minus one when today's month/day falls before the
/// birthday. A birth date in the future yields 0.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Reads `YYYY-MM-DD` as a local calendar date with no time-zone shift, or an RFC 3339
/// timestamp as its local calendar date.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Local).date_naive())
    })
}

/// Age on `today` for a birth date given as text. Unparseable input yields 0.
#[allow(dead_code)]
pub fn age_from_str(raw: &str, today: NaiveDate) -> u32 {
    parse_calendar_date(raw).map_or(0, |birth| age_on(birth, today))
}

/// Age as of the server's local date.
pub fn current_age(birth: NaiveDate) -> u32 {
    age_on(birth, Local::now().date_naive())
}
