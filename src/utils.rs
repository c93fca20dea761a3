use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Day-first date layouts, two-digit year variants first so that `%Y`
/// never swallows a two-digit year as year 00xx.
const DAY_FIRST_FORMATS: [&str; 8] = [
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Year-first layouts are unambiguous and tried after the day-first ones.
const YEAR_FIRST_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: [&str; 8] = [
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a transaction date using the day-first policy.
///
/// `05/01/2024` is the 5th of January. Month-first input is never
/// attempted, so `01/13/2024` is rejected rather than reinterpreted.
/// Returns `None` when no layout matches.
pub fn parse_day_first_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    DAY_FIRST_FORMATS
        .iter()
        .chain(YEAR_FIRST_FORMATS.iter())
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a numeric cell. Non-finite values count as unparsable.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Canonical `YYYY-MM` label for the month containing `date`.
pub fn year_month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}
