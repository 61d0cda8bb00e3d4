//! Conditional request module
//!
//! `Last-Modified` generation and `If-Modified-Since` evaluation.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::SystemTime;

/// IMF-fixdate, the preferred HTTP-date format
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// Obsolete RFC 850 format
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// Obsolete asctime format
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Format a timestamp as an HTTP-date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(IMF_FIXDATE).to_string()
}

/// Parse any of the three HTTP-date formats
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    [IMF_FIXDATE, RFC850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Whether a file modified at `modified` can be answered with 304
///
/// Comparison is at second precision since HTTP-dates carry no fraction.
/// Unparseable headers and a zero (epoch) mtime never match.
pub fn is_not_modified(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    let modified = DateTime::<Utc>::from(modified).timestamp();
    if modified <= 0 {
        return false;
    }
    modified <= since.timestamp()
}
