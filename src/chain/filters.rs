//! Narrowing the option parameters down to the contracts worth exploring.

use time::macros::format_description;
use time::{Date, Duration};

use crate::Error;

/// Formats `date` the way the gateway writes expirations (YYYYMMDD).
pub fn format_date(date: Date) -> String {
    format!("{:04}{:02}{:02}", date.year(), u8::from(date.month()), date.day())
}

/// Parses a YYYYMMDD expiration.
pub fn parse_date(expiration: &str) -> Result<Date, Error> {
    Ok(Date::parse(expiration, format_description!("[year][month][day]"))?)
}

/// Expirations between `today + min_days` and `today + max_days`, both ends inclusive.
///
/// The result is sorted and free of duplicates.
pub fn select_expirations<'a>(expirations: impl IntoIterator<Item = &'a String>, today: Date, min_days: i64, max_days: i64) -> Vec<String> {
    let mut sorted: Vec<&String> = expirations.into_iter().collect();
    sorted.sort();
    sorted.dedup();

    let first = format_date(today + Duration::days(min_days));
    let last = format_date(today + Duration::days(max_days));

    let start = sorted.partition_point(|expiration| expiration.as_str() < first.as_str());
    let end = sorted.partition_point(|expiration| expiration.as_str() <= last.as_str());

    sorted[start..end.max(start)].iter().map(|expiration| expiration.to_string()).collect()
}

/// Up to `half_width` strikes below `price` and up to `half_width` at or above it.
///
/// Sorted, without duplicates. A price outside the known strikes selects the strikes at
/// the nearest end.
pub fn select_strikes(strikes: &[f64], price: f64, half_width: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = strikes.iter().copied().filter(|strike| strike.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();

    let position = sorted.partition_point(|strike| *strike < price);
    let start = position.saturating_sub(half_width);
    let end = (position + half_width).min(sorted.len());

    sorted[start..end].to_vec()
}
