//! Helpers shared across the checkout crates.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp as RFC 3339 in UTC with millisecond precision,
/// e.g. `2026-10-16T09:30:00.125Z`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
	timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn test_format_timestamp_millis_utc() {
		let ts = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap()
			+ chrono::Duration::milliseconds(125);
		assert_eq!(format_timestamp(&ts), "2026-10-16T09:30:00.125Z");
	}
}
