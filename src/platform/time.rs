//! Wall-clock access.
//!
//! Domain code takes the current time as a parameter; only the outer layers
//! (`Storefront`, CLI, web bindings) read the clock.

use chrono::{DateTime, NaiveDate, Utc};

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_millis() -> i64 {
    js_sys::Date::now() as i64
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Current UTC time
pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(now_millis()).unwrap_or_default()
}

/// Current UTC calendar date
pub fn today() -> NaiveDate {
    now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_after_2024() {
        let year = today().format("%Y").to_string();
        assert!(year.as_str() >= "2024");
    }
}
