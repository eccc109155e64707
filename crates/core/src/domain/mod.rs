pub mod credit;
pub mod invoice;
pub mod package;
pub mod payment;
pub mod profile;

use chrono::{DateTime, TimeZone, Utc};

/// Builds one of the fixed timestamps baked into the mock billing data.
pub(crate) fn utc_timestamp(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second).single().unwrap_or_default()
}
