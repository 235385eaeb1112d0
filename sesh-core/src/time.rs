//! Utilities and types related to time.

use time::OffsetDateTime;

const WEEK_IN_SECONDS: i64 = 60 * 60 * 24 * 7;

/// Default session lifetime, in seconds: seven days.
pub const SESSION_LIFETIME_SECONDS_DEFAULT: i64 = WEEK_IN_SECONDS;

/// The current time, expressed as Unix-seconds since the epoch.
#[inline]
pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
