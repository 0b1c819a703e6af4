//! Conversions to the sentinel values a scripting host sees.
//!
//! Hosts get `-1.0`, `-1` or `None` instead of an error when the interface is inactive or a file could not be
//! read. Errors that point at a bug in the caller, such as a bad node index, are passed through.

use std::time::Duration;

use crate::error::{Error, Result};

/// Seconds elapsed, or `-1.0` on any failure.
#[must_use]
pub fn seconds(elapsed: Result<Duration>) -> f64 {
    elapsed.map_or(-1.0, |elapsed| elapsed.as_secs_f64())
}

/// A count, or `-1` if it failed or is unknown.
#[must_use]
pub fn count(count: Result<usize>) -> i64 {
    count.ok().and_then(|count| i64::try_from(count).ok()).unwrap_or(-1)
}

/// Turn an inactive interface into `None`, keeping every other error.
///
/// # Errors
///
/// Fails with any error other than [`Error::Inactive`].
pub fn unless_inactive<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::Inactive) => Ok(None),
        Err(err) => Err(err),
    }
}
