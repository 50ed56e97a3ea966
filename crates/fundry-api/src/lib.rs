pub mod auth;
pub mod campaigns;
pub mod config;
pub mod error;
pub mod files;
pub mod investments;
pub mod middleware;
pub mod notifications;
pub mod payments;

#[cfg(test)]
pub(crate) mod test_support;

use chrono::{DateTime, Utc};
use tracing::warn;

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as RFC 3339 first, then fall back to naive UTC.
pub(crate) fn parse_sqlite_datetime(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", s, e);
            DateTime::default()
        })
}

/// Row ids are written as UUID strings by this crate; anything else is
/// corruption and surfaces as a 500 rather than a silent nil id.
pub(crate) fn parse_uuid(s: &str) -> Result<uuid::Uuid, error::ApiError> {
    s.parse()
        .map_err(|e| error::ApiError::Internal(anyhow::anyhow!("corrupt id '{}': {}", s, e)))
}
