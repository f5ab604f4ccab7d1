pub mod auth;
pub mod comments;
pub mod embed;
pub mod error;
pub mod feed;
pub mod friends;
pub mod likes;
pub mod middleware;
pub mod notifications;
pub mod playlists;
pub mod posts;
pub mod search;
pub mod state;
pub mod tags;
pub mod votes;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

/// Parse a stored uuid, logging and defaulting on corruption rather than
/// failing the whole response.
pub(crate) fn parse_id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Try RFC 3339 first, then parse as naive UTC and convert.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_datetime_format() {
        let ts = parse_timestamp("2026-08-30 12:34:56");
        assert_eq!(ts.to_rfc3339(), "2026-08-30T12:34:56+00:00");
    }

    #[test]
    fn parses_rfc3339() {
        let a = parse_timestamp("2026-08-30T12:34:56Z");
        let b = parse_timestamp("2026-08-30 12:34:56");
        assert_eq!(a, b);
    }
}
