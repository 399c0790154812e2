//! Custom serde helpers for backend wire formats.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a backend timestamp.
///
/// The REST API emits ISO 8601 strings. Columns stored without a zone come
/// back naive (`2024-05-01T12:30:00.123456`) and are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// `DateTime<Utc>` from an RFC 3339 or naive ISO 8601 string.
pub mod backend_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_datetime(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp: {}", raw)))
    }
}

/// Optional variant of [`backend_datetime`]; `null` or missing → `None`.
pub mod backend_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => super::parse_datetime(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp: {}", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(with = "backend_datetime")]
        created_at: DateTime<Utc>,
        #[serde(default, with = "backend_datetime_opt")]
        updated_at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let dt = parse_datetime("2024-05-01T12:30:00.123456").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_with_offset() {
        let dt = parse_datetime("2024-05-01T12:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn test_row_with_null_and_missing_updated_at() {
        let row: Row =
            serde_json::from_str(r#"{"created_at":"2024-05-01T12:30:00","updated_at":null}"#)
                .unwrap();
        assert!(row.updated_at.is_none());
        assert_eq!(row.created_at.minute(), 30);

        let row: Row = serde_json::from_str(r#"{"created_at":"2024-05-01T12:30:00Z"}"#).unwrap();
        assert!(row.updated_at.is_none());
    }
}
