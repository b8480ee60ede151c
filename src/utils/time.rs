use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn from_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Parses the timestamp shapes the school API emits. Offsetless values
/// (`2025-01-01T09:00:00`, `2025-01-01T09:00`) are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = from_rfc3339(raw) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Deserializes an optional timestamp, mapping anything unparseable to `None`
/// so one bad window never fails decoding of the surrounding document.
pub fn deserialize_lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Millis(i64),
        Other(serde_json::Value),
    }

    let raw: Option<RawTimestamp> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimestamp::Text(s)) => parse_timestamp(&s),
        Some(RawTimestamp::Millis(ms)) => DateTime::<Utc>::from_timestamp_millis(ms),
        Some(RawTimestamp::Other(_)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_offset_and_naive_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-01T09:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T10:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T09:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T09:00"), Some(expected));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("Invalid Date"), None);
        assert_eq!(parse_timestamp("2025-13-45T99:00:00Z"), None);
    }
}
