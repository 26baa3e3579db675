//! RFC 3339 timestamps that decode leniently.
//!
//! The platform sometimes omits timestamps or sends an empty string. A bad
//! timestamp should not fail an otherwise useful response, so these fields
//! decode to `None` instead of erroring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Stamped {
        #[serde(default, with = "super")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn parses_rfc3339() {
        let s: Stamped = serde_json::from_str(r#"{"at":"2026-02-18T12:00:00+02:00"}"#).unwrap();
        assert_eq!(s.at, Some(Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap()));
    }

    #[test]
    fn garbage_and_missing_become_none() {
        let bad: Stamped = serde_json::from_str(r#"{"at":"yesterday"}"#).unwrap();
        let empty: Stamped = serde_json::from_str(r#"{"at":""}"#).unwrap();
        let null: Stamped = serde_json::from_str(r#"{"at":null}"#).unwrap();
        let missing: Stamped = serde_json::from_str("{}").unwrap();
        assert!(bad.at.is_none() && empty.at.is_none() && null.at.is_none() && missing.at.is_none());
    }
}
