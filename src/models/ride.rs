use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Lifecycle of a booked lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    PendingPayment,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RideStatus::PendingPayment => "pending payment",
            RideStatus::Scheduled => "scheduled",
            RideStatus::InProgress => "in progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// A booked lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: i64,
    pub student_id: i64,
    pub instructor_id: i64,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub price: f64,
    pub status: RideStatus,
    #[serde(default)]
    pub pickup_latitude: Option<f64>,
    #[serde(default)]
    pub pickup_longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Booking request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRide {
    pub instructor_id: i64,
    pub scheduled_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_longitude: Option<f64>,
}

/// Parse RFC 3339, falling back to a naive ISO-8601 timestamp read as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn lenient_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_ride_with_naive_timestamp() {
        let ride: Ride = serde_json::from_value(json!({
            "id": 10,
            "student_id": 1,
            "instructor_id": 3,
            "scheduled_at": "2026-11-02T14:00:00",
            "duration_minutes": 50,
            "price": 60.0,
            "status": "pending_payment",
            "created_at": "2026-10-19T08:00:00.123456"
        }))
        .unwrap();

        assert_eq!(
            ride.scheduled_at,
            Utc.with_ymd_and_hms(2026, 11, 2, 14, 0, 0).unwrap()
        );
        assert_eq!(ride.status, RideStatus::PendingPayment);
        assert!(ride.created_at.is_some());
        assert_eq!(ride.pickup_latitude, None);
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let parsed = parse_timestamp("2026-11-02T11:00:00-03:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 11, 2, 14, 0, 0).unwrap());
        assert_eq!(parse_timestamp("next tuesday"), None);
    }

    #[test]
    fn test_new_ride_skips_missing_pickup() {
        let ride = NewRide {
            instructor_id: 3,
            scheduled_at: Utc.with_ymd_and_hms(2026, 11, 2, 14, 0, 0).unwrap(),
            pickup_latitude: None,
            pickup_longitude: None,
        };
        let value = serde_json::to_value(&ride).unwrap();
        assert!(value.get("pickup_latitude").is_none());
        assert_eq!(value["instructor_id"], 3);
    }
}
