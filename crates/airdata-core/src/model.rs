use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeDelta, Timelike, Utc};
use serde::Deserialize;

/// Formats `at` the way the Awair API and the object keys expect it: RFC 3339, whole
/// seconds, `Z` suffix.
pub fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn truncate_to_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    let into_hour = TimeDelta::seconds(i64::from(at.minute()) * 60 + i64::from(at.second()))
        + TimeDelta::nanoseconds(i64::from(at.nanosecond()));
    at - into_hour
}

/// The hour of data exported by one run.
///
/// Boundary inclusivity is whatever the Awair API applies to `from`/`to`; the window is
/// passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl TimeWindow {
    /// The full hour that ends at the top of the hour containing `trigger`.
    pub fn ending_at(trigger: DateTime<Utc>) -> Self {
        let to = truncate_to_hour(trigger);
        Self {
            from: to - TimeDelta::hours(1),
            to,
        }
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    pub fn storage_key(&self) -> String {
        storage_key(self.to)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", rfc3339(self.from), rfc3339(self.to))
    }
}

/// Object-store key for the window ending at `to`. Lexically sortable.
pub fn storage_key(to: DateTime<Utc>) -> String {
    rfc3339(to)
}

/// One sensor's measurement at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub component: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorValue {
    pub comp: String,
    pub value: f64,
}

/// One instant reported by the API, bundling every sensor component sampled then.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimePoint {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sensors: Vec<SensorValue>,
}

impl TimePoint {
    pub fn into_readings(self) -> impl Iterator<Item = Reading> {
        let timestamp = self.timestamp;
        self.sensors.into_iter().map(move |sensor| Reading {
            timestamp,
            component: sensor.comp,
            value: sensor.value,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirDataResponse {
    #[serde(default)]
    pub data: Vec<TimePoint>,
}

impl AirDataResponse {
    pub fn into_readings(self) -> Vec<Reading> {
        self.data
            .into_iter()
            .flat_map(TimePoint::into_readings)
            .collect()
    }
}

/// Payload delivered by the hourly scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TriggerEvent {
    pub time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().expect("valid timestamp")
    }

    #[test]
    fn window_spans_previous_full_hour() {
        let window = TimeWindow::ending_at(utc("2023-06-01T15:23:00Z"));
        assert_eq!(window.from(), utc("2023-06-01T14:00:00Z"));
        assert_eq!(window.to(), utc("2023-06-01T15:00:00Z"));
    }

    #[test]
    fn window_truncates_seconds_and_subseconds() {
        for minute in [0, 1, 30, 59] {
            for second in [0, 17, 59] {
                let trigger = Utc
                    .with_ymd_and_hms(2024, 2, 29, 23, minute, second)
                    .unwrap()
                    + TimeDelta::nanoseconds(123_456_789);
                let window = TimeWindow::ending_at(trigger);
                assert_eq!(window.to(), Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap());
                assert_eq!(window.to() - window.from(), TimeDelta::hours(1));
            }
        }
    }

    #[test]
    fn window_on_the_hour_ends_at_trigger() {
        let trigger = utc("2023-01-01T00:00:00Z");
        let window = TimeWindow::ending_at(trigger);
        assert_eq!(window.to(), trigger);
        assert_eq!(window.from(), utc("2022-12-31T23:00:00Z"));
    }

    #[test]
    fn storage_key_depends_only_on_window_end() {
        let a = TimeWindow::ending_at(utc("2023-06-01T15:01:00Z"));
        let b = TimeWindow::ending_at(utc("2023-06-01T15:59:59Z"));
        assert_eq!(a.storage_key(), "2023-06-01T15:00:00Z");
        assert_eq!(a.storage_key(), b.storage_key());
        assert_eq!(storage_key(a.to()), storage_key(b.to()));
    }

    #[test]
    fn window_display_uses_rfc3339() {
        let window = TimeWindow::ending_at(utc("2023-06-01T15:23:00Z"));
        assert_eq!(window.to_string(), "2023-06-01T14:00:00Z - 2023-06-01T15:00:00Z");
    }

    #[test]
    fn timepoints_flatten_in_response_order() {
        let body = r#"{"data": [
            {"timestamp": "2023-06-01T14:30:00.000Z",
             "sensors": [{"comp": "temp", "value": 21.5}, {"comp": "co2", "value": 450}]},
            {"timestamp": "2023-06-01T14:20:00.000Z",
             "sensors": [{"comp": "humid", "value": 40.12}]}
        ]}"#;
        let response: AirDataResponse = serde_json::from_str(body).unwrap();
        let readings = response.into_readings();

        let components: Vec<&str> = readings.iter().map(|r| r.component.as_str()).collect();
        assert_eq!(components, ["temp", "co2", "humid"]);
        assert_eq!(readings[0].timestamp, utc("2023-06-01T14:30:00Z"));
        assert_eq!(readings[1].timestamp, utc("2023-06-01T14:30:00Z"));
        assert_eq!(readings[1].value, 450.0);
        assert_eq!(readings[2].timestamp, utc("2023-06-01T14:20:00Z"));
    }

    #[test]
    fn timepoint_without_sensors_yields_nothing() {
        let point: TimePoint =
            serde_json::from_str(r#"{"timestamp": "2023-06-01T14:30:00Z"}"#).unwrap();
        assert_eq!(point.into_readings().count(), 0);
    }

    #[test]
    fn trigger_event_normalizes_offsets() {
        let event: TriggerEvent =
            serde_json::from_str(r#"{"time": "2023-06-01T17:23:00+02:00"}"#).unwrap();
        assert_eq!(event.time, utc("2023-06-01T15:23:00Z"));
    }
}
