//! Typed NPA response models.
//!
//! Every NPA response is wrapped in an envelope carrying a status, request
//! metadata and either `data` or `errors`. Timestamps are sent in UTC without
//! an offset (`2023-05-01T06:00:00`) and are decoded as [`DateTime<Utc>`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer};

use crate::ClientError;

/// Successful NPA response envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct Response<T> {
    pub status: ResponseStatus,
    pub meta: Meta,
    pub data: T,
}

/// Response of endpoints that only acknowledge a command.
pub type Acknowledgement = Response<Option<serde_json::Value>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Request metadata, including the daily call quota of the key.
#[derive(Clone, Debug, Deserialize)]
pub struct Meta {
    #[serde(default, deserialize_with = "optional_utc_timestamp")]
    pub last_active: Option<DateTime<Utc>>,
    pub tid: String,
    #[serde(deserialize_with = "utc_timestamp")]
    pub time: DateTime<Utc>,
    pub token_limit: u32,
    pub token_remaining: u32,
    #[serde(deserialize_with = "utc_timestamp")]
    pub token_reset: DateTime<Utc>,
    pub version: String,
}

/// Error envelope returned instead of `data` when a call fails.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub meta: Option<Meta>,
    pub errors: Vec<ErrorData>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorData {
    pub code: ErrorCode,
    pub message: String,
}

/// NPA error code. Codes outside the documented set are kept as [`ErrorCode::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "u16")]
pub enum ErrorCode {
    InvalidKey,
    Unknown,
    LimitExceeded,
    InvalidDevice,
    InternalError,
    ParameterError,
    Other(u16),
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        match self {
            Self::InvalidKey => 1,
            Self::Unknown => 2,
            Self::LimitExceeded => 3,
            Self::InvalidDevice => 4,
            Self::InternalError => 5,
            Self::ParameterError => 6,
            Self::Other(code) => code,
        }
    }
}

impl From<u16> for ErrorCode {
    fn from(code: u16) -> Self {
        match code {
            1 => Self::InvalidKey,
            2 => Self::Unknown,
            3 => Self::LimitExceeded,
            4 => Self::InvalidDevice,
            5 => Self::InternalError,
            6 => Self::ParameterError,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Standby,
    Setup,
    Online,
    Watering,
    Offline,
    Sleeping,
    PowerOff,
}

/// Status that can be set through `set_status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceSetStatus {
    Standby,
    Online,
}

impl DeviceSetStatus {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Standby => 0,
            Self::Online => 1,
        }
    }
}

impl FromStr for DeviceSetStatus {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "standby" | "0" => Ok(Self::Standby),
            "online" | "1" => Ok(Self::Online),
            _ => Err(ClientError::invalid_parameter(
                "status",
                format!("'{raw}' is not one of standby, online"),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZoneSmart {
    Smart,
    Assistant,
    Timer,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Zone {
    pub ith: u8,
    pub name: String,
    pub enabled: bool,
    pub smart: ZoneSmart,
}

/// A Netro controller.
#[derive(Clone, Debug, Deserialize)]
pub struct Device {
    pub name: String,
    pub serial: String,
    pub status: DeviceStatus,
    pub version: String,
    pub sw_version: String,
    #[serde(deserialize_with = "utc_timestamp")]
    pub last_active: DateTime<Utc>,
    pub zone_num: u8,
    pub zones: Vec<Zone>,
}

impl Device {
    /// Returns the zones of the controller, optionally only the enabled ones.
    pub fn zones(&self, only_enabled: bool) -> Vec<&Zone> {
        self.zones
            .iter()
            .filter(|zone| zone.enabled || !only_enabled)
            .collect()
    }
}

/// A Netro soil sensor.
#[derive(Clone, Debug, Deserialize)]
pub struct Sensor {
    pub name: String,
    pub serial: String,
    pub status: DeviceStatus,
    pub version: String,
    pub sw_version: String,
    #[serde(deserialize_with = "utc_timestamp")]
    pub last_active: DateTime<Utc>,
    pub battery_level: Option<f64>,
}

/// Payload of `info`. A controller key yields `device`, a sensor key `sensor`.
#[derive(Clone, Debug, Deserialize)]
pub struct InfoData {
    pub device: Option<Device>,
    pub sensor: Option<Sensor>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScheduleSource {
    Manual,
    Smart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScheduleStatus {
    Executed,
    Executing,
    Valid,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Schedule {
    pub id: u64,
    pub zone: u8,
    pub source: ScheduleSource,
    pub status: ScheduleStatus,
    #[serde(deserialize_with = "utc_timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "utc_timestamp")]
    pub end_time: DateTime<Utc>,
    pub local_date: NaiveDate,
    pub local_start_time: NaiveTime,
    pub local_end_time: NaiveTime,
}

impl Schedule {
    pub fn duration(&self) -> TimeDelta {
        self.end_time - self.start_time
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScheduleData {
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

impl ScheduleData {
    pub fn for_zone(&self, zone: u8) -> Vec<&Schedule> {
        self.schedules.iter().filter(|s| s.zone == zone).collect()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Moisture {
    pub id: u64,
    pub zone: u8,
    pub date: NaiveDate,
    pub moisture: u8,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MoistureData {
    #[serde(default)]
    pub moistures: Vec<Moisture>,
}

impl MoistureData {
    pub fn for_zone(&self, zone: u8) -> Vec<&Moisture> {
        self.moistures.iter().filter(|m| m.zone == zone).collect()
    }
}

/// Event kind, used both in event payloads and as an `events` filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum EventType {
    DeviceOffline,
    DeviceOnline,
    ScheduleStart,
    ScheduleEnd,
    Other(u8),
}

impl EventType {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::DeviceOffline => 1,
            Self::DeviceOnline => 2,
            Self::ScheduleStart => 3,
            Self::ScheduleEnd => 4,
            Self::Other(value) => value,
        }
    }
}

impl From<u8> for EventType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::DeviceOffline,
            2 => Self::DeviceOnline,
            3 => Self::ScheduleStart,
            4 => Self::ScheduleEnd,
            other => Self::Other(other),
        }
    }
}

impl FromStr for EventType {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().replace('-', "_").as_str() {
            "device_offline" => Ok(Self::DeviceOffline),
            "device_online" => Ok(Self::DeviceOnline),
            "schedule_start" => Ok(Self::ScheduleStart),
            "schedule_end" => Ok(Self::ScheduleEnd),
            other => other.parse::<u8>().map(Self::from).map_err(|_| {
                ClientError::invalid_parameter("event", format!("unknown event type '{raw}'"))
            }),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Event {
    pub id: u64,
    pub event: EventType,
    pub message: String,
    #[serde(deserialize_with = "utc_timestamp")]
    pub time: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub events: Vec<Event>,
}

/// One soil sensor sample.
#[derive(Clone, Debug, Deserialize)]
pub struct SensorReading {
    pub id: u64,
    #[serde(deserialize_with = "utc_timestamp")]
    pub time: DateTime<Utc>,
    pub local_date: NaiveDate,
    pub local_time: NaiveTime,
    pub moisture: Option<f64>,
    pub sunlight: Option<f64>,
    pub celsius: Option<f64>,
    pub fahrenheit: Option<f64>,
    pub battery_level: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SensorData {
    #[serde(default)]
    pub sensor_data: Vec<SensorReading>,
}

/// Weather condition accepted by `report_weather`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Wind,
}

impl WeatherCondition {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Clear => 0,
            Self::Cloudy => 1,
            Self::Rain => 2,
            Self::Snow => 3,
            Self::Wind => 4,
        }
    }
}

impl FromStr for WeatherCondition {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "clear" | "0" => Ok(Self::Clear),
            "cloudy" | "1" => Ok(Self::Cloudy),
            "rain" | "2" => Ok(Self::Rain),
            "snow" | "3" => Ok(Self::Snow),
            "wind" | "4" => Ok(Self::Wind),
            _ => Err(ClientError::invalid_parameter(
                "condition",
                format!("'{raw}' is not one of clear, cloudy, rain, snow, wind"),
            )),
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(with_offset) => Ok(with_offset.with_timezone(&Utc)),
        Err(_) => raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()),
    }
}

fn utc_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn optional_utc_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_timestamp(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
    use serde_json::json;

    use super::{
        Acknowledgement, DeviceSetStatus, DeviceStatus, ErrorCode, ErrorResponse, EventData,
        EventType, InfoData, Response, ScheduleData, ScheduleSource, WeatherCondition,
    };

    fn meta() -> serde_json::Value {
        json!({
            "tid": "1684742830_KpQDt",
            "time": "2023-05-22T08:07:10",
            "token_limit": 2000,
            "token_remaining": 1987,
            "token_reset": "2023-05-23T00:00:00",
            "version": "1.0",
            "last_active": "2023-05-22T08:06:55"
        })
    }

    #[test]
    fn decodes_device_info_with_naive_utc_timestamps() {
        let body = json!({
            "status": "OK",
            "meta": meta(),
            "data": {
                "device": {
                    "name": "Backyard",
                    "serial": "abcdef012345",
                    "status": "ONLINE",
                    "version": "1.2",
                    "sw_version": "1.1.1",
                    "last_active": "2023-05-22T08:06:55",
                    "zone_num": 3,
                    "zones": [
                        {"ith": 1, "name": "Lawn", "enabled": true, "smart": "SMART"},
                        {"ith": 2, "name": "Beds", "enabled": false, "smart": "TIMER"},
                        {"ith": 3, "name": "Trees", "enabled": true, "smart": "ASSISTANT"}
                    ]
                }
            }
        });

        let response: Response<InfoData> = serde_json::from_value(body).expect("valid info");
        let device = response.data.device.expect("controller info");
        assert_eq!(device.status, DeviceStatus::Online);
        assert_eq!(
            device.last_active,
            Utc.with_ymd_and_hms(2023, 5, 22, 8, 6, 55).unwrap()
        );
        assert_eq!(device.zones(true).len(), 2);
        assert_eq!(device.zones(false).len(), 3);
        assert!(response.data.sensor.is_none());
        assert_eq!(response.meta.token_remaining, 1987);
    }

    #[test]
    fn schedules_expose_duration_and_zone_filter() {
        let body = json!({
            "schedules": [
                {
                    "id": 10, "zone": 1, "source": "SMART", "status": "VALID",
                    "start_time": "2023-05-23T05:00:00", "end_time": "2023-05-23T05:12:00",
                    "local_date": "2023-05-23", "local_start_time": "07:00:00",
                    "local_end_time": "07:12:00"
                },
                {
                    "id": 11, "zone": 2, "source": "MANUAL", "status": "EXECUTED",
                    "start_time": "2023-05-22T05:00:00", "end_time": "2023-05-22T05:05:00",
                    "local_date": "2023-05-22", "local_start_time": "07:00:00",
                    "local_end_time": "07:05:00"
                }
            ]
        });

        let data: ScheduleData = serde_json::from_value(body).expect("valid schedules");
        let zone_one = data.for_zone(1);
        assert_eq!(zone_one.len(), 1);
        assert_eq!(zone_one[0].source, ScheduleSource::Smart);
        assert_eq!(zone_one[0].duration(), TimeDelta::minutes(12));
        assert_eq!(
            zone_one[0].local_date,
            NaiveDate::from_ymd_opt(2023, 5, 23).unwrap()
        );
    }

    #[test]
    fn unknown_codes_are_preserved() {
        let body = json!({
            "status": "ERROR",
            "meta": meta(),
            "errors": [{"code": 42, "message": "Something new"}]
        });
        let response: ErrorResponse = serde_json::from_value(body).expect("valid error");
        assert_eq!(response.errors[0].code, ErrorCode::Other(42));

        let events: EventData = serde_json::from_value(json!({
            "events": [{"id": 1, "event": 3, "message": "start", "time": "2023-05-22T05:00:00"}]
        }))
        .expect("valid events");
        assert_eq!(events.events[0].event, EventType::ScheduleStart);
    }

    #[test]
    fn command_values_parse_from_names_and_numbers() {
        assert_eq!("Online".parse::<DeviceSetStatus>().unwrap(), DeviceSetStatus::Online);
        assert_eq!("0".parse::<DeviceSetStatus>().unwrap(), DeviceSetStatus::Standby);
        assert_eq!("schedule-start".parse::<EventType>().unwrap(), EventType::ScheduleStart);
        assert_eq!("7".parse::<EventType>().unwrap(), EventType::Other(7));
        assert_eq!("rain".parse::<WeatherCondition>().unwrap().as_u8(), 2);
        assert!("hail".parse::<WeatherCondition>().is_err());
    }

    #[test]
    fn acknowledgement_tolerates_missing_data() {
        let body = json!({"status": "OK", "meta": meta()});
        let response: Acknowledgement = serde_json::from_value(body).expect("valid ack");
        assert!(response.data.is_none());
    }
}
