//! Typed request parameters for the NPA endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::ClientError;
use crate::models::WeatherCondition;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Optional inclusive date bounds for history and forecast endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// No bounds; the NPA applies its own default window.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::between(date, date)
    }

    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(ClientError::invalid_parameter(
                "end_date",
                format!("{end} is before start date {start}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Zone indices to restrict a call to. Empty means every zone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Zones(Vec<u8>);

impl Zones {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Zones {
    fn from(zones: Vec<u8>) -> Self {
        Self(zones)
    }
}

impl FromIterator<u8> for Zones {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A manual watering run.
#[derive(Clone, Debug, PartialEq)]
pub struct WaterRequest {
    pub duration_minutes: u32,
    pub zones: Zones,
    pub delay_minutes: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
}

impl WaterRequest {
    pub fn new(duration_minutes: u32) -> Self {
        Self {
            duration_minutes,
            zones: Zones::all(),
            delay_minutes: None,
            start_time: None,
        }
    }

    #[must_use]
    pub fn zones(mut self, zones: impl IntoIterator<Item = u8>) -> Self {
        self.zones = zones.into_iter().collect();
        self
    }

    #[must_use]
    pub fn delay(mut self, minutes: u32) -> Self {
        self.delay_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn start_at(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }
}

/// Local weather observation or forecast pushed to the NPA.
///
/// Temperatures are Celsius, rain is millimetres, wind speed is m/s,
/// pressure is hPa, `rain_prob` and `humidity` are percentages.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeatherReport {
    pub date: NaiveDate,
    pub condition: Option<WeatherCondition>,
    pub rain: Option<f64>,
    pub rain_prob: Option<f64>,
    pub temp: Option<f64>,
    pub t_min: Option<f64>,
    pub t_max: Option<f64>,
    pub t_dew: Option<f64>,
    pub wind_speed: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

impl WeatherReport {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }
}

/// JSON object builder that skips absent values.
#[derive(Debug, Default)]
pub(crate) struct Params(Map<String, Value>);

impl Params {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_owned(), value.into());
        self
    }

    pub(crate) fn with_opt<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    pub(crate) fn with_dates(self, range: &DateRange) -> Self {
        self.with_opt("start_date", range.start.map(format_date))
            .with_opt("end_date", range.end.map(format_date))
    }

    pub(crate) fn with_zones(self, zones: &Zones) -> Self {
        if zones.is_all() {
            self
        } else {
            self.with("zones", zones.as_slice().to_vec())
        }
    }

    pub(crate) fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn check_finite(name: &'static str, value: Option<f64>) -> Result<(), ClientError> {
    match value {
        Some(value) if !value.is_finite() => Err(ClientError::invalid_parameter(
            name,
            format!("{value} is not a finite number"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn check_percentage(name: &'static str, value: Option<f64>) -> Result<(), ClientError> {
    match value {
        Some(value) if !(0.0..=100.0).contains(&value) => Err(ClientError::invalid_parameter(
            name,
            format!("{value} is outside 0..=100"),
        )),
        _ => Ok(()),
    }
}
