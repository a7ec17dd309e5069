use reqwest::Method;
use serde_json::Value;

use crate::ClientError;
use crate::models::{DeviceSetStatus, EventType};
use crate::params::{
    DateRange, Params, WaterRequest, WeatherReport, Zones, check_finite, check_percentage,
    format_date, format_timestamp,
};

/// Metadata for one NPA endpoint.
#[derive(Clone, Copy, Debug)]
pub struct OperationDefinition {
    /// Endpoint name, sent as `{base}/{name}.json`.
    pub name: &'static str,
    /// Uppercase HTTP method (`GET` or `POST`).
    pub method: &'static str,
    /// One-line description.
    pub summary: &'static str,
}

const INFO: OperationDefinition = op("info", "GET", "Device or sensor information");
const SET_STATUS: OperationDefinition = op("set_status", "POST", "Enable or disable the device");
const SCHEDULES: OperationDefinition = op("schedules", "GET", "Past and planned watering");
const MOISTURES: OperationDefinition = op("moistures", "GET", "Estimated zone moisture");
const SET_MOISTURE: OperationDefinition = op("set_moisture", "POST", "Report zone moisture");
const EVENTS: OperationDefinition = op("events", "GET", "Device and schedule events");
const WATER: OperationDefinition = op("water", "POST", "Start manual watering");
const STOP_WATER: OperationDefinition = op("stop_water", "POST", "Stop all watering");
const NO_WATER: OperationDefinition = op("no_water", "POST", "Suspend watering for some days");
const REPORT_WEATHER: OperationDefinition = op("report_weather", "POST", "Push local weather");
const SENSOR_DATA: OperationDefinition = op("sensor_data", "GET", "Soil sensor readings");

const NPA_OPERATIONS: &[OperationDefinition] = &[
    INFO,
    SET_STATUS,
    SCHEDULES,
    MOISTURES,
    SET_MOISTURE,
    EVENTS,
    WATER,
    STOP_WATER,
    NO_WATER,
    REPORT_WEATHER,
    SENSOR_DATA,
];

const fn op(
    name: &'static str,
    method: &'static str,
    summary: &'static str,
) -> OperationDefinition {
    OperationDefinition {
        name,
        method,
        summary,
    }
}

/// Returns every NPA v1 endpoint the clients wrap.
pub fn operations() -> &'static [OperationDefinition] {
    NPA_OPERATIONS
}

pub(crate) fn find_operation(name: &str) -> Result<&'static OperationDefinition, ClientError> {
    let name = name.trim_matches('/');
    let name = name.strip_suffix(".json").unwrap_or(name);
    NPA_OPERATIONS
        .iter()
        .find(|op| op.name == name)
        .ok_or_else(|| ClientError::UnknownOperation(name.to_owned()))
}

fn parse_method(operation: &OperationDefinition) -> Result<Method, ClientError> {
    Method::from_bytes(operation.method.as_bytes())
        .map_err(|_| ClientError::UnknownOperation(operation.name.to_owned()))
}

/// A fully shaped endpoint call, ready for either transport.
#[derive(Debug)]
pub(crate) struct NpaCall {
    pub(crate) endpoint: &'static str,
    pub(crate) method: Method,
    pub(crate) params: Value,
}

impl NpaCall {
    pub(crate) fn named(name: &str, params: Value) -> Result<Self, ClientError> {
        let operation = find_operation(name)?;
        Ok(Self {
            endpoint: operation.name,
            method: parse_method(operation)?,
            params,
        })
    }

    fn of(operation: &OperationDefinition, params: Params) -> Result<Self, ClientError> {
        Ok(Self {
            endpoint: operation.name,
            method: parse_method(operation)?,
            params: params.into_value(),
        })
    }
}

pub(crate) fn info() -> Result<NpaCall, ClientError> {
    NpaCall::of(&INFO, Params::new())
}

pub(crate) fn set_status(status: DeviceSetStatus) -> Result<NpaCall, ClientError> {
    NpaCall::of(&SET_STATUS, Params::new().with("status", status.as_u8()))
}

pub(crate) fn schedules(range: &DateRange, zones: &Zones) -> Result<NpaCall, ClientError> {
    range.validate()?;
    NpaCall::of(&SCHEDULES, Params::new().with_dates(range).with_zones(zones))
}

pub(crate) fn moistures(range: &DateRange, zones: &Zones) -> Result<NpaCall, ClientError> {
    range.validate()?;
    NpaCall::of(&MOISTURES, Params::new().with_dates(range).with_zones(zones))
}

pub(crate) fn set_moisture(moisture: u8, zones: &Zones) -> Result<NpaCall, ClientError> {
    if moisture > 100 {
        return Err(ClientError::invalid_parameter(
            "moisture",
            format!("{moisture} is above 100"),
        ));
    }
    NpaCall::of(
        &SET_MOISTURE,
        Params::new().with("moisture", moisture).with_zones(zones),
    )
}

pub(crate) fn events(range: &DateRange, event: Option<EventType>) -> Result<NpaCall, ClientError> {
    range.validate()?;
    NpaCall::of(
        &EVENTS,
        Params::new()
            .with_dates(range)
            .with_opt("event", event.map(EventType::as_u8)),
    )
}

pub(crate) fn water(request: &WaterRequest) -> Result<NpaCall, ClientError> {
    if request.duration_minutes == 0 {
        return Err(ClientError::invalid_parameter(
            "duration",
            "must be at least one minute",
        ));
    }
    NpaCall::of(
        &WATER,
        Params::new()
            .with("duration", request.duration_minutes)
            .with_zones(&request.zones)
            .with_opt("delay", request.delay_minutes.filter(|delay| *delay > 0))
            .with_opt("start_time", request.start_time.map(format_timestamp)),
    )
}

pub(crate) fn stop_water() -> Result<NpaCall, ClientError> {
    NpaCall::of(&STOP_WATER, Params::new())
}

pub(crate) fn no_water(days: Option<u32>) -> Result<NpaCall, ClientError> {
    NpaCall::of(&NO_WATER, Params::new().with_opt("days", days))
}

pub(crate) fn report_weather(report: &WeatherReport) -> Result<NpaCall, ClientError> {
    let readings = [
        ("rain", report.rain),
        ("temp", report.temp),
        ("t_min", report.t_min),
        ("t_max", report.t_max),
        ("t_dew", report.t_dew),
        ("wind_speed", report.wind_speed),
        ("pressure", report.pressure),
    ];
    for (name, value) in readings {
        check_finite(name, value)?;
    }
    check_percentage("rain_prob", report.rain_prob)?;
    check_percentage("humidity", report.humidity)?;
    NpaCall::of(
        &REPORT_WEATHER,
        Params::new()
            .with("date", format_date(report.date))
            .with_opt("condition", report.condition.map(|c| c.as_u8()))
            .with_opt("rain", report.rain)
            .with_opt("rain_prob", report.rain_prob)
            .with_opt("temp", report.temp)
            .with_opt("t_min", report.t_min)
            .with_opt("t_max", report.t_max)
            .with_opt("t_dew", report.t_dew)
            .with_opt("wind_speed", report.wind_speed)
            .with_opt("humidity", report.humidity)
            .with_opt("pressure", report.pressure),
    )
}

pub(crate) fn sensor_data(range: &DateRange) -> Result<NpaCall, ClientError> {
    range.validate()?;
    NpaCall::of(&SENSOR_DATA, Params::new().with_dates(range))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use reqwest::Method;
    use serde_json::json;

    use super::{NpaCall, events, operations, report_weather, set_moisture, water};
    use crate::ClientError;
    use crate::models::{EventType, WeatherCondition};
    use crate::params::{DateRange, WaterRequest, WeatherReport, Zones};

    #[test]
    fn catalog_covers_reads_and_writes() {
        assert_eq!(operations().len(), 11);
        let call = NpaCall::named("/schedules.json", json!({})).expect("known operation");
        assert_eq!(call.endpoint, "schedules");
        assert_eq!(call.method, Method::GET);
        assert!(matches!(
            NpaCall::named("reboot", json!({})),
            Err(ClientError::UnknownOperation(name)) if name == "reboot"
        ));
    }

    #[test]
    fn water_request_is_shaped_for_the_body() {
        let start = Utc.with_ymd_and_hms(2023, 5, 22, 5, 0, 0).unwrap();
        let call = water(&WaterRequest::new(10).zones(vec![1, 2]).delay(0).start_at(start))
            .expect("valid request");
        assert_eq!(call.method, Method::POST);
        assert_eq!(
            call.params,
            json!({"duration": 10, "zones": [1, 2], "start_time": "2023-05-22T05:00:00"})
        );

        assert!(matches!(
            water(&WaterRequest::new(0)),
            Err(ClientError::InvalidParameter {
                name: "duration",
                ..
            })
        ));
    }

    #[test]
    fn events_filter_uses_numeric_type() {
        let day = NaiveDate::from_ymd_opt(2023, 5, 20).unwrap();
        let call = events(&DateRange::day(day), Some(EventType::ScheduleEnd)).expect("valid");
        assert_eq!(
            call.params,
            json!({"start_date": "2023-05-20", "end_date": "2023-05-20", "event": 4})
        );
    }

    #[test]
    fn zero_readings_are_still_reported() {
        let mut report = WeatherReport::new(NaiveDate::from_ymd_opt(2023, 5, 22).unwrap());
        report.condition = Some(WeatherCondition::Clear);
        report.rain = Some(0.0);
        report.t_min = Some(-2.5);

        let call = report_weather(&report).expect("valid report");
        assert_eq!(
            call.params,
            json!({"date": "2023-05-22", "condition": 0, "rain": 0.0, "t_min": -2.5})
        );
    }

    #[test]
    fn non_finite_readings_are_not_dropped_silently() {
        let mut report = WeatherReport::new(NaiveDate::from_ymd_opt(2023, 5, 22).unwrap());
        report.temp = Some(f64::NAN);
        assert!(matches!(
            report_weather(&report),
            Err(ClientError::InvalidParameter { name: "temp", .. })
        ));

        report.temp = Some(18.0);
        report.pressure = Some(f64::INFINITY);
        assert!(matches!(
            report_weather(&report),
            Err(ClientError::InvalidParameter {
                name: "pressure",
                ..
            })
        ));
    }

    #[test]
    fn moisture_above_full_is_rejected() {
        assert!(set_moisture(100, &Zones::from(vec![1_u8])).is_ok());
        assert!(set_moisture(101, &Zones::from(vec![1_u8])).is_err());
    }
}
