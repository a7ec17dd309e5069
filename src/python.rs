use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use reqwest::Method;
use serde_json::Value;

use crate::models::{DeviceSetStatus, EventType, WeatherCondition};
use crate::{BlockingNetroClient, DateRange, WaterRequest, WeatherReport, Zones};

#[pyclass(name = "OperationDefinition", get_all)]
pub struct PyOperationDefinition {
    pub name: String,
    pub method: String,
    pub summary: String,
}

/// Python wrapper returning every NPA response as a JSON string.
#[pyclass(name = "Client")]
pub struct PyClient {
    inner: Mutex<BlockingNetroClient>,
}

#[pymethods]
impl PyClient {
    #[new]
    #[pyo3(signature = (access_token, base_url=None, timeout_secs=None))]
    fn new(
        access_token: String,
        base_url: Option<String>,
        timeout_secs: Option<f64>,
    ) -> PyResult<Self> {
        let mut client = BlockingNetroClient::new(access_token).map_err(to_py_value_error)?;
        if let Some(url) = base_url {
            client = client.with_base_url(url).map_err(to_py_value_error)?;
        }
        if let Some(seconds) = timeout_secs {
            let timeout = Duration::try_from_secs_f64(seconds).map_err(to_py_value_error)?;
            client = client.with_timeout(timeout);
        }

        Ok(Self {
            inner: Mutex::new(client),
        })
    }

    #[getter]
    fn access_token(&self) -> PyResult<String> {
        Ok(self.client()?.access_token().to_owned())
    }

    #[staticmethod]
    fn operations() -> Vec<PyOperationDefinition> {
        BlockingNetroClient::operations()
            .iter()
            .map(|op| PyOperationDefinition {
                name: op.name.to_owned(),
                method: op.method.to_owned(),
                summary: op.summary.to_owned(),
            })
            .collect()
    }

    #[pyo3(signature = (method, endpoint, params_json=None))]
    fn call(
        &self,
        method: String,
        endpoint: String,
        params_json: Option<String>,
    ) -> PyResult<String> {
        let parsed_method = Method::from_str(&method)
            .map_err(|e| PyValueError::new_err(format!("invalid HTTP method: {e}")))?;
        let params = parse_params(params_json)?;
        let value = self
            .client()?
            .call(parsed_method, &endpoint, params)
            .map_err(to_py_runtime_error)?;
        Ok(value.to_string())
    }

    fn info(&self) -> PyResult<String> {
        render(self.client()?.info_raw())
    }

    fn set_status(&self, status: String) -> PyResult<String> {
        let status = DeviceSetStatus::from_str(&status).map_err(to_py_value_error)?;
        render(self.client()?.set_status_raw(status))
    }

    #[pyo3(signature = (start_date=None, end_date=None, zones=None))]
    fn schedules(
        &self,
        start_date: Option<String>,
        end_date: Option<String>,
        zones: Option<Vec<u8>>,
    ) -> PyResult<String> {
        let range = parse_range(start_date, end_date)?;
        render(self.client()?.schedules_raw(range, &to_zones(zones)))
    }

    #[pyo3(signature = (start_date=None, end_date=None, zones=None))]
    fn moistures(
        &self,
        start_date: Option<String>,
        end_date: Option<String>,
        zones: Option<Vec<u8>>,
    ) -> PyResult<String> {
        let range = parse_range(start_date, end_date)?;
        render(self.client()?.moistures_raw(range, &to_zones(zones)))
    }

    #[pyo3(signature = (moisture, zones=None))]
    fn set_moisture(&self, moisture: u8, zones: Option<Vec<u8>>) -> PyResult<String> {
        render(self.client()?.set_moisture_raw(moisture, &to_zones(zones)))
    }

    #[pyo3(signature = (start_date=None, end_date=None, event=None))]
    fn events(
        &self,
        start_date: Option<String>,
        end_date: Option<String>,
        event: Option<String>,
    ) -> PyResult<String> {
        let range = parse_range(start_date, end_date)?;
        let event = event
            .as_deref()
            .map(EventType::from_str)
            .transpose()
            .map_err(to_py_value_error)?;
        render(self.client()?.events_raw(range, event))
    }

    #[pyo3(signature = (duration, zones=None, delay=None, start_time=None))]
    fn water(
        &self,
        duration: u32,
        zones: Option<Vec<u8>>,
        delay: Option<u32>,
        start_time: Option<String>,
    ) -> PyResult<String> {
        let mut request = WaterRequest::new(duration).zones(zones.unwrap_or_default());
        request.delay_minutes = delay;
        if let Some(raw) = start_time {
            let naive = NaiveDateTime::from_str(&raw).map_err(to_py_value_error)?;
            request = request.start_at(naive.and_utc());
        }
        render(self.client()?.water_raw(&request))
    }

    fn stop_water(&self) -> PyResult<String> {
        render(self.client()?.stop_water_raw())
    }

    #[pyo3(signature = (days=None))]
    fn no_water(&self, days: Option<u32>) -> PyResult<String> {
        render(self.client()?.no_water_raw(days))
    }

    #[allow(clippy::too_many_arguments)]
    #[pyo3(signature = (
        date, condition=None, rain=None, rain_prob=None, temp=None, t_min=None,
        t_max=None, t_dew=None, wind_speed=None, humidity=None, pressure=None
    ))]
    fn report_weather(
        &self,
        date: String,
        condition: Option<String>,
        rain: Option<f64>,
        rain_prob: Option<f64>,
        temp: Option<f64>,
        t_min: Option<f64>,
        t_max: Option<f64>,
        t_dew: Option<f64>,
        wind_speed: Option<f64>,
        humidity: Option<f64>,
        pressure: Option<f64>,
    ) -> PyResult<String> {
        let report = WeatherReport {
            date: parse_date(&date)?,
            condition: condition
                .as_deref()
                .map(WeatherCondition::from_str)
                .transpose()
                .map_err(to_py_value_error)?,
            rain,
            rain_prob,
            temp,
            t_min,
            t_max,
            t_dew,
            wind_speed,
            humidity,
            pressure,
        };
        render(self.client()?.report_weather_raw(&report))
    }

    #[pyo3(signature = (start_date=None, end_date=None))]
    fn sensor_data(
        &self,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> PyResult<String> {
        let range = parse_range(start_date, end_date)?;
        render(self.client()?.sensor_data_raw(range))
    }
}

impl PyClient {
    fn client(&self) -> PyResult<std::sync::MutexGuard<'_, BlockingNetroClient>> {
        self.inner
            .lock()
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }
}

#[pymodule]
fn netro_client(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyOperationDefinition>()?;
    module.add_class::<PyClient>()?;
    Ok(())
}

fn render(result: Result<Value, crate::ClientError>) -> PyResult<String> {
    result
        .map(|value| value.to_string())
        .map_err(to_py_runtime_error)
}

fn to_py_value_error(error: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(error.to_string())
}

fn to_py_runtime_error(error: impl std::fmt::Display) -> PyErr {
    PyRuntimeError::new_err(error.to_string())
}

fn to_zones(zones: Option<Vec<u8>>) -> Zones {
    zones.map(Zones::from).unwrap_or_default()
}

fn parse_date(raw: &str) -> PyResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(to_py_value_error)
}

fn parse_range(start: Option<String>, end: Option<String>) -> PyResult<DateRange> {
    Ok(DateRange::new(
        start.as_deref().map(parse_date).transpose()?,
        end.as_deref().map(parse_date).transpose()?,
    ))
}

fn parse_params(raw_json: Option<String>) -> PyResult<Value> {
    let Some(raw_json) = raw_json else {
        return Ok(Value::Null);
    };

    let value: Value = serde_json::from_str(&raw_json).map_err(to_py_value_error)?;
    if !value.is_object() {
        return Err(PyValueError::new_err("expected a JSON object"));
    }
    Ok(value)
}
