use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::models::{
    Acknowledgement, DeviceSetStatus, EventData, EventType, InfoData, MoistureData, Response,
    ScheduleData, SensorData,
};
use crate::operations::{self, NpaCall, OperationDefinition};
use crate::params::{DateRange, WaterRequest, WeatherReport, Zones};
use crate::{ApiClient, BlockingApiClient, ClientError};

/// Async Netro client with one method per NPA endpoint.
///
/// Each endpoint has a typed method returning a decoded [`Response`] and a
/// `*_raw` variant returning the JSON document as sent by the NPA.
#[derive(Clone, Debug)]
pub struct NetroClient {
    inner: ApiClient,
}

impl NetroClient {
    /// Creates a client for the given access token. No request is sent.
    pub fn new(access_token: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            inner: ApiClient::new(access_token)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self, ClientError> {
        self.inner = self.inner.with_base_url(base_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.inner = self.inner.with_http_client(http);
        self
    }

    pub fn access_token(&self) -> &str {
        self.inner.access_token()
    }

    /// Returns the underlying transport client.
    pub fn transport(&self) -> &ApiClient {
        &self.inner
    }

    /// Returns all endpoints this client wraps.
    pub fn operations() -> &'static [OperationDefinition] {
        operations::operations()
    }

    /// Sends a request to an arbitrary endpoint.
    ///
    /// This bypasses the catalog but keeps the client's token and configuration.
    pub async fn call(
        &self,
        method: Method,
        endpoint: &str,
        params: Value,
    ) -> Result<Value, ClientError> {
        self.inner.call(method, endpoint, params).await
    }

    /// Calls a catalog endpoint by name, using its registered method.
    pub async fn call_operation(&self, name: &str, params: Value) -> Result<Value, ClientError> {
        self.send(NpaCall::named(name, params)?).await
    }

    async fn send(&self, call: NpaCall) -> Result<Value, ClientError> {
        self.inner.call(call.method, call.endpoint, call.params).await
    }

    pub async fn info_raw(&self) -> Result<Value, ClientError> {
        self.send(operations::info()?).await
    }

    pub async fn info(&self) -> Result<Response<InfoData>, ClientError> {
        decode(self.info_raw().await?)
    }

    pub async fn set_status_raw(&self, status: DeviceSetStatus) -> Result<Value, ClientError> {
        self.send(operations::set_status(status)?).await
    }

    pub async fn set_status(
        &self,
        status: DeviceSetStatus,
    ) -> Result<Acknowledgement, ClientError> {
        decode(self.set_status_raw(status).await?)
    }

    pub async fn schedules_raw(
        &self,
        range: DateRange,
        zones: &Zones,
    ) -> Result<Value, ClientError> {
        self.send(operations::schedules(&range, zones)?).await
    }

    pub async fn schedules(
        &self,
        range: DateRange,
        zones: &Zones,
    ) -> Result<Response<ScheduleData>, ClientError> {
        decode(self.schedules_raw(range, zones).await?)
    }

    pub async fn moistures_raw(
        &self,
        range: DateRange,
        zones: &Zones,
    ) -> Result<Value, ClientError> {
        self.send(operations::moistures(&range, zones)?).await
    }

    pub async fn moistures(
        &self,
        range: DateRange,
        zones: &Zones,
    ) -> Result<Response<MoistureData>, ClientError> {
        decode(self.moistures_raw(range, zones).await?)
    }

    /// Reports measured moisture (0 to 100) for the given zones.
    pub async fn set_moisture_raw(
        &self,
        moisture: u8,
        zones: &Zones,
    ) -> Result<Value, ClientError> {
        self.send(operations::set_moisture(moisture, zones)?).await
    }

    pub async fn set_moisture(
        &self,
        moisture: u8,
        zones: &Zones,
    ) -> Result<Acknowledgement, ClientError> {
        decode(self.set_moisture_raw(moisture, zones).await?)
    }

    pub async fn events_raw(
        &self,
        range: DateRange,
        event: Option<EventType>,
    ) -> Result<Value, ClientError> {
        self.send(operations::events(&range, event)?).await
    }

    pub async fn events(
        &self,
        range: DateRange,
        event: Option<EventType>,
    ) -> Result<Response<EventData>, ClientError> {
        decode(self.events_raw(range, event).await?)
    }

    pub async fn water_raw(&self, request: &WaterRequest) -> Result<Value, ClientError> {
        self.send(operations::water(request)?).await
    }

    /// Starts watering and returns the schedules the NPA created for it.
    pub async fn water(
        &self,
        request: &WaterRequest,
    ) -> Result<Response<ScheduleData>, ClientError> {
        decode(self.water_raw(request).await?)
    }

    pub async fn stop_water_raw(&self) -> Result<Value, ClientError> {
        self.send(operations::stop_water()?).await
    }

    pub async fn stop_water(&self) -> Result<Acknowledgement, ClientError> {
        decode(self.stop_water_raw().await?)
    }

    /// Suspends watering, for `days` days or the NPA default when `None`.
    pub async fn no_water_raw(&self, days: Option<u32>) -> Result<Value, ClientError> {
        self.send(operations::no_water(days)?).await
    }

    pub async fn no_water(&self, days: Option<u32>) -> Result<Acknowledgement, ClientError> {
        decode(self.no_water_raw(days).await?)
    }

    pub async fn report_weather_raw(&self, report: &WeatherReport) -> Result<Value, ClientError> {
        self.send(operations::report_weather(report)?).await
    }

    pub async fn report_weather(
        &self,
        report: &WeatherReport,
    ) -> Result<Acknowledgement, ClientError> {
        decode(self.report_weather_raw(report).await?)
    }

    pub async fn sensor_data_raw(&self, range: DateRange) -> Result<Value, ClientError> {
        self.send(operations::sensor_data(&range)?).await
    }

    pub async fn sensor_data(&self, range: DateRange) -> Result<Response<SensorData>, ClientError> {
        decode(self.sensor_data_raw(range).await?)
    }
}

/// Blocking Netro client with one method per NPA endpoint.
///
/// This is the synchronous counterpart of [`NetroClient`].
#[derive(Debug)]
pub struct BlockingNetroClient {
    inner: BlockingApiClient,
}

impl BlockingNetroClient {
    pub fn new(access_token: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            inner: BlockingApiClient::new(access_token)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self, ClientError> {
        self.inner = self.inner.with_base_url(base_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::blocking::Client) -> Self {
        self.inner = self.inner.with_http_client(http);
        self
    }

    pub fn access_token(&self) -> &str {
        self.inner.access_token()
    }

    pub fn transport(&self) -> &BlockingApiClient {
        &self.inner
    }

    pub fn operations() -> &'static [OperationDefinition] {
        operations::operations()
    }

    pub fn call(
        &self,
        method: Method,
        endpoint: &str,
        params: Value,
    ) -> Result<Value, ClientError> {
        self.inner.call(method, endpoint, params)
    }

    pub fn call_operation(&self, name: &str, params: Value) -> Result<Value, ClientError> {
        self.send(NpaCall::named(name, params)?)
    }

    fn send(&self, call: NpaCall) -> Result<Value, ClientError> {
        self.inner.call(call.method, call.endpoint, call.params)
    }

    pub fn info_raw(&self) -> Result<Value, ClientError> {
        self.send(operations::info()?)
    }

    pub fn info(&self) -> Result<Response<InfoData>, ClientError> {
        decode(self.info_raw()?)
    }

    pub fn set_status_raw(&self, status: DeviceSetStatus) -> Result<Value, ClientError> {
        self.send(operations::set_status(status)?)
    }

    pub fn set_status(&self, status: DeviceSetStatus) -> Result<Acknowledgement, ClientError> {
        decode(self.set_status_raw(status)?)
    }

    pub fn schedules_raw(&self, range: DateRange, zones: &Zones) -> Result<Value, ClientError> {
        self.send(operations::schedules(&range, zones)?)
    }

    pub fn schedules(
        &self,
        range: DateRange,
        zones: &Zones,
    ) -> Result<Response<ScheduleData>, ClientError> {
        decode(self.schedules_raw(range, zones)?)
    }

    pub fn moistures_raw(&self, range: DateRange, zones: &Zones) -> Result<Value, ClientError> {
        self.send(operations::moistures(&range, zones)?)
    }

    pub fn moistures(
        &self,
        range: DateRange,
        zones: &Zones,
    ) -> Result<Response<MoistureData>, ClientError> {
        decode(self.moistures_raw(range, zones)?)
    }

    pub fn set_moisture_raw(&self, moisture: u8, zones: &Zones) -> Result<Value, ClientError> {
        self.send(operations::set_moisture(moisture, zones)?)
    }

    pub fn set_moisture(
        &self,
        moisture: u8,
        zones: &Zones,
    ) -> Result<Acknowledgement, ClientError> {
        decode(self.set_moisture_raw(moisture, zones)?)
    }

    pub fn events_raw(
        &self,
        range: DateRange,
        event: Option<EventType>,
    ) -> Result<Value, ClientError> {
        self.send(operations::events(&range, event)?)
    }

    pub fn events(
        &self,
        range: DateRange,
        event: Option<EventType>,
    ) -> Result<Response<EventData>, ClientError> {
        decode(self.events_raw(range, event)?)
    }

    pub fn water_raw(&self, request: &WaterRequest) -> Result<Value, ClientError> {
        self.send(operations::water(request)?)
    }

    pub fn water(&self, request: &WaterRequest) -> Result<Response<ScheduleData>, ClientError> {
        decode(self.water_raw(request)?)
    }

    pub fn stop_water_raw(&self) -> Result<Value, ClientError> {
        self.send(operations::stop_water()?)
    }

    pub fn stop_water(&self) -> Result<Acknowledgement, ClientError> {
        decode(self.stop_water_raw()?)
    }

    pub fn no_water_raw(&self, days: Option<u32>) -> Result<Value, ClientError> {
        self.send(operations::no_water(days)?)
    }

    pub fn no_water(&self, days: Option<u32>) -> Result<Acknowledgement, ClientError> {
        decode(self.no_water_raw(days)?)
    }

    pub fn report_weather_raw(&self, report: &WeatherReport) -> Result<Value, ClientError> {
        self.send(operations::report_weather(report)?)
    }

    pub fn report_weather(&self, report: &WeatherReport) -> Result<Acknowledgement, ClientError> {
        decode(self.report_weather_raw(report)?)
    }

    pub fn sensor_data_raw(&self, range: DateRange) -> Result<Value, ClientError> {
        self.send(operations::sensor_data(&range)?)
    }

    pub fn sensor_data(&self, range: DateRange) -> Result<Response<SensorData>, ClientError> {
        decode(self.sensor_data_raw(range)?)
    }
}

fn decode<T: DeserializeOwned>(document: Value) -> Result<Response<T>, ClientError> {
    let response: Response<T> = serde_json::from_value(document)?;
    trace!(
        tid = %response.meta.tid,
        token_remaining = response.meta.token_remaining,
        token_limit = response.meta.token_limit,
        "NPA call accounted"
    );
    Ok(response)
}
