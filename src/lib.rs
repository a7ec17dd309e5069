//! Rust and Python-facing client library for the Netro Public API (NPA).
//!
//! Public API layers:
//! - [`ApiClient`]/[`BlockingApiClient`]: token-carrying JSON transports.
//! - [`NetroClient`]/[`BlockingNetroClient`]: one method per NPA endpoint.
//! - [`models`]: typed response envelopes and payloads.
//! - [`ClientError`]: unified error type used by all clients.
//!
//! ```no_run
//! # async fn run() -> Result<(), netro_client::ClientError> {
//! use netro_client::{NetroClient, WaterRequest};
//!
//! let client = NetroClient::new("0123456789ab")?;
//! let info = client.info().await?;
//! println!("{:?}", info.data.device);
//! client.water(&WaterRequest::new(5).zones(vec![1])).await?;
//! # Ok(())
//! # }
//! ```

mod blocking_client;
mod client;
mod error;
pub mod models;
mod netro_client;
mod operations;
mod params;
mod request;

/// Generic blocking NPA transport client.
pub use blocking_client::BlockingApiClient;
/// Generic async NPA transport client.
pub use client::ApiClient;
/// Error type returned by all client operations.
pub use error::ClientError;
/// Endpoint clients.
///
/// See also [`ApiClient`] for calls outside the catalog.
pub use netro_client::{BlockingNetroClient, NetroClient};
pub use operations::{OperationDefinition, operations};
pub use params::{DateRange, WaterRequest, WeatherReport, Zones};
pub use request::DEFAULT_BASE_URL;

#[cfg(feature = "python")]
mod python;
