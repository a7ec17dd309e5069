//! Fetch device information with the async `NetroClient`.
//!
//! Run:
//! `NETRO_ACCESS_TOKEN=<key> cargo run --example async_get_info`
//!
//! Optional env vars:
//! - `NETRO_BASE_URL` (defaults to the public NPA endpoint)

use netro_client::NetroClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let token = match std::env::var("NETRO_ACCESS_TOKEN") {
        Ok(value) => value,
        Err(_) => {
            eprintln!("Set NETRO_ACCESS_TOKEN before running this example.");
            std::process::exit(2);
        }
    };

    let mut client = NetroClient::new(token)?;
    if let Ok(url) = std::env::var("NETRO_BASE_URL") {
        client = client.with_base_url(url)?;
    }

    let info = client.info().await?;
    if let Some(device) = &info.data.device {
        println!("{} ({:?})", device.name, device.status);
        for zone in device.zones(true) {
            println!("  zone {}: {} [{:?}]", zone.ith, zone.name, zone.smart);
        }
    }
    if let Some(sensor) = &info.data.sensor {
        println!("sensor {} ({:?})", sensor.name, sensor.status);
    }
    println!(
        "{} of {} calls left until {}",
        info.meta.token_remaining, info.meta.token_limit, info.meta.token_reset
    );
    Ok(())
}
