//! Water zones for a few minutes, then list the resulting schedules.
//!
//! Run:
//! `NETRO_ACCESS_TOKEN=<key> cargo run --example async_water_zones -- 5 1 2`
//!
//! Arguments: duration in minutes, then zone indices (all zones when omitted).

use netro_client::{NetroClient, WaterRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let token = match std::env::var("NETRO_ACCESS_TOKEN") {
        Ok(value) => value,
        Err(_) => {
            eprintln!("Set NETRO_ACCESS_TOKEN before running this example.");
            std::process::exit(2);
        }
    };

    let mut args = std::env::args().skip(1);
    let duration: u32 = args.next().as_deref().unwrap_or("1").parse()?;
    let zones = args.map(|raw| raw.parse::<u8>()).collect::<Result<Vec<u8>, _>>()?;

    let client = NetroClient::new(token)?;
    let watering = client
        .water(&WaterRequest::new(duration).zones(zones))
        .await?;

    for schedule in &watering.data.schedules {
        println!(
            "zone {} {} -> {} ({} min)",
            schedule.zone,
            schedule.local_start_time,
            schedule.local_end_time,
            schedule.duration().num_minutes()
        );
    }
    Ok(())
}
