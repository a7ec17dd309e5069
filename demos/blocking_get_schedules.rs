//! List this week's schedules using the blocking client.
//!
//! Run:
//! `NETRO_ACCESS_TOKEN=<key> cargo run --example blocking_get_schedules`

use chrono::{Days, Utc};
use netro_client::{BlockingNetroClient, DateRange, Zones};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let token = match std::env::var("NETRO_ACCESS_TOKEN") {
        Ok(value) => value,
        Err(_) => {
            eprintln!("Set NETRO_ACCESS_TOKEN before running this example.");
            std::process::exit(2);
        }
    };

    let today = Utc::now().date_naive();
    let end = today.checked_add_days(Days::new(7)).unwrap_or(today);

    let client = BlockingNetroClient::new(token)?;
    let response = client.schedules(DateRange::between(today, end), &Zones::all())?;

    for schedule in &response.data.schedules {
        println!(
            "{:>8}  zone {}  {} {}  {:?}/{:?}",
            schedule.id,
            schedule.zone,
            schedule.local_date,
            schedule.local_start_time,
            schedule.source,
            schedule.status
        );
    }
    Ok(())
}
