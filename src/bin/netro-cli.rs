use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use netro_client::models::{DeviceSetStatus, EventType, WeatherCondition};
use netro_client::{DateRange, NetroClient, WaterRequest, WeatherReport, Zones};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "netro-cli",
    version,
    about = "Small async CLI for the Netro Public API"
)]
struct Cli {
    /// Base URL for the API. Defaults to the public NPA v1 endpoint.
    #[arg(long, env = "NETRO_BASE_URL")]
    base_url: Option<String>,

    /// Device or sensor key sent with every request.
    #[arg(long, env = "NETRO_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Emit compact JSON instead of pretty-printed output.
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the NPA endpoints this client knows.
    Operations {
        /// Filter endpoints by substring match on name.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show device or sensor information.
    Info,
    /// List past and planned watering schedules.
    Schedules(HistoryArgs),
    /// List estimated zone moistures.
    Moistures(HistoryArgs),
    /// List device and schedule events.
    Events {
        #[command(flatten)]
        range: RangeArgs,

        /// Event type: device-offline, device-online, schedule-start, schedule-end or a number.
        #[arg(long)]
        event: Option<EventType>,
    },
    /// List soil sensor readings.
    SensorData(RangeArgs),
    /// Start watering.
    Water(WaterArgs),
    /// Stop all watering.
    StopWater,
    /// Suspend watering.
    NoWater {
        /// Number of days; the NPA default applies when omitted.
        #[arg(long)]
        days: Option<u32>,
    },
    /// Put the device in standby or bring it online.
    SetStatus {
        /// standby or online.
        status: DeviceSetStatus,
    },
    /// Report measured moisture for zones.
    SetMoisture {
        /// Moisture percentage, 0 to 100.
        moisture: u8,

        /// Zone index. Repeat as needed; all zones when omitted.
        #[arg(long = "zone")]
        zones: Vec<u8>,
    },
    /// Push a local weather observation.
    ReportWeather(WeatherArgs),
    /// Send a raw request to any endpoint.
    Call(CallArgs),
}

#[derive(Debug, Args)]
struct RangeArgs {
    /// First day (YYYY-MM-DD).
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD).
    #[arg(long)]
    end_date: Option<NaiveDate>,
}

impl RangeArgs {
    fn to_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Args)]
struct HistoryArgs {
    #[command(flatten)]
    range: RangeArgs,

    /// Zone index. Repeat as needed; all zones when omitted.
    #[arg(long = "zone")]
    zones: Vec<u8>,
}

#[derive(Debug, Args)]
struct WaterArgs {
    /// Duration in minutes.
    #[arg(long)]
    duration: u32,

    /// Zone index. Repeat as needed; all zones when omitted.
    #[arg(long = "zone")]
    zones: Vec<u8>,

    /// Delay in minutes before starting.
    #[arg(long)]
    delay: Option<u32>,

    /// UTC start time (YYYY-MM-DDThh:mm:ss).
    #[arg(long)]
    start_time: Option<NaiveDateTime>,
}

#[derive(Debug, Args)]
struct WeatherArgs {
    /// Observation day (YYYY-MM-DD).
    #[arg(long)]
    date: NaiveDate,

    /// clear, cloudy, rain, snow or wind.
    #[arg(long)]
    condition: Option<WeatherCondition>,

    #[arg(long)]
    rain: Option<f64>,

    #[arg(long)]
    rain_prob: Option<f64>,

    #[arg(long)]
    temp: Option<f64>,

    #[arg(long)]
    t_min: Option<f64>,

    #[arg(long)]
    t_max: Option<f64>,

    #[arg(long)]
    t_dew: Option<f64>,

    #[arg(long)]
    wind_speed: Option<f64>,

    #[arg(long)]
    humidity: Option<f64>,

    #[arg(long)]
    pressure: Option<f64>,
}

#[derive(Debug, Args)]
struct CallArgs {
    /// HTTP method (GET or POST).
    method: String,

    /// Endpoint name (for example: info, schedules).
    endpoint: String,

    /// Parameter in form key=value; JSON values are sent typed. Repeat as needed.
    #[arg(long = "param", value_name = "KEY=VALUE", conflicts_with = "params_file")]
    param: Vec<String>,

    /// Path to a file containing a JSON object of parameters.
    #[arg(long, value_name = "PATH")]
    params_file: Option<PathBuf>,
}

/// Entry point for the async CLI.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // `operations` is metadata-only; it does not require a key.
    if let Command::Operations { filter } = &cli.command {
        print_operations(filter.as_deref());
        return Ok(());
    }

    let client = build_client(&cli)?;
    let output = run(&client, &cli.command)
        .await
        .context("NPA request failed")?;

    print_json(&output, cli.compact).context("failed to print JSON output")?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(cli: &Cli) -> Result<NetroClient> {
    let Some(token) = &cli.access_token else {
        bail!("an access token is required (--access-token or NETRO_ACCESS_TOKEN)");
    };

    let mut client = NetroClient::new(token.clone()).context("failed to create client")?;
    if let Some(url) = &cli.base_url {
        client = client
            .with_base_url(url)
            .with_context(|| format!("failed to use base URL '{url}'"))?;
    }
    if let Some(seconds) = cli.timeout {
        client = client.with_timeout(Duration::from_secs(seconds));
    }
    Ok(client)
}

async fn run(client: &NetroClient, command: &Command) -> Result<Value> {
    let value = match command {
        Command::Operations { .. } => unreachable!("handled in main"),
        Command::Info => client.info_raw().await?,
        Command::Schedules(args) => {
            client
                .schedules_raw(args.range.to_range(), &Zones::from(args.zones.clone()))
                .await?
        }
        Command::Moistures(args) => {
            client
                .moistures_raw(args.range.to_range(), &Zones::from(args.zones.clone()))
                .await?
        }
        Command::Events { range, event } => client.events_raw(range.to_range(), *event).await?,
        Command::SensorData(range) => client.sensor_data_raw(range.to_range()).await?,
        Command::Water(args) => client.water_raw(&water_request(args)).await?,
        Command::StopWater => client.stop_water_raw().await?,
        Command::NoWater { days } => client.no_water_raw(*days).await?,
        Command::SetStatus { status } => client.set_status_raw(*status).await?,
        Command::SetMoisture { moisture, zones } => {
            client
                .set_moisture_raw(*moisture, &Zones::from(zones.clone()))
                .await?
        }
        Command::ReportWeather(args) => client.report_weather_raw(&weather_report(args)).await?,
        Command::Call(args) => send_call(client, args).await?,
    };
    Ok(value)
}

fn water_request(args: &WaterArgs) -> WaterRequest {
    let mut request = WaterRequest::new(args.duration).zones(args.zones.clone());
    request.delay_minutes = args.delay;
    request.start_time = args.start_time.map(|naive| naive.and_utc());
    request
}

fn weather_report(args: &WeatherArgs) -> WeatherReport {
    WeatherReport {
        date: args.date,
        condition: args.condition,
        rain: args.rain,
        rain_prob: args.rain_prob,
        temp: args.temp,
        t_min: args.t_min,
        t_max: args.t_max,
        t_dew: args.t_dew,
        wind_speed: args.wind_speed,
        humidity: args.humidity,
        pressure: args.pressure,
    }
}

/// Sends a raw request using method + endpoint name.
async fn send_call(client: &NetroClient, args: &CallArgs) -> Result<Value> {
    // Validate method eagerly so CLI errors are explicit before any network call.
    let method = Method::from_str(&args.method)
        .with_context(|| format!("invalid HTTP method '{}'", args.method))?;
    let params = match &args.params_file {
        Some(path) => read_params_file(path)?,
        None => parse_params(&args.param).context("failed to parse --param arguments")?,
    };

    let value = client
        .call(method, &args.endpoint, params)
        .await
        .with_context(|| format!("call to endpoint '{}' failed", args.endpoint))?;
    Ok(value)
}

/// Parses repeated `key=value` arguments into a JSON object.
///
/// Values that parse as JSON (numbers, arrays, booleans) keep their type;
/// anything else is sent as a string.
fn parse_params(values: &[String]) -> Result<Value> {
    let mut params = Map::new();
    for item in values {
        let Some((key, value)) = item.split_once('=') else {
            bail!("invalid --param value '{item}': expected key=value");
        };
        if key.is_empty() {
            bail!("invalid --param value '{item}': empty key");
        }
        let parsed =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
        params.insert(key.to_owned(), parsed);
    }
    Ok(Value::Object(params))
}

fn read_params_file(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read --params-file '{}'", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse JSON in --params-file '{}'", path.display()))?;
    if !value.is_object() {
        bail!("--params-file '{}' must hold a JSON object", path.display());
    }
    Ok(value)
}

/// Prints the endpoint catalog.
fn print_operations(filter: Option<&str>) {
    let filter = filter.map(str::to_ascii_lowercase);

    let operations: Vec<_> = NetroClient::operations()
        .iter()
        .filter(|operation| {
            filter
                .as_ref()
                .is_none_or(|needle| operation.name.contains(needle.as_str()))
        })
        .collect();

    let name_width = operations
        .iter()
        .map(|operation| operation.name.len())
        .max()
        .unwrap_or(0);

    for operation in operations {
        println!(
            "{:<name_width$}  {:<4}  {}",
            operation.name, operation.method, operation.summary
        );
    }
}

/// Prints a JSON value either compact or pretty-formatted.
fn print_json(value: &Value, compact: bool) -> Result<()> {
    if compact {
        println!(
            "{}",
            serde_json::to_string(value).context("Failed to render JSON")?
        );
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to render JSON")?
        );
    }
    Ok(())
}
