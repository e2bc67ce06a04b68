use mercury230::{create_device, poller, transport::open_serial, Config, MeterConfig};
use std::{env, path::PathBuf, time::Duration};
use tokio::time::Instant;
use log::{error, info};


#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    let default_filter = std::env::var("M230_LOG_LEVEL").unwrap_or("info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    let path = env::args().nth(1).map(PathBuf::from);
    let config = Config::load(path.as_deref())?;

    /* All meters share the one bus, so there is exactly one owner of the port */
    let mut port = open_serial(&config.serial)?;
    let mut next_read: Vec<Instant> = vec![Instant::now(); config.meters.len()];

    info!("Polling {} meters on {}", config.meters.len(), config.serial.port);
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        interval.tick().await;

        let now = Instant::now();
        let mut due: Vec<MeterConfig> = Vec::new();
        for (meter, next) in config.meters.iter().zip(next_read.iter_mut()) {
            if *next <= now {
                *next = now + Duration::from_secs(meter.read_interval);
                due.push(meter.clone());
            }
        }
        if due.is_empty() {
            continue;
        }

        /* Serial I/O blocks, keep it off the runtime */
        let (p, readings) = tokio::task::spawn_blocking(move || {
            let mut readings = Vec::new();
            for meter in &due {
                let mut device = create_device(&meter.model, &mut port);
                match poller::read_meter(device.as_mut(), meter) {
                    Ok(reading) => readings.push(reading),
                    Err(e) => error!("Reading meter {} failed: {e}", meter.name),
                }
            }
            (port, readings)
        }).await?;
        port = p;

        for reading in readings {
            match serde_json::to_string(&reading) {
                Ok(line) => println!("{line}"),
                Err(e) => error!("Unable to serialize reading: {e:?}"),
            }
        }
    }
}
