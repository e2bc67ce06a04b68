use log::{debug, info, warn};

use crate::config::MeterConfig;
use crate::metering_mercury::{structs::*, MercuryError, MeterDevice};
use crate::models::MeterReading;

const CHANNELS: [Channel; 3] = [Channel::Voltage, Channel::Current, Channel::Power];

/// Runs one complete exchange with a meter: open the session, read all
/// channels and the configured energy tariffs, close the session again.
///
/// A meter that does not acknowledge the session yields an empty reading.
pub fn read_meter(device: &mut dyn MeterDevice, meter: &MeterConfig) -> Result<MeterReading, MercuryError> {
    let mut reading = MeterReading::new(&meter.name, meter.address, &meter.model.to_string());

    device.start_stop_session(meter.address, SESSION_OPEN)?;
    if !device.check_ready()? {
        warn!("Meter {} did not open a session", meter.name);
        return Ok(reading);
    }

    for channel in CHANNELS {
        device.request_measure(meter.address, channel.command())?;
        let values = device.read_current_values(channel.command())?;
        if values.is_invalid() {
            warn!("Meter {}: no {:?} values", meter.name, channel);
        }
        reading.apply_current_values(&values);
    }

    for tariff in &meter.energy_tariffs {
        device.request_measure(meter.address, *tariff)?;
        let energy = device.read_energy(*tariff)?;
        debug!("Meter {} tariff {}: {}", meter.name, tariff, energy);
        reading.apply_energy(*tariff, energy);
    }

    device.start_stop_session(meter.address, SESSION_CLOSE)?;
    if !device.check_ready()? {
        info!("Meter {} did not acknowledge closing the session", meter.name);
    }

    Ok(reading)
}
