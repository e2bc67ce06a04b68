use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use chrono::{DateTime, Utc};

use crate::metering_mercury::structs::*;

/// One polling cycle of a meter, scaled to physical units.
///
/// Phases or channels the meter did not answer for are `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeterReading {
    pub meter_name: String,
    pub address: u8,
    pub model: String,
    pub metered_time: DateTime<Utc>,
    /// Volts per phase
    pub voltage: Option<[Option<f64>; 3]>,
    /// Amperes per phase
    pub current: Option<[Option<f64>; 3]>,
    /// Watts per phase
    pub power: Option<[Option<f64>; 3]>,
    /// kWh per tariff number
    pub energy: BTreeMap<u8, f64>,
}

impl MeterReading {
    pub fn new(meter_name: &str, address: u8, model: &str) -> Self {
        MeterReading {
            meter_name: meter_name.to_string(),
            address,
            model: model.to_string(),
            metered_time: Utc::now(),
            voltage: None,
            current: None,
            power: None,
            energy: BTreeMap::new(),
        }
    }

    pub fn apply_current_values(&mut self, values: &CurrentValues) {
        if let Some(v) = scale_phases(values.voltage, VOLTAGE_DIVISOR) {
            self.voltage = Some(v);
        }
        if let Some(c) = scale_phases(values.current, CURRENT_DIVISOR) {
            self.current = Some(c);
        }
        if let Some(p) = scale_phases(values.power, 1.0) {
            self.power = Some(p);
        }
    }

    pub fn apply_energy(&mut self, tariff: u8, raw: u32) {
        if raw != INVALID_ENERGY {
            self.energy.insert(tariff, raw as f64 / ENERGY_DIVISOR);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.voltage.is_none() && self.current.is_none() && self.power.is_none() && self.energy.is_empty()
    }
}

fn scale_phases(raw: PhaseValues, divisor: f64) -> Option<[Option<f64>; 3]> {
    if raw.iter().all(|v| *v == INVALID_VALUE) {
        return None;
    }
    Some(raw.map(|v| if v == INVALID_VALUE { None } else { Some(v as f64 / divisor) }))
}
