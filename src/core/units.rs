use thiserror::Error;

pub const WATTS_PER_KILOWATT: u32 = 1_000;
pub const MINUTES_PER_HOUR: u32 = 60;
pub const SECONDS_PER_MINUTE: u32 = 60;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const HOURS_PER_DAY: u32 = 24;
pub const SECONDS_PER_DAY: u32 = SECONDS_PER_HOUR * HOURS_PER_DAY;
pub const MINUTES_PER_DAY: u32 = MINUTES_PER_HOUR * HOURS_PER_DAY;
pub const WATER_DENSITY_KG_PER_M3: f64 = 1_000.;

const KELVIN_OFFSET: f64 = 273.15;

pub fn celsius_to_kelvin(temp_c: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_c < -KELVIN_OFFSET {
        Err(BelowAbsoluteZeroError::from_c(temp_c))
    } else {
        Ok(temp_c + KELVIN_OFFSET)
    }
}

pub fn kelvin_to_celsius(temp_k: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_k < 0.0 {
        Err(BelowAbsoluteZeroError::from_k(temp_k))
    } else {
        Ok(temp_k - KELVIN_OFFSET)
    }
}

/// Convert a series of instantaneous powers in W, sampled `samples_per_hour` times an hour,
/// into an energy total in kWh.
pub fn watt_samples_to_kwh(samples: &[f64], samples_per_hour: f64) -> f64 {
    samples.iter().sum::<f64>() / (samples_per_hour * WATTS_PER_KILOWATT as f64)
}

#[derive(Debug, Error)]
#[error("A temperature of {k}ºK/{}ºC was encountered, which is less than absolute zero", k - KELVIN_OFFSET)]
pub struct BelowAbsoluteZeroError {
    k: f64,
}

impl BelowAbsoluteZeroError {
    fn from_k(k: f64) -> Self {
        Self { k }
    }

    fn from_c(c: f64) -> Self {
        Self {
            k: c + KELVIN_OFFSET,
        }
    }
}
