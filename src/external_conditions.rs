use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::units::SECONDS_PER_HOUR;
use crate::errors::DataError;
use crate::simulation_time::SimulationWindow;

/// Geographic location for which ambient temperatures are requested.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Location {
    /// degrees north
    pub latitude: f64,
    /// degrees east
    pub longitude: f64,
}

impl Default for Location {
    /// Edinburgh
    fn default() -> Self {
        Self {
            latitude: 55.9533,
            longitude: -3.1883,
        }
    }
}

/// Supplies hourly ambient air temperatures (in K) for a location and time window.
pub trait AmbientSeriesProvider {
    fn fetch_hourly_temperatures(
        &self,
        location: &Location,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<f64>, anyhow::Error>;
}

/// A provider returning the same in-memory series whatever is requested.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedAmbientSeries {
    temperatures: Vec<f64>,
}

impl FixedAmbientSeries {
    pub fn new(temperatures: Vec<f64>) -> Self {
        Self { temperatures }
    }

    /// A constant ambient temperature (in K) for every hour of the window.
    pub fn constant(temperature: f64, hours: usize) -> Self {
        Self::new(vec![temperature; hours])
    }
}

impl AmbientSeriesProvider for FixedAmbientSeries {
    fn fetch_hourly_temperatures(
        &self,
        _location: &Location,
        _start: NaiveDateTime,
        _end: NaiveDateTime,
    ) -> Result<Vec<f64>, anyhow::Error> {
        Ok(self.temperatures.clone())
    }
}

/// Hourly ambient temperatures (in K) over a simulation window, starting at simulated time 0.
#[derive(Clone, Debug, PartialEq)]
pub struct AmbientSeries {
    temperatures: Vec<f64>,
}

impl AmbientSeries {
    pub fn new(temperatures: Vec<f64>) -> Result<Self, DataError> {
        if temperatures.is_empty() {
            return Err(DataError::EmptyAmbientSeries);
        }

        Ok(Self { temperatures })
    }

    /// As `new`, but warns if the series does not cover every hour of the window. Queries past
    /// the end of a short series repeat its last sample.
    pub fn for_window(
        temperatures: Vec<f64>,
        window: &SimulationWindow,
    ) -> Result<Self, DataError> {
        let series = Self::new(temperatures)?;
        if series.len() < window.hours() {
            warn!(
                "Ambient series has {} hourly samples but the simulation covers {} hours; the last sample will be repeated",
                series.len(),
                window.hours()
            );
        }

        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.temperatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.temperatures
    }

    /// Ambient temperature for the hour containing `t` seconds into the run.
    pub fn temperature_at(&self, t: f64) -> f64 {
        let hour = (t.abs() / SECONDS_PER_HOUR as f64) as usize;
        self.temperatures[hour.min(self.temperatures.len() - 1)]
    }
}
