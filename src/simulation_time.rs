use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::core::units::{HOURS_PER_DAY, SECONDS_PER_DAY, SECONDS_PER_HOUR};
use crate::errors::ConfigurationError;

/// The wall-clock window covered by a simulation run.
///
/// Simulated time runs in seconds from 0 at `start` to `total_seconds()` at `end`. Runs always
/// cover exactly one day.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SimulationWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl SimulationWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ConfigurationError> {
        let seconds = (end - start).num_seconds();
        if seconds != SECONDS_PER_DAY as i64 {
            return Err(ConfigurationError::InvalidDuration { seconds });
        }

        Ok(Self { start, end })
    }

    /// A window starting at `start` and ending one day later.
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            start,
            end: start + TimeDelta::seconds(SECONDS_PER_DAY as i64),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn total_seconds(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64
    }

    /// Number of whole hours covered by the window
    pub fn hours(&self) -> usize {
        (self.end - self.start).num_hours() as usize
    }

    /// Largest step the integrator may take, in seconds.
    pub fn max_step(&self, steps_per_hour: u32) -> Result<f64, ConfigurationError> {
        if steps_per_hour == 0 {
            return Err(ConfigurationError::ZeroStepsPerHour);
        }
        Ok(SECONDS_PER_HOUR as f64 / steps_per_hour as f64)
    }

    /// Zero-based hour of the (non-leap) year in which the window starts.
    pub fn start_hour_of_year(&self) -> usize {
        hour_of_year(self.start)
    }
}

/// Zero-based hour of a non-leap year containing `datetime`.
pub fn hour_of_year(datetime: NaiveDateTime) -> usize {
    // weather files cover 365 days, so 29 February shares its hours with 1 March
    let is_leap_year = NaiveDate::from_ymd_opt(datetime.year(), 2, 29).is_some();
    let day_of_year = if is_leap_year && datetime.month() > 2 {
        datetime.ordinal0() - 1
    } else {
        datetime.ordinal0()
    };
    day_of_year as usize * HOURS_PER_DAY as usize + datetime.hour() as usize
}
