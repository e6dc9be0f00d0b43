use std::io::Read;

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDateTime;
use csv::ReaderBuilder as CsvReaderBuilder;
use tracing::{debug, warn};

use crate::core::units::{celsius_to_kelvin, HOURS_PER_DAY};
use crate::external_conditions::{AmbientSeriesProvider, Location};
use crate::simulation_time::hour_of_year;

const COLUMN_LATITUDE: usize = 6;
const COLUMN_LONGITUDE: usize = 7;
const COLUMN_AIR_TEMP: usize = 6; // dry bulb temp in degrees
const FIRST_DATA_ROW: usize = 8;
const HOURS_PER_YEAR: usize = 365 * HOURS_PER_DAY as usize;
/// Largest distance in degrees between the requested location and the weather file's location
/// before a warning is logged.
const LOCATION_TOLERANCE: f64 = 0.5;

/// Hourly dry bulb temperatures for a year, read from an EnergyPlus weather (EPW) file.
#[derive(Clone, Debug, PartialEq)]
pub struct EpwAmbientSeries {
    /// Celsius, one per hour of the year
    air_temperatures: Vec<f64>,
    location: Location,
}

impl EpwAmbientSeries {
    pub fn from_reader(file: impl Read) -> Result<Self, anyhow::Error> {
        let mut reader = CsvReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_reader(file);

        let mut air_temperatures = vec![];
        let mut location: Option<Location> = None;

        for (i, result) in reader.records().enumerate() {
            let record = result?;
            let field = |column: usize| -> Result<f64, anyhow::Error> {
                record
                    .get(column)
                    .ok_or_else(|| anyhow!("Weather file row {i} has no column {column}"))?
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("Weather file row {i}, column {column}"))
            };
            if i == 0 {
                location = Some(Location {
                    latitude: field(COLUMN_LATITUDE)?,
                    longitude: field(COLUMN_LONGITUDE)?,
                });
            } else if i >= FIRST_DATA_ROW {
                air_temperatures.push(field(COLUMN_AIR_TEMP)?);
            }
        }

        let Some(location) = location else {
            bail!("Weather file is empty");
        };
        if air_temperatures.is_empty() {
            bail!("Weather file contains no hourly data");
        }
        debug!(
            "Read {} hours of weather data for {}N {}E",
            air_temperatures.len(),
            location.latitude,
            location.longitude
        );

        Ok(Self {
            air_temperatures,
            location,
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl AmbientSeriesProvider for EpwAmbientSeries {
    /// Temperatures (in K) for each hour from `start` up to `end`, wrapping round to the start of
    /// the file past the end of the year.
    fn fetch_hourly_temperatures(
        &self,
        location: &Location,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<f64>, anyhow::Error> {
        if (location.latitude - self.location.latitude).abs() > LOCATION_TOLERANCE
            || (location.longitude - self.location.longitude).abs() > LOCATION_TOLERANCE
        {
            warn!(
                "Weather file is for {}N {}E but temperatures were requested for {}N {}E",
                self.location.latitude,
                self.location.longitude,
                location.latitude,
                location.longitude
            );
        }

        let hours = (end - start).num_hours().max(0) as usize;
        let first_hour = hour_of_year(start) % HOURS_PER_YEAR.min(self.air_temperatures.len());

        self.air_temperatures
            .iter()
            .cycle()
            .skip(first_hour)
            .take(hours)
            .map(|temp_c| celsius_to_kelvin(*temp_c).map_err(anyhow::Error::from))
            .collect()
    }
}
