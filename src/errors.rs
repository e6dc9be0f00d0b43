use ode_solvers::dop_shared::IntegrationError;
use thiserror::Error;

use crate::core::heating_systems::heat_pump::CopFitError;

/// Any failure that aborts a simulation run.
///
/// Configuration and data errors are raised before any integration work is done. Numerical edge
/// cases inside the heat balance are clamped locally and only logged, so they never show up here.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid simulation configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Invalid data for simulation run: {0}")]
    Data(#[from] DataError),
    #[error("ODE integration failed: {0}")]
    Integration(#[from] IntegrationError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Missing simulation parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("Invalid simulation parameters: {0}")]
    InvalidParameters(String),
    #[error("Heat pump off threshold ({off}K) must be greater than on threshold ({on}K)")]
    InvalidThresholds { on: f64, off: f64 },
    #[error("Fixed condenser temperature must be at least 333.15K (60°C), got {0}K")]
    CondenserTemperatureTooLow(f64),
    #[error("Mass of water ({mass}kg) and specific heat capacity ({specific_heat_capacity}J/kgK) must both be positive")]
    NonPositiveThermalMass {
        mass: f64,
        specific_heat_capacity: f64,
    },
    #[error("Initial tank temperature must be a positive number of kelvin, got {0}K")]
    InvalidInitialTankTemperature(f64),
    #[error("Tank length must be positive, got {0}m")]
    NonPositiveTankLength(f64),
    #[error("Steps per hour must be positive")]
    ZeroStepsPerHour,
    #[error("The simulation requires exactly 24 hours, but the requested window is {seconds} seconds")]
    InvalidDuration { seconds: i64 },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("COP model could not be fitted: {0}")]
    CopFit(#[from] CopFitError),
    #[error("Ambient temperature series is empty")]
    EmptyAmbientSeries,
    #[error("Could not fetch ambient temperatures: {0}")]
    AmbientSeriesUnavailable(anyhow::Error),
}
