use itertools::Itertools;
use polyfit_rs::polyfit_rs::polyfit;
use thiserror::Error;

use crate::core::units::{celsius_to_kelvin, BelowAbsoluteZeroError};
use crate::input::CopReferenceDatum;

/// This module provides an empirical model of heat pump coefficient of performance (COP) as a
/// function of the temperature lift between the condenser and the ambient air:
///
/// COP(ΔT) = A + B / ΔT
///
/// The coefficients are fitted by least squares to reference test data. As the model is linear in
/// A and B, the non-linear least squares problem reduces to a first order polynomial regression of
/// COP against 1/ΔT.

/// Evaluate the COP model for the given temperature lift (in K).
///
/// This is undefined at ΔT = 0 and may be negative for small or negative lifts, so callers must not
/// use the result as a divisor without checking it first.
pub fn cop_function(delta_t: f64, a: f64, b: f64) -> f64 {
    a + b / delta_t
}

#[derive(Debug, Error, PartialEq)]
pub enum CopFitError {
    #[error("At least 2 reference samples are needed to fit the COP model, got {0}")]
    TooFewSamples(usize),
    #[error("Reference data has {delta_t} temperature differences but {cop} COP values")]
    MismatchedLengths { delta_t: usize, cop: usize },
    #[error("Reference temperature difference at index {index} is zero")]
    ZeroTemperatureDifference { index: usize },
    #[error("Reference data needs at least 2 distinct temperature differences to fit the COP model")]
    IdenticalTemperatureDifferences,
    #[error("Reference data at index {index} is not a finite number")]
    NonFiniteSample { index: usize },
    #[error("Regression of reference data failed: {0}")]
    Regression(String),
    #[error("Invalid outdoor temperature in reference data: {0}")]
    InvalidOutdoorTemperature(String),
}

impl From<BelowAbsoluteZeroError> for CopFitError {
    fn from(error: BelowAbsoluteZeroError) -> Self {
        CopFitError::InvalidOutdoorTemperature(error.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct CopModel {
    a: f64,
    b: f64,
    reference_delta_t: Vec<f64>,
    reference_cop: Vec<f64>,
}

impl CopModel {
    /// Fit the model to paired reference temperature differences (in K) and measured COPs.
    pub fn fit(reference_delta_t: Vec<f64>, reference_cop: Vec<f64>) -> Result<Self, CopFitError> {
        if reference_delta_t.len() != reference_cop.len() {
            return Err(CopFitError::MismatchedLengths {
                delta_t: reference_delta_t.len(),
                cop: reference_cop.len(),
            });
        }
        if reference_delta_t.len() < 2 {
            return Err(CopFitError::TooFewSamples(reference_delta_t.len()));
        }
        for (index, (delta_t, cop)) in reference_delta_t.iter().zip(&reference_cop).enumerate() {
            if !delta_t.is_finite() || !cop.is_finite() {
                return Err(CopFitError::NonFiniteSample { index });
            }
            if *delta_t == 0. {
                return Err(CopFitError::ZeroTemperatureDifference { index });
            }
        }

        if reference_delta_t.iter().all(|dt| *dt == reference_delta_t[0]) {
            return Err(CopFitError::IdenticalTemperatureDifferences);
        }

        let inverse_delta_t = reference_delta_t.iter().map(|dt| 1. / dt).collect_vec();
        let coeffs = polyfit(&inverse_delta_t, &reference_cop, 1)
            .map_err(|e| CopFitError::Regression(e.to_string()))?;

        let (a, b) = match coeffs.as_slice() {
            [a, b] if a.is_finite() && b.is_finite() => (*a, *b),
            _ => {
                return Err(CopFitError::Regression(format!(
                    "degenerate coefficients {coeffs:?}"
                )))
            }
        };

        Ok(Self {
            a,
            b,
            reference_delta_t,
            reference_cop,
        })
    }

    /// Fit the model to reference data recorded against outdoor air temperature (in Celsius),
    /// using a condenser held at `fixed_condenser_temperature` (in K).
    pub fn from_reference_data(
        data: &[CopReferenceDatum],
        fixed_condenser_temperature: f64,
    ) -> Result<Self, CopFitError> {
        let reference_delta_t = data
            .iter()
            .map(|datum| {
                Ok(fixed_condenser_temperature - celsius_to_kelvin(datum.outdoor_temp_c)?)
            })
            .collect::<Result<Vec<_>, CopFitError>>()?;
        let reference_cop = data.iter().map(|datum| datum.cop).collect();

        Self::fit(reference_delta_t, reference_cop)
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn reference_delta_t(&self) -> &[f64] {
        &self.reference_delta_t
    }

    pub fn reference_cop(&self) -> &[f64] {
        &self.reference_cop
    }

    pub fn evaluate(&self, delta_t: f64) -> f64 {
        cop_function(delta_t, self.a, self.b)
    }

    /// Evenly spaced (ΔT, COP) points of the fitted curve across the range of the reference data,
    /// for diagnostic plotting alongside the reference samples.
    pub fn fit_curve(&self, points: usize) -> Vec<(f64, f64)> {
        let (min, max) = match self
            .reference_delta_t
            .iter()
            .copied()
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
        {
            Some(bounds) => bounds,
            None => return vec![],
        };

        match points {
            0 => vec![],
            1 => vec![(min, self.evaluate(min))],
            _ => {
                let step = (max - min) / (points - 1) as f64;
                (0..points)
                    .map(|i| {
                        let delta_t = min + i as f64 * step;
                        (delta_t, self.evaluate(delta_t))
                    })
                    .collect()
            }
        }
    }
}
