use std::cell::RefCell;

use ode_solvers::dop_shared::{IntegrationError, OutputType};
use ode_solvers::{Dopri5, System, Vector1};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::controls::hysteresis_control::HysteresisControl;
use crate::core::heat_balance::HeatBalance;

type State = Vector1<f64>;
type Time = f64;

/// When the hysteresis controller inside the integrator sees a new tank temperature.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerUpdate {
    /// On every evaluation of the derivative, including the trial stages of steps the solver
    /// goes on to reject. Switching can therefore happen a little early or late.
    #[default]
    EveryEvaluation,
    /// Only once a step has been accepted. The pump state is held for the whole of each step.
    AcceptedSteps,
}

/// Tolerances for the adaptive step size control of the integrator.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SolverSettings {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        // https://github.com/scipy/scipy/blob/6b657ede0c3c4cffef3156229afddf02a2b1d99a/scipy/integrate/_ivp/rk.py#L293
        Self {
            rtol: 1e-3,
            atol: 1e-6,
        }
    }
}

/// Tank temperature (in K) at each time (in seconds) chosen by the integrator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    temperatures: Vec<f64>,
}

impl Trajectory {
    /// Builds a trajectory from solver output, starting from the initial state and keeping only
    /// points whose times strictly increase.
    fn from_solver_output(
        initial_time: f64,
        initial_temperature: f64,
        times: &[f64],
        temperatures: impl IntoIterator<Item = f64>,
    ) -> Self {
        let mut trajectory = Self {
            times: vec![initial_time],
            temperatures: vec![initial_temperature],
        };
        for (t, temperature) in times.iter().zip(temperatures) {
            if trajectory.times.last().is_some_and(|last| *t > *last) {
                trajectory.times.push(*t);
                trajectory.temperatures.push(temperature);
            }
        }
        trajectory
    }

    /// A trajectory through the given (time, temperature) points, which must be in time order.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (times, temperatures) = points.into_iter().unzip();
        Self {
            times,
            temperatures,
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times
            .iter()
            .copied()
            .zip(self.temperatures.iter().copied())
    }
}

/// Adapts the tank heat balance to the ODE solver. The controller is consulted from inside the
/// derivative, which the solver only sees through `&self`.
struct TankTemperatureOde<'a> {
    heat_balance: &'a HeatBalance<'a>,
    control: RefCell<HysteresisControl>,
    controller_update: ControllerUpdate,
}

impl System<Time, State> for TankTemperatureOde<'_> {
    fn system(&self, t: Time, y: &State, dy: &mut State) {
        let pump_state = match self.controller_update {
            ControllerUpdate::EveryEvaluation => self.control.borrow_mut().update(y[0]),
            ControllerUpdate::AcceptedSteps => self.control.borrow().state(),
        };

        dy[0] = self
            .heat_balance
            .temperature_derivative(t, y[0], pump_state);
    }

    fn solout(&mut self, _t: Time, y: &State, _dy: &State) -> bool {
        if self.controller_update == ControllerUpdate::AcceptedSteps {
            self.control.get_mut().update(y[0]);
        }
        // never stop early
        false
    }
}

/// Integrate tank temperature from 0 to `total_seconds` with the Dormand-Prince 5(4) method,
/// configured to match scipy's RK45.
///
/// `control` should be freshly reset, as it is driven by this integration only.
pub fn integrate_tank_temperature(
    heat_balance: &HeatBalance,
    mut control: HysteresisControl,
    controller_update: ControllerUpdate,
    initial_temperature: f64,
    total_seconds: f64,
    max_step: f64,
    settings: &SolverSettings,
) -> Result<Trajectory, IntegrationError> {
    if controller_update == ControllerUpdate::AcceptedSteps {
        control.update(initial_temperature);
    }
    let f = TankTemperatureOde {
        heat_balance,
        control: RefCell::new(control),
        controller_update,
    };

    let x = 0.;
    let x_end = total_seconds;
    let dx = max_step; // only used for dense output
    let y0 = State::new(initial_temperature);
    let h = 0.; // initial step size chosen by the solver
    let safety_factor = 0.9; // matches scipy implementation
    let beta = 0.; // gives an alpha of 0.2, matching scipy's adaptive step size logic
    let fac_min = 0.2; // matches scipy implementation
    let fac_max = 10.; // matches scipy implementation
    let n_max = 100_000;
    let n_stiff = 1_000;
    let mut stepper = Dopri5::from_param(
        f,
        x,
        x_end,
        dx,
        y0,
        settings.rtol,
        settings.atol,
        safety_factor,
        beta,
        fac_min,
        fac_max,
        max_step,
        h,
        n_max,
        n_stiff,
        OutputType::Sparse,
    );

    let stats = stepper.integrate()?;
    debug!(
        "Tank temperature integrated with {} evaluations, {} accepted and {} rejected steps",
        stats.num_eval, stats.accepted_steps, stats.rejected_steps
    );

    Ok(Trajectory::from_solver_output(
        x,
        initial_temperature,
        stepper.x_out(),
        stepper.y_out().iter().map(|y| y[0]),
    ))
}
