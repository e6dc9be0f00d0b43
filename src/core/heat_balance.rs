use crate::core::controls::hysteresis_control::PumpState;
use crate::core::heating_systems::heat_pump::CopModel;
use crate::core::heating_systems::storage_tank::heat_loss;
use crate::core::space_heat_demand::building_heat_load::BuildingEnvelope;
use crate::core::water_heat_demand::hot_water_demand::HotWaterDemandProfile;
use crate::external_conditions::AmbientSeries;
use crate::input::SimulationConfig;

/// Energy balance of the hot water tank, giving the rate of change of tank temperature:
///
/// dT/dt = (Q_transfer + Q_load - Q_loss) / (m * c_p)
///
/// where:
/// * Q_transfer - heat delivered by the heat pump condenser, zero while the pump is off (W)
/// * Q_load - building heat load, less any hot water drawn off (W, negative when heat is drawn)
/// * Q_loss - heat lost through the tank surface to ambient (W)
/// * m * c_p - heat capacity of the water in the tank (J/K)
///
/// Whether the pump is on is decided by the caller, so this holds no state and can be shared
/// between the integrator and the metrics pass.
#[derive(Clone, Debug)]
pub struct HeatBalance<'a> {
    cop_model: &'a CopModel,
    ambient: &'a AmbientSeries,
    hot_water_demand: Option<&'a HotWaterDemandProfile>,
    envelope: BuildingEnvelope,
    fixed_condenser_temperature: f64,
    condenser_conductance: f64,
    pump_power: f64,
    tank_heat_loss_coefficient: f64,
    tank_heat_capacity: f64,
}

impl<'a> HeatBalance<'a> {
    /// `config` is expected to have been validated already, so that the tank heat capacity is
    /// positive.
    pub fn new(
        config: &SimulationConfig,
        cop_model: &'a CopModel,
        ambient: &'a AmbientSeries,
        hot_water_demand: Option<&'a HotWaterDemandProfile>,
    ) -> Self {
        Self {
            cop_model,
            ambient,
            hot_water_demand,
            envelope: config.building_envelope(),
            fixed_condenser_temperature: config.fixed_condenser_temperature,
            condenser_conductance: config.heat_transfer_coefficient * config.heat_transfer_area,
            pump_power: config.pump_power,
            tank_heat_loss_coefficient: config
                .tank_geometry()
                .heat_loss_coefficient(config.heat_loss_coefficient),
            tank_heat_capacity: config.tank_heat_capacity(),
        }
    }

    pub fn temp_ambient(&self, t: f64) -> f64 {
        self.ambient.temperature_at(t)
    }

    /// Effective heat loss coefficient of the whole tank, in W/K
    pub fn tank_heat_loss_coefficient(&self) -> f64 {
        self.tank_heat_loss_coefficient
    }

    /// COP of the heat pump lifting heat from ambient air to the condenser.
    pub fn cop(&self, temp_ambient: f64) -> f64 {
        self.cop_model
            .evaluate(self.fixed_condenser_temperature - temp_ambient)
    }

    /// Heat delivered to the tank, in W: the condenser's heat exchange with the tank, limited to
    /// what the pump can deliver at its current COP.
    pub fn heat_transfer(&self, pump_state: PumpState, temp_tank: f64, temp_ambient: f64) -> f64 {
        if !pump_state.is_on() {
            return 0.;
        }
        let exchange = self.condenser_conductance * (self.fixed_condenser_temperature - temp_tank);
        let capacity = self.cop(temp_ambient) * self.pump_power;

        exchange.min(capacity)
    }

    pub fn heat_loss(&self, temp_tank: f64, temp_ambient: f64) -> f64 {
        heat_loss(self.tank_heat_loss_coefficient, temp_tank, temp_ambient)
    }

    /// Net heat load on the tank at `t` seconds, in W.
    pub fn heat_load(&self, t: f64, temp_ambient: f64) -> f64 {
        let building_load = self.envelope.heat_load(temp_ambient);
        match self.hot_water_demand {
            Some(profile) => building_load - profile.demand_at(t),
            None => building_load,
        }
    }

    /// Rate of change of tank temperature, in K/s.
    pub fn temperature_derivative(&self, t: f64, temp_tank: f64, pump_state: PumpState) -> f64 {
        let temp_ambient = self.temp_ambient(t);
        let q_transfer = self.heat_transfer(pump_state, temp_tank, temp_ambient);
        let q_load = self.heat_load(t, temp_ambient);
        let q_loss = self.heat_loss(temp_tank, temp_ambient);

        (q_transfer + q_load - q_loss) / self.tank_heat_capacity
    }
}
