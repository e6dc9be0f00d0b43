pub mod controls;
pub mod heat_balance;
pub mod heating_systems;
pub mod metrics;
pub mod solvers;
pub mod space_heat_demand;
pub mod units;
pub mod water_heat_demand;
