pub mod heating_systems;
pub mod material_properties;
pub mod pipework;
pub mod pumping;
pub(crate) mod solvers;
pub mod space_heat_demand;
pub mod units;
pub mod water_heat_demand;
