pub mod conductance;
pub mod emission_losses;
pub mod gains;
pub mod internal_gains;
pub mod latent_loads;
pub mod solar_gains;
pub mod ventilation;
pub mod zone;
