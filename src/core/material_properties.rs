use std::sync::LazyLock;

/// Properties of the working fluids of the building services (water in pipes,
/// tanks and emitters, air in coils and ventilation).

#[derive(Clone, Copy, Debug)]
pub struct MaterialProperties {
    density: f64,                  // kg/m3
    specific_heat_capacity: f64,   // J/(kg.K)
    volumetric_heat_capacity: f64, // J/(m3.K)
}

impl MaterialProperties {
    pub fn new(density: f64, specific_heat_capacity: f64) -> Self {
        Self {
            density,
            specific_heat_capacity,
            volumetric_heat_capacity: specific_heat_capacity * density,
        }
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn specific_heat_capacity(&self) -> f64 {
        self.specific_heat_capacity
    }

    pub fn volumetric_heat_capacity(&self) -> f64 {
        self.volumetric_heat_capacity
    }

    /// Heat capacity flow rate, in W/K, of a volume flow
    ///
    /// Arguments:
    /// * `volume_flow` - volume flow rate, in m3/s
    pub fn heat_capacity_rate(&self, volume_flow: f64) -> f64 {
        volume_flow * self.volumetric_heat_capacity
    }
}

pub static WATER: LazyLock<MaterialProperties> =
    LazyLock::new(|| MaterialProperties::new(998.0, 4184.0));
pub static AIR: LazyLock<MaterialProperties> =
    LazyLock::new(|| MaterialProperties::new(1.204, 1006.0));
