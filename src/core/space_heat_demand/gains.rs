// Distribution of internal and solar gains over the air, surface and mass nodes
// (ISO 13790 C.2).

use crate::core::space_heat_demand::conductance::{ConductanceSet, H_MS};

/// Heat flow rates injected at the air (I_ia), surface (I_st) and mass (I_m) nodes, in W
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GainComponents {
    pub i_ia: f64,
    pub i_st: f64,
    pub i_m: f64,
}

impl GainComponents {
    pub fn new(internal_sensible: f64, solar: f64, conductances: &ConductanceSet) -> Self {
        let i_ia = 0.5 * internal_sensible;
        let mass_ratio = conductances.mass_area_ratio();
        let window_ratio = conductances.h_tr_w / (H_MS * conductances.a_tot);

        Self {
            i_ia,
            i_st: (1. - mass_ratio - window_ratio) * (i_ia + solar),
            i_m: mass_ratio * (i_ia + solar),
        }
    }
}

/// Hourly gain components of one building, built once and read-only afterwards
#[derive(Clone, Debug, Default)]
pub struct GainSeries {
    components: Vec<GainComponents>,
    internal_sensible: Vec<f64>,
    solar: Vec<f64>,
}

impl GainSeries {
    /// Arguments:
    /// * `internal_sensible` - hourly internal sensible gains I_int_sen, in W
    /// * `solar` - hourly net solar gains I_sol, in W
    pub fn new(internal_sensible: Vec<f64>, solar: Vec<f64>, conductances: &ConductanceSet) -> Self {
        let components = internal_sensible
            .iter()
            .zip(solar.iter())
            .map(|(&int_sen, &sol)| GainComponents::new(int_sen, sol, conductances))
            .collect();

        Self {
            components,
            internal_sensible,
            solar,
        }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn at(&self, hour: usize) -> GainComponents {
        self.components.get(hour).copied().unwrap_or_default()
    }

    pub fn internal_sensible(&self) -> &[f64] {
        &self.internal_sensible
    }

    pub fn solar(&self) -> &[f64] {
        &self.solar
    }
}
