// Conductances and capacitance of the ISO 13790 5R1C network of a single zone.

use crate::errors::ConfigurationError;
use strum::Display;

/// Heat transfer coefficient between the mass and surface nodes, in W / (m2.K)
pub const H_MS: f64 = 9.1;
/// Heat transfer coefficient between the surface and air nodes, in W / (m2.K)
pub const H_IS: f64 = 3.45;
/// Temperature reduction factor for elements in contact with the ground or unheated spaces
pub const B_F: f64 = 0.7;
/// Ratio of internal surface area to floor area used when no area is given (ISO 13790 7.2.2.2)
pub const LAMBDA_AT: f64 = 4.5;

/// Thermal mass class of the construction, after ISO 13790 Table 12
#[derive(Clone, Copy, Debug, Default, Display, PartialEq)]
pub enum ConstructionClass {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl ConstructionClass {
    /// Parse a construction class code; returns None for codes that are not recognised
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "light" | "t1" => Some(Self::Light),
            "medium" | "t2" => Some(Self::Medium),
            "heavy" | "t3" => Some(Self::Heavy),
            _ => None,
        }
    }

    /// Effective mass area per unit of floor area, in m2/m2
    pub fn mass_area_factor(&self) -> f64 {
        match self {
            Self::Light | Self::Medium => 2.5,
            Self::Heavy => 3.0,
        }
    }

    /// Internal heat capacity per unit of floor area, in J / (m2.K)
    pub fn heat_capacity_per_area(&self) -> f64 {
        match self {
            Self::Light => 110_000.,
            Self::Medium => 165_000.,
            Self::Heavy => 260_000.,
        }
    }
}

/// Envelope of a building as seen by the thermal network
#[derive(Clone, Copy, Debug)]
pub struct EnvelopeProperties {
    pub floor_area: f64,
    pub window_area: f64,
    pub opaque_area_above_ground: f64,
    pub opaque_area_below_ground: f64,
    pub total_area: Option<f64>,
    pub u_window: f64,
    pub u_opaque: f64,
    pub u_base: f64,
    pub construction: ConstructionClass,
}

impl EnvelopeProperties {
    /// Transmission heat transfer coefficient through windows, in W/K
    pub fn h_tr_w(&self) -> f64 {
        self.window_area * self.u_window
    }

    /// Transmission heat transfer coefficient through opaque elements, in W/K
    pub fn h_tr_op(&self) -> f64 {
        self.opaque_area_above_ground * self.u_opaque
            + B_F * self.opaque_area_below_ground * self.u_base
    }

    pub fn conductances(&self) -> Result<ConductanceSet, ConfigurationError> {
        let a_m = self.construction.mass_area_factor() * self.floor_area;
        let c_m = self.construction.heat_capacity_per_area() * self.floor_area;
        let a_tot = self.total_area.unwrap_or(LAMBDA_AT * self.floor_area);

        ConductanceSet::from_opaque_conductance(
            H_IS * a_tot,
            H_MS * a_m,
            self.h_tr_w(),
            self.h_tr_op(),
            c_m,
            a_m,
            a_tot,
            self.floor_area,
        )
    }
}

/// Static conductances (W/K) and capacitance (J/K) of the network. The ventilation
/// conductance varies hourly and is coupled in through [`ConductanceSet::coupled`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConductanceSet {
    pub h_tr_is: f64,
    pub h_tr_ms: f64,
    pub h_tr_w: f64,
    pub h_tr_em: f64,
    pub c_m: f64,
    pub a_m: f64,
    pub a_tot: f64,
    pub floor_area: f64,
}

impl ConductanceSet {
    /// Construct from known conductances, e.g. a calibrated network
    pub fn new(
        h_tr_is: f64,
        h_tr_ms: f64,
        h_tr_w: f64,
        h_tr_em: f64,
        c_m: f64,
        a_m: f64,
        a_tot: f64,
        floor_area: f64,
    ) -> Self {
        Self {
            h_tr_is,
            h_tr_ms,
            h_tr_w,
            h_tr_em,
            c_m,
            a_m,
            a_tot,
            floor_area,
        }
    }

    /// Construct from the opaque transmission coefficient, splitting it into the
    /// external-to-mass conductance Htr_em in series with Htr_ms.
    ///
    /// Arguments:
    /// * `h_tr_op` - transmission heat transfer coefficient of opaque elements, in W/K;
    ///               must be positive and smaller than `h_tr_ms`
    pub fn from_opaque_conductance(
        h_tr_is: f64,
        h_tr_ms: f64,
        h_tr_w: f64,
        h_tr_op: f64,
        c_m: f64,
        a_m: f64,
        a_tot: f64,
        floor_area: f64,
    ) -> Result<Self, ConfigurationError> {
        if !(h_tr_op > 0. && h_tr_op < h_tr_ms) {
            return Err(ConfigurationError::DegenerateConductance { h_tr_op, h_tr_ms });
        }
        let h_tr_em = 1. / (1. / h_tr_op - 1. / h_tr_ms);

        Ok(Self::new(
            h_tr_is, h_tr_ms, h_tr_w, h_tr_em, c_m, a_m, a_tot, floor_area,
        ))
    }

    /// Opaque transmission coefficient implied by Htr_em and Htr_ms in series, in W/K
    pub fn h_tr_op(&self) -> f64 {
        1. / (1. / self.h_tr_em + 1. / self.h_tr_ms)
    }

    /// Ratio of effective mass area to total internal area
    pub fn mass_area_ratio(&self) -> f64 {
        self.a_m / self.a_tot
    }

    /// Couple in the ventilation conductance `h_ve` (W/K) for one hour
    pub fn coupled(&self, h_ve: f64) -> CoupledConductances {
        // series connection written without 1/h_ve so that h_ve = 0 is valid
        let h_tr_1 = h_ve * self.h_tr_is / (h_ve + self.h_tr_is);
        let h_tr_2 = h_tr_1 + self.h_tr_w;
        let h_tr_3 = h_tr_2 * self.h_tr_ms / (h_tr_2 + self.h_tr_ms);

        CoupledConductances {
            h_ve,
            h_tr_1,
            h_tr_2,
            h_tr_3,
            air_share: self.h_tr_is / (self.h_tr_is + h_ve),
        }
    }
}

/// Conductances depending on the hourly ventilation conductance, in W/K
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoupledConductances {
    pub h_ve: f64,
    pub h_tr_1: f64,
    pub h_tr_2: f64,
    pub h_tr_3: f64,
    /// Htr_1 / Hve, the share of a gain at the air node passed on towards the surface node
    pub air_share: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn envelope() -> EnvelopeProperties {
        EnvelopeProperties {
            floor_area: 100.,
            window_area: 20.,
            opaque_area_above_ground: 200.,
            opaque_area_below_ground: 100.,
            total_area: None,
            u_window: 1.4,
            u_opaque: 0.3,
            u_base: 0.4,
            construction: ConstructionClass::Heavy,
        }
    }

    #[rstest]
    #[case("light", Some(ConstructionClass::Light))]
    #[case("T2", Some(ConstructionClass::Medium))]
    #[case(" Heavy ", Some(ConstructionClass::Heavy))]
    #[case("concrete", None)]
    fn should_parse_construction_codes(
        #[case] code: &str,
        #[case] expected: Option<ConstructionClass>,
    ) {
        assert_eq!(ConstructionClass::from_code(code), expected);
    }

    #[rstest]
    fn should_build_conductances_from_envelope(envelope: EnvelopeProperties) {
        let conductances = envelope.conductances().unwrap();

        assert_relative_eq!(conductances.h_tr_w, 28.);
        assert_relative_eq!(conductances.a_m, 300.);
        assert_relative_eq!(conductances.c_m, 26_000_000.);
        assert_relative_eq!(conductances.a_tot, 450.);
        assert_relative_eq!(conductances.h_tr_ms, 2730., max_relative = 1e-12);
        assert_relative_eq!(conductances.h_tr_is, 1552.5, max_relative = 1e-12);
        // Htr_op = 200 * 0.3 + 0.7 * 100 * 0.4 = 88
        assert_relative_eq!(
            conductances.h_tr_em,
            1. / (1. / 88. - 1. / 2730.),
            max_relative = 1e-12
        );
        assert_relative_eq!(conductances.h_tr_op(), 88., max_relative = 1e-12);
    }

    #[rstest]
    fn should_use_given_total_area(mut envelope: EnvelopeProperties) {
        envelope.total_area = Some(500.);
        assert_relative_eq!(envelope.conductances().unwrap().h_tr_is, 1725.);
    }

    #[rstest]
    fn should_reject_opaque_conductance_above_mass_conductance(mut envelope: EnvelopeProperties) {
        envelope.u_opaque = 20.;
        assert!(matches!(
            envelope.conductances(),
            Err(ConfigurationError::DegenerateConductance { .. })
        ));
    }

    #[rstest]
    fn should_reject_equal_opaque_and_mass_conductance() {
        let result =
            ConductanceSet::from_opaque_conductance(500., 800., 150., 800., 2e7, 250., 450., 100.);
        assert_eq!(
            result,
            Err(ConfigurationError::DegenerateConductance {
                h_tr_op: 800.,
                h_tr_ms: 800.
            })
        );
    }

    #[rstest]
    fn should_couple_ventilation_conductance() {
        let conductances = ConductanceSet::new(500., 800., 150., 300., 2e7, 250., 450., 100.);
        let coupled = conductances.coupled(100.);

        assert_relative_eq!(coupled.h_tr_1, 1. / (1. / 100. + 1. / 500.), max_relative = 1e-12);
        assert_relative_eq!(coupled.h_tr_2, coupled.h_tr_1 + 150., max_relative = 1e-12);
        assert_relative_eq!(
            coupled.h_tr_3,
            1. / (1. / coupled.h_tr_2 + 1. / 800.),
            max_relative = 1e-12
        );
        assert_relative_eq!(coupled.air_share, coupled.h_tr_1 / 100., max_relative = 1e-12);
    }

    #[rstest]
    fn should_allow_zero_ventilation() {
        let conductances = ConductanceSet::new(500., 800., 150., 300., 2e7, 250., 450., 100.);
        let coupled = conductances.coupled(0.);

        assert_eq!(coupled.h_tr_1, 0.);
        assert_eq!(coupled.air_share, 1.);
        assert!(coupled.h_tr_3.is_finite());
    }
}
