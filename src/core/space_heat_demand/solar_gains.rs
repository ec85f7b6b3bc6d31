// Solar heat gains through windows and opaque elements after ISO 13790 section 11.3,
// less the thermal radiation from the envelope to the sky.

use crate::core::units::{celsius_to_kelvin, STEFAN_BOLTZMANN};
use strum::Display;

/// Irradiance on a window above which its shading device is assumed to be deployed, in W/m2
pub const SHADING_ACTIVATION_IRRADIANCE: f64 = 300.;
/// External surface resistance, in m2.K / W
pub const R_SE: f64 = 0.04;
/// Emissivity of external surfaces for thermal radiation
pub const EMISSIVITY: f64 = 0.9;

#[derive(Clone, Copy, Debug, Default, Display, PartialEq)]
pub enum ShadingDevice {
    #[default]
    None,
    Rollo,
    VenetianBlinds,
    ExteriorVenetianBlinds,
    InteriorVenetianBlinds,
    Curtains,
}

impl ShadingDevice {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "T0" => Some(Self::None),
            "T1" => Some(Self::Rollo),
            "T2" => Some(Self::VenetianBlinds),
            "T3" => Some(Self::ExteriorVenetianBlinds),
            "T4" => Some(Self::InteriorVenetianBlinds),
            "T5" => Some(Self::Curtains),
            _ => None,
        }
    }

    /// Fraction of the solar gain passed when the device is deployed
    pub fn reduction_factor(&self) -> f64 {
        match self {
            Self::None => 1.0,
            Self::Rollo | Self::VenetianBlinds => 0.08,
            Self::ExteriorVenetianBlinds => 0.15,
            Self::InteriorVenetianBlinds => 0.57,
            Self::Curtains => 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlazingProperties {
    pub g_value: f64,
    pub frame_fraction: f64,
    pub shading_factor: f64,
    pub shading_setpoint: f64,
}

impl GlazingProperties {
    /// Solar energy transmittance for the given irradiance on the window. The shading
    /// device is either fully deployed or not at all.
    pub fn effective_g_value(&self, irradiance: f64) -> f64 {
        if irradiance > self.shading_setpoint {
            self.g_value * self.shading_factor
        } else {
            self.g_value
        }
    }
}

/// An oriented part of the envelope, with its own incident irradiance series
#[derive(Clone, Debug)]
pub struct ExposedSurface {
    pub window_area: f64,
    pub u_window: f64,
    pub opaque_area: f64,
    pub u_opaque: f64,
    pub absorptance: f64,
    pub sky_form_factor: f64,
    pub irradiance: Vec<f64>,
}

impl ExposedSurface {
    /// Solar gain through the surface in W for an incident irradiance in W/m2
    pub fn solar_gain(&self, glazing: &GlazingProperties, irradiance: f64) -> f64 {
        let window = self.window_area
            * glazing.effective_g_value(irradiance)
            * (1. - glazing.frame_fraction)
            * irradiance;
        let opaque = self.absorptance * R_SE * self.u_opaque * self.opaque_area * irradiance;

        window + opaque
    }

    /// Extra heat flow in W from the surface to the sky, which is colder than the air
    pub fn sky_radiation_loss(&self, temp_ext: f64, temp_sky: f64) -> f64 {
        let h_r = radiative_heat_transfer_coefficient(temp_ext, temp_sky);
        let conductance = self.u_opaque * self.opaque_area + self.u_window * self.window_area;

        self.sky_form_factor * R_SE * conductance * h_r * (temp_ext - temp_sky)
    }
}

/// External radiative heat transfer coefficient, in W / (m2.K)
fn radiative_heat_transfer_coefficient(temp_ext: f64, temp_sky: f64) -> f64 {
    // arguments come from validated weather data, a failed conversion falls back to 0 degC
    let temp_mean_k = celsius_to_kelvin((temp_ext + temp_sky) / 2.).unwrap_or(273.15);
    4. * EMISSIVITY * STEFAN_BOLTZMANN * temp_mean_k.powi(3)
}

/// Net solar gain I_sol for one hour, in W
pub fn solar_gain(
    surfaces: &[ExposedSurface],
    glazing: &GlazingProperties,
    hour: usize,
    temp_ext: f64,
    temp_sky: f64,
) -> f64 {
    surfaces
        .iter()
        .map(|surface| {
            let irradiance = surface.irradiance.get(hour).copied().unwrap_or(0.);
            surface.solar_gain(glazing, irradiance) - surface.sky_radiation_loss(temp_ext, temp_sky)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn glazing() -> GlazingProperties {
        GlazingProperties {
            g_value: 0.6,
            frame_fraction: 0.2,
            shading_factor: ShadingDevice::ExteriorVenetianBlinds.reduction_factor(),
            shading_setpoint: SHADING_ACTIVATION_IRRADIANCE,
        }
    }

    #[fixture]
    pub fn surface() -> ExposedSurface {
        ExposedSurface {
            window_area: 10.,
            u_window: 1.2,
            opaque_area: 40.,
            u_opaque: 0.25,
            absorptance: 0.6,
            sky_form_factor: 0.5,
            irradiance: vec![0., 200., 300., 301.],
        }
    }

    #[rstest]
    #[case(299.9, 0.6)]
    #[case(300., 0.6)]
    #[case(300.1, 0.09)]
    fn should_step_g_value_at_threshold(
        glazing: GlazingProperties,
        #[case] irradiance: f64,
        #[case] expected: f64,
    ) {
        assert_relative_eq!(glazing.effective_g_value(irradiance), expected, max_relative = 1e-12);
    }

    #[rstest]
    fn should_map_shading_codes() {
        assert_eq!(ShadingDevice::from_code("t4"), Some(ShadingDevice::InteriorVenetianBlinds));
        assert_eq!(ShadingDevice::from_code("T9"), None);
        assert_eq!(ShadingDevice::Curtains.reduction_factor(), 0.1);
    }

    #[rstest]
    fn should_calculate_window_and_opaque_gains(
        surface: ExposedSurface,
        glazing: GlazingProperties,
    ) {
        // window 10 * 0.6 * 0.8 * 200 = 960, opaque 0.6 * 0.04 * 0.25 * 40 * 200 = 48
        assert_relative_eq!(surface.solar_gain(&glazing, 200.), 1008., max_relative = 1e-12);
        // shaded window 10 * 0.09 * 0.8 * 301 = 216.72, opaque 72.24
        assert_relative_eq!(surface.solar_gain(&glazing, 301.), 288.96, max_relative = 1e-12);
    }

    #[rstest]
    fn should_have_no_sky_loss_without_temperature_difference(surface: ExposedSurface) {
        assert_eq!(surface.sky_radiation_loss(5., 5.), 0.);
        assert!(surface.sky_radiation_loss(5., -6.) > 0.);
    }

    #[rstest]
    fn should_subtract_sky_radiation_from_solar_gain(
        surface: ExposedSurface,
        glazing: GlazingProperties,
    ) {
        let surfaces = vec![surface.clone()];
        let gain = solar_gain(&surfaces, &glazing, 1, 10., -1.);
        assert_relative_eq!(
            gain,
            1008. - surface.sky_radiation_loss(10., -1.),
            max_relative = 1e-12
        );
        assert!(solar_gain(&surfaces, &glazing, 0, 10., -1.) < 0.);
    }
}
