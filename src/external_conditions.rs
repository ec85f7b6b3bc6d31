// Hourly outdoor conditions shared read-only by all buildings of a project.

use crate::errors::{ConfigurationError, MissingInputColumn};
use crate::input::ExternalConditionsInput;
use crate::read_weather_file::WeatherFileData;
use anyhow::bail;
use tracing::warn;

pub const DEFAULT_RELATIVE_HUMIDITY: f64 = 50.;
/// Mean depression of the sky temperature below the air temperature (ISO 13790 11.4.6), in K
pub const DEFAULT_SKY_TEMPERATURE_DEPRESSION: f64 = 11.;

#[derive(Clone, Debug, PartialEq)]
pub struct ExternalConditions {
    air_temperatures: Vec<f64>,
    relative_humidities: Vec<f64>,
    sky_temperatures: Vec<f64>,
    warnings: Vec<MissingInputColumn>,
}

impl ExternalConditions {
    /// Combine the series given inline in the input document with those of a weather file.
    /// Inline series take precedence; missing humidity and sky temperature are defaulted.
    pub fn new(
        inline: Option<&ExternalConditionsInput>,
        weather_file: Option<WeatherFileData>,
    ) -> anyhow::Result<Self> {
        let (file_air, file_humidity, file_sky) = match weather_file {
            Some(data) => (
                Some(data.air_temperatures),
                data.relative_humidities,
                data.sky_temperatures,
            ),
            None => (None, None, None),
        };
        let inline_air = inline.and_then(|i| i.air_temperatures.clone());
        let inline_humidity = inline.and_then(|i| i.relative_humidities.clone());
        let inline_sky = inline.and_then(|i| i.sky_temperatures.clone());

        let Some(air_temperatures) = inline_air.or(file_air) else {
            bail!("No air temperatures were given, either inline or through a weather file");
        };

        let mut warnings = vec![];
        let relative_humidities = inline_humidity.or(file_humidity).unwrap_or_else(|| {
            warnings.push(MissingInputColumn::new(
                "relative_humidities",
                DEFAULT_RELATIVE_HUMIDITY,
            ));
            vec![DEFAULT_RELATIVE_HUMIDITY; air_temperatures.len()]
        });
        let sky_temperatures = inline_sky.or(file_sky).unwrap_or_else(|| {
            warnings.push(MissingInputColumn::new(
                "sky_temperatures",
                format!("air temperature - {DEFAULT_SKY_TEMPERATURE_DEPRESSION} K"),
            ));
            air_temperatures
                .iter()
                .map(|temp| temp - DEFAULT_SKY_TEMPERATURE_DEPRESSION)
                .collect()
        });

        for warning in &warnings {
            warn!("{warning}");
        }

        let conditions = Self {
            air_temperatures,
            relative_humidities,
            sky_temperatures,
            warnings,
        };
        conditions.check_lengths()?;

        Ok(conditions)
    }

    fn check_lengths(&self) -> Result<(), ConfigurationError> {
        let expected = self.air_temperatures.len();
        for (name, series) in [
            ("relative_humidities", &self.relative_humidities),
            ("sky_temperatures", &self.sky_temperatures),
        ] {
            if series.len() != expected {
                return Err(ConfigurationError::SeriesLengthMismatch {
                    name: name.into(),
                    actual: series.len(),
                    expected,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.air_temperatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.air_temperatures.is_empty()
    }

    pub fn air_temp(&self, hour: usize) -> f64 {
        self.air_temperatures[hour]
    }

    pub fn relative_humidity(&self, hour: usize) -> f64 {
        self.relative_humidities[hour]
    }

    pub fn sky_temp(&self, hour: usize) -> f64 {
        self.sky_temperatures[hour]
    }

    pub fn warnings(&self) -> &[MissingInputColumn] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_prefer_inline_series() {
        let inline = ExternalConditionsInput {
            air_temperatures: Some(vec![1., 2.]),
            relative_humidities: Some(vec![60., 65.]),
            sky_temperatures: None,
        };
        let file = WeatherFileData {
            air_temperatures: vec![10., 11.],
            relative_humidities: Some(vec![40., 45.]),
            sky_temperatures: Some(vec![-5., -6.]),
        };
        let conditions = ExternalConditions::new(Some(&inline), Some(file)).unwrap();

        assert_eq!(
            (conditions.air_temp(0), conditions.air_temp(1)),
            (1., 2.)
        );
        assert_eq!(conditions.relative_humidity(1), 65.);
        assert_eq!(conditions.sky_temp(0), -5.);
        assert!(conditions.warnings().is_empty());
    }

    #[rstest]
    fn should_default_missing_columns_with_warnings() {
        let file = WeatherFileData {
            air_temperatures: vec![0., 5.],
            relative_humidities: None,
            sky_temperatures: None,
        };
        let conditions = ExternalConditions::new(None, Some(file)).unwrap();

        assert_eq!(conditions.relative_humidity(0), 50.);
        assert_eq!(conditions.sky_temp(1), -6.);
        assert_eq!(
            conditions
                .warnings()
                .iter()
                .map(|warning| warning.column.as_str())
                .collect::<Vec<_>>(),
            vec!["relative_humidities", "sky_temperatures"]
        );
    }

    #[rstest]
    fn should_require_air_temperatures() {
        assert!(ExternalConditions::new(Some(&Default::default()), None).is_err());
    }

    #[rstest]
    fn should_reject_inconsistent_series() {
        let inline = ExternalConditionsInput {
            air_temperatures: Some(vec![1., 2., 3.]),
            relative_humidities: Some(vec![60.]),
            sky_temperatures: None,
        };
        assert!(ExternalConditions::new(Some(&inline), None).is_err());
    }
}
