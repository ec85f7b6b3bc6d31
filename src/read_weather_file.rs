use crate::core::units::{kelvin_to_celsius, STEFAN_BOLTZMANN};
use anyhow::{anyhow, Context};
use csv::ReaderBuilder as CsvReaderBuilder;
use std::io::Read;

const COLUMN_AIR_TEMP: usize = 6; // dry bulb temp in degrees
const COLUMN_RELATIVE_HUMIDITY: usize = 8; // in percent
const COLUMN_HORIZONTAL_INFRARED: usize = 12; // horizontal infrared radiation intensity in Wh/m2
const FIRST_DATA_ROW: usize = 8;
// EPW markers for values that were not measured
const MISSING_RELATIVE_HUMIDITY: f64 = 999.;
const MISSING_HORIZONTAL_INFRARED: f64 = 9999.;

/// Hourly series read from an EPW weather file. A column is None when any of its hours is
/// marked as missing in the file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeatherFileData {
    pub air_temperatures: Vec<f64>,
    pub relative_humidities: Option<Vec<f64>>,
    pub sky_temperatures: Option<Vec<f64>>,
}

fn parse_field(record: &csv::StringRecord, column: usize, row: usize) -> anyhow::Result<f64> {
    record
        .get(column)
        .ok_or_else(|| anyhow!("Weather file row {row} has no column {column}"))?
        .trim()
        .parse()
        .with_context(|| format!("Could not parse column {column} of weather file row {row}"))
}

/// Sky temperature from the horizontal infrared radiation, in deg C
pub fn sky_temperature(horizontal_infrared: f64) -> anyhow::Result<f64> {
    Ok(kelvin_to_celsius(
        (horizontal_infrared / STEFAN_BOLTZMANN).powf(0.25),
    )?)
}

pub fn weather_data_to_vec(file: impl Read) -> anyhow::Result<WeatherFileData> {
    let mut reader = CsvReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(file);

    let mut air_temperatures = vec![];
    let mut relative_humidities = Some(vec![]);
    let mut sky_temperatures = Some(vec![]);

    for (i, result) in reader.records().enumerate().skip(FIRST_DATA_ROW) {
        let record = result?;
        air_temperatures.push(parse_field(&record, COLUMN_AIR_TEMP, i)?);

        let relative_humidity = parse_field(&record, COLUMN_RELATIVE_HUMIDITY, i)?;
        if relative_humidity >= MISSING_RELATIVE_HUMIDITY {
            relative_humidities = None;
        } else if let Some(series) = relative_humidities.as_mut() {
            series.push(relative_humidity);
        }

        let infrared = parse_field(&record, COLUMN_HORIZONTAL_INFRARED, i)?;
        if infrared >= MISSING_HORIZONTAL_INFRARED {
            sky_temperatures = None;
        } else if let Some(series) = sky_temperatures.as_mut() {
            series.push(sky_temperature(infrared)?);
        }
    }

    if air_temperatures.is_empty() {
        return Err(anyhow!("Weather file contains no hourly data"));
    }

    Ok(WeatherFileData {
        air_temperatures,
        relative_humidities,
        sky_temperatures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const HEADER: &str = "LOCATION,Zurich,ZH,CHE,IWEC,066600,47.38,8.57,1.0,556.0
DESIGN CONDITIONS,0
TYPICAL/EXTREME PERIODS,0
GROUND TEMPERATURES,0
HOLIDAYS/DAYLIGHT SAVINGS,No,0,0,0
COMMENTS 1,
COMMENTS 2,
DATA PERIODS,1,1,Data,Sunday,1/1,12/31
";

    fn epw(rows: &[(f64, f64, f64)]) -> String {
        let mut contents = HEADER.to_string();
        for (hour, (temp, rh, ir)) in rows.iter().enumerate() {
            contents.push_str(&format!(
                "2005,1,1,{},60,?,{temp},-3.0,{rh},96500,0,0,{ir},0,0,0\n",
                hour + 1
            ));
        }
        contents
    }

    #[rstest]
    fn should_read_hourly_columns() {
        let contents = epw(&[(-1.5, 80., 280.), (-2.0, 85., 300.)]);
        let weather = weather_data_to_vec(contents.as_bytes()).unwrap();

        assert_eq!(weather.air_temperatures, vec![-1.5, -2.0]);
        assert_eq!(weather.relative_humidities, Some(vec![80., 85.]));
        let sky = weather.sky_temperatures.unwrap();
        assert_relative_eq!(
            sky[0],
            (280. / STEFAN_BOLTZMANN).powf(0.25) - 273.15,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_drop_columns_with_missing_values() {
        let contents = epw(&[(5., 999., 9999.), (6., 70., 310.)]);
        let weather = weather_data_to_vec(contents.as_bytes()).unwrap();

        assert_eq!(weather.air_temperatures.len(), 2);
        assert_eq!(weather.relative_humidities, None);
        assert_eq!(weather.sky_temperatures, None);
    }

    #[rstest]
    fn should_reject_file_without_data() {
        assert!(weather_data_to_vec(HEADER.as_bytes()).is_err());
    }

    #[rstest]
    fn should_reject_unparseable_temperature() {
        let contents = epw(&[(5., 70., 300.)]).replace(",5,", ",warm,");
        assert!(weather_data_to_vec(contents.as_bytes()).is_err());
    }
}
