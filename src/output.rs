use crate::annual_summary::Carrier;
use crate::core::units::hourly_watts_to_kwh;
use crate::corpus::{BuildingResults, HourlyRecord};
use crate::simulation_time::SimulationTimeIteration;
use anyhow::anyhow;
use csv::WriterBuilder;
use formatx::formatx;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tracing::debug;

pub const TOTAL_DEMAND_KEY: &str = "Total_demand";

pub trait Output: Debug {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        let file_name = formatx!(&self.file_template, location_key)
            .map_err(|e| anyhow!("Invalid output file template: {e:?}"))?;
        Ok(BufWriter::new(File::create(
            self.directory_path.join(file_name),
        )?))
    }
}

impl Output for &FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        <FileOutput as Output>::writer_for_location_key(self, location_key)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

// cooling loads are written as positive magnitudes
const HOURLY_HEADINGS: [&str; 50] = [
    "DATE",
    "Name",
    "Ta_C",
    "Ts_C",
    "Tm_C",
    "Top_C",
    "uncomfort",
    "I_sol_kWh",
    "I_int_sen_kWh",
    "Qhs_sen_kWh",
    "Qcs_sen_kWh",
    "Qhs_em_ls_kWh",
    "Qcs_em_ls_kWh",
    "Qhs_dis_ls_kWh",
    "Qcs_dis_ls_kWh",
    "Qhs_lat_kWh",
    "Qcs_lat_kWh",
    "Qhs_kWh",
    "Qhsf_kWh",
    "Qcs_kWh",
    "Qcsf_kWh",
    "Tshs_C",
    "Trhs_C",
    "mcphs_kWC",
    "Tscs_C",
    "Trcs_C",
    "mcpcs_kWC",
    "Qww_kWh",
    "Qww_ls_r_kWh",
    "Qww_ls_nr_kWh",
    "Qww_tankloss_kWh",
    "Qwwf_kWh",
    "Tww_tank_C",
    "mww_kgs",
    "w_int_kgs",
    "Ealf_kWh",
    "Eauxf_kWh",
    "Eauxf_hs_kWh",
    "Eauxf_cs_kWh",
    "Eauxf_ww_kWh",
    "Eauxf_ve_kWh",
    "Eauxf_fw_kWh",
    "Epro_kWh",
    "Edataf_kWh",
    "Qcdataf_kWh",
    "Qcref_kWh",
    "Ef_kWh",
    "QHf_kWh",
    "QCf_kWh",
    "solver_diverged",
];

// temperatures that do not apply to the hour are left empty
fn optional(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

fn flag(value: bool) -> String {
    u8::from(value).to_string()
}

fn hourly_row(name: &str, time: &SimulationTimeIteration, hour: &HourlyRecord) -> Vec<String> {
    let kwh = |power: f64| hourly_watts_to_kwh(power).to_string();
    // 0 - x so that idle hours stay at +0
    let cooling = |power: f64| kwh(0. - power);
    let water = &hour.hot_water;

    vec![
        time.formatted_time(),
        name.to_string(),
        hour.temp_air.to_string(),
        hour.temp_surface.to_string(),
        hour.temp_mass.to_string(),
        hour.temp_operative.to_string(),
        flag(hour.uncomfortable),
        kwh(hour.i_sol),
        kwh(hour.i_int_sen),
        kwh(hour.q_hs_sen),
        cooling(hour.q_cs_sen),
        kwh(hour.q_hs_em_ls),
        cooling(hour.q_cs_em_ls),
        kwh(hour.q_hs_dis_ls),
        cooling(hour.q_cs_dis_ls),
        kwh(hour.q_hs_lat),
        cooling(hour.q_cs_lat),
        kwh(hour.q_hs),
        kwh(hour.q_hsf),
        cooling(hour.q_cs),
        cooling(hour.q_csf),
        optional(hour.heating_point.temp_supply()),
        optional(hour.heating_point.temp_return()),
        hour.heating_point.capacity_flow().to_string(),
        optional(hour.cooling_point.temp_supply()),
        optional(hour.cooling_point.temp_return()),
        hour.cooling_point.capacity_flow().to_string(),
        kwh(water.demand),
        kwh(water.pipe_losses.recoverable),
        kwh(water.pipe_losses.non_recoverable),
        kwh(water.tank_loss),
        kwh(water.heater_output),
        optional(water.temp_tank),
        water.mass_flow.to_string(),
        hour.w_int.to_string(),
        kwh(hour.e_alf),
        kwh(hour.e_aux()),
        kwh(hour.e_aux_hs),
        kwh(hour.e_aux_cs),
        kwh(hour.e_aux_ww),
        kwh(hour.e_aux_ve),
        kwh(hour.e_aux_fw),
        kwh(hour.e_pro),
        kwh(hour.e_data),
        kwh(hour.q_cdata),
        kwh(hour.q_crefri),
        kwh(hour.e_f()),
        kwh(hour.q_hf()),
        kwh(hour.q_cf()),
        flag(hour.solver_diverged()),
    ]
}

/// Write the hourly table of one building under its own name
pub fn write_hourly_results(output: &impl Output, results: &BuildingResults) -> anyhow::Result<()> {
    debug!("writing hourly results of {}", results.name);
    let writer = output.writer_for_location_key(&results.name)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(HOURLY_HEADINGS)?;
    for (time, hour) in results.simulation_time.iter().zip(results.hours.iter()) {
        writer.write_record(hourly_row(&results.name, &time, hour))?;
    }
    writer.flush()?;

    Ok(())
}

fn summary_headings() -> Vec<String> {
    let mut headings = vec!["Name".to_string(), "Af_m2".to_string()];
    for carrier in Carrier::iter() {
        headings.push(format!("{carrier}_MWhyr"));
        headings.push(format!("{carrier}0_kW"));
        headings.push(format!("{carrier}0_DATE"));
    }
    headings.push("uncomfort_hours".to_string());
    headings
}

fn summary_row(results: &BuildingResults) -> Vec<String> {
    let mut row = vec![results.name.clone(), results.floor_area.to_string()];
    for carrier in Carrier::iter() {
        let summary = results.summary.carrier(carrier);
        let peak_date = summary
            .peak_hour
            .and_then(|hour| results.simulation_time.iter().nth(hour))
            .map(|time| time.formatted_time())
            .unwrap_or_default();
        row.push(summary.total.to_string());
        row.push(summary.peak.to_string());
        row.push(peak_date);
    }
    row.push(results.summary.uncomfortable_hours.to_string());
    row
}

/// Write the annual summary table with one row per building
pub fn write_total_demand(output: &impl Output, results: &[BuildingResults]) -> anyhow::Result<()> {
    debug!("writing annual summary of {} buildings", results.len());
    let writer = output.writer_for_location_key(TOTAL_DEMAND_KEY)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(summary_headings())?;
    for building in results {
        writer.write_record(summary_row(building))?;
    }
    writer.flush()?;

    Ok(())
}
