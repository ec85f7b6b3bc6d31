// Reduction of the hourly series of a building into annual totals and peaks.

use crate::core::units::{WATTS_PER_KILOWATT, WATT_HOURS_PER_MEGAWATT_HOUR};
use indexmap::IndexMap;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Hourly energy series that are summarised for each building. Cooling carriers are
/// summarised as positive magnitudes.
#[derive(Clone, Copy, Debug, Display, EnumIter, Eq, Hash, PartialEq)]
pub enum Carrier {
    Qhs,
    Qhsf,
    Qcs,
    Qcsf,
    Qww,
    Qwwf,
    Ealf,
    Eauxf,
    Eprof,
    Edataf,
    Qcdataf,
    Qcref,
    Ef,
    QHf,
    QCf,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CarrierSummary {
    /// Annual total, in MWh
    pub total: f64,
    /// Value in the hour of largest magnitude, in kW
    pub peak: f64,
    /// First hour in which the peak occurs, None for an all-zero series
    pub peak_hour: Option<usize>,
}

impl CarrierSummary {
    /// Arguments:
    /// * `hourly` - hourly mean power, in W
    pub fn from_hourly(hourly: &[f64]) -> Self {
        let total = hourly.iter().sum::<f64>() / WATT_HOURS_PER_MEGAWATT_HOUR as f64;

        let peak = hourly
            .iter()
            .enumerate()
            .fold(None, |peak: Option<(usize, f64)>, (hour, &value)| match peak {
                Some((_, peak_value)) if value.abs() <= peak_value.abs() => peak,
                _ if value == 0. => peak,
                _ => Some((hour, value)),
            });

        Self {
            total,
            peak: peak.map_or(0., |(_, value)| value / WATTS_PER_KILOWATT as f64),
            peak_hour: peak.map(|(hour, _)| hour),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnualSummary {
    pub carriers: IndexMap<Carrier, CarrierSummary>,
    pub uncomfortable_hours: usize,
}

impl AnnualSummary {
    /// Arguments:
    /// * `hourly` - hourly series per carrier, in W. Carriers that are absent are summarised
    ///              as all-zero.
    /// * `uncomfortable` - hourly discomfort flags
    pub fn new(hourly: &IndexMap<Carrier, Vec<f64>>, uncomfortable: &[bool]) -> Self {
        let carriers = Carrier::iter()
            .map(|carrier| {
                let summary = hourly
                    .get(&carrier)
                    .map(|series| CarrierSummary::from_hourly(series))
                    .unwrap_or_default();
                (carrier, summary)
            })
            .collect();

        Self {
            carriers,
            uncomfortable_hours: uncomfortable.iter().filter(|flag| **flag).count(),
        }
    }

    pub fn carrier(&self, carrier: Carrier) -> CarrierSummary {
        self.carriers.get(&carrier).copied().unwrap_or_default()
    }
}
