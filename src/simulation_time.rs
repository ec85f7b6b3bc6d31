use crate::core::units::HOURS_PER_YEAR;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Deserialize;

fn default_year() -> i32 {
    2005
}

fn default_total_hours() -> usize {
    HOURS_PER_YEAR
}

/// Hourly time axis of a simulation, starting at midnight on 1st January of `year`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SimulationTime {
    #[serde(default = "default_year")]
    year: i32,
    #[serde(default = "default_total_hours", rename = "hours")]
    total_hours: usize,
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self {
            year: default_year(),
            total_hours: default_total_hours(),
        }
    }
}

impl SimulationTime {
    pub fn new(year: i32, total_hours: usize) -> Self {
        Self { year, total_hours }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn total_steps(&self) -> usize {
        self.total_hours
    }

    /// Timestamp at the start of the first hour, or None if the year cannot be represented
    pub fn start(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, 1, 1).map(|date| date.and_time(NaiveTime::MIN))
    }

    pub fn iter(&self) -> SimulationTimeIterator {
        SimulationTimeIterator {
            current_index: 0,
            start: self.start(),
            total_hours: self.total_hours,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationTimeIteration {
    pub index: usize,
    pub time: Option<NaiveDateTime>,
}

impl SimulationTimeIteration {
    /// Timestamp formatted for output tables, e.g. "2005-01-01 13:00:00"
    pub fn formatted_time(&self) -> String {
        self.time
            .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| format!("hour {}", self.index))
    }
}

#[derive(Clone, Debug)]
pub struct SimulationTimeIterator {
    current_index: usize,
    start: Option<NaiveDateTime>,
    total_hours: usize,
}

impl Iterator for SimulationTimeIterator {
    type Item = SimulationTimeIteration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index >= self.total_hours {
            return None;
        }
        let index = self.current_index;
        self.current_index += 1;

        Some(SimulationTimeIteration {
            index,
            time: self
                .start
                .and_then(|start| start.checked_add_signed(TimeDelta::hours(index as i64))),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_hours.saturating_sub(self.current_index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SimulationTimeIterator {}
