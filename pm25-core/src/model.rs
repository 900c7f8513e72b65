use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::{convert::TryFrom, fmt};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pollutant {
    Co,
    No,
    No2,
    O3,
    So2,
    Pm10,
    Nh3,
}

/// Inclusive bounds plus the value offered before the user touches the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollutantRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl PollutantRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Pollutant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Co => "co",
            Pollutant::No => "no",
            Pollutant::No2 => "no2",
            Pollutant::O3 => "o3",
            Pollutant::So2 => "so2",
            Pollutant::Pm10 => "pm10",
            Pollutant::Nh3 => "nh3",
        }
    }

    /// Human label, used by prompts and tables.
    pub fn label(&self) -> &'static str {
        match self {
            Pollutant::Co => "CO",
            Pollutant::No => "NO",
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
            Pollutant::So2 => "SO2",
            Pollutant::Pm10 => "PM10",
            Pollutant::Nh3 => "NH3",
        }
    }

    pub fn range(&self) -> PollutantRange {
        let (min, max, default) = match self {
            Pollutant::Co => (0.0, 20000.0, 1000.0),
            Pollutant::No => (0.0, 500.0, 10.0),
            Pollutant::No2 => (0.0, 500.0, 20.0),
            Pollutant::O3 => (0.0, 800.0, 50.0),
            Pollutant::So2 => (0.0, 1000.0, 20.0),
            Pollutant::Pm10 => (0.0, 1000.0, 100.0),
            Pollutant::Nh3 => (0.0, 500.0, 10.0),
        };
        PollutantRange { min, max, default }
    }

    pub const fn all() -> &'static [Pollutant] {
        &[
            Pollutant::Co,
            Pollutant::No,
            Pollutant::No2,
            Pollutant::O3,
            Pollutant::So2,
            Pollutant::Pm10,
            Pollutant::Nh3,
        ]
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Pollutant {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        Pollutant::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown pollutant '{value}'. Supported pollutants: co, no, no2, o3, so2, pm10, nh3."
                )
            })
    }
}

/// One set of user-supplied concentrations (µg/m³).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollutantReading {
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm10: f64,
    pub nh3: f64,
}

impl Default for PollutantReading {
    fn default() -> Self {
        Self {
            co: Pollutant::Co.range().default,
            no: Pollutant::No.range().default,
            no2: Pollutant::No2.range().default,
            o3: Pollutant::O3.range().default,
            so2: Pollutant::So2.range().default,
            pm10: Pollutant::Pm10.range().default,
            nh3: Pollutant::Nh3.range().default,
        }
    }
}

impl PollutantReading {
    pub fn get(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Co => self.co,
            Pollutant::No => self.no,
            Pollutant::No2 => self.no2,
            Pollutant::O3 => self.o3,
            Pollutant::So2 => self.so2,
            Pollutant::Pm10 => self.pm10,
            Pollutant::Nh3 => self.nh3,
        }
    }

    pub fn set(&mut self, pollutant: Pollutant, value: f64) {
        let slot = match pollutant {
            Pollutant::Co => &mut self.co,
            Pollutant::No => &mut self.no,
            Pollutant::No2 => &mut self.no2,
            Pollutant::O3 => &mut self.o3,
            Pollutant::So2 => &mut self.so2,
            Pollutant::Pm10 => &mut self.pm10,
            Pollutant::Nh3 => &mut self.nh3,
        };
        *slot = value;
    }

    /// Reject NaN and values outside each pollutant's range.
    pub fn validate(&self) -> Result<()> {
        for &pollutant in Pollutant::all() {
            let value = self.get(pollutant);
            let range = pollutant.range();
            if !range.contains(value) {
                return Err(Error::OutOfRange {
                    pollutant: pollutant.as_str(),
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

/// A user-chosen date and time of day, combined into one local instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampSelection {
    pub instant: NaiveDateTime,
}

impl TimestampSelection {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { instant: date.and_time(time) }
    }

    pub fn month(&self) -> u32 {
        self.instant.month()
    }

    pub fn day(&self) -> u32 {
        self.instant.day()
    }

    pub fn hour(&self) -> u32 {
        self.instant.hour()
    }

    /// 0 = Monday .. 6 = Sunday.
    pub fn day_of_week(&self) -> u32 {
        self.instant.weekday().num_days_from_monday()
    }

    pub fn is_weekend(&self) -> bool {
        self.day_of_week() >= 5
    }
}

impl From<NaiveDateTime> for TimestampSelection {
    fn from(instant: NaiveDateTime) -> Self {
        Self { instant }
    }
}

/// Named inputs in exactly the order the model was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(String, f64)>,
}

impl FeatureVector {
    pub(crate) fn from_entries(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, value)| *value).collect()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

/// One recorded prediction: the exact inputs plus the model's estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub features: FeatureVector,
    pub predicted_pm2_5: f64,
}
