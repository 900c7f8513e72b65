use chrono::{Local, NaiveTime, Weekday};
use inquire::{
    CustomType, DateSelect, InquireError, Select, Text, error::InquireResult,
    validator::Validation,
};
use pm25_core::{
    Config, Pollutant, PollutantReading, TimestampSelection, config::DEFAULT_DOWNLOAD_TIMEOUT_SECS,
};
use std::{fmt, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Predict,
    History,
    ExportCsv,
    SaveChart,
    Quit,
}

impl MenuAction {
    pub const fn all() -> &'static [MenuAction] {
        &[
            MenuAction::Predict,
            MenuAction::History,
            MenuAction::ExportCsv,
            MenuAction::SaveChart,
            MenuAction::Quit,
        ]
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuAction::Predict => "Predict PM2.5",
            MenuAction::History => "Show history",
            MenuAction::ExportCsv => "Export history as CSV",
            MenuAction::SaveChart => "Save trend chart (SVG)",
            MenuAction::Quit => "Quit",
        })
    }
}

pub fn menu() -> InquireResult<MenuAction> {
    Select::new("What next?", MenuAction::all().to_vec()).prompt()
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("'{raw}' is not a valid time, expected HH:MM"))
}

/// Bounded input for one pollutant, pre-filled with `current`.
fn pollutant_value(pollutant: Pollutant, current: f64) -> InquireResult<f64> {
    let range = pollutant.range();
    let message = format!("{} (µg/m³):", pollutant.label());
    let help = format!("{} to {}", range.min, range.max);

    CustomType::<f64>::new(&message)
        .with_default(current)
        .with_help_message(&help)
        .with_error_message("Please type a number")
        .with_validator(move |value: &f64| {
            if range.contains(*value) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    format!("Must be between {} and {}", range.min, range.max).into(),
                ))
            }
        })
        .prompt()
}

/// Ask for all seven pollutants, starting from the previous answers.
pub fn reading(previous: &PollutantReading) -> InquireResult<PollutantReading> {
    let mut reading = *previous;
    for &pollutant in Pollutant::all() {
        let value = pollutant_value(pollutant, previous.get(pollutant))?;
        reading.set(pollutant, value);
    }
    Ok(reading)
}

/// Date picker defaulting to today, time input defaulting to now.
pub fn timestamp() -> InquireResult<TimestampSelection> {
    let now = Local::now().naive_local();

    let date = DateSelect::new("Date:")
        .with_default(now.date())
        .with_week_start(Weekday::Mon)
        .prompt()?;

    let default_time = now.format("%H:%M").to_string();
    let raw = Text::new("Time (HH:MM):")
        .with_default(&default_time)
        .with_validator(|input: &str| {
            Ok(match parse_time(input) {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.into()),
            })
        })
        .prompt()?;
    let time = parse_time(&raw).map_err(|e| InquireError::Custom(e.into()))?;

    Ok(TimestampSelection::new(date, time))
}

fn optional(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Edit the model section of `config` in place.
pub fn configure(config: &mut Config) -> InquireResult<()> {
    let default_path = config
        .model
        .path
        .clone()
        .or_else(|| Config::default_model_path().ok())
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let path = Text::new("Model artifact path:")
        .with_default(&default_path)
        .prompt()?;
    config.model.path = optional(path).map(PathBuf::from);

    let url = Text::new("Download URL (empty for none):")
        .with_initial_value(config.model.url.as_deref().unwrap_or(""))
        .prompt()?;
    config.model.url = optional(url);

    let sha256 = Text::new("SHA-256 of the artifact (empty to skip verification):")
        .with_initial_value(config.model.sha256.as_deref().unwrap_or(""))
        .prompt()?;
    config.model.sha256 = optional(sha256);

    let timeout = CustomType::<u64>::new("Download timeout (seconds):")
        .with_default(config.model.download_timeout_secs.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS))
        .with_error_message("Please type a whole number of seconds")
        .prompt()?;
    config.model.download_timeout_secs = Some(timeout);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_times() {
        assert_eq!(parse_time("14:30").unwrap(), NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert_eq!(parse_time(" 07:05:09 ").unwrap(), NaiveTime::from_hms_opt(7, 5, 9).unwrap());
    }

    #[test]
    fn rejects_nonsense_times() {
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("noon").unwrap_err().contains("expected HH:MM"));
    }

    #[test]
    fn empty_answers_become_none() {
        assert_eq!(optional("   ".into()), None);
        assert_eq!(optional(" https://x ".into()), Some("https://x".to_string()));
    }

    #[test]
    fn menu_lists_every_action_once() {
        let labels: Vec<String> = MenuAction::all().iter().map(|a| a.to_string()).collect();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels.last().map(String::as_str), Some("Quit"));
    }
}
