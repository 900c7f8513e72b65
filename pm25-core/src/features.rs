use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    model::{FeatureVector, Pollutant, PollutantReading, TimestampSelection},
};

pub const MONTH: &str = "month";
pub const DAY: &str = "day";
pub const HOUR: &str = "hour";
pub const DAY_OF_WEEK: &str = "dayofweek";
pub const IS_WEEKEND: &str = "is_weekend";

/// Every feature name the assembler can produce, pollutants first.
pub fn produced_features() -> Vec<&'static str> {
    Pollutant::all()
        .iter()
        .map(Pollutant::as_str)
        .chain([MONTH, DAY, HOUR, DAY_OF_WEEK, IS_WEEKEND])
        .collect()
}

/// Build the model input for one reading at one instant.
///
/// The result has exactly the names in `features_used`, in that order. A name
/// the assembler does not produce is a [`Error::SchemaMismatch`]; nothing is
/// defaulted.
pub fn assemble(
    reading: &PollutantReading,
    instant: &TimestampSelection,
    features_used: &[String],
) -> Result<FeatureVector> {
    let mut merged: HashMap<&str, f64> = Pollutant::all()
        .iter()
        .map(|p| (p.as_str(), reading.get(*p)))
        .collect();

    merged.insert(MONTH, f64::from(instant.month()));
    merged.insert(DAY, f64::from(instant.day()));
    merged.insert(HOUR, f64::from(instant.hour()));
    merged.insert(DAY_OF_WEEK, f64::from(instant.day_of_week()));
    merged.insert(IS_WEEKEND, if instant.is_weekend() { 1.0 } else { 0.0 });

    let entries = features_used
        .iter()
        .map(|name| {
            merged
                .get(name.as_str())
                .map(|value| (name.clone(), *value))
                .ok_or_else(|| Error::SchemaMismatch { feature: name.clone() })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureVector::from_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn scenario_reading() -> PollutantReading {
        PollutantReading {
            co: 1000.0,
            no: 10.0,
            no2: 20.0,
            o3: 50.0,
            so2: 20.0,
            pm10: 100.0,
            nh3: 10.0,
        }
    }

    fn friday_afternoon() -> TimestampSelection {
        TimestampSelection::new(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        )
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn follows_features_used_order_exactly() {
        let order = names(&[
            "is_weekend", "hour", "pm10", "co", "dayofweek", "nh3", "month", "no", "so2", "day",
            "o3", "no2",
        ]);
        let vector = assemble(&scenario_reading(), &friday_afternoon(), &order).unwrap();

        let got: Vec<&str> = vector.names().collect();
        let want: Vec<&str> = order.iter().map(String::as_str).collect();
        assert_eq!(got, want);
        assert_eq!(vector.len(), 12);
    }

    #[test]
    fn scenario_friday_afternoon() {
        let order: Vec<String> = produced_features().into_iter().map(String::from).collect();
        let vector = assemble(&scenario_reading(), &friday_afternoon(), &order).unwrap();

        assert_eq!(
            vector.values(),
            vec![1000.0, 10.0, 20.0, 50.0, 20.0, 100.0, 10.0, 3.0, 15.0, 14.0, 4.0, 0.0]
        );
        assert_eq!(vector.get("is_weekend"), Some(0.0));
        assert_eq!(vector.get("dayofweek"), Some(4.0));
    }

    #[test]
    fn weekend_flag_in_vector() {
        let order = names(&["is_weekend"]);
        let saturday = TimestampSelection::new(
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        );
        let monday = TimestampSelection::new(
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        );
        let reading = PollutantReading::default();

        assert_eq!(assemble(&reading, &saturday, &order).unwrap().values(), vec![1.0]);
        assert_eq!(assemble(&reading, &monday, &order).unwrap().values(), vec![0.0]);
    }

    #[test]
    fn subset_drops_unused_fields() {
        let order = names(&["pm10", "hour"]);
        let vector = assemble(&scenario_reading(), &friday_afternoon(), &order).unwrap();
        assert_eq!(vector.values(), vec![100.0, 14.0]);
        assert_eq!(vector.get("co"), None);
    }

    #[test]
    fn unknown_feature_is_schema_mismatch() {
        let order = names(&["co", "temperature"]);
        let err = assemble(&scenario_reading(), &friday_afternoon(), &order).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { ref feature } if feature == "temperature"));
        assert!(err.is_fatal());
    }
}
