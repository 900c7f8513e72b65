use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::Result,
    features::assemble,
    history::{HistoryView, SessionHistory},
    model::{FeatureVector, PollutantReading, TimestampSelection},
    predictor::{ModelBundle, predict_one},
};

/// Outcome of one successful prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub features: FeatureVector,
    pub predicted_pm2_5: f64,
    /// 1-based position in the session history.
    pub sequence: usize,
}

/// One user's interactive context: the shared model plus a private history.
///
/// History lives exactly as long as the session value.
#[derive(Debug)]
pub struct Session {
    model: Arc<ModelBundle>,
    history: SessionHistory,
}

impl Session {
    pub fn new(model: Arc<ModelBundle>) -> Self {
        Self { model, history: SessionHistory::new() }
    }

    pub fn model(&self) -> &ModelBundle {
        &self.model
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Validate, assemble, predict, then record. Nothing is recorded on error.
    pub fn predict(
        &mut self,
        reading: &PollutantReading,
        instant: &TimestampSelection,
    ) -> Result<Prediction> {
        reading.validate()?;

        let features = assemble(reading, instant, self.model.features_used())?;
        let predicted_pm2_5 = predict_one(self.model.predictor(), &features).inspect_err(|e| {
            warn!(error = %e, "prediction failed");
        })?;

        self.history.record(features.clone(), predicted_pm2_5);
        debug!(sequence = self.history.len(), "session prediction recorded");

        Ok(Prediction { features, predicted_pm2_5, sequence: self.history.len() })
    }

    pub fn render(&self) -> HistoryView {
        self.history.render()
    }

    pub fn export_csv(&self) -> Result<Vec<u8>> {
        self.history.export_csv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        features::produced_features,
        predictor::{Predictor, Regressor, tests::SumPredictor},
    };
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug)]
    struct FailingPredictor;

    /// Rejects the first row it sees, then sums rows like [`SumPredictor`].
    #[derive(Debug)]
    struct FirstCallFails(AtomicBool);

    impl Predictor for FirstCallFails {
        fn predict(&self, row: &[f64]) -> Result<f64> {
            if self.0.swap(false, Ordering::SeqCst) {
                return Err(Error::Prediction("shape mismatch".into()));
            }
            SumPredictor.predict(row)
        }
    }

    impl Predictor for FailingPredictor {
        fn predict(&self, _row: &[f64]) -> Result<f64> {
            Err(Error::Prediction("shape mismatch".into()))
        }
    }

    fn all_features() -> Vec<String> {
        produced_features().into_iter().map(String::from).collect()
    }

    fn friday() -> TimestampSelection {
        TimestampSelection::new(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        )
    }

    #[test]
    fn predictions_accumulate_in_order() {
        let mut session = Session::new(Arc::new(ModelBundle::new(SumPredictor, all_features())));

        let reading = PollutantReading {
            co: 1000.0,
            no: 10.0,
            no2: 20.0,
            o3: 50.0,
            so2: 20.0,
            pm10: 100.0,
            nh3: 10.0,
        };
        let first = session.predict(&reading, &friday()).unwrap();
        // 1210 pollutants + 3 + 15 + 14 + 4 + 0 calendar
        assert_eq!(first.predicted_pm2_5, 1246.0);
        assert_eq!(first.sequence, 1);

        let second =
            session.predict(&PollutantReading { co: 0.0, ..reading }, &friday()).unwrap();
        assert_eq!(second.sequence, 2);

        let view = session.render();
        assert_eq!(view.table.rows.len(), 2);
        assert_eq!(view.chart.points, vec![(1, 1246.0), (2, 246.0)]);
    }

    #[test]
    fn failed_prediction_is_not_recorded() {
        let mut session =
            Session::new(Arc::new(ModelBundle::new(FailingPredictor, all_features())));

        let err = session.predict(&PollutantReading::default(), &friday()).unwrap_err();
        assert!(!err.is_fatal());
        assert!(session.history().is_empty());
    }

    #[test]
    fn out_of_range_reading_is_not_recorded() {
        let mut session = Session::new(Arc::new(ModelBundle::new(SumPredictor, all_features())));
        let reading = PollutantReading { pm10: 5000.0, ..PollutantReading::default() };

        let err = session.predict(&reading, &friday()).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { pollutant: "pm10", .. }));
        assert!(session.history().is_empty());
    }

    #[test]
    fn schema_mismatch_is_fatal() {
        let features = vec!["co".to_string(), "wind_speed".to_string()];
        let mut session = Session::new(Arc::new(ModelBundle::new(SumPredictor, features)));

        let err = session.predict(&PollutantReading::default(), &friday()).unwrap_err();
        assert!(err.is_fatal());
        assert!(session.history().is_empty());
    }

    #[test]
    fn shape_mismatch_keeps_session_usable() {
        let model = Regressor::Linear { intercept: 0.0, coefficients: vec![1.0; 3] };
        let mut session = Session::new(Arc::new(ModelBundle::new(model, all_features())));

        assert!(session.predict(&PollutantReading::default(), &friday()).is_err());
        assert!(session.history().is_empty());
        assert!(session.export_csv().is_ok());

        let recovering = FirstCallFails(AtomicBool::new(true));
        let mut session = Session::new(Arc::new(ModelBundle::new(recovering, all_features())));

        let err = session.predict(&PollutantReading::default(), &friday()).unwrap_err();
        assert!(!err.is_fatal());

        let next = session.predict(&PollutantReading::default(), &friday()).unwrap();
        assert_eq!(next.sequence, 1);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.render().chart.points, vec![(1, next.predicted_pm2_5)]);
    }
}
