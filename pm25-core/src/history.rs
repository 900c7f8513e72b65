//! Session-scoped record of predictions and the views built from it.

use tracing::debug;

use crate::{
    chart::ChartSpec,
    error::{Error, Result},
    model::{FeatureVector, HistoryEntry},
};

pub const PREDICTION_COLUMN: &str = "predicted_pm2_5";

/// Append-only list of predictions made during one session.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

/// Row-per-entry table, columns = feature names + [`PREDICTION_COLUMN`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub table: HistoryTable,
    pub chart: ChartSpec,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, features: FeatureVector, predicted_pm2_5: f64) {
        self.entries.push(HistoryEntry { features, predicted_pm2_5 });
        debug!(entries = self.entries.len(), predicted_pm2_5, "recorded prediction");
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn columns(&self) -> Vec<String> {
        let features = self
            .entries
            .first()
            .map(|e| e.features.names().map(String::from).collect::<Vec<_>>())
            .unwrap_or_default();
        features.into_iter().chain([PREDICTION_COLUMN.to_string()]).collect()
    }

    pub fn table(&self) -> HistoryTable {
        let rows = self
            .entries
            .iter()
            .map(|e| {
                let mut row = e.features.values();
                row.push(e.predicted_pm2_5);
                row
            })
            .collect();

        HistoryTable { columns: self.columns(), rows }
    }

    pub fn chart(&self) -> ChartSpec {
        let points = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i + 1, e.predicted_pm2_5))
            .collect();

        ChartSpec::prediction_trend(points)
    }

    /// Rebuilt from scratch on every call.
    pub fn render(&self) -> HistoryView {
        HistoryView { table: self.table(), chart: self.chart() }
    }

    /// UTF-8 CSV with a header row and no index column.
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        let table = self.table();
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record(&table.columns).map_err(|e| Error::Export(e.to_string()))?;
        for row in &table.rows {
            writer
                .write_record(row.iter().map(|v| v.to_string()))
                .map_err(|e| Error::Export(e.to_string()))?;
        }

        writer.into_inner().map_err(|e| Error::Export(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        features::assemble,
        model::{PollutantReading, TimestampSelection},
    };
    use chrono::{NaiveDate, NaiveTime};

    fn order() -> Vec<String> {
        ["co", "pm10", "hour", "is_weekend"].iter().map(|s| s.to_string()).collect()
    }

    fn vector(co: f64, hour: u32) -> FeatureVector {
        let reading = PollutantReading { co, ..PollutantReading::default() };
        let instant = TimestampSelection::new(
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        );
        assemble(&reading, &instant, &order()).unwrap()
    }

    #[test]
    fn render_keeps_call_order() {
        let mut history = SessionHistory::new();
        history.record(vector(100.0, 1), 12.5);
        history.record(vector(200.0, 2), 30.0);
        history.record(vector(300.0, 3), 7.25);

        let view = history.render();

        assert_eq!(view.table.columns, ["co", "pm10", "hour", "is_weekend", "predicted_pm2_5"]);
        assert_eq!(view.table.rows.len(), 3);
        assert_eq!(view.table.rows[0], vec![100.0, 100.0, 1.0, 1.0, 12.5]);
        assert_eq!(view.table.rows[2], vec![300.0, 100.0, 3.0, 1.0, 7.25]);

        assert_eq!(view.chart.points, vec![(1, 12.5), (2, 30.0), (3, 7.25)]);
    }

    #[test]
    fn empty_history_renders_empty_views() {
        let history = SessionHistory::new();
        let view = history.render();
        assert!(view.table.rows.is_empty());
        assert_eq!(view.table.columns, [PREDICTION_COLUMN]);
        assert!(view.chart.points.is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let mut history = SessionHistory::new();
        history.record(vector(100.0, 1), 12.5);
        history.record(vector(100.0, 1), 12.5);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut history = SessionHistory::new();
        history.record(vector(1000.0, 14), 55.5);
        history.record(vector(250.5, 9), 20.0);

        let csv = String::from_utf8(history.export_csv().unwrap()).unwrap();
        assert_eq!(
            csv,
            "co,pm10,hour,is_weekend,predicted_pm2_5\n\
             1000,100,14,1,55.5\n\
             250.5,100,9,1,20\n"
        );
    }

    #[test]
    fn csv_export_is_repeatable() {
        let mut history = SessionHistory::new();
        history.record(vector(1000.0, 14), 55.5);

        let first = history.export_csv().unwrap();
        let second = history.export_csv().unwrap();
        assert_eq!(first, second);

        history.record(vector(5.0, 2), 3.0);
        assert_ne!(first, history.export_csv().unwrap());
    }
}
