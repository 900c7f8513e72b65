//! Core library for the `pm25` predictor.
//!
//! This crate defines:
//! - Configuration & model artifact location
//! - Lazy, memoized model loading (local file or remote download)
//! - Feature assembly in the model's trained column order
//! - Per-session prediction history with table, chart and CSV views
//!
//! It is used by `pm25-cli`, but can also be reused by other front ends.

pub mod chart;
pub mod config;
pub mod error;
pub mod features;
pub mod history;
pub mod loader;
pub mod model;
pub mod predictor;
pub mod session;

pub use chart::ChartSpec;
pub use config::{Config, ModelConfig};
pub use error::{Error, Result};
pub use features::assemble;
pub use history::{HistoryTable, HistoryView, PREDICTION_COLUMN, SessionHistory};
pub use loader::{ModelLoader, ModelSource};
pub use model::{
    FeatureVector, HistoryEntry, Pollutant, PollutantRange, PollutantReading, TimestampSelection,
};
pub use predictor::{ModelArtifact, ModelBundle, Predictor, Regressor, predict_one};
pub use session::{Prediction, Session};
