use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between loading a model and exporting history.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "Model artifact not found at {} and no download URL is configured.\n\
         Hint: run `pm25 configure` or pass `--model-url`.",
        path.display()
    )]
    ModelMissing { path: PathBuf },

    #[error("Failed to download model from {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Model artifact checksum mismatch: expected {expected}, got {actual}")]
    Checksum { expected: String, actual: String },

    #[error("Failed to access model artifact {}", path.display())]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model artifact {}", path.display())]
    ModelCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Model expects feature '{feature}', which the feature assembler does not produce \
         (model and assembler are out of sync)"
    )]
    SchemaMismatch { feature: String },

    #[error("{pollutant} value {value} is outside the allowed range {min}..={max}")]
    OutOfRange {
        pollutant: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Export failed: {0}")]
    Export(String),
}

impl Error {
    /// Load failures and schema mismatches make the session unusable.
    /// Everything else is reported for the single action that caused it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ModelMissing { .. }
                | Error::Download { .. }
                | Error::Checksum { .. }
                | Error::ModelIo { .. }
                | Error::ModelCorrupt { .. }
                | Error::SchemaMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_schema_errors_are_fatal() {
        let missing = Error::ModelMissing { path: PathBuf::from("model.json") };
        assert!(missing.is_fatal());
        assert!(missing.to_string().contains("Hint: run `pm25 configure`"));

        let schema = Error::SchemaMismatch { feature: "humidity".into() };
        assert!(schema.is_fatal());
        assert!(schema.to_string().contains("'humidity'"));
    }

    #[test]
    fn per_action_errors_are_not_fatal() {
        assert!(!Error::Prediction("shape".into()).is_fatal());
        assert!(!Error::Export("disk full".into()).is_fatal());
        assert!(
            !Error::OutOfRange { pollutant: "co", value: -1.0, min: 0.0, max: 1.0 }.is_fatal()
        );
    }
}
