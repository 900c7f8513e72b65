use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::{Error, Result},
    model::FeatureVector,
};

/// A trained regression model evaluated on one row at a time.
pub trait Predictor: Send + Sync + Debug {
    fn predict(&self, row: &[f64]) -> Result<f64>;
}

/// The predictor kinds a model artifact can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    /// Mean of the tree outputs.
    Forest { trees: Vec<RegressionTree> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go `left` when `row[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

impl RegressionTree {
    fn evaluate(&self, row: &[f64]) -> Result<f64> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(index).ok_or_else(|| {
                Error::Prediction(format!("tree references missing node {index}"))
            })?;
            match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split { feature, threshold, left, right } => {
                    let x = row.get(*feature).ok_or_else(|| {
                        Error::Prediction(format!(
                            "tree splits on feature {feature} but the row has {} values",
                            row.len()
                        ))
                    })?;
                    index = if *x <= *threshold { *left } else { *right };
                }
            }
        }
        Err(Error::Prediction("tree does not terminate in a leaf".to_string()))
    }
}

impl Predictor for Regressor {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        match self {
            Regressor::Linear { intercept, coefficients } => {
                if coefficients.len() != row.len() {
                    return Err(Error::Prediction(format!(
                        "linear model expects {} features, got {}",
                        coefficients.len(),
                        row.len()
                    )));
                }
                Ok(intercept + coefficients.iter().zip(row).map(|(c, x)| c * x).sum::<f64>())
            }
            Regressor::Forest { trees } => {
                if trees.is_empty() {
                    return Err(Error::Prediction("forest has no trees".to_string()));
                }
                let total = trees
                    .iter()
                    .map(|tree| tree.evaluate(row))
                    .sum::<Result<f64>>()?;
                Ok(total / trees.len() as f64)
            }
        }
    }
}

/// A loaded predictor together with the column order it was trained on.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    predictor: Arc<dyn Predictor>,
    features_used: Vec<String>,
}

impl ModelBundle {
    pub fn new(predictor: impl Predictor + 'static, features_used: Vec<String>) -> Self {
        Self { predictor: Arc::new(predictor), features_used }
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    pub fn features_used(&self) -> &[String] {
        &self.features_used
    }
}

/// On-disk shape of a model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub predictor: Regressor,
    pub features_used: Vec<String>,
}

impl From<ModelArtifact> for ModelBundle {
    fn from(artifact: ModelArtifact) -> Self {
        ModelBundle::new(artifact.predictor, artifact.features_used)
    }
}

/// Run the model once on an assembled vector. No retries.
pub fn predict_one(model: &dyn Predictor, vector: &FeatureVector) -> Result<f64> {
    let value = model.predict(&vector.values())?;
    if !value.is_finite() {
        return Err(Error::Prediction(format!("model returned a non-finite value ({value})")));
    }
    Ok(value)
}
