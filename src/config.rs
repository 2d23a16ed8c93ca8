//! Job configuration
//!
//! A job is configured from a single JSON document: classifier weights and
//! input standardization for the two scoring stages, each with a barrel and
//! an endcap model. Stages without a configured scorer fill their score
//! column with the sentinel, so an empty configuration is a valid job.

use crate::error::{NtupleError, NtupleResult};
use crate::scoring::{
    LinearClassifier, SeedMvaEstimator, SeedScorerPair, FEATURE_COUNT,
};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Input standardization of one classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSet {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl ScaleSet {
    fn to_arrays(&self) -> NtupleResult<([f64; FEATURE_COUNT], [f64; FEATURE_COUNT])> {
        let mean: [f64; FEATURE_COUNT] = self
            .mean
            .as_slice()
            .try_into()
            .map_err(|_| scale_len_error("mean", self.mean.len()))?;
        let std: [f64; FEATURE_COUNT] = self
            .std
            .as_slice()
            .try_into()
            .map_err(|_| scale_len_error("std", self.std.len()))?;
        Ok((mean, std))
    }
}

fn scale_len_error(which: &str, got: usize) -> NtupleError {
    NtupleError::Config(format!(
        "scale {which} must hold {FEATURE_COUNT} entries, got {got}"
    ))
}

/// One exported classifier with its standardization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub weights: Vec<f64>,
    pub bias: f64,
    pub scale: ScaleSet,
}

impl ClassifierConfig {
    fn build(&self, is_from_l1: bool) -> NtupleResult<SeedMvaEstimator> {
        if self.weights.len() != FEATURE_COUNT {
            return Err(NtupleError::Config(format!(
                "classifier must hold {FEATURE_COUNT} weights, got {}",
                self.weights.len()
            )));
        }
        let (mean, std) = self.scale.to_arrays()?;
        Ok(SeedMvaEstimator::new(
            Box::new(LinearClassifier {
                weights: self.weights.clone(),
                bias: self.bias,
            }),
            mean,
            std,
            is_from_l1,
        ))
    }
}

/// Barrel/endcap model pair for one scoring stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub barrel: ClassifierConfig,
    pub endcap: ClassifierConfig,
}

impl ScorerConfig {
    fn build(&self, is_from_l1: bool) -> NtupleResult<SeedScorerPair> {
        Ok(SeedScorerPair {
            barrel: self.barrel.build(is_from_l1)?,
            endcap: self.endcap.build(is_from_l1)?,
        })
    }
}

/// Top-level job configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Scorer for the L2-seeded second iteration
    #[serde(default)]
    pub iter2: Option<ScorerConfig>,
    /// Scorer for the L1-seeded second iteration
    #[serde(default)]
    pub iter2_from_l1: Option<ScorerConfig>,
}

impl JobConfig {
    pub fn from_path(path: &Path) -> NtupleResult<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Instantiate the configured scorers
    pub fn build_scorers(&self) -> NtupleResult<ScorerSet> {
        Ok(ScorerSet {
            iter2: self.iter2.as_ref().map(|c| c.build(false)).transpose()?,
            iter2_from_l1: self
                .iter2_from_l1
                .as_ref()
                .map(|c| c.build(true))
                .transpose()?,
        })
    }
}

/// The instantiated scorers of one job
#[derive(Debug, Default)]
pub struct ScorerSet {
    pub iter2: Option<SeedScorerPair>,
    pub iter2_from_l1: Option<SeedScorerPair>,
}

impl ScorerSet {
    /// Scorer for a stage, if it is a scoring stage with a configured model
    pub fn for_stage(&self, stage: Stage) -> Option<&SeedScorerPair> {
        match stage {
            Stage::Iter2 => self.iter2.as_ref(),
            Stage::Iter2FromL1 => self.iter2_from_l1.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier_json() -> serde_json::Value {
        serde_json::json!({
            "weights": [0.1, 0.2, 0.0, 0.0, 0.0, 0.0, 0.0],
            "bias": -0.5,
            "scale": {
                "mean": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                "std": [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]
            }
        })
    }

    #[test]
    fn test_empty_config_builds_no_scorers() {
        let cfg: JobConfig = serde_json::from_str("{}").unwrap();
        let scorers = cfg.build_scorers().unwrap();
        assert!(scorers.for_stage(Stage::Iter2).is_none());
        assert!(scorers.for_stage(Stage::Iter2FromL1).is_none());
    }

    #[test]
    fn test_configured_scorer_is_built() {
        let cfg: JobConfig = serde_json::from_value(serde_json::json!({
            "iter2": { "barrel": classifier_json(), "endcap": classifier_json() }
        }))
        .unwrap();
        let scorers = cfg.build_scorers().unwrap();
        assert!(scorers.for_stage(Stage::Iter2).is_some());
        // non-scoring stage never resolves a model
        assert!(scorers.for_stage(Stage::Iter0).is_none());
    }

    #[test]
    fn test_wrong_scale_width_rejected() {
        let mut bad = classifier_json();
        bad["scale"]["mean"] = serde_json::json!([0.0, 0.0]);
        let cfg: JobConfig = serde_json::from_value(serde_json::json!({
            "iter2": { "barrel": bad, "endcap": classifier_json() }
        }))
        .unwrap();
        assert!(matches!(
            cfg.build_scorers(),
            Err(NtupleError::Config(_))
        ));
    }
}
