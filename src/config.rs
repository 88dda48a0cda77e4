use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskRule {
    Outlier,
    HarshGrader,
    LenientGrader,
    NearBoundary,
    VeryLowScore,
}

/// Points each rule adds to a risk score, and the ceiling for the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskWeights {
    pub outlier: u32,
    pub harsh_grader: u32,
    pub lenient_grader: u32,
    pub near_boundary: u32,
    pub very_low_score: u32,
    pub cap: u32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            outlier: 30,
            harsh_grader: 25,
            lenient_grader: 15,
            near_boundary: 30,
            very_low_score: 20,
            cap: 100,
        }
    }
}

impl RiskWeights {
    pub fn weight(&self, rule: RiskRule) -> u32 {
        match rule {
            RiskRule::Outlier => self.outlier,
            RiskRule::HarshGrader => self.harsh_grader,
            RiskRule::LenientGrader => self.lenient_grader,
            RiskRule::NearBoundary => self.near_boundary,
            RiskRule::VeryLowScore => self.very_low_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Grader mean distance from the cohort mean, in cohort deviations.
    pub severity_threshold: f64,
    pub outlier_threshold: f64,
    pub criterion_cv_threshold: f64,
    pub criterion_min_samples: usize,
    pub criterion_z_threshold: f64,
    /// Grade boundaries checked lowest first.
    pub boundaries: Vec<f64>,
    pub boundary_window: f64,
    pub very_low_score: f64,
    pub min_grades: usize,
    pub weights: RiskWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            severity_threshold: 1.5,
            outlier_threshold: 2.0,
            criterion_cv_threshold: 0.3,
            criterion_min_samples: 3,
            criterion_z_threshold: 1.5,
            boundaries: vec![60.0, 70.0, 80.0, 90.0],
            boundary_window: 2.0,
            very_low_score: 50.0,
            min_grades: 5,
            weights: RiskWeights::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(raw: &str) -> AnalysisResult<Self> {
        let config: AnalysisConfig =
            toml::from_str(raw).map_err(|err| AnalysisError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        let thresholds = [
            ("severity_threshold", self.severity_threshold),
            ("outlier_threshold", self.outlier_threshold),
            ("criterion_cv_threshold", self.criterion_cv_threshold),
            ("criterion_z_threshold", self.criterion_z_threshold),
            ("boundary_window", self.boundary_window),
            ("very_low_score", self.very_low_score),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.boundaries.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "boundaries must not be empty".to_string(),
            ));
        }
        if let Some(boundary) = self.boundaries.iter().find(|b| !b.is_finite()) {
            return Err(AnalysisError::InvalidConfig(format!(
                "boundaries must be finite numbers, got {boundary}"
            )));
        }
        if self.boundaries.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(AnalysisError::InvalidConfig(
                "boundaries must be strictly ascending".to_string(),
            ));
        }
        if self.weights.cap > 100 {
            return Err(AnalysisError::InvalidConfig(format!(
                "risk cap must be at most 100, got {}",
                self.weights.cap
            )));
        }

        Ok(())
    }
}
