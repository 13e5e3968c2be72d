// Risk classification from numeric report/tracker scores
use estate_types::{EstateError, Result, RiskLevel};
use serde::{Deserialize, Serialize};

/// Scores at or below `max_score` map to `level`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub max_score: f64,
    pub level: RiskLevel,
}

/// Ordered threshold table. Call sites only ever ask [`RiskThresholds::classify`],
/// so the bands can be tuned from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub bands: Vec<RiskBand>,
    /// Level for scores above every band
    #[serde(default = "default_fallback")]
    pub fallback: RiskLevel,
}

fn default_fallback() -> RiskLevel {
    RiskLevel::Critical
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            bands: vec![
                RiskBand {
                    max_score: 3.0,
                    level: RiskLevel::Low,
                },
                RiskBand {
                    max_score: 6.0,
                    level: RiskLevel::Medium,
                },
                RiskBand {
                    max_score: 8.0,
                    level: RiskLevel::High,
                },
            ],
            fallback: RiskLevel::Critical,
        }
    }
}

impl RiskThresholds {
    pub fn new(bands: Vec<RiskBand>, fallback: RiskLevel) -> Result<Self> {
        let thresholds = Self { bands, fallback };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Bands must be finite and strictly ascending
    pub fn validate(&self) -> Result<()> {
        let mut previous: Option<f64> = None;
        for band in &self.bands {
            if !band.max_score.is_finite() {
                return Err(EstateError::Config(format!(
                    "risk band for {} has a non-finite bound",
                    band.level
                )));
            }
            if previous.is_some_and(|p| band.max_score <= p) {
                return Err(EstateError::Config(format!(
                    "risk bands must be strictly ascending (found {} after {})",
                    band.max_score,
                    previous.unwrap_or_default()
                )));
            }
            previous = Some(band.max_score);
        }
        Ok(())
    }

    /// A NaN score matches no band and falls through to the fallback
    pub fn classify(&self, score: f64) -> RiskLevel {
        self.bands
            .iter()
            .find(|band| score <= band.max_score)
            .map_or(self.fallback, |band| band.level)
    }
}
