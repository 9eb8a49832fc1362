//! Classification tiers and distance thresholds.

use crate::error::ClassifyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered proximity tier. `A` is closest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Sample lies inside a target region
    A,
    /// Within the buffer, or network distance up to the near threshold
    B,
    /// Network distance up to the moderate threshold
    C,
    /// Farther than the moderate threshold, or unreachable
    D,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier committed by the overlap tests that run before network analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlapTier {
    /// Direct containment
    #[serde(rename = "A")]
    Direct,
    /// Buffered containment
    #[serde(rename = "B")]
    Buffer,
}

impl From<OverlapTier> for Tier {
    fn from(value: OverlapTier) -> Self {
        match value {
            OverlapTier::Direct => Tier::A,
            OverlapTier::Buffer => Tier::B,
        }
    }
}

/// Network-distance thresholds, in coordinate units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRules {
    /// Upper bound (inclusive) for tier B
    pub near_threshold_m: f64,
    /// Upper bound (inclusive) for tier C
    pub moderate_threshold_m: f64,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            near_threshold_m: 100.0,
            moderate_threshold_m: 250.0,
        }
    }
}

impl ClassificationRules {
    pub fn validate(&self) -> Result<(), ClassifyError> {
        let near = self.near_threshold_m;
        let moderate = self.moderate_threshold_m;
        if !near.is_finite() || !moderate.is_finite() {
            return Err(ClassifyError::InvalidConfig(
                "thresholds must be finite".to_string(),
            ));
        }
        if near < 0.0 {
            return Err(ClassifyError::InvalidConfig(format!(
                "near threshold must be non-negative, got {near}"
            )));
        }
        if near > moderate {
            return Err(ClassifyError::InvalidConfig(format!(
                "near threshold {near} exceeds moderate threshold {moderate}"
            )));
        }
        Ok(())
    }

    /// Map a network distance onto a tier.
    ///
    /// Unreachable (`None`) lands in `D` together with far samples; callers
    /// that need to tell them apart check the length separately.
    pub fn classify(&self, length: Option<f64>) -> Tier {
        match length {
            Some(length) if length <= self.near_threshold_m => Tier::B,
            Some(length) if length <= self.moderate_threshold_m => Tier::C,
            _ => Tier::D,
        }
    }
}
