//! Error taxonomy for network-distance classification.
//!
//! Only [`ClassifyError::GraphEmpty`] and [`ClassifyError::InvalidConfig`]
//! abort a run. Every other variant is captured per sample (or per
//! geometry) and surfaced through records and counters.

use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which of a sample's two reference points is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePoint {
    /// Nearest point on the network.
    Entry,
    /// Nearest point on the target geometry.
    Target,
}

impl fmt::Display for ReferencePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => write!(f, "entry"),
            Self::Target => write!(f, "target"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ClassifyError {
    #[error("network graph has no nodes to snap to")]
    GraphEmpty,

    #[error("node {0} is not part of the network graph")]
    NodeNotFound(NodeId),

    #[error("no path connects node {from} and node {to}")]
    NoPathFound { from: NodeId, to: NodeId },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("sample has no {0} point")]
    MissingReferencePoint(ReferencePoint),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClassifyError {
    /// Whether this error must abort the whole classification pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::GraphEmpty | Self::InvalidConfig(_))
    }
}
