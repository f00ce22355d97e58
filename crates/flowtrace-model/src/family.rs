//! Flow family descriptors
//!
//! The two fulfillment pipelines ("online" and "ribbon") share every query,
//! aggregation, and model contract; they differ only in their fixed stage
//! sequence and the resource path segment used at the HTTP boundary. All
//! downstream logic is generic over [`FlowFamily`] rather than duplicated
//! per pipeline.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// One named fulfillment stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Marking and binding of the unit to its order
    MarkBind,
    /// Quality control check
    QualityControl,
    /// Packing control (online family only)
    PackControl,
    /// Outbound dispatch to a carrier
    Outbound,
}

impl Stage {
    /// Stable key used for this stage on the wire
    pub fn wire_key(&self) -> &'static str {
        match self {
            Stage::MarkBind => "mark_bind",
            Stage::QualityControl => "quality_control",
            Stage::PackControl => "pack_control",
            Stage::Outbound => "outbound",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_key())
    }
}

/// Descriptor for one fulfillment pipeline.
///
/// Fixes the stage sequence and the resource path segment; everything else
/// about the two pipelines is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowFamily {
    /// Online orders: mark/bind, quality control, pack control, outbound
    Online,
    /// Ribbon units skip pack control: mark/bind, quality control, outbound
    Ribbon,
}

impl FlowFamily {
    /// The family's fixed stage sequence, in completion order
    pub fn stages(&self) -> &'static [Stage] {
        match self {
            FlowFamily::Online => &[
                Stage::MarkBind,
                Stage::QualityControl,
                Stage::PackControl,
                Stage::Outbound,
            ],
            FlowFamily::Ribbon => &[Stage::MarkBind, Stage::QualityControl, Stage::Outbound],
        }
    }

    /// Resource path segment for this family at the HTTP boundary
    pub fn path_segment(&self) -> &'static str {
        match self {
            FlowFamily::Online => "online",
            FlowFamily::Ribbon => "ribbon",
        }
    }

    /// Whether this family's sequence includes the given stage
    pub fn has_stage(&self, stage: Stage) -> bool {
        self.stages().contains(&stage)
    }
}

impl Display for FlowFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}
