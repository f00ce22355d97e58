//! Flow records and their wire-shape validation
//!
//! A [`FlowRecord`] is the canonical shape of one tracked unit's progress:
//! immutable order metadata plus one optional completion slot per stage in
//! the family's sequence. An absent slot means "not yet reached" — never
//! "reached with no data" — so completions are optional values, not records
//! with sentinel zero fields.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::family::{FlowFamily, Stage};
use crate::{IntegrityWarning, ModelError, ModelResult};

/// Immutable order metadata snapshot, set once at flow creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
    /// External order identifier
    pub order_id: String,

    /// Whether the order was flagged as a complaint
    #[serde(default)]
    pub complaint: bool,

    /// When the order was created
    pub created_at: DateTime<Utc>,
}

/// The user who completed a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageUser {
    pub id: String,
    pub username: String,
    pub full_name: String,
}

/// Record of a user finishing one named stage for a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCompletion {
    pub user: StageUser,
    pub completed_at: DateTime<Utc>,
}

/// Completion of the terminal outbound stage.
///
/// Dispatch is keyed to a carrier, not just a user, so the terminal stage
/// additionally carries an expedition identifier and a display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCompletion {
    pub user: StageUser,
    pub completed_at: DateTime<Utc>,
    pub expedition: String,
    pub color: String,
}

/// One tracked unit's validated progress through its family's stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowRecord {
    /// Tracking code: the sole join key between a flow and its order,
    /// unique within a family and stable for the unit's lifetime
    pub tracking: String,

    /// Originating order metadata; never mutated by stage progress
    pub order: OrderInfo,

    pub mark_bind: Option<StageCompletion>,
    pub quality_control: Option<StageCompletion>,
    pub pack_control: Option<StageCompletion>,
    pub outbound: Option<OutboundCompletion>,
}

/// Raw wire shape of a flow record, before validation.
///
/// Every field is optional on the wire; [`FlowRecord::from_wire`] decides
/// which absences are legal.
#[derive(Debug, Clone, Deserialize)]
pub struct WireFlowRecord {
    pub tracking: Option<String>,
    pub order: Option<OrderInfo>,
    pub mark_bind: Option<WireStageCompletion>,
    pub quality_control: Option<WireStageCompletion>,
    pub pack_control: Option<WireStageCompletion>,
    pub outbound: Option<WireOutboundCompletion>,
}

/// Raw wire shape of one stage completion
#[derive(Debug, Clone, Deserialize)]
pub struct WireStageCompletion {
    pub user: Option<StageUser>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Raw wire shape of the outbound completion
#[derive(Debug, Clone, Deserialize)]
pub struct WireOutboundCompletion {
    pub user: Option<StageUser>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expedition: Option<String>,
    pub color: Option<String>,
}

impl FlowRecord {
    /// Validates a raw wire object into a flow record.
    ///
    /// No stage is required — absence of earlier stages is not itself a
    /// failure — but a *present* stage must be fully populated. Pure
    /// validation, no side effects.
    pub fn from_wire(raw: WireFlowRecord) -> ModelResult<FlowRecord> {
        let tracking = raw
            .tracking
            .filter(|t| !t.trim().is_empty())
            .ok_or(ModelError::MissingTracking)?;

        let order = raw.order.ok_or_else(|| ModelError::MissingOrder {
            tracking: tracking.clone(),
        })?;

        let mark_bind = validate_stage(&tracking, Stage::MarkBind, raw.mark_bind)?;
        let quality_control =
            validate_stage(&tracking, Stage::QualityControl, raw.quality_control)?;
        let pack_control = validate_stage(&tracking, Stage::PackControl, raw.pack_control)?;
        let outbound = validate_outbound(&tracking, raw.outbound)?;

        Ok(FlowRecord {
            tracking,
            order,
            mark_bind,
            quality_control,
            pack_control,
            outbound,
        })
    }

    /// Completion timestamp for a stage, if it has been reached
    pub fn completed_at(&self, stage: Stage) -> Option<DateTime<Utc>> {
        match stage {
            Stage::MarkBind => self.mark_bind.as_ref().map(|c| c.completed_at),
            Stage::QualityControl => self.quality_control.as_ref().map(|c| c.completed_at),
            Stage::PackControl => self.pack_control.as_ref().map(|c| c.completed_at),
            Stage::Outbound => self.outbound.as_ref().map(|c| c.completed_at),
        }
    }

    /// The user who completed a stage, if it has been reached
    pub fn completed_by(&self, stage: Stage) -> Option<&StageUser> {
        match stage {
            Stage::MarkBind => self.mark_bind.as_ref().map(|c| &c.user),
            Stage::QualityControl => self.quality_control.as_ref().map(|c| &c.user),
            Stage::PackControl => self.pack_control.as_ref().map(|c| &c.user),
            Stage::Outbound => self.outbound.as_ref().map(|c| &c.user),
        }
    }

    /// Whether the given stage has been completed
    pub fn is_stage_complete(&self, stage: Stage) -> bool {
        self.completed_at(stage).is_some()
    }

    /// The first incomplete stage in the family's sequence, or `None` once
    /// every stage is complete
    pub fn next_stage(&self, family: FlowFamily) -> Option<Stage> {
        family
            .stages()
            .iter()
            .copied()
            .find(|stage| !self.is_stage_complete(*stage))
    }

    /// Whether every stage in the family's sequence is complete
    pub fn is_complete(&self, family: FlowFamily) -> bool {
        self.next_stage(family).is_none()
    }

    /// Recomputes stage-timestamp monotonicity along the family's sequence.
    ///
    /// Completions, when present, must be non-decreasing in sequence order;
    /// this is a consistency expectation on the upstream system, so a
    /// violation is reported as a data anomaly rather than rejected.
    pub fn stage_anomalies(&self, family: FlowFamily) -> Vec<IntegrityWarning> {
        let mut warnings = Vec::new();
        let mut previous: Option<(Stage, DateTime<Utc>)> = None;

        for &stage in family.stages() {
            let Some(completed_at) = self.completed_at(stage) else {
                continue;
            };
            if let Some((earlier, earlier_at)) = previous {
                if completed_at < earlier_at {
                    warnings.push(IntegrityWarning::OutOfOrderStages {
                        tracking: self.tracking.clone(),
                        earlier,
                        later: stage,
                    });
                }
            }
            previous = Some((stage, completed_at));
        }

        warnings
    }

    /// Elapsed time between two completed stages.
    ///
    /// Returns `None` when either stage is incomplete or when the timestamps
    /// are out of order — an anomaly, never a negative duration.
    pub fn stage_duration(&self, from: Stage, to: Stage) -> Option<Duration> {
        let start = self.completed_at(from)?;
        let end = self.completed_at(to)?;
        if end < start {
            return None;
        }
        Some(end - start)
    }
}

fn validate_stage(
    tracking: &str,
    stage: Stage,
    raw: Option<WireStageCompletion>,
) -> ModelResult<Option<StageCompletion>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let user = raw.user.ok_or_else(|| incomplete(tracking, stage, "user"))?;
    let completed_at = raw
        .completed_at
        .ok_or_else(|| incomplete(tracking, stage, "completed_at"))?;
    Ok(Some(StageCompletion { user, completed_at }))
}

fn validate_outbound(
    tracking: &str,
    raw: Option<WireOutboundCompletion>,
) -> ModelResult<Option<OutboundCompletion>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let stage = Stage::Outbound;
    let user = raw.user.ok_or_else(|| incomplete(tracking, stage, "user"))?;
    let completed_at = raw
        .completed_at
        .ok_or_else(|| incomplete(tracking, stage, "completed_at"))?;
    let expedition = raw
        .expedition
        .ok_or_else(|| incomplete(tracking, stage, "expedition"))?;
    let color = raw
        .color
        .ok_or_else(|| incomplete(tracking, stage, "color"))?;
    Ok(Some(OutboundCompletion {
        user,
        completed_at,
        expedition,
        color,
    }))
}

fn incomplete(tracking: &str, stage: Stage, field: &'static str) -> ModelError {
    ModelError::IncompleteStage {
        tracking: tracking.to_string(),
        stage,
        field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, 0).unwrap()
    }

    fn user(name: &str) -> StageUser {
        StageUser {
            id: format!("u-{name}"),
            username: name.to_string(),
            full_name: format!("User {name}"),
        }
    }

    fn order() -> OrderInfo {
        OrderInfo {
            order_id: "ORD-1".to_string(),
            complaint: false,
            created_at: ts(6),
        }
    }

    fn completion(name: &str, hour: u32) -> WireStageCompletion {
        WireStageCompletion {
            user: Some(user(name)),
            completed_at: Some(ts(hour)),
        }
    }

    fn wire(tracking: &str) -> WireFlowRecord {
        WireFlowRecord {
            tracking: Some(tracking.to_string()),
            order: Some(order()),
            mark_bind: None,
            quality_control: None,
            pack_control: None,
            outbound: None,
        }
    }

    #[test]
    fn accepts_record_with_no_stage_completions() {
        let record = FlowRecord::from_wire(wire("AB123")).unwrap();
        assert_eq!(record.tracking, "AB123");
        assert_eq!(record.next_stage(FlowFamily::Online), Some(Stage::MarkBind));
        assert!(!record.is_complete(FlowFamily::Ribbon));
    }

    #[test]
    fn accepts_later_stage_without_earlier_stage() {
        // Absence of earlier stages is not a validation failure; only missing
        // sub-fields of a present stage are.
        let mut raw = wire("AB123");
        raw.quality_control = Some(completion("qc", 9));
        let record = FlowRecord::from_wire(raw).unwrap();
        assert!(record.mark_bind.is_none());
        assert!(record.is_stage_complete(Stage::QualityControl));
    }

    #[test]
    fn rejects_missing_tracking() {
        let mut raw = wire("AB123");
        raw.tracking = None;
        assert_eq!(
            FlowRecord::from_wire(raw).unwrap_err(),
            ModelError::MissingTracking
        );

        let mut raw = wire("   ");
        raw.tracking = Some("   ".to_string());
        assert_eq!(
            FlowRecord::from_wire(raw).unwrap_err(),
            ModelError::MissingTracking
        );
    }

    #[test]
    fn rejects_missing_order() {
        let mut raw = wire("AB123");
        raw.order = None;
        assert_eq!(
            FlowRecord::from_wire(raw).unwrap_err(),
            ModelError::MissingOrder {
                tracking: "AB123".to_string()
            }
        );
    }

    #[test]
    fn rejects_present_stage_without_user() {
        let mut raw = wire("AB123");
        raw.mark_bind = Some(WireStageCompletion {
            user: None,
            completed_at: Some(ts(8)),
        });
        assert_eq!(
            FlowRecord::from_wire(raw).unwrap_err(),
            ModelError::IncompleteStage {
                tracking: "AB123".to_string(),
                stage: Stage::MarkBind,
                field: "user",
            }
        );
    }

    #[test]
    fn rejects_outbound_without_expedition() {
        let mut raw = wire("AB123");
        raw.outbound = Some(WireOutboundCompletion {
            user: Some(user("out")),
            completed_at: Some(ts(15)),
            expedition: None,
            color: Some("#1abc9c".to_string()),
        });
        assert_eq!(
            FlowRecord::from_wire(raw).unwrap_err(),
            ModelError::IncompleteStage {
                tracking: "AB123".to_string(),
                stage: Stage::Outbound,
                field: "expedition",
            }
        );
    }

    #[test]
    fn ordered_completions_produce_no_anomalies() {
        let mut raw = wire("AB123");
        raw.mark_bind = Some(completion("mb", 8));
        raw.quality_control = Some(completion("qc", 9));
        raw.pack_control = Some(completion("pc", 10));
        let record = FlowRecord::from_wire(raw).unwrap();
        assert!(record.stage_anomalies(FlowFamily::Online).is_empty());
    }

    #[test]
    fn out_of_order_completion_is_reported_as_anomaly() {
        let mut raw = wire("AB123");
        raw.mark_bind = Some(completion("mb", 10));
        raw.quality_control = Some(completion("qc", 8));
        let record = FlowRecord::from_wire(raw).unwrap();

        let anomalies = record.stage_anomalies(FlowFamily::Online);
        assert_eq!(
            anomalies,
            vec![IntegrityWarning::OutOfOrderStages {
                tracking: "AB123".to_string(),
                earlier: Stage::MarkBind,
                later: Stage::QualityControl,
            }]
        );
    }

    #[test]
    fn anomaly_check_skips_absent_stages() {
        // Ribbon has no pack control; a gap in the sequence is not an anomaly.
        let mut raw = wire("RB001");
        raw.mark_bind = Some(completion("mb", 8));
        raw.outbound = Some(WireOutboundCompletion {
            user: Some(user("out")),
            completed_at: Some(ts(14)),
            expedition: Some("EXP-7".to_string()),
            color: Some("#e67e22".to_string()),
        });
        let record = FlowRecord::from_wire(raw).unwrap();
        assert!(record.stage_anomalies(FlowFamily::Ribbon).is_empty());
    }

    #[test]
    fn stage_duration_refuses_negative_spans() {
        let mut raw = wire("AB123");
        raw.mark_bind = Some(completion("mb", 10));
        raw.quality_control = Some(completion("qc", 8));
        let record = FlowRecord::from_wire(raw).unwrap();

        assert_eq!(
            record.stage_duration(Stage::QualityControl, Stage::MarkBind),
            Some(Duration::hours(2))
        );
        // Out-of-order timestamps are an anomaly, not a negative duration.
        assert_eq!(
            record.stage_duration(Stage::MarkBind, Stage::QualityControl),
            None
        );
        assert_eq!(record.stage_duration(Stage::MarkBind, Stage::Outbound), None);
    }

    #[test]
    fn deserializes_wire_json() {
        let raw: WireFlowRecord = serde_json::from_value(json!({
            "tracking": "AB123",
            "order": {
                "order_id": "ORD-9",
                "complaint": true,
                "created_at": "2024-03-10T06:00:00Z"
            },
            "mark_bind": {
                "user": {"id": "u-1", "username": "mb", "full_name": "User mb"},
                "completed_at": "2024-03-10T08:00:00Z"
            }
        }))
        .unwrap();

        let record = FlowRecord::from_wire(raw).unwrap();
        assert!(record.order.complaint);
        assert_eq!(record.completed_by(Stage::MarkBind).unwrap().username, "mb");
        assert_eq!(record.completed_at(Stage::MarkBind), Some(ts(8)));
    }
}
