//! DTOs for rolls_sea adapter.

use crate::entities::rolls::RollStatus;

#[derive(Debug, Clone)]
pub struct RollCreate {
    pub scene_id: i64,
    pub character_id: i64,
    pub requested_by: i64,
    pub post_id: Option<i64>,
    pub intention: String,
    pub modifier: i32,
    pub dice_type: i32,
    pub dice_count: i32,
}

/// GM-side mutation of an existing roll.
///
/// `overridden_by`, `manually_resolved_by` and `invalidated_by` also stamp
/// the matching timestamp with the write time.
#[derive(Debug, Clone, Default)]
pub struct RollUpdate {
    pub intention: Option<String>,
    pub original_intention: Option<String>,
    pub overridden_by: Option<i64>,
    pub override_reason: Option<Option<String>>,
    pub manual_result: Option<i32>,
    pub manually_resolved_by: Option<i64>,
    pub manual_resolution_reason: Option<Option<String>>,
    pub invalidated_by: Option<i64>,
    pub status: Option<RollStatus>,
}

impl RollUpdate {
    pub fn override_intention(
        by: i64,
        intention: String,
        original: Option<String>,
        reason: Option<String>,
    ) -> Self {
        Self {
            intention: Some(intention),
            original_intention: original,
            overridden_by: Some(by),
            override_reason: Some(reason),
            ..Self::default()
        }
    }

    pub fn manual_resolution(by: i64, result: i32, reason: Option<String>) -> Self {
        Self {
            manual_result: Some(result),
            manually_resolved_by: Some(by),
            manual_resolution_reason: Some(reason),
            status: Some(RollStatus::Completed),
            ..Self::default()
        }
    }

    pub fn invalidation(by: i64) -> Self {
        Self {
            invalidated_by: Some(by),
            status: Some(RollStatus::Invalidated),
            ..Self::default()
        }
    }
}
