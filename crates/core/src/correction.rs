//! Correction record rules and the grading state machine.
//!
//! A correction is one corrector's grading session: five competency
//! scores, five per-competency comments, a pedagogical summary, and a
//! status. Transitions are driven by explicit save actions; `Finalized`
//! and `Returned` are terminal from the corrector's perspective
//! (reopening is an administrative action outside this engine).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::CorrectionStatus;

/// The fixed discrete score set for each competency.
pub const VALID_SCORES: [i16; 6] = [0, 40, 80, 120, 160, 200];

/// Maximum length of a per-competency comment.
pub const MAX_COMPETENCY_COMMENT_LENGTH: usize = 5_000;

/// Maximum length of the pedagogical summary.
pub const MAX_SUMMARY_LENGTH: usize = 10_000;

/// Prefix stamped onto the summary when an essay is returned. The
/// resulting text supersedes the pedagogical summary for student display.
pub const RETURN_NOTICE_PREFIX: &str = "[RETURNED] ";

/// Save actions a corrector can take on their record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CorrectionAction {
    /// Plain save, keeps the current working status.
    Save,
    /// Explicit "save for later", no validation required.
    SaveForLater,
    /// Publish the correction to the student.
    Finalize,
    /// Return the essay to the student instead of scoring it.
    Return { justification: String },
}

/// Compute the next status for an action, or reject the transition.
pub fn transition(
    current: CorrectionStatus,
    action: &CorrectionAction,
) -> Result<CorrectionStatus, CoreError> {
    if is_terminal(current) {
        return Err(CoreError::Conflict(format!(
            "Correction is {current} and can no longer be edited"
        )));
    }
    match action {
        CorrectionAction::Save => Ok(current),
        CorrectionAction::SaveForLater => Ok(CorrectionStatus::Incomplete),
        CorrectionAction::Finalize => Ok(CorrectionStatus::Finalized),
        CorrectionAction::Return { justification } => {
            if justification.trim().is_empty() {
                return Err(CoreError::DevolutionMissingJustification);
            }
            Ok(CorrectionStatus::Returned)
        }
    }
}

/// Whether the corrector can still edit a record in this status.
pub fn is_terminal(status: CorrectionStatus) -> bool {
    matches!(status, CorrectionStatus::Finalized | CorrectionStatus::Returned)
}

/// Validate a single competency score against the fixed discrete set.
pub fn validate_score(score: i16) -> Result<(), CoreError> {
    if VALID_SCORES.contains(&score) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid score {score}. Must be one of: {}",
            VALID_SCORES.map(|s| s.to_string()).join(", ")
        )))
    }
}

/// Validate all five scores.
pub fn validate_scores(scores: &[i16; 5]) -> Result<(), CoreError> {
    for score in scores {
        validate_score(*score)?;
    }
    Ok(())
}

/// Recompute the total from the five scores. The total is always
/// derived here; client-supplied totals are never trusted.
pub fn total(scores: &[i16; 5]) -> i16 {
    scores.iter().sum()
}

/// Build the student-facing summary for a devolution.
///
/// Requires a non-empty justification and stamps
/// [`RETURN_NOTICE_PREFIX`] so the return notice supersedes the
/// pedagogical summary in the student view.
pub fn devolution_summary(justification: &str) -> Result<String, CoreError> {
    let trimmed = justification.trim();
    if trimmed.is_empty() {
        return Err(CoreError::DevolutionMissingJustification);
    }
    Ok(format!("{RETURN_NOTICE_PREFIX}{trimmed}"))
}

/* --------------------------------------------------------------------------
   Essay-level reconciliation of the two corrector slots
   -------------------------------------------------------------------------- */

/// Externally visible correction state of an essay, derived from its
/// corrector slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EssayCorrectionState {
    InCorrection,
    Corrected,
    Returned,
}

/// Derive the essay's visible state from up to two independent slots.
///
/// A devolution by either corrector dominates; otherwise the essay is
/// corrected once every existing slot is finalized.
pub fn essay_visible_state(slots: &[Option<CorrectionStatus>; 2]) -> EssayCorrectionState {
    let present: Vec<CorrectionStatus> = slots.iter().flatten().copied().collect();

    if present.iter().any(|s| *s == CorrectionStatus::Returned) {
        return EssayCorrectionState::Returned;
    }
    if !present.is_empty() && present.iter().all(|s| *s == CorrectionStatus::Finalized) {
        return EssayCorrectionState::Corrected;
    }
    EssayCorrectionState::InCorrection
}

/// Published grade: arithmetic mean of finalized totals, rounded half-up.
///
/// With a single finalized slot, that slot's total is published verbatim.
/// Slots are otherwise independent; no per-competency merge is defined.
pub fn published_grade(slots: &[Option<(CorrectionStatus, i16)>; 2]) -> Option<i16> {
    let finalized: Vec<i32> = slots
        .iter()
        .flatten()
        .filter(|(status, _)| *status == CorrectionStatus::Finalized)
        .map(|(_, total)| i32::from(*total))
        .collect();

    match finalized.as_slice() {
        [] => None,
        [single] => Some(*single as i16),
        totals => {
            let sum: i32 = totals.iter().sum();
            let count = totals.len() as i32;
            Some(((sum + count / 2) / count) as i16)
        }
    }
}
