//! Analysis points policy.
//!
//! The first [`WELCOME_ANALYSES`] analyses earn [`WELCOME_POINTS`] each; every
//! later one earns [`STEADY_POINTS`]. The rule looks at the count *before*
//! the analysis is added. Totals that would leave the `i64` range are
//! rejected rather than wrapped.

use serde::Serialize;

use crate::error::CoreError;

/// Number of analyses that earn the welcome rate.
pub const WELCOME_ANALYSES: i64 = 5;

/// Points per analysis while `items_analyzed < WELCOME_ANALYSES`.
pub const WELCOME_POINTS: i64 = 150;

/// Points per analysis afterwards.
pub const STEADY_POINTS: i64 = 250;

/// Score and analysis count for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreTotals {
    pub score: i64,
    pub items_analyzed: i64,
}

/// Points for one analysis given the pre-increment analysis count.
pub fn analysis_points(items_analyzed: i64) -> i64 {
    if items_analyzed < WELCOME_ANALYSES {
        WELCOME_POINTS
    } else {
        STEADY_POINTS
    }
}

/// Totals after recording one analysis.
pub fn apply_analysis(current: ScoreTotals) -> Result<ScoreTotals, CoreError> {
    apply_delta(current, analysis_points(current.items_analyzed), 1)
}

/// Totals after an explicit additive adjustment. No tapering applies.
pub fn apply_delta(
    current: ScoreTotals,
    score_delta: i64,
    items_delta: i64,
) -> Result<ScoreTotals, CoreError> {
    let score = current.score.checked_add(score_delta).ok_or_else(|| {
        CoreError::Validation(format!(
            "Score adjustment {score_delta} overflows the current score {}",
            current.score
        ))
    })?;
    let items_analyzed = current
        .items_analyzed
        .checked_add(items_delta)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Items adjustment {items_delta} overflows the current count {}",
                current.items_analyzed
            ))
        })?;
    Ok(ScoreTotals {
        score,
        items_analyzed,
    })
}
