//! Prediction analytics derived from user feedback.

use indexmap::IndexMap;
use serde::Serialize;

use crate::detection::UNKNOWN_LABEL;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_predictions: i64,
    pub most_common_label: String,
    /// Share of feedback that confirmed the prediction, in `[0, 1]`.
    pub accuracy: f64,
}

/// Summarise `(predicted_label, correct_label)` feedback pairs.
///
/// Feedback without a correction counts as confirming the prediction. The
/// most common label is the most frequently predicted one; ties go to the
/// label seen first.
pub fn summarize<'a, I>(feedback: I) -> AnalyticsSummary
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut counts: IndexMap<&str, i64> = IndexMap::new();
    let mut total = 0i64;
    let mut confirmed = 0i64;

    for (predicted, correct) in feedback {
        total += 1;
        *counts.entry(predicted).or_insert(0) += 1;
        if correct.is_none() || correct == Some(predicted) {
            confirmed += 1;
        }
    }

    let most_common_label = counts
        .iter()
        .fold(None::<(&str, i64)>, |best, (&label, &n)| match best {
            Some((_, best_n)) if n <= best_n => best,
            _ => Some((label, n)),
        })
        .map(|(label, _)| label.to_string())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

    let accuracy = if total == 0 {
        0.0
    } else {
        confirmed as f64 / total as f64
    };

    AnalyticsSummary {
        total_predictions: total,
        most_common_label,
        accuracy,
    }
}
