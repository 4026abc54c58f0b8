//! Majority-vote aggregation of per-frame classifications.
//!
//! Frames classified as `"unknown"` are counted as sampled but never vote.
//! The winning label is the one with the most votes; on a tie the label that
//! entered the tally first wins. Confidence is the mean over *all* voting
//! frames, not only those that voted for the winner.

use indexmap::IndexMap;
use serde::Serialize;

use crate::detection::{ClassificationResult, UNKNOWN_LABEL};

/// Final verdict for a whole video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoVerdict {
    pub label: String,
    pub confidence: f64,
    /// Frames that were classified (including `"unknown"` ones).
    pub frames_sampled: u32,
    /// Frames that contributed a non-`"unknown"` vote.
    pub frames_voted: u32,
    /// Votes per label, in first-seen order.
    pub tally: IndexMap<String, u32>,
}

impl VideoVerdict {
    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }
}

/// Running vote tally, folded one frame at a time.
#[derive(Debug, Default, Clone)]
pub struct VoteTally {
    counts: IndexMap<String, u32>,
    confidence_sum: f64,
    votes: u32,
    frames_sampled: u32,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one frame's result into the tally.
    pub fn record(&mut self, result: &ClassificationResult) {
        self.frames_sampled += 1;
        if result.is_unknown() {
            return;
        }
        *self.counts.entry(result.label.clone()).or_insert(0) += 1;
        self.confidence_sum += result.confidence;
        self.votes += 1;
    }

    pub fn frames_sampled(&self) -> u32 {
        self.frames_sampled
    }

    /// Produce the verdict for everything recorded so far.
    pub fn verdict(&self) -> VideoVerdict {
        let winner = self
            .counts
            .iter()
            .fold(None::<(&String, u32)>, |best, (label, &count)| match best {
                Some((_, best_count)) if count <= best_count => best,
                _ => Some((label, count)),
            });

        let (label, confidence) = match winner {
            Some((label, _)) if self.votes > 0 => {
                (label.clone(), self.confidence_sum / f64::from(self.votes))
            }
            _ => (UNKNOWN_LABEL.to_string(), 0.0),
        };

        VideoVerdict {
            label,
            confidence,
            frames_sampled: self.frames_sampled,
            frames_voted: self.votes,
            tally: self.counts.clone(),
        }
    }
}

/// Aggregate a finished sequence of per-frame results.
pub fn aggregate<'a, I>(results: I) -> VideoVerdict
where
    I: IntoIterator<Item = &'a ClassificationResult>,
{
    let mut tally = VoteTally::new();
    for result in results {
        tally.record(result);
    }
    tally.verdict()
}
