//! Leaderboard ranking.
//!
//! Standings are ordered by score descending, then by user id ascending, and
//! ranked by 1-based position. A user without a score record ranks one past
//! the last real entry.

use serde::Serialize;

use crate::types::DbId;

/// One user's score record joined with their display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub user_id: DbId,
    pub username: String,
    pub score: i64,
    pub items_analyzed: i64,
}

/// A ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: DbId,
    pub username: String,
    pub score: i64,
    pub items_analyzed: i64,
    pub rank: i64,
}

/// Rank lookup for a single user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_id: DbId,
    pub score: i64,
    pub items_analyzed: i64,
    pub rank: i64,
}

fn sort_standings(standings: &mut [Standing]) {
    standings.sort_by(|a, b| b.score.cmp(&a.score).then(a.user_id.cmp(&b.user_id)));
}

/// Sort and rank all standings.
pub fn rank(mut standings: Vec<Standing>) -> Vec<LeaderboardEntry> {
    sort_standings(&mut standings);
    standings
        .into_iter()
        .zip(1..)
        .map(|(s, rank)| LeaderboardEntry {
            user_id: s.user_id,
            username: s.username,
            score: s.score,
            items_analyzed: s.items_analyzed,
            rank,
        })
        .collect()
}

/// Locate one user's rank among `standings`.
pub fn stats_for(mut standings: Vec<Standing>, user_id: DbId) -> UserStats {
    sort_standings(&mut standings);
    let total = standings.len() as i64;
    standings
        .iter()
        .zip(1..)
        .find(|(s, _)| s.user_id == user_id)
        .map(|(s, rank)| UserStats {
            user_id,
            score: s.score,
            items_analyzed: s.items_analyzed,
            rank,
        })
        .unwrap_or(UserStats {
            user_id,
            score: 0,
            items_analyzed: 0,
            rank: total + 1,
        })
}
