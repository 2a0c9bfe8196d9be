//! Ranked listing of best scores.

use std::time::Duration;

use crate::{
    gateway::{Gateway, GatewayError, ScoreEntry},
    session::UserId,
};

/// One row of the ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based rank.
    pub position: usize,
    /// Account identifier.
    pub user_id: UserId,
    /// Name to show.
    pub display_name: String,
    /// Best time, lower is better.
    pub best_score: Duration,
}

/// Fetch all scores from the gateway and rank them.
pub async fn fetch_leaderboard(gateway: &dyn Gateway) -> Result<Vec<LeaderboardEntry>, GatewayError> {
    Ok(rank(gateway.list_scores().await?))
}

/// Rank raw entries ascending by best time, dropping accounts without one.
///
/// Equal times keep the order the gateway returned them in.
pub fn rank(scores: Vec<ScoreEntry>) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<_> = scores
        .into_iter()
        .filter_map(|entry| {
            let best = entry.best_score?;
            let display_name = entry
                .username
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| entry.user_id.to_string());
            Some((entry.user_id, display_name, best))
        })
        .collect();
    scored.sort_by_key(|(_, _, best)| *best);

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (user_id, display_name, best_score))| LeaderboardEntry {
            position: index + 1,
            user_id,
            display_name,
            best_score,
        })
        .collect()
}
