//! Ranked views over the materialized score table.
//!
//! Order is score descending, then user id ascending. Ranks use
//! competition ranking: equal scores share a rank and the next rank skips
//! ahead (1, 2, 2, 4).

use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::config::LeaderboardLimits;
use crate::error::{Error, Result};
use crate::models::*;
use crate::store::{Repository, Store};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub user_id: UserId,
    pub display_name: String,
    pub score: i32,
}

/// Assigns competition ranks to rows already sorted best first.
pub fn rank_sorted<I>(rows: I) -> Vec<Standing>
where
    I: IntoIterator<Item = (User, i32)>,
{
    let mut standings: Vec<Standing> = Vec::new();
    for (position, (user, score)) in rows.into_iter().enumerate() {
        let rank = match standings.last() {
            Some(previous) if previous.score == score => previous.rank,
            _ => position + 1,
        };
        standings.push(Standing {
            rank,
            user_id: user.user_id,
            display_name: user.display_name,
            score,
        });
    }
    standings
}

fn require_tournament<R: Repository>(conn: &R, tournament_id: TournamentId) -> Result<Tournament> {
    conn.find_tournament(tournament_id)?
        .ok_or_else(|| Error::not_found(format!("tournament {}", tournament_id)))
}

pub struct Leaderboard<S> {
    store: Arc<S>,
    limits: LeaderboardLimits,
}

impl<S: Store> Leaderboard<S> {
    pub fn new(store: Arc<S>, limits: LeaderboardLimits) -> Leaderboard<S> {
        Leaderboard { store, limits }
    }

    /// The top of the tournament's leaderboard. `limit` defaults to the
    /// configured window and is capped at the configured maximum.
    pub fn get_leaderboard(&self, tournament_id: TournamentId, limit: Option<usize>) -> Result<Vec<Standing>> {
        let limit = self.limits.clamp(limit);
        self.store.transaction(|conn| {
            require_tournament(conn, tournament_id)?;
            if limit == 0 {
                return Ok(Vec::new());
            }
            let rows = conn.top_scores(tournament_id, limit as i64)?;
            Ok(rank_sorted(rows.into_iter().map(|(score, user)| (user, score.score))))
        })
    }

    /// `None` when the user has not been scored in this tournament.
    pub fn get_user_rank(&self, tournament_id: TournamentId, user_id: UserId) -> Result<Option<Standing>> {
        self.store.transaction(|conn| {
            require_tournament(conn, tournament_id)?;
            let score = match conn.find_score(user_id, tournament_id)? {
                Some(score) => score,
                None => return Ok(None),
            };
            let user = conn
                .find_user(user_id)?
                .ok_or_else(|| Error::not_found(format!("user {}", user_id)))?;
            let above = conn.count_scores_above(tournament_id, score.score)?;

            Ok(Some(Standing {
                rank: above as usize + 1,
                user_id,
                display_name: user.display_name,
                score: score.score,
            }))
        })
    }

    /// Every member of a prediction group ranked by tournament score.
    /// Members without a score yet count as zero.
    pub fn group_standings(&self, current: &CurrentUser, group_id: GroupId) -> Result<Vec<Standing>> {
        self.store.transaction(|conn| {
            let group = conn
                .find_group(group_id)?
                .ok_or_else(|| Error::not_found(format!("group {}", group_id)))?;
            if !conn.is_member(group_id, current.user_id)? {
                return Err(Error::forbidden(format!(
                    "user {} is not a member of group {}",
                    current.user_id, group_id
                )));
            }

            let mut rows = conn
                .list_member_scores(group_id, group.tournament_id)?
                .into_iter()
                .map(|(user, score)| (user, score.unwrap_or(0)))
                .collect::<Vec<_>>();
            rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.user_id.cmp(&b.0.user_id)));

            Ok(rank_sorted(rows))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn user(user_id: UserId) -> User {
        User {
            user_id,
            display_name: format!("player{}", user_id),
            email: format!("player{}@example.com", user_id),
            role: Role::User,
            country: None,
            country_flag: None,
            created_at: Utc.ymd(2026, 1, 1).and_hms(0, 0, 0),
        }
    }

    #[test]
    fn ties_share_a_rank_and_skip_the_next() {
        let ranked = rank_sorted(vec![(user(4), 10), (user(1), 7), (user(2), 7), (user(3), 2)]);
        let ranks = ranked.iter().map(|s| (s.user_id, s.rank)).collect::<Vec<_>>();
        assert_eq!(ranks, vec![(4, 1), (1, 2), (2, 2), (3, 4)]);
    }

    #[test]
    fn everyone_level_is_first() {
        let ranked = rank_sorted(vec![(user(1), 0), (user(2), 0)]);
        assert!(ranked.iter().all(|s| s.rank == 1));
    }
}
