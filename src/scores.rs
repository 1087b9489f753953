//! Point computation. A tournament's scores are always rebuilt from every
//! prediction in it, so rescoring any number of times gives the same table.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::ScoringPolicy;
use crate::error::{Error, Result};
use crate::models::*;
use crate::store::{Repository, Store};

pub fn match_points(policy: &ScoringPolicy, prediction: &MatchPrediction, game: &Match) -> i32 {
    let (team_a_score, team_b_score) = match game.final_score() {
        Some(score) => score,
        None => return 0,
    };

    let predicted_winner = prediction.team_a_score.cmp(&prediction.team_b_score);
    let actual_winner = team_a_score.cmp(&team_b_score);

    let mut result = if (prediction.team_a_score, prediction.team_b_score) == (team_a_score, team_b_score) {
        policy.exact_score_points
    } else if predicted_winner == actual_winner {
        policy.correct_outcome_points
    } else {
        0
    };

    // Level knockout matches are decided on penalties
    if game.round.is_knockout() && team_a_score == team_b_score {
        if let (Some(side), Some(winner)) = (prediction.penalty_side, game.penalty_winner_id) {
            if game.team_on(side) == winner {
                result += policy.penalty_winner_points;
            }
        }
    }

    result
}

/// The latest round each team has been drawn into.
pub fn furthest_rounds(matches: &[Match]) -> HashMap<TeamId, Round> {
    let mut furthest = HashMap::new();
    for game in matches {
        for &team_id in &[game.team_a_id, game.team_b_id] {
            let round = furthest.entry(team_id).or_insert(game.round);
            if game.round > *round {
                *round = game.round;
            }
        }
    }
    furthest
}

/// Points for a winner prediction. Only resolved once the team is out or
/// has won the tournament; until then it is worth nothing yet.
pub fn winner_points(
    policy: &ScoringPolicy,
    prediction: &WinnerPrediction,
    team: &TournamentTeam,
    furthest: Option<Round>,
) -> i32 {
    if !team.status.is_terminal() {
        return 0;
    }
    let reached = team.status == TeamStatus::Winner || furthest.map_or(false, |round| round >= prediction.round);
    if reached {
        policy.round_advance_points
    } else {
        0
    }
}

/// Every predicting user's total for one tournament.
pub fn tournament_totals(
    policy: &ScoringPolicy,
    matches: &[Match],
    teams: &[TournamentTeam],
    match_predictions: &[MatchPrediction],
    winner_predictions: &[WinnerPrediction],
) -> BTreeMap<UserId, i32> {
    let games = matches
        .iter()
        .map(|game| (game.match_id, game))
        .collect::<HashMap<_, _>>();
    let teams = teams
        .iter()
        .map(|team| (team.team_id, team))
        .collect::<HashMap<_, _>>();
    let furthest = furthest_rounds(matches);

    let mut totals = BTreeMap::new();
    for prediction in match_predictions {
        let points = games
            .get(&prediction.match_id)
            .map_or(0, |game| match_points(policy, prediction, game));
        *totals.entry(prediction.user_id).or_insert(0) += points;
    }
    for prediction in winner_predictions {
        let points = teams.get(&prediction.team_id).map_or(0, |team| {
            winner_points(policy, prediction, team, furthest.get(&team.team_id).cloned())
        });
        *totals.entry(prediction.user_id).or_insert(0) += points;
    }
    totals
}

/// Rebuilds the tournament's score table. The tournament row stays locked
/// until the surrounding transaction ends, so concurrent rescoring of the
/// same tournament runs one after the other.
pub(crate) fn recompute_tournament<R: Repository>(
    conn: &R,
    policy: &ScoringPolicy,
    tournament_id: TournamentId,
) -> Result<usize> {
    conn.lock_tournament(tournament_id)?
        .ok_or_else(|| Error::not_found(format!("tournament {}", tournament_id)))?;

    let matches = conn.list_matches(tournament_id)?;
    let teams = conn.list_teams(tournament_id)?;
    let match_predictions = conn.list_match_predictions(tournament_id)?;
    let winner_predictions = conn.list_winner_predictions(tournament_id)?;

    let totals = tournament_totals(policy, &matches, &teams, &match_predictions, &winner_predictions);
    for (&user_id, &score) in &totals {
        debug!("User {} has {} points in tournament {}", user_id, score, tournament_id);
        conn.upsert_score(user_id, tournament_id, score)?;
    }

    Ok(totals.len())
}

pub struct Scoring<S> {
    store: Arc<S>,
    policy: ScoringPolicy,
}

impl<S: Store> Scoring<S> {
    pub fn new(store: Arc<S>, policy: ScoringPolicy) -> Scoring<S> {
        Scoring { store, policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Scores a completed match. Returns the number of users rescored.
    pub fn score_match(&self, match_id: MatchId) -> Result<usize> {
        let scored = self.store.transaction(|conn| {
            let game = conn
                .find_match(match_id)?
                .ok_or_else(|| Error::not_found(format!("match {}", match_id)))?;
            if game.status != MatchStatus::Completed {
                return Err(Error::invalid_state(format!(
                    "match {} has not been completed",
                    match_id
                )));
            }
            recompute_tournament(conn, &self.policy, game.tournament_id)
        })?;

        info!("Scored match {}, {} users updated", match_id, scored);
        Ok(scored)
    }

    pub fn rescore_tournament(&self, tournament_id: TournamentId) -> Result<usize> {
        let scored = self
            .store
            .transaction(|conn| recompute_tournament(conn, &self.policy, tournament_id))?;

        info!("Rescored tournament {}, {} users updated", tournament_id, scored);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn game(match_id: MatchId, round: Round, teams: (TeamId, TeamId), score: Option<(i32, i32)>) -> Match {
        Match {
            match_id,
            tournament_id: 1,
            team_a_id: teams.0,
            team_b_id: teams.1,
            stadium: "Estadio Azteca".to_owned(),
            kickoff: Utc.ymd(2026, 6, 11).and_hms(20, 0, 0),
            status: if score.is_some() {
                MatchStatus::Completed
            } else {
                MatchStatus::Upcoming
            },
            round,
            team_a_score: score.map(|s| s.0),
            team_b_score: score.map(|s| s.1),
            penalty_winner_id: None,
        }
    }

    fn prediction(user_id: UserId, match_id: MatchId, a: i32, b: i32) -> MatchPrediction {
        let now = Utc.ymd(2026, 6, 1).and_hms(12, 0, 0);
        MatchPrediction {
            match_prediction_id: user_id * 100 + match_id,
            user_id,
            match_id,
            team_a_score: a,
            team_b_score: b,
            penalty_side: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn team(team_id: TeamId, status: TeamStatus) -> TournamentTeam {
        TournamentTeam {
            team_id,
            tournament_id: 1,
            tournament_group_id: 1,
            name: format!("Team {}", team_id),
            flag: "🏳".to_owned(),
            status,
            group_points: None,
        }
    }

    fn pick(user_id: UserId, round: Round, team_id: TeamId) -> WinnerPrediction {
        WinnerPrediction {
            winner_prediction_id: user_id,
            user_id,
            tournament_id: 1,
            round,
            team_id,
        }
    }

    #[test]
    fn exact_score_earns_exact_points() {
        let policy = ScoringPolicy::default();
        let game = game(1, Round::Group, (1, 2), Some((2, 1)));
        assert_eq!(match_points(&policy, &prediction(1, 1, 2, 1), &game), 3);
    }

    #[test]
    fn correct_winner_earns_outcome_points_only() {
        let policy = ScoringPolicy::default();
        let game = game(1, Round::Group, (1, 2), Some((3, 0)));
        assert_eq!(match_points(&policy, &prediction(1, 1, 2, 1), &game), 1);
        assert_eq!(match_points(&policy, &prediction(1, 1, 0, 1), &game), 0);
    }

    #[test]
    fn draws_count_as_an_outcome() {
        let policy = ScoringPolicy::default();
        let game = game(1, Round::Group, (1, 2), Some((2, 2)));
        assert_eq!(match_points(&policy, &prediction(1, 1, 0, 0), &game), 1);
    }

    #[test]
    fn unfinished_matches_are_worth_nothing() {
        let policy = ScoringPolicy::default();
        let game = game(1, Round::Group, (1, 2), None);
        assert_eq!(match_points(&policy, &prediction(1, 1, 0, 0), &game), 0);
    }

    #[test]
    fn penalty_side_adds_a_bonus() {
        let policy = ScoringPolicy::default();
        let mut game = game(1, Round::QuarterFinal, (1, 2), Some((1, 1)));
        game.penalty_winner_id = Some(2);

        let mut right = prediction(1, 1, 1, 1);
        right.penalty_side = Some(PenaltySide::TeamB);
        let mut wrong = prediction(2, 1, 0, 0);
        wrong.penalty_side = Some(PenaltySide::TeamA);

        assert_eq!(match_points(&policy, &right, &game), 4);
        assert_eq!(match_points(&policy, &wrong, &game), 1);
    }

    #[test]
    fn furthest_round_follows_the_bracket() {
        let matches = vec![
            game(1, Round::Group, (1, 2), Some((1, 0))),
            game(2, Round::RoundOf16, (1, 3), Some((2, 0))),
            game(3, Round::QuarterFinal, (1, 4), None),
        ];
        let furthest = furthest_rounds(&matches);
        assert_eq!(furthest[&1], Round::QuarterFinal);
        assert_eq!(furthest[&2], Round::Group);
        assert_eq!(furthest[&3], Round::RoundOf16);
    }

    #[test]
    fn winner_predictions_wait_for_a_terminal_status() {
        let policy = ScoringPolicy::default();
        let guess = pick(1, Round::SemiFinal, 1);

        let active = team(1, TeamStatus::Active);
        assert_eq!(winner_points(&policy, &guess, &active, Some(Round::Final)), 0);

        let out_in_semis = team(1, TeamStatus::Eliminated);
        assert_eq!(winner_points(&policy, &guess, &out_in_semis, Some(Round::SemiFinal)), 5);

        let out_earlier = team(1, TeamStatus::Eliminated);
        assert_eq!(winner_points(&policy, &guess, &out_earlier, Some(Round::RoundOf16)), 0);

        let champion = team(1, TeamStatus::Winner);
        assert_eq!(winner_points(&policy, &pick(1, Round::Final, 1), &champion, None), 5);
    }

    #[test]
    fn totals_add_up_per_user() {
        let policy = ScoringPolicy::default();
        let matches = vec![
            game(1, Round::Group, (1, 2), Some((2, 1))),
            game(2, Round::Final, (1, 3), Some((1, 0))),
        ];
        let teams = vec![team(1, TeamStatus::Winner), team(2, TeamStatus::Eliminated), team(3, TeamStatus::Eliminated)];
        let match_predictions = vec![
            prediction(1, 1, 2, 1),
            prediction(1, 2, 3, 0),
            prediction(2, 1, 0, 1),
        ];
        let winner_predictions = vec![pick(2, Round::Final, 1), pick(3, Round::Final, 2)];

        let totals = tournament_totals(&policy, &matches, &teams, &match_predictions, &winner_predictions);
        assert_eq!(totals.get(&1), Some(&4));
        assert_eq!(totals.get(&2), Some(&5));
        assert_eq!(totals.get(&3), Some(&0));
    }
}
