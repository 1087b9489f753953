use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::error::{Error, Result};
use crate::models::*;
use crate::store::{Repository, Store};

/// A match prediction together with what the user needs to recognise the
/// match: both teams, the kickoff and the stadium.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionView {
    pub prediction: MatchPrediction,
    pub game: Match,
    pub team_a: TournamentTeam,
    pub team_b: TournamentTeam,
}

fn validate_match_prediction(
    game: &Match,
    team_a_score: i32,
    team_b_score: i32,
    penalty_side: Option<PenaltySide>,
) -> Result<()> {
    if team_a_score < 0 || team_b_score < 0 {
        return Err(Error::validation("predicted scores must not be negative"));
    }
    if penalty_side.is_some() {
        if !game.round.is_knockout() {
            return Err(Error::validation("group matches have no penalty shoot-out"));
        }
        if team_a_score != team_b_score {
            return Err(Error::validation(
                "a penalty winner can only be predicted for a draw",
            ));
        }
    }
    Ok(())
}

pub(crate) fn record_match_prediction<R: Repository>(
    conn: &R,
    user_id: UserId,
    match_id: MatchId,
    team_a_score: i32,
    team_b_score: i32,
    penalty_side: Option<PenaltySide>,
) -> Result<MatchPrediction> {
    let game = conn
        .find_match(match_id)?
        .ok_or_else(|| Error::not_found(format!("match {}", match_id)))?;
    if game.status == MatchStatus::Completed {
        return Err(Error::invalid_state(format!(
            "match {} is completed, its predictions are locked",
            match_id
        )));
    }
    validate_match_prediction(&game, team_a_score, team_b_score, penalty_side)?;

    conn.upsert_match_prediction(&MatchPredictionForm {
        user_id,
        match_id,
        team_a_score,
        team_b_score,
        penalty_side,
        updated_at: Utc::now(),
    })
}

pub(crate) fn record_winner_prediction<R: Repository>(
    conn: &R,
    user_id: UserId,
    tournament_id: TournamentId,
    round: Round,
    team_id: TeamId,
) -> Result<WinnerPrediction> {
    let tournament = conn
        .find_tournament(tournament_id)?
        .ok_or_else(|| Error::not_found(format!("tournament {}", tournament_id)))?;
    if tournament.status == TournamentStatus::Completed {
        return Err(Error::invalid_state(format!(
            "tournament {} is completed",
            tournament_id
        )));
    }

    let team = conn
        .find_team(team_id)?
        .ok_or_else(|| Error::not_found(format!("team {}", team_id)))?;
    if team.tournament_id != tournament_id {
        return Err(Error::validation(format!(
            "team {} does not play in tournament {}",
            team_id, tournament_id
        )));
    }
    if team.status != TeamStatus::Active {
        return Err(Error::invalid_state(format!("{} is out of the tournament", team.name)));
    }
    if round <= tournament.current_stage {
        return Err(Error::invalid_state(format!(
            "tournament {} has already reached {:?}",
            tournament_id, round
        )));
    }
    let drawn = conn
        .list_matches(tournament_id)?
        .iter()
        .any(|game| game.involves(team_id) && game.round >= round);
    if drawn {
        return Err(Error::invalid_state(format!(
            "{} is already drawn into {:?} or later",
            team.name, round
        )));
    }

    // A pick whose team has finished has been scored and stays as it is.
    let existing = conn
        .list_user_winner_predictions(user_id, tournament_id)?
        .into_iter()
        .find(|prediction| prediction.round == round);
    if let Some(existing) = existing {
        let picked = conn
            .find_team(existing.team_id)?
            .ok_or_else(|| Error::not_found(format!("team {}", existing.team_id)))?;
        if picked.status.is_terminal() {
            return Err(Error::invalid_state(format!(
                "the {:?} pick on {} is already resolved",
                round, picked.name
            )));
        }
    }

    conn.upsert_winner_prediction(&WinnerPredictionForm {
        user_id,
        tournament_id,
        round,
        team_id,
    })
}

pub struct Predictions<S> {
    store: Arc<S>,
}

impl<S: Store> Predictions<S> {
    pub fn new(store: Arc<S>) -> Predictions<S> {
        Predictions { store }
    }

    /// Inserts or overwrites the caller's prediction for a match that has
    /// not been completed yet.
    pub fn upsert_match_prediction(
        &self,
        current: &CurrentUser,
        match_id: MatchId,
        team_a_score: i32,
        team_b_score: i32,
        penalty_side: Option<PenaltySide>,
    ) -> Result<MatchPrediction> {
        let prediction = self.store.transaction(|conn| {
            record_match_prediction(
                conn,
                current.user_id,
                match_id,
                team_a_score,
                team_b_score,
                penalty_side,
            )
        })?;

        info!(
            "User {} predicted {}-{} for match {}",
            current.user_id, team_a_score, team_b_score, match_id
        );
        Ok(prediction)
    }

    pub fn upsert_winner_prediction(
        &self,
        current: &CurrentUser,
        tournament_id: TournamentId,
        round: Round,
        team_id: TeamId,
    ) -> Result<WinnerPrediction> {
        let prediction = self.store.transaction(|conn| {
            record_winner_prediction(conn, current.user_id, tournament_id, round, team_id)
        })?;

        info!(
            "User {} picked team {} to reach {:?} in tournament {}",
            current.user_id, team_id, round, tournament_id
        );
        Ok(prediction)
    }

    /// The caller's match predictions in a tournament, ordered by kickoff.
    pub fn list_user_predictions(
        &self,
        current: &CurrentUser,
        tournament_id: TournamentId,
    ) -> Result<Vec<PredictionView>> {
        self.store.transaction(|conn| {
            let teams = conn
                .list_teams(tournament_id)?
                .into_iter()
                .map(|team| (team.team_id, team))
                .collect::<HashMap<_, _>>();
            let team = |team_id: TeamId| {
                teams
                    .get(&team_id)
                    .cloned()
                    .ok_or_else(|| Error::not_found(format!("team {}", team_id)))
            };

            conn.list_user_match_predictions(current.user_id, tournament_id)?
                .into_iter()
                .map(|(prediction, game)| -> Result<PredictionView> {
                    Ok(PredictionView {
                        team_a: team(game.team_a_id)?,
                        team_b: team(game.team_b_id)?,
                        prediction,
                        game,
                    })
                })
                .collect()
        })
    }

    pub fn list_user_winner_predictions(
        &self,
        current: &CurrentUser,
        tournament_id: TournamentId,
    ) -> Result<Vec<WinnerPrediction>> {
        self.store
            .transaction(|conn| conn.list_user_winner_predictions(current.user_id, tournament_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn game(round: Round) -> Match {
        Match {
            match_id: 7,
            tournament_id: 1,
            team_a_id: 1,
            team_b_id: 2,
            stadium: "Wembley".to_owned(),
            kickoff: Utc.ymd(2024, 7, 14).and_hms(19, 0, 0),
            status: MatchStatus::Upcoming,
            round,
            team_a_score: None,
            team_b_score: None,
            penalty_winner_id: None,
        }
    }

    #[test]
    fn negative_scores_are_invalid() {
        assert!(validate_match_prediction(&game(Round::Group), -1, 0, None).is_err());
        assert!(validate_match_prediction(&game(Round::Group), 0, 0, None).is_ok());
    }

    #[test]
    fn penalty_side_needs_a_level_knockout_prediction() {
        let side = Some(PenaltySide::TeamB);
        assert!(validate_match_prediction(&game(Round::Group), 1, 1, side).is_err());
        assert!(validate_match_prediction(&game(Round::Final), 2, 1, side).is_err());
        assert!(validate_match_prediction(&game(Round::Final), 1, 1, side).is_ok());
    }
}
