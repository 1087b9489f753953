//! Tournament administration: the bracket, fixtures and results.
//! Every mutation here needs the admin role.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::config::ScoringPolicy;
use crate::error::{Error, Result};
use crate::models::*;
use crate::scores::recompute_tournament;
use crate::store::{Repository, Store};

fn require_tournament<R: Repository>(conn: &R, tournament_id: TournamentId) -> Result<Tournament> {
    conn.find_tournament(tournament_id)?
        .ok_or_else(|| Error::not_found(format!("tournament {}", tournament_id)))
}

fn require_team<R: Repository>(conn: &R, team_id: TeamId) -> Result<TournamentTeam> {
    conn.find_team(team_id)?
        .ok_or_else(|| Error::not_found(format!("team {}", team_id)))
}

fn require_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        Err(Error::validation(format!("{} name must not be empty", what)))
    } else {
        Ok(())
    }
}

/// A knockout match that ends level is decided on penalties by one of its
/// own teams; any other result has no penalty winner.
fn validate_result(game: &Match, team_a_score: i32, team_b_score: i32, penalty_winner: Option<TeamId>) -> Result<()> {
    if team_a_score < 0 || team_b_score < 0 {
        return Err(Error::validation("scores must not be negative"));
    }
    let shoot_out = game.round.is_knockout() && team_a_score == team_b_score;
    match penalty_winner {
        None if shoot_out => Err(Error::validation(format!(
            "a level {:?} match needs a penalty winner",
            game.round
        ))),
        Some(_) if !shoot_out => Err(Error::validation(
            "only a level knockout match has a penalty winner",
        )),
        Some(team_id) if !game.involves(team_id) => Err(Error::validation(format!(
            "team {} did not play match {}",
            team_id, game.match_id
        ))),
        _ => Ok(()),
    }
}

fn conclude_team<R: Repository>(
    conn: &R,
    policy: &ScoringPolicy,
    team_id: TeamId,
    status: TeamStatus,
) -> Result<TournamentTeam> {
    let team = require_team(conn, team_id)?;
    if team.status.is_terminal() {
        return Err(Error::invalid_state(format!(
            "{} is already {:?}",
            team.name, team.status
        )));
    }
    if status == TeamStatus::Winner {
        let crowned = conn
            .list_teams(team.tournament_id)?
            .into_iter()
            .any(|other| other.status == TeamStatus::Winner);
        if crowned {
            return Err(Error::invalid_state(format!(
                "tournament {} already has a winner",
                team.tournament_id
            )));
        }
    }

    let team = conn.update_team_status(team_id, status)?;
    recompute_tournament(conn, policy, team.tournament_id)?;
    Ok(team)
}

pub struct Tournaments<S> {
    store: Arc<S>,
    policy: ScoringPolicy,
}

impl<S: Store> Tournaments<S> {
    pub fn new(store: Arc<S>, policy: ScoringPolicy) -> Tournaments<S> {
        Tournaments { store, policy }
    }

    pub fn create_tournament(&self, current: &CurrentUser, tournament: &NewTournament) -> Result<Tournament> {
        current.require_admin()?;
        require_name("tournament", &tournament.name)?;
        if tournament.start_date > tournament.end_date {
            return Err(Error::validation("a tournament cannot end before it starts"));
        }

        let tournament = self.store.transaction(|conn| conn.insert_tournament(tournament))?;
        info!("Created tournament {} ({})", tournament.tournament_id, tournament.name);
        Ok(tournament)
    }

    pub fn set_tournament_status(
        &self,
        current: &CurrentUser,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> Result<Tournament> {
        current.require_admin()?;
        let tournament = self.store.transaction(|conn| {
            let tournament = require_tournament(conn, tournament_id)?;
            if !tournament.status.can_advance_to(status) {
                return Err(Error::invalid_state(format!(
                    "tournament {} cannot go from {:?} to {:?}",
                    tournament_id, tournament.status, status
                )));
            }
            conn.update_tournament_progress(tournament_id, status, tournament.current_stage)
        })?;

        info!("Tournament {} is now {:?}", tournament_id, status);
        Ok(tournament)
    }

    /// Moves the tournament to a later round. Stages never go back.
    pub fn advance_stage(&self, current: &CurrentUser, tournament_id: TournamentId, stage: Round) -> Result<Tournament> {
        current.require_admin()?;
        let tournament = self.store.transaction(|conn| {
            let tournament = require_tournament(conn, tournament_id)?;
            if stage <= tournament.current_stage {
                return Err(Error::invalid_state(format!(
                    "tournament {} is already in {:?}",
                    tournament_id, tournament.current_stage
                )));
            }
            conn.update_tournament_progress(tournament_id, tournament.status, stage)
        })?;

        info!("Tournament {} advanced to {:?}", tournament_id, stage);
        Ok(tournament)
    }

    pub fn create_tournament_group(
        &self,
        current: &CurrentUser,
        tournament_id: TournamentId,
        name: &str,
    ) -> Result<TournamentGroup> {
        current.require_admin()?;
        require_name("bracket group", name)?;
        let group = self.store.transaction(|conn| {
            require_tournament(conn, tournament_id)?;
            conn.insert_tournament_group(&NewTournamentGroup {
                tournament_id,
                name: name.trim().to_owned(),
            })
        })?;

        info!("Added {} to tournament {}", group.name, tournament_id);
        Ok(group)
    }

    pub fn rename_tournament_group(
        &self,
        current: &CurrentUser,
        tournament_group_id: TournamentGroupId,
        name: &str,
    ) -> Result<TournamentGroup> {
        current.require_admin()?;
        require_name("bracket group", name)?;
        let group = self.store.transaction(|conn| {
            conn.find_tournament_group(tournament_group_id)?
                .ok_or_else(|| Error::not_found(format!("bracket group {}", tournament_group_id)))?;
            conn.rename_tournament_group(tournament_group_id, name.trim())
        })?;

        info!("Renamed bracket group {} to {}", tournament_group_id, group.name);
        Ok(group)
    }

    pub fn add_team(&self, current: &CurrentUser, team: &NewTournamentTeam) -> Result<TournamentTeam> {
        current.require_admin()?;
        require_name("team", &team.name)?;
        let team = self.store.transaction(|conn| {
            require_tournament(conn, team.tournament_id)?;
            let group = conn
                .find_tournament_group(team.tournament_group_id)?
                .ok_or_else(|| Error::not_found(format!("bracket group {}", team.tournament_group_id)))?;
            if group.tournament_id != team.tournament_id {
                return Err(Error::validation(format!(
                    "{} belongs to another tournament",
                    group.name
                )));
            }
            conn.insert_team(team)
        })?;

        info!("Added team {} to tournament {}", team.name, team.tournament_id);
        Ok(team)
    }

    /// Edits a team's name, flag or bracket group. The bracket group has to
    /// belong to the team's own tournament.
    pub fn update_team(&self, current: &CurrentUser, team_id: TeamId, changes: &TeamChanges) -> Result<TournamentTeam> {
        current.require_admin()?;
        if changes.is_empty() {
            return Err(Error::validation("nothing to update"));
        }
        let mut changes = changes.clone();
        if let Some(name) = changes.name.take() {
            require_name("team", &name)?;
            changes.name = Some(name.trim().to_owned());
        }

        let team = self.store.transaction(|conn| {
            let team = require_team(conn, team_id)?;
            if let Some(group_id) = changes.tournament_group_id {
                let group = conn
                    .find_tournament_group(group_id)?
                    .ok_or_else(|| Error::not_found(format!("bracket group {}", group_id)))?;
                if group.tournament_id != team.tournament_id {
                    return Err(Error::validation(format!(
                        "{} belongs to another tournament",
                        group.name
                    )));
                }
            }
            conn.update_team(team_id, &changes)
        })?;

        info!("Updated team {} ({})", team.team_id, team.name);
        Ok(team)
    }

    pub fn set_group_points(&self, current: &CurrentUser, team_id: TeamId, points: Option<i32>) -> Result<TournamentTeam> {
        current.require_admin()?;
        if points.map_or(false, |points| points < 0) {
            return Err(Error::validation("group points must not be negative"));
        }
        self.store.transaction(|conn| {
            require_team(conn, team_id)?;
            conn.update_group_points(team_id, points)
        })
    }

    pub fn schedule_match(&self, current: &CurrentUser, game: &NewMatch) -> Result<Match> {
        current.require_admin()?;
        if game.team_a_id == game.team_b_id {
            return Err(Error::validation("a team cannot play against itself"));
        }
        let game = self.store.transaction(|conn| {
            require_tournament(conn, game.tournament_id)?;
            for &team_id in &[game.team_a_id, game.team_b_id] {
                let team = require_team(conn, team_id)?;
                if team.tournament_id != game.tournament_id {
                    return Err(Error::validation(format!(
                        "{} does not play in tournament {}",
                        team.name, game.tournament_id
                    )));
                }
            }
            conn.insert_match(game)
        })?;

        info!(
            "Scheduled match {} ({:?}) in tournament {}",
            game.match_id, game.round, game.tournament_id
        );
        Ok(game)
    }

    /// Moves an upcoming match to another stadium or kickoff time.
    pub fn reschedule_match(&self, current: &CurrentUser, match_id: MatchId, schedule: &MatchSchedule) -> Result<Match> {
        current.require_admin()?;
        if schedule.is_empty() {
            return Err(Error::validation("nothing to update"));
        }
        if let Some(ref stadium) = schedule.stadium {
            require_name("stadium", stadium)?;
        }

        let game = self.store.transaction(|conn| {
            let game = conn
                .lock_match(match_id)?
                .ok_or_else(|| Error::not_found(format!("match {}", match_id)))?;
            if game.status != MatchStatus::Upcoming {
                return Err(Error::invalid_state(format!(
                    "match {} is {:?}, only upcoming matches can be rescheduled",
                    match_id, game.status
                )));
            }
            conn.update_match_schedule(match_id, schedule)
        })?;

        info!("Match {} rescheduled to {} at {}", match_id, game.kickoff, game.stadium);
        Ok(game)
    }

    pub fn start_match(&self, current: &CurrentUser, match_id: MatchId) -> Result<Match> {
        current.require_admin()?;
        let game = self.store.transaction(|conn| {
            let game = conn
                .lock_match(match_id)?
                .ok_or_else(|| Error::not_found(format!("match {}", match_id)))?;
            if !game.status.can_advance_to(MatchStatus::Ongoing) {
                return Err(Error::invalid_state(format!(
                    "match {} is already {:?}",
                    match_id, game.status
                )));
            }
            conn.update_match_result(match_id, &MatchResult::started())
        })?;

        info!("Match {} kicked off", match_id);
        Ok(game)
    }

    /// Records the final result and rescores the tournament in the same
    /// transaction.
    pub fn complete_match(
        &self,
        current: &CurrentUser,
        match_id: MatchId,
        team_a_score: i32,
        team_b_score: i32,
        penalty_winner: Option<TeamId>,
    ) -> Result<Match> {
        current.require_admin()?;
        let game = self.store.transaction(|conn| {
            let game = conn
                .lock_match(match_id)?
                .ok_or_else(|| Error::not_found(format!("match {}", match_id)))?;
            if !game.status.can_advance_to(MatchStatus::Completed) {
                return Err(Error::invalid_state(format!(
                    "match {} is already completed",
                    match_id
                )));
            }
            validate_result(&game, team_a_score, team_b_score, penalty_winner)?;

            let game = conn.update_match_result(
                match_id,
                &MatchResult::completed(team_a_score, team_b_score, penalty_winner),
            )?;
            recompute_tournament(conn, &self.policy, game.tournament_id)?;
            Ok(game)
        })?;

        info!(
            "Match {} ended {}-{}",
            match_id, team_a_score, team_b_score
        );
        Ok(game)
    }

    pub fn eliminate_team(&self, current: &CurrentUser, team_id: TeamId) -> Result<TournamentTeam> {
        current.require_admin()?;
        let team = self
            .store
            .transaction(|conn| conclude_team(conn, &self.policy, team_id, TeamStatus::Eliminated))?;

        info!("{} was eliminated from tournament {}", team.name, team.tournament_id);
        Ok(team)
    }

    pub fn crown_winner(&self, current: &CurrentUser, team_id: TeamId) -> Result<TournamentTeam> {
        current.require_admin()?;
        let team = self
            .store
            .transaction(|conn| conclude_team(conn, &self.policy, team_id, TeamStatus::Winner))?;

        info!("{} won tournament {}", team.name, team.tournament_id);
        Ok(team)
    }

    pub fn list_tournaments(&self) -> Result<Vec<Tournament>> {
        self.store.transaction(|conn| conn.list_tournaments())
    }

    /// The tournament the app opens on: the most recently created one.
    pub fn latest_tournament(&self) -> Result<Option<Tournament>> {
        self.store.transaction(|conn| conn.latest_tournament())
    }

    /// Site-wide row counts for the admin dashboard.
    pub fn dashboard_stats(&self, current: &CurrentUser) -> Result<DashboardStats> {
        current.require_admin()?;
        self.store.transaction(|conn| conn.dashboard_stats())
    }

    pub fn list_tournament_groups(&self, tournament_id: TournamentId) -> Result<Vec<TournamentGroup>> {
        self.store.transaction(|conn| conn.list_tournament_groups(tournament_id))
    }

    pub fn list_teams(&self, tournament_id: TournamentId) -> Result<Vec<TournamentTeam>> {
        self.store.transaction(|conn| conn.list_teams(tournament_id))
    }

    /// Teams still in the running, the ones a winner prediction may name.
    pub fn active_teams(&self, tournament_id: TournamentId) -> Result<Vec<TournamentTeam>> {
        let mut teams = self.list_teams(tournament_id)?;
        teams.retain(|team| team.status == TeamStatus::Active);
        Ok(teams)
    }

    pub fn matches_by_round(&self, tournament_id: TournamentId) -> Result<BTreeMap<Round, Vec<Match>>> {
        let matches = self.store.transaction(|conn| conn.list_matches(tournament_id))?;
        let mut rounds = BTreeMap::new();
        for game in matches {
            rounds.entry(game.round).or_insert_with(Vec::new).push(game);
        }
        Ok(rounds)
    }
}
