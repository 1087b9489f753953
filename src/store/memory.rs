use chrono::Utc;
use std::cell::{RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::{Repository, Store};
use crate::error::{Error, Result};
use crate::models::*;

#[derive(Debug, Clone, Default)]
pub struct Tables {
    sequences: HashMap<&'static str, i32>,
    users: BTreeMap<UserId, User>,
    tournaments: BTreeMap<TournamentId, Tournament>,
    tournament_groups: BTreeMap<TournamentGroupId, TournamentGroup>,
    teams: BTreeMap<TeamId, TournamentTeam>,
    matches: BTreeMap<MatchId, Match>,
    match_predictions: BTreeMap<i32, MatchPrediction>,
    winner_predictions: BTreeMap<i32, WinnerPrediction>,
    groups: BTreeMap<GroupId, PredictionGroup>,
    members: BTreeMap<(GroupId, UserId), GroupMember>,
    invites: BTreeMap<GroupId, GroupInvite>,
    scores: BTreeMap<(UserId, TournamentId), TournamentScore>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i32 {
        let id = self.sequences.entry(table).or_insert(0);
        *id += 1;
        *id
    }

    fn require_user(&self, user_id: UserId) -> Result<()> {
        require(self.users.contains_key(&user_id), "user", user_id)
    }

    fn require_tournament(&self, tournament_id: TournamentId) -> Result<()> {
        require(self.tournaments.contains_key(&tournament_id), "tournament", tournament_id)
    }
}

fn require(present: bool, what: &str, id: i32) -> Result<()> {
    if present {
        Ok(())
    } else {
        Err(Error::not_found(format!("{} {}", what, id)))
    }
}

fn missing(what: &str, id: i32) -> Error {
    Error::not_found(format!("{} {}", what, id))
}

/// In-process store with the same unique and foreign key rules as the SQL
/// schema. Transactions are serialized on one mutex and work on a copy of
/// the tables that is only published when the closure succeeds.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

pub struct MemoryConn {
    tables: RefCell<Tables>,
}

impl MemoryConn {
    fn tables(&self) -> RefMut<Tables> {
        self.tables.borrow_mut()
    }
}

impl Store for MemoryStore {
    type Conn = MemoryConn;

    fn transaction<T, F>(&self, mut f: F) -> Result<T>
    where
        F: FnMut(&MemoryConn) -> Result<T>,
    {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_owned()))?;

        let connection = MemoryConn {
            tables: RefCell::new(tables.clone()),
        };
        let result = f(&connection)?;
        *tables = connection.tables.into_inner();
        Ok(result)
    }
}

impl Repository for MemoryConn {
    fn insert_user(&self, user: &NewUser) -> Result<User> {
        let mut tables = self.tables();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(Error::conflict(format!("email {} is already registered", user.email)));
        }
        let row = User {
            user_id: tables.next_id("users"),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            role: user.role,
            country: user.country.clone(),
            country_flag: user.country_flag.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(row.user_id, row.clone());
        Ok(row)
    }

    fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.tables().users.get(&user_id).cloned())
    }

    fn update_profile(&self, user_id: UserId, changes: &ProfileChanges) -> Result<User> {
        let mut tables = self.tables();
        let user = tables.users.get_mut(&user_id).ok_or_else(|| missing("user", user_id))?;
        if let Some(ref display_name) = changes.display_name {
            user.display_name = display_name.clone();
        }
        if let Some(ref country) = changes.country {
            user.country = Some(country.clone());
        }
        if let Some(ref flag) = changes.country_flag {
            user.country_flag = Some(flag.clone());
        }
        Ok(user.clone())
    }

    fn update_role(&self, user_id: UserId, role: Role) -> Result<User> {
        let mut tables = self.tables();
        let user = tables.users.get_mut(&user_id).ok_or_else(|| missing("user", user_id))?;
        user.role = role;
        Ok(user.clone())
    }

    fn insert_tournament(&self, tournament: &NewTournament) -> Result<Tournament> {
        let mut tables = self.tables();
        let duplicate = tables.tournaments.values().any(|t| {
            t.name == tournament.name
                && t.start_date == tournament.start_date
                && t.end_date == tournament.end_date
        });
        if duplicate {
            return Err(Error::conflict(format!(
                "tournament {} with these dates already exists",
                tournament.name
            )));
        }
        let row = Tournament {
            tournament_id: tables.next_id("tournaments"),
            name: tournament.name.clone(),
            location: tournament.location.clone(),
            status: TournamentStatus::Upcoming,
            start_date: tournament.start_date,
            end_date: tournament.end_date,
            current_stage: Round::Group,
        };
        tables.tournaments.insert(row.tournament_id, row.clone());
        Ok(row)
    }

    fn find_tournament(&self, tournament_id: TournamentId) -> Result<Option<Tournament>> {
        Ok(self.tables().tournaments.get(&tournament_id).cloned())
    }

    fn lock_tournament(&self, tournament_id: TournamentId) -> Result<Option<Tournament>> {
        self.find_tournament(tournament_id)
    }

    fn list_tournaments(&self) -> Result<Vec<Tournament>> {
        Ok(self.tables().tournaments.values().cloned().collect())
    }

    fn latest_tournament(&self) -> Result<Option<Tournament>> {
        Ok(self.tables().tournaments.values().next_back().cloned())
    }

    fn update_tournament_progress(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
        stage: Round,
    ) -> Result<Tournament> {
        let mut tables = self.tables();
        let tournament = tables
            .tournaments
            .get_mut(&tournament_id)
            .ok_or_else(|| missing("tournament", tournament_id))?;
        tournament.status = status;
        tournament.current_stage = stage;
        Ok(tournament.clone())
    }

    fn insert_tournament_group(&self, group: &NewTournamentGroup) -> Result<TournamentGroup> {
        let mut tables = self.tables();
        tables.require_tournament(group.tournament_id)?;
        if tables
            .tournament_groups
            .values()
            .any(|g| g.tournament_id == group.tournament_id && g.name == group.name)
        {
            return Err(Error::conflict(format!("bracket group {} already exists", group.name)));
        }
        let row = TournamentGroup {
            tournament_group_id: tables.next_id("tournament_groups"),
            tournament_id: group.tournament_id,
            name: group.name.clone(),
        };
        tables.tournament_groups.insert(row.tournament_group_id, row.clone());
        Ok(row)
    }

    fn find_tournament_group(&self, id: TournamentGroupId) -> Result<Option<TournamentGroup>> {
        Ok(self.tables().tournament_groups.get(&id).cloned())
    }

    fn list_tournament_groups(&self, tournament_id: TournamentId) -> Result<Vec<TournamentGroup>> {
        let mut groups = self
            .tables()
            .tournament_groups
            .values()
            .filter(|g| g.tournament_id == tournament_id)
            .cloned()
            .collect::<Vec<_>>();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    fn rename_tournament_group(&self, id: TournamentGroupId, name: &str) -> Result<TournamentGroup> {
        let mut tables = self.tables();
        let tournament_id = tables
            .tournament_groups
            .get(&id)
            .map(|g| g.tournament_id)
            .ok_or_else(|| missing("bracket group", id))?;
        if tables
            .tournament_groups
            .values()
            .any(|g| g.tournament_group_id != id && g.tournament_id == tournament_id && g.name == name)
        {
            return Err(Error::conflict(format!("bracket group {} already exists", name)));
        }
        let group = tables
            .tournament_groups
            .get_mut(&id)
            .ok_or_else(|| missing("bracket group", id))?;
        group.name = name.to_owned();
        Ok(group.clone())
    }

    fn insert_team(&self, team: &NewTournamentTeam) -> Result<TournamentTeam> {
        let mut tables = self.tables();
        tables.require_tournament(team.tournament_id)?;
        require(
            tables.tournament_groups.contains_key(&team.tournament_group_id),
            "bracket group",
            team.tournament_group_id,
        )?;
        if tables
            .teams
            .values()
            .any(|t| t.tournament_id == team.tournament_id && t.name == team.name)
        {
            return Err(Error::conflict(format!("team {} already exists", team.name)));
        }
        let row = TournamentTeam {
            team_id: tables.next_id("tournament_teams"),
            tournament_id: team.tournament_id,
            tournament_group_id: team.tournament_group_id,
            name: team.name.clone(),
            flag: team.flag.clone(),
            status: TeamStatus::Active,
            group_points: None,
        };
        tables.teams.insert(row.team_id, row.clone());
        Ok(row)
    }

    fn find_team(&self, team_id: TeamId) -> Result<Option<TournamentTeam>> {
        Ok(self.tables().teams.get(&team_id).cloned())
    }

    fn list_teams(&self, tournament_id: TournamentId) -> Result<Vec<TournamentTeam>> {
        Ok(self
            .tables()
            .teams
            .values()
            .filter(|t| t.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    fn update_team(&self, team_id: TeamId, changes: &TeamChanges) -> Result<TournamentTeam> {
        let mut tables = self.tables();
        let tournament_id = tables
            .teams
            .get(&team_id)
            .map(|t| t.tournament_id)
            .ok_or_else(|| missing("team", team_id))?;
        if let Some(group_id) = changes.tournament_group_id {
            require(tables.tournament_groups.contains_key(&group_id), "bracket group", group_id)?;
        }
        if let Some(ref name) = changes.name {
            if tables
                .teams
                .values()
                .any(|t| t.team_id != team_id && t.tournament_id == tournament_id && &t.name == name)
            {
                return Err(Error::conflict(format!("team {} already exists", name)));
            }
        }
        let team = tables.teams.get_mut(&team_id).ok_or_else(|| missing("team", team_id))?;
        if let Some(ref name) = changes.name {
            team.name = name.clone();
        }
        if let Some(ref flag) = changes.flag {
            team.flag = flag.clone();
        }
        if let Some(group_id) = changes.tournament_group_id {
            team.tournament_group_id = group_id;
        }
        Ok(team.clone())
    }

    fn update_team_status(&self, team_id: TeamId, status: TeamStatus) -> Result<TournamentTeam> {
        let mut tables = self.tables();
        let team = tables.teams.get_mut(&team_id).ok_or_else(|| missing("team", team_id))?;
        team.status = status;
        Ok(team.clone())
    }

    fn update_group_points(&self, team_id: TeamId, points: Option<i32>) -> Result<TournamentTeam> {
        let mut tables = self.tables();
        let team = tables.teams.get_mut(&team_id).ok_or_else(|| missing("team", team_id))?;
        team.group_points = points;
        Ok(team.clone())
    }

    fn insert_match(&self, game: &NewMatch) -> Result<Match> {
        let mut tables = self.tables();
        tables.require_tournament(game.tournament_id)?;
        require(tables.teams.contains_key(&game.team_a_id), "team", game.team_a_id)?;
        require(tables.teams.contains_key(&game.team_b_id), "team", game.team_b_id)?;
        let row = Match {
            match_id: tables.next_id("matches"),
            tournament_id: game.tournament_id,
            team_a_id: game.team_a_id,
            team_b_id: game.team_b_id,
            stadium: game.stadium.clone(),
            kickoff: game.kickoff,
            status: MatchStatus::Upcoming,
            round: game.round,
            team_a_score: None,
            team_b_score: None,
            penalty_winner_id: None,
        };
        tables.matches.insert(row.match_id, row.clone());
        Ok(row)
    }

    fn find_match(&self, match_id: MatchId) -> Result<Option<Match>> {
        Ok(self.tables().matches.get(&match_id).cloned())
    }

    fn lock_match(&self, match_id: MatchId) -> Result<Option<Match>> {
        self.find_match(match_id)
    }

    fn list_matches(&self, tournament_id: TournamentId) -> Result<Vec<Match>> {
        let mut games = self
            .tables()
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect::<Vec<_>>();
        games.sort_by(|a, b| (a.kickoff, a.match_id).cmp(&(b.kickoff, b.match_id)));
        Ok(games)
    }

    fn update_match_schedule(&self, match_id: MatchId, schedule: &MatchSchedule) -> Result<Match> {
        let mut tables = self.tables();
        let game = tables.matches.get_mut(&match_id).ok_or_else(|| missing("match", match_id))?;
        if let Some(ref stadium) = schedule.stadium {
            game.stadium = stadium.clone();
        }
        if let Some(kickoff) = schedule.kickoff {
            game.kickoff = kickoff;
        }
        Ok(game.clone())
    }

    fn update_match_result(&self, match_id: MatchId, result: &MatchResult) -> Result<Match> {
        let mut tables = self.tables();
        let game = tables.matches.get_mut(&match_id).ok_or_else(|| missing("match", match_id))?;
        game.status = result.status;
        game.team_a_score = result.team_a_score;
        game.team_b_score = result.team_b_score;
        game.penalty_winner_id = result.penalty_winner_id;
        Ok(game.clone())
    }

    fn upsert_match_prediction(&self, prediction: &MatchPredictionForm) -> Result<MatchPrediction> {
        let mut tables = self.tables();
        tables.require_user(prediction.user_id)?;
        require(tables.matches.contains_key(&prediction.match_id), "match", prediction.match_id)?;

        let existing = tables
            .match_predictions
            .values()
            .find(|p| p.user_id == prediction.user_id && p.match_id == prediction.match_id)
            .map(|p| (p.match_prediction_id, p.created_at));
        let (id, created_at) = match existing {
            Some(found) => found,
            None => (tables.next_id("match_predictions"), prediction.updated_at),
        };
        let row = MatchPrediction {
            match_prediction_id: id,
            user_id: prediction.user_id,
            match_id: prediction.match_id,
            team_a_score: prediction.team_a_score,
            team_b_score: prediction.team_b_score,
            penalty_side: prediction.penalty_side,
            created_at,
            updated_at: prediction.updated_at,
        };
        tables.match_predictions.insert(id, row.clone());
        Ok(row)
    }

    fn list_match_predictions(&self, tournament_id: TournamentId) -> Result<Vec<MatchPrediction>> {
        let tables = self.tables();
        Ok(tables
            .match_predictions
            .values()
            .filter(|p| {
                tables
                    .matches
                    .get(&p.match_id)
                    .map_or(false, |m| m.tournament_id == tournament_id)
            })
            .cloned()
            .collect())
    }

    fn list_user_match_predictions(
        &self,
        user_id: UserId,
        tournament_id: TournamentId,
    ) -> Result<Vec<(MatchPrediction, Match)>> {
        let tables = self.tables();
        let mut rows = tables
            .match_predictions
            .values()
            .filter(|p| p.user_id == user_id)
            .filter_map(|p| {
                tables
                    .matches
                    .get(&p.match_id)
                    .filter(|m| m.tournament_id == tournament_id)
                    .map(|m| (p.clone(), m.clone()))
            })
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| (a.1.kickoff, a.1.match_id).cmp(&(b.1.kickoff, b.1.match_id)));
        Ok(rows)
    }

    fn upsert_winner_prediction(&self, prediction: &WinnerPredictionForm) -> Result<WinnerPrediction> {
        let mut tables = self.tables();
        tables.require_user(prediction.user_id)?;
        tables.require_tournament(prediction.tournament_id)?;
        require(tables.teams.contains_key(&prediction.team_id), "team", prediction.team_id)?;

        let existing = tables
            .winner_predictions
            .values()
            .find(|p| {
                p.user_id == prediction.user_id
                    && p.tournament_id == prediction.tournament_id
                    && p.round == prediction.round
            })
            .map(|p| p.winner_prediction_id);
        let id = match existing {
            Some(id) => id,
            None => tables.next_id("winner_predictions"),
        };
        let row = WinnerPrediction {
            winner_prediction_id: id,
            user_id: prediction.user_id,
            tournament_id: prediction.tournament_id,
            round: prediction.round,
            team_id: prediction.team_id,
        };
        tables.winner_predictions.insert(id, row.clone());
        Ok(row)
    }

    fn list_winner_predictions(&self, tournament_id: TournamentId) -> Result<Vec<WinnerPrediction>> {
        Ok(self
            .tables()
            .winner_predictions
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    fn list_user_winner_predictions(
        &self,
        user_id: UserId,
        tournament_id: TournamentId,
    ) -> Result<Vec<WinnerPrediction>> {
        let mut predictions = self
            .tables()
            .winner_predictions
            .values()
            .filter(|p| p.user_id == user_id && p.tournament_id == tournament_id)
            .cloned()
            .collect::<Vec<_>>();
        predictions.sort_by_key(|p| p.round);
        Ok(predictions)
    }

    fn insert_group(&self, group: &NewPredictionGroup) -> Result<PredictionGroup> {
        let mut tables = self.tables();
        tables.require_user(group.admin_id)?;
        tables.require_tournament(group.tournament_id)?;
        if tables
            .groups
            .values()
            .any(|g| g.tournament_id == group.tournament_id && g.name == group.name)
        {
            return Err(Error::conflict(format!("group {} already exists", group.name)));
        }
        let row = PredictionGroup {
            group_id: tables.next_id("prediction_groups"),
            name: group.name.clone(),
            admin_id: group.admin_id,
            tournament_id: group.tournament_id,
        };
        tables.groups.insert(row.group_id, row.clone());
        Ok(row)
    }

    fn find_group(&self, group_id: GroupId) -> Result<Option<PredictionGroup>> {
        Ok(self.tables().groups.get(&group_id).cloned())
    }

    fn lock_group(&self, group_id: GroupId) -> Result<Option<PredictionGroup>> {
        self.find_group(group_id)
    }

    fn rename_group(&self, group_id: GroupId, name: &str) -> Result<PredictionGroup> {
        let mut tables = self.tables();
        let tournament_id = tables
            .groups
            .get(&group_id)
            .map(|g| g.tournament_id)
            .ok_or_else(|| missing("group", group_id))?;
        if tables
            .groups
            .values()
            .any(|g| g.group_id != group_id && g.tournament_id == tournament_id && g.name == name)
        {
            return Err(Error::conflict(format!("group {} already exists", name)));
        }
        let group = tables.groups.get_mut(&group_id).ok_or_else(|| missing("group", group_id))?;
        group.name = name.to_owned();
        Ok(group.clone())
    }

    fn delete_group(&self, group_id: GroupId) -> Result<usize> {
        let mut tables = self.tables();
        tables.invites.remove(&group_id);
        tables.members.retain(|key, _| key.0 != group_id);
        Ok(tables.groups.remove(&group_id).map_or(0, |_| 1))
    }

    fn list_groups_for_user(
        &self,
        user_id: UserId,
        tournament_id: Option<TournamentId>,
    ) -> Result<Vec<PredictionGroup>> {
        let tables = self.tables();
        Ok(tables
            .groups
            .values()
            .filter(|g| tables.members.contains_key(&(g.group_id, user_id)))
            .filter(|g| tournament_id.map_or(true, |t| g.tournament_id == t))
            .cloned()
            .collect())
    }

    fn insert_member(&self, member: &NewGroupMember) -> Result<GroupMember> {
        let mut tables = self.tables();
        tables.require_user(member.user_id)?;
        require(tables.groups.contains_key(&member.group_id), "group", member.group_id)?;
        let key = (member.group_id, member.user_id);
        if tables.members.contains_key(&key) {
            return Err(Error::conflict(format!(
                "user {} is already a member of group {}",
                member.user_id, member.group_id
            )));
        }
        let row = GroupMember {
            group_id: member.group_id,
            user_id: member.user_id,
            joined_at: Utc::now(),
        };
        tables.members.insert(key, row.clone());
        Ok(row)
    }

    fn delete_member(&self, group_id: GroupId, user_id: UserId) -> Result<usize> {
        Ok(self
            .tables()
            .members
            .remove(&(group_id, user_id))
            .map_or(0, |_| 1))
    }

    fn is_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        Ok(self.tables().members.contains_key(&(group_id, user_id)))
    }

    fn count_members(&self, group_id: GroupId) -> Result<i64> {
        Ok(self
            .tables()
            .members
            .keys()
            .filter(|key| key.0 == group_id)
            .count() as i64)
    }

    fn list_members(&self, group_id: GroupId) -> Result<Vec<(GroupMember, User)>> {
        let tables = self.tables();
        let mut rows = tables
            .members
            .values()
            .filter(|m| m.group_id == group_id)
            .filter_map(|m| tables.users.get(&m.user_id).map(|u| (m.clone(), u.clone())))
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| (a.0.joined_at, a.0.user_id).cmp(&(b.0.joined_at, b.0.user_id)));
        Ok(rows)
    }

    fn list_member_scores(
        &self,
        group_id: GroupId,
        tournament_id: TournamentId,
    ) -> Result<Vec<(User, Option<i32>)>> {
        let tables = self.tables();
        Ok(tables
            .members
            .values()
            .filter(|m| m.group_id == group_id)
            .filter_map(|m| tables.users.get(&m.user_id))
            .map(|u| {
                let score = tables.scores.get(&(u.user_id, tournament_id)).map(|s| s.score);
                (u.clone(), score)
            })
            .collect())
    }

    fn find_invite_by_group(&self, group_id: GroupId) -> Result<Option<GroupInvite>> {
        Ok(self.tables().invites.get(&group_id).cloned())
    }

    fn find_invite_by_code(&self, code: &str) -> Result<Option<GroupInvite>> {
        Ok(self
            .tables()
            .invites
            .values()
            .find(|invite| invite.code == code)
            .cloned())
    }

    fn insert_invite(&self, invite: &GroupInvite) -> Result<GroupInvite> {
        let mut tables = self.tables();
        require(tables.groups.contains_key(&invite.group_id), "group", invite.group_id)?;
        if tables.invites.contains_key(&invite.group_id) {
            return Err(Error::conflict(format!(
                "group {} already has an invite code",
                invite.group_id
            )));
        }
        if tables.invites.values().any(|i| i.code == invite.code) {
            return Err(Error::conflict("invite code already in use"));
        }
        tables.invites.insert(invite.group_id, invite.clone());
        Ok(invite.clone())
    }

    fn update_invite_code(&self, group_id: GroupId, code: &str) -> Result<GroupInvite> {
        let mut tables = self.tables();
        if tables
            .invites
            .values()
            .any(|i| i.group_id != group_id && i.code == code)
        {
            return Err(Error::conflict("invite code already in use"));
        }
        let invite = tables
            .invites
            .get_mut(&group_id)
            .ok_or_else(|| missing("invite code for group", group_id))?;
        invite.code = code.to_owned();
        Ok(invite.clone())
    }

    fn upsert_score(&self, user_id: UserId, tournament_id: TournamentId, score: i32) -> Result<TournamentScore> {
        let mut tables = self.tables();
        tables.require_user(user_id)?;
        tables.require_tournament(tournament_id)?;
        let row = TournamentScore {
            user_id,
            tournament_id,
            score,
            updated_at: Utc::now(),
        };
        tables.scores.insert((user_id, tournament_id), row.clone());
        Ok(row)
    }

    fn find_score(&self, user_id: UserId, tournament_id: TournamentId) -> Result<Option<TournamentScore>> {
        Ok(self.tables().scores.get(&(user_id, tournament_id)).cloned())
    }

    fn top_scores(&self, tournament_id: TournamentId, limit: i64) -> Result<Vec<(TournamentScore, User)>> {
        let tables = self.tables();
        let mut rows = tables
            .scores
            .values()
            .filter(|s| s.tournament_id == tournament_id)
            .filter_map(|s| tables.users.get(&s.user_id).map(|u| (s.clone(), u.clone())))
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.0.score.cmp(&a.0.score).then(a.0.user_id.cmp(&b.0.user_id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    fn count_scores_above(&self, tournament_id: TournamentId, score: i32) -> Result<i64> {
        Ok(self
            .tables()
            .scores
            .values()
            .filter(|s| s.tournament_id == tournament_id && s.score > score)
            .count() as i64)
    }

    fn dashboard_stats(&self) -> Result<DashboardStats> {
        let tables = self.tables();
        Ok(DashboardStats {
            user_count: tables.users.len() as i64,
            tournament_count: tables.tournaments.len() as i64,
            group_count: tables.groups.len() as i64,
            match_prediction_count: tables.match_predictions.len() as i64,
        })
    }
}
