//! Persistence seam. Every component operation runs inside one
//! `Store::transaction`, and only talks to the rows through `Repository`.

use crate::error::Result;
use crate::models::*;

pub mod memory;
pub mod postgres;

pub use self::memory::MemoryStore;
pub use self::postgres::PgStore;

pub trait Store: Send + Sync {
    type Conn: Repository;

    /// Runs `f` atomically. Backends that can hit serialization conflicts
    /// retry `f` from scratch, so it must not have side effects outside `conn`.
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnMut(&Self::Conn) -> Result<T>;
}

/// Row access inside a transaction. Unique-key violations surface as
/// `Error::Conflict`, missing rows on update as `Error::NotFound`.
pub trait Repository {
    fn insert_user(&self, user: &NewUser) -> Result<User>;
    fn find_user(&self, user_id: UserId) -> Result<Option<User>>;
    fn update_profile(&self, user_id: UserId, changes: &ProfileChanges) -> Result<User>;
    fn update_role(&self, user_id: UserId, role: Role) -> Result<User>;

    fn insert_tournament(&self, tournament: &NewTournament) -> Result<Tournament>;
    fn find_tournament(&self, tournament_id: TournamentId) -> Result<Option<Tournament>>;
    /// Like `find_tournament`, but holds the row until the transaction ends.
    fn lock_tournament(&self, tournament_id: TournamentId) -> Result<Option<Tournament>>;
    fn list_tournaments(&self) -> Result<Vec<Tournament>>;
    /// The most recently created tournament.
    fn latest_tournament(&self) -> Result<Option<Tournament>>;
    fn update_tournament_progress(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
        stage: Round,
    ) -> Result<Tournament>;

    fn insert_tournament_group(&self, group: &NewTournamentGroup) -> Result<TournamentGroup>;
    fn find_tournament_group(&self, id: TournamentGroupId) -> Result<Option<TournamentGroup>>;
    fn list_tournament_groups(&self, tournament_id: TournamentId) -> Result<Vec<TournamentGroup>>;
    fn rename_tournament_group(&self, id: TournamentGroupId, name: &str) -> Result<TournamentGroup>;

    fn insert_team(&self, team: &NewTournamentTeam) -> Result<TournamentTeam>;
    fn find_team(&self, team_id: TeamId) -> Result<Option<TournamentTeam>>;
    fn list_teams(&self, tournament_id: TournamentId) -> Result<Vec<TournamentTeam>>;
    fn update_team(&self, team_id: TeamId, changes: &TeamChanges) -> Result<TournamentTeam>;
    fn update_team_status(&self, team_id: TeamId, status: TeamStatus) -> Result<TournamentTeam>;
    fn update_group_points(&self, team_id: TeamId, points: Option<i32>) -> Result<TournamentTeam>;

    fn insert_match(&self, game: &NewMatch) -> Result<Match>;
    fn find_match(&self, match_id: MatchId) -> Result<Option<Match>>;
    /// Like `find_match`, but holds the row until the transaction ends.
    fn lock_match(&self, match_id: MatchId) -> Result<Option<Match>>;
    fn list_matches(&self, tournament_id: TournamentId) -> Result<Vec<Match>>;
    fn update_match_schedule(&self, match_id: MatchId, schedule: &MatchSchedule) -> Result<Match>;
    fn update_match_result(&self, match_id: MatchId, result: &MatchResult) -> Result<Match>;

    fn upsert_match_prediction(&self, prediction: &MatchPredictionForm) -> Result<MatchPrediction>;
    fn list_match_predictions(&self, tournament_id: TournamentId) -> Result<Vec<MatchPrediction>>;
    /// A user's predictions in a tournament with their matches, by kickoff.
    fn list_user_match_predictions(
        &self,
        user_id: UserId,
        tournament_id: TournamentId,
    ) -> Result<Vec<(MatchPrediction, Match)>>;
    fn upsert_winner_prediction(&self, prediction: &WinnerPredictionForm) -> Result<WinnerPrediction>;
    fn list_winner_predictions(&self, tournament_id: TournamentId) -> Result<Vec<WinnerPrediction>>;
    fn list_user_winner_predictions(
        &self,
        user_id: UserId,
        tournament_id: TournamentId,
    ) -> Result<Vec<WinnerPrediction>>;

    fn insert_group(&self, group: &NewPredictionGroup) -> Result<PredictionGroup>;
    fn find_group(&self, group_id: GroupId) -> Result<Option<PredictionGroup>>;
    /// Like `find_group`, but holds the row until the transaction ends.
    fn lock_group(&self, group_id: GroupId) -> Result<Option<PredictionGroup>>;
    fn rename_group(&self, group_id: GroupId, name: &str) -> Result<PredictionGroup>;
    /// Deletes the group with its memberships and invite code.
    fn delete_group(&self, group_id: GroupId) -> Result<usize>;
    fn list_groups_for_user(
        &self,
        user_id: UserId,
        tournament_id: Option<TournamentId>,
    ) -> Result<Vec<PredictionGroup>>;

    fn insert_member(&self, member: &NewGroupMember) -> Result<GroupMember>;
    fn delete_member(&self, group_id: GroupId, user_id: UserId) -> Result<usize>;
    fn is_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool>;
    fn count_members(&self, group_id: GroupId) -> Result<i64>;
    fn list_members(&self, group_id: GroupId) -> Result<Vec<(GroupMember, User)>>;
    /// Every member of the group with their score in the tournament, if any.
    fn list_member_scores(
        &self,
        group_id: GroupId,
        tournament_id: TournamentId,
    ) -> Result<Vec<(User, Option<i32>)>>;

    fn find_invite_by_group(&self, group_id: GroupId) -> Result<Option<GroupInvite>>;
    fn find_invite_by_code(&self, code: &str) -> Result<Option<GroupInvite>>;
    fn insert_invite(&self, invite: &GroupInvite) -> Result<GroupInvite>;
    fn update_invite_code(&self, group_id: GroupId, code: &str) -> Result<GroupInvite>;

    fn upsert_score(&self, user_id: UserId, tournament_id: TournamentId, score: i32) -> Result<TournamentScore>;
    fn find_score(&self, user_id: UserId, tournament_id: TournamentId) -> Result<Option<TournamentScore>>;
    /// Highest scores first, ties by ascending user id.
    fn top_scores(&self, tournament_id: TournamentId, limit: i64) -> Result<Vec<(TournamentScore, User)>>;
    fn count_scores_above(&self, tournament_id: TournamentId, score: i32) -> Result<i64>;

    fn dashboard_stats(&self) -> Result<DashboardStats>;
}
