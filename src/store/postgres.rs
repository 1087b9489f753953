use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::{delete, insert_into, update};
use std::thread;

use super::{Repository, Store};
use crate::config::{Config, RetryPolicy};
use crate::error::{Error, Result};
use crate::models::*;
use crate::schema::{
    group_invites, group_members, match_predictions, matches, prediction_groups,
    tournament_groups, tournament_scores, tournament_teams, tournaments, users,
    winner_predictions,
};

/// Postgres-backed store: a pool of connections, every transaction
/// `SERIALIZABLE` and retried with backoff when Postgres aborts it.
pub struct PgStore {
    pool: Pool<ConnectionManager<PgConnection>>,
    retry: RetryPolicy,
}

impl PgStore {
    pub fn connect(config: &Config) -> Result<PgStore> {
        let manager = ConnectionManager::<PgConnection>::new(config.database_url()?);
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .build(manager)
            .map_err(|error| Error::Store(error.to_string()))?;

        info!("Connected to Postgres with a pool of {}", config.pool_size);
        Ok(PgStore {
            pool,
            retry: config.retry,
        })
    }
}

impl Store for PgStore {
    type Conn = PgConnection;

    fn transaction<T, F>(&self, mut f: F) -> Result<T>
    where
        F: FnMut(&PgConnection) -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let connection = self
                .pool
                .get()
                .map_err(|error| Error::Store(error.to_string()))?;

            let result = connection
                .build_transaction()
                .serializable()
                .run(|| f(&*connection));

            match result {
                Err(ref error) if error.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Transaction attempt {} failed ({}), retrying in {:?}",
                        attempt, error, delay
                    );
                    thread::sleep(delay);
                }
                result => return result,
            }
        }
    }
}

impl Repository for PgConnection {
    fn insert_user(&self, user: &NewUser) -> Result<User> {
        Ok(insert_into(users::table).values(user).get_result(self)?)
    }

    fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(users::table
            .find(user_id)
            .first::<User>(self)
            .optional()?)
    }

    fn update_profile(&self, user_id: UserId, changes: &ProfileChanges) -> Result<User> {
        Ok(update(users::table.find(user_id))
            .set(changes)
            .get_result(self)?)
    }

    fn update_role(&self, user_id: UserId, role: Role) -> Result<User> {
        Ok(update(users::table.find(user_id))
            .set(users::role.eq(role))
            .get_result(self)?)
    }

    fn insert_tournament(&self, tournament: &NewTournament) -> Result<Tournament> {
        Ok(insert_into(tournaments::table)
            .values(tournament)
            .get_result(self)?)
    }

    fn find_tournament(&self, tournament_id: TournamentId) -> Result<Option<Tournament>> {
        Ok(tournaments::table
            .find(tournament_id)
            .first::<Tournament>(self)
            .optional()?)
    }

    fn lock_tournament(&self, tournament_id: TournamentId) -> Result<Option<Tournament>> {
        Ok(tournaments::table
            .find(tournament_id)
            .for_update()
            .get_result::<Tournament>(self)
            .optional()?)
    }

    fn list_tournaments(&self) -> Result<Vec<Tournament>> {
        Ok(tournaments::table
            .order(tournaments::tournament_id.asc())
            .load(self)?)
    }

    fn latest_tournament(&self) -> Result<Option<Tournament>> {
        Ok(tournaments::table
            .order(tournaments::tournament_id.desc())
            .first::<Tournament>(self)
            .optional()?)
    }

    fn update_tournament_progress(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
        stage: Round,
    ) -> Result<Tournament> {
        Ok(update(tournaments::table.find(tournament_id))
            .set((
                tournaments::status.eq(status),
                tournaments::current_stage.eq(stage),
            ))
            .get_result(self)?)
    }

    fn insert_tournament_group(&self, group: &NewTournamentGroup) -> Result<TournamentGroup> {
        Ok(insert_into(tournament_groups::table)
            .values(group)
            .get_result(self)?)
    }

    fn find_tournament_group(&self, id: TournamentGroupId) -> Result<Option<TournamentGroup>> {
        Ok(tournament_groups::table
            .find(id)
            .first::<TournamentGroup>(self)
            .optional()?)
    }

    fn list_tournament_groups(&self, tournament_id: TournamentId) -> Result<Vec<TournamentGroup>> {
        Ok(tournament_groups::table
            .filter(tournament_groups::tournament_id.eq(tournament_id))
            .order(tournament_groups::name.asc())
            .load(self)?)
    }

    fn rename_tournament_group(&self, id: TournamentGroupId, name: &str) -> Result<TournamentGroup> {
        Ok(update(tournament_groups::table.find(id))
            .set(tournament_groups::name.eq(name))
            .get_result(self)?)
    }

    fn insert_team(&self, team: &NewTournamentTeam) -> Result<TournamentTeam> {
        Ok(insert_into(tournament_teams::table)
            .values(team)
            .get_result(self)?)
    }

    fn find_team(&self, team_id: TeamId) -> Result<Option<TournamentTeam>> {
        Ok(tournament_teams::table
            .find(team_id)
            .first::<TournamentTeam>(self)
            .optional()?)
    }

    fn list_teams(&self, tournament_id: TournamentId) -> Result<Vec<TournamentTeam>> {
        Ok(tournament_teams::table
            .filter(tournament_teams::tournament_id.eq(tournament_id))
            .order(tournament_teams::team_id.asc())
            .load(self)?)
    }

    fn update_team(&self, team_id: TeamId, changes: &TeamChanges) -> Result<TournamentTeam> {
        Ok(update(tournament_teams::table.find(team_id))
            .set(changes)
            .get_result(self)?)
    }

    fn update_team_status(&self, team_id: TeamId, status: TeamStatus) -> Result<TournamentTeam> {
        Ok(update(tournament_teams::table.find(team_id))
            .set(tournament_teams::status.eq(status))
            .get_result(self)?)
    }

    fn update_group_points(&self, team_id: TeamId, points: Option<i32>) -> Result<TournamentTeam> {
        Ok(update(tournament_teams::table.find(team_id))
            .set(tournament_teams::group_points.eq(points))
            .get_result(self)?)
    }

    fn insert_match(&self, game: &NewMatch) -> Result<Match> {
        Ok(insert_into(matches::table).values(game).get_result(self)?)
    }

    fn find_match(&self, match_id: MatchId) -> Result<Option<Match>> {
        Ok(matches::table
            .find(match_id)
            .first::<Match>(self)
            .optional()?)
    }

    fn lock_match(&self, match_id: MatchId) -> Result<Option<Match>> {
        Ok(matches::table
            .find(match_id)
            .for_update()
            .get_result::<Match>(self)
            .optional()?)
    }

    fn list_matches(&self, tournament_id: TournamentId) -> Result<Vec<Match>> {
        Ok(matches::table
            .filter(matches::tournament_id.eq(tournament_id))
            .order((matches::kickoff.asc(), matches::match_id.asc()))
            .load(self)?)
    }

    fn update_match_schedule(&self, match_id: MatchId, schedule: &MatchSchedule) -> Result<Match> {
        Ok(update(matches::table.find(match_id))
            .set(schedule)
            .get_result(self)?)
    }

    fn update_match_result(&self, match_id: MatchId, result: &MatchResult) -> Result<Match> {
        Ok(update(matches::table.find(match_id))
            .set(result)
            .get_result(self)?)
    }

    fn upsert_match_prediction(&self, prediction: &MatchPredictionForm) -> Result<MatchPrediction> {
        Ok(insert_into(match_predictions::table)
            .values(prediction)
            .on_conflict((match_predictions::user_id, match_predictions::match_id))
            .do_update()
            .set(prediction)
            .get_result(self)?)
    }

    fn list_match_predictions(&self, tournament_id: TournamentId) -> Result<Vec<MatchPrediction>> {
        Ok(match_predictions::table
            .inner_join(matches::table)
            .filter(matches::tournament_id.eq(tournament_id))
            .select(match_predictions::all_columns)
            .order(match_predictions::match_prediction_id.asc())
            .load(self)?)
    }

    fn list_user_match_predictions(
        &self,
        user_id: UserId,
        tournament_id: TournamentId,
    ) -> Result<Vec<(MatchPrediction, Match)>> {
        Ok(match_predictions::table
            .inner_join(matches::table)
            .filter(match_predictions::user_id.eq(user_id))
            .filter(matches::tournament_id.eq(tournament_id))
            .order((matches::kickoff.asc(), matches::match_id.asc()))
            .load::<(MatchPrediction, Match)>(self)?)
    }

    fn upsert_winner_prediction(&self, prediction: &WinnerPredictionForm) -> Result<WinnerPrediction> {
        Ok(insert_into(winner_predictions::table)
            .values(prediction)
            .on_conflict((
                winner_predictions::user_id,
                winner_predictions::tournament_id,
                winner_predictions::round,
            ))
            .do_update()
            .set(winner_predictions::team_id.eq(prediction.team_id))
            .get_result(self)?)
    }

    fn list_winner_predictions(&self, tournament_id: TournamentId) -> Result<Vec<WinnerPrediction>> {
        Ok(winner_predictions::table
            .filter(winner_predictions::tournament_id.eq(tournament_id))
            .order(winner_predictions::winner_prediction_id.asc())
            .load(self)?)
    }

    fn list_user_winner_predictions(
        &self,
        user_id: UserId,
        tournament_id: TournamentId,
    ) -> Result<Vec<WinnerPrediction>> {
        Ok(winner_predictions::table
            .filter(winner_predictions::user_id.eq(user_id))
            .filter(winner_predictions::tournament_id.eq(tournament_id))
            .order(winner_predictions::round.asc())
            .load(self)?)
    }

    fn insert_group(&self, group: &NewPredictionGroup) -> Result<PredictionGroup> {
        Ok(insert_into(prediction_groups::table)
            .values(group)
            .get_result(self)?)
    }

    fn find_group(&self, group_id: GroupId) -> Result<Option<PredictionGroup>> {
        Ok(prediction_groups::table
            .find(group_id)
            .first::<PredictionGroup>(self)
            .optional()?)
    }

    fn lock_group(&self, group_id: GroupId) -> Result<Option<PredictionGroup>> {
        Ok(prediction_groups::table
            .find(group_id)
            .for_update()
            .get_result::<PredictionGroup>(self)
            .optional()?)
    }

    fn rename_group(&self, group_id: GroupId, name: &str) -> Result<PredictionGroup> {
        Ok(update(prediction_groups::table.find(group_id))
            .set(prediction_groups::name.eq(name))
            .get_result(self)?)
    }

    fn delete_group(&self, group_id: GroupId) -> Result<usize> {
        delete(group_invites::table.filter(group_invites::group_id.eq(group_id))).execute(self)?;
        delete(group_members::table.filter(group_members::group_id.eq(group_id))).execute(self)?;
        Ok(delete(prediction_groups::table.find(group_id)).execute(self)?)
    }

    fn list_groups_for_user(
        &self,
        user_id: UserId,
        tournament_id: Option<TournamentId>,
    ) -> Result<Vec<PredictionGroup>> {
        let groups = prediction_groups::table
            .inner_join(group_members::table)
            .filter(group_members::user_id.eq(user_id))
            .select(prediction_groups::all_columns)
            .order(prediction_groups::group_id.asc());

        Ok(match tournament_id {
            Some(tournament_id) => groups
                .filter(prediction_groups::tournament_id.eq(tournament_id))
                .load(self)?,
            None => groups.load(self)?,
        })
    }

    fn insert_member(&self, member: &NewGroupMember) -> Result<GroupMember> {
        Ok(insert_into(group_members::table)
            .values(member)
            .get_result(self)?)
    }

    fn delete_member(&self, group_id: GroupId, user_id: UserId) -> Result<usize> {
        Ok(delete(group_members::table.find((group_id, user_id))).execute(self)?)
    }

    fn is_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        use diesel::dsl::exists;

        Ok(diesel::select(exists(group_members::table.find((group_id, user_id))))
            .get_result(self)?)
    }

    fn count_members(&self, group_id: GroupId) -> Result<i64> {
        Ok(group_members::table
            .filter(group_members::group_id.eq(group_id))
            .count()
            .get_result(self)?)
    }

    fn list_members(&self, group_id: GroupId) -> Result<Vec<(GroupMember, User)>> {
        Ok(group_members::table
            .inner_join(users::table)
            .filter(group_members::group_id.eq(group_id))
            .order((group_members::joined_at.asc(), group_members::user_id.asc()))
            .load::<(GroupMember, User)>(self)?)
    }

    fn list_member_scores(
        &self,
        group_id: GroupId,
        tournament_id: TournamentId,
    ) -> Result<Vec<(User, Option<i32>)>> {
        Ok(group_members::table
            .inner_join(users::table)
            .left_join(
                tournament_scores::table.on(tournament_scores::user_id
                    .eq(group_members::user_id)
                    .and(tournament_scores::tournament_id.eq(tournament_id))),
            )
            .filter(group_members::group_id.eq(group_id))
            .select((users::all_columns, tournament_scores::score.nullable()))
            .load::<(User, Option<i32>)>(self)?)
    }

    fn find_invite_by_group(&self, group_id: GroupId) -> Result<Option<GroupInvite>> {
        Ok(group_invites::table
            .find(group_id)
            .first::<GroupInvite>(self)
            .optional()?)
    }

    fn find_invite_by_code(&self, code: &str) -> Result<Option<GroupInvite>> {
        Ok(group_invites::table
            .filter(group_invites::code.eq(code))
            .first::<GroupInvite>(self)
            .optional()?)
    }

    // Code writes run in a savepoint: a collision on the unique code must
    // leave the surrounding transaction usable for another attempt.
    fn insert_invite(&self, invite: &GroupInvite) -> Result<GroupInvite> {
        self.transaction::<_, Error, _>(|| {
            Ok(insert_into(group_invites::table)
                .values(invite)
                .get_result(self)?)
        })
    }

    fn update_invite_code(&self, group_id: GroupId, code: &str) -> Result<GroupInvite> {
        self.transaction::<_, Error, _>(|| {
            Ok(update(group_invites::table.find(group_id))
                .set(group_invites::code.eq(code))
                .get_result(self)?)
        })
    }

    fn upsert_score(&self, user_id: UserId, tournament_id: TournamentId, score: i32) -> Result<TournamentScore> {
        let now = Utc::now();

        Ok(insert_into(tournament_scores::table)
            .values((
                tournament_scores::user_id.eq(user_id),
                tournament_scores::tournament_id.eq(tournament_id),
                tournament_scores::score.eq(score),
                tournament_scores::updated_at.eq(now),
            ))
            .on_conflict((tournament_scores::user_id, tournament_scores::tournament_id))
            .do_update()
            .set((
                tournament_scores::score.eq(score),
                tournament_scores::updated_at.eq(now),
            ))
            .get_result(self)?)
    }

    fn find_score(&self, user_id: UserId, tournament_id: TournamentId) -> Result<Option<TournamentScore>> {
        Ok(tournament_scores::table
            .find((user_id, tournament_id))
            .first::<TournamentScore>(self)
            .optional()?)
    }

    fn top_scores(&self, tournament_id: TournamentId, limit: i64) -> Result<Vec<(TournamentScore, User)>> {
        Ok(tournament_scores::table
            .inner_join(users::table)
            .filter(tournament_scores::tournament_id.eq(tournament_id))
            .order((tournament_scores::score.desc(), tournament_scores::user_id.asc()))
            .limit(limit)
            .load::<(TournamentScore, User)>(self)?)
    }

    fn count_scores_above(&self, tournament_id: TournamentId, score: i32) -> Result<i64> {
        Ok(tournament_scores::table
            .filter(tournament_scores::tournament_id.eq(tournament_id))
            .filter(tournament_scores::score.gt(score))
            .count()
            .get_result(self)?)
    }

    fn dashboard_stats(&self) -> Result<DashboardStats> {
        Ok(DashboardStats {
            user_count: users::table.count().get_result(self)?,
            tournament_count: tournaments::table.count().get_result(self)?,
            group_count: prediction_groups::table.count().get_result(self)?,
            match_prediction_count: match_predictions::table.count().get_result(self)?,
        })
    }
}
