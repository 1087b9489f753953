use crate::schema::*;
use chrono::prelude::*;

pub use crate::schema::{MatchStatus, PenaltySide, Role, Round, TeamStatus, TournamentStatus};

pub type UserId = i32;
pub type TournamentId = i32;
pub type TournamentGroupId = i32;
pub type TeamId = i32;
pub type MatchId = i32;
pub type GroupId = i32;

impl Round {
    pub const ALL: [Round; 7] = [
        Round::Group,
        Round::RoundOf32,
        Round::RoundOf16,
        Round::QuarterFinal,
        Round::SemiFinal,
        Round::ThirdPlace,
        Round::Final,
    ];

    pub fn is_knockout(self) -> bool {
        self != Round::Group
    }
}

impl TournamentStatus {
    pub fn can_advance_to(self, next: TournamentStatus) -> bool {
        next > self
    }
}

impl MatchStatus {
    pub fn can_advance_to(self, next: MatchStatus) -> bool {
        next > self
    }
}

impl TeamStatus {
    /// `Eliminated` and `Winner` are final, a team never leaves them.
    pub fn is_terminal(self) -> bool {
        self != TeamStatus::Active
    }
}

#[derive(Queryable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[primary_key(user_id)]
#[table_name = "users"]
pub struct User {
    pub user_id: UserId,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub country: Option<String>,
    pub country_flag: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

#[derive(Insertable, Debug, Clone, Deserialize)]
#[table_name = "users"]
pub struct NewUser {
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub country: Option<String>,
    pub country_flag: Option<String>,
}

#[derive(AsChangeset, Debug, Clone, Default, Deserialize)]
#[table_name = "users"]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub country: Option<String>,
    pub country_flag: Option<String>,
}

#[derive(Queryable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[primary_key(tournament_id)]
#[table_name = "tournaments"]
pub struct Tournament {
    pub tournament_id: TournamentId,
    pub name: String,
    pub location: String,
    pub status: TournamentStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub current_stage: Round,
}

/// A tournament starts out `upcoming` in the group stage.
#[derive(Insertable, Debug, Clone, Deserialize)]
#[table_name = "tournaments"]
pub struct NewTournament {
    pub name: String,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Queryable, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentGroup {
    pub tournament_group_id: TournamentGroupId,
    pub tournament_id: TournamentId,
    pub name: String,
}

#[derive(Insertable, Debug, Clone, Deserialize)]
#[table_name = "tournament_groups"]
pub struct NewTournamentGroup {
    pub tournament_id: TournamentId,
    pub name: String,
}

#[derive(Queryable, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentTeam {
    pub team_id: TeamId,
    pub tournament_id: TournamentId,
    pub tournament_group_id: TournamentGroupId,
    pub name: String,
    pub flag: String,
    pub status: TeamStatus,
    pub group_points: Option<i32>,
}

#[derive(Insertable, Debug, Clone, Deserialize)]
#[table_name = "tournament_teams"]
pub struct NewTournamentTeam {
    pub tournament_id: TournamentId,
    pub tournament_group_id: TournamentGroupId,
    pub name: String,
    pub flag: String,
}

/// Fields an admin may edit on a team; `None` leaves a column as it is.
#[derive(AsChangeset, Debug, Clone, Default, Deserialize)]
#[table_name = "tournament_teams"]
pub struct TeamChanges {
    pub name: Option<String>,
    pub flag: Option<String>,
    pub tournament_group_id: Option<TournamentGroupId>,
}

impl TeamChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.flag.is_none() && self.tournament_group_id.is_none()
    }
}

#[derive(Queryable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[primary_key(match_id)]
#[table_name = "matches"]
pub struct Match {
    pub match_id: MatchId,
    pub tournament_id: TournamentId,
    pub team_a_id: TeamId,
    pub team_b_id: TeamId,
    pub stadium: String,
    pub kickoff: DateTime<Utc>,
    pub status: MatchStatus,
    pub round: Round,
    pub team_a_score: Option<i32>,
    pub team_b_score: Option<i32>,
    pub penalty_winner_id: Option<TeamId>,
}

impl Match {
    /// The final score, only available once the match is completed.
    pub fn final_score(&self) -> Option<(i32, i32)> {
        if self.status != MatchStatus::Completed {
            return None;
        }
        match (self.team_a_score, self.team_b_score) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.team_a_id == team_id || self.team_b_id == team_id
    }

    pub fn team_on(&self, side: PenaltySide) -> TeamId {
        match side {
            PenaltySide::TeamA => self.team_a_id,
            PenaltySide::TeamB => self.team_b_id,
        }
    }
}

/// A match is always scheduled as `upcoming` without scores.
#[derive(Insertable, Debug, Clone, Deserialize)]
#[table_name = "matches"]
pub struct NewMatch {
    pub tournament_id: TournamentId,
    pub team_a_id: TeamId,
    pub team_b_id: TeamId,
    pub stadium: String,
    pub kickoff: DateTime<Utc>,
    pub round: Round,
}

/// Rescheduling an upcoming match: a new venue, a new kickoff, or both.
#[derive(AsChangeset, Debug, Clone, Default, Deserialize)]
#[table_name = "matches"]
pub struct MatchSchedule {
    pub stadium: Option<String>,
    pub kickoff: Option<DateTime<Utc>>,
}

impl MatchSchedule {
    pub fn is_empty(&self) -> bool {
        self.stadium.is_none() && self.kickoff.is_none()
    }
}

#[derive(AsChangeset, Debug, Clone, PartialEq)]
#[table_name = "matches"]
#[changeset_options(treat_none_as_null = "true")]
pub struct MatchResult {
    pub status: MatchStatus,
    pub team_a_score: Option<i32>,
    pub team_b_score: Option<i32>,
    pub penalty_winner_id: Option<TeamId>,
}

impl MatchResult {
    pub fn started() -> MatchResult {
        MatchResult {
            status: MatchStatus::Ongoing,
            team_a_score: None,
            team_b_score: None,
            penalty_winner_id: None,
        }
    }

    pub fn completed(team_a_score: i32, team_b_score: i32, penalty_winner_id: Option<TeamId>) -> MatchResult {
        MatchResult {
            status: MatchStatus::Completed,
            team_a_score: Some(team_a_score),
            team_b_score: Some(team_b_score),
            penalty_winner_id,
        }
    }
}

#[derive(Queryable, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub match_prediction_id: i32,
    pub user_id: UserId,
    pub match_id: MatchId,
    pub team_a_score: i32,
    pub team_b_score: i32,
    pub penalty_side: Option<PenaltySide>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[table_name = "match_predictions"]
#[changeset_options(treat_none_as_null = "true")]
pub struct MatchPredictionForm {
    pub user_id: UserId,
    pub match_id: MatchId,
    pub team_a_score: i32,
    pub team_b_score: i32,
    pub penalty_side: Option<PenaltySide>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerPrediction {
    pub winner_prediction_id: i32,
    pub user_id: UserId,
    pub tournament_id: TournamentId,
    pub round: Round,
    pub team_id: TeamId,
}

#[derive(Insertable, Debug, Clone)]
#[table_name = "winner_predictions"]
pub struct WinnerPredictionForm {
    pub user_id: UserId,
    pub tournament_id: TournamentId,
    pub round: Round,
    pub team_id: TeamId,
}

#[derive(Queryable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[primary_key(group_id)]
#[table_name = "prediction_groups"]
pub struct PredictionGroup {
    pub group_id: GroupId,
    pub name: String,
    pub admin_id: UserId,
    pub tournament_id: TournamentId,
}

impl PredictionGroup {
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin_id == user_id
    }
}

#[derive(Insertable, Debug, Clone)]
#[table_name = "prediction_groups"]
pub struct NewPredictionGroup {
    pub name: String,
    pub admin_id: UserId,
    pub tournament_id: TournamentId,
}

#[derive(Queryable, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[table_name = "group_members"]
pub struct NewGroupMember {
    pub group_id: GroupId,
    pub user_id: UserId,
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[table_name = "group_invites"]
pub struct GroupInvite {
    pub group_id: GroupId,
    pub code: String,
}

#[derive(Queryable, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentScore {
    pub user_id: UserId,
    pub tournament_id: TournamentId,
    pub score: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub user_count: i64,
    pub tournament_count: i64,
    pub group_count: i64,
    pub match_prediction_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn game(status: MatchStatus, scores: (Option<i32>, Option<i32>)) -> Match {
        Match {
            match_id: 1,
            tournament_id: 1,
            team_a_id: 10,
            team_b_id: 20,
            stadium: "Lusail".to_owned(),
            kickoff: Utc.ymd(2022, 12, 18).and_hms(15, 0, 0),
            status,
            round: Round::Final,
            team_a_score: scores.0,
            team_b_score: scores.1,
            penalty_winner_id: None,
        }
    }

    #[test]
    fn rounds_are_totally_ordered_in_playing_order() {
        for pair in Round::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{:?} should precede {:?}", pair[0], pair[1]);
        }
        assert!(!Round::Group.is_knockout());
        assert!(Round::RoundOf16.is_knockout());
    }

    #[test]
    fn match_status_only_moves_forward() {
        assert!(MatchStatus::Upcoming.can_advance_to(MatchStatus::Ongoing));
        assert!(MatchStatus::Ongoing.can_advance_to(MatchStatus::Completed));
        assert!(!MatchStatus::Completed.can_advance_to(MatchStatus::Ongoing));
        assert!(!MatchStatus::Ongoing.can_advance_to(MatchStatus::Ongoing));
    }

    #[test]
    fn tournament_status_only_moves_forward() {
        assert!(TournamentStatus::Upcoming.can_advance_to(TournamentStatus::Completed));
        assert!(!TournamentStatus::Completed.can_advance_to(TournamentStatus::Upcoming));
    }

    #[test]
    fn final_score_requires_completion() {
        assert_eq!(game(MatchStatus::Ongoing, (Some(1), Some(0))).final_score(), None);
        assert_eq!(
            game(MatchStatus::Completed, (Some(3), Some(3))).final_score(),
            Some((3, 3))
        );
    }

    #[test]
    fn penalty_side_maps_to_team() {
        let game = game(MatchStatus::Upcoming, (None, None));
        assert_eq!(game.team_on(PenaltySide::TeamA), 10);
        assert_eq!(game.team_on(PenaltySide::TeamB), 20);
        assert!(game.involves(20));
        assert!(!game.involves(30));
    }

    #[test]
    fn terminal_team_statuses() {
        assert!(!TeamStatus::Active.is_terminal());
        assert!(TeamStatus::Eliminated.is_terminal());
        assert!(TeamStatus::Winner.is_terminal());
    }
}
