#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum)]
#[PgType = "user_role"]
#[DieselType = "RoleMapping"]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, DbEnum)]
#[PgType = "tournament_status"]
#[DieselType = "TournamentStatusMapping"]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Upcoming,
    Ongoing,
    Completed,
}

/// Stages of a tournament, declared in playing order so the derived `Ord`
/// is the order in which a tournament moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, DbEnum)]
#[PgType = "round"]
#[DieselType = "RoundMapping"]
#[serde(rename_all = "snake_case")]
pub enum Round {
    #[db_rename = "group"]
    Group,
    #[db_rename = "round_of_32"]
    #[serde(rename = "round_of_32")]
    RoundOf32,
    #[db_rename = "round_of_16"]
    #[serde(rename = "round_of_16")]
    RoundOf16,
    #[db_rename = "quarter_final"]
    QuarterFinal,
    #[db_rename = "semi_final"]
    SemiFinal,
    #[db_rename = "third_place"]
    ThirdPlace,
    #[db_rename = "final"]
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum)]
#[PgType = "team_status"]
#[DieselType = "TeamStatusMapping"]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    Active,
    Eliminated,
    Winner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, DbEnum)]
#[PgType = "match_status"]
#[DieselType = "MatchStatusMapping"]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum)]
#[PgType = "penalty_side"]
#[DieselType = "PenaltySideMapping"]
#[serde(rename_all = "snake_case")]
pub enum PenaltySide {
    #[db_rename = "team_a"]
    TeamA,
    #[db_rename = "team_b"]
    TeamB,
}

table! {
    use diesel::sql_types::{Int4, Nullable, Timestamptz, Varchar};
    use super::RoleMapping;
    users (user_id) {
        user_id -> Int4,
        display_name -> Varchar,
        email -> Varchar,
        role -> RoleMapping,
        country -> Nullable<Varchar>,
        country_flag -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

table! {
    use diesel::sql_types::{Int4, Timestamptz, Varchar};
    use super::{RoundMapping, TournamentStatusMapping};
    tournaments (tournament_id) {
        tournament_id -> Int4,
        name -> Varchar,
        location -> Varchar,
        status -> TournamentStatusMapping,
        start_date -> Timestamptz,
        end_date -> Timestamptz,
        current_stage -> RoundMapping,
    }
}

table! {
    tournament_groups (tournament_group_id) {
        tournament_group_id -> Int4,
        tournament_id -> Int4,
        name -> Varchar,
    }
}

table! {
    use diesel::sql_types::{Int4, Nullable, Varchar};
    use super::TeamStatusMapping;
    tournament_teams (team_id) {
        team_id -> Int4,
        tournament_id -> Int4,
        tournament_group_id -> Int4,
        name -> Varchar,
        flag -> Varchar,
        status -> TeamStatusMapping,
        group_points -> Nullable<Int4>,
    }
}

table! {
    use diesel::sql_types::{Int4, Nullable, Timestamptz, Varchar};
    use super::{MatchStatusMapping, RoundMapping};
    matches (match_id) {
        match_id -> Int4,
        tournament_id -> Int4,
        team_a_id -> Int4,
        team_b_id -> Int4,
        stadium -> Varchar,
        kickoff -> Timestamptz,
        status -> MatchStatusMapping,
        round -> RoundMapping,
        team_a_score -> Nullable<Int4>,
        team_b_score -> Nullable<Int4>,
        penalty_winner_id -> Nullable<Int4>,
    }
}

table! {
    use diesel::sql_types::{Int4, Nullable, Timestamptz};
    use super::PenaltySideMapping;
    match_predictions (match_prediction_id) {
        match_prediction_id -> Int4,
        user_id -> Int4,
        match_id -> Int4,
        team_a_score -> Int4,
        team_b_score -> Int4,
        penalty_side -> Nullable<PenaltySideMapping>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    use diesel::sql_types::Int4;
    use super::RoundMapping;
    winner_predictions (winner_prediction_id) {
        winner_prediction_id -> Int4,
        user_id -> Int4,
        tournament_id -> Int4,
        round -> RoundMapping,
        team_id -> Int4,
    }
}

table! {
    prediction_groups (group_id) {
        group_id -> Int4,
        name -> Varchar,
        admin_id -> Int4,
        tournament_id -> Int4,
    }
}

table! {
    group_members (group_id, user_id) {
        group_id -> Int4,
        user_id -> Int4,
        joined_at -> Timestamptz,
    }
}

table! {
    group_invites (group_id) {
        group_id -> Int4,
        code -> Varchar,
    }
}

table! {
    tournament_scores (user_id, tournament_id) {
        user_id -> Int4,
        tournament_id -> Int4,
        score -> Int4,
        updated_at -> Timestamptz,
    }
}

joinable!(group_invites -> prediction_groups (group_id));
joinable!(group_members -> prediction_groups (group_id));
joinable!(group_members -> users (user_id));
joinable!(match_predictions -> matches (match_id));
joinable!(match_predictions -> users (user_id));
joinable!(matches -> tournaments (tournament_id));
joinable!(prediction_groups -> tournaments (tournament_id));
joinable!(prediction_groups -> users (admin_id));
joinable!(tournament_groups -> tournaments (tournament_id));
joinable!(tournament_scores -> tournaments (tournament_id));
joinable!(tournament_scores -> users (user_id));
joinable!(tournament_teams -> tournament_groups (tournament_group_id));
joinable!(tournament_teams -> tournaments (tournament_id));
joinable!(winner_predictions -> tournament_teams (team_id));
joinable!(winner_predictions -> tournaments (tournament_id));
joinable!(winner_predictions -> users (user_id));

allow_tables_to_appear_in_same_query!(
    group_invites,
    group_members,
    match_predictions,
    matches,
    prediction_groups,
    tournament_groups,
    tournament_scores,
    tournament_teams,
    tournaments,
    users,
    winner_predictions,
);
