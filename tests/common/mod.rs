#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use tournament_predictions::app_state::AppState;
use tournament_predictions::auth::CurrentUser;
use tournament_predictions::config::Config;
use tournament_predictions::models::*;
use tournament_predictions::store::{MemoryStore, Repository, Store};

pub struct World {
    pub state: AppState<MemoryStore>,
    pub admin: CurrentUser,
    pub tournament: Tournament,
    pub teams: Vec<TournamentTeam>,
}

impl World {
    pub fn new() -> World {
        World::with_config(Config::default())
    }

    /// A tournament with one bracket group of four teams and an admin.
    pub fn with_config(config: Config) -> World {
        let state = AppState::new(Arc::new(MemoryStore::new()), &config);
        let admin = register(&state, "organiser");
        let admin = state
            .store
            .transaction(|conn| conn.update_role(admin.user_id, Role::Admin))
            .map(|user| CurrentUser::from(&user))
            .unwrap();

        let start = Utc.ymd(2026, 6, 11).and_hms(0, 0, 0);
        let tournament = state
            .tournaments
            .create_tournament(
                &admin,
                &NewTournament {
                    name: "World Cup".to_owned(),
                    location: "North America".to_owned(),
                    start_date: start,
                    end_date: start + Duration::days(38),
                },
            )
            .unwrap();
        let group = state
            .tournaments
            .create_tournament_group(&admin, tournament.tournament_id, "Group A")
            .unwrap();
        let teams = ["Mexico", "South Africa", "Korea Republic", "Czechia"]
            .iter()
            .map(|name| {
                state
                    .tournaments
                    .add_team(
                        &admin,
                        &NewTournamentTeam {
                            tournament_id: tournament.tournament_id,
                            tournament_group_id: group.tournament_group_id,
                            name: (*name).to_owned(),
                            flag: format!("{}.svg", name),
                        },
                    )
                    .unwrap()
            })
            .collect();

        World {
            state,
            admin,
            tournament,
            teams,
        }
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament.tournament_id
    }

    pub fn user(&self, name: &str) -> CurrentUser {
        register(&self.state, name)
    }

    pub fn schedule(&self, round: Round, team_a: usize, team_b: usize) -> Match {
        self.state
            .tournaments
            .schedule_match(
                &self.admin,
                &NewMatch {
                    tournament_id: self.tournament_id(),
                    team_a_id: self.teams[team_a].team_id,
                    team_b_id: self.teams[team_b].team_id,
                    stadium: "Estadio Azteca".to_owned(),
                    kickoff: self.tournament.start_date + Duration::hours(20),
                    round,
                },
            )
            .unwrap()
    }

    pub fn complete(&self, game: &Match, team_a_score: i32, team_b_score: i32) -> Match {
        self.state
            .tournaments
            .complete_match(&self.admin, game.match_id, team_a_score, team_b_score, None)
            .unwrap()
    }

    pub fn score_of(&self, user: &CurrentUser) -> Option<i32> {
        self.state
            .store
            .transaction(|conn| conn.find_score(user.user_id, self.tournament_id()))
            .unwrap()
            .map(|score| score.score)
    }
}

pub fn register(state: &AppState<MemoryStore>, name: &str) -> CurrentUser {
    let user = state
        .users
        .register_user(name, &format!("{}@example.com", name), None, None)
        .unwrap();
    CurrentUser::from(&user)
}
