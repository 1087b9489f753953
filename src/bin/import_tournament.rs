//! Loads a tournament from a directory of CSV files:
//!
//! * `tournament.csv`: name, location, start_date, end_date (one row)
//! * `groups.csv`: name
//! * `teams.csv`: name, flag, group
//! * `matches.csv`: team_a, team_b, stadium, kickoff, round
//!
//! Everything is inserted in one transaction, a bad row imports nothing.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::path::Path;

use tournament_predictions::config::Config;
use tournament_predictions::models::*;
use tournament_predictions::store::{PgStore, Repository, Store};
use tournament_predictions::Error as ImportError;

#[derive(Deserialize, Debug)]
struct TournamentRow {
    name: String,
    location: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
struct GroupRow {
    name: String,
}

#[derive(Deserialize, Debug)]
struct TeamRow {
    name: String,
    flag: String,
    group: String,
}

#[derive(Deserialize, Debug)]
struct MatchRow {
    team_a: String,
    team_b: String,
    stadium: String,
    kickoff: DateTime<Utc>,
    round: Round,
}

fn read_rows<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>, Box<dyn Error>> {
    let mut rdr = csv::Reader::from_path(dir.join(file))?;
    let mut rows = Vec::new();
    for row in rdr.deserialize::<T>() {
        rows.push(row?);
    }
    Ok(rows)
}

fn lookup<'a, T>(by_name: &'a HashMap<String, T>, what: &str, name: &str) -> Result<&'a T, ImportError> {
    by_name
        .get(name)
        .ok_or_else(|| ImportError::not_found(format!("{} {}", what, name)))
}

fn import<R: Repository>(
    conn: &R,
    tournament: &TournamentRow,
    groups: &[GroupRow],
    teams: &[TeamRow],
    matches: &[MatchRow],
) -> Result<Tournament, ImportError> {
    let inserted = conn.insert_tournament(&NewTournament {
        name: tournament.name.clone(),
        location: tournament.location.clone(),
        start_date: tournament.start_date,
        end_date: tournament.end_date,
    })?;
    let tournament_id = inserted.tournament_id;

    let mut group_ids = HashMap::new();
    for record in groups {
        let group = conn.insert_tournament_group(&NewTournamentGroup {
            tournament_id,
            name: record.name.clone(),
        })?;
        debug!("{:?}", group);
        group_ids.insert(group.name, group.tournament_group_id);
    }

    let mut team_ids = HashMap::new();
    for record in teams {
        let team = conn.insert_team(&NewTournamentTeam {
            tournament_id,
            tournament_group_id: *lookup(&group_ids, "bracket group", &record.group)?,
            name: record.name.clone(),
            flag: record.flag.clone(),
        })?;
        debug!("{:?}", team);
        team_ids.insert(team.name, team.team_id);
    }

    for record in matches {
        let team_a_id = *lookup(&team_ids, "team", &record.team_a)?;
        let team_b_id = *lookup(&team_ids, "team", &record.team_b)?;
        if team_a_id == team_b_id {
            return Err(ImportError::validation(format!(
                "{} cannot play against itself",
                record.team_a
            )));
        }
        let game = conn.insert_match(&NewMatch {
            tournament_id,
            team_a_id,
            team_b_id,
            stadium: record.stadium.clone(),
            kickoff: record.kickoff,
            round: record.round,
        })?;
        debug!("{:?}", game);
    }

    Ok(inserted)
}

fn main() {
    env_logger::init();

    let dir = env::args().nth(1).unwrap_or_else(|| "data".to_owned());
    let dir = Path::new(&dir);

    let config = Config::from_env().expect("Invalid configuration");
    let store = PgStore::connect(&config).expect("Could not connect to the database");

    let tournament = read_rows::<TournamentRow>(dir, "tournament.csv")
        .expect("Could not read tournament.csv")
        .into_iter()
        .next()
        .expect("tournament.csv has no rows");
    let groups = read_rows::<GroupRow>(dir, "groups.csv").expect("Could not read groups.csv");
    let teams = read_rows::<TeamRow>(dir, "teams.csv").expect("Could not read teams.csv");
    let matches = read_rows::<MatchRow>(dir, "matches.csv").expect("Could not read matches.csv");

    let inserted = store
        .transaction(|conn| import(conn, &tournament, &groups, &teams, &matches))
        .expect("Import failed");

    info!(
        "Imported tournament {} ({}): {} bracket groups, {} teams, {} matches",
        inserted.tournament_id,
        inserted.name,
        groups.len(),
        teams.len(),
        matches.len()
    );
}
