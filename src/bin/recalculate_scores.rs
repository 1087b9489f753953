//! Rebuilds a tournament's score table from its predictions and prints the
//! top of the leaderboard.
//!
//! Usage: `recalculate_scores <tournament id> [limit]`

use log::info;
use std::env;

use tournament_predictions::app_state::AppState;
use tournament_predictions::config::Config;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let tournament_id = args
        .next()
        .and_then(|arg| arg.parse::<i32>().ok())
        .expect("Usage: recalculate_scores <tournament id> [limit]");
    let limit = args.next().map(|arg| arg.parse::<usize>().expect("limit must be a number"));

    let config = Config::from_env().expect("Invalid configuration");
    let state = AppState::connect(&config).expect("Could not connect to the database");

    let scored = state
        .scoring
        .rescore_tournament(tournament_id)
        .expect("Rescoring failed");
    info!("Recalculated {} scores", scored);

    let standings = state
        .leaderboard
        .get_leaderboard(tournament_id, limit)
        .expect("Could not load the leaderboard");
    for standing in standings {
        println!(
            "{:>4}  {:<32} {:>5}",
            standing.rank, standing.display_name, standing.score
        );
    }
}
