mod common;

use common::World;
use tournament_predictions::models::*;
use tournament_predictions::store::{Repository, Store};

#[test]
fn exact_prediction_earns_exact_points() {
    let world = World::new();
    let alice = world.user("alice");
    let game = world.schedule(Round::Group, 0, 1);

    world
        .state
        .predictions
        .upsert_match_prediction(&alice, game.match_id, 2, 1, None)
        .unwrap();
    world.complete(&game, 2, 1);

    assert_eq!(world.score_of(&alice), Some(3));
}

#[test]
fn right_winner_wrong_score_earns_outcome_points() {
    let world = World::new();
    let alice = world.user("alice");
    let game = world.schedule(Round::Group, 0, 1);

    world
        .state
        .predictions
        .upsert_match_prediction(&alice, game.match_id, 2, 1, None)
        .unwrap();
    world.complete(&game, 3, 0);

    assert_eq!(world.score_of(&alice), Some(1));
}

#[test]
fn rescoring_is_idempotent() {
    let world = World::new();
    let alice = world.user("alice");
    let bob = world.user("bob");
    let first = world.schedule(Round::Group, 0, 1);
    let second = world.schedule(Round::Group, 2, 3);

    let predictions = &world.state.predictions;
    predictions.upsert_match_prediction(&alice, first.match_id, 1, 0, None).unwrap();
    predictions.upsert_match_prediction(&alice, second.match_id, 2, 2, None).unwrap();
    predictions.upsert_match_prediction(&bob, first.match_id, 0, 1, None).unwrap();

    world.complete(&first, 1, 0);
    world.complete(&second, 0, 0);
    let once = (world.score_of(&alice), world.score_of(&bob));

    world.state.scoring.score_match(first.match_id).unwrap();
    world.state.scoring.score_match(first.match_id).unwrap();
    world.state.scoring.rescore_tournament(world.tournament_id()).unwrap();

    assert_eq!(once, (Some(4), Some(0)));
    assert_eq!((world.score_of(&alice), world.score_of(&bob)), once);
}

#[test]
fn unfinished_matches_cannot_be_scored() {
    let world = World::new();
    let game = world.schedule(Round::Group, 0, 1);

    let scored = world.state.scoring.score_match(game.match_id);
    assert_eq!(scored.map_err(|e| e.category()), Err("invalid_state"));
}

#[test]
fn a_second_prediction_updates_the_first() {
    let world = World::new();
    let alice = world.user("alice");
    let game = world.schedule(Round::Group, 0, 1);

    let first = world
        .state
        .predictions
        .upsert_match_prediction(&alice, game.match_id, 0, 0, None)
        .unwrap();
    let second = world
        .state
        .predictions
        .upsert_match_prediction(&alice, game.match_id, 3, 1, None)
        .unwrap();

    assert_eq!(first.match_prediction_id, second.match_prediction_id);
    assert_eq!(first.created_at, second.created_at);

    let stored = world
        .state
        .predictions
        .list_user_predictions(&alice, world.tournament_id())
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        (stored[0].prediction.team_a_score, stored[0].prediction.team_b_score),
        (3, 1)
    );
    assert_eq!(stored[0].team_a.team_id, game.team_a_id);
    assert_eq!(stored[0].team_b.team_id, game.team_b_id);
}

#[test]
fn completed_matches_lock_their_predictions() {
    let world = World::new();
    let alice = world.user("alice");
    let game = world.schedule(Round::Group, 0, 1);
    world.complete(&game, 1, 1);

    let late = world
        .state
        .predictions
        .upsert_match_prediction(&alice, game.match_id, 1, 1, None);
    assert_eq!(late.map_err(|e| e.category()), Err("invalid_state"));
}

#[test]
fn negative_predictions_are_rejected() {
    let world = World::new();
    let alice = world.user("alice");
    let game = world.schedule(Round::Group, 0, 1);

    let invalid = world
        .state
        .predictions
        .upsert_match_prediction(&alice, game.match_id, -1, 2, None);
    assert_eq!(invalid.map_err(|e| e.category()), Err("validation_error"));
}

#[test]
fn penalty_shoot_outs_earn_a_bonus() {
    let world = World::new();
    let alice = world.user("alice");
    let bob = world.user("bob");
    let game = world.schedule(Round::QuarterFinal, 0, 1);

    let predictions = &world.state.predictions;
    predictions
        .upsert_match_prediction(&alice, game.match_id, 1, 1, Some(PenaltySide::TeamB))
        .unwrap();
    predictions
        .upsert_match_prediction(&bob, game.match_id, 1, 1, Some(PenaltySide::TeamA))
        .unwrap();

    let missing_winner = world
        .state
        .tournaments
        .complete_match(&world.admin, game.match_id, 1, 1, None);
    assert_eq!(missing_winner.map_err(|e| e.category()), Err("validation_error"));

    world
        .state
        .tournaments
        .complete_match(&world.admin, game.match_id, 1, 1, Some(game.team_b_id))
        .unwrap();

    assert_eq!(world.score_of(&alice), Some(4));
    assert_eq!(world.score_of(&bob), Some(3));
}

#[test]
fn winner_predictions_resolve_when_teams_finish() {
    let world = World::new();
    let alice = world.user("alice");
    let bob = world.user("bob");
    let tournament_id = world.tournament_id();
    let (mexico, korea) = (world.teams[0].team_id, world.teams[2].team_id);

    let predictions = &world.state.predictions;
    predictions
        .upsert_winner_prediction(&alice, tournament_id, Round::Final, mexico)
        .unwrap();
    predictions
        .upsert_winner_prediction(&bob, tournament_id, Round::SemiFinal, korea)
        .unwrap();

    let semi = world.schedule(Round::SemiFinal, 0, 2);
    world.complete(&semi, 2, 0);
    assert_eq!(world.score_of(&bob), Some(0));

    world.state.tournaments.eliminate_team(&world.admin, korea).unwrap();
    assert_eq!(world.score_of(&bob), Some(5));
    assert_eq!(world.score_of(&alice), Some(0));

    world.state.tournaments.crown_winner(&world.admin, mexico).unwrap();
    assert_eq!(world.score_of(&alice), Some(5));

    let too_late = predictions.upsert_winner_prediction(&bob, tournament_id, Round::Final, korea);
    assert_eq!(too_late.map_err(|e| e.category()), Err("invalid_state"));
}

#[test]
fn winner_prediction_is_one_per_round() {
    let world = World::new();
    let alice = world.user("alice");
    let tournament_id = world.tournament_id();

    let predictions = &world.state.predictions;
    let first = predictions
        .upsert_winner_prediction(&alice, tournament_id, Round::Final, world.teams[0].team_id)
        .unwrap();
    let second = predictions
        .upsert_winner_prediction(&alice, tournament_id, Round::Final, world.teams[1].team_id)
        .unwrap();

    assert_eq!(first.winner_prediction_id, second.winner_prediction_id);
    let stored = predictions
        .list_user_winner_predictions(&alice, tournament_id)
        .unwrap();
    assert_eq!(stored, vec![second]);
}

#[test]
fn winner_prediction_team_must_play_in_the_tournament() {
    let world = World::new();
    let alice = world.user("alice");

    let missing = world
        .state
        .predictions
        .upsert_winner_prediction(&alice, world.tournament_id(), Round::Final, 9999);
    assert_eq!(missing.map_err(|e| e.category()), Err("not_found"));
}

#[test]
fn teams_conclude_only_once() {
    let world = World::new();
    let team_id = world.teams[3].team_id;

    world.state.tournaments.eliminate_team(&world.admin, team_id).unwrap();
    let again = world.state.tournaments.eliminate_team(&world.admin, team_id);
    assert_eq!(again.map_err(|e| e.category()), Err("invalid_state"));

    let crowned = world.state.tournaments.crown_winner(&world.admin, team_id);
    assert_eq!(crowned.map_err(|e| e.category()), Err("invalid_state"));
}

#[test]
fn scores_are_written_for_every_predicting_user() {
    let world = World::new();
    let alice = world.user("alice");
    let game = world.schedule(Round::Group, 0, 1);
    world
        .state
        .predictions
        .upsert_match_prediction(&alice, game.match_id, 0, 4, None)
        .unwrap();

    world.state.scoring.rescore_tournament(world.tournament_id()).unwrap();

    let score = world
        .state
        .store
        .transaction(|conn| conn.find_score(alice.user_id, world.tournament_id()))
        .unwrap();
    assert_eq!(score.map(|s| s.score), Some(0));
}

#[test]
fn resolved_winner_picks_cannot_be_swapped() {
    let world = World::new();
    let alice = world.user("alice");
    let tournament_id = world.tournament_id();
    let (mexico, korea) = (world.teams[0].team_id, world.teams[2].team_id);

    let predictions = &world.state.predictions;
    let original = predictions
        .upsert_winner_prediction(&alice, tournament_id, Round::Final, korea)
        .unwrap();
    world.state.tournaments.eliminate_team(&world.admin, korea).unwrap();
    assert_eq!(world.score_of(&alice), Some(0));

    let swapped = predictions.upsert_winner_prediction(&alice, tournament_id, Round::Final, mexico);
    assert_eq!(swapped.map_err(|e| e.category()), Err("invalid_state"));

    world.state.tournaments.crown_winner(&world.admin, mexico).unwrap();
    assert_eq!(world.score_of(&alice), Some(0));
    assert_eq!(
        predictions.list_user_winner_predictions(&alice, tournament_id).unwrap(),
        vec![original]
    );
}

#[test]
fn open_winner_picks_can_still_change() {
    let world = World::new();
    let alice = world.user("alice");
    let tournament_id = world.tournament_id();

    let predictions = &world.state.predictions;
    predictions
        .upsert_winner_prediction(&alice, tournament_id, Round::SemiFinal, world.teams[1].team_id)
        .unwrap();
    world
        .state
        .tournaments
        .eliminate_team(&world.admin, world.teams[3].team_id)
        .unwrap();

    let changed = predictions
        .upsert_winner_prediction(&alice, tournament_id, Round::SemiFinal, world.teams[0].team_id)
        .unwrap();
    assert_eq!(changed.team_id, world.teams[0].team_id);
}

#[test]
fn rounds_already_reached_take_no_winner_picks() {
    let world = World::new();
    let bob = world.user("bob");
    let tournament_id = world.tournament_id();
    let (mexico, korea) = (world.teams[0].team_id, world.teams[2].team_id);
    let predictions = &world.state.predictions;

    let quarter = world.schedule(Round::QuarterFinal, 0, 1);
    let drawn = predictions.upsert_winner_prediction(&bob, tournament_id, Round::QuarterFinal, mexico);
    assert_eq!(drawn.map_err(|e| e.category()), Err("invalid_state"));

    world
        .state
        .tournaments
        .advance_stage(&world.admin, tournament_id, Round::QuarterFinal)
        .unwrap();
    world.complete(&quarter, 1, 0);
    let reached = predictions.upsert_winner_prediction(&bob, tournament_id, Round::QuarterFinal, korea);
    assert_eq!(reached.map_err(|e| e.category()), Err("invalid_state"));

    predictions
        .upsert_winner_prediction(&bob, tournament_id, Round::SemiFinal, mexico)
        .unwrap();

    world.state.tournaments.eliminate_team(&world.admin, mexico).unwrap();
    assert_eq!(world.score_of(&bob), Some(0));
}
