mod common;

use common::World;
use tournament_predictions::config::{Config, LeaderboardLimits};
use tournament_predictions::store::{Repository, Store};

fn seed_scores(world: &World, scores: &[i32]) -> Vec<i32> {
    let tournament_id = world.tournament_id();
    scores
        .iter()
        .enumerate()
        .map(|(n, &score)| {
            let user = world.user(&format!("player{}", n));
            world
                .state
                .store
                .transaction(|conn| conn.upsert_score(user.user_id, tournament_id, score))
                .unwrap();
            user.user_id
        })
        .collect()
}

#[test]
fn leaderboard_is_sorted_with_ties_by_user_id() {
    let world = World::new();
    let ids = seed_scores(&world, &[3, 9, 3, 12, 0, 9]);

    let board = world
        .state
        .leaderboard
        .get_leaderboard(world.tournament_id(), None)
        .unwrap();

    let rows = board
        .iter()
        .map(|s| (s.rank, s.user_id, s.score))
        .collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![
            (1, ids[3], 12),
            (2, ids[1], 9),
            (2, ids[5], 9),
            (4, ids[0], 3),
            (4, ids[2], 3),
            (6, ids[4], 0),
        ]
    );
}

#[test]
fn limit_bounds_the_window() {
    let world = World::with_config(Config {
        leaderboard: LeaderboardLimits {
            default_limit: 3,
            max_limit: 4,
        },
        ..Config::default()
    });
    seed_scores(&world, &[1, 2, 3, 4, 5, 6]);
    let leaderboard = &world.state.leaderboard;
    let tournament_id = world.tournament_id();

    assert_eq!(leaderboard.get_leaderboard(tournament_id, None).unwrap().len(), 3);
    assert_eq!(leaderboard.get_leaderboard(tournament_id, Some(2)).unwrap().len(), 2);
    assert_eq!(leaderboard.get_leaderboard(tournament_id, Some(500)).unwrap().len(), 4);
    assert!(leaderboard.get_leaderboard(tournament_id, Some(0)).unwrap().is_empty());
}

#[test]
fn unknown_tournament_has_no_leaderboard() {
    let world = World::new();
    let board = world.state.leaderboard.get_leaderboard(4242, None);
    assert_eq!(board.map_err(|e| e.category()), Err("not_found"));
}

#[test]
fn user_rank_counts_strictly_better_scores() {
    let world = World::new();
    let ids = seed_scores(&world, &[10, 20, 20, 5]);
    let leaderboard = &world.state.leaderboard;
    let tournament_id = world.tournament_id();

    let rank = |user_id| {
        leaderboard
            .get_user_rank(tournament_id, user_id)
            .unwrap()
            .map(|s| s.rank)
    };
    assert_eq!(rank(ids[1]), Some(1));
    assert_eq!(rank(ids[2]), Some(1));
    assert_eq!(rank(ids[0]), Some(3));
    assert_eq!(rank(ids[3]), Some(4));

    let unscored = world.user("spectator");
    assert_eq!(rank(unscored.user_id), None);
}

#[test]
fn group_standings_rank_members_only() {
    let world = World::new();
    let ids = seed_scores(&world, &[7, 2]);
    let outsider = world.user("outsider");
    let admin = world.user("host");
    let (group, invite) = world
        .state
        .groups
        .create_group(&admin, world.tournament_id(), "Friends")
        .unwrap();

    let members = ids
        .iter()
        .map(|&user_id| {
            let user = world
                .state
                .store
                .transaction(|conn| conn.find_user(user_id))
                .unwrap()
                .unwrap();
            tournament_predictions::auth::CurrentUser::from(&user)
        })
        .collect::<Vec<_>>();
    for member in &members {
        world.state.groups.join(member, &invite.code).unwrap();
    }

    let standings = world
        .state
        .leaderboard
        .group_standings(&admin, group.group_id)
        .unwrap();
    let rows = standings
        .iter()
        .map(|s| (s.rank, s.user_id, s.score))
        .collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![(1, ids[0], 7), (2, ids[1], 2), (3, admin.user_id, 0)]
    );

    let peek = world.state.leaderboard.group_standings(&outsider, group.group_id);
    assert_eq!(peek.map_err(|e| e.category()), Err("forbidden"));
}
