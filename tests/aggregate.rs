use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use cartola_robo::aggregate::{AggregateFilters, DisplayFilter, RoundRange, aggregate};
use cartola_robo::model::{PlayerRoundRecord, Position, Scout, ScoutCounts, Venue};
use cartola_robo::scoring;

fn record(player_id: u32, round_id: u32, price: f64, points: f64, scouts: ScoutCounts) -> PlayerRoundRecord {
    PlayerRoundRecord {
        player_id,
        round_id,
        name: format!("Player {player_id}"),
        position: Position::Midfielder,
        club_id: 262,
        club_name: "Flamengo".to_string(),
        photo_url: Some(format!("https://img/{player_id}/{round_id}.png")),
        price,
        round_points: points,
        played: true,
        scouts,
        opponent: None,
        venue: Venue::Unknown,
    }
}

fn season() -> Vec<PlayerRoundRecord> {
    vec![
        record(1, 1, 8.0, 4.5, ScoutCounts::new().with(Scout::Tackle, 2)),
        record(1, 2, 9.1, -1.5, ScoutCounts::new().with(Scout::Tackle, 3).with(Scout::YellowCard, 1)),
        record(1, 3, 9.6, 7.25, ScoutCounts::new().with(Scout::Tackle, 6).with(Scout::Goal, 1)),
        record(2, 1, 5.0, 2.0, ScoutCounts::new().with(Scout::FoulSuffered, 1)),
        record(2, 3, 4.4, 0.0, ScoutCounts::new().with(Scout::FoulSuffered, 2)),
        record(3, 2, 12.0, 10.0, ScoutCounts::new().with(Scout::ShotPost, 1)),
    ]
}

fn all_rounds() -> RoundRange {
    RoundRange::new(1, 3).unwrap()
}

#[test]
fn points_are_summed_regardless_of_row_order() {
    let base = aggregate(&season(), all_rounds(), &AggregateFilters::default());
    let p1 = base.iter().find(|p| p.player_id == 1).unwrap();
    assert!((p1.total_points - 10.25).abs() < 1e-9);
    assert_eq!(p1.rounds_played, 3);

    let mut rng = StdRng::seed_from_u64(26);
    for _ in 0..20 {
        let mut rows = season();
        rows.shuffle(&mut rng);
        let shuffled = aggregate(&rows, all_rounds(), &AggregateFilters::default());
        assert_eq!(shuffled.len(), base.len());
        for (a, b) in base.iter().zip(shuffled.iter()) {
            assert_eq!(a.player_id, b.player_id);
            assert!((a.total_points - b.total_points).abs() < 1e-9);
            assert_eq!(a.current_price, b.current_price);
            assert_eq!(a.scouts, b.scouts);
        }
    }
}

#[test]
fn price_and_scouts_come_from_latest_round() {
    let mut rows = season();
    rows.reverse();
    let players = aggregate(&rows, all_rounds(), &AggregateFilters::default());
    let p1 = players.iter().find(|p| p.player_id == 1).unwrap();
    assert_eq!(p1.current_price, 9.6);
    assert_eq!(p1.last_round, 3);
    assert_eq!(p1.scouts.get(Scout::Tackle), 6);
    assert_eq!(p1.scouts.get(Scout::YellowCard), 0);
    assert_eq!(p1.photo_url.as_deref(), Some("https://img/1/3.png"));
    assert!((p1.secondary_score - 7.2).abs() < 1e-9);
    assert_eq!(p1.offensive_scouts, 1);
    assert_eq!(p1.defensive_scouts, 6);
}

#[test]
fn range_limits_both_sum_and_snapshot() {
    let range = RoundRange::new(1, 2).unwrap();
    let players = aggregate(&season(), range, &AggregateFilters::default());
    let p1 = players.iter().find(|p| p.player_id == 1).unwrap();
    assert!((p1.total_points - 3.0).abs() < 1e-9);
    assert_eq!(p1.current_price, 9.1);
    assert_eq!(p1.scouts.get(Scout::Tackle), 3);
    assert_eq!(p1.scouts.get(Scout::YellowCard), 1);
}

#[test]
fn single_record_passes_through() {
    let rows = season();
    let only = &rows[5];
    let players = aggregate(&rows, RoundRange::single(2), &AggregateFilters::default());
    let p3 = players.iter().find(|p| p.player_id == 3).unwrap();
    assert_eq!(p3.total_points, only.round_points);
    assert_eq!(p3.mean_points, only.round_points);
    assert_eq!(p3.current_price, only.price);
    assert_eq!(p3.scouts, only.scouts);
    assert_eq!(p3.secondary_score, scoring::secondary_score(&only.scouts));
    assert_eq!(p3.name, only.name);
}

#[test]
fn empty_input_gives_empty_output() {
    assert!(aggregate(&[], all_rounds(), &AggregateFilters::default()).is_empty());
    let out_of_range = RoundRange::new(10, 12).unwrap();
    assert!(aggregate(&season(), out_of_range, &AggregateFilters::default()).is_empty());
}

#[test]
fn output_is_ordered_by_player_id() {
    let mut rows = season();
    rows.reverse();
    let ids: Vec<u32> = aggregate(&rows, all_rounds(), &AggregateFilters::default())
        .iter()
        .map(|p| p.player_id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn filters_apply_per_record() {
    let mut rows = season();
    rows[2].played = false;
    rows[3].club_id = 263;
    rows[5].position = Position::Forward;
    rows[4].venue = Venue::Home;

    let played = aggregate(&rows, all_rounds(), &AggregateFilters::default());
    let p1 = played.iter().find(|p| p.player_id == 1).unwrap();
    // Round 3 did not count: snapshot falls back to round 2.
    assert_eq!(p1.last_round, 2);
    assert!((p1.total_points - 3.0).abs() < 1e-9);

    let benched_too = AggregateFilters {
        played_only: false,
        ..AggregateFilters::default()
    };
    let all = aggregate(&rows, all_rounds(), &benched_too);
    assert_eq!(all.iter().find(|p| p.player_id == 1).unwrap().last_round, 3);

    let flamengo_forwards = AggregateFilters {
        clubs: vec![262],
        positions: vec![Position::Forward],
        ..AggregateFilters::default()
    };
    let ids: Vec<u32> = aggregate(&rows, all_rounds(), &flamengo_forwards)
        .iter()
        .map(|p| p.player_id)
        .collect();
    assert_eq!(ids, vec![3]);

    let home = AggregateFilters {
        venues: vec![Venue::Home],
        ..AggregateFilters::default()
    };
    let home_rows = aggregate(&rows, all_rounds(), &home);
    assert_eq!(home_rows.len(), 1);
    assert_eq!(home_rows[0].player_id, 2);
    assert_eq!(home_rows[0].last_round, 3);
}

#[test]
fn display_filter_leaves_pool_untouched() {
    let players = aggregate(&season(), all_rounds(), &AggregateFilters::default());
    let window = DisplayFilter {
        min_price: Some(5.0),
        max_price: Some(10.0),
    };
    let shown: Vec<u32> = window.apply(&players).iter().map(|p| p.player_id).collect();
    assert_eq!(shown, vec![1]);
    assert_eq!(players.len(), 3);
    assert_eq!(DisplayFilter::default().apply(&players).len(), 3);
}
