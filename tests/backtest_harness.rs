use std::sync::Arc;

use chrono::NaiveDate;
use propedge::backtest::{is_hit, settle_prop, BacktestHarness, BacktestRun, EdgeBucket, PropState};
use propedge::config::{AppConfig, BacktestConfig};
use propedge::domain::StatType;
use propedge::edge::EdgeCalculator;
use propedge::providers::FixtureDataset;

const SLATE: &str = r#"{
    "players": [
        {"player_id": 97, "name": "Connor McDavid", "team": "EDM", "position": "C",
         "game_log": [
            {"game_date": "2025-10-28", "goals": 1, "assists": 1, "shots": 4, "toi_minutes": 21.5, "pp_points": 1},
            {"game_date": "2025-10-30", "goals": 0, "assists": 2, "shots": 3, "toi_minutes": 22.0},
            {"game_date": "2025-11-01", "goals": 1, "assists": 0, "shots": 5, "toi_minutes": 20.5},
            {"game_date": "2025-11-03", "goals": 0, "assists": 1, "shots": 2, "toi_minutes": 21.0},
            {"game_date": "2025-11-05", "goals": 1, "assists": 1, "shots": 6, "toi_minutes": 23.0},
            {"game_date": "2025-11-09", "goals": 3, "assists": 2, "shots": 9, "toi_minutes": 24.0}
         ]},
        {"player_id": 29, "name": "Leon Draisaitl", "team": "EDM", "position": "C",
         "game_log": [
            {"game_date": "2025-10-28", "goals": 0, "assists": 1, "shots": 3, "toi_minutes": 20.0},
            {"game_date": "2025-10-30", "goals": 1, "assists": 0, "shots": 4, "toi_minutes": 21.0},
            {"game_date": "2025-11-01", "goals": 0, "assists": 0, "shots": 2, "toi_minutes": 19.5},
            {"game_date": "2025-11-05", "goals": 1, "assists": 1, "shots": 5, "toi_minutes": 20.5}
         ]}
    ],
    "teams": [
        {"team": "CGY",
         "profile": {"team": "CGY", "goals_for_per_game": 2.7, "goals_against_per_game": 3.1},
         "goaltending": {"goalie_name": "Dustin Wolf", "save_pct": 0.902, "confirmed": true}},
        {"team": "EDM",
         "profile": {"team": "EDM", "goals_for_per_game": 3.6, "goals_against_per_game": 2.9}}
    ],
    "events": [
        {"event_id": "g1", "game_date": "2025-11-07", "home_team": "EDM", "away_team": "CGY",
         "lines": {"total": 6.5, "home_spread": -1.5},
         "props": [
            {"player_name": "Connor McDavid", "stat_type": "points", "line": 1.5,
             "over_price": -125, "under_price": 105},
            {"player_name": "Leon Draisaitl", "stat_type": "shots_on_goal", "line": 3.5,
             "over_price": -110, "under_price": -110},
            {"stat_type": "game_total", "line": 5.5, "over_price": -115, "under_price": -105}
         ]},
        {"event_id": "g2", "game_date": "2025-11-08", "home_team": "VAN", "away_team": "SEA",
         "props": [
            {"player_name": "Nobody Known", "stat_type": "goals", "line": 0.5, "over_price": 200}
         ]},
        {"event_id": "g3", "game_date": "2025-11-08", "home_team": "TOR", "away_team": "MTL",
         "lines": {"total": 6.0},
         "props": [
            {"stat_type": "game_total", "line": 6.5, "over_price": -105, "under_price": -115}
         ]}
    ],
    "box_scores": [
        {"game_id": "g1", "game_date": "2025-11-07", "state": "final",
         "home_team": "EDM", "away_team": "CGY", "home_goals": 4, "away_goals": 2,
         "players": [
            {"player_id": 97, "name": "Connor McDavid", "team": "EDM", "goals": 1, "assists": 2, "shots": 5},
            {"player_id": 29, "name": "Leon Draisaitl", "team": "EDM", "goals": 1, "assists": 0, "shots": 5}
         ]}
    ]
}"#;

fn dataset() -> Arc<FixtureDataset> {
    Arc::new(FixtureDataset::from_json(SLATE).unwrap())
}

async fn run_with(config: BacktestConfig) -> (BacktestRun, Arc<FixtureDataset>) {
    let data = dataset();
    let calculator = Arc::new(EdgeCalculator::new(&AppConfig::default()).unwrap());
    let harness = BacktestHarness::new(calculator, data.clone(), data.clone(), data.clone(), config);
    let run = harness.run(data.historical_props(None, None)).await;
    (run, data)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
}

#[tokio::test]
async fn every_prop_ends_in_a_known_state() {
    let (run, _) = run_with(BacktestConfig::default()).await;
    let report = &run.report;

    assert_eq!(report.total_props, 5);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.unsettled, 1);
    assert_eq!(report.settled, 3);
    assert_eq!(run.weights_version, "v3");

    let skipped: Vec<_> = run.props.iter().filter(|p| p.is_skipped()).collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].prop.event_id, "g2");
    assert_eq!(skipped[0].state, PropState::Pending);
}

#[tokio::test]
async fn unmatched_event_is_unsettled_and_not_graded() {
    let (run, _) = run_with(BacktestConfig::default()).await;

    let g3 = run.props.iter().find(|p| p.prop.event_id == "g3").unwrap();
    assert_eq!(g3.state, PropState::Unsettled);
    assert_eq!(g3.unsettled_reason.as_deref(), Some("no game found"));
    assert!(g3.hit.is_none());
    assert!(!g3.settled);
    assert!(g3.edge.is_some());

    let report = &run.report;
    assert_eq!(report.overall.props, 3);
    let bucketed: usize = EdgeBucket::ALL
        .iter()
        .filter_map(|b| report.bucket(*b))
        .map(|s| s.props)
        .sum();
    assert_eq!(bucketed, 3);
    let by_stat: usize = report.by_stat.iter().map(|s| s.props).sum();
    assert_eq!(by_stat, 3);
}

#[tokio::test]
async fn settled_props_use_box_score_values() {
    let (run, _) = run_with(BacktestConfig::default()).await;

    for prop in run.props.iter().filter(|p| p.state == PropState::Settled) {
        let direction = prop.direction().unwrap();
        let actual = prop.actual_value.unwrap();
        assert_eq!(prop.hit, Some(is_hit(direction, actual, prop.prop.line)));
    }

    let mcdavid = run
        .props
        .iter()
        .find(|p| p.prop.player_name.as_deref() == Some("Connor McDavid"))
        .unwrap();
    assert_eq!(mcdavid.actual_value, Some(3.0));

    let total = run
        .props
        .iter()
        .find(|p| p.prop.event_id == "g1" && p.prop.stat_type == StatType::GameTotal)
        .unwrap();
    assert_eq!(total.actual_value, Some(6.0));
}

#[tokio::test]
async fn contexts_never_see_the_future() {
    let (run, _) = run_with(BacktestConfig::default()).await;

    let mcdavid = run
        .props
        .iter()
        .find(|p| p.prop.player_name.as_deref() == Some("Connor McDavid"))
        .unwrap();
    let ctx = mcdavid.context.as_ref().unwrap();

    // The 2025-11-09 game happens after the prop's date
    assert_eq!(ctx.season_games, Some(5));
    assert_eq!(ctx.season_goals, Some(3));
    assert_eq!(ctx.game_date, day(7));
    assert_eq!(ctx.days_rest, Some(1));
    assert_eq!(ctx.is_home, Some(true));
    assert_eq!(ctx.spread, Some(-1.5));
}

#[tokio::test]
async fn resettling_is_idempotent() {
    let (mut run, data) = run_with(BacktestConfig::default()).await;

    let before: Vec<_> = run
        .props
        .iter()
        .map(|p| (p.state, p.actual_value, p.hit))
        .collect();

    for prop in run.props.iter_mut() {
        let scores: Vec<_> = data
            .box_scores
            .iter()
            .filter(|b| b.game_date == prop.prop.game_date)
            .cloned()
            .collect();
        settle_prop(prop, &scores).unwrap();
    }

    let after: Vec<_> = run
        .props
        .iter()
        .map(|p| (p.state, p.actual_value, p.hit))
        .collect();
    assert_eq!(before, after);

    let settled = run
        .props
        .iter_mut()
        .find(|p| p.state == PropState::Settled)
        .unwrap();
    let existing = settled.actual_value;
    assert!(settled.settle(existing, None).is_ok());
    assert!(settled.settle(Some(99.0), None).is_err());
}

#[tokio::test]
async fn date_concurrency_does_not_change_results() {
    let serial = BacktestConfig {
        max_concurrent_dates: 1,
        ..BacktestConfig::default()
    };
    let (one, _) = run_with(serial).await;
    let (many, _) = run_with(BacktestConfig::default()).await;

    assert_eq!(one.report.overall.props, many.report.overall.props);
    assert_eq!(one.report.overall.hits, many.report.overall.hits);
    assert_eq!(one.report.overall.profit, many.report.overall.profit);

    let labels = |run: &BacktestRun| -> Vec<String> {
        run.props.iter().map(|p| p.prop.label()).collect()
    };
    assert_eq!(labels(&one), labels(&many));
}
