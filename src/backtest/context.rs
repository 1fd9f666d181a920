//! Point-in-time context assembly.
//!
//! Everything derived from a player's game log uses only games dated
//! strictly before the prop's game. Deployment (line and power-play unit)
//! is inferred from that same window rather than looked up.

use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::prop::HistoricalProp;
use crate::config::BacktestConfig;
use crate::domain::{
    FormAssessment, GameLogEntry, GoalieForm, PlayerIdentity, PropContext, StatType,
    TrendDirection,
};
use crate::error::Result;
use crate::providers::{MarketQuoteProvider, StatProvider};

/// |trend| beyond which a player is called hot or cold
pub const TREND_THRESHOLD: f64 = 0.15;

/// Recent-vs-season save percentage gap that marks goalie form
const GOALIE_FORM_GAP: f64 = 0.010;

/// Why a historical prop could not be given a context
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    PlayerNotFound(String),
    InsufficientHistory { games: usize, required: usize },
    ProviderFailure(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::PlayerNotFound(name) => write!(f, "player not found: {}", name),
            SkipReason::InsufficientHistory { games, required } => {
                write!(f, "insufficient history: {} prior games (need {})", games, required)
            }
            SkipReason::ProviderFailure(reason) => write!(f, "provider failure: {}", reason),
        }
    }
}

// =============================================================================
// Game-log derivations
// =============================================================================

/// Games strictly before `target`, most recent first
pub fn prior_games(log: &[GameLogEntry], target: NaiveDate) -> Vec<GameLogEntry> {
    let mut prior: Vec<GameLogEntry> = log
        .iter()
        .filter(|g| g.game_date < target)
        .cloned()
        .collect();
    prior.sort_by(|a, b| b.game_date.cmp(&a.game_date));
    prior
}

/// Line (forwards 1-4) or pair (defence 1-3) from average ice time
pub fn infer_line_number(avg_toi_minutes: f64, is_defense: bool) -> u8 {
    if is_defense {
        if avg_toi_minutes >= 22.0 {
            1
        } else if avg_toi_minutes >= 18.0 {
            2
        } else {
            3
        }
    } else if avg_toi_minutes >= 18.0 {
        1
    } else if avg_toi_minutes >= 15.0 {
        2
    } else if avg_toi_minutes >= 12.0 {
        3
    } else {
        4
    }
}

/// Power-play unit from power-play points per game; 0 means no regular PP role
pub fn infer_pp_unit(pp_points: u32, games: usize) -> u8 {
    if games == 0 {
        return 0;
    }
    let rate = pp_points as f64 / games as f64;
    if rate >= 0.2 {
        1
    } else if rate >= 0.05 {
        2
    } else {
        0
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn save_pct(games: &[GameLogEntry]) -> Option<f64> {
    let (saves, against) = games.iter().fold((0u32, 0u32), |(s, a), g| {
        match (g.saves, g.shots_against) {
            (Some(sv), Some(sa)) => (s + sv, a + sa),
            _ => (s, a),
        }
    });
    (against > 0).then(|| saves as f64 / against as f64)
}

/// Goalie form from the prior window, if the log carries saves
pub fn goalie_form_from_log(prior: &[GameLogEntry], recent_window: usize) -> Option<GoalieForm> {
    let season = save_pct(prior)?;
    let recent_games = &prior[..prior.len().min(recent_window)];
    let recent = save_pct(recent_games);
    let form = match recent {
        Some(r) if r - season >= GOALIE_FORM_GAP => FormAssessment::Hot,
        Some(r) if season - r >= GOALIE_FORM_GAP => FormAssessment::Cold,
        _ => FormAssessment::Neutral,
    };
    Some(GoalieForm {
        recent_save_pct: recent,
        season_save_pct: Some(season),
        form,
    })
}

/// Fill the statistical and deployment fields of `ctx` from prior games
/// (most recent first).
pub fn apply_history(ctx: &mut PropContext, prior: &[GameLogEntry], recent_window: usize) {
    let stat = ctx.stat_type;
    let games = prior.len();
    ctx.season_games = Some(games as u32);
    ctx.season_goals = Some(prior.iter().map(|g| g.goals).sum());
    ctx.season_assists = Some(prior.iter().map(|g| g.assists).sum());
    ctx.season_points = Some(prior.iter().map(|g| g.points()).sum());
    ctx.season_shots = Some(prior.iter().map(|g| g.shots).sum());
    ctx.season_avg = mean(prior.iter().filter_map(|g| g.stat_value(stat)));

    let recent = &prior[..games.min(recent_window)];
    ctx.recent_games = Some(recent.len() as u32);
    ctx.recent_avg = mean(recent.iter().filter_map(|g| g.stat_value(stat)));

    ctx.point_streak = Some(prior.iter().take_while(|g| g.points() > 0).count() as u32);

    if let (Some(season), Some(recent)) = (ctx.season_avg, ctx.recent_avg) {
        if season > 0.0 {
            let pct = (recent - season) / season;
            ctx.trend_pct = Some(pct);
            ctx.trend_direction = Some(if pct > TREND_THRESHOLD {
                TrendDirection::Hot
            } else if pct < -TREND_THRESHOLD {
                TrendDirection::Cold
            } else {
                TrendDirection::Neutral
            });
        }
    }

    ctx.avg_toi_minutes = mean(recent.iter().filter_map(|g| g.toi_minutes));

    let is_goalie = ctx.position.map(|p| p.is_goalie()).unwrap_or(false);
    if !is_goalie {
        ctx.line_number = ctx
            .avg_toi_minutes
            .map(|toi| infer_line_number(toi, ctx.is_defenseman()));
        let pp_points = prior.iter().map(|g| g.pp_points).sum();
        ctx.pp_unit = Some(infer_pp_unit(pp_points, games));
    }

    if let Some(last) = prior.first() {
        let gap = (ctx.game_date - last.game_date).num_days();
        ctx.is_back_to_back = Some(gap == 1);
        ctx.days_rest = Some(gap.saturating_sub(1).max(0) as u32);
    }
}

// =============================================================================
// Provider-backed assembly
// =============================================================================

/// Builds point-in-time contexts from the stat and quote providers
pub struct ContextAssembler {
    stats: Arc<dyn StatProvider>,
    quotes: Arc<dyn MarketQuoteProvider>,
    config: BacktestConfig,
}

impl ContextAssembler {
    pub fn new(
        stats: Arc<dyn StatProvider>,
        quotes: Arc<dyn MarketQuoteProvider>,
        config: BacktestConfig,
    ) -> Self {
        Self {
            stats,
            quotes,
            config,
        }
    }

    pub async fn build(&self, prop: &HistoricalProp) -> std::result::Result<PropContext, SkipReason> {
        let mut ctx = match &prop.player_name {
            Some(name) => self.player_context(prop, name).await?,
            None => self.game_context(prop).await,
        };

        let lines = self.optional(self.quotes.get_game_lines(&prop.event_id).await, "game lines");
        if let Some(lines) = lines {
            ctx.game_total = lines.total;
            ctx.spread = lines.home_spread.map(|s| match ctx.is_home {
                Some(false) => -s,
                _ => s,
            });
        }

        debug!(prop = %prop.label(), "Built point-in-time context");
        Ok(ctx)
    }

    async fn game_context(&self, prop: &HistoricalProp) -> PropContext {
        let mut ctx = PropContext::new(
            format!("{}@{}", prop.away_team, prop.home_team),
            prop.home_team.clone(),
            prop.stat_type,
            prop.line,
            prop.game_date,
        );
        ctx.game_id = Some(prop.event_id.clone());
        ctx.opponent = Some(prop.away_team.clone());
        ctx.is_home = Some(true);
        ctx.team_profile = self.optional(
            self.stats.get_team_profile(&prop.home_team).await,
            "team profile",
        );
        ctx.opponent_profile = self.optional(
            self.stats.get_team_profile(&prop.away_team).await,
            "team profile",
        );
        ctx
    }

    async fn player_context(
        &self,
        prop: &HistoricalProp,
        name: &str,
    ) -> std::result::Result<PropContext, SkipReason> {
        let identity = self
            .stats
            .lookup_player(name, &prop.teams())
            .await
            .map_err(|e| SkipReason::ProviderFailure(e.to_string()))?
            .ok_or_else(|| SkipReason::PlayerNotFound(name.to_string()))?;

        let log = self
            .stats
            .get_recent_game_log(identity.player_id, self.config.game_log_depth)
            .await
            .map_err(|e| SkipReason::ProviderFailure(e.to_string()))?;
        let prior = prior_games(&log, prop.game_date);
        if prior.len() < self.config.min_prior_games {
            return Err(SkipReason::InsufficientHistory {
                games: prior.len(),
                required: self.config.min_prior_games,
            });
        }

        let mut ctx = self.identity_context(prop, &identity);
        apply_history(&mut ctx, &prior, self.config.recent_window);
        if ctx.avg_toi_minutes.is_none() {
            self.season_toi_fallback(&mut ctx, identity.player_id).await;
        }

        let opponent = ctx.opponent.clone().unwrap_or_default();
        if let Some(q) = self.optional(
            self.stats.get_opponent_quality(&opponent).await,
            "opponent quality",
        ) {
            ctx.opposing_goalie_id = q.goalie_id;
            ctx.opposing_goalie_name = q.goalie_name;
            ctx.opposing_save_pct = q.save_pct;
            ctx.opposing_goals_against_rate = q.goals_against_rate;
            ctx.opposing_goalie_confirmed = q.confirmed;
        }

        ctx.team_profile = self.optional(
            self.stats.get_team_profile(&identity.team).await,
            "team profile",
        );
        ctx.opponent_profile = self.optional(
            self.stats.get_team_profile(&opponent).await,
            "team profile",
        );

        if prop.stat_type == StatType::Saves {
            ctx.goalie_form = match goalie_form_from_log(&prior, self.config.recent_window) {
                Some(form) => Some(form),
                None => self.optional(
                    self.stats.get_goalie_form(identity.player_id).await,
                    "goalie form",
                ),
            };
        } else {
            ctx.shot_profile = self.optional(
                self.stats.get_shot_profile(identity.player_id).await,
                "shot profile",
            );
        }

        Ok(ctx)
    }

    /// Logs without ice time fall back to the season snapshot for deployment
    async fn season_toi_fallback(&self, ctx: &mut PropContext, player_id: u64) {
        let season = self.optional(self.stats.get_season_stats(player_id).await, "season stats");
        let Some(toi) = season.and_then(|s| s.avg_toi_minutes) else {
            return;
        };
        ctx.avg_toi_minutes = Some(toi);
        if !ctx.position.map(|p| p.is_goalie()).unwrap_or(false) {
            ctx.line_number = Some(infer_line_number(toi, ctx.is_defenseman()));
        }
    }

    fn identity_context(&self, prop: &HistoricalProp, identity: &PlayerIdentity) -> PropContext {
        let is_home = identity.team.eq_ignore_ascii_case(&prop.home_team);
        let opponent = if is_home {
            prop.away_team.clone()
        } else {
            prop.home_team.clone()
        };

        let mut ctx = PropContext::new(
            identity.name.clone(),
            identity.team.clone(),
            prop.stat_type,
            prop.line,
            prop.game_date,
        );
        ctx.player_id = Some(identity.player_id);
        ctx.position = identity.position;
        ctx.game_id = Some(prop.event_id.clone());
        ctx.opponent = Some(opponent);
        ctx.is_home = Some(is_home);
        ctx
    }

    /// Provider failures on auxiliary data degrade to "missing"
    fn optional<T>(&self, result: Result<Option<T>>, what: &str) -> Option<T> {
        match result {
            Ok(value) => value,
            Err(e) => {
                warn!("Provider failed for {}, treating as missing: {}", what, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Position, SeasonStats};
    use crate::error::PropEdgeError;
    use crate::providers::{FixtureDataset, MockMarketQuoteProvider, MockStatProvider};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    fn game(d: u32, goals: u32, assists: u32, toi: f64, pp_points: u32) -> GameLogEntry {
        GameLogEntry {
            game_date: day(d),
            game_id: None,
            opponent: None,
            goals,
            assists,
            shots: 3,
            blocked_shots: None,
            pp_goals: 0,
            pp_points,
            toi_minutes: Some(toi),
            saves: None,
            shots_against: None,
        }
    }

    #[test]
    fn test_prior_games_excludes_target_date() {
        let log = vec![game(1, 1, 0, 20.0, 0), game(10, 2, 0, 20.0, 0), game(5, 0, 1, 20.0, 0)];
        let prior = prior_games(&log, day(10));
        assert_eq!(prior.len(), 2);
        assert_eq!(prior[0].game_date, day(5));
        assert!(prior.iter().all(|g| g.game_date < day(10)));
    }

    #[test]
    fn test_line_inference_tables() {
        assert_eq!(infer_line_number(19.0, false), 1);
        assert_eq!(infer_line_number(15.0, false), 2);
        assert_eq!(infer_line_number(12.5, false), 3);
        assert_eq!(infer_line_number(9.0, false), 4);
        assert_eq!(infer_line_number(23.0, true), 1);
        assert_eq!(infer_line_number(19.0, true), 2);
        assert_eq!(infer_line_number(16.0, true), 3);

        assert_eq!(infer_pp_unit(4, 10), 1);
        assert_eq!(infer_pp_unit(1, 10), 2);
        assert_eq!(infer_pp_unit(0, 10), 0);
        assert_eq!(infer_pp_unit(3, 0), 0);
    }

    #[test]
    fn test_apply_history() {
        // Most recent first: 9th, 8th, 6th, 3rd
        let prior = vec![
            game(9, 1, 1, 19.0, 1),
            game(8, 0, 1, 19.0, 0),
            game(6, 0, 0, 18.0, 0),
            game(3, 0, 0, 18.0, 0),
        ];
        let mut ctx = PropContext::new("Test", "EDM", StatType::Points, 0.5, day(10));
        ctx.position = Some(Position::Center);
        apply_history(&mut ctx, &prior, 2);

        assert_eq!(ctx.season_games, Some(4));
        assert_eq!(ctx.season_points, Some(3));
        assert!((ctx.season_avg.unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(ctx.recent_games, Some(2));
        assert!((ctx.recent_avg.unwrap() - 1.5).abs() < 1e-12);
        assert_eq!(ctx.point_streak, Some(2));
        assert_eq!(ctx.trend_direction, Some(TrendDirection::Hot));
        assert_eq!(ctx.line_number, Some(1));
        assert_eq!(ctx.pp_unit, Some(1));
        assert_eq!(ctx.is_back_to_back, Some(true));
        assert_eq!(ctx.days_rest, Some(0));
    }

    #[test]
    fn test_goalie_form_from_log() {
        let mut prior = Vec::new();
        for (d, sv, sa) in [(9, 29, 30), (7, 28, 30), (5, 25, 30), (3, 25, 30)] {
            let mut g = game(d, 0, 0, 60.0, 0);
            g.saves = Some(sv);
            g.shots_against = Some(sa);
            prior.push(g);
        }
        let form = goalie_form_from_log(&prior, 2).unwrap();
        assert_eq!(form.form, FormAssessment::Hot);
        assert!(form.recent_save_pct.unwrap() > form.season_save_pct.unwrap());

        let skater = vec![game(9, 0, 0, 15.0, 0)];
        assert!(goalie_form_from_log(&skater, 2).is_none());
    }

    const DATASET: &str = r#"{
        "players": [
            {"player_id": 97, "name": "Connor McDavid", "team": "EDM", "position": "C",
             "game_log": [
                {"game_date": "2025-11-01", "goals": 1, "assists": 1, "shots": 4, "toi_minutes": 21.0, "pp_points": 1},
                {"game_date": "2025-11-03", "goals": 0, "assists": 2, "shots": 3, "toi_minutes": 22.0},
                {"game_date": "2025-11-05", "goals": 1, "assists": 0, "shots": 5, "toi_minutes": 20.5},
                {"game_date": "2025-11-09", "goals": 3, "assists": 0, "shots": 7, "toi_minutes": 20.0}
             ]}
        ],
        "teams": [
            {"team": "CGY", "goaltending": {"goalie_name": "Dustin Wolf", "save_pct": 0.895, "confirmed": true}}
        ],
        "events": [
            {"event_id": "g1", "game_date": "2025-11-07", "home_team": "CGY", "away_team": "EDM",
             "lines": {"total": 6.5, "home_spread": 1.5}}
        ]
    }"#;

    fn prop(player: Option<&str>, stat: StatType, line: f64) -> HistoricalProp {
        HistoricalProp {
            event_id: "g1".to_string(),
            game_date: day(7),
            home_team: "CGY".to_string(),
            away_team: "EDM".to_string(),
            player_name: player.map(str::to_string),
            stat_type: stat,
            line,
        }
    }

    fn assembler() -> ContextAssembler {
        let data = Arc::new(FixtureDataset::from_json(DATASET).unwrap());
        ContextAssembler::new(data.clone(), data, BacktestConfig::default())
    }

    #[tokio::test]
    async fn test_build_uses_only_prior_games() {
        let ctx = assembler()
            .build(&prop(Some("Connor McDavid"), StatType::Points, 1.5))
            .await
            .unwrap();

        // The 2025-11-09 hat trick is after the game and must not leak in
        assert_eq!(ctx.season_games, Some(3));
        assert_eq!(ctx.season_goals, Some(2));
        assert_eq!(ctx.is_home, Some(false));
        assert_eq!(ctx.opponent.as_deref(), Some("CGY"));
        assert_eq!(ctx.opposing_save_pct, Some(0.895));
        assert_eq!(ctx.game_total, Some(6.5));
        // Road team sees the home spread flipped
        assert_eq!(ctx.spread, Some(-1.5));
        assert_eq!(ctx.days_rest, Some(1));
        assert_eq!(ctx.is_back_to_back, Some(false));
        assert_eq!(ctx.line_number, Some(1));
    }

    #[tokio::test]
    async fn test_skip_reasons() {
        let asm = assembler();
        let unknown = asm
            .build(&prop(Some("Wayne Gretzky"), StatType::Points, 1.5))
            .await
            .unwrap_err();
        assert_eq!(unknown, SkipReason::PlayerNotFound("Wayne Gretzky".to_string()));

        let mut early = prop(Some("Connor McDavid"), StatType::Points, 1.5);
        early.game_date = day(4);
        let thin = asm.build(&early).await.unwrap_err();
        assert_eq!(thin, SkipReason::InsufficientHistory { games: 2, required: 3 });
    }

    #[tokio::test]
    async fn test_game_total_context() {
        let ctx = assembler()
            .build(&prop(None, StatType::GameTotal, 6.5))
            .await
            .unwrap();
        assert_eq!(ctx.player_name, "EDM@CGY");
        assert_eq!(ctx.team, "CGY");
        assert_eq!(ctx.game_total, Some(6.5));
        assert_eq!(ctx.spread, Some(1.5));
    }

    #[tokio::test]
    async fn test_season_toi_fills_missing_log_toi() {
        let mut stats = MockStatProvider::new();
        stats.expect_lookup_player().returning(|_, _| {
            Ok(Some(PlayerIdentity {
                player_id: 8,
                name: "Test Defender".to_string(),
                team: "EDM".to_string(),
                position: Some(Position::Defense),
            }))
        });
        stats.expect_get_recent_game_log().returning(|_, _| {
            Ok([1, 3, 5]
                .iter()
                .map(|d| {
                    let mut g = game(*d, 0, 1, 0.0, 0);
                    g.toi_minutes = None;
                    g
                })
                .collect())
        });
        stats.expect_get_season_stats().times(1).returning(|_| {
            Ok(Some(SeasonStats {
                games: 30,
                goals: Some(4),
                assists: Some(15),
                shots: Some(70),
                avg_toi_minutes: Some(23.5),
            }))
        });
        stats.expect_get_opponent_quality().returning(|_| Ok(None));
        stats.expect_get_team_profile().returning(|_| Ok(None));
        stats.expect_get_shot_profile().returning(|_| Ok(None));

        let mut quotes = MockMarketQuoteProvider::new();
        quotes.expect_get_game_lines().returning(|_| Ok(None));

        let asm = ContextAssembler::new(Arc::new(stats), Arc::new(quotes), BacktestConfig::default());
        let ctx = asm
            .build(&prop(Some("Test Defender"), StatType::Points, 0.5))
            .await
            .unwrap();
        assert_eq!(ctx.avg_toi_minutes, Some(23.5));
        // Defence pairs: >= 22 minutes is the top pair
        assert_eq!(ctx.line_number, Some(1));
        // Scoring history still comes from the prior log only
        assert_eq!(ctx.season_games, Some(3));
    }

    #[tokio::test]
    async fn test_auxiliary_failure_degrades_to_missing() {
        let mut stats = MockStatProvider::new();
        stats.expect_lookup_player().returning(|_, _| {
            Ok(Some(PlayerIdentity {
                player_id: 1,
                name: "Test Skater".to_string(),
                team: "EDM".to_string(),
                position: Some(Position::LeftWing),
            }))
        });
        stats.expect_get_recent_game_log().returning(|_, _| {
            Ok(vec![game(1, 0, 1, 14.0, 0), game(3, 1, 0, 14.0, 0), game(5, 0, 0, 14.0, 0)])
        });
        stats
            .expect_get_opponent_quality()
            .returning(|_| Err(PropEdgeError::provider("stats", "timeout")));
        stats.expect_get_team_profile().returning(|_| Ok(None));
        stats
            .expect_get_shot_profile()
            .returning(|_| Err(PropEdgeError::provider("stats", "timeout")));

        let mut quotes = MockMarketQuoteProvider::new();
        quotes
            .expect_get_game_lines()
            .returning(|_| Err(PropEdgeError::provider("odds", "rate limited")));

        let asm = ContextAssembler::new(Arc::new(stats), Arc::new(quotes), BacktestConfig::default());
        let ctx = asm
            .build(&prop(Some("Test Skater"), StatType::Points, 0.5))
            .await
            .unwrap();
        assert_eq!(ctx.season_games, Some(3));
        assert_eq!(ctx.line_number, Some(3));
        assert!(ctx.opposing_save_pct.is_none());
        assert!(ctx.shot_profile.is_none());
        assert!(ctx.game_total.is_none());
    }
}
