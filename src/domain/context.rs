//! Point-in-time snapshot of everything known about one candidate prop.
//!
//! A `PropContext` is built once per (player, stat, line, game date) and only
//! read afterwards. Every numeric field is `Option`: `None` means the value
//! is unknown, `Some(0.0)` is a real zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::records::{GoalieForm, Position, ShotProfile, TeamProfile};
use super::stat::StatType;

/// Direction of a player's recent production relative to season form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Hot,
    Cold,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropContext {
    // === Identity ===
    #[serde(default)]
    pub player_id: Option<u64>,
    pub player_name: String,
    pub team: String,
    #[serde(default)]
    pub position: Option<Position>,

    // === Prop ===
    pub stat_type: StatType,
    pub line: f64,

    // === Game ===
    #[serde(default)]
    pub game_id: Option<String>,
    pub game_date: NaiveDate,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub is_home: Option<bool>,

    // === Season / recent statistics ===
    #[serde(default)]
    pub season_games: Option<u32>,
    #[serde(default)]
    pub season_points: Option<u32>,
    #[serde(default)]
    pub season_goals: Option<u32>,
    #[serde(default)]
    pub season_assists: Option<u32>,
    #[serde(default)]
    pub season_shots: Option<u32>,
    /// Precomputed per-game average for `stat_type`
    #[serde(default)]
    pub season_avg: Option<f64>,
    #[serde(default)]
    pub recent_games: Option<u32>,
    /// Per-game average for `stat_type` over the recent window
    #[serde(default)]
    pub recent_avg: Option<f64>,
    /// Consecutive games with at least one point, most recent first
    #[serde(default)]
    pub point_streak: Option<u32>,
    #[serde(default)]
    pub trend_direction: Option<TrendDirection>,
    /// Recent vs season change as a fraction (0.25 = 25% above season)
    #[serde(default)]
    pub trend_pct: Option<f64>,
    #[serde(default)]
    pub avg_toi_minutes: Option<f64>,

    // === Opposing goaltender / defence ===
    #[serde(default)]
    pub opposing_goalie_id: Option<u64>,
    #[serde(default)]
    pub opposing_goalie_name: Option<String>,
    #[serde(default)]
    pub opposing_save_pct: Option<f64>,
    #[serde(default)]
    pub opposing_goals_against_rate: Option<f64>,
    #[serde(default)]
    pub opposing_goalie_confirmed: Option<bool>,

    // === Deployment ===
    /// Even-strength line (1-4 forwards, 1-3 defence pairs)
    #[serde(default)]
    pub line_number: Option<u8>,
    /// Power-play unit; `Some(0)` = not on the power play
    #[serde(default)]
    pub pp_unit: Option<u8>,

    // === Situational ===
    #[serde(default)]
    pub is_back_to_back: Option<bool>,
    #[serde(default)]
    pub days_rest: Option<u32>,

    // === Market ===
    #[serde(default)]
    pub game_total: Option<f64>,
    /// Spread from this player's team perspective (negative = favourite)
    #[serde(default)]
    pub spread: Option<f64>,

    // === Enrichment ===
    #[serde(default)]
    pub team_profile: Option<TeamProfile>,
    #[serde(default)]
    pub opponent_profile: Option<TeamProfile>,
    #[serde(default)]
    pub shot_profile: Option<ShotProfile>,
    /// Form of the goaltender whose saves are being projected
    #[serde(default)]
    pub goalie_form: Option<GoalieForm>,
}

impl PropContext {
    /// Minimal context; everything else starts unknown.
    pub fn new(
        player_name: impl Into<String>,
        team: impl Into<String>,
        stat_type: StatType,
        line: f64,
        game_date: NaiveDate,
    ) -> Self {
        Self {
            player_id: None,
            player_name: player_name.into(),
            team: team.into(),
            position: None,
            stat_type,
            line,
            game_id: None,
            game_date,
            opponent: None,
            is_home: None,
            season_games: None,
            season_points: None,
            season_goals: None,
            season_assists: None,
            season_shots: None,
            season_avg: None,
            recent_games: None,
            recent_avg: None,
            point_streak: None,
            trend_direction: None,
            trend_pct: None,
            avg_toi_minutes: None,
            opposing_goalie_id: None,
            opposing_goalie_name: None,
            opposing_save_pct: None,
            opposing_goals_against_rate: None,
            opposing_goalie_confirmed: None,
            line_number: None,
            pp_unit: None,
            is_back_to_back: None,
            days_rest: None,
            game_total: None,
            spread: None,
            team_profile: None,
            opponent_profile: None,
            shot_profile: None,
            goalie_form: None,
        }
    }

    /// Season per-game average for `stat`.
    ///
    /// Uses the precomputed average when it was built for the same stat,
    /// otherwise derives it from season totals. A missing total stays
    /// `None`; it is never treated as zero.
    pub fn get_season_avg(&self, stat: StatType) -> Option<f64> {
        if stat == self.stat_type {
            if let Some(avg) = self.season_avg {
                return Some(avg);
            }
        }

        let games = self.season_games.filter(|g| *g > 0)? as f64;
        let total = match stat {
            StatType::Points => self
                .season_points
                .or_else(|| Some(self.season_goals? + self.season_assists?))?,
            StatType::Goals => self.season_goals?,
            StatType::Assists => self.season_assists?,
            StatType::ShotsOnGoal => self.season_shots?,
            _ => return None,
        };
        Some(total as f64 / games)
    }

    pub fn is_defenseman(&self) -> bool {
        self.position.map(|p| p.is_defense()).unwrap_or(false)
    }

    /// Short label used in logs and reports
    pub fn label(&self) -> String {
        format!("{} {} {}", self.player_name, self.stat_type, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(stat: StatType) -> PropContext {
        PropContext::new(
            "Test Player",
            "EDM",
            stat,
            0.5,
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
        )
    }

    #[test]
    fn test_season_avg_prefers_precomputed() {
        let mut c = ctx(StatType::Points);
        c.season_avg = Some(1.2);
        c.season_games = Some(10);
        c.season_points = Some(5);
        assert_eq!(c.get_season_avg(StatType::Points), Some(1.2));
        // Other stats fall back to totals
        assert_eq!(c.get_season_avg(StatType::Goals), None);
    }

    #[test]
    fn test_season_avg_from_totals() {
        let mut c = ctx(StatType::Goals);
        c.season_games = Some(20);
        c.season_goals = Some(10);
        c.season_assists = Some(6);
        assert_eq!(c.get_season_avg(StatType::Goals), Some(0.5));
        assert_eq!(c.get_season_avg(StatType::Points), Some(0.8));
    }

    #[test]
    fn test_missing_total_is_absent_not_zero() {
        let mut c = ctx(StatType::ShotsOnGoal);
        c.season_games = Some(20);
        assert_eq!(c.get_season_avg(StatType::ShotsOnGoal), None);

        c.season_shots = Some(0);
        assert_eq!(c.get_season_avg(StatType::ShotsOnGoal), Some(0.0));
    }

    #[test]
    fn test_context_deserializes_sparse_json() {
        let json = r#"{
            "player_name": "Connor McDavid",
            "team": "EDM",
            "stat_type": "points",
            "line": 1.5,
            "game_date": "2025-12-01",
            "season_avg": 1.6
        }"#;
        let c: PropContext = serde_json::from_str(json).unwrap();
        assert_eq!(c.stat_type, StatType::Points);
        assert!(c.recent_avg.is_none());
        assert!(c.is_back_to_back.is_none());
    }
}
