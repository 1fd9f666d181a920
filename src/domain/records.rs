//! Records exchanged with the stat, quote and outcome providers.
//!
//! Every optional field means "the provider did not say"; a provider that
//! knows a value is zero sends zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::stat::StatType;

/// Roster position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "C")]
    Center,
    #[serde(rename = "LW", alias = "L")]
    LeftWing,
    #[serde(rename = "RW", alias = "R")]
    RightWing,
    #[serde(rename = "D")]
    Defense,
    #[serde(rename = "G")]
    Goalie,
}

impl Position {
    pub fn is_defense(&self) -> bool {
        matches!(self, Position::Defense)
    }

    pub fn is_goalie(&self) -> bool {
        matches!(self, Position::Goalie)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Center => "C",
            Position::LeftWing => "LW",
            Position::RightWing => "RW",
            Position::Defense => "D",
            Position::Goalie => "G",
        }
    }
}

/// Player resolved from a roster lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub player_id: u64,
    pub name: String,
    pub team: String,
    pub position: Option<Position>,
}

/// Season-to-date totals for a player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub games: u32,
    #[serde(default)]
    pub goals: Option<u32>,
    #[serde(default)]
    pub assists: Option<u32>,
    #[serde(default)]
    pub shots: Option<u32>,
    #[serde(default)]
    pub avg_toi_minutes: Option<f64>,
}

/// One game from a player's log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogEntry {
    pub game_date: NaiveDate,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub shots: u32,
    #[serde(default)]
    pub blocked_shots: Option<u32>,
    #[serde(default)]
    pub pp_goals: u32,
    #[serde(default)]
    pub pp_points: u32,
    /// Time on ice in minutes
    #[serde(default)]
    pub toi_minutes: Option<f64>,
    #[serde(default)]
    pub saves: Option<u32>,
    #[serde(default)]
    pub shots_against: Option<u32>,
}

impl GameLogEntry {
    pub fn points(&self) -> u32 {
        self.goals + self.assists
    }

    /// Value of `stat` in this game, `None` when the log does not carry it
    pub fn stat_value(&self, stat: StatType) -> Option<f64> {
        match stat {
            StatType::Points => Some(self.points() as f64),
            StatType::Goals => Some(self.goals as f64),
            StatType::Assists => Some(self.assists as f64),
            StatType::ShotsOnGoal => Some(self.shots as f64),
            StatType::BlockedShots => self.blocked_shots.map(f64::from),
            StatType::PowerPlayPoints => Some(self.pp_points as f64),
            StatType::Saves => self.saves.map(f64::from),
            StatType::GameTotal => None,
        }
    }
}

/// Opposing goaltender / defence quality
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpponentQuality {
    #[serde(default)]
    pub goalie_id: Option<u64>,
    #[serde(default)]
    pub goalie_name: Option<String>,
    #[serde(default)]
    pub save_pct: Option<f64>,
    /// Goals allowed per game
    #[serde(default)]
    pub goals_against_rate: Option<f64>,
    #[serde(default)]
    pub confirmed: Option<bool>,
}

/// Team-level scoring profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamProfile {
    pub team: String,
    pub goals_for_per_game: f64,
    pub goals_against_per_game: f64,
    #[serde(default)]
    pub shots_for_per_game: Option<f64>,
    /// Share of 5v5 time spent in the attacking zone (0-1)
    #[serde(default)]
    pub offensive_zone_share: Option<f64>,
    /// Goals-against average of the primary starter
    #[serde(default)]
    pub starter_gaa: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShotQualityTier {
    High,
    #[default]
    Average,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZoneDeployment {
    Offensive,
    #[default]
    Balanced,
    Defensive,
}

/// Skater shot-location and deployment profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotProfile {
    #[serde(default)]
    pub shot_quality: ShotQualityTier,
    /// Share of shots from high-danger areas (0-1)
    #[serde(default)]
    pub high_danger_share: Option<f64>,
    #[serde(default)]
    pub zone_deployment: ZoneDeployment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormAssessment {
    Hot,
    #[default]
    Neutral,
    Cold,
}

/// Goaltender recent form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalieForm {
    #[serde(default)]
    pub recent_save_pct: Option<f64>,
    #[serde(default)]
    pub season_save_pct: Option<f64>,
    #[serde(default)]
    pub form: FormAssessment,
}

impl GoalieForm {
    pub fn best_save_pct(&self) -> Option<f64> {
        self.recent_save_pct.or(self.season_save_pct)
    }
}

/// Two-sided market price for one prop line
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    #[serde(default)]
    pub over_price: Option<f64>,
    #[serde(default)]
    pub under_price: Option<f64>,
}

impl PriceQuote {
    pub fn new(over_price: Option<f64>, under_price: Option<f64>) -> Self {
        Self {
            over_price,
            under_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.over_price.is_none() && self.under_price.is_none()
    }
}

/// Game-level market lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameLines {
    #[serde(default)]
    pub total: Option<f64>,
    /// Home team spread (negative = home favoured)
    #[serde(default)]
    pub home_spread: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Scheduled,
    Live,
    Final,
    Postponed,
}

/// Player line from a completed game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScoreLine {
    #[serde(default)]
    pub player_id: Option<u64>,
    pub name: String,
    pub team: String,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub shots: u32,
    #[serde(default)]
    pub blocked_shots: u32,
    #[serde(default)]
    pub pp_points: u32,
    #[serde(default)]
    pub saves: Option<u32>,
}

impl BoxScoreLine {
    pub fn stat_value(&self, stat: StatType) -> Option<f64> {
        match stat {
            StatType::Points => Some((self.goals + self.assists) as f64),
            StatType::Goals => Some(self.goals as f64),
            StatType::Assists => Some(self.assists as f64),
            StatType::ShotsOnGoal => Some(self.shots as f64),
            StatType::BlockedShots => Some(self.blocked_shots as f64),
            StatType::PowerPlayPoints => Some(self.pp_points as f64),
            StatType::Saves => self.saves.map(f64::from),
            StatType::GameTotal => None,
        }
    }
}

/// Box score for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    pub game_id: String,
    pub game_date: NaiveDate,
    pub state: GameState,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_goals: u32,
    #[serde(default)]
    pub away_goals: u32,
    #[serde(default)]
    pub players: Vec<BoxScoreLine>,
}

impl BoxScore {
    pub fn is_final(&self) -> bool {
        self.state == GameState::Final
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team.eq_ignore_ascii_case(team) || self.away_team.eq_ignore_ascii_case(team)
    }

    pub fn total_goals(&self) -> u32 {
        self.home_goals + self.away_goals
    }
}

/// Fuzzy player-name comparison.
///
/// Matches exact names, one name containing the other, or the same last
/// name with the same first initial ("J. Smith" vs "John Smith").
pub fn names_match(a: &str, b: &str) -> bool {
    let n1 = a.trim().to_lowercase();
    let n2 = b.trim().to_lowercase();
    if n1.is_empty() || n2.is_empty() {
        return false;
    }
    if n1 == n2 || n1.contains(&n2) || n2.contains(&n1) {
        return true;
    }

    let p1: Vec<&str> = n1.split_whitespace().collect();
    let p2: Vec<&str> = n2.split_whitespace().collect();
    match (p1.first(), p1.last(), p2.first(), p2.last()) {
        (Some(f1), Some(l1), Some(f2), Some(l2)) => {
            l1 == l2 && f1.chars().next() == f2.chars().next()
        }
        _ => false,
    }
}
