use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PropEdgeError;

/// Quantity a prop is written against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    Points,
    Goals,
    Assists,
    ShotsOnGoal,
    BlockedShots,
    PowerPlayPoints,
    /// Goaltender saves (derived stat, goalies only)
    Saves,
    /// Combined goals scored by both teams
    GameTotal,
}

impl StatType {
    pub const ALL: [StatType; 8] = [
        StatType::Points,
        StatType::Goals,
        StatType::Assists,
        StatType::ShotsOnGoal,
        StatType::BlockedShots,
        StatType::PowerPlayPoints,
        StatType::Saves,
        StatType::GameTotal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatType::Points => "points",
            StatType::Goals => "goals",
            StatType::Assists => "assists",
            StatType::ShotsOnGoal => "shots_on_goal",
            StatType::BlockedShots => "blocked_shots",
            StatType::PowerPlayPoints => "power_play_points",
            StatType::Saves => "saves",
            StatType::GameTotal => "game_total",
        }
    }

    /// Market key used by quote providers (e.g. `player_points`)
    pub fn market_key(&self) -> &'static str {
        match self {
            StatType::Points => "player_points",
            StatType::Goals => "player_goals",
            StatType::Assists => "player_assists",
            StatType::ShotsOnGoal => "player_shots_on_goal",
            StatType::BlockedShots => "player_blocked_shots",
            StatType::PowerPlayPoints => "player_power_play_points",
            StatType::Saves => "player_total_saves",
            StatType::GameTotal => "totals",
        }
    }

    /// Skater scoring props (the ones deployment and goaltending quality move)
    pub fn is_skater_scoring(&self) -> bool {
        matches!(
            self,
            StatType::Points | StatType::Goals | StatType::Assists | StatType::PowerPlayPoints
        )
    }

    /// Props settled on a single player's line rather than the game
    pub fn is_player_prop(&self) -> bool {
        !matches!(self, StatType::GameTotal)
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatType {
    type Err = PropEdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let stat = match normalized.as_str() {
            "points" | "player_points" => StatType::Points,
            "goals" | "player_goals" => StatType::Goals,
            "assists" | "player_assists" => StatType::Assists,
            "shots_on_goal" | "shots" | "player_shots_on_goal" => StatType::ShotsOnGoal,
            "blocked_shots" | "player_blocked_shots" => StatType::BlockedShots,
            "power_play_points" | "pp_points" | "player_power_play_points" => {
                StatType::PowerPlayPoints
            }
            "saves" | "player_total_saves" => StatType::Saves,
            "game_total" | "totals" | "total" => StatType::GameTotal,
            _ => return Err(PropEdgeError::InvalidStatType(s.to_string())),
        };
        Ok(stat)
    }
}

/// Side of an over/under prop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Over,
    Under,
}

impl Direction {
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Over => Direction::Under,
            Direction::Under => Direction::Over,
        }
    }

    /// +1 for the higher side, -1 for the lower side
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Over => 1.0,
            Direction::Under => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Over => "over",
            Direction::Under => "under",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a quote provider expresses prices for one market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceConvention {
    /// Positive payout per 100 staked / negative lay amount to win 100
    #[default]
    American,
    /// Total return per unit staked (e.g. 1.91)
    Decimal,
}
