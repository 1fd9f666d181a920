//! Collaborator interfaces the engine consumes.
//!
//! Providers must answer "unknown" with `Ok(None)` / an empty list. An `Err`
//! means the collaborator itself failed (after its own retries); the engine
//! treats the affected data as missing.

pub mod cache;
pub mod fixture;

pub use cache::{CacheStats, CachedProvider};
pub use fixture::FixtureDataset;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    BoxScore, GameLines, GameLogEntry, GoalieForm, OpponentQuality, PlayerIdentity, PriceQuote,
    SeasonStats, ShotProfile, StatType, TeamProfile,
};
use crate::error::Result;

/// Player and team statistics
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatProvider: Send + Sync {
    async fn get_season_stats(&self, player_id: u64) -> Result<Option<SeasonStats>>;

    /// Up to `n` games, most recent first
    async fn get_recent_game_log(&self, player_id: u64, n: usize) -> Result<Vec<GameLogEntry>>;

    /// Quality of the goaltending / defence `team` puts in front of opponents
    async fn get_opponent_quality(&self, team: &str) -> Result<Option<OpponentQuality>>;

    /// Resolve a player by name among the given teams
    async fn lookup_player(&self, name: &str, teams: &[String]) -> Result<Option<PlayerIdentity>>;

    async fn get_team_profile(&self, team: &str) -> Result<Option<TeamProfile>>;

    async fn get_shot_profile(&self, player_id: u64) -> Result<Option<ShotProfile>>;

    async fn get_goalie_form(&self, player_id: u64) -> Result<Option<GoalieForm>>;
}

/// Identifies one quoted line within an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropKey {
    /// `None` for game-level markets
    pub player_name: Option<String>,
    pub stat_type: StatType,
    pub line: f64,
}

impl PropKey {
    pub fn player(name: impl Into<String>, stat_type: StatType, line: f64) -> Self {
        Self {
            player_name: Some(name.into()),
            stat_type,
            line,
        }
    }

    pub fn game(stat_type: StatType, line: f64) -> Self {
        Self {
            player_name: None,
            stat_type,
            line,
        }
    }
}

/// Market prices, in one convention per integration
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketQuoteProvider: Send + Sync {
    async fn get_price(&self, event_id: &str, prop: &PropKey) -> Result<Option<PriceQuote>>;

    async fn get_game_lines(&self, event_id: &str) -> Result<Option<GameLines>>;
}

/// Settled results
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutcomeProvider: Send + Sync {
    async fn get_box_scores(&self, date: NaiveDate) -> Result<Vec<BoxScore>>;
}
