//! File-backed provider for offline scoring and backtests.
//!
//! One JSON document carries rosters, game logs, team snapshots, quoted
//! props and box scores. It answers all three provider roles.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::{MarketQuoteProvider, OutcomeProvider, PropKey, StatProvider};
use crate::backtest::HistoricalProp;
use crate::domain::{
    names_match, BoxScore, GameLines, GameLogEntry, GoalieForm, OpponentQuality, PlayerIdentity,
    PriceQuote, SeasonStats, ShotProfile, StatType, TeamProfile,
};
use crate::error::Result;

const LINE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturePlayer {
    #[serde(flatten)]
    pub identity: PlayerIdentity,
    #[serde(default)]
    pub season: Option<SeasonStats>,
    #[serde(default)]
    pub game_log: Vec<GameLogEntry>,
    #[serde(default)]
    pub shot_profile: Option<ShotProfile>,
    #[serde(default)]
    pub goalie_form: Option<GoalieForm>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureTeam {
    pub team: String,
    #[serde(default)]
    pub profile: Option<TeamProfile>,
    /// Goaltending this team puts in front of its opponents
    #[serde(default)]
    pub goaltending: Option<OpponentQuality>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureProp {
    /// Absent for game-level markets
    #[serde(default)]
    pub player_name: Option<String>,
    pub stat_type: StatType,
    pub line: f64,
    #[serde(default)]
    pub over_price: Option<f64>,
    #[serde(default)]
    pub under_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureEvent {
    pub event_id: String,
    pub game_date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub lines: Option<GameLines>,
    #[serde(default)]
    pub props: Vec<FixtureProp>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureDataset {
    #[serde(default)]
    pub players: Vec<FixturePlayer>,
    #[serde(default)]
    pub teams: Vec<FixtureTeam>,
    #[serde(default)]
    pub events: Vec<FixtureEvent>,
    #[serde(default)]
    pub box_scores: Vec<BoxScore>,
}

impl FixtureDataset {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let dataset = Self::from_json(&raw)?;
        debug!(
            path = %path.as_ref().display(),
            players = dataset.players.len(),
            events = dataset.events.len(),
            box_scores = dataset.box_scores.len(),
            "Loaded fixture dataset"
        );
        Ok(dataset)
    }

    /// Every quoted prop, in event order, optionally restricted to a date range
    pub fn historical_props(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Vec<HistoricalProp> {
        self.events
            .iter()
            .filter(|e| from.map_or(true, |d| e.game_date >= d))
            .filter(|e| to.map_or(true, |d| e.game_date <= d))
            .flat_map(|event| {
                event.props.iter().map(move |p| HistoricalProp {
                    event_id: event.event_id.clone(),
                    game_date: event.game_date,
                    home_team: event.home_team.clone(),
                    away_team: event.away_team.clone(),
                    player_name: p.player_name.clone(),
                    stat_type: p.stat_type,
                    line: p.line,
                })
            })
            .collect()
    }

    pub fn event(&self, event_id: &str) -> Option<&FixtureEvent> {
        self.events.iter().find(|e| e.event_id == event_id)
    }

    fn player(&self, player_id: u64) -> Option<&FixturePlayer> {
        self.players
            .iter()
            .find(|p| p.identity.player_id == player_id)
    }

    fn team(&self, team: &str) -> Option<&FixtureTeam> {
        self.teams.iter().find(|t| t.team.eq_ignore_ascii_case(team))
    }
}

#[async_trait]
impl StatProvider for FixtureDataset {
    async fn get_season_stats(&self, player_id: u64) -> Result<Option<SeasonStats>> {
        Ok(self.player(player_id).and_then(|p| p.season.clone()))
    }

    async fn get_recent_game_log(&self, player_id: u64, n: usize) -> Result<Vec<GameLogEntry>> {
        let Some(player) = self.player(player_id) else {
            return Ok(Vec::new());
        };
        let mut log = player.game_log.clone();
        log.sort_by(|a, b| b.game_date.cmp(&a.game_date));
        log.truncate(n);
        Ok(log)
    }

    async fn get_opponent_quality(&self, team: &str) -> Result<Option<OpponentQuality>> {
        Ok(self.team(team).and_then(|t| t.goaltending.clone()))
    }

    async fn lookup_player(&self, name: &str, teams: &[String]) -> Result<Option<PlayerIdentity>> {
        let on_team = |p: &&FixturePlayer| {
            teams.is_empty() || teams.iter().any(|t| t.eq_ignore_ascii_case(&p.identity.team))
        };

        if let Some(exact) = self
            .players
            .iter()
            .filter(on_team)
            .find(|p| p.identity.name.eq_ignore_ascii_case(name.trim()))
        {
            return Ok(Some(exact.identity.clone()));
        }

        let fuzzy: Vec<&FixturePlayer> = self
            .players
            .iter()
            .filter(on_team)
            .filter(|p| names_match(&p.identity.name, name))
            .collect();

        match fuzzy.as_slice() {
            [only] => Ok(Some(only.identity.clone())),
            [] => Ok(None),
            many => {
                debug!(name, candidates = many.len(), "Ambiguous player lookup");
                Ok(None)
            }
        }
    }

    async fn get_team_profile(&self, team: &str) -> Result<Option<TeamProfile>> {
        Ok(self.team(team).and_then(|t| t.profile.clone()))
    }

    async fn get_shot_profile(&self, player_id: u64) -> Result<Option<ShotProfile>> {
        Ok(self.player(player_id).and_then(|p| p.shot_profile.clone()))
    }

    async fn get_goalie_form(&self, player_id: u64) -> Result<Option<GoalieForm>> {
        Ok(self.player(player_id).and_then(|p| p.goalie_form.clone()))
    }
}

#[async_trait]
impl MarketQuoteProvider for FixtureDataset {
    async fn get_price(&self, event_id: &str, prop: &PropKey) -> Result<Option<PriceQuote>> {
        let Some(event) = self.event(event_id) else {
            return Ok(None);
        };

        let quote = event
            .props
            .iter()
            .filter(|p| p.stat_type == prop.stat_type)
            .filter(|p| (p.line - prop.line).abs() < LINE_TOLERANCE)
            .find(|p| match (&p.player_name, &prop.player_name) {
                (Some(a), Some(b)) => names_match(a, b),
                (None, None) => true,
                _ => false,
            })
            .map(|p| PriceQuote::new(p.over_price, p.under_price));

        Ok(quote)
    }

    async fn get_game_lines(&self, event_id: &str) -> Result<Option<GameLines>> {
        Ok(self.event(event_id).and_then(|e| e.lines))
    }
}

#[async_trait]
impl OutcomeProvider for FixtureDataset {
    async fn get_box_scores(&self, date: NaiveDate) -> Result<Vec<BoxScore>> {
        Ok(self
            .box_scores
            .iter()
            .filter(|b| b.game_date == date)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "players": [
            {"player_id": 97, "name": "Connor McDavid", "team": "EDM", "position": "C",
             "game_log": [
                {"game_date": "2025-11-01", "goals": 1, "assists": 1, "shots": 4},
                {"game_date": "2025-11-05", "goals": 0, "assists": 2, "shots": 3},
                {"game_date": "2025-11-03", "goals": 0, "assists": 0, "shots": 2}
             ]},
            {"player_id": 29, "name": "Leon Draisaitl", "team": "EDM", "position": "C"},
            {"player_id": 91, "name": "Steven Stamkos", "team": "NSH", "position": "C"},
            {"player_id": 92, "name": "Sam Stamkos", "team": "NSH", "position": "LW"}
        ],
        "teams": [
            {"team": "CGY", "goaltending": {"goalie_name": "Dustin Wolf", "save_pct": 0.912}}
        ],
        "events": [
            {"event_id": "g1", "game_date": "2025-11-07", "home_team": "EDM", "away_team": "CGY",
             "lines": {"total": 6.5, "home_spread": -1.5},
             "props": [
                {"player_name": "Connor McDavid", "stat_type": "points", "line": 1.5,
                 "over_price": -120, "under_price": 100},
                {"stat_type": "game_total", "line": 6.5, "over_price": -110}
             ]}
        ],
        "box_scores": []
    }"#;

    fn dataset() -> FixtureDataset {
        FixtureDataset::from_json(DATASET).unwrap()
    }

    #[tokio::test]
    async fn test_game_log_most_recent_first() {
        let data = dataset();
        let log = data.get_recent_game_log(97, 2).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].game_date, NaiveDate::from_ymd_opt(2025, 11, 5).unwrap());
        assert_eq!(log[1].game_date, NaiveDate::from_ymd_opt(2025, 11, 3).unwrap());
        assert!(data.get_recent_game_log(1, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_player() {
        let data = dataset();
        let teams = vec!["EDM".to_string(), "CGY".to_string()];
        let found = data.lookup_player("C. McDavid", &teams).await.unwrap();
        assert_eq!(found.map(|p| p.player_id), Some(97));

        // Wrong team
        let nsh = vec!["NSH".to_string()];
        assert!(data.lookup_player("Connor McDavid", &nsh).await.unwrap().is_none());

        // Two candidates share the initial and last name
        assert!(data.lookup_player("S. Stamkos", &nsh).await.unwrap().is_none());
        let exact = data.lookup_player("steven stamkos", &nsh).await.unwrap();
        assert_eq!(exact.map(|p| p.player_id), Some(91));
    }

    #[tokio::test]
    async fn test_prices_and_lines() {
        let data = dataset();
        let key = PropKey::player("Connor McDavid", StatType::Points, 1.5);
        let quote = data.get_price("g1", &key).await.unwrap().unwrap();
        assert_eq!(quote.over_price, Some(-120.0));
        assert_eq!(quote.under_price, Some(100.0));

        let total = data
            .get_price("g1", &PropKey::game(StatType::GameTotal, 6.5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(total.under_price, None);

        let other_line = PropKey::player("Connor McDavid", StatType::Points, 0.5);
        assert!(data.get_price("g1", &other_line).await.unwrap().is_none());
        assert!(data.get_price("nope", &key).await.unwrap().is_none());

        let lines = data.get_game_lines("g1").await.unwrap().unwrap();
        assert_eq!(lines.total, Some(6.5));
    }

    #[tokio::test]
    async fn test_opponent_quality_by_team() {
        let data = dataset();
        let q = data.get_opponent_quality("cgy").await.unwrap().unwrap();
        assert_eq!(q.save_pct, Some(0.912));
        assert!(data.get_opponent_quality("EDM").await.unwrap().is_none());
    }

    #[test]
    fn test_historical_props_date_filter() {
        let data = dataset();
        assert_eq!(data.historical_props(None, None).len(), 2);
        let later = NaiveDate::from_ymd_opt(2025, 11, 8);
        assert!(data.historical_props(later, None).is_empty());
    }
}
