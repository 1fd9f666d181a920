//! Read-through memoization of provider calls.
//!
//! Each resource gets its own `DashMap` keyed by the call arguments. A hit
//! returns the stored value without touching the inner provider; a miss
//! awaits the inner call and stores the answer. Errors are not cached.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{MarketQuoteProvider, OutcomeProvider, PropKey, StatProvider};
use crate::domain::{
    BoxScore, GameLines, GameLogEntry, GoalieForm, OpponentQuality, PlayerIdentity, PriceQuote,
    SeasonStats, ShotProfile, StatType, TeamProfile,
};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

type PriceCacheKey = (String, Option<String>, StatType, u64);

pub struct CachedProvider<P> {
    inner: Arc<P>,
    season: DashMap<u64, Option<SeasonStats>>,
    game_logs: DashMap<(u64, usize), Vec<GameLogEntry>>,
    opponents: DashMap<String, Option<OpponentQuality>>,
    lookups: DashMap<(String, Vec<String>), Option<PlayerIdentity>>,
    team_profiles: DashMap<String, Option<TeamProfile>>,
    shot_profiles: DashMap<u64, Option<ShotProfile>>,
    goalie_forms: DashMap<u64, Option<GoalieForm>>,
    prices: DashMap<PriceCacheKey, Option<PriceQuote>>,
    game_lines: DashMap<String, Option<GameLines>>,
    box_scores: DashMap<NaiveDate, Vec<BoxScore>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<P> CachedProvider<P> {
    pub fn new(inner: Arc<P>) -> Self {
        Self {
            inner,
            season: DashMap::new(),
            game_logs: DashMap::new(),
            opponents: DashMap::new(),
            lookups: DashMap::new(),
            team_profiles: DashMap::new(),
            shot_profiles: DashMap::new(),
            goalie_forms: DashMap::new(),
            prices: DashMap::new(),
            game_lines: DashMap::new(),
            box_scores: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    async fn memo<K, V, F, Fut>(&self, map: &DashMap<K, V>, key: K, fetch: F) -> Result<V>
    where
        K: Eq + Hash,
        V: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cached = map.get(&key).map(|v| v.clone());
        if let Some(value) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = fetch().await?;
        map.insert(key, value.clone());
        Ok(value)
    }
}

#[async_trait]
impl<P: StatProvider> StatProvider for CachedProvider<P> {
    async fn get_season_stats(&self, player_id: u64) -> Result<Option<SeasonStats>> {
        self.memo(&self.season, player_id, || {
            self.inner.get_season_stats(player_id)
        })
        .await
    }

    async fn get_recent_game_log(&self, player_id: u64, n: usize) -> Result<Vec<GameLogEntry>> {
        self.memo(&self.game_logs, (player_id, n), || {
            self.inner.get_recent_game_log(player_id, n)
        })
        .await
    }

    async fn get_opponent_quality(&self, team: &str) -> Result<Option<OpponentQuality>> {
        self.memo(&self.opponents, team.to_uppercase(), || {
            self.inner.get_opponent_quality(team)
        })
        .await
    }

    async fn lookup_player(&self, name: &str, teams: &[String]) -> Result<Option<PlayerIdentity>> {
        let key = (name.to_lowercase(), teams.to_vec());
        self.memo(&self.lookups, key, || self.inner.lookup_player(name, teams))
            .await
    }

    async fn get_team_profile(&self, team: &str) -> Result<Option<TeamProfile>> {
        self.memo(&self.team_profiles, team.to_uppercase(), || {
            self.inner.get_team_profile(team)
        })
        .await
    }

    async fn get_shot_profile(&self, player_id: u64) -> Result<Option<ShotProfile>> {
        self.memo(&self.shot_profiles, player_id, || {
            self.inner.get_shot_profile(player_id)
        })
        .await
    }

    async fn get_goalie_form(&self, player_id: u64) -> Result<Option<GoalieForm>> {
        self.memo(&self.goalie_forms, player_id, || {
            self.inner.get_goalie_form(player_id)
        })
        .await
    }
}

#[async_trait]
impl<P: MarketQuoteProvider> MarketQuoteProvider for CachedProvider<P> {
    async fn get_price(&self, event_id: &str, prop: &PropKey) -> Result<Option<PriceQuote>> {
        let key = (
            event_id.to_string(),
            prop.player_name.as_ref().map(|n| n.to_lowercase()),
            prop.stat_type,
            prop.line.to_bits(),
        );
        self.memo(&self.prices, key, || self.inner.get_price(event_id, prop))
            .await
    }

    async fn get_game_lines(&self, event_id: &str) -> Result<Option<GameLines>> {
        self.memo(&self.game_lines, event_id.to_string(), || {
            self.inner.get_game_lines(event_id)
        })
        .await
    }
}

#[async_trait]
impl<P: OutcomeProvider> OutcomeProvider for CachedProvider<P> {
    async fn get_box_scores(&self, date: NaiveDate) -> Result<Vec<BoxScore>> {
        self.memo(&self.box_scores, date, || self.inner.get_box_scores(date))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PropEdgeError;
    use crate::providers::MockStatProvider;

    #[tokio::test]
    async fn test_second_call_is_a_hit() {
        let mut mock = MockStatProvider::new();
        mock.expect_get_season_stats()
            .times(1)
            .returning(|_| {
                Ok(Some(SeasonStats {
                    games: 20,
                    goals: Some(8),
                    assists: Some(12),
                    shots: Some(60),
                    avg_toi_minutes: Some(19.5),
                }))
            });

        let cached = CachedProvider::new(Arc::new(mock));
        let first = cached.get_season_stats(97).await.unwrap();
        let second = cached.get_season_stats(97).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cached.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let mut mock = MockStatProvider::new();
        let mut calls = 0;
        mock.expect_get_team_profile().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(PropEdgeError::provider("stats", "timeout"))
            } else {
                Ok(None)
            }
        });

        let cached = CachedProvider::new(Arc::new(mock));
        assert!(cached.get_team_profile("EDM").await.is_err());
        assert_eq!(cached.get_team_profile("edm").await.unwrap(), None);
        // Absent answers are cached too
        assert_eq!(cached.get_team_profile("EDM").await.unwrap(), None);
        assert_eq!(cached.stats().hits, 1);
    }
}
