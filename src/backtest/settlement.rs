//! Settling scored props against box scores.

use tracing::debug;

use super::prop::{BacktestProp, HistoricalProp, PropState};
use crate::domain::{names_match, BoxScore, BoxScoreLine};
use crate::error::Result;

/// Why no value could be read for a prop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unmatched {
    NoGame,
    NotFinal,
    PlayerAbsent,
    StatUnavailable,
}

impl Unmatched {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unmatched::NoGame => "no game found",
            Unmatched::NotFinal => "game not final",
            Unmatched::PlayerAbsent => "player not in box score",
            Unmatched::StatUnavailable => "stat not in box score",
        }
    }
}

fn same_game(prop: &HistoricalProp, b: &BoxScore) -> bool {
    b.game_date == prop.game_date
        && b.home_team.eq_ignore_ascii_case(&prop.home_team)
        && b.away_team.eq_ignore_ascii_case(&prop.away_team)
}

fn same_player(line: &BoxScoreLine, prop: &BacktestProp, name: &str) -> bool {
    if let (Some(a), Some(b)) = (line.player_id, prop.player_id) {
        return a == b;
    }
    let team_ok = prop
        .team
        .as_deref()
        .map_or(true, |t| line.team.eq_ignore_ascii_case(t));
    team_ok && names_match(&line.name, name)
}

/// Observed value for `prop`, read from a final box score of its game
pub fn find_actual(
    prop: &BacktestProp,
    box_scores: &[BoxScore],
) -> std::result::Result<f64, Unmatched> {
    let historical = &prop.prop;
    let games: Vec<&BoxScore> = box_scores
        .iter()
        .filter(|b| same_game(historical, b))
        .collect();
    if games.is_empty() {
        return Err(Unmatched::NoGame);
    }
    let game = games
        .into_iter()
        .find(|b| b.is_final())
        .ok_or(Unmatched::NotFinal)?;

    if !historical.stat_type.is_player_prop() {
        return Ok(game.total_goals() as f64);
    }

    let name = historical.player_name.as_deref().unwrap_or_default();
    let line = game
        .players
        .iter()
        .find(|l| same_player(l, prop, name))
        .ok_or(Unmatched::PlayerAbsent)?;

    line.stat_value(historical.stat_type)
        .ok_or(Unmatched::StatUnavailable)
}

/// Settle one prop; props that never reached scoring are left alone.
///
/// Settling again with the same box scores leaves the prop unchanged.
pub fn settle_prop(prop: &mut BacktestProp, box_scores: &[BoxScore]) -> Result<()> {
    if !(prop.state == PropState::Scored || prop.state.is_terminal()) {
        return Ok(());
    }

    match find_actual(prop, box_scores) {
        Ok(actual) => prop.settle(Some(actual), None),
        Err(reason) => {
            debug!(prop = %prop.prop.label(), "Unsettled: {}", reason.as_str());
            prop.settle(None, Some(reason.as_str()))
        }
    }
}
