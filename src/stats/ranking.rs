use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use strum_macros::{Display, EnumIter, EnumString};

use crate::night::models::Night;
use crate::roster::models::{Player, PlayerId};

use super::{aggregation::SeasonLine, StatLine};

/// Decided games a player needs before appearing in the win% race
pub const MIN_DECIDED_FOR_WIN_PCT: u32 = 3;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SeasonSortKey {
    Name,
    Nights,
    GamesPlayed,
    Points,
    FgPct,
    Rebounds,
    Assists,
    Steals,
    Turnovers,
    FieldGoalsMade,
    WinLoss,
    WinPct,
}

/// Column and direction of the season table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SeasonSortKey,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SeasonSortKey::Points,
            ascending: false,
        }
    }
}

impl SortState {
    /// Selecting the active column flips direction, a new column starts descending
    pub fn select(&mut self, key: SeasonSortKey) {
        if self.key == key {
            self.ascending = !self.ascending;
        } else {
            self.key = key;
            self.ascending = false;
        }
    }
}

enum SortValue {
    Text(String),
    Number(f64),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        }
    }
}

fn sort_value(key: SeasonSortKey, player: &Player, line: &SeasonLine) -> SortValue {
    let totals = &line.totals;
    let number = match key {
        SeasonSortKey::Name => return SortValue::Text(player.name.to_lowercase()),
        SeasonSortKey::Nights => line.nights as f64,
        SeasonSortKey::GamesPlayed => line.gp as f64,
        SeasonSortKey::Points => totals.points() as f64,
        // undefined percentages rank below 0%
        SeasonSortKey::FgPct => totals.fg_percent().unwrap_or(-1.0),
        SeasonSortKey::Rebounds => totals.reb as f64,
        SeasonSortKey::Assists => totals.ast as f64,
        SeasonSortKey::Steals => totals.stl as f64,
        SeasonSortKey::Turnovers => totals.to as f64,
        SeasonSortKey::FieldGoalsMade => totals.fgm as f64,
        SeasonSortKey::WinLoss => line.win_loss_diff() as f64,
        SeasonSortKey::WinPct => line.win_pct().unwrap_or(-1.0),
    };
    SortValue::Number(number)
}

/// One row of the season table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonRow {
    pub player_id: PlayerId,
    pub name: String,
    pub active: bool,
    pub points: u32,
    pub fg_pct: Option<f64>,
    pub win_pct: Option<f64>,
    #[serde(flatten)]
    pub line: SeasonLine,
}

/// Every roster player, active ones first, each partition ordered by `sort`.
/// Equal values keep roster registration order.
pub fn season_table(
    players: &[Player],
    season: &HashMap<PlayerId, SeasonLine>,
    sort: SortState,
) -> Vec<SeasonRow> {
    let mut rows: Vec<(&Player, SeasonLine)> = players
        .iter()
        .map(|p| (p, season.get(&p.id).copied().unwrap_or_default()))
        .collect();

    rows.sort_by(|(pa, la), (pb, lb)| {
        lb.is_active().cmp(&la.is_active()).then_with(|| {
            let cmp = sort_value(sort.key, pa, la).compare(&sort_value(sort.key, pb, lb));
            if sort.ascending {
                cmp
            } else {
                cmp.reverse()
            }
        })
    });

    rows.into_iter()
        .map(|(player, line)| SeasonRow {
            player_id: player.id.clone(),
            name: player.name.clone(),
            active: line.is_active(),
            points: line.totals.points(),
            fg_pct: line.totals.fg_percent(),
            win_pct: line.win_pct(),
            line,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaderCategory {
    Points,
    Rebounds,
    Assists,
}

impl LeaderCategory {
    fn value(self, totals: &StatLine) -> f64 {
        match self {
            LeaderCategory::Points => totals.points() as f64,
            LeaderCategory::Rebounds => totals.reb as f64,
            LeaderCategory::Assists => totals.ast as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leader {
    pub player_id: PlayerId,
    pub name: String,
    pub value: f64,
    pub record: SeasonLine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub points: Option<Leader>,
    pub rebounds: Option<Leader>,
    pub assists: Option<Leader>,
    pub win_pct: Option<Leader>,
}

/// Highest value among eligible players; on a tie the earlier roster entry keeps the lead.
fn first_max(
    players: &[Player],
    season: &HashMap<PlayerId, SeasonLine>,
    eligible: impl Fn(&SeasonLine) -> bool,
    value: impl Fn(&SeasonLine) -> f64,
) -> Option<Leader> {
    let mut best: Option<Leader> = None;
    for player in players {
        let Some(line) = season.get(&player.id) else {
            continue;
        };
        if !line.is_active() || !eligible(line) {
            continue;
        }
        let candidate = value(line);
        if best.as_ref().map_or(true, |b| candidate > b.value) {
            best = Some(Leader {
                player_id: player.id.clone(),
                name: player.name.clone(),
                value: candidate,
                record: *line,
            });
        }
    }
    best
}

pub fn category_leader(
    players: &[Player],
    season: &HashMap<PlayerId, SeasonLine>,
    category: LeaderCategory,
) -> Option<Leader> {
    first_max(players, season, |_| true, |line| category.value(&line.totals))
}

/// Best win ratio among players with at least [`MIN_DECIDED_FOR_WIN_PCT`] decided games
pub fn win_pct_leader(
    players: &[Player],
    season: &HashMap<PlayerId, SeasonLine>,
) -> Option<Leader> {
    first_max(
        players,
        season,
        |line| line.decided() >= MIN_DECIDED_FOR_WIN_PCT,
        |line| line.win_pct().unwrap_or_default(),
    )
}

pub fn leaderboard(players: &[Player], season: &HashMap<PlayerId, SeasonLine>) -> Leaderboard {
    Leaderboard {
        points: category_leader(players, season, LeaderCategory::Points),
        rebounds: category_leader(players, season, LeaderCategory::Rebounds),
        assists: category_leader(players, season, LeaderCategory::Assists),
        win_pct: win_pct_leader(players, season),
    }
}

/// Attendee with the most points on the night, roster order breaking ties
pub fn night_top_scorer<'a>(
    players: &'a [Player],
    night: &Night,
    totals: &HashMap<PlayerId, StatLine>,
) -> Option<(&'a Player, u32)> {
    let mut top: Option<(&Player, u32)> = None;
    for player in players.iter().filter(|p| night.has_player(&p.id)) {
        let points = totals.get(&player.id).map(StatLine::points).unwrap_or(0);
        if top.map_or(true, |(_, best)| points > best) {
            top = Some((player, points));
        }
    }
    top
}
