use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ranking::{leaderboard, season_table, Leaderboard, SeasonRow, SeasonSortKey, SortState};
use crate::shared::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeasonQuery {
    pub sort: Option<SeasonSortKey>,
    pub dir: Option<SortDirection>,
}

impl SeasonQuery {
    fn sort_state(&self) -> SortState {
        let mut state = SortState::default();
        if let Some(key) = self.sort {
            if key != state.key {
                state.select(key);
            }
        }
        if let Some(dir) = self.dir {
            state.ascending = dir == SortDirection::Asc;
        }
        state
    }
}

#[derive(Debug, Serialize)]
pub struct SeasonTable {
    pub sort: SortState,
    pub nights: usize,
    pub games: usize,
    pub rows: Vec<SeasonRow>,
}

/// GET /stats/season?sort=<key>&dir=<asc|desc>
#[instrument(name = "season_table", skip(state))]
pub async fn season(
    State(state): State<AppState>,
    Query(query): Query<SeasonQuery>,
) -> Json<SeasonTable> {
    let sort = query.sort_state();
    let book = state.book.read().await;
    let season = book.season_stats();

    Json(SeasonTable {
        sort,
        nights: book.nights().len(),
        games: book.total_games(),
        rows: season_table(book.players(), &season, sort),
    })
}

/// GET /stats/leaders
#[instrument(name = "leaders", skip(state))]
pub async fn leaders(State(state): State<AppState>) -> Json<Leaderboard> {
    let book = state.book.read().await;
    Json(leaderboard(book.players(), &book.season_stats()))
}
