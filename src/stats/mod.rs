pub mod aggregation;
pub mod handlers;
pub mod line;
pub mod ranking;

pub use aggregation::{merge_player_stats, season_stats, SeasonLine};
pub use line::{StatKey, StatLine};
pub use ranking::{
    category_leader, leaderboard, season_table, win_pct_leader, LeaderCategory, Leaderboard,
    SeasonRow, SeasonSortKey, SortState,
};
