use chrono::NaiveDate;
use sqlx::FromRow;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

use crate::night::models::{Game, Night, Side, Teams};
use crate::roster::models::PlayerId;
use crate::stats::StatLine;

/// Row shapes shared by every store. They mirror the relational layout:
/// nights, night attendance, games, game membership and per-player stat lines.
#[derive(Debug, Clone, FromRow)]
pub struct NightRow {
    pub id: String,
    pub date: NaiveDate,
    pub youtube_url: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AttendanceRow {
    pub night_id: String,
    pub player_id: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct GameRow {
    pub id: String,
    pub night_id: String,
    pub number: i32,
    pub winner: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct GamePlayerRow {
    pub game_id: String,
    pub player_id: String,
    pub team: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct StatRow {
    pub game_id: String,
    pub player_id: String,
    pub pts2: i32,
    pub pts3: i32,
    pub fgm: i32,
    pub fga: i32,
    pub reb: i32,
    pub ast: i32,
    pub stl: i32,
    pub to_: i32,
}

fn counter(value: i32) -> u32 {
    value.max(0) as u32
}

fn column(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl StatRow {
    pub fn new(game_id: &str, player_id: &str, line: &StatLine) -> Self {
        Self {
            game_id: game_id.to_string(),
            player_id: player_id.to_string(),
            pts2: column(line.pts2),
            pts3: column(line.pts3),
            fgm: column(line.fgm),
            fga: column(line.fga),
            reb: column(line.reb),
            ast: column(line.ast),
            stl: column(line.stl),
            to_: column(line.to),
        }
    }

    pub fn line(&self) -> StatLine {
        StatLine {
            pts2: counter(self.pts2),
            pts3: counter(self.pts3),
            fgm: counter(self.fgm),
            fga: counter(self.fga),
            reb: counter(self.reb),
            ast: counter(self.ast),
            stl: counter(self.stl),
            to: counter(self.to_),
        }
    }
}

pub fn parse_side(raw: Option<&str>) -> Option<Side> {
    let raw = raw?;
    match Side::from_str(raw) {
        Ok(side) => Some(side),
        Err(_) => {
            warn!(value = %raw, "Ignoring unrecognised team side");
            None
        }
    }
}

/// Builds the night tree from flat rows.
///
/// Night order follows `nights` and game order follows game number. Every
/// attendee gets a zero line when no row was persisted for them, and rows for
/// players no longer on the night roster are left out of the tree.
pub fn assemble_nights(
    nights: Vec<NightRow>,
    attendance: &[AttendanceRow],
    games: &[GameRow],
    game_players: &[GamePlayerRow],
    stats: &[StatRow],
) -> Vec<Night> {
    let mut games_by_night: HashMap<&str, Vec<&GameRow>> = HashMap::new();
    for game in games {
        games_by_night
            .entry(game.night_id.as_str())
            .or_default()
            .push(game);
    }

    nights
        .into_iter()
        .map(|row| {
            let roster: Vec<PlayerId> = attendance
                .iter()
                .filter(|a| a.night_id == row.id)
                .map(|a| a.player_id.clone())
                .collect();

            let mut night_games: Vec<Game> = games_by_night
                .get(row.id.as_str())
                .map(|rows| {
                    rows.iter()
                        .map(|g| assemble_game(g, &roster, game_players, stats))
                        .collect()
                })
                .unwrap_or_default();
            night_games.sort_by_key(|g| g.number);

            Night {
                id: row.id,
                date: row.date,
                youtube_url: row.youtube_url.filter(|url| !url.is_empty()),
                players: roster,
                games: night_games,
            }
        })
        .collect()
}

fn assemble_game(
    row: &GameRow,
    roster: &[PlayerId],
    game_players: &[GamePlayerRow],
    stats: &[StatRow],
) -> Game {
    let mut teams = Teams::default();
    for member in game_players.iter().filter(|m| m.game_id == row.id) {
        match parse_side(member.team.as_deref()) {
            Some(Side::A) => teams.a.push(member.player_id.clone()),
            Some(Side::B) => teams.b.push(member.player_id.clone()),
            None => {}
        }
    }

    let mut game = Game::new(row.id.clone(), row.number.max(1) as u32, teams, roster);
    game.winner = parse_side(row.winner.as_deref());
    for stat in stats.iter().filter(|s| s.game_id == row.id) {
        if let Some(line) = game.stats.get_mut(&stat.player_id) {
            *line = stat.line();
        }
    }
    game
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 2).unwrap()
    }

    #[test]
    fn assembles_games_in_number_order_with_zero_fill() {
        let nights = vec![NightRow {
            id: "n1".into(),
            date: date(),
            youtube_url: Some(String::new()),
        }];
        let attendance = vec![
            AttendanceRow {
                night_id: "n1".into(),
                player_id: "a".into(),
            },
            AttendanceRow {
                night_id: "n1".into(),
                player_id: "b".into(),
            },
        ];
        let games = vec![
            GameRow {
                id: "g2".into(),
                night_id: "n1".into(),
                number: 2,
                winner: Some("b".into()),
            },
            GameRow {
                id: "g1".into(),
                night_id: "n1".into(),
                number: 1,
                winner: None,
            },
        ];
        let members = vec![
            GamePlayerRow {
                game_id: "g2".into(),
                player_id: "a".into(),
                team: Some("a".into()),
            },
            GamePlayerRow {
                game_id: "g2".into(),
                player_id: "b".into(),
                team: Some("b".into()),
            },
        ];
        let stats = vec![
            StatRow::new(
                "g1",
                "a",
                &StatLine {
                    pts3: 2,
                    ..StatLine::zero()
                },
            ),
            StatRow::new("g1", "departed", &StatLine { reb: 7, ..StatLine::zero() }),
        ];

        let assembled = assemble_nights(nights, &attendance, &games, &members, &stats);
        let night = &assembled[0];

        assert_eq!(night.youtube_url, None);
        assert_eq!(night.games[0].id, "g1");
        assert_eq!(night.games[0].stat_line("a").pts3, 2);
        assert_eq!(night.games[0].stat_line("b"), StatLine::zero());
        assert!(!night.games[0].stats.contains_key("departed"));
        assert_eq!(night.games[1].winner, Some(Side::B));
        assert_eq!(night.games[1].teams.a, vec!["a".to_string()]);
    }

    #[test]
    fn negative_counters_read_back_as_zero() {
        let mut row = StatRow::new("g", "p", &StatLine::zero());
        row.stl = -3;
        assert_eq!(row.line().stl, 0);
    }

    #[test]
    fn ceiling_counters_survive_storage() {
        let line = StatLine::zero().with_delta(crate::stats::StatKey::Pts3, i32::MAX);
        let row = StatRow::new("g", "p", &line);

        assert_eq!(row.pts3, i32::MAX);
        assert_eq!(row.line(), line);
        let oversized = StatRow::new("g", "p", &StatLine { reb: u32::MAX, ..StatLine::zero() });
        assert_eq!(oversized.reb, i32::MAX);
    }

    #[test]
    fn unknown_side_is_ignored() {
        assert_eq!(parse_side(Some("c")), None);
        assert_eq!(parse_side(Some("a")), Some(Side::A));
        assert_eq!(parse_side(None), None);
    }
}
