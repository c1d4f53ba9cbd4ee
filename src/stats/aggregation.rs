use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::night::models::{GameOutcome, Night};
use crate::roster::models::{Player, PlayerId};

use super::StatLine;

/// Season-long accumulation for one player
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeasonLine {
    pub totals: StatLine,
    /// Games whose line counted toward the totals
    pub gp: u32,
    /// Distinct nights with at least one counted game
    pub nights: u32,
    pub w: u32,
    pub l: u32,
}

impl SeasonLine {
    /// Players with no counted game sit at the bottom of every table
    pub fn is_active(&self) -> bool {
        self.nights > 0
    }

    pub fn decided(&self) -> u32 {
        self.w + self.l
    }

    pub fn win_pct(&self) -> Option<f64> {
        match self.decided() {
            0 => None,
            decided => Some(self.w as f64 / decided as f64),
        }
    }

    pub fn win_loss_diff(&self) -> i64 {
        self.w as i64 - self.l as i64
    }
}

/// Per-player totals for one night, counting only the games each player took part in.
pub fn merge_player_stats(night: &Night) -> HashMap<PlayerId, StatLine> {
    let mut totals: HashMap<PlayerId, StatLine> = HashMap::new();
    for game in &night.games {
        for (player_id, line) in &game.stats {
            if !game.counts_toward(player_id) {
                continue;
            }
            let entry = totals.entry(player_id.clone()).or_default();
            *entry = entry.merge(*line);
        }
    }
    totals
}

/// Season totals, games played, nights attended and win/loss record for every
/// known player. Lines belonging to ids missing from `players` are ignored.
pub fn season_stats(players: &[Player], nights: &[Night]) -> HashMap<PlayerId, SeasonLine> {
    let mut season: HashMap<PlayerId, SeasonLine> = players
        .iter()
        .map(|p| (p.id.clone(), SeasonLine::default()))
        .collect();

    for night in nights {
        let mut seen: HashSet<&str> = HashSet::new();
        for game in &night.games {
            for (player_id, line) in &game.stats {
                let Some(entry) = season.get_mut(player_id) else {
                    continue;
                };
                if !game.counts_toward(player_id) {
                    continue;
                }
                entry.gp += 1;
                entry.totals = entry.totals.merge(*line);
                seen.insert(player_id.as_str());

                match game.outcome_for(player_id) {
                    GameOutcome::Win => entry.w += 1,
                    GameOutcome::Loss => entry.l += 1,
                    GameOutcome::Undecided => {}
                }
            }
        }
        for player_id in seen {
            if let Some(entry) = season.get_mut(player_id) {
                entry.nights += 1;
            }
        }
    }

    season
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::night::models::{Game, Side, Teams};
    use chrono::NaiveDate;

    fn ids(names: &[&str]) -> Vec<PlayerId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn roster(names: &[&str]) -> Vec<Player> {
        names.iter().map(|n| Player::new(*n, n.to_uppercase())).collect()
    }

    fn night(id: &str, attendees: &[&str]) -> Night {
        Night::new(
            id,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            None,
            ids(attendees),
        )
    }

    fn push_game(night: &mut Night, teams: Teams, lines: &[(&str, StatLine)]) -> usize {
        let number = night.next_game_number();
        let mut game = Game::new(format!("{}-g{}", night.id, number), number, teams, &night.players);
        for (pid, line) in lines {
            game.stats.insert(pid.to_string(), *line);
        }
        night.games.push(game);
        night.games.len() - 1
    }

    fn twos(n: u32) -> StatLine {
        StatLine {
            pts2: n,
            fgm: n,
            fga: n,
            ..StatLine::zero()
        }
    }

    fn threes(n: u32) -> StatLine {
        StatLine {
            pts3: n,
            fgm: n,
            fga: n,
            ..StatLine::zero()
        }
    }

    #[test]
    fn stats_only_game_counts_every_line() {
        let mut n = night("n1", &["a", "b"]);
        push_game(&mut n, Teams::default(), &[("a", twos(2)), ("b", threes(1))]);

        let totals = merge_player_stats(&n);
        assert_eq!(totals["a"].points(), 4);
        assert_eq!(totals["b"].points(), 3);
    }

    #[test]
    fn teamless_line_is_excluded_once_teams_exist() {
        let mut n = night("n1", &["a", "b", "c"]);
        push_game(
            &mut n,
            Teams::new(ids(&["a"]), ids(&["b"])),
            &[("a", twos(1)), ("b", twos(1)), ("c", threes(5))],
        );

        let totals = merge_player_stats(&n);
        assert!(!totals.contains_key("c"));

        let season = season_stats(&roster(&["a", "b", "c"]), &[n]);
        assert_eq!(season["c"].gp, 0);
        assert_eq!(season["c"].nights, 0);
        assert_eq!(season["c"].totals, StatLine::zero());
        assert!(!season["c"].is_active());
    }

    #[test]
    fn night_totals_sum_across_games() {
        let mut n = night("n1", &["a", "b"]);
        push_game(&mut n, Teams::default(), &[("a", twos(1))]);
        push_game(&mut n, Teams::default(), &[("a", threes(2))]);

        let totals = merge_player_stats(&n);
        assert_eq!(totals["a"].points(), 8);
        assert_eq!(totals["a"].fga, 3);
        assert_eq!(totals["b"], StatLine::zero());
    }

    #[test]
    fn season_counts_games_nights_and_record() {
        let mut first = night("n1", &["a", "b"]);
        let g = push_game(&mut first, Teams::new(ids(&["a"]), ids(&["b"])), &[("a", twos(3))]);
        first.games[g].winner = Some(Side::A);
        let g = push_game(&mut first, Teams::new(ids(&["b"]), ids(&["a"])), &[]);
        first.games[g].winner = Some(Side::A);
        push_game(&mut first, Teams::new(ids(&["a"]), ids(&["b"])), &[]);

        let mut second = night("n2", &["a", "b"]);
        push_game(&mut second, Teams::default(), &[("b", threes(1))]);

        let season = season_stats(&roster(&["a", "b"]), &[first, second]);

        let a = season["a"];
        assert_eq!(a.gp, 4);
        assert_eq!(a.nights, 2);
        assert_eq!((a.w, a.l), (1, 1));
        assert_eq!(a.totals.points(), 6);

        let b = season["b"];
        assert_eq!((b.w, b.l), (1, 1));
        assert_eq!(b.totals.points(), 3);
        assert_eq!(b.win_pct(), Some(0.5));
    }

    #[test]
    fn undecided_games_leave_record_untouched() {
        let mut n = night("n1", &["a", "b"]);
        push_game(&mut n, Teams::new(ids(&["a"]), ids(&["b"])), &[]);
        let g = push_game(&mut n, Teams::default(), &[]);
        n.games[g].winner = Some(Side::B);

        let season = season_stats(&roster(&["a", "b"]), &[n]);
        assert_eq!(season["a"].decided(), 0);
        assert_eq!(season["a"].win_pct(), None);
        assert_eq!(season["b"].gp, 2);
    }

    #[test]
    fn unknown_player_lines_are_ignored() {
        let mut n = night("n1", &["a", "ghost"]);
        push_game(&mut n, Teams::default(), &[("ghost", twos(4))]);

        let season = season_stats(&roster(&["a"]), &[n]);
        assert_eq!(season.len(), 1);
        assert!(season.contains_key("a"));
    }
}
