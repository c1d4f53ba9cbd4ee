use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The eight raw counters tracked for a player in a game
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatKey {
    Pts2,
    Pts3,
    Fgm,
    Fga,
    Reb,
    Ast,
    Stl,
    To,
}

impl StatKey {
    /// Made baskets also count as one field goal attempted and one made
    pub fn is_made_basket(self) -> bool {
        matches!(self, StatKey::Pts2 | StatKey::Pts3)
    }
}

/// Largest value a single game counter can reach; it fits a signed 32-bit column
pub const MAX_COUNTER: u32 = i32::MAX as u32;

/// One player's counting stats for one game, or a merged aggregate of several
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatLine {
    pub pts2: u32,
    pub pts3: u32,
    pub fgm: u32,
    pub fga: u32,
    pub reb: u32,
    pub ast: u32,
    pub stl: u32,
    pub to: u32,
}

impl StatLine {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Field-wise sum, saturating at `u32::MAX`. Every aggregate in the crate is built from this.
    pub fn merge(self, other: StatLine) -> StatLine {
        StatLine {
            pts2: self.pts2.saturating_add(other.pts2),
            pts3: self.pts3.saturating_add(other.pts3),
            fgm: self.fgm.saturating_add(other.fgm),
            fga: self.fga.saturating_add(other.fga),
            reb: self.reb.saturating_add(other.reb),
            ast: self.ast.saturating_add(other.ast),
            stl: self.stl.saturating_add(other.stl),
            to: self.to.saturating_add(other.to),
        }
    }

    pub fn points(&self) -> u32 {
        self.pts2
            .saturating_mul(2)
            .saturating_add(self.pts3.saturating_mul(3))
    }

    /// Made over attempted field goals, `None` when nothing was attempted.
    ///
    /// `fgm > fga` is representable after manual corrections and simply
    /// yields a ratio above one.
    pub fn fg_percent(&self) -> Option<f64> {
        if self.fga == 0 {
            None
        } else {
            Some(self.fgm as f64 / self.fga as f64)
        }
    }

    pub fn get(&self, key: StatKey) -> u32 {
        match key {
            StatKey::Pts2 => self.pts2,
            StatKey::Pts3 => self.pts3,
            StatKey::Fgm => self.fgm,
            StatKey::Fga => self.fga,
            StatKey::Reb => self.reb,
            StatKey::Ast => self.ast,
            StatKey::Stl => self.stl,
            StatKey::To => self.to,
        }
    }

    fn slot(&mut self, key: StatKey) -> &mut u32 {
        match key {
            StatKey::Pts2 => &mut self.pts2,
            StatKey::Pts3 => &mut self.pts3,
            StatKey::Fgm => &mut self.fgm,
            StatKey::Fga => &mut self.fga,
            StatKey::Reb => &mut self.reb,
            StatKey::Ast => &mut self.ast,
            StatKey::Stl => &mut self.stl,
            StatKey::To => &mut self.to,
        }
    }

    /// Returns a copy with `delta` applied to `key`, clamped to `0..=MAX_COUNTER`.
    ///
    /// Logging a made basket moves `fga` and `fgm` by the same delta, each
    /// clamped on its own. Adjusting `fga` or `fgm` directly touches nothing else.
    pub fn with_delta(self, key: StatKey, delta: i32) -> StatLine {
        let mut next = self;
        shift(next.slot(key), delta);
        if key.is_made_basket() {
            shift(next.slot(StatKey::Fga), delta);
            shift(next.slot(StatKey::Fgm), delta);
        }
        next
    }
}

fn shift(value: &mut u32, delta: i32) {
    let shifted = (*value as i64 + delta as i64).clamp(0, MAX_COUNTER as i64);
    *value = shifted as u32;
}

impl std::iter::Sum for StatLine {
    fn sum<I: Iterator<Item = StatLine>>(iter: I) -> Self {
        iter.fold(StatLine::zero(), StatLine::merge)
    }
}
