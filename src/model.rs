//! Core domain types for the wager settlement engine.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::Amount;
use crate::engine::CardsNetting;

/// Player identifier, unique within a group.
pub type PlayerId = String;

/// Penalty card identifier.
pub type CardId = String;

/// Hole number, 1 to 18.
pub type Hole = u8;

/// Stroke count on one hole. Zero means the hole is unplayed.
pub type Strokes = i32;

/// Strokes of every player on a single hole.
pub type HoleStrokes = BTreeMap<PlayerId, Strokes>;

/// Strokes for the whole round, keyed by hole.
pub type StrokesByHole = BTreeMap<Hole, HoleStrokes>;

/// Points awarded to each player on a single hole. Ties may split points into fractions.
pub type HolePoints = BTreeMap<PlayerId, f64>;

pub const FIRST_HOLE: Hole = 1;
pub const LAST_HOLE: Hole = 18;

/// A member of the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One entry of the card history: `card` was handed to `player`.
#[derive(Debug, Clone, PartialEq)]
pub struct CardAssignment {
    pub card: CardId,
    pub player: PlayerId,
    pub value: f64,
    pub timestamp: u64,
}

/// Current holder of a card, derived from the history.
#[derive(Debug, Clone, PartialEq)]
pub struct CardOwner {
    pub player: PlayerId,
    pub value: f64,
}

/// A record of play, the input of a [`Scorecard`](crate::engine::Scorecard).
#[derive(Debug, Clone, PartialEq)]
pub enum RoundRecord {
    /// Add a player to the group.
    Join { player: PlayerId, name: String },
    /// Hand a penalty card to a player.
    Card {
        player: PlayerId,
        card: CardId,
        value: f64,
        timestamp: u64,
    },
    /// Record a player's strokes on a hole; a later record for the same hole replaces it.
    Strokes {
        player: PlayerId,
        hole: Hole,
        strokes: Strokes,
    },
    /// Start a game, with the stake it is played for.
    Play { game: Game, stake: Option<f64> },
    /// Choose how the card pot is redistributed.
    Netting(CardsNetting),
}

/// A single wager game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    /// Penalty cards, settled by proportional share of the pot.
    Cards,
    /// Per-hole points, settled pairwise.
    Points,
    /// Front nine, back nine and total stroke contests.
    Fbt,
}

impl Game {
    pub const ALL: [Game; 3] = [Game::Cards, Game::Points, Game::Fbt];

    pub fn name(self) -> &'static str {
        match self {
            Game::Cards => "cards",
            Game::Points => "points",
            Game::Fbt => "fbt",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Game::ALL.into_iter().find(|game| game.name() == name)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of games being played. Iteration order is fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameSelection(BTreeSet<Game>);

impl GameSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, game: Game) -> bool {
        self.0.insert(game)
    }

    pub fn contains(&self, game: Game) -> bool {
        self.0.contains(&game)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Game> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Game> for GameSelection {
    fn from_iter<I: IntoIterator<Item = Game>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Signed amount per player: positive is owed money, negative owes money.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NetBalance(BTreeMap<PlayerId, f64>);

impl NetBalance {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger with every listed player at zero.
    pub fn zeroed<'a>(players: impl IntoIterator<Item = &'a PlayerId>) -> Self {
        Self(players.into_iter().map(|p| (p.clone(), 0.0)).collect())
    }

    /// Balance of a player, zero when absent.
    pub fn get(&self, player: &str) -> f64 {
        self.0.get(player).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, player: &str) -> bool {
        self.0.contains_key(player)
    }

    pub fn credit(&mut self, player: &str, amount: f64) {
        *self.entry(player) += amount;
    }

    pub fn debit(&mut self, player: &str, amount: f64) {
        *self.entry(player) -= amount;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, f64)> + '_ {
        self.0.iter().map(|(player, amount)| (player, *amount))
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerId> + '_ {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all balances; zero for a consistent ledger.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    fn entry(&mut self, player: &str) -> &mut f64 {
        self.0.entry(player.to_string()).or_insert(0.0)
    }
}

impl FromIterator<(PlayerId, f64)> for NetBalance {
    fn from_iter<I: IntoIterator<Item = (PlayerId, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A payment reconciling part of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub from: PlayerId,
    pub to: PlayerId,
    pub amount: Amount,
}
