//! Error types for wager settlement.

use thiserror::Error;

use crate::model::{CardId, Game, Hole, PlayerId, Strokes};

/// Top-level error returned by every engine operation.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("points can only be awarded between 2 and 4 players, got {0}")]
    UnsupportedPlayerCount(usize),

    #[error("settlement requested on an empty roster")]
    EmptyInput,
}

/// Malformed input supplied by the caller.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("player {player} has negative strokes {strokes}")]
    NegativeStrokes { player: PlayerId, strokes: Strokes },

    #[error("hole {0} is outside 1..=18")]
    InvalidHole(Hole),

    #[error("card {card} has invalid value {value}")]
    InvalidCardValue { card: CardId, value: f64 },

    #[error("{name} must be a finite non-negative amount, got {value}")]
    InvalidStake { name: &'static str, value: f64 },

    #[error("{0} requires a stake")]
    MissingStake(Game),

    #[error("player {0} has a non-finite points total")]
    NonFinitePoints(PlayerId),

    #[error("player {0} has a non-finite balance")]
    NonFiniteBalance(PlayerId),

    #[error("player {0} is not on the roster")]
    UnknownPlayer(PlayerId),

    #[error("player {0} appears twice on the roster")]
    DuplicatePlayer(PlayerId),

    #[error("hole has {got} players recorded but the group has {expected}")]
    PlayerCountMismatch { expected: usize, got: usize },
}

/// Reject a stake that cannot be used as money.
pub(crate) fn check_stake(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidStake { name, value })
    }
}

/// Reject a roster with the same id twice.
pub(crate) fn check_roster(roster: &[PlayerId]) -> Result<(), ValidationError> {
    for (idx, player) in roster.iter().enumerate() {
        if roster[..idx].contains(player) {
            return Err(ValidationError::DuplicatePlayer(player.clone()));
        }
    }
    Ok(())
}

/// Reject a player missing from the roster.
pub(crate) fn check_on_roster(roster: &[PlayerId], player: &str) -> Result<(), ValidationError> {
    if roster.iter().any(|p| p == player) {
        Ok(())
    } else {
        Err(ValidationError::UnknownPlayer(player.to_string()))
    }
}
