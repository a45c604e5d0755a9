//! Wager settlement engine.
//!
//! The netting and settlement functions are pure: they take the records of a
//! round and return ledgers and payments, holding no state between calls.
//! [`Scorecard`] collects a round's records one at a time, or from an async
//! stream, validating each as it arrives, and hands them to [`settle_round`]
//! once play is over.

use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::model::{
    CardAssignment, FIRST_HOLE, Game, Hole, LAST_HOLE, Player, PlayerId, RoundRecord, Strokes,
};

mod cards;
mod combine;
mod error;
mod fbt;
mod holes;
mod points;
mod round;
mod settle;

pub use cards::{CardsNetting, card_ownership, compute_cards_net};
pub use combine::combine;
pub use error::{EngineError, ValidationError};
pub use fbt::{Segment, compute_fbt_net};
pub use holes::{compute_hole_points, total_points};
pub use points::compute_points_net;
pub use round::{RoundInput, RoundSettlement, Stakes, compute_game_net, settle_round};
pub use settle::{residual, settle};

use error::{check_on_roster, check_stake};

/// Collects the records of a round.
#[derive(Debug, Default)]
pub struct Scorecard {
    input: RoundInput,
}

/// Public API
impl Scorecard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the scorecard with the given record stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = RoundRecord> + Unpin) {
        while let Some(record) = stream.next().await {
            // a bad record is logged and dropped, the round goes on
            let _ = self.apply(record);
        }
    }

    /// Return the group in joining order.
    pub fn players(&self) -> &[Player] {
        &self.input.roster
    }

    /// Return everything recorded so far.
    pub fn input(&self) -> &RoundInput {
        &self.input
    }

    /// Apply a single record on top of the current scorecard
    pub fn apply(&mut self, record: RoundRecord) -> Result<(), EngineError> {
        let result = match &record {
            RoundRecord::Join { player, name } => self.apply_join(player, name),
            RoundRecord::Card {
                player,
                card,
                value,
                timestamp,
            } => self.apply_card(player, card, *value, *timestamp),
            RoundRecord::Strokes {
                player,
                hole,
                strokes,
            } => self.apply_strokes(player, *hole, *strokes),
            RoundRecord::Play { game, stake } => self.apply_play(*game, *stake),
            RoundRecord::Netting(netting) => {
                self.input.cards_netting = *netting;
                Ok(())
            }
        };
        Self::log_result(&record, &result);
        result.map_err(EngineError::from)
    }

    /// Settle every game started on this scorecard.
    pub fn settle(&self) -> Result<RoundSettlement, EngineError> {
        let settlement = settle_round(&self.input)?;
        info!(
            players = settlement.players.len(),
            games = settlement.games.len(),
            transactions = settlement.transactions.len(),
            "round settled"
        );
        Ok(settlement)
    }
}

/// Private API
impl Scorecard {
    /// Small helper to log `apply` results
    fn log_result(record: &RoundRecord, result: &Result<(), ValidationError>) {
        match result {
            Ok(()) => info!(?record, "record applied"),
            Err(e) => warn!(?record, reason = %e, "record skipped"),
        }
    }

    fn roster_ids(&self) -> Vec<PlayerId> {
        self.input.roster.iter().map(|p| p.id.clone()).collect()
    }

    /// Apply a `RoundRecord::Join`:
    /// - Ensure the id is not already taken
    /// - Append the player to the roster
    fn apply_join(&mut self, player: &str, name: &str) -> Result<(), ValidationError> {
        if self.input.roster.iter().any(|p| p.id == player) {
            return Err(ValidationError::DuplicatePlayer(player.to_string()));
        }
        self.input.roster.push(Player::new(player, name));
        Ok(())
    }

    /// Apply a `RoundRecord::Card`:
    /// - Ensure the player has joined
    /// - Ensure the card value is a usable amount
    /// - Append to the card history (earlier holders are superseded, not removed)
    fn apply_card(
        &mut self,
        player: &str,
        card: &str,
        value: f64,
        timestamp: u64,
    ) -> Result<(), ValidationError> {
        check_on_roster(&self.roster_ids(), player)?;
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidCardValue {
                card: card.to_string(),
                value,
            });
        }
        self.input.card_history.push(CardAssignment {
            card: card.to_string(),
            player: player.to_string(),
            value,
            timestamp,
        });
        Ok(())
    }

    /// Apply a `RoundRecord::Strokes`:
    /// - Ensure the player has joined and the hole exists
    /// - Ensure the count is not negative
    /// - Store the count, replacing any earlier one for the hole
    fn apply_strokes(
        &mut self,
        player: &str,
        hole: Hole,
        strokes: Strokes,
    ) -> Result<(), ValidationError> {
        check_on_roster(&self.roster_ids(), player)?;
        if !(FIRST_HOLE..=LAST_HOLE).contains(&hole) {
            return Err(ValidationError::InvalidHole(hole));
        }
        if strokes < 0 {
            return Err(ValidationError::NegativeStrokes {
                player: player.to_string(),
                strokes,
            });
        }
        self.input
            .strokes
            .entry(hole)
            .or_default()
            .insert(player.to_string(), strokes);
        Ok(())
    }

    /// Apply a `RoundRecord::Play`:
    /// - Points and FBT need a stake; cards are valued per card
    /// - Add the game to the selection
    fn apply_play(&mut self, game: Game, stake: Option<f64>) -> Result<(), ValidationError> {
        match game {
            Game::Cards => {}
            Game::Points => {
                let stake = stake.ok_or(ValidationError::MissingStake(game))?;
                check_stake("point value", stake)?;
                self.input.stakes.point_value = stake;
            }
            Game::Fbt => {
                let stake = stake.ok_or(ValidationError::MissingStake(game))?;
                check_stake("fbt value", stake)?;
                self.input.stakes.fbt_value = stake;
            }
        }
        self.input.games.insert(game);
        Ok(())
    }
}
