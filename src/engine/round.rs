//! End-to-end settlement of a round: every selected game, combined and paid out.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::cards::{CardsNetting, card_ownership, compute_cards_net};
use super::combine::combine;
use super::error::{EngineError, check_roster};
use super::fbt::compute_fbt_net;
use super::holes::total_points;
use super::points::compute_points_net;
use super::settle::settle;
use crate::model::{
    CardAssignment, Game, GameSelection, NetBalance, Player, PlayerId, StrokesByHole, Transaction,
};

/// Money at stake in the stroke games.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stakes {
    /// Currency per point of difference in the points game.
    pub point_value: f64,
    /// Currency per segment in the FBT game.
    pub fbt_value: f64,
}

/// Everything recorded during a round.
#[derive(Debug, Clone, Default)]
pub struct RoundInput {
    pub roster: Vec<Player>,
    pub games: GameSelection,
    pub card_history: Vec<CardAssignment>,
    pub strokes: StrokesByHole,
    pub stakes: Stakes,
    pub cards_netting: CardsNetting,
}

/// Outcome of a round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSettlement {
    pub players: Vec<Player>,
    /// Ledger of each selected game.
    pub games: BTreeMap<Game, NetBalance>,
    /// Sum of the per-game ledgers.
    pub combined: NetBalance,
    pub transactions: Vec<Transaction>,
}

impl RoundSettlement {
    /// Combined balance of a player.
    pub fn net(&self, player: &str) -> f64 {
        self.combined.get(player)
    }

    pub fn is_even(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Net a single game.
pub fn compute_game_net(
    game: Game,
    input: &RoundInput,
    roster: &[PlayerId],
) -> Result<NetBalance, EngineError> {
    match game {
        Game::Cards => {
            let ownership = card_ownership(&input.card_history)?;
            compute_cards_net(&ownership, roster, input.cards_netting)
        }
        Game::Points => {
            let totals = total_points(&input.strokes, roster)?;
            compute_points_net(&totals, input.stakes.point_value)
        }
        Game::Fbt => compute_fbt_net(&input.strokes, roster, input.stakes.fbt_value),
    }
}

/// Settle every selected game of a round.
///
/// Either the whole settlement is produced or the first error is returned.
pub fn settle_round(input: &RoundInput) -> Result<RoundSettlement, EngineError> {
    if input.roster.is_empty() {
        return Err(EngineError::EmptyInput);
    }
    let roster: Vec<PlayerId> = input.roster.iter().map(|p| p.id.clone()).collect();
    check_roster(&roster)?;

    let mut games = BTreeMap::new();
    for game in input.games.iter() {
        let balance = compute_game_net(game, input, &roster)?;
        debug!(%game, total = balance.total(), "game netted");
        games.insert(game, balance);
    }

    // the zeroed ledger keeps idle players in the result
    let mut ledgers = vec![NetBalance::zeroed(&roster)];
    ledgers.extend(games.values().cloned());
    let combined = combine(&ledgers);

    let transactions = settle(&combined, &roster)?;

    Ok(RoundSettlement {
        players: input.roster.clone(),
        games,
        combined,
        transactions,
    })
}
