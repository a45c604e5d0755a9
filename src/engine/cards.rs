//! Penalty card game netting.
//!
//! Cards are handed around during the round and may change hands many times;
//! only the latest holder of each card pays for it. The pot (the value of every
//! held card) is then redistributed among the group.

use std::collections::BTreeMap;
use tracing::debug;

use super::error::{EngineError, ValidationError, check_on_roster, check_roster};
use crate::model::{CardAssignment, CardId, CardOwner, NetBalance, PlayerId};

/// How the pot is redistributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardsNetting {
    /// Each player receives a slice of the pot proportional to how far their
    /// debt is below the worst debt in the group.
    #[default]
    ProportionalShare,
    /// Every player receives the same slice of the pot.
    EvenSplit,
}

impl CardsNetting {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "proportional" => Some(CardsNetting::ProportionalShare),
            "even" => Some(CardsNetting::EvenSplit),
            _ => None,
        }
    }
}

/// Derive who currently holds each card.
///
/// The assignment with the latest timestamp wins; equal timestamps resolve to
/// the one appearing later in the history.
pub fn card_ownership(
    history: &[CardAssignment],
) -> Result<BTreeMap<CardId, CardOwner>, EngineError> {
    let mut latest: BTreeMap<&CardId, &CardAssignment> = BTreeMap::new();

    for assignment in history {
        if !assignment.value.is_finite() || assignment.value < 0.0 {
            return Err(ValidationError::InvalidCardValue {
                card: assignment.card.clone(),
                value: assignment.value,
            }
            .into());
        }
        match latest.get(&assignment.card) {
            Some(held) if held.timestamp > assignment.timestamp => {}
            _ => {
                latest.insert(&assignment.card, assignment);
            }
        }
    }

    Ok(latest
        .into_iter()
        .map(|(card, assignment)| {
            let owner = CardOwner {
                player: assignment.player.clone(),
                value: assignment.value,
            };
            (card.clone(), owner)
        })
        .collect())
}

/// Net every roster player's position in the card game.
pub fn compute_cards_net(
    ownership: &BTreeMap<CardId, CardOwner>,
    roster: &[PlayerId],
    netting: CardsNetting,
) -> Result<NetBalance, EngineError> {
    check_roster(roster)?;

    let mut debt: BTreeMap<&str, f64> = roster.iter().map(|p| (p.as_str(), 0.0)).collect();
    for (card, owner) in ownership {
        check_on_roster(roster, &owner.player)?;
        if !owner.value.is_finite() || owner.value < 0.0 {
            return Err(ValidationError::InvalidCardValue {
                card: card.clone(),
                value: owner.value,
            }
            .into());
        }
        *debt.entry(owner.player.as_str()).or_insert(0.0) += owner.value;
    }

    let pot: f64 = debt.values().sum();
    let max_debt = debt.values().copied().fold(0.0, f64::max);
    if max_debt == 0.0 {
        return Ok(NetBalance::zeroed(roster));
    }

    let shares = match netting {
        CardsNetting::ProportionalShare => proportional_shares(&debt, max_debt),
        CardsNetting::EvenSplit => even_shares(&debt),
    };
    debug!(pot, max_debt, ?netting, "cards pot computed");

    Ok(roster
        .iter()
        .map(|player| {
            let owed = debt[player.as_str()];
            (player.clone(), shares[player.as_str()] * pot - owed)
        })
        .collect())
}

/// Share of the pot by distance from the worst debt; even when everyone is tied.
fn proportional_shares<'a>(
    debt: &BTreeMap<&'a str, f64>,
    max_debt: f64,
) -> BTreeMap<&'a str, f64> {
    let advantage: BTreeMap<&str, f64> = debt.iter().map(|(p, d)| (*p, max_debt - d)).collect();
    let total_advantage: f64 = advantage.values().sum();
    if total_advantage > 0.0 {
        advantage
            .into_iter()
            .map(|(p, a)| (p, a / total_advantage))
            .collect()
    } else {
        even_shares(debt)
    }
}

fn even_shares<'a>(debt: &BTreeMap<&'a str, f64>) -> BTreeMap<&'a str, f64> {
    let share = 1.0 / debt.len() as f64;
    debt.keys().map(|p| (*p, share)).collect()
}
