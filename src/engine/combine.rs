//! Merge per-game ledgers into a single ledger.

use crate::model::NetBalance;

/// Sum each player's balance across `balances`.
///
/// A player missing from one ledger contributes zero from it. A single ledger
/// comes back unchanged.
pub fn combine(balances: &[NetBalance]) -> NetBalance {
    let mut combined = NetBalance::new();
    for balance in balances {
        for (player, amount) in balance.iter() {
            combined.credit(player, amount);
        }
    }
    combined
}
