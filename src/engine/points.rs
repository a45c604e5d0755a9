//! Points game netting: every pair of players settles its point difference.

use std::collections::BTreeMap;

use super::error::{EngineError, ValidationError, check_stake};
use crate::model::{NetBalance, PlayerId};

/// Net the points game from each player's round total.
///
/// For every pair, the player with more points collects the difference times
/// `point_value` from the other.
pub fn compute_points_net(
    total_points: &BTreeMap<PlayerId, f64>,
    point_value: f64,
) -> Result<NetBalance, EngineError> {
    check_stake("point value", point_value)?;
    if let Some((player, _)) = total_points.iter().find(|(_, points)| !points.is_finite()) {
        return Err(ValidationError::NonFinitePoints(player.clone()).into());
    }

    let mut balance = NetBalance::zeroed(total_points.keys());
    let players: Vec<_> = total_points.iter().collect();

    for (idx, (first, first_points)) in players.iter().enumerate() {
        for (second, second_points) in &players[idx + 1..] {
            let transfer = (*first_points - *second_points) * point_value;
            if transfer > 0.0 {
                balance.credit(first, transfer);
                balance.debit(second, transfer);
            } else if transfer < 0.0 {
                balance.credit(second, -transfer);
                balance.debit(first, -transfer);
            }
        }
    }

    Ok(balance)
}
