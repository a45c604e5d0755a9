//! Front/Back/Total game: three independent low-stroke contests.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use tracing::debug;

use super::error::{EngineError, ValidationError, check_on_roster, check_roster, check_stake};
use crate::model::{FIRST_HOLE, Hole, LAST_HOLE, NetBalance, PlayerId, Strokes, StrokesByHole};

/// One of the three contests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Front,
    Back,
    Total,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Front, Segment::Back, Segment::Total];

    pub fn holes(self) -> RangeInclusive<Hole> {
        match self {
            Segment::Front => FIRST_HOLE..=9,
            Segment::Back => 10..=LAST_HOLE,
            Segment::Total => FIRST_HOLE..=LAST_HOLE,
        }
    }
}

/// Net the FBT game for every roster player.
///
/// Each segment is worth `fbt_value`: the strictly lowest stroke total wins it,
/// split evenly among tied winners and paid evenly by the other participants.
/// Only players with a recorded stroke in a segment take part in it, and a
/// segment where all participants tie pays nothing.
pub fn compute_fbt_net(
    strokes: &StrokesByHole,
    roster: &[PlayerId],
    fbt_value: f64,
) -> Result<NetBalance, EngineError> {
    check_roster(roster)?;
    check_stake("fbt value", fbt_value)?;

    for (&hole, hole_strokes) in strokes {
        if !(FIRST_HOLE..=LAST_HOLE).contains(&hole) {
            return Err(ValidationError::InvalidHole(hole).into());
        }
        for (player, &count) in hole_strokes {
            check_on_roster(roster, player)?;
            if count < 0 {
                return Err(ValidationError::NegativeStrokes {
                    player: player.clone(),
                    strokes: count,
                }
                .into());
            }
        }
    }

    let mut balance = NetBalance::zeroed(roster);
    for segment in Segment::ALL {
        settle_segment(segment, strokes, fbt_value, &mut balance);
    }

    Ok(balance)
}

fn segment_totals(segment: Segment, strokes: &StrokesByHole) -> BTreeMap<&PlayerId, Strokes> {
    let mut totals = BTreeMap::new();
    for (_, hole_strokes) in strokes.range(segment.holes()) {
        for (player, &count) in hole_strokes {
            if count > 0 {
                *totals.entry(player).or_insert(0) += count;
            }
        }
    }
    totals
}

fn settle_segment(
    segment: Segment,
    strokes: &StrokesByHole,
    fbt_value: f64,
    balance: &mut NetBalance,
) {
    let totals = segment_totals(segment, strokes);
    let Some(&best) = totals.values().min() else {
        return;
    };

    let (winners, losers): (Vec<_>, Vec<_>) =
        totals.iter().partition(|(_, total)| **total == best);
    if losers.is_empty() {
        debug!(?segment, "segment tied, no payout");
        return;
    }

    let prize = fbt_value / winners.len() as f64;
    let cost = fbt_value / losers.len() as f64;
    for (player, _) in &winners {
        balance.credit(player, prize);
    }
    for (player, _) in &losers {
        balance.debit(player, cost);
    }
    debug!(?segment, best, winners = winners.len(), "segment settled");
}
