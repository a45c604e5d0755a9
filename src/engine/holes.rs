//! Per-hole point awards for the points game.

use std::collections::BTreeMap;
use tracing::debug;

use super::error::{EngineError, ValidationError, check_on_roster, check_roster};
use crate::model::{FIRST_HOLE, HolePoints, HoleStrokes, LAST_HOLE, PlayerId, StrokesByHole};

/// Points for first, second, ... place under strict ranking, by group size.
fn award_table(player_count: usize) -> Result<&'static [f64], EngineError> {
    match player_count {
        2 => Ok(&[2.0, 0.0]),
        3 => Ok(&[5.0, 3.0, 1.0]),
        4 => Ok(&[7.0, 5.0, 3.0, 1.0]),
        n => Err(EngineError::UnsupportedPlayerCount(n)),
    }
}

/// Award points for one hole.
///
/// Fewest strokes ranks first. Players tied on strokes share the sum of the
/// places they occupy, so the hole total is always the table total. When any
/// player has no strokes recorded the hole is skipped and no points are awarded.
pub fn compute_hole_points(
    strokes: &HoleStrokes,
    player_count: usize,
) -> Result<HolePoints, EngineError> {
    let table = award_table(player_count)?;

    for (player, &count) in strokes {
        if count < 0 {
            return Err(ValidationError::NegativeStrokes {
                player: player.clone(),
                strokes: count,
            }
            .into());
        }
    }
    if strokes.len() > player_count {
        return Err(ValidationError::PlayerCountMismatch {
            expected: player_count,
            got: strokes.len(),
        }
        .into());
    }
    if strokes.len() < player_count || strokes.values().any(|&count| count == 0) {
        return Ok(HolePoints::new());
    }

    // stable sort keeps ties in id order
    let mut ranked: Vec<_> = strokes.iter().collect();
    ranked.sort_by_key(|(_, count)| **count);

    let mut points = HolePoints::new();
    let mut place = 0;
    for tied in ranked.chunk_by(|a, b| a.1 == b.1) {
        let pooled: f64 = table[place..place + tied.len()].iter().sum();
        let share = pooled / tied.len() as f64;
        for (player, _) in tied {
            points.insert((*player).clone(), share);
        }
        place += tied.len();
    }

    Ok(points)
}

/// Sum hole points over the round for every roster player.
///
/// Holes that were skipped contribute nothing; players without any awarded
/// points total zero.
pub fn total_points(
    strokes: &StrokesByHole,
    roster: &[PlayerId],
) -> Result<BTreeMap<PlayerId, f64>, EngineError> {
    check_roster(roster)?;

    let mut totals: BTreeMap<PlayerId, f64> = roster.iter().map(|p| (p.clone(), 0.0)).collect();

    for (&hole, hole_strokes) in strokes {
        if !(FIRST_HOLE..=LAST_HOLE).contains(&hole) {
            return Err(ValidationError::InvalidHole(hole).into());
        }
        for player in hole_strokes.keys() {
            check_on_roster(roster, player)?;
        }

        let points = compute_hole_points(hole_strokes, roster.len())?;
        if points.is_empty() {
            debug!(hole, "hole not finished by every player, no points awarded");
        }
        for (player, awarded) in points {
            *totals.entry(player).or_insert(0.0) += awarded;
        }
    }

    Ok(totals)
}
