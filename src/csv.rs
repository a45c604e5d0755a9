use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::engine::{CardsNetting, RoundSettlement};
use crate::{Amount, Game, RoundRecord, Transaction};

/// Errors that can occur when reading a round log or writing results
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open round log: {0}")]
    Open(csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized record type '{record_type}'")]
    UnrecognizedType { line: usize, record_type: String },

    #[error("line {line}: {record_type} missing {field}")]
    MissingField {
        line: usize,
        record_type: String,
        field: &'static str,
    },

    #[error("line {line}: invalid {field} '{value}'")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("failed to write csv row: {0}")]
    Write(csv::Error),

    #[error("failed to flush output: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    player: Option<String>,
    r#ref: Option<String>,
    value: Option<f64>,
}

#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    from: &'a str,
    to: &'a str,
    amount: Amount,
}

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    player: &'a str,
    name: &'a str,
    cards: String,
    points: String,
    fbt: String,
    net: Amount,
}

/// Read round records from a csv file
pub fn read_records(
    path: &Path,
) -> Result<impl Iterator<Item = Result<RoundRecord, CsvError>> + use<>, CsvError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(CsvError::Open)?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            parse_row(line, row)
        }))
}

fn parse_row(line: usize, row: InputRow) -> Result<RoundRecord, CsvError> {
    let record_type = row.r#type.as_str();
    let missing = |field| CsvError::MissingField {
        line,
        record_type: record_type.to_string(),
        field,
    };

    match record_type {
        "player" => {
            let player = row.player.ok_or_else(|| missing("player"))?;
            let name = row.r#ref.unwrap_or_else(|| player.clone());
            Ok(RoundRecord::Join { player, name })
        }
        "card" => Ok(RoundRecord::Card {
            player: row.player.ok_or_else(|| missing("player"))?,
            card: row.r#ref.ok_or_else(|| missing("card"))?,
            value: row.value.ok_or_else(|| missing("value"))?,
            timestamp: line as u64,
        }),
        "strokes" => {
            let player = row.player.ok_or_else(|| missing("player"))?;
            let hole = row.r#ref.ok_or_else(|| missing("hole"))?;
            let hole = hole.parse().map_err(|_| CsvError::InvalidField {
                line,
                field: "hole",
                value: hole.clone(),
            })?;
            let strokes = row.value.ok_or_else(|| missing("strokes"))?;
            if strokes.fract() != 0.0 || strokes.abs() > i32::MAX as f64 {
                return Err(CsvError::InvalidField {
                    line,
                    field: "strokes",
                    value: strokes.to_string(),
                });
            }
            Ok(RoundRecord::Strokes {
                player,
                hole,
                strokes: strokes as i32,
            })
        }
        "game" => {
            let name = row.r#ref.ok_or_else(|| missing("game"))?;
            let game = Game::from_name(&name).ok_or_else(|| CsvError::InvalidField {
                line,
                field: "game",
                value: name.clone(),
            })?;
            Ok(RoundRecord::Play {
                game,
                stake: row.value,
            })
        }
        "netting" => {
            let name = row.r#ref.ok_or_else(|| missing("netting"))?;
            let netting =
                CardsNetting::from_name(&name).ok_or_else(|| CsvError::InvalidField {
                    line,
                    field: "netting",
                    value: name.clone(),
                })?;
            Ok(RoundRecord::Netting(netting))
        }
        other => Err(CsvError::UnrecognizedType {
            line,
            record_type: other.to_string(),
        }),
    }
}

/// Write transactions in csv format
pub fn write_transactions(
    transactions: &[Transaction],
    output: impl io::Write,
) -> Result<(), CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer
        .write_record(["from", "to", "amount"])
        .map_err(CsvError::Write)?;
    for tx in transactions {
        let row = TransactionRow {
            from: &tx.from,
            to: &tx.to,
            amount: tx.amount,
        };
        writer.serialize(&row).map_err(CsvError::Write)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write every player's per-game and combined balance in csv format.
/// Games that were not played are left blank.
pub fn write_balances(
    settlement: &RoundSettlement,
    output: impl io::Write,
) -> Result<(), CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer
        .write_record(["player", "name", "cards", "points", "fbt", "net"])
        .map_err(CsvError::Write)?;
    for player in &settlement.players {
        let game_column = |game: Game| {
            settlement
                .games
                .get(&game)
                .map(|balance| Amount::from_float(balance.get(&player.id)).to_string())
                .unwrap_or_default()
        };
        let row = BalanceRow {
            player: &player.id,
            name: &player.name,
            cards: game_column(Game::Cards),
            points: game_column(Game::Points),
            fbt: game_column(Game::Fbt),
            net: Amount::from_float(settlement.net(&player.id)),
        };
        writer.serialize(&row).map_err(CsvError::Write)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RoundInput, Stakes, settle_round};
    use crate::model::{Player, StrokesByHole};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn read(content: &str) -> Vec<Result<RoundRecord, CsvError>> {
        let file = write_csv(content);
        read_records(file.path()).unwrap().collect()
    }

    const HEADER: &str = "type,player,ref,value\n";

    #[test]
    fn read_player() {
        let results = read(&format!("{HEADER}player,al,Alice,\nplayer,bo,,\n"));
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].as_ref().unwrap(),
            &RoundRecord::Join {
                player: "al".to_string(),
                name: "Alice".to_string()
            }
        );
        assert_eq!(
            results[1].as_ref().unwrap(),
            &RoundRecord::Join {
                player: "bo".to_string(),
                name: "bo".to_string()
            }
        );
    }

    #[test]
    fn read_card_uses_line_as_timestamp() {
        let results = read(&format!("{HEADER}card,al,snowman,2.5\n"));
        match results.into_iter().next().unwrap().unwrap() {
            RoundRecord::Card {
                player,
                card,
                value,
                timestamp,
            } => {
                assert_eq!(player, "al");
                assert_eq!(card, "snowman");
                assert_eq!(value, 2.5);
                assert_eq!(timestamp, 2);
            }
            other => panic!("expected card, got {other:?}"),
        }
    }

    #[test]
    fn read_strokes() {
        let results = read(&format!("{HEADER}strokes,al,7,5\n"));
        assert_eq!(
            results[0].as_ref().unwrap(),
            &RoundRecord::Strokes {
                player: "al".to_string(),
                hole: 7,
                strokes: 5
            }
        );
    }

    #[test]
    fn read_game_and_netting() {
        let results = read(&format!(
            "{HEADER}game,,points,0.5\ngame,,cards,\nnetting,,even,\n"
        ));
        assert_eq!(
            results[0].as_ref().unwrap(),
            &RoundRecord::Play {
                game: Game::Points,
                stake: Some(0.5)
            }
        );
        assert_eq!(
            results[1].as_ref().unwrap(),
            &RoundRecord::Play {
                game: Game::Cards,
                stake: None
            }
        );
        assert_eq!(
            results[2].as_ref().unwrap(),
            &RoundRecord::Netting(CardsNetting::EvenSplit)
        );
    }

    #[test]
    fn read_with_whitespace() {
        let results = read("type, player, ref, value\nstrokes, al, 1, 4\n");
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn read_returns_error_for_unknown_type() {
        let results = read(&format!("{HEADER}mulligan,al,1,\n"));
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::UnrecognizedType { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_fields() {
        let results = read(&format!("{HEADER}card,al,snowman,\nstrokes,,1,4\n"));
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::MissingField {
                line: 2,
                field: "value",
                ..
            }
        ));
        assert!(matches!(
            results[1].as_ref().unwrap_err(),
            CsvError::MissingField {
                line: 3,
                field: "player",
                ..
            }
        ));
    }

    #[test]
    fn read_returns_error_for_invalid_fields() {
        let results = read(&format!(
            "{HEADER}strokes,al,front,4\nstrokes,al,1,4.5\ngame,,skins,1\n"
        ));
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::InvalidField { field: "hole", .. }
        ));
        assert!(matches!(
            results[1].as_ref().unwrap_err(),
            CsvError::InvalidField {
                field: "strokes",
                ..
            }
        ));
        assert!(matches!(
            results[2].as_ref().unwrap_err(),
            CsvError::InvalidField { field: "game", .. }
        ));
    }

    #[test]
    fn read_missing_file_fails() {
        assert!(matches!(
            read_records(Path::new("does/not/exist.csv")),
            Err(CsvError::Open(_))
        ));
    }

    #[test]
    fn write_transactions_formats_cents() {
        let transactions = [Transaction {
            from: "a".to_string(),
            to: "b".to_string(),
            amount: Amount::from_cents(250),
        }];
        let mut out = Vec::new();
        write_transactions(&transactions, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "from,to,amount\na,b,2.50\n");
    }

    #[test]
    fn write_transactions_header_only_when_even() {
        let mut out = Vec::new();
        write_transactions(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "from,to,amount\n");
    }

    #[test]
    fn write_balances_leaves_unplayed_games_blank() {
        let mut strokes = StrokesByHole::new();
        strokes.insert(1, [("a".to_string(), 4), ("b".to_string(), 5)].into());
        let input = RoundInput {
            roster: vec![Player::new("a", "Al"), Player::new("b", "Bo")],
            games: [Game::Fbt].into_iter().collect(),
            strokes,
            stakes: Stakes {
                point_value: 0.0,
                fbt_value: 1.5,
            },
            ..RoundInput::default()
        };
        let settlement = settle_round(&input).unwrap();

        let mut out = Vec::new();
        write_balances(&settlement, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "player,name,cards,points,fbt,net\na,Al,,,3.00,3.00\nb,Bo,,,-3.00,-3.00\n"
        );
    }
}
