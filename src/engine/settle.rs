//! Reduce a ledger to a short list of payments.

use tracing::{debug, info};

use super::error::{EngineError, ValidationError, check_on_roster, check_roster};
use crate::amount::{Amount, is_negligible};
use crate::model::{NetBalance, PlayerId, Transaction};

/// A player with money left to pay or collect.
struct Party<'a> {
    player: &'a PlayerId,
    remaining: Amount,
}

/// Round every balance to whole cents, in `player_order`.
///
/// Balances are rounded down, then the cents lost to rounding go back one at a
/// time to the largest dropped fractions until the rounded ledger has the same
/// total as the original. No player moves by more than a cent.
fn whole_cents<'a>(balance: &NetBalance, player_order: &'a [PlayerId]) -> Vec<Party<'a>> {
    let mut total = 0.0;
    let mut floored = Amount::default();
    let mut rounded = Vec::with_capacity(player_order.len());
    let mut dropped = Vec::with_capacity(player_order.len());
    for player in player_order {
        let amount = balance.get(player);
        let (remaining, rest) = Amount::floor_float(amount);
        total += amount;
        floored += remaining;
        dropped.push((rounded.len(), rest));
        rounded.push(Party { player, remaining });
    }

    let short = (Amount::from_float(total).cents() - floored.cents()).max(0);
    dropped.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (idx, _) in dropped.into_iter().take(short as usize) {
        rounded[idx].remaining += Amount::from_cents(1);
    }
    rounded
}

/// Split rounded balances into creditors and debtors, largest first.
///
/// The sort is stable so equal amounts keep `player_order`.
fn sides(rounded: Vec<Party<'_>>) -> (Vec<Party<'_>>, Vec<Party<'_>>) {
    let zero = Amount::default();
    let (mut creditors, debtors): (Vec<_>, Vec<_>) = rounded
        .into_iter()
        .filter(|party| party.remaining != zero)
        .partition(|party| party.remaining > zero);
    let mut debtors: Vec<_> = debtors
        .into_iter()
        .map(|party| Party {
            remaining: -party.remaining,
            ..party
        })
        .collect();
    creditors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
    debtors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
    (creditors, debtors)
}

/// Produce the payments that bring every balance back to zero.
///
/// A ledger where every balance is within `EPSILON` of zero is already even.
/// Otherwise balances are first rounded to whole cents without changing the
/// ledger's total, so every player ends within a cent of zero. Then the largest
/// remaining debtor pays the largest remaining creditor as much as either can
/// take, until one side runs out.
pub fn settle(
    balance: &NetBalance,
    player_order: &[PlayerId],
) -> Result<Vec<Transaction>, EngineError> {
    if player_order.is_empty() {
        return Err(EngineError::EmptyInput);
    }
    check_roster(player_order)?;
    for (player, amount) in balance.iter() {
        check_on_roster(player_order, player)?;
        if !amount.is_finite() {
            return Err(ValidationError::NonFiniteBalance(player.clone()).into());
        }
    }

    if balance.iter().all(|(_, amount)| is_negligible(amount)) {
        info!("all players are even");
        return Ok(Vec::new());
    }

    let (mut creditors, mut debtors) = sides(whole_cents(balance, player_order));
    debug!(
        creditors = creditors.len(),
        debtors = debtors.len(),
        "settling ledger"
    );

    let mut transactions = Vec::new();
    let (mut c, mut d) = (0, 0);
    while c < creditors.len() && d < debtors.len() {
        let creditor = &mut creditors[c];
        let debtor = &mut debtors[d];

        let amount = creditor.remaining.min(debtor.remaining);
        transactions.push(Transaction {
            from: debtor.player.clone(),
            to: creditor.player.clone(),
            amount,
        });

        creditor.remaining -= amount;
        debtor.remaining -= amount;
        if creditor.remaining.is_zero() {
            c += 1;
        }
        if debtor.remaining.is_zero() {
            d += 1;
        }
    }

    if transactions.is_empty() {
        info!("all players are even");
    } else {
        info!(transactions = transactions.len(), "ledger settled");
    }
    Ok(transactions)
}

/// Balances left over after every payment is made.
pub fn residual(balance: &NetBalance, transactions: &[Transaction]) -> NetBalance {
    let mut residual = balance.clone();
    for tx in transactions {
        residual.credit(&tx.from, tx.amount.to_float());
        residual.debit(&tx.to, tx.amount.to_float());
    }
    residual
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(entries: &[(&str, f64)]) -> NetBalance {
        entries.iter().map(|(p, a)| (p.to_string(), *a)).collect()
    }

    fn order(ids: &[&str]) -> Vec<PlayerId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn tx(from: &str, to: &str, cents: i64) -> Transaction {
        Transaction {
            from: from.to_string(),
            to: to.to_string(),
            amount: Amount::from_cents(cents),
        }
    }

    fn assert_reconciled(balance: &NetBalance, transactions: &[Transaction]) {
        for (player, left) in residual(balance, transactions).iter() {
            assert!(left.abs() <= 0.01 + 1e-9, "{player} left with {left}");
        }
    }

    #[test]
    fn one_debtor_one_creditor() {
        let balance = ledger(&[("a", -2.0), ("b", 2.0)]);
        let transactions = settle(&balance, &order(&["a", "b"])).unwrap();
        assert_eq!(transactions, [tx("a", "b", 200)]);
    }

    #[test]
    fn points_game_payment() {
        let balance = ledger(&[("a", 6.0), ("b", -6.0)]);
        let transactions = settle(&balance, &order(&["a", "b"])).unwrap();
        assert_eq!(transactions, [tx("b", "a", 600)]);
    }

    #[test]
    fn largest_parties_matched_first() {
        let balance = ledger(&[("a", 10.0), ("b", 5.0), ("c", -12.0), ("d", -3.0)]);
        let transactions = settle(&balance, &order(&["a", "b", "c", "d"])).unwrap();
        assert_eq!(
            transactions,
            [tx("c", "a", 1000), tx("c", "b", 200), tx("d", "b", 300)]
        );
        assert_reconciled(&balance, &transactions);
    }

    #[test]
    fn ties_follow_player_order() {
        let balance = ledger(&[("a", -5.0), ("b", 5.0), ("c", 5.0), ("d", -5.0)]);

        let transactions = settle(&balance, &order(&["a", "b", "c", "d"])).unwrap();
        assert_eq!(transactions, [tx("a", "b", 500), tx("d", "c", 500)]);

        let transactions = settle(&balance, &order(&["d", "c", "b", "a"])).unwrap();
        assert_eq!(transactions, [tx("d", "c", 500), tx("a", "b", 500)]);
    }

    #[test]
    fn all_even_is_empty() {
        let balance = ledger(&[("a", 0.004), ("b", -0.004), ("c", 0.0)]);
        let transactions = settle(&balance, &order(&["a", "b", "c"])).unwrap();
        assert!(transactions.is_empty());
    }

    #[test]
    fn thirds_round_to_cents() {
        let third = 10.0 / 3.0;
        let balance = ledger(&[("a", -10.0), ("b", third), ("c", third), ("d", third)]);
        let transactions = settle(&balance, &order(&["a", "b", "c", "d"])).unwrap();

        // the cent lost to thirds goes to the first creditor
        assert_eq!(
            transactions,
            [tx("a", "b", 334), tx("a", "c", 333), tx("a", "d", 333)]
        );
        assert_reconciled(&balance, &transactions);
    }

    #[test]
    fn rounding_down_across_payments_does_not_strand_the_debtor() {
        let share = 1.00497;
        let balance = ledger(&[("a", -3.01491), ("b", share), ("c", share), ("d", share)]);
        let transactions = settle(&balance, &order(&["a", "b", "c", "d"])).unwrap();

        assert_eq!(
            transactions,
            [tx("a", "b", 101), tx("a", "c", 100), tx("a", "d", 100)]
        );
        assert_reconciled(&balance, &transactions);
    }

    #[test]
    fn small_balances_still_add_up() {
        let balance = ledger(&[
            ("a", 0.01),
            ("b", 0.01),
            ("c", 0.01),
            ("d", 0.01),
            ("e", -0.04),
        ]);
        let transactions = settle(&balance, &order(&["a", "b", "c", "d", "e"])).unwrap();
        assert_eq!(transactions.len(), 4);
        assert!(transactions.iter().all(|t| t.from == "e"));
        assert_reconciled(&balance, &transactions);
    }

    #[test]
    fn transaction_count_is_bounded() {
        let balance = ledger(&[
            ("a", 7.25),
            ("b", 3.5),
            ("c", -1.75),
            ("d", -6.0),
            ("e", -3.0),
        ]);
        let transactions = settle(&balance, &order(&["a", "b", "c", "d", "e"])).unwrap();
        assert!(transactions.len() <= 2 + 3 - 1);
        assert!(transactions.iter().all(|t| t.amount >= Amount::from_cents(1)));
        assert_reconciled(&balance, &transactions);
    }

    #[test]
    fn identical_inputs_identical_output() {
        let balance = ledger(&[("a", 4.5), ("b", -1.5), ("c", -1.5), ("d", -1.5)]);
        let players = order(&["a", "b", "c", "d"]);
        assert_eq!(
            settle(&balance, &players).unwrap(),
            settle(&balance, &players).unwrap()
        );
    }

    #[test]
    fn players_missing_from_ledger_count_as_zero() {
        let balance = ledger(&[("a", -1.0), ("b", 1.0)]);
        let transactions = settle(&balance, &order(&["a", "b", "c"])).unwrap();
        assert_eq!(transactions, [tx("a", "b", 100)]);
    }

    #[test]
    fn empty_roster_rejected() {
        assert_eq!(settle(&NetBalance::new(), &[]), Err(EngineError::EmptyInput));
    }

    #[test]
    fn unknown_player_rejected() {
        let balance = ledger(&[("a", -1.0), ("z", 1.0)]);
        assert_eq!(
            settle(&balance, &order(&["a", "b"])),
            Err(ValidationError::UnknownPlayer("z".to_string()).into())
        );
    }

    #[test]
    fn non_finite_balance_rejected() {
        let balance = ledger(&[("a", f64::NAN), ("b", 1.0)]);
        assert_eq!(
            settle(&balance, &order(&["a", "b"])),
            Err(ValidationError::NonFiniteBalance("a".to_string()).into())
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// A zero-sum ledger: the last player absorbs everyone else's balance.
        fn zero_sum_ledger() -> impl Strategy<Value = (NetBalance, Vec<PlayerId>)> {
            proptest::collection::vec(-50.0f64..50.0, 1..6).prop_map(|amounts| {
                let closing = -amounts.iter().sum::<f64>();
                let players: Vec<PlayerId> =
                    (0..=amounts.len()).map(|idx| format!("p{idx}")).collect();
                let balance: NetBalance = players
                    .iter()
                    .cloned()
                    .zip(amounts.into_iter().chain([closing]))
                    .collect();
                (balance, players)
            })
        }

        proptest! {
            #[test]
            fn every_player_ends_within_a_cent((balance, players) in zero_sum_ledger()) {
                let transactions = settle(&balance, &players).unwrap();
                for (player, left) in residual(&balance, &transactions).iter() {
                    prop_assert!(left.abs() <= 0.01 + 1e-9, "{} left with {}", player, left);
                }
            }

            #[test]
            fn transaction_count_stays_below_party_count((balance, players) in zero_sum_ledger()) {
                let transactions = settle(&balance, &players).unwrap();
                let parties = balance.iter().filter(|(_, amount)| *amount != 0.0).count();
                prop_assert!(transactions.len() <= parties.saturating_sub(1));
                prop_assert!(transactions.iter().all(|t| t.amount >= Amount::from_cents(1)));
            }

            #[test]
            fn settling_twice_gives_the_same_payments((balance, players) in zero_sum_ledger()) {
                prop_assert_eq!(settle(&balance, &players), settle(&balance, &players));
            }
        }
    }
}
