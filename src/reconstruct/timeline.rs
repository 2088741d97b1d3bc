//! Daily share/cash timeline replayed from transactions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::{DateWindow, PositionSnapshot};

use super::transactions::{Action, Transaction};

/// Share and cash change caused by one transaction.
///
/// Buys add shares and sells remove them; both move cash by the signed
/// export amount. Income and transfers only move cash. Anything else is
/// ignored.
pub fn action_delta(action: Action, quantity: Decimal, amount: Decimal) -> (Decimal, Decimal) {
    match action {
        Action::Buy => (quantity, amount),
        Action::Sell => (-quantity, amount),
        Action::Income | Action::Transfer => (Decimal::ZERO, amount),
        Action::Other => (Decimal::ZERO, Decimal::ZERO),
    }
}

/// Holdings before the first transaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Baseline {
    pub shares: BTreeMap<String, Decimal>,
    pub cash: Decimal,
    /// Net share change per symbol across all transactions.
    pub net_changes: BTreeMap<String, Decimal>,
}

/// Starting shares and cash such that replaying `txns` never takes a
/// position below zero and ends at `target_shares` where that is possible.
///
/// Initial cash is never negative.
pub fn baseline_positions(
    txns: &[Transaction],
    target_shares: &BTreeMap<String, Decimal>,
    target_cash: Decimal,
) -> Baseline {
    let mut running: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut min_seen: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut net_changes: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut cash = Decimal::ZERO;

    for txn in txns {
        let (delta_shares, delta_cash) = action_delta(txn.action, txn.quantity, txn.amount);
        if let Some(symbol) = &txn.symbol {
            let held = running.entry(symbol.clone()).or_default();
            *held += delta_shares;
            let low = min_seen.entry(symbol.clone()).or_default();
            *low = (*low).min(*held);
            *net_changes.entry(symbol.clone()).or_default() += delta_shares;
        }
        cash += delta_cash;
    }

    let mut shares = BTreeMap::new();
    for symbol in net_changes.keys().chain(target_shares.keys()) {
        if shares.contains_key(symbol) {
            continue;
        }
        let net = net_changes.get(symbol).copied().unwrap_or_default();
        let needed_for_negatives = -min_seen.get(symbol).copied().unwrap_or_default();
        let needed_for_target = target_shares.get(symbol).copied().unwrap_or_default() - net;
        let start = Decimal::ZERO
            .max(needed_for_negatives)
            .max(needed_for_target);
        shares.insert(symbol.clone(), start);
    }

    Baseline {
        shares,
        cash: Decimal::ZERO.max(target_cash - cash),
        net_changes,
    }
}

fn snapshot(date: NaiveDate, shares: &BTreeMap<String, Decimal>, cash: Decimal) -> PositionSnapshot {
    PositionSnapshot::new(
        date,
        shares
            .iter()
            .map(|(sym, qty)| (sym.clone(), qty.to_f64().unwrap_or(0.0)))
            .collect(),
        cash.to_f64().unwrap_or(0.0),
    )
}

/// One snapshot per calendar day in `window`, applying each day's
/// transactions before recording it.
pub fn positions_timeline(
    txns: &[Transaction],
    baseline: &Baseline,
    window: DateWindow,
) -> Vec<PositionSnapshot> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Transaction>> = BTreeMap::new();
    for txn in txns {
        by_date.entry(txn.date).or_default().push(txn);
    }

    let mut shares = baseline.shares.clone();
    let mut cash = baseline.cash;
    let mut out = Vec::new();

    for day in window.start.iter_days().take_while(|d| *d <= window.end) {
        for txn in by_date.get(&day).into_iter().flatten() {
            let (delta_shares, delta_cash) = action_delta(txn.action, txn.quantity, txn.amount);
            if let Some(symbol) = &txn.symbol {
                *shares.entry(symbol.clone()).or_default() += delta_shares;
            }
            cash += delta_cash;
        }
        out.push(snapshot(day, &shares, cash));
    }
    out
}
