// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly valuation recurrence. Walks every month from the first recorded
//! activity through the target month in chronological order; each month's
//! valuation is the prior month's valuation plus that month's net flows, and
//! its share price divides by the share count outstanding at the end of the
//! prior month. The whole chain is recomputed from ledger truth on every call
//! (historical entries can be backfilled after the fact) and persisted inside
//! one transaction, so a failed run never leaves a partial chain behind.

use crate::error::ValuationError;
use crate::ledger;
use crate::models::{MonthKey, MonthlyValuation};
use crate::store;
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

/// Engine configuration. `include_non_members` controls whether share
/// transactions held by `non-member`-role members count toward cumulative
/// share totals; the default includes every transaction, and reporting
/// callers opt into the exclusion for display only.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub include_non_members: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            include_non_members: true,
        }
    }
}

/// One month's aggregated cash flows, as produced by the ledger aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthFlows {
    pub inflows: Decimal,
    pub outflows: Decimal,
}

/// Accumulator carried between months of the chain. The floor month starts
/// from `ChainState::default()` (zero valuation, zero shares).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainState {
    pub prior_valuation: Decimal,
    pub prior_shares: Decimal,
}

/// The recurrence step, isolated from persistence so it can be tested on its
/// own. `shares_prev` is the cumulative share count as of the end of the
/// month before `key`, recomputed from the ledger each pass rather than
/// carried as engine state.
pub fn step(
    state: ChainState,
    key: MonthKey,
    flows: MonthFlows,
    shares_prev: Decimal,
) -> (MonthlyValuation, ChainState) {
    let total_flows = flows.inflows - flows.outflows;
    let valuation = state.prior_valuation + total_flows;
    let share_price = if shares_prev > Decimal::ZERO {
        valuation / shares_prev
    } else {
        // No ownership base yet; a fallback, not an error.
        Decimal::ZERO
    };
    let record = MonthlyValuation {
        month: key.month,
        year: key.year,
        total_inflows: flows.inflows,
        total_outflows: flows.outflows,
        total_flows,
        total_shares_previous_month: shares_prev,
        valuation,
        share_price,
    };
    let next = ChainState {
        prior_valuation: valuation,
        prior_shares: shares_prev,
    };
    (record, next)
}

#[derive(Debug, Clone, Serialize)]
pub struct ValuationReport {
    pub current: MonthlyValuation,
    pub history: Vec<MonthlyValuation>,
}

/// Compute and persist the valuation chain from the floor month (earliest
/// dated record anywhere in the ledger) through `target`, defaulting to the
/// current calendar month. Returns the target row plus the full ordered
/// chain. Signals `ValuationError::NoData` when the ledger is empty or the
/// target precedes all recorded activity.
pub fn compute_valuation(
    conn: &mut Connection,
    target: Option<MonthKey>,
    cfg: &EngineConfig,
) -> Result<ValuationReport> {
    let target = match target {
        Some(key) => key,
        None => MonthKey::from_date(Utc::now().date_naive()),
    };

    let floor = match ledger::earliest_activity(conn)? {
        Some(date) => MonthKey::from_date(date),
        None => return Err(ValuationError::NoData.into()),
    };
    if target < floor {
        return Err(ValuationError::NoData.into());
    }

    // All months or none: a storage failure mid-chain rolls everything back.
    let tx = conn.transaction()?;
    let mut state = ChainState::default();
    let mut history = Vec::new();
    for key in floor.through(target) {
        let flows = MonthFlows {
            inflows: ledger::sum_net_income(&tx, key)?,
            outflows: ledger::sum_net_expenses(&tx, key)?,
        };
        let shares_prev = ledger::cumulative_shares(&tx, key.prev(), cfg.include_non_members)?;
        let (record, next) = step(state, key, flows, shares_prev);
        store::upsert(&tx, &record)?;
        history.push(record);
        state = next;
    }
    tx.commit()?;

    let current = match history.last() {
        Some(record) => record.clone(),
        None => return Err(ValuationError::NoData.into()),
    };
    Ok(ValuationReport { current, history })
}
