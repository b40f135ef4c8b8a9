// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = findings(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Ledger rows the aggregator would silently zero, plus defects in the
/// stored valuation chain. Returned as (issue, detail) pairs.
pub fn findings(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Amount text the aggregator coerces to 0
    let checks: [(&str, &str); 4] = [
        ("income_entries", "net_amount"),
        ("expense_entries", "net_amount"),
        ("share_transactions", "share_count"),
        ("share_transactions", "contribution_amount"),
    ];
    for (table, column) in checks {
        let mut stmt = conn.prepare(&format!("SELECT date, {} FROM {}", column, table))?;
        let mut cur = stmt.query([])?;
        while let Some(r) = cur.next()? {
            let date: String = r.get(0)?;
            let raw: String = r.get(1)?;
            if Decimal::from_str_exact(raw.trim()).is_err() {
                rows.push(vec![
                    "unparseable_amount".into(),
                    format!("{}.{} '{}' on {}", table, column, raw, date),
                ]);
            }
        }
    }

    // 2) Stored chain consistency: contiguous periods, flows arithmetic,
    //    and the valuation recurrence between consecutive rows
    let chain = store::list_all(conn)?;
    for v in &chain {
        if v.total_flows != v.total_inflows - v.total_outflows {
            rows.push(vec![
                "flows_mismatch".into(),
                format!(
                    "{}: {} != {} - {}",
                    v.key(),
                    v.total_flows,
                    v.total_inflows,
                    v.total_outflows
                ),
            ]);
        }
    }
    for pair in chain.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.key() != prev.key().next() {
            rows.push(vec![
                "missing_period".into(),
                format!("gap between {} and {}", prev.key(), cur.key()),
            ]);
            continue;
        }
        if cur.valuation != prev.valuation + cur.total_flows {
            rows.push(vec![
                "chain_break".into(),
                format!(
                    "{}: valuation {} != {} + {}",
                    cur.key(),
                    cur.valuation,
                    prev.valuation,
                    cur.total_flows
                ),
            ]);
        }
    }

    Ok(rows)
}
