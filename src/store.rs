// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Keyed persistence for computed valuation rows. No business logic: the
//! engine decides what a row contains, this module only gets/puts it. Unlike
//! the raw ledger tables, `monthly_valuations` is engine-owned, so a stored
//! decimal that fails to parse is a hard error rather than a silent 0.

use crate::models::{MonthKey, MonthlyValuation};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

const COLUMNS: &str = "month, year, total_inflows, total_outflows, total_flows, \
                       total_shares_previous_month, valuation, share_price";

struct RawRow {
    month: u32,
    year: i32,
    total_inflows: String,
    total_outflows: String,
    total_flows: String,
    total_shares_previous_month: String,
    valuation: String,
    share_price: String,
}

fn raw_row(r: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        month: r.get(0)?,
        year: r.get(1)?,
        total_inflows: r.get(2)?,
        total_outflows: r.get(3)?,
        total_flows: r.get(4)?,
        total_shares_previous_month: r.get(5)?,
        valuation: r.get(6)?,
        share_price: r.get(7)?,
    })
}

fn parse_row(raw: RawRow) -> Result<MonthlyValuation> {
    let key = MonthKey {
        year: raw.year,
        month: raw.month,
    };
    let dec = |column: &str, s: &str| -> Result<Decimal> {
        Decimal::from_str_exact(s)
            .with_context(|| format!("Invalid stored {} '{}' for period {}", column, s, key))
    };
    Ok(MonthlyValuation {
        month: raw.month,
        year: raw.year,
        total_inflows: dec("total_inflows", &raw.total_inflows)?,
        total_outflows: dec("total_outflows", &raw.total_outflows)?,
        total_flows: dec("total_flows", &raw.total_flows)?,
        total_shares_previous_month: dec(
            "total_shares_previous_month",
            &raw.total_shares_previous_month,
        )?,
        valuation: dec("valuation", &raw.valuation)?,
        share_price: dec("share_price", &raw.share_price)?,
    })
}

pub fn get(conn: &Connection, key: MonthKey) -> Result<Option<MonthlyValuation>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM monthly_valuations WHERE month=?1 AND year=?2",
        COLUMNS
    ))?;
    let found = stmt
        .query_row(params![key.month, key.year], raw_row)
        .optional()?;
    match found {
        Some(raw) => Ok(Some(parse_row(raw)?)),
        None => Ok(None),
    }
}

/// Insert or overwrite the row for the record's period. Never produces a
/// second row for the same (month, year).
pub fn upsert(conn: &Connection, record: &MonthlyValuation) -> Result<()> {
    conn.execute(
        "INSERT INTO monthly_valuations(month, year, total_inflows, total_outflows, \
             total_flows, total_shares_previous_month, valuation, share_price)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)
         ON CONFLICT(month, year) DO UPDATE SET
             total_inflows=excluded.total_inflows,
             total_outflows=excluded.total_outflows,
             total_flows=excluded.total_flows,
             total_shares_previous_month=excluded.total_shares_previous_month,
             valuation=excluded.valuation,
             share_price=excluded.share_price",
        params![
            record.month,
            record.year,
            record.total_inflows.to_string(),
            record.total_outflows.to_string(),
            record.total_flows.to_string(),
            record.total_shares_previous_month.to_string(),
            record.valuation.to_string(),
            record.share_price.to_string()
        ],
    )?;
    Ok(())
}

/// Full stored history, ascending by (year, month), for charting.
pub fn list_all(conn: &Connection) -> Result<Vec<MonthlyValuation>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM monthly_valuations ORDER BY year, month",
        COLUMNS
    ))?;
    let rows = stmt.query_map([], raw_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(parse_row(row?)?);
    }
    Ok(out)
}
