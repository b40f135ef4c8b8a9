// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-and-reduce over the raw ledger tables. Everything here is a pure
//! query: no writes, no state. Amounts are stored as decimal text; a single
//! row whose text does not parse counts as 0 so one bad record cannot block
//! a whole month, while a failed query still aborts the caller.

use crate::models::{MonthKey, NON_MEMBER_ROLE};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

/// Decimal text from a source ledger row; anything that does not parse
/// exactly counts as 0. Display paths reuse this so list output classifies
/// borderline text the same way the sums do.
pub fn lenient_decimal(s: &str) -> Decimal {
    Decimal::from_str_exact(s.trim()).unwrap_or(Decimal::ZERO)
}

fn sum_month_column(conn: &Connection, table: &str, column: &str, key: MonthKey) -> Result<Decimal> {
    let sql = format!(
        "SELECT {} FROM {} WHERE substr(date,1,7)=?1",
        column, table
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let mut rows = stmt.query(params![key.to_string()])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let raw: String = r.get(0)?;
        total += lenient_decimal(&raw);
    }
    Ok(total)
}

/// Sum of `net_amount` over income entries dated within the month. Empty
/// months sum to 0.
pub fn sum_net_income(conn: &Connection, key: MonthKey) -> Result<Decimal> {
    sum_month_column(conn, "income_entries", "net_amount", key)
}

/// Sum of `net_amount` over expense entries dated within the month.
pub fn sum_net_expenses(conn: &Connection, key: MonthKey) -> Result<Decimal> {
    sum_month_column(conn, "expense_entries", "net_amount", key)
}

fn sum_shares_column(
    conn: &Connection,
    column: &str,
    through: MonthKey,
    include_non_members: bool,
) -> Result<Decimal> {
    let sql = if include_non_members {
        format!("SELECT s.{} FROM share_transactions s WHERE s.date<=?1", column)
    } else {
        format!(
            "SELECT s.{} FROM share_transactions s \
             JOIN members m ON s.member_id=m.id \
             WHERE s.date<=?1 AND m.role != '{}'",
            column, NON_MEMBER_ROLE
        )
    };
    let mut stmt = conn.prepare_cached(&sql)?;
    let mut rows = stmt.query(params![through.last_day().to_string()])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let raw: String = r.get(0)?;
        total += lenient_decimal(&raw);
    }
    Ok(total)
}

/// Cumulative share count over all share transactions dated on or before the
/// last day of `through`, across all members. `include_non_members` is the
/// caller-supplied predicate from the engine config; the default engine run
/// includes every transaction.
pub fn cumulative_shares(
    conn: &Connection,
    through: MonthKey,
    include_non_members: bool,
) -> Result<Decimal> {
    sum_shares_column(conn, "share_count", through, include_non_members)
}

/// Cumulative contribution amount through the end of `through`. Reporting
/// only; the valuation recurrence never reads this.
pub fn cumulative_contributions(
    conn: &Connection,
    through: MonthKey,
    include_non_members: bool,
) -> Result<Decimal> {
    sum_shares_column(conn, "contribution_amount", through, include_non_members)
}

/// Earliest dated record across income entries, expense entries, and share
/// transactions; `None` when all three tables are empty. Dates are stored
/// YYYY-MM-DD so MIN over text is chronological.
pub fn earliest_activity(conn: &Connection) -> Result<Option<NaiveDate>> {
    let raw: Option<String> = conn.query_row(
        "SELECT MIN(d) FROM (
             SELECT MIN(date) AS d FROM income_entries
             UNION ALL SELECT MIN(date) FROM expense_entries
             UNION ALL SELECT MIN(date) FROM share_transactions
         )",
        [],
        |r| r.get(0),
    )?;
    match raw {
        Some(s) => Ok(NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        None => Ok(None),
    }
}
