// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use terracotta::error::ValuationError;
use terracotta::models::MonthKey;
use terracotta::valuation::{compute_valuation, step, ChainState, EngineConfig, MonthFlows};

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    terracotta::db::init_schema(&mut conn).unwrap();
    conn
}

fn add_income(conn: &Connection, date: &str, net: &str) {
    conn.execute(
        "INSERT INTO income_entries(date, amount, net_amount) VALUES (?1, ?2, ?2)",
        params![date, net],
    )
    .unwrap();
}

fn add_expense(conn: &Connection, date: &str, net: &str) {
    conn.execute(
        "INSERT INTO expense_entries(date, net_amount) VALUES (?1, ?2)",
        params![date, net],
    )
    .unwrap();
}

fn add_member(conn: &Connection, name: &str, role: &str) -> i64 {
    conn.execute(
        "INSERT INTO members(name, role) VALUES (?1, ?2)",
        params![name, role],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn add_shares(conn: &Connection, date: &str, member_id: i64, contribution: &str, count: &str) {
    conn.execute(
        "INSERT INTO share_transactions(date, member_id, contribution_amount, share_count)
         VALUES (?1, ?2, ?3, ?4)",
        params![date, member_id, contribution, count],
    )
    .unwrap();
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn key(month: u32, year: i32) -> MonthKey {
    MonthKey::new(month, year).unwrap()
}

#[test]
fn chain_matches_worked_example() {
    let mut conn = setup();
    // Jan 2024: income 1000, nothing else. Feb: expense 200 and 100 shares
    // issued Feb 5 (count toward March's prior-month total, not Feb's).
    // Mar: no activity at all.
    add_income(&conn, "2024-01-15", "1000");
    add_expense(&conn, "2024-02-10", "200");
    let ada = add_member(&conn, "Ada", "member");
    add_shares(&conn, "2024-02-05", ada, "500", "100");

    let report = compute_valuation(
        &mut conn,
        Some(key(3, 2024)),
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(report.history.len(), 3);

    let jan = &report.history[0];
    assert_eq!(jan.key(), key(1, 2024));
    assert_eq!(jan.total_inflows, dec("1000"));
    assert_eq!(jan.total_outflows, Decimal::ZERO);
    assert_eq!(jan.total_flows, dec("1000"));
    assert_eq!(jan.valuation, dec("1000"));
    assert_eq!(jan.total_shares_previous_month, Decimal::ZERO);
    assert_eq!(jan.share_price, Decimal::ZERO);

    let feb = &report.history[1];
    assert_eq!(feb.total_inflows, Decimal::ZERO);
    assert_eq!(feb.total_outflows, dec("200"));
    assert_eq!(feb.total_flows, dec("-200"));
    assert_eq!(feb.valuation, dec("800"));
    assert_eq!(feb.total_shares_previous_month, Decimal::ZERO);
    assert_eq!(feb.share_price, Decimal::ZERO);

    let mar = &report.history[2];
    assert_eq!(mar.total_flows, Decimal::ZERO);
    assert_eq!(mar.valuation, dec("800"));
    assert_eq!(mar.total_shares_previous_month, dec("100"));
    assert_eq!(mar.share_price, dec("8"));

    assert_eq!(report.current, *mar);
}

#[test]
fn step_encodes_the_recurrence() {
    // valuation(N) == valuation(N-1) + flows(N), floor's prior valuation 0
    let flows = [("300", "100"), ("0", "50"), ("20", "20")];
    let mut state = ChainState::default();
    let mut expected = Decimal::ZERO;
    let mut k = key(6, 2025);
    for (inflows, outflows) in flows {
        let f = MonthFlows {
            inflows: dec(inflows),
            outflows: dec(outflows),
        };
        let (record, next) = step(state, k, f, dec("40"));
        expected += f.inflows - f.outflows;
        assert_eq!(record.valuation, expected);
        assert_eq!(record.share_price, expected / dec("40"));
        state = next;
        k = k.next();
    }
}

#[test]
fn step_zero_shares_prices_at_zero() {
    let f = MonthFlows {
        inflows: dec("500"),
        outflows: Decimal::ZERO,
    };
    let (record, _) = step(ChainState::default(), key(1, 2024), f, Decimal::ZERO);
    assert_eq!(record.valuation, dec("500"));
    assert_eq!(record.share_price, Decimal::ZERO);
}

#[test]
fn empty_ledger_signals_no_data() {
    let mut conn = setup();
    let err = compute_valuation(&mut conn, Some(key(1, 2024)), &EngineConfig::default())
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValuationError>(),
        Some(&ValuationError::NoData)
    );
}

#[test]
fn target_before_floor_signals_no_data() {
    let mut conn = setup();
    add_income(&conn, "2024-06-01", "100");
    let err = compute_valuation(&mut conn, Some(key(3, 2024)), &EngineConfig::default())
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValuationError>(),
        Some(&ValuationError::NoData)
    );
    // and nothing was persisted
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM monthly_valuations", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

fn dump_rows(conn: &Connection) -> Vec<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT month, year, total_inflows, total_outflows, total_flows,
                    total_shares_previous_month, valuation, share_price
             FROM monthly_valuations ORDER BY year, month",
        )
        .unwrap();
    let rows = stmt
        .query_map([], |r| {
            let mut row = Vec::new();
            row.push(r.get::<_, i64>(0)?.to_string());
            row.push(r.get::<_, i64>(1)?.to_string());
            for i in 2..8 {
                row.push(r.get::<_, String>(i)?);
            }
            Ok(row)
        })
        .unwrap();
    rows.map(|r| r.unwrap()).collect()
}

#[test]
fn recompute_is_idempotent() {
    let mut conn = setup();
    add_income(&conn, "2024-01-15", "1000");
    add_expense(&conn, "2024-02-10", "200.50");
    let ada = add_member(&conn, "Ada", "member");
    add_shares(&conn, "2024-01-20", ada, "300", "30");

    let first = compute_valuation(&mut conn, Some(key(4, 2024)), &EngineConfig::default()).unwrap();
    let rows_first = dump_rows(&conn);
    let second = compute_valuation(&mut conn, Some(key(4, 2024)), &EngineConfig::default()).unwrap();
    let rows_second = dump_rows(&conn);

    assert_eq!(first.history, second.history);
    assert_eq!(rows_first, rows_second);
}

#[test]
fn recomputing_earlier_target_leaves_later_rows_untouched() {
    let mut conn = setup();
    add_income(&conn, "2024-01-15", "1000");
    add_expense(&conn, "2024-02-10", "200");
    compute_valuation(&mut conn, Some(key(3, 2024)), &EngineConfig::default()).unwrap();
    let march_before = dump_rows(&conn).pop().unwrap();

    // January changes, but only the chain through February is recomputed;
    // the stored March row must stay byte-identical until March itself is.
    add_expense(&conn, "2024-01-20", "100");
    let report =
        compute_valuation(&mut conn, Some(key(2, 2024)), &EngineConfig::default()).unwrap();
    assert_eq!(report.current.valuation, dec("700"));

    let rows = dump_rows(&conn);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2], march_before);

    // recomputing March brings it back in line with the corrected chain
    let full = compute_valuation(&mut conn, Some(key(3, 2024)), &EngineConfig::default()).unwrap();
    assert_eq!(full.current.valuation, dec("700"));
    assert_ne!(dump_rows(&conn)[2], march_before);
}

#[test]
fn backfilled_history_is_recomputed() {
    let mut conn = setup();
    add_income(&conn, "2024-01-15", "1000");
    compute_valuation(&mut conn, Some(key(3, 2024)), &EngineConfig::default()).unwrap();

    // An admin corrects January after the fact; the whole chain reflects it.
    add_expense(&conn, "2024-01-20", "100");
    let report =
        compute_valuation(&mut conn, Some(key(3, 2024)), &EngineConfig::default()).unwrap();

    assert_eq!(report.history[0].valuation, dec("900"));
    assert_eq!(report.current.valuation, dec("900"));

    // still exactly one row per period
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM monthly_valuations", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 3);
}

#[test]
fn malformed_amount_counts_as_zero() {
    let mut conn = setup();
    add_income(&conn, "2024-01-05", "500");
    add_income(&conn, "2024-01-06", "not-a-number");

    let report =
        compute_valuation(&mut conn, Some(key(1, 2024)), &EngineConfig::default()).unwrap();
    assert_eq!(report.current.total_inflows, dec("500"));
}

#[test]
fn non_member_shares_excluded_on_request() {
    let mut conn = setup();
    add_income(&conn, "2024-01-15", "1000");
    let ada = add_member(&conn, "Ada", "member");
    let fund = add_member(&conn, "Outside Fund", "non-member");
    add_shares(&conn, "2024-01-10", ada, "500", "100");
    add_shares(&conn, "2024-01-12", fund, "250", "50");

    let all = compute_valuation(&mut conn, Some(key(2, 2024)), &EngineConfig::default()).unwrap();
    assert_eq!(all.current.total_shares_previous_month, dec("150"));

    let members_only = compute_valuation(
        &mut conn,
        Some(key(2, 2024)),
        &EngineConfig {
            include_non_members: false,
        },
    )
    .unwrap();
    assert_eq!(members_only.current.total_shares_previous_month, dec("100"));
    assert_eq!(
        members_only.current.share_price,
        members_only.current.valuation / dec("100")
    );
}

#[test]
fn default_target_is_current_month() {
    let mut conn = setup();
    let today = chrono::Utc::now().date_naive();
    add_income(&conn, &today.to_string(), "100");

    let report = compute_valuation(&mut conn, None, &EngineConfig::default()).unwrap();
    assert_eq!(report.current.key(), MonthKey::from_date(today));
}

#[test]
fn invalid_periods_rejected() {
    assert_eq!(
        MonthKey::new(0, 2024),
        Err(ValuationError::InvalidPeriod {
            month: 0,
            year: 2024
        })
    );
    assert!(MonthKey::new(13, 2024).is_err());
    assert!(MonthKey::new(6, 1899).is_err());
    assert!(MonthKey::new(6, 2101).is_err());
    assert!(MonthKey::new(1, 1900).is_ok());
    assert!(MonthKey::new(12, 2100).is_ok());
}

#[test]
fn month_key_order_and_iteration() {
    assert!(key(12, 2023) < key(1, 2024));
    assert_eq!(key(12, 2023).next(), key(1, 2024));
    assert_eq!(key(1, 2024).prev(), key(12, 2023));

    let months: Vec<MonthKey> = key(12, 2023).through(key(2, 2024)).collect();
    assert_eq!(months, vec![key(12, 2023), key(1, 2024), key(2, 2024)]);

    // empty when the end precedes the start
    assert_eq!(key(5, 2024).through(key(4, 2024)).count(), 0);
}
