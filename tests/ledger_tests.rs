// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use terracotta::ledger;
use terracotta::models::MonthKey;

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
fn month_sums_are_inclusive_of_both_boundaries() {
    let conn = setup();
    add_income(&conn, "2024-02-29", "1"); // leap day, prior month
    add_income(&conn, "2024-03-01", "10");
    add_income(&conn, "2024-03-31", "20");
    add_income(&conn, "2024-04-01", "100"); // next month

    assert_eq!(ledger::sum_net_income(&conn, key(3, 2024)).unwrap(), dec("30"));
    assert_eq!(ledger::sum_net_income(&conn, key(2, 2024)).unwrap(), dec("1"));
}

#[test]
fn empty_month_sums_to_zero() {
    let conn = setup();
    assert_eq!(
        ledger::sum_net_income(&conn, key(7, 2024)).unwrap(),
        Decimal::ZERO
    );
    assert_eq!(
        ledger::sum_net_expenses(&conn, key(7, 2024)).unwrap(),
        Decimal::ZERO
    );
}

#[test]
fn malformed_amounts_reduce_as_zero() {
    let conn = setup();
    add_expense(&conn, "2024-05-02", "12.50");
    add_expense(&conn, "2024-05-03", "");
    add_expense(&conn, "2024-05-04", "oops");
    add_expense(&conn, "2024-05-05", " 7.50 "); // stray whitespace still parses

    assert_eq!(
        ledger::sum_net_expenses(&conn, key(5, 2024)).unwrap(),
        dec("20.00")
    );
}

#[test]
fn cumulative_shares_cut_off_at_month_end() {
    let conn = setup();
    let ada = add_member(&conn, "Ada", "member");
    let ben = add_member(&conn, "Ben", "member");
    add_shares(&conn, "2024-02-05", ada, "500", "100");
    add_shares(&conn, "2024-02-28", ben, "100", "25");
    add_shares(&conn, "2024-03-01", ada, "60", "15");

    assert_eq!(
        ledger::cumulative_shares(&conn, key(1, 2024), true).unwrap(),
        Decimal::ZERO
    );
    assert_eq!(
        ledger::cumulative_shares(&conn, key(2, 2024), true).unwrap(),
        dec("125")
    );
    assert_eq!(
        ledger::cumulative_shares(&conn, key(3, 2024), true).unwrap(),
        dec("140")
    );
}

#[test]
fn non_member_exclusion_is_opt_in() {
    let conn = setup();
    let ada = add_member(&conn, "Ada", "member");
    let fund = add_member(&conn, "Outside Fund", "non-member");
    add_shares(&conn, "2024-01-10", ada, "500", "100");
    add_shares(&conn, "2024-01-12", fund, "250", "50");

    assert_eq!(
        ledger::cumulative_shares(&conn, key(1, 2024), true).unwrap(),
        dec("150")
    );
    assert_eq!(
        ledger::cumulative_shares(&conn, key(1, 2024), false).unwrap(),
        dec("100")
    );
    assert_eq!(
        ledger::cumulative_contributions(&conn, key(1, 2024), true).unwrap(),
        dec("750")
    );
    assert_eq!(
        ledger::cumulative_contributions(&conn, key(1, 2024), false).unwrap(),
        dec("500")
    );
}

#[test]
fn earliest_activity_spans_all_three_tables() {
    let conn = setup();
    assert_eq!(ledger::earliest_activity(&conn).unwrap(), None);

    add_income(&conn, "2024-03-10", "10");
    let ada = add_member(&conn, "Ada", "member");
    add_shares(&conn, "2024-02-20", ada, "100", "10");
    add_expense(&conn, "2024-01-05", "5");

    assert_eq!(
        ledger::earliest_activity(&conn).unwrap(),
        Some(chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
    );
}
