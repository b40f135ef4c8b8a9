// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::lenient_decimal;
use crate::models::ExpenseEntry;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
    let net = parse_decimal(sub.get_one::<String>("net").unwrap().trim())?;
    let payee = sub.get_one::<String>("payee").map(|s| s.trim().to_string());
    let note = sub.get_one::<String>("note").map(|s| s.trim().to_string());

    conn.execute(
        "INSERT INTO expense_entries(date, net_amount, payee, note)
         VALUES (?1, ?2, ?3, ?4)",
        params![date.to_string(), net.to_string(), payee, note],
    )?;
    println!("Recorded expense {} on {}", net, date);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .into_iter()
            .map(|e| {
                vec![
                    e.date.to_string(),
                    format!("{:.2}", e.net_amount),
                    e.payee.unwrap_or_default(),
                    e.note.unwrap_or_default(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Date", "Net", "Payee", "Note"], rows));
    }
    Ok(())
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<ExpenseEntry>> {
    let mut sql =
        String::from("SELECT id, date, net_amount, payee, note FROM expense_entries WHERE 1=1");
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(date,1,7)=?");
        params_vec.push(month.trim().into());
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let date: String = r.get(1)?;
        let net: String = r.get(2)?;
        data.push(ExpenseEntry {
            id: r.get(0)?,
            date: parse_date(&date)?,
            net_amount: lenient_decimal(&net),
            payee: r.get(3)?,
            note: r.get(4)?,
        });
    }
    Ok(data)
}
