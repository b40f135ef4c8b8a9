// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::MonthlyValuation;
use crate::store;
use crate::utils::{maybe_print_json, period_from_args, pretty_table};
use crate::valuation::{compute_valuation, EngineConfig};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("compute", sub)) => compute(conn, sub)?,
        Some(("history", sub)) => history(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn compute(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let target = period_from_args(sub)?;
    let cfg = EngineConfig {
        include_non_members: !sub.get_flag("exclude-non-members"),
    };

    let report = compute_valuation(conn, target, &cfg)?;
    if !maybe_print_json(json_flag, jsonl_flag, &report)? {
        let current = &report.current;
        println!(
            "{}: valuation {:.2}, share price {:.2} ({} shares outstanding at prior month end)",
            current.key(),
            current.valuation,
            current.share_price,
            current.total_shares_previous_month
        );
        println!("{}", valuation_table(report.history));
    }
    Ok(())
}

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let rows = store::list_all(conn)?;
    if rows.is_empty() {
        println!("No valuation history; run 'terracotta valuation compute' first");
        return Ok(());
    }
    if !maybe_print_json(json_flag, jsonl_flag, &rows)? {
        println!("{}", valuation_table(rows));
    }
    Ok(())
}

fn valuation_table(rows: Vec<MonthlyValuation>) -> comfy_table::Table {
    let data = rows
        .into_iter()
        .map(|v| {
            vec![
                v.key().to_string(),
                format!("{:.2}", v.total_inflows),
                format!("{:.2}", v.total_outflows),
                format!("{:.2}", v.total_flows),
                format!("{:.2}", v.total_shares_previous_month),
                format!("{:.2}", v.valuation),
                format!("{:.2}", v.share_price),
            ]
        })
        .collect();
    pretty_table(
        &[
            "Month",
            "Inflows",
            "Outflows",
            "Net",
            "Shares (prev)",
            "Valuation",
            "Share Price",
        ],
        data,
    )
}
