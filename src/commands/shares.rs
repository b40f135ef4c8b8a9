// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::{MonthKey, NON_MEMBER_ROLE};
use crate::utils::{
    id_for_member, maybe_print_json, parse_date, parse_decimal, period_from_args, pretty_table,
};
use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("summary", sub)) => summary(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
    let member = sub.get_one::<String>("member").unwrap().trim().to_string();
    let contribution = parse_decimal(sub.get_one::<String>("contribution").unwrap().trim())?;
    let count = parse_decimal(sub.get_one::<String>("count").unwrap().trim())?;
    let note = sub.get_one::<String>("note").map(|s| s.trim().to_string());

    let member_id = id_for_member(conn, &member)?;
    conn.execute(
        "INSERT INTO share_transactions(date, member_id, contribution_amount, share_count, note)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            date.to_string(),
            member_id,
            contribution.to_string(),
            count.to_string(),
            note
        ],
    )?;
    println!(
        "Recorded {} shares for {} ({} contributed) on {}",
        count, member, contribution, date
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut sql = String::from(
        "SELECT s.date, m.name, s.contribution_amount, s.share_count, s.note
         FROM share_transactions s JOIN members m ON s.member_id=m.id WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(member) = sub.get_one::<String>("member") {
        sql.push_str(" AND m.name=?");
        params_vec.push(member.trim().into());
    }
    sql.push_str(" ORDER BY s.date DESC, s.id DESC");
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
        let date: String = r.get(0)?;
        let name: String = r.get(1)?;
        let contribution: String = r.get(2)?;
        let count: String = r.get(3)?;
        let note: Option<String> = r.get(4)?;
        data.push(vec![
            date,
            name,
            contribution,
            count,
            note.unwrap_or_default(),
        ]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Date", "Member", "Contribution", "Shares", "Note"], data)
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct OwnershipRow {
    pub member: String,
    pub role: String,
    pub shares: Decimal,
    pub contributions: Decimal,
    pub ownership_pct: Decimal,
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let exclude = sub.get_flag("exclude-non-members");
    let as_of = match period_from_args(sub)? {
        Some(key) => key,
        None => MonthKey::from_date(Utc::now().date_naive()),
    };

    let data = ownership_summary(conn, as_of, !exclude)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let total_shares = ledger::cumulative_shares(conn, as_of, !exclude)?;
        let total_contrib = ledger::cumulative_contributions(conn, as_of, !exclude)?;
        let mut rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|row| {
                vec![
                    row.member,
                    row.role,
                    format!("{:.2}", row.shares),
                    format!("{:.2}", row.contributions),
                    format!("{:.2}", row.ownership_pct),
                ]
            })
            .collect();
        rows.push(vec![
            "(total)".into(),
            String::new(),
            format!("{:.2}", total_shares),
            format!("{:.2}", total_contrib),
            String::new(),
        ]);
        println!(
            "{}",
            pretty_table(
                &["Member", "Role", "Shares", "Contributed", "Ownership %"],
                rows
            )
        );
    }
    Ok(())
}

/// Per-member cumulative shares/contributions through the end of `as_of`,
/// plus each member's share of the total. The exclusion flag is a display
/// concern only; the valuation engine defaults to including everyone.
/// Amount text reduces through `Decimal` row-by-row, with the same
/// malformed-row leniency as the aggregator.
pub fn ownership_summary(
    conn: &Connection,
    as_of: MonthKey,
    include_non_members: bool,
) -> Result<Vec<OwnershipRow>> {
    let total = ledger::cumulative_shares(conn, as_of, include_non_members)?;
    let cutoff = as_of.last_day().to_string();

    let mut stmt = conn.prepare(
        "SELECT m.name, m.role, s.share_count, s.contribution_amount
         FROM members m
         LEFT JOIN share_transactions s ON s.member_id=m.id AND s.date<=?1
         ORDER BY m.name, m.id",
    )?;
    let mut rows = stmt.query(params![cutoff])?;

    let mut data: Vec<OwnershipRow> = Vec::new();
    while let Some(r) = rows.next()? {
        let member: String = r.get(0)?;
        let role: String = r.get(1)?;
        let count: Option<String> = r.get(2)?;
        let contribution: Option<String> = r.get(3)?;
        if !include_non_members && role == NON_MEMBER_ROLE {
            continue;
        }
        let shares = count
            .as_deref()
            .map(ledger::lenient_decimal)
            .unwrap_or(Decimal::ZERO);
        let contributions = contribution
            .as_deref()
            .map(ledger::lenient_decimal)
            .unwrap_or(Decimal::ZERO);
        match data.last_mut() {
            // rows arrive grouped per member via ORDER BY
            Some(last) if last.member == member => {
                last.shares += shares;
                last.contributions += contributions;
            }
            _ => data.push(OwnershipRow {
                member,
                role,
                shares,
                contributions,
                ownership_pct: Decimal::ZERO,
            }),
        }
    }

    for row in &mut data {
        if total > Decimal::ZERO {
            row.ownership_pct = row.shares / total * Decimal::ONE_HUNDRED;
        }
    }
    Ok(data)
}
