// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Member;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let role = sub.get_one::<String>("role").unwrap().trim();
            conn.execute(
                "INSERT INTO members(name, role) VALUES (?1, ?2)",
                params![name, role],
            )?;
            println!("Added member '{}' ({})", name, role);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let members = list_members(conn)?;
            if !maybe_print_json(json_flag, jsonl_flag, &members)? {
                let rows = members
                    .into_iter()
                    .map(|member| vec![member.name, member.role])
                    .collect();
                println!("{}", pretty_table(&["Name", "Role"], rows));
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            conn.execute("DELETE FROM members WHERE name=?1", params![name])?;
            println!("Removed member '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn list_members(conn: &Connection) -> Result<Vec<Member>> {
    let mut stmt = conn.prepare("SELECT id, name, role FROM members ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(Member {
            id: r.get(0)?,
            name: r.get(1)?,
            role: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
