// Copyright (c) Terracotta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON instead of a table"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print one JSON object per line"),
    )
}

fn period_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("month")
            .long("month")
            .value_parser(value_parser!(u32))
            .requires("year")
            .help("Target month (1-12); defaults to the current month"),
    )
    .arg(
        Arg::new("year")
            .long("year")
            .value_parser(value_parser!(i32))
            .requires("month")
            .help("Target year; defaults to the current year"),
    )
}

fn exclude_non_members_flag(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("exclude-non-members")
            .long("exclude-non-members")
            .action(ArgAction::SetTrue)
            .help("Skip share transactions held by 'non-member' role members (default: include all)"),
    )
}

pub fn build_cli() -> Command {
    Command::new("terracotta")
        .about("Membership, share-ledger, and monthly valuation tracking")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("member")
                .about("Manage members")
                .subcommand(
                    Command::new("add")
                        .about("Add a member")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("role")
                                .long("role")
                                .default_value("member")
                                .help("Member role; 'non-member' transactions can be excluded from share totals"),
                        ),
                )
                .subcommand(json_flags(Command::new("list").about("List members")))
                .subcommand(
                    Command::new("rm")
                        .about("Remove a member")
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("income")
                .about("Record and list income entries")
                .subcommand(
                    Command::new("add")
                        .about("Record an income entry")
                        .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("net")
                                .long("net")
                                .help("Net amount after deductions; defaults to --amount"),
                        )
                        .arg(Arg::new("source").long("source"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List income entries")
                        .arg(Arg::new("month").long("month").help("Filter by YYYY-MM"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("expense")
                .about("Record and list expense entries")
                .subcommand(
                    Command::new("add")
                        .about("Record an expense entry")
                        .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("net").long("net").required(true).help("Net amount"))
                        .arg(Arg::new("payee").long("payee"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List expense entries")
                        .arg(Arg::new("month").long("month").help("Filter by YYYY-MM"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("share")
                .about("Record share transactions and report ownership")
                .subcommand(
                    Command::new("add")
                        .about("Record a capital contribution and the shares issued for it")
                        .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("member").long("member").required(true))
                        .arg(Arg::new("contribution").long("contribution").required(true))
                        .arg(Arg::new("count").long("count").required(true).help("Shares issued"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List share transactions")
                        .arg(Arg::new("member").long("member").help("Filter by member name"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(exclude_non_members_flag(period_args(json_flags(
                    Command::new("summary")
                        .about("Per-member cumulative shares, contributions, and ownership %"),
                )))),
        )
        .subcommand(
            Command::new("valuation")
                .about("Compute and read monthly valuation / share price")
                .subcommand(exclude_non_members_flag(period_args(json_flags(
                    Command::new("compute")
                        .about("Recompute the valuation chain through the target month"),
                ))))
                .subcommand(json_flags(
                    Command::new("history").about("Read back the stored valuation history"),
                )),
        )
        .subcommand(Command::new("doctor").about("Check ledger data and the stored valuation chain"))
}
