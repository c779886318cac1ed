// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .short('u')
        .global(true)
        .value_parser(value_parser!(i64))
        .help("Profile id acting on the ledger")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .global(true)
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn required(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn optional(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

pub fn build_cli() -> Command {
    Command::new("settleclip")
        .about("Shared expenses, multi-currency balances and settlements")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Path to the SQLite database (defaults to $SETTLECLIP_DB or the data dir)"),
        )
        .arg(user_arg())
        .arg(json_arg())
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("profile")
                .about("People who use the ledger")
                .subcommand(
                    Command::new("add")
                        .arg(required("name"))
                        .arg(optional("currency").help("Base currency for reports")),
                )
                .subcommand(
                    Command::new("set-currency")
                        .about("Change the currency your reports use")
                        .arg(required("currency")),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("account")
                .about("Your money accounts")
                .subcommand(
                    Command::new("add")
                        .arg(required("name"))
                        .arg(required("currency"))
                        .arg(optional("opening").help("Opening balance")),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("contact")
                .about("People you split costs with")
                .subcommand(
                    Command::new("add")
                        .arg(required("name"))
                        .arg(
                            optional("profile")
                                .value_parser(value_parser!(i64))
                                .help("Link to this person's profile id"),
                        ),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("category")
                .about("Expense categories")
                .subcommand(Command::new("add").arg(required("name")))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(required("kind").help("income|expense|transfer"))
                        .arg(required("amount"))
                        .arg(optional("currency").help("Defaults to the account currency"))
                        .arg(optional("account").value_parser(value_parser!(i64)))
                        .arg(optional("to-account").value_parser(value_parser!(i64)))
                        .arg(optional("category").value_parser(value_parser!(i64)))
                        .arg(optional("description"))
                        .arg(optional("date").help("YYYY-MM-DD"))
                        .arg(
                            optional("split")
                                .action(ArgAction::Append)
                                .help("CONTACT=AMOUNT owed to you; repeatable"),
                        ),
                )
                .subcommand(
                    Command::new("list")
                        .arg(optional("limit").value_parser(value_parser!(usize))),
                ),
        )
        .subcommand(
            Command::new("settle")
                .about("Pay or receive a lump sum against open debts")
                .arg(required("contact").help("Contact id, or r<id> for a reverse contact"))
                .arg(required("account").value_parser(value_parser!(i64)))
                .arg(required("amount"))
                .arg(
                    optional("direction")
                        .default_value("pay")
                        .help("pay (you pay them) or receive (they pay you)"),
                )
                .arg(optional("description"))
                .arg(
                    Arg::new("preview")
                        .long("preview")
                        .action(ArgAction::SetTrue)
                        .help("Show the allocation without writing it"),
                ),
        )
        .subcommand(
            Command::new("balance")
                .about("What you and your contacts owe each other")
                .arg(optional("contact"))
                .arg(optional("currency").help("Currency for totals")),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Income, expenses, assets and liabilities")
                .arg(optional("currency")),
        )
        .subcommand(
            Command::new("fx")
                .about("Currency table")
                .subcommand(
                    Command::new("set-rate")
                        .arg(required("code"))
                        .arg(required("rate").help("Units per one USD")),
                )
                .subcommand(Command::new("set-base").arg(required("currency")))
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("convert")
                        .arg(required("amount"))
                        .arg(required("from"))
                        .arg(required("to")),
                ),
        )
        .subcommand(
            Command::new("export").about("Export the ledger").subcommand(
                Command::new("splits")
                    .arg(optional("format").default_value("csv"))
                    .arg(required("out")),
            ),
        )
        .subcommand(Command::new("doctor").about("Check the store for problems"))
}
