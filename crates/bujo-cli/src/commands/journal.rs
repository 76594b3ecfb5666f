//! `bujo log` and `bujo day`.

use bujo_core::parser::format_entries;
use bujo_core::{EntityId, JournalService};
use clap::Args;
use std::io::Read;

use super::{date_or_today, print_json, CmdResult, Session};

#[derive(Args)]
pub struct LogArgs {
    /// Journal text, one entry per line; "-" reads stdin
    #[arg(allow_hyphen_values = true)]
    pub text: String,
    /// Day to log under (YYYY-MM-DD, default today)
    #[arg(long)]
    pub date: Option<String>,
    /// Attach the lines under an existing entry
    #[arg(long)]
    pub under: Option<String>,
}

#[derive(Args)]
pub struct DayArgs {
    /// Day to show (YYYY-MM-DD, default today)
    #[arg(long)]
    pub date: Option<String>,
    /// Print entries as JSON instead of journal text
    #[arg(long)]
    pub json: bool,
}

pub fn log(args: LogArgs) -> CmdResult {
    let session = Session::open()?;
    let journal = JournalService::with_config(&session.db, &session.config);

    let text = if args.text == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        args.text
    };
    let date = date_or_today(args.date.as_deref())?;
    let parent = args.under.map(EntityId::from);

    let entries = journal.log_entries(&text, date, parent.as_ref())?;
    print_json(&entries)
}

pub fn day(args: DayArgs) -> CmdResult {
    let session = Session::open()?;
    let journal = JournalService::with_config(&session.db, &session.config);
    let date = date_or_today(args.date.as_deref())?;
    let entries = journal.entries_for_date(date)?;

    if args.json {
        return print_json(&entries);
    }
    if !entries.is_empty() {
        println!("{}", format_entries(&entries, &session.config.parse_options()));
    }
    Ok(())
}
