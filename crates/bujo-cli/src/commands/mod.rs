pub mod config;
pub mod entry;
pub mod journal;
pub mod list;

use bujo_core::{Config, Database};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Loaded configuration plus the open store.
///
/// The CLI is the only place a [`Database`] is opened; services borrow it.
pub struct Session {
    pub config: Config,
    pub db: Database,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let path = config.database_path()?;
        debug!(path = %path.display(), "opening journal database");
        let db = Database::open(&path)?;
        Ok(Self { config, db })
    }
}

/// Parse `YYYY-MM-DD`, or today when absent.
pub fn date_or_today(date: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match date {
        Some(raw) => bujo_core::clock::parse_date(raw)
            .ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD").into()),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
