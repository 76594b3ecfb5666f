mod config;
pub mod database;
pub mod entry_repo;
pub mod item_repo;
pub mod list_repo;
pub mod migrations;

pub use config::{ArchiveConfig, Config, DatabaseConfig, JournalConfig, ParserConfig};
pub use database::Database;
pub use item_repo::SqliteVersionRepository;
pub use list_repo::ListRecord;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `BUJO_DATA_DIR` wins when set. Otherwise `~/.config/bujo[-dev]/`,
/// with the `-dev` suffix when `BUJO_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("BUJO_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("BUJO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("bujo-dev")
            } else {
                base_dir.join("bujo")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
