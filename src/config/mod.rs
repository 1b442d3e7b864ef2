//! Configuration management for the lectio application.
//!
//! This module handles loading and validating configuration settings from environment
//! variables, with sensible defaults. It decides where the journal database lives and
//! where exported backups are written by default.
//!
//! # Environment Variables
//!
//! - `LECTIO_DB`: Path to the journal database (defaults to ~/.local/share/lectio/journal.db)
//! - `LECTIO_BACKUP_DIR`: Directory for exported backups (defaults to the database's directory)
//! - `HOME`: Used for expanding the default database path

use crate::constants::{
    DEFAULT_DB_SUBPATH, ENV_VAR_HOME, ENV_VAR_LECTIO_BACKUP_DIR, ENV_VAR_LECTIO_DB,
    FLASHBACK_HISTORY_FILE,
};
use crate::errors::{AppError, AppResult};
use crate::ops::backup::default_backup_file_name;
use chrono::NaiveDate;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for the lectio application.
///
/// # Examples
///
/// Creating a configuration manually:
/// ```
/// use lectio::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("/path/to/journal.db"),
///     backup_dir: PathBuf::from("/path/to/backups"),
/// };
/// assert!(config.validate().is_ok());
/// ```
///
/// Loading configuration from environment variables:
/// ```no_run
/// use lectio::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
/// println!("{}", config.db_path.display());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the SQLite journal database.
    ///
    /// Loaded from `LECTIO_DB` with a fallback to ~/.local/share/lectio/journal.db.
    pub db_path: PathBuf,

    /// Directory where `export` writes backups when no output path is given.
    pub backup_dir: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_path", &"[REDACTED_PATH]")
            .field("backup_dir", &"[REDACTED_PATH]")
            .finish()
    }
}

/// Expands `~` and `$VAR` references in a configured path.
fn expand_path(raw: &str) -> AppResult<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a path cannot be expanded or the result fails
    /// [`Config::validate`].
    pub fn load() -> AppResult<Self> {
        let db_raw = non_empty_var(ENV_VAR_LECTIO_DB).unwrap_or_else(|| {
            let home = env::var(ENV_VAR_HOME).unwrap_or_default();
            format!("{}/{}", home, DEFAULT_DB_SUBPATH)
        });
        let db_path = expand_path(&db_raw)?;

        let backup_dir = match non_empty_var(ENV_VAR_LECTIO_BACKUP_DIR) {
            Some(raw) => expand_path(&raw)?,
            None => db_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };

        let config = Config {
            db_path,
            backup_dir,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if either path is empty or relative.
    pub fn validate(&self) -> AppResult<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(AppError::Config("Database path is empty".to_string()));
        }
        if !self.db_path.is_absolute() {
            return Err(AppError::Config(
                "Database path must be an absolute path".to_string(),
            ));
        }
        if self.backup_dir.as_os_str().is_empty() {
            return Err(AppError::Config("Backup directory is empty".to_string()));
        }
        if !self.backup_dir.is_absolute() {
            return Err(AppError::Config(
                "Backup directory must be an absolute path".to_string(),
            ));
        }
        Ok(())
    }

    /// Where the recently shown flashback ids are kept, next to the database.
    pub fn flashback_history_path(&self) -> PathBuf {
        self.db_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(FLASHBACK_HISTORY_FILE)
    }

    /// Default export path for a backup made on `date`.
    pub fn default_backup_path(&self, date: NaiveDate) -> PathBuf {
        self.backup_dir.join(default_backup_file_name(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    fn clear_env() {
        env::remove_var(ENV_VAR_LECTIO_DB);
        env::remove_var(ENV_VAR_LECTIO_BACKUP_DIR);
    }

    #[test]
    fn test_debug_impl_redacts_paths() {
        let config = Config {
            db_path: PathBuf::from("/home/username/private/journal.db"),
            backup_dir: PathBuf::from("/home/username/private"),
        };

        let debug_output = format!("{:?}", config);
        assert!(debug_output.contains("[REDACTED_PATH]"));
        assert!(!debug_output.contains("username"));
    }

    #[test]
    #[serial]
    fn test_load_defaults_under_home() {
        clear_env();
        let orig_home = env::var(ENV_VAR_HOME).ok();
        env::set_var(ENV_VAR_HOME, "/home/reader");

        let config = Config::load();

        if let Some(val) = orig_home {
            env::set_var(ENV_VAR_HOME, val);
        }

        let config = config.unwrap();
        assert_eq!(
            config.db_path,
            PathBuf::from("/home/reader/.local/share/lectio/journal.db")
        );
        assert_eq!(
            config.backup_dir,
            PathBuf::from("/home/reader/.local/share/lectio")
        );
    }

    #[test]
    #[serial]
    fn test_load_with_custom_paths() {
        clear_env();
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("journal.db");
        let backup_dir = temp_dir.path().join("backups");

        env::set_var(ENV_VAR_LECTIO_DB, &db_path);
        env::set_var(ENV_VAR_LECTIO_BACKUP_DIR, &backup_dir);
        let config = Config::load();
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.db_path, db_path);
        assert_eq!(config.backup_dir, backup_dir);
    }

    #[test]
    #[serial]
    fn test_load_rejects_relative_db_path() {
        clear_env();
        env::set_var(ENV_VAR_LECTIO_DB, "relative/journal.db");
        let result = Config::load();
        clear_env();

        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("absolute")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let config = Config {
            db_path: PathBuf::new(),
            backup_dir: PathBuf::from("/backups"),
        };
        assert!(config.validate().is_err());

        let config = Config {
            db_path: PathBuf::from("/journal.db"),
            backup_dir: PathBuf::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_paths() {
        let config = Config {
            db_path: PathBuf::from("/data/lectio/journal.db"),
            backup_dir: PathBuf::from("/backups"),
        };
        assert_eq!(
            config.flashback_history_path(),
            PathBuf::from("/data/lectio/flashback_history.json")
        );

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            config.default_backup_path(date),
            PathBuf::from("/backups/lectio-backup-2024-03-01.json")
        );
    }
}
