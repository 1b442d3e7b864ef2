use lectio::config::Config;
use lectio::constants::{ENV_VAR_LECTIO_BACKUP_DIR, ENV_VAR_LECTIO_DB};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::tempdir;

/// Runs `f` with the given LECTIO_* variables set, restoring the previous values.
fn with_env<T>(db: Option<&str>, backup_dir: Option<&str>, f: impl FnOnce() -> T) -> T {
    let orig_db = env::var(ENV_VAR_LECTIO_DB).ok();
    let orig_backup = env::var(ENV_VAR_LECTIO_BACKUP_DIR).ok();

    for (name, value) in [(ENV_VAR_LECTIO_DB, db), (ENV_VAR_LECTIO_BACKUP_DIR, backup_dir)] {
        match value {
            Some(v) => env::set_var(name, v),
            None => env::remove_var(name),
        }
    }

    let result = f();

    for (name, value) in [(ENV_VAR_LECTIO_DB, orig_db), (ENV_VAR_LECTIO_BACKUP_DIR, orig_backup)] {
        match value {
            Some(v) => env::set_var(name, v),
            None => env::remove_var(name),
        }
    }
    result
}

#[test]
#[serial]
fn test_config_from_env() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("journal.db");

    let config = with_env(db_path.to_str(), None, Config::load).unwrap();
    assert_eq!(config.db_path, db_path);
    assert_eq!(config.backup_dir, temp_dir.path());
}

#[test]
#[serial]
fn test_config_expands_variables() {
    let temp_dir = tempdir().unwrap();
    env::set_var("LECTIO_TEST_ROOT", temp_dir.path());

    let config = with_env(
        Some("$LECTIO_TEST_ROOT/journal.db"),
        Some("$LECTIO_TEST_ROOT/exports"),
        Config::load,
    );
    env::remove_var("LECTIO_TEST_ROOT");

    let config = config.unwrap();
    assert_eq!(config.db_path, temp_dir.path().join("journal.db"));
    assert_eq!(config.backup_dir, temp_dir.path().join("exports"));
}

#[test]
#[serial]
fn test_blank_db_variable_falls_back_to_default() {
    let config = with_env(Some("   "), None, Config::load).unwrap();
    assert!(config.db_path.ends_with(".local/share/lectio/journal.db"));
}

#[test]
#[serial]
fn test_relative_backup_dir_is_rejected() {
    let result = with_env(Some("/tmp/lectio/journal.db"), Some("exports"), Config::load);
    assert!(result.is_err());
}

#[test]
fn test_config_validate() {
    let config = Config {
        db_path: PathBuf::from("/tmp/journal.db"),
        backup_dir: PathBuf::from("/tmp"),
    };
    assert!(config.validate().is_ok());

    let config = Config {
        db_path: PathBuf::from("journal.db"),
        backup_dir: PathBuf::from("/tmp"),
    };
    assert!(config.validate().is_err());
}
