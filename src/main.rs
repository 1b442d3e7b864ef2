/*!
# Lectio - A Scripture-Reading Journal

Lectio records which passages you read, your answers to guided reflection questions
and free-form notes, and tracks your reading habit over time.

## Usage

```
lectio [OPTIONS] <COMMAND>

Commands:
  add        Record a new reading
  edit       Change an existing entry
  show       Show one entry in full
  list       List entries, newest first
  book       List a book's entries in chapter order
  search     Search reflections and notes
  delete     Permanently delete an entry
  stats      Show streaks and other reading statistics
  calendar   Show entries per day
  flashback  Resurface a past entry
  export     Export every entry to a JSON backup
  import     Restore entries from a JSON backup
  today      Exit successfully if an entry was recorded today
  books      List the books of the Bible

Options:
      --log-format <LOG_FORMAT>  Log output format [default: text] [possible values: text, json]
  -h, --help                     Print help
  -V, --version                  Print version
```

## Configuration

- `LECTIO_DB`: The journal database (defaults to "~/.local/share/lectio/journal.db")
- `LECTIO_BACKUP_DIR`: Where `export` writes by default (defaults to the database's directory)
- `RUST_LOG`: Log filter (defaults to "info")
*/

use lectio::cli::{self, commands};
use lectio::config::Config;
use lectio::constants::{DEFAULT_LOG_LEVEL, LOG_FORMAT_JSON};
use lectio::errors::AppResult;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Exit status for errors, kept apart from the `today` command's "no entry" status.
const EXIT_ERROR: u8 = 2;

/// Installs the tracing subscriber, writing to stderr so command output stays clean.
fn init_tracing(log_format: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if log_format == LOG_FORMAT_JSON {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(args: cli::CliArgs) -> AppResult<ExitCode> {
    info!("Loading configuration");
    let config = Config::load()?;
    debug!("Configuration: {:?}", config);

    commands::run(args.command, &config)
}

/// The main entry point for the lectio application.
///
/// Parses arguments, initializes logging, loads configuration and dispatches the
/// subcommand. Errors are logged once here and reported on stderr.
fn main() -> ExitCode {
    let args = cli::parse_args();
    init_tracing(&args.log_format);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
