mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use themekeeper::{
    ConfigError, MemoryDocument, Preference, PreferenceStore, StorageError, ThemeConfig, ThemeController,
    ThemeDocument, ToggleControl,
};
use tracing_subscriber::EnvFilter;

use crate::store::JsonFileStore;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "themekeeper", about = "Inspect and flip a stored light/dark theme preference")]
struct Cli {
    /// JSON file used as the preference store.
    #[arg(long, env = "THEMEKEEPER_STORE", default_value = "themekeeper.json")]
    store: PathBuf,

    /// Key the preference is stored under.
    #[arg(long, env = "THEME_STORAGE_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the preference a page load would apply.
    Show {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the raw stored value, failing loudly on storage errors.
    Raw,
    /// Click the toggle control.
    Toggle {
        #[arg(long, default_value_t = 1)]
        times: usize,
    },
    /// Save the requested preference, toggling first if the page shows the other one.
    Set {
        preference: Preference,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    let mut config = ThemeConfig::from_env()?;
    if let Some(key) = cli.key {
        config = config.with_storage_key(key);
    }
    let store = JsonFileStore::new(cli.store);
    tracing::debug!(path = %store.path().display(), key = %config.storage_key, "using preference store");

    match cli.command {
        Command::Show { json } => run_show(config, store, json),
        Command::Raw => run_raw(&config, &store),
        Command::Toggle { times } => run_toggle(config, store, times),
        Command::Set { preference } => run_set(config, store, preference),
    }
}

fn run_show(config: ThemeConfig, store: JsonFileStore, json: bool) -> Result<String, CliError> {
    let mut controller = ThemeController::new(config, store, MemoryDocument::new());
    let preference = controller.initialize();
    if !json {
        return Ok(describe(preference));
    }
    let value = json!({
        "key": controller.config().storage_key,
        "preference": preference,
        "dark": controller.document().is_dark(),
        "label": controller.document().label(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

fn run_raw(config: &ThemeConfig, store: &JsonFileStore) -> Result<String, CliError> {
    Ok(store.get(&config.storage_key)?.unwrap_or_else(|| "(unset)".to_owned()))
}

fn run_toggle(config: ThemeConfig, store: JsonFileStore, times: usize) -> Result<String, CliError> {
    let mut button = ToggleControl::new();
    let shared = ThemeController::new(config, store, MemoryDocument::new()).mount(&mut button);
    for _ in 0..times {
        button.click();
    }
    let controller = shared.borrow();
    let preference = controller.preference();
    if times > 0 {
        // Clicks swallow write failures; read back so the exit status is honest.
        confirm_saved(controller.store(), &controller.config().storage_key, preference)?;
    }
    Ok(describe(preference))
}

fn run_set(config: ThemeConfig, store: JsonFileStore, wanted: Preference) -> Result<String, CliError> {
    let mut controller = ThemeController::new(config, store, MemoryDocument::new());
    if controller.initialize() != wanted {
        controller.toggle();
    }
    let preference = controller.save()?;
    Ok(describe(preference))
}

/// Fail unless `store` holds `expected` under `key`.
fn confirm_saved(store: &JsonFileStore, key: &str, expected: Preference) -> Result<(), CliError> {
    match store.get(key)? {
        Some(saved) if saved == expected.as_str() => Ok(()),
        saved => Err(StorageError::Write {
            key: key.to_owned(),
            reason: format!("store holds {}, expected {expected}", saved.as_deref().unwrap_or("nothing")),
        }
        .into()),
    }
}

fn describe(preference: Preference) -> String {
    format!("{preference} {}", preference.toggle_glyph())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
