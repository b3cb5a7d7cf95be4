//! Config command handlers: show, set, reset the saved server settings.

use anyhow::Result;

use covercache::{ServerSettings, SettingsError, SettingsStore};

/// Prints the saved settings with the API key redacted.
pub fn run_config_show_command(store: &SettingsStore) -> Result<()> {
    let settings = store.load()?.unwrap_or_default();

    println!("settings_path = {}", store.path().display());
    println!(
        "settings_file = {}",
        if store.is_first_run() {
            "not found (first run)"
        } else {
            "loaded"
        }
    );
    println!(
        "server_url = {}",
        settings.base_url().as_deref().unwrap_or("<not set>")
    );
    println!(
        "api_key = {}",
        if settings.api_key().is_some() {
            "<set, redacted>"
        } else {
            "<not set>"
        }
    );
    println!("configured = {}", settings.is_configured());

    Ok(())
}

/// Validates and saves new server settings.
pub fn run_config_set_command(store: &SettingsStore, url: &str, api_key: &str) -> Result<()> {
    let settings = ServerSettings::new(Some(url.to_string()), Some(api_key.to_string()));

    match store.save(&settings) {
        Ok(()) => {
            println!("Settings saved to {}", store.path().display());
            Ok(())
        }
        Err(SettingsError::Invalid { issues }) => {
            for issue in &issues {
                eprintln!("invalid: {issue}");
            }
            Err(SettingsError::Invalid { issues }.into())
        }
        Err(error) => Err(error.into()),
    }
}

/// Removes the saved settings, returning to first-run state.
pub fn run_config_reset_command(store: &SettingsStore) -> Result<()> {
    store.reset()?;
    println!("Settings removed; next start is a first run.");
    Ok(())
}

/// Prints the settings file path.
pub fn run_config_path_command(store: &SettingsStore) -> Result<()> {
    println!("{}", store.path().display());
    Ok(())
}
