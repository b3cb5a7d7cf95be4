//! Status command handler: probe the configured server.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use covercache::{SettingsStore, SystemClient};

/// Probes the server with the saved settings.
///
/// Returns `Ok(true)` when the server answered, `Ok(false)` when the probe
/// failed or nothing is configured yet (the caller maps this to a nonzero
/// exit code).
pub async fn run_status_command(store: &SettingsStore) -> Result<bool> {
    if store.is_first_run() {
        println!("No settings saved yet (first run).");
        println!("Configure with: covercache config set --url <URL> --api-key <KEY>");
        return Ok(false);
    }

    let settings = store.load()?.unwrap_or_default();
    let client = SystemClient::new(Arc::new(settings));
    let status = client.check_status().await;

    if status.is_connected {
        info!("Server probe succeeded");
        println!("connected = true");
        if let Some(info) = status.system_info {
            println!("app_name = {}", info.app_name);
            println!("instance_name = {}", info.instance_name);
            println!("version = {}", info.version);
            println!("branch = {}", info.branch);
            println!("os_name = {}", info.os_name);
        }
        Ok(true)
    } else {
        println!("connected = false");
        println!(
            "error = {}",
            status.error.as_deref().unwrap_or("unknown failure")
        );
        Ok(false)
    }
}
