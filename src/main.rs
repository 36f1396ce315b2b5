// MIT License - Copyright (c) 2026 The dmp-bridge developers
// DMP panel bridge daemon

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use dmp_bridge::{
    BridgeEvent, DmpListener, DmpPanel, EventCode, ListenerConfig, PanelConfig, PanelState, ZoneClass,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "dmp-bridge")]
#[command(about = "Receive DMP alarm panel events and track panel state")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    #[serde(default)]
    listener: ListenerToml,
    #[serde(default, rename = "panel")]
    panels: Vec<PanelToml>,
}

#[derive(Debug, Deserialize)]
struct ListenerToml {
    #[serde(default = "default_bind_ip")]
    bind_ip: String,
    #[serde(default = "default_listen_port")]
    listen_port: u16,
    /// Poll every panel's status this often; 0 disables polling
    #[serde(default)]
    status_interval_secs: u64,
}

impl Default for ListenerToml {
    fn default() -> Self {
        Self {
            bind_ip: default_bind_ip(),
            listen_port: default_listen_port(),
            status_interval_secs: 0,
        }
    }
}

fn default_bind_ip() -> String {
    "0.0.0.0".to_string()
}
fn default_listen_port() -> u16 {
    2011
}

#[derive(Debug, Deserialize)]
struct PanelToml {
    #[serde(default = "default_panel_name")]
    name: String,
    account_number: String,
    panel_ip: String,
    #[serde(default = "default_remote_port")]
    remote_port: u16,
    #[serde(default)]
    remote_key: String,
    #[serde(default = "default_home_area")]
    home_area: String,
    #[serde(default = "default_area_count")]
    area_count: u8,
    #[serde(default = "default_command_delay")]
    command_delay_ms: u64,
    #[serde(default = "default_socket_timeout")]
    socket_timeout_ms: u64,
    #[serde(default, rename = "zone")]
    zones: Vec<ZoneToml>,
}

fn default_panel_name() -> String {
    "DMP Panel".to_string()
}
fn default_remote_port() -> u16 {
    2001
}
fn default_home_area() -> String {
    "01".to_string()
}
fn default_area_count() -> u8 {
    3
}
fn default_command_delay() -> u64 {
    300
}
fn default_socket_timeout() -> u64 {
    10000
}

#[derive(Debug, Deserialize)]
struct ZoneToml {
    number: String,
    name: String,
    #[serde(default = "default_zone_class")]
    class: String,
}

fn default_zone_class() -> String {
    "default".to_string()
}

fn load_config(path: &str) -> Result<Config> {
    let text = std::fs::read_to_string(path).context("Failed to read config file")?;
    let config: Config = toml::from_str(&text).context("Failed to parse config file")?;
    if config.panels.is_empty() {
        anyhow::bail!("No [[panel]] entries in {path}");
    }
    Ok(config)
}

fn build_listener_config(toml: &ListenerToml) -> ListenerConfig {
    ListenerConfig::builder()
        .bind_ip(&toml.bind_ip)
        .listen_port(toml.listen_port)
        .build()
}

fn build_panel_config(toml: &PanelToml) -> Result<PanelConfig> {
    let mut builder = PanelConfig::builder()
        .name(&toml.name)
        .account_number(&toml.account_number)
        .panel_ip(&toml.panel_ip)
        .remote_port(toml.remote_port)
        .remote_key(&toml.remote_key)
        .home_area(&toml.home_area)
        .area_count(toml.area_count)
        .command_delay_ms(toml.command_delay_ms)
        .socket_timeout_ms(toml.socket_timeout_ms);
    for zone in &toml.zones {
        let class = ZoneClass::from_name(&zone.class.to_lowercase())
            .with_context(|| format!("Unknown zone class '{}' for zone {}", zone.class, zone.number))?;
        builder = builder.zone(&zone.number, &zone.name, class);
    }
    let config = builder.build();
    config
        .validate()
        .with_context(|| format!("Invalid panel '{}'", toml.name))?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// JSON snapshots
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PanelSnapshot<'a> {
    now: u64,
    account: &'a str,
    contact_time: Option<DateTime<Utc>>,
    state: PanelState,
}

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

async fn log_snapshot(panel: &DmpPanel) {
    let snapshot = PanelSnapshot {
        now: now_epoch_ms(),
        account: panel.account_number(),
        contact_time: panel.contact_time().await,
        state: panel.snapshot().await,
    };
    match serde_json::to_string(&snapshot) {
        Ok(json) => debug!("Snapshot: {json}"),
        Err(e) => error!("Failed to serialize panel snapshot: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn spawn_event_logger(listener: &DmpListener) -> JoinHandle<()> {
    let mut rx = listener.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(BridgeEvent::UnknownAccount { account, peer }) => {
                    warn!("Frame for unconfigured account '{account}' from {peer}");
                }
                Ok(BridgeEvent::EventDecoded { account, code }) => match EventCode::from_code(&code) {
                    Some(event) => info!("{account}: {event}"),
                    None => info!("{account}: unhandled event code {code}"),
                },
                Ok(event) => debug!("Bridge event: {event:?}"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event receiver lagged, missed {n} events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    info!("Event channel closed");
                    break;
                }
            }
        }
    })
}

fn spawn_snapshot_logger(panels: Vec<Arc<DmpPanel>>, changed: Arc<Notify>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            changed.notified().await;
            for panel in &panels {
                log_snapshot(panel).await;
            }
        }
    })
}

fn spawn_status_poller(panels: Vec<Arc<DmpPanel>>, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            for panel in &panels {
                if let Err(e) = panel.update_status().await {
                    warn!("Status poll for panel {} failed: {e}", panel.account_number());
                }
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=dmp_bridge=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        let mut listener = DmpListener::bind(build_listener_config(&config.listener))
            .await
            .context("Failed to bind event listener")?;
        let mut panels = Vec::new();
        for panel_toml in &config.panels {
            let panel_config = build_panel_config(panel_toml)?;
            panels.push(listener.add_panel(panel_config).await?);
        }

        let changed = Arc::new(Notify::new());
        {
            let changed = changed.clone();
            listener
                .register_callback(Arc::new(move || changed.notify_one()))
                .await;
        }

        let mut handles = vec![
            spawn_event_logger(&listener),
            spawn_snapshot_logger(panels.clone(), changed),
        ];
        if config.listener.status_interval_secs > 0 {
            handles.push(spawn_status_poller(
                panels.clone(),
                config.listener.status_interval_secs,
            ));
        }

        listener.start();
        info!(
            "DMP bridge running with {} panel(s). Send SIGHUP to reload, SIGINT/SIGTERM to stop.",
            panels.len()
        );

        let restart = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                false
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                false
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading config...");
                true
            }
        };

        // Closes the listen socket and every panel connection before a rebind
        listener.stop().await;
        for handle in handles {
            handle.abort();
        }
        drop(listener);

        if !restart {
            break;
        }

        // Keep the previous config if the new one does not load
        match load_config(&cli.config).and_then(|new_config| {
            for panel in &new_config.panels {
                build_panel_config(panel)?;
            }
            Ok(new_config)
        }) {
            Ok(new_config) => {
                config = new_config;
                info!("Config reloaded successfully");
            }
            Err(e) => warn!("Failed to reload config, keeping previous: {e:#}"),
        }
    }

    info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[listener]
listen_port = 3011
status_interval_secs = 60

[[panel]]
name = "House"
account_number = "12345"
panel_ip = "10.0.0.5"
remote_key = "SECRET"

[[panel.zone]]
number = "1"
name = "Front Door"
class = "wired_door"

[[panel.zone]]
number = "12"
name = "Hall Motion"
class = "battery_motion"

[[panel]]
account_number = "777"
panel_ip = "10.0.0.6"
"#;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(CONFIG).unwrap();
        assert_eq!(config.listener.bind_ip, "0.0.0.0");
        assert_eq!(config.listener.listen_port, 3011);
        assert_eq!(config.panels.len(), 2);

        let house = build_panel_config(&config.panels[0]).unwrap();
        assert_eq!(house.area_name(), "House Arming Control");
        assert_eq!(house.remote_key, "SECRET");
        assert_eq!(house.zones.len(), 2);
        assert_eq!(house.zones[1].number, "012");
        assert_eq!(house.zones[1].class, ZoneClass::BatteryMotion);

        let second = build_panel_config(&config.panels[1]).unwrap();
        assert_eq!(second.remote_key.len(), 16);
        assert_eq!(second.all_areas(), "010203");
        assert!(second.zones.is_empty());
    }

    #[test]
    fn test_unknown_zone_class() {
        let config: Config = toml::from_str(
            r#"
[[panel]]
account_number = "1"
panel_ip = "10.0.0.5"

[[panel.zone]]
number = "1"
name = "Pool"
class = "sprinkler"
"#,
        )
        .unwrap();
        assert!(build_panel_config(&config.panels[0]).is_err());
    }
}
