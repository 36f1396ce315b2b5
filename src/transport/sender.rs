// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Outbound remote command sessions

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info};

use crate::config::PanelConfig;
use crate::error::{DmpError, Result};
use crate::protocol::{pad_account, Command};
use crate::reply::{decode_command_reply, decode_status, CommandReply, StatusReport};

/// Runs connect → auth → commands → drop sessions against a panel's remote port.
///
/// The panel handles one session at a time, so sessions from the same
/// sender are serialized. There is no retry; errors go to the caller.
pub struct CommandSender {
    addr: String,
    account: String,
    remote_key: String,
    command_delay: Duration,
    socket_timeout: Duration,
    session: Mutex<()>,
}

impl CommandSender {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            addr: format!("{}:{}", config.panel_ip, config.remote_port),
            account: pad_account(&config.account_number),
            remote_key: config.remote_key.clone(),
            command_delay: Duration::from_millis(config.command_delay_ms),
            socket_timeout: Duration::from_millis(config.socket_timeout_ms),
            session: Mutex::new(()),
        }
    }

    /// Panel remote address (`ip:port`).
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn write_telegram(&self, stream: &mut TcpStream, command: &Command) -> Result<()> {
        let telegram = command.to_telegram(&self.account);
        match command {
            Command::Auth { .. } => debug!("Sending @{}!V2<key>", self.account),
            _ => debug!("Sending @{}{}", self.account, command.to_wire_string()),
        }
        stream.write_all(&telegram).await.map_err(|e| {
            error!("Failed to write to panel {}: {}", self.addr, e);
            DmpError::Io(e)
        })?;
        sleep(self.command_delay).await;
        Ok(())
    }

    /// Run one session and return every reply byte the panel sent.
    pub async fn transact(&self, commands: &[Command]) -> Result<Vec<u8>> {
        let _session = self.session.lock().await;

        debug!("Connecting to panel at {}", self.addr);
        let mut stream = timeout(self.socket_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| {
                error!("Connect to {} timed out", self.addr);
                DmpError::ConnectionTimeout
            })?
            .map_err(|e| {
                error!("TCP connect to {} failed: {}", self.addr, e);
                DmpError::Io(e)
            })?;

        self.write_telegram(
            &mut stream,
            &Command::Auth {
                remote_key: self.remote_key.clone(),
            },
        )
        .await?;
        for command in commands {
            self.write_telegram(&mut stream, command).await?;
        }
        self.write_telegram(&mut stream, &Command::Drop).await?;
        stream.shutdown().await?;

        let mut reply = Vec::new();
        timeout(self.socket_timeout, stream.read_to_end(&mut reply))
            .await
            .map_err(|_| DmpError::CommandTimeout {
                command: describe(commands),
            })??;
        debug!("Received {} reply bytes: {:?}", reply.len(), String::from_utf8_lossy(&reply));
        Ok(reply)
    }

    async fn command(&self, command: Command) -> Result<CommandReply> {
        let raw = self.transact(std::slice::from_ref(&command)).await?;
        decode_command_reply(&raw).ok_or_else(|| DmpError::InvalidResponse {
            details: format!(
                "no acknowledgement for {} in {:?}",
                command.to_wire_string(),
                String::from_utf8_lossy(&raw)
            ),
        })
    }

    /// Arm the listed areas (e.g. `010203`).
    pub async fn arm(&self, areas: &str, instant: bool) -> Result<CommandReply> {
        info!("Arming areas {} (instant: {})", areas, instant);
        self.command(Command::Arm {
            areas: areas.to_string(),
            instant,
        })
        .await
    }

    /// Disarm the listed areas.
    pub async fn disarm(&self, areas: &str) -> Result<CommandReply> {
        info!("Disarming areas {}", areas);
        self.command(Command::Disarm {
            areas: areas.to_string(),
        })
        .await
    }

    /// Bypass (`enable = true`) or reset a zone.
    pub async fn set_bypass(&self, zone: &str, enable: bool) -> Result<CommandReply> {
        info!("{} zone {}", if enable { "Bypassing" } else { "Resetting" }, zone);
        self.command(Command::set_bypass(zone, enable)).await
    }

    /// Poll area and zone status, one page per area group.
    pub async fn status(&self, area_groups: u8) -> Result<StatusReport> {
        let mut commands = vec![Command::StatusFirst];
        commands.extend((0..area_groups).map(|_| Command::StatusNext));
        let raw = self.transact(&commands).await?;
        Ok(decode_status(&raw))
    }
}

fn describe(commands: &[Command]) -> String {
    commands
        .iter()
        .map(Command::to_wire_string)
        .collect::<Vec<_>>()
        .join(" ")
}
