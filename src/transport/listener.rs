// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Inbound event telegram listener

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::{ListenerConfig, PanelConfig};
use crate::constants::EventCode;
use crate::decoder::decode_event;
use crate::error::{DmpError, Result};
use crate::event::{event_channel, BridgeEvent, Callback, ChangeNotifier, EventReceiver, EventSender};
use crate::panel::DmpPanel;
use crate::protocol::{ack_telegram, classify_frame, frame_account, FrameKind};
use crate::reply::StatusReport;

/// State shared between the listener handle and its connection tasks.
struct Shared {
    panels: RwLock<HashMap<String, Arc<DmpPanel>>>,
    notifier: Arc<ChangeNotifier>,
    event_tx: EventSender,
    read_buffer_size: usize,
}

/// Result of processing one inbound frame.
enum FrameOutcome {
    /// No panel is configured for this account.
    UnknownAccount(String),
    /// Frame applied; `ack` must be written back.
    Processed {
        panel: Arc<DmpPanel>,
        ack: Vec<u8>,
        refresh_status: bool,
    },
}

/// TCP server receiving event telegrams from one or more panels.
///
/// Panels share the listen port and are told apart by the account number in
/// each frame. Every connection runs its own read loop; a frame is decoded,
/// applied, acknowledged and announced before the next read on that
/// connection.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use dmp_bridge::{DmpListener, ListenerConfig, PanelConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut listener = DmpListener::bind(
///         ListenerConfig::builder().listen_port(2011).build(),
///     )
///     .await?;
///     let panel = listener
///         .add_panel(PanelConfig::builder().account_number("12345").build())
///         .await?;
///
///     listener
///         .register_callback(Arc::new(|| println!("panel state changed")))
///         .await;
///     listener.start();
///
///     tokio::signal::ctrl_c().await?;
///     println!("last contact: {:?}", panel.contact_time().await);
///     listener.stop().await;
///     Ok(())
/// }
/// ```
pub struct DmpListener {
    local_addr: SocketAddr,
    listener: Option<TcpListener>,
    accept_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shared: Arc<Shared>,
}

impl DmpListener {
    /// Bind the listen socket. Connections are not accepted until [`start`](Self::start).
    pub async fn bind(config: ListenerConfig) -> Result<Self> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            error!("Failed to bind listener on {}: {}", addr, e);
            DmpError::Io(e)
        })?;
        let local_addr = listener.local_addr()?;
        info!("Listening for panel events on {}", local_addr);

        let (event_tx, _) = event_channel(config.event_capacity);
        Ok(Self {
            local_addr,
            listener: Some(listener),
            accept_handle: None,
            shutdown_tx: None,
            shared: Arc::new(Shared {
                panels: RwLock::new(HashMap::new()),
                notifier: Arc::new(ChangeNotifier::new()),
                event_tx,
                read_buffer_size: config.read_buffer_size,
            }),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawn the accept loop. Calling it again has no effect.
    pub fn start(&mut self) {
        if let Some(listener) = self.listener.take() {
            let (shutdown_tx, shutdown_rx) = oneshot::channel();
            let shared = self.shared.clone();
            self.shutdown_tx = Some(shutdown_tx);
            self.accept_handle = Some(tokio::spawn(accept_loop(listener, shared, shutdown_rx)));
        }
    }

    /// Stop the listener and close every open connection.
    ///
    /// Returns once the listen socket is closed and all connection tasks
    /// have ended, so the port can be bound again straight away. A stopped
    /// listener cannot be restarted.
    pub async fn stop(&mut self) {
        self.listener = None;
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(handle) = self.accept_handle.take() {
            info!("Stopping listener on {}", self.local_addr);
            if let Err(e) = handle.await {
                warn!("Accept loop on {} ended abnormally: {}", self.local_addr, e);
            }
        }
    }

    /// Register a panel. Its configured zones are added to the fault maps.
    pub async fn add_panel(&self, config: PanelConfig) -> Result<Arc<DmpPanel>> {
        config.validate()?;
        let mut panels = self.shared.panels.write().await;
        if panels.contains_key(&config.account_number) {
            return Err(DmpError::DuplicateAccount {
                account: config.account_number,
            });
        }
        let panel = Arc::new(DmpPanel::new(
            config,
            self.shared.notifier.clone(),
            self.shared.event_tx.clone(),
        ));
        info!("Added {}", panel);
        panels.insert(panel.account_number().to_string(), panel.clone());
        Ok(panel)
    }

    pub async fn remove_panel(&self, account: &str) -> Option<Arc<DmpPanel>> {
        self.shared.panels.write().await.remove(account)
    }

    pub async fn panel(&self, account: &str) -> Option<Arc<DmpPanel>> {
        self.shared.panels.read().await.get(account).cloned()
    }

    pub async fn panels(&self) -> Vec<Arc<DmpPanel>> {
        self.shared.panels.read().await.values().cloned().collect()
    }

    /// Register a change callback. Returns false if it was already registered.
    pub async fn register_callback(&self, callback: Callback) -> bool {
        self.shared.notifier.register(callback).await
    }

    pub async fn remove_callback(&self, callback: &Callback) -> bool {
        self.shared.notifier.remove(callback).await
    }

    /// Subscribe to connection and decode events.
    pub fn subscribe(&self) -> EventReceiver {
        self.shared.event_tx.subscribe()
    }

    /// Poll one panel's status and fold it into its state.
    pub async fn update_status(&self, account: &str) -> Result<StatusReport> {
        let panel = self.panel(account).await.ok_or_else(|| DmpError::UnknownAccount {
            account: account.to_string(),
        })?;
        panel.update_status().await
    }
}

impl Drop for DmpListener {
    fn drop(&mut self) {
        if let Some(handle) = self.accept_handle.take() {
            handle.abort();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    shared: Arc<Shared>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!("Connection from {}", peer);
                    let _ = shared.event_tx.send(BridgeEvent::ConnectionAccepted { peer });
                    connections.spawn(handle_connection(stream, peer, shared.clone()));
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    debug!("Closing {} open connection(s)", connections.len());
    connections.shutdown().await;
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, shared: Arc<Shared>) {
    let mut buf = vec![0u8; shared.read_buffer_size];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => {
                debug!("Connection from {} closed", peer);
                break;
            }
            Ok(n) => n,
            Err(e) => {
                error!("Read error from {}: {}", peer, e);
                break;
            }
        };
        let frame = String::from_utf8_lossy(&buf[..n]);
        debug!("Raw data from {}: {:?}", peer, frame);

        match shared.process_frame(&frame).await {
            FrameOutcome::UnknownAccount(account) => {
                warn!("Unknown account number '{}' from {}, closing connection", account, peer);
                let _ = shared
                    .event_tx
                    .send(BridgeEvent::UnknownAccount { account, peer });
                break;
            }
            FrameOutcome::Processed {
                panel,
                ack,
                refresh_status,
            } => {
                let acked = match stream.write_all(&ack).await {
                    Ok(()) => {
                        panel.update_contact_time(Utc::now()).await;
                        true
                    }
                    Err(e) => {
                        error!("Failed to send ACK to {}: {}", peer, e);
                        false
                    }
                };
                if refresh_status {
                    spawn_status_refresh(panel);
                }
                shared.notifier.notify().await;
                if !acked {
                    break;
                }
            }
        }
    }
    let _ = shared.event_tx.send(BridgeEvent::ConnectionClosed { peer });
}

fn spawn_status_refresh(panel: Arc<DmpPanel>) {
    tokio::spawn(async move {
        if let Err(e) = panel.update_status().await {
            warn!("Status refresh for panel {} failed: {}", panel.account_number(), e);
        }
    });
}

impl Shared {
    /// Look up the panel for a frame, decode it and apply the result.
    async fn process_frame(&self, frame: &str) -> FrameOutcome {
        let raw_account = frame_account(frame);
        let account = raw_account.trim();
        let Some(panel) = self.panels.read().await.get(account).cloned() else {
            return FrameOutcome::UnknownAccount(account.to_string());
        };

        let mut refresh_status = false;
        match classify_frame(frame, raw_account) {
            FrameKind::Checkin => {
                info!("{}: Received checkin message", account);
                let _ = self.event_tx.send(BridgeEvent::Checkin {
                    account: account.to_string(),
                });
            }
            FrameKind::TimeRequest => debug!("{}: Time request ignored", account),
            FrameKind::Event(code) => {
                match EventCode::from_code(code) {
                    Some(event) => debug!("{}: {}", account, event),
                    None => debug!("{}: event code {:?}", account, code),
                }
                let decoded = decode_event(code, frame, &panel.config().home_area);
                panel.apply(&decoded).await;
                refresh_status = decoded.refresh_status;
                let _ = self.event_tx.send(BridgeEvent::EventDecoded {
                    account: account.to_string(),
                    code: code.to_string(),
                });
            }
        }

        FrameOutcome::Processed {
            panel,
            ack: ack_telegram(account),
            refresh_status,
        }
    }
}
