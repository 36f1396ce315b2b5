// MIT License - Copyright (c) 2026 The dmp-bridge developers
// LAN bridge for DMP alarm panels
//
//! # dmp-bridge
//!
//! Receives event telegrams pushed by DMP intrusion panels over TCP,
//! keeps an in-memory picture of each panel's area and zone state, and
//! issues remote commands (arm, disarm, bypass, status poll) on the
//! panel's remote port.
//!
//! Several panels can share one listener; frames are routed by account
//! number. Observers register no-argument change callbacks, or subscribe
//! to the [`BridgeEvent`] broadcast channel.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dmp_bridge::{DmpListener, ListenerConfig, PanelConfig, ZoneClass};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut listener = DmpListener::bind(ListenerConfig::default()).await?;
//!     let panel = listener
//!         .add_panel(
//!             PanelConfig::builder()
//!                 .account_number("12345")
//!                 .panel_ip("192.168.0.100")
//!                 .zone("1", "Front Door", ZoneClass::WiredDoor)
//!                 .build(),
//!         )
//!         .await?;
//!
//!     let mut events = listener.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!     listener.start();
//!
//!     panel.arm_away(false).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     listener.stop().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod decoder;
pub mod devices;
pub mod error;
pub mod event;
pub mod panel;
pub mod protocol;
pub mod reply;
pub mod segment;
pub mod state;
pub mod transport;

// Re-exports for convenience
pub use config::{ListenerConfig, ListenerConfigBuilder, PanelConfig, PanelConfigBuilder, ZoneConfig};
pub use constants::EventCode;
pub use decoder::{Decoded, StateDelta};
pub use devices::area::{Area, AreaState};
pub use devices::zone::{FaultClass, FaultFlags, StatusRecord, ZoneClass, ZoneRecord, ZoneStatus};
pub use error::{DmpError, Result};
pub use event::{BridgeEvent, Callback, ChangeNotifier, EventReceiver};
pub use panel::DmpPanel;
pub use reply::{CommandReply, StatusReport};
pub use state::PanelState;
pub use transport::listener::DmpListener;
pub use transport::sender::CommandSender;
