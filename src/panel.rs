// MIT License - Copyright (c) 2026 The dmp-bridge developers
// A configured DMP panel

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::PanelConfig;
use crate::decoder::Decoded;
use crate::devices::area::Area;
use crate::devices::zone::{FaultClass, StatusRecord, ZoneRecord};
use crate::error::Result;
use crate::event::{BridgeEvent, ChangeNotifier, EventSender};
use crate::reply::{CommandReply, StatusReport};
use crate::state::PanelState;
use crate::transport::sender::CommandSender;

/// One panel known to the bridge: its state, last contact and command channel.
///
/// Obtained from [`DmpListener::add_panel`](crate::DmpListener::add_panel)
/// or [`DmpListener::panel`](crate::DmpListener::panel).
///
/// # Example
///
/// ```no_run
/// use dmp_bridge::{DmpListener, ListenerConfig, PanelConfig, ZoneClass};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let listener = DmpListener::bind(ListenerConfig::default()).await?;
///     let panel = listener
///         .add_panel(
///             PanelConfig::builder()
///                 .account_number("12345")
///                 .panel_ip("192.168.0.100")
///                 .zone("1", "Front Door", ZoneClass::WiredDoor)
///                 .build(),
///         )
///         .await?;
///
///     panel.arm_away(false).await?;
///     let report = panel.update_status().await?;
///     println!("{} zones reported", report.zones.len());
///     println!("Area: {:?}", panel.area().await);
///     Ok(())
/// }
/// ```
pub struct DmpPanel {
    config: PanelConfig,
    state: RwLock<PanelState>,
    last_contact: RwLock<Option<DateTime<Utc>>>,
    attributes: RwLock<Vec<(String, String)>>,
    sender: CommandSender,
    notifier: Arc<ChangeNotifier>,
    event_tx: EventSender,
}

impl DmpPanel {
    /// Create a panel and register its configured zones.
    pub fn new(config: PanelConfig, notifier: Arc<ChangeNotifier>, event_tx: EventSender) -> Self {
        let mut state = PanelState::new(config.area_name());
        for zone in &config.zones {
            state.register_zone(&zone.number, &zone.name, zone.class.tracked_faults());
        }
        Self {
            sender: CommandSender::new(&config),
            state: RwLock::new(state),
            last_contact: RwLock::new(None),
            attributes: RwLock::new(Vec::new()),
            config,
            notifier,
            event_tx,
        }
    }

    pub fn account_number(&self) -> &str {
        &self.config.account_number
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn sender(&self) -> &CommandSender {
        &self.sender
    }

    pub async fn area(&self) -> Area {
        self.state.read().await.area().clone()
    }

    pub async fn zone(&self, class: FaultClass, number: &str) -> Option<ZoneRecord> {
        self.state.read().await.zone(class, number).cloned()
    }

    pub async fn zone_open_close(&self, number: &str) -> Option<ZoneRecord> {
        self.zone(FaultClass::OpenClose, number).await
    }

    pub async fn zone_battery(&self, number: &str) -> Option<ZoneRecord> {
        self.zone(FaultClass::Battery, number).await
    }

    pub async fn zone_trouble(&self, number: &str) -> Option<ZoneRecord> {
        self.zone(FaultClass::Trouble, number).await
    }

    pub async fn zone_bypass(&self, number: &str) -> Option<ZoneRecord> {
        self.zone(FaultClass::Bypass, number).await
    }

    pub async fn zone_alarm(&self, number: &str) -> Option<ZoneRecord> {
        self.zone(FaultClass::Alarm, number).await
    }

    pub async fn zone_status(&self, number: &str) -> Option<StatusRecord> {
        self.state.read().await.status(number).cloned()
    }

    /// Snapshot of the full panel state.
    pub async fn snapshot(&self) -> PanelState {
        self.state.read().await.clone()
    }

    /// Time of the last acknowledged inbound frame.
    pub async fn contact_time(&self) -> Option<DateTime<Utc>> {
        *self.last_contact.read().await
    }

    pub(crate) async fn update_contact_time(&self, time: DateTime<Utc>) {
        *self.last_contact.write().await = Some(time);
    }

    /// Attributes from the most recent status refresh.
    pub async fn status_attributes(&self) -> Vec<(String, String)> {
        self.attributes.read().await.clone()
    }

    /// Apply decoded event deltas under a single write lock.
    pub async fn apply(&self, decoded: &Decoded) {
        let mut state = self.state.write().await;
        for delta in &decoded.deltas {
            state.apply(delta);
        }
    }

    /// Poll the panel's status and fold it into the state, then notify observers.
    pub async fn update_status(&self) -> Result<StatusReport> {
        debug!("Refreshing status for panel {}", self.account_number());
        let report = self.sender.status(self.config.area_count).await?;
        self.state
            .write()
            .await
            .apply_status_report(&report, &self.config.home_area);
        *self.attributes.write().await = report.attributes();
        info!(
            "Panel {} status refreshed: {} areas, {} zones",
            self.account_number(),
            report.areas.len(),
            report.zones.len()
        );
        self.notifier.notify().await;
        let _ = self.event_tx.send(BridgeEvent::StatusRefreshed {
            account: self.account_number().to_string(),
        });
        Ok(report)
    }

    /// Arm every area.
    pub async fn arm_away(&self, instant: bool) -> Result<CommandReply> {
        self.sender.arm(&self.config.all_areas(), instant).await
    }

    /// Arm the home area only.
    pub async fn arm_home(&self, instant: bool) -> Result<CommandReply> {
        self.sender.arm(&self.config.home_area, instant).await
    }

    /// Disarm every area.
    pub async fn disarm(&self) -> Result<CommandReply> {
        self.sender.disarm(&self.config.all_areas()).await
    }

    pub async fn set_bypass(&self, zone: &str, enable: bool) -> Result<CommandReply> {
        self.sender.set_bypass(zone, enable).await
    }
}

impl std::fmt::Display for DmpPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DMP panel {} at {}",
            self.config.account_number,
            self.sender.addr()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::StateDelta;
    use crate::devices::area::AreaState;
    use crate::devices::zone::{ZoneClass, ZoneStatus};
    use crate::event::event_channel;

    fn panel() -> DmpPanel {
        let config = PanelConfig::builder()
            .name("House")
            .account_number("12345")
            .zone("1", "Front Door", ZoneClass::WiredDoor)
            .zone("2", "Smoke", ZoneClass::BatterySmoke)
            .build();
        let (tx, _rx) = event_channel(8);
        DmpPanel::new(config, Arc::new(ChangeNotifier::new()), tx)
    }

    #[tokio::test]
    async fn test_new_registers_zones() {
        let panel = panel();
        assert_eq!(panel.area().await, Area::new("House Arming Control", AreaState::Disarmed));
        assert!(panel.zone_open_close("001").await.is_some());
        assert!(panel.zone_alarm("001").await.is_some());
        assert!(panel.zone_battery("001").await.is_none());
        assert!(panel.zone_battery("002").await.is_some());
        assert!(panel.zone_open_close("002").await.is_none());
        assert!(panel.zone_trouble("002").await.is_some());
        let status = panel.zone_status("001").await.unwrap();
        assert_eq!(status.status, ZoneStatus::Ready);
        assert_eq!(status.name, "Front Door");
        assert!(panel.contact_time().await.is_none());
    }

    #[tokio::test]
    async fn test_apply_decoded() {
        let panel = panel();
        let decoded = Decoded {
            deltas: vec![
                StateDelta::Zone {
                    class: FaultClass::OpenClose,
                    zone: "001".into(),
                    name: None,
                    faulted: true,
                },
                StateDelta::Area {
                    name: Some("Main".into()),
                    state: AreaState::ArmedAway,
                },
            ],
            refresh_status: false,
        };
        panel.apply(&decoded).await;
        assert_eq!(panel.zone_status("001").await.unwrap().status, ZoneStatus::Open);
        assert_eq!(panel.zone_status("001").await.unwrap().name, "Front Door");
        assert_eq!(panel.area().await, Area::new("Main", AreaState::ArmedAway));
    }

    #[tokio::test]
    async fn test_contact_time() {
        let panel = panel();
        let now = Utc::now();
        panel.update_contact_time(now).await;
        assert_eq!(panel.contact_time().await, Some(now));
    }

    #[test]
    fn test_display() {
        assert_eq!(panel().to_string(), "DMP panel 12345 at 192.168.0.100:2001");
    }
}
