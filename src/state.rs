// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Per-panel area and zone state

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::decoder::StateDelta;
use crate::devices::area::{Area, AreaState};
use crate::devices::zone::{FaultClass, FaultFlags, StatusRecord, ZoneRecord, ZoneStatus};
use crate::reply::{AreaReplyStatus, StatusReport, ZoneReplyStatus};

/// Zone number → record, ordered by zone number.
pub type ZoneMap = BTreeMap<String, ZoneRecord>;

/// Area state plus five fault maps and the derived status map.
///
/// Every mutation of a fault map recomputes that zone's [`StatusRecord`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct PanelState {
    area: Area,
    open_close: ZoneMap,
    battery: ZoneMap,
    trouble: ZoneMap,
    bypass: ZoneMap,
    alarm: ZoneMap,
    status: BTreeMap<String, StatusRecord>,
}

impl PanelState {
    pub fn new(area_name: impl Into<String>) -> Self {
        Self {
            area: Area::new(area_name, AreaState::Disarmed),
            ..Default::default()
        }
    }

    pub fn area(&self) -> &Area {
        &self.area
    }

    /// Replace the area state, keeping the current name when `name` is `None`.
    pub fn update_area(&mut self, name: Option<&str>, state: AreaState) {
        if let Some(name) = name {
            self.area.name = name.to_string();
        }
        if self.area.state != state {
            debug!("Area '{}' {} -> {}", self.area.name, self.area.state, state);
        }
        self.area.state = state;
    }

    pub fn map(&self, class: FaultClass) -> &ZoneMap {
        match class {
            FaultClass::OpenClose => &self.open_close,
            FaultClass::Battery => &self.battery,
            FaultClass::Trouble => &self.trouble,
            FaultClass::Bypass => &self.bypass,
            FaultClass::Alarm => &self.alarm,
        }
    }

    fn map_mut(&mut self, class: FaultClass) -> &mut ZoneMap {
        match class {
            FaultClass::OpenClose => &mut self.open_close,
            FaultClass::Battery => &mut self.battery,
            FaultClass::Trouble => &mut self.trouble,
            FaultClass::Bypass => &mut self.bypass,
            FaultClass::Alarm => &mut self.alarm,
        }
    }

    /// A zone's record in one fault map.
    pub fn zone(&self, class: FaultClass, number: &str) -> Option<&ZoneRecord> {
        self.map(class).get(number)
    }

    /// A zone's composite status.
    pub fn status(&self, number: &str) -> Option<&StatusRecord> {
        self.status.get(number)
    }

    pub fn statuses(&self) -> &BTreeMap<String, StatusRecord> {
        &self.status
    }

    /// Active faults for a zone across all five maps.
    pub fn faults(&self, number: &str) -> FaultFlags {
        FaultClass::ALL
            .iter()
            .filter(|class| self.zone(**class, number).is_some_and(|z| z.faulted))
            .fold(FaultFlags::empty(), |acc, class| acc | class.flag())
    }

    /// Add a zone to the fault maps named by `tracked` without touching existing flags.
    pub fn register_zone(&mut self, number: &str, name: &str, tracked: FaultFlags) {
        for class in FaultClass::ALL {
            if tracked.contains(class.flag()) {
                self.map_mut(class)
                    .entry(number.to_string())
                    .or_insert_with(|| ZoneRecord::new(number, name));
            }
        }
        self.recompute(number, Some(name));
    }

    /// Merge a fault flag into a zone's record, creating it if absent.
    pub fn update_zone(&mut self, class: FaultClass, number: &str, name: Option<&str>, faulted: bool) {
        let record = self
            .map_mut(class)
            .entry(number.to_string())
            .or_insert_with(|| ZoneRecord::new(number, ""));
        record.faulted = faulted;
        if let Some(name) = name {
            record.name = name.to_string();
        }
        debug!("Zone {} {} = {}", number, class.as_str(), faulted);
        self.recompute(number, name);
    }

    pub fn update_open_close(&mut self, number: &str, name: Option<&str>, open: bool) {
        self.update_zone(FaultClass::OpenClose, number, name, open);
    }

    pub fn update_battery(&mut self, number: &str, name: Option<&str>, low: bool) {
        self.update_zone(FaultClass::Battery, number, name, low);
    }

    pub fn update_trouble(&mut self, number: &str, name: Option<&str>, trouble: bool) {
        self.update_zone(FaultClass::Trouble, number, name, trouble);
    }

    pub fn update_bypass(&mut self, number: &str, name: Option<&str>, bypassed: bool) {
        self.update_zone(FaultClass::Bypass, number, name, bypassed);
    }

    pub fn update_alarm(&mut self, number: &str, name: Option<&str>, alarm: bool) {
        self.update_zone(FaultClass::Alarm, number, name, alarm);
    }

    /// Set a flag if `faulted`, otherwise clear it only where the zone is already tracked.
    fn fold_flag(&mut self, class: FaultClass, number: &str, name: &str, faulted: bool) {
        let name = if name.is_empty() { None } else { Some(name) };
        if faulted || self.map(class).contains_key(number) {
            self.update_zone(class, number, name, faulted);
        }
    }

    /// Apply one decoded event delta.
    pub fn apply(&mut self, delta: &StateDelta) {
        match delta {
            StateDelta::Zone {
                class,
                zone,
                name,
                faulted,
            } => self.update_zone(*class, zone, name.as_deref(), *faulted),
            StateDelta::Area { name, state } => self.update_area(name.as_deref(), *state),
        }
    }

    /// Fold a polled status report into the fault flags and area state.
    ///
    /// Flags are recomputed from the report alone, so repeated refreshes with
    /// the same report leave the state unchanged.
    pub fn apply_status_report(&mut self, report: &StatusReport, home_area: &str) {
        for (number, zone) in &report.zones {
            let status = zone.status;
            let open = matches!(status, ZoneReplyStatus::Open | ZoneReplyStatus::Short);
            self.fold_flag(FaultClass::OpenClose, number, &zone.name, open);
            self.fold_flag(
                FaultClass::Bypass,
                number,
                &zone.name,
                status == ZoneReplyStatus::Bypassed,
            );
            self.fold_flag(
                FaultClass::Trouble,
                number,
                &zone.name,
                status == ZoneReplyStatus::Missing,
            );
            self.fold_flag(
                FaultClass::Battery,
                number,
                &zone.name,
                status == ZoneReplyStatus::LowBattery,
            );
        }

        if report.areas.is_empty() {
            return;
        }
        let armed: Vec<&str> = report
            .areas
            .iter()
            .filter(|(_, area)| area.status == AreaReplyStatus::Armed)
            .map(|(number, _)| number.as_str())
            .collect();
        if armed.is_empty() {
            self.update_area(None, AreaState::Disarmed);
        } else if self.area.state == AreaState::Disarmed {
            let state = if armed.iter().all(|number| *number == home_area) {
                AreaState::ArmedHome
            } else {
                AreaState::ArmedAway
            };
            self.update_area(None, state);
        }
    }

    /// Recompute the composite status for one zone.
    fn recompute(&mut self, number: &str, name: Option<&str>) {
        let status = ZoneStatus::from_faults(self.faults(number));
        let name = name
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.status
                    .get(number)
                    .map(|s| s.name.clone())
                    .filter(|n| !n.is_empty())
            })
            .or_else(|| {
                FaultClass::ALL
                    .iter()
                    .filter_map(|class| self.zone(*class, number))
                    .map(|z| z.name.clone())
                    .find(|n| !n.is_empty())
            })
            .unwrap_or_default();
        self.status.insert(
            number.to_string(),
            StatusRecord {
                number: number.to_string(),
                name,
                status,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::{AreaReport, ZoneReport};

    #[test]
    fn test_update_creates_and_recomputes() {
        let mut state = PanelState::new("Main");
        state.update_open_close("001", Some("Door"), true);
        let status = state.status("001").unwrap();
        assert_eq!(status.status, ZoneStatus::Open);
        assert_eq!(status.name, "Door");

        state.update_battery("001", None, true);
        assert_eq!(state.status("001").unwrap().status, ZoneStatus::LowBattery);
        state.update_bypass("001", None, true);
        assert_eq!(state.status("001").unwrap().status, ZoneStatus::Bypass);
        state.update_trouble("001", None, true);
        assert_eq!(state.status("001").unwrap().status, ZoneStatus::Trouble);
        state.update_alarm("001", None, true);
        assert_eq!(state.status("001").unwrap().status, ZoneStatus::Alarm);
        assert_eq!(state.status("001").unwrap().name, "Door");
    }

    #[test]
    fn test_update_preserves_name() {
        let mut state = PanelState::default();
        state.register_zone("004", "Back Door", FaultFlags::OPEN | FaultFlags::TROUBLE);
        state.update_open_close("004", None, true);
        assert_eq!(state.zone(FaultClass::OpenClose, "004").unwrap().name, "Back Door");
        assert!(state.zone(FaultClass::OpenClose, "004").unwrap().faulted);
        state.update_open_close("004", Some("Rear"), false);
        assert_eq!(state.zone(FaultClass::OpenClose, "004").unwrap().name, "Rear");
    }

    #[test]
    fn test_missing_zone_returns_none() {
        let state = PanelState::default();
        assert!(state.zone(FaultClass::Alarm, "009").is_none());
        assert!(state.status("009").is_none());
        assert_eq!(state.faults("009"), FaultFlags::empty());
    }

    #[test]
    fn test_register_zone_keeps_flags() {
        let mut state = PanelState::default();
        state.update_trouble("002", None, true);
        state.register_zone("002", "Kitchen", FaultFlags::TROUBLE | FaultFlags::OPEN);
        assert!(state.zone(FaultClass::Trouble, "002").unwrap().faulted);
        assert!(!state.zone(FaultClass::OpenClose, "002").unwrap().faulted);
        assert!(state.zone(FaultClass::Battery, "002").is_none());
        let status = state.status("002").unwrap();
        assert_eq!(status.status, ZoneStatus::Trouble);
        assert_eq!(status.name, "Kitchen");
    }

    #[test]
    fn test_reset_delta_clears_to_open() {
        let mut state = PanelState::default();
        state.update_open_close("003", None, true);
        state.update_bypass("003", None, true);
        state.update_trouble("003", None, true);
        state.update_battery("003", None, true);
        state.update_alarm("003", None, true);
        for class in [
            FaultClass::Bypass,
            FaultClass::Trouble,
            FaultClass::Battery,
            FaultClass::Alarm,
        ] {
            state.apply(&StateDelta::Zone {
                class,
                zone: "003".into(),
                name: None,
                faulted: false,
            });
        }
        assert_eq!(state.status("003").unwrap().status, ZoneStatus::Open);
        state.update_open_close("003", None, false);
        assert_eq!(state.status("003").unwrap().status, ZoneStatus::Ready);
    }

    #[test]
    fn test_apply_area_delta() {
        let mut state = PanelState::new("Main");
        state.apply(&StateDelta::Area {
            name: None,
            state: AreaState::Triggered,
        });
        assert_eq!(state.area().state, AreaState::Triggered);
        assert_eq!(state.area().name, "Main");
        state.apply(&StateDelta::Area {
            name: Some("House".into()),
            state: AreaState::Disarmed,
        });
        assert_eq!(state.area(), &Area::new("House", AreaState::Disarmed));
    }

    fn report(zones: &[(&str, ZoneReplyStatus)], areas: &[(&str, AreaReplyStatus)]) -> StatusReport {
        let mut r = StatusReport::default();
        for (number, status) in zones {
            r.zones.insert(
                number.to_string(),
                ZoneReport {
                    status: *status,
                    name: format!("Zone {}", number),
                },
            );
        }
        for (number, status) in areas {
            r.areas.insert(
                number.to_string(),
                AreaReport {
                    status: *status,
                    name: format!("Area {}", number),
                },
            );
        }
        r
    }

    #[test]
    fn test_status_report_sets_flags() {
        let mut state = PanelState::default();
        let r = report(
            &[
                ("001", ZoneReplyStatus::Open),
                ("002", ZoneReplyStatus::Short),
                ("003", ZoneReplyStatus::Bypassed),
                ("004", ZoneReplyStatus::Missing),
                ("005", ZoneReplyStatus::LowBattery),
                ("006", ZoneReplyStatus::Normal),
            ],
            &[],
        );
        state.apply_status_report(&r, "01");
        assert_eq!(state.status("001").unwrap().status, ZoneStatus::Open);
        assert_eq!(state.status("002").unwrap().status, ZoneStatus::Open);
        assert_eq!(state.status("003").unwrap().status, ZoneStatus::Bypass);
        assert_eq!(state.status("004").unwrap().status, ZoneStatus::Trouble);
        assert_eq!(state.status("005").unwrap().status, ZoneStatus::LowBattery);
        assert!(state.status("006").is_none());
        assert_eq!(state.status("003").unwrap().name, "Zone 003");
    }

    #[test]
    fn test_status_report_normal_clears_tracked_flags() {
        let mut state = PanelState::default();
        state.update_open_close("004", None, true);
        state.update_bypass("004", None, true);
        state.update_trouble("004", None, true);
        state.update_battery("004", None, true);
        state.update_alarm("004", None, true);

        state.apply_status_report(&report(&[("004", ZoneReplyStatus::Normal)], &[]), "01");
        for class in [
            FaultClass::OpenClose,
            FaultClass::Bypass,
            FaultClass::Trouble,
            FaultClass::Battery,
        ] {
            assert!(!state.zone(class, "004").unwrap().faulted);
        }
        // Alarm is not reported by status polls
        assert_eq!(state.status("004").unwrap().status, ZoneStatus::Alarm);
    }

    #[test]
    fn test_status_report_idempotent() {
        let mut state = PanelState::default();
        let r = report(
            &[("001", ZoneReplyStatus::Open), ("002", ZoneReplyStatus::Bypassed)],
            &[("01", AreaReplyStatus::Disarmed)],
        );
        state.apply_status_report(&r, "01");
        let first = state.clone();
        state.apply_status_report(&r, "01");
        assert_eq!(state.statuses(), first.statuses());
        assert_eq!(state.map(FaultClass::OpenClose), first.map(FaultClass::OpenClose));
    }

    #[test]
    fn test_status_report_area_folding() {
        let mut state = PanelState::new("Main");
        state.apply_status_report(
            &report(&[], &[("01", AreaReplyStatus::Armed), ("02", AreaReplyStatus::Disarmed)]),
            "01",
        );
        assert_eq!(state.area().state, AreaState::ArmedHome);

        let mut state = PanelState::new("Main");
        state.apply_status_report(
            &report(&[], &[("01", AreaReplyStatus::Armed), ("02", AreaReplyStatus::Armed)]),
            "01",
        );
        assert_eq!(state.area().state, AreaState::ArmedAway);

        // Triggered survives while an area is still armed
        state.update_area(None, AreaState::Triggered);
        state.apply_status_report(&report(&[], &[("02", AreaReplyStatus::Armed)]), "01");
        assert_eq!(state.area().state, AreaState::Triggered);

        state.apply_status_report(&report(&[], &[("01", AreaReplyStatus::Disarmed)]), "01");
        assert_eq!(state.area().state, AreaState::Disarmed);
    }
}
