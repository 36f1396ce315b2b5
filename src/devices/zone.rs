// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Zone fault records and composite status

use std::fmt;

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Fault classes active on a zone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FaultFlags: u8 {
        /// Zone is open (door/window contact, device status)
        const OPEN        = 0b0000_0001;
        /// Wireless device battery low
        const LOW_BATTERY = 0b0000_0010;
        /// Zone bypassed
        const BYPASS      = 0b0000_0100;
        /// Zone trouble (fail, missing, supervisory)
        const TROUBLE     = 0b0000_1000;
        /// Zone in alarm
        const ALARM       = 0b0001_0000;
    }
}

/// One of the five independent per-zone fault maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultClass {
    OpenClose,
    Battery,
    Trouble,
    Bypass,
    Alarm,
}

impl FaultClass {
    pub const ALL: [FaultClass; 5] = [
        FaultClass::OpenClose,
        FaultClass::Battery,
        FaultClass::Trouble,
        FaultClass::Bypass,
        FaultClass::Alarm,
    ];

    pub fn flag(&self) -> FaultFlags {
        match self {
            FaultClass::OpenClose => FaultFlags::OPEN,
            FaultClass::Battery => FaultFlags::LOW_BATTERY,
            FaultClass::Trouble => FaultFlags::TROUBLE,
            FaultClass::Bypass => FaultFlags::BYPASS,
            FaultClass::Alarm => FaultFlags::ALARM,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FaultClass::OpenClose => "open_close",
            FaultClass::Battery => "battery",
            FaultClass::Trouble => "trouble",
            FaultClass::Bypass => "bypass",
            FaultClass::Alarm => "alarm",
        }
    }
}

/// A zone's entry in one fault map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneRecord {
    /// Zero-padded zone number, the join key across all maps
    pub number: String,
    pub name: String,
    pub faulted: bool,
}

impl ZoneRecord {
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            faulted: false,
        }
    }
}

/// Composite zone state, derived from the fault maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ZoneStatus {
    Alarm,
    Trouble,
    Bypass,
    LowBattery,
    Open,
    Ready,
}

impl ZoneStatus {
    /// First active fault in priority order, else `Ready`.
    ///
    /// Alarm > Trouble > Bypass > LowBattery > Open > Ready
    pub fn from_faults(faults: FaultFlags) -> Self {
        if faults.contains(FaultFlags::ALARM) {
            ZoneStatus::Alarm
        } else if faults.contains(FaultFlags::TROUBLE) {
            ZoneStatus::Trouble
        } else if faults.contains(FaultFlags::BYPASS) {
            ZoneStatus::Bypass
        } else if faults.contains(FaultFlags::LOW_BATTERY) {
            ZoneStatus::LowBattery
        } else if faults.contains(FaultFlags::OPEN) {
            ZoneStatus::Open
        } else {
            ZoneStatus::Ready
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ZoneStatus::Alarm => "Alarm",
            ZoneStatus::Trouble => "Trouble",
            ZoneStatus::Bypass => "Bypass",
            ZoneStatus::LowBattery => "Low Battery",
            ZoneStatus::Open => "Open",
            ZoneStatus::Ready => "Ready",
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A zone's composite status entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub number: String,
    pub name: String,
    pub status: ZoneStatus,
}

/// Installed device class of a zone. Decides which fault maps it appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZoneClass {
    BatteryDoor,
    BatteryGlassbreak,
    BatteryMotion,
    BatterySiren,
    BatterySmoke,
    BatteryWindow,
    WiredDoor,
    WiredGlassbreak,
    WiredMotion,
    WiredSiren,
    WiredSmoke,
    WiredWindow,
    #[default]
    Default,
}

impl ZoneClass {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "battery_door" => Some(Self::BatteryDoor),
            "battery_glassbreak" => Some(Self::BatteryGlassbreak),
            "battery_motion" => Some(Self::BatteryMotion),
            "battery_siren" => Some(Self::BatterySiren),
            "battery_smoke" => Some(Self::BatterySmoke),
            "battery_window" => Some(Self::BatteryWindow),
            "wired_door" => Some(Self::WiredDoor),
            "wired_glassbreak" => Some(Self::WiredGlassbreak),
            "wired_motion" => Some(Self::WiredMotion),
            "wired_siren" => Some(Self::WiredSiren),
            "wired_smoke" => Some(Self::WiredSmoke),
            "wired_window" => Some(Self::WiredWindow),
            "default" => Some(Self::Default),
            _ => None,
        }
    }

    pub fn is_battery(&self) -> bool {
        matches!(
            self,
            Self::BatteryDoor
                | Self::BatteryGlassbreak
                | Self::BatteryMotion
                | Self::BatterySiren
                | Self::BatterySmoke
                | Self::BatteryWindow
        )
    }

    /// Fault maps a zone of this class is registered in.
    pub fn tracked_faults(&self) -> FaultFlags {
        let mut faults = FaultFlags::TROUBLE;
        if matches!(
            self,
            Self::BatteryDoor | Self::BatteryWindow | Self::WiredDoor | Self::WiredWindow | Self::Default
        ) {
            faults |= FaultFlags::OPEN;
        }
        if self.is_battery() {
            faults |= FaultFlags::LOW_BATTERY;
        }
        if matches!(
            self,
            Self::BatteryDoor
                | Self::BatteryWindow
                | Self::BatteryGlassbreak
                | Self::BatteryMotion
                | Self::WiredDoor
                | Self::WiredWindow
                | Self::WiredGlassbreak
                | Self::WiredMotion
        ) {
            faults |= FaultFlags::ALARM | FaultFlags::BYPASS;
        }
        faults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_priority() {
        assert_eq!(ZoneStatus::from_faults(FaultFlags::empty()), ZoneStatus::Ready);
        assert_eq!(ZoneStatus::from_faults(FaultFlags::all()), ZoneStatus::Alarm);
        assert_eq!(
            ZoneStatus::from_faults(FaultFlags::TROUBLE | FaultFlags::BYPASS | FaultFlags::OPEN),
            ZoneStatus::Trouble
        );
        assert_eq!(
            ZoneStatus::from_faults(FaultFlags::BYPASS | FaultFlags::LOW_BATTERY),
            ZoneStatus::Bypass
        );
        assert_eq!(
            ZoneStatus::from_faults(FaultFlags::LOW_BATTERY | FaultFlags::OPEN),
            ZoneStatus::LowBattery
        );
        assert_eq!(ZoneStatus::from_faults(FaultFlags::OPEN), ZoneStatus::Open);
    }

    #[test]
    fn test_status_priority_exhaustive() {
        let order = [
            (FaultFlags::ALARM, ZoneStatus::Alarm),
            (FaultFlags::TROUBLE, ZoneStatus::Trouble),
            (FaultFlags::BYPASS, ZoneStatus::Bypass),
            (FaultFlags::LOW_BATTERY, ZoneStatus::LowBattery),
            (FaultFlags::OPEN, ZoneStatus::Open),
        ];
        for bits in 0..32u8 {
            let faults = FaultFlags::from_bits_truncate(bits);
            let expected = order
                .iter()
                .find(|(flag, _)| faults.contains(*flag))
                .map(|(_, status)| *status)
                .unwrap_or(ZoneStatus::Ready);
            assert_eq!(ZoneStatus::from_faults(faults), expected, "bits {:05b}", bits);
        }
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ZoneStatus::LowBattery.to_string(), "Low Battery");
        assert_eq!(ZoneStatus::Ready.label(), "Ready");
    }

    #[test]
    fn test_zone_class_tracked_faults() {
        let door = ZoneClass::WiredDoor.tracked_faults();
        assert!(door.contains(FaultFlags::OPEN | FaultFlags::TROUBLE | FaultFlags::ALARM | FaultFlags::BYPASS));
        assert!(!door.contains(FaultFlags::LOW_BATTERY));

        let smoke = ZoneClass::BatterySmoke.tracked_faults();
        assert_eq!(smoke, FaultFlags::TROUBLE | FaultFlags::LOW_BATTERY);

        let motion = ZoneClass::BatteryMotion.tracked_faults();
        assert!(!motion.contains(FaultFlags::OPEN));
        assert!(motion.contains(FaultFlags::LOW_BATTERY | FaultFlags::ALARM));

        assert_eq!(
            ZoneClass::Default.tracked_faults(),
            FaultFlags::TROUBLE | FaultFlags::OPEN
        );
    }

    #[test]
    fn test_zone_class_from_name() {
        assert_eq!(ZoneClass::from_name("battery_window"), Some(ZoneClass::BatteryWindow));
        assert_eq!(ZoneClass::from_name("wired_siren"), Some(ZoneClass::WiredSiren));
        assert_eq!(ZoneClass::from_name("laser"), None);
    }

    #[test]
    fn test_fault_class_flags() {
        let all = FaultClass::ALL
            .iter()
            .fold(FaultFlags::empty(), |acc, class| acc | class.flag());
        assert_eq!(all, FaultFlags::all());
    }
}
