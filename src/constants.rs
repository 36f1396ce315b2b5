// MIT License - Copyright (c) 2026 The dmp-bridge developers
// DMP Serial 3 protocol constants

/// Protocol framing bytes.
pub const STX: u8 = 0x02; // Start of reply record / ACK telegram
pub const ACK: u8 = 0x06; // Acknowledge
pub const CR: u8 = 0x0D; // Telegram terminator
pub const RS: u8 = 0x1E; // Status sub-record separator

/// Remote port the panel accepts command sessions on.
pub const DEFAULT_REMOTE_PORT: u16 = 2001;

/// Port the bridge listens on for panel event telegrams.
pub const DEFAULT_LISTEN_PORT: u16 = 2011;

/// Remote key sent when none is configured. The panel rejects an empty key.
pub const DEFAULT_REMOTE_KEY: &str = "                ";

/// Minimum width of the account field in outbound telegrams.
pub const ACCOUNT_WIDTH: usize = 5;

/// Number of area groups on the panel.
pub const PANEL_AREA_COUNT: u8 = 3;

/// Byte offsets into an inbound event telegram.
pub const ACCOUNT_OFFSET: std::ops::Range<usize> = 7..12;
pub const EVENT_CODE_OFFSET: std::ops::Range<usize> = 19..21;

/// Sentinel suffixes that follow the account field.
pub const CHECKIN_SENTINEL: &str = " s0700240";
pub const TIME_REQUEST_SENTINEL: &str = " S71";

/// Segment markers inside an event telegram.
pub const SEGMENT_ZONE: &str = "\\z";
pub const SEGMENT_AREA: &str = "\\a";
pub const SEGMENT_TYPE: &str = "\\t";
pub const SEGMENT_USER: &str = "\\u";

/// Two-character event codes the bridge acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCode {
    /// Zs
    SystemMessage,
    /// Zd
    LowBattery,
    /// Zx
    Bypass,
    /// Zf
    ZoneFail,
    /// Zh
    ZoneMissing,
    /// Zt
    ZoneTrouble,
    /// Zw
    ZoneSupervisory,
    /// Zy
    Reset,
    /// Zr
    Restore,
    /// Za
    Alarm,
    /// Zb
    ForceAlarm,
    /// Zq
    ArmingStatus,
    /// Zc
    DeviceStatus,
    /// Zj
    DoorAccess,
    /// Zl
    ScheduleChange,
}

impl EventCode {
    /// Parse the two-character code at the event offset.
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "Zs" => Some(Self::SystemMessage),
            "Zd" => Some(Self::LowBattery),
            "Zx" => Some(Self::Bypass),
            "Zf" => Some(Self::ZoneFail),
            "Zh" => Some(Self::ZoneMissing),
            "Zt" => Some(Self::ZoneTrouble),
            "Zw" => Some(Self::ZoneSupervisory),
            "Zy" => Some(Self::Reset),
            "Zr" => Some(Self::Restore),
            "Za" => Some(Self::Alarm),
            "Zb" => Some(Self::ForceAlarm),
            "Zq" => Some(Self::ArmingStatus),
            "Zc" => Some(Self::DeviceStatus),
            "Zj" => Some(Self::DoorAccess),
            "Zl" => Some(Self::ScheduleChange),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemMessage => "Zs",
            Self::LowBattery => "Zd",
            Self::Bypass => "Zx",
            Self::ZoneFail => "Zf",
            Self::ZoneMissing => "Zh",
            Self::ZoneTrouble => "Zt",
            Self::ZoneSupervisory => "Zw",
            Self::Reset => "Zy",
            Self::Restore => "Zr",
            Self::Alarm => "Za",
            Self::ForceAlarm => "Zb",
            Self::ArmingStatus => "Zq",
            Self::DeviceStatus => "Zc",
            Self::DoorAccess => "Zj",
            Self::ScheduleChange => "Zl",
        }
    }

    pub fn description(&self) -> &'static str {
        event_name(self.as_str()).unwrap_or("Unknown Event")
    }
}

impl std::fmt::Display for EventCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.description())
    }
}

/// Display names for event codes, including ones the bridge only logs.
pub const EVENT_NAMES: &[(&str, &str)] = &[
    ("Za", "Zone Alarm"),
    ("Zb", "Zone Force Alarm"),
    ("Zc", "Device Status"),
    ("Zd", "Wireless Zone Low Battery"),
    ("Ze", "Equipment"),
    ("Zf", "Zone Fail"),
    ("Zg", "Holiday"),
    ("Zh", "Wireless Zone Missing"),
    ("Zi", "Zone Test"),
    ("Zj", "Door Access"),
    ("Zk", "Walk Test Verify"),
    ("Zl", "Schedule Change"),
    ("Zq", "Arming Status"),
    ("Zr", "Zone Restore"),
    ("Zs", "System Message"),
    ("Zt", "Zone Trouble"),
    ("Zu", "User Code Change"),
    ("Zw", "Zone Supervisory"),
    ("Zx", "Zone Bypass"),
    ("Zy", "Zone Reset"),
];

/// Display names for the `\t` type qualifier.
pub const TYPE_NAMES: &[(&str, &str)] = &[
    ("BL", "Blank"),
    ("FI", "Fire"),
    ("BU", "Burglary"),
    ("SV", "Supervisory"),
    ("PN", "Panic"),
    ("EM", "Emergency"),
    ("A1", "Auxiliary 1"),
    ("A2", "Auxiliary 2"),
    ("CO", "Carbon Monoxide"),
    ("DA", "Door Access Granted"),
    ("DD", "Door Access Denied"),
    ("DO", "Door Open"),
    ("DC", "Door Closed"),
    ("HO", "Door Held Open"),
    ("FO", "Door Forced Open"),
    ("OP", "Opening"),
    ("CL", "Closing"),
];

fn lookup(table: &'static [(&'static str, &'static str)], code: &str) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

pub fn event_name(code: &str) -> Option<&'static str> {
    lookup(EVENT_NAMES, code)
}

/// Describe an event code, falling back to `Unknown Event <code>`.
pub fn describe_event(code: &str) -> String {
    event_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown Event {}", code))
}

/// Describe a type qualifier, falling back to `Unknown Type <code>`.
pub fn describe_type(code: &str) -> String {
    lookup(TYPE_NAMES, code)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown Type {}", code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_code_roundtrip() {
        for (code, _) in EVENT_NAMES {
            if let Some(parsed) = EventCode::from_code(code) {
                assert_eq!(parsed.as_str(), *code);
            }
        }
        assert_eq!(EventCode::from_code("Zq"), Some(EventCode::ArmingStatus));
        assert_eq!(EventCode::from_code("Ze"), None);
        assert_eq!(EventCode::from_code(""), None);
    }

    #[test]
    fn test_event_code_display() {
        assert_eq!(EventCode::DeviceStatus.to_string(), "Zc (Device Status)");
        assert_eq!(
            EventCode::from_code("Za").map(|e| e.to_string()).as_deref(),
            Some("Za (Zone Alarm)")
        );
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(describe_event("Za"), "Zone Alarm");
        assert_eq!(describe_event("Zb"), "Zone Force Alarm");
        assert_eq!(describe_event("Zc"), "Device Status");
        assert_eq!(describe_event("Q9"), "Unknown Event Q9");
        assert_eq!(describe_type("BL"), "Blank");
        assert_eq!(describe_type("FI"), "Fire");
        assert_eq!(describe_type("DA"), "Door Access Granted");
        assert_eq!(describe_type("XX"), "Unknown Type XX");
        assert_eq!(EventCode::Alarm.description(), "Zone Alarm");
    }
}
