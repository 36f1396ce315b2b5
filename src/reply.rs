// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Decoding of remote-session replies

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::{RS, STX};
use crate::decoder::area_id;

/// Acknowledgement of an arm, disarm or bypass command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandReply {
    /// `+`
    Ack,
    /// `-`
    Nak,
    /// Any other acknowledgement character.
    Other(char),
}

impl CommandReply {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => CommandReply::Ack,
            '-' => CommandReply::Nak,
            other => CommandReply::Other(other),
        }
    }

    pub fn is_ack(&self) -> bool {
        *self == CommandReply::Ack
    }
}

/// Area status code in a status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AreaReplyStatus {
    Armed,
    Disarmed,
    Unknown(char),
}

impl AreaReplyStatus {
    pub fn from_code(c: char) -> Self {
        match c {
            'A' => Self::Armed,
            'D' => Self::Disarmed,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for AreaReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Armed => f.write_str("Armed"),
            Self::Disarmed => f.write_str("Disarmed"),
            Self::Unknown(c) => write!(f, "Unknown ({})", c),
        }
    }
}

/// Zone status code in a status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZoneReplyStatus {
    Normal,
    Open,
    Short,
    Bypassed,
    LowBattery,
    Missing,
    Unknown(char),
}

impl ZoneReplyStatus {
    pub fn from_code(c: char) -> Self {
        match c {
            'N' => Self::Normal,
            'O' => Self::Open,
            'S' => Self::Short,
            'X' => Self::Bypassed,
            'L' => Self::LowBattery,
            'M' => Self::Missing,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ZoneReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("Normal"),
            Self::Open => f.write_str("Open"),
            Self::Short => f.write_str("Short"),
            Self::Bypassed => f.write_str("Bypassed"),
            Self::LowBattery => f.write_str("Low Battery"),
            Self::Missing => f.write_str("Missing"),
            Self::Unknown(c) => write!(f, "Unknown ({})", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaReport {
    pub status: AreaReplyStatus,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneReport {
    pub status: ZoneReplyStatus,
    pub name: String,
}

/// Areas and zones reported by a status poll, keyed by number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub areas: BTreeMap<String, AreaReport>,
    pub zones: BTreeMap<String, ZoneReport>,
}

impl StatusReport {
    /// Flat attribute list: `Areas:` header, one `Area: NN - Name` entry per
    /// area, `Zones:` header, one `Zone: NNN - Name` entry per zone.
    pub fn attributes(&self) -> Vec<(String, String)> {
        let mut attrs = Vec::with_capacity(self.areas.len() + self.zones.len() + 2);
        attrs.push(("Areas:".to_string(), String::new()));
        for (number, area) in &self.areas {
            attrs.push((format!("Area: {} - {}", number, area.name), area.status.to_string()));
        }
        attrs.push(("Zones:".to_string(), String::new()));
        for (number, zone) in &self.zones {
            attrs.push((format!("Zone: {} - {}", number, zone.name), zone.status.to_string()));
        }
        attrs
    }
}

/// Classification of one STX-delimited reply record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyRecord<'a> {
    /// Acknowledgement of `!V2` / `!V0`.
    Session,
    /// Acknowledgement of an arm, disarm or bypass command.
    Command(CommandReply),
    /// Status body following the `WB` marker.
    Status(&'a str),
    Unknown(&'a str),
}

const ACK_CHAR_OFFSET: usize = 7;
const MARKER_OFFSET: std::ops::Range<usize> = 8..10;

/// Classify a single record (without its leading STX).
pub fn classify_record(record: &str) -> ReplyRecord<'_> {
    let marker = record.get(MARKER_OFFSET).unwrap_or("");
    if marker == "WB" {
        return ReplyRecord::Status(record.get(MARKER_OFFSET.end..).unwrap_or(""));
    }
    if marker.contains('V') {
        return ReplyRecord::Session;
    }
    if marker.contains(['C', 'O', 'X', 'Y']) {
        if let Some(c) = record.get(ACK_CHAR_OFFSET..).and_then(|r| r.chars().next()) {
            return ReplyRecord::Command(CommandReply::from_char(c));
        }
    }
    ReplyRecord::Unknown(record)
}

fn records(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(STX as char).filter(|r| !r.trim().is_empty())
}

/// Find the command acknowledgement in a session reply.
pub fn decode_command_reply(raw: &[u8]) -> Option<CommandReply> {
    let text = String::from_utf8_lossy(raw);
    let mut reply = None;
    for record in records(&text) {
        match classify_record(record) {
            ReplyRecord::Command(r) => {
                debug!("Command reply: {:?}", r);
                reply = Some(r);
            }
            ReplyRecord::Session => {}
            ReplyRecord::Status(_) => debug!("Status record in command reply ignored"),
            ReplyRecord::Unknown(r) => warn!("Unrecognized reply record: {:?}", r),
        }
    }
    reply
}

/// Decode every status record in a session reply.
pub fn decode_status(raw: &[u8]) -> StatusReport {
    let text = String::from_utf8_lossy(raw);
    let mut report = StatusReport::default();
    for record in records(&text) {
        match classify_record(record) {
            ReplyRecord::Status(body) => decode_status_body(body, &mut report),
            ReplyRecord::Session | ReplyRecord::Command(_) => {}
            ReplyRecord::Unknown(r) => warn!("Unrecognized reply record: {:?}", r),
        }
    }
    report
}

/// Decode the RS-separated sub-records of one status body into `report`.
///
/// Each sub-record is a class tag (`A` area, `L` zone), a three-digit
/// number, a status code and a name. A sub-record starting with `-` ends
/// the body.
pub fn decode_status_body(body: &str, report: &mut StatusReport) {
    for sub in body.split(RS as char) {
        if sub.starts_with('-') {
            break;
        }
        let sub = sub.trim_start_matches(['\r', '\n']);
        if sub.is_empty() {
            continue;
        }
        let (Some(number), Some(code)) = (sub.get(1..4), sub.get(4..5).and_then(|c| c.chars().next()))
        else {
            warn!("Short status record skipped: {:?}", sub);
            continue;
        };
        let name = sub.get(5..).unwrap_or("").trim().to_string();
        match sub.chars().next() {
            Some('A') => {
                report.areas.insert(
                    area_id(number).to_string(),
                    AreaReport {
                        status: AreaReplyStatus::from_code(code),
                        name,
                    },
                );
            }
            Some('L') => {
                report.zones.insert(
                    number.to_string(),
                    ZoneReport {
                        status: ZoneReplyStatus::from_code(code),
                        name,
                    },
                );
            }
            _ => warn!("Unrecognized status record skipped: {:?}", sub),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ack: char, marker: &str, body: &str) -> String {
        format!("\x02@ 12345{}{}{}", ack, marker, body)
    }

    #[test]
    fn test_decode_status_body() {
        let mut report = StatusReport::default();
        decode_status_body("A001DHome\x1eL002OZone2\x1e-\r", &mut report);
        assert_eq!(report.areas.len(), 1);
        assert_eq!(
            report.areas["01"],
            AreaReport {
                status: AreaReplyStatus::Disarmed,
                name: "Home".into()
            }
        );
        assert_eq!(report.areas["01"].status.to_string(), "Disarmed");
        assert_eq!(report.zones.len(), 1);
        assert_eq!(
            report.zones["002"],
            ZoneReport {
                status: ZoneReplyStatus::Open,
                name: "Zone2".into()
            }
        );
        assert_eq!(report.zones["002"].status.to_string(), "Open");
    }

    #[test]
    fn test_status_labels() {
        let labels: Vec<String> = "NOSXLM"
            .chars()
            .map(|c| ZoneReplyStatus::from_code(c).to_string())
            .collect();
        assert_eq!(
            labels,
            vec!["Normal", "Open", "Short", "Bypassed", "Low Battery", "Missing"]
        );
        assert_eq!(AreaReplyStatus::from_code('A').to_string(), "Armed");
        assert_eq!(AreaReplyStatus::from_code('Q'), AreaReplyStatus::Unknown('Q'));
    }

    #[test]
    fn test_decode_status_skips_bad_sub_records() {
        let mut report = StatusReport::default();
        decode_status_body("Q001XJunk\x1eL0\x1eL003NHall\x1e-\rL004OAfter", &mut report);
        assert!(report.areas.is_empty());
        assert_eq!(report.zones.len(), 1);
        assert_eq!(report.zones["003"].status, ZoneReplyStatus::Normal);
    }

    #[test]
    fn test_decode_status_multiple_records() {
        let raw = [
            record('+', "!V", "\r"),
            record(' ', "WB", "A001DHome\x1eL001NDoor\x1eL002OZone2\x1e-\r"),
            record(' ', "WB", "A002AGarage\x1eL010MMotion\x1e-\r"),
            record('+', "zz", ""),
            record('+', "!V", "\r"),
        ]
        .concat();
        let report = decode_status(raw.as_bytes());
        assert_eq!(report.areas.len(), 2);
        assert_eq!(report.areas["02"].status, AreaReplyStatus::Armed);
        assert_eq!(report.zones.len(), 3);
        assert_eq!(report.zones["010"].status, ZoneReplyStatus::Missing);
        assert_eq!(report.zones["001"].name, "Door");
    }

    #[test]
    fn test_decode_command_reply() {
        let ack = [record('+', "!V", "\r"), record('+', "!C", "\r"), record('+', "!V", "\r")].concat();
        assert_eq!(decode_command_reply(ack.as_bytes()), Some(CommandReply::Ack));

        let nak = [record('+', "!V", "\r"), record('-', "!O", "\r")].concat();
        assert_eq!(decode_command_reply(nak.as_bytes()), Some(CommandReply::Nak));

        let bypass = record('+', "!X", "\r");
        assert!(decode_command_reply(bypass.as_bytes()).unwrap().is_ack());

        let session_only = record('+', "!V", "\r");
        assert_eq!(decode_command_reply(session_only.as_bytes()), None);
        assert_eq!(decode_command_reply(b""), None);
    }

    #[test]
    fn test_classify_short_record() {
        assert_eq!(classify_record("abc"), ReplyRecord::Unknown("abc"));
    }

    #[test]
    fn test_attributes() {
        let mut report = StatusReport::default();
        decode_status_body("A001AMain\x1eL001ODoor\x1e-\r", &mut report);
        assert_eq!(
            report.attributes(),
            vec![
                ("Areas:".to_string(), String::new()),
                ("Area: 01 - Main".to_string(), "Armed".to_string()),
                ("Zones:".to_string(), String::new()),
                ("Zone: 001 - Door".to_string(), "Open".to_string()),
            ]
        );
    }
}
