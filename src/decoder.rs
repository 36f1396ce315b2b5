// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Event telegram decoding

use tracing::{debug, warn};

use crate::constants::{describe_type, EventCode, SEGMENT_TYPE};
use crate::devices::area::AreaState;
use crate::devices::zone::FaultClass;
use crate::protocol::pad_zone;
use crate::segment::{area_field, extract_segment, type_qualifier, zone_field};

/// A single state change produced by an event telegram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateDelta {
    /// Set or clear one fault class on a zone.
    Zone {
        class: FaultClass,
        zone: String,
        /// Name carried by the telegram, if any
        name: Option<String>,
        faulted: bool,
    },
    /// Replace the area state.
    Area {
        name: Option<String>,
        state: AreaState,
    },
}

/// Result of decoding one event telegram.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub deltas: Vec<StateDelta>,
    /// The panel was disarmed; fault flags should be re-read from the panel.
    pub refresh_status: bool,
}

impl Decoded {
    fn none() -> Self {
        Self::default()
    }

    fn with(deltas: Vec<StateDelta>) -> Self {
        Self {
            deltas,
            refresh_status: false,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn zone_delta(class: FaultClass, frame: &str, faulted: bool) -> Decoded {
    let (zone, name) = zone_field(frame);
    if zone.is_empty() {
        debug!("{} event without zone segment, ignoring", class.as_str());
        return Decoded::none();
    }
    Decoded::with(vec![StateDelta::Zone {
        class,
        zone: pad_zone(zone),
        name: non_empty(name),
        faulted,
    }])
}

fn clear_zone(frame: &str) -> Decoded {
    let (zone, name) = zone_field(frame);
    if zone.is_empty() {
        return Decoded::none();
    }
    let zone = pad_zone(zone);
    let deltas = [
        FaultClass::Bypass,
        FaultClass::Trouble,
        FaultClass::Battery,
        FaultClass::Alarm,
    ]
    .into_iter()
    .map(|class| StateDelta::Zone {
        class,
        zone: zone.clone(),
        name: non_empty(name),
        faulted: false,
    })
    .collect();
    Decoded::with(deltas)
}

/// Decode a telegram whose two-character code is `code`.
///
/// Unknown codes decode to no change. `home_area` is the area id (without
/// its class digit) that arms as "home" rather than "away".
pub fn decode_event(code: &str, frame: &str, home_area: &str) -> Decoded {
    match EventCode::from_code(code) {
        Some(event) => decode(event, frame, home_area),
        None => {
            warn!("Unknown event code '{}' in frame: {}", code, frame);
            Decoded::none()
        }
    }
}

/// Map a known event code and its telegram to state deltas.
pub fn decode(code: EventCode, frame: &str, home_area: &str) -> Decoded {
    match code {
        EventCode::SystemMessage => {
            let system_code = extract_segment(SEGMENT_TYPE, frame);
            debug!("System message: {}", describe_type(system_code));
            Decoded::none()
        }
        EventCode::LowBattery => zone_delta(FaultClass::Battery, frame, true),
        EventCode::Bypass => zone_delta(FaultClass::Bypass, frame, true),
        EventCode::ZoneFail
        | EventCode::ZoneMissing
        | EventCode::ZoneTrouble
        | EventCode::ZoneSupervisory => zone_delta(FaultClass::Trouble, frame, true),
        EventCode::Reset | EventCode::Restore => clear_zone(frame),
        EventCode::Alarm | EventCode::ForceAlarm => {
            let (_, area_name) = area_field(frame);
            let (zone, zone_name) = zone_field(frame);
            debug!(
                "{}: {} zone {} {}",
                code,
                describe_type(type_qualifier(frame)),
                zone,
                zone_name
            );
            Decoded::with(vec![StateDelta::Area {
                name: non_empty(area_name),
                state: AreaState::Triggered,
            }])
        }
        EventCode::ArmingStatus => decode_arming(frame, home_area),
        EventCode::DeviceStatus => match type_qualifier(frame) {
            "DO" | "HO" | "FO" => zone_delta(FaultClass::OpenClose, frame, true),
            "DC" => zone_delta(FaultClass::OpenClose, frame, false),
            other => {
                debug!("Device status {} ignored", describe_type(other));
                Decoded::none()
            }
        },
        EventCode::DoorAccess | EventCode::ScheduleChange => Decoded::none(),
    }
}

fn decode_arming(frame: &str, home_area: &str) -> Decoded {
    let (area_number, area_name) = area_field(frame);
    match type_qualifier(frame) {
        "OP" => Decoded {
            deltas: vec![StateDelta::Area {
                name: non_empty(area_name),
                state: AreaState::Disarmed,
            }],
            refresh_status: true,
        },
        "CL" => {
            if area_number.is_empty() {
                debug!("Arming event without area segment, ignoring");
                return Decoded::none();
            }
            let state = if area_id(area_number) == home_area {
                AreaState::ArmedHome
            } else {
                AreaState::ArmedAway
            };
            Decoded::with(vec![StateDelta::Area {
                name: non_empty(area_name),
                state,
            }])
        }
        other => {
            debug!("Arming qualifier '{}' ignored", other);
            Decoded::none()
        }
    }
}

/// Area number with its leading class digit removed (`001` → `01`).
pub fn area_id(area_number: &str) -> &str {
    let mut chars = area_number.chars();
    chars.next();
    chars.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(code: &str, zone: &str, area: &str, qualifier: &str) -> String {
        format!(
            "AAAAAAA123450000000{}XXX\\z{}\\\\a{}\\\\t{}\\",
            code, zone, area, qualifier
        )
    }

    #[test]
    fn test_arming_open_disarms_and_refreshes() {
        let f = frame("Zq", "", "001\"Main", "SOP");
        let decoded = decode_event("Zq", &f, "01");
        assert!(decoded.refresh_status);
        assert_eq!(
            decoded.deltas,
            vec![StateDelta::Area {
                name: Some("Main".into()),
                state: AreaState::Disarmed
            }]
        );
    }

    #[test]
    fn test_arming_close_home_and_away() {
        let home = decode_event("Zq", &frame("Zq", "", "001\"Main", "SCL"), "01");
        assert!(!home.refresh_status);
        assert_eq!(
            home.deltas,
            vec![StateDelta::Area {
                name: Some("Main".into()),
                state: AreaState::ArmedHome
            }]
        );

        let away = decode_event("Zq", &frame("Zq", "", "002\"Perimeter", "SCL"), "01");
        assert_eq!(
            away.deltas,
            vec![StateDelta::Area {
                name: Some("Perimeter".into()),
                state: AreaState::ArmedAway
            }]
        );
    }

    #[test]
    fn test_alarm_triggers_area() {
        let f = frame("Za", "005\"Zone5", "001\"Main", "SAA");
        let decoded = decode_event("Za", &f, "01");
        assert_eq!(
            decoded.deltas,
            vec![StateDelta::Area {
                name: Some("Main".into()),
                state: AreaState::Triggered
            }]
        );
        let forced = decode_event("Zb", &frame("Zb", "005\"Zone5", "001\"Main", "SAA"), "01");
        assert_eq!(forced.deltas, decoded.deltas);
    }

    #[test]
    fn test_short_zone_numbers_are_padded() {
        let open = decode_event("Zc", &frame("Zc", "5\"Zone5", "", "ADO"), "01");
        assert_eq!(
            open.deltas,
            vec![StateDelta::Zone {
                class: FaultClass::OpenClose,
                zone: "005".into(),
                name: Some("Zone5".into()),
                faulted: true
            }]
        );

        let restore = decode_event("Zr", &frame("Zr", "12\"Hall", "", "B"), "01");
        assert_eq!(restore.deltas.len(), 4);
        assert!(restore
            .deltas
            .iter()
            .all(|d| matches!(d, StateDelta::Zone { zone, .. } if zone == "012")));
    }

    #[test]
    fn test_device_status() {
        for q in ["ADO", "AHO", "AFO"] {
            let decoded = decode_event("Zc", &frame("Zc", "005\"Zone5", "", q), "01");
            assert_eq!(
                decoded.deltas,
                vec![StateDelta::Zone {
                    class: FaultClass::OpenClose,
                    zone: "005".into(),
                    name: Some("Zone5".into()),
                    faulted: true
                }],
                "qualifier {}",
                q
            );
        }
        let closed = decode_event("Zc", &frame("Zc", "005\"Zone5", "", "ADC"), "01");
        assert_eq!(
            closed.deltas,
            vec![StateDelta::Zone {
                class: FaultClass::OpenClose,
                zone: "005".into(),
                name: Some("Zone5".into()),
                faulted: false
            }]
        );
        let other = decode_event("Zc", &frame("Zc", "005\"Zone5", "", "ADA"), "01");
        assert!(other.deltas.is_empty());
    }

    #[test]
    fn test_trouble_variants_route_to_trouble() {
        for code in ["Zf", "Zh", "Zt", "Zw"] {
            let decoded = decode_event(code, &frame(code, "007\"Hall", "", "B"), "01");
            assert_eq!(decoded.deltas.len(), 1);
            match &decoded.deltas[0] {
                StateDelta::Zone { class, zone, faulted, .. } => {
                    assert_eq!(*class, FaultClass::Trouble, "code {}", code);
                    assert_eq!(zone, "007");
                    assert!(*faulted);
                }
                other => panic!("unexpected delta {:?}", other),
            }
        }
    }

    #[test]
    fn test_battery_and_bypass() {
        let battery = decode_event("Zd", &frame("Zd", "003\"Window", "", "B"), "01");
        assert!(matches!(
            battery.deltas.as_slice(),
            [StateDelta::Zone { class: FaultClass::Battery, faulted: true, .. }]
        ));
        let bypass = decode_event("Zx", &frame("Zx", "003\"Window", "", "B"), "01");
        assert!(matches!(
            bypass.deltas.as_slice(),
            [StateDelta::Zone { class: FaultClass::Bypass, faulted: true, .. }]
        ));
    }

    #[test]
    fn test_reset_and_restore_clear_flags() {
        for code in ["Zy", "Zr"] {
            let decoded = decode_event(code, &frame(code, "003\"Window", "", "B"), "01");
            let classes: Vec<FaultClass> = decoded
                .deltas
                .iter()
                .map(|d| match d {
                    StateDelta::Zone { class, faulted, .. } => {
                        assert!(!faulted);
                        *class
                    }
                    other => panic!("unexpected delta {:?}", other),
                })
                .collect();
            assert_eq!(
                classes,
                vec![
                    FaultClass::Bypass,
                    FaultClass::Trouble,
                    FaultClass::Battery,
                    FaultClass::Alarm
                ]
            );
        }
    }

    #[test]
    fn test_ignored_and_unknown_codes() {
        for code in ["Zs", "Zj", "Zl", "Qq", ""] {
            let decoded = decode_event(code, &frame(code, "003\"Window", "001\"Main", "SOP"), "01");
            assert_eq!(decoded, Decoded::default(), "code {:?}", code);
        }
    }

    #[test]
    fn test_malformed_frames_are_noops() {
        assert_eq!(decode_event("Zd", "garbage", "01"), Decoded::default());
        assert_eq!(decode_event("Zc", "AAAAAAA123450000000Zc", "01"), Decoded::default());
        assert_eq!(
            decode_event("Zq", "AAAAAAA123450000000Zq\\tSCL\\", "01"),
            Decoded::default()
        );
    }

    #[test]
    fn test_area_id() {
        assert_eq!(area_id("001"), "01");
        assert_eq!(area_id("1"), "");
        assert_eq!(area_id(""), "");
    }
}
