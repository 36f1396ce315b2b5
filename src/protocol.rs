// MIT License - Copyright (c) 2026 The dmp-bridge developers
// DMP remote command telegrams and inbound frame fields

use crate::constants::{
    ACCOUNT_OFFSET, ACCOUNT_WIDTH, ACK, CHECKIN_SENTINEL, CR, EVENT_CODE_OFFSET, STX,
    TIME_REQUEST_SENTINEL,
};

/// Commands sent to the panel's remote port.
///
/// # Session
///
/// Every session is a single transaction:
///
/// ```text
/// @<acct>!V2<remote key>\r     authenticate
/// @<acct><command>\r           one or more commands
/// @<acct>!V0\r                 drop
/// ```
///
/// The panel answers once the write side is closed. Each reply record
/// starts with STX, see [`crate::reply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!V2<key>`: Authenticate with the remote key.
    Auth { remote_key: String },
    /// `!V0`: Drop the session.
    Drop,
    /// `!C<areas>,YN<Y|N>`: Arm the listed areas, optionally instant.
    Arm { areas: String, instant: bool },
    /// `!O<areas>,`: Disarm the listed areas.
    Disarm { areas: String },
    /// `!X<zone>`: Bypass a zone.
    Bypass { zone: String },
    /// `!Y<zone>`: Reset (un-bypass) a zone.
    Reset { zone: String },
    /// `?WB**Y001`: First page of area and zone status.
    StatusFirst,
    /// `?WB`: Next page of status.
    StatusNext,
}

impl Command {
    /// Bypass (`enable = true`) or reset a zone.
    pub fn set_bypass(zone: &str, enable: bool) -> Self {
        let zone = pad_zone(zone);
        if enable {
            Command::Bypass { zone }
        } else {
            Command::Reset { zone }
        }
    }

    /// Build the command portion of the telegram (without `@<acct>` or CR).
    pub fn to_wire_string(&self) -> String {
        match self {
            Command::Auth { remote_key } => format!("!V2{}", remote_key),
            Command::Drop => "!V0".to_string(),
            Command::Arm { areas, instant } => {
                format!("!C{},YN{}", areas, if *instant { 'Y' } else { 'N' })
            }
            Command::Disarm { areas } => format!("!O{},", areas),
            Command::Bypass { zone } => format!("!X{}", zone),
            Command::Reset { zone } => format!("!Y{}", zone),
            Command::StatusFirst => "?WB**Y001".to_string(),
            Command::StatusNext => "?WB".to_string(),
        }
    }

    /// Full telegram bytes for the given (already padded) account.
    pub fn to_telegram(&self, padded_account: &str) -> Vec<u8> {
        format!("@{}{}\r", padded_account, self.to_wire_string()).into_bytes()
    }
}

/// Left-pad an account number with spaces to the wire width. Longer values are kept whole.
pub fn pad_account(account: &str) -> String {
    format!("{:>width$}", account, width = ACCOUNT_WIDTH)
}

/// Zero-pad a zone number to three digits.
pub fn pad_zone(zone: &str) -> String {
    format!("{:0>3}", zone.trim())
}

/// Telegram acknowledging an inbound event frame.
pub fn ack_telegram(account: &str) -> Vec<u8> {
    let mut ack = Vec::with_capacity(account.len() + 3);
    ack.push(STX);
    ack.extend_from_slice(account.as_bytes());
    ack.push(ACK);
    ack.push(CR);
    ack
}

/// Raw (untrimmed) account field of an inbound frame.
pub fn frame_account(frame: &str) -> &str {
    frame.get(ACCOUNT_OFFSET).unwrap_or("")
}

/// Two-character event code of an inbound frame.
pub fn frame_event_code(frame: &str) -> &str {
    frame.get(EVENT_CODE_OFFSET).unwrap_or("")
}

/// What an inbound frame carries, before event decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind<'a> {
    /// Periodic checkin heartbeat.
    Checkin,
    /// Panel asking for the time.
    TimeRequest,
    /// Event telegram with its two-character code.
    Event(&'a str),
}

/// Classify a frame given its raw account field.
pub fn classify_frame<'a>(frame: &'a str, raw_account: &str) -> FrameKind<'a> {
    if frame.contains(&format!("{}{}", raw_account, CHECKIN_SENTINEL)) {
        FrameKind::Checkin
    } else if frame.contains(&format!("{}{}", raw_account, TIME_REQUEST_SENTINEL)) {
        FrameKind::TimeRequest
    } else {
        FrameKind::Event(frame_event_code(frame))
    }
}
