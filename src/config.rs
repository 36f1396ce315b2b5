// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Listener and panel configuration

use crate::constants::{DEFAULT_LISTEN_PORT, DEFAULT_REMOTE_KEY, DEFAULT_REMOTE_PORT, PANEL_AREA_COUNT};
use crate::devices::zone::ZoneClass;
use crate::error::{DmpError, Result};
use crate::protocol::pad_zone;

/// Configuration for the inbound event listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Address to bind (default: 0.0.0.0)
    pub bind_ip: String,
    /// Port panels send event telegrams to (default: 2011)
    pub listen_port: u16,
    /// Bytes read per frame (default: 2048)
    pub read_buffer_size: usize,
    /// Capacity of the bridge event broadcast channel
    pub event_capacity: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_ip: "0.0.0.0".to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            read_buffer_size: 2048,
            event_capacity: 256,
        }
    }
}

impl ListenerConfig {
    pub fn builder() -> ListenerConfigBuilder {
        ListenerConfigBuilder::default()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_ip, self.listen_port)
    }
}

/// Builder for ListenerConfig.
#[derive(Debug, Clone, Default)]
pub struct ListenerConfigBuilder {
    config: ListenerConfig,
}

impl ListenerConfigBuilder {
    pub fn bind_ip(mut self, ip: impl Into<String>) -> Self {
        self.config.bind_ip = ip.into();
        self
    }

    pub fn listen_port(mut self, port: u16) -> Self {
        self.config.listen_port = port;
        self
    }

    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn build(self) -> ListenerConfig {
        self.config
    }
}

/// A configured zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneConfig {
    /// Zone number, zero-padded to three digits
    pub number: String,
    pub name: String,
    pub class: ZoneClass,
}

impl ZoneConfig {
    pub fn new(number: &str, name: impl Into<String>, class: ZoneClass) -> Self {
        Self {
            number: pad_zone(number),
            name: name.into(),
            class,
        }
    }
}

/// Configuration for one DMP panel.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Display name; the area is named "<name> Arming Control" until the panel reports one
    pub name: String,
    /// Account number, unpadded (lookup key for inbound telegrams)
    pub account_number: String,
    /// Panel IP address
    pub panel_ip: String,
    /// Panel remote command port (default: 2001)
    pub remote_port: u16,
    /// Remote key (default: 16 spaces)
    pub remote_key: String,
    /// Area id that arms as "home" (default: "01")
    pub home_area: String,
    /// Number of area groups (default: 3)
    pub area_count: u8,
    /// Pause after each telegram written in a command session (default: 300)
    pub command_delay_ms: u64,
    /// Connect and reply timeout for command sessions (default: 10000)
    pub socket_timeout_ms: u64,
    /// Zones registered at startup
    pub zones: Vec<ZoneConfig>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            name: "DMP Panel".to_string(),
            account_number: String::new(),
            panel_ip: "192.168.0.100".to_string(),
            remote_port: DEFAULT_REMOTE_PORT,
            remote_key: DEFAULT_REMOTE_KEY.to_string(),
            home_area: "01".to_string(),
            area_count: PANEL_AREA_COUNT,
            command_delay_ms: 300,
            socket_timeout_ms: 10000,
            zones: Vec::new(),
        }
    }
}

impl PanelConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder::default()
    }

    /// Area list addressing every area group, e.g. `010203`.
    pub fn all_areas(&self) -> String {
        (1..=self.area_count).map(|n| format!("{:02}", n)).collect()
    }

    /// Name of the area before the panel reports one.
    pub fn area_name(&self) -> String {
        format!("{} Arming Control", self.name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.account_number.is_empty() {
            return Err(DmpError::InvalidConfig {
                reason: "account number is empty".to_string(),
            });
        }
        if !self.account_number.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DmpError::InvalidConfig {
                reason: format!("account number '{}' is not alphanumeric", self.account_number),
            });
        }
        if self.area_count == 0 {
            return Err(DmpError::InvalidConfig {
                reason: "area count must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for PanelConfig.
#[derive(Debug, Clone, Default)]
pub struct PanelConfigBuilder {
    config: PanelConfig,
}

impl PanelConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn account_number(mut self, account: impl Into<String>) -> Self {
        self.config.account_number = account.into().trim().to_string();
        self
    }

    pub fn panel_ip(mut self, ip: impl Into<String>) -> Self {
        self.config.panel_ip = ip.into();
        self
    }

    pub fn remote_port(mut self, port: u16) -> Self {
        self.config.remote_port = port;
        self
    }

    /// An empty key keeps the blank default.
    pub fn remote_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.is_empty() {
            self.config.remote_key = key;
        }
        self
    }

    pub fn home_area(mut self, area: impl Into<String>) -> Self {
        self.config.home_area = area.into();
        self
    }

    pub fn area_count(mut self, count: u8) -> Self {
        self.config.area_count = count;
        self
    }

    pub fn command_delay_ms(mut self, ms: u64) -> Self {
        self.config.command_delay_ms = ms;
        self
    }

    pub fn socket_timeout_ms(mut self, ms: u64) -> Self {
        self.config.socket_timeout_ms = ms;
        self
    }

    pub fn zone(mut self, number: &str, name: impl Into<String>, class: ZoneClass) -> Self {
        self.config.zones.push(ZoneConfig::new(number, name, class));
        self
    }

    pub fn zones(mut self, zones: Vec<ZoneConfig>) -> Self {
        self.config.zones = zones;
        self
    }

    pub fn build(self) -> PanelConfig {
        self.config
    }
}
