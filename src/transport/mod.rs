// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Panel transports: inbound event listener and outbound command sessions

pub mod listener;
pub mod sender;
