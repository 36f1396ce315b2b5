// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Device models

pub mod area;
pub mod zone;
