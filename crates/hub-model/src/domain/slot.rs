use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ModelError, PropertySet};

/// Capacity offer a worker advertises to the hub (an "ask plan").
///
/// The client never interprets these fields; they are handed to the hub as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// How long the capacity is offered for, in seconds.
    #[serde(default)]
    pub duration_secs: u64,
    /// Asking price, kept as a decimal string to avoid precision loss.
    #[serde(default)]
    pub price: String,
    pub resources: Resources,
}

/// Resources bundled into a [`Slot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    #[serde(default)]
    pub cpu_cores: u64,
    #[serde(default)]
    pub memory_bytes: u64,
    #[serde(default)]
    pub gpu_count: GpuCount,
    #[serde(default)]
    pub storage_bytes: u64,
    #[serde(default)]
    pub network: NetworkType,
    #[serde(default)]
    pub net_in_bytes: u64,
    #[serde(default)]
    pub net_out_bytes: u64,
    /// Free-form requirements matched against worker properties.
    #[serde(default, skip_serializing_if = "PropertySet::is_empty")]
    pub properties: PropertySet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GpuCount {
    #[default]
    None,
    Single,
    Multiple,
}

impl GpuCount {
    pub fn as_str(&self) -> &'static str {
        match self {
            GpuCount::None => "none",
            GpuCount::Single => "single",
            GpuCount::Multiple => "multiple",
        }
    }
}

impl FromStr for GpuCount {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "no" | "0" => Ok(GpuCount::None),
            "single" | "1" => Ok(GpuCount::Single),
            "multiple" | "many" => Ok(GpuCount::Multiple),
            _ => Err(ModelError::InvalidGpuCount(s.to_string())),
        }
    }
}

impl fmt::Display for GpuCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkType {
    #[default]
    None,
    Outbound,
    Incoming,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::None => "none",
            NetworkType::Outbound => "outbound",
            NetworkType::Incoming => "incoming",
        }
    }
}

impl FromStr for NetworkType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(NetworkType::None),
            "outbound" | "out" => Ok(NetworkType::Outbound),
            "incoming" | "in" => Ok(NetworkType::Incoming),
            _ => Err(ModelError::InvalidNetworkType(s.to_string())),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
