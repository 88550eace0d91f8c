//! Request and response bodies for the scanner REST API

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use strum_macros::{Display, EnumIter, EnumString};

/// Host identifier as written in the target file
pub type Target = String;

/// Scanner-assigned identifier of a registered target
pub type TargetId = String;

/// Remote view of registered targets: address -> target id
pub type RemoteTargetMap = HashMap<Target, TargetId>;

/// Local translation table built during reconciliation
pub type TargetIdentifierMap = HashMap<Target, TargetId>;

/// Target ids with a processing or scheduled scan at snapshot time
pub type RunningScanSet = HashSet<TargetId>;

/// Crawl/attack pacing applied to a target's scans
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ScanSpeed {
    Sequential,
    Slow,
    #[default]
    Moderate,
    Fast,
}

/// Business criticality attached to a target when it is registered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Criticality {
    Critical,
    High,
    #[default]
    Normal,
    Low,
}

impl Criticality {
    /// Numeric level used on the wire
    pub fn level(self) -> u8 {
        match self {
            Criticality::Critical => 30,
            Criticality::High => 20,
            Criticality::Normal => 10,
            Criticality::Low => 0,
        }
    }

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            30 => Some(Criticality::Critical),
            20 => Some(Criticality::High),
            10 => Some(Criticality::Normal),
            0 => Some(Criticality::Low),
            _ => None,
        }
    }
}

// The create endpoint takes the level as a string ("10")
impl Serialize for Criticality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.level().to_string())
    }
}

// Listings report the level as a number; anything unrecognised is dropped
fn lenient_criticality<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Criticality>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(level) => Criticality::from_level(level),
        Raw::Text(text) => text.trim().parse::<i64>().ok().and_then(Criticality::from_level),
        Raw::Other(_) => None,
    })
}

/// A target as the scanner reports it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteTargetRecord {
    pub address: Target,
    pub target_id: TargetId,
    #[serde(default, deserialize_with = "lenient_criticality")]
    pub criticality: Option<Criticality>,
    #[serde(default)]
    pub description: Option<String>,
}

/// `GET targets`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetList {
    #[serde(default)]
    pub targets: Vec<RemoteTargetRecord>,
}

impl TargetList {
    pub fn into_address_map(self) -> RemoteTargetMap {
        self.targets
            .into_iter()
            .map(|record| (record.address, record.target_id))
            .collect()
    }
}

/// `POST targets` body
#[derive(Debug, Clone, Serialize)]
pub struct NewTarget<'a> {
    pub address: &'a str,
    pub description: &'a str,
    pub criticality: Criticality,
}

/// `POST targets` response
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTarget {
    pub target_id: TargetId,
}

/// `PATCH targets/{id}/configuration` body
#[derive(Debug, Clone, Serialize)]
pub struct TargetConfigurationPatch {
    pub scan_speed: ScanSpeed,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanSession {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanRecord {
    pub target_id: TargetId,
    #[serde(default)]
    pub current_session: Option<ScanSession>,
}

impl ScanRecord {
    /// Whether the scanner is currently working on (or about to start) this scan
    pub fn is_active(&self) -> bool {
        self.current_session
            .as_ref()
            .is_some_and(|session| matches!(session.status.as_str(), "processing" | "scheduled"))
    }
}

/// `GET scans`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanList {
    #[serde(default)]
    pub scans: Vec<ScanRecord>,
}

impl ScanList {
    pub fn into_running_set(self) -> RunningScanSet {
        self.scans
            .into_iter()
            .filter(ScanRecord::is_active)
            .map(|scan| scan.target_id)
            .collect()
    }
}

/// Start options for a new scan; the default starts immediately
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSchedule {
    pub disable: bool,
    pub start_date: Option<String>,
    pub time_sensitive: bool,
}

impl ScanSchedule {
    pub fn immediate() -> Self {
        Self {
            disable: false,
            start_date: None,
            time_sensitive: false,
        }
    }
}

/// `POST scans` body
#[derive(Debug, Clone, Serialize)]
pub struct NewScan<'a> {
    pub target_id: &'a str,
    pub profile_id: &'a str,
    pub schedule: ScanSchedule,
}

/// `GET me/stats`
///
/// The count is required; a reply without it cannot be used for admission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageStats {
    pub scans_running_count: u64,
}
