//! Built-in scan profiles shipped with the scanner

use crate::core::validation::{is_identifier, ValidationError};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ScanProfile {
    Full,
    HighRisk,
    SqlInjection,
    WeakPasswords,
    Xss,
    CrawlOnly,
    HighMediumRisk,
    Malware,
}

impl ScanProfile {
    pub fn id(self) -> &'static str {
        match self {
            ScanProfile::Full => "11111111-1111-1111-1111-111111111111",
            ScanProfile::HighRisk => "11111111-1111-1111-1111-111111111112",
            ScanProfile::SqlInjection => "11111111-1111-1111-1111-111111111113",
            ScanProfile::WeakPasswords => "11111111-1111-1111-1111-111111111115",
            ScanProfile::Xss => "11111111-1111-1111-1111-111111111116",
            ScanProfile::CrawlOnly => "11111111-1111-1111-1111-111111111117",
            ScanProfile::HighMediumRisk => "11111111-1111-1111-1111-111111111119",
            ScanProfile::Malware => "11111111-1111-1111-1111-111111111120",
        }
    }
}

/// Turn a profile name or raw identifier into the identifier the API expects
pub fn resolve_profile(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if let Ok(profile) = value.parse::<ScanProfile>() {
        return Ok(profile.id().to_string());
    }
    if is_identifier(value) {
        return Ok(value.to_ascii_lowercase());
    }

    let names: Vec<String> = ScanProfile::iter().map(|p| p.to_string()).collect();
    Err(ValidationError::new(format!(
        "Unknown scan profile '{}'. Use a profile identifier or one of: {}",
        value,
        names.join(", ")
    )))
}
