//! Run settings and sync direction.

use std::fmt;
use std::str::FromStr;

use certmeta_core::coerce::DEFAULT_DATE_FORMAT;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Which side is the source of truth for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncMode {
    /// CA order data is written into CLM certificate metadata.
    DcToKf,
    /// CLM certificate metadata is written into CA order custom fields.
    KfToDc,
}

impl SyncMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::DcToKf => "dctokf",
            SyncMode::KfToDc => "kftodc",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned for an unrecognised mode argument.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sync mode '{0}', expected 'dctokf' or 'kftodc'")]
pub struct ParseSyncModeError(pub String);

impl FromStr for SyncMode {
    type Err = ParseSyncModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dctokf" => Ok(SyncMode::DcToKf),
            "kftodc" => Ok(SyncMode::KfToDc),
            _ => Err(ParseSyncModeError(s.to_string())),
        }
    }
}

/// Behaviour switches for a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Certificates are selected by `IssuerDN -contains "<term>"`.
    #[serde(default = "default_issuer_query_term")]
    pub issuer_query_term: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub include_revoked_and_expired: bool,
    /// Build custom fields from the CA catalogue instead of the fields file.
    #[serde(default)]
    pub import_all_custom_fields: bool,
    #[serde(default)]
    pub import_deactivated_fields: bool,
    /// KFtoDC only: create CA custom fields that are missing.
    #[serde(default)]
    pub create_missing_fields_in_ca: bool,
    /// Output format for CLM date fields.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_issuer_query_term() -> String {
    "DigiCert".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            issuer_query_term: default_issuer_query_term(),
            page_size: default_page_size(),
            include_revoked_and_expired: false,
            import_all_custom_fields: false,
            import_deactivated_fields: false,
            create_missing_fields_in_ca: false,
            date_format: default_date_format(),
        }
    }
}

impl SyncSettings {
    pub fn validate(&self) -> SyncResult<()> {
        if self.issuer_query_term.trim().is_empty() {
            return Err(SyncError::Config("sync.issuer_query_term must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(SyncError::Config("sync.page_size must be greater than zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_is_case_insensitive() {
        assert_eq!("DCtoKF".parse::<SyncMode>().unwrap(), SyncMode::DcToKf);
        assert_eq!(" kftodc ".parse::<SyncMode>().unwrap(), SyncMode::KfToDc);
        assert!("both".parse::<SyncMode>().is_err());
        assert_eq!(SyncMode::KfToDc.to_string(), "kftodc");
    }

    #[test]
    fn test_settings_defaults() {
        let settings: SyncSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, SyncSettings::default());
        assert_eq!(settings.issuer_query_term, "DigiCert");
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_validate() {
        assert!(SyncSettings::default().validate().is_ok());
        let zero = SyncSettings {
            page_size: 0,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(SyncError::Config(_))));
        let blank = SyncSettings {
            issuer_query_term: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(blank.validate(), Err(SyncError::Config(_))));
    }
}
