use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::timeslot::hhmm;

/// Opening hours and slot granularity of a business
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    #[serde(with = "hhmm")]
    pub opening: NaiveTime,
    #[serde(with = "hhmm")]
    pub closing: NaiveTime,
    pub slot_minutes: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            opening: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            closing: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            slot_minutes: 30,
        }
    }
}

impl BusinessHours {
    pub fn validate(&self) -> Result<(), String> {
        if self.closing <= self.opening {
            return Err("Closing time must be after opening time".to_string());
        }
        if self.slot_minutes == 0 || self.slot_minutes > 240 {
            return Err("Slot length must be between 1 and 240 minutes".to_string());
        }
        Ok(())
    }
}

/// A salon account. Every client, service, staff member and appointment belongs to one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub business_name: String,
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub webhook_url: Option<String>,
    #[serde(skip_serializing)]
    pub webhook_secret: Option<String>,
    pub hours: BusinessHours,
    pub created_at: i64,
}

/// Account info returned by API (excludes sensitive fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    pub email: String,
    pub business_name: String,
    pub webhook_url: Option<String>,
    pub hours: BusinessHours,
    pub created_at: i64,
}

impl From<Account> for AccountInfo {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            business_name: account.business_name,
            webhook_url: account.webhook_url,
            hours: account.hours,
            created_at: account.created_at,
        }
    }
}

/// Configuration stored locally on the CLI
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocalConfig {
    pub api_key: Option<String>,
    pub server_url: Option<String>,
    pub email: Option<String>,
    pub account_id: Option<String>,
}

impl LocalConfig {
    pub fn config_path() -> std::path::PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        std::path::PathBuf::from(home)
            .join(".config")
            .join("salond")
            .join("config.json")
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_hours_validation() {
        assert!(BusinessHours::default().validate().is_ok());

        let inverted = BusinessHours {
            opening: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            closing: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            slot_minutes: 30,
        };
        assert!(inverted.validate().is_err());

        let zero_step = BusinessHours {
            slot_minutes: 0,
            ..BusinessHours::default()
        };
        assert!(zero_step.validate().is_err());
    }

    #[test]
    fn test_local_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert!(LocalConfig::load_from(&path).unwrap().api_key.is_none());

        let config = LocalConfig {
            api_key: Some("sk_test".to_string()),
            server_url: Some("http://localhost:8080".to_string()),
            email: Some("owner@salon.test".to_string()),
            account_id: None,
        };
        config.save_to(&path).unwrap();

        let loaded = LocalConfig::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("sk_test"));
        assert_eq!(loaded.email.as_deref(), Some("owner@salon.test"));
    }
}
