use anyhow::Result;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::{ApiClient, OutputFormat, SuccessResponse};
use crate::models::{AccountInfo, LocalConfig};

/// Config show response
#[derive(Debug, Serialize)]
pub struct ConfigShowResponse {
    pub server_url: String,
    #[serde(flatten)]
    pub account: AccountInfo,
}

impl std::fmt::Display for ConfigShowResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hours = &self.account.hours;
        writeln!(f, "Business: {}", self.account.business_name)?;
        writeln!(f, "Email: {}", self.account.email)?;
        writeln!(f, "Server: {}", self.server_url)?;
        writeln!(
            f,
            "Hours: {} - {}, every {} min",
            hours.opening.format("%H:%M"),
            hours.closing.format("%H:%M"),
            hours.slot_minutes
        )?;
        write!(
            f,
            "Webhook URL: {}",
            self.account.webhook_url.as_deref().unwrap_or("not set")
        )
    }
}

/// Show current configuration
pub async fn run_config_show(format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let account: AccountInfo = api.get("/v1/config").await?;

    format.print(&ConfigShowResponse {
        server_url: super::get_server_url(),
        account,
    });
    Ok(())
}

#[derive(Debug, Deserialize)]
struct UpdatedConfig {
    webhook_secret: Option<String>,
}

/// Set or remove the webhook URL
pub async fn run_config_webhook(url: Option<&str>, format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let updated: UpdatedConfig = api
        .patch(
            "/v1/config",
            &serde_json::json!({ "webhook_url": url.unwrap_or_default() }),
        )
        .await?;

    let message = match (url, updated.webhook_secret) {
        (Some(u), Some(secret)) => format!("Webhook URL set to: {}\nSigning secret: {}", u, secret),
        (Some(u), None) => format!("Webhook URL set to: {}", u),
        (None, _) => "Webhook URL removed".to_string(),
    };
    format.print(&SuccessResponse::new(message));
    Ok(())
}

/// Change opening hours and slot length
pub async fn run_config_hours(
    opening: Option<NaiveTime>,
    closing: Option<NaiveTime>,
    slot_minutes: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let api = ApiClient::from_config()?;
    let mut body = serde_json::Map::new();
    if let Some(t) = opening {
        body.insert("opening".into(), t.format("%H:%M").to_string().into());
    }
    if let Some(t) = closing {
        body.insert("closing".into(), t.format("%H:%M").to_string().into());
    }
    if let Some(step) = slot_minutes {
        body.insert("slot_minutes".into(), step.into());
    }
    if body.is_empty() {
        anyhow::bail!("Nothing to change. Pass --open, --close or --step.");
    }

    let account: AccountInfo = api.patch("/v1/config", &body).await?;
    format.print(&SuccessResponse::new(format!(
        "Hours set to {} - {}, every {} min",
        account.hours.opening.format("%H:%M"),
        account.hours.closing.format("%H:%M"),
        account.hours.slot_minutes
    )));
    Ok(())
}

/// Set server URL (local only)
pub fn run_config_server(url: &str, format: OutputFormat) -> Result<()> {
    url::Url::parse(url)?;
    let mut config = LocalConfig::load().unwrap_or_default();
    config.server_url = Some(url.trim_end_matches('/').to_string());
    config.save()?;

    format.print(&SuccessResponse::new(format!("Server URL set to: {}", url)));
    Ok(())
}
