use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{get_http_client, OutputFormat, SuccessResponse};
use crate::models::LocalConfig;

/// Response from the register command
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub account_id: String,
    pub api_key: String,
    #[serde(default)]
    pub email: String,
}

impl std::fmt::Display for RegisterResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Registered {}", self.email)?;
        writeln!(f, "Your API key: {}", self.api_key)?;
        writeln!(f, "Account ID: {}", self.account_id)?;
        write!(f, "Credentials saved to {}", LocalConfig::config_path().display())
    }
}

/// Create an account on `server_url` and store its API key locally
pub async fn run_register(
    email: &str,
    business_name: &str,
    server_url: &str,
    format: OutputFormat,
) -> Result<()> {
    let server_url = server_url.trim_end_matches('/');
    let resp = get_http_client()?
        .post(format!("{}/auth/register", server_url))
        .json(&serde_json::json!({
            "email": email,
            "business_name": business_name,
        }))
        .send()
        .await
        .context("Failed to reach server")?;

    if !resp.status().is_success() {
        let error = resp.text().await.unwrap_or_default();
        anyhow::bail!("Registration failed: {}", error);
    }

    let mut response: RegisterResponse = resp.json().await?;
    response.email = email.to_string();

    let config = LocalConfig {
        api_key: Some(response.api_key.clone()),
        server_url: Some(server_url.to_string()),
        email: Some(email.to_string()),
        account_id: Some(response.account_id.clone()),
    };
    config.save()?;

    format.print(&response);
    Ok(())
}

/// Remove local credentials
pub fn run_logout(format: OutputFormat) -> Result<()> {
    let config_path = LocalConfig::config_path();
    if config_path.exists() {
        std::fs::remove_file(&config_path).context("Failed to remove config file")?;
    }

    format.print(&SuccessResponse::new("Logged out successfully"));
    Ok(())
}
