mod events;

pub use events::*;

use anyhow::{Context, Result};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Salond-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Salond-Timestamp";

/// Oldest accepted signature timestamp, in seconds
const MAX_SIGNATURE_AGE_SECS: i64 = 300;

/// Webhook delivery client
#[derive(Clone)]
pub struct WebhookClient {
    http_client: reqwest::Client,
}

impl WebhookClient {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    /// Deliver a webhook event to the specified URL
    pub async fn deliver(&self, url: &str, secret: &str, event: &WebhookEvent) -> Result<()> {
        let payload = serde_json::to_string(event).context("Failed to serialize webhook event")?;
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(&payload, &timestamp, secret)?;

        let response = self
            .http_client
            .post(url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, &timestamp)
            .body(payload)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .context("Failed to send webhook")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Webhook delivery failed: {} - {}", status, body);
        }

        Ok(())
    }

    /// Deliver in the background. Failures are logged and otherwise ignored.
    pub fn dispatch(&self, url: String, secret: String, event: WebhookEvent) {
        let client = self.clone();
        tokio::spawn(async move {
            match client.deliver(&url, &secret, &event).await {
                Ok(()) => tracing::debug!(event = %event.event, "Webhook delivered"),
                Err(e) => tracing::warn!(event = %event.event, "Webhook delivery failed: {:#}", e),
            }
        });
    }

    /// Verify an incoming webhook signature
    pub fn verify_signature(
        payload: &str,
        timestamp: &str,
        signature: &str,
        secret: &str,
    ) -> Result<bool> {
        let ts: i64 = timestamp.parse().context("Invalid timestamp")?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > MAX_SIGNATURE_AGE_SECS {
            return Ok(false);
        }

        let Ok(signature) = hex::decode(signature) else {
            return Ok(false);
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).context("Invalid HMAC key")?;
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());

        Ok(mac.verify_slice(&signature).is_ok())
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`
pub fn sign(payload: &str, timestamp: &str, secret: &str) -> Result<String> {
    let message = format!("{}.{}", timestamp, payload);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).context("Invalid HMAC key")?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_verification() {
        let payload = r#"{"event":"appointment.created"}"#;
        let timestamp = Utc::now().timestamp().to_string();
        let secret = "test_secret_123";

        let signature = sign(payload, &timestamp, secret).unwrap();

        assert!(WebhookClient::verify_signature(payload, &timestamp, &signature, secret).unwrap());

        // Wrong secret should fail
        assert!(
            !WebhookClient::verify_signature(payload, &timestamp, &signature, "wrong_secret")
                .unwrap()
        );
        assert!(
            !WebhookClient::verify_signature("{}", &timestamp, &signature, secret).unwrap()
        );
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let payload = "{}";
        let stale = (Utc::now().timestamp() - 301).to_string();
        let signature = sign(payload, &stale, "secret").unwrap();

        assert!(!WebhookClient::verify_signature(payload, &stale, &signature, "secret").unwrap());
        assert!(WebhookClient::verify_signature(payload, "yesterday", &signature, "secret").is_err());
    }

    #[test]
    fn test_garbage_signature_is_rejected() {
        let timestamp = Utc::now().timestamp().to_string();
        assert!(!WebhookClient::verify_signature("{}", &timestamp, "zz-not-hex", "secret").unwrap());
    }
}
