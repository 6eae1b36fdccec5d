mod error;
mod handlers;
mod middleware;
mod routes;

pub use error::ApiError;
pub use routes::create_router;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use crate::db::Database;
use crate::models::Account;
use crate::scheduling::{DurationPolicy, Scheduler};
use crate::webhook::{WebhookClient, WebhookEvent};

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub policy: DurationPolicy,
    pub webhooks: WebhookClient,
}

impl AppState {
    pub fn new(db: Database, policy: DurationPolicy) -> Self {
        Self {
            db,
            policy,
            webhooks: WebhookClient::new(),
        }
    }

    /// Scheduler acting on behalf of `account`
    pub fn scheduler<'a>(&'a self, account: &'a Account) -> Scheduler<'a> {
        Scheduler::new(&self.db, &self.db, &account.id, self.policy)
    }

    /// Send `event` to the account's webhook, if one is configured
    pub fn notify(&self, account: &Account, event: WebhookEvent) {
        if let (Some(url), Some(secret)) = (&account.webhook_url, &account.webhook_secret) {
            self.webhooks.dispatch(url.clone(), secret.clone(), event);
        }
    }
}

/// Run the API server
pub async fn run_server(addr: SocketAddr, db_path: &Path, policy: DurationPolicy) -> Result<()> {
    let db = Database::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let state = Arc::new(AppState::new(db, policy));
    let app = create_router(state);

    tracing::info!(
        db = %db_path.display(),
        policy = ?policy,
        "Server listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
