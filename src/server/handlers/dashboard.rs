use axum::{
    extract::{Extension, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::{Days, Local};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::dashboard::{staff_status, DashboardReport, Period, StaffStatus};
use crate::db::Database;
use crate::models::{Account, DateWindow};
use crate::server::middleware::AuthenticatedAccount;
use crate::server::{ApiError, AppState};

const STREAM_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
    pub period: Option<String>,
}

/// Summary, per-period totals and peak hours. Defaults to the last 30 days by day.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardReport>, ApiError> {
    let today = Local::now().date_naive();
    let to = query.to.unwrap_or(today);
    let from = query
        .from
        .unwrap_or_else(|| to.checked_sub_days(Days::new(29)).unwrap_or(to));
    if to < from {
        return Err(ApiError::BadRequest(
            "'to' must not be before 'from'".to_string(),
        ));
    }
    let period = match query.period.as_deref() {
        Some(raw) => Period::parse(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("Invalid period {:?}. Use: day, week or month", raw))
        })?,
        None => Period::Day,
    };

    let window = DateWindow::new(from, to);
    let appointments = state.db.list_appointments(&account.id, window, None)?;
    Ok(Json(DashboardReport::build(window, period, &appointments)))
}

#[derive(Serialize)]
struct StaffSnapshot {
    at: String,
    staff: Vec<StaffStatus>,
}

fn snapshot(db: &Database, account: &Account) -> anyhow::Result<StaffSnapshot> {
    let now = Local::now().naive_local();
    let staff = db.list_staff(&account.id, false)?;
    let today = db.list_appointments(&account.id, DateWindow::single(now.date()), None)?;
    Ok(StaffSnapshot {
        at: now.format("%Y-%m-%dT%H:%M").to_string(),
        staff: staff_status(&staff, &today, now.time()),
    })
}

/// Stream staff status via SSE
pub async fn stream_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let db = state.db.clone();

    let stream = async_stream::stream! {
        let mut interval = tokio::time::interval(STREAM_INTERVAL);

        loop {
            interval.tick().await;

            match snapshot(&db, &account) {
                Ok(snapshot) => {
                    if let Ok(json) = serde_json::to_string(&snapshot) {
                        yield Ok(Event::default().event("staff_status").data(json));
                    }
                }
                Err(e) => tracing::warn!(account_id = %account.id, "Dashboard snapshot failed: {:#}", e),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
