use anyhow::Result;
use chrono::NaiveDate;

use super::{ApiClient, OutputFormat};
use crate::dashboard::{DashboardReport, Period};

/// Print totals for a date window
pub async fn run_dashboard(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    period: Period,
    format: OutputFormat,
) -> Result<()> {
    let api = ApiClient::from_config()?;
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(from) = from {
        query.append_pair("from", &from.to_string());
    }
    if let Some(to) = to {
        query.append_pair("to", &to.to_string());
    }
    query.append_pair("period", period.as_str());

    let report: DashboardReport = api
        .get(&format!("/v1/dashboard?{}", query.finish()))
        .await?;
    format.print(&report);
    Ok(())
}
