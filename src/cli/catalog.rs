use anyhow::{Context, Result};
use serde::Serialize;

use super::{ApiClient, OutputFormat};
use crate::dashboard::format_cents;
use crate::models::{
    Client, CreateClientRequest, CreateServiceRequest, CreateStaffRequest, Service, Staff,
};

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ClientList(pub Vec<Client>);

impl std::fmt::Display for ClientList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "No clients.");
        }
        for client in &self.0 {
            write!(f, "{:<22} {}", client.id, client.name)?;
            if let Some(phone) = &client.phone {
                write!(f, "  {}", phone)?;
            }
            if let Some(email) = &client.email {
                write!(f, "  {}", email)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ServiceList(pub Vec<Service>);

impl std::fmt::Display for ServiceList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "No services.");
        }
        let mut category = None;
        for service in &self.0 {
            if category != Some(&service.category) {
                writeln!(
                    f,
                    "{}",
                    service.category.as_deref().unwrap_or("Uncategorized")
                )?;
                category = Some(&service.category);
            }
            writeln!(
                f,
                "  {:<20} {:<24} {:>10}  {:>8}{}",
                service.id,
                service.name,
                service.duration,
                format_cents(service.price_cents),
                if service.active { "" } else { "  (inactive)" }
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct StaffList(pub Vec<Staff>);

impl std::fmt::Display for StaffList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "No staff.");
        }
        for staff in &self.0 {
            writeln!(
                f,
                "{:<22} {:<20} {}{}",
                staff.id,
                staff.name,
                staff.color,
                if staff.active { "" } else { "  (inactive)" }
            )?;
        }
        Ok(())
    }
}

/// A created record, printed as "Created <kind> <id>"
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct Created<T> {
    #[serde(skip)]
    kind: &'static str,
    record: T,
}

impl<T: Serialize> std::fmt::Display for Created<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = serde_json::to_value(&self.record)
            .ok()
            .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(String::from))
            .unwrap_or_default();
        write!(f, "Created {} {}", self.kind, id)
    }
}

/// Parse a price such as "35", "35.5" or "35.50" into cents
pub fn parse_price(s: &str) -> Result<i64> {
    let s = s.trim();
    let (units, fraction) = s.split_once('.').unwrap_or((s, ""));
    if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("Invalid price {:?}", s);
    }
    let units: i64 = units
        .parse()
        .with_context(|| format!("Invalid price {:?}", s))?;
    let cents: i64 = format!("{:0<2}", fraction).parse().unwrap_or(0);
    if units < 0 {
        anyhow::bail!("Price cannot be negative");
    }
    Ok(units * 100 + cents)
}

pub async fn run_clients_list(search: Option<&str>, format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let path = match search {
        Some(term) => format!(
            "/v1/clients?{}",
            url::form_urlencoded::Serializer::new(String::new())
                .append_pair("search", term)
                .finish()
        ),
        None => "/v1/clients".to_string(),
    };
    let clients: Vec<Client> = api.get(&path).await?;
    format.print(&ClientList(clients));
    Ok(())
}

pub async fn run_clients_add(req: CreateClientRequest, format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let record: Client = api.post("/v1/clients", &req).await?;
    format.print(&Created {
        kind: "client",
        record,
    });
    Ok(())
}

pub async fn run_services_list(all: bool, format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let path = if all { "/v1/services?all=true" } else { "/v1/services" };
    let services: Vec<Service> = api.get(path).await?;
    format.print(&ServiceList(services));
    Ok(())
}

pub async fn run_services_add(req: CreateServiceRequest, format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let record: Service = api.post("/v1/services", &req).await?;
    format.print(&Created {
        kind: "service",
        record,
    });
    Ok(())
}

pub async fn run_staff_list(all: bool, format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let path = if all { "/v1/staff?all=true" } else { "/v1/staff" };
    let staff: Vec<Staff> = api.get(path).await?;
    format.print(&StaffList(staff));
    Ok(())
}

pub async fn run_staff_add(req: CreateStaffRequest, format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let record: Staff = api.post("/v1/staff", &req).await?;
    format.print(&Created {
        kind: "staff member",
        record,
    });
    Ok(())
}
