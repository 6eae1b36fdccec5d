mod store;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::{
    Account, Appointment, AppointmentStatus, BookedInterval, BusinessHours, Category, Client,
    DateWindow, Service, Staff, TimeRange,
};
use crate::scheduling::{format_hhmm, StoreError, StoreResult};

const MIGRATION_001: &str = include_str!("migrations/001_initial.sql");

const ACCOUNT_COLUMNS: &str = "id, email, business_name, api_key_hash, webhook_url, webhook_secret,
                               opening_time, closing_time, slot_minutes, created_at";
const CLIENT_COLUMNS: &str = "id, account_id, name, phone, email, notes, created_at";
const SERVICE_COLUMNS: &str =
    "id, account_id, name, duration, price_cents, category, active, created_at";
const STAFF_COLUMNS: &str = "id, account_id, name, color, active, created_at";
const APPOINTMENT_COLUMNS: &str = "id, account_id, client_id, staff_id, service_ids, date,
                                   start_time, end_time, status, price_cents, notes,
                                   created_at, updated_at";

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(MIGRATION_001)
            .context("Failed to run migration 001")?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Database lock poisoned"))
    }

    // ==================== Account Operations ====================

    /// Create a new account
    pub fn create_account(&self, account: &Account) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO accounts (id, email, business_name, api_key_hash, webhook_url,
                                  webhook_secret, opening_time, closing_time, slot_minutes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                account.id,
                account.email,
                account.business_name,
                account.api_key_hash,
                account.webhook_url,
                account.webhook_secret,
                format_hhmm(account.hours.opening),
                format_hhmm(account.hours.closing),
                account.hours.slot_minutes,
                account.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get an account by ID
    pub fn get_account(&self, id: &str) -> Result<Option<Account>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS),
            params![id],
            account_from_row,
        )
        .optional()
        .context("Failed to get account")
    }

    /// Get an account by email
    pub fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM accounts WHERE email = ?1", ACCOUNT_COLUMNS),
            params![email],
            account_from_row,
        )
        .optional()
        .context("Failed to get account by email")
    }

    /// Find the account whose stored hash matches `api_key`
    pub fn find_account_by_api_key(&self, api_key: &str) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM accounts", ACCOUNT_COLUMNS))?;
        let accounts = stmt.query_map([], account_from_row)?;

        for account in accounts {
            let account = account?;
            if crate::crypto::verify_api_key(api_key, &account.api_key_hash) {
                return Ok(Some(account));
            }
        }

        Ok(None)
    }

    /// Update an account's API key hash
    pub fn update_account_api_key_hash(&self, account_id: &str, api_key_hash: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE accounts SET api_key_hash = ?1 WHERE id = ?2",
            params![api_key_hash, account_id],
        )?;
        Ok(())
    }

    /// Update an account's webhook configuration
    pub fn update_account_webhook(
        &self,
        account_id: &str,
        webhook_url: Option<&str>,
        webhook_secret: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE accounts SET webhook_url = ?1, webhook_secret = ?2 WHERE id = ?3",
            params![webhook_url, webhook_secret, account_id],
        )?;
        Ok(())
    }

    /// Update business name and opening hours
    pub fn update_account_settings(
        &self,
        account_id: &str,
        business_name: &str,
        hours: &BusinessHours,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE accounts SET business_name = ?1, opening_time = ?2, closing_time = ?3,
                                 slot_minutes = ?4
             WHERE id = ?5",
            params![
                business_name,
                format_hhmm(hours.opening),
                format_hhmm(hours.closing),
                hours.slot_minutes,
                account_id,
            ],
        )?;
        Ok(())
    }

    // ==================== Client Operations ====================

    pub fn create_client(&self, client: &Client) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO clients (id, account_id, name, phone, email, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                client.id,
                client.account_id,
                client.name,
                client.phone,
                client.email,
                client.notes,
                client.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_client(&self, id: &str) -> Result<Option<Client>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS),
            params![id],
            client_from_row,
        )
        .optional()
        .context("Failed to get client")
    }

    /// List an account's clients, optionally filtered by a name/phone/email fragment
    pub fn list_clients(&self, account_id: &str, search: Option<&str>) -> Result<Vec<Client>> {
        let conn = self.conn()?;
        let pattern = format!("%{}%", search.unwrap_or_default().to_lowercase());
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM clients
             WHERE account_id = ?1
               AND (lower(name) LIKE ?2 OR lower(coalesce(phone, '')) LIKE ?2
                    OR lower(coalesce(email, '')) LIKE ?2)
             ORDER BY name ASC",
            CLIENT_COLUMNS
        ))?;
        let clients = stmt.query_map(params![account_id, pattern], client_from_row)?;
        clients
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list clients")
    }

    pub fn update_client(&self, client: &Client) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE clients SET name = ?1, phone = ?2, email = ?3, notes = ?4 WHERE id = ?5",
            params![client.name, client.phone, client.email, client.notes, client.id],
        )?;
        Ok(())
    }

    /// Delete a client together with their appointments
    pub fn delete_client(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM clients WHERE id = ?1", params![id])? > 0)
    }

    // ==================== Catalog Operations ====================

    pub fn create_service(&self, service: &Service) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO services (id, account_id, name, duration, price_cents, category, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                service.id,
                service.account_id,
                service.name,
                service.duration,
                service.price_cents,
                service.category,
                service.active,
                service.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_service(&self, id: &str) -> Result<Option<Service>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM services WHERE id = ?1", SERVICE_COLUMNS),
            params![id],
            service_from_row,
        )
        .optional()
        .context("Failed to get service")
    }

    pub fn list_services(&self, account_id: &str, active_only: bool) -> Result<Vec<Service>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM services
             WHERE account_id = ?1 AND (active = 1 OR ?2 = 0)
             ORDER BY coalesce(category, ''), name",
            SERVICE_COLUMNS
        ))?;
        let services = stmt.query_map(params![account_id, active_only], service_from_row)?;
        services
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list services")
    }

    pub fn update_service(&self, service: &Service) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE services SET name = ?1, duration = ?2, price_cents = ?3, category = ?4, active = ?5
             WHERE id = ?6",
            params![
                service.name,
                service.duration,
                service.price_cents,
                service.category,
                service.active,
                service.id,
            ],
        )?;
        Ok(())
    }

    pub fn delete_service(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM services WHERE id = ?1", params![id])? > 0)
    }

    /// Create a category. A name already used by the account is a conflict.
    pub fn create_category(&self, category: &Category) -> StoreResult<()> {
        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO categories (id, account_id, name) VALUES (?1, ?2, ?3)",
            params![category.id, category.account_id, category.name],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::Conflict(category.name.clone()))
            }
            Err(e) => Err(anyhow::Error::from(e)
                .context("Failed to create category")
                .into()),
        }
    }

    pub fn list_categories(&self, account_id: &str) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, account_id, name FROM categories WHERE account_id = ?1 ORDER BY name",
        )?;
        let categories = stmt.query_map(params![account_id], |row| {
            Ok(Category {
                id: row.get(0)?,
                account_id: row.get(1)?,
                name: row.get(2)?,
            })
        })?;
        categories
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list categories")
    }

    // ==================== Staff Operations ====================

    pub fn create_staff(&self, staff: &Staff) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO staff (id, account_id, name, color, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                staff.id,
                staff.account_id,
                staff.name,
                staff.color,
                staff.active,
                staff.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_staff(&self, id: &str) -> Result<Option<Staff>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM staff WHERE id = ?1", STAFF_COLUMNS),
            params![id],
            staff_from_row,
        )
        .optional()
        .context("Failed to get staff member")
    }

    pub fn list_staff(&self, account_id: &str, active_only: bool) -> Result<Vec<Staff>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM staff WHERE account_id = ?1 AND (active = 1 OR ?2 = 0) ORDER BY name",
            STAFF_COLUMNS
        ))?;
        let staff = stmt.query_map(params![account_id, active_only], staff_from_row)?;
        staff
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list staff")
    }

    pub fn update_staff(&self, staff: &Staff) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE staff SET name = ?1, color = ?2, active = ?3 WHERE id = ?4",
            params![staff.name, staff.color, staff.active, staff.id],
        )?;
        Ok(())
    }

    /// Delete a staff member together with their appointments
    pub fn delete_staff(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM staff WHERE id = ?1", params![id])? > 0)
    }

    // ==================== Appointment Operations ====================

    /// Insert an appointment unless a blocking appointment of the same staff member
    /// overlaps it. Returns the id of the overlapping appointment instead of writing.
    pub fn insert_appointment_guarded(&self, appointment: &Appointment) -> Result<Option<String>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(conflict) = overlapping_appointment(&tx, appointment)? {
            return Ok(Some(conflict));
        }

        tx.execute(
            &format!(
                "INSERT INTO appointments ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                APPOINTMENT_COLUMNS
            ),
            params![
                appointment.id,
                appointment.account_id,
                appointment.client_id,
                appointment.staff_id,
                serde_json::to_string(&appointment.service_ids)?,
                appointment.date.format("%Y-%m-%d").to_string(),
                format_hhmm(appointment.start_time),
                format_hhmm(appointment.end_time),
                appointment.status.as_str(),
                appointment.price_cents,
                appointment.notes,
                appointment.created_at,
                appointment.updated_at,
            ],
        )?;
        tx.commit()?;
        Ok(None)
    }

    /// Rewrite an appointment under the same guard as [`insert_appointment_guarded`](Self::insert_appointment_guarded)
    pub fn update_appointment_guarded(&self, appointment: &Appointment) -> Result<Option<String>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(conflict) = overlapping_appointment(&tx, appointment)? {
            return Ok(Some(conflict));
        }

        let changed = tx.execute(
            "UPDATE appointments SET client_id = ?1, staff_id = ?2, service_ids = ?3, date = ?4,
                                     start_time = ?5, end_time = ?6, status = ?7, price_cents = ?8,
                                     notes = ?9, updated_at = ?10
             WHERE id = ?11",
            params![
                appointment.client_id,
                appointment.staff_id,
                serde_json::to_string(&appointment.service_ids)?,
                appointment.date.format("%Y-%m-%d").to_string(),
                format_hhmm(appointment.start_time),
                format_hhmm(appointment.end_time),
                appointment.status.as_str(),
                appointment.price_cents,
                appointment.notes,
                appointment.updated_at,
                appointment.id,
            ],
        )?;
        if changed == 0 {
            anyhow::bail!("Appointment {} not found", appointment.id);
        }
        tx.commit()?;
        Ok(None)
    }

    pub fn get_appointment(&self, id: &str) -> Result<Option<Appointment>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM appointments WHERE id = ?1", APPOINTMENT_COLUMNS),
            params![id],
            appointment_from_row,
        )
        .optional()
        .context("Failed to get appointment")
    }

    /// Intervals booked for one staff member on one date
    pub fn list_staff_day(
        &self,
        staff_id: &str,
        date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> Result<Vec<BookedInterval>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, start_time, end_time, status FROM appointments
             WHERE staff_id = ?1 AND date = ?2 AND id != coalesce(?3, '')
             ORDER BY start_time",
        )?;
        let rows = stmt.query_map(
            params![staff_id, date.format("%Y-%m-%d").to_string(), exclude_id],
            |row| {
                Ok(BookedInterval {
                    id: row.get(0)?,
                    range: TimeRange::new(time_column(row, 1)?, time_column(row, 2)?),
                    status: status_column(row, 3)?,
                })
            },
        )?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list appointments for staff member")
    }

    /// An account's appointments in a date window, optionally for one staff member
    pub fn list_appointments(
        &self,
        account_id: &str,
        window: DateWindow,
        staff_id: Option<&str>,
    ) -> Result<Vec<Appointment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM appointments
             WHERE account_id = ?1 AND date >= ?2 AND date <= ?3
               AND (?4 IS NULL OR staff_id = ?4)
             ORDER BY date, start_time",
            APPOINTMENT_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![
                account_id,
                window.from.format("%Y-%m-%d").to_string(),
                window.to.format("%Y-%m-%d").to_string(),
                staff_id,
            ],
            appointment_from_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list appointments")
    }

    pub fn delete_appointment(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])? > 0)
    }
}

/// First non-canceled appointment of the same staff member and date overlapping `candidate`
fn overlapping_appointment(conn: &Connection, candidate: &Appointment) -> Result<Option<String>> {
    if !candidate.status.blocks_time() {
        return Ok(None);
    }
    conn.query_row(
        "SELECT id FROM appointments
         WHERE staff_id = ?1 AND date = ?2 AND id != ?3 AND status != 'canceled'
           AND start_time < ?4 AND ?5 < end_time
         ORDER BY start_time
         LIMIT 1",
        params![
            candidate.staff_id,
            candidate.date.format("%Y-%m-%d").to_string(),
            candidate.id,
            format_hhmm(candidate.end_time),
            format_hhmm(candidate.start_time),
        ],
        |row| row.get(0),
    )
    .optional()
    .context("Failed to check for overlapping appointments")
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn time_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|e| conversion_error(idx, e))
}

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_error(idx, e))
}

#[derive(Debug, thiserror::Error)]
#[error("unknown appointment status {0:?}")]
struct UnknownStatus(String);

fn status_column(row: &Row, idx: usize) -> rusqlite::Result<AppointmentStatus> {
    let raw: String = row.get(idx)?;
    AppointmentStatus::parse(&raw).ok_or_else(|| conversion_error(idx, UnknownStatus(raw)))
}

fn account_from_row(row: &Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        email: row.get(1)?,
        business_name: row.get(2)?,
        api_key_hash: row.get(3)?,
        webhook_url: row.get(4)?,
        webhook_secret: row.get(5)?,
        hours: BusinessHours {
            opening: time_column(row, 6)?,
            closing: time_column(row, 7)?,
            slot_minutes: row.get(8)?,
        },
        created_at: row.get(9)?,
    })
}

fn client_from_row(row: &Row) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn service_from_row(row: &Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        duration: row.get(3)?,
        price_cents: row.get(4)?,
        category: row.get(5)?,
        active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn staff_from_row(row: &Row) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn appointment_from_row(row: &Row) -> rusqlite::Result<Appointment> {
    let service_ids: String = row.get(4)?;
    Ok(Appointment {
        id: row.get(0)?,
        account_id: row.get(1)?,
        client_id: row.get(2)?,
        staff_id: row.get(3)?,
        service_ids: serde_json::from_str(&service_ids).map_err(|e| conversion_error(4, e))?,
        date: date_column(row, 5)?,
        start_time: time_column(row, 6)?,
        end_time: time_column(row, 7)?,
        status: status_column(row, 8)?,
        price_cents: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::parse_hhmm;
    use chrono::Utc;

    fn create_test_account(db: &Database) -> Account {
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            email: "owner@salon.test".to_string(),
            business_name: "Studio Nine".to_string(),
            api_key_hash: bcrypt::hash("test_api_key", 4).unwrap(),
            webhook_url: None,
            webhook_secret: None,
            hours: BusinessHours::default(),
            created_at: Utc::now().timestamp(),
        };
        db.create_account(&account).unwrap();
        account
    }

    fn seed(db: &Database) -> (Account, Client, Staff) {
        let account = create_test_account(db);
        let client = Client {
            id: "client_1".to_string(),
            account_id: account.id.clone(),
            name: "Dana Reyes".to_string(),
            phone: Some("555-0101".to_string()),
            email: None,
            notes: None,
            created_at: 0,
        };
        db.create_client(&client).unwrap();
        let staff = Staff {
            id: "staff_alice".to_string(),
            account_id: account.id.clone(),
            name: "Alice".to_string(),
            color: "#aa66cc".to_string(),
            active: true,
            created_at: 0,
        };
        db.create_staff(&staff).unwrap();
        (account, client, staff)
    }

    fn appointment(account: &Account, id: &str, start: &str, end: &str) -> Appointment {
        Appointment {
            id: id.to_string(),
            account_id: account.id.clone(),
            client_id: "client_1".to_string(),
            staff_id: "staff_alice".to_string(),
            service_ids: vec!["svc_cut".to_string()],
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            start_time: parse_hhmm(start).unwrap(),
            end_time: parse_hhmm(end).unwrap(),
            status: AppointmentStatus::Confirmed,
            price_cents: 3500,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_create_and_get_account() {
        let db = Database::open_in_memory().unwrap();
        let account = create_test_account(&db);

        let retrieved = db.get_account(&account.id).unwrap().unwrap();
        assert_eq!(retrieved.email, account.email);
        assert_eq!(retrieved.hours, BusinessHours::default());

        let by_email = db.get_account_by_email("owner@salon.test").unwrap();
        assert_eq!(by_email.map(|a| a.id), Some(account.id));
    }

    #[test]
    fn test_find_account_by_api_key() {
        let db = Database::open_in_memory().unwrap();
        let account = create_test_account(&db);

        let found = db.find_account_by_api_key("test_api_key").unwrap();
        assert_eq!(found.map(|a| a.id), Some(account.id));

        assert!(db.find_account_by_api_key("wrong_key").unwrap().is_none());
    }

    #[test]
    fn test_update_settings() {
        let db = Database::open_in_memory().unwrap();
        let account = create_test_account(&db);
        let hours = BusinessHours {
            opening: parse_hhmm("10:00").unwrap(),
            closing: parse_hhmm("20:00").unwrap(),
            slot_minutes: 15,
        };

        db.update_account_settings(&account.id, "Studio Ten", &hours)
            .unwrap();

        let updated = db.get_account(&account.id).unwrap().unwrap();
        assert_eq!(updated.business_name, "Studio Ten");
        assert_eq!(updated.hours, hours);
    }

    #[test]
    fn test_appointment_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let (account, _, _) = seed(&db);
        let apt = appointment(&account, "apt_1", "09:00", "10:00");

        assert!(db.insert_appointment_guarded(&apt).unwrap().is_none());
        assert_eq!(db.get_appointment("apt_1").unwrap(), Some(apt.clone()));

        let window = DateWindow::single(apt.date);
        assert_eq!(db.list_appointments(&account.id, window, None).unwrap().len(), 1);
        assert!(db
            .list_appointments(&account.id, window, Some("staff_bob"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_stored_status_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let (account, _, _) = seed(&db);
        let apt = appointment(&account, "apt_1", "09:00", "10:00");
        db.insert_appointment_guarded(&apt).unwrap();

        db.conn()
            .unwrap()
            .execute("UPDATE appointments SET status = 'done' WHERE id = 'apt_1'", [])
            .unwrap();

        assert!(db.get_appointment("apt_1").is_err());
        assert!(db.list_staff_day("staff_alice", apt.date, None).is_err());
    }

    #[test]
    fn test_guarded_insert_rejects_overlap() {
        let db = Database::open_in_memory().unwrap();
        let (account, _, _) = seed(&db);

        db.insert_appointment_guarded(&appointment(&account, "apt_1", "09:00", "10:00"))
            .unwrap();

        let clash = appointment(&account, "apt_2", "09:30", "10:30");
        assert_eq!(
            db.insert_appointment_guarded(&clash).unwrap(),
            Some("apt_1".to_string())
        );
        assert!(db.get_appointment("apt_2").unwrap().is_none());

        let adjacent = appointment(&account, "apt_3", "10:00", "10:30");
        assert!(db.insert_appointment_guarded(&adjacent).unwrap().is_none());
    }

    #[test]
    fn test_guarded_update_ignores_itself_and_canceled() {
        let db = Database::open_in_memory().unwrap();
        let (account, _, _) = seed(&db);

        let mut first = appointment(&account, "apt_1", "09:00", "10:00");
        db.insert_appointment_guarded(&first).unwrap();

        first.start_time = parse_hhmm("09:30").unwrap();
        first.end_time = parse_hhmm("10:30").unwrap();
        assert!(db.update_appointment_guarded(&first).unwrap().is_none());

        first.status = AppointmentStatus::Canceled;
        db.update_appointment_guarded(&first).unwrap();

        let over_canceled = appointment(&account, "apt_2", "09:30", "10:30");
        assert!(db.insert_appointment_guarded(&over_canceled).unwrap().is_none());

        let booked = db
            .list_staff_day("staff_alice", first.date, Some("apt_2"))
            .unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].status, AppointmentStatus::Canceled);
    }

    #[test]
    fn test_duplicate_category_is_a_conflict() {
        let db = Database::open_in_memory().unwrap();
        let account = create_test_account(&db);
        let category = Category {
            id: "cat_1".to_string(),
            account_id: account.id.clone(),
            name: "Color".to_string(),
        };
        db.create_category(&category).unwrap();

        let duplicate = Category {
            id: "cat_2".to_string(),
            ..category
        };
        assert!(matches!(
            db.create_category(&duplicate),
            Err(StoreError::Conflict(ref name)) if name == "Color"
        ));
        assert_eq!(db.list_categories(&account.id).unwrap().len(), 1);
    }

    #[test]
    fn test_client_search_and_cascade() {
        let db = Database::open_in_memory().unwrap();
        let (account, client, _) = seed(&db);
        db.insert_appointment_guarded(&appointment(&account, "apt_1", "09:00", "10:00"))
            .unwrap();

        assert_eq!(db.list_clients(&account.id, Some("reyes")).unwrap().len(), 1);
        assert_eq!(db.list_clients(&account.id, Some("0101")).unwrap().len(), 1);
        assert!(db.list_clients(&account.id, Some("smith")).unwrap().is_empty());

        assert!(db.delete_client(&client.id).unwrap());
        assert!(db.get_appointment("apt_1").unwrap().is_none());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salond.db");
        {
            let db = Database::open(&path).unwrap();
            create_test_account(&db);
        }
        let reopened = Database::open(&path).unwrap();
        assert!(reopened
            .get_account_by_email("owner@salon.test")
            .unwrap()
            .is_some());
    }
}
