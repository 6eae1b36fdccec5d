use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use salond::cli::{self, parse_date_arg, parse_time_arg, split_list, OutputFormat};
use salond::dashboard::Period;
use salond::models::{
    AppointmentStatus, CreateAppointmentRequest, CreateClientRequest, CreateServiceRequest,
    CreateStaffRequest, UpdateAppointmentRequest,
};
use salond::scheduling::DurationPolicy;
use salond::DEFAULT_SERVER_URL;

#[derive(Parser)]
#[command(name = "salond")]
#[command(about = "Salon appointment scheduler", version)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and store its API key locally
    Register {
        #[arg(long)]
        email: String,
        /// Business name shown on the account
        #[arg(long)]
        business: String,
        #[arg(long, default_value = DEFAULT_SERVER_URL)]
        server: String,
    },
    /// Log out and remove local credentials
    Logout,
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage clients
    Clients {
        #[command(subcommand)]
        action: ClientAction,
    },
    /// Manage the service catalog
    Services {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Manage staff
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
    /// List open start times
    Slots {
        #[arg(long)]
        staff: String,
        /// Date (e.g., "2026-02-03")
        #[arg(long, value_parser = parse_date_arg)]
        date: NaiveDate,
        /// Comma separated service IDs
        #[arg(long)]
        services: String,
        /// Appointment being edited; its current time stays listed
        #[arg(long)]
        editing: Option<String>,
    },
    /// Book an appointment
    Book {
        #[arg(long)]
        client: String,
        #[arg(long)]
        staff: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: NaiveDate,
        /// Start time (e.g., "14:30")
        #[arg(long, value_parser = parse_time_arg)]
        time: NaiveTime,
        /// Comma separated service IDs
        #[arg(long)]
        services: String,
        /// confirmed or pending
        #[arg(long, value_parser = parse_status)]
        status: Option<AppointmentStatus>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Move or change an appointment
    Reschedule {
        #[arg(long)]
        id: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time_arg)]
        time: Option<NaiveTime>,
        /// Comma separated service IDs
        #[arg(long)]
        services: Option<String>,
        #[arg(long)]
        staff: Option<String>,
    },
    /// Cancel an appointment
    Cancel {
        #[arg(long)]
        id: String,
    },
    /// Delete an appointment
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Show appointments for a day
    Agenda {
        /// Day to show (default: today)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        /// Last day to show (default: same as --date)
        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,
        #[arg(long)]
        staff: Option<String>,
    },
    /// Show totals, revenue and busiest hours
    Dashboard {
        #[arg(long, value_parser = parse_date_arg)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,
        /// day, week or month
        #[arg(long, value_parser = parse_period, default_value = "day")]
        period: Period,
    },
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(long, env = "SALOND_PORT", default_value = "8080")]
        port: u16,
        /// Database file path
        #[arg(long, env = "SALOND_DB", default_value = "./salond.db")]
        db: PathBuf,
        /// Assume 60 minutes for services whose duration does not parse
        #[arg(long, env = "SALOND_LENIENT_DURATIONS")]
        lenient_durations: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set server URL
    Server {
        /// Server URL
        url: String,
    },
    /// Set webhook URL for notifications
    Webhook {
        /// Webhook URL (leave empty to remove)
        url: Option<String>,
    },
    /// Set opening hours and slot length
    Hours {
        #[arg(long, value_parser = parse_time_arg)]
        open: Option<NaiveTime>,
        #[arg(long, value_parser = parse_time_arg)]
        close: Option<NaiveTime>,
        /// Minutes between offered start times
        #[arg(long)]
        step: Option<u32>,
    },
}

#[derive(Subcommand)]
enum ClientAction {
    List {
        /// Match against name, phone or email
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum ServiceAction {
    List {
        /// Include inactive services
        #[arg(long)]
        all: bool,
    },
    Add {
        #[arg(long)]
        name: String,
        /// Duration (e.g., "45 min", "1h 30min")
        #[arg(long)]
        duration: String,
        /// Price (e.g., "35.50")
        #[arg(long, value_parser = parse_price_arg)]
        price: i64,
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    List {
        /// Include inactive staff
        #[arg(long)]
        all: bool,
    },
    Add {
        #[arg(long)]
        name: String,
        /// Agenda color (e.g., "#aa66cc")
        #[arg(long, default_value = "#888888")]
        color: String,
    },
}

fn parse_status(s: &str) -> Result<AppointmentStatus, String> {
    AppointmentStatus::parse(s).ok_or_else(|| format!("Invalid status {:?}", s))
}

fn parse_period(s: &str) -> Result<Period, String> {
    Period::parse(s).ok_or_else(|| "Use: day, week or month".to_string())
}

fn parse_price_arg(s: &str) -> Result<i64, String> {
    cli::parse_price(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("salond=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Register {
            email,
            business,
            server,
        } => {
            cli::run_register(&email, &business, &server, format).await?;
        }
        Commands::Logout => {
            cli::run_logout(format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                cli::run_config_show(format).await?;
            }
            ConfigAction::Server { url } => {
                cli::run_config_server(&url, format)?;
            }
            ConfigAction::Webhook { url } => {
                cli::run_config_webhook(url.as_deref(), format).await?;
            }
            ConfigAction::Hours { open, close, step } => {
                cli::run_config_hours(open, close, step, format).await?;
            }
        },
        Commands::Clients { action } => match action {
            ClientAction::List { search } => {
                cli::run_clients_list(search.as_deref(), format).await?;
            }
            ClientAction::Add {
                name,
                phone,
                email,
                notes,
            } => {
                let req = CreateClientRequest {
                    name,
                    phone,
                    email,
                    notes,
                };
                cli::run_clients_add(req, format).await?;
            }
        },
        Commands::Services { action } => match action {
            ServiceAction::List { all } => {
                cli::run_services_list(all, format).await?;
            }
            ServiceAction::Add {
                name,
                duration,
                price,
                category,
            } => {
                let req = CreateServiceRequest {
                    name,
                    duration,
                    price_cents: price,
                    category,
                    active: true,
                };
                cli::run_services_add(req, format).await?;
            }
        },
        Commands::Staff { action } => match action {
            StaffAction::List { all } => {
                cli::run_staff_list(all, format).await?;
            }
            StaffAction::Add { name, color } => {
                let req = CreateStaffRequest {
                    name,
                    color,
                    active: true,
                };
                cli::run_staff_add(req, format).await?;
            }
        },
        Commands::Slots {
            staff,
            date,
            services,
            editing,
        } => {
            cli::run_slots(&staff, date, split_list(&services), editing.as_deref(), format)
                .await?;
        }
        Commands::Book {
            client,
            staff,
            date,
            time,
            services,
            status,
            notes,
        } => {
            let req = CreateAppointmentRequest {
                client_id: client,
                staff_id: staff,
                service_ids: split_list(&services),
                date,
                start_time: time,
                status,
                notes,
            };
            cli::run_book(req, format).await?;
        }
        Commands::Reschedule {
            id,
            date,
            time,
            services,
            staff,
        } => {
            let changes = UpdateAppointmentRequest {
                staff_id: staff,
                service_ids: services.as_deref().map(split_list),
                date,
                start_time: time,
                ..Default::default()
            };
            cli::run_reschedule(&id, changes, format).await?;
        }
        Commands::Cancel { id } => {
            cli::run_cancel(&id, format).await?;
        }
        Commands::Delete { id } => {
            cli::run_delete(&id, format).await?;
        }
        Commands::Agenda { date, to, staff } => {
            cli::run_agenda(date, to, staff.as_deref(), format).await?;
        }
        Commands::Dashboard { from, to, period } => {
            cli::run_dashboard(from, to, period, format).await?;
        }
        Commands::Serve {
            port,
            db,
            lenient_durations,
        } => {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let policy = if lenient_durations {
                DurationPolicy::Lenient
            } else {
                DurationPolicy::Strict
            };
            salond::server::run_server(addr, &db, policy).await?;
        }
    }

    Ok(())
}
