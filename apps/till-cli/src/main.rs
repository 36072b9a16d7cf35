//! # Till CLI
//!
//! Command-line front end for the cash drawer.
//!
//! ## Typical Day
//! ```text
//! till open --amount 200            start the drawer with the float
//! till checkout --sub-total 150 --pay CASH=200
//! till movement exit --amount 20 --description "Courier"
//! till status                       dashboard for the open session
//! till close --amount 330           count the drawer and close
//! till report --session <id> --json
//! ```
//!
//! Failures print `[KIND] message` on stderr and exit with status 1.

mod config;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, TillConfig};
use crate::render::{HistoryView, ReportView};
use till_core::{
    Company, ErrorKind, ManualMovementInput, Money, MovementType, PaymentMethodCode, SaleAmounts,
    SessionError, SessionRecord,
};
use till_db::{
    CashDeskService, CheckoutRequest, CheckoutService, Database, DbConfig, DbError,
    ReportService, ServiceError,
};

// =============================================================================
// Arguments
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "till", version, about = "Cash drawer accounting for a retail till")]
struct Cli {
    /// Config file (defaults to till.toml in the platform config dir)
    #[arg(short, long, global = true, env = "TILL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the cash session with the starting float
    Open {
        #[arg(long, value_parser = parse_money, default_value = "0")]
        amount: Money,
        #[arg(long)]
        note: Option<String>,
    },

    /// Record a manual entry or exit on the open session
    Movement {
        #[arg(value_enum)]
        direction: Direction,
        #[arg(long, value_parser = parse_money)]
        amount: Money,
        #[arg(long)]
        description: String,
        #[arg(long)]
        method: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },

    /// Finalise a sale
    Checkout {
        #[arg(long, value_parser = parse_money)]
        sub_total: Money,
        #[arg(long, value_parser = parse_money, default_value = "0")]
        tax: Money,
        #[arg(long, value_parser = parse_money, default_value = "0")]
        delivery_fee: Money,
        #[arg(long, value_parser = parse_money, default_value = "0")]
        discount: Money,
        #[arg(long)]
        discount_reason: Option<String>,
        /// Tender line, repeatable. Without any, the fallback method pays
        /// the grand total.
        #[arg(long = "pay", value_name = "METHOD=AMOUNT", value_parser = parse_tender)]
        pay: Vec<(String, String)>,
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// Count the drawer and close the open session
    Close {
        #[arg(long, value_parser = parse_money)]
        amount: Money,
        #[arg(long)]
        note: Option<String>,
    },

    /// Session report (the open session unless --session is given)
    Report {
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Dashboard for the open session
    Status,

    /// Past sessions, newest first
    History {
        /// Only sessions opened on this day (YYYY-MM-DD, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Dine-in table orders
    TableOrder {
        #[command(subcommand)]
        action: TableOrderAction,
    },
}

#[derive(Subcommand, Debug)]
enum TableOrderAction {
    Open { label: String },
    Close { id: String },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Direction {
    Entry,
    Exit,
}

impl From<Direction> for MovementType {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Entry => MovementType::Entry,
            Direction::Exit => MovementType::Exit,
        }
    }
}

fn parse_money(raw: &str) -> Result<Money, String> {
    Money::parse(raw).ok_or_else(|| format!("not a money amount: {raw:?}"))
}

/// Splits `METHOD=AMOUNT`; both halves stay raw for the payment parser.
fn parse_tender(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(method, amount)| (method.to_string(), amount.to_string()))
        .ok_or_else(|| format!("expected METHOD=AMOUNT, got {raw:?}"))
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[{}] {}", error_kind(&err), err);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so report output stays pipeable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: `info,till=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn error_kind(err: &anyhow::Error) -> String {
    if let Some(err) = err.downcast_ref::<ServiceError>() {
        err.kind().to_string()
    } else if let Some(err) = err.downcast_ref::<DbError>() {
        match err {
            DbError::NotFound { .. } => ErrorKind::NotFound.to_string(),
            _ => ErrorKind::Storage.to_string(),
        }
    } else if err.downcast_ref::<ConfigError>().is_some() {
        "CONFIG".to_string()
    } else {
        "ERROR".to_string()
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = TillConfig::load(cli.config)?;
    let db_path = config.database_path()?;
    debug!(path = %db_path.display(), "Using database");

    let db = Database::new(DbConfig::new(db_path).max_connections(config.database.max_connections)).await?;
    let result = dispatch(cli.command, &config, &db).await;
    db.close().await;

    result
}

async fn dispatch(command: Command, config: &TillConfig, db: &Database) -> anyhow::Result<()> {
    let company = config.company();
    let operator = config.operator();
    let desk = CashDeskService::new(db.clone(), config.payments.clone());

    match command {
        Command::Open { amount, note } => {
            let session = desk
                .open_session(&company, &operator, amount, note.as_deref())
                .await?;
            println!("Opened session {} with {}", session.id, session.opening_amount);
        }

        Command::Movement {
            direction,
            amount,
            description,
            method,
            note,
        } => {
            let session = require_open(&desk, &company).await?;
            let input = ManualMovementInput {
                movement_type: direction.into(),
                amount,
                payment_method: method.map(PaymentMethodCode::new),
                description,
                note,
            };
            let movement = desk.post_manual_movement(&session.id, input, &operator).await?;
            println!(
                "Recorded {} of {} ({})",
                movement.movement_type, movement.amount, movement.description
            );
        }

        Command::Checkout {
            sub_total,
            tax,
            delivery_fee,
            discount,
            discount_reason,
            pay,
            customer,
            address,
        } => {
            let checkout = CheckoutService::new(db.clone(), config.payments.clone())
                .require_open_session(config.checkout.require_open_session);
            let (payment_methods, payment_amounts) = pay.into_iter().unzip();

            let request = CheckoutRequest {
                company_id: company.id.clone(),
                amounts: SaleAmounts {
                    sub_total,
                    tax_amount: tax,
                    delivery_fee,
                    discount,
                    discount_reason,
                },
                payment_methods,
                payment_amounts,
                customer_name: customer,
                delivery_address: address,
                ..Default::default()
            };

            let receipt = checkout.checkout(request, &operator).await?;
            println!("Sale {}", receipt.sale.code);
            println!("  Total     {:>12}", receipt.sale.grand_total);
            println!("  Tendered  {:>12}", receipt.tendered_total);
            println!("  Change    {:>12}", receipt.change_total);
            println!("  Method    {:>12}", receipt.primary_method);
            if receipt.session_id.is_none() {
                println!("  (no open cash session: drawer not updated)");
            }
        }

        Command::Close { amount, note } => {
            let session = require_open(&desk, &company).await?;
            let facts = desk
                .close_session(&session.id, &operator, amount, note.as_deref())
                .await?;
            println!("Closed session {}", facts.session_id);
            println!("  Expected  {:>12}", facts.expected_balance);
            println!("  Counted   {:>12}", facts.closing_amount);
            println!("  Difference{:>12}", facts.difference);
        }

        Command::Report { session, json } => {
            let session_id = match session {
                Some(id) => id,
                None => require_open(&desk, &company).await?.id,
            };
            let report = ReportService::new(db.clone(), config.payments.clone())
                .session_report(&company.id, &session_id)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", ReportView(&report));
            }
        }

        Command::Status => match desk.overview(&company.id).await? {
            Some(overview) => {
                print!("{}", ReportView(&overview.report));
                println!("Open table orders: {}", overview.open_table_orders);
                println!("Suggested closing amount: {}", overview.suggested_closing_amount);
            }
            None => println!("No open cash session for {}", company.name),
        },

        Command::History { date, limit } => {
            let history = desk.session_history(&company.id, date, limit).await?;
            print!("{}", HistoryView(&history.sessions));
            println!("{} of {} sessions", history.sessions.len(), history.total_count);
        }

        Command::TableOrder { action } => match action {
            TableOrderAction::Open { label } => {
                let order = desk.open_table_order(&company.id, &label).await?;
                println!("Opened table order {} ({})", order.id, order.label);
            }
            TableOrderAction::Close { id } => {
                desk.close_table_order(&company.id, &id).await?;
                println!("Closed table order {id}");
            }
        },
    }

    info!("Done");
    Ok(())
}

async fn require_open(desk: &CashDeskService, company: &Company) -> anyhow::Result<SessionRecord> {
    let session = desk
        .find_open_session(&company.id)
        .await?
        .ok_or_else(|| ServiceError::from(SessionError::not_open(&company.id)))?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tender_keeps_raw_halves() {
        assert_eq!(
            parse_tender("cash=12,50").unwrap(),
            ("cash".to_string(), "12,50".to_string())
        );
        assert!(parse_tender("CASH").is_err());
    }

    #[test]
    fn test_checkout_arguments() {
        let cli = Cli::try_parse_from([
            "till", "checkout", "--sub-total", "80", "--pay", "PIX=30", "--pay", "CASH=60",
        ])
        .unwrap();

        match cli.command {
            Command::Checkout { sub_total, pay, .. } => {
                assert_eq!(sub_total, Money::from_cents(80_00));
                assert_eq!(pay.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_error_kind_prefix() {
        let err = anyhow::Error::from(ServiceError::from(SessionError::not_open("c1")));
        assert_eq!(error_kind(&err), "NOT_OPEN");

        let err = anyhow::Error::from(ConfigError::NoDataDir);
        assert_eq!(error_kind(&err), "CONFIG");
    }
}
