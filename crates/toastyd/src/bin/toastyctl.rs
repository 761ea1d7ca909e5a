//! toastyctl - kiosk and operator client for toastyd
//!
//! Sends one command over the service socket and prints the JSON response.
//! Exits non-zero when the response carries an error code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use toasty_api::Command;
use toasty_ipc::IpcClient;
use toasty_util::{default_socket_path, BedNum, CustomerId, FobNum};

#[derive(Parser, Debug)]
#[command(name = "toastyctl")]
#[command(about = "Talk to the toastyd service", long_about = None)]
struct Args {
    /// Socket path (or set TOASTY_SOCKET env var)
    #[arg(short, long, env = "TOASTY_SOCKET", default_value_os_t = default_socket_path())]
    socket: PathBuf,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Present a fob and ask for admission
    Login {
        /// Fob number, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_fob)]
        fob: u64,
    },
    /// Cancel the customer's session in progress
    Cancel { customer_id: i64 },
    /// Start a bed for an admitted customer
    Start {
        #[arg(long)]
        bed: u32,
        #[arg(long)]
        minutes: u32,
        #[arg(long)]
        customer: i64,
    },
    /// List beds available to a customer
    Beds { customer_id: i64 },
    /// Newest sessions for reconciliation
    Sessions {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Service health
    Health,
    Ping,
}

impl Action {
    fn into_command(self) -> Command {
        match self {
            Action::Login { fob } => Command::CustomerLogin {
                fob_num: FobNum::new(fob),
            },
            Action::Cancel { customer_id } => Command::CancelSession {
                customer_id: CustomerId::new(customer_id),
            },
            Action::Start {
                bed,
                minutes,
                customer,
            } => Command::StartBed {
                bed_num: BedNum::new(bed),
                minutes,
                customer_id: CustomerId::new(customer),
            },
            Action::Beds { customer_id } => Command::BedStatus {
                customer_id: CustomerId::new(customer_id),
            },
            Action::Sessions { limit } => Command::RecentSessions { limit },
            Action::Health => Command::GetHealth,
            Action::Ping => Command::Ping,
        }
    }
}

fn parse_fob(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid fob number {:?}: {}", s, e))
}

async fn run(args: Args) -> Result<bool> {
    let mut client = IpcClient::connect(&args.socket)
        .await
        .with_context(|| format!("Failed to connect to {}", args.socket.display()))?;

    let response = client
        .send(args.action.into_command())
        .await
        .context("Request failed")?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.is_success())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
