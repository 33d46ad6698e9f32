use std::io::Write;

use clap::{Parser, Subcommand};
use smartlab_api::models::{DeviceStatus, Id};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::{Error, Result};
use crate::panel::ControlPanel;
use crate::render::regions;

/// Smart school lab control panel.
#[derive(Parser, Debug)]
#[command(name = "smartlab", about = "Control smart lab devices from the terminal")]
pub struct Cli {
    /// Backend base URL, overrides the configured one.
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and show the dashboard for your role.
    Login {
        username: String,
        /// Password; prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session.
    Logout,

    /// Show which dashboard your role opens.
    Dashboard,

    /// List devices.
    Devices {
        /// Read-only student view.
        #[arg(long)]
        student: bool,
    },

    /// Show one device.
    Device { id: Id },

    /// Switch a device on or off. Without `--to` the current status is flipped.
    Toggle {
        id: Id,
        #[arg(long = "to")]
        to: Option<DeviceStatus>,
    },

    /// Set on/off times for a device.
    Schedule {
        id: Id,
        #[arg(long = "on")]
        on_time: String,
        #[arg(long = "off")]
        off_time: String,
    },

    /// Ask for access to a device.
    RequestAccess { id: Id },

    /// Show the usage log.
    Logs {
        /// Device name or id; `All` shows everything.
        #[arg(long)]
        device: Option<String>,
    },

    /// Delete usage logs older than one day.
    DeleteLogs {
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Usage hours per device.
    Analytics,

    /// Call the protected test route.
    Protected,
}

impl Commands {
    pub fn is_student_view(&self) -> bool {
        matches!(self, Commands::Devices { student: true })
    }

    pub fn skips_confirmation(&self) -> bool {
        matches!(self, Commands::DeleteLogs { yes: true })
    }
}

/// Runs one command and writes the resulting screen regions to `out`. Every
/// failure has been shown to the user by the time this returns.
pub async fn execute<W: Write>(panel: &ControlPanel, command: Commands, out: &mut W) -> Result<()> {
    let result = dispatch(panel, command, out).await;

    // Panel operations report their own failures; terminal I/O does not go
    // through the panel.
    if let Err(err @ Error::Terminal { .. }) = &result {
        panel.report(err);
    }
    result
}

async fn dispatch<W: Write>(panel: &ControlPanel, command: Commands, out: &mut W) -> Result<()> {
    match command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password().await?,
            };
            panel.login(&username, &password).await?;
        }
        Commands::Logout => panel.logout().await?,
        Commands::Dashboard => {
            panel.dashboard().await?;
        }
        Commands::Devices { .. } => {
            panel.load_devices().await?;
            print_region(panel, regions::DEVICES, out)?;
        }
        Commands::Device { id } => {
            let device = panel.device(id).await?;
            writeln!(
                out,
                "[{}] {} - Status: {}",
                device.id, device.name, device.status
            )
            .map_err(Error::terminal)?;
            if let Some(hours) = device.total_usage_hours {
                writeln!(out, "Total usage: {:.1} h", hours).map_err(Error::terminal)?;
            }
        }
        Commands::Toggle { id, to } => {
            match to {
                Some(next) => panel.toggle(id, next).await?,
                None => {
                    panel.load_devices().await?;
                    panel.toggle_rendered(id).await?
                }
            };
            print_region(panel, regions::DEVICES, out)?;
            print_region(panel, regions::LOGS, out)?;
        }
        Commands::Schedule {
            id,
            on_time,
            off_time,
        } => {
            panel.schedule(id, &on_time, &off_time).await?;
            print_region(panel, regions::LOGS, out)?;
        }
        Commands::RequestAccess { id } => {
            panel.request_access(id).await?;
            print_region(panel, regions::LOGS, out)?;
        }
        Commands::Logs { device } => {
            panel.load_logs(device.as_deref()).await?;
            print_region(panel, regions::LOGS, out)?;
        }
        Commands::DeleteLogs { .. } => {
            if panel.delete_logs().await?.is_some() {
                print_region(panel, regions::LOGS, out)?;
            }
        }
        Commands::Analytics => {
            panel.load_analytics().await?;
            print_region(panel, regions::ANALYTICS, out)?;
        }
        Commands::Protected => {
            let response = panel.protected().await?;
            writeln!(out, "{}", response.message).map_err(Error::terminal)?;
        }
    }

    Ok(())
}

fn print_region<W: Write>(panel: &ControlPanel, name: &str, out: &mut W) -> Result<()> {
    for line in panel.screen().lines(name) {
        writeln!(out, "{}", line).map_err(Error::terminal)?;
    }
    Ok(())
}

/// An empty answer is passed on; the panel rejects it like any other login.
async fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush().map_err(Error::terminal)?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(Error::terminal)?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
