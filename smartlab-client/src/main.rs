use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use smartlab_client::cli::{self, Cli};
use smartlab_client::configs::Settings;
use smartlab_client::notify::{Confirmer, TerminalConfirmer, TerminalNotifier};
use smartlab_client::{
    AuthGateway, AutoConfirm, ControlPanel, FileSessionStore, LabApi, MemorySessionStore, Mode,
    Notice, Notifier, SessionHandle, SessionStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            TerminalNotifier.notify(Notice::Error(format!("Failed to load settings: {}", e)));
            return ExitCode::FAILURE;
        }
    };
    if let Some(base_url) = cli.base_url.clone() {
        settings.api.base_url = base_url;
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.logger.level.as_str();

            format!("{app_name}={level}").into()
        }))
        .init();

    let panel = match build_panel(&cli, &settings).await {
        Ok(panel) => panel,
        Err(e) => {
            tracing::error!("{:#}", e);
            TerminalNotifier.notify(Notice::Error(format!("{:#}", e)));
            return ExitCode::FAILURE;
        }
    };

    // Failures were already shown by the panel.
    match cli::execute(&panel, cli.command, &mut std::io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

async fn build_panel(cli: &Cli, settings: &Settings) -> anyhow::Result<ControlPanel> {
    let store: Arc<dyn SessionStore> = if settings.session.in_memory {
        Arc::new(MemorySessionStore::new())
    } else {
        Arc::new(FileSessionStore::new(settings.session_path()))
    };
    let session = SessionHandle::load(store)
        .await
        .context("Failed to load the stored session")?;

    let gateway =
        AuthGateway::new(settings, session).context("Failed to set up the HTTP client")?;
    tracing::debug!(base_url = gateway.base_url(), "using backend");

    let confirmer: Arc<dyn Confirmer> = if cli.command.skips_confirmation() {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(TerminalConfirmer)
    };
    let mode = if cli.command.is_student_view() {
        Mode::Student
    } else {
        Mode::Teacher
    };

    Ok(
        ControlPanel::new(LabApi::new(gateway), Arc::new(TerminalNotifier), confirmer)
            .with_mode(mode),
    )
}
