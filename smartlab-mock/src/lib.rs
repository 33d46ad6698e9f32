use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::app::create_app;
use crate::settings::Settings;

pub mod app;
pub mod errors;
pub mod handles;
pub mod middlewares;
pub mod services;
pub mod settings;

pub async fn run(settings: &Arc<Settings>) -> anyhow::Result<()> {
    let app = create_app(settings)?;

    let ip_addr = settings.server.host.parse::<IpAddr>()?;

    let address = SocketAddr::from((ip_addr, settings.server.port));

    let listener = TcpListener::bind(&address).await?;

    tracing::info!("listening on {:?}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serves the mock on an ephemeral loopback port in the background.
pub async fn spawn(settings: &Settings) -> anyhow::Result<SocketAddr> {
    let app = create_app(settings)?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("mock backend stopped: {}", e);
        }
    });

    Ok(address)
}
