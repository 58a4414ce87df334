// Main entry point - configuration, logging and wiring
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::application::detail_binder::DeviceDetailBinder;
use crate::application::fleet_binder::FleetViewBinder;
use crate::application::history_loader::HistoryLoader;
use crate::application::stream_client::StreamClient;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::http_history::HttpHistorySource;
use crate::infrastructure::sse_transport::SseTransport;
use crate::presentation::console::{run_detail, run_fleet};
use crate::presentation::detail_page::DetailPage;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = load_app_config()?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let transport = SseTransport::new(
        Duration::from_millis(config.stream.retry_ms),
        config.stream.channel_capacity,
    );
    let mut client = StreamClient::new(transport);
    let subscription = client.open(&config.events_url())?;
    let mut stdout = std::io::stdout();

    let run = async {
        match config.view.device_id.clone() {
            Some(device_id) => {
                tracing::info!("Following device {}", device_id);
                let page = DetailPage::new(&device_id);
                let binder = DeviceDetailBinder::new(device_id)
                    .with_live_sink(page.clone())
                    .with_history_sink(page.clone());
                let loader =
                    HistoryLoader::new(Arc::new(HttpHistorySource::new(&config.server.base_url)));
                run_detail(subscription, binder, loader, &page, &mut stdout).await
            }
            None => {
                let mut binder = FleetViewBinder::new();
                run_fleet(subscription, &mut binder, &mut stdout).await
            }
        }
    };

    tokio::select! {
        result = run => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
    }

    Ok(())
}
