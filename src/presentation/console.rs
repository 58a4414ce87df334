// Console loops - drive the binders from the subscription and print the view
use crate::application::detail_binder::DeviceDetailBinder;
use crate::application::fleet_binder::FleetViewBinder;
use crate::application::history_loader::HistoryLoader;
use crate::application::stream_client::{StreamEvent, Subscription};
use crate::presentation::detail_page::DetailPage;
use crate::presentation::fleet_table::render_fleet;
use std::io::Write;

/// Runs until the subscription ends.
pub async fn run_fleet<W: Write>(
    mut subscription: Subscription,
    binder: &mut FleetViewBinder,
    out: &mut W,
) -> std::io::Result<()> {
    while let Some(event) = subscription.next().await {
        match event {
            StreamEvent::Snapshot(snapshot) => {
                binder.apply(&snapshot);
            }
            StreamEvent::Connection(state) => tracing::info!("Devices stream {}", state),
            StreamEvent::Diagnostic(_) => {}
        }
        writeln!(out, "{}", render_fleet(binder.view(), subscription.connection_state()))?;
    }
    Ok(())
}

/// The history fetch runs alongside the stream; neither waits for the other.
pub async fn run_detail<W: Write>(
    mut subscription: Subscription,
    mut binder: DeviceDetailBinder,
    mut loader: HistoryLoader,
    page: &DetailPage,
    out: &mut W,
) -> std::io::Result<()> {
    let device_id = binder.device_id().to_string();
    let history = loader.load(&device_id);
    tokio::pin!(history);
    let mut history_pending = true;

    loop {
        tokio::select! {
            payload = &mut history, if history_pending => {
                history_pending = false;
                if let Some(payload) = payload {
                    binder.accept_history(payload);
                }
            }
            event = subscription.next() => {
                match event {
                    Some(StreamEvent::Snapshot(snapshot)) => {
                        binder.apply_snapshot(&snapshot);
                    }
                    Some(StreamEvent::Connection(state)) => {
                        tracing::info!("Devices stream {}", state);
                    }
                    Some(StreamEvent::Diagnostic(_)) => {}
                    None => break,
                }
            }
        }
        writeln!(out, "{}", page.render(subscription.connection_state()))?;
    }
    Ok(())
}
