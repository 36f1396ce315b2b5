//! Example: Listen for panel telegrams and print the panel state on every change.

use std::sync::Arc;

use dmp_bridge::{DmpListener, ListenerConfig, PanelConfig, ZoneClass};
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut listener = DmpListener::bind(
        ListenerConfig::builder().listen_port(2011).build(),
    )
    .await?;

    let panel = listener
        .add_panel(
            PanelConfig::builder()
                .name("House")
                .account_number("12345")
                .panel_ip("192.168.0.100")
                .zone("1", "Front Door", ZoneClass::WiredDoor)
                .zone("2", "Kitchen Window", ZoneClass::BatteryWindow)
                .zone("3", "Hall Motion", ZoneClass::WiredMotion)
                .build(),
        )
        .await?;

    let changed = Arc::new(Notify::new());
    {
        let changed = changed.clone();
        listener
            .register_callback(Arc::new(move || changed.notify_one()))
            .await;
    }
    listener.start();
    println!("Listening on {} (Ctrl+C to stop)...\n", listener.local_addr());

    loop {
        tokio::select! {
            _ = changed.notified() => {
                let area = panel.area().await;
                println!("{}: {}", area.name, area.state);
                for (number, record) in panel.snapshot().await.statuses() {
                    println!("  Zone {}: {:20} {}", number, record.name, record.status);
                }
                if let Some(contact) = panel.contact_time().await {
                    println!("  last contact {}", contact);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping...");
                break;
            }
        }
    }

    listener.stop().await;
    Ok(())
}
