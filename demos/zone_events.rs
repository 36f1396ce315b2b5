//! Example: Subscribe to bridge events and print decoded zone activity.

use dmp_bridge::constants::describe_event;
use dmp_bridge::{BridgeEvent, DmpListener, ListenerConfig, PanelConfig, ZoneClass};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut listener = DmpListener::bind(ListenerConfig::default()).await?;
    let panel = listener
        .add_panel(
            PanelConfig::builder()
                .account_number("12345")
                .zone("1", "Front Door", ZoneClass::WiredDoor)
                .zone("5", "Smoke", ZoneClass::BatterySmoke)
                .build(),
        )
        .await?;
    let mut events = listener.subscribe();
    listener.start();

    println!("Listening for zone events (Ctrl+C to stop)...\n");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(BridgeEvent::EventDecoded { account, code }) => {
                        println!("{}: {}", account, describe_event(&code));
                        for (number, record) in panel.snapshot().await.statuses() {
                            println!("  Zone {} ({}): {}", number, record.name, record.status);
                        }
                    }
                    Ok(BridgeEvent::UnknownAccount { account, peer }) => {
                        println!("Unknown account {} from {}", account, peer);
                    }
                    Ok(event) => {
                        println!("Event: {:?}", event);
                    }
                    Err(e) => {
                        println!("Event channel error: {}", e);
                        break;
                    }
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
