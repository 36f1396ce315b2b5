//! Example: Arm, poll and disarm a panel over its remote port.

use dmp_bridge::{CommandReply, CommandSender, PanelConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = PanelConfig::builder()
        .account_number("12345")
        .panel_ip("192.168.0.100")
        .remote_port(2001)
        .build();
    let sender = CommandSender::new(&config);

    // Show current area and zone status
    let report = sender.status(config.area_count).await?;
    for (key, value) in report.attributes() {
        println!("{} {}", key, value);
    }

    println!("\nArming home area {}...", config.home_area);
    match sender.arm(&config.home_area, false).await {
        Ok(CommandReply::Ack) => println!("Arm acknowledged"),
        Ok(reply) => println!("Arm not acknowledged: {:?}", reply),
        Err(e) => println!("Error arming: {}", e),
    }

    // Wait a bit then disarm
    tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

    println!("\nDisarming areas {}...", config.all_areas());
    match sender.disarm(&config.all_areas()).await {
        Ok(CommandReply::Ack) => println!("Disarm acknowledged"),
        Ok(reply) => println!("Disarm not acknowledged: {:?}", reply),
        Err(e) => println!("Error disarming: {}", e),
    }

    Ok(())
}
