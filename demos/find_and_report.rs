//! Find all myStrom devices on the network and print what each one reports.
//!
//! This example demonstrates:
//! - A bounded discovery scan
//! - Fetching settings to learn each device's name
//! - Reading power and temperature from switches
//!
//! Run with: cargo run --example find_and_report

use mystrom_rs::{DiscoveryConfig, Listener};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Listening for myStrom announcements...");

    let mut listener = Listener::bind(DiscoveryConfig::default()).await?;
    let devices = listener.find_all().await?;
    listener.close();

    if devices.is_empty() {
        println!("No devices found on the network.");
        return Ok(());
    }

    for device in devices {
        if let Err(e) = device.fetch_settings().await {
            eprintln!("  ✗ {}: {}", device.mac(), e);
            continue;
        }
        println!("{device}");

        let Some(switch) = device.as_switch() else {
            continue;
        };
        match switch.report().await {
            Ok(report) => println!(
                "    relay {}  {:.1} W",
                if report.relay { "on" } else { "off" },
                report.power
            ),
            Err(e) => eprintln!("    report failed: {}", e),
        }
        if let Ok(temp) = switch.temperature().await {
            println!("    {:.1} °C", temp.compensated);
        }
    }

    Ok(())
}
