//! CLI application for finding and controlling myStrom devices.
//!
//! Run with: cargo run --example mystrom_cli -- --help

use std::net::IpAddr;
use std::pin::pin;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use mystrom_rs::{DeviceRegistry, DiscoveryConfig, Listener};

#[derive(Parser)]
#[command(name = "mystrom")]
#[command(about = "Control myStrom devices in your local network", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search myStrom devices in your local network
    Find {
        /// Keep listening until manually stopped (Ctrl+C)
        #[arg(long)]
        live: bool,

        /// Seconds to wait for each announcement (default: 5)
        #[arg(short, long, default_value = "5")]
        timeout: u64,
    },

    /// Show identity and settings of a device
    Info {
        #[arg(short, long)]
        ip: IpAddr,
    },

    /// Turn a switch or bulb on
    On {
        #[arg(short, long)]
        ip: IpAddr,
    },

    /// Turn a switch or bulb off
    Off {
        #[arg(short, long)]
        ip: IpAddr,
    },

    /// Toggle a switch or bulb
    Toggle {
        #[arg(short, long)]
        ip: IpAddr,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Find { live, timeout } => {
            let config =
                DiscoveryConfig::default().with_receive_timeout(Duration::from_secs(timeout));
            let mut listener = Listener::bind(config).await?;

            if live {
                let stream = listener
                    .find_continuous()
                    .take_until(async {
                        let _ = tokio::signal::ctrl_c().await;
                    });
                let mut stream = pin!(stream);
                while let Some(device) = stream.next().await {
                    let device = device?;
                    println!("  {:<22} {}  {}", device.type_name(), device.mac(), device.ip());
                }
            } else {
                let devices = listener.find_all().await?;
                if devices.is_empty() {
                    println!("No devices found on the network.");
                } else {
                    println!("\nFound {} device(s):", devices.len());
                    for device in devices {
                        println!("  {:<22} {}  {}", device.type_name(), device.mac(), device.ip());
                    }
                }
            }

            listener.close();
        }

        Commands::Info { ip } => {
            let registry = DeviceRegistry::new()?;
            let device = registry.resolve_by_address(ip).await?;
            device.fetch_settings().await?;

            println!("{device}");
            println!("  Type:    {} ({:?})", device.type_name(), device.kind());
            if let Some(version) = device.version() {
                println!("  Version: {version}");
            }
            let mut settings: Vec<_> = device.settings().into_iter().collect();
            settings.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, value) in settings {
                println!("  {key}: {value}");
            }

            if let Some(switch) = device.as_switch() {
                let report = switch.report().await?;
                println!(
                    "  Relay:   {}  Power: {:.1} W",
                    if report.relay { "ON" } else { "OFF" },
                    report.power
                );
            }
            if let Some(bulb) = device.as_bulb() {
                let state = bulb.state().await?;
                println!(
                    "  Light:   {}  Color: {}",
                    if state.on { "ON" } else { "OFF" },
                    state.color.as_deref().unwrap_or("-")
                );
            }
        }

        Commands::On { ip } | Commands::Off { ip } | Commands::Toggle { ip } => {
            let registry = DeviceRegistry::new()?;
            let device = registry.resolve_by_address(ip).await?;

            if let Some(switch) = device.as_switch() {
                match cli.command {
                    Commands::On { .. } => switch.turn_on().await?,
                    Commands::Off { .. } => switch.turn_off().await?,
                    _ => {
                        let on = switch.toggle().await?;
                        println!("Relay is now {}", if on { "ON" } else { "OFF" });
                    }
                }
            } else if let Some(bulb) = device.as_bulb() {
                let state = match cli.command {
                    Commands::On { .. } => bulb.turn_on().await?,
                    Commands::Off { .. } => bulb.turn_off().await?,
                    _ => bulb.toggle().await?,
                };
                println!("Light is now {}", if state.on { "ON" } else { "OFF" });
            } else {
                eprintln!("{} cannot be switched", device);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
