use clap::Parser;
use client::network::ProbeClient;
use client::walk::jitter;
use log::{info, warn};
use shared::Coordinate;
use std::time::Duration;
use tokio::time::interval;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server URL to connect to
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080")]
    server: String,

    /// Team to join
    #[arg(short = 't', long, default_value = "Red")]
    team: String,

    /// Latitude in degrees
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    lat: f64,

    /// Longitude in degrees
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    lon: f64,

    /// Milliseconds between location reports
    #[arg(short = 'i', long, default_value = "1000")]
    interval_ms: u64,

    /// Maximum random offset in meters applied to each report
    #[arg(short = 'j', long, default_value = "0")]
    jitter: f64,

    /// Number of reports to send before exiting (0 runs until Ctrl+C)
    #[arg(short = 'n', long, default_value = "0")]
    updates: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let origin = Coordinate::new(args.lat, args.lon);

    let mut probe = ProbeClient::connect(&args.server).await?;
    probe.join_team(&args.team).await?;

    let mut rng = rand::thread_rng();
    let mut report_interval = interval(Duration::from_millis(args.interval_ms.max(1)));
    let mut sent = 0u32;

    loop {
        tokio::select! {
            _ = report_interval.tick() => {
                if args.updates > 0 && sent >= args.updates {
                    break;
                }

                let position = jitter(origin, args.jitter, &mut rng);
                probe.report_location(position).await?;
                sent += 1;
            },

            update = probe.next_update() => {
                match update {
                    Ok(nearby) if nearby.is_empty() => info!("No teams nearby"),
                    Ok(nearby) => {
                        for team in nearby {
                            info!("- {}: {} meters away", team.team_name, team.distance.round());
                        }
                    }
                    Err(e) => {
                        warn!("Stopping: {}", e);
                        return Ok(());
                    }
                }
            },

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, disconnecting");
                break;
            },
        }
    }

    probe.close().await?;
    Ok(())
}
