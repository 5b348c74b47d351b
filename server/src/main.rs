use clap::Parser;
use log::{error, info};
use server::network::Server;
use std::time::Duration;

/// Authoritative server for a two-player paddle duel
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = 60000)]
    port: u16,

    /// Simulation ticks per second
    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let args = Args::parse();
    let tick_rate = args.tick_rate.max(1);
    let tick_duration = Duration::from_secs_f64(1.0 / tick_rate as f64);

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, tick_duration).await?;
    info!("Running at {} ticks per second", tick_rate);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = &result {
                error!("Server stopped with error: {}", e);
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
