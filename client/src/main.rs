use clap::Parser;
use client::app::{run_offline, OnlineApp};
use log::info;
use macroquad::window::Conf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:60000")]
    server: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: usize,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: usize,

    /// Play single-player Breakout without a server
    #[arg(long)]
    offline: bool,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Paddle Duel".to_string(),
        window_width: args.width as i32,
        window_height: args.height as i32,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Controls: A/D to move, Space to launch, Enter to confirm, Escape to quit");

    if args.offline {
        info!("Offline Breakout mode");
        run_offline(args.width, args.height).await;
    } else {
        info!("Server: {}", args.server);
        let mut app = OnlineApp::new(&args.server, args.width, args.height);
        app.run().await;
    }
}
