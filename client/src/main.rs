use clap::Parser;
use client::config::{parse_smoothing_factor, ClientConfig, GameMode};
use client::input::InputManager;
use client::network::{Connection, OfflineConnection, WebSocketConnection};
use client::rendering::Renderer;
use client::session::{FixedTimestep, Session, TICK_RATE};
use log::{error, info};
use macroquad::prelude::*;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay server WebSocket URL
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080")]
    server: String,

    /// Name shown to other players
    #[arg(short = 'u', long, default_value = "player")]
    username: String,

    /// Fraction of the distance to a remote player's reported position closed per tick
    #[arg(long, default_value = "0.1", value_parser = parse_smoothing_factor)]
    smoothing: f32,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: usize,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: usize,
}

impl Args {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.server.clone(),
            username: self.username.clone(),
            smoothing_factor: self.smoothing,
            ..ClientConfig::default()
        }
    }
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Platformer".to_owned(),
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
    if let Err(e) = run(args).await {
        error!("Client stopped: {}", e);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.config();
    let renderer = Renderer::new(args.width, args.height);

    let mode = loop {
        if let Some(mode) = renderer.draw_menu() {
            break mode;
        }
        next_frame().await;
    };
    info!("Starting {} game", mode.title());
    info!("Controls: arrows or A/D to move, Space to jump, Esc to quit");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("net-io")
        .enable_all()
        .build()?;

    let connection: Box<dyn Connection> = match mode {
        GameMode::Multiplayer => Box::new(WebSocketConnection::from_config(
            &config,
            runtime.handle().clone(),
        )),
        GameMode::Singleplayer => Box::new(OfflineConnection::new()),
    };

    let mut session = Session::new(config, connection);
    session.start();

    let mut timestep = FixedTimestep::new(TICK_RATE);
    let mut input_manager = InputManager::new();

    loop {
        if input_manager.quit_requested() {
            break;
        }

        let input = input_manager.sample();
        let ticks = timestep.advance(Duration::from_secs_f32(get_frame_time()));
        for _ in 0..ticks {
            session.tick(&input, Instant::now());
        }

        renderer.render(&session, mode);
        next_frame().await;
    }

    session.shutdown();
    drop(session);
    runtime.shutdown_timeout(Duration::from_millis(500));
    info!("Goodbye");

    Ok(())
}
