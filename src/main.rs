use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chess_referee::board::Color;
use chess_referee::config::EngineConfig;
use chess_referee::console::Console;
use chess_referee::game::GameState;
use chess_referee::opponent::LocalOnly;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AiColor {
    White,
    Black,
    None,
}

#[derive(Debug, Parser)]
#[command(name = "chess-referee", about = "Play chess against a one-ply engine in the terminal")]
struct Args {
    /// JSON engine config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting position
    #[arg(long)]
    fen: Option<String>,

    /// Side played by the engine
    #[arg(long, value_enum)]
    ai_color: Option<AiColor>,

    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(color) = args.ai_color {
        config.automated_color = match color {
            AiColor::White => Some(Color::White),
            AiColor::Black => Some(Color::Black),
            AiColor::None => None,
        };
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    let game = match &args.fen {
        Some(fen) => GameState::from_fen(fen).context("parsing --fen")?,
        None => GameState::new(),
    };

    info!(fen = %game.to_fen(), automated = ?config.automated_color, "starting session");
    let mut console = Console::new(game, config, LocalOnly);
    console.run().await
}
