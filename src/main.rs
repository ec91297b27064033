//! dodgescroll — side-scrolling dodge-and-collect arcade game in the terminal.

mod app;
mod game;
mod input;
mod theme;
mod ui;

use anyhow::{Result, ensure};
use app::App;
use clap::Parser;

/// Simulation parameters derived from the CLI.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    /// Real and simulated duration of one tick.
    pub tick_ms: u64,
    /// Interval between scroll-and-spawn passes; a multiple of `tick_ms`.
    pub scroll_ms: u64,
    /// Obstacle hits that end the game.
    pub avoid_limit: u32,
    pub obstacle_chance: f64,
    pub reward_chance: f64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(
        (0.0..=1.0).contains(&args.obstacle_chance)
            && (0.0..=1.0).contains(&args.reward_chance)
            && args.obstacle_chance + args.reward_chance <= 1.0,
        "spawn chances must be in [0, 1] and sum to at most 1"
    );
    ensure!(
        args.scroll_ms >= args.tick_ms && args.scroll_ms % args.tick_ms == 0,
        "--scroll-ms must be a multiple of --tick-ms"
    );
    let theme = theme::Theme::load(args.theme.as_deref()).unwrap_or_default();
    let config = GameConfig {
        rows: args.rows as usize,
        cols: args.cols as usize,
        tick_ms: args.tick_ms,
        scroll_ms: args.scroll_ms,
        avoid_limit: args.avoid_limit,
        obstacle_chance: args.obstacle_chance,
        reward_chance: args.reward_chance,
        seed: args.seed,
    };
    let mut app = App::new(config, theme);
    let score = app.run()?;
    println!("Final score: {score}");
    Ok(())
}

/// Side-scrolling dodge-and-collect arcade game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "dodgescroll",
    version,
    about = "Dodge the obstacles, collect the rewards. Three hits and it's over.",
    long_about = "Your icon sits in the leftmost column; obstacles and rewards stream \
        in from the right and scroll toward you.\n\n\
        Move up and down to collect rewards (each is one point) and dodge obstacles \
        (the game ends after --avoid-limit hits).\n\n\
        CONTROLS:\n  Up/k  Move up   Down/j  Move down\n  p     Pause     q / Esc  Quit   r  Restart (after game over)\n\n\
        Use --seed for a reproducible run and --theme to load a btop-style theme."
)]
pub struct Args {
    /// Board height in rows.
    #[arg(long, default_value = "10", value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub rows: u16,

    /// Board width in columns.
    #[arg(long, default_value = "15", value_name = "N", value_parser = clap::value_parser!(u16).range(2..))]
    pub cols: u16,

    /// Tick duration in ms (movement cadence).
    #[arg(long, default_value = "100", value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Scroll-and-spawn interval in ms; must be a multiple of --tick-ms.
    #[arg(long, default_value = "400", value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub scroll_ms: u64,

    /// Obstacle hits before the game ends.
    #[arg(long, default_value = "3", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub avoid_limit: u32,

    /// Probability of spawning an obstacle per scroll pass.
    #[arg(long, default_value = "0.4", value_name = "P")]
    pub obstacle_chance: f64,

    /// Probability of spawning a reward per scroll pass.
    #[arg(long, default_value = "0.2", value_name = "P")]
    pub reward_chance: f64,

    /// RNG seed for a reproducible object stream.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]="value"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,
}
