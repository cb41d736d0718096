//! autocapture - console front end
//!
//! Runs the automation against the in-memory demo world and takes commands
//! from stdin. Ctrl-C stops the automation and exits.

mod commands;
mod config;
mod world;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use autocapture_core::domain::AreaId;
use autocapture_core::impls::TracingEventSink;
use autocapture_core::{Automation, Strategy};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::{Command, HELP};
use config::Settings;

#[derive(Parser)]
#[command(name = "autocapture")]
#[command(about = "Unattended area capture automation")]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Auth token
    #[arg(long, env = "AUTOCAPTURE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Strategy flags, comma separated (e.g. "TopDown,MostDifficultAreasFirst")
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Round duration in seconds
    #[arg(long)]
    round_duration: Option<u64>,

    /// Force a target area
    #[arg(long)]
    area: Option<String>,

    /// Do not start the automation until `resume`
    #[arg(long)]
    paused: bool,

    /// Seed for FocusRandomArea
    #[arg(long)]
    seed: Option<u64>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let mut engine_config = settings
        .engine_config()
        .context("invalid settings")?;
    if let Some(token) = args.token {
        engine_config.token = token;
    }
    if let Some(strategy) = args.strategy {
        engine_config.strategy = strategy;
    }
    if let Some(secs) = args.round_duration {
        engine_config.round_duration = Duration::from_secs(secs);
    }
    if args.area.is_some() {
        engine_config.override_area = AreaId::parse_active(args.area.as_deref());
    }
    info!(strategy = %engine_config.strategy, round = ?engine_config.round_duration, "configuration loaded");

    let service = world::service();
    service.simulate_progress(true).await;
    // nothing reads the call log here
    service.limit_call_log(0).await;
    let mut automation = Automation::new(Arc::new(service), Arc::new(TracingEventSink), engine_config);
    if let Some(seed) = args.seed {
        automation = automation.with_seed(seed);
    }

    if settings.starts_enabled() && !args.paused {
        automation.start();
    } else {
        println!("automation paused, type `resume` to start");
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                info!("interrupted");
                break;
            }
            line = lines.next_line(), if stdin_open => {
                // without a console keep running until ctrl-c
                let Some(line) = line.context("failed to read stdin")? else {
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => handle(&mut automation, command).await,
                    Err(err) => println!("{err}"),
                }
            }
        }
    }

    automation.stop_and_wait().await;
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn handle(automation: &mut Automation, command: Command) {
    match command {
        Command::Pause => {
            if automation.is_active() {
                automation.stop_and_wait().await;
                println!("paused");
            } else {
                println!("already paused");
            }
        }
        Command::Resume => {
            if automation.start() {
                println!("resumed");
            } else {
                println!("already running");
            }
        }
        Command::Status => print_status(automation).await,
        Command::Strategy(strategy) => {
            automation.set_strategy(strategy);
            println!("strategy: {strategy}");
        }
        Command::Area(area) => {
            match &area {
                Some(id) => println!("target area: {id}"),
                None => println!("target area cleared"),
            }
            automation.set_override_area(area);
        }
        Command::Duration(duration) => {
            automation.set_round_duration(duration);
            println!("round duration: {}s", duration.as_secs());
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

async fn print_status(automation: &Automation) {
    let view = automation.status().view(Instant::now());
    let config = automation.config();
    let state = if automation.is_active() { "running" } else { "paused" };
    println!("{state}, phase {:?}", view.phase);
    println!("strategy: {}", config.strategy);
    println!(
        "round: {}s, target area: {}",
        config.round_duration.as_secs(),
        config
            .override_area
            .as_ref()
            .map_or_else(|| "(strategy)".to_string(), ToString::to_string)
    );
    match (&view.join.area, view.join.subarea) {
        (Some(area), Some(position)) => println!(
            "in area {area}, subarea {position} for {}s",
            view.join.seconds_in_subarea.unwrap_or_default()
        ),
        (Some(area), None) => println!("in area {area}"),
        _ => println!("not in any area"),
    }
    if let Some(player) = automation.player().await {
        println!(
            "level {}, score {}/{}",
            player.level, player.score, player.next_level_score
        );
    }
    for area in automation.areas().await.iter().filter(|a| a.state.running) {
        println!("  {}", area.summary());
    }
}
