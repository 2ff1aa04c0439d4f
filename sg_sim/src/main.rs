//! Command line runner: one game with simulated players, optional human
//! players typing presses on stdin, display events logged as JSON lines.

use std::{
    io::{self, BufRead},
    path::PathBuf,
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};

use anyhow::{Context, Error, bail};
use ctrlc::set_handler;
use log::{info, warn};
use pico_args::Arguments;
use set_game::{GameConfig, GameError, GameHandle, PlayerId, SlotIndex, table::LogDisplay};

const HELP: &str = "\
Run a set-matching game

USAGE:
  sg_sim [OPTIONS]

OPTIONS:
  --config     PATH        JSON configuration file  [default: SET_* environment variables]
  --players    N           Number of players  [default: config]
  --humans     N           Players driven from stdin, ids 0..N  [default: config]
  --seconds    N           Stop the game after N seconds  [default: run to the end]
  --seed       N           Seed for the deck shuffle  [default: random]

FLAGS:
  --hints                  Log every match on the table after each deal
  -h, --help               Print help information

INPUT:
  Human players press slots by typing `<player> <slot>` lines on stdin.

ENVIRONMENT:
  RUST_LOG                 Log filter (e.g. info, set_game=debug)
  SET_PLAYERS, SET_TABLE_SIZE, SET_TURN_TIMEOUT_MILLIS, ...
  (See GameConfig::from_env for every variable)
";

/// How often the input loop checks whether the game ended
const INPUT_POLL: Duration = Duration::from_millis(100);

struct Args {
    config: Option<PathBuf>,
    players: Option<usize>,
    humans: Option<usize>,
    seconds: Option<u64>,
    seed: Option<u64>,
    hints: bool,
}

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        config: pargs.opt_value_from_str("--config")?,
        players: pargs.opt_value_from_str("--players")?,
        humans: pargs.opt_value_from_str("--humans")?,
        seconds: pargs.opt_value_from_str("--seconds")?,
        seed: pargs.opt_value_from_str("--seed")?,
        hints: pargs.contains("--hints"),
    };
    let rest = pargs.finish();
    if !rest.is_empty() {
        bail!("Unexpected arguments: {rest:?}");
    }

    env_logger::builder().format_target(false).init();

    let config = load_config(&args)?;
    info!(
        "Starting game: {} players ({} human), {} slots",
        config.players, config.human_players, config.table_size
    );
    let humans = config.human_players;

    let game = GameHandle::start(config, Arc::new(LogDisplay))?;

    // Catching signals for graceful shutdown.
    let shutdown = game.shutdown_handle();
    set_handler(move || shutdown.shutdown())?;

    if let Some(seconds) = args.seconds {
        let shutdown = game.shutdown_handle();
        thread::Builder::new()
            .name("time-limit".into())
            .spawn(move || {
                thread::sleep(Duration::from_secs(seconds));
                info!("Time limit of {seconds}s reached");
                shutdown.shutdown();
            })
            .context("failed to start time limit thread")?;
    }

    if humans > 0 {
        forward_presses(&game)?;
    }

    let summary = game.join()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn load_config(args: &Args) -> Result<GameConfig, Error> {
    let mut config = match &args.config {
        Some(path) => GameConfig::from_json_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => GameConfig::from_env()?,
    };

    if let Some(players) = args.players {
        config.players = players;
    }
    if let Some(humans) = args.humans {
        config.human_players = humans;
    }
    if args.seed.is_some() {
        config.random_seed = args.seed;
    }
    if args.hints {
        config.hints = true;
    }

    config.validate()?;
    Ok(config)
}

/// Relays stdin presses to the game until it ends. The reader thread is left
/// blocked on stdin when the game finishes first.
fn forward_presses(game: &GameHandle) -> Result<(), Error> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                match parse_press(&line) {
                    Some(press) => {
                        if tx.send(press).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!("Ignoring input {line:?}, expected `<player> <slot>`"),
                }
            }
        })
        .context("failed to start stdin thread")?;

    while !game.is_finished() {
        let (player, slot) = match rx.recv_timeout(INPUT_POLL) {
            Ok(press) => press,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        match game.key_pressed(player, slot) {
            Ok(true) => {}
            Ok(false) | Err(GameError::GameOver) => break,
            Err(e) => warn!("{e}"),
        }
    }
    Ok(())
}

fn parse_press(line: &str) -> Option<(PlayerId, SlotIndex)> {
    let mut parts = line.split_whitespace();
    let player = parts.next()?.parse().ok()?;
    let slot = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((player, slot))
}
