//! Terminal driver for a Khulark game session.
//!
//! Loads `khulark-config.yaml` (or the path given as the first argument),
//! opens the saved creature, ticks decay on an interval, and reads player
//! commands from stdin. Photo feeding talks to the feed-photo worker at
//! `feed.endpoint`.

mod commands;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use khulark_core::clock::{Clock, SystemClock};
use khulark_core::config::GameConfig;
use khulark_core::session::{
    ActionOutcome, FeedOutcome, GameSession, Reaction, Rejection, SessionEvent,
};
use khulark_core::storage::FileStorage;
use khulark_types::Decision;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, CommandError, HELP};

/// Config file read when no path is given.
const DEFAULT_CONFIG_PATH: &str = "khulark-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        config = %config_path.display(),
        endpoint = config.feed.endpoint,
        save_dir = %config.storage.save_dir.display(),
        "khulark-play starting"
    );

    let storage = FileStorage::new(&config.storage.save_dir, &config.storage.key);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tick_interval = Duration::from_millis(config.session.tick_interval_ms.max(1));
    let session = GameSession::open(config, Box::new(storage), Arc::clone(&clock))
        .context("failed to open game session")?;

    println!("{HELP}");
    print_status(&session);

    let stdin = BufReader::new(tokio::io::stdin());
    let session = play(session, clock.as_ref(), tick_interval, stdin, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        println!();
    })
    .await?;

    let stats = session.stats();
    info!(
        hunger = stats.hunger,
        affection = stats.affection,
        sanity = stats.sanity,
        "game saved, bye"
    );
    Ok(())
}

/// Run the session until `quit`, end of input, or `shutdown` resolves.
///
/// `shutdown` is polled across every iteration, so a signal that arrives
/// while a command is in flight ends the loop right after that command.
/// The session is ticked one last time before it is handed back.
async fn play<R, S>(
    mut session: GameSession,
    clock: &dyn Clock,
    tick_interval: Duration,
    input: R,
    shutdown: S,
) -> anyhow::Result<GameSession>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut events = session.subscribe();
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.tick().await;
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                session.tick(clock.now());
            }
            event = events.recv() => match event {
                Ok(SessionEvent::BodyStateChanged { old, new }) => {
                    println!("* the khulark went from {old} to {new}");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer lagged"),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => run(&mut session, command).await,
                    Err(CommandError::Empty) => {}
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    session.tick(clock.now());
    Ok(session)
}

/// Read the game config, falling back to defaults when the file is absent.
fn load_config(path: &Path) -> anyhow::Result<GameConfig> {
    if path.exists() {
        return GameConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()));
    }
    let mut config = GameConfig::default();
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

async fn run(session: &mut GameSession, command: Command) {
    match command {
        Command::Status => print_status(session),
        Command::Feed(path) => match tokio::fs::read(&path).await {
            Ok(photo) => match session.feed_photo(photo).await {
                FeedOutcome::Reacted(reaction) => print_reaction(&reaction),
                FeedOutcome::Rejected(rejection) => print_rejection(&rejection),
            },
            Err(e) => println!("cannot read {}: {e}", path.display()),
        },
        Command::Pet => print_action(&session.pet()),
        Command::Snack => print_action(&session.snack()),
        Command::Sound(enabled) => {
            session.set_sound_enabled(enabled);
            println!("sound {}", if enabled { "on" } else { "off" });
        }
        Command::Reset => {
            session.reset();
            println!("a fresh khulark blinks at you");
            print_status(session);
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

fn print_status(session: &GameSession) {
    let snapshot = session.snapshot();
    println!(
        "hunger {:.0} | affection {:.0} | sanity {:.0} | {} | {} | sprite {} on {} | sound {}",
        snapshot.stats.hunger,
        snapshot.stats.affection,
        snapshot.stats.sanity,
        snapshot.body_state,
        snapshot.mood,
        snapshot.sprite_key,
        snapshot.background_color,
        if snapshot.sound_enabled { "on" } else { "off" },
    );
}

fn print_reaction(reaction: &Reaction) {
    print_decision(&reaction.decision);
    if reaction.fallback {
        println!("  (the feed service could not judge this photo; nothing changed)");
    }
    for change in &reaction.changes {
        println!("  {} {:.0} -> {:.0}", change.stat, change.old, change.new);
    }
    println!(
        "  [{}] next photo in {}s",
        reaction.cue.sound_key(),
        reaction.cooldown.as_secs_f64().ceil()
    );
}

fn print_decision(decision: &Decision) {
    println!("\"{}\"", decision.speech);
    println!("  {}", decision.alert_text);
}

fn print_rejection(rejection: &Rejection) {
    println!("{} ({}s)", rejection.message, rejection.remaining_secs);
}

fn print_action(outcome: &ActionOutcome) {
    match outcome {
        ActionOutcome::Applied(change) => {
            println!("{} {:.0} -> {:.0}", change.stat, change.old, change.new);
        }
        ActionOutcome::Rejected(rejection) => print_rejection(rejection),
    }
}
