//! Matchroom - engine CLI
//!
//! Small driver around the session engine: a scripted demo match and a
//! concurrent load simulation.

#![warn(missing_docs)]

mod cli;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tokio::sync::mpsc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use matchroom::{
    EngineConfig, GameState, JsonFileStore, MemoryStore, MovePayload, NimConfig, PlayerId,
    SessionEngine, SessionId, SessionStatus, SessionStore, Variant, MAX_TAKE,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Demo { pile } => run_demo(config, pile).await,
        Command::Simulate {
            matches,
            seed,
            store_dir,
        } => run_simulate(config, matches, seed, store_dir).await,
    }
}

/// Loads settings from `path`, or falls back to defaults.
#[instrument(skip(path))]
fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::from_file(path)?),
        None => Ok(EngineConfig::default()),
    }
}

/// Plays one scripted misère Nim match, echoing every broadcast event.
async fn run_demo(config: EngineConfig, pile: u32) -> Result<()> {
    info!(pile, "Starting demo match");
    let config = EngineConfig::new(
        *config.leave_policy(),
        *config.retain_finished(),
        NimConfig::new(pile),
    );
    let engine = SessionEngine::new(config, Arc::new(MemoryStore::new()));

    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let conn_a = engine.broadcaster().register("alice".to_string(), tx_a);
    let conn_b = engine.broadcaster().register("bob".to_string(), tx_b);

    let view = engine
        .join_or_create(Variant::Nim, "alice".to_string())
        .await?;
    let session_id = *view.session_id();
    engine.broadcaster().subscribe(conn_a, session_id);
    engine.join(session_id, "bob".to_string()).await?;
    engine.broadcaster().subscribe(conn_b, session_id);

    // An out-of-turn probe: rejected, and only bob hears about it.
    if let Err(err) = engine
        .submit_move(session_id, "bob".to_string(), MovePayload::nim(1))
        .await
    {
        println!("bob's probe rejected: {err}");
    }

    let mut snapshot = engine.view(session_id).await?;
    while *snapshot.status() == SessionStatus::InProgress {
        let seat = snapshot.moves().len() % snapshot.players().len();
        let Some(player) = snapshot.players()[seat].clone() else {
            anyhow::bail!("seat {seat} is empty in an in-progress session");
        };
        let GameState::Nim(state) = snapshot.state();
        let take = optimal_take(state.remaining_objects());
        println!("{player} takes {take}");
        snapshot = engine
            .submit_move(session_id, player, MovePayload::nim(take))
            .await?;
    }

    while let Ok(event) = rx_a.try_recv() {
        println!("alice <- {}", serde_json::to_string(&event)?);
    }
    while let Ok(event) = rx_b.try_recv() {
        println!("bob   <- {}", serde_json::to_string(&event)?);
    }

    println!(
        "final status: {} winners: {:?}",
        snapshot.status(),
        snapshot.winners()
    );
    engine.shutdown().await;
    Ok(())
}

/// Misère strategy: leave the opponent on one more than a multiple of four.
fn optimal_take(remaining: u32) -> u32 {
    match remaining.saturating_sub(1) % 4 {
        0 => 1,
        take => take,
    }
}

/// Drives `matches` random Nim matches through one engine concurrently.
#[instrument(skip(config, store_dir))]
async fn run_simulate(
    config: EngineConfig,
    matches: usize,
    seed: Option<u64>,
    store_dir: Option<std::path::PathBuf>,
) -> Result<()> {
    let store: Arc<dyn SessionStore> = match store_dir {
        Some(dir) => Arc::new(JsonFileStore::new(dir).await?),
        None => Arc::new(MemoryStore::new()),
    };
    let engine = Arc::new(SessionEngine::new(config, store));
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Pair players up front; the concurrent part is the play itself.
    let mut pairs: Vec<(SessionId, StdRng)> = Vec::with_capacity(matches);
    for index in 0..matches {
        let opener = format!("sim-{index}-a");
        let follower = format!("sim-{index}-b");
        let view = engine.join_or_create(Variant::Nim, opener).await?;
        let view = engine.join(*view.session_id(), follower).await?;
        pairs.push((*view.session_id(), StdRng::seed_from_u64(rng.next_u64())));
    }
    info!(count = pairs.len(), "Sessions paired, starting playout");

    let mut tasks = Vec::with_capacity(pairs.len());
    for (session_id, mut rng) in pairs {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::spawn(async move {
            loop {
                let view = engine.view(session_id).await?;
                if *view.status() != SessionStatus::InProgress {
                    return anyhow::Ok(view);
                }
                let seat = view.moves().len() % view.players().len();
                let Some(player) = view.players()[seat].clone() else {
                    anyhow::bail!("seat {seat} is empty in an in-progress session");
                };
                let GameState::Nim(state) = view.state();
                let max = state.remaining_objects().min(MAX_TAKE);
                let take = rng.gen_range(1..=max);
                engine
                    .submit_move(session_id, player, MovePayload::nim(take))
                    .await?;
            }
        }));
    }

    let mut wins: HashMap<PlayerId, usize> = HashMap::new();
    let mut moves_total = 0usize;
    for task in tasks {
        let view = task.await??;
        moves_total += view.moves().len();
        for winner in view.winners() {
            *wins.entry(winner.clone()).or_insert(0) += 1;
        }
    }

    let opener_wins: usize = wins
        .iter()
        .filter(|(player, _)| player.ends_with("-a"))
        .map(|(_, count)| count)
        .sum();
    let follower_wins: usize = wins
        .iter()
        .filter(|(player, _)| player.ends_with("-b"))
        .map(|(_, count)| count)
        .sum();

    info!(matches, moves_total, "Simulation finished");
    println!("played {matches} matches, {moves_total} moves");
    println!("opener won {opener_wins}, follower won {follower_wins}");
    engine.shutdown().await;
    Ok(())
}
