use clap::Parser;
use maze_chase_server::config::EngineConfig;
use maze_chase_server::constants::TICK_MS;
use maze_chase_server::engine::motion::{self, Mover, StepOutcome};
use maze_chase_server::engine::GameEngine;
use maze_chase_server::error::Error;
use maze_chase_server::layout::MazeLayout;
use maze_chase_server::types::{Direction, Intent, RuntimeEvent, SessionStats, Snapshot};
use maze_chase_server::world::GridWorld;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 60_000)]
    duration_ms: u64,
    #[arg(long)]
    layout: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    autopilot: bool,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventLine<'a> {
    at_ms: u64,
    event: &'a RuntimeEvent,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    seed: u32,
    duration_ms: u64,
    started_at: String,
    finished_at: String,
    score: u32,
    level: u32,
    losses: u32,
    level_ups: u32,
    pursuers_eaten: u32,
    collectibles_eaten: u32,
    best_score: u32,
    anomalies: Vec<String>,
}

struct Autopilot {
    rng: StdRng,
}

impl Autopilot {
    fn new(seed: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(u64::from(seed)),
        }
    }

    fn decide(&mut self, engine: &GameEngine) -> Option<Intent> {
        let player = engine.player();
        if !player.on_board {
            return None;
        }
        let world = engine.world();
        let open = open_directions(world, engine);
        if open.is_empty() {
            return None;
        }
        let baited: Vec<Direction> = open
            .iter()
            .copied()
            .filter(|dir| leads_to_collectible(world, engine, *dir))
            .collect();

        let ahead_open = open.contains(&player.dir);
        let ahead_baited = baited.contains(&player.dir);
        if engine.is_player_moving() && ahead_open && (ahead_baited || baited.is_empty()) {
            return None;
        }

        let pool = if baited.is_empty() { &open } else { &baited };
        let dir = pool[self.rng.random_range(0..pool.len())];
        Some(Intent::Move(dir))
    }
}

fn open_directions(world: &GridWorld, engine: &GameEngine) -> Vec<Direction> {
    let from = engine.player().position;
    Direction::AXES
        .iter()
        .copied()
        .filter(|dir| {
            matches!(
                motion::step(world, from, *dir, Mover::Player),
                StepOutcome::Moved(_)
            )
        })
        .collect()
}

fn leads_to_collectible(world: &GridWorld, engine: &GameEngine, dir: Direction) -> bool {
    match motion::step(world, engine.player().position, dir, Mover::Player) {
        StepOutcome::Moved(resolved) => world.collectible_at(resolved.to).is_some(),
        StepOutcome::Blocked => false,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let mut engine = match build_engine(&cli, seed) {
        Ok(engine) => engine,
        Err(err) => {
            error!(error = %err, "failed to build engine");
            std::process::exit(2);
        }
    };

    let started_at = chrono::Utc::now().to_rfc3339();
    info!(seed, duration_ms = cli.duration_ms, autopilot = cli.autopilot, "run started");

    let mut autopilot = cli.autopilot.then(|| Autopilot::new(seed));
    let mut anomalies = Vec::new();
    let mut seen = HashSet::new();

    while engine.now_ms() < cli.duration_ms {
        if let Some(intent) = autopilot.as_mut().and_then(|pilot| pilot.decide(&engine)) {
            engine.apply_intent(intent);
        }
        let step = TICK_MS.min(cli.duration_ms - engine.now_ms());
        engine.advance(step);

        let snapshot = engine.build_snapshot(true);
        for event in &snapshot.events {
            let line = EventLine {
                at_ms: snapshot.now_ms,
                event,
            };
            match serde_json::to_string(&line) {
                Ok(text) => println!("{text}"),
                Err(err) => warn!(error = %err, "event line failed to serialize"),
            }
        }
        for message in collect_snapshot_anomalies(&snapshot, engine.world()) {
            if seen.insert(message.clone()) {
                warn!(at_ms = snapshot.now_ms, %message, "anomaly detected");
                anomalies.push(message);
            }
        }
    }

    let summary = build_run_summary(
        seed,
        &engine,
        started_at,
        chrono::Utc::now().to_rfc3339(),
        anomalies,
    );

    match serde_json::to_string(&summary) {
        Ok(text) => println!("{text}"),
        Err(err) => warn!(error = %err, "summary failed to serialize"),
    }
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(err) = write_summary(path, &summary) {
            error!(error = %err, path = %path.display(), "summary write failed");
            std::process::exit(2);
        }
    }

    info!(
        score = summary.score,
        level = summary.level,
        losses = summary.losses,
        level_ups = summary.level_ups,
        "run finished"
    );
    if !summary.anomalies.is_empty() {
        std::process::exit(1);
    }
}

fn build_engine(cli: &Cli, seed: u32) -> Result<GameEngine, Error> {
    let layout = match cli.layout.as_deref() {
        Some(path) => MazeLayout::load(path)?,
        None => MazeLayout::classic(),
    };
    let config = match cli.config.as_deref() {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    Ok(GameEngine::new(&layout, config, seed))
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, world: &GridWorld) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.level == 0 {
        anomalies.push("level dropped below 1".to_string());
    }
    if snapshot.player.on_board && !world.is_walkable(snapshot.player.row, snapshot.player.col) {
        anomalies.push(format!(
            "player on non-walkable cell ({},{})",
            snapshot.player.row, snapshot.player.col
        ));
    }
    if snapshot.player.speed_ms < 50 {
        anomalies.push(format!("player speed below floor: {}", snapshot.player.speed_ms));
    }
    for pursuer in &snapshot.pursuers {
        if pursuer.is_dead && pursuer.is_vulnerable {
            anomalies.push(format!("pursuer {} both dead and vulnerable", pursuer.index));
        }
        if !world.is_walkable(pursuer.row, pursuer.col) {
            anomalies.push(format!(
                "pursuer {} on non-walkable cell ({},{})",
                pursuer.index, pursuer.row, pursuer.col
            ));
        }
        if pursuer.speed_ms < 50 {
            anomalies.push(format!(
                "pursuer {} speed below floor: {}",
                pursuer.index, pursuer.speed_ms
            ));
        }
    }
    anomalies
}

fn build_run_summary(
    seed: u32,
    engine: &GameEngine,
    started_at: String,
    finished_at: String,
    anomalies: Vec<String>,
) -> RunSummary {
    let SessionStats {
        losses,
        level_ups,
        pursuers_eaten,
        collectibles_eaten,
        best_score,
    } = engine.stats();
    RunSummary {
        seed,
        duration_ms: engine.now_ms(),
        started_at,
        finished_at,
        score: engine.score(),
        level: engine.level(),
        losses,
        level_ups,
        pursuers_eaten,
        collectibles_eaten,
        best_score,
        anomalies,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
