//! Headless robosim runner.
//!
//! Runs an arena for a fixed number of ticks with scripted control intents,
//! scrubs recorded replay logs and manages the map directory.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use robosim_core::agent::{AgentView, TurnIntent};
use robosim_core::config::SimConfig;
use robosim_core::map::{ArenaDescription, MapStore};
use robosim_core::replay::{Direction, Frame, ReplayLog};
use robosim_core::simulation::Simulation;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "robosim", version, about = "Run robot arenas and scrub their replay logs")]
struct Cli {
    /// JSON config file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a map and record a replay log.
    Run {
        /// Map name, or `new` for an empty arena.
        map: String,
        /// Number of ticks to record.
        #[arg(long, default_value_t = 600)]
        ticks: u64,
        /// RNG seed, overriding the config.
        #[arg(long)]
        seed: Option<u64>,
        /// Turn held by controlled agents for the whole run.
        #[arg(long, value_enum, default_value_t = TurnArg::None)]
        turn: TurnArg,
        /// Hold the move intent for the whole run.
        #[arg(long = "move")]
        move_intent: bool,
        /// Tick at the configured rate instead of as fast as possible.
        #[arg(long)]
        realtime: bool,
    },
    /// Step through a recorded replay log.
    Replay {
        /// Log file to open.
        log: PathBuf,
        /// Frames to step back from the end.
        #[arg(long, default_value_t = 0)]
        back: u64,
        /// Cut the log at the reached frame so it can be resumed from there.
        #[arg(long)]
        truncate: bool,
    },
    /// Manage stored maps.
    Maps {
        #[command(subcommand)]
        action: MapAction,
    },
}

#[derive(Subcommand, Debug)]
enum MapAction {
    /// List stored maps.
    List,
    /// Print a stored map.
    Show {
        /// Map name.
        name: String,
    },
    /// Delete a stored map.
    Delete {
        /// Map name.
        name: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TurnArg {
    Left,
    None,
    Right,
}

impl From<TurnArg> for TurnIntent {
    fn from(arg: TurnArg) -> Self {
        match arg {
            TurnArg::Left => TurnIntent::Left,
            TurnArg::None => TurnIntent::None,
            TurnArg::Right => TurnIntent::Right,
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SimConfig::default()),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            map,
            ticks,
            seed,
            turn,
            move_intent,
            realtime,
        } => {
            let config = match seed {
                Some(seed) => config.with_seed(seed),
                None => config,
            };
            run_command(config, &map, ticks, turn.into(), move_intent, realtime)
        }
        Command::Replay {
            log,
            back,
            truncate,
        } => replay_command(&log, back, truncate),
        Command::Maps { action } => maps_command(&MapStore::new(&config.map_dir), action),
    }
}

fn run_command(
    config: SimConfig,
    map: &str,
    ticks: u64,
    turn: TurnIntent,
    move_intent: bool,
    realtime: bool,
) -> Result<()> {
    let store = MapStore::new(&config.map_dir);
    let source = store
        .source(map)
        .with_context(|| format!("failed to load map {map}"))?;
    let period = Duration::from_secs(1) / config.tick_rate_hz.max(1);

    let mut sim = Simulation::new(config, &source);
    sim.set_turn_intent(turn);
    sim.set_move_intent(move_intent);
    sim.start(&source).context("failed to start simulation")?;

    let started = Instant::now();
    for tick in 0..ticks {
        let due = Instant::now() + period;
        sim.tick()
            .with_context(|| format!("simulation failed on tick {tick}"))?;
        if realtime {
            thread::sleep(due.saturating_duration_since(Instant::now()));
        }
    }
    sim.stop().context("failed to flush replay log")?;

    let log = sim.log().context("simulation has no replay log")?;
    info!(ticks, elapsed_ms = started.elapsed().as_millis(), "run finished");
    println!("recorded {} frames to {}", log.len(), log.path().display());
    print_agents(&sim.current_agent_states());
    Ok(())
}

fn replay_command(path: &Path, back: u64, truncate: bool) -> Result<()> {
    let mut log =
        ReplayLog::open(path).with_context(|| format!("failed to open log {}", path.display()))?;
    let Some(last) = log.last_id() else {
        bail!("log {} holds no frames", path.display());
    };
    log.begin_scrubbing();

    let mut cursor = last;
    for _ in 0..back {
        match log.step(cursor, Direction::Backward)? {
            Some(frame) => cursor = frame.id,
            None => break,
        }
    }

    let frame = log
        .load_if_needed()?
        .iter()
        .find(|f| f.id == cursor)
        .cloned()
        .with_context(|| format!("frame {cursor} missing from log"))?;
    print_frame(&frame);

    if truncate {
        log.truncate_from(cursor)?;
        println!("truncated {}: next frame id {}", path.display(), log.next_id());
    }
    Ok(())
}

fn maps_command(store: &MapStore, action: MapAction) -> Result<()> {
    match action {
        MapAction::List => {
            let names = store.list()?;
            if names.is_empty() {
                println!("no maps in {}", store.dir().display());
            }
            for name in names {
                println!("{name}");
            }
        }
        MapAction::Show { name } => {
            let description: ArenaDescription = store.load(&name)?;
            println!("{}", serde_json::to_string_pretty(&description)?);
        }
        MapAction::Delete { name } => {
            store.delete(&name)?;
            println!("deleted {name}");
        }
    }
    Ok(())
}

fn print_agents(views: &[AgentView]) {
    for view in views {
        println!(
            "{:<10} {:>3}  x={:>8.2} y={:>8.2} angle={:>3}",
            format!("{:?}", view.kind),
            view.id.as_u64(),
            view.position.x,
            view.position.y,
            view.angle.degrees()
        );
    }
}

fn print_frame(frame: &Frame) {
    println!("frame {}", frame.id);
    let groups = [("agent", &frame.agents), ("controlled", &frame.controlled_agents)];
    for (label, records) in groups {
        for (slot, r) in records {
            println!(
                "{label:<10} {:<8} x={:>8.2} y={:>8.2} angle={:>3}",
                slot.to_string(),
                r.x,
                r.y,
                r.angle.degrees()
            );
        }
    }
}
