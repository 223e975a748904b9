use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tileworld_input::{Action, FrameBuilder};
use tileworld_kernel::{SessionConfig, WorldSession};
use tileworld_persist::{read_grid_json, write_grid_json, WorldStore};
use tileworld_tools::SessionInspector;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tileworld-cli", about = "CLI tool for tile world sessions")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective configuration
    Info {
        /// JSON session configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run a headless session
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value = "0.0166667")]
        dt: f32,
        /// JSON session configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// JSON list of per-frame action lists, replayed in a loop
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Save the final session into this store directory
        #[arg(long)]
        save: Option<PathBuf>,
        /// Also write the final grid as a plain JSON world file
        #[arg(long)]
        export: Option<PathBuf>,
        /// Print a text view around the player when done
        #[arg(long)]
        show: bool,
    },
    /// Load the newest snapshot from a store and describe it
    Inspect {
        /// Store directory
        store: PathBuf,
        /// JSON session configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Width and height of the text view, in tiles
        #[arg(short, long, default_value = "40")]
        window: usize,
    },
    /// Import a plain JSON world file into a store
    Import {
        /// World file (rows of block ids)
        world: PathBuf,
        /// Store directory
        store: PathBuf,
        /// JSON session configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SessionConfig::default()),
    }
}

fn load_script(path: Option<&Path>) -> anyhow::Result<Vec<Vec<Action>>> {
    let Some(path) = path else {
        return Ok(demo_script());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    let script: Vec<Vec<Action>> = serde_json::from_str(&text)
        .with_context(|| format!("parsing script {}", path.display()))?;
    anyhow::ensure!(!script.is_empty(), "script {} has no frames", path.display());
    Ok(script)
}

/// Walk right, hop every 40 frames, swing every 30.
fn demo_script() -> Vec<Vec<Action>> {
    (0..120)
        .map(|i| {
            let mut frame = vec![Action::MoveRight];
            if i % 40 == 0 {
                frame.push(Action::Jump);
            }
            if i % 30 == 0 {
                frame.push(Action::Attack);
            }
            frame
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info { config } => {
            let config = load_config(config.as_deref())?;
            println!("tileworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Simulate {
            ticks,
            dt,
            config,
            script,
            save,
            export,
            show,
        } => {
            let config = load_config(config.as_deref())?;
            let script = load_script(script.as_deref())?;
            let mut session = WorldSession::new(config)?;
            let mut frames = FrameBuilder::default();

            let mut damage = 0;
            let mut slain = 0;
            for (_, actions) in (0..ticks).zip(script.iter().cycle()) {
                let frame = frames.build(actions);
                if frame.toggle_pause {
                    session.toggle_pause();
                }
                let report = session.tick(dt, &frame.intent);
                damage += report.damage_taken;
                slain += report.mobs_slain;
            }
            info!(ticks, damage, slain, "simulation finished");
            println!("{}", SessionInspector::summary(&session));

            if show {
                print!("{}", SessionInspector::render_window(&session, 40, 16));
            }
            if let Some(path) = export {
                write_grid_json(&path, &session.export_grid())?;
            }
            if let Some(dir) = save {
                let mut store = WorldStore::open(&dir)?;
                let index = store.save_session(&mut session)?;
                println!("saved snapshot {index} to {}", dir.display());
            }
        }
        Commands::Inspect {
            store,
            config,
            window,
        } => {
            let config = load_config(config.as_deref())?;
            let store = WorldStore::open(&store)?;
            store.verify_integrity()?;
            let mut session = WorldSession::new(config)?;
            store.restore_latest(&mut session)?;
            session.drain_events();

            println!("{}", SessionInspector::summary(&session));
            println!(
                "snapshots={} stored_events={}",
                store.meta().snapshot_count,
                store.load_events()?.len()
            );
            print!("{}", SessionInspector::render_window(&session, window, window / 2));
        }
        Commands::Import {
            world,
            store,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let rows = read_grid_json(&world)?;
            let mut session = WorldSession::new(config)?;
            session.import_grid(&rows)?;
            let mut store = WorldStore::open(&store)?;
            let index = store.save_session(&mut session)?;
            println!(
                "imported {}x{} world as snapshot {index}",
                session.grid().cols(),
                session.grid().rows()
            );
        }
    }

    Ok(())
}
