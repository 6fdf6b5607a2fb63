#![forbid(unsafe_code)]

mod scene;
mod session;

use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use tessel_runtime::RuntimeConfig;

use crate::scene::Scene;
use crate::session::{PassReport, Session, Summary};

#[derive(Parser, Debug)]
#[command(name = "tessel", about = "Builds render caches for a tile scene")]
struct Args {
    /// Scene TOML to load
    #[arg(long, default_value = "assets/scene.toml")]
    scene: PathBuf,
    /// Runtime config TOML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
    /// Simulated edit rounds after the initial build
    #[arg(long, default_value_t = 0)]
    edits: usize,
    /// Reload the scene whenever the file changes
    #[arg(long)]
    watch: bool,
}

fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        loggers.push(WriteLogger::new(level, Config::default(), File::create(path)?));
    }
    CombinedLogger::init(loggers)?;
    Ok(())
}

fn log_pass(label: &str, r: &PassReport) {
    log::info!(
        target: "perf",
        "ms={} {} jobs={} accepted={} rejected={} resubmitted={} boundary={} unregistered={}",
        r.max_ms,
        label,
        r.jobs,
        r.accepted,
        r.rejected,
        r.resubmitted,
        r.boundary_refreshes,
        r.unregistered
    );
}

fn log_summary(s: &Summary) {
    log::info!(
        "blocks={} box_builds={} boundary_refreshes={} max_render_distance={}",
        s.blocks,
        s.box_builds,
        s.boundary_refreshes,
        s.max_render_distance
    );
    for (layer, verts) in &s.vertices {
        log::info!("  {:?}: {} vertices", layer, verts);
    }
}

fn watch_scene(path: &Path, session: &mut Session) -> Result<(), Box<dyn Error>> {
    use notify::{EventKind, RecursiveMode, Watcher};

    let (tx, rx) = mpsc::channel::<()>();
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res {
            match event.kind {
                EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any => {
                    let _ = tx.send(());
                }
                _ => {}
            }
        }
    })?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    log::info!("watching {}", path.display());

    while rx.recv().is_ok() {
        // editors emit bursts of events per save
        while rx.recv_timeout(Duration::from_millis(100)).is_ok() {}
        match Scene::from_path(path) {
            Ok(scene) => match session.reload(scene) {
                Ok(r) => {
                    log_pass("reload", &r);
                    log_summary(&session.summary());
                }
                Err(e) => log::error!("reload failed: {e}"),
            },
            Err(e) => log::warn!("scene not reloaded: {e}"),
        }
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => RuntimeConfig::from_path(path)?,
        None => RuntimeConfig::default(),
    };
    let scene = Scene::from_path(&args.scene)
        .map_err(|e| format!("{}: {e}", args.scene.display()))?;
    let mut session = Session::start(scene, config)?;
    let rt = session.runtime();
    log::info!("workers near={} bg={}", rt.w_near, rt.w_bg);

    log_pass("initial", &session.update());
    for round in 0..args.edits {
        let r = session.edit_round(round)?;
        log_pass(&format!("edit[{round}]"), &r);
    }
    log_summary(&session.summary());

    if args.watch {
        watch_scene(&args.scene, &mut session)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(args.log_level, args.log_file.as_deref()) {
        eprintln!("logging: {e}");
        return ExitCode::FAILURE;
    }
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
