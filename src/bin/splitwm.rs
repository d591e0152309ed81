use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use splitwm::common::config::{Config, config_file};
use splitwm::common::log;
use splitwm::layout_engine::{LayoutCommand, LayoutEngine, LayoutEvent, Rect};
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "splitwm")]
#[command(about = "Binary space partition tiling engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script of commands and events and print what the host
    /// would be told to do.
    Run {
        /// Config file to use instead of ~/.splitwm.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Display geometry as WxH or WxH+X+Y. May be repeated.
        #[arg(long = "display", value_parser = parse_display)]
        displays: Vec<Rect>,

        /// JSON-lines file of {"command": ...} and {"event": ...} entries.
        script: PathBuf,
    },
    /// Validate a config file.
    CheckConfig {
        /// Defaults to ~/.splitwm.toml.
        path: Option<PathBuf>,
    },
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
enum ScriptLine {
    Command(LayoutCommand),
    Event(LayoutEvent),
}

fn parse_display(s: &str) -> Result<Rect, String> {
    let (size, origin) = match s.split_once('+') {
        Some((size, origin)) => (size, Some(origin)),
        None => (s, None),
    };
    let number = |v: &str| v.trim().parse::<i32>().map_err(|e| format!("bad number {v:?}: {e}"));
    let (w, h) = size.split_once('x').ok_or_else(|| format!("expected WxH, got {size:?}"))?;
    let (x, y) = match origin {
        Some(origin) => {
            let (x, y) =
                origin.split_once('+').ok_or_else(|| format!("expected X+Y, got {origin:?}"))?;
            (number(x)?, number(y)?)
        }
        None => (0, 0),
    };
    let (w, h) = (number(w)?, number(h)?);
    if w <= 0 || h <= 0 {
        return Err(format!("display must have a positive size, got {w}x{h}"));
    }
    Ok(Rect::new(x, y, w, h))
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = path.unwrap_or_else(config_file);
    let mut config = if path.exists() {
        Config::read(&path).with_context(|| format!("reading {}", path.display()))?
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        Config::default()
    };
    for issue in config.validate() {
        warn!("config: {issue}");
    }
    let fixes = config.auto_fix_values();
    if fixes > 0 {
        warn!(fixes, "replaced invalid config values with defaults");
    }
    Ok(config)
}

fn run(config: Option<PathBuf>, mut displays: Vec<Rect>, script: PathBuf) -> anyhow::Result<()> {
    let config = load_config(config)?;
    if displays.is_empty() {
        displays.push(Rect::new(0, 0, 1920, 1080));
    }
    let mut engine = LayoutEngine::new(&displays, &config.settings);

    let file = std::fs::File::open(&script)
        .with_context(|| format!("opening script {}", script.display()))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let entry: ScriptLine = serde_json::from_str(trimmed)
            .with_context(|| format!("{}:{}: bad script line", script.display(), number + 1))?;
        let response = match entry {
            ScriptLine::Command(cmd) => engine.handle_command(cmd),
            ScriptLine::Event(event) => engine.handle_event(event),
        };
        writeln!(out, "{}", serde_json::to_string(&response)?)?;
    }
    write!(out, "{}", engine.draw_tree())?;
    Ok(())
}

fn check_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_file);
    let config = Config::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("{issue}");
        }
        bail!("{} has {} issue(s)", path.display(), issues.len());
    }
    println!("{} is valid", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log::init_logging();

    match cli.command {
        Commands::Run { config, displays, script } => run(config, displays, script),
        Commands::CheckConfig { path } => check_config(path),
    }
}
