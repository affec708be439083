//! Command line front end for the 3D cellular automaton engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cube_life::{
    automaton::Pattern,
    config::{CliOverrides, LogLevel, Settings},
    session::{CellArray, Session},
    store,
    utils::{ColorOutput, GridFormatter},
    EngineError,
};
use serde_json::json;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "cube_life")]
#[command(about = "3D cellular automaton engine")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Keep the grid store in memory instead of on disk
    #[arg(long, global = true)]
    in_memory: bool,

    /// Grid store directory (overrides config)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(long, global = true, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Step a grid for a number of generations
    Run {
        /// Grid side length
        #[arg(short, long)]
        size: Option<usize>,

        /// Rules in X/Y/Z form (overrides config)
        #[arg(short, long)]
        rules: Option<String>,

        /// Number of generations to step
        #[arg(short, long, default_value_t = 1)]
        generations: usize,

        /// Pattern for generated grids (empty or checkerboard)
        #[arg(long, value_parser = parse_pattern)]
        pattern: Option<Pattern>,

        /// Start from a snapshot file instead of an initial state
        #[arg(short, long)]
        load: Option<PathBuf>,

        /// Save the final grid in the store under this name
        #[arg(long)]
        save: Option<String>,

        /// Export the final grid to a snapshot file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print every generation, not only the last
        #[arg(long)]
        show_evolution: bool,

        /// Print the final grid as JSON
        #[arg(long)]
        json: bool,
    },

    /// Seed preset configurations from a JSON file
    Seed {
        /// JSON file holding an array of grid configurations
        file: PathBuf,
    },

    /// List stored configurations or show one of them
    Show {
        /// Configuration name
        name: Option<String>,
    },

    /// Create a default configuration and a sample preset file
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },

    /// Interactive session reading one command per line
    Shell {
        /// Print grids as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    serde_yaml::from_str(s).map_err(|_| format!("unknown log level '{}'", s))
}

fn parse_pattern(s: &str) -> Result<Pattern, String> {
    serde_yaml::from_str(s).map_err(|_| format!("unknown pattern '{}'", s))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Setup { directory, force } = &cli.command {
        return setup_command(directory.clone(), *force);
    }

    let mut overrides = CliOverrides {
        store_dir: cli.store_dir.clone(),
        in_memory: cli.in_memory,
        log_level: cli.log_level,
        ..Default::default()
    };
    if let Commands::Run { rules, pattern, .. } = &cli.command {
        overrides.rules = rules.clone();
        overrides.pattern = *pattern;
    }
    let settings = load_settings(&cli.config, &overrides)?;

    tracing_subscriber::fmt()
        .with_max_level(settings.logging.level.as_tracing())
        .with_writer(std::io::stderr)
        .init();

    let session = Session::from_settings(&settings)?;

    match cli.command {
        Commands::Run {
            size, generations, load, save, export, show_evolution, json, ..
        } => {
            let size = size.unwrap_or(settings.engine.default_size);
            run_command(&session, size, generations, load, save, export, show_evolution, json)
        }
        Commands::Seed { file } => seed_command(&session, file),
        Commands::Show { name } => show_command(&session, name),
        Commands::Shell { json } => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            run_shell(&session, stdin.lock(), stdout.lock(), json)
        }
        Commands::Setup { .. } => unreachable!("handled before settings are loaded"),
    }
}

fn load_settings(config_path: &PathBuf, overrides: &CliOverrides) -> Result<Settings> {
    let mut settings = if config_path.exists() {
        Settings::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        eprintln!("{}", ColorOutput::warning(&format!(
            "Config file {} not found, using defaults", config_path.display()
        )));
        Settings::default()
    };

    settings.merge_with_cli(overrides);
    settings.validate()
        .context("Configuration validation failed")?;
    Ok(settings)
}

#[allow(clippy::too_many_arguments)]
fn run_command(
    session: &Session,
    size: usize,
    generations: usize,
    load: Option<PathBuf>,
    save: Option<String>,
    export: Option<PathBuf>,
    show_evolution: bool,
    json: bool,
) -> Result<()> {
    let size = match &load {
        Some(path) => {
            let cells = session.load_file(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
            cells.len()
        }
        None => {
            session.initial_state(size)
                .with_context(|| format!("Failed to create a grid of size {}", size))?;
            size
        }
    };

    let start_time = Instant::now();
    for generation in 1..=generations {
        session.advance(size)?;
        if show_evolution && !json {
            if let Some(grid) = session.snapshot() {
                println!("{}", GridFormatter::format_summary(&grid, &session.rules(), generation));
                println!("{}", GridFormatter::format_slices(&grid));
            }
        }
    }
    let elapsed = start_time.elapsed();

    let grid = session.snapshot().context("Session has no grid")?;
    if json {
        println!("{}", serde_json::to_string(&grid.to_nested())?);
    } else {
        println!("{}", ColorOutput::success(&format!(
            "Stepped {} generation(s) in {:.3}s", generations, elapsed.as_secs_f64()
        )));
        println!("{}", GridFormatter::format_summary(&grid, &session.rules(), generations));
        if !show_evolution {
            println!("{}", GridFormatter::format_slices(&grid));
        }
    }

    if let Some(name) = save {
        let response = session.save(&name);
        eprintln!("{}", ColorOutput::info(&response.message));
    }
    if let Some(path) = export {
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("snapshot");
        session.export_file(name, &path)
            .with_context(|| format!("Failed to export grid to {}", path.display()))?;
        eprintln!("{}", ColorOutput::info(&format!("Exported grid to {}", path.display())));
    }

    Ok(())
}

fn seed_command(session: &Session, file: PathBuf) -> Result<()> {
    println!("{}", ColorOutput::info(&format!("Seeding presets from {}", file.display())));
    let report = store::seed_from_file(session.store().as_ref(), &file)
        .with_context(|| format!("Failed to seed presets from {}", file.display()))?;
    println!("{}", GridFormatter::format_seed_report(&report));
    Ok(())
}

fn show_command(session: &Session, name: Option<String>) -> Result<()> {
    match name {
        None => {
            let names = session.store().names()?;
            if names.is_empty() {
                println!("{}", ColorOutput::warning("No stored configurations"));
            }
            for name in names {
                let config = session.store().find(&name)?;
                println!("{}", GridFormatter::format_config(&config));
            }
        }
        Some(name) => {
            session.load_named(&name)
                .with_context(|| format!("Failed to load configuration '{}'", name))?;
            let grid = session.snapshot().context("Session has no grid")?;
            println!("{}", GridFormatter::format_config(&session.store().find(&name)?));
            println!("{}", GridFormatter::format_summary(&grid, &session.rules(), 0));
            println!("{}", GridFormatter::format_slices(&grid));
        }
    }
    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("Setting up project structure..."));

    let config_dir = directory.join("config");
    let presets_dir = directory.join("presets");
    let store_dir = directory.join("data/grids");

    for dir in [&config_dir, &presets_dir, &store_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    // Default configuration
    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        let mut settings = Settings::default();
        settings.store.directory = store_dir.clone();
        settings.to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    // Sample presets
    let presets_path = presets_dir.join("trees.json");
    if !presets_path.exists() || force {
        let content = serde_json::to_string_pretty(&sample_presets())?;
        std::fs::write(&presets_path, content)
            .with_context(|| format!("Failed to write {}", presets_path.display()))?;
        println!("Created: {}", presets_path.display());
    } else {
        println!("Skipped: {} (already exists)", presets_path.display());
    }

    println!("\n{}", ColorOutput::success("Setup complete!"));
    println!("\nNext steps:");
    println!("1. Edit {}", config_path.display());
    println!("2. Run: cube_life seed {}", presets_path.display());
    println!("3. Run: cube_life run --size 5 --rules 3/3/M --generations 4");

    Ok(())
}

/// A small trunk-and-canopy tree plus an open field generated on access
fn sample_presets() -> Vec<serde_json::Value> {
    let size = 5;
    let mut cells = vec![vec![vec![0u32; size]; size]; size];
    for y in 0..3 {
        cells[2][y][2] = 2;
    }
    cells[2][3][2] = 4;
    for (x, z) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
        cells[x][3][z] = 6;
    }
    cells[2][4][2] = 11;

    vec![
        json!({
            "name": "tree_small",
            "size": size,
            "predefined_update": 1,
            "cells": cells,
            "colours": {"2": "0xdc7633", "4": "0xdc7633", "6": "0x2ecc71", "11": "0x2ecc71"}
        }),
        json!({"name": "open_field", "size": 10, "predefined_update": 0}),
    ]
}

const SHELL_HELP: &str = "\
commands:
  init <size>            start a grid (preset of that size if stored)
  next [size]            step one generation
  rules <X/Y/Z>          replace the rules (N = Moore, M = Von Neumann)
  save <name>            store the current grid
  open <name>            load a stored configuration
  load <path>            load a snapshot file
  export <name> <path>   write the current grid to a snapshot file
  seed <path>            seed presets from a JSON file
  list                   list stored configurations
  show                   print the current grid
  help                   this text
  quit                   leave the shell";

/// What a shell command hands back for printing
enum Reply {
    Cells(CellArray),
    Message(String),
    Nothing,
}

/// Drive a session from line commands; errors are reported and the session continues
fn run_shell<R: BufRead, W: Write>(session: &Session, input: R, mut output: W, json: bool) -> Result<()> {
    let mut generation = 0usize;

    for line in input.lines() {
        let line = line.context("Failed to read command")?;
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else { continue };
        let arg = parts.next();

        let result: cube_life::error::Result<Reply> = match (command, arg) {
            ("quit" | "exit", _) => break,
            ("help", _) => Ok(Reply::Message(SHELL_HELP.to_string())),
            ("init", Some(size)) => match size.parse() {
                Ok(size) => {
                    generation = 0;
                    session.initial_state(size).map(Reply::Cells)
                }
                Err(_) => Err(EngineError::Validation(format!("'{}' is not a size", size))),
            },
            ("next", size) => {
                let size = match size {
                    Some(size) => size
                        .parse::<usize>()
                        .map_err(|_| EngineError::Validation(format!("'{}' is not a size", size))),
                    None => session
                        .snapshot()
                        .map(|grid| grid.size())
                        .ok_or_else(|| EngineError::Validation("no grid to step".to_string())),
                };
                size.and_then(|size| session.advance(size)).map(|cells| {
                    generation += 1;
                    Reply::Cells(cells)
                })
            }
            ("rules", Some(rules)) => session
                .edit_rules(rules)
                .map(|rules| Reply::Message(json!({"message": format!("Rules updated to {}", rules)}).to_string())),
            ("save", Some(name)) => Ok(Reply::Message(serde_json::to_string(&session.save(name))?)),
            ("open", Some(name)) => session.load_named(name).map(|cells| {
                generation = 0;
                Reply::Cells(cells)
            }),
            ("load", Some(path)) => session.load_file(path).map(|cells| {
                generation = 0;
                Reply::Cells(cells)
            }),
            ("export", Some(name)) => match parts.next() {
                Some(path) => session
                    .export_file(name, path)
                    .map(|_| Reply::Message(json!({"message": format!("Exported to {}", path)}).to_string())),
                None => Err(EngineError::Validation("export needs a name and a path".to_string())),
            },
            ("seed", Some(path)) => store::seed_from_file(session.store().as_ref(), path)
                .map(|report| Reply::Message(report.to_string())),
            ("list", _) => session.store().names().map(|names| {
                let lines: Vec<String> = names
                    .iter()
                    .filter_map(|name| session.store().find(name).ok())
                    .map(|config| GridFormatter::format_config(&config))
                    .collect();
                if lines.is_empty() {
                    Reply::Nothing
                } else {
                    Reply::Message(lines.join("\n"))
                }
            }),
            ("show", _) => Ok(session
                .snapshot()
                .map_or(Reply::Nothing, |grid| Reply::Cells(grid.to_nested()))),
            _ => Err(EngineError::Validation(format!(
                "unrecognised command '{}' (try 'help')", line.trim()
            ))),
        };

        match result {
            Ok(Reply::Cells(cells)) => print_cells(&mut output, session, &cells, generation, json)?,
            Ok(Reply::Message(message)) => writeln!(output, "{}", message)?,
            Ok(Reply::Nothing) => {}
            Err(e) => writeln!(output, "{}", ColorOutput::error(&format!("error: {}", e)))?,
        }
    }

    Ok(())
}

fn print_cells<W: Write>(output: &mut W, session: &Session, cells: &CellArray, generation: usize, json: bool) -> Result<()> {
    if json {
        writeln!(output, "{}", serde_json::to_string(cells)?)?;
    } else if let Some(grid) = session.snapshot() {
        writeln!(output, "{}", GridFormatter::format_summary(&grid, &session.rules(), generation))?;
        write!(output, "{}", GridFormatter::format_slices(&grid))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cube_life::config::EngineConfig;
    use cube_life::store::MemoryStore;
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn session() -> Session {
        Session::new(Arc::new(MemoryStore::new()), &EngineConfig::default()).unwrap()
    }

    fn shell(session: &Session, script: &str, json: bool) -> String {
        let mut out = Vec::new();
        run_shell(session, Cursor::new(script), &mut out, json).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "cube_life",
            "run",
            "--size", "4",
            "--rules", "3/3/M",
            "--generations", "5",
            "--pattern", "empty",
        ]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from(["cube_life", "--log-level", "debug", "shell", "--json"]);
        assert!(cli.is_ok());

        assert!(Cli::try_parse_from(["cube_life", "run", "--pattern", "spiral"]).is_err());
    }

    #[test]
    fn test_setup_command() {
        let temp_dir = tempdir().unwrap();
        let result = setup_command(temp_dir.path().to_path_buf(), false);

        assert!(result.is_ok());
        let config_path = temp_dir.path().join("config/default.yaml");
        assert!(config_path.exists());
        assert!(Settings::from_file(&config_path).is_ok());

        let store = MemoryStore::new();
        let report = store::seed_from_file(&store, temp_dir.path().join("presets/trees.json")).unwrap();
        assert_eq!(report.inserted(), 2);
        assert_eq!(report.rejected(), 0);
    }

    #[test]
    fn test_shell_session() {
        let session = session();
        let out = shell(&session, "rules 3/3/M\ninit 3\nnext\nsave first\nlist\n", false);

        assert!(out.contains("Rules updated to 3/3/M"));
        assert!(out.contains("Generation 1 (3x3x3, rules 3/3/M)"));
        assert!(out.contains("Grid saved successfully as 'first'"));
        assert!(out.contains("first (size 3, preset 0, stored cells)"));
    }

    struct ClosedOutput;

    impl Write for ClosedOutput {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "output closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_shell_surfaces_write_failures() {
        for script in ["rules 3/3/M\n", "help\n", "init 2\nsave kept\nlist\n"] {
            let session = session();
            assert!(run_shell(&session, Cursor::new(script), ClosedOutput, false).is_err(), "{}", script);
        }

        let session = session();
        assert!(run_shell(&session, Cursor::new("rules 3/3/M\nrules 2/4/N\n"), ClosedOutput, true).is_err());
        // the first command ran, the failed write stopped the second
        assert_eq!(session.rules().to_string(), "3/3/M");
    }

    #[test]
    fn test_shell_keeps_going_after_errors() {
        let session = session();
        let out = shell(&session, "next\nrules 30/3/M\ninit 2\nbogus\nnext 2\nquit\ninit 4\n", true);

        assert!(out.contains("no grid to step"));
        assert!(out.contains("parse error"));
        assert!(out.contains("unrecognised command 'bogus'"));
        assert_eq!(session.rules().to_string(), "2/3/N");
        // quit stops before the final init
        assert_eq!(session.snapshot().unwrap().size(), 2);
    }
}
