use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use statehold_config::AppConfig;
use statehold_mod_history::UndoSequence;
use statehold_store::{
    DarkModeToggle, KeyValueMedium, PersistentStore, RedbMedium, SystemPreference,
};

/// Inspect and edit persisted statehold entries.
#[derive(Parser, Debug)]
#[command(name = "statehold", version, about)]
struct Cli {
    /// Config file to use instead of the one next to the executable.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory override.
    #[arg(long = "data-dir")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the raw stored entry for a key.
    Get { key: String },
    /// Store a JSON value under a key.
    Set { key: String, json: String },
    /// Delete the entry for a key.
    Remove { key: String },
    /// List stored keys.
    Keys,
    /// Show or change the persisted dark-mode flag.
    DarkMode {
        #[command(subcommand)]
        action: Option<DarkModeAction>,
    },
    /// Replay undo-sequence steps (`push=VALUE`, `undo`, `redo`, `reset`)
    /// and print the state after each one.
    Replay { steps: Vec<String> },
}

#[derive(Subcommand, Debug)]
enum DarkModeAction {
    On,
    Off,
    Toggle,
    /// Forget the stored choice and follow the system again.
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let (config, config_problem) = AppConfig::load_checked(&config_path);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(problem) = config_problem {
        tracing::warn!("{problem}");
    }
    tracing::debug!(config = %config_path.display(), "starting statehold");

    let open_medium = || -> Result<Arc<RedbMedium>> {
        let data_dir = cli
            .data_dir
            .clone()
            .unwrap_or_else(|| config.resolve_data_dir());
        RedbMedium::open_dir(&data_dir, config.entry_limit())
    };

    match &cli.command {
        Command::Get { key } => match open_medium()?.read(key)? {
            Some(raw) => println!("{raw}"),
            None => anyhow::bail!("no entry for '{key}'"),
        },
        Command::Set { key, json } => {
            let value: serde_json::Value = serde_json::from_str(json)
                .with_context(|| format!("'{json}' is not valid JSON"))?;
            let mut store: PersistentStore<serde_json::Value> =
                PersistentStore::new(key.clone(), value.clone(), open_medium()?);
            store.load()?;
            store.set(value)?;
        }
        Command::Remove { key } => {
            open_medium()?.delete_entry(key)?;
        }
        Command::Keys => {
            for key in open_medium()?.list_keys()? {
                println!("{key}");
            }
        }
        Command::DarkMode { action } => {
            let mut toggle = DarkModeToggle::new(
                config.dark_mode_key.clone(),
                config.dark_mode_default,
                Arc::new(SystemPreference),
                open_medium()?,
            );
            toggle.load()?;
            match action {
                None => {}
                Some(DarkModeAction::On) => {
                    toggle.toggle(Some(true))?;
                }
                Some(DarkModeAction::Off) => {
                    toggle.toggle(Some(false))?;
                }
                Some(DarkModeAction::Toggle) => {
                    toggle.toggle(None)?;
                }
                Some(DarkModeAction::Clear) => toggle.clear()?,
            }
            println!("{}", if toggle.enabled() { "dark" } else { "light" });
        }
        Command::Replay { steps } => {
            for line in replay(steps)? {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// Runs the steps against a fresh sequence and returns one line per
/// notification or no-op.
fn replay(steps: &[String]) -> Result<Vec<String>> {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let mut seq: UndoSequence<String> = UndoSequence::default();
    let sink = Rc::clone(&lines);
    seq.subscribe(move |snap| {
        sink.borrow_mut().push(format!(
            "{:?} (redoable: {})",
            snap.elements(),
            snap.redoable_count()
        ));
    });

    for step in steps {
        match step.split_once('=') {
            Some(("push", value)) => seq.push(value.to_string()),
            None if step == "undo" => {
                if !seq.undo() {
                    lines.borrow_mut().push("nothing to undo".to_string());
                }
            }
            None if step == "redo" => {
                if !seq.redo() {
                    lines.borrow_mut().push("nothing to redo".to_string());
                }
            }
            None if step == "reset" => seq.reset(),
            _ => anyhow::bail!("unknown step '{step}'"),
        }
    }

    Ok(lines.take())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_replay_command_parses_without_data_dir() {
        let cli = Cli::try_parse_from(["statehold", "replay", "push=a", "undo"]).unwrap();
        assert!(cli.data_dir.is_none());
        match cli.command {
            Command::Replay { steps } => assert_eq!(steps, vec!["push=a", "undo"]),
            other => panic!("expected replay, got {other:?}"),
        }
    }

    #[test]
    fn test_replay_reports_each_change() {
        let lines = replay(&steps(&["push=a", "push=b", "undo", "redo", "reset"])).unwrap();
        assert_eq!(
            lines,
            vec![
                r#"["a"] (redoable: 0)"#,
                r#"["a", "b"] (redoable: 0)"#,
                r#"["a"] (redoable: 1)"#,
                r#"["a", "b"] (redoable: 0)"#,
                "[] (redoable: 0)",
            ]
        );
    }

    #[test]
    fn test_replay_noops_on_empty_history() {
        let lines = replay(&steps(&["undo", "redo"])).unwrap();
        assert_eq!(lines, vec!["nothing to undo", "nothing to redo"]);
    }

    #[test]
    fn test_replay_rejects_unknown_step() {
        let err = replay(&steps(&["push=a", "jump"])).unwrap_err();
        assert!(err.to_string().contains("unknown step 'jump'"));
    }
}
