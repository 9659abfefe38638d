//! cli.rs: replay harness (genesis, apply, state-root)
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::action::{Action, ActionInput, ReadResult};
use crate::config;
use crate::state::{ContractState, StateRoot};
use crate::types::{Address, BlockContext};

#[derive(Parser)]
#[command(name = "vdao", about = "VDAO state engine - deterministic replay CLI")]
pub struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. "debug" atau "vdao_engine=trace"
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a genesis snapshot from a TOML config
    Genesis {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },

    /// Apply one action (JSON input) to a snapshot at a given height
    Apply {
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        action: PathBuf,
        #[arg(long)]
        caller: String,
        #[arg(long)]
        height: u64,
        /// Where to write the new snapshot (not written if absent)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the state root of a snapshot
    StateRoot {
        #[arg(long)]
        state: PathBuf,
    },
}

/// Output `apply` di stdout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ReadResult>,
    pub state_root: StateRoot,
}

/// Pasang tracing subscriber: `--log-level` > `RUST_LOG` > `info`.
pub fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_state(path: &Path) -> Result<ContractState> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read state {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid state json {}", path.display()))
}

fn write_state(path: &Path, state: &ContractState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json).with_context(|| format!("failed to write state {}", path.display()))?;
    Ok(())
}

/// Build snapshot dari genesis config dan tulis ke `out`.
pub fn cmd_genesis(config_path: &Path, out: &Path) -> Result<StateRoot> {
    let cfg = config::load_from_file(config_path)?;
    let state = ContractState::from_genesis(&cfg)?;
    write_state(out, &state)?;
    Ok(state.compute_state_root())
}

/// Apply satu action; snapshot baru ditulis ke `out` jika diberikan.
pub fn cmd_apply(
    state_path: &Path,
    action_path: &Path,
    caller: &str,
    height: u64,
    out: Option<&Path>,
) -> Result<ApplyReport> {
    let state = read_state(state_path)?;
    let raw = fs::read_to_string(action_path)
        .with_context(|| format!("failed to read action {}", action_path.display()))?;
    let input: ActionInput = serde_json::from_str(&raw)
        .with_context(|| format!("invalid action json {}", action_path.display()))?;
    let caller = Address::parse(caller).context("invalid --caller")?;

    let action = Action::new(caller, input);
    let transition = crate::apply(&state, &action, BlockContext::at(height))
        .with_context(|| format!("{} rejected", action.input.function_name()))?;

    if let Some(out) = out {
        write_state(out, &transition.state)?;
    }
    Ok(ApplyReport {
        result: transition.result,
        state_root: transition.state.compute_state_root(),
    })
}

pub fn cmd_state_root(state_path: &Path) -> Result<StateRoot> {
    Ok(read_state(state_path)?.compute_state_root())
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.cmd {
        Commands::Genesis { config, out } => {
            let root = cmd_genesis(&config, &out)?;
            tracing::info!(out = %out.display(), "genesis snapshot written");
            println!("{}", root);
        }
        Commands::Apply { state, action, caller, height, out } => {
            let report = cmd_apply(&state, &action, &caller, height, out.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::StateRoot { state } => {
            println!("{}", cmd_state_root(&state)?);
        }
    }
    Ok(())
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    run(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ADMIN: &str = "uhE-QeYS8i4pmUtnxQyHD7dzXFNaJ9oMK-IM-QPNY6M";
    const USER: &str = "VAg65x9jNSfO9KQHdd3tfx1vQa8qyCyJ_uj7QcxNLDk";

    fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).expect("create");
        write!(f, "{}", body).expect("write");
        path
    }

    fn genesis(dir: &Path) -> PathBuf {
        let cfg = write_file(
            dir,
            "genesis.toml",
            &format!(
                r#"
                name = "Verto DAO"
                ticker = "VDAO"

                [[balances]]
                address = "{ADMIN}"
                amount = 10000
                "#
            ),
        );
        let out = dir.join("state.json");
        cmd_genesis(&cfg, &out).expect("genesis");
        out
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from([
            "vdao", "apply", "--state", "s.json", "--action", "a.json", "--caller", ADMIN,
            "--height", "7", "--log-level", "debug",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.cmd {
            Commands::Apply { height, out, .. } => {
                assert_eq!(height, 7);
                assert!(out.is_none());
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_genesis_apply_state_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = genesis(dir.path());
        let root0 = cmd_state_root(&state).expect("root");

        let action = write_file(
            dir.path(),
            "transfer.json",
            &format!(r#"{{"function": "transfer", "target": "{USER}", "qty": 250}}"#),
        );
        let next = dir.path().join("next.json");
        let report = cmd_apply(&state, &action, ADMIN, 1, Some(&next)).expect("apply");
        assert!(report.result.is_none());
        assert_ne!(report.state_root, root0);
        assert_eq!(cmd_state_root(&next).expect("root"), report.state_root);

        let read = write_file(dir.path(), "balance.json", r#"{"function": "unlockedBalance"}"#);
        let report = cmd_apply(&next, &read, USER, 2, None).expect("read");
        assert_eq!(
            report.result,
            Some(ReadResult::Balance { target: Address::parse(USER).unwrap(), balance: 250 })
        );
    }

    #[test]
    fn test_apply_rejection_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = genesis(dir.path());
        let action = write_file(
            dir.path(),
            "self.json",
            &format!(r#"{{"function": "transfer", "target": "{ADMIN}", "qty": 1}}"#),
        );
        let out = dir.path().join("out.json");
        let err = cmd_apply(&state, &action, ADMIN, 1, Some(&out)).unwrap_err();
        assert!(err.to_string().contains("transfer rejected"));
        let root = err.root_cause().to_string();
        assert_eq!(root, "target cannot be the caller");
        assert!(!out.exists());
    }
}
