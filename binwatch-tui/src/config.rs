use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use binwatch_core::{DEFAULT_TWO_OPT_PASSES, SolverKind};

const DEFAULT_THRESHOLD: f64 = 80.0;
const DEFAULT_HISTORY_PATH: &str = "bin_history.json";
const DEFAULT_EXPORT_PATH: &str = "bins_to_collect.json";
const DEFAULT_LOG_PATH: &str = "binwatch.log";

/// Runtime settings read from `BINWATCH_*` environment variables.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub threshold: f64,
    /// The JSON file source is only offered when this is set.
    pub snapshot_path: Option<PathBuf>,
    pub history_path: PathBuf,
    pub export_path: PathBuf,
    pub log_path: PathBuf,
    pub solver: SolverKind,
    pub two_opt_passes: usize,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let threshold = parse_or(&lookup, "BINWATCH_THRESHOLD", DEFAULT_THRESHOLD)?;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(anyhow!(
                "BINWATCH_THRESHOLD must be between 0 and 100, got {threshold}"
            ));
        }

        Ok(Self {
            threshold,
            snapshot_path: lookup("BINWATCH_SNAPSHOT_PATH").map(PathBuf::from),
            history_path: path_or(&lookup, "BINWATCH_HISTORY_PATH", DEFAULT_HISTORY_PATH),
            export_path: path_or(&lookup, "BINWATCH_EXPORT_PATH", DEFAULT_EXPORT_PATH),
            log_path: path_or(&lookup, "BINWATCH_LOG_PATH", DEFAULT_LOG_PATH),
            solver: parse_or(&lookup, "BINWATCH_ROUTE_SOLVER", SolverKind::default())?,
            two_opt_passes: parse_or(&lookup, "BINWATCH_TWO_OPT_PASSES", DEFAULT_TWO_OPT_PASSES)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err| anyhow!("invalid {name} value {raw:?}: {err}")),
        None => Ok(default),
    }
}

fn path_or<F>(lookup: &F, name: &str, default: &str) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    PathBuf::from(lookup(name).unwrap_or_else(|| default.to_owned()))
}
