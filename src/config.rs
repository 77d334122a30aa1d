use std::{
  ffi::OsString,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

const DEFAULT_CONFIG_FILE: &str = ".collector.yaml";
const DEFAULT_OUTPUT: &str = "./output";
const DEFAULT_SINGLE_FILE: &str = "all-resources.yaml";

/// Settings loaded from `.collector.yaml` or an explicit path
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
  /// Per resource type fetch timeout (default 30).
  #[serde(default = "default_timeout_seconds")]
  pub timeout_seconds: u64,

  /// Output directory used when `--output` is not given.
  #[serde(default)]
  pub output: Option<PathBuf>,
}

fn default_timeout_seconds() -> u64 {
  30
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      timeout_seconds: default_timeout_seconds(),
      output: None,
    }
  }
}

/// Load settings from an explicit path, the default `.collector.yaml` in the
/// current working directory, or fall back to `Settings::default()`.
pub fn load(path: Option<&Path>) -> Result<Settings> {
  load_from(path, std::env::current_dir().ok().as_deref())
}

fn read_settings(path: &Path) -> Result<Settings> {
  let contents =
    std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
  serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn load_from(path: Option<&Path>, base_dir: Option<&Path>) -> Result<Settings> {
  if let Some(p) = path {
    return read_settings(p);
  }

  if let Some(dir) = base_dir {
    let default_path = dir.join(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
      return read_settings(&default_path);
    }
  }

  Ok(Settings::default())
}

/// What a run does, resolved once from the command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
  /// Live collection, one file per resource type
  Directory { kubeconfig: Option<PathBuf> },
  /// Live collection into one marker-delimited file
  SingleFile { kubeconfig: Option<PathBuf>, file: PathBuf },
  /// Live collection from two clusters followed by a diff
  Compare { kubeconfig1: PathBuf, kubeconfig2: PathBuf },
  /// Offline ingestion of a must-gather bundle, one file per resource type
  MustGather { path: PathBuf },
  /// Offline ingestion of two must-gather bundles followed by a diff
  MustGatherCompare { first: PathBuf, second: PathBuf },
  /// Split an existing single-file capture into one file per section
  Import { file: PathBuf },
}

/// Immutable run configuration passed to every entry point
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
  pub mode: Mode,
  pub output: PathBuf,
  pub clean: bool,
  pub timeout: Duration,
}

impl Config {
  /// Validate flag combinations and merge them over the settings file
  pub fn new(cli: &Cli, settings: &Settings) -> Result<Self> {
    let output = cli
      .output
      .clone()
      .or_else(|| settings.output.clone())
      .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let timeout_seconds = cli.timeout.unwrap_or(settings.timeout_seconds);
    if timeout_seconds == 0 {
      bail!("--timeout must be greater than zero");
    }

    Ok(Self {
      mode: resolve_mode(cli, &output)?,
      output,
      clean: cli.clean,
      timeout: Duration::from_secs(timeout_seconds),
    })
  }

  /// Directory holding comparison artifacts
  pub fn comparison_dir(&self) -> PathBuf {
    self.output.join("comparison")
  }

  /// Directory holding split sections in import mode
  pub fn import_dir(&self) -> PathBuf {
    self.output.join("import")
  }
}

fn resolve_mode(cli: &Cli, output: &Path) -> Result<Mode> {
  if let Some(file) = &cli.import {
    return Ok(Mode::Import { file: file.clone() });
  }

  let any_kubeconfig = cli.kubeconfig.is_some() || cli.kubeconfig1.is_some() || cli.kubeconfig2.is_some();
  let any_must_gather_pair = cli.must_gather1.is_some() || cli.must_gather2.is_some();

  if cli.must_gather.is_some() && cli.kubeconfig.is_some() {
    bail!("--must-gather and --kubeconfig are mutually exclusive; use one or the other");
  }
  if cli.must_gather.is_some() && (cli.kubeconfig1.is_some() || cli.kubeconfig2.is_some()) {
    bail!("--must-gather cannot be used with --kubeconfig1 or --kubeconfig2");
  }
  if any_must_gather_pair && any_kubeconfig {
    bail!("--must-gather1/2 cannot be used with --kubeconfig flags; use one mode or the other");
  }
  if cli.must_gather.is_some() && any_must_gather_pair {
    bail!("--must-gather cannot be used with --must-gather1 or --must-gather2; use either single or comparison mode");
  }

  match (&cli.must_gather1, &cli.must_gather2) {
    (Some(first), Some(second)) => {
      return Ok(Mode::MustGatherCompare {
        first: first.clone(),
        second: second.clone(),
      });
    }
    (None, None) => {}
    _ => bail!("must-gather comparison mode requires both --must-gather1 and --must-gather2"),
  }

  if let Some(path) = &cli.must_gather {
    return Ok(Mode::MustGather { path: path.clone() });
  }

  if cli.compare || (cli.kubeconfig1.is_some() && cli.kubeconfig2.is_some()) {
    return match (&cli.kubeconfig1, &cli.kubeconfig2) {
      (Some(kubeconfig1), Some(kubeconfig2)) => Ok(Mode::Compare {
        kubeconfig1: kubeconfig1.clone(),
        kubeconfig2: kubeconfig2.clone(),
      }),
      _ => bail!("comparison mode requires both --kubeconfig1 and --kubeconfig2 to be specified"),
    };
  }

  // --kubeconfig1 on its own stands in for --kubeconfig
  let kubeconfig = cli.kubeconfig.clone().or_else(|| cli.kubeconfig1.clone());

  if let Some(file) = &cli.file {
    return Ok(Mode::SingleFile {
      kubeconfig,
      file: file.clone(),
    });
  }
  if cli.single_file {
    return Ok(Mode::SingleFile {
      kubeconfig,
      file: output.join(DEFAULT_SINGLE_FILE),
    });
  }

  Ok(Mode::Directory { kubeconfig })
}

/// Resolve the kubeconfig path: explicit flag, then `$KUBECONFIG`, then `~/.kube/config`
///
/// The file must exist.
pub fn resolve_kubeconfig(explicit: Option<&Path>) -> Result<PathBuf> {
  resolve_kubeconfig_from(explicit, std::env::var_os("KUBECONFIG"), dirs::home_dir())
}

fn resolve_kubeconfig_from(explicit: Option<&Path>, env: Option<OsString>, home: Option<PathBuf>) -> Result<PathBuf> {
  let path = match (explicit, env.filter(|e| !e.is_empty())) {
    (Some(path), _) => path.to_path_buf(),
    (None, Some(env)) => PathBuf::from(env),
    (None, None) => home
      .context("Unable to determine home directory for default kubeconfig")?
      .join(".kube")
      .join("config"),
  };

  if !path.exists() {
    bail!("kubeconfig file not found at {}", path.display());
  }

  Ok(path)
}
