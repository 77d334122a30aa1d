//! Capture the API resources of a Kubernetes cluster or must-gather bundle and compare captures

pub mod cli;
pub mod clients;
pub mod collect;
pub mod config;
pub mod deprecation;
pub mod diff;
pub mod document;
pub mod ingest;
pub mod inventory;
pub mod key;
pub mod marker;
pub mod output;
pub mod version;

use std::{
  fs,
  path::{Component, Path, PathBuf},
  time::{Duration, Instant},
};

use anyhow::{Context, Result};

use crate::{
  clients::{K8sClients, RealK8sClients},
  collect::Collection,
  config::{Config, Mode},
  deprecation::Deprecations,
  diff::DiffReport,
  ingest::Ingestion,
  inventory::Inventory,
  output::DirectoryReport,
};

/// Execute the run described by `config`
pub async fn run(config: &Config) -> Result<()> {
  match &config.mode {
    Mode::Directory { kubeconfig } => run_directory(config, kubeconfig.as_deref()).await,
    Mode::SingleFile { kubeconfig, file } => run_single_file(config, kubeconfig.as_deref(), file).await,
    Mode::Compare {
      kubeconfig1,
      kubeconfig2,
    } => run_compare(config, kubeconfig1, kubeconfig2).await,
    Mode::MustGather { path } => run_must_gather(config, path),
    Mode::MustGatherCompare { first, second } => run_must_gather_compare(config, first, second),
    Mode::Import { file } => run_import(config, file),
  }
}

/// Collect from a connected cluster, falling back to unfiltered collection when the version
/// cannot be detected
pub async fn collect_cluster<C: K8sClients>(client: &C, timeout: Duration) -> Result<Collection> {
  let cluster = match collect::detect_version(client).await {
    Ok(version) => Some(version),
    Err(err) => {
      tracing::warn!("Failed to detect cluster version: {err:#}. Continuing without deprecation checks");
      None
    }
  };

  let deprecations = Deprecations::builtin()?;
  collect::collect(client, &deprecations, cluster.as_ref(), timeout).await
}

async fn connect(kubeconfig: Option<&Path>) -> Result<RealK8sClients> {
  let path = config::resolve_kubeconfig(kubeconfig).context("Failed to get kubeconfig")?;
  RealK8sClients::new(&path).await
}

fn print_collection_summary(collection: &Collection, target: &Path, write_failures: usize, started: Instant) {
  let rows = [
    ("Successfully collected", collection.collected.to_string()),
    ("Skipped deprecated", collection.skipped.to_string()),
    ("Errors encountered", (collection.errors.len() + write_failures).to_string()),
    ("Output", target.display().to_string()),
    ("Duration", format!("{:.2?}", started.elapsed())),
  ];
  println!("{}", output::summary_table("Collection Summary", &rows));
}

async fn run_directory(config: &Config, kubeconfig: Option<&Path>) -> Result<()> {
  let started = Instant::now();
  let client = connect(kubeconfig).await?;

  fs::create_dir_all(&config.output)
    .with_context(|| format!("Failed to create output directory {}", config.output.display()))?;
  if config.clean {
    output::clean_directory(&config.output).context("Failed to clean output directory")?;
  }

  tracing::info!("Starting resource collection to directory: {}", config.output.display());
  let collection = collect_cluster(&client, config.timeout).await?;
  let report = output::render_directory(&collection.inventory, &config.output, &output::timestamp())?;

  print_collection_summary(&collection, &config.output, report.failures.len(), started);
  Ok(())
}

async fn run_single_file(config: &Config, kubeconfig: Option<&Path>, file: &Path) -> Result<()> {
  let started = Instant::now();
  let client = connect(kubeconfig).await?;

  if config.clean {
    output::clean_file(file)?;
  }

  tracing::info!("Starting resource collection to single file: {}", file.display());
  let collection = collect_cluster(&client, config.timeout).await?;
  output::write_single_file(&collection.inventory, file)?;

  print_collection_summary(&collection, file, 0, started);
  Ok(())
}

/// Name a must-gather bundle after its directory
///
/// Directory names that already mention `must-gather` are kept as is; otherwise the absolute
/// path's final component is used, and `must-gather` when there is none.
pub fn must_gather_name(path: &Path) -> String {
  let base = |p: &Path| p.file_name().map(|n| n.to_string_lossy().into_owned());

  if let Some(name) = base(path).filter(|n| n.contains("must-gather")) {
    return name;
  }

  let name = std::path::absolute(path)
    .ok()
    .and_then(|abs| base(&lexical_clean(&abs)))
    .or_else(|| base(path))
    .unwrap_or_default();

  if name.is_empty() || name == "." || name == "/" {
    "must-gather".to_string()
  } else {
    name
  }
}

/// Resolve `.` and `..` components without touching the filesystem
fn lexical_clean(path: &Path) -> PathBuf {
  let mut cleaned = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !cleaned.pop() {
          cleaned.push(component);
        }
      }
      other => cleaned.push(other),
    }
  }
  cleaned
}

/// Validate and ingest a must-gather bundle
pub fn ingest_must_gather(path: &Path) -> Result<Ingestion> {
  ingest::validate(path)?;
  tracing::info!("Processing must-gather directory: {}", path.display());
  Ok(ingest::ingest(path))
}

fn run_must_gather(config: &Config, path: &Path) -> Result<()> {
  let started = Instant::now();
  let ingestion = ingest_must_gather(path)?;

  fs::create_dir_all(&config.output)
    .with_context(|| format!("Failed to create output directory {}", config.output.display()))?;
  if config.clean {
    output::clean_directory(&config.output).context("Failed to clean output directory")?;
  }

  let report = output::render_directory(&ingestion.inventory, &config.output, &output::timestamp())?;

  let rows = [
    ("Files processed", ingestion.files_processed.to_string()),
    ("Resource types written", report.written.len().to_string()),
    ("Documents dropped", ingestion.dropped_documents.to_string()),
    ("Errors encountered", (ingestion.issues.len() + report.failures.len()).to_string()),
    ("Output directory", config.output.display().to_string()),
    ("Duration", format!("{:.2?}", started.elapsed())),
  ];
  println!("{}", output::summary_table("Must-Gather Processing Summary", &rows));
  Ok(())
}

/// Paths of the artifacts written by a comparison
#[derive(Clone, Debug)]
pub struct Comparison {
  pub first: PathBuf,
  pub second: PathBuf,
  pub diff: PathBuf,
  pub report: DiffReport,
}

/// Serialize both inventories into `dir`, then diff the files that were written
///
/// Produces `{name}-resources.yaml` for each side and `diff-{name1}-vs-{name2}.txt`, with names
/// sanitized for use in filenames.
pub fn write_comparison(
  dir: &Path,
  (first_name, first): (&str, &Inventory),
  (second_name, second): (&str, &Inventory),
  timestamp: &str,
) -> Result<Comparison> {
  fs::create_dir_all(dir).with_context(|| format!("Failed to create comparison directory {}", dir.display()))?;

  let first_safe = key::sanitize_name(first_name);
  let second_safe = key::sanitize_name(second_name);

  let first_path = dir.join(format!("{first_safe}-resources.yaml"));
  output::write_single_file(first, &first_path)?;
  let second_path = dir.join(format!("{second_safe}-resources.yaml"));
  output::write_single_file(second, &second_path)?;

  let first_rendered =
    fs::read_to_string(&first_path).with_context(|| format!("Failed to read {}", first_path.display()))?;
  let second_rendered =
    fs::read_to_string(&second_path).with_context(|| format!("Failed to read {}", second_path.display()))?;

  let report = DiffReport::from_rendered(&first_rendered, &second_rendered);
  let diff_path = dir.join(format!("diff-{first_safe}-vs-{second_safe}.txt"));
  fs::write(&diff_path, report.render(first_name, second_name, timestamp))
    .with_context(|| format!("Failed to write {}", diff_path.display()))?;

  Ok(Comparison {
    first: first_path,
    second: second_path,
    diff: diff_path,
    report,
  })
}

fn print_comparison(title: &str, first_name: &str, second_name: &str, comparison: &Comparison) {
  let rows = [
    (first_name, comparison.first.display().to_string()),
    (second_name, comparison.second.display().to_string()),
    ("Difference", comparison.diff.display().to_string()),
  ];
  println!("{}", output::summary_table(title, &rows));
}

async fn run_compare(config: &Config, kubeconfig1: &Path, kubeconfig2: &Path) -> Result<()> {
  let first_name = clients::cluster_name(kubeconfig1).context("Failed to get cluster name from kubeconfig1")?;
  let second_name = clients::cluster_name(kubeconfig2).context("Failed to get cluster name from kubeconfig2")?;

  tracing::info!("[1/3] Collecting from cluster 1: {first_name}");
  let client = connect(Some(kubeconfig1)).await?;
  let first = collect_cluster(&client, config.timeout)
    .await
    .context("Failed to collect from cluster 1")?;

  tracing::info!("[2/3] Collecting from cluster 2: {second_name}");
  let client = connect(Some(kubeconfig2)).await?;
  let second = collect_cluster(&client, config.timeout)
    .await
    .context("Failed to collect from cluster 2")?;

  tracing::info!("[3/3] Generating difference report");
  let comparison = write_comparison(
    &config.comparison_dir(),
    (&first_name, &first.inventory),
    (&second_name, &second.inventory),
    &output::timestamp(),
  )?;

  print_comparison("Comparison Complete", &first_name, &second_name, &comparison);
  Ok(())
}

fn run_must_gather_compare(config: &Config, first_path: &Path, second_path: &Path) -> Result<()> {
  ingest::validate(first_path).context("invalid must-gather1")?;
  ingest::validate(second_path).context("invalid must-gather2")?;

  let first_name = must_gather_name(first_path);
  let second_name = must_gather_name(second_path);

  tracing::info!("[1/3] Processing must-gather 1: {first_name}");
  let first = ingest::ingest(first_path);
  tracing::info!("[2/3] Processing must-gather 2: {second_name}");
  let second = ingest::ingest(second_path);

  tracing::info!("[3/3] Generating difference report");
  let comparison = write_comparison(
    &config.comparison_dir(),
    (&first_name, &first.inventory),
    (&second_name, &second.inventory),
    &output::timestamp(),
  )?;

  print_comparison("Comparison Complete", &first_name, &second_name, &comparison);
  Ok(())
}

/// Split a single-file capture into `{output}/import/`
pub fn import(config: &Config, file: &Path) -> Result<DirectoryReport> {
  if !file.exists() {
    anyhow::bail!("input file does not exist: {}", file.display());
  }
  let content = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;

  let dir = config.import_dir();
  if config.clean {
    output::clean_directory(&dir).context("Failed to clean import directory")?;
  }

  tracing::info!("Starting import of {}", file.display());
  output::write_sections(&content, &dir, &output::timestamp())
}

fn run_import(config: &Config, file: &Path) -> Result<()> {
  let started = Instant::now();
  let report = import(config, file)?;

  let rows = [
    ("Successfully processed", report.written.len().to_string()),
    ("Errors encountered", report.failures.len().to_string()),
    ("Output directory", config.import_dir().display().to_string()),
    ("Duration", format!("{:.2?}", started.elapsed())),
  ];
  println!("{}", output::summary_table("Import Summary", &rows));
  Ok(())
}
