use std::{
  fmt::Write as _,
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::{
  document::Document,
  inventory::Inventory,
  key::{self, ResourceKey},
  marker,
};

/// Wrapper document written for every resource type
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceList<'a> {
  api_version: &'static str,
  kind: &'static str,
  items: &'a [Document],
}

impl<'a> ResourceList<'a> {
  fn new(items: &'a [Document]) -> Self {
    Self {
      api_version: "v1",
      kind: "List",
      items,
    }
  }

  fn to_yaml(&self) -> Result<String> {
    Ok(serde_yaml::to_string(self)?)
  }
}

/// Current local time in RFC 3339 form, used in headers and reports
pub fn timestamp() -> String {
  chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Descriptive comment block prepended to every file written in directory and import modes
pub fn header(resource: &str, group_version: Option<&str>, timestamp: &str) -> String {
  let mut header = String::new();
  header.push_str("# Generated by k8s-resource-collector\n");
  let _ = writeln!(header, "# Generated at: {timestamp}");
  let _ = writeln!(header, "# Resource: {resource}");
  if let Some(gv) = group_version.filter(|gv| !gv.is_empty()) {
    let _ = writeln!(header, "# Group Version: {gv}");
  }
  header.push_str("# ---\n\n");
  header
}

/// Render the whole inventory as one marker-delimited stream
///
/// Sections are emitted in key order and carry no timestamp, so identical inventories always
/// render to identical bytes.
pub fn render_single_file(inventory: &Inventory) -> Result<String> {
  let mut rendered = String::new();

  for (key, items) in inventory {
    let list = ResourceList::new(items)
      .to_yaml()
      .with_context(|| format!("Failed to serialize {key}"))?;

    rendered.push_str(&marker::render(key.as_str()));
    rendered.push('\n');
    rendered.push_str(&list);
    rendered.push('\n');
  }

  Ok(rendered)
}

/// Render and write the single-file form, creating parent directories as needed
pub fn write_single_file(inventory: &Inventory, path: &Path) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create output directory {}", parent.display()))?;
  }

  let rendered = render_single_file(inventory)?;
  fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))
}

/// A file that could not be written
#[derive(Clone, Debug)]
pub struct WriteFailure {
  pub name: String,
  pub error: String,
}

/// Files written by a directory-style render
#[derive(Clone, Debug, Default)]
pub struct DirectoryReport {
  pub written: Vec<PathBuf>,
  pub failures: Vec<WriteFailure>,
}

fn render_file(key: &ResourceKey, items: &[Document], timestamp: &str) -> Result<String> {
  let list = ResourceList::new(items).to_yaml()?;
  Ok(format!("{}{list}", header(key.resource(), Some(key.group_version()), timestamp)))
}

/// Write one file per resource type into `dir`
///
/// Failing to create `dir` is fatal; failing to render or write a single file is recorded and
/// the remaining files are still written.
pub fn render_directory(inventory: &Inventory, dir: &Path, timestamp: &str) -> Result<DirectoryReport> {
  fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory {}", dir.display()))?;

  let mut report = DirectoryReport::default();
  for (key, items) in inventory {
    let path = dir.join(key.filename());
    let result =
      render_file(key, items, timestamp).and_then(|contents| fs::write(&path, contents).map_err(anyhow::Error::from));

    match result {
      Ok(()) => {
        tracing::debug!("{key}: saved {} items to {}", items.len(), path.display());
        report.written.push(path);
      }
      Err(err) => {
        tracing::warn!("{key}: failed to write {}: {err:#}", path.display());
        report.failures.push(WriteFailure {
          name: key.to_string(),
          error: format!("{err:#}"),
        });
      }
    }
  }

  Ok(report)
}

/// Split a single-file capture into one file per section under `dir`
pub fn write_sections(content: &str, dir: &Path, timestamp: &str) -> Result<DirectoryReport> {
  fs::create_dir_all(dir).with_context(|| format!("Failed to create import directory {}", dir.display()))?;

  let mut report = DirectoryReport::default();
  for section in marker::sections(content) {
    tracing::debug!("Processing section: {}", section.name);
    let path = dir.join(format!("{}.yaml", key::sanitize(&section.name)));
    let contents = format!("{}{}", header(&section.name, None, timestamp), section.body);

    match fs::write(&path, contents) {
      Ok(()) => report.written.push(path),
      Err(err) => {
        tracing::warn!("{}: failed to write {}: {err}", section.name, path.display());
        report.failures.push(WriteFailure {
          name: section.name,
          error: err.to_string(),
        });
      }
    }
  }

  Ok(report)
}

/// Remove everything inside `dir`, leaving the directory itself in place
///
/// A missing directory is treated as already clean.
pub fn clean_directory(dir: &Path) -> Result<()> {
  let entries = match fs::read_dir(dir) {
    Ok(entries) => entries,
    Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
    Err(err) => return Err(err).with_context(|| format!("Failed to read directory {}", dir.display())),
  };

  for entry in entries {
    let path = entry?.path();
    let removed = if path.is_dir() {
      fs::remove_dir_all(&path)
    } else {
      fs::remove_file(&path)
    };
    removed.with_context(|| format!("Failed to remove {}", path.display()))?;
    tracing::debug!("Removed: {}", path.display());
  }

  Ok(())
}

/// Remove a single output file if it exists
pub fn clean_file(path: &Path) -> Result<()> {
  match fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
    Err(err) => Err(err).with_context(|| format!("Failed to clean output file {}", path.display())),
  }
}

#[derive(Tabled)]
#[tabled(rename_all = "UpperCase")]
struct SummaryRow {
  field: String,
  value: String,
}

/// Render a titled two-column summary for stdout
pub fn summary_table(title: &str, rows: &[(&str, String)]) -> String {
  let rows: Vec<SummaryRow> = rows
    .iter()
    .map(|(field, value)| SummaryRow {
      field: (*field).to_owned(),
      value: value.to_owned(),
    })
    .collect();

  let mut table = Table::new(rows);
  table.with(Style::sharp());

  format!("\n{title}\n{table}\n")
}
