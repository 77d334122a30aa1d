use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;

use crate::{
  clients::K8sClients,
  deprecation::Deprecations,
  inventory::Inventory,
  key::ResourceKey,
  version::ClusterVersion,
};

/// Verbs a type must advertise to be collected
const REQUIRED_VERBS: [&str; 2] = ["list", "get"];

/// A resource type whose instances could not be fetched
#[derive(Clone, Debug)]
pub struct CollectionError {
  pub group_version: String,
  pub resource: String,
  pub error: String,
}

/// Outcome of a live collection run
///
/// The inventory only holds types that were fetched successfully.
#[derive(Debug, Default)]
pub struct Collection {
  pub inventory: Inventory,
  pub collected: usize,
  pub skipped: usize,
  pub errors: Vec<CollectionError>,
}

/// Detect the cluster version from the server version and its API groups
///
/// Only the server version is required. When the API groups cannot be listed the cluster is
/// treated as plain Kubernetes.
pub async fn detect_version<C: K8sClients>(client: &C) -> Result<ClusterVersion> {
  let server = client.server_version().await.context("Failed to get server version")?;
  let groups = match client.api_groups().await {
    Ok(groups) => groups,
    Err(err) => {
      tracing::warn!("Failed to list API groups, skipping OpenShift detection: {err:#}");
      Vec::new()
    }
  };

  let version = ClusterVersion::detect(&server.major, &server.minor, &groups)?;
  tracing::info!("Detected Kubernetes version: {}.{}", version.major, version.minor);
  if let Some(platform) = &version.platform {
    tracing::info!(
      "Detected OpenShift cluster (estimated version: {}.{})",
      platform.major,
      platform.minor
    );
  }

  Ok(version)
}

/// Whether discovery lists a type that can be enumerated (not a subresource, supports list and get)
fn is_collectable(resource: &APIResource) -> bool {
  !resource.name.contains('/') && REQUIRED_VERBS.iter().all(|verb| resource.verbs.iter().any(|v| v == verb))
}

fn progress_bar(len: usize) -> ProgressBar {
  let progress = ProgressBar::new(len as u64);
  if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
    progress.set_style(style.progress_chars("#>-"));
  }
  progress
}

/// Collect every instance of every collectable type the cluster advertises
///
/// Deprecation rules are only consulted when `cluster` is known. Each type is fetched with its
/// own `timeout`; a failed or timed out fetch is recorded and the run moves on to the next type.
/// Only a failure to discover the resource types at all is returned as an error.
pub async fn collect<C: K8sClients>(
  client: &C,
  deprecations: &Deprecations,
  cluster: Option<&ClusterVersion>,
  timeout: Duration,
) -> Result<Collection> {
  let lists = client
    .preferred_resources()
    .await
    .context("Failed to discover API resources")?;

  let candidates: Vec<(&str, &APIResource)> = lists
    .iter()
    .flat_map(|list| list.resources.iter().map(move |r| (list.group_version.as_str(), r)))
    .filter(|(_, resource)| is_collectable(resource))
    .collect();

  let mut collection = Collection::default();
  let progress = progress_bar(candidates.len());

  for (group_version, resource) in candidates {
    progress.inc(1);

    if let Some(cluster) = cluster {
      let verdict = deprecations.evaluate(&resource.name, group_version, cluster);
      if verdict.skip {
        if let Some(message) = verdict.message {
          tracing::debug!("{message}");
        }
        collection.skipped += 1;
        continue;
      }
    }

    progress.set_message(format!("{} ({group_version})", resource.name));
    tracing::debug!("Collecting resource: {} ({group_version})", resource.name);

    let fetched = match tokio::time::timeout(timeout, client.list_resources(group_version, resource)).await {
      Ok(result) => result,
      Err(_) => Err(anyhow::anyhow!("timed out after {}s", timeout.as_secs())),
    };

    match fetched {
      Ok(items) => {
        tracing::debug!("  {}: collected {} items", resource.name, items.len());
        collection
          .inventory
          .extend(ResourceKey::from_resource(group_version, &resource.name), items);
        collection.collected += 1;
      }
      Err(err) => {
        tracing::warn!("  {}: ERROR - {err:#}", resource.name);
        collection.errors.push(CollectionError {
          group_version: group_version.to_owned(),
          resource: resource.name.clone(),
          error: format!("{err:#}"),
        });
      }
    }
  }

  progress.finish_and_clear();
  Ok(collection)
}
