use std::path::Path;

use anyhow::{Context, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use kube::{
  api::{Api, DynamicObject, ListParams},
  config::{KubeConfigOptions, Kubeconfig},
  core::{ApiResource, GroupVersionKind, TypeMeta},
};

use crate::document::Document;

/// Version reported by the API server, before any parsing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerVersion {
  pub major: String,
  pub minor: String,
}

/// Trait abstracting the discovery and dynamic list operations used during collection
pub trait K8sClients {
  fn server_version(&self) -> impl std::future::Future<Output = Result<ServerVersion>> + Send;
  /// Names of all API groups served by the cluster
  fn api_groups(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
  /// Resource lists for the core group and the preferred version of every other group
  fn preferred_resources(&self) -> impl std::future::Future<Output = Result<Vec<APIResourceList>>> + Send;
  /// Every instance of the resource across all namespaces
  fn list_resources(
    &self,
    group_version: &str,
    resource: &APIResource,
  ) -> impl std::future::Future<Output = Result<Vec<Document>>> + Send;
}

/// Split `group/version` into its parts; the core group has no group component
pub fn split_group_version(group_version: &str) -> (&str, &str) {
  group_version.split_once('/').unwrap_or(("", group_version))
}

/// Name a cluster after its kubeconfig's current context
///
/// The context's cluster is used when set, otherwise the context name itself.
pub fn cluster_name(kubeconfig: &Path) -> Result<String> {
  let config = Kubeconfig::read_from(kubeconfig)
    .with_context(|| format!("Failed to read kubeconfig {}", kubeconfig.display()))?;
  cluster_name_from(&config)
}

fn cluster_name_from(config: &Kubeconfig) -> Result<String> {
  let current = config
    .current_context
    .as_deref()
    .filter(|c| !c.is_empty())
    .context("no current context set in kubeconfig")?;

  let context = config
    .contexts
    .iter()
    .find(|c| c.name == current)
    .with_context(|| format!("context {current} not found in kubeconfig"))?;

  match context.context.as_ref().map(|c| c.cluster.as_str()) {
    Some(cluster) if !cluster.is_empty() => Ok(cluster.to_owned()),
    _ => Ok(current.to_owned()),
  }
}

/// Real Kubernetes client implementation wrapping kube-rs
pub struct RealK8sClients {
  client: kube::Client,
}

impl RealK8sClients {
  pub async fn new(kubeconfig: &Path) -> Result<Self> {
    let config = Kubeconfig::read_from(kubeconfig)
      .with_context(|| format!("Failed to read kubeconfig {}", kubeconfig.display()))?;
    let config = kube::Config::from_custom_kubeconfig(config, &KubeConfigOptions::default())
      .await
      .context("Failed to build config from kubeconfig")?;

    match kube::Client::try_from(config) {
      Ok(client) => Ok(Self { client }),
      Err(e) => {
        anyhow::bail!(
          "Unable to connect to cluster: {e}\n\n\
          Ensure the kubeconfig file at {} is present and up to date",
          kubeconfig.display()
        );
      }
    }
  }
}

impl K8sClients for RealK8sClients {
  async fn server_version(&self) -> Result<ServerVersion> {
    let info = self.client.apiserver_version().await?;
    Ok(ServerVersion {
      major: info.major,
      minor: info.minor,
    })
  }

  async fn api_groups(&self) -> Result<Vec<String>> {
    let groups = self.client.list_api_groups().await?;
    Ok(groups.groups.into_iter().map(|g| g.name).collect())
  }

  async fn preferred_resources(&self) -> Result<Vec<APIResourceList>> {
    let mut lists = Vec::new();

    let core = self.client.list_core_api_versions().await?;
    if let Some(version) = core.versions.first() {
      lists.push(self.client.list_core_api_resources(version).await?);
    }

    for group in self.client.list_api_groups().await?.groups {
      let preferred = group
        .preferred_version
        .map(|v| v.group_version)
        .or_else(|| group.versions.first().map(|v| v.group_version.clone()));
      let Some(group_version) = preferred else {
        continue;
      };

      // A broken aggregated API must not hide every other group
      match self.client.list_api_group_resources(&group_version).await {
        Ok(list) => lists.push(list),
        Err(err) => tracing::warn!("Failed to discover resources for {group_version}: {err}"),
      }
    }

    Ok(lists)
  }

  async fn list_resources(&self, group_version: &str, resource: &APIResource) -> Result<Vec<Document>> {
    let (group, version) = split_group_version(group_version);
    let gvk = GroupVersionKind::gvk(group, version, &resource.kind);
    let api_resource = ApiResource::from_gvk_with_plural(&gvk, &resource.name);

    let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &api_resource);
    let list = api.list(&ListParams::default()).await?;

    let mut documents = Vec::with_capacity(list.items.len());
    for mut object in list.items {
      // List responses omit the per-item type information
      object.types.get_or_insert_with(|| TypeMeta {
        api_version: group_version.to_owned(),
        kind: resource.kind.clone(),
      });
      if let Some(doc) = Document::from_serializable(&object)? {
        documents.push(doc);
      }
    }

    Ok(documents)
  }
}
