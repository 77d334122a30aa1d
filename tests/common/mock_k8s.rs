use std::{collections::BTreeMap, time::Duration};

use anyhow::{Result, bail};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};

use k8s_resource_collector::clients::{K8sClients, ServerVersion};
use k8s_resource_collector::document::Document;

/// Mock K8s client for testing
///
/// Items and failures are keyed by `{groupVersion}/{resource}`.
#[derive(Clone, Default)]
pub struct MockK8sClients {
  /// `None` makes version detection fail
  pub version: Option<ServerVersion>,
  pub groups: Vec<String>,
  /// Makes the API group listing fail
  pub groups_unavailable: bool,
  pub resources: Vec<APIResourceList>,
  pub items: BTreeMap<String, Vec<Document>>,
  pub failing: Vec<String>,
  /// Fetches that never complete within any reasonable timeout
  pub hanging: Vec<String>,
}

impl MockK8sClients {
  fn target(group_version: &str, resource: &APIResource) -> String {
    format!("{group_version}/{}", resource.name)
  }
}

impl K8sClients for MockK8sClients {
  async fn server_version(&self) -> Result<ServerVersion> {
    match &self.version {
      Some(version) => Ok(version.clone()),
      None => bail!("mock version endpoint unavailable"),
    }
  }

  async fn api_groups(&self) -> Result<Vec<String>> {
    if self.groups_unavailable {
      bail!("mock API group listing unavailable");
    }
    Ok(self.groups.clone())
  }

  async fn preferred_resources(&self) -> Result<Vec<APIResourceList>> {
    Ok(self.resources.clone())
  }

  async fn list_resources(&self, group_version: &str, resource: &APIResource) -> Result<Vec<Document>> {
    let target = Self::target(group_version, resource);

    if self.failing.contains(&target) {
      bail!("mock list error for {target}");
    }
    if self.hanging.contains(&target) {
      tokio::time::sleep(Duration::from_secs(3600)).await;
    }

    Ok(self.items.get(&target).cloned().unwrap_or_default())
  }
}

/// Mock that returns errors for all methods
pub struct MockK8sClientsError;

impl K8sClients for MockK8sClientsError {
  async fn server_version(&self) -> Result<ServerVersion> { bail!("mock K8s error") }
  async fn api_groups(&self) -> Result<Vec<String>> { bail!("mock K8s error") }
  async fn preferred_resources(&self) -> Result<Vec<APIResourceList>> { bail!("mock K8s error") }
  async fn list_resources(&self, _group_version: &str, _resource: &APIResource) -> Result<Vec<Document>> { bail!("mock K8s error") }
}
